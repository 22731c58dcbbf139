//! GDSII import.

use std::path::Path;

use arcstr::ArcStr;
use geometry::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{Level, span};

use crate::error::{Error, Result};
use crate::{Cell, GdsLayer, Instance, Layout, LayoutBuilder, Shape, Text, Units, UnsupportedRef};

/// Reads and imports the GDS file at `path`.
pub fn read_gds(path: &Path) -> Result<Layout> {
    let span = span!(Level::INFO, "read_gds", path = %path.display());
    let _guard = span.enter();

    let lib = gds21::GdsLibrary::load(path).map_err(|err| Error::Read {
        path: path.to_path_buf(),
        message: format!("{err:?}"),
    })?;
    GdsImporter::new(&lib).import()
}

/// Converts a parsed [`gds21::GdsLibrary`] into a [`Layout`].
pub struct GdsImporter<'a> {
    gds: &'a gds21::GdsLibrary,
    builder: LayoutBuilder,
}

impl<'a> GdsImporter<'a> {
    pub fn new(gds: &'a gds21::GdsLibrary) -> Self {
        Self {
            gds,
            builder: LayoutBuilder::new(),
        }
    }

    /// Imports every struct of the library and validates the result.
    pub fn import(mut self) -> Result<Layout> {
        let units = self.import_units();
        self.builder.units(units);
        for strukt in &self.gds.structs {
            let cell = self.import_struct(strukt)?;
            self.builder.add_cell(cell)?;
        }
        self.builder.build()
    }

    fn import_units(&self) -> Units {
        let meters = self.gds.units.db_unit();
        match Decimal::from_f64(meters * 1e6) {
            Some(dbu) if dbu > Decimal::ZERO => Units::new(dbu.round_dp(9)),
            _ => {
                tracing::warn!(meters, "invalid GDS database unit; assuming 1nm");
                Units::default()
            }
        }
    }

    fn import_struct(&self, strukt: &gds21::GdsStruct) -> Result<Cell> {
        let name = ArcStr::from(strukt.name.as_str());
        let span = span!(Level::INFO, "cell", name = %name);
        let _guard = span.enter();

        let mut cell = Cell::new(name.clone());
        let ctx = ElemContext { cell: &name };
        for elem in &strukt.elems {
            use gds21::GdsElement::*;
            match elem {
                GdsBoundary(x) => {
                    cell.add_layer(ctx.layer(x.layer, x.datatype)?);
                    if let Some(shape) = ctx.import_boundary(x)? {
                        cell.add_shape(shape);
                    }
                }
                GdsPath(x) => {
                    cell.add_layer(ctx.layer(x.layer, x.datatype)?);
                    for shape in ctx.import_path(x)? {
                        cell.add_shape(shape);
                    }
                }
                GdsBox(x) => cell.add_shape(ctx.import_box(x)?),
                GdsStructRef(x) => match ctx.import_orientation(x.strans.as_ref()) {
                    Ok((reflect, rotation)) => {
                        cell.add_instance(ctx.import_instance(x, reflect, rotation))
                    }
                    Err(reason) => cell.add_unsupported_ref(ctx.unsupported_ref(&x.name, reason)),
                },
                GdsArrayRef(x) => match ctx.import_orientation(x.strans.as_ref()) {
                    Ok((reflect, rotation)) => {
                        for inst in ctx.import_instance_array(x, reflect, rotation)? {
                            cell.add_instance(inst);
                        }
                    }
                    Err(reason) => cell.add_unsupported_ref(ctx.unsupported_ref(&x.name, reason)),
                },
                GdsTextElem(x) => cell.add_text(ctx.import_text_elem(x)?),
                GdsNode(elem) => {
                    tracing::warn!(?elem, "ignoring unsupported GDS Node element");
                }
            }
        }
        Ok(cell)
    }
}

/// Per-cell element conversion, carrying the cell name for error messages.
struct ElemContext<'a> {
    cell: &'a ArcStr,
}

impl ElemContext<'_> {
    fn unsupported(&self, reason: impl Into<String>) -> Error {
        let reason = reason.into();
        tracing::error!(cell_name = %self.cell, "{reason}");
        Error::Unsupported {
            cell: self.cell.clone(),
            reason,
        }
    }

    fn unsupported_ref(&self, child: &str, reason: String) -> UnsupportedRef {
        tracing::warn!(cell_name = %self.cell, child, "reference will not be flattened: {reason}");
        UnsupportedRef::new(child, reason)
    }

    fn layer(&self, layer: i16, datatype: i16) -> Result<GdsLayer> {
        match (u16::try_from(layer), u16::try_from(datatype)) {
            (Ok(layer), Ok(datatype)) => Ok(GdsLayer(layer, datatype)),
            _ => Err(self.unsupported(format!("negative layer spec {layer}/{datatype}"))),
        }
    }

    /// Imports a boundary, dropping polygons that enclose no area.
    ///
    /// The caller records the layer of a dropped boundary.
    fn import_boundary(&self, x: &gds21::GdsBoundary) -> Result<Option<Shape>> {
        let span = span!(Level::DEBUG, "boundary");
        let _guard = span.enter();

        let mut pts: Vec<Point> = x.xy.iter().map(point).collect();
        // GDS repeats the first point to close the polygon.
        if pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        let layer = self.layer(x.layer, x.datatype)?;
        let polygon = Polygon::from_verts(pts);
        if polygon.is_degenerate() {
            tracing::debug!(%layer, "skipping zero-area boundary");
            return Ok(None);
        }
        Ok(Some(Shape::new(layer, polygon)))
    }

    fn import_box(&self, x: &gds21::GdsBox) -> Result<Shape> {
        let span = span!(Level::DEBUG, "box");
        let _guard = span.enter();

        // Five points are stored per box; the first and third are opposite corners.
        let (Some(p0), Some(p2)) = (x.xy.get(0), x.xy.get(2)) else {
            return Err(self.unsupported("GDS box with fewer than three points"));
        };
        let layer = self.layer(x.layer, x.boxtype)?;
        Ok(Shape::new(layer, Rect::new(point(p0), point(p2))))
    }

    /// Expands a path into one quadrilateral per segment.
    fn import_path(&self, x: &gds21::GdsPath) -> Result<Vec<Shape>> {
        let span = span!(Level::DEBUG, "path");
        let _guard = span.enter();

        let layer = self.layer(x.layer, x.datatype)?;
        let width = i64::from(x.width.unwrap_or_default()).abs();
        if width == 0 {
            tracing::debug!(%layer, "skipping zero-width path");
            return Ok(Vec::new());
        }
        let half = width / 2;
        let (begin_extn, end_extn) = match x.path_type {
            None | Some(0) => (0, 0),
            // Round ends are approximated by square ends.
            Some(1) | Some(2) => (half, half),
            Some(4) => (
                i64::from(x.begin_extn.unwrap_or_default()),
                i64::from(x.end_extn.unwrap_or_default()),
            ),
            Some(other) => return Err(self.unsupported(format!("GDS path type {other}"))),
        };

        let pts: Vec<Point> = x.xy.iter().map(point).collect();
        Ok(
            path_segments(&pts, width, begin_extn, end_extn)
                .into_iter()
                .map(|poly| Shape::new(layer, poly))
                .collect(),
        )
    }

    fn import_text_elem(&self, x: &gds21::GdsTextElem) -> Result<Text> {
        let span = span!(Level::DEBUG, "text element", text = %x.string);
        let _guard = span.enter();

        let layer = self.layer(x.layer, x.texttype)?;
        Ok(Text::new(layer, x.string.as_str(), point(&x.xy)))
    }

    fn import_instance(&self, x: &gds21::GdsStructRef, reflect: bool, rotation: Rotation) -> Instance {
        let span = span!(Level::DEBUG, "instance", name = %x.name);
        let _guard = span.enter();

        Instance::new(
            x.name.as_str(),
            Transformation::from_offset_and_orientation(point(&x.xy), reflect, rotation),
        )
    }

    /// Imports an array reference as one instance per array element.
    ///
    /// GDS arrays are given by an origin and the far corners of the column and
    /// row displacement vectors; element `(c, r)` sits at
    /// `origin + c * col_step + r * row_step`.
    fn import_instance_array(
        &self,
        x: &gds21::GdsArrayRef,
        reflect: bool,
        rotation: Rotation,
    ) -> Result<Vec<Instance>> {
        let span = span!(Level::DEBUG, "instance array", name = %x.name);
        let _guard = span.enter();

        let (Some(p0), Some(p1), Some(p2)) = (x.xy.get(0), x.xy.get(1), x.xy.get(2)) else {
            return Err(self.unsupported("GDS array reference with fewer than three points"));
        };
        let (cols, rows) = (i64::from(x.cols), i64::from(x.rows));
        if cols <= 0 || rows <= 0 {
            return Err(self.unsupported(format!("GDS array of {cols}x{rows} elements")));
        }
        let (p0, p1, p2) = (point(p0), point(p1), point(p2));
        let col_step = Point::new((p1.x - p0.x) / cols, (p1.y - p0.y) / cols);
        let row_step = Point::new((p2.x - p0.x) / rows, (p2.y - p0.y) / rows);

        let mut insts = Vec::with_capacity((cols * rows) as usize);
        for c in 0..cols {
            for r in 0..rows {
                let loc = Point::new(
                    p0.x + c * col_step.x + r * row_step.x,
                    p0.y + c * col_step.y + r * row_step.y,
                );
                insts.push(Instance::new(
                    x.name.as_str(),
                    Transformation::from_offset_and_orientation(loc, reflect, rotation),
                ));
            }
        }
        Ok(insts)
    }

    /// Converts a reference transformation to a reflection and Manhattan rotation.
    ///
    /// Returns the reason if the transformation has no such equivalent.
    fn import_orientation(
        &self,
        strans: Option<&gds21::GdsStrans>,
    ) -> std::result::Result<(bool, Rotation), String> {
        let Some(strans) = strans else {
            return Ok((false, Rotation::R0));
        };
        if strans.abs_mag || strans.abs_angle {
            return Err("absolute magnification/angle".to_string());
        }
        if strans.mag.is_some_and(|mag| (mag - 1.).abs() > 1e-9) {
            return Err("instance magnification".to_string());
        }
        let rotation =
            Rotation::try_from(strans.angle.unwrap_or_default()).map_err(|err| err.to_string())?;
        Ok((strans.reflected, rotation))
    }
}

fn point(pt: &gds21::GdsPoint) -> Point {
    Point::new(pt.x.into(), pt.y.into())
}

/// Outlines of the segments of a path of the given `width`.
///
/// Interior segment ends are extended by half the width so that consecutive
/// Manhattan segments meet without notches at the corners.
pub(crate) fn path_segments(pts: &[Point], width: i64, begin_extn: i64, end_extn: i64) -> Vec<Polygon> {
    let half = width as f64 / 2.;
    let n = pts.len();
    let mut polys = Vec::new();
    for i in 0..n.saturating_sub(1) {
        let (a, b) = (pts[i], pts[i + 1]);
        if a == b {
            continue;
        }
        let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
        let len = dx.hypot(dy);
        let (ux, uy) = (dx / len, dy / len);
        let ext_a = if i == 0 { begin_extn as f64 } else { half };
        let ext_b = if i + 2 == n { end_extn as f64 } else { half };
        let (nx, ny) = (-uy * half, ux * half);
        let (ax, ay) = (a.x as f64 - ux * ext_a, a.y as f64 - uy * ext_a);
        let (bx, by) = (b.x as f64 + ux * ext_b, b.y as f64 + uy * ext_b);
        let corner = |x: f64, y: f64| Point::new(x.round() as i64, y.round() as i64);
        polys.push(Polygon::from_verts(vec![
            corner(ax - nx, ay - ny),
            corner(bx - nx, by - ny),
            corner(bx + nx, by + ny),
            corner(ax + nx, ay + ny),
        ]));
    }
    polys
}
