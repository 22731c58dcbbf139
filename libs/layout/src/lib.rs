//! An in-memory, read-only view of a GDSII layout.
//!
//! A [`Layout`] is a set of named [`Cell`]s, each holding polygons and text
//! labels on [`GdsLayer`]s plus placements of other cells. Layouts are built
//! with a [`LayoutBuilder`], which validates the hierarchy, or loaded from a
//! GDS file with [`Layout::open`].
//!
//! Every layout has exactly one top-level cell, i.e. one cell that no other
//! cell instantiates.

pub mod error;
pub mod import;
pub mod polygons;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use polygons::PolygonSet;

/// A GDS layer specification: layer number and datatype.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GdsLayer(pub u16, pub u16);

impl GdsLayer {
    /// The GDS layer number.
    #[inline]
    pub const fn layer(&self) -> u16 {
        self.0
    }

    /// The GDS datatype.
    #[inline]
    pub const fn datatype(&self) -> u16 {
        self.1
    }
}

impl std::fmt::Display for GdsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// Database units of a layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    /// The size of one database unit, in microns.
    dbu: Decimal,
}

impl Default for Units {
    fn default() -> Self {
        Self { dbu: dec!(0.001) }
    }
}

impl Units {
    /// Creates units where one database unit is `dbu` microns.
    pub fn new(dbu: Decimal) -> Self {
        Self { dbu }
    }

    /// The size of one database unit, in microns.
    #[inline]
    pub fn dbu(&self) -> Decimal {
        self.dbu
    }

    /// Converts a length in microns to the nearest whole number of database units.
    ///
    /// # Example
    ///
    /// ```
    /// # use layout::Units;
    /// # use rust_decimal_macros::dec;
    /// let units = Units::default();
    /// assert_eq!(units.to_db(dec!(151.81)), 151_810);
    /// assert_eq!(units.to_db(dec!(-0.1)), -100);
    /// ```
    pub fn to_db(&self, microns: Decimal) -> i64 {
        let value = (microns / self.dbu).round();
        value.to_i64().unwrap_or(if value.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }
}

/// A polygon on a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    layer: GdsLayer,
    polygon: Polygon,
}

impl Shape {
    /// Creates a new shape.
    pub fn new(layer: GdsLayer, polygon: impl Into<Polygon>) -> Self {
        Self {
            layer,
            polygon: polygon.into(),
        }
    }

    /// The layer this shape is drawn on.
    #[inline]
    pub fn layer(&self) -> GdsLayer {
        self.layer
    }

    /// The outline of this shape.
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }
}

impl Bbox for Shape {
    fn bbox(&self) -> Option<Rect> {
        self.polygon.bbox()
    }
}

impl TransformMut for Shape {
    fn transform_mut(&mut self, trans: Transformation) {
        self.polygon.transform_mut(trans);
    }
}

/// A text label placed at a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    layer: GdsLayer,
    text: ArcStr,
    loc: Point,
}

impl Text {
    /// Creates a new text label.
    pub fn new(layer: GdsLayer, text: impl Into<ArcStr>, loc: Point) -> Self {
        Self {
            layer,
            text: text.into(),
            loc,
        }
    }

    #[inline]
    pub fn layer(&self) -> GdsLayer {
        self.layer
    }

    #[inline]
    pub fn text(&self) -> &ArcStr {
        &self.text
    }

    #[inline]
    pub fn loc(&self) -> Point {
        self.loc
    }
}

/// A placement of a child cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    child: ArcStr,
    trans: Transformation,
}

impl Instance {
    /// Creates an instance of the cell named `child`.
    pub fn new(child: impl Into<ArcStr>, trans: Transformation) -> Self {
        Self {
            child: child.into(),
            trans,
        }
    }

    /// The name of the instantiated cell.
    #[inline]
    pub fn child(&self) -> &ArcStr {
        &self.child
    }

    /// The transformation from the child's coordinates to the parent's.
    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}

/// A reference whose transformation the layout model cannot represent.
///
/// Such references keep their child in the hierarchy but contribute no
/// geometry when flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedRef {
    child: ArcStr,
    reason: String,
}

impl UnsupportedRef {
    pub fn new(child: impl Into<ArcStr>, reason: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            reason: reason.into(),
        }
    }

    /// The name of the referenced cell.
    #[inline]
    pub fn child(&self) -> &ArcStr {
        &self.child
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A named layout cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    name: ArcStr,
    shapes: Vec<Shape>,
    texts: Vec<Text>,
    instances: Vec<Instance>,
    unsupported: Vec<UnsupportedRef>,
    /// Every layer used by an element of this cell, including elements
    /// that enclose no area.
    layers: BTreeSet<GdsLayer>,
}

impl Cell {
    /// Creates a new, empty cell.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            shapes: Vec::new(),
            texts: Vec::new(),
            instances: Vec::new(),
            unsupported: Vec::new(),
            layers: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn texts(&self) -> &[Text] {
        &self.texts
    }

    #[inline]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    #[inline]
    pub fn unsupported_refs(&self) -> &[UnsupportedRef] {
        &self.unsupported
    }

    /// Layers used by elements of this cell, not including its children.
    #[inline]
    pub fn layers(&self) -> &BTreeSet<GdsLayer> {
        &self.layers
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.layers.insert(shape.layer());
        self.shapes.push(shape);
    }

    /// Adds a rectangle on `layer`.
    pub fn add_rect(&mut self, layer: GdsLayer, rect: Rect) {
        self.add_shape(Shape::new(layer, rect));
    }

    pub fn add_text(&mut self, text: Text) {
        self.layers.insert(text.layer());
        self.texts.push(text);
    }

    /// Records a use of `layer` by an element that has no shape, such as a
    /// zero-area boundary.
    pub fn add_layer(&mut self, layer: GdsLayer) {
        self.layers.insert(layer);
    }

    pub fn add_instance(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn add_unsupported_ref(&mut self, reference: UnsupportedRef) {
        self.unsupported.push(reference);
    }

    /// Names of all referenced cells, supported or not.
    fn children(&self) -> impl Iterator<Item = &ArcStr> {
        self.instances
            .iter()
            .map(Instance::child)
            .chain(self.unsupported.iter().map(UnsupportedRef::child))
    }
}

/// Assembles a [`Layout`] cell by cell.
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    units: Units,
    cells: IndexMap<ArcStr, Cell>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database units of the layout.
    pub fn units(&mut self, units: Units) -> &mut Self {
        self.units = units;
        self
    }

    /// Adds a cell.
    ///
    /// Cell names must be unique within a layout.
    pub fn add_cell(&mut self, cell: Cell) -> Result<&mut Self> {
        if self.cells.contains_key(cell.name()) {
            tracing::error!(cell_name = %cell.name(), "duplicate cell name: `{}`", cell.name());
            return Err(Error::DuplicateCell(cell.name().clone()));
        }
        self.cells.insert(cell.name().clone(), cell);
        Ok(self)
    }

    /// Validates the cell hierarchy and produces a [`Layout`].
    ///
    /// Fails if any instance refers to an undefined cell, if the hierarchy
    /// contains a cycle, or if there is not exactly one top-level cell.
    pub fn build(self) -> Result<Layout> {
        for cell in self.cells.values() {
            for child in cell.children() {
                if !self.cells.contains_key(child) {
                    return Err(Error::UndefinedCell {
                        cell: cell.name().clone(),
                        child: child.clone(),
                    });
                }
            }
        }
        check_acyclic(&self.cells)?;

        let tops = top_level(&self.cells);
        let top = match tops.as_slice() {
            [] => return Err(Error::NoTopCell),
            [top] => top.clone(),
            _ => {
                return Err(Error::MultipleTopCells(
                    tops.iter().map(|name| name.to_string()).collect(),
                ))
            }
        };

        Ok(Layout {
            units: self.units,
            cells: self.cells,
            top,
        })
    }
}

/// Names of cells that are not instantiated by any other cell, in definition order.
fn top_level(cells: &IndexMap<ArcStr, Cell>) -> Vec<ArcStr> {
    let children: HashSet<&ArcStr> = cells
        .values()
        .flat_map(Cell::children)
        .collect();
    cells
        .keys()
        .filter(|name| !children.contains(name))
        .cloned()
        .collect()
}

fn check_acyclic(cells: &IndexMap<ArcStr, Cell>) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        name: &'a ArcStr,
        cells: &'a IndexMap<ArcStr, Cell>,
        marks: &mut HashMap<&'a ArcStr, Mark>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(Error::Cycle(name.clone())),
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        if let Some(cell) = cells.get(name) {
            for child in cell.children() {
                visit(child, cells, marks)?;
            }
        }
        marks.insert(name, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for name in cells.keys() {
        visit(name, cells, &mut marks)?;
    }
    Ok(())
}

/// A validated layout with a unique top-level cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    units: Units,
    cells: IndexMap<ArcStr, Cell>,
    top: ArcStr,
}

impl Layout {
    /// Reads a GDS file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        import::read_gds(path.as_ref())
    }

    #[inline]
    pub fn units(&self) -> Units {
        self.units
    }

    /// The unique top-level cell.
    pub fn top_cell(&self) -> &Cell {
        &self.cells[&self.top]
    }

    /// All cells not instantiated by another cell.
    ///
    /// Always a single cell for a successfully built layout.
    pub fn top_cells(&self) -> Vec<&Cell> {
        top_level(&self.cells)
            .iter()
            .filter_map(|name| self.cells.get(name))
            .collect()
    }

    /// Looks up a cell by name.
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    /// Iterates over all cells, in definition order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Iterates over the names of all cells, in definition order.
    pub fn cell_names(&self) -> impl Iterator<Item = &ArcStr> {
        self.cells.keys()
    }

    /// Every layer used by an element of any cell.
    pub fn layers(&self) -> BTreeSet<GdsLayer> {
        self.cells
            .values()
            .flat_map(|cell| cell.layers().iter().copied())
            .collect()
    }

    /// Returns `true` if an element of any cell is on `layer`.
    pub fn has_layer(&self, layer: GdsLayer) -> bool {
        self.cells.values().any(|cell| cell.layers().contains(&layer))
    }

    /// References that flattening skips, with the name of the referencing cell.
    pub fn unsupported_refs(&self) -> impl Iterator<Item = (&ArcStr, &UnsupportedRef)> {
        self.cells.values().flat_map(|cell| {
            cell.unsupported_refs()
                .iter()
                .map(move |reference| (cell.name(), reference))
        })
    }

    /// All polygons of the top cell and its descendants, in top-cell coordinates.
    ///
    /// Children placed through an [`UnsupportedRef`] are left out.
    pub fn flatten(&self) -> PolygonSet {
        let mut shapes = Vec::new();
        self.flatten_into(self.top_cell(), Transformation::identity(), &mut shapes);
        PolygonSet::new(shapes)
    }

    /// All polygons of the named cell and its descendants, in that cell's coordinates.
    ///
    /// Returns `None` if no such cell exists.
    pub fn flatten_cell(&self, name: &str) -> Option<PolygonSet> {
        let cell = self.cell(name)?;
        let mut shapes = Vec::new();
        self.flatten_into(cell, Transformation::identity(), &mut shapes);
        Some(PolygonSet::new(shapes))
    }

    fn flatten_into(&self, cell: &Cell, trans: Transformation, out: &mut Vec<Shape>) {
        out.extend(cell.shapes().iter().map(|s| s.clone().transform(trans)));
        for inst in cell.instances() {
            // Children are guaranteed to exist by `LayoutBuilder::build`.
            if let Some(child) = self.cells.get(inst.child()) {
                let trans = Transformation::cascade(trans, inst.transformation());
                self.flatten_into(child, trans, out);
            }
        }
    }
}
