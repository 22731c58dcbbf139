//! Locating the layout file and its siblings.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const GDS_EXT: &str = ".gds";
const BROTLI_GDS_EXT: &str = ".gds.br";

#[derive(Debug)]
enum GdsSource {
    Plain,
    /// Decompressed copy, deleted on drop.
    Decompressed(NamedTempFile),
}

/// A layout file, decompressed if necessary, plus the paths of its sibling files.
///
/// Siblings share the layout's stem: `{stem}.lef` and `{stem}.v`.
#[derive(Debug)]
pub struct LayoutArtifact {
    source: PathBuf,
    /// The source path without its layout extension.
    stem_path: PathBuf,
    gds: GdsSource,
}

impl LayoutArtifact {
    /// Resolves a `.gds` or `.gds.br` file.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        let (stem, compressed) = if let Some(stem) = file_name.strip_suffix(BROTLI_GDS_EXT) {
            (stem, true)
        } else if let Some(stem) = file_name.strip_suffix(GDS_EXT) {
            (stem, false)
        } else {
            return Err(Error::UnrecognizedExtension(path.to_path_buf()));
        };
        if !path.is_file() {
            return Err(Error::ArtifactNotFound(path.to_path_buf()));
        }

        let gds = if compressed {
            GdsSource::Decompressed(decompress(path)?)
        } else {
            GdsSource::Plain
        };
        Ok(Self {
            source: path.to_path_buf(),
            stem_path: path.with_file_name(stem),
            gds,
        })
    }

    /// The path given to [`LayoutArtifact::resolve`].
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// An uncompressed GDS file with the layout contents.
    pub fn gds_path(&self) -> &Path {
        match &self.gds {
            GdsSource::Plain => &self.source,
            GdsSource::Decompressed(file) => file.path(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.gds, GdsSource::Decompressed(_))
    }

    /// The file name without the layout extension.
    pub fn stem(&self) -> &str {
        self.stem_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// The directory containing the layout file.
    pub fn dir(&self) -> &Path {
        self.source.parent().unwrap_or(Path::new("."))
    }

    pub fn lef_path(&self) -> PathBuf {
        self.sibling("lef")
    }

    pub fn verilog_path(&self) -> PathBuf {
        self.sibling("v")
    }

    fn sibling(&self, ext: &str) -> PathBuf {
        self.stem_path.with_file_name(format!("{}.{ext}", self.stem()))
    }
}

fn decompress(path: &Path) -> Result<NamedTempFile> {
    let err = |source: io::Error| Error::Decompress {
        path: path.to_path_buf(),
        source,
    };
    let input = File::open(path).map_err(err)?;
    let mut reader = brotli::Decompressor::new(input, 4096);
    let mut output = tempfile::Builder::new()
        .prefix("precheck-")
        .suffix(GDS_EXT)
        .tempfile()
        .map_err(err)?;
    io::copy(&mut reader, &mut output).map_err(err)?;
    output.flush().map_err(err)?;
    tracing::info!(
        from = %path.display(),
        to = %output.path().display(),
        "decompressed layout"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_gds_resolves_siblings() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let gds = dir.path().join("tt_um_example.gds");
        fs::write(&gds, b"not really gds")?;

        let artifact = LayoutArtifact::resolve(&gds)?;
        assert!(!artifact.is_compressed());
        assert_eq!(artifact.gds_path(), gds);
        assert_eq!(artifact.stem(), "tt_um_example");
        assert_eq!(artifact.lef_path(), dir.path().join("tt_um_example.lef"));
        assert_eq!(artifact.verilog_path(), dir.path().join("tt_um_example.v"));
        assert_eq!(artifact.dir(), dir.path());
        Ok(())
    }

    #[test]
    fn brotli_gds_is_decompressed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tt_um_example.gds.br");
        let contents = b"GDSII stream contents".repeat(100);
        {
            let mut writer = brotli::CompressorWriter::new(fs::File::create(&path)?, 4096, 9, 22);
            writer.write_all(&contents)?;
        }

        let artifact = LayoutArtifact::resolve(&path)?;
        assert!(artifact.is_compressed());
        assert_eq!(artifact.stem(), "tt_um_example");
        assert_eq!(artifact.lef_path(), dir.path().join("tt_um_example.lef"));
        assert_eq!(fs::read(artifact.gds_path())?, contents);

        let decompressed = artifact.gds_path().to_path_buf();
        drop(artifact);
        assert!(!decompressed.exists());
        Ok(())
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(matches!(
            LayoutArtifact::resolve("design.oas"),
            Err(Error::UnrecognizedExtension(_))
        ));
        assert!(matches!(
            LayoutArtifact::resolve("/nonexistent/tt_um_example.gds"),
            Err(Error::ArtifactNotFound(_))
        ));
    }
}
