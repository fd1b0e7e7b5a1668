//! Emission line catalogs: a binary table in the first extension with
//! `Wavelength` and `Emission` columns.

use std::path::{Path, PathBuf};

use crate::io::fits::{FitsError, FitsFile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogLine {
    pub wavelength: f64,
    pub emission: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineCatalog {
    pub path: PathBuf,
    pub lines: Vec<CatalogLine>,
}

impl LineCatalog {
    pub fn open(path: &Path) -> Result<Self, FitsError> {
        let mut fits = FitsFile::open(path)?;
        if fits.hdu_count() < 2 {
            return Err(FitsError::WrongHduType {
                hdu: 1,
                expected: "a line catalog table",
            });
        }
        let mut table = fits.table(1)?;
        let wavelength = table.read_column("Wavelength")?;
        let emission = table.read_column("Emission")?;

        let lines = wavelength
            .into_iter()
            .zip(emission)
            .map(|(wavelength, emission)| CatalogLine { wavelength, emission })
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// Lines with a wavelength inside `[lo, hi]`.
    pub fn in_range(&self, lo: f64, hi: f64) -> impl Iterator<Item = &CatalogLine> {
        self.lines.iter().filter(move |l| l.wavelength >= lo && l.wavelength <= hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fits::testkit::{FitsBuilder, TestColumn};

    #[test]
    fn reads_wavelength_and_emission() {
        let fixture = FitsBuilder::new()
            .table(
                "",
                &[
                    TestColumn::f64("Wavelength", 1, &[1950.5, 1960.25, 1999.0]),
                    TestColumn::f32("Emission", &[10.0, 2.5, 40.0]),
                ],
            )
            .build();
        let cat = LineCatalog::open(fixture.path()).unwrap();

        assert_eq!(cat.path, fixture.path());
        assert_eq!(cat.lines.len(), 3);
        assert_eq!(
            cat.lines[1],
            CatalogLine {
                wavelength: 1960.25,
                emission: 2.5
            }
        );
        let inside: Vec<f64> = cat.in_range(1955.0, 2000.0).map(|l| l.wavelength).collect();
        assert_eq!(inside, vec![1960.25, 1999.0]);
    }

    #[test]
    fn catalog_without_extension_is_an_error() {
        let fixture = FitsBuilder::new().build();
        assert!(matches!(
            LineCatalog::open(fixture.path()),
            Err(FitsError::WrongHduType { hdu: 1, .. })
        ));
    }
}
