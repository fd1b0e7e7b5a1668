//! FITS fixtures for unit tests, written through cfitsio into a temp dir.

use std::path::{Path, PathBuf};

use fitsio::images::{ImageDescription, ImageType};
use fitsio::tables::{ColumnDataType, ColumnDescription, ConcreteColumnDescription};
use tempfile::TempDir;

use crate::domain::TraceRecord;

/// A binary table column with its row-major values.
pub(crate) enum TestColumn {
    I32 { name: String, values: Vec<i32> },
    F32 { name: String, values: Vec<f32> },
    F64 { name: String, repeat: usize, values: Vec<f64> },
}

impl TestColumn {
    pub(crate) fn i32(name: &str, values: &[i32]) -> Self {
        TestColumn::I32 {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }

    pub(crate) fn f32(name: &str, values: &[f32]) -> Self {
        TestColumn::F32 {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }

    pub(crate) fn f64(name: &str, repeat: usize, values: &[f64]) -> Self {
        TestColumn::F64 {
            name: name.to_string(),
            repeat,
            values: values.to_vec(),
        }
    }

    fn description(&self) -> ConcreteColumnDescription {
        let description = match self {
            TestColumn::I32 { name, .. } => ColumnDescription::new(name)
                .with_type(ColumnDataType::Int)
                .create(),
            TestColumn::F32 { name, .. } => ColumnDescription::new(name)
                .with_type(ColumnDataType::Float)
                .create(),
            TestColumn::F64 { name, repeat, .. } => ColumnDescription::new(name)
                .with_type(ColumnDataType::Double)
                .that_repeats(*repeat)
                .create(),
        };
        description.unwrap()
    }

    /// Vector cells are written as one run across rows.
    fn write(&self, fits: &mut fitsio::FitsFile, hdu: &fitsio::hdu::FitsHdu) {
        match self {
            TestColumn::I32 { name, values } if !values.is_empty() => {
                hdu.write_col(fits, name.as_str(), &values[..]).unwrap();
            }
            TestColumn::F32 { name, values } if !values.is_empty() => {
                hdu.write_col(fits, name.as_str(), &values[..]).unwrap();
            }
            TestColumn::F64 { name, values, .. } if !values.is_empty() => {
                hdu.write_col(fits, name.as_str(), &values[..]).unwrap();
            }
            _ => {}
        }
    }
}

/// A fixture file; the directory is removed on drop.
pub(crate) struct TestFits {
    _dir: TempDir,
    path: PathBuf,
}

impl TestFits {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Builds a FITS file: an empty primary HDU plus extensions.
pub(crate) struct FitsBuilder {
    dir: TempDir,
    path: PathBuf,
    fits: fitsio::FitsFile,
    hdus: usize,
}

impl FitsBuilder {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.fits");
        let fits = fitsio::FitsFile::create(&path).open().unwrap();
        Self {
            dir,
            path,
            fits,
            hdus: 1,
        }
    }

    /// Add a primary string keyword. Names with spaces or longer than eight
    /// characters are written with the `HIERARCH` convention by cfitsio.
    pub(crate) fn primary_key(mut self, keyword: &str, value: &str) -> Self {
        let hdu = self.fits.primary_hdu().unwrap();
        hdu.write_key(&mut self.fits, keyword, value.to_string()).unwrap();
        self
    }

    /// Add a numeric keyword to the most recent HDU.
    pub(crate) fn key_f64(mut self, keyword: &str, value: f64) -> Self {
        let hdu = self.fits.hdu(self.hdus - 1).unwrap();
        hdu.write_key(&mut self.fits, keyword, value).unwrap();
        self
    }

    /// `f64` image; `pixels` are row-major, row 0 first.
    pub(crate) fn image(mut self, extname: &str, width: usize, height: usize, pixels: &[f64]) -> Self {
        let description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &[height, width],
        };
        let hdu = self.fits.create_image(extname, &description).unwrap();
        hdu.write_image(&mut self.fits, pixels).unwrap();
        self.hdus += 1;
        self
    }

    /// Binary table; the row count follows from the column values. An empty
    /// `extname` leaves the extension unnamed.
    pub(crate) fn table(mut self, extname: &str, columns: &[TestColumn]) -> Self {
        let descriptions: Vec<ConcreteColumnDescription> = columns.iter().map(TestColumn::description).collect();
        let hdu = self.fits.create_table(extname, &descriptions).unwrap();
        for column in columns {
            column.write(&mut self.fits, &hdu);
        }
        self.hdus += 1;
        self
    }

    pub(crate) fn build(self) -> TestFits {
        drop(self.fits);
        TestFits {
            _dir: self.dir,
            path: self.path,
        }
    }
}

/// Trace table columns for `records`; vector cells are zero-padded to the
/// longest coefficient list of each field.
pub(crate) fn trace_columns(records: &[TraceRecord]) -> Vec<TestColumn> {
    type Field = fn(&TraceRecord) -> Vec<f64>;
    let vector_fields: [(&str, Field); 8] = [
        ("Upper", |r| r.upper.coefficients().to_vec()),
        ("Lower", |r| r.lower.coefficients().to_vec()),
        ("All", |r| r.all.coefficients().to_vec()),
        ("Wavelength", |r| r.wavelength.coefficients().to_vec()),
        ("SlitFraction", |r| r.slit_fraction.clone()),
        ("SlitPolyA", |r| r.slit_poly_a.coefficients().to_vec()),
        ("SlitPolyB", |r| r.slit_poly_b.coefficients().to_vec()),
        ("SlitPolyC", |r| r.slit_poly_c.coefficients().to_vec()),
    ];

    let mut columns = vec![
        TestColumn::i32("Order", &records.iter().map(|r| r.order as i32).collect::<Vec<_>>()),
        TestColumn::i32("TraceNb", &records.iter().map(|r| r.trace_nb as i32).collect::<Vec<_>>()),
    ];
    for (name, field) in vector_fields {
        let cells: Vec<Vec<f64>> = records.iter().map(field).collect();
        let repeat = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let mut values = Vec::with_capacity(repeat * records.len());
        for mut cell in cells {
            cell.resize(repeat, 0.0);
            values.extend(cell);
        }
        columns.push(TestColumn::f64(name, repeat, &values));
    }
    columns
}
