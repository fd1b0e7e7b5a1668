//! Binary table (`BINTABLE`) column reads.
//!
//! Scalar columns go through `FitsHdu::read_col`. Vector columns (repeat
//! count above one, e.g. `3D` polynomial coefficients) are read in a single
//! `ffgcvd` call that runs across rows, then split into one cell per row.

use fitsio::hdu::{FitsHdu, HduInfo};

use super::FitsError;

/// One table column as described by its `TTYPEn`/`TFORMn` cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub repeat: usize,
}

/// A binary-table HDU of an open file.
pub struct BinTable<'a> {
    fits: &'a mut fitsio::FitsFile,
    hdu: FitsHdu,
    index: usize,
    columns: Vec<Column>,
    nrows: usize,
}

impl<'a> BinTable<'a> {
    pub(super) fn new(fits: &'a mut fitsio::FitsFile, index: usize) -> Result<Self, FitsError> {
        let hdu = fits.hdu(index)?;
        let HduInfo::TableInfo {
            column_descriptions,
            num_rows,
        } = &hdu.info
        else {
            return Err(FitsError::WrongHduType {
                hdu: index,
                expected: "a binary table",
            });
        };
        let columns = column_descriptions
            .iter()
            .map(|c| Column {
                name: c.name.trim().to_string(),
                repeat: c.data_type.repeat,
            })
            .collect();
        let nrows = *num_rows;

        Ok(Self {
            fits,
            hdu,
            index,
            columns,
            nrows,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Scalar numeric column as `f64`.
    pub fn read_column(&mut self, name: &str) -> Result<Vec<f64>, FitsError> {
        self.scalar(name)?;
        Ok(self.hdu.read_col::<f64>(self.fits, name)?)
    }

    /// Scalar integer column.
    pub fn read_ints(&mut self, name: &str) -> Result<Vec<i64>, FitsError> {
        self.scalar(name)?;
        let values = self.hdu.read_col::<i32>(self.fits, name)?;
        Ok(values.into_iter().map(i64::from).collect())
    }

    /// Every cell of a column, one `Vec` of `repeat` values per row.
    pub fn read_cells(&mut self, name: &str) -> Result<Vec<Vec<f64>>, FitsError> {
        let position = self.position(name).ok_or_else(|| FitsError::ColumnNotFound(name.to_string()))?;
        let repeat = self.columns[position].repeat;
        if repeat == 0 {
            return Ok(vec![Vec::new(); self.nrows]);
        }

        let total = self.nrows.checked_mul(repeat).ok_or_else(|| FitsError::Malformed {
            hdu: self.index,
            reason: format!("column {name}: {} rows x {repeat} values overflows", self.nrows),
        })?;
        let mut values = vec![0.0f64; total];
        if total > 0 {
            // The read addresses the current HDU.
            self.fits.hdu(self.index)?;
            let mut anynul = 0;
            let mut status = 0;
            unsafe {
                fitsio::sys::ffgcvd(
                    self.fits.as_raw(),
                    (position + 1) as _,
                    1,
                    1,
                    total as _,
                    f64::NAN,
                    values.as_mut_ptr(),
                    &mut anynul,
                    &mut status,
                );
            }
            if status != 0 {
                return Err(FitsError::ColumnRead {
                    column: name.to_string(),
                    status,
                });
            }
        }
        Ok(values.chunks(repeat).map(<[f64]>::to_vec).collect())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn scalar(&self, name: &str) -> Result<(), FitsError> {
        let position = self.position(name).ok_or_else(|| FitsError::ColumnNotFound(name.to_string()))?;
        if self.columns[position].repeat != 1 {
            return Err(FitsError::UnsupportedColumn {
                column: name.to_string(),
                reason: "vector column read as scalar",
            });
        }
        Ok(())
    }
}
