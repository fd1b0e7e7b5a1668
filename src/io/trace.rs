//! Trace table loading.
//!
//! A trace file holds one binary table per detector. Each row describes one
//! trace of one order: the slit-edge and center polynomials, the wavelength
//! solution, the slit fractions it spans and the slit-curvature polynomials.
//!
//! Loading is per detector so a missing or empty detector table only skips
//! that frame. Missing *columns* are schema errors and fail the run.

use std::path::Path;

use tracing::debug;

use crate::domain::{Detector, TraceRecord};
use crate::io::fits::{BinTable, FitsError, FitsFile};
use crate::math::Polynomial;

/// Columns every trace table must provide.
pub const TRACE_COLUMNS: [&str; 10] = [
    "Order",
    "TraceNb",
    "Upper",
    "Lower",
    "All",
    "Wavelength",
    "SlitFraction",
    "SlitPolyA",
    "SlitPolyB",
    "SlitPolyC",
];

/// Outcome of loading one detector's table.
#[derive(Debug, Clone, PartialEq)]
pub enum ChipTable {
    Loaded(Vec<TraceRecord>),
    /// No extension for this detector exists in the file.
    MissingExtension,
    /// The extension exists but holds no rows.
    Empty,
}

/// An opened trace file.
pub struct TraceFile {
    fits: FitsFile,
}

impl TraceFile {
    pub fn open(path: &Path) -> Result<Self, FitsError> {
        Ok(Self {
            fits: FitsFile::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.fits.path()
    }

    /// Load every record of one detector.
    pub fn chip(&mut self, detector: Detector) -> Result<ChipTable, FitsError> {
        let Some(index) = self.fits.detector_hdu(detector) else {
            return Ok(ChipTable::MissingExtension);
        };
        let mut table = self.fits.table(index)?;
        if table.is_empty() {
            return Ok(ChipTable::Empty);
        }

        for name in TRACE_COLUMNS {
            if !table.has_column(name) {
                return Err(FitsError::ColumnNotFound(name.to_string()));
            }
        }

        let records = read_records(&mut table)?;
        debug!(%detector, rows = records.len(), "loaded trace table");
        Ok(ChipTable::Loaded(records))
    }

    /// Wavelength solution of trace 1 of `order` on `detector`.
    ///
    /// Only `Order`, `TraceNb` and `Wavelength` are read, so this works on
    /// reduced tables without curvature columns. Returns `Ok(None)` when the
    /// detector extension or the row is missing.
    pub fn wavelength_solution(&mut self, detector: Detector, order: i64) -> Result<Option<Polynomial>, FitsError> {
        let Some(index) = self.fits.detector_hdu(detector) else {
            return Ok(None);
        };
        let mut table = self.fits.table(index)?;
        if table.is_empty() {
            return Ok(None);
        }

        let orders = table.read_ints("Order")?;
        let trace_nbs = table.read_ints("TraceNb")?;
        let Some(row) = orders.iter().zip(&trace_nbs).position(|(&o, &t)| o == order && t == 1) else {
            return Ok(None);
        };
        let mut solutions = table.read_cells("Wavelength")?;
        Ok(Some(Polynomial::from_ascending(solutions.swap_remove(row))))
    }

    /// True when the file has an extension for `detector`.
    pub fn has_chip(&self, detector: Detector) -> bool {
        self.fits.detector_hdu(detector).is_some()
    }
}

fn read_records(table: &mut BinTable<'_>) -> Result<Vec<TraceRecord>, FitsError> {
    let orders = table.read_ints("Order")?;
    let trace_nbs = table.read_ints("TraceNb")?;
    let mut cells = |name: &str| table.read_cells(name).map(Vec::into_iter);
    let mut upper = cells("Upper")?;
    let mut lower = cells("Lower")?;
    let mut all = cells("All")?;
    let mut wavelength = cells("Wavelength")?;
    let mut slit_fraction = cells("SlitFraction")?;
    let mut slit_poly_a = cells("SlitPolyA")?;
    let mut slit_poly_b = cells("SlitPolyB")?;
    let mut slit_poly_c = cells("SlitPolyC")?;

    // Every column holds one cell per row.
    let next = |column: &mut std::vec::IntoIter<Vec<f64>>| column.next().unwrap_or_default();
    let poly = |column: &mut std::vec::IntoIter<Vec<f64>>| Polynomial::from_ascending(next(column));
    let records = orders
        .into_iter()
        .zip(trace_nbs)
        .map(|(order, trace_nb)| TraceRecord {
            order,
            trace_nb,
            upper: poly(&mut upper),
            lower: poly(&mut lower),
            all: poly(&mut all),
            wavelength: poly(&mut wavelength),
            slit_fraction: next(&mut slit_fraction),
            slit_poly_a: poly(&mut slit_poly_a),
            slit_poly_b: poly(&mut slit_poly_b),
            slit_poly_c: poly(&mut slit_poly_c),
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::fits::testkit::{FitsBuilder, TestColumn, TestFits, trace_columns};

    pub(crate) fn sample_record(order: i64, trace_nb: i64, center: f64) -> TraceRecord {
        TraceRecord {
            order,
            trace_nb,
            upper: Polynomial::from_ascending(vec![center + 25.0, 0.01, 0.0]),
            lower: Polynomial::from_ascending(vec![center - 25.0, 0.01, 0.0]),
            all: Polynomial::from_ascending(vec![center, 0.01, 0.0]),
            wavelength: Polynomial::from_ascending(vec![1950.0 + order as f64 * 40.0, 0.018, -1.0e-6]),
            slit_fraction: vec![0.0, 0.5, 1.0],
            slit_poly_a: Polynomial::from_ascending(vec![0.0, 1.0, 0.0]),
            slit_poly_b: Polynomial::from_ascending(vec![0.03, 0.0, 0.0]),
            slit_poly_c: Polynomial::from_ascending(vec![1.0e-5, 0.0, 0.0]),
        }
    }

    fn trace_file(fixture: &TestFits) -> TraceFile {
        TraceFile::open(fixture.path()).unwrap()
    }

    #[test]
    fn loads_records_per_detector() {
        let chip1 = vec![sample_record(2, 1, 300.0), sample_record(3, 1, 800.0)];
        let chip3 = vec![sample_record(4, 1, 1200.0)];
        let fixture = FitsBuilder::new()
            .table("CHIP1", &trace_columns(&chip1))
            .table("CHIP3", &trace_columns(&chip3))
            .build();
        let mut file = trace_file(&fixture);

        assert_eq!(file.path(), fixture.path());
        assert_eq!(file.chip(Detector::Chip1).unwrap(), ChipTable::Loaded(chip1));
        assert_eq!(file.chip(Detector::Chip3).unwrap(), ChipTable::Loaded(chip3));
    }

    #[test]
    fn missing_extension_is_reported_not_fatal() {
        let chip2 = vec![sample_record(5, 1, 500.0)];
        let fixture = FitsBuilder::new().table("CHIP2", &trace_columns(&chip2)).build();
        let mut file = trace_file(&fixture);

        assert_eq!(file.chip(Detector::Chip1).unwrap(), ChipTable::MissingExtension);
        assert!(matches!(file.chip(Detector::Chip2).unwrap(), ChipTable::Loaded(r) if r.len() == 1));
        assert!(!file.has_chip(Detector::Chip3));
    }

    #[test]
    fn empty_table_is_reported() {
        let fixture = FitsBuilder::new().table("CHIP1", &trace_columns(&[])).build();
        assert_eq!(trace_file(&fixture).chip(Detector::Chip1).unwrap(), ChipTable::Empty);
    }

    #[test]
    fn missing_column_is_an_error() {
        let fixture = FitsBuilder::new()
            .table(
                "CHIP1",
                &[TestColumn::i32("Order", &[1]), TestColumn::i32("TraceNb", &[1])],
            )
            .build();
        let err = trace_file(&fixture).chip(Detector::Chip1).unwrap_err();
        assert!(matches!(err, FitsError::ColumnNotFound(name) if name == "Upper"));
    }

    #[test]
    fn wavelength_solution_picks_first_trace_of_order() {
        let mut second = sample_record(3, 2, 820.0);
        second.wavelength = Polynomial::from_ascending(vec![1.0, 2.0, 3.0]);
        let records = vec![sample_record(2, 1, 300.0), second, sample_record(3, 1, 780.0)];
        let fixture = FitsBuilder::new().table("CHIP2", &trace_columns(&records)).build();
        let mut file = trace_file(&fixture);

        let solution = file.wavelength_solution(Detector::Chip2, 3).unwrap().unwrap();
        assert_eq!(solution, records[2].wavelength);
        assert!(file.wavelength_solution(Detector::Chip2, 9).unwrap().is_none());
        assert!(file.wavelength_solution(Detector::Chip1, 3).unwrap().is_none());
    }

    #[test]
    fn reduced_table_still_has_wavelength_solutions() {
        let fixture = FitsBuilder::new()
            .table(
                "CHIP1",
                &[
                    TestColumn::i32("Order", &[4]),
                    TestColumn::i32("TraceNb", &[1]),
                    TestColumn::f64("Wavelength", 2, &[2100.0, 0.02]),
                ],
            )
            .build();
        let mut file = trace_file(&fixture);

        let solution = file.wavelength_solution(Detector::Chip1, 4).unwrap().unwrap();
        assert_eq!(solution, Polynomial::from_ascending(vec![2100.0, 0.02]));
        assert!(file.chip(Detector::Chip1).is_err());
    }
}
