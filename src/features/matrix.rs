//! Ordered feature matrix for batch prediction
//!
//! Rows are samples (one species each), columns are features. The matrix is
//! rectangular and immutable after construction; all validation happens up
//! front so the predictor can assume well-formed input.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{RedlistError, Result};

/// A dense N x D feature matrix stored in row-major order
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    values: Vec<f32>,
    n_samples: usize,
    n_features: usize,
}

impl FeatureMatrix {
    /// Build a matrix from per-sample rows
    ///
    /// Fails if the input is empty or any row has a different length than
    /// the first.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(RedlistError::Features(
                "feature matrix must have at least one row".to_string(),
            ));
        }

        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(RedlistError::Features(
                "feature rows must have at least one column".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(rows.len() * n_features);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_features {
                return Err(RedlistError::Features(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_features
                )));
            }
            values.extend_from_slice(row);
        }

        Ok(FeatureMatrix {
            values,
            n_samples: rows.len(),
            n_features,
        })
    }

    /// Load a matrix from a numeric CSV file
    ///
    /// If the first non-empty line does not parse as numbers it is treated
    /// as a header row and skipped. Blank lines are ignored.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RedlistError::Features(format!("failed to open {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let mut rows: Vec<Vec<f32>> = Vec::new();
        let mut first_data_line = true;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_row(line) {
                Ok(row) => {
                    rows.push(row);
                    first_data_line = false;
                }
                Err(e) => {
                    // A non-numeric first line is a header
                    if first_data_line {
                        first_data_line = false;
                        continue;
                    }
                    return Err(RedlistError::Features(format!(
                        "{} line {}: {}",
                        path.display(),
                        line_no + 1,
                        e
                    )));
                }
            }
        }

        Self::from_rows(&rows)
    }

    /// Number of samples (rows)
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of features per sample (columns)
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Row-major view of all values
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// A single sample's feature row
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.n_features;
        &self.values[start..start + self.n_features]
    }
}

fn parse_row(line: &str) -> std::result::Result<Vec<f32>, String> {
    line.split(',')
        .map(|cell| {
            let cell = cell.trim();
            cell.parse::<f32>()
                .map_err(|_| format!("'{}' is not a number", cell))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_rows() {
        let m = FeatureMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.n_samples(), 2);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(RedlistError::Features(_))));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(FeatureMatrix::from_rows(&[]).is_err());
        assert!(FeatureMatrix::from_rows(&[vec![]]).is_err());
    }

    #[test]
    fn test_from_csv_with_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "range_size,latitude,elevation").unwrap();
        writeln!(file, "0.5,0.1,0.9").unwrap();
        writeln!(file, "0.2,0.8,0.3").unwrap();

        let m = FeatureMatrix::from_csv(file.path()).unwrap();
        assert_eq!(m.n_samples(), 2);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.row(0), &[0.5, 0.1, 0.9]);
    }

    #[test]
    fn test_from_csv_without_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1.0,2.0").unwrap();
        writeln!(file, "3.0,4.0").unwrap();

        let m = FeatureMatrix::from_csv(file.path()).unwrap();
        assert_eq!(m.n_samples(), 2);
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_from_csv_bad_cell() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1.0,2.0").unwrap();
        writeln!(file, "3.0,oops").unwrap();

        let result = FeatureMatrix::from_csv(file.path());
        assert!(matches!(result, Err(RedlistError::Features(_))));
    }
}
