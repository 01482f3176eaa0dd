//! Space-time record of a trace-mode run.
//!
//! Row `t` is the occupancy of the road after `t` updates, so row 0 is the
//! initial road. A BLAKE3 checksum over all rows identifies a run: replaying
//! the same seed and parameters must reproduce it bit for bit.

use std::io::Write;

use blake3::Hasher;

use crate::error::DriverError;

/// `steps × length` matrix of `0`/`1` occupancy rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceTime {
    length: usize,
    rows: Vec<Vec<u8>>,
}

impl SpaceTime {
    pub(crate) fn with_capacity(length: usize, steps: usize) -> Self {
        Self {
            length,
            rows: Vec::with_capacity(steps),
        }
    }

    pub(crate) fn push(&mut self, row: Vec<u8>) {
        debug_assert_eq!(row.len(), self.length);
        self.rows.push(row);
    }

    /// Road length, i.e. the width of every row.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of recorded rows.
    pub fn steps(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn row(&self, step: usize) -> Option<&[u8]> {
        self.rows.get(step).map(Vec::as_slice)
    }

    /// Occupied cells per row.
    pub fn vehicle_counts(&self) -> Vec<usize> {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|&&c| c == 1).count())
            .collect()
    }

    /// Lowercase hex BLAKE3 digest of the matrix.
    pub fn checksum(&self) -> String {
        let mut hasher = Hasher::new();
        hasher.update(&(self.length as u64).to_le_bytes());
        hasher.update(&(self.rows.len() as u64).to_le_bytes());
        for row in &self.rows {
            hasher.update(row);
        }
        hex::encode(hasher.finalize().as_bytes())
    }

    /// Fails with [`DriverError::ChecksumMismatch`] unless the checksum
    /// equals `expected` (case-insensitive).
    pub fn verify_checksum(&self, expected: &str) -> Result<(), DriverError> {
        let actual = self.checksum();
        if actual.eq_ignore_ascii_case(expected.trim()) {
            Ok(())
        } else {
            Err(DriverError::ChecksumMismatch {
                expected: expected.to_owned(),
                actual,
            })
        }
    }

    /// Writes one line per row, each cell as `0` or `1`.
    pub fn write_matrix<W: Write>(&self, mut out: W) -> Result<(), DriverError> {
        let mut line = Vec::with_capacity(self.length + 1);
        for row in &self.rows {
            line.clear();
            line.extend(row.iter().map(|c| b'0' + c));
            line.push(b'\n');
            out.write_all(&line)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpaceTime {
        let mut trace = SpaceTime::with_capacity(4, 2);
        trace.push(vec![1, 0, 1, 0]);
        trace.push(vec![0, 1, 0, 1]);
        trace
    }

    #[test]
    fn test_matrix_output() {
        let mut out = Vec::new();
        sample().write_matrix(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1010\n0101\n");
    }

    #[test]
    fn test_checksum_identifies_trace() {
        let a = sample();
        let b = sample();
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 64);

        let mut c = sample();
        c.push(vec![0, 0, 1, 1]);
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn test_verify_checksum() {
        let trace = sample();
        let checksum = trace.checksum();
        trace.verify_checksum(&checksum).unwrap();
        trace.verify_checksum(&checksum.to_uppercase()).unwrap();
        assert!(matches!(
            trace.verify_checksum("00"),
            Err(DriverError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_vehicle_counts() {
        assert_eq!(sample().vehicle_counts(), vec![2, 2]);
        assert_eq!(sample().row(1), Some(&[0u8, 1, 0, 1][..]));
        assert_eq!(sample().row(2), None);
    }
}
