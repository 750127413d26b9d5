//! Single-row sparse count vectors.

use std::collections::BTreeMap;

/// A sparse row vector. Indices are strictly increasing and below `width`;
/// only non-zero entries are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    width: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    pub fn zeros(width: usize) -> Self {
        Self {
            width,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from accumulated counts. Entries outside `width` or
    /// equal to zero are dropped.
    pub fn from_counts(width: usize, counts: BTreeMap<usize, f64>) -> Self {
        let (indices, values) = counts
            .into_iter()
            .filter(|(i, v)| *i < width && *v != 0.0)
            .unzip();
        Self {
            width,
            indices,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Horizontal concatenation: the columns of `parts` laid side by side,
    /// in the order given.
    pub fn hstack(parts: &[SparseVector]) -> Self {
        let width = parts.iter().map(|p| p.width).sum();
        let nnz = parts.iter().map(|p| p.nnz()).sum();
        let mut indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        let mut offset = 0;
        for part in parts {
            for (i, v) in part.iter() {
                indices.push(offset + i);
                values.push(v);
            }
            offset += part.width;
        }

        Self {
            width,
            indices,
            values,
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.width];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts_drops_zeros_and_out_of_range() {
        let counts = BTreeMap::from([(0, 2.0), (1, 0.0), (5, 1.0)]);
        let v = SparseVector::from_counts(3, counts);
        assert_eq!(v.width(), 3);
        assert_eq!(v.nnz(), 1);
        assert_eq!(v.to_dense(), vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hstack_offsets_columns_in_order() {
        let a = SparseVector::from_counts(2, BTreeMap::from([(1, 1.0)]));
        let b = SparseVector::zeros(3);
        let c = SparseVector::from_counts(2, BTreeMap::from([(0, 4.0)]));

        let stacked = SparseVector::hstack(&[a, b, c]);
        assert_eq!(stacked.width(), 7);
        assert_eq!(stacked.to_dense(), vec![0.0, 1.0, 0.0, 0.0, 0.0, 4.0, 0.0]);
        assert_eq!(stacked.get(5), 4.0);
        assert_eq!(stacked.get(4), 0.0);
    }

    #[test]
    fn test_hstack_of_empty_parts() {
        let stacked = SparseVector::hstack(&[SparseVector::zeros(0), SparseVector::zeros(0)]);
        assert_eq!(stacked.width(), 0);
        assert_eq!(stacked.nnz(), 0);
    }
}
