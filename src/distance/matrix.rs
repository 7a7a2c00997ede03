//! Dense Euclidean distance matrix.

use crate::models::Location;

/// Pairwise Euclidean distances between a fixed set of points, row-major.
///
/// [`ProblemModel`](crate::models::ProblemModel) builds one over depot
/// locations followed by order destinations.
///
/// # Examples
///
/// ```
/// use u_logistics::models::Location;
/// use u_logistics::distance::DistanceMatrix;
///
/// let dm = DistanceMatrix::from_locations(&[Location::new(0.0, 0.0), Location::new(3.0, 4.0)]);
/// assert!((dm.get(1, 0) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Computes all pairwise distances. The result is symmetric with a zero
    /// diagonal.
    pub fn from_locations(locations: &[Location]) -> Self {
        let size = locations.len();
        let mut data = vec![0.0; size * size];
        for (i, a) in locations.iter().enumerate() {
            for (j, b) in locations.iter().enumerate().skip(i + 1) {
                let d = a.distance_to(b);
                data[i * size + j] = d;
                data[j * size + i] = d;
            }
        }
        Self { data, size }
    }

    /// Distance between points `from` and `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of points.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_with_zero_diagonal() {
        let dm = DistanceMatrix::from_locations(&[
            Location::new(0.0, 0.0),
            Location::new(3.0, 4.0),
            Location::new(0.0, 8.0),
        ]);
        assert_eq!(dm.size(), 3);
        assert!((dm.get(0, 2) - 8.0).abs() < 1e-10);
        assert!((dm.get(1, 2) - 5.0).abs() < 1e-10);
        for i in 0..3 {
            assert_eq!(dm.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(dm.get(i, j), dm.get(j, i));
            }
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(DistanceMatrix::from_locations(&[]).size(), 0);
    }
}
