//! Distance computation.

mod matrix;

pub use matrix::DistanceMatrix;
