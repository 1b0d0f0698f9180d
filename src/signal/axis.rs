use ndarray::Array1;

/// `len` evenly spaced values from `start` to `end`, both ends included.
pub fn linspace(start: f64, end: f64, len: usize) -> Vec<f64> {
    Array1::linspace(start, end, len).to_vec()
}
