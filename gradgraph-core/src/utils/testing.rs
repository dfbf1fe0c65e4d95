use ndarray::ArrayD;

#[cfg(test)]
use crate::autograd::graph::Graph;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

/// Checks that an array has the expected shape and that every element (in
/// logical order) is within `tolerance` of `expected_data`.
/// Panics with the first offending index otherwise.
pub fn check_array_near<T: GraphNumeric>(
    actual: &ArrayD<T>,
    expected_shape: &[usize],
    expected_data: &[T],
    tolerance: T,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(actual.len(), expected_data.len(), "Data length mismatch");

    for (i, (a, e)) in actual.iter().zip(expected_data.iter()).enumerate() {
        let diff = (*a - *e).abs();
        if diff.is_nan() || diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Same as [`check_array_near`] for the gradient of a handle. Panics if the node
/// holds no gradient.
pub fn check_grad_near<T: GraphNumeric>(
    tensor: &Tensor<'_, T>,
    expected_shape: &[usize],
    expected_data: &[T],
    tolerance: T,
) {
    match tensor.grad() {
        Some(grad) => check_array_near(&grad, expected_shape, expected_data, tolerance),
        None => panic!("{:?} holds no gradient", tensor),
    }
}

/// Leaf that does not require grad, for tests.
#[cfg(test)]
pub(crate) fn create_test_tensor<'g, T: GraphNumeric>(
    graph: &'g Graph<T>,
    data: Vec<T>,
    shape: &[usize],
) -> Tensor<'g, T> {
    Tensor::from_vec(graph, data, shape, false).expect("Failed to create test tensor")
}

/// Leaf that requires grad, for tests.
#[cfg(test)]
pub(crate) fn create_test_tensor_with_grad<'g, T: GraphNumeric>(
    graph: &'g Graph<T>,
    data: Vec<T>,
    shape: &[usize],
) -> Tensor<'g, T> {
    Tensor::from_vec(graph, data, shape, true).expect("Failed to create test tensor with grad")
}
