//! # Graph Operations Module (`ops`)
//!
//! Every differentiable operation of the engine lives here, one file per operation
//! family. Each file provides:
//!
//! - **`_op` kernels:** the forward computation on plain `ndarray` arrays
//!   (`add_op`, `matmul_op`, ...), called by `Op::forward` when a node is recorded.
//! - **`_backward` rules:** the local gradient rule for each operand, called by
//!   `Op::backward` during the reverse pass.
//! - **Graph constructors:** `Graph::add`, `Graph::matmul`, ... which record the
//!   corresponding [`Op`](crate::autograd::Op) variant.
//! - **Tensor methods:** `Tensor::try_add`, `Tensor::matmul`, ... on the handle.
//!
//! ## Submodules:
//!
//! - [`arithmetic`]: add, sub (tensor and scalar), scalar mul and div.
//! - [`linalg`]: matmul (axis contraction).
//! - [`activation`]: relu.

use crate::error::AutogradError;

pub mod activation;
pub mod arithmetic;
pub mod linalg;

/// Fails with `ShapeMismatch` unless both shapes are identical.
///
/// Elementwise operations between two nodes do not broadcast.
pub(crate) fn check_same_shape(lhs: &[usize], rhs: &[usize], operation: &str) -> Result<(), AutogradError> {
    if lhs != rhs {
        return Err(AutogradError::ShapeMismatch {
            expected: lhs.to_vec(),
            actual: rhs.to_vec(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_same_shape() {
        assert!(check_same_shape(&[2, 3], &[2, 3], "add").is_ok());
        let err = check_same_shape(&[2, 3], &[3, 2], "sub").unwrap_err();
        assert_eq!(
            err,
            AutogradError::ShapeMismatch {
                expected: vec![2, 3],
                actual: vec![3, 2],
                operation: "sub".to_string(),
            }
        );
    }
}
