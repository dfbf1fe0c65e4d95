use ndarray::ArrayD;

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

// --- Forward Operation ---

/// Divides every element of `a` by `scalar`.
///
/// # Errors
/// Returns `DivisionByZero` if `scalar` is zero.
pub fn div_scalar_op<T: GraphNumeric>(a: &ArrayD<T>, scalar: T) -> Result<ArrayD<T>, AutogradError> {
    if scalar.is_zero() {
        return Err(AutogradError::DivisionByZero);
    }
    Ok(a / scalar)
}

// --- Backward Operation ---

/// For z = a / s: grad(a) = grad_output / s
pub(crate) fn div_scalar_backward<T: GraphNumeric>(upstream: &ArrayD<T>, scalar: T) -> ArrayD<T> {
    upstream / scalar
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `input / scalar`. Fails with `DivisionByZero` when `scalar` is zero.
    pub fn div_scalar(&self, input: NodeId, scalar: T) -> Result<NodeId, AutogradError> {
        self.record(Op::DivScalar { input, scalar }, None)
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    pub fn try_div_scalar(&self, scalar: T) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.div_scalar(self.id, scalar)?;
        Ok(Tensor::from_id(self.graph, id))
    }
}

#[cfg(test)]
#[path = "div_test.rs"]
mod tests;
