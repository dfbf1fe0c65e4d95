use ndarray::ArrayD;

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

// --- Forward Operation ---

/// Multiplies every element of `a` by `scalar`.
///
/// Only the tensor-by-scalar product is an elementwise operation here; the
/// product of two tensors is [`matmul`](crate::ops::linalg::matmul).
pub fn mul_scalar_op<T: GraphNumeric>(a: &ArrayD<T>, scalar: T) -> ArrayD<T> {
    a * scalar
}

// --- Backward Operation ---

/// For z = a * s: grad(a) = grad_output * s
pub(crate) fn mul_scalar_backward<T: GraphNumeric>(upstream: &ArrayD<T>, scalar: T) -> ArrayD<T> {
    upstream * scalar
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `input * scalar`.
    pub fn mul_scalar(&self, input: NodeId, scalar: T) -> Result<NodeId, AutogradError> {
        self.record(Op::MulScalar { input, scalar }, None)
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    pub fn try_mul_scalar(&self, scalar: T) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.mul_scalar(self.id, scalar)?;
        Ok(Tensor::from_id(self.graph, id))
    }
}

#[cfg(test)]
#[path = "mul_test.rs"]
mod tests;
