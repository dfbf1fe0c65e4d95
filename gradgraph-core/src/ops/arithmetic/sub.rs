use ndarray::ArrayD;

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::ops::check_same_shape;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

// --- Forward Operation ---

/// Elementwise subtraction `a - b` of two arrays of identical shape.
pub fn sub_op<T: GraphNumeric>(a: &ArrayD<T>, b: &ArrayD<T>) -> Result<ArrayD<T>, AutogradError> {
    check_same_shape(a.shape(), b.shape(), "sub")?;
    Ok(a - b)
}

/// Subtracts `scalar` from every element of `a`.
pub fn sub_scalar_op<T: GraphNumeric>(a: &ArrayD<T>, scalar: T) -> ArrayD<T> {
    a - scalar
}

// --- Backward Operation ---
// For z = a - b:
// grad(a) = grad_output
// grad(b) = -grad_output

pub(crate) fn sub_backward_lhs<T: GraphNumeric>(upstream: &ArrayD<T>) -> ArrayD<T> {
    upstream.clone()
}

pub(crate) fn sub_backward_rhs<T: GraphNumeric>(upstream: &ArrayD<T>) -> ArrayD<T> {
    upstream.mapv(|g| -g)
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `lhs - rhs`.
    pub fn sub(&self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, AutogradError> {
        self.record(Op::Sub { lhs, rhs }, None)
    }

    /// Records `input - scalar`.
    pub fn sub_scalar(&self, input: NodeId, scalar: T) -> Result<NodeId, AutogradError> {
        self.record(Op::SubScalar { input, scalar }, None)
    }

    /// Records `scalar - input`, as `(input - scalar) * -1`.
    pub fn rsub_scalar(&self, scalar: T, input: NodeId) -> Result<NodeId, AutogradError> {
        let shifted = self.sub_scalar(input, scalar)?;
        self.mul_scalar(shifted, -T::one())
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    pub fn try_sub(&self, other: &Tensor<'g, T>) -> Result<Tensor<'g, T>, AutogradError> {
        let graph = self.same_graph(other, "sub")?;
        let id = graph.sub(self.id, other.id)?;
        Ok(Tensor::from_id(graph, id))
    }

    pub fn try_sub_scalar(&self, scalar: T) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.sub_scalar(self.id, scalar)?;
        Ok(Tensor::from_id(self.graph, id))
    }

    /// `scalar - self`.
    pub fn try_rsub_scalar(&self, scalar: T) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.rsub_scalar(scalar, self.id)?;
        Ok(Tensor::from_id(self.graph, id))
    }
}

#[cfg(test)]
#[path = "sub_test.rs"]
mod tests;
