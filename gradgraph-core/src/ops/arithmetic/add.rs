// gradgraph-core/src/ops/arithmetic/add.rs

use ndarray::ArrayD;

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::ops::check_same_shape;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

// --- Forward Operation ---

/// Elementwise addition of two arrays of identical shape.
pub fn add_op<T: GraphNumeric>(a: &ArrayD<T>, b: &ArrayD<T>) -> Result<ArrayD<T>, AutogradError> {
    check_same_shape(a.shape(), b.shape(), "add")?;
    Ok(a + b)
}

/// Adds `scalar` to every element of `a`.
pub fn add_scalar_op<T: GraphNumeric>(a: &ArrayD<T>, scalar: T) -> ArrayD<T> {
    a + scalar
}

// --- Backward Operation ---

/// Gradient of `a + b` (or `a + s`) with respect to each addend: the upstream
/// gradient unchanged.
pub(crate) fn add_backward<T: GraphNumeric>(upstream: &ArrayD<T>) -> ArrayD<T> {
    upstream.clone()
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `lhs + rhs`.
    pub fn add(&self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, AutogradError> {
        self.record(Op::Add { lhs, rhs }, None)
    }

    /// Records `input + scalar`.
    pub fn add_scalar(&self, input: NodeId, scalar: T) -> Result<NodeId, AutogradError> {
        self.record(Op::AddScalar { input, scalar }, None)
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    /// Fallible elementwise addition. Both tensors must share a graph and a shape.
    pub fn try_add(&self, other: &Tensor<'g, T>) -> Result<Tensor<'g, T>, AutogradError> {
        let graph = self.same_graph(other, "add")?;
        let id = graph.add(self.id, other.id)?;
        Ok(Tensor::from_id(graph, id))
    }

    pub fn try_add_scalar(&self, scalar: T) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.add_scalar(self.id, scalar)?;
        Ok(Tensor::from_id(self.graph, id))
    }
}

#[cfg(test)]
#[path = "add_test.rs"]
mod tests;
