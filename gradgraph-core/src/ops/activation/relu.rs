use ndarray::{ArrayD, Zip};

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

// --- Forward Operation ---

/// Applies the Rectified Linear Unit element-wise.
/// ReLU(x) = max(0, x)
pub fn relu_op<T: GraphNumeric>(a: &ArrayD<T>) -> ArrayD<T> {
    a.mapv(|x| if x > T::zero() { x } else { T::zero() })
}

// --- Backward Operation ---

/// Passes the upstream gradient where the input was strictly positive, zero
/// elsewhere (including at 0).
pub(crate) fn relu_backward<T: GraphNumeric>(upstream: &ArrayD<T>, input: &ArrayD<T>) -> ArrayD<T> {
    Zip::from(upstream)
        .and(input)
        .map_collect(|&g, &x| if x > T::zero() { g } else { T::zero() })
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `relu(input)`.
    pub fn relu(&self, input: NodeId) -> Result<NodeId, AutogradError> {
        self.record(Op::Relu { input }, None)
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    pub fn relu(&self) -> Result<Tensor<'g, T>, AutogradError> {
        let id = self.graph.relu(self.id)?;
        Ok(Tensor::from_id(self.graph, id))
    }
}

#[cfg(test)]
#[path = "relu_test.rs"]
mod tests;
