use ndarray::{ArrayD, IxDyn};

use crate::autograd::graph::NodeId;
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    /// Accumulates `delta` into this node's gradient.
    ///
    /// # Errors
    /// `RequiresGradNotMet` if the node does not require grad, `ShapeMismatch` if
    /// `delta` does not have the node's shape.
    pub fn add_grad(&self, delta: &ArrayD<T>) -> Result<(), AutogradError> {
        self.graph.add_grad(self.id, delta)
    }

    /// Replaces this node's gradient with `seed`.
    pub fn set_grad(&self, seed: ArrayD<T>) -> Result<(), AutogradError> {
        self.graph.set_grad(self.id, seed)
    }

    pub fn zero_grad(&self) -> Result<(), AutogradError> {
        self.graph.zero_grad(self.id)
    }

    /// Replaces the value of a leaf. See [`Graph::replace_data`](crate::Graph::replace_data).
    pub fn replace_data(&self, data: ArrayD<T>) -> Result<(), AutogradError> {
        self.graph.replace_data(self.id, data)
    }

    /// Every node reachable from this one, consumers before operands.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, AutogradError> {
        self.graph.topological_sort(self.id)
    }

    /// Propagates whatever gradient this node currently holds, without seeding.
    pub fn run_backward(&self) -> Result<(), AutogradError> {
        self.graph.run_backward(self.id)
    }

    /// Seeds this node's gradient with ones and runs the reverse pass.
    ///
    /// Seeding with ones differentiates the sum of all output elements. On a node
    /// that does not require grad this is a logged no-op.
    pub fn backward(&self) -> Result<(), AutogradError> {
        if !self.requires_grad() {
            return self.graph.run_backward(self.id);
        }
        self.backward_with(ArrayD::ones(IxDyn(&self.shape())))
    }

    /// Seeds this node's gradient with `seed` and runs the reverse pass.
    ///
    /// # Errors
    /// `ShapeMismatch` if `seed` does not match this node's shape,
    /// `RequiresGradNotMet` if the node does not require grad.
    pub fn backward_with(&self, seed: ArrayD<T>) -> Result<(), AutogradError> {
        self.set_grad(seed)?;
        self.graph.run_backward(self.id)
    }
}
