// src/tensor/mod.rs

use ndarray::ArrayD;

use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::tensor_data::NodeData;
use crate::types::GraphNumeric;

mod autograd_methods;
pub mod create;
mod traits;

/// Handle to one node of a [`Graph`].
///
/// A `Tensor` is a graph reference plus a [`NodeId`]; it is `Copy` and owns nothing.
/// The node itself lives in the arena, so a handle is valid for as long as it
/// borrows the graph: [`Graph::truncate`] and [`Graph::clear`] need `&mut Graph`
/// and cannot run while handles exist.
///
/// Handles carry the operator sugar (`a + b`, `a * b` for matmul, `a * 2.0`, ...)
/// and the usual accessors. Operators panic on invalid input; the `try_*` methods,
/// [`matmul`](Tensor::matmul) and [`relu`](Tensor::relu) return `Result` instead.
pub struct Tensor<'g, T: GraphNumeric> {
    pub(crate) graph: &'g Graph<T>,
    pub(crate) id: NodeId,
}

impl<'g, T: GraphNumeric> Clone for Tensor<'g, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'g, T: GraphNumeric> Copy for Tensor<'g, T> {}

impl<T: GraphNumeric> Graph<T> {
    /// Wraps an existing node in a handle.
    ///
    /// # Errors
    /// `InvalidNode` if `id` does not name a node of this graph.
    pub fn tensor(&self, id: NodeId) -> Result<Tensor<'_, T>, AutogradError> {
        self.with_node(id, |_| ())?;
        Ok(Tensor::from_id(self, id))
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    /// Builds a handle around an id the caller knows to be valid.
    pub(crate) fn from_id(graph: &'g Graph<T>, id: NodeId) -> Self {
        Tensor { graph, id }
    }

    /// Returns the graph of `self` if `other` belongs to the same one.
    pub(crate) fn same_graph(&self, other: &Tensor<'g, T>, operation: &str) -> Result<&'g Graph<T>, AutogradError> {
        if !std::ptr::eq(self.graph, other.graph) {
            return Err(AutogradError::GraphMismatch {
                operation: operation.to_string(),
            });
        }
        Ok(self.graph)
    }

    fn node<R>(&self, f: impl FnOnce(&NodeData<T>) -> R) -> R {
        match self.graph.with_node(self.id, f) {
            Ok(value) => value,
            Err(e) => panic!("Tensor handle {} outlived its node: {}", self.id, e),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'g Graph<T> {
        self.graph
    }

    /// Returns a copy of the node's value.
    pub fn data(&self) -> ArrayD<T> {
        self.node(|node| node.data.clone())
    }

    /// Returns a copy of the accumulated gradient, `None` if the node does not
    /// require grad.
    pub fn grad(&self) -> Option<ArrayD<T>> {
        self.node(|node| node.grad.clone())
    }

    pub fn requires_grad(&self) -> bool {
        self.node(|node| node.requires_grad)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.node(|node| node.shape().to_vec())
    }

    pub fn numel(&self) -> usize {
        self.node(|node| node.data.len())
    }

    pub fn parents(&self) -> Vec<Tensor<'g, T>> {
        self.node(|node| node.op.parents())
            .into_iter()
            .map(|id| Tensor::from_id(self.graph, id))
            .collect()
    }

    pub fn is_leaf(&self) -> bool {
        self.node(|node| node.is_leaf())
    }

    /// Name of the operation that produced this node ("leaf" for leaves).
    pub fn op_name(&self) -> &'static str {
        self.node(|node| node.op.name())
    }
}
