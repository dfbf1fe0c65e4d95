// src/tensor_data.rs
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::ArrayD;

use crate::autograd::backward_op::Op;
use crate::error::AutogradError;
use crate::types::GraphNumeric;

/// Storage and metadata for one node of the computation graph.
///
/// A `NodeData` lives in a slot of the `Graph` arena. It holds the forward value,
/// the gradient accumulator, the `requires_grad` flag and the operation that
/// produced it. Leaf nodes (created directly by the user) carry `Op::Leaf`.
/// Source of node stamps. Starts at 1 so that a zero stamp never names a node.
static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct NodeData<T: GraphNumeric> {
    /// The forward value, computed once when the node is recorded.
    pub(crate) data: ArrayD<T>,
    /// The accumulated gradient. `Some` exactly when `requires_grad` is set, and
    /// always the same shape as `data`.
    pub(crate) grad: Option<ArrayD<T>>,
    /// Whether this node participates in gradient accumulation.
    pub(crate) requires_grad: bool,
    /// The operation that produced this node.
    pub(crate) op: Op<T>,
    /// Process-wide unique stamp, copied into the node's `NodeId`.
    pub(crate) stamp: u64,
}

impl<T: GraphNumeric> NodeData<T> {
    /// Creates a node around an already computed value.
    ///
    /// The gradient accumulator is zero-initialized when `requires_grad` is true.
    pub fn new(data: ArrayD<T>, requires_grad: bool, op: Op<T>) -> Self {
        let grad = if requires_grad {
            Some(ArrayD::zeros(data.raw_dim()))
        } else {
            None
        };
        NodeData {
            data,
            grad,
            requires_grad,
            op,
            stamp: NEXT_STAMP.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Leaf)
    }

    /// Fails exactly when [`accumulate`](Self::accumulate) would, without writing.
    pub(crate) fn check_accumulate(&self, node: usize, delta: &ArrayD<T>) -> Result<(), AutogradError> {
        if self.grad.is_none() {
            return Err(AutogradError::RequiresGradNotMet { node });
        }
        if delta.shape() != self.data.shape() {
            return Err(AutogradError::ShapeMismatch {
                expected: self.data.shape().to_vec(),
                actual: delta.shape().to_vec(),
                operation: "add_grad".to_string(),
            });
        }
        Ok(())
    }

    /// Adds `delta` into the gradient accumulator.
    ///
    /// `node` is only used to build the error for a non-tracking node.
    pub(crate) fn accumulate(&mut self, node: usize, delta: &ArrayD<T>) -> Result<(), AutogradError> {
        self.check_accumulate(node, delta)?;
        if let Some(grad) = self.grad.as_mut() {
            *grad += delta;
        }
        Ok(())
    }

    /// Replaces the gradient with `seed`.
    pub(crate) fn seed(&mut self, node: usize, seed: ArrayD<T>) -> Result<(), AutogradError> {
        if !self.requires_grad {
            return Err(AutogradError::RequiresGradNotMet { node });
        }
        if seed.shape() != self.data.shape() {
            return Err(AutogradError::ShapeMismatch {
                expected: self.data.shape().to_vec(),
                actual: seed.shape().to_vec(),
                operation: "set_grad".to_string(),
            });
        }
        self.grad = Some(seed);
        Ok(())
    }

    /// Resets the gradient to zeros. No-op for non-tracking nodes.
    pub(crate) fn clear_grad(&mut self) {
        if let Some(grad) = self.grad.as_mut() {
            grad.fill(T::zero());
        }
    }
}
