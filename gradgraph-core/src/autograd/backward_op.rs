use ndarray::ArrayD;

use crate::autograd::graph::NodeId;
use crate::error::AutogradError;
use crate::ops::activation::relu;
use crate::ops::arithmetic::{add, div, mul, sub};
use crate::ops::linalg::matmul;
use crate::tensor_data::NodeData;
use crate::types::GraphNumeric;

/// The operation that produced a node of the computation graph.
///
/// Each variant stores the operand ids it was built from and, for the scalar
/// variants, the scalar itself. The forward value is computed eagerly when the node
/// is recorded; only the backward rule is deferred until the reverse pass.
///
/// Edges always point from a consumer to its operands, and operands are recorded
/// before their consumers, so the graph formed by these variants is acyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum Op<T: GraphNumeric> {
    /// A node created directly from data (parameter or input).
    Leaf,
    /// `lhs + rhs`, elementwise, identical shapes.
    Add { lhs: NodeId, rhs: NodeId },
    /// `lhs - rhs`, elementwise, identical shapes.
    Sub { lhs: NodeId, rhs: NodeId },
    /// `input + scalar`.
    AddScalar { input: NodeId, scalar: T },
    /// `input - scalar`.
    SubScalar { input: NodeId, scalar: T },
    /// `input * scalar`.
    MulScalar { input: NodeId, scalar: T },
    /// `input / scalar`.
    DivScalar { input: NodeId, scalar: T },
    /// Contraction of the last axis of `lhs` with the first axis of `rhs`.
    Matmul { lhs: NodeId, rhs: NodeId },
    /// `max(input, 0)`, elementwise.
    Relu { input: NodeId },
}

impl<T: GraphNumeric> Op<T> {
    /// Returns the operand ids in operand order. Empty for leaves.
    ///
    /// An operand used twice (e.g. `a + a`) appears twice.
    pub fn parents(&self) -> Vec<NodeId> {
        match *self {
            Op::Leaf => Vec::new(),
            Op::Add { lhs, rhs } | Op::Sub { lhs, rhs } | Op::Matmul { lhs, rhs } => vec![lhs, rhs],
            Op::AddScalar { input, .. }
            | Op::SubScalar { input, .. }
            | Op::MulScalar { input, .. }
            | Op::DivScalar { input, .. }
            | Op::Relu { input } => vec![input],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "leaf",
            Op::Add { .. } => "add",
            Op::Sub { .. } => "sub",
            Op::AddScalar { .. } => "add_scalar",
            Op::SubScalar { .. } => "sub_scalar",
            Op::MulScalar { .. } => "mul_scalar",
            Op::DivScalar { .. } => "div_scalar",
            Op::Matmul { .. } => "matmul",
            Op::Relu { .. } => "relu",
        }
    }

    /// Computes the forward value of this operation from the operand nodes.
    pub(crate) fn forward(&self, nodes: &[NodeData<T>]) -> Result<ArrayD<T>, AutogradError> {
        match *self {
            Op::Leaf => Err(AutogradError::InternalError(
                "leaf nodes carry their own data and have no forward computation".to_string(),
            )),
            Op::Add { lhs, rhs } => add::add_op(&node_at(nodes, lhs)?.data, &node_at(nodes, rhs)?.data),
            Op::Sub { lhs, rhs } => sub::sub_op(&node_at(nodes, lhs)?.data, &node_at(nodes, rhs)?.data),
            Op::AddScalar { input, scalar } => Ok(add::add_scalar_op(&node_at(nodes, input)?.data, scalar)),
            Op::SubScalar { input, scalar } => Ok(sub::sub_scalar_op(&node_at(nodes, input)?.data, scalar)),
            Op::MulScalar { input, scalar } => Ok(mul::mul_scalar_op(&node_at(nodes, input)?.data, scalar)),
            Op::DivScalar { input, scalar } => div::div_scalar_op(&node_at(nodes, input)?.data, scalar),
            Op::Matmul { lhs, rhs } => {
                matmul::matmul_op(&node_at(nodes, lhs)?.data, &node_at(nodes, rhs)?.data)
            }
            Op::Relu { input } => Ok(relu::relu_op(&node_at(nodes, input)?.data)),
        }
    }

    /// Computes the gradient contribution for every operand that requires grad.
    ///
    /// `upstream` is the gradient flowing into the output of this operation. The
    /// returned pairs are in operand order; an operand used twice receives two
    /// entries, which the caller sums.
    pub(crate) fn backward(
        &self,
        upstream: &ArrayD<T>,
        nodes: &[NodeData<T>],
    ) -> Result<Vec<(NodeId, ArrayD<T>)>, AutogradError> {
        let tracks = |id: NodeId| -> Result<bool, AutogradError> { Ok(node_at(nodes, id)?.requires_grad) };
        let mut grads = Vec::with_capacity(2);
        match *self {
            Op::Leaf => {}
            Op::Add { lhs, rhs } => {
                if tracks(lhs)? {
                    grads.push((lhs, add::add_backward(upstream)));
                }
                if tracks(rhs)? {
                    grads.push((rhs, add::add_backward(upstream)));
                }
            }
            Op::Sub { lhs, rhs } => {
                if tracks(lhs)? {
                    grads.push((lhs, sub::sub_backward_lhs(upstream)));
                }
                if tracks(rhs)? {
                    grads.push((rhs, sub::sub_backward_rhs(upstream)));
                }
            }
            Op::AddScalar { input, .. } => {
                if tracks(input)? {
                    grads.push((input, add::add_backward(upstream)));
                }
            }
            Op::SubScalar { input, .. } => {
                if tracks(input)? {
                    grads.push((input, sub::sub_backward_lhs(upstream)));
                }
            }
            Op::MulScalar { input, scalar } => {
                if tracks(input)? {
                    grads.push((input, mul::mul_scalar_backward(upstream, scalar)));
                }
            }
            Op::DivScalar { input, scalar } => {
                if tracks(input)? {
                    grads.push((input, div::div_scalar_backward(upstream, scalar)));
                }
            }
            Op::Matmul { lhs, rhs } => {
                let a = &node_at(nodes, lhs)?.data;
                let b = &node_at(nodes, rhs)?.data;
                matmul::check_backward_rank(a, b)?;
                if tracks(lhs)? {
                    grads.push((lhs, matmul::matmul_backward_lhs(upstream, a, b)?));
                }
                if tracks(rhs)? {
                    grads.push((rhs, matmul::matmul_backward_rhs(upstream, a, b)?));
                }
            }
            Op::Relu { input } => {
                if tracks(input)? {
                    grads.push((input, relu::relu_backward(upstream, &node_at(nodes, input)?.data)));
                }
            }
        }
        Ok(grads)
    }
}

/// Looks up a node slot, turning a stale or foreign id into an error.
pub(crate) fn node_at<T: GraphNumeric>(nodes: &[NodeData<T>], id: NodeId) -> Result<&NodeData<T>, AutogradError> {
    match nodes.get(id.index()) {
        Some(node) if node.stamp == id.stamp() => Ok(node),
        _ => Err(AutogradError::InvalidNode {
            node: id.index(),
            len: nodes.len(),
        }),
    }
}

pub(crate) fn node_at_mut<T: GraphNumeric>(
    nodes: &mut [NodeData<T>],
    id: NodeId,
) -> Result<&mut NodeData<T>, AutogradError> {
    let len = nodes.len();
    match nodes.get_mut(id.index()) {
        Some(node) if node.stamp == id.stamp() => Ok(node),
        _ => Err(AutogradError::InvalidNode { node: id.index(), len }),
    }
}
