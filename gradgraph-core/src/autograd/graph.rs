use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use log::{debug, trace, warn};
use ndarray::ArrayD;

use crate::autograd::backward_op::{node_at, node_at_mut, Op};
use crate::error::AutogradError;
use crate::tensor_data::NodeData;
use crate::types::GraphNumeric;

/// Identifier of a node inside a [`Graph`] arena.
///
/// Ids are handed out in construction order. Because an operation can only refer to
/// nodes that already exist, every operand id is strictly smaller than the id of the
/// node consuming it.
///
/// Besides its position an id carries the stamp of the node it was issued for. An id
/// whose node was dropped by [`Graph::truncate`], or that was issued by another
/// graph, fails with `InvalidNode` even if its slot is occupied again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    stamp: u64,
}

impl NodeId {
    pub(crate) fn new(index: usize, stamp: u64) -> Self {
        NodeId { index, stamp }
    }

    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn stamp(self) -> u64 {
        self.stamp
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Arena holding every node of a computation graph.
///
/// Nodes are appended as forward operations execute and are addressed by
/// [`NodeId`]. The arena uses interior mutability so that gradient bookkeeping and
/// operator sugar work through shared references; it is meant to be used from one
/// thread at a time (`Send`, not `Sync`). Parallel trainers build one graph per
/// worker and combine parameter gradients with
/// [`GradientBuffer`](crate::autograd::GradientBuffer).
pub struct Graph<T: GraphNumeric> {
    nodes: RefCell<Vec<NodeData<T>>>,
}

impl<T: GraphNumeric> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: GraphNumeric> fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.nodes.borrow();
        f.debug_struct("Graph").field("len", &nodes.len()).finish()
    }
}

impl<T: GraphNumeric> Graph<T> {
    pub fn new() -> Self {
        Graph {
            nodes: RefCell::new(Vec::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Graph {
            nodes: RefCell::new(Vec::with_capacity(capacity)),
        }
    }

    /// Number of nodes currently held by the arena.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    // --- Construction ---

    /// Records a leaf node holding `data`.
    pub fn leaf(&self, data: ArrayD<T>, requires_grad: bool) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let node = NodeData::new(data, requires_grad, Op::Leaf);
        let id = NodeId::new(nodes.len(), node.stamp);
        nodes.push(node);
        trace!("leaf {} recorded (requires_grad = {})", id, requires_grad);
        id
    }

    /// Records an operation node, computing its forward value immediately.
    ///
    /// `requires_grad` overrides the default flag, which is the logical OR of the
    /// operands' flags. Shape errors surface here, never during backward.
    pub fn record(&self, op: Op<T>, requires_grad: Option<bool>) -> Result<NodeId, AutogradError> {
        if matches!(op, Op::Leaf) {
            return Err(AutogradError::InvalidArgument(
                "leaf nodes are created with Graph::leaf".to_string(),
            ));
        }
        let (data, inherited) = {
            let nodes = self.nodes.borrow();
            let data = op.forward(&nodes)?;
            let mut inherited = false;
            for parent in op.parents() {
                inherited |= node_at(&nodes, parent)?.requires_grad;
            }
            (data, inherited)
        };
        let requires_grad = requires_grad.unwrap_or(inherited);
        let node = NodeData::new(data, requires_grad, op);
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId::new(nodes.len(), node.stamp);
        trace!("{} recorded as {} (requires_grad = {})", node.op.name(), id, requires_grad);
        nodes.push(node);
        Ok(id)
    }

    // --- Inspection ---

    pub(crate) fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&NodeData<T>) -> R) -> Result<R, AutogradError> {
        let nodes = self.nodes.borrow();
        node_at(&nodes, id).map(f)
    }

    fn with_node_mut<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut NodeData<T>) -> Result<R, AutogradError>,
    ) -> Result<R, AutogradError> {
        let mut nodes = self.nodes.borrow_mut();
        f(node_at_mut(&mut nodes, id)?)
    }

    /// Returns a copy of the node's current value.
    pub fn data(&self, id: NodeId) -> Result<ArrayD<T>, AutogradError> {
        self.with_node(id, |node| node.data.clone())
    }

    pub fn shape(&self, id: NodeId) -> Result<Vec<usize>, AutogradError> {
        self.with_node(id, |node| node.shape().to_vec())
    }

    /// Returns a copy of the accumulated gradient, `None` for non-tracking nodes.
    pub fn grad(&self, id: NodeId) -> Result<Option<ArrayD<T>>, AutogradError> {
        self.with_node(id, |node| node.grad.clone())
    }

    pub fn requires_grad(&self, id: NodeId) -> Result<bool, AutogradError> {
        self.with_node(id, |node| node.requires_grad)
    }

    /// Operand ids of the node, empty for leaves.
    pub fn parents(&self, id: NodeId) -> Result<Vec<NodeId>, AutogradError> {
        self.with_node(id, |node| node.op.parents())
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool, AutogradError> {
        self.with_node(id, |node| node.is_leaf())
    }

    pub fn op(&self, id: NodeId) -> Result<Op<T>, AutogradError> {
        self.with_node(id, |node| node.op.clone())
    }

    pub fn op_name(&self, id: NodeId) -> Result<&'static str, AutogradError> {
        self.with_node(id, |node| node.op.name())
    }

    // --- Mutation ---

    /// Accumulates `delta` into the node's gradient.
    pub fn add_grad(&self, id: NodeId, delta: &ArrayD<T>) -> Result<(), AutogradError> {
        self.with_node_mut(id, |node| node.accumulate(id.index(), delta))
    }

    /// Replaces the node's gradient with `seed`. Used to seed a backward root.
    pub fn set_grad(&self, id: NodeId, seed: ArrayD<T>) -> Result<(), AutogradError> {
        self.with_node_mut(id, |node| node.seed(id.index(), seed))
    }

    /// Resets the node's gradient to zero. No-op for nodes without a gradient.
    pub fn zero_grad(&self, id: NodeId) -> Result<(), AutogradError> {
        self.with_node_mut(id, |node| {
            node.clear_grad();
            Ok(())
        })
    }

    pub fn zero_grads(&self, ids: &[NodeId]) -> Result<(), AutogradError> {
        ids.iter().try_for_each(|&id| self.zero_grad(id))
    }

    /// Resets the gradient of every node in the arena.
    pub fn zero_all_grads(&self) {
        for node in self.nodes.borrow_mut().iter_mut() {
            node.clear_grad();
        }
    }

    /// Replaces the value of a leaf, e.g. after a parameter update.
    ///
    /// The new value must keep the leaf's shape; nodes already computed from the
    /// old value are not recomputed.
    pub fn replace_data(&self, id: NodeId, data: ArrayD<T>) -> Result<(), AutogradError> {
        self.with_node_mut(id, |node| {
            if !node.is_leaf() {
                return Err(AutogradError::NotALeaf { node: id.index() });
            }
            if data.shape() != node.shape() {
                return Err(AutogradError::ShapeMismatch {
                    expected: node.shape().to_vec(),
                    actual: data.shape().to_vec(),
                    operation: "replace_data".to_string(),
                });
            }
            node.data = data;
            Ok(())
        })
    }

    // --- Teardown ---

    /// Marks the current end of the arena for a later [`truncate`](Self::truncate).
    pub fn checkpoint(&self) -> usize {
        self.len()
    }

    /// Drops every node recorded after `mark`.
    ///
    /// Operands always precede their consumers, so the remaining nodes still form a
    /// complete graph. Typical use keeps the parameter leaves and tears down the
    /// per-step graph built on top of them.
    pub fn truncate(&mut self, mark: usize) {
        let nodes = self.nodes.get_mut();
        let dropped = nodes.len().saturating_sub(mark);
        nodes.truncate(mark);
        debug!("truncate: dropped {} nodes, {} remain", dropped, nodes.len());
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    // --- Graph operations ---

    /// Orders every node reachable from `root` so that consumers come before their
    /// operands (root first, leaves last).
    ///
    /// Depth-first post-order with an explicit work stack: a node is emitted only
    /// after all its operands are finished, and the emitted list is reversed. The
    /// visited set is keyed by node id, so a shared operand is emitted once, after
    /// every consumer reachable from `root`.
    pub fn topological_sort(&self, root: NodeId) -> Result<Vec<NodeId>, AutogradError> {
        let nodes = self.nodes.borrow();
        let root_parents = node_at(&nodes, root)?.op.parents();

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut finished: Vec<NodeId> = Vec::new();
        let mut stack: Vec<(NodeId, std::vec::IntoIter<NodeId>)> = vec![(root, root_parents.into_iter())];
        visited.insert(root);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            match frame.1.next() {
                Some(parent) => {
                    if visited.insert(parent) {
                        let grand_parents = node_at(&nodes, parent)?.op.parents();
                        stack.push((parent, grand_parents.into_iter()));
                    }
                }
                None => {
                    stack.pop();
                    finished.push(node);
                }
            }
        }

        finished.reverse();
        debug!("topological_sort: {} nodes reachable from {}", finished.len(), root);
        Ok(finished)
    }

    /// Propagates the gradient seeded at `root` to every node reachable from it.
    ///
    /// The caller seeds `root` first (see [`set_grad`](Self::set_grad)). Nodes are
    /// processed in [`topological_sort`](Self::topological_sort) order; each node's
    /// gradient for this pass is complete before its own backward rule runs. Every
    /// visited node that requires grad has its pass gradient added to its
    /// accumulator, so calling this twice without zeroing adds twice.
    ///
    /// On error no gradient is modified. A root that does not require grad makes
    /// this a no-op.
    pub fn run_backward(&self, root: NodeId) -> Result<(), AutogradError> {
        let order = self.topological_sort(root)?;

        let seed = {
            let nodes = self.nodes.borrow();
            let root_node = node_at(&nodes, root)?;
            match root_node.grad.as_ref() {
                Some(grad) if root_node.requires_grad => grad.clone(),
                _ => {
                    warn!("run_backward called on {} which does not require grad; nothing to do", root);
                    return Ok(());
                }
            }
        };

        debug!("run_backward: starting from {} over {} nodes", root, order.len());
        let mut pass_grads: HashMap<NodeId, ArrayD<T>> = HashMap::new();
        pass_grads.insert(root, seed);

        // Nothing is written until the whole pass has succeeded.
        let mut updates: Vec<(NodeId, ArrayD<T>)> = Vec::with_capacity(order.len());
        {
            let nodes = self.nodes.borrow();
            for id in order {
                let upstream = match pass_grads.remove(&id) {
                    Some(grad) => grad,
                    None => continue,
                };

                let contributions = backward_local(&nodes, id, &upstream)?;
                trace!("backward {}: {} contributions", id, contributions.len());
                for (parent, delta) in contributions {
                    match pass_grads.entry(parent) {
                        Entry::Occupied(mut entry) => *entry.get_mut() += &delta,
                        Entry::Vacant(entry) => {
                            entry.insert(delta);
                        }
                    }
                }
                if id != root {
                    updates.push((id, upstream));
                }
            }
            for (id, delta) in &updates {
                node_at(&nodes, *id)?.check_accumulate(id.index(), delta)?;
            }
        }

        let mut nodes = self.nodes.borrow_mut();
        for (id, delta) in &updates {
            node_at_mut(&mut nodes, *id)?.accumulate(id.index(), delta)?;
        }
        debug!("run_backward: finished from {}", root);
        Ok(())
    }
}

/// Gradient contributions of `id` to its operands, given the gradient flowing into
/// it. Empty when the node does not require grad or is a leaf.
pub(crate) fn backward_local<T: GraphNumeric>(
    nodes: &[NodeData<T>],
    id: NodeId,
    upstream: &ArrayD<T>,
) -> Result<Vec<(NodeId, ArrayD<T>)>, AutogradError> {
    let node = node_at(nodes, id)?;
    if !node.requires_grad || node.is_leaf() {
        return Ok(Vec::new());
    }
    if upstream.shape() != node.shape() {
        return Err(AutogradError::ShapeMismatch {
            expected: node.shape().to_vec(),
            actual: upstream.shape().to_vec(),
            operation: format!("{} backward", node.op.name()),
        });
    }
    node.op.backward(upstream, nodes)
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
