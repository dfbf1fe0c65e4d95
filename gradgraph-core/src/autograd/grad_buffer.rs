use log::debug;
use ndarray::ArrayD;

use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::types::GraphNumeric;

/// Parameter gradients collected outside of any graph.
///
/// A worker thread builds its own [`Graph`], runs backward, and extracts the
/// gradients of the parameter leaves with [`from_graph`](Self::from_graph). Once the
/// parallel region is over, the buffers are combined with [`merge`](Self::merge) and
/// the total is added to the master parameters with [`apply_to`](Self::apply_to).
/// Gradients are positional: the `i`-th entry belongs to the `i`-th parameter of
/// the list the buffer was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBuffer<T: GraphNumeric> {
    grads: Vec<ArrayD<T>>,
}

impl<T: GraphNumeric> GradientBuffer<T> {
    pub fn new(grads: Vec<ArrayD<T>>) -> Self {
        GradientBuffer { grads }
    }

    /// Copies the current gradient of every node in `params`.
    ///
    /// # Errors
    /// `RequiresGradNotMet` if one of the nodes does not require grad.
    pub fn from_graph(graph: &Graph<T>, params: &[NodeId]) -> Result<Self, AutogradError> {
        let grads = params
            .iter()
            .map(|&id| graph.grad(id)?.ok_or(AutogradError::RequiresGradNotMet { node: id.index() }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GradientBuffer { grads })
    }

    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    pub fn grads(&self) -> &[ArrayD<T>] {
        &self.grads
    }

    pub fn into_inner(self) -> Vec<ArrayD<T>> {
        self.grads
    }

    /// Adds `other` into `self`, entry by entry.
    ///
    /// Both buffers are validated before anything is written, so a failed merge
    /// leaves `self` unchanged.
    pub fn merge(&mut self, other: &GradientBuffer<T>) -> Result<(), AutogradError> {
        if self.grads.len() != other.grads.len() {
            return Err(AutogradError::InconsistentParameterCount {
                expected: self.grads.len(),
                actual: other.grads.len(),
            });
        }
        for (mine, theirs) in self.grads.iter().zip(other.grads.iter()) {
            if mine.shape() != theirs.shape() {
                return Err(AutogradError::ShapeMismatch {
                    expected: mine.shape().to_vec(),
                    actual: theirs.shape().to_vec(),
                    operation: "gradient buffer merge".to_string(),
                });
            }
        }
        for (mine, theirs) in self.grads.iter_mut().zip(other.grads.iter()) {
            *mine += theirs;
        }
        Ok(())
    }

    /// Multiplies every gradient by `factor`, e.g. `1 / workers` to average.
    pub fn scale(&mut self, factor: T) {
        for grad in self.grads.iter_mut() {
            grad.mapv_inplace(|g| g * factor);
        }
    }

    /// Accumulates the buffer into the gradients of `params` in `graph`.
    ///
    /// # Errors
    /// `InconsistentParameterCount` if `params` and the buffer differ in length;
    /// otherwise whatever [`Graph::add_grad`] reports. Shapes are checked for every
    /// entry before the first write.
    pub fn apply_to(&self, graph: &Graph<T>, params: &[NodeId]) -> Result<(), AutogradError> {
        if params.len() != self.grads.len() {
            return Err(AutogradError::InconsistentParameterCount {
                expected: params.len(),
                actual: self.grads.len(),
            });
        }
        for (&id, grad) in params.iter().zip(self.grads.iter()) {
            let shape = graph.shape(id)?;
            if shape.as_slice() != grad.shape() {
                return Err(AutogradError::ShapeMismatch {
                    expected: shape,
                    actual: grad.shape().to_vec(),
                    operation: "gradient buffer apply".to_string(),
                });
            }
        }
        for (&id, grad) in params.iter().zip(self.grads.iter()) {
            graph.add_grad(id, grad)?;
        }
        debug!("gradient buffer applied to {} parameters", params.len());
        Ok(())
    }
}
