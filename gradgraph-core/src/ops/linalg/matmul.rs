use ndarray::{Array2, ArrayD, IxDyn};

use crate::autograd::backward_op::Op;
use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

/// Copies `x` into a row-major `rows x cols` matrix.
fn as_matrix<T: GraphNumeric>(x: &ArrayD<T>, rows: usize, cols: usize) -> Result<Array2<T>, AutogradError> {
    Ok(x.as_standard_layout().into_owned().into_shape((rows, cols))?)
}

/// Reshapes a matrix result back to `shape`, reading it in row-major order.
fn from_matrix<T: GraphNumeric>(x: Array2<T>, shape: IxDyn) -> Result<ArrayD<T>, AutogradError> {
    Ok(x.as_standard_layout().into_owned().into_shape(shape)?)
}

// --- Forward Operation ---

/// Contracts the last axis of `a` with the first axis of `b`.
///
/// Both operands need rank >= 1. The output shape is `a.shape[..-1] ++ b.shape[1..]`,
/// so two vectors give a rank-0 result and two matrices the usual matrix product.
///
/// # Errors
/// - `ShapeMismatch` ("matmul (rank check)") if either operand is rank 0.
/// - `ShapeMismatch` ("matmul (inner dim)") if the contracted axes differ in length.
pub fn matmul_op<T: GraphNumeric>(a: &ArrayD<T>, b: &ArrayD<T>) -> Result<ArrayD<T>, AutogradError> {
    let a_shape = a.shape();
    let b_shape = b.shape();

    if a_shape.is_empty() || b_shape.is_empty() {
        return Err(AutogradError::ShapeMismatch {
            expected: a_shape.to_vec(),
            actual: b_shape.to_vec(),
            operation: "matmul (rank check)".to_string(),
        });
    }
    let k = a_shape[a_shape.len() - 1];
    if b_shape[0] != k {
        return Err(AutogradError::ShapeMismatch {
            expected: a_shape.to_vec(),
            actual: b_shape.to_vec(),
            operation: "matmul (inner dim)".to_string(),
        });
    }

    let outer_a = &a_shape[..a_shape.len() - 1];
    let outer_b = &b_shape[1..];
    let m: usize = outer_a.iter().product();
    let n: usize = outer_b.iter().product();

    let a2 = as_matrix(a, m, k)?;
    let b2 = as_matrix(b, k, n)?;
    let product = a2.dot(&b2);

    let output_shape: Vec<usize> = outer_a.iter().chain(outer_b.iter()).copied().collect();
    from_matrix(product, IxDyn(&output_shape))
}

// --- Backward Operation ---
// For C = A @ B (vectors promoted to 1 x k on the left, k x 1 on the right):
// grad(A) = grad_output @ B^T
// grad(B) = A^T @ grad_output

/// Fails with `UnimplementedOperation` for operands above rank 2.
pub(crate) fn check_backward_rank<T: GraphNumeric>(a: &ArrayD<T>, b: &ArrayD<T>) -> Result<(), AutogradError> {
    for operand in [a, b] {
        if operand.ndim() > 2 {
            return Err(AutogradError::UnimplementedOperation {
                operation: "matmul backward".to_string(),
                rank: operand.ndim(),
            });
        }
    }
    Ok(())
}

/// Matrix views of both operands and of the upstream gradient, as `(m x k, k x n, m x n)`.
fn backward_matrices<T: GraphNumeric>(
    upstream: &ArrayD<T>,
    a: &ArrayD<T>,
    b: &ArrayD<T>,
) -> Result<(Array2<T>, Array2<T>, Array2<T>), AutogradError> {
    check_backward_rank(a, b)?;
    let k = b.shape()[0];
    let m = if a.ndim() == 1 { 1 } else { a.shape()[0] };
    let n = if b.ndim() == 1 { 1 } else { b.shape()[1] };
    Ok((as_matrix(a, m, k)?, as_matrix(b, k, n)?, as_matrix(upstream, m, n)?))
}

pub(crate) fn matmul_backward_lhs<T: GraphNumeric>(
    upstream: &ArrayD<T>,
    a: &ArrayD<T>,
    b: &ArrayD<T>,
) -> Result<ArrayD<T>, AutogradError> {
    let (_, b2, g2) = backward_matrices(upstream, a, b)?;
    from_matrix(g2.dot(&b2.t()), a.raw_dim())
}

pub(crate) fn matmul_backward_rhs<T: GraphNumeric>(
    upstream: &ArrayD<T>,
    a: &ArrayD<T>,
    b: &ArrayD<T>,
) -> Result<ArrayD<T>, AutogradError> {
    let (a2, _, g2) = backward_matrices(upstream, a, b)?;
    from_matrix(a2.t().dot(&g2), b.raw_dim())
}

// --- Graph construction ---

impl<T: GraphNumeric> Graph<T> {
    /// Records `lhs @ rhs`.
    pub fn matmul(&self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, AutogradError> {
        self.record(Op::Matmul { lhs, rhs }, None)
    }
}

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    /// Fallible matrix product. `a * b` is the panicking shorthand.
    pub fn matmul(&self, other: &Tensor<'g, T>) -> Result<Tensor<'g, T>, AutogradError> {
        let graph = self.same_graph(other, "matmul")?;
        let id = graph.matmul(self.id, other.id)?;
        Ok(Tensor::from_id(graph, id))
    }
}

#[cfg(test)]
#[path = "matmul_test.rs"]
mod tests;
