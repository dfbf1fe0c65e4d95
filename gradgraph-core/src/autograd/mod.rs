//! # Reverse-mode differentiation
//!
//! - [`graph`]: the [`Graph`] arena, [`NodeId`], topological ordering and the
//!   reverse traversal driver.
//! - [`backward_op`]: the [`Op`] enum, one variant per differentiable operation.
//! - [`grad_buffer`]: [`GradientBuffer`], per-worker parameter gradients.
//! - [`grad_check`]: finite-difference gradient checking.

pub mod backward_op;
pub mod grad_buffer;
pub mod grad_check;
pub mod graph;

pub use backward_op::Op;
pub use grad_buffer::GradientBuffer;
pub use grad_check::{check_grad, numerical_gradients, GradCheckConfig, GradCheckError};
pub use graph::{Graph, NodeId};
