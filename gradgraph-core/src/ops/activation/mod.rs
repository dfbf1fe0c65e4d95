// src/ops/activation/mod.rs

//! # Activation Functions
//!
//! Elementwise non-linearities.
//!
//! ## Currently Implemented:
//! - [`ReLU`](relu/fn.relu_op.html): Rectified Linear Unit.

pub mod relu;

pub use relu::relu_op;
