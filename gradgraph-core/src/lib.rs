//! # gradgraph-core
//!
//! Reverse-mode automatic differentiation over n-dimensional arrays.
//!
//! Forward operations append nodes to a [`Graph`] arena and compute their values
//! immediately. A reverse pass from any node distributes its seeded gradient to
//! every node it depends on, accumulating contributions from all consumers.
//!
//! ```
//! use gradgraph_core::{Graph, Tensor};
//!
//! let graph = Graph::<f64>::new();
//! let a = Tensor::full(&graph, &[2, 3], 2.0, true);
//! let b = Tensor::full(&graph, &[3, 2], 3.0, true);
//! let c = a * b; // matrix product
//! c.backward().unwrap();
//! assert!(c.data().iter().all(|&x| x == 18.0));
//! assert!(a.grad().unwrap().iter().all(|&g| g == 6.0));
//! ```

pub mod autograd;
pub mod error;
pub mod ops;
pub mod tensor;
pub mod tensor_data;
pub mod types;
#[doc(hidden)]
pub mod utils;

pub use autograd::{GradientBuffer, Graph, NodeId, Op};
pub use error::AutogradError;
pub use tensor::Tensor;
pub use types::GraphNumeric;

// Re-export crates that appear in public signatures
pub use ndarray;
pub use num_traits;
