// Export foundational arithmetic operations directly
pub mod add;
pub mod div;
pub mod mul;
pub mod sub;

// Re-export the primary forward kernels
pub use add::{add_op, add_scalar_op};
pub use div::div_scalar_op;
pub use mul::mul_scalar_op;
pub use sub::{sub_op, sub_scalar_op};
