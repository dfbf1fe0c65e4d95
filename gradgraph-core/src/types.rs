use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{Float, NumAssignOps};
use std::fmt::Debug;

/// A trait representing the element types a computation graph can hold.
///
/// Bounds the types (`f32`, `f64`) usable inside node data and gradients. It
/// combines the float arithmetic of `num_traits::Float` with what `ndarray` needs
/// for scalar broadcasting (`ScalarOperand`) and contraction (`LinalgScalar`).
pub trait GraphNumeric:
    Float
    + NumAssignOps
    + LinalgScalar
    + ScalarOperand
    + PartialOrd
    + Debug
    + Default
    + Send
    + Sync
    + 'static
{
}

impl GraphNumeric for f32 {}
impl GraphNumeric for f64 {}
