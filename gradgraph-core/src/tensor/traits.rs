// src/tensor/traits.rs

use std::fmt::{self, Debug};
use std::ops::{Add, Div, Mul, Sub};

use crate::tensor::Tensor;
use crate::types::GraphNumeric;

impl<'g, T: GraphNumeric> Debug for Tensor<'g, T> {
    /// Shows the node id, producing operation, shape and gradient flag. Data is not
    /// printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(id={}, op={}, shape={:?}, requires_grad={})",
            self.id,
            self.op_name(),
            self.shape(),
            self.requires_grad()
        )
    }
}

// --- Tensor-Tensor operators ---

impl<'g, T: GraphNumeric> Add for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn add(self, rhs: Tensor<'g, T>) -> Self::Output {
        self.try_add(&rhs)
            .unwrap_or_else(|e| panic!("Tensor add failed: {}", e))
    }
}

impl<'g, T: GraphNumeric> Sub for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn sub(self, rhs: Tensor<'g, T>) -> Self::Output {
        self.try_sub(&rhs)
            .unwrap_or_else(|e| panic!("Tensor sub failed: {}", e))
    }
}

/// `a * b` is the matrix product, not an elementwise product.
impl<'g, T: GraphNumeric> Mul for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn mul(self, rhs: Tensor<'g, T>) -> Self::Output {
        self.matmul(&rhs)
            .unwrap_or_else(|e| panic!("Tensor matmul failed: {}", e))
    }
}

// --- Tensor-Scalar operators ---

impl<'g, T: GraphNumeric> Add<T> for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn add(self, scalar: T) -> Self::Output {
        self.try_add_scalar(scalar)
            .unwrap_or_else(|e| panic!("Tensor add_scalar failed: {}", e))
    }
}

impl<'g, T: GraphNumeric> Sub<T> for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn sub(self, scalar: T) -> Self::Output {
        self.try_sub_scalar(scalar)
            .unwrap_or_else(|e| panic!("Tensor sub_scalar failed: {}", e))
    }
}

impl<'g, T: GraphNumeric> Mul<T> for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn mul(self, scalar: T) -> Self::Output {
        self.try_mul_scalar(scalar)
            .unwrap_or_else(|e| panic!("Tensor mul_scalar failed: {}", e))
    }
}

/// Panics on division by zero.
impl<'g, T: GraphNumeric> Div<T> for Tensor<'g, T> {
    type Output = Tensor<'g, T>;

    fn div(self, scalar: T) -> Self::Output {
        self.try_div_scalar(scalar)
            .unwrap_or_else(|e| panic!("Tensor div_scalar failed: {}", e))
    }
}

// --- Scalar-Tensor operators ---
// Orphan rules need one impl per concrete scalar type. There is no scalar / tensor.

macro_rules! impl_scalar_lhs_ops {
    ($($t:ty),*) => {
        $(
            impl<'g> Add<Tensor<'g, $t>> for $t {
                type Output = Tensor<'g, $t>;

                fn add(self, rhs: Tensor<'g, $t>) -> Self::Output {
                    rhs + self
                }
            }

            impl<'g> Mul<Tensor<'g, $t>> for $t {
                type Output = Tensor<'g, $t>;

                fn mul(self, rhs: Tensor<'g, $t>) -> Self::Output {
                    rhs * self
                }
            }

            impl<'g> Sub<Tensor<'g, $t>> for $t {
                type Output = Tensor<'g, $t>;

                fn sub(self, rhs: Tensor<'g, $t>) -> Self::Output {
                    rhs.try_rsub_scalar(self)
                        .unwrap_or_else(|e| panic!("Scalar sub failed: {}", e))
                }
            }
        )*
    };
}

impl_scalar_lhs_ops!(f32, f64);
