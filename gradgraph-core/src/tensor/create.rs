// src/tensor/create.rs

use log::trace;
use ndarray::{ArrayD, Dimension, IxDyn};
use rand::distributions::Standard;
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::autograd::graph::Graph;
use crate::error::AutogradError;
use crate::tensor::Tensor;
use crate::types::GraphNumeric;

impl<'g, T: GraphNumeric> Tensor<'g, T> {
    /// Records a leaf holding `data`.
    pub fn leaf(graph: &'g Graph<T>, data: ArrayD<T>, requires_grad: bool) -> Self {
        let id = graph.leaf(data, requires_grad);
        Tensor::from_id(graph, id)
    }

    /// Records a leaf from a flat row-major vector.
    ///
    /// # Errors
    /// `TensorCreationError` if `data.len()` does not match the product of `shape`.
    pub fn from_vec(
        graph: &'g Graph<T>,
        data: Vec<T>,
        shape: &[usize],
        requires_grad: bool,
    ) -> Result<Self, AutogradError> {
        let data_len = data.len();
        let array = ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|_| AutogradError::TensorCreationError {
            data_len,
            shape: shape.to_vec(),
        })?;
        Ok(Tensor::leaf(graph, array, requires_grad))
    }

    pub fn zeros(graph: &'g Graph<T>, shape: &[usize], requires_grad: bool) -> Self {
        Tensor::leaf(graph, ArrayD::zeros(IxDyn(shape)), requires_grad)
    }

    pub fn ones(graph: &'g Graph<T>, shape: &[usize], requires_grad: bool) -> Self {
        Tensor::leaf(graph, ArrayD::ones(IxDyn(shape)), requires_grad)
    }

    pub fn full(graph: &'g Graph<T>, shape: &[usize], value: T, requires_grad: bool) -> Self {
        Tensor::leaf(graph, ArrayD::from_elem(IxDyn(shape), value), requires_grad)
    }

    /// Ones where every index coordinate is equal, zeros elsewhere.
    ///
    /// For a rank-2 shape this is the identity matrix (or its rectangular
    /// truncation); higher ranks get the generalized diagonal.
    pub fn eye(graph: &'g Graph<T>, shape: &[usize], requires_grad: bool) -> Self {
        let data = ArrayD::from_shape_fn(IxDyn(shape), |index| {
            let coords = index.slice();
            if coords.windows(2).all(|pair| pair[0] == pair[1]) {
                T::one()
            } else {
                T::zero()
            }
        });
        Tensor::leaf(graph, data, requires_grad)
    }

    /// Samples every element uniformly from `[0, 1)`.
    pub fn rand(graph: &'g Graph<T>, shape: &[usize], requires_grad: bool) -> Self
    where
        Standard: Distribution<T>,
    {
        let mut rng = rand::thread_rng();
        let data = ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen::<T>());
        Tensor::leaf(graph, data, requires_grad)
    }

    /// Samples every element from a normal distribution.
    ///
    /// # Errors
    /// `InvalidArgument` if `std_dev` is negative or not finite.
    pub fn randn(
        graph: &'g Graph<T>,
        shape: &[usize],
        mean: T,
        std_dev: T,
        requires_grad: bool,
    ) -> Result<Self, AutogradError>
    where
        StandardNormal: Distribution<T>,
    {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| AutogradError::InvalidArgument(format!("randn: {}", e)))?;
        let mut rng = rand::thread_rng();
        let data = ArrayD::from_shape_simple_fn(IxDyn(shape), || normal.sample(&mut rng));
        trace!("randn: sampled {:?} with mean {:?}, std_dev {:?}", shape, mean, std_dev);
        Ok(Tensor::leaf(graph, data, requires_grad))
    }

    /// A zero leaf with the same shape as `self`, in the same graph.
    pub fn zeros_like(&self, requires_grad: bool) -> Self {
        Tensor::zeros(self.graph, &self.shape(), requires_grad)
    }

    pub fn ones_like(&self, requires_grad: bool) -> Self {
        Tensor::ones(self.graph, &self.shape(), requires_grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Ix2, Ix3};

    #[test]
    fn test_from_vec() {
        let graph = Graph::<f64>::new();
        let t = Tensor::from_vec(&graph, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], true).unwrap();
        assert_eq!(t.shape(), vec![2, 3]);
        assert!(t.requires_grad());
        assert!(t.is_leaf());
        assert_eq!(t.grad().unwrap(), ArrayD::zeros(IxDyn(&[2, 3])));
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        let graph = Graph::<f32>::new();
        let err = Tensor::from_vec(&graph, vec![1.0, 2.0, 3.0], &[2, 2], false).unwrap_err();
        assert_eq!(
            err,
            AutogradError::TensorCreationError {
                data_len: 3,
                shape: vec![2, 2]
            }
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_zeros_ones_full() {
        let graph = Graph::<f32>::new();
        let z = Tensor::zeros(&graph, &[2, 2], false);
        let o = Tensor::ones(&graph, &[3], false);
        let f = Tensor::full(&graph, &[1, 2], 7.5, false);
        assert!(z.data().iter().all(|&x| x == 0.0));
        assert!(o.data().iter().all(|&x| x == 1.0));
        assert!(f.data().iter().all(|&x| x == 7.5));
        assert!(z.grad().is_none());
    }

    #[test]
    fn test_eye_square() {
        let graph = Graph::<f64>::new();
        let e = Tensor::eye(&graph, &[3, 3], false);
        let data = e.data().into_dimensionality::<Ix2>().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(data[[i, j]], expected);
            }
        }
    }

    #[test]
    fn test_eye_generalized_diagonal() {
        let graph = Graph::<f64>::new();
        let e = Tensor::eye(&graph, &[2, 2, 2], false);
        let data = e.data().into_dimensionality::<Ix3>().unwrap();
        assert_eq!(data.sum(), 2.0);
        assert_eq!(data[[0, 0, 0]], 1.0);
        assert_eq!(data[[1, 1, 1]], 1.0);
        assert_eq!(data[[0, 1, 1]], 0.0);
    }

    #[test]
    fn test_rand_range() {
        let graph = Graph::<f64>::new();
        let t = Tensor::rand(&graph, &[4, 5], false);
        assert_eq!(t.shape(), vec![4, 5]);
        assert!(t.data().iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_randn_shape_and_spread() {
        let graph = Graph::<f64>::new();
        let t = Tensor::randn(&graph, &[1000], 5.0, 0.5, true).unwrap();
        assert!(t.requires_grad());
        let mean = t.data().mean().unwrap();
        assert!((mean - 5.0).abs() < 0.2, "sample mean {} too far from 5.0", mean);
    }

    #[test]
    fn test_randn_rejects_negative_std_dev() {
        let graph = Graph::<f32>::new();
        assert!(matches!(
            Tensor::randn(&graph, &[2], 0.0, -1.0, false),
            Err(AutogradError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zeros_like() {
        let graph = Graph::<f64>::new();
        let t = Tensor::from_vec(&graph, vec![1.0, 2.0, 3.0], &[1, 3], false).unwrap();
        let z = t.zeros_like(true);
        assert_eq!(z.shape(), t.shape());
        assert!(z.requires_grad());
        assert!(z.data().iter().all(|&x| x == 0.0));
        let o = t.ones_like(false);
        assert!(o.data().iter().all(|&x| x == 1.0));
    }
}
