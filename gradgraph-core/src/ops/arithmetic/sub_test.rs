use super::*;
use crate::autograd::grad_check::{check_grad, GradCheckConfig};
use crate::utils::testing::{check_array_near, create_test_tensor, create_test_tensor_with_grad};
use ndarray::{ArrayD, IxDyn};

#[test]
fn test_sub_tensors_ok() {
    let graph = Graph::<f64>::new();
    let t1 = create_test_tensor(&graph, vec![5.0, 7.0, 9.0], &[3]);
    let t2 = create_test_tensor(&graph, vec![1.0, 2.0, 3.0], &[3]);
    let result = t1.try_sub(&t2).unwrap();
    check_array_near(&result.data(), &[3], &[4.0, 5.0, 6.0], 1e-12);
    assert_eq!(result.op_name(), "sub");
}

#[test]
fn test_sub_tensors_shape_mismatch() {
    let graph = Graph::<f32>::new();
    let t1 = create_test_tensor(&graph, vec![1.0, 2.0], &[2]);
    let t2 = create_test_tensor(&graph, vec![1.0, 2.0], &[2, 1]);
    let err = t1.try_sub(&t2).unwrap_err();
    assert_eq!(
        err,
        AutogradError::ShapeMismatch {
            expected: vec![2],
            actual: vec![2, 1],
            operation: "sub".to_string(),
        }
    );
}

#[test]
fn test_sub_backward() {
    let graph = Graph::<f64>::new();
    let a = create_test_tensor_with_grad(&graph, vec![1.0, 2.0, 3.0], &[3]);
    let b = create_test_tensor_with_grad(&graph, vec![4.0, 5.0, 6.0], &[3]);
    let result = a.try_sub(&b).unwrap();
    result.backward().unwrap();
    check_array_near(&a.grad().unwrap(), &[3], &[1.0, 1.0, 1.0], 1e-12);
    check_array_near(&b.grad().unwrap(), &[3], &[-1.0, -1.0, -1.0], 1e-12);
}

#[test]
fn test_sub_self_has_zero_gradient() {
    let graph = Graph::<f64>::new();
    let a = create_test_tensor_with_grad(&graph, vec![3.0, -1.0], &[2]);
    let zero = a.try_sub(&a).unwrap();
    check_array_near(&zero.data(), &[2], &[0.0, 0.0], 1e-12);
    zero.backward().unwrap();
    check_array_near(&a.grad().unwrap(), &[2], &[0.0, 0.0], 1e-12);
}

#[test]
fn test_sub_scalar_forward_backward() {
    let graph = Graph::<f64>::new();
    let a = create_test_tensor_with_grad(&graph, vec![1.0, 2.0], &[2]);
    let out = a.try_sub_scalar(0.5).unwrap();
    check_array_near(&out.data(), &[2], &[0.5, 1.5], 1e-12);
    out.backward().unwrap();
    check_array_near(&a.grad().unwrap(), &[2], &[1.0, 1.0], 1e-12);
}

#[test]
fn test_rsub_scalar_computes_scalar_minus_tensor() {
    let graph = Graph::<f64>::new();
    let a = create_test_tensor_with_grad(&graph, vec![1.0, 4.0], &[2]);
    let out = a.try_rsub_scalar(10.0).unwrap();
    check_array_near(&out.data(), &[2], &[9.0, 6.0], 1e-12);
    assert_eq!(out.op_name(), "mul_scalar");
    out.backward().unwrap();
    check_array_near(&a.grad().unwrap(), &[2], &[-1.0, -1.0], 1e-12);
}

#[test]
fn test_sub_grad_check() {
    let inputs = vec![
        ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.5, -2.0, 1.5]).unwrap(),
        ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 0.25, -0.75]).unwrap(),
    ];
    let func = |graph: &Graph<f64>, ids: &[NodeId]| {
        let diff = graph.sub(ids[0], ids[1])?;
        graph.rsub_scalar(2.0, diff)
    };
    check_grad(func, &inputs, &GradCheckConfig::default())
        .unwrap_or_else(|e| panic!("Sub grad check failed: {}", e));
}
