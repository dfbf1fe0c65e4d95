mod common;

use common::{backward_from, filled, init_logging, leaf};
use gradgraph_core::utils::testing::{check_array_near, check_grad_near};
use gradgraph_core::{AutogradError, Graph, Tensor};

#[test]
fn additive_chain_values_and_gradients() {
    init_logging();
    let graph = Graph::<f64>::new();
    let a = Tensor::ones(&graph, &[2, 2], true);
    let b = Tensor::full(&graph, &[2, 2], 2.0, true);
    let c = Tensor::full(&graph, &[2, 2], 3.0, true);

    let add1 = a + b;
    let add2 = add1 + c;
    let add3 = add2 + c;

    check_array_near(&add1.data(), &[2, 2], &[3.0; 4], 1e-12);
    check_array_near(&add2.data(), &[2, 2], &[6.0; 4], 1e-12);
    check_array_near(&add3.data(), &[2, 2], &[9.0; 4], 1e-12);

    add3.backward().unwrap();

    check_grad_near(&a, &[2, 2], &[1.0; 4], 1e-12);
    check_grad_near(&b, &[2, 2], &[1.0; 4], 1e-12);
    // C feeds two additions.
    check_grad_near(&c, &[2, 2], &[2.0; 4], 1e-12);
}

#[test]
fn matmul_of_filled_matrices() {
    init_logging();
    let graph = Graph::<f64>::new();
    let a = Tensor::full(&graph, &[2, 3], 2.0, true);
    let b = Tensor::full(&graph, &[3, 2], 3.0, true);
    let product = a * b;
    assert_eq!(product.shape(), vec![2, 2]);
    check_array_near(&product.data(), &[2, 2], &[18.0; 4], 1e-12);
}

#[test]
fn diamond_accumulates_both_consumers() {
    init_logging();
    let graph = Graph::<f64>::new();
    let d = leaf(&graph, filled(&[3, 2], 0.7));
    let (c1, c2) = (1.5, -4.0);
    let e = d * c1;
    let f = d * c2;
    let root = e + f;

    root.backward().unwrap();

    check_grad_near(&d, &[3, 2], &[c1 + c2; 6], 1e-12);
}

#[test]
fn two_backward_runs_double_leaf_gradients() {
    init_logging();
    let graph = Graph::<f64>::new();
    let x = leaf(&graph, filled(&[2, 3], 0.5));
    let w = leaf(&graph, filled(&[3, 2], -1.0));
    let hidden = (x * w + 2.0).relu().unwrap();
    let out = (hidden - 0.5) / 4.0;

    backward_from(&graph, out.id());
    let x_once = x.grad().unwrap();
    let w_once = w.grad().unwrap();

    backward_from(&graph, out.id());
    assert_eq!(x.grad().unwrap(), &x_once * 2.0);
    assert_eq!(w.grad().unwrap(), &w_once * 2.0);

    // Zeroing starts a fresh accumulation cycle.
    graph.zero_grads(&[x.id(), w.id()]).unwrap();
    backward_from(&graph, out.id());
    assert_eq!(x.grad().unwrap(), x_once);
}

#[test]
fn non_tracking_leaves_never_receive_gradient() {
    init_logging();
    let graph = Graph::<f64>::new();
    let input = Tensor::full(&graph, &[1, 3], 2.0, false);
    let weight = Tensor::full(&graph, &[3, 1], 0.5, true);
    let bias = Tensor::zeros(&graph, &[1, 1], true);
    let out = input * weight + bias;

    out.backward().unwrap();
    out.backward().unwrap();

    assert!(input.grad().is_none());
    assert!(input.parents().is_empty());
    assert!(weight.parents().is_empty());
    check_grad_near(&weight, &[3, 1], &[4.0; 3], 1e-12);
    check_grad_near(&bias, &[1, 1], &[2.0], 1e-12);
}

#[test]
fn scalar_first_operators() {
    init_logging();
    let graph = Graph::<f64>::new();
    let a = Tensor::from_vec(&graph, vec![1.0, 2.0, 3.0], &[3], true).unwrap();
    let out = 10.0 - (2.0 * a + 1.0);
    check_array_near(&out.data(), &[3], &[7.0, 5.0, 3.0], 1e-12);
    out.backward().unwrap();
    check_grad_near(&a, &[3], &[-2.0; 3], 1e-12);
}

#[test]
fn training_steps_reuse_parameters_after_truncate() {
    init_logging();
    let mut graph = Graph::<f64>::new();
    let w_id = graph.leaf(filled(&[2, 1], 0.0), true);
    let mark = graph.checkpoint();
    let target = 3.0;
    let lr = 0.25;

    for _ in 0..50 {
        {
            let w = graph.tensor(w_id).unwrap();
            let x = Tensor::full(&graph, &[1, 2], 1.0, false);
            let pred = x * w;
            let residual = pred - target;
            residual.backward_with(residual.data()).unwrap();
            let step = w.grad().unwrap() * lr;
            w.replace_data(w.data() - step).unwrap();
            w.zero_grad().unwrap();
        }
        graph.truncate(mark);
    }

    assert_eq!(graph.len(), 1);
    let fitted: f64 = graph.data(w_id).unwrap().sum();
    assert!((fitted - target).abs() < 1e-6, "fitted sum {} should approach {}", fitted, target);
}

#[test]
fn shape_errors_surface_at_construction() {
    init_logging();
    let graph = Graph::<f64>::new();
    let a = Tensor::ones(&graph, &[2, 3], true);
    let b = Tensor::ones(&graph, &[2, 3], true);
    assert!(matches!(a.matmul(&b), Err(AutogradError::ShapeMismatch { .. })));
    assert!(matches!(
        a.try_add(&Tensor::ones(&graph, &[3, 2], true)),
        Err(AutogradError::ShapeMismatch { .. })
    ));
    assert_eq!(a.try_div_scalar(0.0).unwrap_err(), AutogradError::DivisionByZero);
}

#[test]
fn failed_backward_keeps_sibling_branch_gradients() {
    init_logging();
    let graph = Graph::<f64>::new();
    let a = Tensor::ones(&graph, &[2, 2, 3], true);
    let b = Tensor::ones(&graph, &[3, 2], true);
    let x = Tensor::full(&graph, &[2, 2, 2], 0.5, true);
    let root = a.matmul(&b).unwrap() + x;

    // `x` is visited before the batched matmul, which has no backward rule.
    let err = root.backward().unwrap_err();
    assert!(matches!(err, AutogradError::UnimplementedOperation { rank: 3, .. }));
    check_grad_near(&x, &[2, 2, 2], &[0.0; 8], 0.0);
    check_grad_near(&a, &[2, 2, 3], &[0.0; 12], 0.0);

    // A later valid pass over the sibling still accumulates from zero.
    let ok = x * 2.0;
    ok.backward().unwrap();
    check_grad_near(&x, &[2, 2, 2], &[2.0; 8], 1e-12);
}
