use gradgraph_core::ndarray::{ArrayD, IxDyn};
use gradgraph_core::{Graph, NodeId, Tensor};

// Shared by several test crates; not every crate uses every helper.

/// Routes `log` output through the test harness. Safe to call from every test.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[allow(dead_code)]
pub fn filled(shape: &[usize], value: f64) -> ArrayD<f64> {
    ArrayD::from_elem(IxDyn(shape), value)
}

/// Deterministic, non-constant data so that gradient checks exercise every entry.
#[allow(dead_code)]
pub fn ramp(shape: &[usize], offset: f64) -> ArrayD<f64> {
    let numel: usize = shape.iter().product();
    let data = (0..numel).map(|i| offset + 0.1 * i as f64 - 0.05 * (i % 3) as f64).collect();
    ArrayD::from_shape_vec(IxDyn(shape), data).expect("ramp shape")
}

#[allow(dead_code)]
pub fn leaf<'g>(graph: &'g Graph<f64>, data: ArrayD<f64>) -> Tensor<'g, f64> {
    Tensor::leaf(graph, data, true)
}

/// Seeds `root` with ones and runs the reverse pass.
#[allow(dead_code)]
pub fn backward_from(graph: &Graph<f64>, root: NodeId) {
    let shape = graph.shape(root).expect("root shape");
    graph.set_grad(root, ArrayD::ones(IxDyn(&shape))).expect("seed");
    graph.run_backward(root).expect("backward");
}
