use approx::relative_eq;
use log::debug;
use ndarray::ArrayD;
use num_traits::NumCast;
use thiserror::Error;

use crate::autograd::graph::{Graph, NodeId};
use crate::error::AutogradError;
use crate::types::GraphNumeric;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}, element {element_index}: analytical grad {analytical_grad:?} != numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(AutogradError),
    #[error("Backward pass execution failed during gradient check: {0}")]
    BackwardPassError(AutogradError),
    #[error("Input {input_index} requires grad but has no gradient after backward pass.")]
    MissingAnalyticalGrad { input_index: usize },
    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index}. Details: Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        value: f64,
    },
    #[error("Function did not propagate requires_grad correctly.")]
    RequiresGradPropagationError,
    #[error("Graph error during intermediate calculation: {0}")]
    TensorError(AutogradError),
}

impl From<AutogradError> for GradCheckError {
    fn from(err: AutogradError) -> Self {
        GradCheckError::TensorError(err)
    }
}

/// Step size and tolerances for [`check_grad`].
///
/// Values are `f64` whatever the element type. The defaults suit `f64` graphs;
/// `f32` needs a larger `epsilon` and looser tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    /// Half-width of the central difference.
    pub epsilon: f64,
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig {
            epsilon: 1e-6,
            abs_tolerance: 1e-5,
            rel_tolerance: 1e-5,
        }
    }
}

/// Builds a fresh graph with `inputs` as leaves and runs `func` on it.
fn run_forward<T, F>(func: &F, inputs: &[ArrayD<T>], requires_grad: bool) -> Result<(Graph<T>, Vec<NodeId>, NodeId), GradCheckError>
where
    T: GraphNumeric,
    F: Fn(&Graph<T>, &[NodeId]) -> Result<NodeId, AutogradError>,
{
    let graph = Graph::new();
    let ids: Vec<NodeId> = inputs.iter().map(|x| graph.leaf(x.clone(), requires_grad)).collect();
    let output = func(&graph, &ids).map_err(GradCheckError::ForwardPassError)?;
    Ok((graph, ids, output))
}

/// Sum of all output elements, the scalar loss the checks differentiate.
fn sum_loss<T, F>(func: &F, inputs: &[ArrayD<T>]) -> Result<f64, GradCheckError>
where
    T: GraphNumeric,
    F: Fn(&Graph<T>, &[NodeId]) -> Result<NodeId, AutogradError>,
{
    let (graph, _, output) = run_forward(func, inputs, false)?;
    let data = graph.data(output)?;
    Ok(data.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).sum())
}

fn element_mut<T: GraphNumeric>(array: &mut ArrayD<T>, index: usize) -> Result<&mut T, GradCheckError> {
    array.iter_mut().nth(index).ok_or_else(|| {
        GradCheckError::TensorError(AutogradError::InternalError(format!(
            "element {} out of range during gradient check",
            index
        )))
    })
}

/// Estimates d(sum(func(inputs)))/d(inputs) by central differences.
///
/// `func` receives a fresh graph and the leaf ids of `inputs` (in order) and returns
/// the output node. Each element is perturbed by `+/- epsilon` in turn; the
/// returned arrays have the shapes of `inputs` and are in logical element order.
pub fn numerical_gradients<T, F>(func: &F, inputs: &[ArrayD<T>], epsilon: f64) -> Result<Vec<ArrayD<T>>, GradCheckError>
where
    T: GraphNumeric,
    F: Fn(&Graph<T>, &[NodeId]) -> Result<NodeId, AutogradError>,
{
    let step = <T as NumCast>::from(epsilon).ok_or_else(|| {
        GradCheckError::TensorError(AutogradError::InvalidArgument(format!(
            "epsilon {} is not representable",
            epsilon
        )))
    })?;

    let mut work: Vec<ArrayD<T>> = inputs.to_vec();
    let mut estimates = Vec::with_capacity(inputs.len());

    for input_index in 0..inputs.len() {
        let numel = inputs[input_index].len();
        let mut values = Vec::with_capacity(numel);
        for element_index in 0..numel {
            let original = *element_mut(&mut work[input_index], element_index)?;

            *element_mut(&mut work[input_index], element_index)? = original + step;
            let loss_plus = sum_loss(func, &work)?;
            *element_mut(&mut work[input_index], element_index)? = original - step;
            let loss_minus = sum_loss(func, &work)?;
            *element_mut(&mut work[input_index], element_index)? = original;

            let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
            if !numerical.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index,
                    element_index,
                    loss_plus,
                    loss_minus,
                });
            }
            values.push(<T as NumCast>::from(numerical).unwrap_or_else(T::nan));
        }
        estimates.push(ArrayD::from_shape_vec(inputs[input_index].raw_dim(), values).map_err(AutogradError::from)?);
    }
    Ok(estimates)
}

/// Checks the backward rules used by `func` against finite differences.
///
/// All `inputs` become leaves that require grad. The output is seeded with ones
/// (so the loss is the sum of the output), backward runs once, and every element of
/// every input gradient is compared with [`numerical_gradients`] using
/// `approx::relative_eq!` with the configured tolerances.
pub fn check_grad<T, F>(func: F, inputs: &[ArrayD<T>], config: &GradCheckConfig) -> Result<(), GradCheckError>
where
    T: GraphNumeric,
    F: Fn(&Graph<T>, &[NodeId]) -> Result<NodeId, AutogradError>,
{
    // --- 1. Analytical gradients ---
    let (graph, ids, output) = run_forward(&func, inputs, true)?;
    if !graph.requires_grad(output)? {
        return Err(GradCheckError::RequiresGradPropagationError);
    }
    let seed = ArrayD::ones(graph.data(output)?.raw_dim());
    graph.set_grad(output, seed).map_err(GradCheckError::BackwardPassError)?;
    graph.run_backward(output).map_err(GradCheckError::BackwardPassError)?;

    let mut analytical = Vec::with_capacity(ids.len());
    for (input_index, &id) in ids.iter().enumerate() {
        let grad = graph
            .grad(id)?
            .ok_or(GradCheckError::MissingAnalyticalGrad { input_index })?;
        analytical.push(grad);
    }

    // --- 2. Numerical gradients ---
    let numerical = numerical_gradients(&func, inputs, config.epsilon)?;

    // --- 3. Compare ---
    let mut compared = 0usize;
    for (input_index, (a_grad, n_grad)) in analytical.iter().zip(numerical.iter()).enumerate() {
        for (element_index, (a, n)) in a_grad.iter().zip(n_grad.iter()).enumerate() {
            let analytical_grad = a.to_f64().unwrap_or(f64::NAN);
            let numerical_grad = n.to_f64().unwrap_or(f64::NAN);
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input_index,
                    element_index,
                    value: analytical_grad,
                });
            }
            if !relative_eq!(
                analytical_grad,
                numerical_grad,
                epsilon = config.abs_tolerance,
                max_relative = config.rel_tolerance
            ) {
                return Err(GradCheckError::GradientMismatch {
                    input_index,
                    element_index,
                    analytical_grad,
                    numerical_grad,
                    difference: (analytical_grad - numerical_grad).abs(),
                });
            }
            compared += 1;
        }
    }
    debug!("check_grad: {} inputs, {} elements agree", inputs.len(), compared);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward_op::Op;
    use approx::assert_abs_diff_eq;
    use ndarray::IxDyn;

    #[test]
    fn test_numerical_gradients_of_scaled_sum() {
        let inputs = vec![ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, -2.0, 0.5]).unwrap()];
        let func = |graph: &Graph<f64>, ids: &[NodeId]| graph.mul_scalar(ids[0], 3.0);
        let grads = numerical_gradients(&func, &inputs, 1e-6).unwrap();
        assert_eq!(grads.len(), 1);
        for g in grads[0].iter() {
            assert_abs_diff_eq!(*g, 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_numerical_gradients_leave_inputs_untouched() {
        let inputs = vec![ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0]).unwrap()];
        let snapshot = inputs.clone();
        let func = |graph: &Graph<f64>, ids: &[NodeId]| graph.relu(ids[0]);
        numerical_gradients(&func, &inputs, 1e-6).unwrap();
        assert_eq!(inputs, snapshot);
    }

    #[test]
    fn test_check_grad_passes_for_chain() {
        let inputs = vec![
            ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![0.1, 0.2, 0.3, 0.4]).unwrap(),
            ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![-1.0, 0.5, 2.0, 1.5]).unwrap(),
        ];
        let func = |graph: &Graph<f64>, ids: &[NodeId]| {
            let prod = graph.matmul(ids[0], ids[1])?;
            let shifted = graph.sub_scalar(prod, 0.3)?;
            graph.div_scalar(shifted, 2.0)
        };
        assert_eq!(check_grad(func, &inputs, &GradCheckConfig::default()), Ok(()));
    }

    #[test]
    fn test_check_grad_reports_forward_errors() {
        let inputs = vec![
            ArrayD::<f64>::zeros(IxDyn(&[2])),
            ArrayD::<f64>::zeros(IxDyn(&[3])),
        ];
        let func = |graph: &Graph<f64>, ids: &[NodeId]| graph.add(ids[0], ids[1]);
        assert!(matches!(
            check_grad(func, &inputs, &GradCheckConfig::default()),
            Err(GradCheckError::ForwardPassError(AutogradError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_check_grad_detects_detached_output() {
        let inputs = vec![ArrayD::<f64>::ones(IxDyn(&[2]))];
        let func = |graph: &Graph<f64>, ids: &[NodeId]| {
            graph.record(Op::AddScalar { input: ids[0], scalar: 1.0 }, Some(false))
        };
        assert_eq!(
            check_grad(func, &inputs, &GradCheckConfig::default()),
            Err(GradCheckError::RequiresGradPropagationError)
        );
    }

    #[test]
    fn test_check_grad_detects_wrong_gradient() {
        // The detached branch changes the value but hides its derivative, so the
        // analytical gradient (1) disagrees with the numerical one (1 + 2).
        let inputs = vec![ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 2.0]).unwrap()];
        let func = |graph: &Graph<f64>, ids: &[NodeId]| {
            let hidden = graph.record(Op::MulScalar { input: ids[0], scalar: 2.0 }, Some(false))?;
            graph.add(ids[0], hidden)
        };
        match check_grad(func, &inputs, &GradCheckConfig::default()) {
            Err(GradCheckError::GradientMismatch {
                input_index,
                element_index,
                analytical_grad,
                numerical_grad,
                ..
            }) => {
                assert_eq!(input_index, 0);
                assert_eq!(element_index, 0);
                assert_abs_diff_eq!(analytical_grad, 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(numerical_grad, 3.0, epsilon = 1e-4);
            }
            other => panic!("Expected GradientMismatch, got {:?}", other),
        }
    }
}
