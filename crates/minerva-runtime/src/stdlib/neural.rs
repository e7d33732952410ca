//! Neural-network and regression training
//!
//! Pure routines invoked by the train/predict commands:
//! - perceptron: online updates, early exit once an epoch is error-free
//! - MLP: one sigmoid hidden layer, backpropagation with per-sample updates
//! - linear regression: normal equations via the matrix module
//! - evaluation metrics: accuracy, MSE, confusion matrix
//!
//! All take plain `f64` slices; the evaluator converts values at the
//! command boundary. MLP weights are drawn from a seeded RNG so training
//! is deterministic run-to-run.

use crate::stdlib::matrix::{self, Mat};
use crate::value::{MlpNet, Model, RuntimeError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Numerically stable sigmoid: the naive form overflows for large |x|.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn check_training_data(x: &[Vec<f64>], targets: usize) -> Result<(), RuntimeError> {
    if x.is_empty() || x[0].is_empty() {
        return Err(RuntimeError::DimensionMismatch(
            "training data is empty".to_string(),
        ));
    }
    if x.len() != targets {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{} samples but {} targets",
            x.len(),
            targets
        )));
    }
    Ok(())
}

// ============================================================================
// Perceptron
// ============================================================================

/// Trains a binary perceptron. Returns the model plus the epoch at which it
/// converged (an epoch with zero misclassifications), if it did.
pub fn perceptron_train(
    x: &[Vec<f64>],
    y: &[f64],
    learning_rate: f64,
    epochs: usize,
) -> Result<(Model, Option<usize>), RuntimeError> {
    check_training_data(x, y.len())?;
    let features = x[0].len();
    let mut weights = vec![0.0; features];
    let mut bias = 0.0;
    let mut converged = None;

    for epoch in 0..epochs {
        let mut errors = 0;
        for (sample, &target) in x.iter().zip(y) {
            let mut z = bias;
            for (w, v) in weights.iter().zip(sample) {
                z += w * v;
            }
            let prediction = if z >= 0.0 { 1.0 } else { 0.0 };
            let error = target - prediction;
            if error != 0.0 {
                errors += 1;
                bias += learning_rate * error;
                for (w, v) in weights.iter_mut().zip(sample) {
                    *w += learning_rate * error * v;
                }
            }
        }
        if errors == 0 {
            converged = Some(epoch + 1);
            break;
        }
    }

    Ok((Model::Perceptron { weights, bias }, converged))
}

pub fn perceptron_predict(weights: &[f64], bias: f64, x: &[Vec<f64>]) -> Vec<f64> {
    x.iter()
        .map(|sample| {
            let mut z = bias;
            for (w, v) in weights.iter().zip(sample) {
                z += w * v;
            }
            if z >= 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

// ============================================================================
// Multi-layer perceptron
// ============================================================================

/// Creates an untrained single-hidden-layer network with weights drawn
/// uniformly from [-0.5, 0.5) using the given seed.
pub fn mlp_create(inputs: usize, hidden: usize, outputs: usize, seed: u64) -> MlpNet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut weight = |rows: usize, cols: usize| -> Vec<Vec<f64>> {
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(-0.5..0.5)).collect())
            .collect()
    };
    let input_weights = weight(inputs, hidden);
    let output_weights = weight(hidden, outputs);
    MlpNet {
        input_weights,
        output_weights,
        hidden_bias: vec![0.1; hidden],
        output_bias: vec![0.1; outputs],
        inputs,
        hidden,
        outputs,
    }
}

/// Forward pass: returns (hidden activations, output activations).
pub fn mlp_forward(net: &MlpNet, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut hidden = Vec::with_capacity(net.hidden);
    for j in 0..net.hidden {
        let mut sum = net.hidden_bias[j];
        for i in 0..net.inputs {
            sum += input[i] * net.input_weights[i][j];
        }
        hidden.push(sigmoid(sum));
    }

    let mut output = Vec::with_capacity(net.outputs);
    for j in 0..net.outputs {
        let mut sum = net.output_bias[j];
        for i in 0..net.hidden {
            sum += hidden[i] * net.output_weights[i][j];
        }
        output.push(sigmoid(sum));
    }

    (hidden, output)
}

/// Backpropagation with per-sample (online) updates. `y` rows are target
/// vectors, one-hot for multiclass or a single element for binary/scalar
/// targets. Returns the trained network and the mean squared error of the
/// final epoch.
pub fn mlp_train(
    mut net: MlpNet,
    x: &[Vec<f64>],
    y: &[Vec<f64>],
    learning_rate: f64,
    epochs: usize,
) -> Result<(MlpNet, f64), RuntimeError> {
    check_training_data(x, y.len())?;
    if x[0].len() != net.inputs {
        return Err(RuntimeError::DimensionMismatch(format!(
            "network expects {} inputs, samples have {}",
            net.inputs,
            x[0].len()
        )));
    }
    if y[0].len() != net.outputs {
        return Err(RuntimeError::DimensionMismatch(format!(
            "network expects {} outputs, targets have {}",
            net.outputs,
            y[0].len()
        )));
    }

    let mut epoch_error = 0.0;
    for _ in 0..epochs {
        epoch_error = 0.0;
        for (sample, target) in x.iter().zip(y) {
            let (hidden, output) = mlp_forward(&net, sample);

            for (o, t) in output.iter().zip(target) {
                epoch_error += (t - o) * (t - o);
            }

            // Output-layer gradient.
            let delta_output: Vec<f64> = output
                .iter()
                .zip(target)
                .map(|(o, t)| (t - o) * o * (1.0 - o))
                .collect();

            // Hidden-layer gradient.
            let mut delta_hidden = Vec::with_capacity(net.hidden);
            for j in 0..net.hidden {
                let mut error = 0.0;
                for k in 0..net.outputs {
                    error += delta_output[k] * net.output_weights[j][k];
                }
                delta_hidden.push(error * hidden[j] * (1.0 - hidden[j]));
            }

            for i in 0..net.hidden {
                for j in 0..net.outputs {
                    net.output_weights[i][j] += learning_rate * delta_output[j] * hidden[i];
                }
            }
            for j in 0..net.outputs {
                net.output_bias[j] += learning_rate * delta_output[j];
            }
            for i in 0..net.inputs {
                for j in 0..net.hidden {
                    net.input_weights[i][j] += learning_rate * delta_hidden[j] * sample[i];
                }
            }
            for j in 0..net.hidden {
                net.hidden_bias[j] += learning_rate * delta_hidden[j];
            }
        }
    }

    let mean_error = epoch_error / x.len() as f64;
    Ok((net, mean_error))
}

/// Binary networks threshold the single output at 0.5; multiclass networks
/// pick the argmax output index.
pub fn mlp_predict(net: &MlpNet, x: &[Vec<f64>]) -> Vec<f64> {
    x.iter()
        .map(|sample| {
            let (_, output) = mlp_forward(net, sample);
            if output.len() == 1 {
                if output[0] >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            } else {
                let mut best = 0;
                for (i, &v) in output.iter().enumerate() {
                    if v > output[best] {
                        best = i;
                    }
                }
                best as f64
            }
        })
        .collect()
}

// ============================================================================
// Linear regression
// ============================================================================

/// Multiple linear regression by normal equations:
/// `w = (Xᵀ X)⁻¹ Xᵀ y` with a prepended intercept column of ones.
/// A singular `Xᵀ X` propagates as `SingularMatrix`.
pub fn linear_regression(x: &[Vec<f64>], y: &[f64]) -> Result<Model, RuntimeError> {
    check_training_data(x, y.len())?;

    let extended: Mat = x
        .iter()
        .map(|row| {
            let mut r = Vec::with_capacity(row.len() + 1);
            r.push(1.0);
            r.extend_from_slice(row);
            r
        })
        .collect();

    let xt = matrix::transpose(&extended);
    let xtx = matrix::multiply(&xt, &extended)?;
    let y_col: Mat = y.iter().map(|&v| vec![v]).collect();
    let xty = matrix::multiply(&xt, &y_col)?;
    let xtx_inv = matrix::inverse(&xtx)?;
    let coefficients = matrix::multiply(&xtx_inv, &xty)?;

    let mut flat: Vec<f64> = coefficients.into_iter().map(|row| row[0]).collect();
    let intercept = flat.remove(0);
    Ok(Model::LinearRegression {
        intercept,
        coefficients: flat,
    })
}

pub fn linear_regression_predict(intercept: f64, coefficients: &[f64], x: &[Vec<f64>]) -> Vec<f64> {
    x.iter()
        .map(|sample| {
            let mut prediction = intercept;
            for (c, v) in coefficients.iter().zip(sample) {
                prediction += c * v;
            }
            prediction
        })
        .collect()
}

// ============================================================================
// Evaluation metrics
// ============================================================================

fn check_paired(len_true: usize, len_pred: usize) -> Result<(), RuntimeError> {
    if len_true == 0 {
        return Err(RuntimeError::DimensionMismatch(
            "metric needs at least one sample".to_string(),
        ));
    }
    if len_true != len_pred {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{len_true} true values but {len_pred} predictions"
        )));
    }
    Ok(())
}

/// Fraction of positions where the label sequences agree.
pub fn accuracy(y_true: &[i64], y_pred: &[i64]) -> Result<f64, RuntimeError> {
    check_paired(y_true.len(), y_pred.len())?;
    let correct = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Mean squared error for regression targets.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64, RuntimeError> {
    check_paired(y_true.len(), y_pred.len())?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Confusion matrix sized by the largest label seen (minimum 2 classes).
/// Rows are true labels, columns predicted. Negative labels are rejected.
pub fn confusion_matrix(y_true: &[i64], y_pred: &[i64]) -> Result<Mat, RuntimeError> {
    check_paired(y_true.len(), y_pred.len())?;
    let max_label = y_true.iter().chain(y_pred).copied().max().unwrap_or(0);
    let min_label = y_true.iter().chain(y_pred).copied().min().unwrap_or(0);
    if min_label < 0 {
        return Err(RuntimeError::DimensionMismatch(
            "confusion matrix needs non-negative labels".to_string(),
        ));
    }
    let classes = (max_label as usize + 1).max(2);
    let mut counts = vec![vec![0.0; classes]; classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        counts[t as usize][p as usize] += 1.0;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(1000.0) > 0.999);
        assert!(sigmoid(-1000.0) < 0.001);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn perceptron_learns_a_separable_problem() {
        // AND gate: linearly separable.
        let x = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let y = vec![0.0, 0.0, 0.0, 1.0];
        let (model, converged) = perceptron_train(&x, &y, 0.1, 100).unwrap();
        assert!(converged.is_some());
        let Model::Perceptron { weights, bias } = &model else {
            panic!("expected perceptron model");
        };
        assert_eq!(perceptron_predict(weights, *bias, &x), y);
    }

    #[test]
    fn mlp_learns_xor() {
        let x = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let y = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
        let net = mlp_create(2, 8, 1, 7);
        let (trained, error) = mlp_train(net, &x, &y, 0.5, 10000).unwrap();
        assert!(error < 0.05, "final error {error} too high");
        assert_eq!(mlp_predict(&trained, &x), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn mlp_creation_is_deterministic_per_seed() {
        let a = mlp_create(3, 5, 2, 42);
        let b = mlp_create(3, 5, 2, 42);
        let c = mlp_create(3, 5, 2, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn linear_regression_recovers_exact_coefficients() {
        // y = 3 + 2a - b, noise-free.
        let x = vec![
            vec![1.0, 2.0],
            vec![2.0, 1.0],
            vec![3.0, 5.0],
            vec![4.0, 2.0],
        ];
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();
        let Model::LinearRegression {
            intercept,
            coefficients,
        } = linear_regression(&x, &y).unwrap()
        else {
            panic!("expected regression model");
        };
        assert!((intercept - 3.0).abs() < 1e-6);
        assert!((coefficients[0] - 2.0).abs() < 1e-6);
        assert!((coefficients[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_design_matrix_is_singular() {
        // Two identical columns make XᵀX singular.
        let x = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(
            linear_regression(&x, &y),
            Err(RuntimeError::SingularMatrix)
        );
    }

    #[test]
    fn metrics_match_hand_computed_values() {
        assert_eq!(accuracy(&[1, 0, 1, 1], &[1, 1, 1, 0]).unwrap(), 0.5);
        assert_eq!(
            mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]).unwrap(),
            4.0 / 3.0
        );
        let cm = confusion_matrix(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();
        assert_eq!(cm, vec![vec![1.0, 1.0], vec![0.0, 2.0]]);
    }

    #[test]
    fn metrics_reject_mismatched_lengths() {
        assert!(accuracy(&[1], &[1, 0]).is_err());
        assert!(mean_squared_error(&[], &[]).is_err());
    }
}
