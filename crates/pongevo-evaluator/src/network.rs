//! Fixed-topology feedforward network used as the agent's policy.
//!
//! The network has three dense layers:
//!
//! ```text
//! input (5) → dense 5×6 → ReLU → dense 6×6 → ReLU → dense 6×3 → softmax → action
//! ```
//!
//! Each dense layer computes `output = input · weights + bias`, where `weights`
//! is an `in × out` matrix stored row by row. The softmax output is a
//! probability vector over the three [`Action`]s; the decision is its arg-max,
//! ties going to the lowest index.
//!
//! Shapes are part of the types ([`DenseLayer<IN, OUT>`]), so a network can
//! only be built with the right dimensions. Genetic operators work on the
//! flattened parameters through [`NeuralNetwork::layers`] and
//! [`NeuralNetwork::layers_mut`].

use std::iter;

use pongevo_engine::Action;

pub const INPUT_SIZE: usize = 5;
pub const HIDDEN_SIZE: usize = 6;
pub const OUTPUT_SIZE: usize = 3;

/// Number of dense layers in a [`NeuralNetwork`].
pub const LAYER_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{what} has {actual} elements, expected {expected}")]
pub struct ShapeError {
    pub what: &'static str,
    pub expected: usize,
    pub actual: usize,
}

/// A fully connected layer with `IN` inputs and `OUT` outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer<const IN: usize, const OUT: usize> {
    weights: [[f64; OUT]; IN],
    biases: [f64; OUT],
}

impl<const IN: usize, const OUT: usize> Default for DenseLayer<IN, OUT> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<const IN: usize, const OUT: usize> DenseLayer<IN, OUT> {
    #[must_use]
    pub const fn new(weights: [[f64; OUT]; IN], biases: [f64; OUT]) -> Self {
        Self { weights, biases }
    }

    #[must_use]
    pub const fn zeros() -> Self {
        Self::new([[0.0; OUT]; IN], [0.0; OUT])
    }

    /// Builds a layer from nested rows (`IN` rows of `OUT` weights) and a bias vector.
    pub fn from_rows<R>(rows: &[R], biases: &[f64]) -> Result<Self, ShapeError>
    where
        R: AsRef<[f64]>,
    {
        check_len("weight matrix", IN, rows.len())?;
        check_len("bias vector", OUT, biases.len())?;
        let mut layer = Self::zeros();
        for (dst, src) in iter::zip(&mut layer.weights, rows) {
            let src = src.as_ref();
            check_len("weight row", OUT, src.len())?;
            dst.copy_from_slice(src);
        }
        layer.biases.copy_from_slice(biases);
        Ok(layer)
    }

    #[must_use]
    pub fn weights(&self) -> &[[f64; OUT]; IN] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[f64; OUT] {
        &self.biases
    }

    /// Computes `input · weights + bias`.
    #[must_use]
    pub fn forward(&self, input: &[f64; IN]) -> [f64; OUT] {
        let mut output = self.biases;
        for (x, row) in iter::zip(input, &self.weights) {
            for (o, w) in iter::zip(&mut output, row) {
                *o += x * w;
            }
        }
        output
    }

    fn view(&self) -> LayerView<'_> {
        LayerView {
            inputs: IN,
            outputs: OUT,
            weights: self.weights.as_flattened(),
            biases: &self.biases,
        }
    }

    fn view_mut(&mut self) -> LayerViewMut<'_> {
        LayerViewMut {
            inputs: IN,
            outputs: OUT,
            weights: self.weights.as_flattened_mut(),
            biases: &mut self.biases,
        }
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ShapeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShapeError {
            what,
            expected,
            actual,
        })
    }
}

/// Read-only view of one layer's parameters.
///
/// `weights` is the `inputs × outputs` matrix flattened row by row.
#[derive(Debug, Clone, Copy)]
pub struct LayerView<'a> {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: &'a [f64],
    pub biases: &'a [f64],
}

impl<'a> LayerView<'a> {
    /// Iterates over the weight matrix one input row at a time.
    pub fn rows(self) -> impl Iterator<Item = &'a [f64]> {
        self.weights.chunks_exact(self.outputs)
    }
}

/// Mutable view of one layer's parameters.
#[derive(Debug)]
pub struct LayerViewMut<'a> {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: &'a mut [f64],
    pub biases: &'a mut [f64],
}

/// Rectified-linear activation, element-wise.
///
/// NaN passes through unchanged so corrupted parameters stay visible in the
/// output.
#[must_use]
pub fn relu<const N: usize>(values: [f64; N]) -> [f64; N] {
    values.map(|v| if v < 0.0 { 0.0 } else { v })
}

/// Normalized-exponential activation.
///
/// The maximum is subtracted before exponentiating, so any finite input
/// produces a valid probability distribution.
#[must_use]
pub fn softmax<const N: usize>(values: [f64; N]) -> [f64; N] {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exps = values.map(|v| (v - max).exp());
    let sum = exps.iter().sum::<f64>();
    for e in &mut exps {
        *e /= sum;
    }
    exps
}

/// Index of the largest value, ties going to the lowest index.
///
/// Returns `None` if any value is not finite.
#[must_use]
pub fn argmax(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut best = None;
    for (i, v) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if *v <= best_value => {}
            _ => best = Some((i, *v)),
        }
    }
    best.map(|(i, _)| i)
}

/// The agent's policy network.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NeuralNetwork {
    hidden1: DenseLayer<INPUT_SIZE, HIDDEN_SIZE>,
    hidden2: DenseLayer<HIDDEN_SIZE, HIDDEN_SIZE>,
    output: DenseLayer<HIDDEN_SIZE, OUTPUT_SIZE>,
}

impl NeuralNetwork {
    #[must_use]
    pub const fn new(
        hidden1: DenseLayer<INPUT_SIZE, HIDDEN_SIZE>,
        hidden2: DenseLayer<HIDDEN_SIZE, HIDDEN_SIZE>,
        output: DenseLayer<HIDDEN_SIZE, OUTPUT_SIZE>,
    ) -> Self {
        Self {
            hidden1,
            hidden2,
            output,
        }
    }

    /// A network whose weights and biases are all zero.
    ///
    /// Its output is uniform, so it always picks [`Action::MoveDecreasing`].
    #[must_use]
    pub const fn zeros() -> Self {
        Self::new(DenseLayer::zeros(), DenseLayer::zeros(), DenseLayer::zeros())
    }

    /// Builds a network from per-layer nested rows and bias vectors, in order.
    pub fn from_layers<R>(layers: &[(&[R], &[f64])]) -> Result<Self, ShapeError>
    where
        R: AsRef<[f64]>,
    {
        check_len("layer list", LAYER_COUNT, layers.len())?;
        Ok(Self::new(
            DenseLayer::from_rows(layers[0].0, layers[0].1)?,
            DenseLayer::from_rows(layers[1].0, layers[1].1)?,
            DenseLayer::from_rows(layers[2].0, layers[2].1)?,
        ))
    }

    /// Views of the three layers, input side first.
    #[must_use]
    pub fn layers(&self) -> [LayerView<'_>; LAYER_COUNT] {
        [self.hidden1.view(), self.hidden2.view(), self.output.view()]
    }

    #[must_use]
    pub fn layers_mut(&mut self) -> [LayerViewMut<'_>; LAYER_COUNT] {
        [
            self.hidden1.view_mut(),
            self.hidden2.view_mut(),
            self.output.view_mut(),
        ]
    }

    /// Runs the forward pass and returns the action probabilities.
    #[must_use]
    pub fn forward(&self, input: &[f64; INPUT_SIZE]) -> [f64; OUTPUT_SIZE] {
        let h1 = relu(self.hidden1.forward(input));
        let h2 = relu(self.hidden2.forward(&h1));
        softmax(self.output.forward(&h2))
    }

    /// Picks the most probable action.
    ///
    /// Returns `None` when the output is not finite, which only happens with
    /// corrupted parameters.
    #[must_use]
    pub fn decide(&self, input: &[f64; INPUT_SIZE]) -> Option<Action> {
        argmax(&self.forward(input)).and_then(Action::from_index)
    }

    /// Returns `true` if every parameter is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.layers()
            .iter()
            .all(|l| l.weights.iter().chain(l.biases).all(|v| v.is_finite()))
    }
}
