//! Parameter vector operations for the genetic algorithm.
//!
//! Every function here works on a flat `f64` slice: one weight matrix
//! (flattened row by row) or one bias vector. The network-level operators in
//! [`genetic`](crate::genetic) apply them layer by layer.
//!
//! # Operations
//!
//! - **Initialization**: [`fill_gaussian`] draws fresh values
//! - **Crossover**: [`average_into`] takes the element-wise mean of two parents
//! - **Mutation**: [`mutate`] replaces randomly chosen elements
//!
//! # Design Decisions
//!
//! ## Averaging Crossover
//!
//! The child sits exactly halfway between its parents: `(a + b) / 2` for every
//! element. There is no randomness in crossover; all exploration comes from
//! mutation.
//!
//! ## Replacement Mutation
//!
//! A mutated element is *replaced* by `scale × N(0, 1)`, not perturbed. With a
//! small scale this pulls mutated weights back toward zero, which keeps the
//! parameters from drifting to large magnitudes over many generations.

use rand::Rng;
use rand_distr::StandardNormal;

/// Overwrites every element with `scale × N(0, 1)`.
pub fn fill_gaussian<R>(values: &mut [f64], scale: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for v in values {
        *v = scale * rng.sample::<f64, _>(StandardNormal);
    }
}

/// Replaces `values` with the element-wise mean of `values` and `other`.
///
/// # Panics
///
/// Panics if the slices have different lengths.
///
/// # Examples
///
/// ```
/// use pongevo_training::weights;
///
/// let mut a = [1.0, 2.0, -3.0];
/// weights::average_into(&mut a, &[3.0, 2.0, 1.0]);
/// assert_eq!(a, [2.0, 2.0, -1.0]);
/// ```
pub fn average_into(values: &mut [f64], other: &[f64]) {
    assert_eq!(values.len(), other.len());
    for (v, o) in values.iter_mut().zip(other) {
        *v = (*v + *o) / 2.0;
    }
}

/// Replaces each element, with probability `rate`, by `scale × N(0, 1)`.
///
/// Returns the number of replaced elements.
///
/// # Example Parameter Values
///
/// - **Weights**: `rate = 0.1`, `scale = 0.1`
/// - **Biases**: `rate = 0.05`, `scale = 0.05`
pub fn mutate<R>(values: &mut [f64], rate: f64, scale: f64, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let mut replaced = 0;
    for v in values {
        if rng.random_bool(rate) {
            *v = scale * rng.sample::<f64, _>(StandardNormal);
            replaced += 1;
        }
    }
    replaced
}
