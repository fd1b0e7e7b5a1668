//! One-dimensional polynomials in ascending-power order.
//!
//! Trace tables store every coefficient sequence constant-term first:
//!
//! ```text
//! f(x) = c[0] + c[1]·x + c[2]·x² + …
//! ```
//!
//! `Polynomial` keeps exactly that order and evaluates with Horner's rule from
//! the last element, so no call site ever reverses a coefficient vector.
//! Descending-order input (as produced by `polyval`-style tooling) goes
//! through [`Polynomial::from_descending`], the single place a reversal
//! happens.

use serde::{Deserialize, Serialize};

/// A polynomial with coefficients in ascending power order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Build from ascending-power coefficients (constant term first).
    pub fn from_ascending(coeffs: impl Into<Vec<f64>>) -> Self {
        Self { coeffs: coeffs.into() }
    }

    /// Build from descending-power coefficients (highest power first).
    pub fn from_descending(coeffs: &[f64]) -> Self {
        Self {
            coeffs: coeffs.iter().rev().copied().collect(),
        }
    }

    /// Ascending-power coefficients.
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of `x^power` (zero when absent).
    pub fn coefficient(&self, power: usize) -> f64 {
        self.coeffs.get(power).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// True when any coefficient is NaN.
    pub fn has_nan(&self) -> bool {
        self.coeffs.iter().any(|c| c.is_nan())
    }

    /// Evaluate at a single point. An empty polynomial evaluates to zero.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Evaluate at every point of `xs`.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}
