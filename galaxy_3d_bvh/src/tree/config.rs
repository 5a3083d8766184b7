/// Tree configuration
///
/// Fixed at construction time. The margin trades query precision for fewer
/// re-insertions: a leaf moving inside its parent's inflated box needs no
/// tree surgery.

use crate::error::{Error, Result};

/// BVH configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhConfig {
    /// Padding added on every side of every internal-node union (>= 0)
    pub margin: f64,
    /// Minimum area reduction a local rotation must exceed to be applied (>= 0)
    pub rotation_tolerance: f64,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            margin: 0.0,
            rotation_tolerance: 0.0,
        }
    }
}

impl BvhConfig {
    /// Replace the margin
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Replace the rotation tolerance
    pub fn with_rotation_tolerance(mut self, rotation_tolerance: f64) -> Self {
        self.rotation_tolerance = rotation_tolerance;
        self
    }

    /// Check that both values are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "margin must be finite and non-negative, got {}",
                self.margin
            )));
        }
        if !(self.rotation_tolerance.is_finite() && self.rotation_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "rotation_tolerance must be finite and non-negative, got {}",
                self.rotation_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
