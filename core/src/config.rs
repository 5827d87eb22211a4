use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ranking and result-shaping knobs. The defaults are what the server runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub max_top_k: usize,
    /// Term-frequency saturation.
    pub k1: f64,
    /// Strength of length normalization, `0.0..=1.0`.
    pub b: f64,
    /// Added per matching query term that also appears in the title.
    pub title_bonus: f64,
    /// Snippet window, in chars, before and after the first match.
    pub snippet_before: usize,
    pub snippet_after: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 100,
            k1: 1.2,
            b: 0.75,
            title_bonus: 0.5,
            snippet_before: 80,
            snippet_after: 160,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_top_k == 0 {
            return Err(invalid("max_top_k", "must be at least 1"));
        }
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(invalid("default_top_k", format!("must be within 1..={}", self.max_top_k)));
        }
        if !(self.k1.is_finite() && self.k1 > 0.0) {
            return Err(invalid("k1", "must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(invalid("b", "must be within 0.0..=1.0"));
        }
        if !(self.title_bonus.is_finite() && self.title_bonus >= 0.0) {
            return Err(invalid("title_bonus", "must be zero or positive"));
        }
        if self.snippet_before + self.snippet_after == 0 {
            return Err(invalid("snippet_after", "snippet window cannot be empty"));
        }
        Ok(())
    }

    /// Same config with `default_top_k` set, clamped like any caller-supplied bound.
    pub fn with_default_top_k(self, k: usize) -> Self {
        let default_top_k = self.clamp_top_k(k);
        Self { default_top_k, ..self }
    }

    /// Clamp a caller-supplied bound into `1..=max_top_k`.
    pub fn clamp_top_k(&self, k: usize) -> usize {
        k.max(1).min(self.max_top_k)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
