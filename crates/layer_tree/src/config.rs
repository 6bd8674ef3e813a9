use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_INDENT: f32 = 16.;
const DEFAULT_HOLD_TO_EXPAND_MS: u64 = 600;
const DEFAULT_SHIFT_THRESHOLD: f32 = 16.;

fn default_indent() -> f32 {
    DEFAULT_INDENT
}

fn default_hold_to_expand_ms() -> u64 {
    DEFAULT_HOLD_TO_EXPAND_MS
}

fn default_shift_threshold() -> f32 {
    DEFAULT_SHIFT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Horizontal distance between two tree levels.
    #[serde(default = "default_indent")]
    pub indent: f32,
    /// Extra left offset applied to every insertion line.
    #[serde(default)]
    pub pad: f32,
    /// How long a collapsed node must stay hovered during a drag before it expands.
    #[serde(default = "default_hold_to_expand_ms")]
    pub hold_to_expand_ms: u64,
    /// Horizontal pointer travel that counts as one shift step.
    #[serde(default = "default_shift_threshold")]
    pub shift_threshold: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            pad: 0.,
            hold_to_expand_ms: DEFAULT_HOLD_TO_EXPAND_MS,
            shift_threshold: DEFAULT_SHIFT_THRESHOLD,
        }
    }
}

impl TreeConfig {
    pub fn with_defaults(mut self) -> Self {
        if !self.indent.is_finite() || self.indent <= 0. {
            self.indent = DEFAULT_INDENT;
        }
        if !self.pad.is_finite() {
            self.pad = 0.;
        }
        if self.hold_to_expand_ms == 0 {
            self.hold_to_expand_ms = DEFAULT_HOLD_TO_EXPAND_MS;
        }
        if !self.shift_threshold.is_finite() || self.shift_threshold <= 0. {
            self.shift_threshold = self.indent;
        }
        self
    }

    pub fn hold_to_expand(&self) -> Duration {
        Duration::from_millis(self.hold_to_expand_ms)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }
}
