use std::time::Duration;

use relprobe_core::layout::DEFAULT_LABELS;
use serde::{Deserialize, Serialize};

/// Session-wide timing and presentation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// How long the inference silhouette stays up before the probe.
    pub inference_duration_ms: u64,
    pub trial_duration_ms: u64,
    pub feedback_duration_ms: u64,
    pub timeout_notice_ms: u64,
    pub timeout_notice_text: String,
    pub inter_trial_interval_ms: u64,
    pub minimum_valid_rt_ms: u64,
    pub button_labels: [String; 5],
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            inference_duration_ms: 6000,
            trial_duration_ms: 6000,
            feedback_duration_ms: 1000,
            timeout_notice_ms: 1000,
            timeout_notice_text: "Time-out".to_string(),
            inter_trial_interval_ms: 500,
            minimum_valid_rt_ms: 50,
            button_labels: DEFAULT_LABELS.map(String::from),
        }
    }
}

impl ExperimentConfig {
    pub fn inference_duration(&self) -> Duration {
        Duration::from_millis(self.inference_duration_ms)
    }

    pub fn trial_duration(&self) -> Duration {
        Duration::from_millis(self.trial_duration_ms)
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }

    pub fn timeout_notice(&self) -> Duration {
        Duration::from_millis(self.timeout_notice_ms)
    }

    pub fn inter_trial_interval(&self) -> Duration {
        Duration::from_millis(self.inter_trial_interval_ms)
    }

    pub fn minimum_valid_rt(&self) -> Duration {
        Duration::from_millis(self.minimum_valid_rt_ms)
    }
}
