use std::fs;
use std::path::{Path, PathBuf};

use relprobe_core::{
    ConfigError, RelationRepr, ResponseKey, ResponseLayout, SessionPhase, StimulusRef,
    TrialConfig, TrialParams,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ExperimentConfig;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read session plan {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed session plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error("trial {index}: {source}")]
    Trial {
        index: usize,
        #[source]
        source: ConfigError,
    },

    #[error("trial {index}: {} trials cannot follow {} trials", phase.label(), previous.label())]
    PhaseOrder {
        index: usize,
        phase: SessionPhase,
        previous: SessionPhase,
    },

    #[error("session plan has no trials")]
    Empty,
}

fn default_choices() -> Vec<String> {
    ResponseKey::ALL.iter().map(|k| k.token().to_string()).collect()
}

/// One entry of the authored trial list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedTrial {
    #[serde(default)]
    pub inference: Option<String>,
    pub probe: String,
    pub correct_relation: RelationRepr,
    /// Response key tokens; each of the five keys exactly once.
    #[serde(default = "default_choices")]
    pub choices: Vec<String>,
    #[serde(default)]
    pub phase: SessionPhase,
}

/// A session as written on disk: the config block plus trials in running order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionPlan {
    #[serde(default)]
    pub config: ExperimentConfig,
    pub trials: Vec<PlannedTrial>,
}

/// A planned trial after validation, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTrial {
    pub index: usize,
    pub phase: SessionPhase,
    pub inference: Option<StimulusRef>,
    pub config: TrialConfig,
    pub layout: ResponseLayout,
}

impl SessionPlan {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates every trial against the session config. Phases must run
    /// practice, training, testing; any of them may be skipped.
    pub fn trials(&self) -> Result<Vec<SessionTrial>, PlanError> {
        if self.trials.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut previous = None;
        let mut trials = Vec::with_capacity(self.trials.len());
        for (index, planned) in self.trials.iter().enumerate() {
            if let Some(previous) = previous {
                if !reachable(previous, planned.phase) {
                    return Err(PlanError::PhaseOrder {
                        index,
                        phase: planned.phase,
                        previous,
                    });
                }
            }
            previous = Some(planned.phase);
            let trial = build_trial(&self.config, index, planned)
                .map_err(|source| PlanError::Trial { index, source })?;
            trials.push(trial);
        }
        Ok(trials)
    }
}

fn reachable(from: SessionPhase, to: SessionPhase) -> bool {
    let mut phase = Some(from);
    while let Some(current) = phase {
        if current == to {
            return true;
        }
        phase = current.next();
    }
    false
}

fn build_trial(
    config: &ExperimentConfig,
    index: usize,
    planned: &PlannedTrial,
) -> Result<SessionTrial, ConfigError> {
    let inference = match planned.inference.as_deref() {
        Some(s) if s.trim().is_empty() => return Err(ConfigError::EmptyStimulus),
        Some(s) => Some(StimulusRef::from(s)),
        None => None,
    };
    let trial_config = TrialConfig::try_from(TrialParams {
        stimulus: planned.probe.clone(),
        choices: planned.choices.clone(),
        correct_relation: planned.correct_relation.clone(),
        feedback_duration_ms: config.feedback_duration_ms,
        trial_duration_ms: config.trial_duration_ms,
        feedback: planned.phase.feedback_enabled(),
        minimum_valid_rt_ms: config.minimum_valid_rt_ms,
    })?;
    let layout =
        ResponseLayout::with_labels(trial_config.stimulus().clone(), config.button_labels.clone());
    Ok(SessionTrial {
        index,
        phase: planned.phase,
        inference,
        config: trial_config,
        layout,
    })
}
