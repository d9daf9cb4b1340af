use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::{ResponseKey, ValidKeys};
use crate::relation::{Relation, RelationRepr};

pub const DEFAULT_TRIAL_TIMEOUT_MS: u64 = 6000;
pub const DEFAULT_FEEDBACK_DURATION_MS: u64 = 1000;

/// Trial controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Idle,
    AwaitingResponse,
    ShowingFeedback,
    Done,
}

impl TrialState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrialState::Done)
    }
}

/// Opaque reference to a stimulus image, usually a path or URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusRef(Arc<str>);

impl StimulusRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StimulusRef {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for StimulusRef {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for StimulusRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated, immutable description of one probe trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialConfig {
    stimulus: StimulusRef,
    valid_keys: ValidKeys,
    correct_relation: Relation,
    feedback_duration: Duration,
    trial_timeout: Duration,
    feedback_enabled: bool,
    minimum_valid_rt: Duration,
}

impl TrialConfig {
    pub fn new(stimulus: impl Into<StimulusRef>, correct_relation: Relation) -> Self {
        Self {
            stimulus: stimulus.into(),
            valid_keys: ValidKeys::default(),
            correct_relation,
            feedback_duration: Duration::from_millis(DEFAULT_FEEDBACK_DURATION_MS),
            trial_timeout: Duration::from_millis(DEFAULT_TRIAL_TIMEOUT_MS),
            feedback_enabled: true,
            minimum_valid_rt: Duration::ZERO,
        }
    }

    pub fn with_trial_timeout(mut self, timeout: Duration) -> Self {
        self.trial_timeout = timeout;
        self
    }

    pub fn with_feedback_duration(mut self, duration: Duration) -> Self {
        self.feedback_duration = duration;
        self
    }

    pub fn with_feedback(mut self, enabled: bool) -> Self {
        self.feedback_enabled = enabled;
        self
    }

    /// Presses faster than `rt` after trial start are treated as anticipations
    /// and ignored.
    pub fn with_minimum_valid_rt(mut self, rt: Duration) -> Self {
        self.minimum_valid_rt = rt;
        self
    }

    pub fn with_choices<I, T>(mut self, tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.valid_keys = ValidKeys::from_tokens(tokens)?;
        Ok(self)
    }

    pub fn stimulus(&self) -> &StimulusRef {
        &self.stimulus
    }

    pub fn valid_keys(&self) -> &ValidKeys {
        &self.valid_keys
    }

    pub fn correct_relation(&self) -> Relation {
        self.correct_relation
    }

    pub fn feedback_duration(&self) -> Duration {
        self.feedback_duration
    }

    pub fn trial_timeout(&self) -> Duration {
        self.trial_timeout
    }

    pub fn feedback_enabled(&self) -> bool {
        self.feedback_enabled
    }

    pub fn minimum_valid_rt(&self) -> Duration {
        self.minimum_valid_rt
    }
}

fn default_choices() -> Vec<String> {
    ResponseKey::ALL.iter().map(|k| k.token().to_string()).collect()
}

fn default_feedback_duration_ms() -> u64 {
    DEFAULT_FEEDBACK_DURATION_MS
}

fn default_trial_timeout_ms() -> u64 {
    DEFAULT_TRIAL_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

/// Unvalidated trial description as authored in a plan file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialParams {
    pub stimulus: String,
    #[serde(default = "default_choices")]
    pub choices: Vec<String>,
    pub correct_relation: RelationRepr,
    #[serde(default = "default_feedback_duration_ms")]
    pub feedback_duration_ms: u64,
    #[serde(default = "default_trial_timeout_ms")]
    pub trial_duration_ms: u64,
    #[serde(default = "default_true")]
    pub feedback: bool,
    #[serde(default)]
    pub minimum_valid_rt_ms: u64,
}

impl TryFrom<TrialParams> for TrialConfig {
    type Error = ConfigError;

    fn try_from(params: TrialParams) -> Result<Self, Self::Error> {
        if params.stimulus.trim().is_empty() {
            return Err(ConfigError::EmptyStimulus);
        }
        let correct = Relation::try_from(params.correct_relation)?;
        TrialConfig::new(params.stimulus, correct)
            .with_choices(&params.choices)
            .map(|config| {
                config
                    .with_feedback_duration(Duration::from_millis(params.feedback_duration_ms))
                    .with_trial_timeout(Duration::from_millis(params.trial_duration_ms))
                    .with_feedback(params.feedback)
                    .with_minimum_valid_rt(Duration::from_millis(params.minimum_valid_rt_ms))
            })
    }
}

/// A qualifying response, judged against the trial's ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub reaction_time: Duration,
    pub key: ResponseKey,
    pub relation: Relation,
    pub correct: bool,
}

/// Terminal outcome of a trial: either a judged response or a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FlatTrialResult", try_from = "FlatTrialResult")]
pub struct TrialResult {
    response: Option<Response>,
}

impl TrialResult {
    pub fn responded(response: Response) -> Self {
        Self {
            response: Some(response),
        }
    }

    pub fn timed_out() -> Self {
        Self { response: None }
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn reaction_time_ms(&self) -> Option<u64> {
        self.response
            .map(|r| u64::try_from(r.reaction_time.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn responded_key(&self) -> Option<ResponseKey> {
        self.response.map(|r| r.key)
    }

    pub fn answered_relation(&self) -> Option<Relation> {
        self.response.map(|r| r.relation)
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.response.map(|r| r.correct)
    }

    pub fn response_made(&self) -> bool {
        self.response.is_some()
    }

    pub fn is_timeout(&self) -> bool {
        self.response.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlatTrialResult {
    reaction_time_ms: Option<u64>,
    responded_key: Option<ResponseKey>,
    answered_relation: Option<Relation>,
    is_correct: Option<bool>,
    response_made: bool,
}

impl From<TrialResult> for FlatTrialResult {
    fn from(result: TrialResult) -> Self {
        Self {
            reaction_time_ms: result.reaction_time_ms(),
            responded_key: result.responded_key(),
            answered_relation: result.answered_relation(),
            is_correct: result.is_correct(),
            response_made: result.response_made(),
        }
    }
}

impl TryFrom<FlatTrialResult> for TrialResult {
    type Error = String;

    fn try_from(flat: FlatTrialResult) -> Result<Self, Self::Error> {
        match (
            flat.response_made,
            flat.reaction_time_ms,
            flat.responded_key,
            flat.answered_relation,
            flat.is_correct,
        ) {
            (true, Some(rt), Some(key), Some(relation), Some(correct)) => {
                if key.relation() != relation {
                    return Err(format!("key {key} does not answer {relation}"));
                }
                Ok(TrialResult::responded(Response {
                    reaction_time: Duration::from_millis(rt),
                    key,
                    relation,
                    correct,
                }))
            }
            (false, None, None, None, None) => Ok(TrialResult::timed_out()),
            _ => Err("response fields must be all present or all absent".to_string()),
        }
    }
}
