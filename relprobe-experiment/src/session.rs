use relprobe_core::{
    DisplaySurface, KeyPress, Relation, SessionPhase, StimulusRef, TrialResult,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{info, info_span, Instrument};

use crate::config::ExperimentConfig;
use crate::plan::SessionTrial;
use crate::runner::run_trial_with_layout;

/// What one probe trial produced, tagged with where it sat in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    pub phase: SessionPhase,
    pub stimulus: StimulusRef,
    pub correct_relation: Relation,
    pub result: TrialResult,
}

impl TrialRecord {
    pub fn timed_out(&self) -> bool {
        self.result.is_timeout()
    }
}

/// Runs the trials one after another on a single surface.
///
/// Each trial optionally shows its inference stimulus first, then the probe.
/// A timed-out probe in a feedback phase is followed by the timeout notice.
/// Trials are separated by a blank inter-trial interval.
pub async fn run_session<S>(
    config: &ExperimentConfig,
    trials: &[SessionTrial],
    surface: &mut S,
    keys: &mut mpsc::Receiver<KeyPress>,
) -> Vec<TrialRecord>
where
    S: DisplaySurface + ?Sized,
{
    let mut records = Vec::with_capacity(trials.len());
    info!(trials = trials.len(), "session started");

    for (position, trial) in trials.iter().enumerate() {
        let span = info_span!("session_trial", index = trial.index, phase = trial.phase.label());
        let record = run_one(config, trial, surface, keys).instrument(span).await;
        records.push(record);

        surface.clear();
        if position + 1 < trials.len() {
            time::sleep(config.inter_trial_interval()).await;
        }
    }

    let summary = SessionSummary::from_records(&records);
    for phase in &summary.phases {
        info!(
            phase = phase.phase.label(),
            trials = phase.trials,
            responded = phase.responded,
            correct = phase.correct,
            timeouts = phase.timeouts,
            mean_rt_ms = phase.mean_rt_ms,
            "phase summary"
        );
    }
    records
}

async fn run_one<S>(
    config: &ExperimentConfig,
    trial: &SessionTrial,
    surface: &mut S,
    keys: &mut mpsc::Receiver<KeyPress>,
) -> TrialRecord
where
    S: DisplaySurface + ?Sized,
{
    if let Some(inference) = &trial.inference {
        surface.show_stimulus(inference);
        time::sleep(config.inference_duration()).await;
    }

    let result = run_trial_with_layout(&trial.config, trial.layout.clone(), surface, keys).await;

    if result.is_timeout() && trial.phase.shows_timeout_notice() {
        surface.show_notice(&config.timeout_notice_text);
        time::sleep(config.timeout_notice()).await;
    }

    TrialRecord {
        index: trial.index,
        phase: trial.phase,
        stimulus: trial.config.stimulus().clone(),
        correct_relation: trial.config.correct_relation(),
        result,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub phase: SessionPhase,
    pub trials: usize,
    pub responded: usize,
    pub correct: usize,
    pub timeouts: usize,
    pub mean_rt_ms: Option<f64>,
}

impl PhaseSummary {
    /// Share of answered probes that were correct.
    pub fn accuracy(&self) -> Option<f64> {
        (self.responded > 0).then(|| self.correct as f64 / self.responded as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub phases: Vec<PhaseSummary>,
}

impl SessionSummary {
    /// Aggregates records per phase, phases in order of first appearance.
    pub fn from_records(records: &[TrialRecord]) -> Self {
        let mut phases: Vec<PhaseSummary> = Vec::new();
        let mut rt_totals: Vec<u64> = Vec::new();

        for record in records {
            let slot = match phases.iter().position(|p| p.phase == record.phase) {
                Some(slot) => slot,
                None => {
                    phases.push(PhaseSummary {
                        phase: record.phase,
                        trials: 0,
                        responded: 0,
                        correct: 0,
                        timeouts: 0,
                        mean_rt_ms: None,
                    });
                    rt_totals.push(0);
                    phases.len() - 1
                }
            };
            let summary = &mut phases[slot];
            summary.trials += 1;
            match record.result.reaction_time_ms() {
                Some(rt) => {
                    summary.responded += 1;
                    rt_totals[slot] += rt;
                }
                None => summary.timeouts += 1,
            }
            if record.result.is_correct() == Some(true) {
                summary.correct += 1;
            }
        }

        for (summary, total) in phases.iter_mut().zip(rt_totals) {
            if summary.responded > 0 {
                summary.mean_rt_ms = Some(total as f64 / summary.responded as f64);
            }
        }
        Self { phases }
    }

    pub fn phase(&self, phase: SessionPhase) -> Option<&PhaseSummary> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relprobe_core::{Response, ResponseKey};
    use std::time::Duration;

    fn record(phase: SessionPhase, response: Option<(u64, bool)>) -> TrialRecord {
        let result = match response {
            Some((rt, correct)) => TrialResult::responded(Response {
                reaction_time: Duration::from_millis(rt),
                key: ResponseKey::ArrowUp,
                relation: Relation::Above,
                correct,
            }),
            None => TrialResult::timed_out(),
        };
        TrialRecord {
            index: 0,
            phase,
            stimulus: StimulusRef::from("p.png"),
            correct_relation: Relation::Above,
            result,
        }
    }

    #[test]
    fn summary_groups_by_phase_in_order() {
        let records = [
            record(SessionPhase::Training, Some((400, true))),
            record(SessionPhase::Training, None),
            record(SessionPhase::Training, Some((600, false))),
            record(SessionPhase::Testing, None),
        ];
        let summary = SessionSummary::from_records(&records);
        assert_eq!(summary.phases.len(), 2);
        assert_eq!(summary.phases[0].phase, SessionPhase::Training);

        let training = summary.phase(SessionPhase::Training).unwrap();
        assert_eq!(training.trials, 3);
        assert_eq!(training.responded, 2);
        assert_eq!(training.correct, 1);
        assert_eq!(training.timeouts, 1);
        assert_eq!(training.mean_rt_ms, Some(500.0));
        assert_eq!(training.accuracy(), Some(0.5));

        let testing = summary.phase(SessionPhase::Testing).unwrap();
        assert_eq!(testing.mean_rt_ms, None);
        assert_eq!(testing.accuracy(), None);
        assert!(summary.phase(SessionPhase::Practice).is_none());
    }
}
