//! Sans-IO trial response controller.
//!
//! The controller owns no timers and reads no input. The host feeds it key
//! presses and timer expirations and it answers with a [`Step`]. Hosts that
//! cannot cancel a timer primitive may let it fire anyway: every arming gets
//! a fresh [`TimerToken`], and an expiration carrying a stale token is
//! ignored.

use relprobe_core::{
    DisplaySurface, KeyPress, Response, ResponseLayout, TrialConfig, TrialResult, TrialState,
    Verdict,
};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    ResponseWindow,
    Feedback,
}

/// The one live timer of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub token: TimerToken,
    pub kind: TimerKind,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The event had no effect.
    Ignored,
    /// The trial goes on; the host should wait on this timer.
    Continue(ArmedTimer),
    /// The trial ended. Returned once per controller.
    Finished(TrialResult),
}

pub struct TrialController<'c> {
    config: &'c TrialConfig,
    layout: ResponseLayout,
    state: TrialState,
    started_at: Option<Instant>,
    timer: Option<ArmedTimer>,
    listening: bool,
    next_token: u64,
    pending: Option<Response>,
}

impl<'c> TrialController<'c> {
    pub fn new(config: &'c TrialConfig) -> Self {
        Self::with_layout(config, ResponseLayout::new(config.stimulus().clone()))
    }

    pub fn with_layout(config: &'c TrialConfig, layout: ResponseLayout) -> Self {
        Self {
            config,
            layout,
            state: TrialState::Idle,
            started_at: None,
            timer: None,
            listening: false,
            next_token: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn armed_timer(&self) -> Option<ArmedTimer> {
        self.timer
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Draws the trial, arms the listener and the response-window timer.
    pub fn start<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S, now: Instant) -> Step {
        if self.state != TrialState::Idle {
            return Step::Ignored;
        }
        surface.show_trial(&self.layout);
        self.started_at = Some(now);
        self.listening = true;
        self.state = TrialState::AwaitingResponse;
        let timer = self.arm(TimerKind::ResponseWindow, now + self.config.trial_timeout());
        debug!(stimulus = %self.config.stimulus(), "awaiting response");
        Step::Continue(timer)
    }

    pub fn on_key<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S, press: KeyPress) -> Step {
        if self.state != TrialState::AwaitingResponse || !self.listening {
            return Step::Ignored;
        }
        if !self.config.valid_keys().contains(press.key) {
            return Step::Ignored;
        }
        let Some(started_at) = self.started_at else {
            return Step::Ignored;
        };
        if press.at < started_at {
            debug!(key = %press.key, "ignoring key pressed before trial start");
            return Step::Ignored;
        }
        if let Some(timer) = self.timer {
            if press.at >= timer.deadline {
                debug!(key = %press.key, "ignoring key pressed after response window closed");
                return Step::Ignored;
            }
        }
        let reaction_time = press.at - started_at;
        if reaction_time < self.config.minimum_valid_rt() {
            debug!(key = %press.key, ?reaction_time, "ignoring anticipatory key");
            return Step::Ignored;
        }

        // Cancel the response window before anything else can run.
        self.timer = None;
        self.listening = false;

        let relation = press.key.relation();
        let correct = relation == self.config.correct_relation();
        let response = Response {
            reaction_time,
            key: press.key,
            relation,
            correct,
        };
        debug!(key = %press.key, %relation, correct, ?reaction_time, "response accepted");

        if !self.config.feedback_enabled() {
            return self.finish(surface, Some(response));
        }

        surface.mark_response(press.key, Verdict::from_correct(correct));
        self.pending = Some(response);
        self.state = TrialState::ShowingFeedback;
        let timer = self.arm(TimerKind::Feedback, press.at + self.config.feedback_duration());
        Step::Continue(timer)
    }

    pub fn on_timer<S: DisplaySurface + ?Sized>(
        &mut self,
        surface: &mut S,
        token: TimerToken,
    ) -> Step {
        let Some(timer) = self.timer.filter(|t| t.token == token) else {
            return Step::Ignored;
        };
        match (timer.kind, self.state) {
            (TimerKind::ResponseWindow, TrialState::AwaitingResponse) => {
                self.listening = false;
                debug!("response window elapsed");
                self.finish(surface, None)
            }
            (TimerKind::Feedback, TrialState::ShowingFeedback) => {
                let response = self.pending.take();
                self.finish(surface, response)
            }
            _ => Step::Ignored,
        }
    }

    /// Ends a trial that has not finished yet as if no response was given.
    pub fn abandon<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S) -> Step {
        if self.state.is_terminal() {
            return Step::Ignored;
        }
        self.pending = None;
        self.finish(surface, None)
    }

    fn arm(&mut self, kind: TimerKind, deadline: Instant) -> ArmedTimer {
        let timer = ArmedTimer {
            token: TimerToken(self.next_token),
            kind,
            deadline,
        };
        self.next_token += 1;
        self.timer = Some(timer);
        timer
    }

    fn finish<S: DisplaySurface + ?Sized>(
        &mut self,
        surface: &mut S,
        response: Option<Response>,
    ) -> Step {
        self.timer = None;
        self.listening = false;
        self.state = TrialState::Done;
        surface.clear();
        Step::Finished(match response {
            Some(response) => TrialResult::responded(response),
            None => TrialResult::timed_out(),
        })
    }
}
