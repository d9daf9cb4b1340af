use relprobe_core::{DisplaySurface, KeyPress, ResponseLayout, TrialConfig, TrialResult};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{info, instrument};

use crate::controller::{ArmedTimer, Step, TrialController};

/// Runs one probe trial to completion.
///
/// Races key presses from `keys` against the trial's single live timer.
/// Returns exactly one result; presses queued before the trial started are
/// discarded. If the key channel closes the trial still ends on its timer.
pub async fn run_trial<S>(
    config: &TrialConfig,
    surface: &mut S,
    keys: &mut mpsc::Receiver<KeyPress>,
) -> TrialResult
where
    S: DisplaySurface + ?Sized,
{
    let layout = ResponseLayout::new(config.stimulus().clone());
    run_trial_with_layout(config, layout, surface, keys).await
}

#[instrument(
    name = "trial",
    skip_all,
    fields(
        stimulus = %config.stimulus(),
        correct = %config.correct_relation(),
        feedback = config.feedback_enabled(),
    )
)]
pub async fn run_trial_with_layout<S>(
    config: &TrialConfig,
    layout: ResponseLayout,
    surface: &mut S,
    keys: &mut mpsc::Receiver<KeyPress>,
) -> TrialResult
where
    S: DisplaySurface + ?Sized,
{
    while keys.try_recv().is_ok() {}

    let mut controller = TrialController::with_layout(config, layout);
    let mut keys_open = true;
    let mut timer: Option<ArmedTimer> = None;
    let mut step = controller.start(surface, Instant::now());

    loop {
        match step {
            Step::Continue(next) => timer = Some(next),
            Step::Ignored => {}
            Step::Finished(result) => {
                info!(
                    response_made = result.response_made(),
                    rt_ms = result.reaction_time_ms(),
                    correct = result.is_correct(),
                    "trial finished"
                );
                return result;
            }
        }
        let listening = keys_open && controller.is_listening();

        step = tokio::select! {
            biased;
            press = keys.recv(), if listening => match press {
                Some(press) => controller.on_key(surface, press),
                None => {
                    keys_open = false;
                    Step::Ignored
                }
            },
            Some(fired) = wait_for(timer) => controller.on_timer(surface, fired.token),
            else => controller.abandon(surface),
        };
    }
}

async fn wait_for(timer: Option<ArmedTimer>) -> Option<ArmedTimer> {
    let timer = timer?;
    time::sleep_until(timer.deadline).await;
    Some(timer)
}
