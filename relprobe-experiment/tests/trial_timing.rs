//! Timing behaviour of `run_trial` under a paused tokio clock.
//!
//! Key presses are injected from spawned tasks that sleep first, so the
//! runtime's auto-advance puts each press at an exact offset from trial start.

use std::time::Duration;

use relprobe_core::{KeyPress, Relation, ResponseKey, SurfaceCommand, TrialConfig, Verdict};
use relprobe_experiment::run_trial;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn press_after(tx: mpsc::Sender<KeyPress>, key: ResponseKey, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        time::sleep(delay).await;
        let _ = tx.send(KeyPress::now(key)).await;
    })
}

#[tokio::test(start_paused = true)]
async fn correct_answer_with_feedback_ends_after_feedback_pause() {
    let config = TrialConfig::new("probe.png", Relation::Above).with_feedback_duration(ms(1000));
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();
    press_after(tx, ResponseKey::ArrowUp, ms(800));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(1800));
    assert!(result.response_made());
    assert_eq!(result.reaction_time_ms(), Some(800));
    assert_eq!(result.is_correct(), Some(true));
    assert!(surface.contains(&SurfaceCommand::MarkResponse {
        key: ResponseKey::ArrowUp,
        verdict: Verdict::Correct,
    }));
}

#[tokio::test(start_paused = true)]
async fn wrong_answer_without_feedback_ends_immediately() {
    let config = TrialConfig::new("probe.png", Relation::Left).with_feedback(false);
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();
    press_after(tx, ResponseKey::ArrowRight, ms(500));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(500));
    assert_eq!(result.is_correct(), Some(false));
    assert_eq!(result.answered_relation(), Some(Relation::Right));
    assert!(
        !surface
            .iter()
            .any(|c| matches!(c, SurfaceCommand::MarkResponse { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn silence_times_out_with_empty_result() {
    let config = TrialConfig::new("probe.png", Relation::Below).with_trial_timeout(ms(6000));
    let (_tx, mut rx) = mpsc::channel::<KeyPress>(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(6000));
    assert!(!result.response_made());
    assert_eq!(result.reaction_time_ms(), None);
    assert_eq!(result.responded_key(), None);
    assert_eq!(result.answered_relation(), None);
    assert_eq!(result.is_correct(), None);
    assert!(matches!(surface.first(), Some(SurfaceCommand::ShowTrial(_))));
    assert_eq!(surface.last(), Some(&SurfaceCommand::Clear));
}

#[tokio::test(start_paused = true)]
async fn response_one_millisecond_before_timeout_wins() {
    let config = TrialConfig::new("probe.png", Relation::Above)
        .with_feedback(false)
        .with_trial_timeout(ms(6000));
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();
    press_after(tx, ResponseKey::ArrowUp, ms(5999));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(5999));
    assert!(result.response_made());
    assert_eq!(result.reaction_time_ms(), Some(5999));
}

#[tokio::test(start_paused = true)]
async fn response_stamped_at_the_deadline_is_too_late() {
    let config = TrialConfig::new("probe.png", Relation::Above).with_trial_timeout(ms(6000));
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    press_after(tx, ResponseKey::ArrowUp, ms(6000));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert!(result.is_timeout());
    assert!(
        !surface
            .iter()
            .any(|c| matches!(c, SurfaceCommand::MarkResponse { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn feedback_delay_is_added_to_reaction_time() {
    for (rt, feedback) in [(100, 250), (2500, 1000), (10, 0)] {
        let config = TrialConfig::new("probe.png", Relation::Right)
            .with_feedback_duration(ms(feedback));
        let (tx, mut rx) = mpsc::channel(8);
        let mut surface: Vec<SurfaceCommand> = Vec::new();
        let start = Instant::now();
        press_after(tx, ResponseKey::Space, ms(rt));

        let result = run_trial(&config, &mut surface, &mut rx).await;

        assert_eq!(start.elapsed(), ms(rt + feedback));
        assert_eq!(result.is_correct(), Some(false));
    }
}

#[tokio::test(start_paused = true)]
async fn presses_buffered_before_start_are_discarded() {
    let config = TrialConfig::new("probe.png", Relation::Above).with_trial_timeout(ms(2000));
    let (tx, mut rx) = mpsc::channel(8);
    tx.send(KeyPress::now(ResponseKey::ArrowUp)).await.unwrap();
    time::advance(ms(50)).await;

    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert!(result.is_timeout());
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn closed_key_channel_still_times_out() {
    let config = TrialConfig::new("probe.png", Relation::Above).with_trial_timeout(ms(3000));
    let (tx, mut rx) = mpsc::channel::<KeyPress>(8);
    drop(tx);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(3000));
    assert!(result.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn anticipatory_press_is_ignored_and_a_later_one_counts() {
    let config = TrialConfig::new("probe.png", Relation::Below)
        .with_feedback(false)
        .with_minimum_valid_rt(ms(50));
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    press_after(tx.clone(), ResponseKey::ArrowUp, ms(20));
    press_after(tx, ResponseKey::ArrowDown, ms(400));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(result.responded_key(), Some(ResponseKey::ArrowDown));
    assert_eq!(result.reaction_time_ms(), Some(400));
    assert_eq!(result.is_correct(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn second_press_during_feedback_changes_nothing() {
    let config = TrialConfig::new("probe.png", Relation::Left).with_feedback_duration(ms(1000));
    let (tx, mut rx) = mpsc::channel(8);
    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let start = Instant::now();
    press_after(tx.clone(), ResponseKey::ArrowLeft, ms(300));
    press_after(tx, ResponseKey::ArrowRight, ms(600));

    let result = run_trial(&config, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(1300));
    assert_eq!(result.responded_key(), Some(ResponseKey::ArrowLeft));
    let marks = surface
        .iter()
        .filter(|c| matches!(c, SurfaceCommand::MarkResponse { .. }))
        .count();
    assert_eq!(marks, 1);
}
