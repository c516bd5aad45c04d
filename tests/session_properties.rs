// Drives SessionController against a simulated clock and timer queue.
// Time only moves when the test says so, so every run is deterministic.

use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use flashr::color::Rgb;
use flashr::session::{
    FlashRequest, Phase, SessionConfig, SessionController, SessionHost, SessionStep, StartError,
    Status, ValidationError,
};
use flashr::timer::{DeadlineQueue, TimerHandle, TimerQueue};

struct SimHost {
    now: Instant,
    queue: DeadlineQueue<SessionStep>,
    flashes: Vec<FlashRequest>,
    statuses: Vec<Status>,
}

impl SimHost {
    fn new() -> Self {
        Self {
            now: Instant::now(),
            queue: DeadlineQueue::new(),
            flashes: Vec::new(),
            statuses: Vec::new(),
        }
    }

    /// Moves the clock forward by `by`, firing everything that comes due.
    /// Returns the phases the controller passed through.
    fn advance(&mut self, c: &mut SessionController, by: Duration) -> Vec<Phase> {
        let end = self.now + by;
        let mut phases = Vec::new();
        while let Some(deadline) = self.queue.next_deadline().filter(|d| *d <= end) {
            self.now = deadline;
            while let Some((handle, step)) = self.queue.pop_due(self.now) {
                c.on_timer(handle, step, self.now, self);
                phases.push(c.phase());
            }
        }
        self.now = end;
        phases
    }

    fn waits(&self) -> Vec<u64> {
        self.statuses
            .iter()
            .filter_map(|s| match s {
                Status::Waiting { secs_left } => Some(*secs_left),
                _ => None,
            })
            .collect()
    }
}

impl TimerQueue<SessionStep> for SimHost {
    fn schedule_after(&mut self, delay: Duration, step: SessionStep) -> TimerHandle {
        self.queue.schedule_at(self.now + delay, step)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.cancel(handle);
    }
}

impl SessionHost for SimHost {
    fn request_flash(&mut self, request: FlashRequest) {
        self.flashes.push(request);
    }

    fn on_status(&mut self, status: &Status) {
        self.statuses.push(status.clone());
    }
}

fn config(repetitions: u32, delay_between: f64, flash_duration: f64) -> SessionConfig {
    SessionConfig {
        repetitions,
        delay_between,
        flash_duration,
        flash_color: Rgb::new(0, 128, 255),
    }
}

const FOREVER: Duration = Duration::from_secs(24 * 60 * 60);

#[test]
fn first_flash_leaves_repetitions_minus_one() {
    for reps in [1, 2, 5, 100] {
        let mut host = SimHost::new();
        let mut c = SessionController::new();
        c.start(config(reps, 1.0, 0.1), &mut host).unwrap();

        assert_eq!(c.reps_remaining(), reps - 1);
        assert_eq!(host.flashes.len(), 1);
    }
}

#[test]
fn n_repetitions_flash_exactly_n_times() {
    for reps in 1..=6 {
        let mut host = SimHost::new();
        let mut c = SessionController::new();
        c.start(config(reps, 2.0, 0.25), &mut host).unwrap();
        host.advance(&mut c, FOREVER);

        assert_eq!(host.flashes.len(), reps as usize, "reps = {reps}");
        assert_eq!(c.phase(), Phase::Finished);
        assert!(!c.is_running());
        assert_eq!(host.statuses.last(), Some(&Status::Finished));
        assert!(host.queue.is_empty());
        assert!(host
            .flashes
            .iter()
            .all(|f| f.duration == Duration::from_millis(250) && f.color == Rgb::new(0, 128, 255)));
    }
}

#[test]
fn single_repetition_never_waits() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(1, 30.0, 0.1), &mut host).unwrap();
    let phases = host.advance(&mut c, FOREVER);

    assert_eq!(phases, vec![Phase::Finished]);
    assert!(host.waits().is_empty());
    assert_eq!(
        host.statuses,
        vec![
            Status::Flashing {
                current: 1,
                total: 1
            },
            Status::Finished
        ]
    );
}

#[test]
fn stop_during_first_flash_cancels_pending_delay() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(3, 10.0, 0.1), &mut host).unwrap();
    assert_eq!(c.phase(), Phase::Flashing);
    assert_eq!(host.queue.len(), 1);

    c.stop(&mut host);
    assert_eq!(c.phase(), Phase::Stopped);
    assert_eq!(c.state().pending_timer, None);
    assert!(host.queue.is_empty());

    let phases = host.advance(&mut c, FOREVER);
    assert!(phases.is_empty());
    assert_eq!(host.flashes.len(), 1);
    assert_eq!(host.statuses.last(), Some(&Status::Stopped));
    assert!(host.waits().is_empty());
}

#[test]
fn stop_mid_countdown_cancels_and_reports_stop() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(3, 10.0, 0.1), &mut host).unwrap();
    host.advance(&mut c, Duration::from_secs(2));
    assert_eq!(c.phase(), Phase::AwaitingDelay);

    c.stop(&mut host);
    assert_eq!(c.phase(), Phase::Stopped);
    assert_eq!(c.state().pending_timer, None);
    assert!(host.queue.is_empty());

    let flashes = host.flashes.len();
    host.advance(&mut c, FOREVER);
    assert_eq!(host.flashes.len(), flashes);
    assert_eq!(host.statuses.last(), Some(&Status::Stopped));
    assert!(!host.statuses.contains(&Status::Finished));
}

#[test]
fn stop_racing_final_step_never_reports_finished() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(1, 0.0, 0.1), &mut host).unwrap();

    // the finish step is due, but stop runs first
    host.now += Duration::from_millis(150);
    let (handle, step) = host.queue.pop_due(host.now).unwrap();
    c.stop(&mut host);
    c.on_timer(handle, step, host.now, &mut host);

    assert_eq!(c.phase(), Phase::Stopped);
    assert_eq!(host.statuses.last(), Some(&Status::Stopped));
    assert!(!host.statuses.contains(&Status::Finished));
}

#[test]
fn invalid_configs_are_rejected_without_side_effects() {
    let bad = [
        (config(0, 1.0, 1.0), "repetitions"),
        (config(1, -1.0, 1.0), "delay"),
        (config(1, 1.0, 0.0), "duration"),
        (config(1, f64::NAN, 1.0), "delay"),
    ];
    for (cfg, what) in bad {
        let mut host = SimHost::new();
        let mut c = SessionController::new();
        let err = c.start(cfg, &mut host).unwrap_err();

        match (&err, what) {
            (StartError::Invalid(ValidationError::Repetitions(_)), "repetitions")
            | (StartError::Invalid(ValidationError::Delay(_)), "delay")
            | (StartError::Invalid(ValidationError::Duration(_)), "duration") => {}
            _ => panic!("unexpected {err:?} for {what}"),
        }
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.is_running());
        assert!(host.flashes.is_empty());
        assert!(host.queue.is_empty());
    }
}

#[test]
fn three_second_delay_counts_down_then_flashes() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(2, 3.0, 0.1), &mut host).unwrap();

    // flash (100ms) + grace (50ms), then the countdown starts
    host.advance(&mut c, Duration::from_millis(150));
    assert_eq!(c.phase(), Phase::AwaitingDelay);
    assert_eq!(host.waits(), vec![3]);

    host.advance(&mut c, Duration::from_secs(1));
    assert_eq!(host.waits(), vec![3, 2]);
    host.advance(&mut c, Duration::from_secs(1));
    assert_eq!(host.waits(), vec![3, 2, 1]);
    assert_eq!(host.flashes.len(), 1);

    host.advance(&mut c, Duration::from_secs(1));
    assert_eq!(host.flashes.len(), 2);
    assert_eq!(
        host.statuses.last(),
        Some(&Status::Flashing {
            current: 2,
            total: 2
        })
    );
}

#[test]
fn zero_delay_skips_waiting() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(3, 0.0, 0.1), &mut host).unwrap();
    host.advance(&mut c, FOREVER);

    assert_eq!(host.flashes.len(), 3);
    assert!(host.waits().is_empty());
    // three flashes of 150ms each, nothing else
    assert_eq!(c.phase(), Phase::Finished);
}

#[test]
fn start_while_running_does_not_reinitialise() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(4, 1.0, 0.1), &mut host).unwrap();
    host.advance(&mut c, Duration::from_secs(2));
    let before = c.state().clone();

    assert_matches!(
        c.start(config(50, 1.0, 0.1), &mut host),
        Err(StartError::AlreadyRunning)
    );
    assert_eq!(c.state(), &before);
    assert_eq!(host.queue.len(), 1);
}

#[test]
fn stop_when_idle_is_a_noop() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.stop(&mut host);
    c.stop(&mut host);

    assert_eq!(c.phase(), Phase::Idle);
    assert!(host.statuses.is_empty());
}

#[test]
fn at_most_one_step_is_pending() {
    let mut host = SimHost::new();
    let mut c = SessionController::new();
    c.start(config(5, 2.0, 0.2), &mut host).unwrap();

    for _ in 0..40 {
        assert!(host.queue.len() <= 1);
        if let Some(pending) = c.state().pending_timer {
            assert!(host.queue.is_pending(pending));
        }
        host.advance(&mut c, Duration::from_millis(250));
    }
    assert_eq!(c.phase(), Phase::Finished);
}
