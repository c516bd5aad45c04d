use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::color::Rgb;
use crate::timer::{TimerHandle, TimerQueue};

/// Pause after each flash so the overlay has cleared before the next phase.
pub const DEFAULT_FLASH_GRACE: Duration = Duration::from_millis(50);

pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

/// Upper bound for the delay and the flash duration (one year).
pub const MAX_SECONDS: f64 = 365.0 * 24.0 * 60.0 * 60.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("repetitions must be a positive whole number, got {0:?}")]
    Repetitions(String),
    #[error("delay must be between 0 and one year in seconds, got {0:?}")]
    Delay(String),
    #[error("duration must be a positive number of seconds up to one year, got {0:?}")]
    Duration(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a session is already running")]
    AlreadyRunning,
}

/// Snapshot of the form taken at start; never re-read during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub repetitions: u32,
    pub delay_between: f64,
    pub flash_duration: f64,
    pub flash_color: Rgb,
}

impl SessionConfig {
    /// Parses the three editable fields and validates the result.
    pub fn from_fields(
        repetitions: &str,
        delay: &str,
        duration: &str,
        flash_color: Rgb,
    ) -> Result<Self, ValidationError> {
        let repetitions = repetitions
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::Repetitions(repetitions.to_string()))?;
        let delay_between = delay
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::Delay(delay.to_string()))?;
        let flash_duration = duration
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::Duration(duration.to_string()))?;

        let config = Self {
            repetitions,
            delay_between,
            flash_duration,
            flash_color,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.repetitions == 0 {
            return Err(ValidationError::Repetitions(self.repetitions.to_string()));
        }
        if !(0.0..=MAX_SECONDS).contains(&self.delay_between) {
            return Err(ValidationError::Delay(self.delay_between.to_string()));
        }
        if !(self.flash_duration > 0.0 && self.flash_duration <= MAX_SECONDS) {
            return Err(ValidationError::Duration(self.flash_duration.to_string()));
        }
        Ok(())
    }

    /// Flash length in whole milliseconds (fractions are truncated).
    pub fn flash_duration_ms(&self) -> u64 {
        (self.flash_duration * 1000.0) as u64
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Flashing,
    AwaitingDelay,
    Stopped,
    Finished,
}

/// Timer payloads the controller schedules on itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    BeginDelay,
    CountdownTick,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRequest {
    pub color: Rgb,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Ready,
    Flashing {
        current: u32,
        total: u32,
    },
    Waiting {
        secs_left: u64,
    },
    Finished,
    Stopped,
    Invalid(ValidationError),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready to start."),
            Status::Flashing { current, total } => {
                write!(f, "Flashing screen ({current}/{total})...")
            }
            Status::Waiting { secs_left } => write!(f, "Waiting... Time left: {secs_left}s"),
            Status::Finished => write!(f, "Session finished!"),
            Status::Stopped => write!(f, "Session stopped by user."),
            Status::Invalid(err) => write!(f, "Invalid input: {err}"),
        }
    }
}

/// Which controls the shell should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub inputs_enabled: bool,
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Controls {
    pub fn for_running(running: bool) -> Self {
        Self {
            inputs_enabled: !running,
            start_enabled: !running,
            stop_enabled: running,
        }
    }
}

/// Everything the controller needs from the outside world.
pub trait SessionHost: TimerQueue<SessionStep> {
    fn request_flash(&mut self, request: FlashRequest);
    fn on_status(&mut self, status: &Status);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub running: bool,
    pub reps_remaining: u32,
    /// Set only when a step is scheduled, cleared when it fires or is cancelled.
    pub pending_timer: Option<TimerHandle>,
    /// Only meaningful while counting down.
    pub delay_deadline: Option<Instant>,
}

// Transitions. Each takes the current state by value and returns the next one.

fn flash<H: SessionHost>(
    mut state: SessionState,
    config: &SessionConfig,
    grace: Duration,
    host: &mut H,
) -> SessionState {
    let total = config.repetitions;
    let current = total - state.reps_remaining + 1;
    state.phase = Phase::Flashing;
    host.on_status(&Status::Flashing { current, total });

    let duration_ms = config.flash_duration_ms();
    debug!(current, total, duration_ms, color = %config.flash_color, "flash");
    host.request_flash(FlashRequest {
        color: config.flash_color,
        duration: Duration::from_millis(duration_ms),
    });

    state.reps_remaining -= 1;
    let next = if state.reps_remaining > 0 {
        SessionStep::BeginDelay
    } else {
        SessionStep::Finish
    };
    state.pending_timer =
        Some(host.schedule_after(Duration::from_millis(duration_ms) + grace, next));
    state
}

fn begin_delay<H: SessionHost>(
    mut state: SessionState,
    config: &SessionConfig,
    grace: Duration,
    now: Instant,
    host: &mut H,
) -> SessionState {
    state.phase = Phase::AwaitingDelay;
    state.delay_deadline = Some(now + config.delay());
    countdown_tick(state, config, grace, now, host)
}

fn countdown_tick<H: SessionHost>(
    mut state: SessionState,
    config: &SessionConfig,
    grace: Duration,
    now: Instant,
    host: &mut H,
) -> SessionState {
    let remaining = state
        .delay_deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .unwrap_or_default();

    if remaining.is_zero() {
        state.delay_deadline = None;
        return flash(state, config, grace, host);
    }

    let secs_left = ceil_secs(remaining);
    debug!(secs_left, "countdown");
    host.on_status(&Status::Waiting { secs_left });
    state.pending_timer = Some(host.schedule_after(COUNTDOWN_TICK, SessionStep::CountdownTick));
    state
}

fn finish<H: SessionHost>(mut state: SessionState, host: &mut H) -> SessionState {
    state.phase = Phase::Finished;
    state.running = false;
    state.delay_deadline = None;
    info!("session finished");
    host.on_status(&Status::Finished);
    state
}

fn stop<H: SessionHost>(mut state: SessionState, host: &mut H) -> SessionState {
    if let Some(handle) = state.pending_timer.take() {
        host.cancel(handle);
    }
    state.phase = Phase::Stopped;
    state.running = false;
    state.reps_remaining = 0;
    state.delay_deadline = None;
    info!("session stopped by user");
    host.on_status(&Status::Stopped);
    state
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Owns the run state and the frozen config of the current session.
///
/// A session alternates between flashing the screen and waiting out a delay.
/// Nothing here blocks or reads a clock: every operation receives `now` and a
/// [`SessionHost`] that schedules the next step, shows flashes and displays
/// status. The controller re-arms itself through the host after each step.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: SessionState,
    config: Option<SessionConfig>,
    flash_grace: Duration,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self::with_flash_grace(DEFAULT_FLASH_GRACE)
    }

    pub fn with_flash_grace(flash_grace: Duration) -> Self {
        Self {
            state: SessionState::default(),
            config: None,
            flash_grace,
        }
    }

    /// Validates `config` and performs the first flash immediately.
    pub fn start<H: SessionHost>(
        &mut self,
        config: SessionConfig,
        host: &mut H,
    ) -> Result<(), StartError> {
        if self.state.running {
            debug!("start ignored, session already running");
            return Err(StartError::AlreadyRunning);
        }
        if let Err(err) = config.validate() {
            info!(%err, "rejected session config");
            host.on_status(&Status::Invalid(err.clone()));
            return Err(err.into());
        }

        info!(
            repetitions = config.repetitions,
            delay = config.delay_between,
            duration = config.flash_duration,
            color = %config.flash_color,
            "session started"
        );
        let state = SessionState {
            phase: Phase::Flashing,
            running: true,
            reps_remaining: config.repetitions,
            pending_timer: None,
            delay_deadline: None,
        };
        self.state = flash(state, &config, self.flash_grace, host);
        self.config = Some(config);
        Ok(())
    }

    /// Cancels the pending step. Safe to call at any time.
    pub fn stop<H: SessionHost>(&mut self, host: &mut H) {
        if !self.state.running {
            return;
        }
        self.state = stop(std::mem::take(&mut self.state), host);
    }

    /// Delivers a fired timer. Handles that are not the pending one are stale
    /// and ignored.
    pub fn on_timer<H: SessionHost>(
        &mut self,
        handle: TimerHandle,
        step: SessionStep,
        now: Instant,
        host: &mut H,
    ) {
        if !self.state.running || self.state.pending_timer != Some(handle) {
            debug!(handle = handle.id(), ?step, "ignoring stale timer");
            return;
        }
        let Some(config) = self.config.as_ref() else {
            return;
        };
        let mut state = std::mem::take(&mut self.state);
        state.pending_timer = None;

        self.state = match step {
            SessionStep::BeginDelay => begin_delay(state, config, self.flash_grace, now, host),
            SessionStep::CountdownTick => {
                countdown_tick(state, config, self.flash_grace, now, host)
            }
            SessionStep::Finish => finish(state, host),
        };
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn reps_remaining(&self) -> u32 {
        self.state.reps_remaining
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn flash_grace(&self) -> Duration {
        self.flash_grace
    }

    pub fn controls(&self) -> Controls {
        Controls::for_running(self.state.running)
    }
}
