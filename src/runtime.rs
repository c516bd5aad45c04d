use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What wakes the loop: input, a resize, or time passing.
#[derive(Clone, Debug)]
pub enum FlashrEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived before the wait ran out; timers may be due.
    Tick,
}

/// Maps a raw terminal event to one the app cares about.
pub fn translate(ev: CtEvent) -> Option<FlashrEvent> {
    match ev {
        // Windows reports releases too
        CtEvent::Key(key) if key.kind == KeyEventKind::Release => None,
        CtEvent::Key(key) => Some(FlashrEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(FlashrEvent::Resize),
        _ => None,
    }
}

pub trait EventSource: Send + 'static {
    /// Waits up to `timeout` for input. `Err(Timeout)` when none arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<FlashrEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread. The thread only forwards
/// input; every session call happens on the thread driving [`Runner`].
pub struct CrosstermEventSource {
    rx: Receiver<FlashrEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            while let Ok(raw) = event::read() {
                let Some(evt) = translate(raw) else {
                    continue;
                };
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlashrEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for headless runs.
pub struct TestEventSource {
    rx: Receiver<FlashrEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlashrEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlashrEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Decides how long the loop may sleep. It wakes for the earliest pending
/// timer, and at least once per `tick` even when nothing is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacer {
    tick: Duration,
}

impl Pacer {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Zero once `deadline` has passed.
    pub fn wait(&self, now: Instant, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(at) => self.tick.min(at.saturating_duration_since(now)),
            None => self.tick,
        }
    }
}

pub struct Runner<E: EventSource> {
    events: E,
    pacer: Pacer,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E, pacer: Pacer) -> Self {
        Self { events, pacer }
    }

    /// Returns the next input, or `Tick` once `deadline` (or a full tick)
    /// has passed without any. A closed source behaves like silence.
    pub fn step(&self, now: Instant, deadline: Option<Instant>) -> FlashrEvent {
        let wait = self.pacer.wait(now, deadline);
        match self.events.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Disconnected) => {
                // recv_timeout returns at once on a dead channel; don't spin
                std::thread::sleep(wait);
                FlashrEvent::Tick
            }
            Err(RecvTimeoutError::Timeout) => FlashrEvent::Tick,
        }
    }
}
