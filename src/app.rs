use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::color::Rgb;
use crate::config::Settings;
use crate::flash::{FlashId, FlashOverlay};
use crate::session::{
    Controls, FlashRequest, SessionConfig, SessionController, SessionHost, SessionStep, Status,
    ValidationError,
};
use crate::timer::{DeadlineQueue, TimerHandle, TimerQueue};

const MAX_FIELD_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Field {
    #[strum(to_string = "Repetitions:")]
    Repetitions,
    #[strum(to_string = "Delay (seconds):")]
    Delay,
    #[strum(to_string = "Duration (seconds):")]
    Duration,
    #[strum(to_string = "Flash Color:")]
    Color,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Repetitions,
        Field::Delay,
        Field::Duration,
        Field::Color,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Field {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Field {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// User-editable session inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub repetitions: String,
    pub delay: String,
    pub duration: String,
    pub color: Rgb,
    pub focus: Field,
}

impl Form {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            repetitions: settings.repetitions.to_string(),
            delay: Settings::field_text(settings.delay_secs),
            duration: Settings::field_text(settings.duration_secs),
            color: settings.color,
            focus: Field::Repetitions,
        }
    }

    /// Text of a numeric field; `None` for the color field.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Repetitions => Some(&self.repetitions),
            Field::Delay => Some(&self.delay),
            Field::Duration => Some(&self.duration),
            Field::Color => None,
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Repetitions => Some(&mut self.repetitions),
            Field::Delay => Some(&mut self.delay),
            Field::Duration => Some(&mut self.duration),
            Field::Color => None,
        }
    }

    pub fn to_config(&self) -> Result<SessionConfig, ValidationError> {
        SessionConfig::from_fields(&self.repetitions, &self.delay, &self.duration, self.color)
    }

    fn edit(&mut self, key: KeyCode) {
        if self.focus == Field::Color {
            match key {
                KeyCode::Right | KeyCode::Char(' ') => self.color = self.color.next_preset(),
                KeyCode::Left => self.color = self.color.prev_preset(),
                _ => {}
            }
            return;
        }
        let Some(text) = self.text_mut(self.focus) else {
            return;
        };
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => {
                if text.len() < MAX_FIELD_LEN {
                    text.push(c);
                }
            }
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }
}

/// Payloads on the app's timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTimer {
    Session(SessionStep),
    FlashExpired(FlashId),
}

/// Borrowed view of the app that the controller drives.
struct AppHost<'a> {
    timers: &'a mut DeadlineQueue<AppTimer>,
    overlay: &'a mut FlashOverlay,
    status: &'a mut Status,
    now: Instant,
}

impl TimerQueue<SessionStep> for AppHost<'_> {
    fn schedule_after(&mut self, delay: Duration, step: SessionStep) -> TimerHandle {
        self.timers
            .schedule_at(self.now + delay, AppTimer::Session(step))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl SessionHost for AppHost<'_> {
    fn request_flash(&mut self, request: FlashRequest) {
        let id = self.overlay.show(&request);
        self.timers
            .schedule_at(self.now + request.duration, AppTimer::FlashExpired(id));
    }

    fn on_status(&mut self, status: &Status) {
        *self.status = status.clone();
    }
}

#[derive(Debug)]
pub struct App {
    pub form: Form,
    pub controller: SessionController,
    pub timers: DeadlineQueue<AppTimer>,
    pub overlay: FlashOverlay,
    pub status: Status,
    pub should_quit: bool,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            form: Form::from_settings(settings),
            controller: SessionController::with_flash_grace(settings.flash_grace),
            timers: DeadlineQueue::new(),
            overlay: FlashOverlay::new(),
            status: Status::Ready,
            should_quit: false,
        }
    }

    pub fn controls(&self) -> Controls {
        self.controller.controls()
    }

    /// Reads the form once and starts a session from that snapshot.
    pub fn start_session(&mut self, now: Instant) {
        if !self.controls().start_enabled {
            return;
        }
        let config = match self.form.to_config() {
            Ok(config) => config,
            Err(err) => {
                info!(%err, "invalid form input");
                self.status = Status::Invalid(err);
                return;
            }
        };

        let mut host = AppHost {
            timers: &mut self.timers,
            overlay: &mut self.overlay,
            status: &mut self.status,
            now,
        };
        if let Err(err) = self.controller.start(config, &mut host) {
            debug!(%err, "start rejected");
        }
    }

    pub fn stop_session(&mut self, now: Instant) {
        let mut host = AppHost {
            timers: &mut self.timers,
            overlay: &mut self.overlay,
            status: &mut self.status,
            now,
        };
        self.controller.stop(&mut host);
    }

    /// Fires every timer due at `now`, earliest first.
    pub fn on_tick(&mut self, now: Instant) {
        while let Some((handle, timer)) = self.timers.pop_due(now) {
            match timer {
                AppTimer::Session(step) => {
                    let mut host = AppHost {
                        timers: &mut self.timers,
                        overlay: &mut self.overlay,
                        status: &mut self.status,
                        now,
                    };
                    self.controller.on_timer(handle, step, now, &mut host);
                }
                AppTimer::FlashExpired(id) => {
                    self.overlay.expire(id);
                }
            }
        }
    }

    /// Stops any running session and drops every pending timer and flash.
    pub fn shutdown(&mut self, now: Instant) {
        self.stop_session(now);
        self.overlay.clear();
        self.timers.clear();
    }

    pub fn quit(&mut self, now: Instant) {
        self.shutdown(now);
        self.should_quit = true;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        let running = self.controller.is_running();

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit(now)
            }
            KeyCode::Esc if running => self.stop_session(now),
            KeyCode::Esc => self.quit(now),
            _ if running => {}
            KeyCode::Enter => self.start_session(now),
            KeyCode::Char('q') => self.quit(now),
            KeyCode::Tab | KeyCode::Down => self.form.focus = self.form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus = self.form.focus.prev(),
            code => self.form.edit(code),
        }
    }
}
