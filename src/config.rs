use std::path::PathBuf;
use std::time::Duration;

use crate::color::{Rgb, WHITE};
use crate::session::DEFAULT_FLASH_GRACE;

pub const DEFAULT_REPETITIONS: u32 = 10_000;
pub const DEFAULT_DELAY_SECS: f64 = 45.0;
pub const DEFAULT_DURATION_SECS: f64 = 0.1;
pub const DEFAULT_TICK_RATE_MS: u64 = 50;

/// Startup values for the form and the event loop. Only seeds the form;
/// nothing is written back anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub repetitions: u32,
    pub delay_secs: f64,
    pub duration_secs: f64,
    pub color: Rgb,
    pub flash_grace: Duration,
    pub tick_rate: Duration,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            delay_secs: DEFAULT_DELAY_SECS,
            duration_secs: DEFAULT_DURATION_SECS,
            color: WHITE,
            flash_grace: DEFAULT_FLASH_GRACE,
            tick_rate: Duration::from_millis(DEFAULT_TICK_RATE_MS),
            log_file: None,
        }
    }
}

impl Settings {
    /// Text shown in the numeric fields: whole numbers without a trailing ".0".
    pub fn field_text(value: f64) -> String {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            value.to_string()
        }
    }
}
