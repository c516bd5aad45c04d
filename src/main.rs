use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use flashr::{
    app::App,
    color::Rgb,
    config::{Settings, DEFAULT_TICK_RATE_MS},
    logging::init_tracing,
    runtime::{CrosstermEventSource, EventSource, FlashrEvent, Pacer, Runner},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

/// flash the whole terminal with a color on a fixed schedule
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Periodically floods the terminal with a color to pull your eyes off the screen: N flashes, each lasting a given time, separated by a fixed delay."
)]
pub struct Cli {
    /// number of flashes in a session
    #[clap(short = 'r', long, default_value_t = 10_000)]
    repetitions: u32,

    /// seconds to wait between flashes
    #[clap(short = 'd', long, default_value_t = 45.0)]
    delay: f64,

    /// seconds each flash stays on screen
    #[clap(short = 't', long, default_value_t = 0.1)]
    duration: f64,

    /// flash color as #RRGGBB, #RGB or a name (white, red, orange, ...)
    #[clap(short = 'c', long, default_value = "#FFFFFF")]
    color: Rgb,

    /// extra milliseconds after each flash before the next phase starts
    #[clap(long, default_value_t = 50)]
    grace_ms: u64,

    /// longest the event loop sleeps when no timer is due sooner, in milliseconds
    #[clap(long, default_value_t = DEFAULT_TICK_RATE_MS)]
    tick_ms: u64,

    /// write logs here instead of the default state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn to_settings(&self) -> Settings {
        Settings {
            repetitions: self.repetitions,
            delay_secs: self.delay,
            duration_secs: self.duration,
            color: self.color,
            flash_grace: Duration::from_millis(self.grace_ms),
            tick_rate: Duration::from_millis(self.tick_ms.max(1)),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings = cli.to_settings();
    init_tracing(settings.log_file.as_deref());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&settings);
    let runner = Runner::new(CrosstermEventSource::new(), Pacer::new(settings.tick_rate));
    let result = start_tui(&mut terminal, &mut app, &runner);

    // never leave a session running behind a closed terminal
    app.shutdown(Instant::now());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        match runner.step(Instant::now(), app.next_deadline()) {
            FlashrEvent::Tick => {
                let flashing = app.overlay.is_visible();
                let status = app.status.clone();
                app.on_tick(Instant::now());
                if flashing != app.overlay.is_visible() || status != app.status {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            FlashrEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            FlashrEvent::Key(key) => {
                app.on_key(key, Instant::now());
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
