use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tapr::{
    app::{run_app, App},
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore, Overrides, RuntimeSettings},
    controller::SessionController,
    logging::init_logging,
    runtime::{spawn_terminal_reader, ChannelEventSource, Runner},
    ticker::ThreadTickScheduler,
};

/// Redraw at least this often even when nothing happens
const FRAME_TIMEOUT_MS: u64 = 250;

/// tap as fast as you can for five seconds
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A five second tap-speed game for the terminal. Hammer the tap key (or click the button) and see your clicks per second."
)]
pub struct Cli {
    /// countdown refresh interval in milliseconds (10-1000)
    #[clap(short = 't', long = "tick-ms")]
    tick_ms: Option<u64>,

    /// key that counts as a tap (default: space)
    #[clap(short = 'k', long)]
    tap_key: Option<char>,

    /// do not capture the mouse; only the tap key counts
    #[clap(long)]
    no_mouse: bool,

    /// write logs to this file (RUST_LOG alone logs to the state dir)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// persist the resolved settings to the config file before starting
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            tick_interval_ms: self.tick_ms,
            tap_key: self.tap_key,
            no_mouse: self.no_mouse,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.as_deref())?;

    let store = FileConfigStore::new();
    let settings = match RuntimeSettings::resolve(&store.load(), &cli.overrides()) {
        Ok(settings) => settings,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };
    if cli.save_config {
        store.save(&Config::from(&settings))?;
        log::info!("saved settings to {}", store.path().display());
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    if settings.mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mouse = settings.mouse;
    let result = start_tui(&mut terminal, settings);

    // restore the terminal before reporting any error
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: RuntimeSettings,
) -> Result<(), Box<dyn Error>> {
    let (tx, events) = ChannelEventSource::channel();
    spawn_terminal_reader(tx.clone());

    let controller = SessionController::new(
        SystemClock,
        ThreadTickScheduler::new(tx),
        settings.tick_interval,
    );
    let mut app = App::new(controller, settings);
    let runner = Runner::new(events, Duration::from_millis(FRAME_TIMEOUT_MS));

    run_app(terminal, &mut app, &runner)?;
    Ok(())
}
