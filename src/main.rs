use clap::Parser;
use dialogue_skipper::{
    app::{App, SkipperOptions},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    console::Console,
    elevation::{self, ElevationOutcome},
    input::EnigoFactory,
    logging,
    menu::{Menu, MenuOutcome},
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

/// auto-click through in-game dialogue at a fixed screen position
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Clicks a configured screen position at a fixed interval while toggled on with a global hotkey, pausing and stopping on demand and stopping by itself after a time budget."
)]
pub struct Cli {
    /// configuration file to use instead of the platform default
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// log file to append to instead of the platform default
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// do not try to relaunch with elevated privileges
    #[clap(long)]
    no_elevate: bool,

    /// verbose logging; RUST_LOG is honoured when set
    #[clap(long)]
    debug: bool,

    /// skip the menu and start the skipper with the stored configuration
    #[clap(short = 's', long)]
    start: bool,
}

impl Cli {
    fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(AppDirs::log_path)
    }

    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_path = cli.log_path();

    let _guard = match logging::init(&log_path, cli.debug) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("dialogue-skipper: could not initialise logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut console = Console::new(io::stdout());

    if !cli.no_elevate {
        let args: Vec<String> = std::env::args().skip(1).collect();
        match elevation::ensure_elevated(elevation::platform().as_ref(), &args) {
            ElevationOutcome::Relaunched => return ExitCode::SUCCESS,
            ElevationOutcome::Failed(err) => {
                let _ = console.warn(&format!(
                    "Could not relaunch with elevated privileges ({err}). Clicks may be ignored by elevated games."
                ));
            }
            ElevationOutcome::AlreadyElevated | ElevationOutcome::Unsupported => {}
        }
    }

    match run(&cli, &mut console) {
        Ok(()) => {
            tracing::info!("exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = ?err, "unexpected error");
            let _ = console.error(&format!(
                "Something went wrong. Details were written to {}",
                log_path.display()
            ));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, console: &mut Console<Stdout>) -> anyhow::Result<()> {
    let store = cli.store();
    let mut settings = store.load();
    tracing::info!(config = %store.path().display(), "configuration loaded");

    let factory = Arc::new(EnigoFactory::default());
    let app = App::new(factory.clone(), settings.clone());

    console.clear_screen()?;
    console.banner()?;
    let mut skip_menu = cli.start;
    loop {
        if !skip_menu {
            let stdin = io::stdin();
            let mut menu = Menu::new(stdin.lock(), console, &store, factory.as_ref());
            if menu.run(&mut settings)? == MenuOutcome::Exit {
                console.info("Goodbye.")?;
                return Ok(());
            }
        }
        skip_menu = false;
        app.run_skipper(&settings, console, SkipperOptions::default())?;
    }
}
