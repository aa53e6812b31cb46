// Forbid accidental stdout/stderr writes in the *library* portion of the TUI.
// The few places that report after the terminal is restored opt out locally.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use app::App;
use richinput_core::Config;
use richinput_core::ConfigOverrides;
use richinput_core::StaticDirectory;
use std::fs::OpenOptions;
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod app_event;
mod app_event_sender;
mod cli;
mod mention_popup;
mod rich_input;
mod text_surface;
mod tui;

pub use cli::Cli;

pub async fn run_main(cli: Cli) -> std::io::Result<()> {
    let log_dir = richinput_core::config::log_dir().map_err(std::io::Error::other)?;
    std::fs::create_dir_all(&log_dir)?;
    // Open (or create) your log file, appending to it.
    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);

    // Ensure the file is only readable and writable by the current user.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }

    let log_file = log_file_opts.open(log_dir.join("richinput-tui.log"))?;

    // Wrap file in non‑blocking writer.
    let (non_blocking, _guard) = non_blocking(log_file);

    // use RUST_LOG env var, default to info for richinput crates.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("richinput_core=info,richinput_tui=info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    let Cli {
        text,
        max_length,
        directory_file,
        placeholder,
    } = cli;

    let config = {
        // Load configuration and support CLI overrides.
        let overrides = ConfigOverrides {
            max_length,
            placeholder,
            directory_file,
        };
        #[allow(clippy::print_stderr)]
        match Config::load_with_overrides(overrides) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error loading configuration: {err}");
                std::process::exit(1);
            }
        }
    };

    #[allow(clippy::print_stderr)]
    let directory = match config.build_directory() {
        Ok(directory) => directory,
        Err(err) => {
            eprintln!("Error loading mention directory: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        names = directory.len(),
        max_length = config.max_length,
        "starting richinput"
    );

    try_run_ratatui_app(config, directory, text).await;
    Ok(())
}

#[expect(
    clippy::print_stderr,
    clippy::print_stdout,
    reason = "The terminal has been restored; report the outcome on the standard streams."
)]
async fn try_run_ratatui_app(config: Config, directory: StaticDirectory, text: Option<String>) {
    match run_ratatui_app(config, directory, text).await {
        Ok(final_text) => println!("{final_text}"),
        Err(report) => eprintln!("Error: {report:?}"),
    }
}

async fn run_ratatui_app(
    config: Config,
    directory: StaticDirectory,
    text: Option<String>,
) -> color_eyre::Result<String> {
    color_eyre::install()?;

    let mut terminal = tui::init()?;
    terminal.clear()?;

    let app_result = App::run(&mut terminal, config, directory, text).await;

    restore();
    app_result
}

#[expect(
    clippy::print_stderr,
    reason = "TUI should no longer be displayed, so we can write to stderr."
)]
fn restore() {
    if let Err(err) = tui::restore() {
        eprintln!(
            "failed to restore terminal. Run `reset` or restart your terminal to recover: {err}"
        );
    }
}
