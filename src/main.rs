//! ffwrap - run `ffmpeg` with live progress and graceful Ctrl-C handling.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ffwrap::config::{ConfigError, ConfigLoader, FfmpegConfig};
use ffwrap::display;
use ffwrap::events::{Event, EventKind};
use ffwrap::options::{render_command, OptionArg};
use ffwrap::process::{ExecuteError, ExecuteOptions, ExecutionState, Ffmpeg, Input};

#[derive(Parser)]
#[command(name = "ffwrap", about = "Run ffmpeg with live progress", version)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to load instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ffmpeg, printing progress as it goes.
    Run(RunArgs),
    /// Print the effective configuration as TOML.
    ShowConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// ffmpeg executable, overriding the config file.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    /// Global option, repeatable (e.g. `-g y -g loglevel=info`).
    #[arg(short = 'g', long = "global", value_name = "KEY[=VALUE]", value_parser = parse_key_value)]
    global: Vec<(String, Option<String>)>,
    /// Input URL, repeatable.
    #[arg(short = 'i', long = "input", value_name = "URL")]
    inputs: Vec<String>,
    /// Option applied to every input.
    #[arg(long, value_name = "KEY[=VALUE]", value_parser = parse_key_value)]
    input_option: Vec<(String, Option<String>)>,
    /// Output URL, repeatable.
    #[arg(short = 'o', long = "output", value_name = "URL")]
    outputs: Vec<String>,
    /// Option applied to every output.
    #[arg(long, value_name = "KEY[=VALUE]", value_parser = parse_key_value)]
    output_option: Vec<(String, Option<String>)>,
    /// Kill ffmpeg if it runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,
    /// Pipe this program's stdin into ffmpeg.
    #[arg(long)]
    stdin: bool,
    /// Print progress as JSON lines.
    #[arg(long)]
    json: bool,
}

/// Parse `KEY` or `KEY=VALUE`.
fn parse_key_value(s: &str) -> Result<(String, Option<String>), String> {
    let (key, value) = match s.split_once('=') {
        Some((key, value)) => (key, Some(value.to_string())),
        None => (s, None),
    };
    let key = key.trim_start_matches('-');
    if key.is_empty() {
        return Err(format!("missing option key in `{s}`"));
    }
    Ok((key.to_string(), value))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<FfmpegConfig, ConfigError> {
    match path {
        Some(path) => ConfigLoader::load_from_path(&path),
        None => ConfigLoader::new().load(),
    }
}

fn build(config: FfmpegConfig, args: &RunArgs) -> Ffmpeg {
    let mut ffmpeg = Ffmpeg::with_config(config);

    for (key, value) in &args.global {
        ffmpeg = ffmpeg.option(key, OptionArg::from(value.as_ref()));
    }
    for url in &args.inputs {
        ffmpeg = ffmpeg.input(url, options(&args.input_option));
    }
    for url in &args.outputs {
        ffmpeg = ffmpeg.output(url, options(&args.output_option));
    }

    let json = args.json;
    ffmpeg
        .on(EventKind::Start, |event| {
            if let Event::Start(arguments) = event {
                display::print_start(&render_command(arguments));
            }
            Ok(())
        })
        .on(EventKind::Progress, move |event| {
            if let Some(statistics) = event.statistics() {
                if json {
                    display::print_progress_json(statistics);
                } else {
                    display::print_progress(statistics);
                }
            }
            Ok(())
        })
        .on(EventKind::Terminated, |_| {
            display::print_terminated();
            Ok(())
        })
        .on(EventKind::Error, |event| {
            if let Event::Error(error) = event {
                display::print_error(error);
            }
            Ok(())
        });

    ffmpeg
}

fn options(pairs: &[(String, Option<String>)]) -> Vec<(&str, OptionArg)> {
    pairs
        .iter()
        .map(|(key, value)| (key.as_str(), OptionArg::from(value.as_ref())))
        .collect()
}

async fn run(mut config: FfmpegConfig, args: RunArgs) -> ExitCode {
    if let Some(executable) = &args.ffmpeg {
        config.executable.clone_from(executable);
    }
    let error_mode = config.error_mode;

    let mut options = ExecuteOptions::new();
    if args.stdin {
        options = options.input(Input::reader(tokio::io::stdin()));
    }
    if let Some(secs) = args.timeout {
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) => options = options.timeout(timeout),
            Err(e) => {
                eprintln!("Invalid --timeout {secs}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let ffmpeg = Arc::new(build(config, &args));
    tracing::info!(command = %ffmpeg.command_line(), ?error_mode, "Starting ffmpeg");

    let runner = Arc::clone(&ffmpeg);
    let mut task = tokio::spawn(async move { runner.execute_with(options).await });

    let joined = loop {
        tokio::select! {
            joined = &mut task => break joined,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    break (&mut task).await;
                }
                tracing::info!("Ctrl-C received, asking ffmpeg to finish");
                if let Err(e) = ffmpeg.terminate() {
                    tracing::warn!(error = %e, "Terminate failed");
                }
            }
        }
    };

    match joined {
        Ok(result) => report(result, &ffmpeg, &mut std::io::stdout().lock()),
        Err(e) => {
            tracing::error!(error = %e, "Runner task failed");
            ExitCode::FAILURE
        }
    }
}

/// Write the captured output to `out` and pick the exit code.
fn report(
    result: Result<Vec<u8>, ExecuteError>,
    ffmpeg: &Ffmpeg,
    out: &mut impl Write,
) -> ExitCode {
    match result {
        Ok(stdout) => {
            if let Err(e) = write_output(out, &stdout) {
                eprintln!("Error: failed to write ffmpeg output: {e}");
                return ExitCode::FAILURE;
            }
            if ffmpeg.state() == ExecutionState::Completed {
                display::print_completed(stdout.len());
                ExitCode::SUCCESS
            } else if ffmpeg.is_terminated() {
                ExitCode::SUCCESS
            } else {
                // Emit mode: the error listener already printed it.
                ExitCode::FAILURE
            }
        }
        Err(ExecuteError::Ffmpeg(error)) => {
            display::print_error(&error);
            tracing::debug!(message = %error.message(), "Full ffmpeg diagnostics");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn write_output(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    out.write_all(bytes)?;
    out.flush()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run(args) => run(config, args).await,
        Commands::ShowConfig => match toml::to_string_pretty(&config) {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
