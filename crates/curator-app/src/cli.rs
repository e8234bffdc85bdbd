//! Command-line surface of the curator binary.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use curator_config::{ConfigOverrides, CuratorConfig};
use curator_events::EventBus;
use curator_media::ResolutionThreshold;
use curator_telemetry::{GlobalContextGuard, Metrics};
use tracing::info;

use crate::bootstrap::{
    build_probe, build_workflow, init_telemetry, load_config, probe_file, run_once,
};
use crate::error::{AppError, AppResult};

/// Relocate high-resolution media out of an incoming library.
#[derive(Debug, Parser)]
#[command(name = "curator", about = "Relocate UHD media into a curated library")]
pub struct Cli {
    /// YAML configuration document.
    #[arg(long, global = true, env = "CURATOR_CONFIG")]
    pub config: Option<PathBuf>,
    /// Override `library.base_path`.
    #[arg(long, global = true)]
    pub base_path: Option<PathBuf>,
    /// Override `library.destination_path`.
    #[arg(long, global = true)]
    pub destination_path: Option<PathBuf>,
    /// Override `telemetry.log_format` (`pretty` or `json`).
    #[arg(long, global = true)]
    pub log_format: Option<String>,
    #[allow(missing_docs)]
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline once.
    Run {
        /// Acknowledge a failed run instead of exiting non-zero.
        #[arg(long)]
        acknowledge: bool,
    },
    /// Print the effective configuration as YAML.
    CheckConfig,
    /// Probe a single file and report whether it qualifies.
    Probe {
        /// Media file to probe.
        file: PathBuf,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_path: self.base_path.clone(),
            destination_path: self.destination_path.clone(),
            log_format: self.log_format.clone(),
        }
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Run { .. } => "run",
        Command::CheckConfig => "check-config",
        Command::Probe { .. } => "probe",
    }
}

/// Parse arguments, execute the command, and return the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> AppResult<()> {
    let config = load_config(cli.config.as_deref(), &cli.overrides())?;
    match cli.command {
        Command::CheckConfig => {
            let rendered = curator_config::render_yaml(&config)
                .map_err(|err| AppError::config("config.render", err))?;
            write_out(&mut io::stdout(), &rendered)
        }
        Command::Run { acknowledge } => {
            let output = handle_run(&config, acknowledge).await?;
            write_out(&mut io::stdout(), &output)
        }
        Command::Probe { file } => {
            let probe = build_probe(&config);
            let threshold =
                ResolutionThreshold::new(config.evaluation.min_width, config.evaluation.min_height);
            let (dimensions, qualifies) = probe_file(&probe, &file, threshold).await?;
            let verdict = if qualifies { "qualifies" } else { "below threshold" };
            write_out(
                &mut io::stdout(),
                &format!("{}: {dimensions} ({verdict})\n", file.display()),
            )
        }
    }
}

async fn handle_run(config: &CuratorConfig, acknowledge: bool) -> AppResult<String> {
    init_telemetry(config)?;
    let _context = GlobalContextGuard::new(command_label(&Command::Run { acknowledge }));
    info!("curator run starting");

    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let workflow = build_workflow(config, EventBus::new(), metrics.clone()).await?;
    let summary = run_once(workflow, acknowledge).await?;
    let snapshot = metrics.snapshot();
    Ok(format!(
        "run {}: {} ({} qualifying, {} moved, {} skipped, {} reported)\n",
        summary.run_id,
        summary.state,
        summary.qualifying,
        snapshot.files_moved_total,
        snapshot.files_skipped_total,
        summary.reported
    ))
}

fn write_out(out: &mut impl Write, text: &str) -> AppResult<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| AppError::Io {
            operation: "stdout.write",
            path: None,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[test]
    fn parses_global_overrides_after_subcommand() -> TestResult<()> {
        let cli = Cli::try_parse_from([
            "curator",
            "run",
            "--acknowledge",
            "--base-path",
            "/lib/in",
            "--log-format",
            "json",
        ])?;
        assert!(matches!(cli.command, Command::Run { acknowledge: true }));
        let overrides = cli.overrides();
        assert_eq!(overrides.base_path, Some(PathBuf::from("/lib/in")));
        assert_eq!(overrides.destination_path, None);
        assert_eq!(overrides.log_format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn probe_requires_a_file() {
        assert!(Cli::try_parse_from(["curator", "probe"]).is_err());
        assert!(Cli::try_parse_from(["curator", "probe", "/lib/a.mkv"]).is_ok());
    }

    #[test]
    fn labels_match_subcommand_names() -> TestResult<()> {
        let cli = Cli::try_parse_from(["curator", "check-config"])?;
        assert_eq!(command_label(&cli.command), "check-config");
        Ok(())
    }

    #[test]
    fn write_out_appends_text() -> TestResult<()> {
        let mut buffer = Vec::new();
        write_out(&mut buffer, "hello\n")?;
        assert_eq!(buffer, b"hello\n");
        Ok(())
    }
}
