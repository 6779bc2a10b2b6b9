//! sortgate - sort lines by racing one task per line into a shared list

use anyhow::{Context, Result, bail};
use clap::Parser;
use sortgate::{Driver, DriverSettings, LineReader, LineSource, ReaderSettings, ReportFormat};
use sortgate_core::{Config, FailurePolicy};
use std::{
  io::{self, Write},
  path::{Path, PathBuf},
};
use tracing::debug;

mod logging;

use logging::init_cli_logging;

#[derive(Parser)]
#[command(name = "sortgate")]
#[command(about = "Read lines until \"stop!\", then sort them with one worker task per line")]
#[command(after_help = "\
CONFIG LOOKUP:
  --config FILE > ./.sortgate.toml > ~/.config/sortgate/config.toml > defaults

EXAMPLES:
  sortgate                        # Interactive, one second per byte of each line
  sortgate --delay-ms 0 < lines   # Sort a file without the artificial delay
  sortgate --json < lines         # Prompts go to stderr, stdout is one JSON object
  sortgate --init-config          # Write a commented ./.sortgate.toml")]
struct Cli {
  /// Config file to use instead of the directory and user lookup
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,
  /// Worker delay per byte of its line, in milliseconds
  #[arg(long, value_name = "MS")]
  delay_ms: Option<u64>,
  /// What a worker failure does to the run: abort or skip
  #[arg(long, value_name = "POLICY")]
  on_failure: Option<FailurePolicy>,
  /// Print the result as a single JSON object
  #[arg(long)]
  json: bool,
  /// Print the effective configuration as TOML and exit
  #[arg(long, conflicts_with = "init_config")]
  print_config: bool,
  /// Write the default config template to ./.sortgate.toml and exit
  #[arg(long)]
  init_config: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = match &cli.config {
    Some(path) => Config::from_file(path)?,
    None => {
      let cwd = std::env::current_dir().context("failed to resolve current directory")?;
      Config::load_for_dir(&cwd)
    }
  };

  if let Some(delay_ms) = cli.delay_ms {
    config.workers.delay_per_byte_ms = delay_ms;
  }
  if let Some(policy) = cli.on_failure {
    config.workers.on_failure = policy;
  }
  config.validate()?;
  Ok(config)
}

fn init_config(dir: &Path) -> Result<PathBuf> {
  let config_path = Config::project_config_path(dir);
  if config_path.exists() {
    bail!("config file already exists: {}", config_path.display());
  }

  std::fs::write(&config_path, Config::generate_template())
    .with_context(|| format!("failed to write {}", config_path.display()))?;
  Ok(config_path)
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  if cli.init_config {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    println!("Created {}", init_config(&cwd)?.display());
    return Ok(());
  }

  let config = load_config(&cli)?;
  if cli.print_config {
    print!("{}", toml::to_string_pretty(&config)?);
    return Ok(());
  }

  init_cli_logging(&config.log.level);
  debug!(?config, "configuration loaded");

  let mut settings = DriverSettings::from_config(&config);
  if cli.json {
    settings.format = ReportFormat::Json;
  }

  // JSON mode keeps stdout for the report alone
  let prompt: Box<dyn Write + Send> = match settings.format {
    ReportFormat::Json => Box::new(io::stderr()),
    ReportFormat::Text => Box::new(io::stdout()),
  };
  let reader_settings = ReaderSettings::from(&config.input);
  let mut records = tokio::task::spawn_blocking(move || {
    LineReader::new(io::stdin().lock(), prompt, reader_settings).read_lines()
  })
  .await
  .context("line reader task failed")?
  .context("reading input failed")?;

  Driver::new(settings)
    .run(&mut records, &mut io::stdout())
    .await
    .context("sorting failed")?;

  Ok(())
}
