//! Operator tool for the CRM circuit breakers.
//!
//! - `check`: load and validate a breaker config, print the resolved profiles
//! - `simulate`: drive one configured breaker with a scripted outcome
//!   sequence and print the resulting stats

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crm_breaker::config::{load_config, ResilienceConfig};
use crm_breaker::observability::{logging, metrics};
use crm_breaker::BreakerRegistry;

#[derive(Parser)]
#[command(name = "crm-breaker")]
#[command(about = "Inspect and exercise CRM dependency circuit breakers", long_about = None)]
struct Cli {
    /// Breaker configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print every breaker profile
    Check,
    /// Run a scripted sequence of outcomes through one breaker
    Simulate {
        /// Breaker to drive
        #[arg(short, long, default_value = "database")]
        breaker: String,

        /// Outcomes: `s` succeeds, `f` fails, `t` hangs until the operation
        /// timeout (only for breakers that have one)
        #[arg(short, long)]
        script: String,

        /// Pause between calls in milliseconds
        #[arg(short, long, default_value_t = 0)]
        pause_ms: u64,
    },
}

/// One scripted call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Succeed,
    Fail,
    Hang,
}

impl Step {
    fn symbol(&self) -> char {
        match self {
            Step::Succeed => 's',
            Step::Fail => 'f',
            Step::Hang => 't',
        }
    }
}

/// Parse a simulate script before any call runs.
fn parse_script(script: &str, operation_timeout: Option<Duration>) -> Result<Vec<Step>, String> {
    if script.is_empty() {
        return Err("script is empty".to_string());
    }

    script
        .chars()
        .enumerate()
        .map(|(position, symbol)| match symbol {
            's' => Ok(Step::Succeed),
            'f' => Ok(Step::Fail),
            't' if operation_timeout.is_some() => Ok(Step::Hang),
            't' => Err(format!(
                "step {} is 't' but the breaker has no operation timeout",
                position
            )),
            other => Err(format!(
                "unknown script step '{}' at position {} (expected s, f or t)",
                other, position
            )),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };

    logging::init(&config.observability)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (registry, _database) = BreakerRegistry::from_config(&config)?;

    match cli.command {
        Commands::Check => {
            let profiles: Vec<_> = std::iter::once(&config.database.breaker)
                .chain(config.breakers.iter())
                .collect();
            println!("{}", serde_json::to_string_pretty(&profiles)?);
        }
        Commands::Simulate {
            breaker,
            script,
            pause_ms,
        } => {
            let breaker = registry
                .get(&breaker)
                .ok_or_else(|| format!("no breaker named '{}'", breaker))?;

            let operation_timeout = breaker.config().operation_timeout();
            let steps = parse_script(&script, operation_timeout)?;

            for (step, outcome) in steps.into_iter().enumerate() {
                let result = breaker
                    .execute(|| async move {
                        match (outcome, operation_timeout) {
                            (Step::Succeed, _) => Ok(()),
                            (Step::Hang, Some(limit)) => {
                                tokio::time::sleep(limit * 2).await;
                                Ok(())
                            }
                            (Step::Fail, _) | (Step::Hang, None) => Err("simulated failure"),
                        }
                    })
                    .await;

                let error = result.err().map(|e| e.to_string());
                tracing::info!(
                    step,
                    outcome = %outcome.symbol(),
                    error = ?error,
                    state = %breaker.current_state(),
                    "Simulated call"
                );

                if pause_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(pause_ms)).await;
                }
            }

            println!("{}", serde_json::to_string_pretty(&breaker.stats())?);
        }
    }

    Ok(())
}
