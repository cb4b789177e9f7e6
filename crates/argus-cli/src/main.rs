use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use argus_client::{ChromeConfig, ChromeSession, wait_for_server};
use argus_core::audit::SourceAudit;
use argus_core::runner::{TracingRunReporter, run_isolated};
use argus_core::{ArgusConfig, Scenario, ScenarioResult, catalog};

#[derive(Parser)]
#[command(name = "argus", version, about = "Polling-based UI verification for web apps")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for `ArgusConfig`; each falls back to its environment variable.
#[derive(Args)]
struct ConfigArgs {
    /// Base URL of the application under test
    #[arg(long, global = true, env = "ARGUS_BASE_URL")]
    base_url: Option<String>,

    /// Selector of the main text input
    #[arg(long, global = true, env = "ARGUS_INPUT_SELECTOR")]
    input_selector: Option<String>,

    /// Directory for screenshots and reports
    #[arg(long, global = true, env = "ARGUS_ARTIFACTS_DIR")]
    artifacts_dir: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long, global = true, env = "ARGUS_POLL_INTERVAL_MS")]
    interval_ms: Option<String>,

    /// Per-expectation timeout in milliseconds
    #[arg(long, global = true, env = "ARGUS_TIMEOUT_MS")]
    timeout_ms: Option<String>,

    /// Browser viewport, e.g. 1280x720
    #[arg(long, global = true, env = "ARGUS_VIEWPORT")]
    viewport: Option<String>,
}

impl ConfigArgs {
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "ARGUS_BASE_URL" => self.base_url.clone(),
            "ARGUS_INPUT_SELECTOR" => self.input_selector.clone(),
            "ARGUS_ARTIFACTS_DIR" => self.artifacts_dir.clone(),
            "ARGUS_POLL_INTERVAL_MS" => self.interval_ms.clone(),
            "ARGUS_TIMEOUT_MS" => self.timeout_ms.clone(),
            "ARGUS_VIEWPORT" => self.viewport.clone(),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in scenarios
    List,

    /// Run one scenario, built-in or from a JSON file
    Run {
        /// Name of a built-in scenario
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        name: Option<String>,

        /// Path to a scenario JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Skip waiting for the application server to respond
        #[arg(long, default_value_t = false)]
        no_server_check: bool,
    },

    /// Run every built-in scenario concurrently, each in its own browser context
    RunAll {
        /// Skip waiting for the application server to respond
        #[arg(long, default_value_t = false)]
        no_server_check: bool,
    },

    /// Check a source file for required accessibility markup
    Audit {
        /// Control panel component to audit
        #[arg(short, long, default_value = "src/components/ControlPanel.tsx")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("argus=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ArgusConfig::from_lookup(|key| cli.config.lookup(key))
        .map_err(|e| anyhow::anyhow!(e))?;

    let all_passed = match cli.command {
        Commands::List => cmd_list(&config)?,
        Commands::Run {
            name,
            file,
            no_server_check,
        } => {
            let scenario = load_scenario(name.as_deref(), file.as_ref(), &config)?;
            if !no_server_check {
                check_server(&config).await?;
            }
            cmd_run(&scenario, &config).await?
        }
        Commands::RunAll { no_server_check } => {
            if !no_server_check {
                check_server(&config).await?;
            }
            cmd_run_all(&config).await?
        }
        Commands::Audit { path } => cmd_audit(path)?,
    };

    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_scenario(
    name: Option<&str>,
    file: Option<&PathBuf>,
    config: &ArgusConfig,
) -> Result<Scenario> {
    if let Some(path) = file {
        return Scenario::from_file(path).map_err(|e| anyhow::anyhow!(e));
    }
    let name = name.context("Either a scenario name or --file is required")?;
    catalog::find(name, config)
        .map_err(|e| anyhow::anyhow!(e))?
        .with_context(|| {
            format!(
                "Unknown scenario '{name}'. Available: {}",
                catalog::names().join(", ")
            )
        })
}

async fn check_server(config: &ArgusConfig) -> Result<()> {
    tracing::info!("Waiting for {}", config.base_url);
    wait_for_server(&config.base_url, &config.policy)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn launch(config: &ArgusConfig) -> Result<ChromeSession> {
    ChromeSession::launch(ChromeConfig::default().with_viewport(config.viewport))
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

fn cmd_list(config: &ArgusConfig) -> Result<bool> {
    let scenarios = catalog::all(config).map_err(|e| anyhow::anyhow!(e))?;
    for scenario in &scenarios {
        println!(
            "{:<18} {:>2} steps  {}",
            scenario.name,
            scenario.steps.len(),
            scenario.description
        );
    }
    Ok(true)
}

async fn cmd_run(scenario: &Scenario, config: &ArgusConfig) -> Result<bool> {
    let session = launch(config).await?;
    let outcome = run_isolated(&session, scenario, config, &TracingRunReporter).await;
    session.close().await.map_err(|e| anyhow::anyhow!(e))?;

    let result = outcome.map_err(|e| anyhow::anyhow!(e))?;
    print_results(&[(scenario.name.as_str(), &result)])?;
    Ok(result.passed)
}

async fn cmd_run_all(config: &ArgusConfig) -> Result<bool> {
    let scenarios = catalog::all(config).map_err(|e| anyhow::anyhow!(e))?;
    let session = launch(config).await?;

    let outcomes = join_all(
        scenarios
            .iter()
            .map(|scenario| run_isolated(&session, scenario, config, &TracingRunReporter)),
    )
    .await;
    session.close().await.map_err(|e| anyhow::anyhow!(e))?;

    let mut results = Vec::new();
    let mut harness_faults = 0usize;
    for (scenario, outcome) in scenarios.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push((scenario.name.as_str(), result)),
            Err(e) => {
                tracing::error!(scenario = %scenario.name, error = %e, "Scenario could not run");
                harness_faults += 1;
            }
        }
    }

    let borrowed: Vec<(&str, &ScenarioResult)> =
        results.iter().map(|(name, result)| (*name, result)).collect();
    print_results(&borrowed)?;

    let passed = results.iter().filter(|(_, r)| r.passed).count();
    tracing::info!(
        passed,
        failed = results.len() - passed,
        harness_faults,
        "Run complete"
    );
    Ok(harness_faults == 0 && passed == results.len())
}

fn print_results(results: &[(&str, &ScenarioResult)]) -> Result<()> {
    let json: Vec<serde_json::Value> = results
        .iter()
        .map(|(name, result)| serde_json::json!({ "scenario": name, "result": result }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_audit(path: PathBuf) -> Result<bool> {
    let report = SourceAudit::control_panel_accessibility(path)
        .run()
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.passed())
}
