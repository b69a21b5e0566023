use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod config;
use config::app_config::{AppConfig, load_config, setup_resolver};
pub mod tcp_probe;
use tcp_probe::prelude::*;
pub mod sweep;
use sweep::NetworkTester;
pub mod report;
use report::OutputFormat;

const UNHEALTHY_EXIT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "zoneprobe", version, about)]
struct Cli {
    /// How results are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe every configured endpoint once (default).
    Sweep,
    /// Probe the private-link endpoint of one service (openai, cosmos, storage, keyvault, apim).
    Service { name: String },
    /// Probe every endpoint and print only the aggregate status.
    Status,
    /// Sweep repeatedly until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", report(&*e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let AppConfig {
        probe,
        dns_hosts,
        max_endpoint_width,
    } = load_config()?;

    let resolver = setup_resolver(&dns_hosts, probe.timeout())?;
    let tester = NetworkTester::new(&probe, TcpProber::new(resolver));

    match cli.command.unwrap_or(Command::Sweep) {
        Command::Sweep => {
            let summary = tester.run_connectivity_tests().await?;
            match cli.format {
                OutputFormat::Text => {
                    println!("{}", report::render_summary(&summary, max_endpoint_width))
                }
                OutputFormat::Json => println!("{}", report::to_json(&summary)?),
            }
            Ok(exit_code(summary.overall_status))
        }
        Command::Service { name } => {
            let result = tester.test_named_service(&name).await;
            match cli.format {
                OutputFormat::Text => {
                    println!("{}", report::render_result(&result, result.endpoint.len()))
                }
                OutputFormat::Json => println!("{}", report::to_json(&result)?),
            }
            Ok(match result.is_reachable {
                true => ExitCode::SUCCESS,
                false => ExitCode::from(UNHEALTHY_EXIT),
            })
        }
        Command::Status => {
            let overview = tester.status_overview().await?;
            match cli.format {
                OutputFormat::Text => println!("{}", report::render_overview(&overview)),
                OutputFormat::Json => println!("{}", report::to_json(&overview)?),
            }
            Ok(exit_code(overview.overall_status))
        }
        Command::Watch => {
            let interval = probe.polling_interval();
            loop {
                let summary = tester.run_connectivity_tests().await?;
                match cli.format {
                    OutputFormat::Text => {
                        println!("{}\n", report::render_summary(&summary, max_endpoint_width))
                    }
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string(&summary)?)
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, stopping watch");
                        return Ok(ExitCode::SUCCESS);
                    }
                }
            }
        }
    }
}

fn exit_code(status: OverallStatus) -> ExitCode {
    match status {
        OverallStatus::Unhealthy => ExitCode::from(UNHEALTHY_EXIT),
        OverallStatus::Healthy | OverallStatus::Degraded => ExitCode::SUCCESS,
    }
}
