use clap::Parser;
use sapi_client::{Config, Harness, Scenario};
use tracing_subscriber::EnvFilter;

/// Run the SAPI contract scenarios against a live deployment.
#[derive(Debug, Parser)]
#[command(name = "sapi-harness")]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Scenarios to run; all of them when omitted.
    #[arg(long = "scenario", value_enum)]
    scenarios: Vec<Scenario>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let scenarios = if cli.scenarios.is_empty() {
        Scenario::ALL.to_vec()
    } else {
        cli.scenarios
    };

    let harness = Harness::new(&cli.config)?;
    let reports = harness.run_all(&scenarios).await;

    let mut failed = 0;
    for report in &reports {
        match &report.result {
            Ok(()) => println!("ok - {}", report.scenario.name()),
            Err(err) => {
                failed += 1;
                println!("not ok - {}\n  {err}", report.scenario.name());
            }
        }
    }

    println!("# pass {}\n# fail {}", reports.len() - failed, failed);

    if failed > 0 {
        anyhow::bail!("{failed} of {} scenarios failed", reports.len());
    }

    Ok(())
}
