//! src/main.rs
use anyhow::Context;
use trackstats::configuration::get_configuration;
use trackstats::job::StatsJob;
use trackstats::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().context("Failed to read configuration.")?;
    let tracer_provider = init_tracing("trackstats", &configuration.telemetry)?;

    let job = StatsJob::start(configuration).await?;
    let outcome = job.run().await;
    job.shutdown().await?;
    let summary = outcome?;

    println!(
        "Job {} reduced {} batches, report written to {}",
        summary.job_id, summary.batches, summary.location
    );

    if let Some(tracer_provider) = tracer_provider {
        tracer_provider.shutdown()?;
    }
    Ok(())
}
