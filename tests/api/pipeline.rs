//! tests/api/pipeline.rs
use crate::helpers::test_data_dir;
use claims::assert_err;
use trackstats::configuration::{ExecutorKind, OutputBackend, Settings, get_configuration};
use trackstats::job::StatsJob;

fn settings(executor: ExecutorKind, batch_size: usize, output: &std::path::Path) -> Settings {
    let mut settings = get_configuration().expect("Failed to get configuration");
    settings.input.path = test_data_dir().join("tracks.jsonl");
    settings.input.batch_size = batch_size;
    settings.cluster.executor = executor;
    settings.cluster.workers = 3;
    settings.output.backend = OutputBackend::File;
    settings.output.path = output.to_path_buf();
    settings
}

/// Runs a job against the fixture dataset and returns the report as written.
async fn run_job(executor: ExecutorKind, batch_size: usize) -> String {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("results.json");
    let job = StatsJob::start(settings(executor, batch_size, &output))
        .await
        .expect("Failed to start job");
    let summary = job.run().await.expect("Job failed");
    job.shutdown().await.expect("Failed to shutdown job");

    assert_eq!(summary.location, output.display().to_string());
    std::fs::read_to_string(&output).expect("Failed to read report")
}

async fn run_to_json(executor: ExecutorKind, batch_size: usize) -> serde_json::Value {
    let written = run_job(executor, batch_size).await;
    serde_json::from_str(&written).expect("Report is not valid JSON")
}

#[tokio::test]
async fn should_write_the_expected_report_for_the_fixture_dataset() {
    let report = run_to_json(ExecutorKind::Sequential, 4).await;

    assert_eq!(
        report,
        serde_json::json!({
            "total": 1515,
            "average": 151.5,
            "artist-popularity": { "X": 38.33, "Y": 56.67, "Z": 50.0, "W": 10.0 },
            "explicit-popularity": { "yes": 43.33, "no": 50.71 },
            "dancebyyear": { "before-2001": 0.45, "2001-2012": 0.77, "after-2012": 0.3 }
        })
    );
}

#[tokio::test]
async fn artists_are_listed_by_rank() {
    let written = run_job(ExecutorKind::Parallel, 2).await;

    let positions: Vec<usize> = ["\"X\"", "\"Y\"", "\"Z\"", "\"W\""]
        .iter()
        .map(|artist| written.find(artist).expect("Missing artist"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn batch_size_and_executor_do_not_change_the_report() {
    let baseline = run_to_json(ExecutorKind::Sequential, 10).await;
    for (executor, batch_size) in [
        (ExecutorKind::Sequential, 1),
        (ExecutorKind::Parallel, 3),
        (ExecutorKind::Distributed, 2),
        (ExecutorKind::Distributed, 7),
    ] {
        assert_eq!(
            run_to_json(executor, batch_size).await,
            baseline,
            "{executor:?} with batches of {batch_size}"
        );
    }
}

#[tokio::test]
async fn a_missing_input_file_fails_the_job() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("results.json");
    let mut settings = settings(ExecutorKind::Sequential, 4, &output);
    settings.input.path = dir.path().join("missing.jsonl");

    let job = StatsJob::start(settings).await.expect("Failed to start job");
    assert_err!(job.run().await);
    job.shutdown().await.expect("Failed to shutdown job");
    assert!(!output.exists());
}
