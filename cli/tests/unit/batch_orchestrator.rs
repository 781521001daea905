//! Batch stop / restart / remove across several services.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use tether_cli::application::services::batch::run_batch;
use tether_cli::application::services::service_start::start_service;
use tether_cli::domain::batch::{BatchOperation, BatchRun, BatchSummary};
use tether_cli::domain::error::ServiceError;
use tether_cli::domain::selector::Selector;
use tether_cli::infra::fs::LocalFs;
use tether_cli::infra::systemd::SystemdUserDriver;

use crate::helpers::{CLEAN_ENTRY, FakeSystemctl, NoCommands, Sandbox, start_request};
use crate::mocks::{MockConfirmer, quiet_reporter};

/// Start `names` in a fresh sandbox and return the driver with its fake.
async fn running(sb: &Sandbox, names: &[&str]) -> (SystemdUserDriver<FakeSystemctl>, FakeSystemctl) {
    let (driver, fake) = sb.driver();
    for name in names {
        let entry = sb.entry(&format!("{name}.ts"), CLEAN_ENTRY);
        start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &start_request(&entry))
            .await
            .expect("start");
    }
    fake.clear_calls();
    (driver, fake)
}

fn accept_all() -> MockConfirmer {
    let mut confirmer = MockConfirmer::new();
    confirmer.expect_confirm().returning(|_, _| Ok(true));
    confirmer
}

#[tokio::test]
async fn one_failing_member_does_not_abort_its_siblings() {
    let sb = Sandbox::linux();
    let (driver, fake) = running(&sb, &["a", "b", "c"]).await;
    fake.fail_unit("b.service");

    let run = run_batch(
        &driver,
        &LocalFs,
        &accept_all(),
        &Selector::parse(&["a", "b", "c"]),
        BatchOperation::Stop,
        true,
    )
    .await
    .expect("batch runs");

    let results = run.results();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.service.as_str()).collect::<Vec<_>>(),
        ["a", "b", "c"]
    );
    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert!(results[2].is_success());
    let error = results[1].error.as_deref().unwrap();
    assert!(error.contains("systemctl failed for service 'b'"), "got: {error}");

    let summary = BatchSummary::from_results(results);
    assert_eq!((summary.succeeded, summary.failed), (2, 1));
    assert!(!run.is_success());
}

#[tokio::test]
async fn declining_the_prompt_runs_nothing() {
    let sb = Sandbox::linux();
    let (driver, fake) = running(&sb, &["a", "b"]).await;

    let mut confirmer = MockConfirmer::new();
    confirmer
        .expect_confirm()
        .withf(|prompt, default| prompt.contains("Stop 2 services") && !*default)
        .times(1)
        .returning(|_, _| Ok(false));

    let run = run_batch(
        &driver,
        &LocalFs,
        &confirmer,
        &Selector::parse(&["all"]),
        BatchOperation::Stop,
        false,
    )
    .await
    .expect("batch");

    assert_eq!(run, BatchRun::Cancelled);
    assert!(fake.calls().is_empty(), "got: {:?}", fake.calls());
}

#[tokio::test]
async fn force_skips_the_prompt() {
    let sb = Sandbox::linux();
    let (driver, _fake) = running(&sb, &["a", "b"]).await;

    let mut confirmer = MockConfirmer::new();
    confirmer.expect_confirm().never();

    let run = run_batch(
        &driver,
        &LocalFs,
        &confirmer,
        &Selector::parse(&["[a,b]"]),
        BatchOperation::Restart,
        true,
    )
    .await
    .expect("batch");

    assert!(run.is_success());
    assert_eq!(run.results().len(), 2);
}

#[tokio::test]
async fn single_member_needs_no_confirmation() {
    let sb = Sandbox::linux();
    let (driver, _fake) = running(&sb, &["solo"]).await;

    let mut confirmer = MockConfirmer::new();
    confirmer.expect_confirm().never();

    let run = run_batch(
        &driver,
        &LocalFs,
        &confirmer,
        &Selector::parse(&["solo"]),
        BatchOperation::Stop,
        false,
    )
    .await
    .expect("batch");
    assert!(run.is_success());
}

#[tokio::test]
async fn all_expands_to_managed_services_only() {
    let sb = Sandbox::linux();
    let (driver, _fake) = running(&sb, &["web", "api"]).await;
    std::fs::write(sb.unit_path("foreign"), "[Unit]\nDescription=not ours\n").unwrap();

    let run = run_batch(
        &driver,
        &LocalFs,
        &accept_all(),
        &Selector::parse(&["all"]),
        BatchOperation::Remove { purge: false },
        true,
    )
    .await
    .expect("batch");

    let mut services: Vec<&str> = run.results().iter().map(|r| r.service.as_str()).collect();
    services.sort_unstable();
    assert_eq!(services, ["api", "web"]);
    assert!(run.is_success());
    assert!(!sb.unit_path("web").exists());
    assert!(sb.unit_path("foreign").exists());
}

#[tokio::test]
async fn unknown_member_is_a_failure_result() {
    let sb = Sandbox::linux();
    let (driver, _fake) = running(&sb, &["a"]).await;

    let run = run_batch(
        &driver,
        &LocalFs,
        &accept_all(),
        &Selector::parse(&["a", "ghost"]),
        BatchOperation::Stop,
        true,
    )
    .await
    .expect("batch");

    let results = run.results();
    assert!(results[0].is_success());
    assert!(results[1].error.as_deref().unwrap().contains("not found"));
}

#[tokio::test]
async fn invalid_member_rejects_the_whole_batch() {
    let sb = Sandbox::linux();
    let (driver, fake) = running(&sb, &["a"]).await;

    let err = run_batch(
        &driver,
        &LocalFs,
        &accept_all(),
        &Selector::parse(&["a", "../b"]),
        BatchOperation::Stop,
        true,
    )
    .await
    .expect_err("invalid selector");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::InvalidName { .. })
    ));
    assert!(fake.calls().is_empty());
}
