//! Single-service lifecycle against a scripted `systemctl --user`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use tether_cli::application::ports::CommandRunner;
use tether_cli::application::services::service_control::{
    list_services, managed_services, remove_service, restart_service, status_service, stop_service,
};
use tether_cli::application::services::service_start::{StartOutcome, start_service};
use tether_cli::domain::artifact::MANAGED_MARKER;
use tether_cli::domain::error::ServiceError;
use tether_cli::domain::name::validate;
use tether_cli::domain::platform::PlatformCapability;
use tether_cli::infra::driver::PlatformDriver;
use tether_cli::infra::fs::LocalFs;
use tether_common::ServiceState;

use crate::helpers::{CLEAN_ENTRY, NoCommands, Sandbox, start_request};
use crate::mocks::{MockReporter, quiet_reporter};

#[tokio::test]
async fn start_stop_restart_round_trip() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("svc1.ts", CLEAN_ENTRY);

    let report = start_service(
        &driver,
        &LocalFs,
        &NoCommands,
        &quiet_reporter(),
        &sb.config,
        &start_request(&entry),
    )
    .await
    .expect("start");

    assert_eq!(report.outcome, StartOutcome::Created);
    assert_eq!(report.name.as_str(), "svc1");
    assert_eq!(report.endpoints.health_url, "http://127.0.0.1:3000/healthz");
    let unit = std::fs::read_to_string(sb.unit_path("svc1")).expect("unit written");
    assert!(unit.contains(MANAGED_MARKER));
    assert!(unit.contains("Environment=\"PORT=3000\""));
    assert!(unit.contains("WorkingDirectory="));
    assert_eq!(
        fake.mutating_calls(),
        [
            "systemctl --user daemon-reload",
            "systemctl --user enable -- svc1.service",
            "systemctl --user start -- svc1.service",
        ]
    );

    let name = validate("svc1").unwrap();
    let status = status_service(&driver, &LocalFs, &name).await.unwrap();
    assert_eq!(status.state, ServiceState::Running);
    assert!(status.enabled);
    assert_eq!(status.port, Some(3000));
    assert!(status.pid.is_some());

    stop_service(&driver, &LocalFs, &name).await.expect("stop");
    let status = status_service(&driver, &LocalFs, &name).await.unwrap();
    assert_eq!(status.state, ServiceState::Stopped);

    restart_service(&driver, &LocalFs, &name).await.expect("restart");
    let status = status_service(&driver, &LocalFs, &name).await.unwrap();
    assert_eq!(status.state, ServiceState::Running);
}

#[tokio::test]
async fn second_start_with_same_definition_is_a_no_op() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("api.ts", CLEAN_ENTRY);
    let request = start_request(&entry);
    let reporter = quiet_reporter();

    start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &request)
        .await
        .expect("first start");
    fake.clear_calls();

    let report = start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &request)
        .await
        .expect("second start");

    assert_eq!(report.outcome, StartOutcome::AlreadyRunning);
    assert!(fake.mutating_calls().is_empty(), "got: {:?}", fake.calls());
}

#[tokio::test]
async fn changed_definition_is_rewritten_and_restarted() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("api.ts", CLEAN_ENTRY);
    let reporter = quiet_reporter();

    start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &start_request(&entry))
        .await
        .expect("first start");
    fake.clear_calls();

    let mut request = start_request(&entry);
    request.port = 4100;
    let report = start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &request)
        .await
        .expect("restart with new port");

    assert_eq!(report.outcome, StartOutcome::Updated);
    let unit = std::fs::read_to_string(sb.unit_path("api")).unwrap();
    assert!(unit.contains("PORT=4100"));
    assert_eq!(
        fake.mutating_calls(),
        [
            "systemctl --user daemon-reload",
            "systemctl --user restart -- api.service",
        ]
    );
}

#[tokio::test]
async fn audit_rejection_writes_nothing_and_calls_no_manager() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("bad.ts", "const x = eval(userInput);\n");

    let mut reporter = MockReporter::new();
    reporter.expect_step().return_const(());
    reporter.expect_warn().never();
    reporter.expect_success().never();

    let err = start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &start_request(&entry))
        .await
        .expect_err("audit must block");

    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::AuditRejected { findings, .. }) => {
            assert!(findings.iter().any(|f| f.contains("eval")), "got: {findings:?}");
        }
        other => panic!("expected AuditRejected, got {other:?}"),
    }
    assert!(!sb.unit_path("bad").exists());
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn audit_warnings_are_reported_but_do_not_block() {
    let sb = Sandbox::linux();
    let (driver, _fake) = sb.driver();
    let entry = sb.entry("poller.ts", "await fetch('https://example.com');\n");

    let mut reporter = MockReporter::new();
    reporter.expect_step().return_const(());
    reporter
        .expect_warn()
        .withf(|m| m.contains("outbound network call"))
        .times(1)
        .return_const(());

    let report = start_service(&driver, &LocalFs, &NoCommands, &reporter, &sb.config, &start_request(&entry))
        .await
        .expect("warnings do not block");
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn invalid_name_fails_before_any_side_effect() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("svc.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.name = Some("../etc".to_string());

    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect_err("invalid name");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::InvalidName { .. })
    ));
    assert!(fake.calls().is_empty());
    assert_eq!(std::fs::read_dir(&sb.platform.service_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn invalid_env_entry_is_rejected() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("svc.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.env = vec!["1BAD=x".to_string()];

    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect_err("invalid env");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::InvalidEnv { .. })
    ));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn start_on_unsupported_platform_names_the_os() {
    let sb = Sandbox::linux();
    let cap = PlatformCapability::for_os("freebsd", sb.home.path(), &sb.home.path().join(".config"));
    let driver = PlatformDriver::for_platform(cap, NoCommands);
    let entry = sb.entry("svc.ts", CLEAN_ENTRY);

    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &start_request(&entry))
        .await
        .expect_err("unsupported");

    assert!(err.to_string().contains("freebsd"), "got: {err}");
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::UnsupportedPlatform { .. })
    ));
}

#[tokio::test]
async fn remove_deletes_the_unit_and_forgets_the_service() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("worker.ts", CLEAN_ENTRY);
    start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &start_request(&entry))
        .await
        .expect("start");
    fake.clear_calls();

    let name = validate("worker").unwrap();
    remove_service(&driver, &LocalFs, &name, true).await.expect("remove");

    assert!(!sb.unit_path("worker").exists());
    assert_eq!(
        fake.mutating_calls(),
        [
            "systemctl --user disable -- worker.service",
            "systemctl --user stop -- worker.service",
            "systemctl --user daemon-reload",
            "systemctl --user reset-failed -- worker.service",
        ]
    );
    let status = status_service(&driver, &LocalFs, &name).await.unwrap();
    assert_eq!(status.state, ServiceState::NotFound);
    assert!(status.artifact_path.is_none());
}

#[tokio::test]
async fn stopping_an_unknown_service_is_not_found() {
    let sb = Sandbox::linux();
    let (driver, _fake) = sb.driver();
    let name = validate("ghost").unwrap();

    let err = stop_service(&driver, &LocalFs, &name).await.expect_err("unknown");
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::NotFound(_))
    ));
    let err = remove_service(&driver, &LocalFs, &name, false)
        .await
        .expect_err("unknown");
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn listing_only_includes_marker_bearing_units() {
    let sb = Sandbox::linux();
    let (driver, _fake) = sb.driver();
    for name in ["b-svc", "a-svc"] {
        let entry = sb.entry(&format!("{name}.ts"), CLEAN_ENTRY);
        start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &start_request(&entry))
            .await
            .expect("start");
    }
    std::fs::write(
        sb.unit_path("foreign"),
        "[Unit]\nDescription=someone else's unit\n",
    )
    .unwrap();

    let names: Vec<String> = managed_services(&driver, &LocalFs)
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, ["a-svc", "b-svc"]);

    let listed = list_services(&driver, &LocalFs).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|s| s.state == ServiceState::Running));
}

fn assert_not_managed(err: &anyhow::Error) {
    assert!(
        matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotManaged { .. })
        ),
        "got: {err:#}"
    );
}

#[tokio::test]
async fn unit_without_marker_is_never_touched() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let foreign = "[Unit]\nDescription=nginx\n\n[Service]\nExecStart=/usr/sbin/nginx\n";
    std::fs::write(sb.unit_path("nginx"), foreign).unwrap();
    fake.run("systemctl", &["--user", "daemon-reload"]).await.unwrap();
    fake.clear_calls();

    let name = validate("nginx").unwrap();
    assert_not_managed(&stop_service(&driver, &LocalFs, &name).await.expect_err("stop"));
    assert_not_managed(&restart_service(&driver, &LocalFs, &name).await.expect_err("restart"));
    let err = remove_service(&driver, &LocalFs, &name, true)
        .await
        .expect_err("remove");
    assert_not_managed(&err);
    assert!(err.to_string().contains("no tether marker"), "got: {err}");

    let entry = sb.entry("app.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.name = Some("nginx".to_string());
    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect_err("start over a foreign unit");
    assert_not_managed(&err);

    assert_eq!(std::fs::read_to_string(sb.unit_path("nginx")).unwrap(), foreign);
    assert!(fake.mutating_calls().is_empty(), "got: {:?}", fake.calls());
}

#[tokio::test]
async fn unit_known_only_to_the_manager_is_never_shadowed() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    fake.load_vendor_unit("pipewire.service");

    let entry = sb.entry("app.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.name = Some("pipewire".to_string());
    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect_err("start over a vendor unit");
    assert_not_managed(&err);
    assert!(!sb.unit_path("pipewire").exists());

    let name = validate("pipewire").unwrap();
    assert_not_managed(&stop_service(&driver, &LocalFs, &name).await.expect_err("stop"));
    assert_not_managed(
        &remove_service(&driver, &LocalFs, &name, false)
            .await
            .expect_err("remove"),
    );
    assert!(fake.mutating_calls().is_empty(), "got: {:?}", fake.calls());
}

#[tokio::test]
async fn port_override_in_env_drives_the_reported_endpoints() {
    let sb = Sandbox::linux();
    let (driver, _fake) = sb.driver();
    let entry = sb.entry("api.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.port = 4001;
    request.env = vec!["PORT=5000".to_string()];

    let report = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect("start");

    assert_eq!(report.port, 5000);
    assert_eq!(report.endpoints.health_url, "http://127.0.0.1:5000/healthz");
    assert_eq!(report.overridden_env, ["PORT"]);
    let unit = std::fs::read_to_string(sb.unit_path("api")).unwrap();
    assert!(unit.contains("Environment=\"PORT=5000\""));
    assert!(!unit.contains("PORT=4001"));

    let status = status_service(&driver, &LocalFs, &validate("api").unwrap())
        .await
        .unwrap();
    assert_eq!(status.port, Some(5000));
}

#[tokio::test]
async fn non_numeric_port_override_is_rejected() {
    let sb = Sandbox::linux();
    let (driver, fake) = sb.driver();
    let entry = sb.entry("api.ts", CLEAN_ENTRY);
    let mut request = start_request(&entry);
    request.env = vec!["PORT=http".to_string()];

    let err = start_service(&driver, &LocalFs, &NoCommands, &quiet_reporter(), &sb.config, &request)
        .await
        .expect_err("bad port");
    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::InvalidEnv { .. })
    ));
    assert!(fake.calls().is_empty());
}
