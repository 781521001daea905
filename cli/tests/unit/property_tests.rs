//! Property-based tests for name validation, definition generation and
//! configuration validation.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use tether_cli::domain::artifact::{generate, is_managed, name_from_file_name, read_port};
use tether_cli::domain::config::{VALID_CONFIG_KEYS, validate_config_key};
use tether_cli::domain::definition::{
    DEFAULT_OTEL_ENDPOINT, ObservabilityFlags, RestartPolicy, ServiceDefinition,
};
use tether_cli::domain::name::{ServiceName, qualify, unqualify, validate};
use tether_cli::domain::platform::PlatformCapability;
use tether_cli::domain::selector::Selector;

fn definition(name: ServiceName, port: u16, env: Vec<(String, String)>, otel: bool) -> ServiceDefinition {
    ServiceDefinition {
        name,
        executable: PathBuf::from("/usr/local/bin/bun"),
        arguments: vec!["run".to_string(), "/srv/app/server.ts".to_string()],
        working_directory: PathBuf::from("/srv/app"),
        port,
        environment: env,
        restart: RestartPolicy::FIXED,
        observability: ObservabilityFlags {
            otel,
            prometheus: false,
        },
        otel_endpoint: DEFAULT_OTEL_ENDPOINT.to_string(),
    }
}

fn platforms() -> Vec<PlatformCapability> {
    let home = Path::new("/home/u");
    ["linux", "macos", "windows"]
        .into_iter()
        .map(|os| PlatformCapability::for_os(os, home, &home.join(".config")))
        .collect()
}

// ============================================================================
// validate()
// ============================================================================

proptest! {
    /// Names drawn from the allowed alphabet are accepted unless they contain `..`.
    #[test]
    fn prop_allowed_alphabet_is_accepted(raw in "[A-Za-z0-9._-]{1,64}") {
        let result = validate(&raw);
        if raw.contains("..") {
            prop_assert!(result.is_err());
        } else {
            let name = result.expect("valid name");
            prop_assert_eq!(name.as_str(), raw.as_str());
        }
    }

    /// Anything containing a separator, whitespace or shell metacharacter is rejected.
    #[test]
    fn prop_unsafe_characters_are_rejected(
        prefix in "[a-z]{0,10}",
        bad in prop::sample::select(vec!['/', '\\', ' ', ';', '$', '`', '\n', '"', '\'', '&', '|', '*']),
        suffix in "[a-z]{0,10}",
    ) {
        let raw = format!("{prefix}{bad}{suffix}");
        prop_assert!(validate(&raw).is_err(), "accepted {:?}", raw);
    }

    /// Names longer than 64 characters are rejected.
    #[test]
    fn prop_overlong_names_are_rejected(raw in "[a-z]{65,100}") {
        prop_assert!(validate(&raw).is_err());
    }

    /// Qualification round-trips on every platform.
    #[test]
    fn prop_qualify_round_trips(raw in "[a-z][a-z0-9-]{0,30}") {
        let name = validate(&raw).expect("valid");
        for platform in platforms() {
            let qualified = qualify(&name, platform.family);
            prop_assert_eq!(unqualify(&qualified, platform.family), Some(name.clone()));
        }
    }
}

// ============================================================================
// generate()
// ============================================================================

proptest! {
    /// Generating twice from the same definition yields byte-identical artifacts.
    #[test]
    fn prop_generation_is_idempotent(
        raw in "[a-z][a-z0-9-]{0,20}",
        port in 1u16..,
        env in prop::collection::vec(("[A-Z_][A-Z0-9_]{0,10}", "[ -~]{0,20}"), 0..5),
        otel in proptest::bool::ANY,
    ) {
        let name = validate(&raw).expect("valid");
        let def = definition(name, port, env, otel);
        for platform in platforms() {
            let first = generate(&def, &platform).expect("supported");
            let second = generate(&def, &platform).expect("supported");
            prop_assert_eq!(&first.content, &second.content);
            prop_assert_eq!(first.digest(), second.digest());
        }
    }

    /// Every artifact carries the marker, maps back to its name and exposes its port.
    #[test]
    fn prop_artifact_is_recognisable(raw in "[a-z][a-z0-9-]{0,20}", port in 1u16..) {
        let name = validate(&raw).expect("valid");
        let def = definition(name.clone(), port, Vec::new(), false);
        for platform in platforms() {
            let artifact = generate(&def, &platform).expect("supported");
            prop_assert!(is_managed(&artifact.content));
            prop_assert_eq!(read_port(&artifact.content), Some(port));
            let file_name = artifact.path.file_name().and_then(|f| f.to_str()).expect("file name");
            prop_assert_eq!(name_from_file_name(file_name, platform.family), Some(name.clone()));
        }
    }
}

// ============================================================================
// Selector and config keys
// ============================================================================

proptest! {
    /// Expansion never yields duplicates and preserves first-seen order.
    #[test]
    fn prop_selector_dedupes(names in prop::collection::vec("[a-c]", 1..10)) {
        let expanded = Selector::parse(&names).expand(Vec::new).expect("valid");
        let mut seen = Vec::new();
        for n in &names {
            if !seen.contains(n) {
                seen.push(n.clone());
            }
        }
        let got: Vec<String> = expanded.iter().map(ToString::to_string).collect();
        prop_assert_eq!(got, seen);
    }

    /// Keys outside the whitelist are rejected.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,20}\\.[a-z]{1,20}") {
        if !VALID_CONFIG_KEYS.contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }
}
