//! Manifest loading tests (file-backed, YAML and TOML).

use natsjwt_core::{ConnectionType, ExportKind, TrustConfig};
use std::fs;
use tempfile::tempdir;

const FULL_YAML: &str = r#"
operator:
  name: acme-operator
  seed:
    file: operator.seed
  operator_service_urls:
    - nats://localhost:4222
  strict_signing_key_usage: true
  tags: [prod]

system_account:
  name: SYS
  seed:
    file: sys.seed

accounts:
  - name: app
    seed:
      file: app.seed
    description: Application account
    issued_at: 1700000000
    nats_limits:
      subs: 1000
    jetstream_limits:
      - mem_storage: 1073741824
        disk_storage: 10737418240
        streams: 10
      - tier: R3
        streams: 4
    default_permissions:
      pub_allow: ["app.>"]
    exports:
      - subject: "app.events.>"
        type: stream

users:
  - name: alice
    account: app
    seed:
      file: alice.seed
    permissions:
      pub_allow: ["app.>"]
      sub_allow: ["app.>", "_INBOX.>"]
      resp_ttl: 90s
    allowed_connection_types: [STANDARD, WEBSOCKET]
    source_networks: ["10.0.0.0/8"]
    time_restrictions:
      - start: "08:00:00"
        end: "17:00:00"
    locale: Europe/Warsaw
"#;

#[test]
fn test_yaml_manifest_loads_with_base_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trust.yaml");
    fs::write(&path, FULL_YAML).unwrap();
    fs::write(dir.path().join("app.seed"), "SAFROMFILE\n").unwrap();

    let config = TrustConfig::from_file(&path).unwrap();
    assert_eq!(config.base_dir(), dir.path());

    assert_eq!(config.operator.name, "acme-operator");
    assert!(config.operator.options.strict_signing_key_usage);
    assert_eq!(
        config.operator.options.operator_service_urls,
        vec!["nats://localhost:4222".to_string()]
    );

    let app = config.get_account("app").unwrap();
    assert_eq!(app.options.temporal.issued_at, Some(1_700_000_000));
    assert_eq!(app.options.nats_limits.unwrap().subs, Some(1000));
    assert_eq!(app.options.jetstream_limits.len(), 2);
    assert_eq!(app.options.jetstream_limits[0].tier_label(), None);
    assert_eq!(app.options.jetstream_limits[1].tier_label(), Some("R3"));
    assert_eq!(app.options.exports[0].kind, ExportKind::Stream);
    assert_eq!(
        app.seed.resolve(config.base_dir(), "app").unwrap(),
        "SAFROMFILE"
    );

    let alice = &config.users[0];
    assert_eq!(
        alice.options.allowed_connection_types,
        vec![ConnectionType::Standard, ConnectionType::Websocket]
    );
    assert_eq!(alice.options.locale.as_deref(), Some("Europe/Warsaw"));
    let perms = alice.options.permissions.as_ref().unwrap();
    assert_eq!(perms.subjects.sub_allow.len(), 2);
    assert_eq!(perms.resp_ttl.as_deref(), Some("90s"));
}

#[test]
fn test_toml_manifest_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trust.toml");
    fs::write(
        &path,
        r#"
resolver = "MEMORY"

[operator]
name = "acme"
seed = { env = "OPERATOR_SEED" }

[[accounts]]
name = "app"
seed = { value = "SAEXAMPLE" }
description = "from toml"

[[users]]
name = "bob"
account = "app"
seed = { value = "SUEXAMPLE" }
bearer_token = true
"#,
    )
    .unwrap();

    let config = TrustConfig::from_file(&path).unwrap();
    assert_eq!(config.accounts[0].options.description.as_deref(), Some("from toml"));
    assert!(config.users[0].options.bearer_token);
}

#[test]
fn test_invalid_connection_type_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trust.yaml");
    fs::write(
        &path,
        FULL_YAML.replace("[STANDARD, WEBSOCKET]", "[STANDARD, TELNET]"),
    )
    .unwrap();

    assert!(TrustConfig::from_file(&path).is_err());
}
