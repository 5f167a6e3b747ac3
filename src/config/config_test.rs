use serial_test::serial;
use temp_env::with_vars;

use super::*;
use crate::Error;
use crate::ValueFormat;

fn cleanup_all_policy_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("POLICY__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let settings = Settings::default();

    assert_eq!(settings.consul.address, "127.0.0.1:8500");
    assert_eq!(settings.consul.datacenter, "dc1");
    assert_eq!(settings.consul.prefix_template, "KitexConfig");
    assert_eq!(settings.consul.server_path_template, "{serverServiceName}/{category}");
    assert_eq!(
        settings.consul.client_path_template,
        "{clientServiceName}/{serverServiceName}/{category}"
    );
    assert_eq!(settings.consul.config_type, ValueFormat::Json);
    assert_eq!(settings.watch.fetch_timeout_ms, 5000);
    assert!(settings.services.dest_services.is_empty());
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_policy_env_vars();
    with_vars(
        vec![
            ("POLICY__CONSUL__ADDRESS", Some("10.0.0.3:8500")),
            ("POLICY__WATCH__FETCH_TIMEOUT_MS", Some("250")),
            ("POLICY__SERVICES__DEST_SERVICES", Some("echo,ping")),
        ],
        || {
            let settings = Settings::new().unwrap();

            assert_eq!(settings.consul.address, "10.0.0.3:8500");
            assert_eq!(settings.watch.fetch_timeout_ms, 250);
            assert_eq!(settings.services.dest_services, vec!["echo", "ping"]);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_policy_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    std::fs::write(
        &config_path,
        r#"
        [consul]
        datacenter = "dc2"
        config_type = "yaml"

        [watch]
        wait_time_secs = 30
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base = Settings::new().expect("success");
        let result = base.with_override_config(config_path.to_str().unwrap());

        assert!(result.is_ok());
        let settings = result.unwrap();

        assert_eq!(settings.consul.datacenter, "dc2");
        assert_eq!(settings.consul.config_type, ValueFormat::Yaml);
        assert_eq!(settings.watch.wait_time_secs, 30);
        // untouched values keep their defaults
        assert_eq!(settings.consul.address, "127.0.0.1:8500");
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_policy_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [consul]
        address = "file-host:8500"
        token = "from-file"
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("POLICY__CONSUL__ADDRESS", Some("env-host:8500")),
        ],
        || {
            let settings = Settings::new().unwrap();

            assert_eq!(settings.consul.address, "env-host:8500");
            assert_eq!(settings.consul.token, "from-file");
        },
    );
}

#[test]
fn validation_should_reject_empty_address() {
    let mut settings = Settings::default();
    settings.consul.address = "  ".into();

    assert!(settings.validate().is_err());
}

#[test]
fn validation_should_reject_inverted_backoff_bounds() {
    let mut settings = Settings::default();
    settings.watch.retry_base_delay_ms = 500;
    settings.watch.retry_max_delay_ms = 100;

    assert!(settings.validate().is_err());
}

#[test]
fn validation_should_reject_zero_buffer() {
    let mut settings = Settings::default();
    settings.watch.watcher_buffer_size = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn validation_should_require_client_service_for_dest_services() {
    let mut settings = Settings::default();
    settings.services.dest_services = vec!["echo".into()];

    assert!(matches!(settings.clone().validate(), Err(Error::InvalidConfig(_))));

    settings.services.client_service = "frontend".into();
    assert!(settings.validate().is_ok());
}

#[test]
fn validation_should_allow_empty_client_service_without_dest_services() {
    let mut settings = Settings::default();
    settings.services.server_service = "echo".into();

    assert!(settings.validate().is_ok());
}

#[test]
fn validation_should_reject_blank_dest_service() {
    let mut settings = Settings::default();
    settings.services.client_service = "frontend".into();
    settings.services.dest_services = vec!["echo".into(), " ".into()];

    assert!(settings.validate().is_err());
}

#[test]
fn base_url_should_add_scheme_only_when_missing() {
    let mut consul = ConsulConfig::default();
    assert_eq!(consul.base_url(), "http://127.0.0.1:8500");

    consul.address = "https://consul.internal:8501/".into();
    assert_eq!(consul.base_url(), "https://consul.internal:8501");
}

#[test]
fn debug_output_redacts_token() {
    let consul = ConsulConfig {
        token: "secret-acl-token".into(),
        ..Default::default()
    };

    let printed = format!("{:?}", consul);

    assert!(!printed.contains("secret-acl-token"));
    assert!(printed.contains("<redacted>"));
}
