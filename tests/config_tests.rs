use std::env;
use std::path::PathBuf;

use serial_test::serial;
use skillport_client::{ClientConfig, Env, ProviderKind};

const VARS: [&str; 5] = [
    "APP_ENV",
    "SKILLPORT_API_URL",
    "SKILLPORT_PROVIDER",
    "SKILLPORT_ANON_KEY",
    "SKILLPORT_SESSION_FILE",
];

// Environment mutation is process-global, hence #[serial] on every test
// here. set_var/remove_var are unsafe in this edition because of exactly
// the data race serial execution rules out.
fn clear_vars() {
    for var in VARS {
        unsafe { env::remove_var(var) };
    }
}

fn set_var(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}

#[test]
#[serial]
fn local_defaults_require_no_environment() {
    clear_vars();

    let config = ClientConfig::load();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.provider, ProviderKind::Rest);
    assert_eq!(config.api_base, "http://localhost:8082/api");
    assert_eq!(config.session_file, PathBuf::from(".skillport-session.json"));
}

#[test]
#[serial]
fn provider_selection_follows_the_environment() {
    clear_vars();

    set_var("SKILLPORT_PROVIDER", "memory");
    assert_eq!(ClientConfig::load().provider, ProviderKind::Memory);

    set_var("SKILLPORT_PROVIDER", "table");
    assert_eq!(ClientConfig::load().provider, ProviderKind::Table);

    // Unrecognized selections fall back to the REST API.
    set_var("SKILLPORT_PROVIDER", "mainframe");
    assert_eq!(ClientConfig::load().provider, ProviderKind::Rest);

    clear_vars();
}

#[test]
#[serial]
fn api_base_and_session_file_are_overridable() {
    clear_vars();

    set_var("SKILLPORT_API_URL", "https://api.skillport.example/v1");
    set_var("SKILLPORT_SESSION_FILE", "/tmp/sp-session.json");

    let config = ClientConfig::load();
    assert_eq!(config.api_base, "https://api.skillport.example/v1");
    assert_eq!(config.session_file, PathBuf::from("/tmp/sp-session.json"));

    clear_vars();
}

#[test]
#[serial]
#[should_panic(expected = "SKILLPORT_API_URL must be set in production")]
fn production_without_an_api_url_fails_fast() {
    clear_vars();
    set_var("APP_ENV", "production");

    let _ = ClientConfig::load();
}
