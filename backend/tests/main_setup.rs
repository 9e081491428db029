use serial_test::serial;
use std::{env, panic};
use support_desk::{AppConfig, config::Env};

const CONFIG_VARS: [&str; 5] = [
    "APP_ENV",
    "SESSION_SECRET",
    "SESSION_TTL_SECS",
    "TICKET_API_URL",
    "BIND_ADDR",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with the given variables set (and every other config variable unset),
/// then restores the previous environment.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> std::thread::Result<R>
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    result
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(
        &[("APP_ENV", "production"), ("TICKET_API_URL", "https://api.example.com/v1")],
        AppConfig::load,
    );
    assert!(
        result.is_err(),
        "Production config loading should panic without SESSION_SECRET"
    );

    let result = run_with_env(
        &[("APP_ENV", "production"), ("SESSION_SECRET", "s3cr3t")],
        AppConfig::load,
    );
    assert!(
        result.is_err(),
        "Production config loading should panic without TICKET_API_URL"
    );
}

#[test]
#[serial]
fn test_app_config_production_complete() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("SESSION_SECRET", "s3cr3t"),
            ("TICKET_API_URL", "https://api.example.com/v1/"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.session_secret, "s3cr3t");
    assert_eq!(config.ticket_api_url, "https://api.example.com/v1");
    assert!(config.secure_cookies());
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.ticket_api_url, "http://localhost:8000/api/v1");
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.session_secret, AppConfig::default().session_secret);
    assert!(!config.secure_cookies());
}

#[test]
#[serial]
fn test_app_config_rejects_bad_ttl() {
    let result = run_with_env(&[("SESSION_TTL_SECS", "soon")], AppConfig::load);
    assert!(result.is_err());

    let result = run_with_env(&[("SESSION_TTL_SECS", "0")], AppConfig::load);
    assert!(result.is_err());

    let config = run_with_env(&[("SESSION_TTL_SECS", "900")], AppConfig::load).unwrap();
    assert_eq!(config.session_ttl_secs, 900);
}
