//! Layered configuration loading tests.

use std::{
    env, fs,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;
use vigil::config::ConfigLoader;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    unsafe {
        env::remove_var("VIGIL_PROFILE");
        env::remove_var("VIGIL_API_BIND_ADDR");
        env::remove_var("VIGIL_LOG_LEVEL");
        env::remove_var("VIGIL_TESTING_MODE");
        env::remove_var("VIGIL_REQUEST_DEADLINE_SECS");
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_deadline_secs, 30);
    assert!(!cfg.testing_mode);
    assert!(cfg.alerts_enabled);
    cfg.bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "VIGIL_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "VIGIL_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "VIGIL_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "VIGIL_PROFILE=test\nVIGIL_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());
    let cfg = loader.load().expect("layered config loads");

    assert_eq!(cfg.profile, "test");
    // The most specific profile-local file wins.
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
}

#[test]
fn process_environment_wins_over_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "VIGIL_LOG_LEVEL=debug\n");

    unsafe {
        env::set_var("VIGIL_LOG_LEVEL", "warn");
    }
    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads");
    assert_eq!(cfg.log_level, "warn");
    clear_env();
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "VIGIL_API_BIND_ADDR=not-an-addr\n");

    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());
    assert!(loader.load().is_err());
}

#[test]
fn boolean_flags_parse_from_env() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "VIGIL_TESTING_MODE=true\nVIGIL_REQUEST_DEADLINE_SECS=10\n",
    );

    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());
    let cfg = loader.load().expect("config loads");
    assert!(cfg.testing_mode);
    assert_eq!(cfg.request_deadline_secs, 10);
}
