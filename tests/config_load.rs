// tests/config_load.rs
use spawn_sentinel::config::{MonitorConfig, ENV_CONFIG_PATH};
use spawn_sentinel::geo::Coordinate;
use std::{env, fs};

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("sentinel.toml");
    fs::write(
        &p,
        r#"
webhook_url = "https://hooks.slack.com/services/T1/B2/C3"
max_distance_m = 250
ignored_species = ["Zubat"]

[reference]
lat = 1.5
long = 2.5
"#,
    )
    .unwrap();
    let cfg = MonitorConfig::load_from(&p).unwrap();
    assert_eq!(cfg.max_distance_m, 250);
    assert_eq!(cfg.reference().unwrap(), Coordinate::new(1.5, 2.5));
    assert!(cfg.filter_settings().ignored_species.contains("Zubat"));
}

#[test]
fn invalid_toml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("sentinel.toml");
    fs::write(&p, "max_distance_m = \"far\"").unwrap();
    assert!(MonitorConfig::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var("SENTINEL_MAX_DISTANCE_M");

    // 1) nothing at all -> defaults
    let v = MonitorConfig::load_default().unwrap();
    assert_eq!(v.max_distance_m, 1000);

    // 2) fallback ./config/sentinel.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/sentinel.toml"), "max_distance_m = 300").unwrap();
    assert_eq!(MonitorConfig::load_default().unwrap().max_distance_m, 300);

    // 3) explicit path wins over fallback
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "max_distance_m = 42").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(MonitorConfig::load_default().unwrap().max_distance_m, 42);

    // 4) env override wins over file
    env::set_var("SENTINEL_MAX_DISTANCE_M", "7");
    assert_eq!(MonitorConfig::load_default().unwrap().max_distance_m, 7);
    env::remove_var("SENTINEL_MAX_DISTANCE_M");

    // 5) explicit path that does not exist is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(MonitorConfig::load_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
