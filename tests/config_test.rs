use painters::config::Config;
use painters::error::Error;
use std::sync::Mutex;

// Tests that read or write `PAINTERS_*` variables hold this.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn config_from_file_overlays_defaults() {
    let path = std::env::temp_dir().join(format!("painters-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
        height = 20
        snapshotRounds = 4
        cancel_round = 4
        seed = 7
        "#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.height, 20);
    assert_eq!(config.width, 50);
    assert_eq!(config.snapshot_rounds, 4);
    assert_eq!(config.cancel_round, Some(4));
    assert_eq!(config.seed, Some(7));
    assert!(config.validate().is_ok());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn config_from_missing_file_fails() {
    let path = std::env::temp_dir().join("painters-does-not-exist.toml");
    assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));
}

#[test]
fn env_overrides_apply_and_bad_values_fail() {
    let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    unsafe {
        std::env::set_var("PAINTERS_WORKER_COUNT", "4");
    }
    let mut config = Config::default();
    config.apply_env().unwrap();
    assert_eq!(config.worker_count, 4);

    unsafe {
        std::env::set_var("PAINTERS_WORKER_COUNT", "many");
    }
    assert!(matches!(
        Config::default().apply_env(),
        Err(Error::Config(_))
    ));

    unsafe {
        std::env::remove_var("PAINTERS_WORKER_COUNT");
    }
}

#[test]
fn load_defers_validation_to_later_overrides() {
    // Fewer rounds than the default cancel round: invalid on its own, fixed
    // by a flag applied after loading.
    let path = std::env::temp_dir().join(format!("painters-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, "snapshot_rounds = 2\n").unwrap();
    let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let mut config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.snapshot_rounds, 2);
    assert!(matches!(config.validate(), Err(Error::Config(_))));

    config.cancel_round = Some(1);
    assert!(config.validate().is_ok());

    let _ = std::fs::remove_file(&path);
}
