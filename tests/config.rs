use figment::Jail;
use u_timetable::config::{ConfigError, TimetableConfig};
use u_timetable::MatchMode;

#[test]
fn defaults_without_file_or_env() {
    Jail::expect_with(|_jail| {
        let config = TimetableConfig::load().expect("config loads");
        assert_eq!(config, TimetableConfig::default());
        Ok(())
    });
}

#[test]
fn toml_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "timetable.toml",
            r#"
            [conflicts]
            match_mode = "slot_identity"

            [locking]
            retry_delay_ms = 20
            "#,
        )?;

        let config = TimetableConfig::load().expect("config loads");
        assert_eq!(config.conflicts.match_mode, MatchMode::SlotIdentity);
        assert!(config.conflicts.check_exceptions);
        assert_eq!(config.locking.retry_delay_ms, 20);
        Ok(())
    });
}

#[test]
fn env_beats_file() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[conflicts]\ncheck_exceptions = true\n")?;
        jail.set_env("TIMETABLE_CONFLICTS__CHECK_EXCEPTIONS", "false");
        jail.set_env("TIMETABLE_CONFLICTS__MATCH_MODE", "overlap");

        let config = TimetableConfig::load_from("custom.toml").expect("config loads");
        assert!(!config.conflicts.check_exceptions);
        assert_eq!(config.conflicts.match_mode, MatchMode::Overlap);
        Ok(())
    });
}

#[test]
fn zero_retry_delay_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("TIMETABLE_LOCKING__RETRY_DELAY_MS", "0");

        let err = TimetableConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "locking.retry_delay_ms"));
        Ok(())
    });
}

#[test]
fn unknown_match_mode_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("TIMETABLE_CONFLICTS__MATCH_MODE", "fuzzy");

        assert!(matches!(TimetableConfig::load(), Err(ConfigError::Figment(_))));
        Ok(())
    });
}
