use hyterm::config::{ENV_CONFIG_PATH, EngineConfig};

#[test]
fn parses_every_field() {
    let config = EngineConfig::from_toml_str("max_steps = 500\ntrace_steps = true\n", "inline")
        .unwrap();
    assert_eq!(
        config,
        EngineConfig {
            max_steps: Some(500),
            trace_steps: true,
        }
    );
}

#[test]
fn missing_fields_take_defaults() {
    let config = EngineConfig::from_toml_str("", "empty").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.max_steps, None);
    assert!(!config.trace_steps);
}

#[test]
fn invalid_files_name_their_origin() {
    let err = EngineConfig::from_toml_str("max_steps = \"many\"", "broken.toml").unwrap_err();
    assert!(err.is_config_parse_error());
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn save_then_load() {
    let dir = std::env::temp_dir().join(format!("hyterm-config-{}", std::process::id()));
    let path = dir.join("nested").join("hyterm.toml");
    let config = EngineConfig {
        max_steps: Some(42),
        trace_steps: false,
    };

    config.save_to_toml(&path).unwrap();
    assert_eq!(EngineConfig::load_from_toml(&path).unwrap(), config);

    // The environment variable points the default location at the saved file.
    // SAFETY: no other test of this binary reads or writes the environment.
    unsafe { std::env::set_var(ENV_CONFIG_PATH, &path) };
    assert_eq!(EngineConfig::default_path(), path);
    assert_eq!(EngineConfig::load_default().unwrap(), config);

    unsafe { std::env::set_var(ENV_CONFIG_PATH, dir.join("absent.toml")) };
    assert_eq!(EngineConfig::load_default().unwrap(), EngineConfig::default());
    unsafe { std::env::remove_var(ENV_CONFIG_PATH) };

    std::fs::remove_dir_all(&dir).unwrap();

    let err = EngineConfig::load_from_toml(&path).unwrap_err();
    assert!(err.is_io_error());
}
