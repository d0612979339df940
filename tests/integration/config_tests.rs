use clap::Parser;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::ffi::OsStr;
use std::fs;
use tempfile::tempdir;
use twinscan::cli::Cli;
use twinscan::config::{Config, ConfigError, RunConfiguration, SizeSetting};
use twinscan::error::ExitCode;

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
min_size = "2KiB"
follow_symlinks = true
recurse = true
case_insensitive = true
ignore_names = [".git", "target"]
ignore_pattern = '\.bak$'
separator = "\\0"
show_size = true
priority_path = "/srv/keep"
optimize_memory = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.min_size, Some(SizeSetting::Text("2KiB".into())));
    assert!(config.follow_symlinks && config.recurse && config.case_insensitive);
    assert_eq!(config.ignore_names, vec![".git", "target"]);

    let run = RunConfiguration::from_config(&config).unwrap();
    assert_eq!(run.min_size, 2048);
    assert_eq!(run.separator, '\0');
    assert!(run.show_size);
    assert!(run.ignore.is_ignored(OsStr::new("OLD.BAK")));
}

#[test]
fn test_config_numeric_min_size() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "min_size = 4096\n").unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.min_size, Some(SizeSetting::Bytes(4096)));
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "recurse = = true").unwrap();

    let err = Config::load(Some(config_path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_config_wrong_type() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "recurse = \"sometimes\"").unwrap();

    assert!(Config::load(Some(config_path.as_path())).is_err());
}

#[test]
fn test_bad_size_in_file_is_config_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "min_size = \"12 parsecs\"").unwrap();

    let config = Config::load(Some(config_path.as_path())).unwrap();
    let cli = Cli::try_parse_from(["twinscan", "/data"]).unwrap();
    let err = RunConfiguration::resolve(&config, &cli).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidSize { .. }));
}

#[test]
fn test_run_with_writer_reports_to_buffer() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();
    let data = temp_dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("x"), b"payload").unwrap();
    fs::write(data.join("y"), b"payload").unwrap();

    let cli = Cli::try_parse_from([
        OsStr::new("twinscan"),
        OsStr::new("-r"),
        OsStr::new("-d"),
        OsStr::new("--config"),
        config_path.as_os_str(),
        data.as_os_str(),
    ])
    .unwrap();

    let mut out = Vec::new();
    let code = twinscan::run_with_writer(&cli, &mut out, false).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!(
            "size [7]:\n{}\n{}\n\n",
            data.join("x").display(),
            data.join("y").display()
        )
    );
}

#[test]
fn test_run_with_writer_config_error_maps_to_exit_code() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let cli = Cli::try_parse_from([
        OsStr::new("twinscan"),
        OsStr::new("-e"),
        OsStr::new("["),
        OsStr::new("--config"),
        config_path.as_os_str(),
        temp_dir.path().as_os_str(),
    ])
    .unwrap();

    let err = twinscan::run_with_writer(&cli, Vec::new(), false).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);
}
