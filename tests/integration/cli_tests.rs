use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

/// Run the binary isolated from the user's config and environment.
fn twinscan(home: &TempDir, args: &[&str], roots: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_twinscan"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("RUST_LOG")
        .args(args)
        .args(roots)
        .output()
        .expect("run twinscan")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_reports_pair_and_omits_outsider() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a"), b"hello").unwrap();
    fs::write(tmp.path().join("b"), b"hello").unwrap();
    fs::write(tmp.path().join("c"), b"world").unwrap();

    let output = twinscan(&home, &["-r"], &[tmp.path()]);

    assert!(output.status.success(), "stderr={}", stderr(&output));
    let expected = format!(
        "{}\n{}\n\n",
        tmp.path().join("a").display(),
        tmp.path().join("b").display()
    );
    assert_eq!(stdout(&output), expected);
}

#[test]
fn cli_display_size_and_separator() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a"), b"hello").unwrap();
    fs::write(tmp.path().join("b"), b"hello").unwrap();

    let output = twinscan(&home, &["-r", "-d", "-s", "\\t"], &[tmp.path()]);

    assert!(output.status.success(), "stderr={}", stderr(&output));
    let expected = format!(
        "size [5]:\n{}\t{}\n\n",
        tmp.path().join("a").display(),
        tmp.path().join("b").display()
    );
    assert_eq!(stdout(&output), expected);
}

#[test]
fn cli_empty_files_are_duplicates() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("e1"), b"").unwrap();
    fs::write(tmp.path().join("e2"), b"").unwrap();
    fs::write(tmp.path().join("u1"), b"one").unwrap();
    fs::write(tmp.path().join("u2"), b"three").unwrap();

    let output = twinscan(&home, &["-r"], &[tmp.path()]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("e1") && out.contains("e2"));
    assert!(!out.contains("u1") && !out.contains("u2"));
}

#[test]
fn cli_directory_without_recursion_succeeds_silently() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("only"), b"visible").unwrap();

    let output = twinscan(&home, &[], &[tmp.path()]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_ignore_list_excludes_twin() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("keep.txt"), b"content").unwrap();
    fs::write(tmp.path().join("drop.txt"), b"content").unwrap();

    let output = twinscan(&home, &["-r", "-i", "other,drop.txt"], &[tmp.path()]);

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_regex_ignore_is_case_sensitive_by_default() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a.TMP"), b"content").unwrap();
    fs::write(tmp.path().join("b.txt"), b"content").unwrap();

    let sensitive = twinscan(&home, &["-r", "-e", "\\.tmp$"], &[tmp.path()]);
    assert!(stdout(&sensitive).contains("a.TMP"));

    let insensitive = twinscan(&home, &["-r", "-c", "-e", "\\.tmp$"], &[tmp.path()]);
    assert!(insensitive.status.success());
    assert!(stdout(&insensitive).is_empty());
}

#[test]
fn cli_bad_pattern_exits_with_config_error() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();

    let output = twinscan(&home, &["-r", "-e", "(unclosed"], &[tmp.path()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("[TS002] Error:"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_bad_separator_exits_with_config_error() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();

    let output = twinscan(&home, &["-s", "ab"], &[tmp.path()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid separator"));
}

#[test]
fn cli_missing_root_exits_with_general_error() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("missing");

    let output = twinscan(&home, &["-r"], &[missing.as_path()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[TS001] Error:"));
}

#[test]
fn cli_json_errors() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("missing");

    let output = twinscan(&home, &["--json-errors"], &[missing.as_path()]);

    assert_eq!(output.status.code(), Some(1));
    let line = stderr(&output)
        .lines()
        .find(|l| l.starts_with('{'))
        .map(str::to_owned)
        .expect("json error line");
    let json: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(json["code"], "TS001");
    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["kind"], "io");
    assert!(json["message"].as_str().unwrap().contains("missing"));
}

#[test]
fn cli_usage_error_exits_with_two() {
    let home = tempdir().unwrap();
    let output = twinscan(&home, &[], &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_help_and_version() {
    let home = tempdir().unwrap();

    let help = twinscan(&home, &["--help"], &[]);
    assert!(help.status.success());
    assert!(stdout(&help).contains("--recurse-subdir"));

    let version = twinscan(&home, &["-V"], &[]);
    assert!(version.status.success());
    assert!(stdout(&version).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_file_and_environment_layers() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a"), b"hello").unwrap();
    fs::write(data.join("b"), b"hello").unwrap();

    let config = tmp.path().join("twinscan.toml");
    fs::write(&config, "recurse = true\nshow_size = true\nseparator = \",\"\n").unwrap();
    let config_arg = config.to_string_lossy().into_owned();

    let output = twinscan(&home, &["--config", config_arg.as_str()], &[data.as_path()]);
    assert!(output.status.success(), "stderr={}", stderr(&output));
    let expected = format!(
        "size [5]:\n{},{}\n\n",
        data.join("a").display(),
        data.join("b").display()
    );
    assert_eq!(stdout(&output), expected);

    // Environment overrides the file; the CLI overrides both
    let output = Command::new(env!("CARGO_BIN_EXE_twinscan"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("TWINSCAN_SEPARATOR", ";")
        .args(["--config", config_arg.as_str()])
        .arg(&data)
        .output()
        .unwrap();
    assert!(stdout(&output).contains(';'));

    let output = Command::new(env!("CARGO_BIN_EXE_twinscan"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("TWINSCAN_SEPARATOR", ";")
        .args(["--config", config_arg.as_str(), "-s", " "])
        .arg(&data)
        .output()
        .unwrap();
    assert!(stdout(&output).contains(' '));
    assert!(!stdout(&output).contains(';'));
}

#[test]
fn cli_environment_min_size() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a"), b"tiny").unwrap();
    fs::write(tmp.path().join("b"), b"tiny").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_twinscan"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("TWINSCAN_MIN_SIZE", "1KiB")
        .arg("-r")
        .arg(tmp.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr={}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_missing_config_file_is_config_error() {
    let home = tempdir().unwrap();
    let tmp = tempdir().unwrap();

    let output = twinscan(&home, &["--config", "/no/such/twinscan.toml"], &[tmp.path()]);

    assert_eq!(output.status.code(), Some(2));
}
