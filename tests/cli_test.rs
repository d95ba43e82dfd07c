//! CLI argument parsing tests
//!
//! These tests verify that CLI arguments are parsed correctly and that
//! commands which only touch local state behave without a browser.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get the classpilot binary command
fn classpilot() -> Command {
    Command::cargo_bin("classpilot").unwrap()
}

/// A command with its home and config dirs pointed at a temp dir, so
/// tests never touch the real user state.
fn isolated() -> (tempfile::TempDir, Command) {
    let tmp = tempfile::tempdir().unwrap();
    let home = tmp.path().join("home");
    let config_home = tmp.path().join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();

    let mut cmd = classpilot();
    cmd.env("HOME", &home).env("XDG_CONFIG_HOME", &config_home);
    (tmp, cmd)
}

mod help {
    use super::*;

    #[test]
    fn shows_help() {
        classpilot()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("classpilot"))
            .stdout(predicate::str::contains("course video advancement"));
    }

    #[test]
    fn shows_version() {
        classpilot()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("classpilot"));
    }
}

mod connect_command {
    use super::*;

    #[test]
    fn connect_requires_endpoint() {
        classpilot()
            .arg("connect")
            .assert()
            .failure()
            .stderr(predicate::str::contains("ENDPOINT"));
    }

    #[test]
    fn connect_invalid_endpoint_fails() {
        // "not-a-port" is neither a number nor a ws:// URL
        let (_tmp, mut cmd) = isolated();
        cmd.args(["connect", "not-a-port"])
            .timeout(std::time::Duration::from_secs(5))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid endpoint"));
    }

    #[test]
    fn connect_unreachable_port_fails() {
        // Port 19999 should have nothing listening
        let (_tmp, mut cmd) = isolated();
        cmd.args(["connect", "19999"])
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .failure();
    }

    #[test]
    fn connect_ws_url_persists_without_dialing() {
        let (_tmp, mut cmd) = isolated();
        cmd.args([
            "--json",
            "connect",
            "ws://127.0.0.1:9222/devtools/browser/test",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cdpPort\":9222"))
        .stdout(predicate::str::contains("devtools/browser/test"));
    }
}

mod open_command {
    use super::*;

    #[test]
    fn open_requires_url() {
        classpilot()
            .arg("open")
            .assert()
            .failure()
            .stderr(predicate::str::contains("URL"));
    }
}

mod settings_command {
    use super::*;

    #[test]
    fn settings_requires_subcommand() {
        classpilot()
            .arg("settings")
            .assert()
            .failure()
            .stderr(predicate::str::contains("subcommand"));
    }

    #[test]
    fn settings_show_prints_defaults() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["settings", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("enabled: ON"))
            .stdout(predicate::str::contains("backgroundAutoPlay: OFF"));
    }

    #[test]
    fn settings_set_requires_key_and_value() {
        classpilot()
            .args(["settings", "set"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("KEY"));
    }

    #[test]
    fn settings_set_rejects_unknown_key() {
        classpilot()
            .args(["settings", "set", "turbo", "on"])
            .assert()
            .failure();
    }

    #[test]
    fn settings_set_round_trips() {
        let (tmp, mut cmd) = isolated();
        cmd.args(["settings", "set", "background", "on"])
            .assert()
            .success();

        let home = tmp.path().join("home");
        let config_home = tmp.path().join("config");
        classpilot()
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", &config_home)
            .args(["--json", "settings", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"backgroundAutoPlay\": true"));
    }

    #[test]
    fn settings_set_rejects_garbage_value() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["settings", "set", "enabled", "maybe"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("on/off"));
    }

    #[test]
    fn settings_path_points_into_home() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["settings", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".classpilot"));
    }
}

mod config_command {
    use super::*;

    #[test]
    fn config_requires_subcommand() {
        classpilot()
            .arg("config")
            .assert()
            .failure()
            .stderr(predicate::str::contains("subcommand"));
    }

    #[test]
    fn config_show_prints_defaults() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[selectors]"))
            .stdout(predicate::str::contains("9222"));
    }

    #[test]
    fn config_set_requires_key_value() {
        classpilot()
            .args(["config", "set"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("KEY"));
    }

    #[test]
    fn config_get_requires_key() {
        classpilot()
            .args(["config", "get"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("KEY"));
    }

    #[test]
    fn config_get_unknown_key_fails() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["config", "get", "nope.nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_set_and_get_round_trip() {
        let (tmp, mut cmd) = isolated();
        cmd.args(["config", "set", "timing.cooldown_ms", "7000"])
            .assert()
            .success();

        let home = tmp.path().join("home");
        let config_home = tmp.path().join("config");
        classpilot()
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", &config_home)
            .args(["config", "get", "timing.cooldown_ms"])
            .assert()
            .success()
            .stdout(predicate::str::contains("7000"));
    }

    #[test]
    fn config_set_rejects_non_numeric_ms() {
        let (_tmp, mut cmd) = isolated();
        cmd.args(["config", "set", "timing.cooldown_ms", "soon"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("number"));
    }
}

mod global_flags {
    use super::*;

    #[test]
    fn json_flag_available_globally() {
        classpilot()
            .args(["--json", "settings", "--help"])
            .assert()
            .success();
    }

    #[test]
    fn verbose_flag_available_globally() {
        classpilot()
            .args(["--verbose", "settings", "--help"])
            .assert()
            .success();
    }

    #[test]
    fn cdp_flag_available_globally() {
        classpilot()
            .args(["--cdp", "9222", "settings", "--help"])
            .assert()
            .success();
    }
}
