use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn demos_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

fn run_demo(directory: &Path, clicks: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hb-cli"));
    command
        .arg("run")
        .arg("--script")
        .arg(directory.join("main.rhai"));
    for name in clicks {
        command.arg("--click").arg(name);
    }
    command.output().expect("cli should execute")
}

#[test]
fn run_executes_every_demo_script() {
    let mut directories = fs::read_dir(demos_root())
        .expect("demos root must exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.join("main.rhai").is_file())
        .collect::<Vec<_>>();
    directories.sort();

    assert!(!directories.is_empty(), "expected demo scripts");

    for directory in directories {
        let output = run_demo(&directory, &[]);
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            panic!(
                "demo {} failed\nstdout:\n{}\nstderr:\n{}",
                directory.display(),
                stdout,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        assert!(
            stdout.contains("RESULT:OK"),
            "stdout missing RESULT:OK for {}",
            directory.display()
        );
        assert!(
            stdout.contains("EVENT:"),
            "stdout missing EVENT for {}",
            directory.display()
        );
    }
}

#[test]
fn clicking_the_button_relabels_the_label() {
    let output = run_demo(&demos_root().join("01-ui-click"), &["bttn"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CLICK:bttn:0"), "{}", stdout);
    assert!(
        stdout.contains(r#""kind":"set_text""#) && stdout.contains(r#""text":"ouch""#),
        "{}",
        stdout
    );
}

#[test]
fn unknown_click_targets_fail_with_an_error_code() {
    let output = run_demo(&demos_root().join("01-ui-click"), &["missing"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_CLICK_UNKNOWN"));
}
