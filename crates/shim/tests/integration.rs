#![cfg(unix)]
//! Integration tests for the pear wrapper
//!
//! Each test installs the wrapper binary as a symlink in a scratch `bin/`
//! directory, writes a `pear.conf` next to it and points the configured
//! command at a shell script standing in for the real compiler.

use anyhow::Result;
use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn wrapper_binary() -> PathBuf {
    if let Some(bin) = option_env!("CARGO_BIN_EXE_pear_shim_test_bin") {
        return PathBuf::from(bin);
    }
    PathBuf::from(std::env::var("CARGO_BIN_EXE_pear_shim_test_bin").unwrap_or_else(|_| {
        format!("{}/../../target/debug/pear_shim_test_bin", env!("CARGO_MANIFEST_DIR"))
    }))
}

struct Install {
    temp: TempDir,
}

impl Install {
    /// Layout: `<root>/bin/<tool>` -> wrapper, `<root>/real/cc` fake compiler,
    /// `<root>/work` as the working directory.
    fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        fs::create_dir_all(temp.path().join("bin"))?;
        fs::create_dir_all(temp.path().join("real"))?;
        fs::create_dir_all(temp.path().join("work"))?;

        let install = Self { temp };
        install.script(
            "real/cc",
            "echo \"args: $*\"\necho \"path: ${PATH%%:*}\"\nexit ${CC_EXIT:-0}",
        )?;
        Ok(install)
    }

    fn script(&self, relative: &str, body: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
        Ok(path)
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    fn link(&self, tool: &str) -> Result<PathBuf> {
        let path = self.root().join("bin").join(tool);
        symlink(wrapper_binary(), &path)?;
        Ok(path)
    }

    fn configure(&self, body: &str) -> Result<()> {
        fs::write(self.root().join("pear.conf"), body)?;
        Ok(())
    }

    fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(self.root().join("work"))
            .env("PATH", "/usr/bin:/bin")
            .env_remove("PEAR_BYPASS")
            .env_remove("PEAR_CONFIG")
            .env_remove("PEAR_LOG");
        cmd
    }

    fn read(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.root().join(relative))?)
    }
}

const CONFIG: &str = r#"// wrapper configuration
environment:
  logdir: ../logs
  logs: "@(logdir)"
  realdir: ../real
  real: "@(realdir)"

command:
  - name: [gcc, cc]
    exec: $(real)/cc
    append: -g
  - name: gcc
    filter-out: -Werror
    logfile: $(logs)/build/$(.arg0).log
    rtags-logfile: $(logs)/rtags$(.input).cmd
"#;

#[test]
fn test_wrapper_rewrites_logs_and_runs_real_tool() -> Result<()> {
    let install = Install::new()?;
    install.configure(CONFIG)?;
    let gcc = install.link("gcc")?;
    let work = install.root().join("work");

    install
        .command(&gcc)
        .args(["-Werror", "-Iinc", "-c", "main.c", "-o", "main.o"])
        .assert()
        .success()
        .stdout(format!(
            "args: -Iinc -c main.c -o main.o -g\npath: {}\n",
            install.root().join("bin").display()
        ));

    let real = install.root().join("real/cc");
    assert_eq!(
        install.read("logs/build/gcc.log")?,
        format!("{} -Iinc -c main.c -o main.o -g\n", real.display())
    );
    assert_eq!(
        install.read(&format!("logs/rtags{}/main.c.cmd", work.display()))?,
        format!(
            "{} -I{}/inc -c {}/main.c -g\n",
            real.display(),
            work.display(),
            work.display()
        )
    );

    Ok(())
}

#[test]
fn test_exit_code_is_propagated() -> Result<()> {
    let install = Install::new()?;
    install.configure(CONFIG)?;
    let cc = install.link("cc")?;

    install.command(&cc).env("CC_EXIT", "42").assert().code(42);
    // cc has no log templates configured
    assert!(!install.root().join("logs").exists());

    Ok(())
}

#[test]
fn test_preprocessing_pass_skips_indexer_log() -> Result<()> {
    let install = Install::new()?;
    install.configure(CONFIG)?;
    let gcc = install.link("gcc")?;

    install.command(&gcc).args(["-E", "main.c"]).assert().success();

    assert!(install.root().join("logs/build/gcc.log").exists());
    assert!(!install.root().join("logs/rtags").exists());
    Ok(())
}

#[test]
fn test_bypass_skips_logging() -> Result<()> {
    let install = Install::new()?;
    install.configure(CONFIG)?;
    let gcc = install.link("gcc")?;

    install
        .command(&gcc)
        .args(["-c", "main.c"])
        .env("PEAR_BYPASS", "1")
        .assert()
        .success()
        .stdout(format!(
            "args: -c main.c -g\npath: {}\n",
            install.root().join("bin").display()
        ));

    assert!(!install.root().join("logs").exists());
    Ok(())
}

#[test]
fn test_bare_name_resolves_through_path() -> Result<()> {
    let install = Install::new()?;
    fs::create_dir_all(install.root().join("etc"))?;
    let elsewhere = install.root().join("etc/pear.yaml");
    fs::write(
        &elsewhere,
        format!(
            "command:\n  - name: gcc\n    exec: {}\n",
            install.root().join("real/cc").display()
        ),
    )?;
    install.link("gcc")?;

    let bin = install.root().join("bin");
    install
        .command("gcc")
        .arg("--version")
        .env("PATH", format!("{}:/usr/bin:/bin", bin.display()))
        .env("PEAR_CONFIG", &elsewhere)
        .assert()
        .success()
        .stdout(format!("args: --version\npath: {}\n", bin.display()));

    Ok(())
}

#[test]
fn test_unconfigured_command_fails() -> Result<()> {
    let install = Install::new()?;
    install.configure(CONFIG)?;
    let clang = install.link("clang")?;

    let output = install.command(&clang).arg("-c").output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pear: command 'clang' has not been configured"));
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn test_missing_config_fails() -> Result<()> {
    let install = Install::new()?;
    let gcc = install.link("gcc")?;

    let output = install.command(&gcc).output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"));
    assert!(stderr.contains("pear.conf"));

    Ok(())
}

#[test]
fn test_config_errors_report_file_lines() -> Result<()> {
    let install = Install::new()?;
    install.configure(
        "// header\n// second\ncommand:\n  - name: gcc\n    exec: /bin/true\n    colour: red\n",
    )?;
    let gcc = install.link("gcc")?;

    let output = install.command(&gcc).output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 6"), "stderr: {stderr}");
    assert!(stderr.contains("colour"), "stderr: {stderr}");

    Ok(())
}

#[test]
fn test_non_utf8_arguments_reach_the_tool_unchanged() -> Result<()> {
    let install = Install::new()?;
    let received = install.root().join("received");
    let recorder = install.script(
        "real/record",
        &format!("printf '%s' \"$1\" > '{}'", received.display()),
    )?;
    install.configure(&format!(
        "command:\n  - name: gcc\n    exec: {}\n    append: -g\n    logfile: {}/build.log\n",
        recorder.display(),
        install.root().display()
    ))?;
    let gcc = install.link("gcc")?;

    install
        .command(&gcc)
        .arg(OsStr::from_bytes(b"caf\xe9.c"))
        .arg("-c")
        .assert()
        .success();

    assert_eq!(fs::read(&received)?, b"caf\xe9.c".to_vec());
    // the text log carries a replacement character instead
    let log = install.read("build.log")?;
    assert!(log.ends_with(" caf\u{fffd}.c -c -g\n"), "log: {log:?}");

    Ok(())
}
