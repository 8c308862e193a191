//! External process invocation
//!
//! Synchronous wrappers around [`std::process::Command`]. Tool stdout is
//! suppressed unless debug logging is enabled; stderr always passes
//! through so tool diagnostics stay visible.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Run an external command to completion and return its exit status
pub fn run<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    cwd: Option<&Path>,
) -> io::Result<ExitStatus> {
    let mut cmd = Command::new(program.as_ref());
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    if !tracing::enabled!(tracing::Level::DEBUG) {
        cmd.stdout(Stdio::null());
    }
    tracing::debug!("exec: {cmd:?}");
    cmd.status()
}

/// Run an external command and capture its trimmed stdout
///
/// A non-zero exit status is an error.
pub fn output<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    cwd: Option<&Path>,
) -> io::Result<String> {
    let mut cmd = Command::new(program.as_ref());
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    tracing::debug!("exec: {cmd:?}");
    let out = cmd.output()?;
    if !out.status.success() {
        return Err(io::Error::other(format!(
            "{} exited with {}",
            program.as_ref().to_string_lossy(),
            out.status
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_captures_stdout() {
        let out = output("echo", &["hello"], None).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_output_nonzero_is_error() {
        assert!(output("false", &[] as &[&str], None).is_err());
    }

    #[test]
    fn test_run_reports_status() {
        let status = run("true", &[] as &[&str], None).unwrap();
        assert!(status.success());
        let status = run("false", &[] as &[&str], None).unwrap();
        assert!(!status.success());
    }
}
