//! Subprocess construction for ffmpeg and ffprobe.
//!
//! Every external tool invocation goes through [`tool_command`] so the
//! child gets no stdin and, on Windows, no console window of its own.

use std::ffi::OsStr;
use std::process::Stdio;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Apply platform-specific flags to a blocking command.
///
/// Used for the short `-version` checks during detection.
pub fn configure_std_command(cmd: &mut std::process::Command) {
    cmd.stdin(Stdio::null());
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
}

/// Apply platform-specific flags to an async command.
pub fn configure_tokio_command(cmd: &mut tokio::process::Command) {
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    #[cfg(target_os = "windows")]
    {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
}

/// Builds an async command for `program` with captured output.
pub fn tool_command<I, S>(program: &std::path::Path, args: I) -> tokio::process::Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    configure_tokio_command(&mut cmd);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn tool_command_captures_stdout() {
        let output = tool_command(std::path::Path::new("echo"), ["cutline"])
            .output()
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "cutline");
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn std_command_runs_without_stdin() {
        let mut cmd = std::process::Command::new("cat");
        configure_std_command(&mut cmd);
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        assert!(output.stdout.is_empty());
    }

    #[cfg(target_os = "windows")]
    #[tokio::test]
    async fn tool_command_runs_on_windows() {
        let output = tool_command(std::path::Path::new("cmd"), ["/C", "echo", "ok"])
            .output()
            .await
            .unwrap();
        assert!(output.status.success());
    }
}
