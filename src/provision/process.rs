// ABOUTME: Child process helpers shared by the tool backends.
// ABOUTME: Runs commands with inherited output, or streams output while capturing it.

use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::BackendError;

fn spawn_error(command: &Command, source: std::io::Error) -> BackendError {
    BackendError::Spawn {
        tool: command.as_std().get_program().to_string_lossy().into_owned(),
        source,
    }
}

/// Run to completion with the terminal attached. Returns whether it exited zero.
pub(super) async fn run_inherited(mut command: Command) -> Result<bool, BackendError> {
    tracing::debug!("running {:?}", command.as_std());
    let status = command
        .status()
        .await
        .map_err(|e| spawn_error(&command, e))?;

    if !status.success() {
        tracing::warn!("{:?} exited with {:?}", command.as_std().get_program(), status.code());
    }
    Ok(status.success())
}

/// Run to completion, echoing stdout and stderr line by line while keeping a copy.
pub(super) async fn run_streaming(mut command: Command) -> Result<(bool, String), BackendError> {
    tracing::debug!("running {:?}", command.as_std());
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&command, e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out, err) = tokio::join!(pump(stdout, false), pump(stderr, true));

    let status = child.wait().await.map_err(|e| spawn_error(&command, e))?;

    let mut captured = out;
    captured.push_str(&err);
    Ok((status.success(), captured))
}

async fn pump<R: AsyncRead + Unpin>(reader: Option<R>, to_stderr: bool) -> String {
    let mut captured = String::new();
    let Some(reader) = reader else {
        return captured;
    };

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if to_stderr {
                    eprintln!("{line}");
                } else {
                    println!("{line}");
                }
                captured.push_str(&line);
                captured.push('\n');
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("stopped reading tool output: {}", e);
                break;
            }
        }
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn streaming_captures_both_streams() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err >&2; exit 3"]);

        let (success, captured) = run_streaming(command).await.unwrap();
        assert!(!success);
        assert!(captured.contains("out"));
        assert!(captured.contains("err"));
    }

    #[tokio::test]
    async fn inherited_reports_exit_status() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 0"]);
        assert!(run_inherited(command).await.unwrap());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let command = Command::new("/nonexistent/roughneck-tool");
        let err = run_inherited(command).await.unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }
}
