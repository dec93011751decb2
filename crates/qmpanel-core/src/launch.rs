//! Spawning applications and startup commands.

use crate::{Error, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Split a command line the way a shell would and build the command.
///
/// # Errors
///
/// Returns an error if the command line cannot be parsed or is empty.
pub fn command_for(command_line: &str) -> Result<Command> {
    let args = shlex::split(command_line)
        .ok_or_else(|| Error::Launch(format!("Unbalanced quoting in {command_line:?}")))?;
    let (program, args) = args
        .split_first()
        .ok_or_else(|| Error::Launch("Empty command".to_string()))?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    Ok(command)
}

/// Spawn `command_line` detached from the panel. The child is not waited on
/// beyond reaping.
///
/// # Errors
///
/// Returns an error if the command cannot be parsed or spawned.
pub fn spawn(command_line: &str) -> Result<()> {
    let mut child = command_for(command_line)?
        .spawn()
        .map_err(|e| Error::Launch(format!("Failed to spawn {command_line:?}: {e}")))?;

    debug!("Spawned {:?} (pid {:?})", command_line, child.id());

    let command_line = command_line.to_string();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => debug!("{:?} exited with {}", command_line, status),
            Err(e) => warn!("Failed to wait for {:?}: {}", command_line, e),
        }
    });
    Ok(())
}

/// Spawn each startup command, logging failures.
pub fn spawn_all(commands: &[String]) {
    for command in commands {
        if let Err(e) = spawn(command) {
            warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_splits_quotes() {
        let command = command_for(r#"sh -c "echo 'hi there'""#).unwrap();
        let std = command.as_std();
        assert_eq!(std.get_program(), "sh");
        let args: Vec<_> = std.get_args().collect();
        assert_eq!(args, vec!["-c", "echo 'hi there'"]);
    }

    #[test]
    fn test_empty_command_is_error() {
        assert!(matches!(command_for("   "), Err(Error::Launch(_))));
    }

    #[test]
    fn test_unbalanced_quotes_is_error() {
        assert!(matches!(command_for("echo \"oops"), Err(Error::Launch(_))));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let result = spawn("/nonexistent/qmpanel-test-binary");
        assert!(matches!(result, Err(Error::Launch(_))));
    }

    #[tokio::test]
    async fn test_spawn_all_keeps_going() {
        spawn_all(&["/nonexistent/one".to_string(), "true".to_string()]);
    }
}
