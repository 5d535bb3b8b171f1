//! Narrator that hands the brief to an external program.

use std::io::Write;
use std::process::{Command, Stdio};

use meterroute_recon::{NarrativeBrief, Narrator};

/// Runs `command` through the platform shell, writes the brief as JSON to
/// its stdin and takes its stdout as the narrative.
pub struct CommandNarrator {
    pub command: String,
}

impl CommandNarrator {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", self.command.as_str()]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", self.command.as_str()]);
            cmd
        }
    }
}

impl Narrator for CommandNarrator {
    fn narrate(&self, brief: &NarrativeBrief) -> Result<String, String> {
        let payload = serde_json::to_vec(brief).map_err(|e| format!("cannot encode brief: {e}"))?;

        tracing::info!(command = %self.command, "running narrator");
        let mut child = self
            .shell()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| format!("cannot start `{}`: {e}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A narrator that ignores its input may close stdin early.
            if let Err(e) = stdin.write_all(&payload) {
                tracing::debug!("narrator stdin closed early: {e}");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("narrator did not finish: {e}"))?;
        if !output.status.success() {
            return Err(format!("`{}` exited with {}", self.command, output.status));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(format!("`{}` produced no output", self.command));
        }
        Ok(text)
    }
}
