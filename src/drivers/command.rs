//! External line-tool execution.
//!
//! Two execution shapes, matching the two device archetypes:
//!
//! - **run to completion**: one-shot query (`gpioget`), merged
//!   stdout+stderr returned for the reply parser.
//! - **held process**: a long-lived `gpioset` child whose lifetime *is*
//!   the assertion lifetime of an output level. Changing the level tears
//!   the old child down and spawns a fresh one.
//!
//! The `LineQuery` / `LineHold` port traits are the seam between the line
//! drivers and the outside world; tests plug in in-memory fakes, and a
//! direct-register backend could implement the same traits without touching
//! `InputLine` / `OutputLine`.

use crate::error::{CommandError, Result};
use log::warn;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// How long a held process gets to exit after a graceful stop request
/// before it is killed outright.
const STOP_GRACE: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// One-shot execution
// ---------------------------------------------------------------------------

/// Run a command to completion and return its merged stdout+stderr.
/// Non-zero exit and launch failures are typed errors; the caller decides
/// whether they are fatal (output hold) or a defaulted sample (input query).
pub fn run_merged(program: &str, args: &[String]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CommandError::Launch {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
    merged.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(CommandError::NonZeroExit {
            program: program.to_string(),
            code: output.status.code(),
        }
        .into());
    }
    Ok(merged)
}

// ---------------------------------------------------------------------------
// Held process
// ---------------------------------------------------------------------------

/// Handle to a level-asserting process owned by exactly one `OutputLine`.
pub trait HeldLevel {
    /// Request a graceful stop, await exit, escalate to a forced kill.
    fn stop(&mut self) -> Result<()>;
}

/// A spawned child whose lifetime equals the assertion lifetime.
pub struct HeldProcess {
    program: String,
    child: Option<Child>,
}

impl HeldProcess {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Launch {
                program: program.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            program: program.to_string(),
            child: Some(child),
        })
    }

    /// True while the child has not been reaped.
    pub fn is_held(&self) -> bool {
        self.child.is_some()
    }
}

impl HeldLevel for HeldProcess {
    fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(()); // already stopped
        };

        // A holder that exited on its own usually means the tool rejected
        // the request; surface its stderr before reaping.
        if let Ok(Some(status)) = child.try_wait() {
            let mut err_text = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut err_text);
            }
            warn!(
                "held '{}' exited early ({status}): {}",
                self.program,
                err_text.trim()
            );
            return Ok(());
        }

        graceful_then_kill(&self.program, &mut child)
    }
}

impl Drop for HeldProcess {
    fn drop(&mut self) {
        // Last-resort cleanup if the line was dropped without shutdown().
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// SIGTERM, bounded wait, SIGKILL. The grace window is polled rather than
/// blocked on so a wedged tool cannot stall teardown indefinitely.
fn graceful_then_kill(program: &str, child: &mut Child) -> Result<()> {
    // std only exposes SIGKILL; send the polite signal through libc first.
    #[cfg(unix)]
    unsafe {
        let _ = libc::kill(child.id() as i32, libc::SIGTERM);
    }

    let deadline = Instant::now() + STOP_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return Ok(()),
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Ok(None) => break,
            Err(e) => {
                return Err(CommandError::StopFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    child.kill().map_err(|e| CommandError::StopFailed {
        program: program.to_string(),
        reason: e.to_string(),
    })?;
    let _ = child.wait();
    Ok(())
}

// ---------------------------------------------------------------------------
// Port traits
// ---------------------------------------------------------------------------

/// Pull bias applied when sampling an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    PullUp,
    PullDown,
    Disabled,
}

impl Bias {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::PullUp => "pull-up",
            Self::PullDown => "pull-down",
            Self::Disabled => "disabled",
        }
    }
}

/// Read-side port: sample one pin, return the tool's raw textual reply.
pub trait LineQuery {
    fn sample(&self, bias: Bias, pin: u8) -> Result<String>;
}

/// Write-side port: assert a level on one pin for as long as the returned
/// handle lives.
pub trait LineHold {
    fn hold(&self, pin: u8, high: bool) -> Result<Box<dyn HeldLevel>>;
}

/// `gpioget`-style query tool.
pub struct QueryTool {
    program: String,
    chip: String,
}

impl QueryTool {
    pub fn new(program: &str, chip: &str) -> Self {
        Self {
            program: program.to_string(),
            chip: chip.to_string(),
        }
    }
}

impl LineQuery for QueryTool {
    fn sample(&self, bias: Bias, pin: u8) -> Result<String> {
        let args = vec![
            format!("--bias={}", bias.as_arg()),
            "--chip".to_string(),
            self.chip.clone(),
            pin.to_string(),
        ];
        run_merged(&self.program, &args)
    }
}

/// `gpioset`-style hold tool: the child asserts `pin=value` for its lifetime.
pub struct HoldTool {
    program: String,
    chip: String,
}

impl HoldTool {
    pub fn new(program: &str, chip: &str) -> Self {
        Self {
            program: program.to_string(),
            chip: chip.to_string(),
        }
    }
}

impl LineHold for HoldTool {
    fn hold(&self, pin: u8, high: bool) -> Result<Box<dyn HeldLevel>> {
        let args = vec![
            "--chip".to_string(),
            self.chip.clone(),
            format!("{pin}={}", u8::from(high)),
        ];
        Ok(Box::new(HeldProcess::spawn(&self.program, &args)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_merged_captures_stdout() {
        let out = run_merged("echo", &["hello".to_string()]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn run_merged_launch_failure_is_typed() {
        let err = run_merged("definitely-not-a-real-binary-xyz", &[]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Command(CommandError::Launch { .. })
        ));
    }

    #[test]
    fn run_merged_nonzero_exit_is_typed() {
        let err = run_merged("false", &[]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Command(CommandError::NonZeroExit { .. })
        ));
    }

    #[test]
    fn held_process_stop_is_idempotent() {
        let mut held = HeldProcess::spawn("sleep", &["30".to_string()]).unwrap();
        assert!(held.is_held());
        held.stop().unwrap();
        assert!(!held.is_held());
        held.stop().unwrap(); // second stop is a no-op
    }

    #[test]
    fn graceful_stop_beats_the_kill_escalation() {
        // sleep dies on the polite signal, so stop() must return well
        // inside the grace window instead of timing out into a kill.
        let mut held = HeldProcess::spawn("sleep", &["30".to_string()]).unwrap();
        let started = Instant::now();
        held.stop().unwrap();
        assert!(started.elapsed() < STOP_GRACE);
    }

    #[test]
    fn bias_args_match_tool_vocabulary() {
        assert_eq!(Bias::PullUp.as_arg(), "pull-up");
        assert_eq!(Bias::PullDown.as_arg(), "pull-down");
        assert_eq!(Bias::Disabled.as_arg(), "disabled");
    }
}
