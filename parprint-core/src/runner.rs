use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{ParprintError, Result};
use crate::remote::session::{CommandOutput, RemoteSession};

/// Which remote step a command belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Reset,
    Transport,
    Convert,
    Dispatch,
    Teardown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Reset => "reset",
            Stage::Transport => "transport",
            Stage::Convert => "convert",
            Stage::Dispatch => "dispatch",
            Stage::Teardown => "teardown",
        };
        f.write_str(s)
    }
}

/// What a stage does with a non-zero exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Echo the output and carry on.
    #[default]
    Lenient,
    /// Fail the run.
    Strict,
}

/// Executes command lines on a session and echoes their output.
///
/// stdout is always written to the sink, stderr only when non-empty.
pub struct CommandRunner {
    sink: Mutex<Box<dyn Write + Send>>,
    policy: FailurePolicy,
}

impl CommandRunner {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
            policy: FailurePolicy::default(),
        }
    }

    pub fn to_stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run `command` and echo its output. Never fails on exit status.
    pub fn run<S: RemoteSession + ?Sized>(&self, session: &S, command: &str) -> Result<CommandOutput> {
        debug!(command, "exec");
        let out = session.exec(command)?;
        self.echo(&out)?;
        Ok(out)
    }

    /// Like [`run`](Self::run), then apply the failure policy for `stage`.
    pub fn run_stage<S: RemoteSession + ?Sized>(
        &self,
        session: &S,
        stage: Stage,
        command: &str,
    ) -> Result<CommandOutput> {
        let out = self.run(session, command)?;
        if !out.success() {
            warn!(%stage, status = out.exit_status, "remote command exited non-zero");
            if self.policy == FailurePolicy::Strict {
                return Err(ParprintError::RemoteCommand {
                    stage,
                    status: out.exit_status,
                    stderr: out.stderr.trim_end().to_string(),
                });
            }
        }
        Ok(out)
    }

    fn echo(&self, out: &CommandOutput) -> Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        sink.write_all(out.stdout.as_bytes())?;
        if !out.stderr.is_empty() {
            sink.write_all(out.stderr.as_bytes())?;
        }
        sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_sink {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Cloneable in-memory sink for asserting on echoed output.
    #[derive(Clone, Default)]
    pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
