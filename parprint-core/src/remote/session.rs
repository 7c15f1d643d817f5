use std::path::Path;

use crate::error::Result;

/// Everything a remote command produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Decode raw streams; bytes that are not UTF-8 become U+FFFD rather
    /// than an error.
    pub fn from_bytes(exit_status: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            exit_status,
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// An authenticated connection to the host that runs the print stages.
///
/// `exec` runs one shell command line to completion. It only fails when the
/// session itself fails; a command that exits non-zero is still `Ok`.
/// `upload` writes one local file to a remote path whose parent exists.
pub trait RemoteSession: Send {
    fn exec(&self, command: &str) -> Result<CommandOutput>;

    fn upload(&self, local: &Path, remote: &str) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
