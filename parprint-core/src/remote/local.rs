use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::remote::session::{CommandOutput, RemoteSession};

/// Runs the "remote" side on this machine: commands go to `sh -c` inside
/// `home`, uploads are plain copies relative to `home`.
pub struct LocalSession {
    home: PathBuf,
}

impl LocalSession {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn resolve(&self, remote: &str) -> PathBuf {
        self.home.join(remote)
    }
}

impl RemoteSession for LocalSession {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.home)
            .output()?;
        Ok(CommandOutput::from_bytes(
            output.status.code().unwrap_or(-1),
            &output.stdout,
            &output.stderr,
        ))
    }

    fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        fs::copy(local, self.resolve(remote))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
