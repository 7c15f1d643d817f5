use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::error::Result;
use crate::remote::session::{CommandOutput, RemoteSession};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    Exec(String),
    Upload { local: PathBuf, remote: String },
    Close,
}

/// Shared transcript; cloned into every session a dry run creates.
#[derive(Clone, Debug, Default)]
pub struct Transcript(Arc<Mutex<Vec<RecordedCall>>>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: RecordedCall) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Exec(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Session that performs nothing and reports success for every call.
pub struct RecordingSession {
    transcript: Transcript,
}

impl RecordingSession {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

impl RemoteSession for RecordingSession {
    fn exec(&self, command: &str) -> Result<CommandOutput> {
        info!(command, "dry run: exec");
        self.transcript.push(RecordedCall::Exec(command.to_string()));
        Ok(CommandOutput::default())
    }

    fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        info!(local = %local.display(), remote, "dry run: upload");
        self.transcript.push(RecordedCall::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.transcript.push(RecordedCall::Close);
        Ok(())
    }
}
