use tracing::info;

use crate::domain::{OutputQueue, chunk_remote_path};
use crate::error::Result;
use crate::remote::session::RemoteSession;
use crate::runner::{CommandRunner, Stage};
use crate::shell::quote;

/// Separator that backgrounds every invocation but the last.
pub const CONCURRENT_SEPARATOR: &str = " & ";

/// Remote converter from the chunk format to the printer-native one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub program: String,
    pub interim_ext: String,
    pub native_ext: String,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            program: "pdf2ps".to_string(),
            interim_ext: "pdf".to_string(),
            native_ext: "ps".to_string(),
        }
    }
}

impl Conversion {
    /// Convert every interim file in `remote_dir` in place, deleting each
    /// interim file once its converted sibling is written.
    pub fn command(&self, remote_dir: &str) -> String {
        format!(
            "for f in {dir}/*.{ext}; do {prog} \"$f\" \"${{f%.*}}.{native}\" && rm \"$f\"; done",
            dir = quote(remote_dir),
            ext = self.interim_ext,
            prog = self.program,
            native = self.native_ext,
        )
    }
}

#[derive(Clone, Debug)]
pub struct PrintDispatcher {
    pub print_program: String,
    pub conversion: Conversion,
}

impl Default for PrintDispatcher {
    fn default() -> Self {
        Self {
            print_program: "lpr".to_string(),
            conversion: Conversion::default(),
        }
    }
}

impl PrintDispatcher {
    /// One print invocation per queue, queue `i` printing chunk `i`.
    ///
    /// A queue is paired by position even when the partition produced no file
    /// for it; the spooler then reports the missing file on stderr.
    pub fn build_dispatch_command(&self, queues: &[OutputQueue], remote_dir: &str, file_stem: &str) -> String {
        queues
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let path = chunk_remote_path(remote_dir, file_stem, i, &self.conversion.native_ext);
                format!("{} -P {} {}", self.print_program, quote(&q.name()), quote(&path))
            })
            .collect::<Vec<_>>()
            .join(CONCURRENT_SEPARATOR)
    }

    pub fn conversion_command(&self, remote_dir: &str) -> String {
        self.conversion.command(remote_dir)
    }

    pub fn convert<S: RemoteSession + ?Sized>(
        &self,
        runner: &CommandRunner,
        session: &S,
        remote_dir: &str,
    ) -> Result<()> {
        info!(stage = %Stage::Convert, dir = remote_dir, "converting");
        runner.run_stage(session, Stage::Convert, &self.conversion_command(remote_dir))?;
        Ok(())
    }

    /// Launch all print jobs; returns once they are started, not finished.
    pub fn dispatch<S: RemoteSession + ?Sized>(
        &self,
        runner: &CommandRunner,
        session: &S,
        queues: &[OutputQueue],
        remote_dir: &str,
        file_stem: &str,
    ) -> Result<()> {
        info!(stage = %Stage::Dispatch, document = file_stem, queues = queues.len(), "dispatching");
        let cmd = self.build_dispatch_command(queues, remote_dir, file_stem);
        runner.run_stage(session, Stage::Dispatch, &cmd)?;
        Ok(())
    }
}
