use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::remote_join;
use crate::error::Result;
use crate::remote::session::RemoteSession;
use crate::runner::{CommandRunner, Stage};
use crate::shell::quote;

/// Remove-if-present, then create.
pub fn reset_command(dir: &str) -> String {
    let d = quote(dir);
    format!("if [ -d {d} ]; then rm -rf {d}; fi; mkdir -p {d}")
}

pub fn teardown_command(dir: &str) -> String {
    format!("rm -rf {}", quote(dir))
}

/// The transient directory on the print host that holds in-flight chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteWorkspace {
    path: String,
}

impl RemoteWorkspace {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Per-document slot inside the workspace.
    pub fn slot(&self, name: &str) -> String {
        remote_join(&self.path, name)
    }

    pub fn reset<S: RemoteSession + ?Sized>(&self, runner: &CommandRunner, session: &S) -> Result<()> {
        debug!(path = %self.path, "reset remote workspace");
        runner.run_stage(session, Stage::Reset, &reset_command(&self.path))?;
        Ok(())
    }

    /// Clear one slot without touching the rest of the workspace.
    pub fn clear_slot<S: RemoteSession + ?Sized>(
        &self,
        runner: &CommandRunner,
        session: &S,
        name: &str,
    ) -> Result<()> {
        runner.run_stage(session, Stage::Reset, &teardown_command(&self.slot(name)))?;
        Ok(())
    }

    pub fn teardown<S: RemoteSession + ?Sized>(&self, runner: &CommandRunner, session: &S) -> Result<()> {
        debug!(path = %self.path, "tear down remote workspace");
        runner.run_stage(session, Stage::Teardown, &teardown_command(&self.path))?;
        Ok(())
    }

    /// Reset, run `body`, then tear down whatever `body` returned.
    ///
    /// Teardown runs on the first session even when `body` fails; the body's
    /// error wins over a teardown error.
    pub fn scoped<S, T, F>(&self, runner: &CommandRunner, sessions: &mut [S], body: F) -> Result<T>
    where
        S: RemoteSession,
        F: FnOnce(&mut [S]) -> Result<T>,
    {
        let Some(first) = sessions.first() else {
            return body(sessions);
        };
        self.reset(runner, first)?;

        let outcome = body(&mut *sessions);
        let cleanup = self.teardown(runner, &sessions[0]);
        match (outcome, cleanup) {
            (Ok(v), Ok(())) => Ok(v),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(c)) => {
                warn!(error = %c, "workspace teardown failed after an earlier error");
                Err(e)
            }
        }
    }
}

/// Local staging directory, force-reset on creation and removed on drop.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        reset_local(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh subdirectory for one document's chunks.
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let p = self.path.join(name);
        reset_local(&p)?;
        Ok(p)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = remove_local(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove staging dir");
        }
    }
}

pub fn reset_local(path: &Path) -> Result<()> {
    remove_local(path)?;
    fs::create_dir_all(path)?;
    Ok(())
}

/// Recursive removal; a missing directory counts as removed.
pub fn remove_local(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParprintError;
    use crate::remote::local::LocalSession;
    use crate::runner::test_sink::SharedBuf;

    fn runner() -> CommandRunner {
        CommandRunner::new(Box::new(SharedBuf::default()))
    }

    fn entries(p: &Path) -> usize {
        fs::read_dir(p).unwrap().count()
    }

    #[test]
    fn reset_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let s = LocalSession::new(tmp.path());
        RemoteWorkspace::new("ws").reset(&runner(), &s).unwrap();
        assert!(tmp.path().join("ws").is_dir());
    }

    #[test]
    fn reset_is_idempotent_and_empties() {
        let tmp = tempfile::tempdir().unwrap();
        let s = LocalSession::new(tmp.path());
        let ws = RemoteWorkspace::new("ws");
        let r = runner();
        ws.reset(&r, &s).unwrap();
        fs::write(tmp.path().join("ws/stale.ps"), b"old").unwrap();
        ws.reset(&r, &s).unwrap();
        ws.reset(&r, &s).unwrap();
        assert!(tmp.path().join("ws").is_dir());
        assert_eq!(entries(&tmp.path().join("ws")), 0);
    }

    #[test]
    fn teardown_of_missing_dir_is_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let s = LocalSession::new(tmp.path());
        let r = runner().with_policy(crate::runner::FailurePolicy::Strict);
        RemoteWorkspace::new("never-made").teardown(&r, &s).unwrap();
    }

    #[test]
    fn scoped_tears_down_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sessions = vec![LocalSession::new(tmp.path())];
        let ws = RemoteWorkspace::new("ws");
        let err = ws
            .scoped(&runner(), &mut sessions, |s| -> Result<()> {
                assert!(s[0].home().join("ws").is_dir());
                Err(ParprintError::Transport("boom".into()))
            })
            .unwrap_err();
        assert!(matches!(err, ParprintError::Transport(_)));
        assert!(!tmp.path().join("ws").exists());
    }

    #[test]
    fn commands_quote_paths() {
        assert_eq!(
            reset_command("my ws"),
            "if [ -d 'my ws' ]; then rm -rf 'my ws'; fi; mkdir -p 'my ws'"
        );
        assert_eq!(teardown_command("par_temp"), "rm -rf par_temp");
    }

    #[test]
    fn staging_dir_resets_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("leftover.pdf"), b"x").unwrap();
        {
            let staging = StagingDir::create(&path).unwrap();
            assert_eq!(entries(staging.path()), 0);
            let sub = staging.subdir("report").unwrap();
            assert!(sub.is_dir());
        }
        assert!(!path.exists());
        remove_local(&path).unwrap();
    }
}
