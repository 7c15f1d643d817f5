use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::remote_join;
use crate::error::{ParprintError, Result};
use crate::remote::session::RemoteSession;
use crate::runner::{CommandRunner, Stage};
use crate::shell::quote;

/// Copy `local_dir` into `remote_dir`, keeping its own name:
/// the files land under `remote_dir/<basename of local_dir>/`.
///
/// Returns that remote directory.
pub fn push<S: RemoteSession + ?Sized>(
    runner: &CommandRunner,
    session: &S,
    local_dir: &Path,
    remote_dir: &str,
) -> Result<String> {
    let base = local_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            ParprintError::Transport(format!("no directory name in {}", local_dir.display()))
        })?;
    let remote_root = remote_join(remote_dir, &base);

    let mut dirs = vec![remote_root.clone()];
    let mut files = Vec::new();
    for e in WalkDir::new(local_dir).min_depth(1).sort_by_file_name() {
        let e = e?;
        let rel = e
            .path()
            .strip_prefix(local_dir)
            .map_err(|err| ParprintError::Transport(err.to_string()))?;
        let remote = remote_join(&remote_root, &rel.to_string_lossy());
        if e.file_type().is_dir() {
            dirs.push(remote);
        } else if e.file_type().is_file() {
            files.push((e.path().to_path_buf(), remote));
        }
        // symlinks are not followed
    }

    let mkdir = format!(
        "mkdir -p {}",
        dirs.iter().map(|d| quote(d)).collect::<Vec<_>>().join(" ")
    );
    let out = runner.run(session, &mkdir)?;
    if !out.success() {
        return Err(ParprintError::Transport(format!(
            "could not create {remote_root}: {}",
            out.stderr.trim_end()
        )));
    }

    for (local, remote) in &files {
        debug!(local = %local.display(), remote = %remote, "upload");
        session.upload(local, remote)?;
    }
    info!(stage = %Stage::Transport, files = files.len(), dest = %remote_root, "pushed");
    Ok(remote_root)
}
