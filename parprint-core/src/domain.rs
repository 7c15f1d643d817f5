// parprint_core/src/domain.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ParprintError, Result};
use crate::partition::PageRange;

/// Queues accepted by `--printers`.
pub const AVAILABLE_QUEUES: &[&str] = &[
    "psts-sx", "pstsb-sx", "pstsc-sx", "psc008-sx", "psc011-sx", //
    "psts-dx", "pstsb-dx", "pstsc-dx", "psc008-dx", "psc011-dx", //
    "psts-nb", "pstsb-nb", "pstsc-nb", "psc008-nb", "psc011-nb",
];

/// Level 1, single sided.
pub const DEFAULT_QUEUES: &[&str] = &["psts-sx", "pstsb-sx", "pstsc-sx"];

/// A source document as read from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub total_pages: usize,
    pub source: PathBuf,
}

impl Document {
    /// Resolve `<dir>/<name>.pdf`; `name` may already carry the suffix.
    pub fn source_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.pdf", document_stem(name)))
    }
}

/// Strip a trailing `.pdf` so `report` and `report.pdf` name the same document.
pub fn document_stem(name: &str) -> &str {
    name.strip_suffix(".pdf").unwrap_or(name)
}

/// One materialized page-range slice of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub range: PageRange,
    pub local_path: PathBuf,
}

pub fn chunk_file_name(stem: &str, index: usize, ext: &str) -> String {
    format!("{stem}_{index}.{ext}")
}

pub fn chunk_remote_path(remote_dir: &str, stem: &str, index: usize, ext: &str) -> String {
    remote_join(remote_dir, &chunk_file_name(stem, index, ext))
}

/// Join POSIX remote path segments without doubling separators.
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Rewrite `~/x` to the home-relative `x` so that SCP, which does not expand
/// `~`, and the remote shell resolve the same directory.
pub fn normalize_remote_dir(dir: &str) -> String {
    match dir {
        "~" | "~/" => ".".to_string(),
        d => match d.strip_prefix("~/") {
            Some(rest) => rest.trim_end_matches('/').to_string(),
            None => d.trim_end_matches('/').to_string(),
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideMode {
    Simplex,
    Duplex,
    NoBanner,
}

impl SideMode {
    pub fn suffix(self) -> &'static str {
        match self {
            SideMode::Simplex => "sx",
            SideMode::Duplex => "dx",
            SideMode::NoBanner => "nb",
        }
    }
}

/// A named print destination: printer identity plus side mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputQueue {
    pub printer: String,
    pub side: SideMode,
}

impl OutputQueue {
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parse an ordered list, rejecting names outside the allow-list.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<OutputQueue>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for OutputQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.printer, self.side.suffix())
    }
}

impl FromStr for OutputQueue {
    type Err = ParprintError;

    fn from_str(s: &str) -> Result<Self> {
        if !AVAILABLE_QUEUES.contains(&s) {
            return Err(ParprintError::UnknownQueue(s.to_string()));
        }
        let (printer, mode) = s
            .rsplit_once('-')
            .ok_or_else(|| ParprintError::UnknownQueue(s.to_string()))?;
        let side = match mode {
            "sx" => SideMode::Simplex,
            "dx" => SideMode::Duplex,
            "nb" => SideMode::NoBanner,
            _ => return Err(ParprintError::UnknownQueue(s.to_string())),
        };
        Ok(OutputQueue {
            printer: printer.to_string(),
            side,
        })
    }
}

/// Login for the print host. Lives in memory for one run only.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_allowed_queue() {
        for name in AVAILABLE_QUEUES {
            let q: OutputQueue = name.parse().unwrap();
            assert_eq!(q.name(), *name);
        }
    }

    #[test]
    fn rejects_unknown_queue() {
        let err = "psts-xx".parse::<OutputQueue>().unwrap_err();
        assert!(matches!(err, ParprintError::UnknownQueue(q) if q == "psts-xx"));
    }

    #[test]
    fn queue_list_keeps_order() {
        let qs = OutputQueue::parse_list(&["pstsc-dx", "psts-sx"]).unwrap();
        assert_eq!(qs[0].printer, "pstsc");
        assert_eq!(qs[0].side, SideMode::Duplex);
        assert_eq!(qs[1].to_string(), "psts-sx");
    }

    #[test]
    fn home_relative_remote_dirs() {
        assert_eq!(normalize_remote_dir("~/par_temp"), "par_temp");
        assert_eq!(normalize_remote_dir("~/par_temp/"), "par_temp");
        assert_eq!(normalize_remote_dir("~"), ".");
        assert_eq!(normalize_remote_dir("/tmp/ws"), "/tmp/ws");
    }

    #[test]
    fn chunk_paths() {
        assert_eq!(chunk_remote_path("/tmp/ws/", "report", 2, "ps"), "/tmp/ws/report_2.ps");
        assert_eq!(
            Document::source_path(Path::new("/docs"), "notes.pdf"),
            PathBuf::from("/docs/notes.pdf")
        );
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let c = Credentials::new("e0123456", "hunter2");
        let dbg = format!("{c:?}");
        assert!(dbg.contains("e0123456"));
        assert!(!dbg.contains("hunter2"));
    }
}
