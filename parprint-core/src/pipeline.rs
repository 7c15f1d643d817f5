use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::dispatch::PrintDispatcher;
use crate::domain::{OutputQueue, document_stem, normalize_remote_dir};
use crate::error::{ParprintError, Result};
use crate::partition::partition;
use crate::remote::session::RemoteSession;
use crate::runner::CommandRunner;
use crate::split::SourcePdf;
use crate::transport;
use crate::workspace::{RemoteWorkspace, StagingDir};

/// Everything one run needs, fixed before the first document is touched.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Folder holding the input PDFs.
    pub source_dir: PathBuf,
    /// Local chunk staging folder; reset at start, removed at end.
    pub staging_dir: PathBuf,
    /// Remote workspace, home-relative unless absolute.
    pub remote_dir: String,
    /// Queue `i` prints chunk `i`.
    pub queues: Vec<OutputQueue>,
    pub dispatcher: PrintDispatcher,
}

impl RunConfig {
    pub fn new(source_dir: impl Into<PathBuf>, staging_subdir: &str, remote_dir: &str, queues: Vec<OutputQueue>) -> Self {
        let source_dir = source_dir.into();
        Self {
            staging_dir: source_dir.join(staging_subdir),
            source_dir,
            remote_dir: normalize_remote_dir(remote_dir),
            queues,
            dispatcher: PrintDispatcher::default(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: PrintDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Reject runs that could only fail or collide halfway through.
    pub fn validate(&self, documents: &[String]) -> Result<()> {
        if self.queues.is_empty() {
            return Err(ParprintError::Config("no print queues selected".into()));
        }
        if documents.is_empty() {
            return Err(ParprintError::Config("no documents given".into()));
        }
        if self.remote_dir.is_empty() || self.remote_dir == "." || self.remote_dir == "/" {
            return Err(ParprintError::Config(format!(
                "refusing to use {:?} as the remote workspace",
                self.remote_dir
            )));
        }
        self.check_staging_dir()?;
        let mut seen = HashSet::new();
        for d in documents {
            if !seen.insert(document_stem(d)) {
                return Err(ParprintError::Config(format!("document {d} given twice")));
            }
        }
        Ok(())
    }

    /// Staging is wiped on reset, so it must be a proper subfolder of the
    /// source folder, never the folder itself or anything outside it.
    fn check_staging_dir(&self) -> Result<()> {
        let inside = self
            .staging_dir
            .strip_prefix(&self.source_dir)
            .ok()
            .filter(|rel| {
                rel.components().next().is_some()
                    && rel.components().all(|c| matches!(c, Component::Normal(_)))
            });
        if inside.is_none() {
            return Err(ParprintError::Config(format!(
                "staging folder {} must be a subfolder of {}",
                self.staging_dir.display(),
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}

pub struct Pipeline {
    config: RunConfig,
    runner: CommandRunner,
}

impl Pipeline {
    pub fn new(config: RunConfig, runner: CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Print `documents` one after another over a single session.
    pub fn run<S: RemoteSession>(&self, session: &mut S, documents: &[String]) -> Result<()> {
        self.run_pooled(std::slice::from_mut(session), documents)
    }

    /// Print `documents`, spreading them round-robin over `sessions`.
    ///
    /// Each document gets its own slot `<workspace>/<stem>`, so sessions never
    /// touch each other's files. The workspace and the local staging folder
    /// are removed on every exit path.
    pub fn run_pooled<S: RemoteSession>(&self, sessions: &mut [S], documents: &[String]) -> Result<()> {
        self.config.validate(documents)?;
        if sessions.is_empty() {
            return Err(ParprintError::Config("no remote sessions available".into()));
        }

        let staging = StagingDir::create(&self.config.staging_dir)?;
        let workspace = RemoteWorkspace::new(self.config.remote_dir.clone());
        info!(
            documents = documents.len(),
            sessions = sessions.len(),
            queues = self.config.queues.len(),
            workspace = workspace.path(),
            policy = ?self.runner.policy(),
            "starting run"
        );

        workspace.scoped(&self.runner, sessions, |sessions| {
            if sessions.len() == 1 || documents.len() == 1 {
                let session = &sessions[0];
                return documents
                    .iter()
                    .try_for_each(|name| self.process_document(session, &staging, &workspace, name));
            }
            let groups = round_robin(documents, sessions.len());
            sessions
                .par_iter_mut()
                .zip(groups.par_iter())
                .try_for_each(|(session, group)| {
                    group
                        .iter()
                        .try_for_each(|name| self.process_document(&*session, &staging, &workspace, name))
                })
        })
    }

    /// reset slot → transport → convert → dispatch, for one document.
    fn process_document<S: RemoteSession + ?Sized>(
        &self,
        session: &S,
        staging: &StagingDir,
        workspace: &RemoteWorkspace,
        name: &str,
    ) -> Result<()> {
        let source = SourcePdf::open(&self.config.source_dir, name)?;
        let stem = source.document.name.clone();
        let local_dir = staging.subdir(&stem)?;
        let chunks = source.write_chunks(self.config.queues.len(), &local_dir)?;
        info!(
            document = %stem,
            pages = source.document.total_pages,
            chunks = chunks.len(),
            "chunked"
        );

        workspace.clear_slot(&self.runner, session, &stem)?;
        let remote_dir = transport::push(&self.runner, session, &local_dir, workspace.path())?;

        let dispatcher = &self.config.dispatcher;
        dispatcher.convert(&self.runner, session, &remote_dir)?;
        dispatcher.dispatch(&self.runner, session, &self.config.queues, &remote_dir, &stem)?;
        info!(document = %stem, "dispatched");
        Ok(())
    }
}

fn round_robin(documents: &[String], n: usize) -> Vec<Vec<String>> {
    let mut groups = vec![Vec::new(); n];
    for (i, d) in documents.iter().enumerate() {
        groups[i % n].push(d.clone());
    }
    groups
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlannedChunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub queue: String,
    pub empty: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentPlan {
    pub document: String,
    pub pages: usize,
    pub chunks: Vec<PlannedChunk>,
}

/// Which pages each queue would print, without touching the network.
pub fn plan(source_dir: &Path, documents: &[String], queues: &[OutputQueue]) -> Result<Vec<DocumentPlan>> {
    documents
        .iter()
        .map(|name| {
            let source = SourcePdf::open(source_dir, name)?;
            let doc = source.document;
            let chunks = partition(doc.total_pages, queues.len())
                .into_iter()
                .zip(queues)
                .enumerate()
                .map(|(index, (range, queue))| PlannedChunk {
                    index,
                    start: range.start,
                    end: range.end,
                    queue: queue.name(),
                    empty: range.is_empty(),
                })
                .collect();
            Ok(DocumentPlan {
                document: doc.name,
                pages: doc.total_pages,
                chunks,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues() -> Vec<OutputQueue> {
        OutputQueue::parse_list(&["psts-sx", "pstsb-sx", "pstsc-sx"]).unwrap()
    }

    fn docs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_normalizes_paths() {
        let c = RunConfig::new("/docs", "chunks", "~/par_temp", queues());
        assert_eq!(c.staging_dir, PathBuf::from("/docs/chunks"));
        assert_eq!(c.remote_dir, "par_temp");
    }

    #[test]
    fn validate_rejects_duplicates_and_empties() {
        let c = RunConfig::new("/docs", "chunks", "~/par_temp", queues());
        assert!(c.validate(&docs(&["a", "b"])).is_ok());
        assert!(c.validate(&docs(&["a", "a.pdf"])).is_err());
        assert!(c.validate(&[]).is_err());

        let no_queues = RunConfig::new("/docs", "chunks", "ws", Vec::new());
        assert!(no_queues.validate(&docs(&["a"])).is_err());

        let home = RunConfig::new("/docs", "chunks", "~", queues());
        assert!(home.validate(&docs(&["a"])).is_err());
    }

    #[test]
    fn validate_keeps_staging_inside_source() {
        let ok = RunConfig::new("/docs", "chunks/tmp", "ws", queues());
        assert!(ok.validate(&docs(&["a"])).is_ok());

        for bad in ["", ".", "..", "../chunks", "chunks/../..", "/tmp/chunks", "/docs"] {
            let c = RunConfig::new("/docs", bad, "ws", queues());
            assert!(
                matches!(c.validate(&docs(&["a"])), Err(ParprintError::Config(_))),
                "staging {bad:?} accepted"
            );
        }
    }

    #[test]
    fn round_robin_spreads_documents() {
        let g = round_robin(&docs(&["a", "b", "c", "d", "e"]), 2);
        assert_eq!(g, vec![docs(&["a", "c", "e"]), docs(&["b", "d"])]);
    }
}
