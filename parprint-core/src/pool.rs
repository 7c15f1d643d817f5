// parprint_core/src/pool.rs
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{ParprintError, Result};
use crate::remote::session::RemoteSession;

/// Opens one new session per call. Called from several threads at once.
pub trait SessionFactory: Sync {
    type Session: RemoteSession;

    fn connect(&self) -> Result<Self::Session>;
}

impl<S, F> SessionFactory for F
where
    S: RemoteSession,
    F: Fn() -> Result<S> + Sync,
{
    type Session = S;

    fn connect(&self) -> Result<S> {
        self()
    }
}

/// Sessions established up front so handshakes overlap instead of queueing.
///
/// Dropping the pool closes every session it still holds.
pub struct SessionPool<S: RemoteSession> {
    sessions: Vec<S>,
}

impl<S: RemoteSession> SessionPool<S> {
    /// Open `min(desired, hard_cap)` sessions using `width` worker threads.
    ///
    /// All or nothing: if any handshake fails, the sessions that did connect
    /// are closed and the first error is returned.
    pub fn acquire<F>(factory: &F, desired: usize, hard_cap: usize, width: usize) -> Result<Self>
    where
        F: SessionFactory<Session = S>,
    {
        let count = desired.min(hard_cap);
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(width.max(1))
            .build()
            .map_err(|e| ParprintError::Pool(e.to_string()))?;

        let start = Instant::now();
        let results: Vec<Result<S>> =
            workers.install(|| (0..count).into_par_iter().map(|_| factory.connect()).collect());

        let mut sessions = Vec::with_capacity(count);
        let mut first_err = None;
        for r in results {
            match r {
                Ok(s) => sessions.push(s),
                Err(e) if first_err.is_none() => first_err = Some(e),
                Err(e) => warn!(error = %e, "additional handshake failure"),
            }
        }
        if let Some(e) = first_err {
            close_all(&mut sessions);
            return Err(e);
        }

        info!(
            sessions = sessions.len(),
            width,
            elapsed = ?start.elapsed(),
            "session pool ready"
        );
        Ok(Self { sessions })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions_mut(&mut self) -> &mut [S] {
        &mut self.sessions
    }

    /// Hand the sessions to the caller, who then owns closing them.
    pub fn into_sessions(mut self) -> Vec<S> {
        std::mem::take(&mut self.sessions)
    }

    /// Close every session, reporting the first failure.
    pub fn close(mut self) -> Result<()> {
        let mut first_err = None;
        for s in self.sessions.iter_mut() {
            if let Err(e) = s.close() {
                first_err.get_or_insert(e);
            }
        }
        self.sessions.clear();
        first_err.map_or(Ok(()), Err)
    }
}

impl<S: RemoteSession> Drop for SessionPool<S> {
    fn drop(&mut self) {
        close_all(&mut self.sessions);
    }
}

fn close_all<S: RemoteSession>(sessions: &mut Vec<S>) {
    for mut s in sessions.drain(..) {
        if let Err(e) = s.close() {
            warn!(error = %e, "failed to close session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::recording::{RecordedCall, RecordingSession, Transcript};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn closes(t: &Transcript) -> usize {
        t.calls().iter().filter(|c| **c == RecordedCall::Close).count()
    }

    #[test]
    fn acquires_requested_count() {
        let t = Transcript::new();
        let made = AtomicUsize::new(0);
        let factory = || -> Result<RecordingSession> {
            made.fetch_add(1, Ordering::SeqCst);
            Ok(RecordingSession::new(t.clone()))
        };
        let pool = SessionPool::acquire(&factory, 5, 200, 5).unwrap();
        assert_eq!(pool.len(), 5);
        assert_eq!(made.load(Ordering::SeqCst), 5);
        drop(pool);
        assert_eq!(closes(&t), 5);
    }

    #[test]
    fn hard_cap_bounds_count() {
        let t = Transcript::new();
        let factory = || -> Result<RecordingSession> { Ok(RecordingSession::new(t.clone())) };
        let pool = SessionPool::acquire(&factory, 12, 4, 2).unwrap();
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn one_failed_handshake_fails_all() {
        let t = Transcript::new();
        let attempt = AtomicUsize::new(0);
        let factory = || -> Result<RecordingSession> {
            if attempt.fetch_add(1, Ordering::SeqCst) == 2 {
                Err(ParprintError::Auth {
                    user: "u".into(),
                    host: "h".into(),
                })
            } else {
                Ok(RecordingSession::new(t.clone()))
            }
        };
        let err = SessionPool::acquire(&factory, 5, 200, 5).err().unwrap();
        assert!(matches!(err, ParprintError::Auth { .. }));
        // the four that connected were closed again
        assert_eq!(closes(&t), 4);
    }

    #[test]
    fn into_sessions_transfers_ownership() {
        let t = Transcript::new();
        let factory = || -> Result<RecordingSession> { Ok(RecordingSession::new(t.clone())) };
        let sessions = SessionPool::acquire(&factory, 3, 200, 1).unwrap().into_sessions();
        assert_eq!(sessions.len(), 3);
        assert_eq!(closes(&t), 0);
    }

    #[test]
    fn explicit_close() {
        let t = Transcript::new();
        let factory = || -> Result<RecordingSession> { Ok(RecordingSession::new(t.clone())) };
        SessionPool::acquire(&factory, 2, 200, 2).unwrap().close().unwrap();
        assert_eq!(closes(&t), 2);
    }
}
