//! Async worker (spec.md §4.5): one consumer thread, a bounded FIFO queue,
//! and a completion callback invoked off the main thread. Modelled on
//! `crossbeam_channel::bounded` + `try_send` rather than a hand-rolled
//! mutex + condvar — spec.md §4.5's "singly-linked FIFO queue guarded by
//! one mutex + one condition variable" is the *contract*; a bounded
//! channel already gives submission-order delivery and a natural
//! `try_send` → `Full` → `resource_exhausted` mapping.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::context::GitStatus;
use crate::error::{PromptError, PromptResult};

/// spec.md §4.5 lifecycle: `created → running → shutdown_requested →
/// joined → destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    ShutdownRequested,
    Joined,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    GitStatus,
}

pub struct AsyncRequest {
    pub id: u64,
    pub kind: RequestKind,
    pub cwd: PathBuf,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    SystemCall,
}

#[derive(Debug, Clone)]
pub enum ResponsePayload {
    GitStatus(GitStatus),
    None,
}

#[derive(Debug, Clone)]
pub struct AsyncResponse {
    pub id: u64,
    pub result_code: ResultCode,
    pub payload: ResponsePayload,
}

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub total_requests: u64,
    pub total_completed: u64,
    pub total_timeouts: u64,
}

type CompletionCallback = Box<dyn Fn(AsyncResponse) + Send + 'static>;

struct Shared {
    stats: Mutex<WorkerStats>,
    next_id: AtomicU64,
}

/// A worker instance. `submit` is legal only while [`WorkerState::Running`];
/// `destroy` (via `Drop`) frees queued-but-unprocessed requests.
pub struct Worker {
    sender: Sender<(AsyncRequest, CompletionCallback)>,
    shared: Arc<Shared>,
    state: WorkerState,
    handle: Option<JoinHandle<()>>,
}

const DEFAULT_QUEUE_DEPTH: usize = 64;

impl Worker {
    pub fn start() -> Self {
        Self::with_queue_depth(DEFAULT_QUEUE_DEPTH)
    }

    pub fn with_queue_depth(depth: usize) -> Self {
        let (sender, receiver): (Sender<(AsyncRequest, CompletionCallback)>, Receiver<_>) =
            bounded(depth);
        let shared = Arc::new(Shared { stats: Mutex::new(WorkerStats::default()), next_id: AtomicU64::new(1) });
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || run_loop(receiver, worker_shared));
        Worker { sender, shared, state: WorkerState::Running, handle: Some(handle) }
    }

    /// Submit a git-status probe. Returns the assigned request ID.
    pub fn submit_git_status(
        &self,
        cwd: PathBuf,
        timeout_ms: u64,
        on_complete: impl Fn(AsyncResponse) + Send + 'static,
    ) -> PromptResult<u64> {
        if self.state != WorkerState::Running {
            return Err(PromptError::InvalidState);
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let request = AsyncRequest { id, kind: RequestKind::GitStatus, cwd, timeout_ms };
        match self.sender.try_send((request, Box::new(on_complete))) {
            Ok(()) => {
                self.shared.stats.lock().unwrap().total_requests += 1;
                Ok(id)
            }
            Err(TrySendError::Full(_)) => Err(PromptError::ResourceExhausted),
            Err(TrySendError::Disconnected(_)) => Err(PromptError::InvalidState),
        }
    }

    /// Whether the consumer thread is still accepting work.
    pub fn is_running(&self) -> bool {
        self.state == WorkerState::Running
    }

    /// Requests submitted but not yet dispatched.
    pub fn pending_count(&self) -> usize {
        self.sender.len()
    }

    pub fn stats(&self) -> WorkerStats {
        let guard = self.shared.stats.lock().unwrap();
        WorkerStats {
            total_requests: guard.total_requests,
            total_completed: guard.total_completed,
            total_timeouts: guard.total_timeouts,
        }
    }

    /// Request shutdown and join the consumer thread. Queued-but-unprocessed
    /// requests are dropped without their callback firing (spec.md §4.5).
    pub fn shutdown(&mut self) {
        if self.state == WorkerState::Destroyed || self.state == WorkerState::Joined {
            return;
        }
        self.state = WorkerState::ShutdownRequested;
        // Dropping the sender closes the channel; the consumer thread's
        // `recv()` returns `Err` once drained, ending its loop.
        let (dummy_sender, _) = bounded(0);
        let old_sender = std::mem::replace(&mut self.sender, dummy_sender);
        drop(old_sender);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.state = WorkerState::Joined;
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
        self.state = WorkerState::Destroyed;
    }
}

fn run_loop(receiver: Receiver<(AsyncRequest, CompletionCallback)>, shared: Arc<Shared>) {
    while let Ok((request, callback)) = receiver.recv() {
        let response = dispatch(&request, &shared);
        callback(response);
    }
}

fn dispatch(request: &AsyncRequest, shared: &Shared) -> AsyncResponse {
    let (response, timed_out) = match request.kind {
        RequestKind::GitStatus => {
            let outcome = crate::git_status::probe(&request.cwd, Some(request.timeout_ms));
            let result_code =
                if outcome.timed_out { ResultCode::SystemCall } else { ResultCode::Success };
            let response = AsyncResponse {
                id: request.id,
                result_code,
                payload: ResponsePayload::GitStatus(outcome.status),
            };
            (response, outcome.timed_out)
        }
    };
    let mut stats = shared.stats.lock().unwrap();
    stats.total_completed += 1;
    if timed_out {
        stats.total_timeouts += 1;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn submit_dispatches_and_invokes_callback_exactly_once() {
        let worker = Worker::start();
        let (tx, rx) = mpsc::channel();
        worker
            .submit_git_status(std::env::temp_dir(), 2_000, move |resp| {
                tx.send(resp).unwrap();
            })
            .unwrap();
        let response = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(response.result_code, ResultCode::Success);
    }

    #[test]
    fn stats_total_requests_and_completed_stay_consistent() {
        let worker = Worker::start();
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            let tx = tx.clone();
            worker
                .submit_git_status(std::env::temp_dir(), 2_000, move |resp| {
                    tx.send(resp).unwrap();
                })
                .unwrap();
        }
        for _ in 0..3 {
            rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        }
        let stats = worker.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.total_completed, 3);
    }

    #[test]
    fn git_status_timeout_is_reported_as_system_call_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::process::Command::new("git")
            .arg("init")
            .arg("-q")
            .current_dir(dir.path())
            .output()
            .unwrap();
        let worker = Worker::start();
        let (tx, rx) = mpsc::channel();
        worker
            .submit_git_status(dir.path().to_path_buf(), 0, move |resp| {
                tx.send(resp).unwrap();
            })
            .unwrap();
        let response = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(response.result_code, ResultCode::SystemCall);
        assert_eq!(worker.stats().total_timeouts, 1);
    }

    #[test]
    fn submit_after_shutdown_is_invalid_state() {
        let mut worker = Worker::start();
        worker.shutdown();
        let result = worker.submit_git_status(std::env::temp_dir(), 1_000, |_| {});
        assert_eq!(result, Err(PromptError::InvalidState));
    }

    #[test]
    fn is_running_reflects_lifecycle() {
        let mut worker = Worker::start();
        assert!(worker.is_running());
        worker.shutdown();
        assert!(!worker.is_running());
    }

    #[test]
    fn pending_count_drains_as_requests_complete() {
        let worker = Worker::start();
        let (tx, rx) = mpsc::channel();
        worker
            .submit_git_status(std::env::temp_dir(), 2_000, move |resp| {
                tx.send(resp).unwrap();
            })
            .unwrap();
        rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(worker.pending_count(), 0);
    }
}
