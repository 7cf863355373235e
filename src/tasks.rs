//! Background work for the dashboard: fetches run on worker threads and hand
//! their result back over a channel the view polls between frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// A result that will arrive later. Dropping it abandons the work: the worker
/// finishes but its send fails and the value is thrown away.
pub struct Pending<T> {
    generation: u64,
    rx: Receiver<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Poll<T> {
    Waiting,
    Done(T),
    /// The worker went away without answering (it panicked).
    Lost,
}

pub fn spawn<T, F>(generation: u64, work: F) -> Pending<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let value = work();
        if tx.send(value).is_err() {
            tracing::debug!(generation, "result arrived after its view moved on");
        }
    });
    Pending { generation, rx }
}

impl<T> Pending<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn poll(&self) -> Poll<T> {
        match self.rx.try_recv() {
            Ok(value) => Poll::Done(value),
            Err(TryRecvError::Empty) => Poll::Waiting,
            Err(TryRecvError::Disconnected) => Poll::Lost,
        }
    }

    /// Block until the worker answers.
    #[cfg(test)]
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Export guard
// ---------------------------------------------------------------------------

/// Busy flag for exports: at most one permit exists at a time.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one export; releases the guard when dropped.
#[derive(Debug)]
pub struct ExportPermit {
    busy: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<ExportPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_spawn_delivers_result() {
        let pending = spawn(3, || 40 + 2);
        assert_eq!(pending.generation(), 3);
        assert_eq!(pending.wait(), Some(42));
    }

    #[test]
    fn test_poll_eventually_done() {
        let pending = spawn(1, || "ok");
        let mut result = Poll::Waiting;
        for _ in 0..200 {
            result = pending.poll();
            if result != Poll::Waiting {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(result, Poll::Done("ok"));
    }

    #[test]
    fn test_dropped_pending_does_not_block_worker() {
        let (done_tx, done_rx) = mpsc::channel();
        let pending = spawn(1, move || {
            thread::sleep(Duration::from_millis(20));
            done_tx.send(()).unwrap();
            7
        });
        drop(pending);
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let guard = ExportGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_double_export_never_runs_concurrently() {
        let guard = ExportGuard::new();
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let running = Arc::clone(&running);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..20 {
                        if let Some(_permit) = guard.try_acquire() {
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            max_seen.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(1));
                            running.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
