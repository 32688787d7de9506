//! Worker pool and cancellation primitives.
//!
//! Built on `threadpool` plus plain `std::sync::mpsc` channels rather than
//! an async runtime — nothing else in this crate's dependency graph needs
//! one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use threadpool::ThreadPool;

/// A cheaply-cloneable flag checked at every suspension point (HTTP GET,
/// file reads, directory walks, extractor loops).
#[derive(Clone, Debug)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> CancellationToken {
        CancellationToken::new()
    }
}

/// A bounded pool of worker threads. A pool of size 1 degrades to strictly
/// sequential processing, which the test suite relies on for deterministic
/// ordering.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(size: usize) -> WorkerPool {
        WorkerPool { pool: ThreadPool::new(size.max(1)) }
    }

    /// Runs `f` against every item in `items`, returning results in input
    /// order regardless of completion order. Checks `token` before
    /// submitting each item; already-submitted work still runs to
    /// completion or checks the token itself.
    pub fn map<T, R, F>(&self, items: Vec<T>, token: &CancellationToken, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let f = Arc::new(f);
        let mut submitted = 0usize;

        for (idx, item) in items.into_iter().enumerate() {
            if token.is_cancelled() {
                break;
            }
            let tx = tx.clone();
            let f = Arc::clone(&f);
            self.pool.execute(move || {
                let result = f(item);
                let _ = tx.send((idx, result));
            });
            submitted += 1;
        }
        drop(tx);

        let mut indexed: Vec<(usize, R)> = rx.iter().collect();
        indexed.sort_by_key(|(idx, _)| *idx);
        debug_assert!(indexed.len() <= submitted);
        indexed.into_iter().map(|(_, r)| r).collect()
    }
}
