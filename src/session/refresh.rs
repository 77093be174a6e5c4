use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::debug;

/// What a settled refresh hands to everyone waiting on it: the new access
/// token, or the failure message shared by all of them.
pub(crate) type RefreshOutcome = Result<String, String>;

/// Role handed to a caller entering the refresh path.
pub(crate) enum Ticket {
    /// No refresh was in flight; this caller must perform the exchange and
    /// `settle` it.
    Leader,
    /// A refresh is already in flight; await the shared outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Single-flight guard for the token refresh exchange. At most one exchange
/// is in flight process-wide at any instant; every other caller queues
/// behind it and is released in FIFO enqueue order when it settles. The
/// queue is transient: populated while an exchange runs, empty between
/// cycles.
pub(crate) struct RefreshCoordinator {
    inner: Mutex<CoordinatorInner>,
}

#[derive(Default)]
struct CoordinatorInner {
    in_flight: bool,
    next_seq: u64,
    waiters: VecDeque<Waiter>,
}

struct Waiter {
    seq: u64,
    tx: oneshot::Sender<RefreshOutcome>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        RefreshCoordinator {
            inner: Mutex::new(CoordinatorInner::default()),
        }
    }

    /// Check-and-set under a single lock acquisition: either the caller
    /// becomes the leader, or it is enqueued behind the in-flight exchange.
    pub(crate) fn begin(&self) -> Ticket {
        let mut inner = self.lock();
        if !inner.in_flight {
            inner.in_flight = true;
            return Ticket::Leader;
        }

        let (tx, rx) = oneshot::channel();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        debug!(seq, "refresh already in flight, queueing waiter");
        inner.waiters.push_back(Waiter { seq, tx });
        Ticket::Follower(rx)
    }

    /// Settle the in-flight exchange: release every waiter in FIFO order
    /// with the shared outcome and clear the in-flight flag.
    pub(crate) fn settle(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut inner = self.lock();
            inner.in_flight = false;
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            debug!(seq = waiter.seq, "releasing refresh waiter");
            // A waiter that gave up (dropped its receiver) is not an error.
            let _ = waiter.tx.send(outcome.clone());
        }
    }

    #[cfg(test)]
    fn queued_seqs(&self) -> Vec<u64> {
        self.lock().waiters.iter().map(|w| w.seq).collect()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        self.inner.lock().expect("refresh coordinator lock poisoned")
    }
}
