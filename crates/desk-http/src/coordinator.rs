//! Single-flight token refresh.
//!
//! The first caller to hit an expired token becomes the leader and performs
//! the refresh. Everyone arriving while it runs is queued and receives the
//! leader's outcome. The in-flight flag and the queue share one lock, so the
//! queue is empty whenever no refresh is running.

use crate::error::{HttpError, HttpResult};
use crate::token::AccessToken;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

type Waiter = oneshot::Sender<HttpResult<AccessToken>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// Coordinates concurrent refresh attempts for one client.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Outcome of [`RefreshCoordinator::acquire`].
pub enum RefreshRole<'a> {
    /// Caller must perform the refresh and settle the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is already running; await its outcome.
    Follower(oneshot::Receiver<HttpResult<AccessToken>>),
}

/// Held by the refresh leader. Dropping it unsettled rejects the queue.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Become the leader, or join the queue behind the running refresh.
    pub fn acquire(&self) -> RefreshRole<'_> {
        let mut state = self.state.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(queued = state.waiters.len(), "Request queued behind refresh");
            RefreshRole::Follower(rx)
        } else {
            state.in_flight = true;
            RefreshRole::Leader(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Number of queued requests still waiting on the refresh.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .waiters
            .iter()
            .filter(|w| !w.is_closed())
            .count()
    }

    fn settle(&self, outcome: HttpResult<AccessToken>) {
        let mut state = self.state.lock();
        state.in_flight = false;
        let waiters = std::mem::take(&mut state.waiters);
        debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Refresh settled"
        );
        for waiter in waiters {
            // Receiver gone means the request was cancelled while queued.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl RefreshLease<'_> {
    /// Clear the in-flight flag and hand `outcome` to every queued request.
    pub fn settle(mut self, outcome: HttpResult<AccessToken>) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(Err(HttpError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(coordinator: &RefreshCoordinator) -> RefreshLease<'_> {
        match coordinator.acquire() {
            RefreshRole::Leader(lease) => lease,
            RefreshRole::Follower(_) => panic!("expected leader"),
        }
    }

    fn follower(
        coordinator: &RefreshCoordinator,
    ) -> oneshot::Receiver<HttpResult<AccessToken>> {
        match coordinator.acquire() {
            RefreshRole::Follower(rx) => rx,
            RefreshRole::Leader(_) => panic!("expected follower"),
        }
    }

    #[tokio::test]
    async fn test_single_leader_and_fan_out() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        assert!(coordinator.is_refreshing());

        let a = follower(&coordinator);
        let b = follower(&coordinator);
        assert_eq!(coordinator.pending(), 2);

        lease.settle(Ok(AccessToken::new("fresh")));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.pending(), 0);

        assert_eq!(a.await.unwrap().unwrap().as_str(), "fresh");
        assert_eq!(b.await.unwrap().unwrap().as_str(), "fresh");
    }

    #[tokio::test]
    async fn test_failure_rejects_all_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let a = follower(&coordinator);

        let error = HttpError::status(401, "/api/auth/refresh", "expired");
        lease.settle(Err(error.clone()));

        assert_eq!(a.await.unwrap().unwrap_err(), error);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_lease_rejects_with_cancelled() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let a = follower(&coordinator);

        drop(lease);

        assert_eq!(a.await.unwrap().unwrap_err(), HttpError::Cancelled);
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn test_closed_waiters_not_counted() {
        let coordinator = RefreshCoordinator::new();
        let _lease = leader(&coordinator);
        let a = follower(&coordinator);
        let _b = follower(&coordinator);
        drop(a);
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn test_next_refresh_gets_new_leader() {
        let coordinator = RefreshCoordinator::new();
        leader(&coordinator).settle(Ok(AccessToken::new("one")));
        let lease = leader(&coordinator);
        lease.settle(Ok(AccessToken::new("two")));
    }
}
