//! Superseding requests
//!
//! Views re-issue a request every time their filter changes. A newer request
//! for the same resource must invalidate the older one so a slow, stale
//! response can never overwrite fresher state. Each request gets a generation
//! number and a cancellation token; starting a new request cancels the
//! previous token, and results are only committed while their generation is
//! still the current one.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RegistryError;

#[derive(Debug)]
struct RequestState {
    generation: u64,
    token: CancellationToken,
}

/// Guards one logical resource (e.g. "the extension list")
#[derive(Debug)]
pub struct SupersedingRequests {
    state: Mutex<RequestState>,
}

/// Handle on one issued request
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `request` until it finishes or this ticket is superseded.
    ///
    /// A superseded request is dropped, which aborts any HTTP call inside it.
    pub async fn guard<F, T>(&self, request: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(generation = self.generation, "Request superseded");
                Err(RegistryError::Superseded)
            }
            result = request => result,
        }
    }
}

impl Default for SupersedingRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl SupersedingRequests {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RequestState {
                generation: 0,
                token: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RequestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Start a new request, cancelling the one in flight
    pub fn begin(&self) -> RequestTicket {
        let mut state = self.lock();
        state.token.cancel();
        state.generation += 1;
        state.token = CancellationToken::new();
        RequestTicket {
            generation: state.generation,
            token: state.token.clone(),
        }
    }

    /// Cancel the request in flight without starting another one
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.token.cancel();
        state.generation += 1;
    }

    /// Run `apply` if `ticket` is still the latest request.
    ///
    /// The check and `apply` happen under the same lock, so no newer request
    /// can start in between.
    pub fn commit<R>(&self, ticket: &RequestTicket, apply: impl FnOnce() -> R) -> Result<R, RegistryError> {
        let state = self.lock();
        if state.generation != ticket.generation || ticket.token.is_cancelled() {
            return Err(RegistryError::Superseded);
        }
        Ok(apply())
    }

    /// Issue `request` as the newest one and return its result unless a newer
    /// request was started before it finished.
    pub async fn run<F, T>(&self, request: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        let ticket = self.begin();
        let value = ticket.guard(request).await?;
        self.commit(&ticket, || value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    async fn wait_for(rx: oneshot::Receiver<&'static str>) -> Result<&'static str, RegistryError> {
        Ok(rx.await.unwrap_or("sender dropped"))
    }

    #[tokio::test]
    async fn test_newer_request_rejects_older_one() {
        let requests = Arc::new(SupersedingRequests::new());
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();

        let r = requests.clone();
        let a = tokio::spawn(async move { r.run(wait_for(rx_a)).await });
        while requests.generation() < 1 {
            tokio::task::yield_now().await;
        }

        let r = requests.clone();
        let b = tokio::spawn(async move { r.run(wait_for(rx_b)).await });
        while requests.generation() < 2 {
            tokio::task::yield_now().await;
        }

        // B resolves first, then A
        tx_b.send("B").unwrap();
        let _ = tx_a.send("A");

        assert!(a.await.unwrap().unwrap_err().is_superseded());
        assert_eq!(b.await.unwrap().unwrap(), "B");
    }

    #[tokio::test]
    async fn test_older_request_resolving_late_is_rejected() {
        let requests = Arc::new(SupersedingRequests::new());
        let (tx_a, rx_a) = oneshot::channel();

        let r = requests.clone();
        let a = tokio::spawn(async move { r.run(wait_for(rx_a)).await });
        while requests.generation() < 1 {
            tokio::task::yield_now().await;
        }

        let b = requests.run(async { Ok("B") }).await.unwrap();
        assert_eq!(b, "B");

        let _ = tx_a.send("A");
        assert!(a.await.unwrap().unwrap_err().is_superseded());
    }

    #[test]
    fn test_commit_checks_generation() {
        let requests = SupersedingRequests::new();
        let first = requests.begin();
        assert_eq!(requests.commit(&first, || 1).unwrap(), 1);

        let second = requests.begin();
        assert!(first.is_cancelled());
        assert!(requests.commit(&first, || 1).is_err());
        assert_eq!(requests.commit(&second, || 2).unwrap(), 2);

        requests.cancel();
        assert!(second.is_cancelled());
        assert!(requests.commit(&second, || 2).is_err());
    }
}
