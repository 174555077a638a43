//! Polled async fetch with explicit busy state.
//!
//! A `Fetch<T>` owns the fetching closure and a pending receiver; views
//! poll it on every tick. The state machine doubles as the busy
//! indicator the UI shows per network call: `Busy` from the moment a
//! request starts until its completion is observed, on the success and
//! the failure path alike. Restarting drops the pending receiver, so an
//! abandoned response can never overwrite a newer one
//! (last-response-wins).

use futures::future::BoxFuture;
use tokio::sync::oneshot;

/// Where a fetch currently stands.
#[derive(Debug, Clone)]
pub enum FetchState<T> {
  /// Never started.
  Idle,
  /// A request is in flight; the UI shows its busy marker.
  Busy,
  /// Last request completed with data.
  Ready(T),
  /// Last request failed; the message is what the UI surfaces.
  Failed(String),
}

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

pub struct Fetch<T> {
  state: FetchState<T>,
  fetcher: FetcherFn<T>,
  pending: Option<oneshot::Receiver<Result<T, String>>>,
}

impl<T: Send + 'static> Fetch<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: FetchState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: None,
    }
  }

  /// Create and immediately start.
  pub fn spawn<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut fetch = Self::new(fetcher);
    fetch.start();
    fetch
  }

  /// Start a request unless one is already in flight.
  pub fn start(&mut self) {
    if matches!(self.state, FetchState::Busy) {
      return;
    }
    self.launch();
  }

  /// Start a request, abandoning any in-flight one.
  pub fn restart(&mut self) {
    self.pending = None;
    self.launch();
  }

  fn launch(&mut self) {
    let (tx, rx) = oneshot::channel();
    self.pending = Some(rx);
    self.state = FetchState::Busy;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      // Send fails only when the fetch was restarted or dropped.
      let _ = tx.send(future.await);
    });
  }

  /// Observe a pending completion. Returns `true` when the state
  /// changed; call on every tick.
  pub fn poll(&mut self) -> bool {
    let Some(pending) = &mut self.pending else {
      return false;
    };
    match pending.try_recv() {
      Ok(Ok(data)) => {
        self.state = FetchState::Ready(data);
        self.pending = None;
        true
      }
      Ok(Err(error)) => {
        self.state = FetchState::Failed(error);
        self.pending = None;
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.state = FetchState::Failed("request abandoned".to_string());
        self.pending = None;
        true
      }
    }
  }

  pub fn state(&self) -> &FetchState<T> {
    &self.state
  }

  pub fn is_busy(&self) -> bool {
    matches!(self.state, FetchState::Busy)
  }

  pub fn data(&self) -> Option<&T> {
    match &self.state {
      FetchState::Ready(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match &self.state {
      FetchState::Failed(error) => Some(error),
      _ => None,
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Fetch<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Fetch")
      .field("state", &self.state)
      .field("pending", &self.pending.is_some())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_fetch_ready() {
    let mut fetch = Fetch::spawn(|| async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(fetch.is_busy());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(fetch.poll());
    assert_eq!(fetch.data(), Some(&vec![1, 2, 3]));
    assert!(!fetch.is_busy());
  }

  #[tokio::test]
  async fn test_fetch_failed_clears_busy() {
    let mut fetch: Fetch<i32> = Fetch::spawn(|| async { Err("boom".to_string()) });
    assert!(fetch.is_busy());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(fetch.poll());
    assert!(!fetch.is_busy());
    assert_eq!(fetch.error(), Some("boom"));
  }

  #[tokio::test]
  async fn test_start_while_busy_is_noop() {
    let mut fetch = Fetch::spawn(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });
    fetch.start();
    assert!(fetch.is_busy());
  }

  #[tokio::test]
  async fn test_restart_abandons_pending() {
    let counter = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let counter_for_fetch = counter.clone();

    let mut fetch = Fetch::spawn(move || {
      let counter = counter_for_fetch.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
      }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    fetch.restart();
    tokio::time::sleep(Duration::from_millis(100)).await;

    fetch.poll();
    // Only the second request's completion is observable.
    assert_eq!(fetch.data(), Some(&1));
  }
}
