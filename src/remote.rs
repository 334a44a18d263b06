//! Observable remote data
//!
//! A `RemoteStore` holds the latest known state of a value that is loaded
//! from the daemon. Writers replace the whole value; readers either take a
//! snapshot or subscribe and wait for a condition.

use crate::Error;
use std::sync::Arc;
use tokio::sync::watch;

/// Transport state of a value fetched from a remote service
#[derive(Debug, Clone)]
pub enum RemoteData<T> {
    /// Nothing has been requested yet
    NotAsked,
    Loading,
    Success(T),
    /// The last request failed
    Error(Arc<Error>),
}

impl<T> RemoteData<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RemoteData::Loading)
    }

    /// The loaded value, if the last request succeeded
    pub fn data(&self) -> Option<&T> {
        match self {
            RemoteData::Success(data) => Some(data),
            _ => None,
        }
    }
}

/// Single-writer observable holding a [`RemoteData`]
pub struct RemoteStore<T> {
    tx: watch::Sender<RemoteData<T>>,
}

impl<T: Clone> RemoteStore<T> {
    /// Create a store in the `NotAsked` state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RemoteData::NotAsked);
        Self { tx }
    }

    pub fn loading(&self) {
        self.tx.send_replace(RemoteData::Loading);
    }

    pub fn success(&self, data: T) {
        self.tx.send_replace(RemoteData::Success(data));
    }

    pub fn error(&self, error: Arc<Error>) {
        self.tx.send_replace(RemoteData::Error(error));
    }

    /// Snapshot of the current state
    pub fn get(&self) -> RemoteData<T> {
        self.tx.borrow().clone()
    }

    /// The current value if the store holds a success, `None` otherwise
    pub fn unwrap(&self) -> Option<T> {
        self.tx.borrow().data().cloned()
    }

    /// Receiver that observes every subsequent write
    pub fn subscribe(&self) -> watch::Receiver<RemoteData<T>> {
        self.tx.subscribe()
    }

    /// Wait until `check` returns `Some` for the current state.
    ///
    /// The check runs against the current value first and then after every
    /// write. Returns `None` only if the store is dropped while waiting.
    pub async fn wait_until<R>(
        &self,
        mut check: impl FnMut(&RemoteData<T>) -> Option<R>,
    ) -> Option<R> {
        let mut rx = self.tx.subscribe();
        loop {
            let outcome = check(&*rx.borrow_and_update());
            if outcome.is_some() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl<T: Clone> Default for RemoteStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_not_asked() {
        let store: RemoteStore<u32> = RemoteStore::new();
        assert!(matches!(store.get(), RemoteData::NotAsked));
        assert_eq!(store.unwrap(), None);
    }

    #[test]
    fn writes_replace_state() {
        let store = RemoteStore::new();
        store.loading();
        assert!(store.get().is_loading());

        store.success(7u32);
        assert_eq!(store.unwrap(), Some(7));

        store.error(Arc::new(Error::WalletConnection));
        assert!(matches!(store.get(), RemoteData::Error(_)));
        assert_eq!(store.unwrap(), None);
    }

    #[tokio::test]
    async fn wait_until_resolves_on_current_value() {
        let store = RemoteStore::new();
        store.success(3u32);

        let value = store.wait_until(|data| data.data().copied()).await;
        assert_eq!(value, Some(3));
    }

    #[tokio::test]
    async fn wait_until_resolves_after_write() {
        let store = Arc::new(RemoteStore::new());
        store.loading();

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .wait_until(|data| data.data().filter(|v| **v > 1).copied())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.success(1u32);
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.success(2u32);

        assert_eq!(waiter.await.unwrap(), Some(2));
    }
}
