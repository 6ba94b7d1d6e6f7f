use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use super::entities::FavoriteEntry;
use crate::shared::errors::{AppError, AppResult};

/// One emission of a favorites listener: the full list, or an error
pub type SnapshotResult = AppResult<Vec<FavoriteEntry>>;

const SNAPSHOT_BUFFER: usize = 16;

/// Live sequence of favorites snapshots for one user.
///
/// Each item replaces the previous one. Errors the listener recovers from
/// are delivered as items and the sequence goes on; it ends after an
/// unrecoverable error, on `cancel()`, or when the subscription is dropped.
pub struct FavoritesSubscription {
    receiver: mpsc::Receiver<SnapshotResult>,
    cancel: CancellationToken,
}

/// Producer half handed to the listener task
pub struct SnapshotSink {
    sender: mpsc::Sender<SnapshotResult>,
    cancel: CancellationToken,
}

impl FavoritesSubscription {
    pub fn channel() -> (SnapshotSink, FavoritesSubscription) {
        let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
        let cancel = CancellationToken::new();
        (
            SnapshotSink {
                sender,
                cancel: cancel.clone(),
            },
            FavoritesSubscription { receiver, cancel },
        )
    }

    /// Next snapshot, or `None` once the listener has stopped
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            item = self.receiver.recv() => item,
        }
    }

    /// Stop the listener; no further snapshots are delivered
    pub fn cancel(&self) {
        log::debug!("Favorites subscription cancelled");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token observed by the listener task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for FavoritesSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for FavoritesSubscription {
    type Item = SnapshotResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl SnapshotSink {
    /// Deliver a snapshot. Returns false once the subscriber is gone.
    pub async fn emit(&self, snapshot: Vec<FavoriteEntry>) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.sender.send(Ok(snapshot)).await.is_ok()
    }

    /// Deliver an error the listener will recover from. Returns false once the subscriber is gone.
    pub async fn report(&self, error: AppError) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.sender.send(Err(error)).await.is_ok()
    }

    /// Deliver the terminal error and stop
    pub async fn fail(self, error: AppError) {
        if !self.cancel.is_cancelled() {
            let _ = self.sender.send(Err(error)).await;
        }
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}
