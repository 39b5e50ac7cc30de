pub mod mpsc;

#[cfg(test)]
pub mod mpsc_test;

use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReceiveTimeoutError {
    #[error("timed out waiting for message")]
    Timeout,
    #[error("channel closed")]
    Closed,
}

/// Channel receivers that can timeout when receiving messages
pub trait TimeoutReceiver<T> {
    /// Wait at most `timeout` for the next message
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<T, ReceiveTimeoutError>> + Send;

    /// Wait for the next message until the given deadline
    fn recv_until(
        &mut self,
        deadline: Instant,
    ) -> impl Future<Output = Result<T, ReceiveTimeoutError>> + Send;

    /// Take every message already queued without waiting and return the
    /// newest one, if any. Fails only if the channel is closed and empty.
    fn drain_latest(&mut self) -> Result<Option<T>, ReceiveTimeoutError>;
}
