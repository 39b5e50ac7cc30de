use std::time::Duration;

use tokio::{
    sync::mpsc::{error::TryRecvError, Receiver},
    time::{timeout, timeout_at, Instant},
};

use super::{ReceiveTimeoutError, TimeoutReceiver};

impl<T> TimeoutReceiver<T> for Receiver<T>
where
    T: Send + Sync,
{
    async fn recv_timeout(&mut self, duration: Duration) -> Result<T, ReceiveTimeoutError> {
        match timeout(duration, self.recv()).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(ReceiveTimeoutError::Closed),
            Err(_) => Err(ReceiveTimeoutError::Timeout),
        }
    }

    async fn recv_until(&mut self, deadline: Instant) -> Result<T, ReceiveTimeoutError> {
        match timeout_at(deadline, self.recv()).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(ReceiveTimeoutError::Closed),
            Err(_) => Err(ReceiveTimeoutError::Timeout),
        }
    }

    fn drain_latest(&mut self) -> Result<Option<T>, ReceiveTimeoutError> {
        let mut latest = None;
        loop {
            match self.try_recv() {
                Ok(value) => latest = Some(value),
                Err(TryRecvError::Empty) => return Ok(latest),
                Err(TryRecvError::Disconnected) => {
                    return match latest {
                        Some(value) => Ok(Some(value)),
                        None => Err(ReceiveTimeoutError::Closed),
                    }
                }
            }
        }
    }
}
