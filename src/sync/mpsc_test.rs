use std::{error::Error, time::Duration};

use tokio::{sync::mpsc, time::Instant};

use crate::sync::{ReceiveTimeoutError, TimeoutReceiver};

#[tokio::test]
async fn test_recv_timeout() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::channel::<u8>(4);

    let result = rx.recv_timeout(Duration::from_millis(10)).await;
    assert_eq!(result, Err(ReceiveTimeoutError::Timeout));

    tx.send(1).await?;
    assert_eq!(rx.recv_timeout(Duration::from_millis(10)).await, Ok(1));

    drop(tx);
    let result = rx.recv_until(Instant::now() + Duration::from_millis(10)).await;
    assert_eq!(result, Err(ReceiveTimeoutError::Closed));

    Ok(())
}

#[tokio::test]
async fn test_drain_latest() -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::channel::<u8>(4);
    assert_eq!(rx.drain_latest(), Ok(None));

    for value in [1, 2, 3] {
        tx.send(value).await?;
    }
    assert_eq!(rx.drain_latest(), Ok(Some(3)));

    tx.send(4).await?;
    drop(tx);
    assert_eq!(rx.drain_latest(), Ok(Some(4)));
    assert_eq!(rx.drain_latest(), Err(ReceiveTimeoutError::Closed));

    Ok(())
}
