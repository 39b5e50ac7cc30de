pub mod hidraw;
pub mod simulator;

#[cfg(test)]
pub mod simulator_test;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

/// Size of the report buffer between a reader thread and its consumer
pub const BUFFER_SIZE: usize = 256;

/// How long a reader thread blocks on the device before checking whether its
/// consumer went away
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Possible errors reading from a report source
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No compatible device found")]
    NotFound,
    #[error("Device error: {0}")]
    Device(String),
    #[error("Report source is closed")]
    Closed,
}

/// A [ReportSource] produces raw input reports, one byte buffer per report.
/// Implementations block for at most the given timeout and return `Ok(None)`
/// if no report arrived in time.
pub trait ReportSource: Send {
    /// Human readable name of the source
    fn name(&self) -> String;

    /// Read the next report
    fn read_report(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, InputError>;
}

impl<S: ReportSource + ?Sized> ReportSource for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn read_report(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, InputError> {
        (**self).read_report(timeout)
    }
}

/// Read reports from the given source on a blocking thread and forward them
/// over a channel. The thread stops when the receiver is dropped or the source
/// fails.
pub fn spawn_reader<S>(mut source: S) -> mpsc::Receiver<Vec<u8>>
where
    S: ReportSource + 'static,
{
    let (tx, rx) = mpsc::channel(BUFFER_SIZE);
    let name = source.name();
    tokio::task::spawn_blocking(move || {
        log::debug!("Started reading reports from {name}");
        while !tx.is_closed() {
            let report = match source.read_report(READ_TIMEOUT) {
                Ok(Some(report)) => report,
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Failed to read report from {name}: {e}");
                    break;
                }
            };
            if tx.blocking_send(report).is_err() {
                break;
            }
        }
        log::debug!("Stopped reading reports from {name}");
    });

    rx
}
