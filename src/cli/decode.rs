use std::{error::Error, time::Duration};

use tabled::{
    settings::{Panel, Style},
    Table, Tabled,
};

use crate::{
    drivers::mapped_gamepad::{driver::Driver, event::WireEvent},
    input::source::spawn_reader,
    mapping::profiler::{byte_statistics, most_variable_byte, profile},
    sync::{ReceiveTimeoutError, TimeoutReceiver},
};

use super::{open_source, Context};

/// Longest wait for a single report while profiling
const PROFILE_READ_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Tabled)]
struct ByteRow {
    #[tabled(rename = "Byte")]
    index: usize,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Candidate")]
    candidate: String,
}

pub async fn handle_run(
    ctx: &Context,
    simulate: bool,
    device: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let layout = ctx.store.load_layout_or_default();
    let source = open_source(simulate, device.as_deref(), &layout)?;
    log::info!("Decoding reports from {}", source.name());

    let mut driver = Driver::new(layout, ctx.config.clone());
    let mut rx = spawn_reader(source);
    loop {
        tokio::select! {
            report = rx.recv() => {
                let Some(report) = report else {
                    log::info!("Report source closed");
                    break;
                };
                for event in driver.handle_input_report(&report) {
                    let wire = WireEvent::from(&event);
                    println!("{}", serde_json::to_string(&wire)?);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

pub async fn handle_profile(
    ctx: &Context,
    simulate: bool,
    device: Option<String>,
    reports: usize,
) -> Result<(), Box<dyn Error>> {
    let layout = ctx.store.load_layout_or_default();
    let source = open_source(simulate, device.as_deref(), &layout)?;
    log::info!("Sampling {reports} report(s) from {}", source.name());

    let mut rx = spawn_reader(source);
    let mut window = Vec::with_capacity(reports);
    while window.len() < reports {
        match rx.recv_timeout(PROFILE_READ_TIMEOUT).await {
            Ok(report) if report.is_empty() => continue,
            Ok(report) => window.push(report),
            Err(ReceiveTimeoutError::Timeout) => {
                log::warn!("No report within {PROFILE_READ_TIMEOUT:?}, stopping early");
                break;
            }
            Err(ReceiveTimeoutError::Closed) => break,
        }
    }
    if window.is_empty() {
        return Err("No reports received".into());
    }

    let sensors = profile(&window, &ctx.config.profiler);
    let rows: Vec<ByteRow> = byte_statistics(&window)
        .into_iter()
        .enumerate()
        .map(|(index, stats)| {
            let candidate = if sensors.variable_candidates.contains(&index) {
                "variable"
            } else if sensors.steady_candidates.contains(&index) {
                "steady"
            } else {
                ""
            };
            ByteRow {
                index,
                mean: format!("{:.2}", stats.mean),
                variance: format!("{:.2}", stats.variance),
                candidate: candidate.to_string(),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header(format!("Byte Profile ({} reports)", window.len())));
    println!("{table}");
    if let Some(index) = most_variable_byte(&window) {
        println!("Most variable byte: {index}");
    }

    Ok(())
}
