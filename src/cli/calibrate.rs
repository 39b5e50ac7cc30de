use std::{error::Error, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    calibration::{
        collect::{collect_samples, record_pairs, CollectRequest},
        session::CalibrationSession,
        CalibrationProgress, ControlKind, PersistOutcome, AXES, BUTTONS, DPAD_DIRECTIONS,
    },
    input::source::{simulator::Simulator, spawn_reader, BUFFER_SIZE},
    mapping::diff::Diff,
};

use super::{open_device, Context};

/// Delay between a prompt and the simulated actuation
const SIMULATED_REACTION: Duration = Duration::from_millis(50);

pub async fn handle_calibrate(
    ctx: &Context,
    simulate: bool,
    timeout: u64,
    trials: usize,
    no_save: bool,
) -> Result<(), Box<dyn Error>> {
    let layout = ctx.store.load_layout_or_default();
    let timeout = Duration::from_secs(timeout);

    // A simulated controller only reacts when prompted, so its reports are
    // fed straight into the session.
    let (simulator, sim_tx, rx) = if simulate {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        (Some(Simulator::new(layout.clone())), Some(tx), rx)
    } else {
        let source = open_device(None)?;
        println!("Calibrating {}", source.name());
        (None, None, spawn_reader(source))
    };

    let (progress_tx, progress_rx) = mpsc::channel(16);
    let printer = spawn_progress_printer(progress_rx);
    let mut session = CalibrationSession::new(rx).with_progress(progress_tx);

    println!("Actuate each control once when prompted, then let go.");
    let groups: [(ControlKind, &[&str]); 3] = [
        (ControlKind::Button, &BUTTONS),
        (ControlKind::Dpad, &DPAD_DIRECTIONS),
        (ControlKind::Axis, &AXES),
    ];
    for (kind, controls) in groups {
        for control in controls {
            for trial in 1..=trials.max(1) {
                println!("Ready for '{control}' ({trial}/{trials}): actuate it now");
                if let (Some(simulator), Some(tx)) = (simulator.as_ref(), sim_tx.as_ref()) {
                    simulate_actuation(tx, simulator, control).await?;
                }
                match session.observe(control, kind, timeout).await? {
                    Some(diffs) => println!("  changed: {}", describe(&diffs)),
                    None => println!("  timed out"),
                }
            }
        }
    }

    let history = ctx.store.load_samples().unwrap_or_else(|e| {
        log::warn!("Failed to load stored samples: {e}");
        Vec::new()
    });
    let outcome = session.finish(&history).await;
    printer.await?;

    println!("{}", serde_json::to_string_pretty(&outcome.layout)?);
    if !outcome.unresolved.is_empty() {
        println!("Unresolved: {}", outcome.unresolved.join(", "));
    }
    if no_save {
        println!("Layout not saved");
        return Ok(());
    }
    print_persisted(&outcome.persist(&ctx.store)?);

    Ok(())
}

pub async fn handle_collect(
    ctx: &Context,
    label: String,
    count: usize,
    simulate: bool,
    timeout: u64,
    no_save: bool,
) -> Result<(), Box<dyn Error>> {
    let request = CollectRequest::new(&label, count)?
        .with_timeout(Duration::from_secs(timeout))
        .with_save(!no_save);
    if request.label != label {
        log::warn!("Using sanitized label '{}'", request.label);
    }

    let (progress_tx, progress_rx) = mpsc::channel(16);
    let printer = spawn_progress_printer(progress_rx);

    let pairs = if simulate {
        let layout = ctx.store.load_layout_or_default();
        let pairs = Simulator::labeled_pairs(&layout, &request.label, request.count);
        for index in 1..=pairs.len() {
            let progress = CalibrationProgress::Collected {
                index,
                total: request.count,
            };
            progress_tx.send(progress).await?;
        }
        pairs
    } else {
        let source = open_device(None)?;
        let mut session = CalibrationSession::new(spawn_reader(source));
        println!(
            "Press and release '{}' when prompted, {} time(s)",
            request.label, request.count
        );
        record_pairs(&mut session, &request, Some(&progress_tx)).await?
    };

    let outcome = collect_samples(&ctx.store, &request, pairs, Some(&progress_tx)).await?;
    drop(progress_tx);
    printer.await?;

    println!("{}", serde_json::to_string_pretty(&outcome.layout)?);
    println!("{} sample(s) stored", outcome.total_samples);
    if !outcome.unresolved.is_empty() {
        println!("Unresolved: {}", outcome.unresolved.join(", "));
    }

    Ok(())
}

/// Queue an idle report, then the actuated report after a short delay
async fn simulate_actuation(
    tx: &mpsc::Sender<Vec<u8>>,
    simulator: &Simulator,
    control: &str,
) -> Result<(), Box<dyn Error>> {
    tx.send(simulator.idle_report()).await?;
    let Some(report) = simulator.actuate(control) else {
        log::debug!("Simulated controller has no '{control}'");
        return Ok(());
    };
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(SIMULATED_REACTION).await;
        if tx.send(report).await.is_err() {
            log::debug!("Calibration session went away");
        }
    });

    Ok(())
}

fn describe(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .map(|d| format!("byte {} xor {:#04x}", d.index, d.xor))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_persisted(outcome: &PersistOutcome) {
    match outcome {
        PersistOutcome::Saved(path) => println!("Saved layout to {}", path.display()),
        PersistOutcome::Failed(path) => println!(
            "Layout failed validation and was not saved. See {}",
            path.display()
        ),
        PersistOutcome::NotSaved => println!("Layout not saved"),
    }
}

fn spawn_progress_printer(mut rx: mpsc::Receiver<CalibrationProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            match progress {
                CalibrationProgress::Collected { index, total } => {
                    println!("Collected sample {index}/{total}")
                }
                CalibrationProgress::Inferring => println!("Inferring layout..."),
                CalibrationProgress::Validating => println!("Validating layout..."),
                CalibrationProgress::ValidationResult(result) => println!(
                    "Validation {}: {} failure(s), {} collision(s)",
                    if result.ok { "passed" } else { "failed" },
                    result.failures().count(),
                    result.collision_count()
                ),
                CalibrationProgress::Done(outcome) => print_persisted(&outcome),
            }
        }
    })
}
