use std::{error::Error, time::Duration};

use hidmap::{
    calibration::{
        collect::{collect_samples, CollectRequest},
        session::CalibrationSession,
        ControlKind, PersistOutcome,
    },
    config::{layout::Layout, store::LayoutStore, DecoderConfig},
    drivers::mapped_gamepad::{driver::Driver, event::Event},
    input::source::{simulator::Simulator, spawn_reader},
};
use tokio::sync::mpsc;

/// Collected samples produce a saved layout that the decoder then uses
#[tokio::test]
async fn test_collect_then_decode() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let store = LayoutStore::new(dir.path());
    let defaults = Layout::dualshock();

    for label in ["cross", "circle", "square"] {
        let request = CollectRequest::new(label, 3)?;
        let pairs = Simulator::labeled_pairs(&defaults, label, request.count);
        let outcome = collect_samples(&store, &request, pairs, None).await?;
        assert!(outcome.validation.ok);
        assert!(matches!(outcome.persisted, PersistOutcome::Saved(_)));
    }

    let layout = store.load_layout_or_default();
    assert_eq!(layout.buttons.len(), 3);

    let mut driver = Driver::new(layout, DecoderConfig::default());
    let simulator = Simulator::with_seed(defaults, 9);
    driver.handle_input_report(&simulator.idle_report());
    let pressed = simulator.actuate("circle").ok_or("circle is not mapped")?;
    let events = driver.handle_input_report(&pressed);
    println!("Events: {events:?}");
    assert_eq!(events, vec![Event::button("circle", true)]);

    Ok(())
}

/// A session fed by a reader thread locates a button on a live stream
#[tokio::test]
async fn test_session_over_reader() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let store = LayoutStore::new(dir.path());

    // Changes on almost every report, so the first observed diff is taken
    let source = Simulator::with_seed(Layout::dualshock(), 5).with_period(Duration::from_millis(5));
    let mut session = CalibrationSession::new(spawn_reader(source));
    let diffs = session
        .observe("anything", ControlKind::Axis, Duration::from_secs(5))
        .await?;
    println!("Diffs: {diffs:?}");
    assert!(diffs.is_some_and(|d| !d.is_empty()));

    let outcome = session.finish(&[]).await;
    assert!(outcome.layout.axis("anything").is_some());
    assert!(outcome.validation.ok);
    let persisted = outcome.persist(&store)?;
    assert_eq!(persisted, PersistOutcome::Saved(store.layout_path()));

    Ok(())
}

/// Dropping the receiving end stops the reader
#[tokio::test]
async fn test_reader_stops() -> Result<(), Box<dyn Error>> {
    let source = Simulator::with_seed(Layout::dualshock(), 1).with_period(Duration::ZERO);
    let mut rx: mpsc::Receiver<Vec<u8>> = spawn_reader(source);
    let report = rx.recv().await.ok_or("reader closed early")?;
    assert_eq!(report.len(), 10);
    drop(rx);

    Ok(())
}
