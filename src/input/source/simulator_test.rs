use std::{collections::BTreeSet, error::Error, time::Duration};

use crate::{
    config::{layout::Layout, DecoderConfig},
    drivers::mapped_gamepad::{driver::Driver, event::Event},
    input::source::{
        hidraw::{find_controller, is_controller_name, DeviceSummary},
        simulator::{Simulator, FALLBACK_BUTTON},
        ReportSource,
    },
};

#[tokio::test]
async fn test_idle_and_actuated_reports() -> Result<(), Box<dyn Error>> {
    let simulator = Simulator::with_seed(Layout::dualshock(), 7);

    let idle = simulator.idle_report();
    println!("Idle: {idle:?}");
    assert_eq!(idle.len(), 10);
    assert_eq!(&idle[1..5], &[0x80, 0x80, 0x80, 0x80]);
    assert_eq!(idle[5], 0x08);

    let cross = simulator.actuate("cross").ok_or("cross should be mapped")?;
    assert_eq!(cross[5], 0x28);
    let left = simulator.actuate("dpad_left").ok_or("dpad should be mapped")?;
    assert_eq!(left[5], 0x06);
    let l2 = simulator.actuate("l2").ok_or("l2 should be mapped")?;
    assert_eq!(l2[8], 0xff);
    assert!(simulator.actuate("turbo").is_none());

    Ok(())
}

#[tokio::test]
async fn test_simulated_stream_decodes() -> Result<(), Box<dyn Error>> {
    let layout = Layout::dualshock();
    let mut simulator = Simulator::with_seed(layout.clone(), 42).with_period(Duration::ZERO);
    let mut driver = Driver::new(layout.clone(), DecoderConfig::default());

    let mut seen = BTreeSet::new();
    for _ in 0..500 {
        let events = driver.poll(&mut simulator, Duration::from_millis(10))?;
        for event in events {
            assert!(!event.is_approximate());
            seen.insert(event.id().to_string());
            if let Event::Button(button) = &event {
                assert!(layout.button(&button.id).is_some());
            }
        }
    }
    println!("Seen: {seen:?}");
    assert!(seen.contains("lstick_x"));
    assert!(seen.iter().any(|id| layout.button(id).is_some()));

    Ok(())
}

#[tokio::test]
async fn test_read_report_waits_for_period() -> Result<(), Box<dyn Error>> {
    let mut simulator =
        Simulator::with_seed(Layout::dualshock(), 1).with_period(Duration::from_secs(60));
    assert!(simulator.read_report(Duration::ZERO)?.is_some());
    assert!(simulator.read_report(Duration::from_millis(1))?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_labeled_pairs() -> Result<(), Box<dyn Error>> {
    let layout = Layout::dualshock();
    let pairs = Simulator::labeled_pairs(&layout, "ps", 3);
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].label, "ps");
    assert_eq!(pairs[0].before.len(), 8);
    assert_eq!(pairs[0].after[7], 0x01);

    let pairs = Simulator::labeled_pairs(&Layout::default(), "anything", 1);
    assert_eq!(pairs[0].after[FALLBACK_BUTTON.byte_index()], FALLBACK_BUTTON.mask());

    Ok(())
}

#[tokio::test]
async fn test_controller_names() -> Result<(), Box<dyn Error>> {
    assert!(is_controller_name("Sony Interactive Entertainment"));
    assert!(is_controller_name("wireless controller"));
    assert!(!is_controller_name("Logitech USB Receiver"));

    let devices = vec![
        DeviceSummary {
            path: "/dev/hidraw0".to_string(),
            product: "USB Keyboard".to_string(),
            ..Default::default()
        },
        DeviceSummary {
            path: "/dev/hidraw1".to_string(),
            manufacturer: "PowerA".to_string(),
            ..Default::default()
        },
    ];
    let found = find_controller(&devices).ok_or("expected a controller")?;
    assert_eq!(found.path, "/dev/hidraw1");

    Ok(())
}
