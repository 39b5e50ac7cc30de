use std::error::Error;

use serde_json::json;

use crate::{
    config::{
        layout::{AxisMapping, ButtonMapping, Layout},
        DecoderConfig,
    },
    drivers::mapped_gamepad::{
        driver::{Direction, Driver},
        event::{AxisSource, Event, WireEvent},
    },
};

/// DualShock style idle report: sticks centered, dpad released (0x08),
/// triggers at rest
fn idle_report() -> Vec<u8> {
    vec![0x01, 0x80, 0x80, 0x80, 0x80, 0x08, 0x00, 0x00, 0x00, 0x00]
}

fn button_events(events: &[Event]) -> Vec<(String, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Button(b) => Some((b.id.clone(), b.pressed)),
            Event::Axis(_) => None,
        })
        .collect()
}

#[tokio::test]
async fn test_first_report() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());

    let mut report = idle_report();
    report[5] = 0x28;
    let events = driver.handle_input_report(&report);
    println!("Events: {events:?}");

    // Held buttons and every reachable axis, no releases
    assert_eq!(button_events(&events), vec![("cross".to_string(), true)]);
    let axes: Vec<&str> = events
        .iter()
        .filter(|e| matches!(e, Event::Axis(_)))
        .map(|e| e.id())
        .collect();
    assert_eq!(
        axes,
        vec!["l2", "lstick_x", "lstick_y", "r2", "rstick_x", "rstick_y"]
    );

    Ok(())
}

#[tokio::test]
async fn test_button_press_and_release() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    driver.handle_input_report(&idle_report());

    let mut pressed = idle_report();
    pressed[5] = 0x28;
    let events = driver.handle_input_report(&pressed);
    println!("Events: {events:?}");
    assert_eq!(events, vec![Event::button("cross", true)]);

    let events = driver.handle_input_report(&idle_report());
    assert_eq!(events, vec![Event::button("cross", false)]);

    // Nothing changed
    let events = driver.handle_input_report(&idle_report());
    assert!(events.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_all_zero_baseline_press_and_release() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    driver.handle_input_report(&[0u8; 8]);

    let mut pressed = [0u8; 8];
    pressed[5] = 0x20;
    let events = driver.handle_input_report(&pressed);
    println!("Events: {events:?}");
    assert_eq!(button_events(&events), vec![("cross".to_string(), true)]);

    // Triggers at bytes 8 and 9 are out of range and may be estimated
    let events = driver.handle_input_report(&[0u8; 8]);
    println!("Events: {events:?}");
    assert_eq!(button_events(&events), vec![("cross".to_string(), false)]);
    assert!(events
        .iter()
        .filter(|e| matches!(e, Event::Axis(_)))
        .all(|e| e.is_approximate()));

    Ok(())
}

#[tokio::test]
async fn test_shifted_report_recovers_press() -> Result<(), Box<dyn Error>> {
    let mut layout = Layout::default();
    layout
        .buttons
        .insert("cross".to_string(), ButtonMapping::new(5, 0x20));
    let mut driver = Driver::new(layout, DecoderConfig::default());

    assert!(driver.handle_input_report(&[0u8; 8]).is_empty());

    // Longer report with the bit showing up at an unmapped byte
    let mut shifted = vec![0u8; 12];
    shifted[10] = 0x20;
    let events = driver.handle_input_report(&shifted);
    println!("Events: {events:?}");
    assert_eq!(events, vec![Event::button("cross", true)]);

    // The recovered press only lasts as long as the change itself
    let events = driver.handle_input_report(&shifted);
    assert_eq!(events, vec![Event::button("cross", false)]);

    Ok(())
}

#[tokio::test]
async fn test_explained_change_is_not_recovered() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    let mut report = idle_report();
    report[5] = 0x00;
    report[6] = 0x00;
    driver.handle_input_report(&report);

    // Square at byte 5 must not also fire buttons mapped at other bytes
    report[5] = 0x10;
    let events = driver.handle_input_report(&report);
    let buttons = button_events(&events);
    println!("Buttons: {buttons:?}");
    assert!(buttons.contains(&("square".to_string(), true)));
    assert!(!buttons.iter().any(|(id, _)| id == "share"));

    Ok(())
}

#[tokio::test]
async fn test_dpad_directions() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    driver.handle_input_report(&idle_report());

    let mut report = idle_report();
    report[5] = 0x01;
    let events = driver.handle_input_report(&report);
    println!("Events: {events:?}");
    assert_eq!(
        button_events(&events),
        vec![
            ("dpad_up".to_string(), false),
            ("dpad_down".to_string(), false),
            ("dpad_left".to_string(), false),
            ("dpad_right".to_string(), false),
            ("dpad_up".to_string(), true),
            ("dpad_right".to_string(), true),
        ]
    );

    // Centered again: releases only
    let events = driver.handle_input_report(&idle_report());
    assert_eq!(events.len(), 4);
    assert!(button_events(&events).iter().all(|(_, pressed)| !pressed));

    assert_eq!(Direction::from_value(6).pressed(), &["dpad_left"]);
    assert_eq!(Direction::from_value(8), Direction::None);

    Ok(())
}

#[tokio::test]
async fn test_axis_noise_threshold() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    driver.handle_input_report(&idle_report());

    let mut report = idle_report();
    report[1] = 130;
    assert!(driver.handle_input_report(&report).is_empty());

    report[1] = 200;
    let events = driver.handle_input_report(&report);
    println!("Events: {events:?}");
    assert_eq!(events.len(), 1);
    let Event::Axis(axis) = &events[0] else {
        return Err("expected an axis event".into());
    };
    assert_eq!(axis.id, "lstick_x");
    assert_eq!(axis.source, AxisSource::Mapped);
    assert!((axis.value - 72.0 / 127.0).abs() < 1e-9);

    // Triggers are normalized from 0
    report[8] = 255;
    let events = driver.handle_input_report(&report);
    assert_eq!(events, vec![Event::axis("l2", 1.0)]);

    Ok(())
}

#[tokio::test]
async fn test_estimated_axis() -> Result<(), Box<dyn Error>> {
    let mut layout = Layout::default();
    layout
        .axes
        .insert("lstick_x".to_string(), AxisMapping::new(20));
    let mut driver = Driver::new(layout, DecoderConfig::default());

    let report = |value: u8| {
        let mut report = vec![0u8; 8];
        report[1] = value;
        report
    };
    assert!(driver.handle_input_report(&report(128)).is_empty());
    assert!(driver.handle_input_report(&report(200)).is_empty());

    let events = driver.handle_input_report(&report(100));
    println!("Events: {events:?}");
    assert_eq!(events.len(), 1);
    assert!(events[0].is_approximate());
    let Event::Axis(axis) = &events[0] else {
        return Err("expected an axis event".into());
    };
    assert_eq!(axis.source, AxisSource::Estimated { byte_index: 1 });
    assert!((axis.value - (100.0 - 128.0) / 127.0).abs() < 1e-9);

    // Same estimate again is suppressed
    assert!(driver.handle_input_report(&report(100)).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_report_is_ignored() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    assert!(driver.handle_input_report(&[]).is_empty());
    assert_eq!(driver.recent_reports().count(), 0);

    // The next real report is still treated as the first one
    let events = driver.handle_input_report(&idle_report());
    assert_eq!(events.len(), 6);

    Ok(())
}

#[tokio::test]
async fn test_status() -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new(Layout::dualshock(), DecoderConfig::default());
    for i in 0..10u8 {
        let mut report = idle_report();
        report[7] = i * 10;
        driver.handle_input_report(&report);
    }

    let status = driver.status();
    println!("Status: {}", serde_json::to_string(&status)?);
    assert_eq!(status.recent_reports.len(), 8);
    assert_eq!(status.recent_reports[7][7], 90);
    assert_eq!(status.mapping, Layout::dualshock());
    assert!(status.sensors.variable_candidates.contains(&7));

    let mut layout = Layout::default();
    layout
        .buttons
        .insert("a".to_string(), ButtonMapping::new(2, 0x01));
    driver.set_layout(layout.clone());
    assert_eq!(driver.layout(), &layout);

    Ok(())
}

#[tokio::test]
async fn test_wire_events() -> Result<(), Box<dyn Error>> {
    let button = WireEvent::from(&Event::button("cross", true));
    assert_eq!(
        serde_json::to_value(&button)?,
        json!({"type": "button", "id": "cross", "value": 1})
    );
    assert_eq!(
        serde_json::to_string(&WireEvent::from(&Event::button("cross", false)))?,
        r#"{"type":"button","id":"cross","value":0}"#
    );

    let axis = WireEvent::from(&Event::estimated_axis("lstick_x", -0.2205, 1));
    assert_eq!(
        serde_json::to_value(&axis)?,
        json!({"type": "axis", "id": "lstick_x", "value": -0.22, "approximate": true})
    );

    Ok(())
}
