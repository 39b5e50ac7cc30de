use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Dpad direction ids, in the order their releases are emitted
pub const DPAD_UP: &str = "dpad_up";
pub const DPAD_DOWN: &str = "dpad_down";
pub const DPAD_LEFT: &str = "dpad_left";
pub const DPAD_RIGHT: &str = "dpad_right";
pub const DPAD_CARDINALS: [&str; 4] = [DPAD_UP, DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT];

/// Events that can be emitted by the mapped gamepad decoder
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Button(ButtonEvent),
    Axis(AxisEvent),
}

/// Button events represent binary inputs
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonEvent {
    pub id: String,
    pub pressed: bool,
}

/// Where the value of an axis event came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisSource {
    /// Read from the byte given by the layout
    Mapped,
    /// The mapped byte was out of range; the value was read from the most
    /// variable byte of the recent reports instead.
    Estimated { byte_index: usize },
}

/// Axis events carry a normalized value
#[derive(Clone, Debug, PartialEq)]
pub struct AxisEvent {
    pub id: String,
    pub value: f64,
    pub source: AxisSource,
}

impl Event {
    pub fn button(id: impl Into<String>, pressed: bool) -> Self {
        Event::Button(ButtonEvent {
            id: id.into(),
            pressed,
        })
    }

    pub fn axis(id: impl Into<String>, value: f64) -> Self {
        Event::Axis(AxisEvent {
            id: id.into(),
            value,
            source: AxisSource::Mapped,
        })
    }

    pub fn estimated_axis(id: impl Into<String>, value: f64, byte_index: usize) -> Self {
        Event::Axis(AxisEvent {
            id: id.into(),
            value,
            source: AxisSource::Estimated { byte_index },
        })
    }

    /// Identifier of the control that emitted the event
    pub fn id(&self) -> &str {
        match self {
            Event::Button(e) => e.id.as_str(),
            Event::Axis(e) => e.id.as_str(),
        }
    }

    /// Returns true if this is an axis event estimated by heuristics
    pub fn is_approximate(&self) -> bool {
        matches!(
            self,
            Event::Axis(AxisEvent {
                source: AxisSource::Estimated { .. },
                ..
            })
        )
    }
}

/// Kind of a [WireEvent]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEventType {
    Button,
    Axis,
}

/// Serialized form of an [Event] handed to transports:
/// `{"type": "button", "id": "cross", "value": 1}`
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub kind: WireEventType,
    pub id: String,
    /// 1 or 0 for buttons, the normalized value for axes
    pub value: Number,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub approximate: bool,
}

/// Round to two decimals
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<&Event> for WireEvent {
    fn from(event: &Event) -> Self {
        match event {
            Event::Button(e) => WireEvent {
                kind: WireEventType::Button,
                id: e.id.clone(),
                value: Number::from(u8::from(e.pressed)),
                approximate: false,
            },
            Event::Axis(e) => WireEvent {
                kind: WireEventType::Axis,
                id: e.id.clone(),
                value: Number::from_f64(round2(e.value)).unwrap_or_else(|| Number::from(0)),
                approximate: event.is_approximate(),
            },
        }
    }
}
