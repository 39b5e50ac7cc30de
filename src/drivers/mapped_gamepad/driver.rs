use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use serde::Serialize;

use crate::{
    config::{
        layout::{AxisKind, ButtonMapping, Layout},
        DecoderConfig,
    },
    input::source::{InputError, ReportSource},
    mapping::{
        diff::byte_at,
        profiler::{most_variable_byte, profile, SensorProfile},
        selector::{find_single_bit_change, Candidate},
    },
};

use super::event::{Event, DPAD_CARDINALS, DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT, DPAD_UP};

/// Hat switch direction decoded from the dpad byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    #[default]
    None,
}

impl Direction {
    /// Values 0-7 are the eight compass directions starting north and going
    /// clockwise. Everything else is centered.
    pub fn from_value(value: u8) -> Self {
        match value {
            0 => Direction::North,
            1 => Direction::NorthEast,
            2 => Direction::East,
            3 => Direction::SouthEast,
            4 => Direction::South,
            5 => Direction::SouthWest,
            6 => Direction::West,
            7 => Direction::NorthWest,
            _ => Direction::None,
        }
    }

    /// Dpad button ids held down in this direction
    pub fn pressed(&self) -> &'static [&'static str] {
        match self {
            Direction::North => &[DPAD_UP],
            Direction::NorthEast => &[DPAD_UP, DPAD_RIGHT],
            Direction::East => &[DPAD_RIGHT],
            Direction::SouthEast => &[DPAD_DOWN, DPAD_RIGHT],
            Direction::South => &[DPAD_DOWN],
            Direction::SouthWest => &[DPAD_DOWN, DPAD_LEFT],
            Direction::West => &[DPAD_LEFT],
            Direction::NorthWest => &[DPAD_LEFT, DPAD_UP],
            Direction::None => &[],
        }
    }
}

/// Controls decoded from one report
#[derive(Debug, Clone, Default)]
struct State {
    raw: Vec<u8>,
    /// Only axes whose byte was present in the report
    axes: BTreeMap<String, f64>,
    dpad: Direction,
    buttons: BTreeMap<String, bool>,
}

/// Snapshot of the decoder for calibration tools
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub mapping: Layout,
    pub recent_reports: Vec<Vec<u8>>,
    pub sensors: SensorProfile,
}

/// Decoder for gamepads whose report layout is described by a [Layout]
/// instead of being known in advance. One instance per device session.
#[derive(Debug)]
pub struct Driver {
    layout: Layout,
    config: DecoderConfig,
    recent: VecDeque<Vec<u8>>,
    state: Option<State>,
    /// Last estimate emitted for axes whose mapped byte is out of range
    estimates: BTreeMap<String, f64>,
}

impl Driver {
    pub fn new(layout: Layout, config: DecoderConfig) -> Self {
        let recent = VecDeque::with_capacity(config.recent_capacity);
        Self {
            layout,
            config,
            recent,
            state: None,
            estimates: BTreeMap::new(),
        }
    }

    /// The layout used to decode reports
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Replace the whole layout. Decoding state is kept so no spurious
    /// events are emitted for controls that did not change.
    pub fn set_layout(&mut self, layout: Layout) {
        log::info!(
            "Switching to layout with {} button(s) and {} axis/axes",
            layout.buttons.len(),
            layout.axes.len()
        );
        self.layout = layout;
        self.estimates.clear();
    }

    /// The most recent raw reports, oldest first
    pub fn recent_reports(&self) -> impl Iterator<Item = &[u8]> {
        self.recent.iter().map(|r| r.as_slice())
    }

    /// Current layout, recent reports and sensor candidates detected in them
    pub fn status(&self) -> Status {
        let recent_reports: Vec<Vec<u8>> = self.recent.iter().cloned().collect();
        let sensors = profile(&recent_reports, &self.config.profiler);
        Status {
            mapping: self.layout.clone(),
            recent_reports,
            sensors,
        }
    }

    /// Read the next report from the given source and decode it
    pub fn poll(
        &mut self,
        source: &mut dyn ReportSource,
        timeout: Duration,
    ) -> Result<Vec<Event>, InputError> {
        let Some(report) = source.read_report(timeout)? else {
            return Ok(Vec::new());
        };
        Ok(self.handle_input_report(&report))
    }

    /// Decode the given raw report and return the input events it produced.
    /// Empty reports are ignored.
    pub fn handle_input_report(&mut self, buf: &[u8]) -> Vec<Event> {
        if buf.is_empty() {
            log::trace!("Ignoring empty report");
            return Vec::new();
        }

        self.push_recent(buf);

        // Update the state
        let state = self.decode(buf);
        let old_state = self.update_state(state);
        let initial = old_state.is_none();

        // Translate the state into a stream of input events
        let mut events = self.translate(old_state);
        if !initial {
            events.extend(self.estimate_unreachable_axes());
        }

        events
    }

    fn push_recent(&mut self, buf: &[u8]) {
        while self.recent.len() >= self.config.recent_capacity.max(1) {
            self.recent.pop_front();
        }
        self.recent.push_back(buf.to_vec());
    }

    /// Update the internal state and return the old state
    fn update_state(&mut self, state: State) -> Option<State> {
        self.state.replace(state)
    }

    /// Decode every mapped control of the given report
    fn decode(&self, cur: &[u8]) -> State {
        let axes = self
            .layout
            .axes
            .iter()
            .filter_map(|(name, mapping)| {
                let raw = cur.get(mapping.byte_index)?;
                Some((name.clone(), AxisKind::from_name(name).normalize(*raw)))
            })
            .collect();

        let dpad = self.decode_dpad(cur);

        // Single-bit change the layout cannot account for, used to recover
        // buttons whose byte moved (e.g. after a USB to Bluetooth switch).
        let prev = self.state.as_ref().map(|s| s.raw.as_slice());
        let unexplained = prev
            .and_then(|prev| find_single_bit_change(prev, cur))
            .filter(|c| !self.layout.explains(c.index, c.xor));

        let buttons = self
            .layout
            .buttons
            .iter()
            .map(|(name, mapping)| {
                let pressed = decode_button(mapping, cur, prev, unexplained);
                (name.clone(), pressed)
            })
            .collect();

        State {
            raw: cur.to_vec(),
            axes,
            dpad,
            buttons,
        }
    }

    fn decode_dpad(&self, cur: &[u8]) -> Direction {
        let mapping = &self.layout.dpad;
        let Some(raw) = mapping.byte.and_then(|idx| cur.get(idx)) else {
            return Direction::None;
        };
        if mapping.mask == 0 {
            return Direction::None;
        }
        let value = (raw & mapping.mask) >> mapping.mask.trailing_zeros();
        Direction::from_value(value)
    }

    /// Translate the current state into events
    fn translate(&self, old_state: Option<State>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(state) = self.state.as_ref() else {
            return events;
        };

        // First report: nothing to release, only report what is held and
        // where the axes are.
        let Some(old_state) = old_state else {
            for (name, pressed) in state.buttons.iter() {
                if *pressed {
                    events.push(Event::button(name.clone(), true));
                }
            }
            for (name, value) in state.axes.iter() {
                events.push(Event::axis(name.clone(), *value));
            }
            return events;
        };

        // Button events
        for (name, pressed) in state.buttons.iter() {
            let was_pressed = old_state.buttons.get(name).copied().unwrap_or_default();
            if *pressed != was_pressed {
                events.push(Event::button(name.clone(), *pressed));
            }
        }

        // Dpad events
        if state.dpad != old_state.dpad {
            for id in DPAD_CARDINALS {
                events.push(Event::button(id, false));
            }
            for id in state.dpad.pressed() {
                events.push(Event::button(*id, true));
            }
        }

        // Axis events
        let threshold = self.config.axis_noise_threshold;
        for (name, value) in state.axes.iter() {
            match old_state.axes.get(name) {
                Some(old_value) if (value - old_value).abs() <= threshold => (),
                _ => events.push(Event::axis(name.clone(), *value)),
            }
        }

        events
    }

    /// Estimate axes whose mapped byte is past the end of the latest report
    /// from the most variable byte of the recent reports. This is a best-effort
    /// guess and the events are tagged as estimated.
    fn estimate_unreachable_axes(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(latest) = self.recent.back() else {
            return events;
        };

        let unreachable: Vec<String> = self
            .layout
            .axes
            .iter()
            .filter(|(_, mapping)| mapping.byte_index >= latest.len())
            .map(|(name, _)| name.clone())
            .collect();
        self.estimates.retain(|name, _| unreachable.contains(name));
        if unreachable.is_empty() || self.recent.len() < self.config.min_recent_for_estimate {
            return events;
        }

        let window: Vec<&[u8]> = self.recent.iter().map(|r| r.as_slice()).collect();
        let Some(index) = most_variable_byte(&window) else {
            return events;
        };
        let raw = byte_at(latest, index);

        let threshold = self.config.axis_noise_threshold;
        for name in unreachable {
            let value = AxisKind::from_name(&name).normalize(raw);
            if let Some(last) = self.estimates.get(&name) {
                if (value - last).abs() <= threshold {
                    continue;
                }
            }
            log::debug!("Estimating axis '{name}' from byte {index}");
            self.estimates.insert(name.clone(), value);
            events.push(Event::estimated_axis(name, value, index));
        }

        events
    }
}

/// Decide whether a button is pressed.
///
/// If the mapped byte is missing, or reads zero now and in the previous
/// report, an unexplained single-bit change that overlaps the button mask is
/// taken as a press. This cannot tell a released button from a button whose
/// byte moved, so it may report a press that did not happen.
fn decode_button(
    mapping: &ButtonMapping,
    cur: &[u8],
    prev: Option<&[u8]>,
    unexplained: Option<Candidate>,
) -> bool {
    let idx = mapping.byte_index();
    let mask = mapping.mask();

    match cur.get(idx) {
        Some(value) if value & mask != 0 => return true,
        Some(value) => {
            let prev_value = prev.map(|p| byte_at(p, idx));
            if *value != 0 || prev_value != Some(0) {
                return false;
            }
        }
        None if prev.is_none() => return false,
        None => (),
    }

    unexplained.is_some_and(|change| change.xor & mask != 0)
}
