//! Simulated controller producing raw reports that follow a [Layout]. Used
//! when no hardware is available.

use std::{
    thread,
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{
        layout::{AxisKind, ButtonMapping, Layout},
        sample::SamplePair,
    },
    drivers::mapped_gamepad::event::{DPAD_DOWN, DPAD_LEFT, DPAD_RIGHT, DPAD_UP},
};

use super::{InputError, ReportSource};

/// Location used for labels the layout does not know
pub const FALLBACK_BUTTON: ButtonMapping = ButtonMapping(5, 0x20);
/// Shortest report produced
pub const MIN_REPORT_LEN: usize = 8;
/// Default time between two simulated reports
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(50);

const STICK_CENTER: u8 = 0x80;
/// Dpad value meaning "centered"
const DPAD_CENTERED: u8 = 0x08;
/// Chance per report that an idle simulator presses a button
const PRESS_PROBABILITY: f64 = 0.1;
/// Chance per report that the first stick jumps to a new position
const SWEEP_PROBABILITY: f64 = 0.05;

/// Simulated controller
#[derive(Debug)]
pub struct Simulator {
    layout: Layout,
    rng: StdRng,
    period: Duration,
    next_due: Instant,
    /// Button currently held and the number of reports left to hold it
    held: Option<(String, u32)>,
    /// Position of the first stick axis
    sweep: u8,
}

impl Simulator {
    pub fn new(layout: Layout) -> Self {
        let seed = rand::rng().random();
        Self::with_seed(layout, seed)
    }

    /// Create a simulator whose report stream is reproducible
    pub fn with_seed(layout: Layout, seed: u64) -> Self {
        Self {
            layout,
            rng: StdRng::seed_from_u64(seed),
            period: DEFAULT_PERIOD,
            next_due: Instant::now(),
            held: None,
            sweep: STICK_CENTER,
        }
    }

    /// Set the time between two reports
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Length of the reports, large enough to hold every mapped byte
    pub fn report_len(&self) -> usize {
        let layout = &self.layout;
        let max_index = layout
            .buttons
            .values()
            .map(|m| m.byte_index())
            .chain(layout.axes.values().map(|m| m.byte_index))
            .chain(layout.dpad.byte)
            .max()
            .unwrap_or_default();
        MIN_REPORT_LEN.max(max_index + 1)
    }

    /// Report with nothing pressed, sticks centered and the dpad released
    pub fn idle_report(&self) -> Vec<u8> {
        let mut report = vec![0; self.report_len()];
        for (name, mapping) in self.layout.axes.iter() {
            if AxisKind::from_name(name) == AxisKind::Stick {
                report[mapping.byte_index] = STICK_CENTER;
            }
        }
        self.set_dpad(&mut report, DPAD_CENTERED);
        report
    }

    /// Idle report with the given control actuated. Buttons are pressed,
    /// dpad directions held and axes pushed to their maximum. Returns `None`
    /// for controls the layout does not map.
    pub fn actuate(&self, control: &str) -> Option<Vec<u8>> {
        let mut report = self.idle_report();
        if let Some(mapping) = self.layout.button(control) {
            report[mapping.byte_index()] |= mapping.mask();
            return Some(report);
        }
        if let Some(mapping) = self.layout.axis(control) {
            report[mapping.byte_index] = u8::MAX;
            return Some(report);
        }
        let direction = match control {
            DPAD_UP => 0,
            DPAD_RIGHT => 2,
            DPAD_DOWN => 4,
            DPAD_LEFT => 6,
            _ => return None,
        };
        if self.layout.dpad.byte.is_none() {
            return None;
        }
        self.set_dpad(&mut report, direction);
        Some(report)
    }

    /// Produce the next report of the simulated stream. Buttons are held for
    /// a few reports at a time; the sticks jitter around center and the first
    /// stick occasionally jumps.
    pub fn next_report(&mut self) -> Vec<u8> {
        let mut report = self.idle_report();

        // Sticks
        if self.rng.random_bool(SWEEP_PROBABILITY) {
            self.sweep = self.rng.random();
        }
        let mut first_stick = true;
        for (name, mapping) in self.layout.axes.iter() {
            if AxisKind::from_name(name) != AxisKind::Stick {
                continue;
            }
            let value = if first_stick {
                first_stick = false;
                self.sweep
            } else {
                STICK_CENTER
            };
            let jitter: i16 = self.rng.random_range(-1..=1);
            report[mapping.byte_index] = (value as i16 + jitter).clamp(0, 255) as u8;
        }

        // Buttons
        self.held = match self.held.take() {
            Some((_, 0)) => None,
            Some((name, remaining)) => Some((name, remaining - 1)),
            None if self.rng.random_bool(PRESS_PROBABILITY) => {
                let names: Vec<&String> = self.layout.buttons.keys().collect();
                if names.is_empty() {
                    None
                } else {
                    let name = names[self.rng.random_range(0..names.len())].clone();
                    log::trace!("Simulating press of '{name}'");
                    Some((name, self.rng.random_range(2..8)))
                }
            }
            None => None,
        };
        if let Some(mapping) = self
            .held
            .as_ref()
            .and_then(|(name, _)| self.layout.button(name))
        {
            report[mapping.byte_index()] |= mapping.mask();
        }

        report
    }

    /// Build `count` press samples for the given label. The button location is
    /// taken from the layout, or [FALLBACK_BUTTON] if the label is unknown.
    pub fn labeled_pairs(layout: &Layout, label: &str, count: usize) -> Vec<SamplePair> {
        let mapping = layout.button(label).copied().unwrap_or(FALLBACK_BUTTON);
        let before = vec![0u8; MIN_REPORT_LEN.max(mapping.byte_index() + 1)];
        let mut after = before.clone();
        after[mapping.byte_index()] = mapping.mask();

        (0..count)
            .map(|_| SamplePair::new(label, before.clone(), after.clone()))
            .collect()
    }

    /// Write a dpad value into the masked bits of the dpad byte, if the mask
    /// is wide enough to hold it
    fn set_dpad(&self, report: &mut [u8], value: u8) {
        let dpad = &self.layout.dpad;
        let Some(byte) = dpad.byte else {
            return;
        };
        if dpad.mask == 0 {
            return;
        }
        let shifted = u16::from(value) << dpad.mask.trailing_zeros();
        if shifted & u16::from(dpad.mask) != shifted {
            return;
        }
        report[byte] = (report[byte] & !dpad.mask) | shifted as u8;
    }
}

impl ReportSource for Simulator {
    fn name(&self) -> String {
        "simulated controller".to_string()
    }

    fn read_report(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, InputError> {
        let now = Instant::now();
        if now < self.next_due {
            let wait = self.next_due - now;
            if wait > timeout {
                thread::sleep(timeout);
                return Ok(None);
            }
            thread::sleep(wait);
        }
        self.next_due = Instant::now() + self.period;

        Ok(Some(self.next_report()))
    }
}
