use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default dpad mask. The direction is encoded in the low nibble as a value
/// between 0 and 7.
pub const DPAD_DEFAULT_MASK: u8 = 0x0f;

/// Center value of an 8-bit stick axis
const STICK_CENTER: f64 = 128.0;
/// Distance from the center to either end of an 8-bit stick axis
const STICK_RANGE: f64 = 127.0;
/// Full scale value of an 8-bit trigger axis
const TRIGGER_MAX: f64 = u8::MAX as f64;

/// A [ButtonMapping] locates a digital control inside a report. The button is
/// pressed when `report[byte_index] & mask != 0`. Serialized as a two element
/// array: `[byte_index, mask]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ButtonMapping(pub usize, pub u8);

impl ButtonMapping {
    pub fn new(byte_index: usize, mask: u8) -> Self {
        Self(byte_index, mask)
    }

    /// Index of the byte holding the button bit(s)
    pub fn byte_index(&self) -> usize {
        self.0
    }

    /// Bit mask of the button within its byte
    pub fn mask(&self) -> u8 {
        self.1
    }

    /// Returns true if the mapped bit(s) toggled between the two given byte
    /// values.
    pub fn toggled(&self, before: u8, after: u8) -> bool {
        (before ^ after) & self.mask() != 0
    }
}

/// An [AxisMapping] is the index of the byte holding an analog value. How the
/// raw value gets normalized depends on the axis name, see [AxisKind].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct AxisMapping {
    pub byte_index: usize,
}

impl AxisMapping {
    pub fn new(byte_index: usize) -> Self {
        Self { byte_index }
    }
}

/// Normalization rule of an analog axis, selected by name convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Centered at 128, normalized to [-1.0, 1.0]
    Stick,
    /// Resting at 0, normalized to [0.0, 1.0]
    Trigger,
}

impl AxisKind {
    /// Any axis whose name contains "stick" is a stick, everything else is
    /// treated as a trigger.
    pub fn from_name(name: &str) -> Self {
        if name.contains("stick") {
            AxisKind::Stick
        } else {
            AxisKind::Trigger
        }
    }

    /// Normalize the given raw byte value
    pub fn normalize(&self, raw: u8) -> f64 {
        match self {
            AxisKind::Stick => ((raw as f64 - STICK_CENTER) / STICK_RANGE).clamp(-1.0, 1.0),
            AxisKind::Trigger => raw as f64 / TRIGGER_MAX,
        }
    }
}

/// Location of the hat switch. The masked value selects one of eight compass
/// directions (0-7); anything else means the dpad is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct DpadMapping {
    /// Index of the dpad byte. `None` if the dpad has not been mapped.
    #[serde(default)]
    pub byte: Option<usize>,
    #[serde(default = "default_dpad_mask")]
    pub mask: u8,
}

fn default_dpad_mask() -> u8 {
    DPAD_DEFAULT_MASK
}

impl Default for DpadMapping {
    fn default() -> Self {
        Self {
            byte: None,
            mask: DPAD_DEFAULT_MASK,
        }
    }
}

impl DpadMapping {
    pub fn new(byte: usize, mask: u8) -> Self {
        Self {
            byte: Some(byte),
            mask,
        }
    }
}

/// A [Layout] describes where every named control lives inside a raw input
/// report. Names not present in the layout are simply not mapped. Malformed
/// entries are skipped when loading, so one bad entry never discards the
/// rest of the layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Layout {
    #[serde(default, deserialize_with = "lenient_entries")]
    #[schemars(with = "BTreeMap<String, AxisMapping>")]
    pub axes: BTreeMap<String, AxisMapping>,
    #[serde(default, deserialize_with = "lenient_entries")]
    #[schemars(with = "BTreeMap<String, ButtonMapping>")]
    pub buttons: BTreeMap<String, ButtonMapping>,
    #[serde(default, deserialize_with = "lenient_dpad")]
    #[schemars(with = "DpadMapping")]
    pub dpad: DpadMapping,
}

/// Deserialize a name-keyed map entry by entry, dropping entries that do not
/// parse
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        log::warn!("Ignoring layout section that is not an object");
        return Ok(BTreeMap::new());
    };

    let mut map = BTreeMap::new();
    for (name, value) in entries {
        match serde_json::from_value(value) {
            Ok(mapping) => {
                map.insert(name, mapping);
            }
            Err(e) => log::warn!("Ignoring invalid layout entry '{name}': {e}"),
        }
    }

    Ok(map)
}

fn lenient_dpad<'de, D>(deserializer: D) -> Result<DpadMapping, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(dpad) => Ok(dpad),
        Err(e) => {
            log::warn!("Ignoring invalid dpad mapping: {e}");
            Ok(DpadMapping::default())
        }
    }
}

impl Layout {
    /// Returns the built-in layout of a DualShock 4 style USB report. Devices
    /// that differ should be calibrated.
    pub fn dualshock() -> Self {
        let axes = [
            ("lstick_x", 1),
            ("lstick_y", 2),
            ("rstick_x", 3),
            ("rstick_y", 4),
            ("l2", 8),
            ("r2", 9),
        ]
        .into_iter()
        .map(|(name, idx)| (name.to_string(), AxisMapping::new(idx)))
        .collect();

        let buttons = [
            ("square", 5, 0x10),
            ("cross", 5, 0x20),
            ("circle", 5, 0x40),
            ("triangle", 5, 0x80),
            ("l1", 6, 0x01),
            ("r1", 6, 0x02),
            ("l2_btn", 6, 0x04),
            ("r2_btn", 6, 0x08),
            ("share", 6, 0x10),
            ("options", 6, 0x20),
            ("lstick", 6, 0x40),
            ("rstick", 6, 0x80),
            ("ps", 7, 0x01),
        ]
        .into_iter()
        .map(|(name, idx, mask)| (name.to_string(), ButtonMapping::new(idx, mask)))
        .collect();

        Self {
            axes,
            buttons,
            dpad: DpadMapping::new(5, DPAD_DEFAULT_MASK),
        }
    }

    /// Look up the mapping of the given button
    pub fn button(&self, name: &str) -> Option<&ButtonMapping> {
        self.buttons.get(name)
    }

    /// Look up the mapping of the given axis
    pub fn axis(&self, name: &str) -> Option<&AxisMapping> {
        self.axes.get(name)
    }

    /// Returns true if a mapped control accounts for a change of the given
    /// bits at the given byte index: a button covering any of the bits, an
    /// axis reading that byte or the dpad nibble.
    pub fn explains(&self, byte_index: usize, bits: u8) -> bool {
        let button = self
            .buttons
            .values()
            .any(|m| m.byte_index() == byte_index && m.mask() & bits != 0);
        let axis = self.axes.values().any(|m| m.byte_index == byte_index);
        let dpad = self.dpad.byte == Some(byte_index) && self.dpad.mask & bits != 0;
        button || axis || dpad
    }

    /// Check the layout for entries that can never decode anything. Returns
    /// one message per problem; an empty list means the layout is usable.
    pub fn structural_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, mapping) in self.buttons.iter() {
            if mapping.mask() == 0 {
                errors.push(format!("buttons[\"{name}\"] has a zero mask"));
            }
        }
        if self.dpad.byte.is_some() && self.dpad.mask == 0 {
            errors.push("dpad has a zero mask".to_string());
        }
        errors
    }
}
