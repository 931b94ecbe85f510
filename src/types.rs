use std::fmt;

use serde::{Serialize, Serializer};

/// Temperature in Celsius, held as integer tenths of a degree so wire values
/// survive a decode/encode cycle without float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temperature(i32);

impl Temperature {
    pub const fn from_tenths(tenths: i32) -> Self {
        Self(tenths)
    }

    /// Rounds to the nearest tenth of a degree.
    pub fn from_celsius(c: f64) -> Self {
        Self((c * 10.0).round() as i32)
    }

    pub fn tenths(&self) -> i32 {
        self.0
    }

    pub fn celsius(&self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub fn fahrenheit(&self) -> f64 {
        self.celsius() * (9.0 / 5.0) + 32.0
    }

    /// True when the value sits on the unit's 0.5 degree setpoint grid.
    pub fn is_half_degree(&self) -> bool {
        self.0 % 5 == 0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.celsius())
    }
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.celsius())
    }
}

/// Adapter MAC address. Canonical form is 12 upper-case hex digits with no
/// separators, the way the adapter reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parses the compact hex form; either letter case is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 12 {
            return None;
        }
        let bytes = hex::decode(s).ok()?;
        let octets: [u8; 6] = bytes.try_into().ok()?;
        Some(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An enumeration with a fixed wire-code lookup table.
pub trait WireCode: Sized + Copy + PartialEq + 'static {
    /// Code/value pairs. A value listed twice encodes with its first code.
    const CODES: &'static [(&'static str, Self)];

    fn from_code(code: &str) -> Option<Self> {
        Self::CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| *v)
    }

    fn code(&self) -> &'static str {
        Self::CODES
            .iter()
            .find(|(_, v)| v == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }
}

/// A decoded enumeration value. Codes outside the lookup table are kept
/// verbatim so they re-encode unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Coded<T> {
    Known(T),
    Unknown(String),
}

impl<T: WireCode> Coded<T> {
    pub fn from_wire(raw: &str) -> Self {
        match T::from_code(raw) {
            Some(v) => Coded::Known(v),
            None => Coded::Unknown(raw.to_string()),
        }
    }

    pub fn to_wire(&self) -> &str {
        match self {
            Coded::Known(v) => v.code(),
            Coded::Unknown(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Coded::Known(v) => Some(*v),
            Coded::Unknown(_) => None,
        }
    }
}

impl<T: WireCode> From<T> for Coded<T> {
    fn from(v: T) -> Self {
        Coded::Known(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationMode {
    Auto,
    /// Automatic mode as reported by some firmware under code `0`.
    AutoAlt0,
    /// Automatic mode as reported by some firmware under code `7`.
    AutoAlt7,
    Dehumidify,
    Cool,
    Heat,
    Fan,
}

impl OperationMode {
    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            OperationMode::Auto | OperationMode::AutoAlt0 | OperationMode::AutoAlt7
        )
    }
}

impl WireCode for OperationMode {
    const CODES: &'static [(&'static str, Self)] = &[
        ("0", OperationMode::AutoAlt0),
        ("1", OperationMode::Auto),
        ("2", OperationMode::Dehumidify),
        ("3", OperationMode::Cool),
        ("4", OperationMode::Heat),
        ("6", OperationMode::Fan),
        ("7", OperationMode::AutoAlt7),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FanRate {
    Auto,
    Quiet,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

impl FanRate {
    /// Fixed speed level 1 to 5.
    pub fn level(n: u8) -> Option<Self> {
        match n {
            1 => Some(FanRate::Level1),
            2 => Some(FanRate::Level2),
            3 => Some(FanRate::Level3),
            4 => Some(FanRate::Level4),
            5 => Some(FanRate::Level5),
            _ => None,
        }
    }
}

impl WireCode for FanRate {
    const CODES: &'static [(&'static str, Self)] = &[
        ("A", FanRate::Auto),
        ("B", FanRate::Quiet),
        ("3", FanRate::Level1),
        ("4", FanRate::Level2),
        ("5", FanRate::Level3),
        ("6", FanRate::Level4),
        ("7", FanRate::Level5),
    ];
}

/// Louver swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FanDirection {
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl WireCode for FanDirection {
    const CODES: &'static [(&'static str, Self)] = &[
        ("0", FanDirection::Off),
        ("1", FanDirection::Vertical),
        ("2", FanDirection::Horizontal),
        ("3", FanDirection::Both),
    ];
}

/// Setpoint literals devices report instead of a number in modes without a
/// temperature target.
pub const SETPOINT_SENTINELS: &[&str] = &["M", "--"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TargetTemperature {
    Degrees(Temperature),
    /// A non-numeric setpoint such as `M` (dehumidify) or `--` (fan only).
    Sentinel(String),
}

impl TargetTemperature {
    pub fn degrees(&self) -> Option<Temperature> {
        match self {
            TargetTemperature::Degrees(t) => Some(*t),
            TargetTemperature::Sentinel(_) => None,
        }
    }
}

impl From<Temperature> for TargetTemperature {
    fn from(t: Temperature) -> Self {
        TargetTemperature::Degrees(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetHumidity {
    Percent(u8),
    Auto,
    NotSet,
}

impl TargetHumidity {
    pub(crate) const AUTO: &'static str = "AUTO";
    pub(crate) const NOT_SET: &'static str = "--";
}
