use std::collections::HashMap;

use tracing::warn;

use crate::codec::{self, Encoding, FieldValue};
use crate::error::{DecodeError, ValidationError};
use crate::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// One wire key a payload class understands. Keys a device sends that are
/// not in the class table are ignored on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub encoding: Encoding,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn required(key: &'static str, name: &'static str, encoding: Encoding) -> Self {
        Self {
            key,
            name,
            encoding,
            presence: Presence::Required,
        }
    }

    pub const fn optional(key: &'static str, name: &'static str, encoding: Encoding) -> Self {
        Self {
            key,
            name,
            encoding,
            presence: Presence::Optional,
        }
    }

    pub fn decode(&self, raw: &str) -> Result<FieldValue, DecodeError> {
        codec::decode(self.encoding, self.key, raw)
    }
}

const READING: Encoding = Encoding::Nullable(&Encoding::Decimal);
const PERCENT_READING: Encoding = Encoding::Nullable(&Encoding::Percent);
const INTEGER_READING: Encoding = Encoding::Nullable(&Encoding::Integer);
const CLOCK: Encoding = Encoding::Nullable(&Encoding::Timestamp);

pub const BASIC_INFO: &[FieldSpec] = &[
    FieldSpec::optional("type", "device_type", Encoding::Text),
    FieldSpec::optional("reg", "region", Encoding::Text),
    FieldSpec::optional("ver", "firmware_version", Encoding::Text),
    FieldSpec::optional("rev", "revision", Encoding::Text),
    FieldSpec::required("name", "name", Encoding::Escaped),
    FieldSpec::optional("adp_kind", "adapter_kind", Encoding::Integer),
    FieldSpec::required("mac", "mac", Encoding::Mac),
    FieldSpec::optional("adp_mode", "adapter_mode", Encoding::Text),
];

/// Also the exact key set and order of a set request.
pub const CONTROL_INFO: &[FieldSpec] = &[
    FieldSpec::required("pow", "power", Encoding::Flag),
    FieldSpec::required("mode", "mode", Encoding::Mode),
    FieldSpec::required("stemp", "target_temperature", Encoding::Setpoint),
    FieldSpec::required("shum", "target_humidity", Encoding::Humidity),
    FieldSpec::required("f_rate", "fan_rate", Encoding::FanRate),
    FieldSpec::required("f_dir", "fan_direction", Encoding::FanDirection),
];

pub const SENSOR_INFO: &[FieldSpec] = &[
    FieldSpec::required("htemp", "indoor_temperature", Encoding::Decimal),
    FieldSpec::optional("hhum", "humidity", PERCENT_READING),
    FieldSpec::optional("otemp", "outdoor_temperature", READING),
    FieldSpec::optional("err", "error_code", Encoding::Integer),
    FieldSpec::optional("cmpfreq", "compressor_frequency", INTEGER_READING),
];

pub const MODEL_INFO: &[FieldSpec] = &[
    FieldSpec::required("model", "model", Encoding::Text),
    FieldSpec::optional("humd", "humidity_supported", Encoding::Flag),
    FieldSpec::optional("en_frate", "fan_rate_supported", Encoding::Flag),
    FieldSpec::optional("en_fdir", "fan_direction_supported", Encoding::Flag),
    FieldSpec::optional("s_fdir", "fan_direction_steps", Encoding::Integer),
];

pub const WEEK_POWER: &[FieldSpec] = &[
    FieldSpec::required("today_runtime", "today_runtime", Encoding::Integer),
    FieldSpec::required("datas", "week_watt_hours", Encoding::List),
];

pub const YEAR_POWER: &[FieldSpec] = &[
    FieldSpec::required("previous_year", "previous_year", Encoding::List),
    FieldSpec::required("this_year", "this_year", Encoding::List),
];

pub const WEEK_POWER_EX: &[FieldSpec] = &[
    FieldSpec::optional("s_dayw", "day_of_week", Encoding::Integer),
    FieldSpec::required("week_heat", "week_heat", Encoding::List),
    FieldSpec::required("week_cool", "week_cool", Encoding::List),
];

pub const YEAR_POWER_EX: &[FieldSpec] = &[
    FieldSpec::required("curr_year_heat", "this_year_heat", Encoding::List),
    FieldSpec::required("prev_year_heat", "previous_year_heat", Encoding::List),
    FieldSpec::required("curr_year_cool", "this_year_cool", Encoding::List),
    FieldSpec::required("prev_year_cool", "previous_year_cool", Encoding::List),
];

pub const CLOCK_INFO: &[FieldSpec] = &[FieldSpec::required("cur", "device_time", CLOCK)];

pub const PRICE_INFO: &[FieldSpec] = &[
    FieldSpec::required("price_int", "price_int", Encoding::Integer),
    FieldSpec::required("price_dec", "price_dec", Encoding::Integer),
];

pub const TARGET_INFO: &[FieldSpec] = &[FieldSpec::required("target", "target", Encoding::Integer)];

pub const NOTIFY_INFO: &[FieldSpec] = &[
    FieldSpec::optional("auto_off_flg", "auto_off", Encoding::Flag),
    FieldSpec::optional("auto_off_tm", "auto_off_time", Encoding::Text),
];

pub const REMOTE_METHOD: &[FieldSpec] = &[
    FieldSpec::required("method", "method", Encoding::Text),
    FieldSpec::optional("notice_ip_int", "notice_ip_interval", Encoding::Integer),
    FieldSpec::optional("notice_sync_int", "notice_sync_interval", Encoding::Integer),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadClass {
    Basic,
    Control,
    Sensor,
    Model,
    WeekPower,
    YearPower,
    WeekPowerEx,
    YearPowerEx,
    Clock,
    Price,
    Target,
    Notify,
    RemoteMethod,
}

impl PayloadClass {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            PayloadClass::Basic => BASIC_INFO,
            PayloadClass::Control => CONTROL_INFO,
            PayloadClass::Sensor => SENSOR_INFO,
            PayloadClass::Model => MODEL_INFO,
            PayloadClass::WeekPower => WEEK_POWER,
            PayloadClass::YearPower => YEAR_POWER,
            PayloadClass::WeekPowerEx => WEEK_POWER_EX,
            PayloadClass::YearPowerEx => YEAR_POWER_EX,
            PayloadClass::Clock => CLOCK_INFO,
            PayloadClass::Price => PRICE_INFO,
            PayloadClass::Target => TARGET_INFO,
            PayloadClass::Notify => NOTIFY_INFO,
            PayloadClass::RemoteMethod => REMOTE_METHOD,
        }
    }
}

/// Result of running a table over a payload. Required-field problems are
/// collected in `problems`. An optional field that is present but fails to
/// decode has no value and is kept in `malformed`, so it stays
/// distinguishable from an absent key.
#[derive(Debug, Clone, Default)]
pub struct DecodedFields {
    values: HashMap<&'static str, FieldValue>,
    problems: Vec<ValidationError>,
    malformed: Vec<DecodeError>,
}

pub fn decode_fields(table: &'static [FieldSpec], payload: &Payload) -> DecodedFields {
    let mut decoded = DecodedFields::default();
    for spec in table {
        match (payload.get(spec.key), spec.presence) {
            (Some(raw), presence) => match spec.decode(raw) {
                Ok(value) => {
                    decoded.values.insert(spec.key, value);
                }
                Err(e) if presence == Presence::Required => {
                    decoded.problems.push(ValidationError::Invalid(e));
                }
                Err(e) => {
                    warn!(key = spec.key, raw, error = %e, "undecodable optional field");
                    decoded.malformed.push(e);
                }
            },
            (None, Presence::Required) => decoded.problems.push(ValidationError::Missing {
                field: spec.name,
                key: spec.key,
            }),
            (None, Presence::Optional) => {}
        }
    }
    decoded
}

impl DecodedFields {
    pub fn problems(&self) -> &[ValidationError] {
        &self.problems
    }

    pub fn malformed(&self) -> &[DecodeError] {
        &self.malformed
    }

    pub fn take_malformed(&mut self) -> Vec<DecodeError> {
        std::mem::take(&mut self.malformed)
    }

    /// Fails with every collected problem, if any.
    pub fn check(self) -> Result<Self, Vec<ValidationError>> {
        if self.problems.is_empty() {
            Ok(self)
        } else {
            Err(self.problems)
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn take(&mut self, key: &str) -> Option<FieldValue> {
        self.values.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse;

    #[test]
    fn tables_have_unique_keys() {
        for class in [
            PayloadClass::Basic,
            PayloadClass::Control,
            PayloadClass::Sensor,
            PayloadClass::Model,
            PayloadClass::WeekPower,
            PayloadClass::YearPower,
            PayloadClass::WeekPowerEx,
            PayloadClass::YearPowerEx,
            PayloadClass::Clock,
            PayloadClass::Price,
            PayloadClass::Target,
            PayloadClass::Notify,
            PayloadClass::RemoteMethod,
        ] {
            let table = class.fields();
            for (i, spec) in table.iter().enumerate() {
                assert!(
                    !table[i + 1..].iter().any(|s| s.key == spec.key),
                    "{class:?} repeats {}",
                    spec.key
                );
            }
        }
    }

    #[test]
    fn collects_every_required_problem() {
        let payload = parse("mode=3,stemp=hot,shum=0,f_rate=A,f_dir=0").unwrap();
        let decoded = decode_fields(CONTROL_INFO, &payload);
        let problems = decoded.problems();
        assert_eq!(problems.len(), 2);
        assert_eq!(
            problems[0],
            ValidationError::Missing {
                field: "power",
                key: "pow"
            }
        );
        assert_eq!(problems[1].field(), "stemp");
    }

    #[test]
    fn optional_decode_failure_is_kept_as_malformed() {
        let payload = parse("htemp=24.0,otemp=cold").unwrap();
        let decoded = decode_fields(SENSOR_INFO, &payload).check().unwrap();
        assert!(decoded.get("otemp").is_none());
        assert!(decoded.get("htemp").is_some());
        assert_eq!(decoded.malformed().len(), 1);
        assert_eq!(decoded.malformed()[0].key, "otemp");
        assert_eq!(decoded.malformed()[0].raw, "cold");
    }

    #[test]
    fn absent_optional_field_is_not_malformed() {
        let payload = parse("htemp=24.0").unwrap();
        let decoded = decode_fields(SENSOR_INFO, &payload);
        assert!(decoded.problems().is_empty());
        assert!(decoded.malformed().is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let payload = parse("htemp=24.0,dt1=25.0,b_mode=4").unwrap();
        assert!(decode_fields(SENSOR_INFO, &payload).check().is_ok());
    }
}
