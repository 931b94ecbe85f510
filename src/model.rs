use chrono::NaiveDateTime;
use serde::Serialize;

use crate::codec::FieldValue;
use crate::error::{DecodeError, ValidationError};
use crate::fields::{DecodedFields, PayloadClass, decode_fields};
use crate::payload::Payload;
use crate::types::*;

/// Setpoint grid in tenths of a degree.
const SETPOINT_STEP_TENTHS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureRange {
    pub min: Temperature,
    pub max: Temperature,
}

impl TemperatureRange {
    pub const fn new(min: Temperature, max: Temperature) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, t: Temperature) -> bool {
        self.min <= t && t <= self.max
    }
}

/// Accepted setpoint range per operation mode. `None` means the mode carries
/// no temperature constraint this crate can confirm.
///
/// Defaults: auto 18-31, heat 10-31, cool 18-33 (degrees C). Units differ by
/// firmware; override with the values your model documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureLimits {
    pub auto: Option<TemperatureRange>,
    pub dehumidify: Option<TemperatureRange>,
    pub cool: Option<TemperatureRange>,
    pub heat: Option<TemperatureRange>,
    pub fan: Option<TemperatureRange>,
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        let range = |min, max| {
            Some(TemperatureRange::new(
                Temperature::from_tenths(min),
                Temperature::from_tenths(max),
            ))
        };
        Self {
            auto: range(180, 310),
            dehumidify: None,
            cool: range(180, 330),
            heat: range(100, 310),
            fan: None,
        }
    }
}

impl TemperatureLimits {
    /// Unknown mode codes have no range.
    pub fn range_for(&self, mode: &Coded<OperationMode>) -> Option<TemperatureRange> {
        match mode.known()? {
            m if m.is_auto() => self.auto,
            OperationMode::Dehumidify => self.dehumidify,
            OperationMode::Cool => self.cool,
            OperationMode::Heat => self.heat,
            OperationMode::Fan => self.fan,
            _ => None,
        }
    }
}

/// Where a [`ControlInfo`] stands relative to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    Fetched,
    Mutated,
    Validated,
    Committed,
}

impl SyncState {
    pub fn in_sync(&self) -> bool {
        matches!(self, SyncState::Fetched | SyncState::Committed)
    }
}

/// Read-only adapter identity, fetched once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicInfo {
    pub name: String,
    pub mac: MacAddress,
    pub device_type: Option<String>,
    pub region: Option<String>,
    pub firmware_version: Option<String>,
    pub revision: Option<String>,
    pub adapter_kind: Option<i64>,
    pub adapter_mode: Option<String>,
    /// Optional keys that were present but did not decode.
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl BasicInfo {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Basic.fields(), payload).check()?;
        Ok(Self {
            name: required(&mut f, "name", "name", escaped)?,
            mac: required(&mut f, "mac", "mac", mac)?,
            device_type: f.take("type").and_then(text),
            region: f.take("reg").and_then(text),
            firmware_version: f.take("ver").and_then(text),
            revision: f.take("rev").and_then(text),
            adapter_kind: f.take("adp_kind").and_then(integer),
            adapter_mode: f.take("adp_mode").and_then(text),
            malformed: f.take_malformed(),
        })
    }
}

/// Desired device configuration. Mutations stay local until committed with
/// a full set request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlInfo {
    power: bool,
    mode: Coded<OperationMode>,
    target_temperature: TargetTemperature,
    target_humidity: TargetHumidity,
    fan_rate: Coded<FanRate>,
    fan_direction: Coded<FanDirection>,
    #[serde(skip)]
    limits: TemperatureLimits,
    state: SyncState,
}

impl ControlInfo {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        Self::from_payload_with_limits(payload, TemperatureLimits::default())
    }

    pub fn from_payload_with_limits(
        payload: &Payload,
        limits: TemperatureLimits,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Control.fields(), payload).check()?;
        Ok(Self {
            power: required(&mut f, "pow", "power", flag)?,
            mode: required(&mut f, "mode", "mode", |v| match v {
                FieldValue::Mode(m) => Some(m),
                _ => None,
            })?,
            target_temperature: required(&mut f, "stemp", "target_temperature", |v| match v {
                FieldValue::Setpoint(t) => Some(t),
                _ => None,
            })?,
            target_humidity: required(&mut f, "shum", "target_humidity", |v| match v {
                FieldValue::Humidity(h) => Some(h),
                _ => None,
            })?,
            fan_rate: required(&mut f, "f_rate", "fan_rate", |v| match v {
                FieldValue::FanRate(r) => Some(r),
                _ => None,
            })?,
            fan_direction: required(&mut f, "f_dir", "fan_direction", |v| match v {
                FieldValue::FanDirection(d) => Some(d),
                _ => None,
            })?,
            limits,
            state: SyncState::Fetched,
        })
    }

    pub fn power(&self) -> bool {
        self.power
    }

    pub fn mode(&self) -> &Coded<OperationMode> {
        &self.mode
    }

    pub fn target_temperature(&self) -> &TargetTemperature {
        &self.target_temperature
    }

    pub fn target_humidity(&self) -> TargetHumidity {
        self.target_humidity
    }

    pub fn fan_rate(&self) -> &Coded<FanRate> {
        &self.fan_rate
    }

    pub fn fan_direction(&self) -> &Coded<FanDirection> {
        &self.fan_direction
    }

    pub fn limits(&self) -> &TemperatureLimits {
        &self.limits
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn set_power(&mut self, on: bool) {
        self.power = on;
        self.state = SyncState::Mutated;
    }

    /// Does not re-check the setpoint; set the mode first, then the
    /// temperature, or call [`ControlInfo::validate`].
    pub fn set_mode(
        &mut self,
        mode: impl Into<Coded<OperationMode>>,
    ) -> Result<(), ValidationError> {
        let mode = mode.into();
        check_code("mode", &mode)?;
        self.mode = mode;
        self.state = SyncState::Mutated;
        Ok(())
    }

    /// Checked against the range of the current mode. Nothing changes on error.
    pub fn set_target_temperature(
        &mut self,
        target: impl Into<TargetTemperature>,
    ) -> Result<(), ValidationError> {
        let target = target.into();
        self.check_temperature(&target)?;
        self.target_temperature = target;
        self.state = SyncState::Mutated;
        Ok(())
    }

    pub fn set_target_humidity(&mut self, target: TargetHumidity) -> Result<(), ValidationError> {
        check_humidity(target)?;
        self.target_humidity = target;
        self.state = SyncState::Mutated;
        Ok(())
    }

    pub fn set_fan_rate(&mut self, rate: impl Into<Coded<FanRate>>) -> Result<(), ValidationError> {
        let rate = rate.into();
        check_code("fan_rate", &rate)?;
        self.fan_rate = rate;
        self.state = SyncState::Mutated;
        Ok(())
    }

    pub fn set_fan_direction(
        &mut self,
        direction: impl Into<Coded<FanDirection>>,
    ) -> Result<(), ValidationError> {
        let direction = direction.into();
        check_code("fan_direction", &direction)?;
        self.fan_direction = direction;
        self.state = SyncState::Mutated;
        Ok(())
    }

    pub fn set_limits(&mut self, limits: TemperatureLimits) {
        self.limits = limits;
    }

    /// Re-checks every cross-field rule. A mutated record becomes
    /// `Validated` when nothing is wrong.
    pub fn validate(&mut self) -> Result<(), Vec<ValidationError>> {
        let problems: Vec<ValidationError> = [
            self.check_temperature(&self.target_temperature),
            check_humidity(self.target_humidity),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if !problems.is_empty() {
            return Err(problems);
        }
        if self.state == SyncState::Mutated {
            self.state = SyncState::Validated;
        }
        Ok(())
    }

    /// Records a successful set request.
    pub fn mark_committed(&mut self) {
        if self.state == SyncState::Validated {
            self.state = SyncState::Committed;
        }
    }

    /// Every control field in canonical wire order.
    pub fn field_values(&self) -> [(&'static str, FieldValue); 6] {
        [
            ("pow", FieldValue::Flag(self.power)),
            ("mode", FieldValue::Mode(self.mode.clone())),
            ("stemp", FieldValue::Setpoint(self.target_temperature.clone())),
            ("shum", FieldValue::Humidity(self.target_humidity)),
            ("f_rate", FieldValue::FanRate(self.fan_rate.clone())),
            ("f_dir", FieldValue::FanDirection(self.fan_direction.clone())),
        ]
    }

    fn check_temperature(&self, target: &TargetTemperature) -> Result<(), ValidationError> {
        let range = self.limits.range_for(&self.mode);
        let t = match target {
            TargetTemperature::Degrees(t) => t,
            TargetTemperature::Sentinel(s) => {
                let reason = if !SETPOINT_SENTINELS.contains(&s.as_str()) {
                    "not a setpoint literal"
                } else if range.is_some() {
                    "mode needs a numeric setpoint"
                } else {
                    return Ok(());
                };
                return Err(ValidationError::Unsupported {
                    field: "target_temperature",
                    value: s.clone(),
                    reason,
                });
            }
        };
        if t.tenths() % SETPOINT_STEP_TENTHS != 0 {
            return Err(ValidationError::Resolution {
                field: "target_temperature",
                value: t.celsius(),
                step: f64::from(SETPOINT_STEP_TENTHS) / 10.0,
            });
        }
        match range {
            Some(range) if !range.contains(*t) => Err(ValidationError::OutOfRange {
                field: "target_temperature",
                value: t.celsius(),
                min: range.min.celsius(),
                max: range.max.celsius(),
            }),
            _ => Ok(()),
        }
    }
}

/// A caller-supplied code must be sendable as a query value and must not
/// spell a code the lookup table already knows.
fn check_code<T: WireCode>(field: &'static str, code: &Coded<T>) -> Result<(), ValidationError> {
    let Coded::Unknown(raw) = code else {
        return Ok(());
    };
    let reason = if raw.is_empty() {
        "empty code"
    } else if !raw.bytes().all(|b| b.is_ascii_graphic()) || raw.contains([',', '=', '&']) {
        "code contains a delimiter or non-printable byte"
    } else if T::from_code(raw).is_some() {
        "code belongs to a known value"
    } else {
        return Ok(());
    };
    Err(ValidationError::Unsupported {
        field,
        value: raw.clone(),
        reason,
    })
}

fn check_humidity(target: TargetHumidity) -> Result<(), ValidationError> {
    match target {
        TargetHumidity::Percent(p) if p > 100 => Err(ValidationError::OutOfRange {
            field: "target_humidity",
            value: f64::from(p),
            min: 0.0,
            max: 100.0,
        }),
        _ => Ok(()),
    }
}

/// Live readings. Readings the unit does not report stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorInfo {
    pub indoor_temperature: Temperature,
    pub outdoor_temperature: Option<Temperature>,
    pub humidity: Option<u8>,
    pub compressor_frequency: Option<i64>,
    pub error_code: Option<i64>,
    /// Readings that were reported but did not decode. These are `None`
    /// above, like readings the unit omits.
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl SensorInfo {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Sensor.fields(), payload).check()?;
        Ok(Self {
            indoor_temperature: required(&mut f, "htemp", "indoor_temperature", decimal)?,
            outdoor_temperature: f.take("otemp").and_then(decimal),
            humidity: f.take("hhum").and_then(|v| match v {
                FieldValue::Percent(p) => Some(p),
                _ => None,
            }),
            compressor_frequency: f.take("cmpfreq").and_then(integer),
            error_code: f.take("err").and_then(integer),
            malformed: f.take_malformed(),
        })
    }

    /// True when a reading was reported but could not be decoded.
    pub fn has_malformed(&self) -> bool {
        !self.malformed.is_empty()
    }

    /// Compressor running, when the unit reports its frequency.
    pub fn compressor_running(&self) -> Option<bool> {
        self.compressor_frequency.map(|hz| hz > 0)
    }
}

/// Capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub humidity_supported: Option<bool>,
    pub fan_rate_supported: Option<bool>,
    pub fan_direction_supported: Option<bool>,
    pub fan_direction_steps: Option<i64>,
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl ModelInfo {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Model.fields(), payload).check()?;
        Ok(Self {
            model: required(&mut f, "model", "model", text)?,
            humidity_supported: f.take("humd").and_then(flag),
            fan_rate_supported: f.take("en_frate").and_then(flag),
            fan_direction_supported: f.take("en_fdir").and_then(flag),
            fan_direction_steps: f.take("s_fdir").and_then(integer),
            malformed: f.take_malformed(),
        })
    }
}

/// Energy counters from the week and year endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerUsage {
    /// Minutes of operation today.
    pub today_runtime: i64,
    /// Watt-hours per day, today last.
    pub week_watt_hours: Vec<i64>,
    /// Units of 100 Wh per month, January first.
    pub this_year: Vec<i64>,
    pub previous_year: Vec<i64>,
}

impl PowerUsage {
    pub fn from_payloads(week: &Payload, year: &Payload) -> Result<Self, Vec<ValidationError>> {
        let (mut w, year) = decode_both(
            decode_fields(PayloadClass::WeekPower.fields(), week),
            YearPower::from_payload(year),
        )?;
        Ok(Self {
            today_runtime: required(&mut w, "today_runtime", "today_runtime", integer)?,
            week_watt_hours: required(&mut w, "datas", "week_watt_hours", list)?,
            this_year: year.this_year,
            previous_year: year.previous_year,
        })
    }

    pub fn today_watt_hours(&self) -> Option<i64> {
        self.week_watt_hours.last().copied()
    }

    /// Consumption in kWh for `month` of this year (January is 1).
    pub fn month_kwh(&self, month: u32) -> Option<f64> {
        month_kwh(&self.this_year, month)
    }
}

/// Monthly counters from the year endpoint alone, in units of 100 Wh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearPower {
    pub this_year: Vec<i64>,
    pub previous_year: Vec<i64>,
}

impl YearPower {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::YearPower.fields(), payload).check()?;
        Ok(Self {
            this_year: required(&mut f, "this_year", "this_year", list)?,
            previous_year: required(&mut f, "previous_year", "previous_year", list)?,
        })
    }

    /// `None` when the device has not reported `month` yet.
    pub fn month_kwh(&self, month: u32) -> Option<f64> {
        month_kwh(&self.this_year, month)
    }
}

fn month_kwh(months: &[i64], month: u32) -> Option<f64> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    months.get(index).map(|units| *units as f64 / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnergyMode {
    Heat,
    Cool,
}

/// Heating and cooling consumption reported separately by the `_ex` power
/// endpoints. Every counter is in units of 100 Wh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowerUsageByMode {
    pub day_of_week: Option<i64>,
    /// Per day, today first.
    pub week_heat: Vec<i64>,
    pub week_cool: Vec<i64>,
    /// Per month, January first.
    pub this_year_heat: Vec<i64>,
    pub previous_year_heat: Vec<i64>,
    pub this_year_cool: Vec<i64>,
    pub previous_year_cool: Vec<i64>,
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl PowerUsageByMode {
    pub fn from_payloads(week: &Payload, year: &Payload) -> Result<Self, Vec<ValidationError>> {
        let (mut w, mut y) = decode_both(
            decode_fields(PayloadClass::WeekPowerEx.fields(), week),
            decode_fields(PayloadClass::YearPowerEx.fields(), year).check(),
        )?;
        Ok(Self {
            day_of_week: w.take("s_dayw").and_then(integer),
            week_heat: required(&mut w, "week_heat", "week_heat", list)?,
            week_cool: required(&mut w, "week_cool", "week_cool", list)?,
            this_year_heat: required(&mut y, "curr_year_heat", "this_year_heat", list)?,
            previous_year_heat: required(&mut y, "prev_year_heat", "previous_year_heat", list)?,
            this_year_cool: required(&mut y, "curr_year_cool", "this_year_cool", list)?,
            previous_year_cool: required(&mut y, "prev_year_cool", "previous_year_cool", list)?,
            malformed: w.take_malformed(),
        })
    }

    pub fn today_watt_hours(&self, mode: EnergyMode) -> Option<i64> {
        let week = match mode {
            EnergyMode::Heat => &self.week_heat,
            EnergyMode::Cool => &self.week_cool,
        };
        week.first().map(|units| units * 100)
    }

    pub fn month_kwh(&self, mode: EnergyMode, month: u32) -> Option<f64> {
        match mode {
            EnergyMode::Heat => month_kwh(&self.this_year_heat, month),
            EnergyMode::Cool => month_kwh(&self.this_year_cool, month),
        }
    }
}

/// Problems from the first payload come before those of the second.
fn decode_both<T>(
    first: DecodedFields,
    second: Result<T, Vec<ValidationError>>,
) -> Result<(DecodedFields, T), Vec<ValidationError>> {
    let mut problems = first.problems().to_vec();
    match second {
        Ok(second) if problems.is_empty() => Ok((first, second)),
        Ok(_) => Err(problems),
        Err(more) => {
            problems.extend(more);
            Err(problems)
        }
    }
}

/// Electricity price as the adapter stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Price {
    pub integer: i64,
    pub decimal: i64,
}

impl Price {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Price.fields(), payload).check()?;
        Ok(Self {
            integer: required(&mut f, "price_int", "price_int", integer)?,
            decimal: required(&mut f, "price_dec", "price_dec", integer)?,
        })
    }
}

/// Consumption target configured on the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerTarget {
    pub target: i64,
}

impl PowerTarget {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Target.fields(), payload).check()?;
        Ok(Self {
            target: required(&mut f, "target", "target", integer)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifySettings {
    pub auto_off: Option<bool>,
    /// Kept as sent; unset adapters report `- -`.
    pub auto_off_time: Option<String>,
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl NotifySettings {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::Notify.fields(), payload).check()?;
        Ok(Self {
            auto_off: f.take("auto_off_flg").and_then(flag),
            auto_off_time: f.take("auto_off_tm").and_then(text),
            malformed: f.take_malformed(),
        })
    }
}

/// How the adapter reaches its cloud service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteMethod {
    pub method: String,
    /// Seconds.
    pub notice_ip_interval: Option<i64>,
    /// Seconds.
    pub notice_sync_interval: Option<i64>,
    #[serde(skip)]
    pub malformed: Vec<DecodeError>,
}

impl RemoteMethod {
    pub fn from_payload(payload: &Payload) -> Result<Self, Vec<ValidationError>> {
        let mut f = decode_fields(PayloadClass::RemoteMethod.fields(), payload).check()?;
        Ok(Self {
            method: required(&mut f, "method", "method", text)?,
            notice_ip_interval: f.take("notice_ip_int").and_then(integer),
            notice_sync_interval: f.take("notice_sync_int").and_then(integer),
            malformed: f.take_malformed(),
        })
    }
}

/// Device local time; `None` when the clock has not been set.
pub fn device_time(payload: &Payload) -> Result<Option<NaiveDateTime>, Vec<ValidationError>> {
    let mut f = decode_fields(PayloadClass::Clock.fields(), payload).check()?;
    match f.take("cur") {
        Some(FieldValue::Timestamp(ts)) => Ok(Some(ts)),
        Some(FieldValue::Null) => Ok(None),
        _ => Err(vec![ValidationError::Missing {
            field: "device_time",
            key: "cur",
        }]),
    }
}

fn required<T>(
    fields: &mut DecodedFields,
    key: &'static str,
    name: &'static str,
    extract: impl FnOnce(FieldValue) -> Option<T>,
) -> Result<T, Vec<ValidationError>> {
    match fields.take(key) {
        Some(value) => extract(value.clone()).ok_or_else(|| {
            vec![ValidationError::Invalid(DecodeError::new(
                key,
                &crate::codec::encode(&value),
                "unexpected value kind",
            ))]
        }),
        None => Err(vec![ValidationError::Missing { field: name, key }]),
    }
}

fn flag(v: FieldValue) -> Option<bool> {
    match v {
        FieldValue::Flag(b) => Some(b),
        _ => None,
    }
}

fn integer(v: FieldValue) -> Option<i64> {
    match v {
        FieldValue::Integer(n) => Some(n),
        _ => None,
    }
}

fn decimal(v: FieldValue) -> Option<Temperature> {
    match v {
        FieldValue::Decimal(t) | FieldValue::Tenths(t) => Some(t),
        _ => None,
    }
}

fn text(v: FieldValue) -> Option<String> {
    match v {
        FieldValue::Text(s) => Some(s),
        _ => None,
    }
}

fn escaped(v: FieldValue) -> Option<String> {
    match v {
        FieldValue::Escaped(s) => Some(s),
        _ => None,
    }
}

fn mac(v: FieldValue) -> Option<MacAddress> {
    match v {
        FieldValue::Mac(m) => Some(m),
        _ => None,
    }
}

fn list(v: FieldValue) -> Option<Vec<i64>> {
    match v {
        FieldValue::List(items) => Some(items),
        _ => None,
    }
}
