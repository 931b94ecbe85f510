use std::time::Duration;

use chrono::{Datelike, NaiveDateTime};
use reqwest::StatusCode;
use tracing::{debug, trace, warn};

use crate::fields::{CONTROL_INFO, PayloadClass};
use crate::logger::{MessageLogMode, MessageLogger};
use crate::model::*;
use crate::payload::{Payload, serialize};
use crate::protocol::{SET_CONTROL_INFO_PATH, build_set_payload, open_envelope, read_path};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DaikinClientBuilder {
    host: String,
    protocol: String,
    timeout: Duration,
    limits: TemperatureLimits,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl DaikinClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: "http".to_string(),
            timeout: DEFAULT_TIMEOUT,
            limits: TemperatureLimits::default(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Setpoint ranges applied to every [`ControlInfo`] this client reads.
    pub fn limits(mut self, limits: TemperatureLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<DaikinClient> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(DaikinClient {
            http,
            base_url: format!("{}://{}", self.protocol, self.host),
            limits: self.limits,
            basic_info: None,
            logger,
        })
    }
}

/// Session with one adapter. Basic info is cached after [`connect`]; every
/// other read goes to the device.
///
/// [`connect`]: DaikinClient::connect
pub struct DaikinClient {
    http: reqwest::Client,
    base_url: String,
    limits: TemperatureLimits,
    basic_info: Option<BasicInfo>,
    logger: Option<MessageLogger>,
}

impl DaikinClient {
    pub fn builder(host: impl Into<String>) -> DaikinClientBuilder {
        DaikinClientBuilder::new(host)
    }

    /// Fetches basic info on first call; later calls return the cached copy.
    pub async fn connect(&mut self) -> Result<&BasicInfo> {
        let info = match self.basic_info.take() {
            Some(info) => info,
            None => {
                let payload = self.fetch(PayloadClass::Basic).await?;
                let info = BasicInfo::from_payload(&payload)?;
                debug!(name = %info.name, mac = %info.mac, "connected to adapter");
                info
            }
        };
        Ok(self.basic_info.insert(info))
    }

    pub fn basic_info(&self) -> Option<&BasicInfo> {
        self.basic_info.as_ref()
    }

    pub async fn control_info(&mut self) -> Result<ControlInfo> {
        let payload = self.fetch(PayloadClass::Control).await?;
        Ok(ControlInfo::from_payload_with_limits(&payload, self.limits)?)
    }

    pub async fn sensor_info(&mut self) -> Result<SensorInfo> {
        let payload = self.fetch(PayloadClass::Sensor).await?;
        Ok(SensorInfo::from_payload(&payload)?)
    }

    pub async fn model_info(&mut self) -> Result<ModelInfo> {
        let payload = self.fetch(PayloadClass::Model).await?;
        Ok(ModelInfo::from_payload(&payload)?)
    }

    pub async fn power_usage(&mut self) -> Result<PowerUsage> {
        let week = self.fetch(PayloadClass::WeekPower).await?;
        let year = self.fetch(PayloadClass::YearPower).await?;
        Ok(PowerUsage::from_payloads(&week, &year)?)
    }

    /// Heating and cooling consumption from the `_ex` endpoints.
    pub async fn power_usage_by_mode(&mut self) -> Result<PowerUsageByMode> {
        let week = self.fetch(PayloadClass::WeekPowerEx).await?;
        let year = self.fetch(PayloadClass::YearPowerEx).await?;
        Ok(PowerUsageByMode::from_payloads(&week, &year)?)
    }

    /// Consumption in kWh for `month` of this year (January is 1). Without a
    /// month the device clock picks the current one; `None` when that clock
    /// is unset or the month has no counter yet.
    pub async fn month_power_consumption(&mut self, month: Option<u32>) -> Result<Option<f64>> {
        let month = match month {
            Some(month) => month,
            None => match self.clock().await? {
                Some(now) => now.month(),
                None => return Ok(None),
            },
        };
        let payload = self.fetch(PayloadClass::YearPower).await?;
        Ok(YearPower::from_payload(&payload)?.month_kwh(month))
    }

    pub async fn price(&mut self) -> Result<Price> {
        let payload = self.fetch(PayloadClass::Price).await?;
        Ok(Price::from_payload(&payload)?)
    }

    pub async fn power_target(&mut self) -> Result<PowerTarget> {
        let payload = self.fetch(PayloadClass::Target).await?;
        Ok(PowerTarget::from_payload(&payload)?)
    }

    pub async fn notify_settings(&mut self) -> Result<NotifySettings> {
        let payload = self.fetch(PayloadClass::Notify).await?;
        Ok(NotifySettings::from_payload(&payload)?)
    }

    pub async fn remote_method(&mut self) -> Result<RemoteMethod> {
        let payload = self.fetch(PayloadClass::RemoteMethod).await?;
        Ok(RemoteMethod::from_payload(&payload)?)
    }

    /// Device local time, `None` when its clock is unset.
    pub async fn clock(&mut self) -> Result<Option<NaiveDateTime>> {
        let payload = self.fetch(PayloadClass::Clock).await?;
        Ok(device_time(&payload)?)
    }

    /// Validates `control`, sends every control field and marks it
    /// committed when the device accepts. On error `control` is untouched
    /// apart from validation state.
    pub async fn set_control_info(&mut self, control: &mut ControlInfo) -> Result<()> {
        control.validate()?;
        let payload = build_set_payload(control);
        let text = serialize(&payload, CONTROL_INFO)?;
        debug!(payload = %text, "setting control info");

        self.get(SET_CONTROL_INFO_PATH, Some(&payload)).await?;
        control.mark_committed();
        Ok(())
    }

    /// One read request, returning the decoded pairs without `ret`.
    pub async fn raw(&mut self, class: PayloadClass) -> Result<Payload> {
        self.fetch(class).await
    }

    async fn fetch(&mut self, class: PayloadClass) -> Result<Payload> {
        let path = read_path(class);
        let payload = self.get(path, None).await?;
        if let Some(ref mut logger) = self.logger {
            logger.log_payload(path, &payload);
        }
        Ok(payload)
    }

    async fn get(&mut self, path: &str, query: Option<&Payload>) -> Result<Payload> {
        let url = format!("{}{}", self.base_url, path);
        trace!(url = %url, "GET");

        if let Some(ref mut logger) = self.logger {
            logger.log_request(path, query);
        }

        let mut request = self.http.get(&url);
        if let Some(query) = query {
            request = request.query(query.pairs());
        }
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if let Some(ref mut logger) = self.logger {
            logger.log_response(path, status.as_u16(), &body);
        }

        if status != StatusCode::OK {
            warn!(path, status = status.as_u16(), "unexpected HTTP status");
            return Err(Error::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        open_envelope(path, &body)
    }
}
