use crate::codec::encode;
use crate::error::{Error, Result};
use crate::fields::PayloadClass;
use crate::model::ControlInfo;
use crate::payload::{Payload, parse};

pub const BASIC_INFO_PATH: &str = "/common/basic_info";
pub const CONTROL_INFO_PATH: &str = "/aircon/get_control_info";
pub const SET_CONTROL_INFO_PATH: &str = "/aircon/set_control_info";
pub const SENSOR_INFO_PATH: &str = "/aircon/get_sensor_info";
pub const MODEL_INFO_PATH: &str = "/aircon/get_model_info";
pub const WEEK_POWER_PATH: &str = "/aircon/get_week_power";
pub const YEAR_POWER_PATH: &str = "/aircon/get_year_power";
pub const WEEK_POWER_EX_PATH: &str = "/aircon/get_week_power_ex";
pub const YEAR_POWER_EX_PATH: &str = "/aircon/get_year_power_ex";
pub const DATETIME_PATH: &str = "/common/get_datetime";
pub const PRICE_PATH: &str = "/aircon/get_price";
pub const TARGET_PATH: &str = "/aircon/get_target";
pub const NOTIFY_PATH: &str = "/common/get_notify";
pub const REMOTE_METHOD_PATH: &str = "/common/get_remote_method";

const RET_KEY: &str = "ret";
const RET_OK: &str = "OK";

/// Read endpoint for a payload class.
pub fn read_path(class: PayloadClass) -> &'static str {
    match class {
        PayloadClass::Basic => BASIC_INFO_PATH,
        PayloadClass::Control => CONTROL_INFO_PATH,
        PayloadClass::Sensor => SENSOR_INFO_PATH,
        PayloadClass::Model => MODEL_INFO_PATH,
        PayloadClass::WeekPower => WEEK_POWER_PATH,
        PayloadClass::YearPower => YEAR_POWER_PATH,
        PayloadClass::WeekPowerEx => WEEK_POWER_EX_PATH,
        PayloadClass::YearPowerEx => YEAR_POWER_EX_PATH,
        PayloadClass::Clock => DATETIME_PATH,
        PayloadClass::Price => PRICE_PATH,
        PayloadClass::Target => TARGET_PATH,
        PayloadClass::Notify => NOTIFY_PATH,
        PayloadClass::RemoteMethod => REMOTE_METHOD_PATH,
    }
}

/// Full set request for `control`: one pair per control field in canonical
/// order, changed or not. The set endpoint replaces the whole control state,
/// so a partial payload would reset the missing fields.
pub fn build_set_payload(control: &ControlInfo) -> Payload {
    let mut payload = Payload::new();
    for (key, value) in control.field_values() {
        payload.insert(key, encode(&value));
    }
    payload
}

/// Parses a response body and checks its `ret=` status. The status pair is
/// removed from the returned payload.
pub fn open_envelope(path: &str, body: &str) -> Result<Payload> {
    if body.trim().is_empty() {
        return Err(Error::EmptyResponse {
            path: path.to_string(),
        });
    }
    let mut payload = parse(body)?;
    match payload.remove(RET_KEY).as_deref() {
        Some(RET_OK) => Ok(payload),
        Some(reason) => Err(Error::Rejected {
            path: path.to_string(),
            reason: reason.to_string(),
        }),
        None => Err(Error::Rejected {
            path: path.to_string(),
            reason: "no ret status".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::CONTROL_INFO;
    use crate::payload::serialize;

    #[test]
    fn set_payload_covers_control_table() {
        let control = ControlInfo::from_payload(
            &parse("pow=0,mode=1,stemp=22.5,shum=AUTO,f_rate=B,f_dir=3").unwrap(),
        )
        .unwrap();
        let payload = build_set_payload(&control);
        let keys: Vec<_> = payload.iter().map(|(k, _)| k).collect();
        let table: Vec<_> = CONTROL_INFO.iter().map(|s| s.key).collect();
        assert_eq!(keys, table);
        assert_eq!(
            serialize(&payload, CONTROL_INFO).unwrap(),
            "pow=0,mode=1,stemp=22.5,shum=AUTO,f_rate=B,f_dir=3"
        );
    }

    #[test]
    fn envelope_ok_strips_ret() {
        let payload = open_envelope(SENSOR_INFO_PATH, "ret=OK,htemp=24.0").unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("htemp"), Some("24.0"));
    }

    #[test]
    fn envelope_rejections() {
        match open_envelope(SET_CONTROL_INFO_PATH, "ret=PARAM NG") {
            Err(Error::Rejected { reason, .. }) => assert_eq!(reason, "PARAM NG"),
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert!(matches!(
            open_envelope(SENSOR_INFO_PATH, "htemp=24.0"),
            Err(Error::Rejected { .. })
        ));
        assert!(matches!(
            open_envelope(SENSOR_INFO_PATH, " \n"),
            Err(Error::EmptyResponse { .. })
        ));
        assert!(matches!(
            open_envelope(SENSOR_INFO_PATH, "ret=OK,=1"),
            Err(Error::Format(_))
        ));
    }
}
