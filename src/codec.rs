use chrono::NaiveDateTime;

use crate::error::DecodeError;
use crate::types::*;

/// Device clock format used by `/common/get_datetime`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Separator inside list values (the pair delimiter `,` cannot appear).
pub const LIST_SEPARATOR: char = '/';

/// Literal a device sends for a nullable reading it does not report.
pub const NULL_LITERAL: &str = "-";

/// Wire representation of one key. Decoding rejects non-canonical spellings
/// so that `encode(&decode(e, k, s)?) == s`; the exceptions are MAC case and
/// `-0.0`, which canonicalise to upper case and `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `1` or `0`.
    Flag,
    /// Signed decimal integer.
    Integer,
    /// Integer 0 to 100.
    Percent,
    /// Fixed point with exactly one decimal digit, e.g. `21.5`, `-7.0`.
    Decimal,
    /// Integer count of tenths of a degree, e.g. `215`.
    Tenths,
    /// [`Encoding::Decimal`] or one of [`SETPOINT_SENTINELS`].
    Setpoint,
    /// Percent, `AUTO` or `--`.
    Humidity,
    Mode,
    FanRate,
    FanDirection,
    /// 12 hex digits.
    Mac,
    /// `/`-separated integers; the empty string is the empty list.
    List,
    /// Any text.
    Text,
    /// Text with every byte escaped as lower-case `%xx`.
    Escaped,
    /// `YYYY/MM/DD HH:MM:SS`.
    Timestamp,
    /// [`NULL_LITERAL`] or the inner encoding.
    Nullable(&'static Encoding),
}

/// A decoded field. The variant identifies the wire encoding, so
/// [`encode`] needs nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Flag(bool),
    Integer(i64),
    Percent(u8),
    Decimal(Temperature),
    Tenths(Temperature),
    Setpoint(TargetTemperature),
    Humidity(TargetHumidity),
    Mode(Coded<OperationMode>),
    FanRate(Coded<FanRate>),
    FanDirection(Coded<FanDirection>),
    Mac(MacAddress),
    List(Vec<i64>),
    Text(String),
    Escaped(String),
    Timestamp(NaiveDateTime),
    Null,
}

pub fn decode(encoding: Encoding, key: &str, raw: &str) -> Result<FieldValue, DecodeError> {
    let err = |reason| DecodeError::new(key, raw, reason);
    match encoding {
        Encoding::Flag => match raw {
            "1" => Ok(FieldValue::Flag(true)),
            "0" => Ok(FieldValue::Flag(false)),
            _ => Err(err("expected 1 or 0")),
        },
        Encoding::Integer => parse_integer(raw)
            .map(FieldValue::Integer)
            .ok_or_else(|| err("expected an integer")),
        Encoding::Percent => parse_percent(raw)
            .map(FieldValue::Percent)
            .ok_or_else(|| err("expected a percentage 0-100")),
        Encoding::Decimal => parse_decimal(raw)
            .map(FieldValue::Decimal)
            .ok_or_else(|| err("expected a decimal with one fractional digit")),
        Encoding::Tenths => parse_integer(raw)
            .and_then(|n| i32::try_from(n).ok())
            .map(|n| FieldValue::Tenths(Temperature::from_tenths(n)))
            .ok_or_else(|| err("expected an integer count of tenths")),
        Encoding::Setpoint => {
            if let Some(t) = parse_decimal(raw) {
                Ok(FieldValue::Setpoint(TargetTemperature::Degrees(t)))
            } else if SETPOINT_SENTINELS.contains(&raw) {
                Ok(FieldValue::Setpoint(TargetTemperature::Sentinel(
                    raw.to_string(),
                )))
            } else {
                Err(err("expected a decimal setpoint or M/--"))
            }
        }
        Encoding::Humidity => match raw {
            TargetHumidity::AUTO => Ok(FieldValue::Humidity(TargetHumidity::Auto)),
            TargetHumidity::NOT_SET => Ok(FieldValue::Humidity(TargetHumidity::NotSet)),
            _ => parse_percent(raw)
                .map(|p| FieldValue::Humidity(TargetHumidity::Percent(p)))
                .ok_or_else(|| err("expected a percentage, AUTO or --")),
        },
        Encoding::Mode => Ok(FieldValue::Mode(Coded::from_wire(raw))),
        Encoding::FanRate => Ok(FieldValue::FanRate(Coded::from_wire(raw))),
        Encoding::FanDirection => Ok(FieldValue::FanDirection(Coded::from_wire(raw))),
        Encoding::Mac => MacAddress::parse(raw)
            .map(FieldValue::Mac)
            .ok_or_else(|| err("expected 12 hex digits")),
        Encoding::List => {
            if raw.is_empty() {
                return Ok(FieldValue::List(Vec::new()));
            }
            raw.split(LIST_SEPARATOR)
                .map(parse_integer)
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List)
                .ok_or_else(|| err("expected /-separated integers"))
        }
        Encoding::Text => Ok(FieldValue::Text(raw.to_string())),
        Encoding::Escaped => unescape(raw)
            .map(FieldValue::Escaped)
            .ok_or_else(|| err("bad %-escape or not UTF-8")),
        Encoding::Timestamp => NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .ok()
            .filter(|ts| ts.format(TIMESTAMP_FORMAT).to_string() == raw)
            .map(FieldValue::Timestamp)
            .ok_or_else(|| err("expected YYYY/MM/DD HH:MM:SS")),
        Encoding::Nullable(inner) => {
            if raw == NULL_LITERAL {
                Ok(FieldValue::Null)
            } else {
                decode(*inner, key, raw)
            }
        }
    }
}

pub fn encode(value: &FieldValue) -> String {
    match value {
        FieldValue::Flag(true) => "1".to_string(),
        FieldValue::Flag(false) => "0".to_string(),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Percent(p) => p.to_string(),
        FieldValue::Decimal(t) => format_decimal(*t),
        FieldValue::Tenths(t) => t.tenths().to_string(),
        FieldValue::Setpoint(TargetTemperature::Degrees(t)) => format_decimal(*t),
        FieldValue::Setpoint(TargetTemperature::Sentinel(s)) => s.clone(),
        FieldValue::Humidity(TargetHumidity::Percent(p)) => p.to_string(),
        FieldValue::Humidity(TargetHumidity::Auto) => TargetHumidity::AUTO.to_string(),
        FieldValue::Humidity(TargetHumidity::NotSet) => TargetHumidity::NOT_SET.to_string(),
        FieldValue::Mode(m) => m.to_wire().to_string(),
        FieldValue::FanRate(r) => r.to_wire().to_string(),
        FieldValue::FanDirection(d) => d.to_wire().to_string(),
        FieldValue::Mac(mac) => mac.to_string(),
        FieldValue::List(items) => items
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR.to_string().as_str()),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Escaped(s) => escape(s),
        FieldValue::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        FieldValue::Null => NULL_LITERAL.to_string(),
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let n: i64 = raw.parse().ok()?;
    // rejects "+5", "007", "-0"
    (n.to_string() == raw).then_some(n)
}

fn parse_percent(raw: &str) -> Option<u8> {
    let n = parse_integer(raw)?;
    u8::try_from(n).ok().filter(|p| *p <= 100)
}

fn parse_decimal(raw: &str) -> Option<Temperature> {
    let (whole, frac) = raw.split_once('.')?;
    if frac.len() != 1 || !frac.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    let negative = whole.starts_with('-');
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i32 = digits.parse().ok()?;
    let tenths = magnitude.checked_mul(10)? + i32::from(frac.as_bytes()[0] - b'0');
    let t = Temperature::from_tenths(if negative { -tenths } else { tenths });
    // sensors report "-0.0" just below freezing
    (format_decimal(t) == raw || raw == "-0.0").then_some(t)
}

fn format_decimal(t: Temperature) -> String {
    let tenths = t.tenths();
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    format!("{sign}{}.{}", abs / 10, abs % 10)
}

/// Only `%xx` triples with lower-case hex are accepted, the form [`escape`]
/// writes.
fn unescape(raw: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(raw.len() / 3);
    for triple in raw.as_bytes().chunks(3) {
        let [b'%', pair @ ..] = triple else {
            return None;
        };
        if pair.len() != 2 || !pair.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }
        bytes.extend_from_slice(&hex::decode(pair).ok()?);
    }
    String::from_utf8(bytes).ok()
}

fn escape(s: &str) -> String {
    s.bytes().map(|b| format!("%{}", hex::encode([b]))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_accepts_one_fraction_digit() {
        assert_eq!(
            decode(Encoding::Decimal, "stemp", "21.5").unwrap(),
            FieldValue::Decimal(Temperature::from_tenths(215))
        );
        assert_eq!(
            decode(Encoding::Decimal, "otemp", "-7.0").unwrap(),
            FieldValue::Decimal(Temperature::from_tenths(-70))
        );
        assert_eq!(
            decode(Encoding::Decimal, "otemp", "-0.5").unwrap(),
            FieldValue::Decimal(Temperature::from_tenths(-5))
        );
    }

    #[test]
    fn decimal_rejects_non_canonical() {
        for raw in ["21", "21.50", "021.0", "+21.0", ".5", "-.5", "21.x", "-00.0", "-0.00", ""] {
            assert!(
                decode(Encoding::Decimal, "stemp", raw).is_err(),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn negative_zero_reads_as_zero() {
        let v = decode(Encoding::Decimal, "otemp", "-0.0").unwrap();
        assert_eq!(v, FieldValue::Decimal(Temperature::from_tenths(0)));
        assert_eq!(encode(&v), "0.0");
    }

    #[test]
    fn tenths_scale() {
        let v = decode(Encoding::Tenths, "t", "215").unwrap();
        assert_eq!(v, FieldValue::Tenths(Temperature::from_tenths(215)));
        assert_eq!(encode(&v), "215");
        if let FieldValue::Tenths(t) = v {
            assert_eq!(t.celsius(), 21.5);
        }
    }

    #[test]
    fn flag_rejects_other_literals() {
        assert_eq!(decode(Encoding::Flag, "pow", "1").unwrap(), FieldValue::Flag(true));
        assert_eq!(decode(Encoding::Flag, "pow", "0").unwrap(), FieldValue::Flag(false));
        let err = decode(Encoding::Flag, "pow", "on").unwrap_err();
        assert_eq!(err.key, "pow");
        assert_eq!(err.raw, "on");
    }

    #[test]
    fn unknown_enum_code_is_preserved() {
        let v = decode(Encoding::FanDirection, "f_dir", "9").unwrap();
        assert_eq!(v, FieldValue::FanDirection(Coded::Unknown("9".into())));
        assert_eq!(encode(&v), "9");
    }

    #[test]
    fn auto_mode_aliases_keep_their_code() {
        for code in ["0", "1", "7"] {
            let v = decode(Encoding::Mode, "mode", code).unwrap();
            match &v {
                FieldValue::Mode(Coded::Known(m)) => assert!(m.is_auto()),
                other => panic!("expected known auto mode, got {other:?}"),
            }
            assert_eq!(encode(&v), code);
        }
    }

    #[test]
    fn setpoint_sentinels() {
        assert_eq!(
            decode(Encoding::Setpoint, "stemp", "M").unwrap(),
            FieldValue::Setpoint(TargetTemperature::Sentinel("M".into()))
        );
        assert_eq!(encode(&decode(Encoding::Setpoint, "stemp", "--").unwrap()), "--");
        assert!(decode(Encoding::Setpoint, "stemp", "X").is_err());
    }

    #[test]
    fn humidity_variants() {
        assert_eq!(
            decode(Encoding::Humidity, "shum", "0").unwrap(),
            FieldValue::Humidity(TargetHumidity::Percent(0))
        );
        assert_eq!(
            decode(Encoding::Humidity, "shum", "AUTO").unwrap(),
            FieldValue::Humidity(TargetHumidity::Auto)
        );
        assert!(decode(Encoding::Humidity, "shum", "101").is_err());
    }

    #[test]
    fn nullable_reading() {
        const READING: Encoding = Encoding::Nullable(&Encoding::Decimal);
        assert_eq!(decode(READING, "otemp", "-").unwrap(), FieldValue::Null);
        assert_eq!(
            decode(READING, "otemp", "0.0").unwrap(),
            FieldValue::Decimal(Temperature::from_tenths(0))
        );
        assert_eq!(encode(&FieldValue::Null), "-");
    }

    #[test]
    fn mac_canonicalises_to_upper_case() {
        let v = decode(Encoding::Mac, "mac", "d0c5d3042e82").unwrap();
        assert_eq!(encode(&v), "D0C5D3042E82");
        assert!(decode(Encoding::Mac, "mac", "D0:C5:D3:04:2E:82").is_err());
        assert!(decode(Encoding::Mac, "mac", "D0C5D3042E").is_err());
    }

    #[test]
    fn list_values() {
        let v = decode(Encoding::List, "datas", "0/0/0/0/0/0/1000").unwrap();
        assert_eq!(v, FieldValue::List(vec![0, 0, 0, 0, 0, 0, 1000]));
        assert_eq!(encode(&v), "0/0/0/0/0/0/1000");
        assert_eq!(decode(Encoding::List, "datas", "").unwrap(), FieldValue::List(vec![]));
        assert!(decode(Encoding::List, "datas", "1//2").is_err());
    }

    #[test]
    fn escaped_text() {
        let raw = "%79%6c%c3%a4%61%75%6c%61";
        let v = decode(Encoding::Escaped, "name", raw).unwrap();
        assert_eq!(v, FieldValue::Escaped("yl\u{e4}aula".into()));
        assert_eq!(encode(&v), raw);
        assert!(decode(Encoding::Escaped, "name", "%7").is_err());
        assert!(decode(Encoding::Escaped, "name", "%ff").is_err());
        assert!(decode(Encoding::Escaped, "name", "Living").is_err());
        assert!(decode(Encoding::Escaped, "name", "%C3%A4").is_err());
        assert!(decode(Encoding::Escaped, "name", "%4c%6").is_err());
    }

    #[test]
    fn timestamp() {
        let v = decode(Encoding::Timestamp, "cur", "2022/12/01 22:01:02").unwrap();
        assert_eq!(encode(&v), "2022/12/01 22:01:02");
        assert!(decode(Encoding::Timestamp, "cur", "2022/12/1 22:01:02").is_err());
    }
}
