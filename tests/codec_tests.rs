use daikin_aircon::codec::{decode, encode};
use daikin_aircon::{Coded, Encoding, FanDirection, FanRate, FieldValue, OperationMode, Temperature, WireCode};

#[test]
fn temperature_from_celsius() {
    let t = Temperature::from_celsius(22.0);
    assert_eq!(t.tenths(), 220);
    assert!((t.fahrenheit() - 71.6).abs() < 0.01);
}

#[test]
fn temperature_half_degree_grid() {
    assert!(Temperature::from_celsius(22.5).is_half_degree());
    assert!(!Temperature::from_celsius(22.3).is_half_degree());
}

#[test]
fn display() {
    let t = Temperature::from_celsius(22.5);
    assert_eq!(format!("{t}"), "22.5\u{00b0}C");
}

#[test]
fn mode_codes_roundtrip() {
    for mode in [
        OperationMode::Auto,
        OperationMode::AutoAlt0,
        OperationMode::AutoAlt7,
        OperationMode::Dehumidify,
        OperationMode::Cool,
        OperationMode::Heat,
        OperationMode::Fan,
    ] {
        assert_eq!(OperationMode::from_code(mode.code()), Some(mode));
    }
}

#[test]
fn fan_rate_codes_roundtrip() {
    for rate in [FanRate::Auto, FanRate::Quiet] {
        assert_eq!(FanRate::from_code(rate.code()), Some(rate));
    }
    for n in 1..=5 {
        let rate = FanRate::level(n).unwrap();
        assert_eq!(rate.code(), (n + 2).to_string());
    }
    assert_eq!(FanRate::level(6), None);
}

#[test]
fn fan_direction_codes() {
    assert_eq!(FanDirection::from_code("3"), Some(FanDirection::Both));
    assert_eq!(Coded::<FanDirection>::from_wire("5"), Coded::Unknown("5".into()));
}

#[test]
fn every_encoding_roundtrips_its_legal_strings() {
    let cases: &[(Encoding, &[&str])] = &[
        (Encoding::Flag, &["0", "1"]),
        (Encoding::Integer, &["0", "-3", "601"]),
        (Encoding::Percent, &["0", "45", "100"]),
        (Encoding::Decimal, &["21.0", "-7.0", "0.5", "-0.5"]),
        (Encoding::Tenths, &["215", "-70", "0"]),
        (Encoding::Setpoint, &["18.0", "M", "--"]),
        (Encoding::Humidity, &["0", "50", "AUTO", "--"]),
        (Encoding::Mode, &["0", "1", "2", "3", "4", "6", "7", "5"]),
        (Encoding::FanRate, &["A", "B", "3", "7", "Z"]),
        (Encoding::FanDirection, &["0", "1", "2", "3", "9"]),
        (Encoding::Mac, &["D0C5D3042E82"]),
        (Encoding::List, &["", "0", "0/0/0/0/0/0/1000"]),
        (Encoding::Text, &["", "home only", "1_2_51"]),
        (Encoding::Escaped, &["", "%79%6c%c3%a4%61%75%6c%61", "%4c%69%76%69%6e%67"]),
        (Encoding::Timestamp, &["2022/12/01 22:01:02"]),
        (Encoding::Nullable(&Encoding::Decimal), &["-", "-7.0"]),
    ];
    for (encoding, samples) in cases {
        for raw in *samples {
            let value = decode(*encoding, "k", raw)
                .unwrap_or_else(|e| panic!("{encoding:?} rejected {raw:?}: {e}"));
            assert_eq!(encode(&value), *raw, "{encoding:?}");
        }
    }
}

#[test]
fn typed_values_roundtrip() {
    let values = [
        (Encoding::Flag, FieldValue::Flag(true)),
        (Encoding::Decimal, FieldValue::Decimal(Temperature::from_celsius(-12.5))),
        (Encoding::Tenths, FieldValue::Tenths(Temperature::from_celsius(30.1))),
        (Encoding::FanRate, FieldValue::FanRate(Coded::Known(FanRate::Level3))),
        (Encoding::FanRate, FieldValue::FanRate(Coded::Unknown("Q".into()))),
        (Encoding::Escaped, FieldValue::Escaped("Living room, east".into())),
        (Encoding::List, FieldValue::List(vec![3, -1, 0])),
    ];
    for (encoding, value) in values {
        assert_eq!(decode(encoding, "k", &encode(&value)).unwrap(), value);
    }
}

#[test]
fn decode_errors_name_key_and_value() {
    let err = decode(Encoding::Decimal, "htemp", "warm").unwrap_err();
    assert_eq!(err.key, "htemp");
    assert_eq!(err.raw, "warm");
    assert!(err.to_string().contains("htemp"));
}

#[test]
fn escaped_text_accepts_only_lower_case_triples() {
    for raw in ["Living", "%C3%A4", "%4C%69", "Liv%69ng", "%4c%6"] {
        assert!(
            decode(Encoding::Escaped, "name", raw).is_err(),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn decode_rejects_values_outside_the_alphabet() {
    let garbage = [
        "-", "%", "%%%", "\u{0}", ".", "-.", "on", "12.34", "1/", "A/B",
        "99999999999999999999",
    ];
    let encodings = [
        Encoding::Flag,
        Encoding::Integer,
        Encoding::Percent,
        Encoding::Decimal,
        Encoding::Tenths,
        Encoding::Setpoint,
        Encoding::Humidity,
        Encoding::Mac,
        Encoding::List,
        Encoding::Escaped,
        Encoding::Timestamp,
    ];
    for encoding in encodings {
        for raw in garbage {
            let err = decode(encoding, "k", raw)
                .expect_err(&format!("{encoding:?} accepted {raw:?}"));
            assert_eq!(err.raw, raw);
        }
    }
}
