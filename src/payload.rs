use crate::error::FormatError;
use crate::fields::FieldSpec;

pub const PAIR_DELIMITER: char = ',';
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Ordered `key=value` pairs as carried on the wire. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pairs: Vec<(String, String)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces the value in place if the key exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Splits a response body into pairs. Surrounding whitespace and one trailing
/// delimiter are ignored; field semantics are not checked here.
pub fn parse(text: &str) -> Result<Payload, FormatError> {
    if !text.is_ascii() {
        return Err(FormatError::NonAscii);
    }
    let text = text.trim();
    let text = text.strip_suffix(PAIR_DELIMITER).unwrap_or(text);

    let mut payload = Payload::new();
    if text.is_empty() {
        return Ok(payload);
    }

    for pair in text.split(PAIR_DELIMITER) {
        let (key, value) = pair
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or_else(|| FormatError::MissingSeparator(pair.to_string()))?;
        if key.is_empty() {
            return Err(FormatError::EmptyKey(pair.to_string()));
        }
        if payload.contains_key(key) {
            return Err(FormatError::DuplicateKey(key.to_string()));
        }
        payload.pairs.push((key.to_string(), value.to_string()));
    }
    Ok(payload)
}

/// Joins pairs into wire text. Keys named in `order` come first in table
/// order, the rest follow in insertion order.
pub fn serialize(payload: &Payload, order: &[FieldSpec]) -> Result<String, FormatError> {
    let mut ordered: Vec<&(String, String)> = order
        .iter()
        .filter_map(|spec| payload.pairs.iter().find(|(k, _)| k == spec.key))
        .collect();
    ordered.extend(
        payload
            .pairs
            .iter()
            .filter(|(k, _)| !order.iter().any(|spec| spec.key == k)),
    );

    let mut out = String::new();
    for (i, (key, value)) in ordered.into_iter().enumerate() {
        check_pair(key, value)?;
        if i > 0 {
            out.push(PAIR_DELIMITER);
        }
        out.push_str(key);
        out.push(KEY_VALUE_SEPARATOR);
        out.push_str(value);
    }
    Ok(out)
}

fn check_pair(key: &str, value: &str) -> Result<(), FormatError> {
    if key.is_empty() {
        return Err(FormatError::EmptyKey(format!("{key}{KEY_VALUE_SEPARATOR}{value}")));
    }
    if key.contains([PAIR_DELIMITER, KEY_VALUE_SEPARATOR]) {
        return Err(FormatError::DelimiterInKey(key.to_string()));
    }
    if value.contains(PAIR_DELIMITER) {
        return Err(FormatError::DelimiterInValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    if !key.is_ascii() || !value.is_ascii() {
        return Err(FormatError::NonAscii);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::PayloadClass;

    #[test]
    fn parses_pairs_in_order() {
        let p = parse("ret=OK,htemp=24.0,hhum=-,otemp=-7.0").unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.get("otemp"), Some("-7.0"));
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["ret", "htemp", "hhum", "otemp"]);
    }

    #[test]
    fn tolerates_whitespace_and_trailing_delimiter() {
        let p = parse("  pow=1,mode=3,\r\n").unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("mode"), Some("3"));
    }

    #[test]
    fn keeps_empty_values_and_embedded_separator() {
        let p = parse("adv=,method=home only,x=a=b").unwrap();
        assert_eq!(p.get("adv"), Some(""));
        assert_eq!(p.get("method"), Some("home only"));
        assert_eq!(p.get("x"), Some("a=b"));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert_eq!(
            parse("=1,pow=1").unwrap_err(),
            FormatError::EmptyKey("=1".into())
        );
        assert_eq!(
            parse("pow=1,mode").unwrap_err(),
            FormatError::MissingSeparator("mode".into())
        );
        assert_eq!(
            parse("pow=1,pow=0").unwrap_err(),
            FormatError::DuplicateKey("pow".into())
        );
        assert!(parse("pow=1,,mode=3").is_err());
        assert_eq!(parse("name=\u{e9}").unwrap_err(), FormatError::NonAscii);
    }

    #[test]
    fn empty_body_is_empty_payload() {
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn serialize_uses_table_order() {
        let mut p = Payload::new();
        p.insert("f_dir", "0");
        p.insert("extra", "x");
        p.insert("stemp", "21.0");
        p.insert("pow", "1");
        let text = serialize(&p, PayloadClass::Control.fields()).unwrap();
        assert_eq!(text, "pow=1,stemp=21.0,f_dir=0,extra=x");
    }

    #[test]
    fn serialize_rejects_delimiter_in_value() {
        let mut p = Payload::new();
        p.insert("name", "a,b");
        assert!(matches!(
            serialize(&p, &[]),
            Err(FormatError::DelimiterInValue { .. })
        ));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut p = parse("a=1,b=2").unwrap();
        p.insert("a", "3");
        assert_eq!(p.pairs()[0], ("a".to_string(), "3".to_string()));
        assert_eq!(p.remove("b"), Some("2".into()));
        assert_eq!(p.len(), 1);
    }
}
