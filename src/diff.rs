use crate::payload::Payload;

/// One key whose value differs between two payloads. `None` means the key
/// was absent on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Change {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Changed and added keys in `current` order, then removed keys in
/// `previous` order.
pub(crate) fn diff_payload(previous: &Payload, current: &Payload) -> Vec<Change> {
    let mut changes = Vec::new();
    for (key, value) in current.iter() {
        match previous.get(key) {
            Some(old) if old == value => {}
            old => changes.push(Change {
                key: key.to_string(),
                old: old.map(str::to_string),
                new: Some(value.to_string()),
            }),
        }
    }
    for (key, value) in previous.iter() {
        if !current.contains_key(key) {
            changes.push(Change {
                key: key.to_string(),
                old: Some(value.to_string()),
                new: None,
            });
        }
    }
    changes
}
