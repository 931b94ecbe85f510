use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::diff::diff_payload;
use crate::payload::Payload;

pub enum MessageLogMode {
    Full,
    /// First response per path in full, later ones as key-level changes.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: HashMap<String, Payload>,
}

fn payload_json(payload: &Payload) -> Value {
    let map: Map<String, Value> = payload
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    Value::Object(map)
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, path: &str, query: Option<&Payload>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "path": path,
            "query": query.map(payload_json),
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, path: &str, status: u16, body: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "path": path,
            "status": status,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_payload(&mut self, path: &str, payload: &Payload) {
        let entry = match self.mode {
            MessageLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "payload",
                "path": path,
                "fields": payload_json(payload),
            }),
            MessageLogMode::Diffed => match self.previous.get(path) {
                None => json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "payload",
                    "path": path,
                    "full": true,
                    "fields": payload_json(payload),
                }),
                Some(prev) => {
                    let changes: Vec<Value> = diff_payload(prev, payload)
                        .into_iter()
                        .map(|c| json!({ "key": c.key, "old": c.old, "new": c.new }))
                        .collect();
                    json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "payload",
                        "path": path,
                        "changes": changes,
                    })
                }
            },
        };
        self.write_line(&entry);
        if let MessageLogMode::Diffed = self.mode {
            self.previous.insert(path.to_string(), payload.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
