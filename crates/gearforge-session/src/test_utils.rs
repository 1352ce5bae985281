//! Shared fixtures for session and validation tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use gearforge_codec::{CodecClient, CodecTransport};
use gearforge_core::{BalanceRecord, Part};

pub fn part(id: u32, slot: &str, inv: &str, add: &[&str], dep: &[&str], exc: &[&str]) -> Part {
    let tags = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
    Part {
        serial_index: id,
        name: format!("{inv}_{slot}_{id:02}"),
        slot: slot.to_string(),
        inv_type: inv.to_string(),
        stats: None,
        add_tags: tags(add),
        dependency_tags: tags(dep),
        exclusion_tags: tags(exc),
    }
}

pub fn balance(slots: &[&str], slot_rules: Value, tag_rules: Value) -> BalanceRecord {
    BalanceRecord {
        entry_key: "Stray Rifle".to_string(),
        item_type: "bor_sr".to_string(),
        parent_type: "bor".to_string(),
        classification_id: "41".to_string(),
        base_part: None,
        base_tags: Vec::new(),
        slot_order: slots.iter().map(|s| s.to_string()).collect(),
        slot_rules,
        tag_rules,
    }
}

/// Codec transport answering from a canned component string and recording
/// every component string sent for encoding.
pub struct StubCodec {
    component: String,
    encoded: Arc<Mutex<Vec<String>>>,
}

impl StubCodec {
    /// Returns the client plus a handle to the recorded encode payloads.
    pub fn client(component: &str) -> (CodecClient<StubCodec>, Arc<Mutex<Vec<String>>>) {
        let encoded = Arc::new(Mutex::new(Vec::new()));
        let client = CodecClient::with_transport(
            "https://primary.example",
            "https://fallback.example",
            StubCodec {
                component: component.to_string(),
                encoded: Arc::clone(&encoded),
            },
        );
        (client, encoded)
    }
}

#[async_trait]
impl CodecTransport for StubCodec {
    async fn post(&self, url: &str, payload: &Value, _timeout: Duration) -> Result<Value, String> {
        if url.ends_with("/deserialize") {
            Ok(json!({
                "deserialized": self.component,
                "additional_data": "name: \"Stray Rifle\"",
            }))
        } else {
            let component = payload
                .get("deserialized")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            self.encoded.lock().unwrap().push(component);
            Ok(json!({ "serial_b85": "@Ugtest" }))
        }
    }
}
