//! Builders for raw work-order form payloads.

#![allow(dead_code)]

use serde_json::{json, Map, Value};

/// `hello` as a JPEG-ish data URL.
pub const PHOTO_DATA_URL: &str = "data:image/jpeg;base64,aGVsbG8=";

/// Builder for raw submission payloads as the form produces them.
pub struct WorkOrderBuilder {
    fields: Map<String, Value>,
}

impl WorkOrderBuilder {
    pub fn new(board: &str) -> Self {
        let mut builder = Self { fields: Map::new() };
        builder
            .set("date", json!("2026-05-04"))
            .set("board", json!(board))
            .set("zone", json!("Norte"))
            .set("location", json!("Ruta 9 km 41"))
            .set("vehicle", json!("AB123CD"))
            .set(
                "technicians",
                json!([{ "badge": "5521", "name": "Ana Gómez" }]),
            )
            .set("task_requested", json!("Revisión de tablero"))
            .set("task_performed", json!("Cambio de contactor"));
        builder
    }

    /// A payload written by an older release: boards and circuits as lists.
    pub fn legacy(boards: &[&str], circuits: &[&str]) -> Self {
        let mut builder = Self::new("");
        builder.fields.remove("board");
        builder
            .set("boards", json!(boards))
            .set("circuits", json!(circuits));
        builder
    }

    fn set(&mut self, key: &str, value: Value) -> &mut Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_photos(self, count: usize) -> Self {
        let photos: Vec<_> = (0..count).map(|_| PHOTO_DATA_URL).collect();
        self.with("photos", json!(photos))
    }

    pub fn with_signature(self) -> Self {
        self.with("signature_image", json!("data:image/png;base64,c2ln"))
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}
