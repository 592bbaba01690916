// Copyright © 2024 Pathway

use std::sync::{Mutex, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value as JsonValue;

use batch_sorter::engine::{BatchDefinition, IdDict, Value};

pub fn batch_definition(data_asset_name: &str, identifiers: JsonValue) -> BatchDefinition {
    let identifiers =
        IdDict::from_json(identifiers).expect("batch identifiers should be a JSON object");
    BatchDefinition::new(
        "my_datasource",
        "my_data_connector",
        data_asset_name,
        identifiers,
    )
}

pub fn int_values(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

pub fn asset_names(batch_definitions: &[BatchDefinition]) -> Vec<&str> {
    batch_definitions
        .iter()
        .map(BatchDefinition::data_asset_name)
        .collect()
}

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

/// Installs a process-wide logger that keeps every record. Tests run in
/// parallel, so look records up by something unique to the test.
pub fn capture_logs() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger should be installed");
        log::set_max_level(LevelFilter::Trace);
    });
}

pub fn captured_logs(level: Level, containing: &str) -> Vec<String> {
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(record_level, message)| *record_level == level && message.contains(containing))
        .map(|(_, message)| message.clone())
        .collect()
}
