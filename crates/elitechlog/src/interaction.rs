//! Terminal interaction: device summaries, confirmation prompts and sizing.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as Json;

use elitechlog_transport::Parameters;

/// Output formats of the `info` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoFormat {
    /// Sorted keys, empty values omitted
    Text,
    Yaml,
    Json,
}

/// One-line summary of a connected device.
pub fn describe_device(parameters: &Parameters, now: NaiveDateTime) -> String {
    let mut line = format!(
        "Device: {}, serial number: {}",
        parameters.config.description,
        parameters.serial_number.as_deref().unwrap_or_default()
    );

    let status = &parameters.status;
    if let Some(state) = status.state.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(", state: {}", state.trim_end_matches(['.', ' '])));
    }
    if let Some(battery) = status.battery.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(", battery: {}", battery));
    }
    if let Some(used) = status.storage_used() {
        line.push_str(&format!(", storage: {:.1}%", used * 100.0));
        if let Some(left) = status
            .expected_stop
            .and_then(|stop| (stop - now).to_std().ok())
        {
            let minutes = std::time::Duration::from_secs(left.as_secs() / 60 * 60);
            line.push_str(&format!(" ({} left)", humantime::format_duration(minutes)));
        }
    }
    line
}

/// Drop nulls, empty strings, zeros, `false` and empty containers.
fn prune(value: Json) -> Option<Json> {
    match value {
        Json::Null | Json::Bool(false) => None,
        Json::String(s) if s.is_empty() => None,
        Json::Number(n) if n.as_f64() == Some(0.0) => None,
        Json::Array(items) => {
            let items: Vec<Json> = items.into_iter().filter_map(prune).collect();
            (!items.is_empty()).then_some(Json::Array(items))
        }
        Json::Object(map) => {
            let map: serde_json::Map<String, Json> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            (!map.is_empty()).then_some(Json::Object(map))
        }
        other => Some(other),
    }
}

/// Render the device parameters, readings excluded.
pub fn device_document(parameters: &Parameters, format: InfoFormat) -> Result<String> {
    let mut value = serde_json::to_value(parameters).context("Failed to serialize parameters")?;
    if let Some(map) = value.as_object_mut() {
        map.remove("readings");
    }

    match format {
        InfoFormat::Text => {
            // serde_json maps keep keys sorted.
            let pruned = prune(value).unwrap_or(Json::Object(Default::default()));
            Ok(serde_yaml::to_string(&pruned)?)
        }
        InfoFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
        InfoFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
    }
}

/// Ask before a destructive device command; `yes` skips the prompt.
pub fn confirm(yes: bool, action: &str, record_count: u32) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Are you sure you want to {}? The device will be stopped and {} reading(s) deleted.",
            action, record_count
        ))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// Terminal width in columns, 80 when it cannot be determined.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(80)
}
