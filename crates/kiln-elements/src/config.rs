//! Global configuration
//!
//! Process-wide JSON configuration with compiled-in defaults. Partial
//! objects are deep-merged into the live value: objects merge key by key,
//! while arrays and primitives replace what was there.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;

static CONFIG: OnceLock<Mutex<Value>> = OnceLock::new();

fn store() -> MutexGuard<'static, Value> {
    CONFIG
        .get_or_init(|| Mutex::new(defaults()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Compiled-in defaults
pub fn defaults() -> Value {
    json!({
        "tag_prefix": "kn",
        "log_level": "warn",
        "local_keys": {
            "today": "Today",
            "tomorrow": "Tomorrow",
            "yesterday": "Yesterday",
            "invalid_date": "Invalid date",
            "loading": "Loading"
        },
        "date_formats": ["DD/MM/YYYY", "YYYY-MM-DD"]
    })
}

/// Deep-merge `patch` into `target`
pub fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Merge a partial configuration object into the live configuration
pub fn initialize(partial: &Value) {
    if !partial.is_object() {
        tracing::warn!("Ignoring non-object configuration: {}", partial);
        return;
    }
    merge(&mut store(), partial);
    tracing::debug!("Configuration updated");
}

/// Same as [`initialize`]
pub fn set(partial: &Value) {
    initialize(partial);
}

/// Parse a JSON object and merge it into the live configuration
pub fn initialize_from_json(text: &str) -> Result<()> {
    let partial: Value = serde_json::from_str(text)?;
    initialize(&partial);
    Ok(())
}

/// Copy of the whole configuration
pub fn get() -> Value {
    store().clone()
}

/// One top-level entry
pub fn get_key(key: &str) -> Option<Value> {
    store().get(key).cloned()
}

/// Independent deep copy; later changes to either side are not shared
pub fn clone_config() -> Value {
    get()
}

/// Restore the defaults
pub fn reset() {
    *store() = defaults();
}

/// Prefix for component tag names
pub fn tag_prefix() -> String {
    match get_key("tag_prefix") {
        Some(Value::String(prefix)) => prefix,
        _ => "kn".to_string(),
    }
}

/// Localized strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalKeys {
    pub today: String,
    pub tomorrow: String,
    pub yesterday: String,
    pub invalid_date: String,
    pub loading: String,
}

impl Default for LocalKeys {
    fn default() -> Self {
        Self {
            today: "Today".into(),
            tomorrow: "Tomorrow".into(),
            yesterday: "Yesterday".into(),
            invalid_date: "Invalid date".into(),
            loading: "Loading".into(),
        }
    }
}

/// Typed view of the configuration; unknown keys are ignored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tag_prefix: String,
    pub log_level: String,
    pub local_keys: LocalKeys,
    pub date_formats: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tag_prefix: "kn".into(),
            log_level: "warn".into(),
            local_keys: LocalKeys::default(),
            date_formats: vec!["DD/MM/YYYY".into(), "YYYY-MM-DD".into()],
        }
    }
}

/// Overwrite `slot` with `config[key]` when it has the right shape
fn read_field<T: DeserializeOwned>(config: &Value, key: &str, slot: &mut T) {
    let Some(value) = config.get(key) else {
        return;
    };
    match T::deserialize(value) {
        Ok(parsed) => *slot = parsed,
        Err(err) => tracing::warn!("Ignoring configuration key {}: {}", key, err),
    }
}

/// Live configuration as [`Settings`]; a key holding the wrong type keeps
/// its default while the other keys still apply
pub fn settings() -> Settings {
    let live = get();
    let mut settings = Settings::default();

    read_field(&live, "tag_prefix", &mut settings.tag_prefix);
    read_field(&live, "log_level", &mut settings.log_level);
    read_field(&live, "date_formats", &mut settings.date_formats);

    if let Some(keys) = live.get("local_keys") {
        let local = &mut settings.local_keys;
        read_field(keys, "today", &mut local.today);
        read_field(keys, "tomorrow", &mut local.tomorrow);
        read_field(keys, "yesterday", &mut local.yesterday);
        read_field(keys, "invalid_date", &mut local.invalid_date);
        read_field(keys, "loading", &mut local.loading);
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    // The configuration is process-wide; serialize tests touching it
    static LOCK: Mutex<()> = Mutex::new(());

    fn guard() -> MutexGuard<'static, ()> {
        let guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        reset();
        guard
    }

    #[test]
    fn test_merge_objects_recurse() {
        let mut target = json!({ "a": { "x": 1, "y": 2 }, "b": 1 });
        merge(&mut target, &json!({ "a": { "y": 3, "z": 4 } }));
        assert_eq!(target, json!({ "a": { "x": 1, "y": 3, "z": 4 }, "b": 1 }));
    }

    #[test]
    fn test_merge_arrays_replace() {
        let mut target = json!({ "list": [1, 2, 3] });
        merge(&mut target, &json!({ "list": [9] }));
        assert_eq!(target, json!({ "list": [9] }));
    }

    #[test]
    fn test_initialize_deep_merges_local_keys() {
        let _guard = guard();
        initialize(&json!({ "local_keys": { "today": "Hoy" } }));

        let keys = get_key("local_keys").unwrap();
        assert_eq!(keys["today"], "Hoy");
        assert_eq!(keys["tomorrow"], "Tomorrow");
        assert_eq!(settings().local_keys.today, "Hoy");
        reset();
    }

    #[test]
    fn test_clone_is_independent() {
        let _guard = guard();
        let mut copy = clone_config();
        copy["log_level"] = json!("trace");
        assert_eq!(get_key("log_level"), Some(json!("warn")));

        set(&json!({ "log_level": "debug" }));
        assert_eq!(copy["log_level"], "trace");
        reset();
        assert_eq!(get(), defaults());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let _guard = guard();
        assert!(initialize_from_json("{ not json").is_err());
        initialize_from_json(r#"{ "date_formats": ["MM/DD"] }"#).unwrap();
        assert_eq!(settings().date_formats, vec!["MM/DD"]);
        reset();
    }

    #[test]
    fn test_non_object_is_ignored() {
        let _guard = guard();
        initialize(&json!([1, 2]));
        assert_eq!(get(), defaults());
    }

    #[test]
    fn test_settings_fall_back_per_key() {
        let _guard = guard();
        initialize(&json!({
            "date_formats": "not a list",
            "log_level": "debug",
            "local_keys": { "today": "Hoy", "loading": 5 }
        }));

        let settings = settings();
        assert_eq!(settings.date_formats, Settings::default().date_formats);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.local_keys.today, "Hoy");
        assert_eq!(settings.local_keys.loading, "Loading");
        reset();
    }
}
