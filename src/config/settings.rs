//! Audit settings overlay
//!
//! Effective values are resolved from three layers: a stack of temporary
//! overrides, user-supplied values (usually from `settings.json`), and the
//! built-in defaults. Only keys present in the defaults are recognized.
//!
//! Overrides are pushed as frames and removed when their [`OverrideGuard`] is
//! dropped. A guard removes only its own frame, so scopes that overlap
//! without nesting (two workers on the shared settings) leave each other's
//! overrides in place.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::error::{AuditError, AuditResult};
use crate::storage::file_io::{read_json, write_json_atomic};

/// Whether change records are produced
pub const CHANGE_LOGGING: &str = "CHANGE_LOGGING";
/// Whether request records are produced
pub const REQUEST_LOGGING: &str = "REQUEST_LOGGING";
/// Label for the transient per-write metadata
pub const AUDIT_META_NAME: &str = "AUDIT_META_NAME";
/// Namespace for pre-write subscriber keys
pub const DISPATCH_UID: &str = "DISPATCH_UID";

/// A single setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            SettingValue::Bool(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Key to value mapping used for every settings layer
pub type SettingsMap = BTreeMap<String, SettingValue>;

fn default_settings() -> SettingsMap {
    let mut defaults = SettingsMap::new();
    defaults.insert(DISPATCH_UID.into(), "AUDIT_LOG".into());
    defaults.insert(AUDIT_META_NAME.into(), "_audit_meta".into());
    defaults.insert(CHANGE_LOGGING.into(), true.into());
    defaults.insert(REQUEST_LOGGING.into(), true.into());
    defaults
}

fn disabled_frame() -> SettingsMap {
    let mut frame = SettingsMap::new();
    frame.insert(CHANGE_LOGGING.into(), false.into());
    frame.insert(REQUEST_LOGGING.into(), false.into());
    frame
}

#[derive(Debug)]
struct OverrideFrame {
    id: u64,
    values: SettingsMap,
}

/// Layered audit settings
#[derive(Debug)]
pub struct AuditSettings {
    defaults: SettingsMap,
    user: SettingsMap,
    overrides: RwLock<Vec<OverrideFrame>>,
    next_frame: AtomicU64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            defaults: default_settings(),
            user: SettingsMap::new(),
            overrides: RwLock::new(Vec::new()),
            next_frame: AtomicU64::new(0),
        }
    }
}

impl AuditSettings {
    /// Settings with built-in defaults only
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with user-supplied values layered over the defaults
    ///
    /// Unknown keys and values of the wrong type are rejected.
    pub fn with_user_settings(user: SettingsMap) -> AuditResult<Self> {
        let settings = Self::default();
        settings.validate(&user)?;
        Ok(Self { user, ..settings })
    }

    /// Load user settings from the settings file, or use defaults if it doesn't exist
    pub fn load_or_default(paths: &AuditPaths) -> AuditResult<Self> {
        let user: SettingsMap = read_json(paths.settings_file())?;
        Self::with_user_settings(user)
    }

    /// Persist the user layer (not overrides) to the settings file
    pub fn save(&self, paths: &AuditPaths) -> AuditResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), &self.user)
    }

    /// Effective value for a key
    pub fn get(&self, key: &str) -> AuditResult<SettingValue> {
        let default = self
            .defaults
            .get(key)
            .ok_or_else(|| AuditError::UnknownSetting(key.to_string()))?;

        let overrides = self.overrides.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = overrides.iter().rev().find_map(|frame| frame.values.get(key)) {
            return Ok(value.clone());
        }

        Ok(self.user.get(key).unwrap_or(default).clone())
    }

    pub fn change_logging(&self) -> bool {
        self.known_bool(CHANGE_LOGGING)
    }

    pub fn request_logging(&self) -> bool {
        self.known_bool(REQUEST_LOGGING)
    }

    pub fn audit_meta_name(&self) -> String {
        self.known_text(AUDIT_META_NAME)
    }

    pub fn dispatch_uid(&self) -> String {
        self.known_text(DISPATCH_UID)
    }

    /// All recognized keys with their effective values
    pub fn effective(&self) -> SettingsMap {
        self.defaults
            .keys()
            .filter_map(|key| self.get(key).ok().map(|value| (key.clone(), value)))
            .collect()
    }

    /// Number of override frames currently active
    pub fn override_depth(&self) -> usize {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Push an override frame that stays active until the guard is dropped
    pub fn push_overrides(&self, values: SettingsMap) -> AuditResult<OverrideGuard<'_>> {
        self.validate(&values)?;
        Ok(self.push_frame(values))
    }

    /// Turn off change and request logging until the guard is dropped
    pub fn scoped_disable(&self) -> OverrideGuard<'_> {
        self.push_frame(disabled_frame())
    }

    /// Run `f` with change and request logging turned off
    ///
    /// Prior state is restored on return and while unwinding.
    pub fn with_audit_disabled<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.scoped_disable();
        f()
    }

    fn push_frame(&self, values: SettingsMap) -> OverrideGuard<'_> {
        let id = self.next_frame.fetch_add(1, Ordering::Relaxed);
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OverrideFrame { id, values });
        OverrideGuard { settings: self, id }
    }

    fn validate(&self, values: &SettingsMap) -> AuditResult<()> {
        for (key, value) in values {
            let default = self
                .defaults
                .get(key)
                .ok_or_else(|| AuditError::UnknownSetting(key.clone()))?;
            if default.kind() != value.kind() {
                return Err(AuditError::Config(format!(
                    "Setting '{}' expects a {} value, got '{}'",
                    key,
                    default.kind(),
                    value
                )));
            }
        }
        Ok(())
    }

    fn known_bool(&self, key: &str) -> bool {
        self.get(key)
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or_default()
    }

    fn known_text(&self, key: &str) -> String {
        self.get(key)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Removes its override frame on drop
///
/// Frames pushed after this one stay active until their own guards drop.
#[must_use = "overrides are removed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct OverrideGuard<'a> {
    settings: &'a AuditSettings,
    id: u64,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        let mut stack = self
            .settings
            .overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        stack.retain(|frame| frame.id != self.id);
    }
}

static GLOBAL: OnceLock<Arc<AuditSettings>> = OnceLock::new();

/// The process-wide settings instance
pub fn global() -> &'static Arc<AuditSettings> {
    GLOBAL.get_or_init(|| Arc::new(AuditSettings::default()))
}

/// Install the process-wide settings; fails if already initialized
pub fn install_global(settings: AuditSettings) -> AuditResult<()> {
    GLOBAL
        .set(Arc::new(settings))
        .map_err(|_| AuditError::Config("Global audit settings already initialized".into()))
}

/// Turn off logging on the process-wide settings until the guard is dropped
pub fn disable_audit() -> OverrideGuard<'static> {
    global().scoped_disable()
}
