/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Database Configuration Module
//! Locates, reads and validates the connection settings

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use log::{debug, error, info};
use config_parse::{find_file_in, load_properties, PropertiesError};
use crate::DbError;

/// Connection URL key
pub const DB_URL: &str = "DB_URL";
/// User name key
pub const DB_USER: &str = "DB_USER";
/// Password key
pub const DB_PASS: &str = "DB_PASS";
/// Required keys in reporting order
pub const REQUIRED_KEYS: [&str; 3] = [DB_URL, DB_USER, DB_PASS];

/// Resource looked up when no source is given
pub const DEFAULT_RESOURCE: &str = "application.properties";
/// Directory searched before the current directory
pub const CONFIG_DIR_ENV: &str = "DB_CONFIG_DIR";

/// Validated database configuration.
///
/// Only obtainable through [`Configuration::from_map`], so every instance
/// holds `DB_URL`, `DB_USER` and `DB_PASS`.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    values: HashMap<String, String>,
}

impl Configuration {
    /// Validates a key/value map.
    ///
    /// A key counts as present even when its value is empty.
    ///
    /// # Errors
    ///
    /// * `DbError::InvalidConfig` - If the map is empty or misses any required key.
    ///   The message lists every missing key in the order URL, USER, PASS.
    pub fn from_map(values: HashMap<String, String>) -> Result<Self, DbError> {
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !values.contains_key(*key))
            .collect();
        if missing.is_empty() {
            return Ok(Self { values });
        }

        let mut reason = format!("Missing required key: {}", missing.join(", "));
        if values.is_empty() {
            reason = format!("configuration is empty. {}", reason);
        }
        error!("database configuration rejected: {}", reason);
        Err(DbError::InvalidConfig(reason))
    }

    pub fn url(&self) -> &str {
        self.value(DB_URL)
    }

    pub fn user(&self) -> &str {
        self.value(DB_USER)
    }

    pub fn password(&self) -> &str {
        self.value(DB_PASS)
    }

    /// Any key of the source, required or not
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("url", &crate::connection::redact_url(self.url()))
            .field("user", &self.user())
            .field("password", &"***")
            .finish()
    }
}

/// Where a [`ConfigLoader`] reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named resource searched below each root in turn
    Resource { name: String, search_roots: Vec<PathBuf> },
    /// Explicit properties file
    File(PathBuf),
    /// Process environment, after loading an optional `.env` file
    Environment,
}

/// Loads a fresh [`Configuration`] on every call; nothing is cached.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: ConfigSource,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// `application.properties` searched in `$DB_CONFIG_DIR`, then the current directory
    pub fn new() -> Self {
        Self::resource(DEFAULT_RESOURCE)
    }

    pub fn resource(name: &str) -> Self {
        let mut search_roots = Vec::new();
        if let Some(dir) = env::var_os(CONFIG_DIR_ENV) {
            search_roots.push(PathBuf::from(dir));
        }
        if let Ok(dir) = env::current_dir() {
            search_roots.push(dir);
        }
        Self::with_search_roots(name, search_roots)
    }

    pub fn with_search_roots(name: &str, search_roots: Vec<PathBuf>) -> Self {
        Self {
            source: ConfigSource::Resource {
                name: name.to_string(),
                search_roots,
            },
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { source: ConfigSource::File(path.into()) }
    }

    pub fn from_env() -> Self {
        Self { source: ConfigSource::Environment }
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Reads and validates the configuration.
    ///
    /// # Errors
    ///
    /// * `DbError::ConfigNotFound` - If the resource or file does not exist.
    /// * `DbError::InvalidConfig` - If the source is unreadable, unparseable,
    ///   empty or misses required keys.
    pub fn load(&self) -> Result<Configuration, DbError> {
        match &self.source {
            ConfigSource::Resource { name, search_roots } => {
                let path = Self::locate(name, search_roots)?;
                Self::load_file(&path)
            }
            ConfigSource::File(path) => Self::load_file(path),
            ConfigSource::Environment => Self::load_env(),
        }
    }

    fn locate(name: &str, search_roots: &[PathBuf]) -> Result<PathBuf, DbError> {
        for root in search_roots {
            match find_file_in(root, name) {
                Ok(path) => return Ok(path),
                Err(e) => debug!("{}", e),
            }
        }
        error!("{} not found in any search root", name);
        Err(DbError::ConfigNotFound(name.to_string()))
    }

    fn load_file(path: &Path) -> Result<Configuration, DbError> {
        info!("loading database configuration from {}", path.display());
        match load_properties(path) {
            Ok(values) => Configuration::from_map(values),
            Err(PropertiesError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                error!("configuration file {} does not exist", path.display());
                Err(DbError::ConfigNotFound(path.display().to_string()))
            }
            Err(e) => {
                error!("failed to read {}: {}", path.display(), e);
                Err(DbError::InvalidConfig(e.to_string()))
            }
        }
    }

    fn load_env() -> Result<Configuration, DbError> {
        info!("loading database configuration from environment");
        match dotenv::dotenv() {
            Ok(path) => info!("load .env file: {}", path.display()),
            Err(e) => debug!(".env not loaded: {}", e),
        }

        let mut values = HashMap::new();
        for key in REQUIRED_KEYS {
            match env::var(key) {
                Ok(value) => {
                    values.insert(key.to_string(), value);
                }
                Err(env::VarError::NotPresent) => {}
                Err(env::VarError::NotUnicode(_)) => {
                    return Err(DbError::InvalidConfig(format!("{} is not valid unicode", key)));
                }
            }
        }
        Configuration::from_map(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn missing_message(values: HashMap<String, String>) -> String {
        match Configuration::from_map(values) {
            Err(DbError::InvalidConfig(reason)) => reason,
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_every_missing_subset_is_reported_in_order() {
        let all = [(DB_URL, "sqlite::memory:"), (DB_USER, "sa"), (DB_PASS, "secret")];
        for mask in 0u8..7 {
            let present: Vec<(&str, &str)> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, pair)| *pair)
                .collect();
            let expected: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) == 0)
                .map(|(_, (key, _))| *key)
                .collect();

            let reason = missing_message(map(&present));
            assert!(
                reason.ends_with(&format!("Missing required key: {}", expected.join(", "))),
                "mask {}: {}", mask, reason
            );
        }
    }

    #[test]
    fn test_empty_map_names_all_keys() {
        let reason = missing_message(HashMap::new());
        assert!(reason.starts_with("configuration is empty"));
        assert!(reason.contains("DB_URL, DB_USER, DB_PASS"));
    }

    #[test]
    fn test_empty_values_count_as_present() {
        let config = Configuration::from_map(map(&[(DB_URL, "sqlite::memory:"), (DB_USER, ""), (DB_PASS, "")])).unwrap();
        assert_eq!(config.url(), "sqlite::memory:");
        assert_eq!(config.user(), "");
        assert_eq!(config.password(), "");
    }

    #[test]
    fn test_extra_keys_are_kept() {
        let config = Configuration::from_map(map(&[
            (DB_URL, "postgres://db/app"),
            (DB_USER, "app"),
            (DB_PASS, "pw"),
            ("DB_SCHEMA", "public"),
        ]))
        .unwrap();
        assert_eq!(config.get("DB_SCHEMA"), Some("public"));
        assert_eq!(config.get("DB_MISSING"), None);
    }

    #[test]
    fn test_debug_masks_password() {
        let config = Configuration::from_map(map(&[
            (DB_URL, "postgres://app:inline@db/app"),
            (DB_USER, "app"),
            (DB_PASS, "topsecret"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("inline"));
        assert!(rendered.contains("app"));
    }
}
