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

use serde::Deserialize;
use std::path::PathBuf;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Write to stderr
    #[serde(default)]
    pub console: bool,
    /// Rolling file output
    #[serde(default)]
    pub file: Option<FileLogConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileLogConfig {
    pub log_directory: String,
    pub log_file_name: String,
    pub max_file_size: u64,
    pub max_zip_count: u32,
}

impl LogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = std::fs::read_to_string(path.into())?;
        let config: LogConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }

    /// Console only configuration at the given level
    pub fn console(level: &str) -> Self {
        Self {
            level: level.to_string(),
            console: true,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let config: LogConfig = serde_yaml::from_str("console: true").unwrap();
        assert_eq!(config.level, "info");
        assert!(config.console);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_yaml_file_section() {
        let yaml = r#"
level: debug
file:
  log_directory: logs
  log_file_name: rdb.log
  max_file_size: 10480
  max_zip_count: 6
"#;
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.level, "debug");
        assert!(!config.console);
        let file = config.file.unwrap();
        assert_eq!(file.log_file_name, "rdb.log");
        assert_eq!(file.max_zip_count, 6);
    }
}
