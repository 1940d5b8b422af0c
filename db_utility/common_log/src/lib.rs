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

pub mod config;
pub mod logger;

use std::{path::PathBuf, sync::OnceLock};
use config_parse::find_file;
use crate::config::LogConfig;

// Re-export log macros for convenient use in other modules
pub use log::{debug, error, info, trace, warn};

static LOGGER: OnceLock<logger::Logger> = OnceLock::new();

/// Initialize logging from a `logging.yaml` found below the current directory
///
/// # Example
/// ```no_run
/// common_log::init().expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let file = find_file("logging.yaml")?;
    init_with_yaml(file)
}

/// Initialize logging system
///
/// # Arguments
/// * `config_path` - Path to the logging configuration file
pub fn init_with_yaml(config_path: impl Into<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path.into();
    install(|| logger::Logger::new_from_yaml(config_path))
}

/// Initialize logging system with config
///
/// # Example
/// ```no_run
/// use common_log::config::LogConfig;
///
/// common_log::init_with_config(LogConfig::console("debug")).expect("Failed to initialize logger");
/// log::debug!("Logger initialized");
/// ```
pub fn init_with_config(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    install(|| logger::Logger::new_from_config(config))
}

fn install<F>(build: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce() -> Result<logger::Logger, Box<dyn std::error::Error>>,
{
    if LOGGER.get().is_some() {
        return Err("Logger already initialized".into());
    }
    let logger = build()?;
    if LOGGER.set(logger).is_err() {
        return Err("Logger already initialized".into());
    }
    Ok(())
}
