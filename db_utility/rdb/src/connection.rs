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

//! Database Connection Management Module
//! Opens connections in manual-commit mode from a validated configuration

use log::{error, info, warn};
use url::Url;
use crate::config::{ConfigLoader, Configuration};
use crate::driver::{Connection, DriverManager};
use crate::error::BoxError;
use crate::resource::Closeable;
use crate::DbError;

/// Open a connection described by `application.properties`.
///
/// Every call loads the configuration again and opens a new session; the
/// returned connection has auto-commit disabled and belongs to the caller.
///
/// # Example
/// ```no_run
/// use rdb::open;
///
/// fn example() -> Result<(), rdb::DbError> {
///     let mut conn = open()?;
///     // Use connection for database operations, then commit explicitly
///     rdb::release!(conn)
/// }
/// ```
pub fn open() -> Result<Box<dyn Connection>, DbError> {
    ConnectionFactory::default().open()
}

/// Open a connection from an already validated configuration.
///
/// # Errors
///
/// * `DbError::ConnectionError` - If the driver layer fails to connect or to
///   disable auto-commit. The driver failure is kept as the error source and
///   a half-initialised connection is closed before returning.
pub fn open_with(config: &Configuration, drivers: &DriverManager) -> Result<Box<dyn Connection>, DbError> {
    let url = redact_url(config.url());
    info!("Initializing database connection: url={}, user={}", url, config.user());

    let mut conn = drivers
        .connect(config.url(), config.user(), config.password())
        .map_err(|source| {
            error!("Failed to connect to {}: {}", url, source);
            DbError::ConnectionError { url: url.clone(), source }
        })?;

    if let Err(source) = conn.set_auto_commit(false) {
        error!("Failed to disable auto-commit on {}: {}", url, source);
        if let Err(e) = conn.close() {
            warn!("Failed to close rejected connection to {}: {}", url, e);
        }
        return Err(DbError::ConnectionError { url, source });
    }

    info!("Database connection opened in manual-commit mode: {}", url);
    Ok(conn)
}

/// Stateless pairing of a configuration source and a driver registry
#[derive(Debug)]
pub struct ConnectionFactory {
    loader: ConfigLoader,
    drivers: DriverManager,
}

impl Default for ConnectionFactory {
    fn default() -> Self {
        Self::new(ConfigLoader::new(), DriverManager::with_default_drivers())
    }
}

impl ConnectionFactory {
    pub fn new(loader: ConfigLoader, drivers: DriverManager) -> Self {
        Self { loader, drivers }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    pub fn drivers(&self) -> &DriverManager {
        &self.drivers
    }

    /// Load the configuration and open a new connection.
    ///
    /// # Errors
    ///
    /// * `DbError::ConfigNotFound` / `DbError::InvalidConfig` - From loading.
    /// * `DbError::ConnectionError` - From connecting.
    pub fn open(&self) -> Result<Box<dyn Connection>, DbError> {
        let config = self.loader.load()?;
        open_with(&config, &self.drivers)
    }
}

/// Run a `;` separated SQL script and return the affected row count.
///
/// In manual-commit mode the script is committed on success and rolled back
/// at the first failing statement.
pub fn execute_script(conn: &mut dyn Connection, script: &str) -> Result<u64, BoxError> {
    // split sql by ;
    let statements = script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut affected = 0;
    for stmt in statements {
        match conn.execute(stmt) {
            Ok(rows) => affected += rows,
            Err(e) => {
                if !conn.auto_commit() {
                    if let Err(rollback_err) = conn.rollback() {
                        warn!("rollback after failed statement failed: {}", rollback_err);
                    }
                }
                return Err(e);
            }
        }
    }
    if !conn.auto_commit() {
        conn.commit()?;
    }
    Ok(affected)
}

/// Mask the password of a connection URL for logs and errors
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() && parsed.set_password(Some("***")).is_ok() {
                return parsed.into();
            }
            url.to_string()
        }
        Err(_) => match url.rsplit_once('@') {
            Some((_, host)) => format!("***@{}", host),
            None => url.to_string(),
        },
    }
}
