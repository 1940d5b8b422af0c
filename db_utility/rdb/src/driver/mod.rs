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

//! Driver layer
//! Turns a URL and credentials into a live [`Connection`]

pub mod sea_orm_driver;

use std::fmt;
use log::{debug, info};
use thiserror::Error;
use crate::error::BoxError;
use crate::resource::Closeable;

pub use sea_orm_driver::{SeaOrmConnection, SeaOrmDriver};

/// Failures raised by the bundled driver
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No suitable driver found for {0}")]
    NoSuitableDriver(String),

    #[error("Malformed connection URL: {0}")]
    MalformedUrl(String),

    #[error("Connection is closed")]
    Closed,

    #[error("Operation not allowed in auto-commit mode")]
    AutoCommitMode,

    #[error("Failed to start driver runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Live database session.
///
/// Releasing it goes through [`Closeable::close`]; closing twice is a no-op.
pub trait Connection: Closeable + Send {
    fn auto_commit(&self) -> bool;

    /// Enabling auto-commit while a transaction is open commits it.
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError>;

    /// Fails in auto-commit mode.
    fn commit(&mut self) -> Result<(), BoxError>;

    /// Fails in auto-commit mode.
    fn rollback(&mut self) -> Result<(), BoxError>;

    /// Runs a raw statement and returns the affected row count.
    fn execute(&mut self, sql: &str) -> Result<u64, BoxError>;

    fn is_closed(&self) -> bool;
}

/// Connects to the databases whose URLs it accepts
#[cfg_attr(test, mockall::automock)]
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts_url(&self, url: &str) -> bool;

    fn connect(&self, url: &str, user: &str, password: &str) -> Result<Box<dyn Connection>, BoxError>;
}

/// Ordered driver registry; the first driver accepting a URL serves it.
#[derive(Default)]
pub struct DriverManager {
    drivers: Vec<Box<dyn Driver>>,
}

impl DriverManager {
    /// Registry without any driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the sea-orm driver
    pub fn with_default_drivers() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(SeaOrmDriver));
        manager
    }

    pub fn register(&mut self, driver: Box<dyn Driver>) -> &mut Self {
        info!("registering database driver {}", driver.name());
        self.drivers.push(driver);
        self
    }

    pub fn driver_names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// Opens one new connection.
    ///
    /// # Errors
    ///
    /// * `DriverError::NoSuitableDriver` - If no registered driver accepts the URL.
    /// * Whatever the selected driver reports.
    pub fn connect(&self, url: &str, user: &str, password: &str) -> Result<Box<dyn Connection>, BoxError> {
        let driver = self
            .drivers
            .iter()
            .find(|d| d.accepts_url(url))
            .ok_or_else(|| DriverError::NoSuitableDriver(crate::connection::redact_url(url)))?;
        debug!("driver {} selected", driver.name());
        driver.connect(url, user, password)
    }
}

impl fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverManager")
            .field("drivers", &self.driver_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[derive(Debug)]
    struct NullConnection;

    impl Closeable for NullConnection {
        fn close(&mut self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Connection for NullConnection {
        fn auto_commit(&self) -> bool { true }
        fn set_auto_commit(&mut self, _: bool) -> Result<(), BoxError> { Ok(()) }
        fn commit(&mut self) -> Result<(), BoxError> { Ok(()) }
        fn rollback(&mut self) -> Result<(), BoxError> { Ok(()) }
        fn execute(&mut self, _: &str) -> Result<u64, BoxError> { Ok(0) }
        fn is_closed(&self) -> bool { false }
    }

    fn driver(name: &'static str, scheme: &'static str) -> MockDriver {
        let mut driver = MockDriver::new();
        driver.expect_name().return_const(name);
        driver.expect_accepts_url().returning(move |url| url.starts_with(scheme));
        driver
    }

    #[test]
    fn test_first_accepting_driver_wins() {
        let mut first = driver("first", "mysql:");
        first.expect_connect().never();
        let mut second = driver("second", "postgres:");
        second
            .expect_connect()
            .with(eq("postgres://db/app"), eq("app"), eq("pw"))
            .times(1)
            .returning(|_, _, _| Ok(Box::new(NullConnection)));
        let mut third = driver("third", "postgres:");
        third.expect_connect().never();

        let mut manager = DriverManager::new();
        manager.register(Box::new(first)).register(Box::new(second)).register(Box::new(third));

        assert!(manager.connect("postgres://db/app", "app", "pw").is_ok());
        assert_eq!(manager.driver_names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_no_suitable_driver() {
        let mut manager = DriverManager::new();
        manager.register(Box::new(driver("mysql", "mysql:")));

        let err = manager.connect("oracle://user:pw@db/app", "user", "pw").unwrap_err();
        let driver_error = err.downcast_ref::<DriverError>().unwrap();
        assert!(matches!(driver_error, DriverError::NoSuitableDriver(_)));
        assert!(!err.to_string().contains("pw@"));
    }

    #[test]
    fn test_default_drivers() {
        assert_eq!(DriverManager::with_default_drivers().driver_names(), vec!["sea-orm"]);
    }
}
