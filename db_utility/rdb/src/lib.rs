//! Database connection utility
//! Loads connection settings, opens manual-commit connections and releases
//! resources in reverse acquisition order

pub mod config;
pub mod error;
pub mod driver;
pub mod connection;
pub mod resource;

pub use config::{ConfigLoader, ConfigSource, Configuration};
pub use connection::{execute_script, open, open_with, ConnectionFactory};
pub use driver::{Connection, Driver, DriverError, DriverManager};
pub use error::{BoxError, DbError};
pub use resource::{release, release_all, Closeable};
