//! sea-orm backed driver for PostgreSQL, MySQL and SQLite
//! Exposes the async sea-orm connection through a blocking interface

use std::fmt;
use log::{debug, info, warn};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::runtime::{Builder, Runtime};
use url::Url;
use crate::connection::redact_url;
use crate::driver::{Connection, Driver, DriverError};
use crate::error::BoxError;
use crate::resource::Closeable;

const SCHEMES: [&str; 4] = ["postgres", "postgresql", "mysql", "sqlite"];

/// Driver opening one sea-orm session per connection
#[derive(Debug, Default, Clone, Copy)]
pub struct SeaOrmDriver;

impl SeaOrmDriver {
    /// Merge credentials into a host based URL.
    ///
    /// Non-empty `user` and `password` replace the ones embedded in the URL.
    /// SQLite and other host-less URLs are returned unchanged.
    pub fn connect_url(url: &str, user: &str, password: &str) -> Result<String, DriverError> {
        let malformed = || DriverError::MalformedUrl(redact_url(url));
        let mut parsed = Url::parse(url)
            .map_err(|e| DriverError::MalformedUrl(format!("{}: {}", redact_url(url), e)))?;
        if parsed.scheme() == "sqlite" || !parsed.has_host() {
            return Ok(url.to_string());
        }
        if !user.is_empty() {
            parsed.set_username(user).map_err(|_| malformed())?;
        }
        if !password.is_empty() {
            parsed.set_password(Some(password)).map_err(|_| malformed())?;
        }
        Ok(parsed.into())
    }
}

impl Driver for SeaOrmDriver {
    fn name(&self) -> &'static str {
        "sea-orm"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.split_once(':')
            .map(|(scheme, _)| SCHEMES.contains(&scheme))
            .unwrap_or(false)
    }

    fn connect(&self, url: &str, user: &str, password: &str) -> Result<Box<dyn Connection>, BoxError> {
        Ok(Box::new(SeaOrmConnection::open(url, user, password)?))
    }
}

/// Blocking sea-orm session.
///
/// Every call blocks on a runtime owned by the connection, so it must not be
/// used from inside an async context. While auto-commit is off an open
/// transaction is held and re-opened after each commit or rollback.
pub struct SeaOrmConnection {
    url: String,
    auto_commit: bool,
    // dropped before the pool and the runtime
    txn: Option<DatabaseTransaction>,
    db: Option<DatabaseConnection>,
    runtime: Runtime,
}

impl SeaOrmConnection {
    /// Establish a single-session connection in auto-commit mode
    pub fn open(url: &str, user: &str, password: &str) -> Result<Self, DriverError> {
        let connect_url = SeaOrmDriver::connect_url(url, user, password)?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        info!("Configuring sea-orm connection parameters: url={}", redact_url(url));
        let mut opt = ConnectOptions::new(connect_url);
        opt.max_connections(1).sqlx_logging(false);

        let db = runtime.block_on(Database::connect(opt))?;
        info!("Database connection established: {}", redact_url(url));
        Ok(Self {
            url: redact_url(url),
            auto_commit: true,
            txn: None,
            db: Some(db),
            runtime,
        })
    }

    fn db(&self) -> Result<&DatabaseConnection, DriverError> {
        self.db.as_ref().ok_or(DriverError::Closed)
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        let txn = self.runtime.block_on(self.db()?.begin())?;
        debug!("transaction started on {}", self.url);
        self.txn = Some(txn);
        Ok(())
    }

    fn take_txn(&mut self) -> Result<DatabaseTransaction, DriverError> {
        self.db()?;
        self.txn.take().ok_or(DriverError::AutoCommitMode)
    }
}

impl Connection for SeaOrmConnection {
    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError> {
        self.db()?;
        if auto_commit == self.auto_commit {
            return Ok(());
        }
        if auto_commit {
            if let Some(txn) = self.txn.take() {
                self.runtime.block_on(txn.commit())?;
            }
        } else {
            self.begin()?;
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        let txn = self.take_txn()?;
        let committed = self.runtime.block_on(txn.commit());
        let reopened = self.begin();
        committed?;
        reopened?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        let txn = self.take_txn()?;
        let rolled_back = self.runtime.block_on(txn.rollback());
        let reopened = self.begin();
        rolled_back?;
        reopened?;
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        let result = match &self.txn {
            Some(txn) => self.runtime.block_on(txn.execute_unprepared(sql))?,
            None => self.runtime.block_on(self.db()?.execute_unprepared(sql))?,
        };
        Ok(result.rows_affected())
    }

    fn is_closed(&self) -> bool {
        self.db.is_none()
    }
}

impl Closeable for SeaOrmConnection {
    /// Rolls back any open transaction, then closes the session.
    fn close(&mut self) -> Result<(), BoxError> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };
        let rolled_back = match self.txn.take() {
            Some(txn) => self.runtime.block_on(txn.rollback()),
            None => Ok(()),
        };
        let closed = self.runtime.block_on(db.close());
        info!("Database connection closed: {}", self.url);
        rolled_back?;
        closed?;
        Ok(())
    }
}

impl Drop for SeaOrmConnection {
    fn drop(&mut self) {
        if self.db.is_none() {
            return;
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            // block_on is unavailable here; release the session on our own runtime context
            warn!("connection {} dropped inside an async context, closing without rollback", self.url);
            let _guard = self.runtime.enter();
            self.txn.take();
            self.db.take();
            return;
        }
        warn!("connection {} dropped without being released", self.url);
        if let Err(e) = self.close() {
            warn!("closing dropped connection {} failed: {}", self.url, e);
        }
    }
}

impl fmt::Debug for SeaOrmConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeaOrmConnection")
            .field("url", &self.url)
            .field("auto_commit", &self.auto_commit)
            .field("closed", &self.is_closed())
            .finish()
    }
}
