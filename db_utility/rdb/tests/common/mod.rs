#![allow(dead_code)]

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use common_log::config::LogConfig;
use rdb::{BoxError, Closeable, Connection, Driver};

pub fn init_logging() {
    // every test binary initializes at most once, later calls are refused
    let _ = common_log::init_with_config(LogConfig::console("debug"));
}

/// Closeable double appending its name to a shared log when closed
pub struct Recorder {
    pub name: &'static str,
    pub fail: bool,
    pub log: Rc<RefCell<Vec<&'static str>>>,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self { name, fail: false, log: Rc::clone(log) }
    }

    pub fn failing(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self { name, fail: true, log: Rc::clone(log) }
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recorder({})", self.name)
    }
}

impl Closeable for Recorder {
    fn close(&mut self) -> Result<(), BoxError> {
        self.log.borrow_mut().push(self.name);
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{} refused to close", self.name)).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected(usize),
    AutoCommit(usize, bool),
    Closed(usize),
}

/// Driver double serving `fake://` URLs.
///
/// `fake://down` fails to connect, `fake://no-tx` rejects disabling auto-commit.
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub opened: Arc<AtomicUsize>,
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl FakeDriver {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Driver for FakeDriver {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("fake://")
    }

    fn connect(&self, url: &str, _user: &str, _password: &str) -> Result<Box<dyn Connection>, BoxError> {
        if url == "fake://down" {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "server is down").into());
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.events.lock().unwrap().push(Event::Connected(id));
        Ok(Box::new(FakeConnection {
            id,
            auto_commit: true,
            closed: false,
            reject_manual_commit: url == "fake://no-tx",
            events: Arc::clone(&self.events),
        }))
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    pub id: usize,
    auto_commit: bool,
    closed: bool,
    reject_manual_commit: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Closeable for FakeConnection {
    fn close(&mut self) -> Result<(), BoxError> {
        if !self.closed {
            self.closed = true;
            self.events.lock().unwrap().push(Event::Closed(self.id));
        }
        Ok(())
    }
}

impl Connection for FakeConnection {
    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError> {
        if !auto_commit && self.reject_manual_commit {
            return Err("transactions are not supported".into());
        }
        self.auto_commit = auto_commit;
        self.events.lock().unwrap().push(Event::AutoCommit(self.id, auto_commit));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn execute(&mut self, _sql: &str) -> Result<u64, BoxError> {
        Ok(1)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
