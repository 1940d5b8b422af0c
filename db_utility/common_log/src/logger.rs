use chrono::{DateTime, Local};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger as SizeBasedTriggerPolicy;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};
use std::path::{Path, PathBuf};
use crate::config::{FileLogConfig, LogConfig};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}";
const CONSOLE_APPENDER: &str = "console_appender";
const FILE_APPENDER: &str = "file_appender";

pub struct Logger {
    // handle of the installed log4rs config
    _handle: Handle,
}

impl Logger {
    pub fn new_from_yaml(config_path: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = LogConfig::from_yaml(config_path)?;
        Self::new_from_config(config)
    }

    pub fn new_from_config(config: LogConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let log4rs_config = Self::build_config(&config)?;
        let handle = log4rs::init_config(log4rs_config)?;
        Ok(Self { _handle: handle })
    }

    /// Translate a `LogConfig` into a log4rs configuration without installing it.
    pub fn build_config(config: &LogConfig) -> Result<Config, Box<dyn std::error::Error>> {
        let mut log4rs_config = Config::builder();
        let mut root = Root::builder();

        if config.console {
            let console = ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build();
            log4rs_config = log4rs_config
                .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
            root = root.appender(CONSOLE_APPENDER);
        }

        if let Some(file_config) = &config.file {
            let appender = Self::create_appender(file_config)?;
            log4rs_config = log4rs_config
                .appender(Appender::builder().build(FILE_APPENDER, Box::new(appender)));
            root = root.appender(FILE_APPENDER);
        }

        let final_config = log4rs_config.build(root.build(Self::parse_level(&config.level)))?;
        Ok(final_config)
    }

    fn create_appender(
        config: &FileLogConfig,
    ) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
        let log_directory = Path::new(&config.log_directory);
        std::fs::create_dir_all(log_directory)?;

        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y%m%d%H%M%S%3f").to_string();

        let log_file = log_directory.join(&config.log_file_name);
        let archived_log_pattern = format!(
            "{}/{}-{{}}-{}.gz",
            log_directory.display(), config.log_file_name, formatted_time
        );

        let size_trigger = SizeBasedTriggerPolicy::new(config.max_file_size);
        let roller =
            FixedWindowRoller::builder().build(&archived_log_pattern, config.max_zip_count)?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(log_file, Box::new(compound_policy))?;

        Ok(appender)
    }

    pub(crate) fn parse_level(level: &str) -> LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}
