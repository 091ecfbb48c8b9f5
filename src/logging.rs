//! Logging setup for the console binary.
//!
//! The terminal is owned by ratatui, so log records go to a file through
//! `log4rs`. A `config/log4rs.yaml` in the working directory takes precedence
//! over the settings-driven file appender.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::ConsoleSettings;

const LOG4RS_FILE: &str = "config/log4rs.yaml";
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

pub fn init(settings: &ConsoleSettings, workspace_root: &Path) -> Result<()> {
    let custom = workspace_root.join(LOG4RS_FILE);
    if custom.exists() {
        log4rs::init_file(&custom, Default::default())
            .with_context(|| format!("failed to load {}", custom.display()))?;
        return Ok(());
    }

    let log_file = settings.log_file();
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log dir: {}", dir.display()))?;
    }
    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(&log_file)
        .with_context(|| format!("failed to open log file: {}", log_file.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(
            Root::builder()
                .appender("file")
                .build(parse_level(&settings.logging.level)),
        )
        .context("invalid logging configuration")?;
    log4rs::init_config(config).context("logger already initialised")?;
    Ok(())
}

/// Unknown level names fall back to `info`.
pub fn parse_level(raw: &str) -> LevelFilter {
    raw.trim().parse().unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level(" warn "), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }
}
