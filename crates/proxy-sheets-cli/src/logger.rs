use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;

/// Writes timestamped log lines to stderr
#[derive(Clone)]
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self {
            level: if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Warn
            },
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

fn format_line(timestamp: DateTime<Local>, level: Level, target: &str, message: &str) -> String {
    format!(
        "[{} {:<5} {}] {}",
        timestamp.format("%H:%M:%S"),
        level,
        target,
        message
    )
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format_line(
                Local::now(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let timestamp = Local.with_ymd_and_hms(2024, 5, 1, 9, 3, 7).unwrap();
        let line = format_line(timestamp, Level::Warn, "proxy_sheets::pipeline", "Rate limited");
        assert_eq!(line, "[09:03:07 WARN  proxy_sheets::pipeline] Rate limited");
    }

    #[test]
    fn test_verbose_enables_debug() {
        use log::Log;
        let quiet = ConsoleLogger::new(false);
        let verbose = ConsoleLogger::new(true);
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(!quiet.enabled(&debug));
        assert!(verbose.enabled(&debug));
    }
}
