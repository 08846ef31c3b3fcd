// In: src/observability.rs

//! Opt-in logging setup.
//!
//! The library itself only emits through the `log` facade. Applications that want to
//! see those records without wiring their own logger call `enable_verbose_logging`
//! once at startup.

use crate::error::Result;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `Debug` level, printing `[LEVEL] message` lines.
///
/// The crate reports mask attachment, combination and filled reads at `debug`, and each
/// evaluated region at `trace`.
///
/// With `log_file` set, records are appended to that file instead of stderr. The file
/// is opened on every call, but only the first call installs a logger.
pub fn enable_verbose_logging(log_file: Option<&Path>) -> Result<()> {
    let target = match log_file {
        Some(path) => {
            let file = OpenOptions::new().append(true).create(true).open(path)?;
            Some(env_logger::Target::Pipe(Box::new(file)))
        }
        None => None,
    };
    if INIT_LOGGER.is_completed() {
        return Ok(());
    }

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(target) = target {
            builder.target(target);
        }

        // Another logger may already be installed by the host application.
        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_calls_are_harmless() {
        enable_verbose_logging(None).unwrap();
        enable_verbose_logging(None).unwrap();
        log::info!("logging enabled");
    }

    #[test]
    fn test_debug_records_are_enabled() {
        enable_verbose_logging(None).unwrap();
        assert!(log::log_enabled!(log::Level::Debug));
    }

    #[test]
    fn test_unopenable_log_file_is_an_io_error() {
        let missing = std::env::temp_dir()
            .join("cube-mask-no-such-dir")
            .join("nested")
            .join("log.txt");
        let result = enable_verbose_logging(Some(&missing));
        assert!(matches!(result, Err(crate::error::MaskError::Io(_))));
    }
}
