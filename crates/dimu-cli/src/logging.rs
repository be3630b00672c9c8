use crate::error::Result;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes the global tracing subscriber.
///
/// The console layer writes to stderr at a level controlled by `verbosity` and `quiet`. When a
/// `log_file` is given, a second layer records everything at TRACE level to that file.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: &Option<PathBuf>) -> Result<()> {
    let console_level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_level);

    let file_layer = if let Some(path) = log_file {
        let file = File::create(path)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_filter(LevelFilter::TRACE),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tempfile::TempDir;

    static INIT: Once = Once::new();

    #[test]
    #[serial]
    fn test_setup_logging_with_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dimu.log");
        INIT.call_once(|| {
            setup_logging(2, false, &Some(path.clone())).unwrap();
        });
        tracing::info!("logging initialised");
        assert!(path.exists());
    }
}
