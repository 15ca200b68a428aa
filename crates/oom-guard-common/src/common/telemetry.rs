#![expect(clippy::print_stderr, reason = "Tracing not initialized yet")]

//! Tracing subscriber setup shared by the binary and embedders.

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_FILE_ENV: &str = "OOM_GUARD_LOG";
const LOG_FORMAT_ENV: &str = "OOM_GUARD_LOG_FORMAT";
const LOG_STREAM_ENV: &str = "OOM_GUARD_LOG_STREAM";

/// Keeps the non-blocking file writer alive; drop it last.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogStream {
    Stderr,
    Stdout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    format: LogFormat,
    stream: LogStream,
    file: Option<PathBuf>,
}

impl LogSettings {
    fn from_env() -> Self {
        let format = match env_lowercase(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let stream = match env_lowercase(LOG_STREAM_ENV).as_deref() {
            Some("stdout") => LogStream::Stdout,
            _ => LogStream::Stderr,
        };
        let file = std::env::var(LOG_FILE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self {
            format,
            stream,
            file,
        }
    }
}

fn env_lowercase(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_lowercase())
}

fn stream_writer(stream: LogStream) -> (BoxMakeWriter, bool) {
    match stream {
        LogStream::Stdout => (
            BoxMakeWriter::new(std::io::stdout),
            std::io::stdout().is_terminal(),
        ),
        LogStream::Stderr => (
            BoxMakeWriter::new(std::io::stderr),
            std::io::stderr().is_terminal(),
        ),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// A second call is harmless: the existing subscriber is kept and a guard
/// without a writer is returned.
pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let settings = LogSettings::from_env();

    let (writer, guard, ansi) = match settings.file.as_ref() {
        Some(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (BoxMakeWriter::new(non_blocking), Some(guard), false)
            }
            Err(err) => {
                eprintln!(
                    "Warning: failed to open log file {}: {}",
                    path.display(),
                    err
                );
                let (writer, ansi) = stream_writer(settings.stream);
                (writer, None, ansi)
            }
        },
        None => {
            let (writer, ansi) = stream_writer(settings.stream);
            (writer, None, ansi)
        }
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(writer)
                .finish(),
        ),
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_names(true)
                .with_ansi(ansi)
                .with_writer(writer)
                .finish(),
        ),
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return TelemetryGuard { _guard: None };
    }

    TelemetryGuard { _guard: guard }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: Test-only environment override, serialized by ENV_LOCK.
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn remove(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: Test-only environment override, serialized by ENV_LOCK.
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: Test-only environment restoration.
            unsafe {
                match self.prev.take() {
                    Some(prev) => std::env::set_var(self.key, prev),
                    None => std::env::remove_var(self.key),
                }
            }
        }
    }

    #[test]
    fn test_settings_parse_json_stdout_file() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _format = EnvGuard::set(LOG_FORMAT_ENV, " JSON ");
        let _stream = EnvGuard::set(LOG_STREAM_ENV, "stdout");
        let _file = EnvGuard::set(LOG_FILE_ENV, "/tmp/oom-guard.log");

        let settings = LogSettings::from_env();

        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.stream, LogStream::Stdout);
        assert_eq!(settings.file, Some(PathBuf::from("/tmp/oom-guard.log")));
    }

    #[test]
    fn test_settings_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _format = EnvGuard::remove(LOG_FORMAT_ENV);
        let _stream = EnvGuard::remove(LOG_STREAM_ENV);
        let _file = EnvGuard::set(LOG_FILE_ENV, "  ");

        let settings = LogSettings::from_env();

        assert_eq!(settings.format, LogFormat::Text);
        assert_eq!(settings.stream, LogStream::Stderr);
        assert_eq!(settings.file, None);
    }
}
