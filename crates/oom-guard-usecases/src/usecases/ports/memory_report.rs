use std::io;

/// A line-oriented `Key: value [kB]` memory report, e.g. `/proc/meminfo`.
pub trait MemoryReportSource: Send + Sync {
    /// Reads the whole report. Called at most once per refresh.
    fn read_report(&self) -> io::Result<String>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}
