use std::io;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::usecases::ports::MemoryReportSource;

/// In-memory report that counts reads and can be switched to fail.
pub struct StubReportSource {
    report: Mutex<String>,
    failing: Mutex<Option<io::ErrorKind>>,
    reads: AtomicUsize,
}

impl StubReportSource {
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: Mutex::new(report.into()),
            failing: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    /// Report with `MemTotal` and `MemAvailable` in kB.
    pub fn with_kb(total_kb: u64, available_kb: u64) -> Self {
        Self::new(format!(
            "MemTotal: {total_kb} kB\nMemAvailable: {available_kb} kB\n"
        ))
    }

    pub fn set_report(&self, report: impl Into<String>) {
        *self.report.lock().unwrap() = report.into();
    }

    pub fn fail_with(&self, kind: io::ErrorKind) {
        *self.failing.lock().unwrap() = Some(kind);
    }

    pub fn recover(&self) {
        *self.failing.lock().unwrap() = None;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl MemoryReportSource for StubReportSource {
    fn read_report(&self) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = *self.failing.lock().unwrap() {
            return Err(io::Error::new(kind, "stub report unavailable"));
        }
        Ok(self.report.lock().unwrap().clone())
    }

    fn describe(&self) -> String {
        "stub".to_string()
    }
}
