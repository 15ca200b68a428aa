//! Memory report sources.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::PressureMetric;
use crate::usecases::ports::MemoryReportSource;

const PROC_MEMINFO: &str = "/proc/meminfo";
const PROC_SELF_STATUS: &str = "/proc/self/status";

/// Reads the kernel's `/proc/meminfo` (or a file with the same format).
#[derive(Debug, Clone)]
pub struct ProcMeminfoSource {
    path: PathBuf,
}

impl Default for ProcMeminfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcMeminfoSource {
    pub fn new() -> Self {
        Self::with_path(PROC_MEMINFO)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryReportSource for ProcMeminfoSource {
    fn read_report(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// System report followed by this process's status, so `MemTotal` and
/// `VmRSS` land in one set of counters.
#[derive(Debug, Clone)]
pub struct ProcessMemorySource {
    meminfo: PathBuf,
    status: PathBuf,
}

impl Default for ProcessMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMemorySource {
    pub fn new() -> Self {
        Self::with_paths(PROC_MEMINFO, PROC_SELF_STATUS)
    }

    pub fn with_paths(meminfo: impl Into<PathBuf>, status: impl Into<PathBuf>) -> Self {
        Self {
            meminfo: meminfo.into(),
            status: status.into(),
        }
    }
}

impl MemoryReportSource for ProcessMemorySource {
    fn read_report(&self) -> io::Result<String> {
        let mut report = fs::read_to_string(&self.meminfo)?;
        report.push('\n');
        report.push_str(&fs::read_to_string(&self.status)?);
        Ok(report)
    }

    fn describe(&self) -> String {
        format!("{} + {}", self.meminfo.display(), self.status.display())
    }
}

/// Stand-in for platforms without procfs. The empty report has no
/// `MemTotal`, so pressure always reads 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatformSource;

impl MemoryReportSource for UnsupportedPlatformSource {
    fn read_report(&self) -> io::Result<String> {
        Ok(String::new())
    }

    fn describe(&self) -> String {
        format!("unsupported platform ({})", std::env::consts::OS)
    }
}

#[cfg(target_os = "linux")]
pub fn default_report_source() -> Arc<dyn MemoryReportSource> {
    Arc::new(ProcMeminfoSource::new())
}

#[cfg(not(target_os = "linux"))]
pub fn default_report_source() -> Arc<dyn MemoryReportSource> {
    tracing::info!(
        os = std::env::consts::OS,
        "No memory report on this platform; memory pressure will read as 0"
    );
    Arc::new(UnsupportedPlatformSource)
}

/// Report source matching `metric` on this platform.
#[cfg(target_os = "linux")]
pub fn report_source_for(metric: PressureMetric) -> Arc<dyn MemoryReportSource> {
    match metric {
        PressureMetric::System => default_report_source(),
        PressureMetric::Process => Arc::new(ProcessMemorySource::new()),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn report_source_for(_metric: PressureMetric) -> Arc<dyn MemoryReportSource> {
    default_report_source()
}
