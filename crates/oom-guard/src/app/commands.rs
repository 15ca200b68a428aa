use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::domain::PressureAction;
use crate::domain::PressureMetric;
use crate::domain::SignalScope;
use crate::infra::GuardConfig;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

const LONG_ABOUT: &str = "\
Guard a service against out-of-memory kills.\n\
\n\
When system memory use (or, with --metric process, this process's\n\
resident set) rises above the threshold, requests are either rejected\n\
with 503 or the process group is asked to terminate so a supervisor\n\
can restart it cleanly.";

const AFTER_LONG_HELP: &str = r#"ENVIRONMENT:
    OOM_GUARD_THRESHOLD            Used-memory fraction that trips the guard (default 0.9)
    OOM_GUARD_REFRESH_INTERVAL_MS  Minimum ms between /proc/meminfo reads (default 1000)
    OOM_GUARD_ACTION               reject | selfdestruct (default reject)
    OOM_GUARD_SIGNAL_SCOPE         group | process (default group)
    OOM_GUARD_METRIC               system | process (default system)
    OOM_GUARD_LOG                  Log file path
    OOM_GUARD_LOG_FORMAT           text | json
    OOM_GUARD_LOG_STREAM           stderr | stdout

Flags override environment values.

EXAMPLES:
    oom-guard status
    oom-guard status --json
    oom-guard serve --listen 0.0.0.0:8080 --threshold 0.85
    oom-guard serve --action selfdestruct --signal-scope process
    oom-guard serve --metric process --threshold 0.5"#;

#[derive(Debug, Parser)]
#[command(name = "oom-guard")]
#[command(author, version, propagate_version = true)]
#[command(about = "Memory-pressure guard with single-flight self-termination")]
#[command(long_about = LONG_ABOUT)]
#[command(after_long_help = AFTER_LONG_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, help_heading = "Debug Options")]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve a demo router behind the memory guard
    Serve(ServeArgs),

    /// Print the current memory pressure reading
    Status {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Used-memory fraction above which the guard fires
    #[arg(long, value_name = "FRACTION")]
    pub threshold: Option<f64>,

    /// What to do above the threshold (reject or selfdestruct)
    #[arg(long, value_name = "ACTION")]
    pub action: Option<PressureAction>,

    /// Minimum milliseconds between memory report reads (0 = every request)
    #[arg(long, value_name = "MS")]
    pub refresh_interval_ms: Option<u64>,

    /// Signal target when self-destructing (group or process)
    #[arg(long, value_name = "SCOPE")]
    pub signal_scope: Option<SignalScope>,

    /// Gate input: system-wide usage or this process's resident set
    #[arg(long, value_name = "METRIC")]
    pub metric: Option<PressureMetric>,
}

impl ServeArgs {
    /// Layers explicit flags over `base`.
    pub fn apply(&self, base: GuardConfig) -> GuardConfig {
        let mut config = base;
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        if let Some(action) = self.action {
            config = config.with_action(action);
        }
        if let Some(ms) = self.refresh_interval_ms {
            config = config.with_refresh_interval(Duration::from_millis(ms));
        }
        if let Some(scope) = self.signal_scope {
            config = config.with_signal_scope(scope);
        }
        if let Some(metric) = self.metric {
            config = config.with_metric(metric);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args(argv: &[&str]) -> ServeArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Serve(args) => args,
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let args = serve_args(&["oom-guard", "serve"]);

        assert_eq!(args.listen, DEFAULT_LISTEN);
        assert_eq!(args.apply(GuardConfig::default()), GuardConfig::default());
    }

    #[test]
    fn test_serve_flags_override_config() {
        let args = serve_args(&[
            "oom-guard",
            "serve",
            "--threshold",
            "0.7",
            "--action",
            "selfdestruct",
            "--refresh-interval-ms",
            "0",
            "--signal-scope",
            "process",
            "--metric",
            "process",
        ]);

        let config = args.apply(GuardConfig::default());

        assert_eq!(config.threshold(), 0.7);
        assert_eq!(config.action(), PressureAction::SelfDestruct);
        assert_eq!(config.refresh_interval(), Duration::ZERO);
        assert_eq!(config.signal_scope(), SignalScope::Process);
        assert_eq!(config.metric(), PressureMetric::Process);
    }

    #[test]
    fn test_metric_flag_keeps_env_value_when_absent() {
        let args = serve_args(&["oom-guard", "serve"]);
        let base = GuardConfig::default().with_metric(PressureMetric::Process);

        assert_eq!(args.apply(base).metric(), PressureMetric::Process);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = Cli::try_parse_from(["oom-guard", "serve", "--action", "explode"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_status_json_flag() {
        let cli = Cli::try_parse_from(["oom-guard", "status", "--json", "-v"]).unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["oom-guard"]).is_err());
    }
}
