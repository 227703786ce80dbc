//! Command line interface
//!
//! Positional tokens pick the task count and mode the same loose way the
//! classic drivers did: an integer sets the task count, `io` / `heavy`
//! pick the mode, anything else is ignored, including stray `-x` tokens.
//! Options tune the workload.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Command, CommandFactory, Parser};

use crate::config::{BenchmarkConfig, BenchmarkMode};
use crate::models::BenchmarkRequest;
use crate::report::ProgressDisplay;
use crate::DEFAULT_TASK_COUNT;

#[derive(Parser, Debug)]
#[command(name = "fanbench")]
#[command(about = "Fan-out/fan-in CPU and I/O benchmark driver")]
#[command(version)]
pub struct Cli {
    /// Task count and/or mode keyword (`cpu`, `io`, `heavy`); other tokens are ignored
    pub args: Vec<String>,

    /// Config file (default: $CONFIG_DIR/fanbench/fanbench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for temporary files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// CPU loop iterations per task
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Heavy mode file size in MiB
    #[arg(long)]
    pub file_size_mb: Option<usize>,

    /// Simulated network latency range, e.g. `10ms..30ms`
    #[arg(long, value_parser = parse_delay_range)]
    pub network_delay: Option<(u64, u64)>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Append the report to run history
    #[arg(long)]
    pub save: bool,

    /// Show the N most recent saved runs and exit
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,

    /// Leave temporary files on disk
    #[arg(long)]
    pub keep_temp_files: bool,

    /// Print task lines without a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    pub write_config: bool,

    /// Delete saved run history and exit
    #[arg(long)]
    pub clear_history: bool,
}

impl Cli {
    /// Parse a full argv, passing unknown `-x` / `--xyz` tokens through as positionals
    pub fn try_parse_loose<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(route_unknown_tokens(argv))
    }

    /// The benchmark request described by the positional tokens
    pub fn request(&self) -> BenchmarkRequest {
        parse_tokens(&self.args)
    }

    /// Layer command line overrides on top of a loaded config
    pub fn apply(&self, mut config: BenchmarkConfig) -> BenchmarkConfig {
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(iterations) = self.iterations {
            config.cpu.iterations = iterations;
        }
        if let Some(size) = self.file_size_mb {
            config.heavy.file_size_mb = size;
        }
        if let Some((min_ms, max_ms)) = self.network_delay {
            config = config.with_network_delay(min_ms, max_ms);
        }
        if self.keep_temp_files {
            config.keep_temp_files = true;
        }
        if self.save {
            config.save_history = true;
        }
        config
    }

    pub fn progress_display(&self) -> ProgressDisplay {
        if self.json {
            ProgressDisplay::Silent
        } else if self.no_progress {
            ProgressDisplay::Lines
        } else {
            ProgressDisplay::Bar
        }
    }
}

/// Turn loose positional tokens into a request
///
/// The last integer wins. `heavy` beats `io`, which beats the default `cpu`.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> BenchmarkRequest {
    let mut task_count = DEFAULT_TASK_COUNT;
    let mut mode = BenchmarkMode::Cpu;

    for token in tokens {
        let token = token.as_ref();
        if let Ok(parsed) = token.parse::<BenchmarkMode>() {
            if parsed > mode {
                mode = parsed;
            }
        } else if let Ok(count) = token.parse::<usize>() {
            task_count = count;
        } else {
            log::debug!("ignoring unrecognized argument {:?}", token);
        }
    }

    BenchmarkRequest::new(mode, task_count)
}

/// Move known options to the front and every other token behind `--`
fn route_unknown_tokens<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut command = Cli::command();
    command.build();

    let mut argv = argv.into_iter().map(Into::into);
    let mut options: Vec<OsString> = argv.next().into_iter().collect();
    let mut tokens = Vec::new();

    while let Some(arg) = argv.next() {
        if arg == "--" {
            tokens.extend(argv.by_ref());
            break;
        }

        match arg.to_str().and_then(|a| option_takes_value(&command, a)) {
            Some(takes_value) => {
                let inline_value = arg.to_str().map_or(false, |a| a.contains('='));
                options.push(arg);
                if takes_value && !inline_value {
                    options.extend(argv.next());
                }
            }
            None => tokens.push(arg),
        }
    }

    options.push(OsString::from("--"));
    options.extend(tokens);
    options
}

/// `Some(takes_value)` when `arg` names one of the command's options
fn option_takes_value(command: &Command, arg: &str) -> Option<bool> {
    let found = if let Some(long) = arg.strip_prefix("--") {
        let name = long.split_once('=').map_or(long, |(name, _)| name);
        command.get_arguments().find(|a| a.get_long() == Some(name))
    } else if let Some(short) = arg.strip_prefix('-') {
        let mut chars = short.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => command.get_arguments().find(|a| a.get_short() == Some(c)),
            _ => None,
        }
    } else {
        None
    };

    found.map(|a| a.get_action().takes_values())
}

/// Parse `MIN..MAX` with humantime durations on each side
pub fn parse_delay_range(input: &str) -> Result<(u64, u64), String> {
    let (min, max) = input
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX, got {}", input))?;

    let min = humantime::parse_duration(min.trim()).map_err(|e| e.to_string())?;
    let max = humantime::parse_duration(max.trim()).map_err(|e| e.to_string())?;
    if min > max {
        return Err(format!("range is inverted: {}", input));
    }

    Ok((min.as_millis() as u64, max.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let empty: [&str; 0] = [];
        assert_eq!(parse_tokens(&empty), BenchmarkRequest::new(BenchmarkMode::Cpu, 10));
    }

    #[test]
    fn test_count_and_mode_in_any_order() {
        assert_eq!(parse_tokens(&["io", "25"]), BenchmarkRequest::new(BenchmarkMode::Io, 25));
        assert_eq!(parse_tokens(&["25", "io"]), BenchmarkRequest::new(BenchmarkMode::Io, 25));
        assert_eq!(parse_tokens(&["heavy", "3"]), BenchmarkRequest::new(BenchmarkMode::IoHeavy, 3));
        assert_eq!(parse_tokens(&["io", "heavy"]).mode, BenchmarkMode::IoHeavy);
        assert_eq!(parse_tokens(&["heavy", "io"]).mode, BenchmarkMode::IoHeavy);
        assert_eq!(parse_tokens(&["5", "7"]).task_count, 7);
    }

    #[test]
    fn test_unrecognized_tokens_are_ignored() {
        assert_eq!(
            parse_tokens(&["fast", "io", "x1", "4", "-"]),
            BenchmarkRequest::new(BenchmarkMode::Io, 4)
        );
    }

    #[test]
    fn test_zero_count_fails_validation() {
        assert!(parse_tokens(&["0"]).validate().is_err());
    }

    #[test]
    fn test_delay_range() {
        assert_eq!(parse_delay_range("10ms..30ms").unwrap(), (10, 30));
        assert_eq!(parse_delay_range("1s..2s").unwrap(), (1000, 2000));
        assert!(parse_delay_range("30ms..10ms").is_err());
        assert!(parse_delay_range("10ms").is_err());
        assert!(parse_delay_range("ten..20ms").is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "fanbench", "heavy", "3", "--file-size-mb", "1", "--network-delay", "1ms..2ms", "--save", "--json",
        ]);
        assert_eq!(cli.request(), BenchmarkRequest::new(BenchmarkMode::IoHeavy, 3));
        assert_eq!(cli.progress_display(), ProgressDisplay::Silent);

        let config = cli.apply(BenchmarkConfig::default());
        assert_eq!(config.heavy.file_size_mb, 1);
        assert_eq!(config.network.min_ms, 1);
        assert_eq!(config.network.max_ms, 2);
        assert!(config.save_history);
    }

    #[test]
    fn test_hyphenated_tokens_are_ignored() {
        let cli = Cli::try_parse_loose(["fanbench", "io", "-v"]).unwrap();
        assert_eq!(cli.request(), BenchmarkRequest::new(BenchmarkMode::Io, 10));

        let cli = Cli::try_parse_loose(["fanbench", "-5", "--fast", "heavy", "3", "--json"]).unwrap();
        assert_eq!(cli.request(), BenchmarkRequest::new(BenchmarkMode::IoHeavy, 3));
        assert!(cli.json);
    }

    #[test]
    fn test_known_options_keep_their_values() {
        let cli = Cli::try_parse_loose([
            "fanbench", "io", "--network-delay", "1ms..2ms", "--history=5", "-x", "4",
        ])
        .unwrap();
        assert_eq!(cli.request(), BenchmarkRequest::new(BenchmarkMode::Io, 4));
        assert_eq!(cli.network_delay, Some((1, 2)));
        assert_eq!(cli.history, Some(5));

        assert!(Cli::try_parse_loose(["fanbench", "--history", "many"]).is_err());
        assert!(Cli::try_parse_loose(["fanbench", "--network-delay", "30ms..10ms"]).is_err());
    }

    #[test]
    fn test_tokens_after_separator_stay_positional() {
        let cli = Cli::try_parse_loose(["fanbench", "--", "--json", "7"]).unwrap();
        assert!(!cli.json);
        assert_eq!(cli.request().task_count, 7);
    }
}
