//! Subscriber setup for the `esmodels` binary.
//!
//! The library only emits `tracing` events; the binary decides where they go.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output is written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    Off,
    Stdout,
    #[default]
    Stderr,
    /// Append to a file (ANSI colors disabled).
    File(PathBuf),
}

impl FromStr for LogTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "off" => Ok(LogTarget::Off),
            "1" | "stdout" => Ok(LogTarget::Stdout),
            "2" | "stderr" => Ok(LogTarget::Stderr),
            "" => Err("log target must not be empty".to_string()),
            filename => Ok(LogTarget::File(PathBuf::from(filename))),
        }
    }
}

/// Filter from `RUST_LOG` when set, otherwise DEBUG or INFO.
fn filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
pub fn init(target: &LogTarget, verbose: bool) -> anyhow::Result<()> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter(verbose))
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter(verbose))
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter(verbose))
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_target_parse() {
        assert_eq!("0".parse::<LogTarget>().unwrap(), LogTarget::Off);
        assert_eq!("off".parse::<LogTarget>().unwrap(), LogTarget::Off);
        assert_eq!("1".parse::<LogTarget>().unwrap(), LogTarget::Stdout);
        assert_eq!("stderr".parse::<LogTarget>().unwrap(), LogTarget::Stderr);
        assert_eq!(
            "sync.log".parse::<LogTarget>().unwrap(),
            LogTarget::File(PathBuf::from("sync.log"))
        );
        assert!("".parse::<LogTarget>().is_err());
    }
}
