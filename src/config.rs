//! Command-line configuration.

use crate::error::{Result, StreamError};
use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable that pins the evaluation time when no argument is given.
pub const NOW_ENV_VAR: &str = "FLOWFI_NOW";

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Command CSV to process.
    pub input_path: PathBuf,

    /// Unix seconds at which stream states are reported.
    pub now: i64,
}

impl Config {
    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self> {
        Self::from_args(env::args().skip(1), env::var(NOW_ENV_VAR).ok())
    }

    /// Builds a config from positional arguments (without the program name).
    ///
    /// The evaluation time comes from the second argument, then `env_now`,
    /// then the wall clock.
    pub fn from_args<I>(args: I, env_now: Option<String>) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let input_path = args.next().map(PathBuf::from).ok_or(StreamError::MissingArgument)?;

        let now = match args.next().or(env_now) {
            Some(raw) => parse_now(&raw)?,
            None => wall_clock(),
        };

        Ok(Config { input_path, now })
    }
}

fn parse_now(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| StreamError::InvalidNow(raw.to_string()))
}

/// Current Unix time in whole seconds.
pub fn wall_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_input_is_an_error() {
        assert!(matches!(
            Config::from_args(args(&[]), None),
            Err(StreamError::MissingArgument)
        ));
    }

    #[test]
    fn test_argument_wins_over_env() {
        let config =
            Config::from_args(args(&["in.csv", "1700000000"]), Some("5".to_string())).unwrap();
        assert_eq!(config.input_path, PathBuf::from("in.csv"));
        assert_eq!(config.now, 1_700_000_000);
    }

    #[test]
    fn test_env_used_when_no_argument() {
        let config = Config::from_args(args(&["in.csv"]), Some(" 42 ".to_string())).unwrap();
        assert_eq!(config.now, 42);
    }

    #[test]
    fn test_falls_back_to_wall_clock() {
        let before = wall_clock();
        let config = Config::from_args(args(&["in.csv"]), None).unwrap();
        assert!(config.now >= before);
    }

    #[test]
    fn test_rejects_non_numeric_now() {
        assert!(matches!(
            Config::from_args(args(&["in.csv", "soon"]), None),
            Err(StreamError::InvalidNow(_))
        ));
    }
}
