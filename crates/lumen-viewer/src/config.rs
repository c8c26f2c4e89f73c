//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::application::AppSettings;
use crate::render_mode::{RenderMode, UnknownRenderMode};

pub const USAGE: &str = "\
usage: lumen-viewer [options]

options:
  --vertex <path>      vertex stage WGSL (default: built-in)
  --fragment <path>    fragment stage WGSL (default: built-in)
  --interval <ms>      minimum time between rendered frames (default: 60)
  --mode <name>        initial render mode, e.g. \"Line Loop\" or line-loop
  --headless <frames>  render <frames> frames without a window and exit
  --seed <n>           seed for the random clear color
  --log <filter>       log filter, env_logger syntax (default: RUST_LOG or info)
  -h, --help           print this help

keys:
  1-7 select a render mode, Tab cycles modes
  k r y g c b m w set the clear color, * picks a random one, ? prints it
  Esc quits";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing value for `{0}`")]
    MissingValue(&'static str),

    #[error("invalid value `{value}` for `{flag}`")]
    InvalidNumber { flag: &'static str, value: String },

    #[error(transparent)]
    UnknownMode(#[from] UnknownRenderMode),

    #[error("unknown argument `{0}`")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
    pub interval: Duration,
    pub mode: RenderMode,
    /// Frame count for a windowless run.
    pub headless: Option<u32>,
    pub seed: u64,
    pub log_filter: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            vertex: None,
            fragment: None,
            interval: Duration::from_millis(60),
            mode: RenderMode::default(),
            headless: None,
            seed: 0,
            log_filter: None,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Run(ViewerConfig),
    Help,
}

impl ViewerConfig {
    /// Parses arguments, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<Invocation, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "--vertex" => config.vertex = Some(value(&mut args, "--vertex")?.into()),
                "--fragment" => config.fragment = Some(value(&mut args, "--fragment")?.into()),
                "--interval" => {
                    let ms = number(&mut args, "--interval")?;
                    config.interval = Duration::from_millis(ms);
                }
                "--mode" => config.mode = value(&mut args, "--mode")?.parse()?,
                "--headless" => {
                    let frames = number(&mut args, "--headless")?;
                    config.headless = Some(u32::try_from(frames).map_err(|_| {
                        ConfigError::InvalidNumber {
                            flag: "--headless",
                            value: frames.to_string(),
                        }
                    })?);
                }
                "--seed" => config.seed = number(&mut args, "--seed")?,
                "--log" => config.log_filter = Some(value(&mut args, "--log")?),
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        Ok(Invocation::Run(config))
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            interval: self.interval,
            mode: self.mode,
            seed: self.seed,
            ..AppSettings::default()
        }
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, ConfigError> {
    args.next().ok_or(ConfigError::MissingValue(flag))
}

fn number(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<u64, ConfigError> {
    let value = value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { flag, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, ConfigError> {
        ViewerConfig::from_args(args.iter().map(|s| s.to_string()))
    }

    fn run(args: &[&str]) -> ViewerConfig {
        match parse(args) {
            Ok(Invocation::Run(config)) => config,
            other => panic!("expected a run configuration, got {other:?}"),
        }
    }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn no_arguments_give_defaults() {
        let config = run(&[]);
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.interval, Duration::from_millis(60));
        assert_eq!(config.mode, RenderMode::Triangles);
    }

    // ── flags ─────────────────────────────────────────────────────────────

    #[test]
    fn parses_every_flag() {
        let config = run(&[
            "--vertex", "a.wgsl", "--fragment", "b.wgsl", "--interval", "16", "--mode",
            "line-strip", "--headless", "12", "--seed", "9", "--log", "debug",
        ]);
        assert_eq!(config.vertex, Some(PathBuf::from("a.wgsl")));
        assert_eq!(config.fragment, Some(PathBuf::from("b.wgsl")));
        assert_eq!(config.interval, Duration::from_millis(16));
        assert_eq!(config.mode, RenderMode::LineStrip);
        assert_eq!(config.headless, Some(12));
        assert_eq!(config.seed, 9);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["--mode", "Points", "--help"]), Ok(Invocation::Help));
    }

    #[test]
    fn settings_carry_interval_mode_and_seed() {
        let settings = run(&["--interval", "30", "--mode", "Points", "--seed", "4"]).app_settings();
        assert_eq!(settings.interval, Duration::from_millis(30));
        assert_eq!(settings.mode, RenderMode::Points);
        assert_eq!(settings.seed, 4);
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn missing_value_is_reported() {
        assert_eq!(parse(&["--interval"]), Err(ConfigError::MissingValue("--interval")));
    }

    #[test]
    fn bad_number_is_reported() {
        assert_eq!(
            parse(&["--interval", "soon"]),
            Err(ConfigError::InvalidNumber {
                flag: "--interval",
                value: "soon".into()
            })
        );
    }

    #[test]
    fn unknown_mode_and_argument_fail() {
        assert!(matches!(
            parse(&["--mode", "wireframe"]),
            Err(ConfigError::UnknownMode(_))
        ));
        assert_eq!(
            parse(&["--fullscreen"]),
            Err(ConfigError::UnknownArgument("--fullscreen".into()))
        );
    }
}
