//! Pinchlist: merge adjacent list rows with a pinch, split them with a long press.

mod app;
mod color;
mod controller;
mod geometry;
mod gesture;
mod input;
mod rows;
mod session;
mod surface;
mod table;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Tunables for the merge gesture and the rows it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeConfig {
    /// Preview height over row height above which a pinch commits.
    pub commit_threshold: f64,
    /// Vertical growth applied to each edge of the overlap band.
    pub preview_inset: f64,
    /// Opacity change per progress sample.
    pub opacity_step: f64,
    /// Vertical nudge per progress sample, in points.
    pub nudge_step: f64,
    /// Velocities below this count as converging.
    pub velocity_threshold: f64,
    pub restore_duration: Duration,
    pub long_press: Duration,
    pub row_height: f64,
    pub payout_rate: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            commit_threshold: 0.95,
            preview_inset: 2.0,
            opacity_step: 0.012,
            nudge_step: 2.0,
            velocity_threshold: 0.0,
            restore_duration: Duration::from_millis(200),
            long_press: Duration::from_millis(500),
            row_height: 48.0,
            payout_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("commit threshold must be in (0, 1], got {0}")]
    CommitThreshold(f64),
    #[error("opacity step must be in [0, 1], got {0}")]
    OpacityStep(f64),
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("row height must be positive, got {0}")]
    RowHeight(f64),
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.commit_threshold > 0.0 && self.commit_threshold <= 1.0) {
            return Err(ConfigError::CommitThreshold(self.commit_threshold));
        }
        if !(0.0..=1.0).contains(&self.opacity_step) {
            return Err(ConfigError::OpacityStep(self.opacity_step));
        }
        for (name, value) in [
            ("preview inset", self.preview_inset),
            ("nudge step", self.nudge_step),
            ("payout rate", self.payout_rate),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        if !(self.row_height > 0.0) {
            return Err(ConfigError::RowHeight(self.row_height));
        }
        Ok(())
    }

    fn from_args(args: &Args) -> Self {
        Self {
            commit_threshold: args.commit_threshold,
            preview_inset: args.preview_inset,
            opacity_step: args.opacity_step,
            nudge_step: args.nudge_step,
            velocity_threshold: 0.0,
            restore_duration: if args.no_animation {
                Duration::ZERO
            } else {
                Duration::from_millis(args.restore_ms)
            },
            long_press: Duration::from_millis(args.long_press_ms),
            row_height: args.row_height,
            payout_rate: args.payout_rate,
        }
    }
}

/// Install the file logger. The returned guard flushes the background
/// writer on drop, so keep it alive until the terminal is restored.
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;
    Ok(guard)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = MergeConfig::from_args(&args);
    config.validate()?;
    let _log_guard = init_logging(&args.log_file)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(err) => {
            tracing::warn!(%err, "theme not loaded, using defaults");
            theme::Theme::default()
        }
    };
    tracing::info!(?config, "starting");
    App::new(args, config, theme)?.run()
}

/// Pinch adjacent rows together to merge them; long-press a row to split one in above it.
#[derive(Debug, Parser)]
#[command(
    name = "pinchlist",
    version,
    about = "Merge adjacent list rows with a pinch, split them with a long press.",
    long_about = "Pinchlist shows a list of trips (colour, distance, payout). Pinch two \
        neighbouring rows together until they overlap to merge them into one row carrying \
        the blended colour and the summed distance and payout. Long-press a row to split a \
        new row in above it.\n\n\
        KEYBOARD:\n  Up/Down k/j  Move cursor   m           Start pinch on cursor row + next\n  \
        - or ,       Pinch in       + = or .    Pinch out\n  Enter        Release pinch  Esc         Cancel pinch\n  \
        s            Split above    PgUp/PgDn   Scroll       q  Quit\n\n\
        MOUSE:\n  Right-click pins a finger; left-drag is the second finger.\n  \
        Hold the left button still on a row to split it. Wheel scrolls."
)]
pub struct Args {
    /// Preview height (as a fraction of row height) at which a pinch commits.
    #[arg(long, default_value = "0.95", value_name = "FRACTION")]
    pub commit_threshold: f64,

    /// Points added above and below the overlap band when drawing the preview.
    #[arg(long, default_value = "2.0", value_name = "PT")]
    pub preview_inset: f64,

    /// Opacity change of the pinched rows per progress sample.
    #[arg(long, default_value = "0.012", value_name = "STEP")]
    pub opacity_step: f64,

    /// Points each pinched row moves per progress sample.
    #[arg(long, default_value = "2.0", value_name = "PT")]
    pub nudge_step: f64,

    /// Long-press duration before a split fires.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub long_press_ms: u64,

    /// Duration of the bounce-back after a cancelled pinch.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub restore_ms: u64,

    /// Row height in points (8 points per terminal line).
    #[arg(long, default_value = "48.0", value_name = "PT")]
    pub row_height: f64,

    /// Payout per unit of distance for seeded rows.
    #[arg(long, default_value = "0.5", value_name = "RATE")]
    pub payout_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Seed row palette: normal, high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable animations (bounce-back lands instantly, no fade on insert).
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Where to write logs (filter with RUST_LOG).
    #[arg(long, default_value = "pinchlist.log", value_name = "FILE")]
    pub log_file: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(MergeConfig::default().validate(), Ok(()));
    }

    #[test]
    fn args_defaults_match_config_defaults() {
        let args = Args::parse_from(["pinchlist"]);
        assert_eq!(MergeConfig::from_args(&args), MergeConfig::default());
    }

    #[test]
    fn no_animation_zeroes_restore() {
        let args = Args::parse_from(["pinchlist", "--no-animation"]);
        assert!(MergeConfig::from_args(&args).restore_duration.is_zero());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = |f: fn(&mut MergeConfig)| {
            let mut c = MergeConfig::default();
            f(&mut c);
            c.validate()
        };
        assert!(matches!(
            bad(|c| c.commit_threshold = 1.5),
            Err(ConfigError::CommitThreshold(_))
        ));
        assert!(matches!(
            bad(|c| c.commit_threshold = 0.0),
            Err(ConfigError::CommitThreshold(_))
        ));
        assert!(matches!(
            bad(|c| c.opacity_step = -0.1),
            Err(ConfigError::OpacityStep(_))
        ));
        assert!(matches!(
            bad(|c| c.nudge_step = -1.0),
            Err(ConfigError::Negative { .. })
        ));
        assert!(matches!(
            bad(|c| c.row_height = 0.0),
            Err(ConfigError::RowHeight(_))
        ));
        assert!(matches!(
            bad(|c| c.payout_rate = f64::NAN),
            Err(ConfigError::Negative { .. })
        ));
    }

    #[test]
    fn palette_aliases_parse() {
        let args = Args::parse_from(["pinchlist", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
    }

    #[test]
    fn logger_writes_off_thread_and_flushes_on_guard_drop() {
        let dir = std::env::temp_dir().join(format!("pinchlist-log-{}", std::process::id()));
        let path = dir.join("nested").join("run.log");
        let guard = init_logging(&path).unwrap();
        tracing::error!("log line from the test");
        drop(guard);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("log line from the test"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
