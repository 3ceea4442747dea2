//! Subscriber setup for the client binaries.
//!
//! Each entry of the `logging` config section is keyed by a target prefix,
//! with `default` covering everything else. An entry sets a console level and
//! optionally a JSON log file with size-based rotation. Console output goes to
//! stderr so stdout carries only command output.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

use crate::config::{LoggingConfig, Section};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 10;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber and the `log` bridge.
///
/// Relative log file paths are resolved against `base_dir`, normally the
/// client home directory. An empty config logs warnings to stderr.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    let layers = if cfg.is_empty() {
        vec![console_layer(Targets::new().with_default(LevelFilter::WARN))]
    } else {
        build_layers(cfg, base_dir)
    };
    let _ = tracing_subscriber::registry().with(layers).try_init();
}

/// Unknown names fall back to INFO; `off` and `none` disable output.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn crate_sections(cfg: &LoggingConfig) -> impl Iterator<Item = (&str, &Section)> {
    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .map(|(name, section)| (name.as_str(), section))
}

fn has_file(section: &Section) -> bool {
    !section.file.trim().is_empty()
}

fn console_targets(cfg: &LoggingConfig) -> Targets {
    let fallback = cfg
        .get(DEFAULT_SECTION)
        .map_or(LevelFilter::OFF, |s| parse_level(&s.console_level));

    crate_sections(cfg).fold(Targets::new().with_default(fallback), |targets, (name, s)| {
        targets.with_target(name, parse_level(&s.console_level))
    })
}

/// Crates with a file of their own stay out of the default file.
fn default_file_targets(default: &Section, cfg: &LoggingConfig) -> Targets {
    let fallback = Targets::new().with_default(parse_level(&default.file_level));

    crate_sections(cfg).fold(fallback, |targets, (name, s)| {
        let level = if has_file(s) {
            LevelFilter::OFF
        } else {
            parse_level(&s.file_level)
        };
        targets.with_target(name, level)
    })
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(path: &Path, section: &Section) -> io::Result<FileRotate<AppendTimestamp>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_files = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS).max(1);

    Ok(FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

fn console_layer(filter: Targets) -> BoxedLayer {
    fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

/// JSON file layer for one section; `None` when the section has no file or
/// the file cannot be opened.
fn file_layer(name: &str, section: &Section, base_dir: &Path, filter: Targets) -> Option<BoxedLayer> {
    if !has_file(section) {
        return None;
    }

    let path = resolve_log_path(section.file.trim(), base_dir);
    match open_rotating(&path, section) {
        Ok(writer) => Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Mutex::new(writer))
                .with_filter(filter)
                .boxed(),
        ),
        Err(e) => {
            // No subscriber exists yet to report through.
            eprintln!("cannot open log file for '{}' at {}: {}", name, path.display(), e);
            None
        }
    }
}

fn build_layers(cfg: &LoggingConfig, base_dir: &Path) -> Vec<BoxedLayer> {
    let mut layers = vec![console_layer(console_targets(cfg))];

    if let Some(default) = cfg.get(DEFAULT_SECTION) {
        let filter = default_file_targets(default, cfg);
        layers.extend(file_layer(DEFAULT_SECTION, default, base_dir, filter));
    }

    for (name, section) in crate_sections(cfg) {
        let filter = Targets::new().with_target(name, parse_level(&section.file_level));
        layers.extend(file_layer(name, section, base_dir, filter));
    }

    layers
}
