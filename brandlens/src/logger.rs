//! Logger initialization.

use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Once;

use chrono::Utc;
use logforth::{
    append::Stderr,
    filter::EnvFilter,
    layout::Layout,
};

static INIT: Once = Once::new();

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// One line per record: UTC timestamp to the millisecond, level, the
/// emitting module target, message. The target is what the `--log`
/// filter matches on (`llm=debug,store=debug`), so it stays visible in
/// the output. Only warnings and errors get color; a grounded run logs
/// enough INFO lines that a fully colored stream is unreadable.
#[derive(Debug)]
struct LineLayout {
    color: bool,
}

impl Layout for LineLayout {
    fn format(
        &self,
        record: &log::Record<'_>,
        _diagnostics: &[Box<dyn logforth::diagnostic::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let line = format!(
            "{} {:<5} {} {}",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.level(),
            record.target(),
            record.args()
        );

        let painted = match record.level() {
            log::Level::Error if self.color => format!("{RED}{line}{RESET}"),
            log::Level::Warn if self.color => format!("{YELLOW}{line}{RESET}"),
            _ => line,
        };

        Ok(painted.into_bytes())
    }
}

/// Initialize the logger. The filter is a string like "info" or
/// "server=debug,llm=debug".
pub fn init(log_filter: &str) {
    let log_filter = log_filter.to_owned();
    INIT.call_once(move || apply_logger(log_filter));
}

fn apply_logger(log_filter: String) {
    logforth::builder()
        .dispatch(move |dispatch| {
            let filter = EnvFilter::from_str(&log_filter)
                .unwrap_or_else(|_| EnvFilter::from_str("info").expect("default filter should be valid"));

            let layout = LineLayout {
                color: std::io::stderr().is_terminal(),
            };

            dispatch.filter(filter).append(Stderr::default().with_layout(layout))
        })
        .apply();
}
