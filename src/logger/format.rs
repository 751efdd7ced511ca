//! Log formatting and console output with ANSI colors
//!
//! Broken pipes (e.g. `metricsdash | head`) are ignored instead of panicking.

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, stdout, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_level(level),
        format_message(level, message)
    );

    if level <= LogLevel::Warning {
        write_safe(&mut stderr(), &line);
    } else {
        write_safe(&mut stdout(), &line);
    }
}

/// Format a tag with its color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Dashboard => label.bright_green().bold(),
        LogTag::Webserver => label.bright_cyan().bold(),
        LogTag::Sampler => label.bright_blue().bold(),
        LogTag::Services => label.bright_magenta().bold(),
        LogTag::External => label.white(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow().bold(),
        LogLevel::Info => label.bright_green(),
        LogLevel::Debug => label.bright_blue(),
        LogLevel::Verbose => label.dimmed(),
    }
}

fn format_message(level: LogLevel, message: &str) -> ColoredString {
    match level {
        LogLevel::Error => message.red(),
        LogLevel::Warning => message.yellow(),
        LogLevel::Verbose => message.dimmed(),
        _ => message.normal(),
    }
}

fn write_safe(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() != ErrorKind::BrokenPipe {
            eprintln!("logger: failed to write log line: {}", e);
        }
        return;
    }
    let _ = out.flush();
}
