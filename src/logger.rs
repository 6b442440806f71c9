//! Tagged terminal output and the in-place progress line.
//!
//! ```ignore
//! log!("build"; "transforming {} resources", count);
//! debug!("rules"; "no rule for {}", request);
//! ```
//!
//! While a [`ProgressLine`] is drawn, log lines are printed above it and the
//! progress text is redrawn underneath.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::{Mutex, const_mutex};
use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Text of the progress line currently on screen.
static STATUS: Mutex<Option<String>> = const_mutex(None);

pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `log!("tag"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($tag:expr; $($arg:tt)*) => {{
        $crate::logger::log($tag, &format!($($arg)*))
    }};
}

/// Like `log!`, only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($tag:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($tag, &format!($($arg)*))
        }
    }};
}

pub fn log(tag: &str, message: &str) {
    let status = STATUS.lock();
    let mut out = stdout().lock();
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    writeln!(out, "{} {message}", styled_tag(tag)).ok();
    if let Some(line) = status.as_deref() {
        write!(out, "{line}").ok();
    }
    out.flush().ok();
}

fn styled_tag(tag: &str) -> String {
    let tag_text = format!("[{tag}]");
    match tag {
        "build" | "commit" => tag_text.bright_blue().bold().to_string(),
        "error" => tag_text.bright_red().bold().to_string(),
        "warning" => tag_text.yellow().bold().to_string(),
        "plugin" | "sw" | "report" | "externals" => tag_text.bright_green().bold().to_string(),
        _ => tag_text.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// ProgressLine
// ============================================================================

/// `[build] modules(4/12)`, redrawn in place.
///
/// Safe to bump from worker threads; a redraw is skipped when another thread
/// holds the terminal.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    finished: bool,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        let progress = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            finished: false,
        };
        progress.draw(&mut STATUS.lock());
        progress
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if let Some(mut status) = STATUS.try_lock() {
            self.draw(&mut status);
        }
    }

    fn text(&self) -> String {
        format!(
            "{}({}/{})",
            self.label,
            self.done.load(Ordering::Relaxed),
            self.total
        )
    }

    fn draw(&self, status: &mut Option<String>) {
        let line = format!("{} {}", styled_tag("build"), self.text());
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(out, "{line}").ok();
        out.flush().ok();
        *status = Some(line);
    }

    /// Leave the final count on screen.
    pub fn finish(mut self) {
        let mut status = STATUS.lock();
        self.draw(&mut status);
        *status = None;
        writeln!(stdout()).ok();
        self.finished = true;
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // aborted: wipe the partial line
        *STATUS.lock() = None;
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }

    #[test]
    fn test_progress_counts_and_clears_status() {
        let progress = ProgressLine::new("modules", 2);
        progress.inc();
        assert_eq!(progress.text(), "modules(1/2)");
        progress.finish();
        assert!(STATUS.lock().is_none());
    }
}
