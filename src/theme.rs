//! Terminal color palette

use colored::{ColoredString, Colorize};

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> ColoredString {
        text.bold().cyan()
    }

    pub fn primary(text: &str) -> ColoredString {
        text.bold()
    }

    pub fn divider(width: usize) -> ColoredString {
        "─".repeat(width).dimmed()
    }

    pub fn divider_bold(width: usize) -> ColoredString {
        "━".repeat(width).cyan()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn value(text: &str) -> ColoredString {
        text.white().bold()
    }

    pub fn hash(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green().bold()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow().bold()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red().bold()
    }

    pub fn added(text: &str) -> ColoredString {
        text.green()
    }

    pub fn removed(text: &str) -> ColoredString {
        text.red()
    }

    pub fn changed(text: &str) -> ColoredString {
        text.yellow()
    }
}
