//! Section blocks delimited by HTML comments:
//!
//! ```text
//! <!-- section-start NAME -->
//! any content
//! <!-- section-end NAME -->
//! ```
//!
//! A start marker must begin its line (leading whitespace allowed). An end
//! marker may appear anywhere and only closes the section with the same
//! name.
use regex::Regex;
use std::sync::LazyLock;

use crate::markdown::{BlockRule, Closed, Opened};

pub const SECTION_KIND: &str = "section";

static SECTION_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*<!--\s*section-start\s+(?P<name>\S+)\s*-->").unwrap()
});

pub fn end_marker(name: &str) -> String {
    format!("<!-- section-end {name} -->")
}

fn end_regex(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"<!--\s*section-end\s+{}\s*-->",
        regex::escape(name)
    ))
    .ok()
}

/// [`BlockRule`] for `section-start` / `section-end` comment pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionRule;

impl BlockRule for SectionRule {
    fn kind(&self) -> &'static str {
        SECTION_KIND
    }

    fn priority(&self) -> u16 {
        0
    }

    fn open(&self, fragment: &str) -> Option<Opened> {
        let caps = SECTION_START_REGEX.captures(fragment)?;
        let marker = caps.get(0)?;

        Some(Opened {
            name: caps["name"].to_string(),
            len: marker.end(),
        })
    }

    fn close(&self, name: &str, fragment: &str) -> Option<Closed> {
        let marker = end_regex(name)?.find(fragment)?;

        Some(Closed {
            start: marker.start(),
            end: marker.end(),
        })
    }
}
