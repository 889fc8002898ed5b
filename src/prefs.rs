//! Preference file filtering.
//!
//! Gecko's preference files are long lists of `pref(...)` calls interleaved
//! with preprocessor conditionals. Only the lines matching a pattern are
//! kept, together with the conditionals around them; conditional blocks left
//! without any kept line are then dropped.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Conditional directives kept by the line filter
pub fn is_preprocessor_line(line: &str) -> bool {
    line.starts_with("#if")
        || line.starts_with("#endif")
        || line.starts_with("#else")
        || line.starts_with("#elif")
}

/// Compiled matcher for the lines worth keeping
#[derive(Debug, Clone)]
pub struct PrefFilter {
    pattern: Regex,
}

impl PrefFilter {
    /// `pattern` is a regex that must match at the start of a line
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^(?:{})", pattern))
            .with_context(|| format!("Invalid preference pattern: {}", pattern))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Keep matching and conditional lines, then drop empty conditional
    /// blocks. Line terminators are kept as they were.
    pub fn filter<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let lines = text
            .split_inclusive('\n')
            .filter(|line| self.matches(line) || is_preprocessor_line(line))
            .collect();
        strip_empty_ifdefs(lines)
    }
}

struct Block {
    start: usize,
    retained: usize,
}

/// Remove every `#if`..`#endif` block holding no line outside of directives.
///
/// A block that keeps at least one line is emitted verbatim and counts as
/// retained content of its enclosing block. An `#endif` with no open block
/// is kept as is, as are blocks left open at the end of input.
pub fn strip_empty_ifdefs(lines: Vec<&str>) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut root_retained = 0usize;
    let mut stack: Vec<Block> = Vec::new();

    for line in lines {
        if line.starts_with("#if") {
            stack.push(Block {
                start: out.len(),
                retained: 0,
            });
            out.push(line);
        } else if line.starts_with("#endif") {
            match stack.pop() {
                Some(block) if block.retained == 0 => out.truncate(block.start),
                Some(block) => {
                    out.push(line);
                    match stack.last_mut() {
                        Some(parent) => parent.retained += block.retained,
                        None => root_retained += block.retained,
                    }
                }
                None => out.push(line),
            }
        } else {
            if !line.starts_with('#') {
                match stack.last_mut() {
                    Some(block) => block.retained += 1,
                    None => root_retained += 1,
                }
            }
            out.push(line);
        }
    }

    debug!("Kept {} lines, {} outside conditionals", out.len(), root_retained);
    out
}

/// Filter `src` into `dst`, creating the destination's directory if needed
pub fn copy_prefs(src: &Path, dst: &Path, filter: &PrefFilter) -> Result<usize> {
    let text = std::fs::read_to_string(src)
        .with_context(|| format!("Failed to read preference file: {:?}", src))?;

    let lines = filter.filter(&text);

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    std::fs::write(dst, lines.concat())
        .with_context(|| format!("Failed to write preference file: {:?}", dst))?;

    Ok(lines.len())
}
