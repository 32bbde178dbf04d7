use crate::models::Platform;
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::debug;

/// Raw lines of one file, grouped by platform in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLines {
    groups: Vec<(String, Vec<String>)>,
}

impl ClassifiedLines {
    /// Lines attributed to the platform with this tag (empty if none matched).
    #[cfg(test)]
    pub fn lines_for(&self, tag: &str) -> &[String] {
        self.groups
            .iter()
            .find(|(group_tag, _)| group_tag == tag)
            .map(|(_, lines)| lines.as_slice())
            .unwrap_or(&[])
    }

    /// Take ownership of the lines for one platform.
    pub fn take(&mut self, tag: &str) -> Vec<String> {
        self.groups
            .iter_mut()
            .find(|(group_tag, _)| group_tag == tag)
            .map(|(_, lines)| std::mem::take(lines))
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, lines)| lines.len()).sum()
    }
}

/// Split every line of `reader` into per-platform groups.
///
/// A line belongs to the first platform (in slice order) whose marker it
/// contains; lines matching no platform are dropped. The reader is consumed.
///
/// Lines need not be UTF-8; invalid bytes are replaced with U+FFFD.
pub fn classify<R: BufRead>(mut reader: R, platforms: &[Platform]) -> Result<ClassifiedLines> {
    let mut groups: Vec<(String, Vec<String>)> = platforms
        .iter()
        .map(|platform| (platform.tag.clone(), Vec::new()))
        .collect();

    let mut buf = Vec::new();
    let mut line_number = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("Failed to read line {}", line_number + 1))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let line = String::from_utf8_lossy(trim_line_ending(&buf));
        if let Some(slot) = platforms.iter().position(|platform| platform.matches(&line)) {
            if matches!(line, std::borrow::Cow::Owned(_)) {
                debug!(line = line_number, "Replaced invalid UTF-8 in access log line");
            }
            groups[slot].1.push(line.into_owned());
        }
    }

    Ok(ClassifiedLines { groups })
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
