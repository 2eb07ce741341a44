use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Offset, OFFSET_EPSILON, POSITIONS_PREFIX};

/// Integer pixel offset as it appears in the position annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelOffset {
    pub x: i32,
    pub y: i32,
}

/// Serializes committed offsets into the single annotation line, or `None`
/// when every offset sits at or below the epsilon floor.
///
/// Keys are emitted in sorted order so the line is canonical.
pub fn encode(offsets: &BTreeMap<String, Offset>) -> Option<String> {
    let filtered: BTreeMap<&str, PixelOffset> = offsets
        .iter()
        .filter(|(_, offset)| {
            offset.dx.abs() > OFFSET_EPSILON || offset.dy.abs() > OFFSET_EPSILON
        })
        .map(|(id, offset)| {
            (
                id.as_str(),
                PixelOffset {
                    x: offset.dx.round() as i32,
                    y: offset.dy.round() as i32,
                },
            )
        })
        .collect();

    if filtered.is_empty() {
        return None;
    }

    let json = serde_json::to_string(&filtered).ok()?;
    Some(format!("{POSITIONS_PREFIX} {json}"))
}

/// Locates the trailing annotation line and parses it. Malformed or absent
/// content is treated as "no prior layout", never an error.
pub fn decode(source: &str) -> Option<BTreeMap<String, PixelOffset>> {
    let payload = source
        .lines()
        .rev()
        .find_map(|line| line.trim_start().strip_prefix(POSITIONS_PREFIX))?;
    serde_json::from_str(payload.trim()).ok()
}

/// Rewrites `source` so it carries at most one annotation line reflecting
/// `offsets`: any prior annotation is removed, and a fresh line is appended
/// when the encoded mapping is non-empty. Idempotent.
pub fn merge_annotation(source: &str, offsets: &BTreeMap<String, Offset>) -> String {
    let mut output = String::new();
    for line in source.lines() {
        if line.trim_start().starts_with(POSITIONS_PREFIX) {
            continue;
        }
        output.push_str(line);
        output.push('\n');
    }

    while output.ends_with("\n\n") {
        output.pop();
    }

    if let Some(line) = encode(offsets) {
        output.push_str(&line);
        output.push('\n');
    }

    output
}
