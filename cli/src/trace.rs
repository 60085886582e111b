// Recorded event traces: one JSON record per line

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sidetabs::{TabEvent, TabSnapshot, WindowId};

/// One line of a trace.
///
/// ```text
/// {"populate": [{"id": 1, "windowId": 1, "index": 0, ...}]}
/// {"event": {"event": "moved", "tabId": 1, "windowId": 1, "fromIndex": 0, "toIndex": 2}}
/// {"metadata": {"id": 9, "windowId": 1, "index": 1, "title": "Docs", ...}}
/// {"search": "docs"}
/// {"expect": [...]}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Record {
    /// Result of the full query made when the sidebar attached.
    Populate(Vec<TabSnapshot>),
    Event(TabEvent),
    /// Answer to a metadata fetch for an attached tab.
    Metadata(TabSnapshot),
    Search(String),
    /// Host state the mirror must match at this point.
    Expect(Vec<TabSnapshot>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub record: Record,
}

pub fn parse(text: &str) -> Result<Vec<Line>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let record = serde_json::from_str(line)
                .with_context(|| format!("line {}: not a trace record", i + 1))?;
            Ok(Line {
                number: i + 1,
                record,
            })
        })
        .collect()
}

pub fn read(path: &Path) -> Result<Vec<Line>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text)
}

/// Window of the first populated tab, for traces replayed without an
/// explicit window.
pub fn first_window(lines: &[Line]) -> Option<WindowId> {
    lines.iter().find_map(|line| match &line.record {
        Record::Populate(tabs) => tabs.first().map(|t| t.window_id),
        _ => None,
    })
}
