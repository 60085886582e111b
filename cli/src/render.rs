// Row layout for the terminal rendition of the sidebar

use ansi_term::{Colour, Style};
use sidetabs::{FilterOutcome, TabEntity, TabId};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// One rendered line of the sidebar with its visual width.
#[derive(Debug, Clone, Default)]
pub struct RowPart {
    /// ANSI-styled text content
    pub part: String,
    /// Visual width in terminal columns
    pub len: usize,
    /// Tab shown on this line (None for indicator lines)
    pub tab_id: Option<TabId>,
}

fn container_colour(name: &str) -> Option<Colour> {
    match name {
        "blue" => Some(Colour::Blue),
        "turquoise" => Some(Colour::Cyan),
        "green" => Some(Colour::Green),
        "yellow" => Some(Colour::Yellow),
        "orange" => Some(Colour::Fixed(208)),
        "red" => Some(Colour::Red),
        "pink" => Some(Colour::Fixed(205)),
        "purple" => Some(Colour::Purple),
        _ => None,
    }
}

/// Cut `text` to at most `max` columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> (String, usize) {
    let width = UnicodeWidthStr::width(text);
    if width <= max {
        return (text.to_string(), width);
    }
    if max == 0 {
        return (String::new(), 0);
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    (out, used + 1)
}

/// Render a single tab as a sidebar line.
pub fn render_row(tab: &TabEntity, max_width: usize, colour: bool) -> RowPart {
    let mut flags = String::new();
    if tab.pinned {
        flags.push('^');
    }
    if tab.loading {
        flags.push('~');
    }
    if tab.muted {
        flags.push('m');
    } else if tab.audible {
        flags.push('a');
    }
    if tab.wants_attention {
        flags.push('*');
    }
    let title = if tab.title.is_empty() {
        tab.host()
    } else {
        tab.title.clone()
    };
    let prefix = if flags.is_empty() {
        " ".to_string()
    } else {
        format!(" [{}] ", flags)
    };
    let prefix_len = UnicodeWidthStr::width(prefix.as_str());
    let (title, title_len) = truncate(&title, max_width.saturating_sub(prefix_len + 1));
    let text = format!("{}{} ", prefix, title);
    let len = prefix_len + title_len + 1;

    let part = if colour {
        let mut style = Style::new();
        if tab.active {
            style = style.reverse().bold();
        }
        if tab.discarded {
            style = style.dimmed();
        }
        if let Some(c) = tab.context_color.as_deref().and_then(container_colour) {
            style = style.fg(c);
        }
        style.paint(text).to_string()
    } else {
        text
    };

    RowPart {
        part,
        len,
        tab_id: Some(tab.id),
    }
}

fn indicator(text: String) -> RowPart {
    let len = UnicodeWidthStr::width(text.as_str());
    RowPart {
        part: text,
        len,
        tab_id: None,
    }
}

/// Fit the rows into `max_rows` lines, always keeping the active row and
/// collapsing the rest around it.
pub fn build_sidebar(
    rows: Vec<RowPart>,
    active_idx: Option<usize>,
    max_rows: usize,
) -> Vec<RowPart> {
    if rows.len() <= max_rows {
        return rows;
    }
    if max_rows == 0 {
        return Vec::new();
    }
    // Two lines go to the collapse indicators, when at least one row fits
    // between them
    let indicators = max_rows >= 3;
    let available = if indicators { max_rows - 2 } else { max_rows };
    let active = active_idx.unwrap_or(0).min(rows.len() - 1);

    // Centre the window on the active row, then clamp it to the list
    let mut start = active.saturating_sub((available - 1) / 2);
    if start + available > rows.len() {
        start = rows.len() - available;
    }
    let end = start + available;

    let mut result = Vec::with_capacity(max_rows);
    if indicators && start > 0 {
        result.push(indicator(format!(" ^ +{} ", start)));
    }
    result.extend(rows[start..end].iter().cloned());
    if indicators && end < rows.len() {
        result.push(indicator(format!(" v +{} ", rows.len() - end)));
    }
    result
}

/// Lines for the tabs currently shown, plus the "show all tabs" line when a
/// filter hides some.
pub fn render_sidebar(
    tabs: &[&TabEntity],
    filter: Option<FilterOutcome>,
    max_rows: usize,
    max_width: usize,
    colour: bool,
) -> Vec<RowPart> {
    let active_idx = tabs.iter().position(|t| t.active);
    let rows = tabs
        .iter()
        .map(|tab| render_row(tab, max_width, colour))
        .collect();
    let mut lines = build_sidebar(rows, active_idx, max_rows);
    if let Some(outcome) = filter.filter(|o| o.has_more_tabs()) {
        lines.push(indicator(format!(
            " show all tabs ({} more) ",
            outcome.not_shown
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidetabs::TabSnapshot;

    fn make_tab(id: u32, title: &str) -> TabEntity {
        let mut snapshot = TabSnapshot::new(id, 1, id as usize);
        snapshot.title = title.to_string();
        snapshot.url = format!("https://{}.example/", title);
        TabEntity::from_snapshot(&snapshot)
    }

    fn make_rows(count: usize) -> Vec<RowPart> {
        (0..count)
            .map(|i| RowPart {
                part: format!("tab{}", i),
                len: 4,
                tab_id: Some(TabId(i as u32)),
            })
            .collect()
    }

    #[test]
    fn test_build_sidebar_fits() {
        let result = build_sidebar(make_rows(3), Some(0), 10);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_build_sidebar_collapses_around_active() {
        let result = build_sidebar(make_rows(20), Some(10), 7);
        assert_eq!(result.len(), 7);
        assert_eq!(result[0].tab_id, None);
        assert!(result[0].part.contains("+8"));
        let shown: Vec<_> = result.iter().filter_map(|r| r.tab_id).collect();
        assert_eq!(shown, (8..13).map(TabId).collect::<Vec<_>>());
        assert!(result[6].part.contains("+7"));
    }

    #[test]
    fn test_build_sidebar_active_at_end() {
        let result = build_sidebar(make_rows(10), Some(9), 5);
        assert!(result[0].part.contains("+7"));
        assert_eq!(result.last().and_then(|r| r.tab_id), Some(TabId(9)));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_build_sidebar_tiny_budget_drops_indicators() {
        for max_rows in 0..3 {
            let result = build_sidebar(make_rows(10), Some(5), max_rows);
            assert_eq!(result.len(), max_rows);
            assert!(result.iter().all(|r| r.tab_id.is_some()));
        }
        let result = build_sidebar(make_rows(10), Some(5), 1);
        assert_eq!(result[0].tab_id, Some(TabId(5)));
        let result = build_sidebar(make_rows(10), Some(9), 2);
        let shown: Vec<_> = result.iter().filter_map(|r| r.tab_id).collect();
        assert_eq!(shown, vec![TabId(8), TabId(9)]);
    }

    #[test]
    fn test_truncate_wide_chars() {
        assert_eq!(truncate("short", 10), ("short".to_string(), 5));
        let (text, len) = truncate("日本語のタイトル", 7);
        assert_eq!(text, "日本語…");
        assert_eq!(len, 7);
    }

    #[test]
    fn test_render_row_flags() {
        let mut tab = make_tab(3, "docs");
        tab.pinned = true;
        tab.muted = true;
        let row = render_row(&tab, 40, false);
        assert_eq!(row.part, " [^m] docs ");
        assert_eq!(row.len, 11);
        assert_eq!(row.tab_id, Some(TabId(3)));
    }

    #[test]
    fn test_render_row_falls_back_to_host() {
        let mut tab = make_tab(1, "");
        tab.url = "https://docs.rs/serde".to_string();
        let row = render_row(&tab, 40, false);
        assert_eq!(row.part, " docs.rs ");
    }

    #[test]
    fn test_show_all_line_when_filtered() {
        let a = make_tab(0, "alpha");
        let lines = render_sidebar(
            &[&a],
            Some(FilterOutcome {
                shown: 1,
                not_shown: 4,
            }),
            10,
            40,
            false,
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[1].part.contains("4 more"));
    }
}
