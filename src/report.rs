//! Comparison report shown before the user picks a candidate.

use tracing::{info, warn};

use crate::models::{TagCompare, TaskContext};

const HEADERS: [&str; 3] = ["Field", "Tagged Data", "Origin Data"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub level: Level,
    pub text: String,
}

impl ReportLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            text: text.into(),
        }
    }
}

/// Styling supplied by whoever draws the report.
pub trait Highlighter {
    /// Emphasize a (pre-padded) table cell.
    fn highlight(&self, text: &str) -> String;

    fn warning(&self, text: &str) -> String {
        text.to_string()
    }
}

/// No styling; used for logs written to files and in tests.
pub struct PlainText;

impl Highlighter for PlainText {
    fn highlight(&self, text: &str) -> String {
        text.to_string()
    }
}

/// ANSI styling for interactive terminals.
pub struct Terminal;

impl Highlighter for Terminal {
    fn highlight(&self, text: &str) -> String {
        console::style(text).cyan().to_string()
    }

    fn warning(&self, text: &str) -> String {
        console::style(text).yellow().to_string()
    }
}

/// Build the report for a task.
///
/// A task without an origin file gets a single warning. Otherwise the
/// comparison table follows a line naming the origin file, and a conflict
/// adds a warning after the table.
pub fn render(
    ctx: &TaskContext,
    use_origin_on_conflict: bool,
    highlighter: &dyn Highlighter,
) -> Vec<ReportLine> {
    let Some(tag_compare) = ctx.tag_compare() else {
        let msg = format!("No origin file found at {}", ctx.origin_path().display());
        return vec![ReportLine::warning(highlighter.warning(&msg))];
    };

    let conflict = ctx.conflict();
    // Emphasis marks the column whose values end up on the items: tagged
    // only when a conflict blocked the update, origin otherwise
    let use_tagged = conflict && !use_origin_on_conflict;

    let mut lines = vec![ReportLine::info(format!(
        "Using origin file {}",
        ctx.origin_path().display()
    ))];
    lines.extend(
        render_table(tag_compare, use_tagged, highlighter)
            .into_iter()
            .map(ReportLine::info),
    );
    if conflict {
        let msg = "Origin data conflicts with tagged data.";
        lines.push(ReportLine::warning(highlighter.warning(msg)));
    }
    lines
}

/// Render the comparison table as box-drawn lines.
/// `use_tagged` selects which value column is emphasized on active rows.
pub fn render_table(
    tag_compare: &TagCompare,
    use_tagged: bool,
    highlighter: &dyn Highlighter,
) -> Vec<String> {
    let width = |s: &str| s.chars().count();

    // Widths include every field, shown or not
    let w_key = tag_compare
        .iter()
        .map(|(k, _)| width(k.label()))
        .fold(width(HEADERS[0]), usize::max);
    let w_tagged = tag_compare
        .iter()
        .map(|(_, e)| width(&e.tagged))
        .fold(width(HEADERS[1]), usize::max);
    let w_origin = tag_compare
        .iter()
        .map(|(_, e)| width(&e.origin))
        .fold(width(HEADERS[2]), usize::max);

    let emphasize = |text: &str, w: usize, on: bool| {
        let padded = format!("{:<w$}", text, w = w);
        if on {
            highlighter.highlight(&padded)
        } else {
            padded
        }
    };
    let rule = |left: char, fill: char, mid: char, right: char| {
        format!(
            "{left}{}{mid}{}{mid}{}{right}",
            fill.to_string().repeat(w_key + 2),
            fill.to_string().repeat(w_tagged + 2),
            fill.to_string().repeat(w_origin + 2),
        )
    };

    let mut lines = Vec::with_capacity(FIELD_ROWS_HINT);
    lines.push(rule('╔', '═', '╤', '╗'));
    lines.push(format!(
        "║ {:<w_key$} │ {} │ {} ║",
        HEADERS[0],
        emphasize(HEADERS[1], w_tagged, use_tagged),
        emphasize(HEADERS[2], w_origin, !use_tagged),
    ));
    lines.push(rule('╟', '─', '┼', '╢'));
    for (key, entry) in tag_compare.iter() {
        if entry.tagged.is_empty() && entry.origin.is_empty() {
            continue;
        }
        lines.push(format!(
            "║ {:<w_key$} │ {} │ {} ║",
            key.label(),
            emphasize(&entry.tagged, w_tagged, use_tagged && entry.active),
            emphasize(&entry.origin, w_origin, !use_tagged && entry.active),
        ));
    }
    lines.push(rule('╚', '═', '╧', '╝'));
    lines
}

/// Borders plus header plus one row per field
const FIELD_ROWS_HINT: usize = 4 + crate::models::FieldKey::COUNT;

/// Write report lines through the logger.
pub fn emit(lines: &[ReportLine]) {
    for line in lines {
        match line.level {
            Level::Info => info!("{}", line.text),
            Level::Warning => warn!("{}", line.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKey, TagCompareEntry, TaskOutcome};
    use std::path::PathBuf;

    /// Wraps emphasized cells in asterisks so tests can see them.
    struct Marker;

    impl Highlighter for Marker {
        fn highlight(&self, text: &str) -> String {
            format!("*{}*", text)
        }
    }

    fn compare() -> TagCompare {
        let mut compare = TagCompare::default();
        *compare.get_mut(FieldKey::Media) = TagCompareEntry {
            tagged: "CD".to_string(),
            origin: "Digital Media".to_string(),
            active: true,
        };
        *compare.get_mut(FieldKey::Catalognum) = TagCompareEntry {
            tagged: "ABC-1".to_string(),
            origin: "ABC1".to_string(),
            active: false,
        };
        compare
    }

    fn context(conflict: bool) -> TaskContext {
        TaskContext {
            origin_path: PathBuf::from("/music/Album/origin.yaml"),
            outcome: TaskOutcome::Compared {
                tag_compare: compare(),
                conflict,
                applied: !conflict,
            },
        }
    }

    #[test]
    fn test_table_layout() {
        let lines = render_table(&compare(), false, &PlainText);
        assert_eq!(
            lines,
            vec![
                "╔════════════════╤═════════════╤═══════════════╗",
                "║ Field          │ Tagged Data │ Origin Data   ║",
                "╟────────────────┼─────────────┼───────────────╢",
                "║ Media          │ CD          │ Digital Media ║",
                "║ Catalog number │ ABC-1       │ ABC1          ║",
                "╚════════════════╧═════════════╧═══════════════╝",
            ]
        );
    }

    #[test]
    fn test_rows_with_no_values_skipped() {
        let lines = render_table(&TagCompare::default(), false, &PlainText);
        // Borders and header only
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_origin_emphasized_when_applied() {
        let lines = render_table(&compare(), false, &Marker);
        // Cells are padded to the column width before emphasis
        assert!(lines[1].contains("*Origin Data  *"));
        assert!(lines[3].contains("*Digital Media*"));
        assert!(!lines[3].contains("*CD"));
        // Inactive row gets no emphasis
        assert!(!lines[4].contains('*'));
    }

    #[test]
    fn test_tagged_emphasized_on_blocked_conflict() {
        let lines = render_table(&compare(), true, &Marker);
        assert!(lines[1].contains("*Tagged Data*"));
        assert!(lines[3].contains("*CD         *"));
        assert!(!lines[3].contains("*Digital"));
    }

    #[test]
    fn test_render_missing_origin() {
        let ctx = TaskContext::missing(PathBuf::from("/music/Album/origin.yaml"));
        let lines = render(&ctx, false, &PlainText);
        assert_eq!(
            lines,
            vec![ReportLine::warning("No origin file found at /music/Album/origin.yaml")]
        );
    }

    #[test]
    fn test_render_conflict_adds_warning() {
        let lines = render(&context(true), false, &PlainText);
        assert_eq!(lines[0], ReportLine::info("Using origin file /music/Album/origin.yaml"));
        let last = lines.last().unwrap();
        assert_eq!(last.level, Level::Warning);
        assert_eq!(last.text, "Origin data conflicts with tagged data.");
    }

    #[test]
    fn test_render_conflict_with_origin_preference() {
        let lines = render(&context(true), true, &Marker);
        // Header of the origin column emphasized since origin data is written
        assert!(lines[2].text.contains("*Origin Data  *"));
        assert!(lines[4].text.contains("*Digital Media*"));
        assert!(!lines[2].text.contains("*Tagged"));
    }

    #[test]
    fn test_render_no_conflict_has_no_warning() {
        let lines = render(&context(false), false, &PlainText);
        assert!(lines.iter().all(|l| l.level == Level::Info));
        assert_eq!(lines.len(), 7);
    }
}
