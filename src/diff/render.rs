use std::fmt::Write as _;
use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use super::types::{DiffKind, DiffLine};

/// Width of the line-number gutter: enough digits for the largest number on
/// either side.
fn gutter_width(lines: &[DiffLine]) -> usize {
    lines
        .iter()
        .flat_map(|l| [l.old_lineno, l.new_lineno])
        .flatten()
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1)
}

fn format_row(line: &DiffLine, width: usize) -> String {
    let old = line.old_lineno.map(|n| n.to_string()).unwrap_or_default();
    let new = line.new_lineno.map(|n| n.to_string()).unwrap_or_default();
    format!(
        "{old:>width$} {new:>width$} {}{}",
        line.kind.prefix(),
        line.text
    )
}

/// Two number columns (old, new), a `+`/`-`/space marker, then the text.
pub fn render_plain(lines: &[DiffLine]) -> String {
    let width = gutter_width(lines);
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{}", format_row(line, width));
    }
    out
}

/// Same layout as [`render_plain`], coloured for a terminal.
pub fn print_colored<W: Write>(out: &mut W, lines: &[DiffLine]) -> io::Result<()> {
    let width = gutter_width(lines);
    for line in lines {
        let row = format_row(line, width);
        match line.kind {
            DiffKind::Added => writeln!(out, "{}", row.with(Color::Green))?,
            DiffKind::Removed => writeln!(out, "{}", row.with(Color::Red))?,
            DiffKind::Context => writeln!(out, "{row}")?,
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::compute_unified_diff;

    #[test]
    fn test_render_plain_columns() {
        let lines = compute_unified_diff("a\nb\nc", "a\nx\nc");
        let rendered = render_plain(&lines);
        assert_eq!(rendered, "1 1  a\n2   -b\n  2 +x\n3 3  c\n");
    }

    #[test]
    fn test_gutter_grows_with_numbers() {
        let older: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
        let lines = compute_unified_diff(&older.join("\n"), "");
        let rendered = render_plain(&lines);
        assert!(rendered.starts_with(" 1    -1\n"));
        assert!(rendered.ends_with("12    -12\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_plain(&[]), "");
    }
}
