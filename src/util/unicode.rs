use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Terminal cells a string occupies. Tabs are drawn as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

fn grapheme_width(g: &str) -> usize {
    if g == "\t" { 4 } else { UnicodeWidthStr::width(g) }
}

/// Cut `s` to at most `max_cells`, ending in `…` when anything was dropped.
/// Never splits a grapheme cluster or a wide character.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let w = grapheme_width(g);
        if width + w > budget {
            break;
        }
        width += w;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Remove the last grapheme cluster, as Backspace does in a prompt
pub fn pop_grapheme(s: &mut String) {
    if let Some((start, _)) = s.grapheme_indices(true).next_back() {
        s.truncate(start);
    }
}
