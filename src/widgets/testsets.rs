use crate::model::TestSet;
use crate::theme::Theme;
use crate::widgets::menu::{draw_list, ListCursor, ListView};
use ratatui::prelude::*;

pub const NO_TESTSETS_NOTICE: &str = "No testsets defined";

pub fn testset_items(sets: &[TestSet]) -> Vec<String> {
    sets.iter()
        .map(|t| {
            let name = t.name().unwrap_or("(unnamed)");
            match t.desc().filter(|d| !d.trim().is_empty()) {
                Some(d) => format!("{name} — {d}"),
                None => name.to_string(),
            }
        })
        .collect()
}

pub fn draw_testsets(
    f: &mut Frame,
    area: Rect,
    sets: &[TestSet],
    cursor: &mut ListCursor,
    focused: bool,
    theme: &Theme,
) {
    let title = if sets.is_empty() {
        "Test sets"
    } else {
        "Test sets (Enter run · a run all)"
    };
    draw_list(
        f,
        area,
        ListView {
            title,
            items: testset_items(sets),
            active: None,
            empty_text: NO_TESTSETS_NOTICE,
        },
        cursor,
        focused,
        theme,
    );
}
