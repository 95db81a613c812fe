use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};

use crate::ui::AppState;

/// Applications reachable with a function key.
pub const MAX_FN_APPS: usize = 9;

/// Application tabs: `[F1] Name │ [F2] Name ...`. Applications past F9
/// are still reachable with `[`/`]`.
pub fn draw_app_tabs(f: &mut Frame, area: Rect, state: &AppState) {
    let theme = &state.theme;
    let current_index = state.selection.current_app_id;
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.frame));

    if state.apps.is_empty() {
        let p = Paragraph::new(Span::styled("No applications loaded", theme.text_muted()))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let titles: Vec<Line> = state
        .apps
        .iter()
        .enumerate()
        .map(|(i, app)| {
            let is_selected = i == current_index;
            let text_style = if is_selected {
                Style::default()
                    .fg(theme.selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            let key_style = if is_selected {
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            let mut spans = Vec::new();
            if i < MAX_FN_APPS {
                spans.push(Span::styled("[", Style::default().fg(theme.frame)));
                spans.push(Span::styled(format!("F{}", i + 1), key_style));
                spans.push(Span::styled("] ", Style::default().fg(theme.frame)));
            }
            spans.push(Span::styled(app.name().to_string(), text_style));
            Line::from(spans)
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(current_index)
        .style(Style::default().fg(theme.fg))
        .highlight_style(
            Style::default()
                .fg(theme.selected)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(theme.frame)));

    f.render_widget(tabs.block(block), area);
}

/// Application index for a function key, if such an application exists.
pub fn app_for_function_key(state: &AppState, key_num: u8) -> Option<usize> {
    let index = (key_num as usize).checked_sub(1)?;
    (index < MAX_FN_APPS && index < state.apps.len()).then_some(index)
}

/// Neighbouring application for `[`/`]`, wrapping around.
pub fn cycle_app(state: &AppState, forward: bool) -> Option<usize> {
    let total = state.apps.len();
    if total == 0 {
        return None;
    }
    let cur = state.selection.current_app_id.min(total - 1);
    Some(if forward {
        (cur + 1) % total
    } else {
        (cur + total - 1) % total
    })
}
