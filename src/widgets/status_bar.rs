use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::ui::{AppState, ToastLevel};

const SPINNER: [&str; 6] = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"];

fn toast_tag(level: ToastLevel) -> &'static str {
    match level {
        ToastLevel::Success => "[OK]",
        ToastLevel::Error => "[ERROR]",
        ToastLevel::Info => "[INFO]",
    }
}

/// One-line footer: spinner + status, toast, focus/editing and key help.
pub fn draw_footer(f: &mut Frame, area: Rect, state: &AppState, help_text: &str) {
    let theme = &state.theme;
    let mut spans: Vec<Span> = Vec::new();
    if state.executing || state.status_text.is_some() {
        let spinner = SPINNER[state.tick as usize % SPINNER.len()];
        let msg = state.status_text.as_deref().unwrap_or("Executing...");
        spans.push(Span::raw(format!(" {spinner} {msg}")));
        spans.push(Span::raw("  |  "));
    }
    if let Some(t) = &state.toast {
        let color = theme.toast_color(t.level);
        spans.push(Span::styled(
            format!("{} ", toast_tag(t.level)),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!("{}  |  ", t.text),
            Style::default().fg(color),
        ));
    }
    spans.push(Span::styled(
        format!("focus: {}", state.focus.label()),
        Style::default().fg(theme.accent),
    ));
    if state.form.as_ref().is_some_and(|fw| fw.form.editing) {
        spans.push(Span::raw("  |  editing"));
    }
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(help_text.to_string(), theme.text_muted()));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
