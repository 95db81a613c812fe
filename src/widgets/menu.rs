use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::theme::Theme;
use crate::widgets::chrome::panel_block;

/// Window `[start, end)` of a list that keeps `selected` visible.
pub(crate) fn compute_scroll_window(total: usize, selected: usize, inner_h: u16) -> (usize, usize) {
    if inner_h == 0 || total == 0 {
        return (0, 0);
    }
    let sel = selected.min(total.saturating_sub(1));
    let ih = inner_h as usize;
    let start = sel.saturating_sub(ih - 1);
    let end = (start + ih).min(total);
    (start, end)
}

#[derive(Clone, Debug, Default)]
pub struct ListCursor {
    pub selected: usize,
    viewport_h: u16,
}

impl ListCursor {
    pub fn reset(&mut self) {
        self.selected = 0;
    }

    /// Arrow/page navigation; returns true when the key was consumed.
    pub fn on_key(&mut self, key: KeyCode, total: usize) -> bool {
        let page = (self.viewport_h as usize).max(1);
        let last = total.saturating_sub(1);
        match key {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(last),
            KeyCode::PageUp => self.selected = self.selected.saturating_sub(page),
            KeyCode::PageDown => self.selected = (self.selected + page).min(last),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = last,
            _ => return false,
        }
        true
    }
}

pub struct ListView<'a> {
    pub title: &'a str,
    pub items: Vec<String>,
    /// Item to mark as active (e.g. the currently opened module).
    pub active: Option<usize>,
    pub empty_text: &'a str,
}

pub fn draw_list(
    f: &mut Frame,
    area: Rect,
    view: ListView,
    cursor: &mut ListCursor,
    focused: bool,
    theme: &Theme,
) {
    let inner_h = area.height.saturating_sub(2);
    cursor.viewport_h = inner_h;
    let total = view.items.len();
    if cursor.selected >= total {
        cursor.selected = total.saturating_sub(1);
    }
    let block = panel_block(view.title, focused, theme);
    if total == 0 {
        let p = Paragraph::new(Span::styled(view.empty_text.to_string(), theme.text_muted()))
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
        return;
    }
    let (start, end) = compute_scroll_window(total, cursor.selected, inner_h);
    let items: Vec<ListItem> = view
        .items
        .iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(idx, text)| {
            let is_sel = idx == cursor.selected;
            let marker = if view.active == Some(idx) { "● " } else { "  " };
            let item = ListItem::new(format!("{marker}{text}"));
            if is_sel && focused {
                item.style(theme.list_cursor_style())
            } else if is_sel {
                item.style(theme.text_active_bold())
            } else {
                item
            }
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}
