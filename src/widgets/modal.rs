use crate::theme::Theme;
use crate::widgets::chrome::centered_rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

/// The single modal slot. A new notice replaces whatever is showing.
#[derive(Clone, Debug, Default)]
pub struct Modal {
    current: Option<Notice>,
}

impl Modal {
    pub fn notify(&mut self, kind: NoticeKind, title: impl Into<String>, body: impl Into<String>) {
        self.current = Some(Notice {
            kind,
            title: title.into(),
            body: body.into(),
        });
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }
}

pub fn draw_modal(f: &mut Frame, area: Rect, modal: &Modal, theme: &Theme) {
    let Some(notice) = modal.current() else {
        return;
    };
    let color = theme.notice_color(notice.kind);
    let rect = centered_rect(60, 40, area);
    let mut lines: Vec<Line> = notice
        .body
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter/Esc to close",
        theme.text_muted(),
    )));
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", notice.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(color));
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_notice_wins() {
        let mut m = Modal::default();
        m.notify(NoticeKind::Info, "Deployed handlers", "auth");
        m.notify(NoticeKind::Error, "Error initializing", "down");
        let n = m.current().unwrap();
        assert_eq!(n.kind, NoticeKind::Error);
        assert_eq!(n.title, "Error initializing");
        m.dismiss();
        assert!(!m.is_visible());
    }
}
