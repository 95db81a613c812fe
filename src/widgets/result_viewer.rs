use crate::model::is_success;
use crate::theme::Theme;
use crate::widgets::markdown::highlight_code;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Visual state of the output pane; only the framing differs between a
/// successful and a failed call, the body is always shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

/// Pretty-print with the 4-space indentation the admin page always used.
pub fn pretty_json(v: &JsonValue) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    match v.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| v.to_string()),
        Err(_) => v.to_string(),
    }
}

pub struct ResultViewerWidget {
    pub title: String,
    framing: Framing,
    text: String,
    is_json: bool,
    wrap: bool,
    scroll_y: u16,
    last_viewport_h: u16,
    theme: Theme,
}

impl ResultViewerWidget {
    pub fn new(title: impl Into<String>, theme: Theme) -> Self {
        Self {
            title: title.into(),
            framing: Framing::Idle,
            text: String::new(),
            is_json: false,
            wrap: false,
            scroll_y: 0,
            last_viewport_h: 0,
            theme,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.framing = Framing::Idle;
        self.text.clear();
        self.is_json = false;
        self.scroll_y = 0;
    }

    pub fn loading(&mut self) {
        self.framing = Framing::Loading;
        self.text = "Executing...".into();
        self.is_json = false;
        self.scroll_y = 0;
    }

    pub fn show_response(&mut self, body: &JsonValue) {
        self.framing = if is_success(body) {
            Framing::Success
        } else {
            Framing::Failure
        };
        self.text = pretty_json(body);
        self.is_json = true;
        self.scroll_y = 0;
    }

    // Transport failures have no payload; the error text stands in for it.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.framing = Framing::Failure;
        self.text = message.into();
        self.is_json = false;
        self.scroll_y = 0;
    }
}

impl Default for ResultViewerWidget {
    fn default() -> Self {
        Self::new("Output", Theme::default())
    }
}

impl crate::widgets::Widget for ResultViewerWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, _tick: u64) {
        let lines: Vec<Line> = if self.is_json {
            highlight_code(&self.text, Some("json"))
        } else {
            self.text.lines().map(|l| Line::from(l.to_string())).collect()
        };
        self.last_viewport_h = area.height.saturating_sub(2);
        let total = lines.len() as u16;
        let max_scroll = total.saturating_sub(self.last_viewport_h);
        if self.scroll_y > max_scroll {
            self.scroll_y = max_scroll;
        }
        let label = match self.framing {
            Framing::Idle => String::new(),
            Framing::Loading => " · running".into(),
            Framing::Success => " · success".into(),
            Framing::Failure => " · failure".into(),
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{label}", self.title))
            .border_style(self.theme.framing_style(self.framing, focused));
        if focused {
            block = block.title_style(self.theme.text_active_bold());
        }
        let mut p = Paragraph::new(lines)
            .block(block)
            .scroll((self.scroll_y, 0));
        if self.wrap {
            p = p.wrap(ratatui::widgets::Wrap { trim: false });
        }
        f.render_widget(p, area);
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<crate::app::Effect> {
        match key {
            KeyCode::Up => {
                if self.scroll_y > 0 {
                    self.scroll_y -= 1;
                }
            }
            KeyCode::Down => self.scroll_y = self.scroll_y.saturating_add(1),
            KeyCode::PageUp => {
                let step = self.last_viewport_h;
                self.scroll_y = self.scroll_y.saturating_sub(step);
            }
            KeyCode::PageDown => {
                let step = self.last_viewport_h;
                self.scroll_y = self.scroll_y.saturating_add(step);
            }
            KeyCode::Home => self.scroll_y = 0,
            KeyCode::End => {
                let max_scroll = self
                    .text
                    .lines()
                    .count()
                    .saturating_sub(self.last_viewport_h as usize)
                    as u16;
                self.scroll_y = max_scroll;
            }
            KeyCode::Char('w') | KeyCode::Char('W') => self.wrap = !self.wrap,
            _ => {}
        }
        Vec::new()
    }
}
