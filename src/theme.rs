use crate::ui::ToastLevel;
use crate::widgets::modal::NoticeKind;
use crate::widgets::result_viewer::Framing;
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

/// `theme:` key of the config file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

/// Console colours. `success`/`failure` frame invocation results, so they
/// must stay distinguishable from `focus` on every palette.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub primary: Color,
    pub accent: Color,
    pub frame: Color,
    pub selected: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Theme {
    /// Deep-sea dark palette: teal focus, pearl titles.
    pub fn pearl_dark() -> Self {
        Self {
            bg: Color::Rgb(14, 20, 28),
            fg: Color::Rgb(226, 232, 236),
            primary: Color::Rgb(232, 224, 206),
            accent: Color::Rgb(94, 196, 206),
            frame: Color::Rgb(58, 72, 86),
            selected: Color::Rgb(46, 170, 150),
            success: Color::Rgb(120, 200, 110),
            warning: Color::Rgb(230, 180, 80),
            error: Color::Rgb(236, 96, 96),
            muted: Color::Rgb(110, 124, 138),
        }
    }

    pub fn pearl_light() -> Self {
        Self {
            bg: Color::Rgb(248, 246, 240),
            fg: Color::Rgb(28, 36, 44),
            primary: Color::Rgb(70, 60, 40),
            accent: Color::Rgb(20, 120, 140),
            frame: Color::Rgb(196, 200, 204),
            selected: Color::Rgb(16, 128, 110),
            success: Color::Rgb(30, 130, 40),
            warning: Color::Rgb(170, 110, 0),
            error: Color::Rgb(190, 30, 40),
            muted: Color::Rgb(120, 128, 136),
        }
    }

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::pearl_dark(),
            ThemeMode::Light => Self::pearl_light(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::pearl_dark()
    }
}

impl Theme {
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.selected)
    }

    pub fn border_unfocused(&self) -> Style {
        Style::default().fg(self.frame)
    }

    pub fn text_active_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text_editing_bold(&self) -> Style {
        Style::default()
            .fg(self.selected)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// Inline hints, e.g. a value that does not match its field pattern.
    pub fn text_warning(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn list_cursor_style(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.selected)
            .add_modifier(Modifier::BOLD)
    }

    /// Markdown headings and pane titles.
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn base_style(&self) -> Style {
        Style::default().bg(self.bg).fg(self.fg)
    }

    /// Border of the output pane. The result colour wins over focus so a
    /// failed call stays visibly red while the pane is being scrolled.
    pub fn framing_style(&self, framing: Framing, focused: bool) -> Style {
        match framing {
            Framing::Success => Style::default().fg(self.success),
            Framing::Failure => Style::default()
                .fg(self.error)
                .add_modifier(Modifier::BOLD),
            Framing::Loading => Style::default().fg(self.warning),
            Framing::Idle if focused => self.border_focused(),
            Framing::Idle => self.border_unfocused(),
        }
    }

    pub fn toast_color(&self, level: ToastLevel) -> Color {
        match level {
            ToastLevel::Success => self.success,
            ToastLevel::Error => self.error,
            ToastLevel::Info => self.accent,
        }
    }

    pub fn notice_color(&self, kind: NoticeKind) -> Color {
        match kind {
            NoticeKind::Info => self.accent,
            NoticeKind::Warning => self.warning,
            NoticeKind::Error => self.error,
        }
    }
}
