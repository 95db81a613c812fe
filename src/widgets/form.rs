use crate::model::{ArgKind, Argument, FieldInput, FormEntry};
use crate::theme::Theme;
use crate::widgets::chrome::panel_block;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::path::PathBuf;

pub const NO_INPUTS_NOTICE: &str = "The module accepts no inputs.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    File,
}

/// One form input derived from a module argument.
#[derive(Clone, Debug, PartialEq)]
pub struct InputDescriptor {
    pub name: String,
    pub label: String,
    pub placeholder: String,
    pub kind: InputKind,
    /// Set for enumerated-choice arguments.
    pub choices: Option<Vec<String>>,
    /// Set for regex arguments.
    pub pattern: Option<String>,
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn generate_form(args: &[Argument]) -> Vec<InputDescriptor> {
    args.iter()
        .map(|a| {
            let type_def = a.type_def.as_ref().map(|t| t.display()).unwrap_or_default();
            let mut d = InputDescriptor {
                name: a.arg.clone(),
                label: capitalize(&a.arg),
                placeholder: String::new(),
                kind: InputKind::Text,
                choices: None,
                pattern: None,
            };
            match a.kind {
                ArgKind::Float => d.placeholder = "Float value. Example : 234.123".into(),
                ArgKind::Integer => d.placeholder = "Integer value. Example : 234".into(),
                ArgKind::Regex => {
                    d.placeholder = format!("Custom Text : {type_def}");
                    d.pattern = a.type_def.as_ref().map(|t| t.display());
                }
                ArgKind::Choice => {
                    d.placeholder = type_def;
                    d.choices = Some(
                        a.type_def
                            .as_ref()
                            .map(|t| t.choices())
                            .unwrap_or_default(),
                    );
                }
                ArgKind::File => d.kind = InputKind::File,
                ArgKind::Plain => {}
            }
            d
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    File,
    Select {
        options: Vec<String>,
        selected: Option<usize>,
    },
}

#[derive(Clone, Debug)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub placeholder: String,
    pub kind: FieldKind,
    pub value: String,
    pub pattern: Option<String>,
    pub hint: Option<String>,
}

impl FormField {
    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Select { options, selected } => selected
                .and_then(|i| options.get(i))
                .cloned()
                .unwrap_or_default(),
            _ => self.value.clone(),
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        if let FieldKind::Select { options, selected } = &mut self.kind {
            if options.is_empty() {
                return;
            }
            let last = options.len() - 1;
            *selected = match (*selected, forward) {
                (None, true) => Some(0),
                (None, false) => Some(last),
                (Some(i), true) if i >= last => None,
                (Some(i), true) => Some(i + 1),
                (Some(0), false) => None,
                (Some(i), false) => Some(i - 1),
            };
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormState {
    pub title: String,
    pub fields: Vec<FormField>,
    /// Index into `fields`; `fields.len()` addresses the submit button.
    pub selected: usize,
    pub editing: bool,
    pub disabled: bool,
    pub submit_label: String,
    pub message: Option<String>,
}

impl FormState {
    pub fn from_descriptors(
        title: impl Into<String>,
        descriptors: Vec<InputDescriptor>,
        submit_label: impl Into<String>,
    ) -> Self {
        let fields = descriptors
            .into_iter()
            .map(|d| FormField {
                kind: match (d.kind, d.choices) {
                    (InputKind::File, _) => FieldKind::File,
                    (InputKind::Text, Some(options)) => FieldKind::Select {
                        options,
                        selected: None,
                    },
                    (InputKind::Text, None) => FieldKind::Text,
                },
                name: d.name,
                label: d.label,
                placeholder: d.placeholder,
                value: String::new(),
                pattern: d.pattern,
                hint: None,
            })
            .collect();
        Self {
            title: title.into(),
            fields,
            submit_label: submit_label.into(),
            ..Default::default()
        }
    }

    pub fn on_submit_button(&self) -> bool {
        self.selected >= self.fields.len()
    }

    pub fn current_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.selected)
    }
}

// Display-only: the request still goes out, the server is the validator.
pub fn validate_pattern_inline(fld: &mut FormField) {
    fld.hint = None;
    let value = fld.value.trim();
    if value.is_empty() {
        return;
    }
    if let Some(pat) = &fld.pattern {
        if let Ok(re) = regex::Regex::new(pat) {
            if !re.is_match(value) {
                fld.hint = Some(format!("Does not match {pat}"));
            }
        }
    }
}

/// Form values in field order, as they are submitted.
pub fn collect_entries(form: &FormState) -> Vec<FormEntry> {
    form.fields
        .iter()
        .map(|f| FormEntry {
            name: f.name.clone(),
            input: match f.kind {
                FieldKind::File => {
                    let path = f.value.trim();
                    FieldInput::File(if path.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(path))
                    })
                }
                _ => FieldInput::Text(f.display_value()),
            },
        })
        .collect()
}

pub fn draw_form(
    f: &mut Frame,
    area: Rect,
    form: &FormState,
    highlight: bool,
    cursor_on: bool,
    theme: &Theme,
) {
    let mut lines: Vec<Line> = Vec::new();
    if form.fields.is_empty() {
        lines.push(Line::from(Span::styled(NO_INPUTS_NOTICE, theme.text_muted())));
    }
    for (i, fld) in form.fields.iter().enumerate() {
        let sel = if i == form.selected && highlight { '›' } else { ' ' };
        let value_style = if i == form.selected {
            if form.editing {
                theme.text_editing_bold()
            } else {
                theme.text_active_bold()
            }
        } else {
            Style::default()
        };
        let mut val = fld.display_value();
        let tag = match &fld.kind {
            FieldKind::Text => "",
            FieldKind::File => " (file path)",
            FieldKind::Select { .. } => " ‹›",
        };
        let mut spans = vec![Span::raw(format!("{sel} {}{tag}: ", fld.label))];
        if val.is_empty() && !(form.editing && i == form.selected) {
            spans.push(Span::styled(fld.placeholder.clone(), theme.text_muted()));
        } else {
            if form.editing && i == form.selected && cursor_on {
                val.push('▏');
            }
            spans.push(Span::styled(val, value_style));
        }
        lines.push(Line::from(spans));
        if let Some(hint) = &fld.hint {
            lines.push(Line::from(Span::styled(
                format!("    {hint}"),
                theme.text_warning(),
            )));
        }
    }
    lines.push(Line::from(""));
    let button = format!("[ {} ]", form.submit_label);
    let button_style = if form.disabled {
        theme.text_muted()
    } else if form.on_submit_button() && highlight {
        theme.list_cursor_style()
    } else {
        theme.text_active_bold()
    };
    lines.push(Line::from(vec![Span::raw("  "), Span::styled(button, button_style)]));
    if let Some(msg) = &form.message {
        lines.push(Line::from(Span::styled(msg.clone(), theme.text_muted())));
    }
    let block = panel_block(&form.title, highlight, theme);
    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
