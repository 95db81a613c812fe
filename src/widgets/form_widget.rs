use crate::theme::Theme;
use crate::widgets::form::{draw_form, validate_pattern_inline, FieldKind, FormState};
use crossterm::event::KeyCode;
use ratatui::prelude::*;

pub struct FormWidget {
    pub form: FormState,
    theme: Theme,
}

impl FormWidget {
    pub fn new(form: FormState, theme: Theme) -> Self {
        Self { form, theme }
    }

    fn finish_editing(&mut self) {
        self.form.editing = false;
        if let Some(fld) = self.form.current_field_mut() {
            validate_pattern_inline(fld);
        }
    }
}

impl crate::widgets::Widget for FormWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let cursor_on = tick % 2 == 0;
        draw_form(f, area, &self.form, focused, cursor_on, &self.theme);
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<crate::app::Effect> {
        use crate::app::Effect;
        let mut effects: Vec<Effect> = Vec::new();
        if self.form.editing {
            match key {
                KeyCode::Char(c) => {
                    if let Some(fld) = self.form.current_field_mut() {
                        fld.value.push(c);
                    }
                }
                KeyCode::Backspace => {
                    if let Some(fld) = self.form.current_field_mut() {
                        fld.value.pop();
                    }
                }
                KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => self.finish_editing(),
                _ => {}
            }
            return effects;
        }
        match key {
            KeyCode::Up => {
                self.form.selected = self.form.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                // fields plus the submit button
                if self.form.selected < self.form.fields.len() {
                    self.form.selected += 1;
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let forward = key == KeyCode::Right;
                if let Some(fld) = self.form.current_field_mut() {
                    fld.cycle(forward);
                }
            }
            KeyCode::Enter => {
                if self.form.on_submit_button() {
                    if !self.form.disabled {
                        effects.push(Effect::Submit);
                    }
                } else if let Some(fld) = self.form.current_field_mut() {
                    match fld.kind {
                        FieldKind::Select { .. } => fld.cycle(true),
                        FieldKind::Text | FieldKind::File => self.form.editing = true,
                    }
                }
            }
            KeyCode::Delete => {
                if let Some(fld) = self.form.current_field_mut() {
                    fld.value.clear();
                    fld.hint = None;
                    if let FieldKind::Select { selected, .. } = &mut fld.kind {
                        *selected = None;
                    }
                }
            }
            _ => {}
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Effect;
    use crate::model::{ArgKind, Argument, TypeDef};
    use crate::widgets::form::generate_form;
    use crate::widgets::Widget;

    fn widget() -> FormWidget {
        let args = vec![
            Argument {
                arg: "code".into(),
                kind: ArgKind::Regex,
                type_def: Some(TypeDef::Pattern("^[0-9]+$".into())),
            },
            Argument {
                arg: "mode".into(),
                kind: ArgKind::Choice,
                type_def: Some(TypeDef::Choices(vec![
                    serde_json::json!("fast"),
                    serde_json::json!("slow"),
                ])),
            },
        ];
        let form = FormState::from_descriptors("Inputs", generate_form(&args), "Invoke");
        FormWidget::new(form, Theme::default())
    }

    #[test]
    fn typing_then_enter_commits_and_hints() {
        let mut w = widget();
        w.on_key(KeyCode::Enter);
        assert!(w.form.editing);
        for c in "12a".chars() {
            w.on_key(KeyCode::Char(c));
        }
        w.on_key(KeyCode::Backspace);
        w.on_key(KeyCode::Char('x'));
        w.on_key(KeyCode::Enter);
        assert!(!w.form.editing);
        assert_eq!(w.form.fields[0].value, "12x");
        assert!(w.form.fields[0].hint.is_some());
    }

    #[test]
    fn right_cycles_choice_and_submit_button_emits_effect() {
        let mut w = widget();
        w.on_key(KeyCode::Down);
        w.on_key(KeyCode::Right);
        assert_eq!(w.form.fields[1].display_value(), "fast");
        w.on_key(KeyCode::Down);
        assert!(w.form.on_submit_button());
        let effs = w.on_key(KeyCode::Enter);
        assert!(matches!(effs.as_slice(), [Effect::Submit]));
        w.form.disabled = true;
        assert!(w.on_key(KeyCode::Enter).is_empty());
    }
}
