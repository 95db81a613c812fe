pub mod selection;

use crate::error::LoadFailure;
use crate::model::{
    component_label, AppEntry, ApplicationDetail, FormEntry, ModuleSignature, ModuleType,
};
use crate::ui::{AppState, ToastLevel};
use crate::widgets::form::{collect_entries, generate_form, FormState};
use crate::widgets::form_widget::FormWidget;
use crate::widgets::markdown::MarkdownWidget;
use crate::widgets::modal::NoticeKind;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

pub const CONNECTIVITY_NOTICE: &str =
    "We are facing challenge in access the server. Check your network connectivity";

pub const MODULES_MISSING: &str = "No modules defined in this application.\n\
If it has, try checking the server log to see why they failed to load";

pub const APP_DESC_MISSING: &str = r#"## The application description missing!

Add file __init__.py in the application root directory and provide your
application description over there as the first statement in the file.

Example: Let the application folder name is "MyApp".
Then in MyApp/__init__.py file, prepend the following lines

```python
#!/usr/bin/python

#
#The license  description
#

"""Your documention should go here"""
```"#;

pub const MODULE_DESC_MISSING: &str = r#"## The module description missing!

Add string as first statement in the function definition

Example:

```python
@weblocation("/web/path/")
def func(arg1, arg2):
    """Your documentation goes here"""
```"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Handlers,
    Preprocessors,
    Posthandlers,
}

pub enum AppMsg {
    Boot,
    OpenApplication(usize),
    OpenModule(String),
    Submit,
    RunTestSet(Option<String>),
    ShowDeployed(ComponentKind),
    CopyOutput,
    LoadedApplications {
        outcome: Result<Vec<AppEntry>, LoadFailure>,
    },
    LoadedApplication {
        index: usize,
        ticket: u64,
        bootstrap: bool,
        outcome: Result<ApplicationDetail, LoadFailure>,
    },
    LoadedSignature {
        module_url: String,
        ticket: u64,
        outcome: Result<ModuleSignature, LoadFailure>,
    },
    Finished {
        outcome: Result<JsonValue, LoadFailure>,
    },
    TestFinished {
        outcome: Result<JsonValue, LoadFailure>,
    },
    Downloaded {
        outcome: Result<PathBuf, LoadFailure>,
    },
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    ListApplications,
    FetchApplication {
        index: usize,
        url_prefix: String,
        ticket: u64,
        bootstrap: bool,
    },
    FetchSignature {
        url_prefix: String,
        module_url: String,
        ticket: u64,
    },
    Invoke {
        module_url: String,
        entries: Vec<FormEntry>,
    },
    Download {
        module_url: String,
        entries: Vec<FormEntry>,
    },
    RunTestSet {
        url_prefix: String,
        module_url: String,
        name: Option<String>,
    },
    /// Raised by the form widget; fed back through `update` as `AppMsg::Submit`.
    Submit,
    CopyToClipboard(String),
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    use AppMsg::*;
    let mut effects: Vec<Effect> = Vec::new();
    match msg {
        Boot => {
            state.status_text = Some("Loading applications...".into());
            effects.push(Effect::ListApplications);
        }
        OpenApplication(index) => {
            let summary = match state.apps.get(index) {
                None => return effects,
                Some(AppEntry::Full(_)) => None,
                Some(AppEntry::Summary(s)) => Some(s.clone()),
            };
            let ticket = state.selection.next_app_ticket();
            match summary {
                None => effects.extend(apply_application(state, index)),
                Some(s) => {
                    state.dbg(format!("fetch application {} ({})", s.name, s.url_prefix));
                    state.status_text = Some(format!("Opening {}...", s.name));
                    effects.push(Effect::FetchApplication {
                        index,
                        url_prefix: s.url_prefix.clone(),
                        ticket,
                        bootstrap: false,
                    });
                }
            }
        }
        OpenModule(module_url) => {
            effects.extend(open_module(state, module_url));
        }
        Submit => {
            let Some(module_url) = state.selection.current_module_url.clone() else {
                return effects;
            };
            if state.executing {
                return effects;
            }
            let entries = state
                .form
                .as_ref()
                .map(|fw| collect_entries(&fw.form))
                .unwrap_or_default();
            set_executing(state, true);
            match state.selection.current_module_type.unwrap_or_default() {
                ModuleType::Json => {
                    state.output.loading();
                    effects.push(Effect::Invoke {
                        module_url,
                        entries,
                    });
                }
                // Plain form navigation: nothing is rendered, the body is saved.
                ModuleType::File => {
                    effects.push(Effect::ShowToast {
                        text: format!("Requesting file from {module_url}"),
                        level: ToastLevel::Info,
                        seconds: 3,
                    });
                    effects.push(Effect::Download {
                        module_url,
                        entries,
                    });
                }
            }
        }
        RunTestSet(name) => {
            let Some(module_url) = state.selection.current_module_url.clone() else {
                return effects;
            };
            let has_testsets = state
                .signature
                .as_ref()
                .map(|s| !s.testsets.is_empty())
                .unwrap_or(false);
            if !has_testsets || state.executing {
                return effects;
            }
            // Never cached or coalesced: every run is a new request.
            let url_prefix = state.current_url_prefix().to_string();
            set_executing(state, true);
            state.output.loading();
            effects.push(Effect::RunTestSet {
                url_prefix,
                module_url,
                name,
            });
        }
        ShowDeployed(kind) => {
            let Some(detail) = state.current_detail() else {
                return effects;
            };
            let (title, empty, items) = match kind {
                ComponentKind::Handlers => {
                    ("Deployed handlers", "No handlers deployed", &detail.handlers)
                }
                ComponentKind::Preprocessors => (
                    "Deployed preprocessors",
                    "No preprocessors deployed",
                    &detail.preprocessors,
                ),
                ComponentKind::Posthandlers => (
                    "Deployed posthandlers",
                    "No posthandler deployed",
                    &detail.posthandlers,
                ),
            };
            let body = if items.is_empty() {
                empty.to_string()
            } else {
                items
                    .iter()
                    .map(|v| format!("• {}", component_label(v)))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            state.modal.notify(NoticeKind::Info, title, body);
        }
        CopyOutput => {
            let text = state.output.text().to_string();
            if !text.is_empty() {
                effects.push(Effect::CopyToClipboard(text));
            }
        }
        LoadedApplications { outcome } => {
            state.status_text = None;
            match outcome {
                Ok(apps) => {
                    state.dbg(format!("{} application(s) deployed", apps.len()));
                    state.apps = apps;
                    // The first application is loaded in full before anything is shown.
                    let first = state.apps.first().map(|e| match e {
                        AppEntry::Full(_) => None,
                        AppEntry::Summary(s) => Some(s.url_prefix.clone()),
                    });
                    if let Some(first) = first {
                        let ticket = state.selection.next_app_ticket();
                        match first {
                            None => effects.extend(apply_application(state, 0)),
                            Some(url_prefix) => effects.push(Effect::FetchApplication {
                                index: 0,
                                url_prefix,
                                ticket,
                                bootstrap: true,
                            }),
                        }
                    }
                }
                Err(e) => fail_initialization(state, &e),
            }
        }
        LoadedApplication {
            index,
            ticket,
            bootstrap,
            outcome,
        } => {
            if !state.selection.is_current_app_ticket(ticket) {
                tracing::debug!(index, ticket, "dropping stale application response");
                state.dbg(format!("stale application response #{ticket} dropped"));
                return effects;
            }
            state.status_text = None;
            match outcome {
                Ok(detail) => {
                    if index >= state.apps.len() {
                        return effects;
                    }
                    state.apps[index] = AppEntry::Full(detail);
                    effects.extend(apply_application(state, index));
                }
                Err(e) if bootstrap => fail_initialization(state, &e),
                Err(e) => {
                    state.dbg(format!("open application failed: {e}"));
                    state.last_error = Some(e.to_string());
                    state
                        .modal
                        .notify(NoticeKind::Error, "Error Opening Webapp", CONNECTIVITY_NOTICE);
                }
            }
        }
        LoadedSignature {
            module_url,
            ticket,
            outcome,
        } => {
            if !state.selection.is_current_module_ticket(ticket) {
                tracing::debug!(%module_url, ticket, "dropping stale signature response");
                state.dbg(format!("stale signature for {module_url} dropped"));
                return effects;
            }
            state.status_text = None;
            match outcome {
                Ok(sig) => apply_signature(state, module_url, sig),
                Err(e) => {
                    state.dbg(format!("open module {module_url} failed: {e}"));
                    state.last_error = Some(e.to_string());
                    state
                        .modal
                        .notify(NoticeKind::Error, "Error Opening Module", CONNECTIVITY_NOTICE);
                }
            }
        }
        Finished { outcome } => {
            set_executing(state, false);
            show_outcome(state, outcome);
        }
        TestFinished { outcome } => {
            set_executing(state, false);
            show_outcome(state, outcome);
        }
        Downloaded { outcome } => {
            set_executing(state, false);
            match outcome {
                Ok(path) => effects.push(Effect::ShowToast {
                    text: format!("Saved {}", path.display()),
                    level: ToastLevel::Success,
                    seconds: 4,
                }),
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    effects.push(Effect::ShowToast {
                        text: format!("Download failed: {e}"),
                        level: ToastLevel::Error,
                        seconds: 6,
                    });
                }
            }
        }
    }
    effects
}

fn show_outcome(state: &mut AppState, outcome: Result<JsonValue, LoadFailure>) {
    match outcome {
        Ok(body) => {
            state.last_error = None;
            state.output.show_response(&body);
        }
        Err(e) => {
            state.last_error = Some(e.to_string());
            state.output.show_error(e.to_string());
        }
    }
}

fn set_executing(state: &mut AppState, on: bool) {
    state.executing = on;
    if let Some(fw) = &mut state.form {
        fw.form.disabled = on;
        fw.form.editing = false;
        fw.form.message = on.then(|| "Executing...".to_string());
    }
}

fn fail_initialization(state: &mut AppState, e: &LoadFailure) {
    state.dbg(format!("initialization failed: {e}"));
    state.last_error = Some(e.to_string());
    state.apps.clear();
    state.selection.select_app(0);
    state.selection.clear_module();
    state
        .modal
        .notify(NoticeKind::Error, "Error initializing", CONNECTIVITY_NOTICE);
}

fn open_module(state: &mut AppState, module_url: String) -> Vec<Effect> {
    let ticket = state.selection.next_module_ticket();
    state.status_text = Some(format!("Opening {module_url}..."));
    vec![Effect::FetchSignature {
        url_prefix: state.current_url_prefix().to_string(),
        module_url,
        ticket,
    }]
}

// Make `index` current; it must already hold a full descriptor.
fn apply_application(state: &mut AppState, index: usize) -> Vec<Effect> {
    let Some(detail) = state.apps.get(index).and_then(|e| e.detail()).cloned() else {
        return Vec::new();
    };
    state.selection.select_app(index);
    state.selection.clear_module();
    state.signature = None;
    state.form = None;
    state.module_description = None;
    state.output.clear();
    state.modules_cursor.reset();
    state.testsets_cursor.reset();
    let desc = detail.description().unwrap_or(APP_DESC_MISSING);
    state.app_description = Some(MarkdownWidget::from_text(
        detail.name.clone(),
        desc,
        state.theme.clone(),
    ));
    state.dbg(format!(
        "application {} ({} modules, {} handlers, {} preprocessors, {} posthandlers)",
        detail.name,
        detail.modules.len(),
        detail.handlers.len(),
        detail.preprocessors.len(),
        detail.posthandlers.len()
    ));
    match detail.modules.first() {
        Some(first) => open_module(state, first.clone()),
        None => {
            // Also invalidates a signature request still in flight for the previous app.
            state.selection.next_module_ticket();
            Vec::new()
        }
    }
}

fn apply_signature(state: &mut AppState, module_url: String, sig: ModuleSignature) {
    if let Some(pos) = state.module_urls().iter().position(|m| *m == module_url) {
        state.modules_cursor.selected = pos;
    }
    let submit_label = match sig.module_type {
        ModuleType::Json => "Invoke",
        ModuleType::File => "Get File",
    };
    let form = FormState::from_descriptors("Inputs", generate_form(&sig.signature), submit_label);
    state.form = Some(FormWidget::new(form, state.theme.clone()));
    state.module_description = Some(MarkdownWidget::from_text(
        module_url.clone(),
        sig.description().unwrap_or(MODULE_DESC_MISSING),
        state.theme.clone(),
    ));
    state.testsets_cursor.reset();
    state.output.clear();
    state.selection.select_module(module_url, sig.module_type);
    state.signature = Some(sig);
    // A call still running for the previous module keeps the form locked.
    if state.executing {
        set_executing(state, true);
    }
}

#[cfg(test)]
mod tests;
