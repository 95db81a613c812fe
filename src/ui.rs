use crate::app::selection::SelectionState;
use crate::app::{update, AppMsg, ComponentKind, Effect, MODULES_MISSING};
use crate::config::ConsoleConfig;
use crate::error::LoadFailure;
use crate::model::{AppEntry, ApplicationDetail, ModuleSignature, ModuleType};
use crate::services::endpoints::Endpoints;
use crate::services::http::DirectoryClient;
use crate::services::loader::{self, LoadKind, LoadMsg, LoadOutcome};
use crate::theme::Theme;
use crate::widgets::chrome::panel_block;
use crate::widgets::form_widget::FormWidget;
use crate::widgets::horizontal_menu::{app_for_function_key, cycle_app, draw_app_tabs};
use crate::widgets::markdown::MarkdownWidget;
use crate::widgets::menu::{draw_list, ListCursor, ListView};
use crate::widgets::modal::{draw_modal, Modal};
use crate::widgets::result_viewer::ResultViewerWidget;
use crate::widgets::status_bar::draw_footer;
use crate::widgets::testsets::draw_testsets;
use crate::widgets::Widget;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

const TICK_RATE: Duration = Duration::from_millis(200);
/// Ticks per second at `TICK_RATE`; toast lifetimes are given in seconds.
const TICKS_PER_SEC: u64 = 5;
const DEBUG_H: u16 = 6;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    #[default]
    Modules,
    TestSets,
    Form,
    Output,
    Description,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Modules,
        Focus::TestSets,
        Focus::Form,
        Focus::Output,
        Focus::Description,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Focus::Modules => "Modules",
            Focus::TestSets => "Test sets",
            Focus::Form => "Inputs",
            Focus::Output => "Output",
            Focus::Description => "Description",
        }
    }

    // The output pane is hidden for file modules and is skipped then.
    fn step(self, forward: bool, output_visible: bool) -> Focus {
        let n = Self::ORDER.len();
        let mut idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        loop {
            idx = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
            let next = Self::ORDER[idx];
            if next != Focus::Output || output_visible {
                return next;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

#[derive(Default)]
pub(crate) struct AppState {
    pub(crate) config: ConsoleConfig,
    pub(crate) theme: Theme,
    pub(crate) tick: u64,
    pub(crate) boot_done: bool,
    // Directory + selection
    pub(crate) apps: Vec<AppEntry>,
    pub(crate) selection: SelectionState,
    pub(crate) signature: Option<ModuleSignature>,
    // Panes
    pub(crate) focus: Focus,
    pub(crate) modules_cursor: ListCursor,
    pub(crate) testsets_cursor: ListCursor,
    pub(crate) app_description: Option<MarkdownWidget>,
    pub(crate) module_description: Option<MarkdownWidget>,
    pub(crate) form: Option<FormWidget>,
    pub(crate) output: ResultViewerWidget,
    pub(crate) executing: bool,
    pub(crate) modal: Modal,
    pub(crate) toast: Option<Toast>,
    pub(crate) status_text: Option<String>,
    pub(crate) last_error: Option<String>,
    // Debug log (rendered in bottom debug pane)
    pub(crate) show_debug: bool,
    pub(crate) debug_log: VecDeque<String>,
    client: Option<DirectoryClient>,
    tx: Option<Sender<LoadMsg>>,
    rx: Option<Receiver<LoadMsg>>,
}

impl AppState {
    pub fn dbg(&mut self, msg: impl Into<String>) {
        const MAX_LOG_LINES: usize = 200;
        if self.debug_log.len() >= MAX_LOG_LINES {
            self.debug_log.pop_front();
        }
        self.debug_log.push_back(msg.into());
    }

    /// URL prefix of the current application ("" before anything loaded).
    pub fn current_url_prefix(&self) -> &str {
        self.apps
            .get(self.selection.current_app_id)
            .map(|a| a.url_prefix())
            .unwrap_or("")
    }

    pub fn current_detail(&self) -> Option<&ApplicationDetail> {
        self.apps
            .get(self.selection.current_app_id)
            .and_then(|a| a.detail())
    }

    pub fn module_urls(&self) -> &[String] {
        self.current_detail()
            .map(|d| d.modules.as_slice())
            .unwrap_or(&[])
    }

    fn output_visible(&self) -> bool {
        self.selection.current_module_type != Some(ModuleType::File)
    }

    fn form_editing(&self) -> bool {
        self.focus == Focus::Form && self.form.as_ref().is_some_and(|fw| fw.form.editing)
    }
}

/// How the console is driven: an interactive terminal, or a fixed number
/// of ticks against an off-screen backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub headless: bool,
    pub ticks: u64,
}

pub fn run(config: ConsoleConfig, opts: RunOptions) -> Result<()> {
    let endpoints = Endpoints::new(&config.server, &config.console_path, config.layout);
    let client = DirectoryClient::new(endpoints, Duration::from_secs(config.timeout_secs))
        .context("building HTTP client")?;
    let theme = Theme::from_mode(config.theme);
    let mut state = AppState {
        show_debug: config.debug_pane,
        output: ResultViewerWidget::new("Output", theme.clone()),
        theme,
        config,
        client: Some(client),
        ..Default::default()
    };
    let (tx, rx) = mpsc::channel::<LoadMsg>();
    state.tx = Some(tx);
    state.rx = Some(rx);
    tracing::info!(
        server = %state.config.server,
        layout = ?state.config.layout,
        headless = opts.headless,
        "console starting"
    );

    if opts.headless {
        return run_headless(&mut state, opts.ticks);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = event_loop(&mut terminal, &mut state);
    // Restore
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        boot(state);
        terminal.draw(|f| ui(f, state))?;
        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(state, key) {
                    return Ok(());
                }
            }
        }
        drain_loads(state);
        if last_tick.elapsed() >= TICK_RATE {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    }
}

fn run_headless(state: &mut AppState, ticks: u64) -> Result<()> {
    let backend = ratatui::backend::TestBackend::new(120, 40);
    let mut terminal = Terminal::new(backend)?;
    for _ in 0..ticks {
        boot(state);
        terminal.draw(|f| ui(f, state))?;
        drain_loads(state);
        state.tick = state.tick.wrapping_add(1);
        std::thread::sleep(TICK_RATE);
    }
    println!("{}", headless_summary(state));
    Ok(())
}

fn headless_summary(state: &AppState) -> serde_json::Value {
    let output = match state.output.framing() {
        crate::widgets::result_viewer::Framing::Idle => "idle",
        crate::widgets::result_viewer::Framing::Loading => "loading",
        crate::widgets::result_viewer::Framing::Success => "success",
        crate::widgets::result_viewer::Framing::Failure => "failure",
    };
    serde_json::json!({
        "ok": state.last_error.is_none() && !state.modal.is_visible(),
        "applications": state.apps.iter().map(|a| a.name()).collect::<Vec<_>>(),
        "current_app": state.current_detail().map(|d| d.name.clone()),
        "current_module": state.selection.current_module_url,
        "output": output,
    })
}

fn boot(state: &mut AppState) {
    if !state.boot_done {
        state.boot_done = true;
        let effects = update(state, AppMsg::Boot);
        run_effects(state, effects);
    }
}

fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::ListApplications => {
                state.dbg("list applications");
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_list_applications(client.clone(), tx.clone());
                }
            }
            Effect::FetchApplication {
                index,
                url_prefix,
                ticket,
                bootstrap,
            } => {
                state.dbg(format!("fetch application #{index} {url_prefix} (ticket {ticket})"));
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    let kind = LoadKind::Application {
                        index,
                        ticket,
                        bootstrap,
                    };
                    loader::spawn_fetch_application(client.clone(), url_prefix, kind, tx.clone());
                }
            }
            Effect::FetchSignature {
                url_prefix,
                module_url,
                ticket,
            } => {
                state.dbg(format!("fetch signature {module_url} (ticket {ticket})"));
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_fetch_signature(
                        client.clone(),
                        url_prefix,
                        module_url,
                        ticket,
                        tx.clone(),
                    );
                }
            }
            Effect::Invoke {
                module_url,
                entries,
            } => {
                state.dbg(format!("invoke {module_url} ({} fields)", entries.len()));
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_invoke(client.clone(), module_url, entries, tx.clone());
                }
            }
            Effect::Download {
                module_url,
                entries,
            } => {
                state.dbg(format!("download {module_url}"));
                let dir = state.config.download_dir.clone();
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_download(client.clone(), module_url, entries, dir, tx.clone());
                }
            }
            Effect::RunTestSet {
                url_prefix,
                module_url,
                name,
            } => {
                state.dbg(format!(
                    "run test set {} on {module_url}",
                    name.as_deref().unwrap_or("(all)")
                ));
                if let (Some(client), Some(tx)) = (&state.client, &state.tx) {
                    loader::spawn_run_test_set(
                        client.clone(),
                        url_prefix,
                        module_url,
                        name,
                        tx.clone(),
                    );
                }
            }
            Effect::Submit => {
                let effs = update(state, AppMsg::Submit);
                run_effects(state, effs);
            }
            Effect::CopyToClipboard(text) => {
                let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(text));
                match copied {
                    Ok(()) => show_toast(state, "Copied to clipboard".into(), ToastLevel::Success, 2),
                    Err(e) => {
                        tracing::warn!(error = %e, "clipboard unavailable");
                        show_toast(state, format!("Clipboard error: {e}"), ToastLevel::Error, 4);
                    }
                }
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => show_toast(state, text, level, seconds),
        }
    }
}

fn show_toast(state: &mut AppState, text: String, level: ToastLevel, seconds: u64) {
    state.toast = Some(Toast {
        text,
        level,
        expires_at_tick: state.tick + seconds * TICKS_PER_SEC,
    });
}

fn drain_loads(state: &mut AppState) {
    let mut drained: Vec<LoadMsg> = Vec::new();
    if let Some(rx) = &state.rx {
        while let Ok(msg) = rx.try_recv() {
            drained.push(msg);
        }
    }
    for msg in drained {
        let app_msg = into_app_msg(msg);
        let effects = update(state, app_msg);
        run_effects(state, effects);
    }
}

fn unexpected(o: LoadOutcome) -> LoadFailure {
    LoadFailure::Decode(format!("unexpected loader outcome: {o:?}"))
}

pub(crate) fn into_app_msg(msg: LoadMsg) -> AppMsg {
    let LoadMsg { kind, outcome } = msg;
    match kind {
        LoadKind::Applications => AppMsg::LoadedApplications {
            outcome: outcome.and_then(|o| match o {
                LoadOutcome::Applications(apps) => Ok(apps),
                other => Err(unexpected(other)),
            }),
        },
        LoadKind::Application {
            index,
            ticket,
            bootstrap,
        } => AppMsg::LoadedApplication {
            index,
            ticket,
            bootstrap,
            outcome: outcome.and_then(|o| match o {
                LoadOutcome::Application(detail) => Ok(detail),
                other => Err(unexpected(other)),
            }),
        },
        LoadKind::Signature { module_url, ticket } => AppMsg::LoadedSignature {
            module_url,
            ticket,
            outcome: outcome.and_then(|o| match o {
                LoadOutcome::Signature(sig) => Ok(sig),
                other => Err(unexpected(other)),
            }),
        },
        LoadKind::Invoke => AppMsg::Finished {
            outcome: outcome.and_then(|o| match o {
                LoadOutcome::Response(body) => Ok(body),
                other => Err(unexpected(other)),
            }),
        },
        LoadKind::TestRun { name } => {
            tracing::debug!(?name, "test run finished");
            AppMsg::TestFinished {
                outcome: outcome.and_then(|o| match o {
                    LoadOutcome::Response(body) => Ok(body),
                    other => Err(unexpected(other)),
                }),
            }
        }
        LoadKind::Download => AppMsg::Downloaded {
            outcome: outcome.and_then(|o| match o {
                LoadOutcome::Saved(path) => Ok(path),
                other => Err(unexpected(other)),
            }),
        },
    }
}

/// Apply one key press. Returns true when the console should exit.
pub(crate) fn handle_key(state: &mut AppState, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    // The modal swallows everything until it is closed.
    if state.modal.is_visible() {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            state.modal.dismiss();
        }
        return false;
    }
    // Typing into a field must not trigger global shortcuts.
    if state.form_editing() {
        let effects = state
            .form
            .as_mut()
            .map(|fw| fw.on_key(key.code))
            .unwrap_or_default();
        run_effects(state, effects);
        return false;
    }
    let msg = match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::BackTab => {
            let forward = key.code == KeyCode::Tab;
            state.focus = state.focus.step(forward, state.output_visible());
            None
        }
        KeyCode::F(12) | KeyCode::Char('`') => {
            state.show_debug = !state.show_debug;
            None
        }
        KeyCode::F(n) => app_for_function_key(state, n).map(AppMsg::OpenApplication),
        KeyCode::Char('[') => cycle_app(state, false).map(AppMsg::OpenApplication),
        KeyCode::Char(']') => cycle_app(state, true).map(AppMsg::OpenApplication),
        KeyCode::Char('x') => Some(AppMsg::Submit),
        KeyCode::Char('a') => Some(AppMsg::RunTestSet(None)),
        KeyCode::Char('h') => Some(AppMsg::ShowDeployed(ComponentKind::Handlers)),
        KeyCode::Char('p') => Some(AppMsg::ShowDeployed(ComponentKind::Preprocessors)),
        KeyCode::Char('o') => Some(AppMsg::ShowDeployed(ComponentKind::Posthandlers)),
        KeyCode::Char('c') => Some(AppMsg::CopyOutput),
        code => focused_key(state, code),
    };
    if let Some(msg) = msg {
        let effects = update(state, msg);
        run_effects(state, effects);
    }
    false
}

// Keys that only mean something to the focused pane.
fn focused_key(state: &mut AppState, code: KeyCode) -> Option<AppMsg> {
    match state.focus {
        Focus::Modules => {
            if code == KeyCode::Enter {
                let url = state.module_urls().get(state.modules_cursor.selected)?.clone();
                return Some(AppMsg::OpenModule(url));
            }
            let total = state.module_urls().len();
            state.modules_cursor.on_key(code, total);
            None
        }
        Focus::TestSets => {
            let sets = state
                .signature
                .as_ref()
                .map(|s| s.testsets.as_slice())
                .unwrap_or(&[]);
            if code == KeyCode::Enter {
                let set = sets.get(state.testsets_cursor.selected)?;
                return Some(AppMsg::RunTestSet(set.name().map(str::to_string)));
            }
            let total = sets.len();
            state.testsets_cursor.on_key(code, total);
            None
        }
        Focus::Form => {
            let effects = state
                .form
                .as_mut()
                .map(|fw| fw.on_key(code))
                .unwrap_or_default();
            run_effects(state, effects);
            None
        }
        Focus::Output => {
            state.output.on_key(code);
            None
        }
        Focus::Description => {
            if let Some(md) = &mut state.module_description {
                md.on_key(code);
            }
            None
        }
    }
}

fn help_text(state: &AppState) -> &'static str {
    if state.modal.is_visible() {
        return "Enter/Esc close";
    }
    if state.form_editing() {
        return "type to edit  Enter/Esc/Tab done";
    }
    match state.focus {
        Focus::Modules => "↑/↓ select  Enter open  F1-F9/[ ] app  Tab focus  h/p/o deployed  q quit",
        Focus::TestSets => "Enter run  a run all  Tab focus  q quit",
        Focus::Form => "↑/↓ field  Enter edit/submit  ←/→ choice  Del clear  x invoke  q quit",
        Focus::Output => "↑/↓ scroll  PgUp/PgDn  w wrap  c copy  Tab focus  q quit",
        Focus::Description => "↑/↓ scroll  w wrap  Tab focus  q quit",
    }
}

fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }

    let screen = f.area();
    let bg = Block::default().style(state.theme.base_style());
    f.render_widget(bg, screen);

    let mut constraints = vec![Constraint::Length(2), Constraint::Min(0)];
    if state.show_debug {
        constraints.push(Constraint::Length(DEBUG_H));
    }
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(screen);

    draw_app_tabs(f, chunks[0], state);
    draw_main(f, chunks[1], state);
    if state.show_debug {
        draw_debug(f, chunks[2], state);
    }
    let help = help_text(state);
    draw_footer(f, chunks[chunks.len() - 1], state, help);

    draw_modal(f, screen, &state.modal, &state.theme);
}

fn draw_main(f: &mut Frame, area: Rect, state: &mut AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
        ])
        .split(cols[0]);
    let output_visible = state.output_visible();
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if output_visible {
            [
                Constraint::Percentage(30),
                Constraint::Percentage(30),
                Constraint::Percentage(40),
            ]
        } else {
            [
                Constraint::Percentage(30),
                Constraint::Percentage(70),
                Constraint::Length(0),
            ]
        })
        .split(cols[1]);
    let focus = state.focus;
    let tick = state.tick;

    // Application description
    match &mut state.app_description {
        Some(md) => md.render(f, left[0], false, tick),
        None => draw_placeholder(f, left[0], "Application", "Loading applications...", &state.theme),
    }

    // Module list
    let items = state.module_urls().to_vec();
    let active = state
        .selection
        .current_module_url
        .as_ref()
        .and_then(|cur| items.iter().position(|m| m == cur));
    let modules_title = match state.current_detail() {
        Some(d) => format!(
            "Modules · {} handlers · {} pre · {} post",
            d.handlers.len(),
            d.preprocessors.len(),
            d.posthandlers.len()
        ),
        None => "Modules".to_string(),
    };
    let empty_text = if state.current_detail().is_some() {
        MODULES_MISSING
    } else {
        ""
    };
    draw_list(
        f,
        left[1],
        ListView {
            title: &modules_title,
            items,
            active,
            empty_text,
        },
        &mut state.modules_cursor,
        focus == Focus::Modules,
        &state.theme,
    );

    // Test sets
    let sets = state
        .signature
        .as_ref()
        .map(|s| s.testsets.as_slice())
        .unwrap_or(&[]);
    draw_testsets(
        f,
        left[2],
        sets,
        &mut state.testsets_cursor,
        focus == Focus::TestSets,
        &state.theme,
    );

    // Module description
    match &mut state.module_description {
        Some(md) => md.render(f, right[0], focus == Focus::Description, tick),
        None => draw_placeholder(f, right[0], "Module", "No module selected", &state.theme),
    }

    // Inputs
    match &mut state.form {
        Some(fw) => fw.render(f, right[1], focus == Focus::Form, tick),
        None => draw_placeholder(f, right[1], "Inputs", "", &state.theme),
    }

    if output_visible {
        state.output.render(f, right[2], focus == Focus::Output, tick);
    }
}

fn draw_placeholder(f: &mut Frame, area: Rect, title: &str, text: &str, theme: &Theme) {
    let p = Paragraph::new(Span::styled(text.to_string(), theme.text_muted()))
        .block(panel_block(title, false, theme));
    f.render_widget(p, area);
}

fn draw_debug(f: &mut Frame, area: Rect, state: &AppState) {
    let b = Block::default()
        .borders(Borders::TOP)
        .border_style(state.theme.text_muted())
        .title(Span::styled(
            "Debug",
            state.theme.text_muted().add_modifier(Modifier::BOLD),
        ));
    // Take last `area.height` lines
    let h = area.height.saturating_sub(1) as usize;
    let total = state.debug_log.len();
    let start = total.saturating_sub(h);
    let lines: Vec<Line> = state
        .debug_log
        .iter()
        .skip(start)
        .map(|s| Line::raw(s.clone()))
        .collect();
    let p = Paragraph::new(lines)
        .style(state.theme.text_muted())
        .block(b)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}
