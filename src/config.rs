use crate::services::endpoints::Layout;
use crate::theme::ThemeMode;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const CONFIG_FILE: &str = "dwm-tui.yaml";
pub const CONFIG_DIR_ENV: &str = "DWM_TUI_CONFIG_DIR";

/// Console settings read from `dwm-tui.yaml`; every key is optional.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server: String,
    pub console_path: String,
    pub layout: Layout,
    pub timeout_secs: u64,
    pub download_dir: PathBuf,
    pub debug_pane: bool,
    pub theme: ThemeMode,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:8080".into(),
            console_path: "/dwm".into(),
            layout: Layout::Modern,
            timeout_secs: 30,
            download_dir: PathBuf::from("."),
            debug_pane: false,
            theme: ThemeMode::Dark,
        }
    }
}

impl ConsoleConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        let mut cfg: ConsoleConfig =
            serde_yaml::from_str(&s).with_context(|| format!("parsing {path:?}"))?;
        cfg.expand_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load the discovered config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        let env_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match discover(env_dir.as_deref(), &cwd, dirs::home_dir().as_deref()) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                Self::from_path(&path)
            }
            None => {
                tracing::info!("no {CONFIG_FILE} found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn expand_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.server = expand_vars(&self.server, &lookup);
        self.console_path = expand_vars(&self.console_path, &lookup);
        let dir = self.download_dir.to_string_lossy().into_owned();
        self.download_dir = PathBuf::from(expand_vars(&dir, &lookup));
    }
}

/// Config file lookup order: `$DWM_TUI_CONFIG_DIR`, the working directory
/// and its `.tui/`, each ancestor's `.tui/`, then `~/.tui/`.
pub fn discover(env_dir: Option<&Path>, cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = env_dir {
        let p = dir.join(CONFIG_FILE);
        return p.exists().then_some(p);
    }
    let candidates = [cwd.join(CONFIG_FILE), cwd.join(".tui").join(CONFIG_FILE)];
    if let Some(p) = candidates.into_iter().find(|p| p.exists()) {
        return Some(p);
    }
    let mut cur = cwd;
    while let Some(parent) = cur.parent() {
        let p = parent.join(".tui").join(CONFIG_FILE);
        if p.exists() {
            return Some(p);
        }
        cur = parent;
    }
    home.map(|h| h.join(".tui").join(CONFIG_FILE))
        .filter(|p| p.exists())
}

fn var_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
        .as_ref()
}

/// Replace `${NAME}` with the variable's value; unknown names become empty.
fn expand_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    match var_re() {
        Some(re) => re
            .replace_all(s, |caps: &regex::Captures| {
                lookup(&caps[1]).unwrap_or_default()
            })
            .into_owned(),
        None => s.to_string(),
    }
}
