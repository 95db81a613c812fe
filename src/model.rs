use serde::Deserialize;
use std::path::PathBuf;
use serde_json::Value as JsonValue;

use crate::error::LoadFailure;

/// `{status, data}` wrapper every directory endpoint answers with.
#[derive(Debug, Deserialize, Clone)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub data: JsonValue,
}

impl Envelope {
    // status 0 is the only success; a missing status counts as a failure
    pub fn into_data(self) -> Result<JsonValue, LoadFailure> {
        match self.status {
            Some(0) => Ok(self.data),
            other => Err(LoadFailure::Protocol {
                status: other.unwrap_or(-1),
                payload: self.data,
            }),
        }
    }
}

/// Status field of an arbitrary response body (invocations, test runs).
pub fn envelope_status(v: &JsonValue) -> Option<i64> {
    v.get("status").and_then(|s| s.as_i64())
}

pub fn is_success(v: &JsonValue) -> bool {
    envelope_status(v) == Some(0)
}

// The root application is served under "/", which would turn every endpoint
// into "//__application__"; it is kept as the empty prefix instead.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.chars().count() == 1 {
        String::new()
    } else {
        prefix.to_string()
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ApplicationSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_prefix: String,
}

impl ApplicationSummary {
    // Older servers list applications as `[name, url_prefix]` pairs.
    pub fn from_value(v: &JsonValue) -> Result<Self, LoadFailure> {
        let mut summary = if let Some(arr) = v.as_array() {
            ApplicationSummary {
                name: arr
                    .first()
                    .and_then(|x| x.as_str())
                    .unwrap_or_default()
                    .to_string(),
                url_prefix: arr
                    .get(1)
                    .and_then(|x| x.as_str())
                    .unwrap_or_default()
                    .to_string(),
            }
        } else {
            serde_json::from_value::<ApplicationSummary>(v.clone())?
        };
        summary.url_prefix = normalize_prefix(&summary.url_prefix);
        Ok(summary)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ApplicationDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_prefix: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub handlers: Vec<JsonValue>,
    #[serde(default)]
    pub preprocessors: Vec<JsonValue>,
    #[serde(default)]
    pub posthandlers: Vec<JsonValue>,
}

impl ApplicationDetail {
    pub fn from_value(v: JsonValue) -> Result<Self, LoadFailure> {
        let mut detail: ApplicationDetail = serde_json::from_value(v)?;
        detail.url_prefix = normalize_prefix(&detail.url_prefix);
        Ok(detail)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Display text for one deployed handler/preprocessor/posthandler entry.
pub fn component_label(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Object(map) => map
            .get("name")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    }
}

/// One entry of the application list: the list endpoint only returns
/// summaries, the full descriptor is fetched on first selection.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEntry {
    Summary(ApplicationSummary),
    Full(ApplicationDetail),
}

impl AppEntry {
    pub fn name(&self) -> &str {
        match self {
            AppEntry::Summary(s) => &s.name,
            AppEntry::Full(d) => &d.name,
        }
    }

    pub fn url_prefix(&self) -> &str {
        match self {
            AppEntry::Summary(s) => &s.url_prefix,
            AppEntry::Full(d) => &d.url_prefix,
        }
    }

    pub fn detail(&self) -> Option<&ApplicationDetail> {
        match self {
            AppEntry::Summary(_) => None,
            AppEntry::Full(d) => Some(d),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum ModuleType {
    #[default]
    Json,
    File,
}

impl From<Option<String>> for ModuleType {
    // Signatures without a type predate file modules and are JSON modules;
    // any other non-json type is not intercepted, like a file module.
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            None | Some("json") => ModuleType::Json,
            Some(_) => ModuleType::File,
        }
    }
}

/// Datatype annotation of a module argument.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum ArgKind {
    Float,
    Integer,
    Regex,
    Choice,
    File,
    /// No annotation, or one without a dedicated input (list datatypes).
    #[default]
    Plain,
}

impl From<Option<String>> for ArgKind {
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            Some("Float datatype") => ArgKind::Float,
            Some("Integer datatype") => ArgKind::Integer,
            Some("Regex datatype") => ArgKind::Regex,
            Some("Option datatype") => ArgKind::Choice,
            Some("File datatype") => ArgKind::File,
            _ => ArgKind::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeDef {
    Pattern(String),
    Choices(Vec<JsonValue>),
    Other(JsonValue),
}

impl TypeDef {
    pub fn choices(&self) -> Vec<String> {
        match self {
            TypeDef::Choices(items) => items.iter().map(json_text).collect(),
            TypeDef::Pattern(s) => vec![s.clone()],
            TypeDef::Other(v) => vec![json_text(v)],
        }
    }

    // Same text a browser shows when the value lands in a placeholder:
    // arrays are joined with "," without spaces.
    pub fn display(&self) -> String {
        match self {
            TypeDef::Pattern(s) => s.clone(),
            TypeDef::Choices(_) => self.choices().join(","),
            TypeDef::Other(v) => json_text(v),
        }
    }
}

fn json_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Argument {
    pub arg: String,
    #[serde(rename = "type", default)]
    pub kind: ArgKind,
    #[serde(default)]
    pub type_def: Option<TypeDef>,
}

/// Server-defined test set; only its name (and description) are read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TestSet(pub JsonValue);

impl TestSet {
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|n| n.as_str())
    }

    pub fn desc(&self) -> Option<&str> {
        self.0.get("desc").and_then(|n| n.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ModuleSignature {
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(rename = "type", default)]
    pub module_type: ModuleType,
    #[serde(default)]
    pub signature: Vec<Argument>,
    #[serde(default)]
    pub testsets: Vec<TestSet>,
}

impl ModuleSignature {
    pub fn description(&self) -> Option<&str> {
        self.desc.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Value collected from one form input at submission time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    /// Local path of the file to upload; `None` when the field was left empty.
    File(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub name: String,
    pub input: FieldInput,
}

impl FormEntry {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: FieldInput::Text(value.into()),
        }
    }
}

pub fn has_file_input(entries: &[FormEntry]) -> bool {
    entries
        .iter()
        .any(|e| matches!(e.input, FieldInput::File(_)))
}
