use crate::error::LoadFailure;
use crate::model::{
    AppEntry, ApplicationDetail, ApplicationSummary, Envelope, FieldInput, FormEntry,
    ModuleSignature,
};
use crate::services::endpoints::{Endpoints, Layout};
use regex::Regex;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Blocking client for the server's directory, invocation and test endpoints.
///
/// Cheap to clone; clones share the connection pool and the cookie jar, so
/// the server's `session` cookie survives across the worker threads.
#[derive(Clone)]
pub struct DirectoryClient {
    http: Client,
    endpoints: Endpoints,
}

impl DirectoryClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, LoadFailure> {
        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| LoadFailure::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, endpoints })
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, LoadFailure> {
        let res = req.send()?;
        if !res.status().is_success() {
            return Err(LoadFailure::Transport(format!(
                "HTTP {} from {}",
                res.status(),
                res.url()
            )));
        }
        Ok(res)
    }

    // Bodies are decoded from text so serde_json keeps the server's key order.
    fn read_json(res: Response) -> Result<JsonValue, LoadFailure> {
        let text = res.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn get_json(&self, url: &str) -> Result<JsonValue, LoadFailure> {
        tracing::debug!(%url, "GET");
        Self::read_json(self.send(self.http.get(url))?)
    }

    fn get_envelope(&self, url: &str) -> Result<JsonValue, LoadFailure> {
        let v = self.get_json(url)?;
        let env: Envelope = serde_json::from_value(v)?;
        env.into_data()
    }

    pub fn list_applications(&self) -> Result<Vec<AppEntry>, LoadFailure> {
        let data = self.get_envelope(&self.endpoints.applications())?;
        let items = data
            .as_array()
            .ok_or_else(|| LoadFailure::Decode("application list is not an array".into()))?;
        items
            .iter()
            .map(|item| match self.endpoints.layout {
                Layout::Modern => ApplicationSummary::from_value(item).map(AppEntry::Summary),
                Layout::Legacy => ApplicationDetail::from_value(item.clone()).map(AppEntry::Full),
            })
            .collect()
    }

    pub fn fetch_application_detail(
        &self,
        url_prefix: &str,
    ) -> Result<ApplicationDetail, LoadFailure> {
        match self.endpoints.layout {
            Layout::Modern => {
                let data = self.get_envelope(&self.endpoints.application(url_prefix))?;
                ApplicationDetail::from_value(data)
            }
            Layout::Legacy => self
                .list_applications()?
                .into_iter()
                .find_map(|entry| match entry {
                    AppEntry::Full(d) if d.url_prefix == url_prefix => Some(d),
                    _ => None,
                })
                .ok_or_else(|| {
                    LoadFailure::Decode(format!("no application deployed under '{url_prefix}'"))
                }),
        }
    }

    pub fn fetch_module_signature(
        &self,
        url_prefix: &str,
        module_url: &str,
    ) -> Result<ModuleSignature, LoadFailure> {
        let data = self.get_envelope(&self.endpoints.signature(url_prefix, module_url))?;
        Ok(serde_json::from_value(data)?)
    }

    fn form_request(
        &self,
        module_url: &str,
        entries: &[FormEntry],
    ) -> Result<RequestBuilder, LoadFailure> {
        let url = self.endpoints.module(module_url);
        tracing::debug!(%url, fields = entries.len(), "POST");
        let req = self.http.post(url);
        if crate::model::has_file_input(entries) {
            Ok(req.multipart(multipart_form(entries)?))
        } else {
            Ok(req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(urlencoded_body(entries)))
        }
    }

    /// POST the form to a JSON module and return its full response body.
    pub fn invoke(
        &self,
        module_url: &str,
        entries: &[FormEntry],
    ) -> Result<JsonValue, LoadFailure> {
        let req = self.form_request(module_url, entries)?;
        Self::read_json(self.send(req)?)
    }

    /// POST the form to a file module and save the response into `dir`.
    pub fn download(
        &self,
        module_url: &str,
        entries: &[FormEntry],
        dir: &Path,
    ) -> Result<PathBuf, LoadFailure> {
        let req = self.form_request(module_url, entries)?;
        let res = self.send(req)?;
        let name = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|h| h.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| fallback_filename(module_url));
        let bytes = res.bytes()?;
        std::fs::create_dir_all(dir)
            .map_err(|e| LoadFailure::Transport(format!("creating {}: {e}", dir.display())))?;
        let path = dir.join(name);
        std::fs::write(&path, &bytes)
            .map_err(|e| LoadFailure::Transport(format!("writing {}: {e}", path.display())))?;
        Ok(path)
    }

    pub fn run_test_set(
        &self,
        url_prefix: &str,
        module_url: &str,
        name: Option<&str>,
    ) -> Result<JsonValue, LoadFailure> {
        self.get_json(&self.endpoints.test_run(url_prefix, module_url, name))
    }
}

pub(crate) fn urlencoded_body(entries: &[FormEntry]) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for e in entries {
        if let FieldInput::Text(v) = &e.input {
            ser.append_pair(&e.name, v);
        }
    }
    ser.finish()
}

fn multipart_form(entries: &[FormEntry]) -> Result<multipart::Form, LoadFailure> {
    let mut form = multipart::Form::new();
    for e in entries {
        form = match &e.input {
            FieldInput::Text(v) => form.text(e.name.clone(), v.clone()),
            FieldInput::File(Some(path)) => form.file(e.name.clone(), path).map_err(|err| {
                LoadFailure::Transport(format!("reading {}: {err}", path.display()))
            })?,
            // An untouched file input still travels as an empty part.
            FieldInput::File(None) => form.part(
                e.name.clone(),
                multipart::Part::bytes(Vec::new()).file_name(String::new()),
            ),
        };
    }
    Ok(form)
}

fn disposition_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#).ok())
        .as_ref()
}

pub(crate) fn disposition_filename(header: &str) -> Option<String> {
    let raw = disposition_re()?.captures(header)?.get(1)?.as_str().trim();
    // Never let the server pick a directory.
    let name = Path::new(raw).file_name()?.to_str()?.to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub(crate) fn fallback_filename(module_url: &str) -> String {
    module_url
        .trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}
