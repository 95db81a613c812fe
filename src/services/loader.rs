use crate::error::LoadFailure;
use crate::model::{AppEntry, ApplicationDetail, FormEntry, ModuleSignature};
use crate::services::http::DirectoryClient;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

/// What a background request was for; carried back untouched so the
/// controller can match the answer to the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadKind {
    Applications,
    Application {
        index: usize,
        ticket: u64,
        bootstrap: bool,
    },
    Signature {
        module_url: String,
        ticket: u64,
    },
    Invoke,
    TestRun {
        name: Option<String>,
    },
    Download,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applications(Vec<AppEntry>),
    Application(ApplicationDetail),
    Signature(ModuleSignature),
    Response(JsonValue),
    Saved(PathBuf),
}

#[derive(Debug)]
pub struct LoadMsg {
    pub kind: LoadKind,
    pub outcome: Result<LoadOutcome, LoadFailure>,
}

fn report(kind: LoadKind, outcome: Result<LoadOutcome, LoadFailure>, tx: &Sender<LoadMsg>) {
    if let Err(e) = &outcome {
        if e.is_protocol() {
            tracing::warn!(?kind, error = %e, "server refused request");
        } else {
            tracing::error!(?kind, error = %e, "request failed");
        }
    }
    let _ = tx.send(LoadMsg { kind, outcome });
}

pub fn spawn_list_applications(client: DirectoryClient, tx: Sender<LoadMsg>) {
    thread::spawn(move || {
        let outcome = client.list_applications().map(LoadOutcome::Applications);
        report(LoadKind::Applications, outcome, &tx);
    });
}

pub fn spawn_fetch_application(
    client: DirectoryClient,
    url_prefix: String,
    kind: LoadKind,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client
            .fetch_application_detail(&url_prefix)
            .map(LoadOutcome::Application);
        report(kind, outcome, &tx);
    });
}

pub fn spawn_fetch_signature(
    client: DirectoryClient,
    url_prefix: String,
    module_url: String,
    ticket: u64,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client
            .fetch_module_signature(&url_prefix, &module_url)
            .map(LoadOutcome::Signature);
        report(LoadKind::Signature { module_url, ticket }, outcome, &tx);
    });
}

pub fn spawn_invoke(
    client: DirectoryClient,
    module_url: String,
    entries: Vec<FormEntry>,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client
            .invoke(&module_url, &entries)
            .map(LoadOutcome::Response);
        report(LoadKind::Invoke, outcome, &tx);
    });
}

pub fn spawn_download(
    client: DirectoryClient,
    module_url: String,
    entries: Vec<FormEntry>,
    dir: PathBuf,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client
            .download(&module_url, &entries, &dir)
            .map(LoadOutcome::Saved);
        report(LoadKind::Download, outcome, &tx);
    });
}

pub fn spawn_run_test_set(
    client: DirectoryClient,
    url_prefix: String,
    module_url: String,
    name: Option<String>,
    tx: Sender<LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client
            .run_test_set(&url_prefix, &module_url, name.as_deref())
            .map(LoadOutcome::Response);
        report(LoadKind::TestRun { name }, outcome, &tx);
    });
}

#[cfg(test)]
mod loader_tests;
