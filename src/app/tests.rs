use super::*;
use crate::model::{ApplicationSummary, TestSet};
use crate::widgets::form::NO_INPUTS_NOTICE;
use crate::widgets::result_viewer::Framing;
use serde_json::json;

fn billing_summary() -> AppEntry {
    AppEntry::Summary(ApplicationSummary {
        name: "Billing".into(),
        url_prefix: "/billing".into(),
    })
}

fn detail(name: &str, prefix: &str, modules: &[&str]) -> ApplicationDetail {
    ApplicationDetail {
        name: name.into(),
        url_prefix: prefix.into(),
        description: Some("Invoices and payments".into()),
        modules: modules.iter().map(|m| m.to_string()).collect(),
        ..Default::default()
    }
}

fn signature(v: serde_json::Value) -> ModuleSignature {
    serde_json::from_value(v).unwrap()
}

/// Drive startup until the first application and `module_url` are open.
fn booted(module_sig: serde_json::Value) -> AppState {
    let mut st = AppState::default();
    update(&mut st, AppMsg::Boot);
    let effs = update(
        &mut st,
        AppMsg::LoadedApplications {
            outcome: Ok(vec![billing_summary()]),
        },
    );
    let Some(Effect::FetchApplication { ticket, .. }) = effs.into_iter().next() else {
        panic!("expected application fetch");
    };
    let effs = update(
        &mut st,
        AppMsg::LoadedApplication {
            index: 0,
            ticket,
            bootstrap: true,
            outcome: Ok(detail("Billing", "/billing", &["/billing/a"])),
        },
    );
    let Some(Effect::FetchSignature { ticket, .. }) = effs.into_iter().next() else {
        panic!("expected signature fetch");
    };
    update(
        &mut st,
        AppMsg::LoadedSignature {
            module_url: "/billing/a".into(),
            ticket,
            outcome: Ok(signature(module_sig)),
        },
    );
    st
}

#[test]
fn boot_requests_application_list() {
    let mut st = AppState::default();
    let effs = update(&mut st, AppMsg::Boot);
    assert_eq!(effs, vec![Effect::ListApplications]);
    assert!(st.status_text.is_some());
}

#[test]
fn startup_fetches_first_descriptor_then_first_module() {
    let mut st = AppState::default();
    let effs = update(
        &mut st,
        AppMsg::LoadedApplications {
            outcome: Ok(vec![billing_summary()]),
        },
    );
    assert_eq!(
        effs,
        vec![Effect::FetchApplication {
            index: 0,
            url_prefix: "/billing".into(),
            ticket: 1,
            bootstrap: true,
        }]
    );
    // Nothing is shown until the descriptor arrives.
    assert!(st.app_description.is_none());

    let effs = update(
        &mut st,
        AppMsg::LoadedApplication {
            index: 0,
            ticket: 1,
            bootstrap: true,
            outcome: Ok(detail("Billing", "/billing", &["/billing/a", "/billing/b"])),
        },
    );
    assert_eq!(
        effs,
        vec![Effect::FetchSignature {
            url_prefix: "/billing".into(),
            module_url: "/billing/a".into(),
            ticket: 1,
        }]
    );
    assert!(matches!(st.apps[0], AppEntry::Full(_)));
    assert_eq!(st.selection.current_app_id, 0);
    assert!(st.app_description.is_some());
}

#[test]
fn file_module_without_inputs_downloads_on_submit() {
    let mut st = booted(json!({"desc": null, "type": "file", "signature": [], "testsets": []}));
    assert_eq!(st.selection.current_module_url.as_deref(), Some("/billing/a"));
    assert_eq!(st.selection.current_module_type, Some(ModuleType::File));
    let md = st.module_description.as_ref().unwrap();
    assert_eq!(md.raw_content, MODULE_DESC_MISSING);
    let fw = st.form.as_ref().unwrap();
    assert!(fw.form.fields.is_empty());
    assert_eq!(fw.form.submit_label, "Get File");
    assert!(!NO_INPUTS_NOTICE.is_empty());

    let effs = update(&mut st, AppMsg::Submit);
    assert!(effs.iter().any(|e| matches!(
        e,
        Effect::Download { module_url, entries } if module_url == "/billing/a" && entries.is_empty()
    )));
    assert!(!effs.iter().any(|e| matches!(e, Effect::Invoke { .. })));
    assert!(st.executing);
    // The output pane is untouched for file modules.
    assert_eq!(st.output.framing(), Framing::Idle);

    let effs = update(
        &mut st,
        AppMsg::Downloaded {
            outcome: Ok("./report.csv".into()),
        },
    );
    assert!(!st.executing);
    assert!(matches!(
        effs.as_slice(),
        [Effect::ShowToast { level: ToastLevel::Success, .. }]
    ));
}

#[test]
fn json_invoke_failure_is_framed_inline_and_unlocks_form() {
    let mut st = booted(json!({
        "desc": "Adds numbers",
        "type": "json",
        "signature": [{"arg": "count", "type": "integer"}],
        "testsets": []
    }));
    if let Some(fw) = &mut st.form {
        fw.form.fields[0].value = "3".into();
    }
    let effs = update(&mut st, AppMsg::Submit);
    assert_eq!(
        effs,
        vec![Effect::Invoke {
            module_url: "/billing/a".into(),
            entries: vec![FormEntry::text("count", "3")],
        }]
    );
    assert!(st.executing);
    assert!(st.form.as_ref().unwrap().form.disabled);
    assert_eq!(st.output.framing(), Framing::Loading);

    // A second submit while executing is ignored.
    assert!(update(&mut st, AppMsg::Submit).is_empty());

    let body: serde_json::Value =
        serde_json::from_str(r#"{"status":1,"message":"bad arg"}"#).unwrap();
    update(&mut st, AppMsg::Finished { outcome: Ok(body) });
    assert_eq!(st.output.framing(), Framing::Failure);
    assert!(st.output.text().contains("\"message\": \"bad arg\""));
    assert!(!st.executing);
    assert!(!st.form.as_ref().unwrap().form.disabled);
    assert!(!st.modal.is_visible());
}

#[test]
fn transport_failure_while_invoking_clears_flag() {
    let mut st = booted(json!({"type": "json", "signature": []}));
    update(&mut st, AppMsg::Submit);
    update(
        &mut st,
        AppMsg::Finished {
            outcome: Err(LoadFailure::Transport("connection refused".into())),
        },
    );
    assert!(!st.executing);
    assert_eq!(st.output.framing(), Framing::Failure);
    assert!(st.output.text().contains("connection refused"));
    assert!(!st.modal.is_visible());
}

fn run_all() -> Effect {
    Effect::RunTestSet {
        url_prefix: "/billing".into(),
        module_url: "/billing/a".into(),
        name: None,
    }
}

fn with_testset() -> AppState {
    booted(json!({
        "type": "json",
        "signature": [],
        "testsets": [{"name": "smoke"}]
    }))
}

#[test]
fn run_all_twice_issues_two_requests() {
    let mut st = with_testset();
    assert_eq!(update(&mut st, AppMsg::RunTestSet(None)), vec![run_all()]);
    assert!(st.executing);
    assert!(st.form.as_ref().unwrap().form.disabled);
    update(
        &mut st,
        AppMsg::TestFinished {
            outcome: Ok(json!({"status": 0, "data": {"passed": 1}})),
        },
    );
    assert_eq!(st.output.framing(), Framing::Success);
    assert!(!st.executing);

    // Not served from a cache: the second run is a new request.
    assert_eq!(update(&mut st, AppMsg::RunTestSet(None)), vec![run_all()]);
}

#[test]
fn test_run_is_refused_while_invoking() {
    let mut st = with_testset();
    assert!(matches!(
        update(&mut st, AppMsg::Submit).as_slice(),
        [Effect::Invoke { .. }]
    ));
    assert!(update(&mut st, AppMsg::RunTestSet(None)).is_empty());
    assert!(update(&mut st, AppMsg::RunTestSet(Some("smoke".into()))).is_empty());
    assert_eq!(st.output.framing(), Framing::Loading);

    update(
        &mut st,
        AppMsg::Finished {
            outcome: Ok(json!({"status": 0})),
        },
    );
    assert_eq!(update(&mut st, AppMsg::RunTestSet(None)), vec![run_all()]);
}

#[test]
fn invoke_is_refused_while_test_run_in_flight() {
    let mut st = with_testset();
    update(&mut st, AppMsg::RunTestSet(None));
    assert!(st.executing);
    assert!(update(&mut st, AppMsg::Submit).is_empty());
    assert!(update(&mut st, AppMsg::RunTestSet(None)).is_empty());

    update(
        &mut st,
        AppMsg::TestFinished {
            outcome: Ok(json!({"status": 1, "message": "1 failed"})),
        },
    );
    assert_eq!(st.output.framing(), Framing::Failure);
    assert!(matches!(
        update(&mut st, AppMsg::Submit).as_slice(),
        [Effect::Invoke { .. }]
    ));
}

#[test]
fn test_run_transport_failure_releases_lock() {
    let mut st = with_testset();
    update(&mut st, AppMsg::RunTestSet(None));
    update(
        &mut st,
        AppMsg::TestFinished {
            outcome: Err(LoadFailure::Transport("timed out".into())),
        },
    );
    assert!(!st.executing);
    assert!(!st.form.as_ref().unwrap().form.disabled);
    assert_eq!(st.output.framing(), Framing::Failure);
    assert!(st.output.text().contains("timed out"));
    assert!(!st.modal.is_visible());
}

#[test]
fn named_test_set_is_forwarded() {
    let mut st = booted(json!({
        "type": "json",
        "signature": [],
        "testsets": [{"name": "smoke"}, {"name": "full"}]
    }));
    let effs = update(&mut st, AppMsg::RunTestSet(Some("full".into())));
    assert!(matches!(
        effs.as_slice(),
        [Effect::RunTestSet { name: Some(n), .. }] if n == "full"
    ));
    assert_eq!(
        st.signature.as_ref().unwrap().testsets[1],
        TestSet(json!({"name": "full"}))
    );
}

#[test]
fn no_testsets_means_no_run() {
    let mut st = booted(json!({"type": "json", "signature": [], "testsets": []}));
    assert!(update(&mut st, AppMsg::RunTestSet(None)).is_empty());
    assert_eq!(st.output.framing(), Framing::Idle);
}

#[test]
fn stale_signature_is_dropped() {
    let mut st = booted(json!({"desc": "A", "type": "json", "signature": []}));
    let old = match update(&mut st, AppMsg::OpenModule("/billing/b".into())).pop() {
        Some(Effect::FetchSignature { ticket, .. }) => ticket,
        _ => panic!("expected signature fetch"),
    };
    let new = match update(&mut st, AppMsg::OpenModule("/billing/c".into())).pop() {
        Some(Effect::FetchSignature { ticket, .. }) => ticket,
        _ => panic!("expected signature fetch"),
    };
    update(
        &mut st,
        AppMsg::LoadedSignature {
            module_url: "/billing/c".into(),
            ticket: new,
            outcome: Ok(signature(json!({"desc": "C", "type": "json"}))),
        },
    );
    update(
        &mut st,
        AppMsg::LoadedSignature {
            module_url: "/billing/b".into(),
            ticket: old,
            outcome: Ok(signature(json!({"desc": "B", "type": "file"}))),
        },
    );
    assert_eq!(st.selection.current_module_url.as_deref(), Some("/billing/c"));
    assert_eq!(st.selection.current_module_type, Some(ModuleType::Json));
    assert!(st.debug_log.iter().any(|l| l.contains("stale")));
}

#[test]
fn startup_failure_shows_modal_and_keeps_state_empty() {
    let mut st = AppState::default();
    update(
        &mut st,
        AppMsg::LoadedApplications {
            outcome: Err(LoadFailure::Transport("connection refused".into())),
        },
    );
    let notice = st.modal.current().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.title, "Error initializing");
    assert_eq!(notice.body, CONNECTIVITY_NOTICE);
    assert!(st.apps.is_empty());
    assert!(st.selection.current_module_url.is_none());
}

#[test]
fn failed_first_descriptor_is_an_initialization_error() {
    let mut st = AppState::default();
    update(
        &mut st,
        AppMsg::LoadedApplications {
            outcome: Ok(vec![billing_summary()]),
        },
    );
    update(
        &mut st,
        AppMsg::LoadedApplication {
            index: 0,
            ticket: 1,
            bootstrap: true,
            outcome: Err(LoadFailure::Protocol {
                status: 2,
                payload: json!({"status": 2}),
            }),
        },
    );
    assert_eq!(st.modal.current().unwrap().title, "Error initializing");
    assert!(st.apps.is_empty());
}

#[test]
fn app_switch_failure_keeps_previous_application() {
    let mut st = booted(json!({"desc": "A", "type": "json", "signature": []}));
    st.apps.push(AppEntry::Summary(ApplicationSummary {
        name: "Reports".into(),
        url_prefix: "/reports".into(),
    }));
    let effs = update(&mut st, AppMsg::OpenApplication(1));
    let Some(Effect::FetchApplication {
        index,
        ticket,
        bootstrap,
        ..
    }) = effs.into_iter().next()
    else {
        panic!("expected application fetch");
    };
    assert!(!bootstrap);
    update(
        &mut st,
        AppMsg::LoadedApplication {
            index,
            ticket,
            bootstrap,
            outcome: Err(LoadFailure::Transport("timed out".into())),
        },
    );
    assert_eq!(st.modal.current().unwrap().title, "Error Opening Webapp");
    assert_eq!(st.selection.current_app_id, 0);
    assert_eq!(st.selection.current_module_url.as_deref(), Some("/billing/a"));
}

#[test]
fn full_entry_is_reused_without_fetch() {
    let mut st = booted(json!({"type": "json", "signature": []}));
    st.apps
        .push(AppEntry::Full(detail("Reports", "/reports", &["/reports/daily"])));
    let effs = update(&mut st, AppMsg::OpenApplication(1));
    assert_eq!(
        effs,
        vec![Effect::FetchSignature {
            url_prefix: "/reports".into(),
            module_url: "/reports/daily".into(),
            ticket: 2,
        }]
    );
    assert_eq!(st.selection.current_app_id, 1);
}

#[test]
fn application_without_modules_clears_module_selection() {
    let mut st = booted(json!({"type": "json", "signature": []}));
    st.apps.push(AppEntry::Full(detail("Empty", "/empty", &[])));
    let effs = update(&mut st, AppMsg::OpenApplication(1));
    assert!(effs.is_empty());
    assert_eq!(st.selection.current_app_id, 1);
    assert!(st.selection.current_module_url.is_none());
    assert!(st.selection.current_module_type.is_none());
    assert!(st.form.is_none());
    assert!(st.module_urls().is_empty());
}

#[test]
fn missing_app_description_uses_notice() {
    let mut st = AppState::default();
    st.apps.push(AppEntry::Full(ApplicationDetail {
        name: "Bare".into(),
        ..Default::default()
    }));
    update(&mut st, AppMsg::OpenApplication(0));
    let md = st.app_description.as_ref().unwrap();
    assert_eq!(md.raw_content, APP_DESC_MISSING);
}

#[test]
fn deployed_lists_use_modal() {
    let mut st = booted(json!({"type": "json", "signature": []}));
    update(&mut st, AppMsg::ShowDeployed(ComponentKind::Handlers));
    let notice = st.modal.current().unwrap();
    assert_eq!(notice.title, "Deployed handlers");
    assert_eq!(notice.body, "No handlers deployed");

    if let Some(AppEntry::Full(d)) = st.apps.get_mut(0) {
        d.posthandlers = vec![json!("audit"), json!({"name": "gzip"})];
    }
    update(&mut st, AppMsg::ShowDeployed(ComponentKind::Posthandlers));
    let notice = st.modal.current().unwrap();
    assert_eq!(notice.title, "Deployed posthandlers");
    assert_eq!(notice.body, "• audit\n• gzip");
}

#[test]
fn copy_output_only_when_there_is_text() {
    let mut st = booted(json!({"type": "json", "signature": []}));
    assert!(update(&mut st, AppMsg::CopyOutput).is_empty());
    update(
        &mut st,
        AppMsg::TestFinished {
            outcome: Ok(json!({"status": 0})),
        },
    );
    let effs = update(&mut st, AppMsg::CopyOutput);
    assert!(matches!(effs.as_slice(), [Effect::CopyToClipboard(t)] if t.contains("\"status\": 0")));
}
