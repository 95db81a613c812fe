use super::*;
use crate::model::{FieldInput, ModuleType};
use crate::services::endpoints::{Endpoints, Layout};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

// One-shot HTTP server: answers a single request with `body` and hands the
// raw request text back to the test.
fn serve_once(
    status: &'static str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let mut head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (k, v) in headers {
        head.push_str(&format!("{k}: {v}\r\n"));
    }
    head.push_str("\r\n");
    let body = body.to_vec();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let request = read_request(&mut stream);
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
            let _ = tx.send(request);
        }
    });
    (base, rx)
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            if text[..end].to_ascii_lowercase().contains("transfer-encoding: chunked") {
                if text.ends_with("0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let content_len = text[..end]
                .lines()
                .find_map(|l| {
                    let (k, v) = l.split_once(':')?;
                    if k.trim().eq_ignore_ascii_case("content-length") {
                        v.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn client(base: &str, layout: Layout) -> DirectoryClient {
    DirectoryClient::new(Endpoints::new(base, "/dwm", layout), Duration::from_secs(5)).unwrap()
}

#[test]
fn list_applications_decodes_summaries() {
    let (base, rx) = serve_once(
        "200 OK",
        &[("Content-Type", "application/json")],
        br#"{"status":0,"data":[{"name":"Billing","url_prefix":"/billing"},{"name":"root","url_prefix":"/"}]}"#,
    );
    let apps = client(&base, Layout::Modern).list_applications().unwrap();
    assert_eq!(apps.len(), 2);
    assert!(matches!(apps[0], AppEntry::Summary(_)));
    assert_eq!(apps[0].name(), "Billing");
    assert_eq!(apps[1].url_prefix(), "");
    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(req.starts_with("GET /dwm/applications "));
}

#[test]
fn legacy_list_yields_full_descriptors() {
    let (base, _rx) = serve_once(
        "200 OK",
        &[],
        br#"{"status":0,"data":[{"name":"Billing","url_prefix":"/billing","modules":["/billing/a"]}]}"#,
    );
    let apps = client(&base, Layout::Legacy).list_applications().unwrap();
    let detail = apps[0].detail().unwrap();
    assert_eq!(detail.modules, vec!["/billing/a".to_string()]);
}

#[test]
fn nonzero_status_is_a_protocol_failure() {
    let (base, _rx) = serve_once("200 OK", &[], br#"{"status":-101,"desc":"denied"}"#);
    let err = client(&base, Layout::Modern)
        .fetch_application_detail("/billing")
        .unwrap_err();
    assert!(err.is_protocol());
}

#[test]
fn http_error_is_a_transport_failure() {
    let (base, _rx) = serve_once("500 Internal Server Error", &[], b"boom");
    let err = client(&base, Layout::Modern)
        .fetch_module_signature("/billing", "/billing/a")
        .unwrap_err();
    assert!(matches!(err, LoadFailure::Transport(_)));
}

#[test]
fn invoke_posts_urlencoded_form_and_returns_body() {
    let (base, rx) = serve_once("200 OK", &[], br#"{"status":1,"desc":"bad arg"}"#);
    let body = client(&base, Layout::Modern)
        .invoke("/billing/a", &[FormEntry::text("count", "3")])
        .unwrap();
    assert_eq!(body["status"], 1);
    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(req.starts_with("POST /billing/a "));
    assert!(req
        .to_ascii_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert!(req.ends_with("count=3"));
}

#[test]
fn invoke_with_file_input_sends_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("in.txt");
    std::fs::write(&upload, "hello").unwrap();
    let (base, rx) = serve_once("200 OK", &[], br#"{"status":0,"data":"ok"}"#);
    let entries = vec![
        FormEntry::text("note", "x"),
        FormEntry {
            name: "doc".into(),
            input: FieldInput::File(Some(upload)),
        },
    ];
    client(&base, Layout::Modern)
        .invoke("/billing/upload", &entries)
        .unwrap();
    let req = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(req
        .to_ascii_lowercase()
        .contains("content-type: multipart/form-data"));
    assert!(req.contains("name=\"doc\""));
    assert!(req.contains("hello"));
}

#[test]
fn download_saves_under_disposition_name() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _rx) = serve_once(
        "200 OK",
        &[("Content-Disposition", "attachment; filename=\"report.csv\"")],
        b"a,b\n1,2\n",
    );
    let path = client(&base, Layout::Modern)
        .download("/billing/export", &[], dir.path())
        .unwrap();
    assert_eq!(path, dir.path().join("report.csv"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "a,b\n1,2\n");
}

#[test]
fn spawned_signature_fetch_reports_with_its_ticket() {
    let (base, _rx) = serve_once(
        "200 OK",
        &[],
        br#"{"status":0,"data":{"desc":null,"type":"file","signature":[],"testsets":[]}}"#,
    );
    let (tx, rx) = mpsc::channel();
    spawn_fetch_signature(
        client(&base, Layout::Modern),
        "/billing".into(),
        "/billing/export".into(),
        7,
        tx,
    );
    let msg = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        msg.kind,
        LoadKind::Signature {
            module_url: "/billing/export".into(),
            ticket: 7
        }
    );
    match msg.outcome {
        Ok(LoadOutcome::Signature(sig)) => assert_eq!(sig.module_type, ModuleType::File),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn refused_connection_is_reported_as_failure() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let (tx, rx) = mpsc::channel();
    spawn_list_applications(client(&format!("http://127.0.0.1:{port}"), Layout::Modern), tx);
    let msg = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(msg.kind, LoadKind::Applications);
    assert!(matches!(msg.outcome, Err(LoadFailure::Transport(_))));
}
