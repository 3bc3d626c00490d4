use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_absensid");
    let mut child = Command::new(exe)
        .env_remove("ABSENSI_WORKSPACE")
        .env_remove("ABSENSI_PERCENT_DECIMALS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn absensid");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn session_methods_require_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);
    assert!(health["result"]["workspacePath"].is_null());
    assert_eq!(health["result"]["percentDecimals"], 2);

    let res = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&res), Some("no_workspace"));
    let res = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.open",
        json!({ "date": "2024-05-01" }),
    );
    assert_eq!(error_code(&res), Some("no_workspace"));
}

#[test]
fn unknown_methods_and_bad_lines_are_reported() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{\"id\":\"x\",\"method\":\"nope.nothing\",\"params\":{{}}}}")
        .expect("write request");
    stdin.flush().expect("flush");
    let res = read_response(&mut reader);
    assert_eq!(res["id"], "x");
    assert_eq!(error_code(&res), Some("not_implemented"));

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let res = read_response(&mut reader);
    assert_eq!(res["ok"], false);
    assert_eq!(error_code(&res), Some("bad_json"));

    // The loop survives both and still answers.
    let health = request(&mut stdin, &mut reader, "h", "health", json!({}));
    assert_eq!(health["ok"], true);
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("absensi-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let selected = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["ok"], true);
    assert_eq!(selected["result"]["studentCount"], 0);

    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "nationalId": "0051", "name": "Ani", "classLabel": "3" }),
    );
    let student_id = created["result"]["student"]["id"]
        .as_str()
        .expect("student id")
        .to_string();

    let _ = request(&mut stdin, &mut reader, "3", "students.refresh", json!({}));
    let _ = request(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let _ = request(&mut stdin, &mut reader, "5", "classes.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "oldNationalId": "0051", "nationalId": "0051", "name": "Ani S", "classLabel": "3" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "attendance.open",
        json!({ "date": "2024-05-01" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "attendance.setStatus",
        json!({ "date": "2024-05-01", "studentId": student_id, "status": "Izin" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.save",
        json!({ "date": "2024-05-01" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "recap.monthly",
        json!({ "month": "mei" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "recap.export",
        json!({ "month": "Mei" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "graph.semester",
        json!({ "semester": "2" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "students.delete",
        json!({ "nationalId": "0051" }),
    );
    let health = request(&mut stdin, &mut reader, "14", "health", json!({}));
    assert_eq!(health["result"]["studentCount"], 0);
    assert_eq!(health["result"]["ledgerDays"], 1);

    drop(stdin);
    let _ = child.wait();
}
