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
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

const STUDENTS: &str = "name,id_number,course,year,sex,status\n\
Ana Cruz,2021-0001,BSCS,2,F,Yes\n\
\"Reyes, Carla\",2021-0003,No Course,3,F,No\n\
Kai Santos,2021-0007,BSIT,1,X,Yes\n";

const COURSES: &str = "course_code,course_description\n\
BSCS,Bachelor of Science in Computer Science\n\
BSIT,\"Information Technology, Major in Networks\"\n";

#[test]
fn save_after_load_reproduces_consistent_files() {
    let workspace = temp_dir("rosterd-roundtrip");
    std::fs::write(workspace.join("students.csv"), STUDENTS).expect("write students");
    std::fs::write(workspace.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    let saved = request_ok(&mut stdin, &mut reader, "3", "students.save", json!({}));
    assert!(saved["path"]
        .as_str()
        .unwrap_or("")
        .ends_with("students.csv"));
    let _ = request_ok(&mut stdin, &mut reader, "4", "courses.save", json!({}));

    let students = std::fs::read_to_string(workspace.join("students.csv")).expect("read students");
    let courses = std::fs::read_to_string(workspace.join("courses.csv")).expect("read courses");
    assert_eq!(students, STUDENTS);
    assert_eq!(courses, COURSES);

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn mutations_stay_in_memory_until_save() {
    let workspace = temp_dir("rosterd-unsaved");
    std::fs::write(workspace.join("students.csv"), STUDENTS).expect("write students");
    std::fs::write(workspace.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dialog.open",
        json!({ "kind": "student.delete" }),
    );
    let dialog_id = opened["dialogId"].as_str().expect("dialogId").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dialog.submit",
        json!({ "dialogId": dialog_id, "key": "2021-0001", "confirmed": true }),
    );
    let on_disk = std::fs::read_to_string(workspace.join("students.csv")).expect("read students");
    assert_eq!(on_disk, STUDENTS);

    let _ = request_ok(&mut stdin, &mut reader, "4", "students.save", json!({}));
    let on_disk = std::fs::read_to_string(workspace.join("students.csv")).expect("read students");
    assert!(!on_disk.contains("2021-0001"));
    assert!(on_disk.starts_with("name,id_number,course,year,sex,status\n"));
    assert_eq!(on_disk.lines().count(), 3);

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn workspace_with_missing_columns_is_rejected() {
    let workspace = temp_dir("rosterd-bad-columns");
    std::fs::write(workspace.join("students.csv"), "name,id_number\nAna,1\n")
        .expect("write students");
    std::fs::write(workspace.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let value = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(value["ok"].as_bool(), Some(false));
    assert_eq!(value["error"]["code"].as_str(), Some("parse_failed"));
    let message = value["error"]["message"].as_str().unwrap_or("");
    assert!(message.contains("course"), "message: {message}");

    // Nothing was loaded.
    let list = request(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(list["error"]["code"].as_str(), Some("no_workspace"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn workspace_without_files_is_io_error() {
    let workspace = temp_dir("rosterd-empty-workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let value = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(value["error"]["code"].as_str(), Some("io_failed"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn crlf_workspace_saves_with_crlf() {
    let workspace = temp_dir("rosterd-crlf");
    let students = STUDENTS.replace('\n', "\r\n");
    std::fs::write(workspace.join("students.csv"), &students).expect("write students");
    std::fs::write(workspace.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "students.save", json!({}));
    let _ = request_ok(&mut stdin, &mut reader, "3", "courses.save", json!({}));

    // Each table keeps the terminator it was read with.
    let on_disk = std::fs::read_to_string(workspace.join("students.csv")).expect("read students");
    assert_eq!(on_disk, students);
    let on_disk = std::fs::read_to_string(workspace.join("courses.csv")).expect("read courses");
    assert_eq!(on_disk, COURSES);

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn save_into_removed_workspace_reports_io_failed() {
    let workspace = temp_dir("rosterd-removed");
    std::fs::write(workspace.join("students.csv"), STUDENTS).expect("write students");
    std::fs::write(workspace.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    std::fs::remove_dir_all(&workspace).expect("remove workspace");

    let value = request(&mut stdin, &mut reader, "2", "students.save", json!({}));
    assert_eq!(value["ok"].as_bool(), Some(false));
    assert_eq!(value["error"]["code"].as_str(), Some("io_failed"));

    // The sidecar keeps serving and still holds the loaded rows.
    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert!(health["workspacePath"].as_str().is_some());
    let list = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(list["students"].as_array().map(|a| a.len()), Some(3));
}

#[test]
fn failed_select_keeps_previous_workspace() {
    let good = temp_dir("rosterd-select-good");
    std::fs::write(good.join("students.csv"), STUDENTS).expect("write students");
    std::fs::write(good.join("courses.csv"), COURSES).expect("write courses");
    let bad = temp_dir("rosterd-select-bad");
    std::fs::write(bad.join("students.csv"), "name,id_number\nZed,9\n").expect("write students");
    std::fs::write(bad.join("courses.csv"), COURSES).expect("write courses");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": good.to_string_lossy() }),
    );
    let value = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": bad.to_string_lossy() }),
    );
    assert_eq!(value["error"]["code"].as_str(), Some("parse_failed"));

    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    let ids: Vec<&str> = list["students"]
        .as_array()
        .expect("students array")
        .iter()
        .filter_map(|s| s["id_number"].as_str())
        .collect();
    assert_eq!(ids, vec!["2021-0001", "2021-0003", "2021-0007"]);
    let health = request_ok(&mut stdin, &mut reader, "4", "health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(good.to_string_lossy().as_ref())
    );

    let _ = std::fs::remove_dir_all(good);
    let _ = std::fs::remove_dir_all(bad);
}
