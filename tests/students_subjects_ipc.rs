use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
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

fn spawn_sidecar(workspace: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let db_path = workspace.join("gradebook.sqlite3");
    let mut child = Command::new(exe)
        .current_dir(workspace)
        .env("DATABASE_URL", format!("sqlite://{}", db_path.to_string_lossy()))
        .env("GRADEBOOK__BULLETIN_DIR", workspace.join("bulletins"))
        .env("GRADEBOOK__INIT_SCRIPT", workspace.join("db_init.sql"))
        .env("GRADEBOOK__LOG_LEVEL", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
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
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "expected error: {}", value);
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing {} in {}", key, value))
}

#[test]
fn students_and_subjects_require_a_class_first() {
    let workspace = temp_dir("gradebook-prereq");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let student = request(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "lastName": "Ba", "firstName": "Omar", "matricule": "M-1", "classId": "none" }),
    );
    assert_eq!(error_code(&student), "missing_prerequisite");

    let subject = request(
        &mut stdin,
        &mut reader,
        "2",
        "subjects.create",
        json!({ "name": "Maths", "coefficient": 2, "classId": "none" }),
    );
    assert_eq!(error_code(&subject), "missing_prerequisite");

    let overview = request_ok(&mut stdin, &mut reader, "3", "stats.overview", json!({}));
    assert_eq!(overview["counts"]["students"], json!(0));
    assert_eq!(overview["counts"]["subjects"], json!(0));

    // With a class present, an unknown class id is a plain not_found.
    let _ = request_ok(&mut stdin, &mut reader, "4", "classes.create", json!({ "name": "5e B" }));
    let student = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "lastName": "Ba", "firstName": "Omar", "matricule": "M-1", "classId": "none" }),
    );
    assert_eq!(error_code(&student), "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn matricule_is_unique_across_classes() {
    let workspace = temp_dir("gradebook-matricule");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let a = request_ok(&mut stdin, &mut reader, "1", "classes.create", json!({ "name": "A" }));
    let b = request_ok(&mut stdin, &mut reader, "2", "classes.create", json!({ "name": "B" }));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "lastName": "Sow", "firstName": "Fatou", "matricule": "2024-017", "classId": str_field(&a, "classId") }),
    );
    let dup = request(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({ "lastName": "Ndiaye", "firstName": "Ali", "matricule": " 2024-017 ", "classId": str_field(&b, "classId") }),
    );
    assert_eq!(error_code(&dup), "duplicate_key");
    assert_eq!(dup["error"]["details"]["entity"], json!("student"));

    let missing = request(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "lastName": "Ndiaye", "matricule": "2024-018", "classId": str_field(&b, "classId") }),
    );
    assert_eq!(error_code(&missing), "bad_params");

    let all = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    let students = all["students"].as_array().expect("students");
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["lastName"], json!("Sow"));
    assert_eq!(students[0]["matricule"], json!("2024-017"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn subject_coefficient_and_name_rules() {
    let workspace = temp_dir("gradebook-subjects");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let a = request_ok(&mut stdin, &mut reader, "1", "classes.create", json!({ "name": "A" }));
    let b = request_ok(&mut stdin, &mut reader, "2", "classes.create", json!({ "name": "B" }));
    let class_a = str_field(&a, "classId").to_string();
    let class_b = str_field(&b, "classId").to_string();

    let zero = request(
        &mut stdin,
        &mut reader,
        "3",
        "subjects.create",
        json!({ "name": "Sport", "coefficient": 0, "classId": class_a }),
    );
    assert_eq!(error_code(&zero), "bad_params");

    let fractional = request(
        &mut stdin,
        &mut reader,
        "4",
        "subjects.create",
        json!({ "name": "Sport", "coefficient": 1.5, "classId": class_a }),
    );
    assert_eq!(error_code(&fractional), "bad_params");

    let too_heavy = request(
        &mut stdin,
        &mut reader,
        "4b",
        "subjects.create",
        json!({ "name": "Sport", "coefficient": 101, "classId": class_a }),
    );
    assert_eq!(error_code(&too_heavy), "bad_params");
    assert_eq!(too_heavy["error"]["details"]["field"], json!("coefficient"));

    let defaulted = request_ok(&mut stdin, &mut reader, "5", "subjects.create", json!({ "name": "Sport", "classId": class_a }));
    assert_eq!(defaulted["subject"]["coefficient"], json!(1));

    let dup = request(
        &mut stdin,
        &mut reader,
        "6",
        "subjects.create",
        json!({ "name": "Sport", "coefficient": 2, "classId": class_a }),
    );
    assert_eq!(error_code(&dup), "duplicate_key");

    // Same name in another class is fine.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "subjects.create",
        json!({ "name": "Sport", "coefficient": 2, "classId": class_b }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "subjects.create",
        json!({ "name": "Anglais", "coefficient": "3", "classId": class_a }),
    );

    let in_a = request_ok(&mut stdin, &mut reader, "9", "subjects.list", json!({ "classId": class_a }));
    let names: Vec<_> = in_a["subjects"]
        .as_array()
        .expect("subjects")
        .iter()
        .map(|s| s["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Anglais".to_string(), "Sport".to_string()]);

    let all = request_ok(&mut stdin, &mut reader, "10", "subjects.list", json!({}));
    assert_eq!(all["subjects"].as_array().map(|v| v.len()), Some(3));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn deleting_a_student_removes_their_grades() {
    let workspace = temp_dir("gradebook-student-delete");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let class = request_ok(&mut stdin, &mut reader, "1", "classes.create", json!({ "name": "6e A" }));
    let class_id = str_field(&class, "classId").to_string();
    let awa = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "lastName": "Diallo", "firstName": "Awa", "matricule": "M-001", "classId": class_id }),
    );
    let omar = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "lastName": "Ba", "firstName": "Omar", "matricule": "M-002", "classId": class_id }),
    );
    let awa_id = str_field(&awa, "studentId").to_string();
    let omar_id = str_field(&omar, "studentId").to_string();
    let maths = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "subjects.create",
        json!({ "name": "Maths", "coefficient": 2, "classId": class_id }),
    );
    let maths_id = str_field(&maths, "subjectId").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "grades.upsert",
        json!({ "studentId": awa_id, "subjectId": maths_id, "value": 14 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "grades.upsert",
        json!({ "studentId": omar_id, "subjectId": maths_id, "value": 11 }),
    );

    let _ = request_ok(&mut stdin, &mut reader, "7", "students.delete", json!({ "studentId": awa_id }));

    let listed = request_ok(&mut stdin, &mut reader, "8", "grades.list", json!({}));
    let rows = listed["grades"].as_array().expect("grades");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["studentId"], json!(omar_id));

    let preview = request(&mut stdin, &mut reader, "9", "bulletins.preview", json!({ "studentId": awa_id }));
    assert_eq!(error_code(&preview), "not_found");

    let again = request(&mut stdin, &mut reader, "10", "students.delete", json!({ "studentId": awa_id }));
    assert_eq!(error_code(&again), "not_found");

    let overview = request_ok(&mut stdin, &mut reader, "11", "stats.overview", json!({}));
    assert_eq!(overview["counts"]["students"], json!(1));
    assert_eq!(overview["counts"]["grades"], json!(1));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
