//! Integration tests for the `dl` CLI.
//!
//! Each test creates a temp directory with a fresh store, runs `dl` as a
//! subprocess, and verifies stdout, stderr and/or `daylog/logs.json`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;
use serde_json::Value;

/// Get the path to the built `dl` binary.
fn dl_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dl");
    path
}

fn command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(dl_bin());
    cmd.args(args)
        .current_dir(dir)
        .env_remove("DAYLOG_LOG")
        .env_remove("DAYLOG_LOG_FORMAT");
    cmd
}

/// Run `dl` with the given args in the given directory, returning (stdout, stderr, success).
fn run_dl(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = command(dir, args).output().expect("failed to run dl");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `dl` expecting success, return stdout.
fn run_dl_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_dl(dir, args);
    if !success {
        panic!(
            "dl {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn run_dl_json(dir: &Path, args: &[&str]) -> Value {
    let mut with_json = args.to_vec();
    with_json.push("--json");
    let out = run_dl_ok(dir, &with_json);
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("bad JSON ({}): {}", e, out))
}

/// Run `dl` with `input` on stdin
fn run_dl_with_stdin(dir: &Path, args: &[&str], input: &str) -> (String, bool) {
    let mut child = command(dir, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run dl");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

/// A fresh store named "test"
fn init_store(root: &Path) {
    run_dl_ok(root, &["init", "--name", "test"]);
}

/// Seed `daylog/logs.json` directly, as an older client would have written it
fn write_documents(root: &Path, documents: Value) {
    let file = serde_json::json!({ "documents": documents });
    fs::write(
        root.join("daylog/logs.json"),
        serde_json::to_string_pretty(&file).unwrap(),
    )
    .unwrap();
}

fn add(root: &Path, args: &[&str]) -> Value {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    run_dl_json(root, &full)
}

/// Two tickets on 2025-04-01, one update on #1 the next day
fn seed_basic(root: &Path) {
    init_store(root);
    add(root, &["Call roofer", "-s", "Roof", "-c", "home", "--date", "2025-04-01", "--time", "09:00"]);
    add(root, &["Quarterly report", "--date", "2025-04-01", "--time", "10:00"]);
    run_dl_ok(root, &["update", "1", "Roofer booked for Friday", "--date", "2025-04-02", "--time", "08:30"]);
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_dl_ok(tmp.path(), &["init", "--name", "house"]);
    assert!(out.contains("Initialized daylog store: house"));
    let config = fs::read_to_string(tmp.path().join("daylog/config.toml")).unwrap();
    assert!(config.contains("name = \"house\""));
}

#[test]
fn test_init_twice_needs_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let (_stdout, stderr, success) = run_dl(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
    run_dl_ok(tmp.path(), &["init", "--force"]);
}

#[test]
fn test_commands_need_a_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_stdout, stderr, success) = run_dl(tmp.path(), &["feed"]);
    assert!(!success);
    assert!(stderr.contains("not a daylog directory"));
}

#[test]
fn test_dir_flag_targets_another_directory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let elsewhere = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let dir = tmp.path().to_str().unwrap();
    run_dl_ok(elsewhere.path(), &["-C", dir, "add", "From afar"]);
    let out = run_dl_ok(tmp.path(), &["feed"]);
    assert!(out.contains("From afar"));
}

// ---------------------------------------------------------------------------
// add / update / ticket numbers
// ---------------------------------------------------------------------------

#[test]
fn test_open_logs_get_sequential_numbers() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());

    let first = add(tmp.path(), &["Fix gutter"]);
    let note = add(tmp.path(), &["Bought paint", "--type", "note"]);
    let second = add(tmp.path(), &["Book dentist", "-c", "home"]);

    assert_eq!(first["custom_id"], 1);
    assert!(note.get("custom_id").is_none());
    assert_eq!(second["custom_id"], 2);
    assert_eq!(run_dl_ok(tmp.path(), &["next-id"]).trim(), "#3");
    assert_eq!(run_dl_json(tmp.path(), &["next-id"])["next_id"], 3);
}

#[test]
fn test_next_id_on_empty_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    assert_eq!(run_dl_ok(tmp.path(), &["next-id"]).trim(), "#1");
}

#[test]
fn test_add_json_shape() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let log = add(
        tmp.path(),
        &["Call roofer", "-s", "Roof", "-c", "work,home", "--date", "2025-04-01", "--time", "9:05"],
    );
    assert_eq!(log["type"], "Open");
    assert_eq!(log["subject"], "Roof");
    assert_eq!(log["categories"], serde_json::json!(["Work", "Home"]));
    assert_eq!(log["category_label"], "Work & Home");
    assert_eq!(log["date"], "2025-04-01");
    assert_eq!(log["timestamp"], "2025-04-01T09:05");
}

#[test]
fn test_add_rejects_bad_input() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());

    let (_o, stderr, success) = run_dl(tmp.path(), &["add", "   "]);
    assert!(!success);
    assert!(stderr.contains("entry text is required"));

    let (_o, stderr, success) = run_dl(tmp.path(), &["add", "x", "--date", "01/04/2025"]);
    assert!(!success);
    assert!(stderr.contains("invalid date"));

    let (_o, stderr, success) = run_dl(tmp.path(), &["add", "x", "-c", "garden"]);
    assert!(!success);
    assert!(stderr.contains("invalid category"));

    // Nothing was written
    assert_eq!(run_dl_ok(tmp.path(), &["feed"]).trim(), "no logs yet");
}

#[test]
fn test_add_with_attachments_and_links() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let quote = tmp.path().join("quote.pdf");
    fs::write(&quote, b"%PDF-1.4").unwrap();

    let log = add(
        tmp.path(),
        &[
            "Roof quote",
            "--attach",
            quote.to_str().unwrap(),
            "--link",
            "Roofer=https://example.com/roofer",
        ],
    );
    let attachments = log["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["name"], "quote.pdf");
    assert_eq!(log["links"][0]["title"], "Roofer");

    let blobs: Vec<_> = fs::read_dir(tmp.path().join("daylog/blobs"))
        .unwrap()
        .collect();
    assert_eq!(blobs.len(), 1);
}

#[test]
fn test_too_many_attachments() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    run_dl_ok(tmp.path(), &["config", "set", "uploads.max_files", "1"]);
    let a = tmp.path().join("a.txt");
    let b = tmp.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let (_o, stderr, success) = run_dl(
        tmp.path(),
        &["add", "x", "--attach", a.to_str().unwrap(), "--attach", b.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("too many attachments: 2 (max 1)"));
}

#[test]
fn test_update_inherits_ticket_categories() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    add(tmp.path(), &["Call roofer", "-c", "home"]);

    let out = run_dl_ok(tmp.path(), &["update", "1", "Left a voicemail"]);
    assert!(out.contains("Done"));
    assert!(out.contains("(Ref: #1)"));
    assert!(out.contains("[Home]"));
}

#[test]
fn test_update_for_missing_ticket_warns() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let (stdout, stderr, success) = run_dl(tmp.path(), &["update", "9", "Orphan update"]);
    assert!(success);
    assert!(stderr.contains("no ticket #9"));
    assert!(stdout.contains("(Ref: #9)"));
}

// ---------------------------------------------------------------------------
// feed / history / board / show
// ---------------------------------------------------------------------------

#[test]
fn test_feed_newest_first() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    let out = run_dl_ok(tmp.path(), &["feed"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Roofer booked for Friday"));
    assert!(lines[2].contains("Roof: Call roofer"));

    let limited = run_dl_ok(tmp.path(), &["feed", "-n", "1"]);
    assert_eq!(limited.lines().count(), 1);
}

#[test]
fn test_history_groups_updates_under_tickets() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());

    let out = run_dl_ok(tmp.path(), &["history"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("#2"));
    assert!(lines[1].contains("#1"));
    assert!(lines[2].starts_with("    \u{21B3} "));
    assert!(lines[2].contains("Roofer booked"));

    let json = run_dl_json(tmp.path(), &["history"]);
    let flags: Vec<bool> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["is_child"].as_bool().unwrap())
        .collect();
    assert_eq!(flags, vec![false, false, true]);
}

#[test]
fn test_history_custom_id_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    let json = run_dl_json(tmp.path(), &["history", "--order", "custom-id"]);
    let first = &json.as_array().unwrap()[0];
    assert_eq!(first["custom_id"], 1);
}

#[test]
fn test_history_search_and_category() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());

    let out = run_dl_ok(tmp.path(), &["history", "-q", "QUARTERLY"]);
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("Quarterly report"));

    let out = run_dl_ok(tmp.path(), &["history", "-c", "home"]);
    assert!(out.contains("Call roofer"));
    assert!(!out.contains("Quarterly report"));

    let out = run_dl_ok(tmp.path(), &["history", "-q", "nothing-like-this"]);
    assert_eq!(out.trim(), "no logs match");
}

#[test]
fn test_history_context_keeps_open_tickets() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    add(tmp.path(), &["Unrelated note", "--type", "note", "--date", "2025-04-05", "--time", "12:00"]);

    let out = run_dl_ok(tmp.path(), &["history", "--date", "2025-04-05"]);
    assert_eq!(out.lines().count(), 1);

    let out = run_dl_ok(tmp.path(), &["history", "--date", "2025-04-05", "--context"]);
    assert!(out.contains("Unrelated note"));
    assert!(out.contains("Call roofer"));
    assert!(out.contains("Quarterly report"));
    assert!(out.contains("Roofer booked"));
}

#[test]
fn test_closed_ticket_matches_its_closing_date() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    let out = run_dl_ok(tmp.path(), &["close", "#2", "--date", "2025-04-09"]);
    assert_eq!(out.trim(), "closed #2 on 2025-04-09");

    let out = run_dl_ok(tmp.path(), &["history", "--date", "2025-04-09"]);
    assert!(out.contains("Closed"));
    assert!(out.contains("Quarterly report"));

    let out = run_dl_ok(tmp.path(), &["history", "--date", "2025-04-09", "--exact-date"]);
    assert_eq!(out.trim(), "no logs match");
}

#[test]
fn test_board_lists_open_tickets() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    run_dl_ok(tmp.path(), &["close", "#2"]);

    let out = run_dl_ok(tmp.path(), &["board"]);
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("#1 "));
    assert!(out.contains("(1 update)"));

    let expanded = run_dl_ok(tmp.path(), &["board", "--expand"]);
    assert!(expanded.contains("    \u{21B3} "));

    let json = run_dl_json(tmp.path(), &["board"]);
    let groups = json.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["child_count"], 1);
    assert_eq!(groups[0]["children"][0]["task_ref"], 1);

    let out = run_dl_ok(tmp.path(), &["board", "-c", "work"]);
    assert_eq!(out.trim(), "no open tickets");
}

#[test]
fn test_show_by_number_and_prefix() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());

    let out = run_dl_ok(tmp.path(), &["show", "#1"]);
    assert!(out.starts_with("Open #1 - Roof"));
    assert!(out.contains("categories: Home"));

    let id = run_dl_json(tmp.path(), &["show", "#2"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let out = run_dl_ok(tmp.path(), &["show", &id]);
    assert!(out.contains("Quarterly report"));

    let (_o, stderr, success) = run_dl(tmp.path(), &["show", "#99"]);
    assert!(!success);
    assert!(stderr.contains("no log matches '#99'"));
}

// ---------------------------------------------------------------------------
// edit / close / delete
// ---------------------------------------------------------------------------

#[test]
fn test_edit_fields() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());

    let log = run_dl_json(
        tmp.path(),
        &["edit", "#1", "--entry", "Call the roofer again", "--clear-subject", "--time", "11:15"],
    );
    assert_eq!(log["entry"], "Call the roofer again");
    assert!(log.get("subject").is_none());
    assert_eq!(log["timestamp"], "2025-04-01T11:15");
    assert_eq!(log["custom_id"], 1);

    let (_o, stderr, success) = run_dl(tmp.path(), &["edit", "#1"]);
    assert!(!success);
    assert!(stderr.contains("nothing to change"));
}

#[test]
fn test_close_only_open_tickets() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    run_dl_ok(tmp.path(), &["close", "#1"]);
    let (_o, stderr, success) = run_dl(tmp.path(), &["close", "#1"]);
    assert!(!success);
    assert!(stderr.contains("is not an open ticket"));
}

#[test]
fn test_delete_with_and_without_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());

    let (out, success) = run_dl_with_stdin(tmp.path(), &["delete", "#2"], "n\n");
    assert!(success);
    assert!(out.contains("cancelled"));
    assert_eq!(run_dl_ok(tmp.path(), &["feed"]).lines().count(), 3);

    let out = run_dl_ok(tmp.path(), &["delete", "#2", "--yes"]);
    assert!(out.starts_with("deleted "));
    assert_eq!(run_dl_ok(tmp.path(), &["feed"]).lines().count(), 2);

    // Deleted logs are recorded for recovery
    let recovery = fs::read_to_string(tmp.path().join("daylog/.recovery.log")).unwrap();
    assert!(recovery.contains("Quarterly report"));
}

// ---------------------------------------------------------------------------
// brief
// ---------------------------------------------------------------------------

#[test]
fn test_brief_stdout() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    let out = run_dl_ok(tmp.path(), &["brief", "--stdout", "--date", "2025-04-01", "--exact-date"]);
    assert!(out.starts_with("Act as my Executive Officer. Here are my logs for 2025-04-01."));
    assert!(out.contains("[2025-04-01 09:00] [Home] [OPEN] [TICKET #1] Roof: Call roofer"));
    assert!(out.contains("[TICKET #2]"));
    assert!(!out.contains("Roofer booked"));
}

#[test]
fn test_brief_header_from_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    run_dl_ok(tmp.path(), &["config", "set", "brief.header", "Summarize my week."]);
    let out = run_dl_ok(tmp.path(), &["brief", "--stdout"]);
    assert!(out.starts_with("Summarize my week."));
}

#[test]
fn test_daily_brief() {
    let tmp = tempfile::TempDir::new().unwrap();
    seed_basic(tmp.path());
    let out = run_dl_ok(tmp.path(), &["brief", "--daily", "--stdout", "--date", "2025-04-01"]);
    assert!(out.contains("WORK MISSION"));
    assert!(out.contains("HOME FRONT"));
    assert!(out.contains("Quarterly report"));

    let (_o, stderr, success) =
        run_dl(tmp.path(), &["brief", "--daily", "--stdout", "--date", "2030-01-01"]);
    assert!(!success);
    assert!(stderr.contains("no logs found for 2030-01-01"));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_keeps_comments() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let out = run_dl_ok(tmp.path(), &["config", "set", "board.ticket_order", "original"]);
    assert_eq!(out.trim(), "board.ticket_order = original");

    let text = fs::read_to_string(tmp.path().join("daylog/config.toml")).unwrap();
    assert!(text.contains("# --- Task board ---"));
    assert!(text.contains("ticket_order = \"original\""));

    let json = run_dl_json(tmp.path(), &["config"]);
    assert_eq!(json["board"]["ticket_order"], "original");
}

#[test]
fn test_config_rejects_unknown_and_invalid() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let (_o, _e, success) = run_dl(tmp.path(), &["config", "set", "feed.colour", "red"]);
    assert!(!success);
    let (_o, _e, success) = run_dl(tmp.path(), &["config", "set", "feed.limit", "-3"]);
    assert!(!success);
}

#[test]
fn test_config_path() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    let out = run_dl_ok(tmp.path(), &["config", "path"]);
    assert!(out.trim().ends_with("daylog/config.toml"));
}

// ---------------------------------------------------------------------------
// Older document shapes
// ---------------------------------------------------------------------------

#[test]
fn test_legacy_documents_are_read() {
    let tmp = tempfile::TempDir::new().unwrap();
    init_store(tmp.path());
    write_documents(
        tmp.path(),
        serde_json::json!([
            {
                "id": "a1",
                "type": "Do",
                "category": "Both",
                "entry": "Paint fence",
                "customId": 4,
                "dateString": "2025-03-01",
                "timestamp": "2025-03-01T08:00"
            },
            {
                "id": "a2",
                "type": "Done",
                "entry": "Bought brushes",
                "taskRef": "4",
                "dateString": "2025-03-02",
                "timestamp": "2025-03-02T08:00",
                "imageUrl": "https://example.com/brushes.jpg"
            }
        ]),
    );

    let json = run_dl_json(tmp.path(), &["board"]);
    let groups = json.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["type"], "Open");
    assert_eq!(groups[0]["category_label"], "Both");
    assert_eq!(groups[0]["child_count"], 1);
    assert_eq!(groups[0]["children"][0]["category_label"], "Work");
    assert_eq!(groups[0]["children"][0]["attachments"][0]["url"], "https://example.com/brushes.jpg");

    // New tickets continue after the highest stored number
    assert_eq!(run_dl_ok(tmp.path(), &["next-id"]).trim(), "#5");
}
