use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn designsync() -> Command {
    Command::cargo_bin("designsync").expect("binary built")
}

/// Serve one canned JSON response on a loopback port; returns the database
/// URL to point `-a` at. `check` issues exactly one query.
fn serve_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/db1")
}

#[test]
fn generate_prints_each_assembled_document() {
    let base = TempDir::new().expect("base");
    let views = base.path().join("doc1").join("views").join("by_name");
    fs::create_dir_all(&views).expect("mkdir");
    fs::write(views.join("map.js"), "function(doc) { emit(doc.name); }").expect("write");

    designsync()
        .arg("generate")
        .arg("-d")
        .arg(base.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"_id\": \"_design/doc1\""))
        .stdout(predicate::str::contains("by_name"));
}

#[test]
fn generate_on_empty_directory_prints_nothing() {
    let base = TempDir::new().expect("base");
    designsync()
        .arg("generate")
        .arg("-d")
        .arg(base.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_base_directory_exits_with_invalid_args() {
    let base = TempDir::new().expect("base");
    let missing = base.path().join("does-not-exist");

    designsync()
        .arg("generate")
        .arg("-d")
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn check_without_address_exits_with_invalid_args() {
    let base = TempDir::new().expect("base");
    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--address is required"));
}

#[test]
fn check_with_non_http_url_exits_with_invalid_args() {
    let base = TempDir::new().expect("base");
    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .arg("-a")
        .arg("ftp://example.com/db1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid database URL"));
}

#[test]
fn check_with_relative_url_exits_with_invalid_args() {
    let base = TempDir::new().expect("base");
    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .arg("-a")
        .arg("db1/documents")
        .assert()
        .code(1);
}

#[test]
fn check_prints_have_not_changed_when_in_sync() {
    let base = TempDir::new().expect("base");
    let url = serve_once(r#"{"rows":[]}"#);

    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .arg("-a")
        .arg(&url)
        .assert()
        .success()
        .stdout("Have not changed\n");
}

#[test]
fn check_prints_changed_when_disk_has_a_new_document() {
    let base = TempDir::new().expect("base");
    let doc = base.path().join("doc1");
    fs::create_dir_all(&doc).expect("mkdir");
    fs::write(doc.join("language.txt"), "javascript").expect("write");
    let url = serve_once(r#"{"rows":[]}"#);

    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .arg("-a")
        .arg(&url)
        .assert()
        .success()
        .stdout("Changed\n");
}

#[test]
fn unreachable_database_exits_with_failure() {
    let base = TempDir::new().expect("base");
    // Bind then drop to get a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    designsync()
        .arg("check")
        .arg("-d")
        .arg(base.path())
        .arg("-a")
        .arg(format!("http://{addr}/db1"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("transport failure"));
}

#[test]
fn unknown_subcommand_exits_with_invalid_args() {
    designsync().arg("frobnicate").assert().code(1);
}

#[test]
fn help_exits_cleanly() {
    designsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("push"));
}
