use mass_verify_rs::error::Error;
use mass_verify_rs::pipeline::{parse_results, ParseOptions};
use std::time::Duration;
use tokio::net::TcpListener;

fn write_raw(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write raw file");
    path
}

fn verify_options(workers: usize) -> ParseOptions {
    ParseOptions {
        verify: true,
        workers,
        timeout: Duration::from_secs(2),
        ..ParseOptions::default()
    }
}

/// A listener that accepts and drops connections for the whole test.
async fn spawn_listener() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    port
}

/// A port guaranteed to have no listener.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

#[tokio::test]
async fn sequential_parse_writes_records_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(
        &dir,
        "masscan.out",
        "#masscan\nopen tcp 443 10.0.0.1 160\nopen tcp 80 10.0.0.2 161\nclosed tcp 25 10.0.0.3 162\n",
    );
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, ParseOptions::default())
        .await
        .expect("parse ok");
    assert_eq!(summary.records, 2);
    assert_eq!(summary.written, 2);

    let body = std::fs::read_to_string(&out).expect("read parsed");
    assert_eq!(body, "10.0.0.1:443\n10.0.0.2:80\n");
}

#[tokio::test]
async fn sequential_parse_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(
        &dir,
        "masscan.out",
        "open tcp 443 10.0.0.1 160\nopen tcp 8080 10.0.0.2 161\n",
    );
    let out = dir.path().join("parsed.out");

    parse_results(&raw, &out, ParseOptions::default())
        .await
        .expect("first run");
    let first = std::fs::read(&out).expect("read first");

    parse_results(&raw, &out, ParseOptions::default())
        .await
        .expect("second run");
    let second = std::fs::read(&out).expect("read second");

    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_raw_file_is_setup_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = dir.path().join("does-not-exist.out");
    let out = dir.path().join("parsed.out");

    let err = parse_results(&raw, &out, ParseOptions::default())
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Setup { .. }));
}

#[tokio::test]
async fn verification_keeps_live_targets_and_drops_dead_ones() {
    let open = spawn_listener().await;
    let dead = closed_port().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(
        &dir,
        "masscan.out",
        &format!(
            "#masscan\nopen tcp {open} 127.0.0.1 160\nopen tcp {dead} 127.0.0.1 161\nopen tcp {open} 127.0.0.1 162\n"
        ),
    );
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, verify_options(3))
        .await
        .expect("parse ok");
    assert_eq!(summary.records, 3);
    assert_eq!(summary.written, 2);

    let body = std::fs::read_to_string(&out).expect("read parsed");
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    // Every sink line corresponds to an input record, never fabricated.
    for line in &lines {
        assert_eq!(*line, format!("127.0.0.1:{open}"));
    }
}

#[tokio::test]
async fn dead_targets_are_dropped_without_retry() {
    let dead = closed_port().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(
        &dir,
        "masscan.out",
        &format!("open tcp {dead} 127.0.0.1 160\nopen tcp {dead} 127.0.0.1 161\n"),
    );
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, verify_options(2))
        .await
        .expect("parse ok");
    assert_eq!(summary.records, 2);
    assert_eq!(summary.written, 0);
    assert_eq!(std::fs::read_to_string(&out).expect("read parsed"), "");
}

#[tokio::test]
async fn single_worker_preserves_input_order() {
    let open = spawn_listener().await;
    let other = spawn_listener().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(
        &dir,
        "masscan.out",
        &format!("open tcp {open} 127.0.0.1 160\nopen tcp {other} 127.0.0.1 161\n"),
    );
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, verify_options(1))
        .await
        .expect("parse ok");
    assert_eq!(summary.written, 2);

    let body = std::fs::read_to_string(&out).expect("read parsed");
    assert_eq!(
        body,
        format!("127.0.0.1:{open}\n127.0.0.1:{other}\n")
    );
}

#[tokio::test]
async fn zero_workers_falls_back_to_default_pool() {
    let open = spawn_listener().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let raw = write_raw(&dir, "masscan.out", &format!("open tcp {open} 127.0.0.1 160\n"));
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, verify_options(0))
        .await
        .expect("parse ok");
    assert_eq!(summary.written, 1);
}

#[tokio::test]
async fn verified_output_never_exceeds_open_records() {
    let open = spawn_listener().await;
    let dead = closed_port().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut content = String::from("#masscan\n");
    for i in 0..10 {
        let port = if i % 2 == 0 { open } else { dead };
        content.push_str(&format!("open tcp {port} 127.0.0.1 {i}\n"));
    }
    let raw = write_raw(&dir, "masscan.out", &content);
    let out = dir.path().join("parsed.out");

    let summary = parse_results(&raw, &out, verify_options(4))
        .await
        .expect("parse ok");
    assert_eq!(summary.records, 10);
    assert!(summary.written <= summary.records);
    assert_eq!(summary.written, 5);
}
