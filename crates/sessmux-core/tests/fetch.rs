mod common;

use std::{sync::Mutex, time::Duration};

use common::{Exporter, Reply};
use sessmux_core::{
    Accumulator, FetchError, RewriteMode, Source,
    accumulator::lock,
    fetch::fetch,
};

#[tokio::test]
async fn fetches_and_attributes_lines() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(
        dir.path().join("alice.sock"),
        Reply::Body("# HELP reqs total\nreqs{name=\"x\"} 3\n".into()),
    );

    let source = Source::user("alice");
    let acc = Mutex::new(Accumulator::new());
    let stats = fetch(
        &source,
        &exporter.socket,
        &source.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap();

    assert_eq!(stats.lines, 2);
    assert_eq!(
        lock(&acc).render(),
        "# HELP reqs total\nreqs{user=\"alice\",name=\"x\"} 3\n"
    );
    assert_eq!(exporter.hosts(), ["alice"]);
}

#[tokio::test]
async fn system_source_uses_system_host() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(dir.path().join("system.sock"), Reply::Body("up 1\n".into()));

    let acc = Mutex::new(Accumulator::new());
    fetch(
        &Source::System,
        &exporter.socket,
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap();

    assert_eq!(lock(&acc).render(), "up 1\n");
    assert_eq!(exporter.hosts(), ["system"]);
}

#[tokio::test]
async fn chunked_body_with_unterminated_tail() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(
        dir.path().join("chunked.sock"),
        Reply::Chunked(vec!["a 1\nb".into(), " 2\r\n".into(), "c 3".into()]),
    );

    let acc = Mutex::new(Accumulator::new());
    let stats = fetch(
        &Source::System,
        &exporter.socket,
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap();

    assert_eq!(stats.lines, 3);
    assert_eq!(lock(&acc).render(), "a 1\nb 2\nc 3\n");
}

#[tokio::test]
async fn missing_socket_is_a_connect_error() {
    let dir = tempfile::tempdir().unwrap();
    let acc = Mutex::new(Accumulator::new());

    let err = fetch(
        &Source::System,
        &dir.path().join("absent.sock"),
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::Connect { .. }), "{err}");
    assert!(lock(&acc).is_empty());
}

#[tokio::test]
async fn error_status_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(dir.path().join("broken.sock"), Reply::Status(500));

    let acc = Mutex::new(Accumulator::new());
    let err = fetch(
        &Source::System,
        &exporter.socket,
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 500), "{err}");
}

#[tokio::test]
async fn truncated_body_keeps_committed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(
        dir.path().join("truncated.sock"),
        Reply::Truncated("first 1\nsecond 2\npart".into()),
    );

    let acc = Mutex::new(Accumulator::new());
    let err = fetch(
        &Source::System,
        &exporter.socket,
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::Http(_)), "{err}");
    assert_eq!(lock(&acc).render(), "first 1\nsecond 2\n");
}

#[tokio::test]
async fn hung_exporter_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::spawn(dir.path().join("hang.sock"), Reply::Hang);

    let acc = Mutex::new(Accumulator::new());
    let err = fetch(
        &Source::System,
        &exporter.socket,
        &Source::System.parser(RewriteMode::Labels),
        &acc,
        Some(Duration::from_millis(200)),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::Timeout(_)), "{err}");
}
