mod common;

use common::{failed_session, finite_session, live_session};
use cumulus_core::error::ClusterError;
use cumulus_core::remote::{read_session, LogFollower};
use regex::Regex;

fn ready() -> Regex {
    Regex::new("Cloud-init .* finished").unwrap()
}

#[tokio::test]
async fn yields_prefix_through_first_match_then_terminates() {
    let (session, probe) = live_session(&[
        "Booting...",
        "Cloud-init v.1 running",
        "Cloud-init v.1 finished at t=5",
        "anything after the marker",
    ])
    .await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    let ready = ready();
    let mut seen = Vec::new();
    while let Some(line) = follower.next_ready_line(&ready).await.unwrap() {
        seen.push(line);
    }

    assert_eq!(
        seen,
        vec![
            "Booting...".to_string(),
            "Cloud-init v.1 running".to_string(),
            "Cloud-init v.1 finished at t=5".to_string(),
        ]
    );
    assert_eq!(probe.kill_count(), 1);
}

#[tokio::test]
async fn ready_marker_on_the_final_line_of_a_finite_stream() {
    let (session, _probe) = finite_session(&[
        "Booting...",
        "Cloud-init v.1 running",
        "Cloud-init v.1 finished at t=5",
    ])
    .await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    let ready = ready();
    let mut seen = Vec::new();
    while let Some(line) = follower.next_ready_line(&ready).await.unwrap() {
        seen.push(line);
    }

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2], "Cloud-init v.1 finished at t=5");
    assert_eq!(follower.next_ready_line(&ready).await.unwrap(), None);
}

#[tokio::test]
async fn unmatched_finite_stream_drains_and_ends() {
    let (session, probe) = finite_session(&["alpha", "beta"]).await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    let ready = ready();
    let mut seen = Vec::new();
    while let Some(line) = follower.next_ready_line(&ready).await.unwrap() {
        seen.push(line);
    }

    assert_eq!(seen, vec!["alpha".to_string(), "beta".to_string()]);
    // Natural end: the session exited on its own, nothing to kill.
    assert_eq!(probe.kill_count(), 0);
}

#[tokio::test]
async fn follow_forever_preserves_arrival_order() {
    let (session, _probe) = live_session(&["one", "two", "three"]).await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    assert_eq!(follower.next_line().await.unwrap().as_deref(), Some("one"));
    assert_eq!(follower.next_line().await.unwrap().as_deref(), Some("two"));
    assert_eq!(
        follower.next_line().await.unwrap().as_deref(),
        Some("three")
    );

    follower.close().await.unwrap();
}

#[tokio::test]
async fn cancelling_mid_stream_closes_the_session_exactly_once() {
    let (session, probe) = live_session(&["one", "two", "three"]).await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    assert_eq!(follower.next_line().await.unwrap().as_deref(), Some("one"));

    follower.close().await.unwrap();
    follower.close().await.unwrap();

    assert_eq!(probe.kill_count(), 1);
    assert_eq!(follower.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn transport_failure_with_no_output_is_a_connection_error() {
    let (session, _probe) =
        failed_session("ssh: connect to host 10.0.0.5 port 22: Connection refused").await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    let err = follower.next_line().await.unwrap_err();
    match err {
        ClusterError::Connection { detail, .. } => {
            assert!(detail.contains("Connection refused"));
        }
        other => panic!("expected a connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn host_key_rejection_is_an_untrusted_host_error() {
    let (session, _probe) = failed_session("Host key verification failed.").await;
    let mut follower = LogFollower::from_session(Box::new(session), "sim".to_string()).unwrap();

    let err = follower.next_line().await.unwrap_err();
    assert!(matches!(err, ClusterError::HostUntrusted { .. }));
}

#[tokio::test]
async fn snapshot_returns_full_contents_as_one_string() {
    let (session, _probe) = finite_session(&["line 1", "line 2"]).await;
    let out = read_session(Box::new(session), "sim").await.unwrap();
    assert_eq!(out, "line 1\nline 2\n");
}
