//! Integration tests for Scholar Harvest
//!
//! These drive the real reqwest fetcher against a local mockito server.

use mockito::{Matcher, Server};
use scholar_harvest::config::{HarvestConfig, RetrySettings};
use scholar_harvest::models::PROFILE_COLUMNS;
use scholar_harvest::sources::mock::author_page;
use scholar_harvest::sources::{HarvestError, HarvestStatus, ScholarHarvester};
use scholar_harvest::utils::{read_delimited, write_delimited, NoopObserver};
use tokio_util::sync::CancellationToken;

fn harvester(server: &Server) -> ScholarHarvester {
    ScholarHarvester::new(HarvestConfig {
        base_url: server.url(),
        request_timeout_secs: 5,
        retry: RetrySettings {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        },
        ..Default::default()
    })
}

fn query_at(offset: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("view_op".into(), "search_authors".into()),
        Matcher::UrlEncoded(
            "mauthors".into(),
            "label:physics \"Michigan University\"".into(),
        ),
        Matcher::UrlEncoded("hl".into(), "en".into()),
        Matcher::UrlEncoded("astart".into(), offset.into()),
    ])
}

#[tokio::test]
async fn test_single_page_harvest() {
    let mut server = Server::new_async().await;
    let page = server
        .mock("GET", "/citations")
        .match_query(query_at("0"))
        .match_header("user-agent", Matcher::Regex("Mozilla".into()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=UTF-8")
        .with_body(author_page(&[("a", "Alice"), ("b", "Bob"), ("c", "Carol")], None))
        .expect(1)
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest("physics", "Michigan University", &CancellationToken::new())
        .await
        .unwrap();

    page.assert_async().await;
    assert_eq!(outcome.status, HarvestStatus::Done);
    assert_eq!(outcome.records.len(), 3);
    assert!(outcome.error.is_none());
    assert_eq!(
        outcome.records[0].profile_link,
        format!("{}/citations?hl=en&user=a", server.url())
    );
}

#[tokio::test]
async fn test_follows_continuation_token() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/citations")
        .match_query(query_at("0"))
        .with_status(200)
        .with_body(author_page(&[("a", "Alice"), ("b", "Bob")], Some("T1")))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/citations")
        .match_query(Matcher::AllOf(vec![
            query_at("10"),
            Matcher::UrlEncoded("after_author".into(), "T1".into()),
        ]))
        .with_status(200)
        .with_body(author_page(&[("c", "Carol")], None))
        .expect(1)
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest("physics", "Michigan University", &CancellationToken::new())
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(outcome.status, HarvestStatus::Done);
    assert_eq!(outcome.offsets, vec![0, 10]);

    let names: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
}

#[tokio::test]
async fn test_server_errors_fail_after_retries() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/citations")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest("physics", "Michigan University", &CancellationToken::new())
        .await
        .unwrap();

    failing.assert_async().await;
    assert_eq!(outcome.status, HarvestStatus::Failed);
    assert!(outcome.records.is_empty());
    assert!(matches!(outcome.error, Some(HarvestError::Transport(_))));
}

#[tokio::test]
async fn test_blocked_request_is_not_retried() {
    let mut server = Server::new_async().await;
    let blocked = server
        .mock("GET", "/citations")
        .match_query(Matcher::Any)
        .with_status(403)
        .expect(1)
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest("physics", "Michigan University", &CancellationToken::new())
        .await
        .unwrap();

    blocked.assert_async().await;
    assert_eq!(outcome.status, HarvestStatus::Failed);
    assert!(matches!(outcome.error, Some(HarvestError::Blocked(403))));
}

#[tokio::test]
async fn test_invalid_query_sends_nothing() {
    let mut server = Server::new_async().await;
    let untouched = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = harvester(&server)
        .harvest("physics", "   ", &CancellationToken::new())
        .await;

    untouched.assert_async().await;
    assert!(matches!(result, Err(HarvestError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_name_search_single_page() {
    let mut server = Server::new_async().await;
    let page = server
        .mock("GET", "/citations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("view_op".into(), "search_authors".into()),
            Matcher::UrlEncoded("mauthors".into(), "\"John Doe\"".into()),
            Matcher::UrlEncoded("astart".into(), "0".into()),
        ]))
        .with_status(200)
        .with_body(author_page(&[("jd1", "John Doe"), ("jd2", "Jon Doe")], Some("T1")))
        .expect(1)
        .create_async()
        .await;

    let records = harvester(&server).search_by_name("John Doe").await.unwrap();

    page.assert_async().await;
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["John Doe", "Jon Doe"]);
}

#[tokio::test]
async fn test_field_harvest_follows_token() {
    let mut server = Server::new_async().await;
    let field = |offset: &str| {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("mauthors".into(), "label:quantum_computing".into()),
            Matcher::UrlEncoded("astart".into(), offset.into()),
        ])
    };
    let first = server
        .mock("GET", "/citations")
        .match_query(field("0"))
        .with_status(200)
        .with_body(author_page(&[("a", "Alice")], Some("T1")))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/citations")
        .match_query(field("10"))
        .with_status(200)
        .with_body(author_page(&[("b", "Bob")], None))
        .expect(1)
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest_field(
            "Quantum Computing",
            &CancellationToken::new(),
            &NoopObserver,
        )
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(outcome.status, HarvestStatus::Done);
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_profile_lookup() {
    let mut server = Server::new_async().await;
    let profile = server
        .mock("GET", "/citations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user".into(), "abc123".into()),
            Matcher::UrlEncoded("hl".into(), "en".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"<html><body>
            <div id="gsc_prf_in">Alice Smith</div>
            <div class="gsc_prf_il">Professor of Physics, University of Michigan</div>
            <div id="gsc_prf_int"><a class="gsc_prf_inta">Optics</a></div>
            <table id="gsc_rsb_st"><tr><td class="gsc_rsb_std">2,048</td></tr></table>
            </body></html>"#,
        )
        .create_async()
        .await;

    let details = harvester(&server).fetch_profile("abc123").await.unwrap();

    profile.assert_async().await;
    assert_eq!(details.name, "Alice Smith");
    assert_eq!(details.interests, vec!["Optics"]);
    assert_eq!(details.citations, Some(2048));
}

#[tokio::test]
async fn test_harvest_to_delimited_file() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/citations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(author_page(&[("a", "Alice"), ("b", "Bob")], None))
        .create_async()
        .await;

    let outcome = harvester(&server)
        .harvest("physics", "Michigan University", &CancellationToken::new())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<Vec<String>> = outcome.records.iter().map(|r| r.to_row()).collect();
    let path = write_delimited(&rows, dir.path().join("out"), "physics.csv", &PROFILE_COLUMNS[..])
        .unwrap();

    let read = read_delimited(&path).unwrap();
    assert_eq!(read.len(), 3);
    assert_eq!(read[0], PROFILE_COLUMNS.to_vec());
    assert_eq!(read[1][0], "Alice");
    assert_eq!(read[2][0], "Bob");
}
