mod common;

use std::rc::Rc;
use std::time::Duration;

use common::{MockTransport, RecordingSleep};
use hs_cache::{DataInjector, LoadStatus, NamedQuery, QueryOutcome, RequestCache};
use hs_data::{Endpoint, QueryParams, RetryPolicy};
use hs_observability::{MetricsCollector, QueryResult};

const URL: &str = "/analytics/query/single_card_stats/?card_id=374";

fn card_stats() -> (Endpoint, QueryParams) {
    (
        Endpoint::query("single_card_stats"),
        QueryParams::new().with("card_id", 374),
    )
}

#[tokio::test]
async fn test_processing_four_times_times_out_after_three_retries() {
    let transport = MockTransport::new()
        .respond(URL, 202, "")
        .respond(URL, 202, "")
        .respond(URL, 202, "")
        .respond(URL, 202, "");
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let metrics = Rc::new(MetricsCollector::new());
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper).with_metrics(Rc::clone(&metrics));
    let (endpoint, params) = card_stats();

    let mut statuses = Vec::new();
    let outcome = injector
        .load_with(&endpoint, &params, |status| statuses.push(status))
        .await;

    assert_eq!(outcome, QueryOutcome::Timeout);
    assert_eq!(outcome.status(), LoadStatus::Timeout);
    assert_eq!(cache.transport().call_count(), 4);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(15); 3]);
    assert_eq!(statuses, vec![LoadStatus::Processing; 3]);

    let recorded = metrics.queries();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].attempts, 4);
    assert_eq!(recorded[0].result, QueryResult::Timeout);
    assert_eq!(recorded[0].status_code, Some(202));
}

#[tokio::test]
async fn test_processing_then_ready() {
    let transport = MockTransport::new()
        .respond(URL, 202, "")
        .respond(URL, 200, r#"{"series": {"data": {"ALL": [{"winrate": 51.2}]}}}"#);
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper);
    let (endpoint, params) = card_stats();

    assert_eq!(injector.initial_status(&endpoint, &params), LoadStatus::Loading);
    let outcome = injector.load(&endpoint, &params).await;

    assert_eq!(outcome.status(), LoadStatus::Success);
    assert_eq!(outcome.value().unwrap()["series"]["data"]["ALL"][0]["winrate"], 51.2);
    assert_eq!(sleeper.delays().len(), 1);
    assert_eq!(injector.initial_status(&endpoint, &params), LoadStatus::Success);
}

#[tokio::test]
async fn test_terminal_error_is_not_retried() {
    let transport = MockTransport::new().respond(URL, 404, "");
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper);
    let (endpoint, params) = card_stats();

    let outcome = injector.load(&endpoint, &params).await;
    match &outcome {
        QueryOutcome::Error(err) => assert_eq!(err.status(), Some(404)),
        other => panic!("expected an error, got {:?}", other),
    }
    assert_eq!(outcome.status(), LoadStatus::Error);
    assert!(sleeper.delays().is_empty());
    assert_eq!(cache.transport().call_count(), 1);
}

#[tokio::test]
async fn test_custom_policy() {
    let transport = MockTransport::new().respond(URL, 202, "");
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper).with_policy(RetryPolicy::none());
    let (endpoint, params) = card_stats();

    assert_eq!(injector.load(&endpoint, &params).await, QueryOutcome::Timeout);
    assert_eq!(cache.transport().call_count(), 1);
}

#[tokio::test]
async fn test_empty_series_is_no_data() {
    let transport = MockTransport::new().respond(URL, 200, r#"{"series": {"data": []}}"#);
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper);
    let (endpoint, params) = card_stats();

    let outcome = injector.load(&endpoint, &params).await;
    assert_eq!(outcome.status(), LoadStatus::NoData);
    assert_eq!(injector.initial_status(&endpoint, &params), LoadStatus::NoData);
}

#[tokio::test]
async fn test_load_many_reports_each_query() {
    let transport = MockTransport::new()
        .respond(URL, 200, r#"{"series": {"data": [1]}}"#)
        .respond("/analytics/query/card_list_free/", 500, "");
    let cache = Rc::new(RequestCache::new(transport));
    let sleeper = RecordingSleep::new();
    let injector = DataInjector::new(Rc::clone(&cache), &sleeper);
    let (endpoint, params) = card_stats();

    let outcomes = injector
        .load_many(&[
            NamedQuery::new("stats", endpoint, params),
            NamedQuery::new("cards", "card_list_free", QueryParams::new()),
        ])
        .await;

    assert_eq!(outcomes["stats"].status(), LoadStatus::Success);
    assert_eq!(outcomes["cards"].status(), LoadStatus::Error);
}
