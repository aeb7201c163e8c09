// Request/response contract of the API client, against a mocked transport

use crate::client::{
    ApiClient, DISTINCT_ID_HEADER, HttpResponse, MockTransport, RecommendParams,
};
use crate::errors::{RequestError, TransportError};
use crate::ledger::ShownIdLedger;
use crate::models::{FeedbackEvent, PopularityMode, SeedSong};
use crate::storage::MemoryStorage;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn status(code: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status: code,
            body: body.to_string(),
        }
    }

    fn empty_ledger() -> ShownIdLedger {
        ShownIdLedger::new(Arc::new(MemoryStorage::new()))
    }

    fn skyfall_params(mode: PopularityMode) -> RecommendParams {
        RecommendParams {
            mode,
            ..RecommendParams::new(vec![SeedSong::from_text("Skyfall").unwrap()])
        }
    }

    fn client_returning(response: HttpResponse) -> ApiClient<MockTransport> {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(move |_, _, _| Ok(response.clone()));
        ApiClient::new(transport, None, Some("did-1".to_string()))
    }

    #[test]
    fn test_recommend_end_to_end_with_ledger() {
        let captured: Arc<Mutex<Option<(String, Vec<(String, String)>, serde_json::Value)>>> =
            Arc::new(Mutex::new(None));
        let sink = captured.clone();

        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .returning(move |url, headers, body| {
                *sink.lock().unwrap() = Some((url.to_string(), headers.to_vec(), body.clone()));
                Ok(ok(
                    r#"{"recommendations":[{"id":"xyz789","title":"Hollow","artist":"Quiet Hours"}]}"#,
                ))
            });
        let client = ApiClient::new(transport, None, Some("did-1".to_string()));

        let ledger = empty_ledger();
        ledger.add(&["abc123".to_string()]);

        let response = client
            .recommend(&skyfall_params(PopularityMode::Mainstream), &ledger)
            .unwrap();

        let (url, headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(url, "/api/recommend");
        assert_eq!(
            headers,
            vec![(DISTINCT_ID_HEADER.to_string(), "did-1".to_string())]
        );
        assert_eq!(
            body,
            json!({
                "seeds": [{ "title": "Skyfall" }],
                "n": 9,
                "mode": "mainstream",
                "already_shown_ids": ["abc123"],
                "distinct_id": "did-1"
            })
        );

        // The client does not touch the ledger; merging is the caller's job
        assert_eq!(ledger.read(), vec!["abc123".to_string()]);
        ledger.add(&response.ids());
        assert_eq!(
            ledger.read(),
            vec!["abc123".to_string(), "xyz789".to_string()]
        );
    }

    #[test]
    fn test_recommend_override_replaces_ledger_ids() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .withf(|_, _, body| body["already_shown_ids"] == json!([]))
            .times(1)
            .returning(|_, _, _| Ok(ok(r#"{"recommendations":[]}"#)));
        let client = ApiClient::new(transport, None, None);

        let ledger = empty_ledger();
        ledger.add(&["abc123".to_string()]);
        let params = RecommendParams {
            already_shown_override: Some(Vec::new()),
            ..skyfall_params(PopularityMode::All)
        };
        let response = client.recommend(&params, &ledger).unwrap();
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn test_recommend_forwards_empty_seed_list() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .withf(|_, headers, body| {
                headers.is_empty() && body["seeds"] == json!([]) && body.get("distinct_id").is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(ok(r#"{"recommendations":[]}"#)));
        let client = ApiClient::new(transport, None, None);

        assert!(client
            .recommend(&RecommendParams::new(Vec::new()), &empty_ledger())
            .is_ok());
    }

    #[test]
    fn test_recommend_error_uses_detail_field() {
        let client = client_returning(status(500, r#"{"detail":"model unavailable"}"#));
        let err = client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap_err();
        assert_eq!(err.to_string(), "model unavailable");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_recommend_error_uses_raw_text() {
        let client = client_returning(status(500, "oops"));
        let err = client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap_err();
        assert_eq!(err.to_string(), "oops");
    }

    #[test]
    fn test_recommend_error_with_empty_body_uses_status() {
        let client = client_returning(status(503, ""));
        let err = client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 503");
    }

    #[test]
    fn test_recommend_malformed_success_body_is_an_error() {
        let client = client_returning(ok(r#"{"recs":[]}"#));
        let err = client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[test]
    fn test_recommend_transport_failure_is_an_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .returning(|_, _, _| Err(TransportError("connection refused".to_string())));
        let client = ApiClient::new(transport, None, None);
        let err = client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_base_url_override_applies_to_every_endpoint() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .withf(|url, _, _| url == "https://api.offtrack.fm/api/recommend")
            .times(1)
            .returning(|_, _, _| Ok(ok(r#"{"recommendations":[]}"#)));
        transport
            .expect_post_json()
            .withf(|url, _, _| url == "https://api.offtrack.fm/api/feedback")
            .times(1)
            .returning(|_, _, _| Ok(ok("{}")));
        transport
            .expect_get()
            .withf(|url, _| url == "https://api.offtrack.fm/api/search?q=sky&limit=8")
            .times(1)
            .returning(|_, _| Ok(ok(r#"{"results":[]}"#)));

        let client = ApiClient::new(
            transport,
            Some("https://api.offtrack.fm/".to_string()),
            None,
        );
        client
            .recommend(&skyfall_params(PopularityMode::All), &empty_ledger())
            .unwrap();
        client.send_feedback("t1", FeedbackEvent::Like);
        assert!(client.search("sky", 8).is_empty());
    }

    #[test]
    fn test_search_short_query_never_hits_network() {
        let mut transport = MockTransport::new();
        transport.expect_get().never();
        let client = ApiClient::new(transport, None, None);

        assert!(client.search("", 8).is_empty());
        assert!(client.search(" a ", 8).is_empty());
    }

    #[test]
    fn test_search_encodes_query_and_parses_results() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, headers| {
                url == "/api/search?q=sky%20fall%20%26%20co&limit=5"
                    && headers[0].0 == DISTINCT_ID_HEADER
            })
            .times(1)
            .returning(|_, _| {
                Ok(ok(r#"{"results":[
                    {"title":"Skyfall","artist":"Adele","year":2012,"id":"1","imageUrl":"","source":"db"},
                    {"title":"Skyfall (Live)","artist":"Adele","year":null,"id":"sp1","source":"spotify"}
                ]}"#))
            });
        let client = ApiClient::new(transport, None, Some("did-1".to_string()));

        let results = client.search(" sky fall & co ", 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Skyfall");
        assert_eq!(results[0].year, Some(2012));
        assert_eq!(results[1].year, None);
    }

    #[test]
    fn test_search_failures_yield_empty_list() {
        let responses = vec![
            Ok(status(500, r#"{"detail":"boom"}"#)),
            Ok(ok("<html>not json</html>")),
            Ok(ok(r#"{"results":"nope"}"#)),
            Err(TransportError("timed out".to_string())),
        ];
        for response in responses {
            let mut transport = MockTransport::new();
            transport
                .expect_get()
                .times(1)
                .returning(move |_, _| response.clone());
            let client = ApiClient::new(transport, None, None);
            assert!(client.search("skyfall", 8).is_empty());
        }
    }

    #[test]
    fn test_feedback_body_and_swallowed_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_json()
            .withf(|url, _, body| {
                url == "/api/feedback"
                    && *body
                        == json!({ "track_id": "xyz789", "event": "open_spotify", "distinct_id": "did-1" })
            })
            .times(1)
            .returning(|_, _, _| Err(TransportError("offline".to_string())));
        let client = ApiClient::new(transport, None, Some("did-1".to_string()));

        client.send_feedback("xyz789", FeedbackEvent::OpenSpotify);
    }

    #[test]
    fn test_ping_reports_readiness() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _| url == "/api/ping")
            .returning(|_, _| {
                Ok(ok(
                    r#"{"ok":true,"recommender_ready":false,"recommender_error":"no tracks"}"#,
                ))
            });
        let client = ApiClient::new(transport, None, None);

        let status = client.ping().unwrap();
        assert!(status.ok);
        assert!(!status.recommender_ready);
        assert_eq!(status.recommender_error, "no tracks");
    }

    #[test]
    fn test_ping_error_status_is_an_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(|_, _| Ok(status(502, "bad gateway")));
        let client = ApiClient::new(transport, None, None);
        assert!(client.ping().is_err());
    }

    #[test]
    fn test_blank_distinct_id_sends_no_header() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|_, headers| headers.is_empty())
            .times(1)
            .returning(|_, _| Ok(ok(r#"{"results":[]}"#)));
        let client = ApiClient::new(transport, Some("  ".to_string()), Some(" ".to_string()));
        assert!(client.distinct_id().is_none());
        assert!(client.search("sky", 8).is_empty());
    }

    #[test]
    fn test_debounced_lane_feeds_client_results() {
        use crate::search::{SEARCH_DEBOUNCE, SeedSearchController};
        use std::time::Instant;

        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _| url == "/api/search?q=skyfall&limit=8")
            .times(1)
            .returning(|_, _| {
                Ok(ok(r#"{"results":[{"title":"Skyfall","artist":"Adele","year":2012,"id":"1"}]}"#))
            });
        let client = ApiClient::new(transport, None, None);
        let mut controller = SeedSearchController::default();

        let start = Instant::now();
        for (i, text) in ["s", "sk", "sky", "skyf", "skyfall"].iter().enumerate() {
            controller.on_input(0, text, start + std::time::Duration::from_millis(i as u64 * 50));
        }
        let fire_at = start + std::time::Duration::from_millis(200) + SEARCH_DEBOUNCE;
        for dispatch in controller.poll(fire_at) {
            let results = client.search(&dispatch.query, dispatch.limit);
            assert!(controller.apply_results(dispatch.lane, dispatch.seq, results));
        }

        let seed = controller.select(0, 0).unwrap();
        assert_eq!(seed.id.as_deref(), Some("1"));
        assert_eq!(controller.lane(0).unwrap().text(), "Skyfall — Adele (2012)");
    }
}
