//! Integration tests for RiotApi against a local stand-in for the Riot API.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use irelia_core::{ErrorKind, KeyOutcome, ManualClock, QuotaGate, RateLimiter, WriteBack};
use irelia_riot::RiotApi;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn summoner(name: &str) -> Option<Value> {
    let (id, display) = match name {
        "faker" => (1001, "Faker"),
        "doublelift" => (1002, "Double Lift"),
        "bjergsen" => (1003, "Bjergsen"),
        _ => return None,
    };
    Some(json!({ "id": id, "name": display, "summonerLevel": 30 }))
}

fn match_list(player_id: &str) -> Option<Value> {
    let ids: &[u64] = match player_id {
        "1001" => &[2001, 2002, 2003],
        "1002" => &[2001],
        "1003" => &[],
        _ => return None,
    };
    let matches: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "matchId": id, "queue": "RANKED_SOLO_5x5" }))
        .collect();
    Some(json!({ "matches": matches, "totalGames": ids.len() }))
}

async fn riot(State(hits): State<Arc<AtomicUsize>>, uri: Uri) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    if uri.query() != Some("api_key=test-key") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path();
    let body = if let Some(names) = path.strip_prefix("/v1.4/summoner/by-name/") {
        let found: Map<String, Value> = names
            .split(',')
            .filter_map(|name| summoner(name).map(|s| (name.to_string(), s)))
            .collect();
        (!found.is_empty()).then_some(Value::Object(found))
    } else if let Some(ids) = path.strip_prefix("/v1.4/summoner/") {
        let found: Map<String, Value> = ["faker", "doublelift", "bjergsen"]
            .into_iter()
            .filter_map(summoner)
            .map(|s| (s["id"].to_string(), s))
            .filter(|(id, _)| ids.split(',').any(|wanted| wanted == id))
            .collect();
        (!found.is_empty()).then_some(Value::Object(found))
    } else if let Some(id) = path.strip_prefix("/v2.2/matchlist/by-summoner/") {
        match_list(id)
    } else if let Some(id) = path.strip_prefix("/v2.2/match/") {
        id.parse::<u64>()
            .ok()
            .map(|id| json!({ "matchId": id, "matchDuration": 1800 }))
    } else {
        None
    };

    match body {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start the stand-in server; returns its base URL and request counter.
async fn spawn_riot() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(riot).with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    (format!("http://{}", addr), hits)
}

async fn api_with_gate(gate: QuotaGate) -> (RiotApi, Arc<AtomicUsize>) {
    let (base, hits) = spawn_riot().await;
    let api = RiotApi::builder()
        .base_url(base)
        .api_key("test-key")
        .in_memory()
        .gate(gate)
        .clock(Arc::new(ManualClock::default()))
        .build()
        .unwrap();
    (api, hits)
}

#[tokio::test]
async fn test_player_info_normalizes_and_caches() {
    let (api, hits) = api_with_gate(QuotaGate::unlimited()).await;

    let players = api.player_info(["Faker", "Double Lift"]).await;
    assert!(players.is_complete());
    assert_eq!(players.payload("faker").unwrap()["id"], 1001);
    assert_eq!(players.payload("doublelift").unwrap()["id"], 1002);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let again = api.player_info(["FAKER"]).await;
    assert_eq!(again.cache_hits(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_player_info_by_id_and_match_details() {
    let (api, hits) = api_with_gate(QuotaGate::unlimited()).await;

    let player = api.player_info_by_id(1002).await;
    assert_eq!(player.payload("1002").unwrap()["name"], "Double Lift");

    let details = api.match_details(2001).await;
    assert_eq!(details.payload("2001").unwrap()["matchDuration"], 1800);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_player_by_id_matches_by_name_shape() {
    let (api, hits) = api_with_gate(QuotaGate::unlimited()).await;

    let by_id = api.player_info_by_id(1002).await;
    let by_name = api.player_info(["doublelift"]).await;
    assert_eq!(
        by_id.payload("1002").unwrap(),
        by_name.payload("doublelift").unwrap()
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // A name spelled like a cached id still goes to the by-name endpoint.
    let numeric_name = api.player_info(["1002"]).await;
    assert_eq!(numeric_name.outcome("1002"), Some(&KeyOutcome::Missing));
    assert_eq!(numeric_name.cache_hits(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_match_list_by_name() {
    let (api, hits) = api_with_gate(QuotaGate::unlimited()).await;

    let history = api.match_list_by_name("Faker").await.unwrap();

    assert_eq!(history["totalGames"], 3);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unknown_player_is_not_found() {
    let (api, _) = api_with_gate(QuotaGate::unlimited()).await;

    let err = api.match_list_by_name("nobody").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_all_matches_by_name_within_quota() {
    let gate = QuotaGate::new(vec![RateLimiter::new(10, Duration::from_secs(5))]);
    let (api, hits) = api_with_gate(gate).await;

    let matches = api.all_matches_by_name("faker").await.unwrap();
    assert!(matches.is_complete());
    assert_eq!(matches.found().count(), 3);
    assert_eq!(matches.write_back(), &WriteBack::Stored(3));
    // Player, match list, then one call per match.
    assert_eq!(hits.load(Ordering::SeqCst), 5);

    let cached = api.all_matches_by_name("faker").await.unwrap();
    assert_eq!(cached.cache_hits(), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_all_matches_by_name_reports_refused_matches() {
    let gate = QuotaGate::new(vec![RateLimiter::new(4, Duration::from_secs(5))]);
    let (api, hits) = api_with_gate(gate).await;

    let matches = api.all_matches_by_name("faker").await.unwrap();

    assert_eq!(matches.found().count(), 2);
    let refused = matches.failed_keys();
    assert_eq!(refused.len(), 1);
    assert!(matches!(
        matches.outcome(refused[0]),
        Some(KeyOutcome::RateLimited { retry_at: Some(_) })
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert_eq!(api.quota_usage()[0].in_window, 4);
}

#[tokio::test]
async fn test_player_without_matches_resolves_nothing() {
    let (api, hits) = api_with_gate(QuotaGate::unlimited()).await;

    let matches = api.all_matches_by_name("Bjergsen").await.unwrap();

    assert!(matches.outcomes().is_empty());
    assert_eq!(matches.remote_calls(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sqlite_cache_at_custom_path() {
    let (base, hits) = spawn_riot().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("irelia.sqlite");

    let api = RiotApi::builder()
        .base_url(&base)
        .api_key("test-key")
        .db_path(&db_path)
        .gate(QuotaGate::unlimited())
        .build()
        .unwrap();
    assert!(db_path.exists());

    api.match_list_by_name("doublelift").await.unwrap();
    let stats = api.cache_stats().unwrap();
    assert_eq!(stats.total_entries, 2);
    drop(api);

    let reopened = RiotApi::builder()
        .base_url(&base)
        .api_key("test-key")
        .db_path(&db_path)
        .build()
        .unwrap();
    reopened.match_list_by_name("doublelift").await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
