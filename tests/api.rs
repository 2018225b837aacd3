use deal_hunter::config::Config;
use deal_hunter::deals::{Deal, DealStatus};
use deal_hunter::server::{build_router, ApiState};
use deal_hunter::store::DealStore;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

fn seed_deals() -> Vec<Deal> {
    vec![
        Deal::new("nike", "Nike", "Endorsement Partnership with Nike")
            .with_category("Sports")
            .with_value_range("$50K-100K")
            .with_score(9.2)
            .with_tags(&["Sports", "Endorsement"])
            .with_deadline("2024-03-01"),
        Deal::new("gatorade", "Gatorade", "Sponsorship Partnership with Gatorade")
            .with_category("Sports")
            .with_value_range("$10K")
            .with_score(6.0)
            .with_tags(&["Sports", "Sponsorship"])
            .with_status(DealStatus::Closed),
        Deal::new("patagonia", "Patagonia", "Brand Ambassador Partnership with Patagonia")
            .with_category("Outdoor")
            .with_value_range("$30000")
            .with_score(7.5)
            .with_tags(&["Outdoor", "Campaign"]),
    ]
}

async fn spawn_app() -> (String, TempDir) {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp_dir.path().join("deals.db");
    DealStore::open(&db_path)
        .expect("Failed to open store")
        .upsert_deals(&seed_deals())
        .expect("Failed to seed store");

    let mut config = Config::default();
    config.source.default = "store".to_string();
    config.storage.db_path = db_path.to_string_lossy().to_string();

    let app = build_router(ApiState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    (base_url, tmp_dir)
}

async fn post(base_url: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let response = Client::new()
        .post(format!("{}{}", base_url, path))
        .json(&body)
        .send()
        .await
        .expect("request failed");
    let status = response.status();
    let body: Value = response.json().await.expect("json body");
    (status, body)
}

#[tokio::test]
async fn health_reports_ok() {
    let (base_url, _tmp) = spawn_app().await;
    let body: Value = Client::new()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("json body");
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn query_filters_store_deals_and_summarizes_results() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/query",
        json!({ "filters": { "minScore": 7, "maxScore": 10, "category": "all" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["data"]["results"].as_array().expect("results");
    let ids: Vec<&str> = results.iter().filter_map(|d| d["id"].as_str()).collect();
    assert_eq!(ids, vec!["nike", "patagonia"]);
    assert_eq!(body["data"]["analytics"]["totalDeals"], 2);
    assert_eq!(body["data"]["analytics"]["categoryDistribution"]["Outdoor"], 1);
}

#[tokio::test]
async fn inline_deals_override_configured_source() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/query",
        json!({
            "deals": [{
                "id": "inline",
                "brand": "Red Bull",
                "title": "Sponsorship",
                "valueRange": "$30K-$300K",
                "matchScore": 3
            }],
            "filters": { "search": "red" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"][0]["id"], "inline");
}

#[tokio::test]
async fn invalid_filters_are_bad_requests() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/query",
        json!({ "filters": { "valueRangeBucket": "5-10" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn pipeline_counts_every_stage() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(&base_url, "/v1/pipeline", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalDeals"], 3);
    assert_eq!(body["data"]["stageDistribution"]["closed"], 1);
    assert_eq!(body["data"]["stageDistribution"]["new"], 2);
    assert_eq!(body["data"]["stageDistribution"]["rejected"], 0);
}

#[tokio::test]
async fn export_returns_rendered_content() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(&base_url, "/v1/export", json!({ "format": "csv" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["format"], "csv");
    let content = body["data"]["content"].as_str().expect("content");
    assert!(content.starts_with("Brand,Title,Category"));
    assert_eq!(content.lines().count(), 4);

    let (status, _) = post(&base_url, "/v1/export", json!({ "format": "pdf" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_updates_are_persisted_and_logged() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/deals/nike/status",
        json!({ "status": "negotiating" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deal"]["status"], "negotiating");
    assert_eq!(body["data"]["change"]["from"], "new");

    let (_, body) = post(
        &base_url,
        "/v1/query",
        json!({ "filters": { "status": "negotiating" } }),
    )
    .await;
    assert_eq!(body["data"]["results"][0]["id"], "nike");

    let activity: Value = Client::new()
        .get(format!("{}/v1/activity?deal=nike", base_url))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("json body");
    assert_eq!(activity["data"]["changes"][0]["to"], "negotiating");
}

#[tokio::test]
async fn unknown_deal_status_update_is_not_found() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/deals/missing/status",
        json!({ "status": "closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, _) = post(
        &base_url,
        "/v1/deals/nike/status",
        json!({ "status": "archived" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn outreach_drafts_email_for_stored_deal() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(
        &base_url,
        "/v1/outreach",
        json!({ "dealId": "nike", "template": "quick", "talent": { "name": "Jordan Lee" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["template"], "quick");
    assert_eq!(body["data"]["recipient"], "partnerships@brand.com");
    assert_eq!(
        body["data"]["subject"],
        "Partnership Opportunity: Jordan Lee x Nike"
    );

    let (status, body) = post(&base_url, "/v1/outreach", json!({ "dealId": "nike" })).await;
    assert_eq!(status, StatusCode::OK);
    let text = body["data"]["body"].as_str().expect("body");
    assert!(text.contains("Alex Rodriguez"));
    assert!(text.contains("9.2/10 match score"));

    let (status, _) = post(&base_url, "/v1/outreach", json!({ "dealId": "missing" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post(
        &base_url,
        "/v1/outreach",
        json!({ "dealId": "nike", "template": "newsletter" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn followups_cover_open_deals_only() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(&base_url, "/v1/followups", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().expect("tasks");
    let mut ids: Vec<&str> = tasks.iter().filter_map(|t| t["dealId"].as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["nike", "patagonia"]);

    let templates: Value = Client::new()
        .get(format!("{}/v1/outreach/templates", base_url))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("json body");
    assert_eq!(templates["data"].as_array().expect("templates").len(), 4);
    assert_eq!(templates["data"][0]["kind"], "professional");
    assert_eq!(templates["data"][0]["variables"][0], "BRAND");
}

#[tokio::test]
async fn json_export_carries_talent_profile() {
    let (base_url, _tmp) = spawn_app().await;
    let (status, body) = post(&base_url, "/v1/export", json!({ "format": "json" })).await;
    assert_eq!(status, StatusCode::OK);
    let bundle: Value =
        serde_json::from_str(body["data"]["content"].as_str().expect("content")).expect("bundle");
    assert_eq!(bundle["talent"]["name"], "Alex Rodriguez");
    assert_eq!(bundle["talent"]["followers"], 2_500_000);
    assert_eq!(bundle["deals"].as_array().expect("deals").len(), 3);
}
