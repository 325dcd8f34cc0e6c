//! Integration tests for the typed resource endpoints.

use agentdeck::api::ApiClient;
use agentdeck::models::{LeaderboardCategory, ListingType, NewAgent, NewListing, ProfileUpdate};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

#[tokio::test]
async fn test_agent_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(json_response(
            200,
            serde_json::json!([{"id": "a1", "name": "Scraper", "rating": 4.5}]),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agents/a1"))
        .respond_with(json_response(
            200,
            serde_json::json!({"id": "a1", "name": "Scraper", "description": "web scraper"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/agents"))
        .and(body_partial_json(serde_json::json!({"name": "Planner"})))
        .respond_with(json_response(
            201,
            serde_json::json!({"id": "a2", "name": "Planner"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/agents/a1/run"))
        .and(body_partial_json(serde_json::json!({"message": "hello"})))
        .respond_with(json_response(200, serde_json::json!({"response": "hi there"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();

    let agents = client.list_agents().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].rating, 4.5);

    let agent = client.get_agent("a1").await.unwrap();
    assert_eq!(agent.description.as_deref(), Some("web scraper"));

    let created = client
        .create_agent(&NewAgent {
            name: "Planner".to_string(),
            description: None,
            tools: vec![],
        })
        .await
        .unwrap();
    assert_eq!(created.id, "a2");

    let result = client.run_agent("a1", "hello").await.unwrap();
    assert_eq!(result.message.as_deref(), Some("hi there"));
}

#[tokio::test]
async fn test_marketplace_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/marketplace"))
        .respond_with(json_response(
            200,
            serde_json::json!([
                {"id": "l1", "agent_id": "a1", "listing_type": "sale", "price": 20.0}
            ]),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/marketplace"))
        .and(body_partial_json(serde_json::json!({"listing_type": "rent"})))
        .respond_with(json_response(
            201,
            serde_json::json!({"id": "l2", "agent_id": "a1", "listing_type": "rent", "price": 2.5}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/marketplace/l1/purchase"))
        .respond_with(json_response(
            200,
            serde_json::json!({"transaction_id": "t1", "status": "complete"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/marketplace/l2/rent"))
        .respond_with(json_response(200, serde_json::json!({"status": "active"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();

    let listings = client.list_listings().await.unwrap();
    assert_eq!(listings[0].listing_type, ListingType::Sale);

    let listing = client
        .create_listing(&NewListing {
            agent_id: "a1".to_string(),
            listing_type: ListingType::Rent,
            price: 2.5,
        })
        .await
        .unwrap();
    assert_eq!(listing.id, "l2");

    let receipt = client.purchase_agent("l1").await.unwrap();
    assert_eq!(receipt.id.as_deref(), Some("t1"));

    let rental = client.rent_agent("l2").await.unwrap();
    assert_eq!(rental.status.as_deref(), Some("active"));
}

#[tokio::test]
async fn test_profile_and_gamification_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(json_response(
            200,
            serde_json::json!({"id": "u1", "username": "ada"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/users/me"))
        .and(body_partial_json(serde_json::json!({"username": "lovelace"})))
        .respond_with(json_response(
            200,
            serde_json::json!({"id": "u1", "username": "lovelace"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/stats"))
        .respond_with(json_response(
            200,
            serde_json::json!({"total_earnings": 120.5, "tasks_completed": 42}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/agents"))
        .respond_with(json_response(200, serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leaderboard/earnings"))
        .respond_with(json_response(
            200,
            serde_json::json!([{"rank": 1, "user_id": "u1", "score": 120.5}]),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/achievements"))
        .respond_with(json_response(
            200,
            serde_json::json!([{"id": "ach1", "name": "First Sale", "points": 10}]),
        ))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap().with_token("tok1".to_string());

    let profile = client.fetch_profile().await.unwrap();
    assert_eq!(profile.display_name(), "ada");

    let updated = client
        .update_profile(&ProfileUpdate {
            username: Some("lovelace".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.username.as_deref(), Some("lovelace"));

    let stats = client.fetch_user_stats().await.unwrap();
    assert_eq!(stats.tasks_completed, 42);
    assert_eq!(stats.total_earnings, 120.5);

    assert!(client.fetch_my_agents().await.unwrap().is_empty());

    let board = client
        .fetch_leaderboard(LeaderboardCategory::Earnings)
        .await
        .unwrap();
    assert_eq!(board[0].display_name(), "u1");

    let achievements = client.fetch_achievements().await.unwrap();
    assert_eq!(achievements[0].points, 10);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(json_response(200, serde_json::json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).unwrap();
    client.health_check().await.unwrap();
}
