//! Guild scenario tests

use serde_json::{json, Value};

use crate::harness::TestServer;

/// Test: found a guild, join it and read it back
#[tokio::test]
async fn test_create_and_join() {
    let server = TestServer::start().await.unwrap();

    let resp = server
        .post("/guilds", &json!({ "user_id": 40, "name": "Storm Callers" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let guild: Value = resp.json().await.unwrap();
    assert_eq!(guild["leader_id"], 40);
    assert_eq!(guild["members_count"], 1);

    let resp = server
        .post("/guilds/Storm Callers/join", &json!({ "user_id": 41 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let guild: Value = resp.json().await.unwrap();
    assert_eq!(guild["members_count"], 2);

    let info = server.get_json("/guilds/Storm Callers").await.unwrap();
    assert_eq!(info["guild_name"], "Storm Callers");
    assert_eq!(info["members"], json!([40, 41]));

    let profile = server.create_player(40).await.unwrap();
    assert_eq!(profile["guild"], "Storm Callers");
    assert_eq!(profile["player"]["eldergems"], 0);
}

/// Test: creation rules
#[tokio::test]
async fn test_create_rules() {
    let server = TestServer::start().await.unwrap();

    let resp = server
        .post("/guilds", &json!({ "user_id": 42, "name": "ab" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server
        .post("/guilds", &json!({ "user_id": 42, "name": "Tidewardens" }))
        .await
        .unwrap();

    // Name taken
    let resp = server
        .post("/guilds", &json!({ "user_id": 43, "name": "Tidewardens" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Already a member of one
    let resp = server
        .post("/guilds/Tidewardens/join", &json!({ "user_id": 42 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Too poor
    server.create_player(44).await.unwrap();
    server.set_eldergems(44, 500).await.unwrap();
    let resp = server
        .post("/guilds", &json!({ "user_id": 44, "name": "Paupers" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = server.get("/guilds/Paupers").await.unwrap();
    assert_eq!(resp.status(), 404);
}

/// Test: a guild holds ten members
#[tokio::test]
async fn test_guild_full() {
    let server = TestServer::start().await.unwrap();
    server
        .post("/guilds", &json!({ "user_id": 50, "name": "Packed" }))
        .await
        .unwrap();

    for user_id in 51..60 {
        let resp = server
            .post("/guilds/Packed/join", &json!({ "user_id": user_id }))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = server
        .post("/guilds/Packed/join", &json!({ "user_id": 60 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("full"));

    let resp = server
        .post("/guilds/Nowhere/join", &json!({ "user_id": 61 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
