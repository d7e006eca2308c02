//! Economy scenario tests
//!
//! Eldergem flows through the daily reward, summoning, training, the games
//! of chance and the market.

use serde_json::{json, Value};

use crate::harness::TestServer;

/// Test: a new player starts with 1000 eldergems, 50 mana and a starter beast
#[tokio::test]
async fn test_new_player_profile() {
    let server = TestServer::start().await.unwrap();

    let profile = server.create_player(10).await.unwrap();
    assert_eq!(profile["player"]["user_id"], 10);
    assert_eq!(profile["player"]["eldergems"], 1000);
    assert_eq!(profile["player"]["mana_crystals"], 50);
    assert_eq!(profile["player"]["rank"], "Novice");
    assert_eq!(profile["beast_count"], 1);
    assert_eq!(profile["strongest_beast"]["rarity"], "Common");
    assert_eq!(profile["strongest_beast"]["level"], 1);
    assert!(profile["guild"].is_null());

    // Viewing again does not create a second starter
    let again = server.create_player(10).await.unwrap();
    assert_eq!(again["beast_count"], 1);
}

/// Test: daily reward pays out once per 24 hours
#[tokio::test]
async fn test_daily_reward_once() {
    let server = TestServer::start().await.unwrap();

    let resp = server.post_empty("/players/11/daily").await.unwrap();
    assert_eq!(resp.status(), 200);
    let reward: Value = resp.json().await.unwrap();
    let gems = reward["eldergems"].as_i64().unwrap();
    let mana = reward["mana_crystals"].as_i64().unwrap();
    assert!((100..=300).contains(&gems));
    assert!((10..=30).contains(&mana));

    let profile = server.create_player(11).await.unwrap();
    assert_eq!(profile["player"]["eldergems"], 1000 + gems);
    assert_eq!(profile["player"]["mana_crystals"], 50 + mana);

    let resp = server.post_empty("/players/11/daily").await.unwrap();
    assert_eq!(resp.status(), 429);
}

/// Test: summoning costs 300 and adds a beast
#[tokio::test]
async fn test_summon() {
    let server = TestServer::start().await.unwrap();
    server.create_player(12).await.unwrap();

    let resp = server.post_empty("/players/12/summon").await.unwrap();
    assert_eq!(resp.status(), 200);
    let beast: Value = resp.json().await.unwrap();
    assert_eq!(beast["owner"], 12);
    assert_eq!(beast["level"], 1);
    assert!(beast["power"].as_u64().unwrap() >= 15);

    let profile = server.create_player(12).await.unwrap();
    assert_eq!(profile["player"]["eldergems"], 700);
    assert_eq!(profile["beast_count"], 2);

    let beasts = server.get_json("/players/12/beasts").await.unwrap();
    assert_eq!(beasts.as_array().unwrap().len(), 2);

    // Not enough for another one
    server.set_eldergems(12, 299).await.unwrap();
    let resp = server.post_empty("/players/12/summon").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("eldergems"));
}

/// Test: training charges 20 per level and grants experience
#[tokio::test]
async fn test_train() {
    let server = TestServer::start().await.unwrap();
    server.create_player(13).await.unwrap();
    let beast_id = server.starter_beast(13).await.unwrap();

    let resp = server
        .post_empty(&format!("/players/13/beasts/{}/train", beast_id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let result: Value = resp.json().await.unwrap();
    assert_eq!(result["cost"], 20);
    let gained = result["experience_gained"].as_u64().unwrap();
    assert!((10..=20).contains(&gained));
    assert_eq!(result["beast"]["experience"], gained);

    let beast = server
        .get_json(&format!("/players/13/beasts/{}", beast_id))
        .await
        .unwrap();
    assert_eq!(beast["experience"], gained);

    // Someone else's beast
    let resp = server
        .post_empty(&format!("/players/14/beasts/{}/train", beast_id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

/// Test: bets are validated and settle against the balance
#[tokio::test]
async fn test_gambling() {
    let server = TestServer::start().await.unwrap();

    let resp = server
        .post("/players/15/coinflip", &json!({ "bet": 100, "choice": "tails" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let flip: Value = resp.json().await.unwrap();
    let payout = flip["payout"].as_i64().unwrap();
    assert!(payout == 0 || payout == 190);
    assert_eq!(flip["balance"], 900 + payout);

    let resp = server
        .post("/players/15/coinflip", &json!({ "bet": 5, "choice": "heads" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = server
        .post("/players/15/wheel", &json!({ "bet": 50, "choice": "plasma" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = server
        .post("/players/15/slots", &json!({ "bet": 20 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let slots: Value = resp.json().await.unwrap();
    assert_eq!(slots["reels"].as_array().unwrap().len(), 3);
}

/// Test: buying and selling items
#[tokio::test]
async fn test_market_buy_and_sell() {
    let server = TestServer::start().await.unwrap();

    let catalog = server.get_json("/market").await.unwrap();
    assert_eq!(catalog.as_array().unwrap().len(), 8);

    let resp = server
        .post("/players/16/buy", &json!({ "item": "health potion" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let purchase: Value = resp.json().await.unwrap();
    assert_eq!(purchase["balance"], 925);
    let inventory_id = purchase["added"]["inventory_id"].as_i64().unwrap();

    let inventory = server.get_json("/players/16/inventory").await.unwrap();
    assert_eq!(inventory[0]["item_name"], "Health Potion");

    // Half the market price back
    let resp = server
        .post("/players/16/sell", &json!({ "inventory_id": inventory_id }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let sale: Value = resp.json().await.unwrap();
    assert_eq!(sale["price"], 37);
    assert_eq!(sale["balance"], 962);

    let inventory = server.get_json("/players/16/inventory").await.unwrap();
    assert!(inventory.as_array().unwrap().is_empty());

    let resp = server
        .post("/players/16/sell", &json!({ "inventory_id": inventory_id }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = server
        .post("/players/16/buy", &json!({ "item": "Dragon Egg" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

/// Test: the mana pack adds crystals instead of an inventory row
#[tokio::test]
async fn test_buy_mana_pack() {
    let server = TestServer::start().await.unwrap();

    let resp = server
        .post("/players/17/buy", &json!({ "item": "Mana Crystal Pack" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let profile = server.create_player(17).await.unwrap();
    assert_eq!(profile["player"]["mana_crystals"], 60);
    assert_eq!(profile["player"]["eldergems"], 800);

    let inventory = server.get_json("/players/17/inventory").await.unwrap();
    assert!(inventory.as_array().unwrap().is_empty());
}

/// Test: only owners may give items
#[tokio::test]
async fn test_admin_give() {
    let server = TestServer::start_with(|config| config.owner_ids = vec![1])
        .await
        .unwrap();

    let purchase: Value = server
        .post("/players/18/buy", &json!({ "item": "Power Potion" }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let inventory_id = purchase["added"]["inventory_id"].as_i64().unwrap();

    let give = json!({ "caller": 18, "inventory_id": inventory_id, "quantity": 2, "recipient": 19 });
    let resp = server.post("/admin/give", &give).await.unwrap();
    assert_eq!(resp.status(), 403);

    let give = json!({ "caller": 1, "inventory_id": inventory_id, "quantity": 2, "recipient": 19 });
    let resp = server.post("/admin/give", &give).await.unwrap();
    assert_eq!(resp.status(), 201);

    let inventory = server.get_json("/players/19/inventory").await.unwrap();
    assert_eq!(inventory[0]["item_name"], "Power Potion");
    assert_eq!(inventory[0]["quantity"], 2);

    // Owners registered in the database count too
    sqlx::query("INSERT INTO owners (user_id) VALUES (2)")
        .execute(&server.pool())
        .await
        .unwrap();
    let give = json!({ "caller": 2, "inventory_id": inventory_id, "recipient": 20 });
    let resp = server.post("/admin/give", &give).await.unwrap();
    assert_eq!(resp.status(), 201);
}
