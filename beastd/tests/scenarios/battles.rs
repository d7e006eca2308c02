//! Battle scenario tests
//!
//! Interactive battles against wild beasts over the WebSocket, and unattended
//! PvP battles over HTTP. Rewards must land in the store exactly once.

use std::time::Duration;

use beastd::api::{ClientMessage, ServerMessage};
use beastd::battle::{Action, BattleResult, BattleState, Side};
use serde_json::{json, Value};

use crate::harness::{Step, TestServer};

async fn beast(server: &TestServer, user_id: i64, beast_id: i64) -> Value {
    server
        .get_json(&format!("/players/{}/beasts/{}", user_id, beast_id))
        .await
        .unwrap()
}

async fn eldergems(server: &TestServer, user_id: i64) -> i64 {
    let profile = server.create_player(user_id).await.unwrap();
    profile["player"]["eldergems"].as_i64().unwrap()
}

/// Test: fight a wild beast to the end and collect the rewards
#[tokio::test]
async fn test_wild_battle_rewards() {
    let server = TestServer::start().await.unwrap();
    server.create_player(20).await.unwrap();
    let beast_id = server.starter_beast(20).await.unwrap();

    let mut client = server.connect(20).await.unwrap();
    let snapshot = client.start(beast_id).await.unwrap();
    assert_eq!(snapshot.turn, 0);
    assert_eq!(snapshot.state, BattleState::AwaitingAction(Side::Challenger));
    assert_eq!(snapshot.challenger.health, snapshot.challenger.max_health);
    assert_eq!(snapshot.opponent.level, 1);

    let outcome = client.fight_to_end(snapshot).await.unwrap();
    assert!(outcome.challenger.is_some());
    assert!(outcome.opponent.is_none(), "wild beasts have no owner");

    let stored = beast(&server, 20, beast_id).await;
    match outcome.result {
        BattleResult::Victory => {
            assert_eq!(stored["experience"], outcome.reward_experience);
            assert_eq!(eldergems(&server, 20).await, 1000 + outcome.reward_currency);
        }
        BattleResult::Defeat => {
            assert_eq!(stored["experience"], 0);
            assert_eq!(
                eldergems(&server, 20).await,
                1000 + outcome.consolation_currency
            );
        }
        BattleResult::Abandoned => panic!("battle should not be abandoned"),
    }
}

/// Test: actions for the wrong turn are rejected without effect
#[tokio::test]
async fn test_stale_action_rejected() {
    let server = TestServer::start().await.unwrap();
    server.create_player(21).await.unwrap();
    let beast_id = server.starter_beast(21).await.unwrap();

    let mut client = server.connect(21).await.unwrap();
    let snapshot = client.start(beast_id).await.unwrap();

    match client.act(5, Action::Attack).await.unwrap() {
        Step::Rejected(message) => assert!(message.contains("current turn")),
        other => panic!("expected rejection, got {:?}", other),
    }

    match client.act(snapshot.turn, Action::Defend).await.unwrap() {
        Step::Next(next) => {
            assert_eq!(next.turn, 2);
            assert_eq!(next.recent[0].action, Action::Defend);
        }
        Step::Finished(_) => panic!("a defend cannot end the battle"),
        Step::Rejected(message) => panic!("valid action rejected: {}", message),
    }

    // The same turn again is stale
    match client.act(snapshot.turn, Action::Attack).await.unwrap() {
        Step::Rejected(_) => {}
        other => panic!("expected rejection, got {:?}", other),
    }
}

/// Test: one battle at a time per player
#[tokio::test]
async fn test_second_battle_refused() {
    let server = TestServer::start().await.unwrap();
    server.create_player(22).await.unwrap();
    let beast_id = server.starter_beast(22).await.unwrap();

    let mut client = server.connect(22).await.unwrap();
    client.start(beast_id).await.unwrap();

    client
        .send(&ClientMessage::Start { beast_id })
        .await
        .unwrap();
    let message = client.error().await.unwrap();
    assert!(message.contains("already in a battle"), "{}", message);

    // A second connection for the same player is refused too
    let mut other = server.connect(22).await.unwrap();
    other
        .send(&ClientMessage::Start { beast_id })
        .await
        .unwrap();
    assert!(other.error().await.unwrap().contains("already in a battle"));
}

/// Test: no training while a battle is running
#[tokio::test]
async fn test_train_refused_mid_battle() {
    let server = TestServer::start().await.unwrap();
    server.create_player(27).await.unwrap();
    let beast_id = server.starter_beast(27).await.unwrap();

    let mut client = server.connect(27).await.unwrap();
    client.start(beast_id).await.unwrap();

    let resp = server
        .post_empty(&format!("/players/27/beasts/{}/train", beast_id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    assert_eq!(eldergems(&server, 27).await, 1000);
    assert_eq!(beast(&server, 27, beast_id).await["experience"], 0);
}

/// Test: starting with someone else's beast fails
#[tokio::test]
async fn test_start_with_unknown_beast() {
    let server = TestServer::start().await.unwrap();
    server.create_player(23).await.unwrap();
    let beast_id = server.starter_beast(23).await.unwrap();

    let mut client = server.connect(24).await.unwrap();
    client
        .send(&ClientMessage::Start { beast_id })
        .await
        .unwrap();
    assert!(client.error().await.unwrap().contains("not found"));

    client.send(&ClientMessage::Ping).await.unwrap();
    assert!(matches!(client.recv().await.unwrap(), ServerMessage::Pong));
}

/// Test: silence past the action timeout abandons the battle
#[tokio::test]
async fn test_timeout_abandons() {
    let server = TestServer::start_with(|config| config.battle.action_timeout_ms = 100)
        .await
        .unwrap();
    server.create_player(25).await.unwrap();
    let beast_id = server.starter_beast(25).await.unwrap();

    let mut client = server.connect(25).await.unwrap();
    client.start(beast_id).await.unwrap();

    let outcome = client.outcome().await.unwrap();
    assert_eq!(outcome.result, BattleResult::Abandoned);
    assert_eq!(beast(&server, 25, beast_id).await["experience"], 0);
    assert_eq!(eldergems(&server, 25).await, 1000);

    // The player is free again
    client.start(beast_id).await.unwrap();
}

/// Test: disconnecting abandons the battle and frees the player
#[tokio::test]
async fn test_disconnect_abandons() {
    let server = TestServer::start().await.unwrap();
    server.create_player(26).await.unwrap();
    let beast_id = server.starter_beast(26).await.unwrap();

    let mut client = server.connect(26).await.unwrap();
    client.start(beast_id).await.unwrap();
    client.close().await.unwrap();
    drop(client);

    let mut restarted = false;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut retry = server.connect(26).await.unwrap();
        retry
            .send(&ClientMessage::Start { beast_id })
            .await
            .unwrap();
        if let ServerMessage::Started { .. } = retry.recv().await.unwrap() {
            restarted = true;
            break;
        }
    }
    assert!(restarted, "player should be released after disconnect");
    assert_eq!(eldergems(&server, 26).await, 1000);
}

/// Test: unattended PvP battle pays the winner's owner
#[tokio::test]
async fn test_pvp_battle() {
    let server = TestServer::start().await.unwrap();
    server.create_player(30).await.unwrap();
    server.create_player(31).await.unwrap();
    let attacker = server.starter_beast(30).await.unwrap();
    let defender = server.starter_beast(31).await.unwrap();

    let resp = server
        .post("/players/30/battles", &json!({ "beast_id": attacker, "opponent": 31 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let outcome: Value = resp.json().await.unwrap();
    assert!(!outcome["rounds"].as_array().unwrap().is_empty());

    let experience = outcome["reward_experience"].as_i64().unwrap();
    let currency = outcome["reward_currency"].as_i64().unwrap();
    let consolation = outcome["consolation_currency"].as_i64().unwrap();

    match outcome["result"].as_str().unwrap() {
        "victory" => {
            assert_eq!(beast(&server, 30, attacker).await["experience"], experience);
            assert_eq!(beast(&server, 31, defender).await["experience"], 0);
            assert_eq!(eldergems(&server, 30).await, 1000 + currency);
            assert_eq!(eldergems(&server, 31).await, 1000);
        }
        "defeat" => {
            assert_eq!(beast(&server, 30, attacker).await["experience"], 0);
            assert_eq!(beast(&server, 31, defender).await["experience"], experience);
            assert_eq!(eldergems(&server, 30).await, 1000 + consolation);
            assert_eq!(eldergems(&server, 31).await, 1000 + currency);
        }
        other => panic!("unexpected result {}", other),
    }
}

/// Test: PvP request validation
#[tokio::test]
async fn test_pvp_validation() {
    let server = TestServer::start().await.unwrap();
    server.create_player(32).await.unwrap();
    let beast_id = server.starter_beast(32).await.unwrap();

    let resp = server
        .post("/players/32/battles", &json!({ "beast_id": beast_id, "opponent": 32 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Opponent without beasts
    let resp = server
        .post("/players/32/battles", &json!({ "beast_id": beast_id, "opponent": 33 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no beast"));

    // Beast not owned by the challenger
    server.create_player(34).await.unwrap();
    let resp = server
        .post("/players/34/battles", &json!({ "beast_id": beast_id, "opponent": 32 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
