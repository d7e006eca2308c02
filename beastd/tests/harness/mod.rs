//! Integration test harness
//!
//! - `TestServer` - real server on a random port with an on-disk database
//! - `BattleClient` - WebSocket client for interactive battles
//!
//! # Example
//!
//! ```rust,ignore
//! let server = TestServer::start().await.unwrap();
//! server.create_player(1).await.unwrap();
//! let beast = server.starter_beast(1).await.unwrap();
//!
//! let mut client = server.connect(1).await.unwrap();
//! let snapshot = client.start(beast).await.unwrap();
//! let outcome = client.fight_to_end(snapshot).await.unwrap();
//! ```

#![allow(dead_code)]

mod client;
mod server;

pub use client::{BattleClient, Step};
pub use server::TestServer;
