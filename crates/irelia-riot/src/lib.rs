//! Irelia Riot - cached, quota-aware access to the League of Legends web API.
//!
//! Built on `irelia-core`: summoner, match-history and match queries are
//! answered from a local SQLite cache while fresh, and otherwise fetched
//! through one shared quota gate sized for a development key.
//!
//! # Example
//!
//! ```rust,ignore
//! use irelia_riot::{logging, RiotApi};
//!
//! #[tokio::main]
//! async fn main() -> irelia_core::Result<()> {
//!     logging::init(&logging::LogConfig::default())?;
//!
//!     // Reads RIOT_API_KEY
//!     let api = RiotApi::builder().build()?;
//!
//!     let history = api.match_list_by_name("Faker").await?;
//!     println!("{} games", history["totalGames"]);
//!
//!     let matches = api.all_matches_by_name("Faker").await?;
//!     println!("{} refused by quota", matches.failed_keys().len());
//!
//!     Ok(())
//! }
//! ```

pub mod collections;
pub mod config;
pub mod logging;

mod api;

pub use api::{default_db_path, RiotApi, RiotApiBuilder};
pub use collections::{normalize_name, RiotCollections};
pub use config::{CollectionNames, RiotConfig};
pub use logging::LogConfig;
