//! Cached, quota-aware queries against the Riot web API.

mod builder;

pub use builder::{default_db_path, RiotApiBuilder};

use crate::collections::{normalize_name, RiotCollections};
use irelia_core::quota::LimiterUsage;
use irelia_core::{Clock, IreliaError, Payload, QueryOrchestrator, Resolution, Result, StoreStats};
use serde_json::Value;
use tracing::{debug, info};

/// Riot API facade over a [`QueryOrchestrator`].
///
/// Every query goes through the same cache and quota gate. Single queries
/// return the full [`Resolution`] so callers can tell a cache hit from a
/// refusal; composite queries chain them with `?`.
pub struct RiotApi {
    orchestrator: QueryOrchestrator,
    collections: RiotCollections,
}

impl RiotApi {
    pub fn builder() -> RiotApiBuilder {
        RiotApiBuilder::new()
    }

    /// Wrap an orchestrator configured elsewhere.
    pub fn from_orchestrator(orchestrator: QueryOrchestrator) -> Self {
        Self {
            orchestrator,
            collections: RiotCollections::default(),
        }
    }

    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.orchestrator
    }

    pub fn collections(&self) -> &RiotCollections {
        &self.collections
    }

    /// Summoner records for `names`, fetched in one batched call.
    ///
    /// Names are normalized to the remote's key form, and the resolution is
    /// keyed by the normalized names.
    pub async fn player_info<I, S>(&self, names: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = names
            .into_iter()
            .map(|name| normalize_name(name.as_ref()))
            .collect();
        self.orchestrator
            .resolve(&self.collections.players_by_name, keys)
            .await
    }

    /// Summoner record for one player id, in the same shape as
    /// [`player_info`](Self::player_info) returns it.
    pub async fn player_info_by_id(&self, player_id: u64) -> Resolution {
        self.orchestrator
            .resolve_one(&self.collections.players_by_id, player_id.to_string())
            .await
    }

    /// Match history of one player.
    pub async fn match_list(&self, player_id: u64) -> Resolution {
        self.orchestrator
            .resolve_one(&self.collections.player_matches, player_id.to_string())
            .await
    }

    /// Details of one match.
    pub async fn match_details(&self, match_id: u64) -> Resolution {
        self.orchestrator
            .resolve_one(&self.collections.matches, match_id.to_string())
            .await
    }

    /// Match history of the player called `name`.
    pub async fn match_list_by_name(&self, name: &str) -> Result<Payload> {
        let key = normalize_name(name);
        let players = self.player_info([name]).await;
        let id = player_id(players.payload(&key)?)?;
        debug!("Resolved {} to player {}", name, id);

        let matches = self.match_list(id).await;
        matches.payload(&id.to_string()).cloned()
    }

    /// Details of every match in the history of the player called `name`.
    ///
    /// Matches are resolved with one fan-out over the match collection, so
    /// each uncached match costs one admission from the shared gate. Matches
    /// the gate refused carry a `RateLimited` outcome in the result instead
    /// of failing the whole query.
    pub async fn all_matches_by_name(&self, name: &str) -> Result<Resolution> {
        let match_list = self.match_list_by_name(name).await?;
        let ids = match_ids(&match_list);
        info!("Resolving {} matches for {}", ids.len(), name);

        Ok(self.orchestrator.resolve(&self.collections.matches, ids).await)
    }

    /// Current consumption of each rate limit.
    pub fn quota_usage(&self) -> Vec<LimiterUsage> {
        self.orchestrator
            .gate()
            .usage(self.orchestrator.clock().now())
    }

    pub fn cache_stats(&self) -> Result<StoreStats> {
        self.orchestrator.store().stats()
    }
}

fn player_id(player: &Payload) -> Result<u64> {
    player
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| IreliaError::FetchFailed {
            message: "Player record has no numeric id".to_string(),
            status: None,
        })
}

/// Match ids listed in a match history, in listing order without repeats.
fn match_ids(match_list: &Payload) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let entries = match_list
        .get("matches")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for entry in entries {
        let id = match entry.get("matchId") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => continue,
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
