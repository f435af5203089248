//! Collections backing the Riot queries.

use crate::config::CollectionNames;
use irelia_core::{Collection, EndpointTemplate};

/// Every collection the facade queries.
///
/// Players looked up by name and by id live in separate collections, since
/// a name may normalize to the same string as an id. Both store the bare
/// summoner record.
#[derive(Debug, Clone)]
pub struct RiotCollections {
    pub players_by_name: Collection,
    pub players_by_id: Collection,
    pub player_matches: Collection,
    pub matches: Collection,
}

impl Default for RiotCollections {
    fn default() -> Self {
        Self {
            players_by_name: Collection::batch(
                CollectionNames::PLAYERS,
                EndpointTemplate::new("/v1.4/summoner/by-name/", ""),
            ),
            players_by_id: Collection::batch(
                CollectionNames::PLAYERS_BY_ID,
                EndpointTemplate::new("/v1.4/summoner/", ""),
            ),
            player_matches: Collection::single(
                CollectionNames::PLAYER_MATCHES,
                EndpointTemplate::new("/v2.2/matchlist/by-summoner/", ""),
            ),
            matches: Collection::single(
                CollectionNames::MATCHES,
                EndpointTemplate::new("/v2.2/match/", ""),
            ),
        }
    }
}

/// Key form the remote uses for summoner names: lowercase, no spaces.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
