//! Riot web API constants.

/// Endpoint and credential settings for the Riot web API.
pub struct RiotConfig;

impl RiotConfig {
    /// Regional API root; endpoint paths are appended to it.
    pub const BASE_URL: &'static str = "https://na.api.pvp.net/api/lol/na";
    /// Environment variable read when no key is given explicitly.
    pub const API_KEY_ENV: &'static str = "RIOT_API_KEY";
    pub const LOG_FILE_NAME: &'static str = "RiotAPI.log";
}

/// Cache collection names.
pub struct CollectionNames;

impl CollectionNames {
    pub const PLAYERS: &'static str = "players";
    pub const PLAYERS_BY_ID: &'static str = "players_by_id";
    pub const PLAYER_MATCHES: &'static str = "player_matches";
    pub const MATCHES: &'static str = "matches";
}
