use std::time::Duration;

/// Seat number of a player inside one game (0..max_players).
pub type PlayerId = u8;

pub trait TickRate {
    fn tick_duration(&self) -> Duration;

    fn ticks_per_second(&self) -> u32 {
        (1.0 / self.tick_duration().as_secs_f64()) as u32
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    /// Player not found in game state
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),
    /// Invalid input received
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Game is not in a valid state for the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Everything a single tick produced that the transport has to deliver.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Encoded message for every connected player
    pub broadcast: Option<Vec<u8>>,
    /// Messages addressed to one player only
    pub player_updates: Vec<(PlayerId, Vec<u8>)>,
    /// Set on the tick the game ended: (winner, winner area)
    pub game_over: Option<(PlayerId, u32)>,
}

pub trait Game: Send + Sync {
    fn tick(&mut self) -> TickResult;
    fn handle_input(&mut self, player_id: PlayerId, input: &[u8]) -> Result<(), GameError>;
    fn player_joined(&mut self, player_id: PlayerId, name: String) -> Result<Vec<u8>, GameError>;
    fn player_left(&mut self, player_id: PlayerId);
    fn encode_state(&self) -> Vec<u8>;
    fn tick_rate(&self) -> Duration;
    fn is_game_over(&self) -> bool {
        false
    }
    fn get_winners(&self) -> Vec<PlayerId> {
        Vec::new()
    }
}
