pub mod codec;
pub mod config;
pub mod engine;
pub mod grid;
pub mod interior;
pub mod pathfinder;
pub mod powerup;
pub mod state;
pub mod trail;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use prost::Message;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::game::traits::{Game, GameError, PlayerId, TickResult};
use crate::protocol::server::{ServerMessage, Welcome, server_message};
use crate::protocol::territory::{FullState, TerritoryInput};

pub use config::{TerritoryConfig, TrustMode, get_player_color};
pub use engine::{EngineError, GameEvent, GameOver, GridSnapshot, MoveOutcome, TerritoryEngine};
pub use grid::{Grid, Tile, TileOwner};
pub use powerup::PowerupKind;
pub use state::{Direction, GridPos, Player};

/// Drives a [`TerritoryEngine`] at a fixed tick rate from player directions.
pub struct TerritoryGame {
    engine: TerritoryEngine,
    /// Direction each player keeps moving in
    directions: BTreeMap<PlayerId, Direction>,
    names: HashMap<PlayerId, String>,
    rng: ChaCha8Rng,
    /// Current tick number
    tick: u32,
}

impl TerritoryGame {
    pub fn new(config: TerritoryConfig) -> Result<Self, EngineError> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            engine: TerritoryEngine::new(config)?,
            directions: BTreeMap::new(),
            names: HashMap::new(),
            rng,
            tick: 0,
        })
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn engine(&self) -> &TerritoryEngine {
        &self.engine
    }

    pub fn config(&self) -> &TerritoryConfig {
        self.engine.config()
    }

    pub fn player_name(&self, player_id: PlayerId) -> Option<&str> {
        self.names.get(&player_id).map(String::as_str)
    }

    pub fn direction(&self, player_id: PlayerId) -> Direction {
        self.directions.get(&player_id).copied().unwrap_or_default()
    }

    /// Replaces the whole board with one received from a peer. Malformed or
    /// inconsistent boards are rejected and the current state is kept.
    pub fn apply_full_state(&mut self, bytes: &[u8]) -> Result<(), GameError> {
        let state = FullState::decode(bytes)
            .map_err(|e| GameError::EncodingError(format!("Failed to decode state: {}", e)))?;
        let config = self.engine.config().clone();
        let snapshot = codec::snapshot_from_full_state(
            &state,
            (config.num_cols, config.num_rows),
            config.max_players,
        )?;
        self.engine = TerritoryEngine::from_snapshot(config, snapshot)
            .map_err(|e| GameError::EncodingError(e.to_string()))?;
        self.tick = state.tick;
        self.directions.retain(|id, _| self.engine.player(*id).is_some());
        tracing::debug!("Board replaced from full state at tick {}", state.tick);
        Ok(())
    }

    /// Spawn point for a seat: the centre of its quadrant, or the closest
    /// empty tile to it.
    fn find_spawn_position(&self, player_id: PlayerId) -> Option<GridPos> {
        let grid = self.engine.grid();
        let (cols, rows) = grid.dimensions();
        let (left, right) = ((cols / 4) as i32, (cols * 3 / 4) as i32);
        let (top, bottom) = ((rows / 4) as i32, (rows * 3 / 4) as i32);
        let preferred = match player_id % 4 {
            0 => GridPos::new(left, top),
            1 => GridPos::new(right, top),
            2 => GridPos::new(left, bottom),
            _ => GridPos::new(right, bottom),
        };

        if grid.owner(&preferred).is_empty() {
            return Some(preferred);
        }
        grid.positions()
            .filter(|pos| grid.owner(pos).is_empty())
            .min_by_key(|pos| (pos.distance(&preferred), *pos))
    }

    /// Moves one player a single step. Walking off the board is treated as
    /// standing still against a wall.
    fn step_player(&mut self, player_id: PlayerId, direction: Direction) {
        let Some(player) = self.engine.player(player_id) else {
            return;
        };
        let current = player.position;
        let next = current.moved(direction);
        let target = if self.engine.grid().in_bounds(&next) {
            next
        } else {
            current
        };

        match self.engine.apply_move(player_id, target) {
            Ok(MoveOutcome::Claimed { tiles }) => {
                tracing::info!("Player {} claimed {} tiles", player_id, tiles);
            }
            Ok(outcome) => {
                tracing::trace!("Player {} moved to {}: {:?}", player_id, target, outcome);
            }
            Err(e) => {
                tracing::warn!("Move of player {} rejected: {}", player_id, e);
            }
        }
    }
}

impl Game for TerritoryGame {
    fn tick(&mut self) -> TickResult {
        self.tick += 1;
        let mut result = TickResult::default();
        if self.engine.game_over().is_some() {
            return result;
        }

        let interval = self.engine.config().powerup_interval_ticks;
        if interval > 0 && self.tick % interval == 0 {
            self.engine.spawn_powerup(&mut self.rng);
        }

        for player_id in self.engine.player_ids() {
            let direction = self.direction(player_id);
            let steps = match self.engine.player(player_id).and_then(|p| p.powerup) {
                Some(PowerupKind::Speed) => 2,
                _ => 1,
            };
            for _ in 0..steps {
                self.step_player(player_id, direction);
            }
            if self.engine.game_over().is_some() {
                break;
            }
        }

        let events = self.engine.drain_events();
        let update = codec::encode_state_update(self.tick, &self.engine, &events);
        let message = ServerMessage {
            payload: Some(server_message::Payload::StateUpdate(update)),
        };
        result.broadcast = Some(message.encode_to_vec());

        result.game_over = events.iter().find_map(|event| match event {
            GameEvent::GameOver { winner, area } => Some((*winner, *area)),
            _ => None,
        });

        result
    }

    fn handle_input(&mut self, player_id: PlayerId, input: &[u8]) -> Result<(), GameError> {
        let territory_input = TerritoryInput::decode(input)
            .map_err(|e| GameError::InvalidInput(format!("Failed to decode input: {}", e)))?;

        if self.engine.player(player_id).is_none() {
            return Err(GameError::PlayerNotFound(player_id));
        }

        let direction = Direction::from_proto(territory_input.direction);
        self.directions.insert(player_id, direction);
        Ok(())
    }

    fn player_joined(&mut self, player_id: PlayerId, name: String) -> Result<Vec<u8>, GameError> {
        if self.engine.player(player_id).is_some() {
            return Err(GameError::InvalidState(format!(
                "Player {} is already in the game",
                player_id
            )));
        }
        let spawn_pos = self
            .find_spawn_position(player_id)
            .ok_or_else(|| GameError::InvalidState("No valid spawn position".to_string()))?;

        let config = self.engine.config();
        let size = config.starting_territory_size;
        let welcome = Welcome {
            player_id: player_id as u32,
            num_cols: config.num_cols,
            num_rows: config.num_rows,
            tick_rate_hz: config.tick_rate_hz,
            color: get_player_color(player_id),
        };

        self.engine
            .spawn(player_id, spawn_pos, size)
            .map_err(|e| GameError::InvalidState(e.to_string()))?;
        self.directions.insert(player_id, Direction::None);

        tracing::info!("Player {} ({}) joined at {}", player_id, name, spawn_pos);
        self.names.insert(player_id, name);

        let message = ServerMessage {
            payload: Some(server_message::Payload::Welcome(welcome)),
        };
        Ok(message.encode_to_vec())
    }

    fn player_left(&mut self, player_id: PlayerId) {
        self.directions.remove(&player_id);
        let name = self.names.remove(&player_id).unwrap_or_default();
        match self.engine.remove_player(player_id) {
            Ok(()) => tracing::info!("Player {} ({}) left the game", player_id, name),
            Err(e) => tracing::debug!("Ignoring leave: {}", e),
        }
    }

    fn encode_state(&self) -> Vec<u8> {
        let message = ServerMessage {
            payload: Some(server_message::Payload::FullState(codec::encode_full_state(
                self.tick,
                &self.engine,
            ))),
        };
        message.encode_to_vec()
    }

    fn tick_rate(&self) -> Duration {
        self.engine.config().tick_duration()
    }

    fn is_game_over(&self) -> bool {
        self.engine.game_over().is_some()
    }

    fn get_winners(&self) -> Vec<PlayerId> {
        self.engine.game_over().map(|g| g.winner).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::traits::Game;

    fn input(direction: Direction) -> Vec<u8> {
        TerritoryInput {
            direction: direction.to_proto(),
        }
        .encode_to_vec()
    }

    fn small_game() -> TerritoryGame {
        let mut config = TerritoryConfig::with_grid_size(20, 20);
        config.powerup_interval_ticks = 0;
        TerritoryGame::new(config).unwrap()
    }

    fn decode(bytes: &[u8]) -> server_message::Payload {
        ServerMessage::decode(bytes).unwrap().payload.unwrap()
    }

    #[test]
    fn test_game_creation() {
        let game = TerritoryGame::new(TerritoryConfig::default()).unwrap();
        assert_eq!(game.current_tick(), 0);
        assert_eq!(game.config().num_cols, 80);
        assert_eq!(game.config().num_rows, 50);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TerritoryConfig::with_grid_size(1, 1);
        assert!(matches!(TerritoryGame::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_tick_increments() {
        let mut game = small_game();
        game.tick();
        game.tick();
        assert_eq!(game.current_tick(), 2);
    }

    #[test]
    fn test_tick_rate() {
        let game = small_game();
        assert_eq!(game.tick_rate(), Duration::from_millis(100));
    }

    #[test]
    fn test_player_join_sends_welcome() {
        let mut game = small_game();

        let bytes = game.player_joined(1, "Alice".to_string()).unwrap();

        match decode(&bytes) {
            server_message::Payload::Welcome(welcome) => {
                assert_eq!(welcome.player_id, 1);
                assert_eq!(welcome.num_cols, 20);
                assert_eq!(welcome.color, get_player_color(1));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        let player = game.engine().player(1).unwrap();
        assert_eq!(player.position, GridPos::new(15, 5));
        assert_eq!(player.area, 9);
        assert_eq!(game.player_name(1), Some("Alice"));
        assert!(game.player_joined(1, "Alice".to_string()).is_err());
    }

    #[test]
    fn test_player_leave() {
        let mut game = small_game();
        game.player_joined(0, "Alice".to_string()).unwrap();

        game.player_left(0);

        assert!(game.engine().player(0).is_none());
        assert_eq!(game.engine().grid().count_owner(TileOwner::Territory(0)), 0);
    }

    #[test]
    fn test_handle_input_direction() {
        let mut game = small_game();
        game.player_joined(0, "Alice".to_string()).unwrap();

        game.handle_input(0, &input(Direction::Up)).unwrap();

        assert_eq!(game.direction(0), Direction::Up);
        assert_eq!(
            game.handle_input(3, &input(Direction::Up)),
            Err(GameError::PlayerNotFound(3))
        );
        assert!(matches!(
            game.handle_input(0, &[0xff, 0xff, 0xff]),
            Err(GameError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_full_tick_with_movement() {
        let mut game = small_game();
        game.player_joined(0, "Alice".to_string()).unwrap();
        let initial = game.engine().player(0).unwrap().position;

        game.handle_input(0, &input(Direction::Right)).unwrap();
        let result = game.tick();

        let moved = game.engine().player(0).unwrap().position;
        assert_eq!(moved, initial.offset(1, 0));
        match decode(&result.broadcast.unwrap()) {
            server_message::Payload::StateUpdate(update) => {
                assert_eq!(update.tick, 1);
                assert_eq!(update.players.len(), 1);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_board_edge_acts_as_wall() {
        let mut config = TerritoryConfig::with_grid_size(20, 20);
        config.starting_territory_size = 0;
        config.powerup_interval_ticks = 0;
        let mut game = TerritoryGame::new(config).unwrap();
        game.player_joined(0, "Alice".to_string()).unwrap();
        game.handle_input(0, &input(Direction::Up)).unwrap();

        for _ in 0..10 {
            game.tick();
        }

        let player = game.engine().player(0).unwrap();
        assert_eq!(player.position, GridPos::new(5, 0));
        assert_eq!(player.trail.len(), 6);
    }

    #[test]
    fn test_territory_claim_through_tick() {
        let mut game = small_game();
        game.player_joined(0, "Alice".to_string()).unwrap();
        let initial = game.engine().player(0).unwrap().area;

        for (direction, ticks) in [
            (Direction::Right, 3),
            (Direction::Down, 3),
            (Direction::Left, 3),
            (Direction::Up, 2),
        ] {
            game.handle_input(0, &input(direction)).unwrap();
            for _ in 0..ticks {
                game.tick();
            }
        }

        let player = game.engine().player(0).unwrap();
        assert!(!player.has_trail());
        assert!(player.area > initial, "area {} -> {}", initial, player.area);
        assert!(game.engine().check_consistency().is_ok());
    }

    #[test]
    fn test_speed_moves_two_tiles() {
        let mut game = small_game();
        game.player_joined(0, "Alice".to_string()).unwrap();
        let start = game.engine().player(0).unwrap().position;
        let mut snapshot = game.engine.snapshot();
        snapshot.players[0].powerup = Some(PowerupKind::Speed);
        game.engine = TerritoryEngine::from_snapshot(game.config().clone(), snapshot).unwrap();
        game.handle_input(0, &input(Direction::Left)).unwrap();

        game.tick();

        assert_eq!(game.engine().player(0).unwrap().position, start.offset(-2, 0));
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut config = TerritoryConfig::with_grid_size(10, 10);
        config.win_threshold = 10;
        config.powerup_interval_ticks = 0;
        let mut game = TerritoryGame::new(config).unwrap();
        game.player_joined(0, "Alice".to_string()).unwrap();

        let mut reports = 0;
        for (direction, ticks) in [
            (Direction::Right, 3),
            (Direction::Down, 3),
            (Direction::Left, 3),
            (Direction::Up, 3),
        ] {
            game.handle_input(0, &input(direction)).unwrap();
            for _ in 0..ticks {
                if game.tick().game_over.is_some() {
                    reports += 1;
                }
            }
        }

        assert_eq!(reports, 1);
        assert!(game.is_game_over());
        assert_eq!(game.get_winners(), vec![0]);
        let frozen = game.engine().grid().tiles().to_vec();
        game.handle_input(0, &input(Direction::Up)).unwrap();
        let result = game.tick();
        assert!(result.broadcast.is_none());
        assert_eq!(game.engine().grid().tiles(), frozen.as_slice());

        assert!(game.player_joined(1, "Bob".to_string()).is_err());
        game.player_left(0);
        assert_eq!(game.engine().grid().tiles(), frozen.as_slice());
        assert!(game.engine().player(1).is_none());
    }

    #[test]
    fn test_apply_full_state_mirrors_board() {
        let mut server = small_game();
        server.player_joined(0, "Alice".to_string()).unwrap();
        server.handle_input(0, &input(Direction::Down)).unwrap();
        for _ in 0..3 {
            server.tick();
        }

        let mut config = TerritoryConfig::with_grid_size(20, 20);
        config.trust = TrustMode::Networked;
        let mut mirror = TerritoryGame::new(config).unwrap();
        let full = match decode(&server.encode_state()) {
            server_message::Payload::FullState(state) => state.encode_to_vec(),
            other => panic!("unexpected payload {:?}", other),
        };

        mirror.apply_full_state(&full).unwrap();

        assert_eq!(mirror.current_tick(), 3);
        assert_eq!(mirror.engine().grid().tiles(), server.engine().grid().tiles());
        assert_eq!(mirror.engine().player(0).unwrap().trail.len(), 2);
        assert!(mirror.apply_full_state(&[0x08]).is_err());
    }
}
