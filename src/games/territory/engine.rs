use std::collections::{BTreeMap, BTreeSet, HashSet};

use rand::Rng;

use crate::game::traits::PlayerId;

use super::config::{ConfigError, TerritoryConfig, TrustMode};
use super::grid::{Grid, Tile, TileOwner};
use super::interior::{self, FillOutcome};
use super::pathfinder;
use super::powerup::{PowerupField, PowerupKind};
use super::state::{GridPos, Player};

/// Something observable happened to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    TileChanged { pos: GridPos, owner: TileOwner },
    AreaChanged { player: PlayerId, area: u32 },
    GameOver { winner: PlayerId, area: u32 },
    PowerupSpawned { pos: GridPos, kind: PowerupKind },
    PowerupCollected { player: PlayerId, kind: PowerupKind },
}

/// How a single move was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game is over, nothing changed
    Ignored,
    /// First position of a new player
    Spawned,
    /// Requested the current position; only trail ageing ran
    Stationary,
    /// Immediate reversal onto own trail, treated as a wall
    Blocked,
    /// Trail grew by one tile
    Extended,
    /// Ran through another player's trail and erased it
    Cut { victim: PlayerId },
    /// Hit another player's territory and lost the trail
    Bounced,
    /// Trail or loop converted into territory
    Claimed { tiles: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub winner: PlayerId,
    pub area: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("player {0} is not in the game")]
    UnknownPlayer(PlayerId),
    #[error("player {0} already joined")]
    PlayerExists(PlayerId),
    #[error("player id {id} exceeds the {max} available seats")]
    SeatOutOfRange { id: PlayerId, max: usize },
    #[error("position {0} is outside the board")]
    OutOfBounds(GridPos),
    #[error("spawn tile {0} is already taken")]
    SpawnOccupied(GridPos),
    #[error("the game is over")]
    GameOver,
    #[error("player {player} cannot move from {from} to {to} in one step")]
    NonAdjacentMove {
        player: PlayerId,
        from: GridPos,
        to: GridPos,
    },
    #[error("trail of player {player} does not connect {from} to {to}")]
    LoopNotConnected {
        player: PlayerId,
        from: GridPos,
        to: GridPos,
    },
    #[error("board and player state disagree: {0}")]
    Desync(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Per-player part of a [`GridSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: GridPos,
    pub powerup: Option<PowerupKind>,
}

/// Everything needed to rebuild an engine: the board plus where each
/// player stands. Trails and areas are re-derived from the tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    pub cols: u32,
    pub rows: u32,
    pub tiles: Vec<Tile>,
    pub players: Vec<PlayerSnapshot>,
    pub powerups: Vec<(GridPos, PowerupKind)>,
}

/// The territory/trail state machine for one game.
///
/// Owns the board and every player. All mutation goes through
/// [`TerritoryEngine::apply_move`] and friends, one move at a time.
#[derive(Debug)]
pub struct TerritoryEngine {
    config: TerritoryConfig,
    grid: Grid,
    players: BTreeMap<PlayerId, Player>,
    powerups: PowerupField,
    game_over: Option<GameOver>,
    events: Vec<GameEvent>,
}

impl TerritoryEngine {
    pub fn new(config: TerritoryConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            grid: Grid::new(config.num_cols, config.num_rows),
            config,
            players: BTreeMap::new(),
            powerups: PowerupField::new(),
            game_over: None,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &TerritoryConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Players in ascending id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn game_over(&self) -> Option<GameOver> {
        self.game_over
    }

    pub fn powerup_at(&self, pos: &GridPos) -> Option<PowerupKind> {
        self.powerups.get(pos)
    }

    /// Pickups lying on the board, ordered by position.
    pub fn powerups(&self) -> Vec<(GridPos, PowerupKind)> {
        self.powerups.sorted()
    }

    /// Takes every event recorded since the previous call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Adds a player at `pos`.
    ///
    /// With `starting_territory_size == 0` the start tile becomes the first
    /// trail tile. Otherwise a square of that side centred on `pos` becomes
    /// territory, clipped to the board and skipping tiles someone else holds.
    pub fn spawn(
        &mut self,
        id: PlayerId,
        pos: GridPos,
        starting_territory_size: u32,
    ) -> Result<(), EngineError> {
        if self.game_over.is_some() {
            return Err(EngineError::GameOver);
        }
        if (id as usize) >= self.config.max_players {
            return Err(EngineError::SeatOutOfRange {
                id,
                max: self.config.max_players,
            });
        }
        if self.players.contains_key(&id) {
            return Err(EngineError::PlayerExists(id));
        }
        if !self.grid.in_bounds(&pos) {
            return Err(EngineError::OutOfBounds(pos));
        }
        if !self.grid.owner(&pos).is_empty() {
            return Err(EngineError::SpawnOccupied(pos));
        }

        let mut player = Player::new(id, pos);
        if starting_territory_size == 0 {
            player.trail.push(&mut self.grid, pos);
        } else {
            let half = (starting_territory_size / 2) as i32;
            for dy in -half..=half {
                for dx in -half..=half {
                    let tile = pos.offset(dx, dy);
                    if self.grid.try_get(&tile).is_some_and(|t| t.owner.is_empty()) {
                        self.grid.set(&tile, TileOwner::Territory(id));
                    }
                }
            }
        }
        self.players.insert(id, player);
        if starting_territory_size > 0 {
            self.fill(id);
        }

        tracing::info!("Player {} spawned at {}", id, pos);
        self.publish(Some(id));
        Ok(())
    }

    /// Removes a player. Every tile they held, territory and trail, goes
    /// back to empty ground.
    ///
    /// Once the game is over the board is final: the player keeps their
    /// record and tiles, and only the caller's seat bookkeeping changes.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), EngineError> {
        if self.game_over.is_some() {
            if !self.players.contains_key(&id) {
                return Err(EngineError::UnknownPlayer(id));
            }
            tracing::debug!("Player {} left after game over, board kept", id);
            return Ok(());
        }
        let mut player = self.players.remove(&id).ok_or(EngineError::UnknownPlayer(id))?;
        player.trail.clear(&mut self.grid);
        for pos in self.grid.positions_of(TileOwner::Territory(id)) {
            self.grid.set(&pos, TileOwner::Empty);
        }

        tracing::info!("Player {} removed, {} tiles released", id, player.area);
        self.publish(None);
        Ok(())
    }

    /// Applies one move of one player. This is the single entry point of the
    /// state machine.
    pub fn apply_move(
        &mut self,
        player_id: PlayerId,
        requested: GridPos,
    ) -> Result<MoveOutcome, EngineError> {
        if self.game_over.is_some() {
            tracing::debug!("Ignoring move of player {}: game over", player_id);
            return Ok(MoveOutcome::Ignored);
        }
        if !self.grid.in_bounds(&requested) {
            return Err(EngineError::OutOfBounds(requested));
        }
        let Some(player) = self.players.get(&player_id) else {
            self.spawn(player_id, requested, 0)?;
            return Ok(MoveOutcome::Spawned);
        };

        let current = player.position;
        if requested != current && !requested.is_adjacent(&current) {
            return Err(EngineError::NonAdjacentMove {
                player: player_id,
                from: current,
                to: requested,
            });
        }

        self.age_trail(player_id);

        let outcome = if requested == current {
            MoveOutcome::Stationary
        } else {
            match self.grid.owner(&requested) {
                TileOwner::Territory(owner) if owner == player_id => {
                    self.enter_own_territory(player_id, requested)
                }
                TileOwner::Trail(owner) if owner == player_id => {
                    if self.is_reversal(player_id, requested) {
                        MoveOutcome::Blocked
                    } else {
                        match self.close_loop(player_id, requested) {
                            Ok(outcome) => outcome,
                            Err(err) => {
                                // Ageing already ran; publish what it changed.
                                self.publish(None);
                                return Err(err);
                            }
                        }
                    }
                }
                TileOwner::Trail(victim) => {
                    self.cut_trail(victim);
                    self.extend_trail(player_id, requested);
                    MoveOutcome::Cut { victim }
                }
                TileOwner::Territory(_) => {
                    self.bounce(player_id, requested);
                    MoveOutcome::Bounced
                }
                TileOwner::Empty => {
                    self.extend_trail(player_id, requested);
                    MoveOutcome::Extended
                }
            }
        };

        tracing::debug!("Player {} -> {}: {:?}", player_id, requested, outcome);
        self.publish(Some(player_id));
        Ok(outcome)
    }

    /// Applies a batch of moves in ascending player id order, so that claims
    /// racing on the same tick resolve the same way every time.
    pub fn apply_moves(
        &mut self,
        moves: &[(PlayerId, GridPos)],
    ) -> Vec<(PlayerId, Result<MoveOutcome, EngineError>)> {
        let mut ordered = moves.to_vec();
        ordered.sort_by_key(|(id, _)| *id);
        ordered
            .into_iter()
            .map(|(id, pos)| (id, self.apply_move(id, pos)))
            .collect()
    }

    /// Position update received from the network. A straight two-tile jump
    /// (speed pickup) is replayed as two single steps through the midpoint.
    pub fn apply_update(
        &mut self,
        player_id: PlayerId,
        pos: GridPos,
    ) -> Result<MoveOutcome, EngineError> {
        if let Some(player) = self.players.get(&player_id) {
            let from = player.position;
            let delta = pos - from;
            if pos.distance(&from) == 2 && (delta.x == 0 || delta.y == 0) {
                let mid = from.offset(delta.x / 2, delta.y / 2);
                self.apply_move(player_id, mid)?;
            }
        }
        self.apply_move(player_id, pos)
    }

    /// Clears every pickup on the board and in players' hands, then drops a
    /// new one on a random empty tile.
    pub fn spawn_powerup<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(GridPos, PowerupKind)> {
        if self.game_over.is_some() {
            return None;
        }
        self.powerups.clear();
        for player in self.players.values_mut() {
            player.powerup = None;
        }

        let placed = self.powerups.place_random(&self.grid, rng);
        if let Some((pos, kind)) = placed {
            tracing::debug!("Powerup {:?} spawned at {}", kind, pos);
            self.events.push(GameEvent::PowerupSpawned { pos, kind });
        }
        placed
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let (cols, rows) = self.grid.dimensions();
        GridSnapshot {
            cols,
            rows,
            tiles: self.grid.tiles().to_vec(),
            players: self
                .players
                .values()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    position: p.position,
                    powerup: p.powerup,
                })
                .collect(),
            powerups: self.powerups.sorted(),
        }
    }

    /// Rebuilds an engine purely from a board snapshot.
    pub fn from_snapshot(
        config: TerritoryConfig,
        snapshot: GridSnapshot,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if (snapshot.cols, snapshot.rows) != (config.num_cols, config.num_rows) {
            return Err(EngineError::Desync(format!(
                "snapshot is {}x{}, configured board is {}x{}",
                snapshot.cols, snapshot.rows, config.num_cols, config.num_rows
            )));
        }
        let grid = Grid::from_tiles(snapshot.cols, snapshot.rows, snapshot.tiles)
            .ok_or_else(|| EngineError::Desync("tile count does not match board".to_string()))?;

        let mut players = BTreeMap::new();
        for p in snapshot.players {
            if (p.id as usize) >= config.max_players {
                return Err(EngineError::SeatOutOfRange {
                    id: p.id,
                    max: config.max_players,
                });
            }
            if !grid.in_bounds(&p.position) {
                return Err(EngineError::OutOfBounds(p.position));
            }
            let mut player = Player::new(p.id, p.position);
            player.powerup = p.powerup;
            if players.insert(p.id, player).is_some() {
                return Err(EngineError::PlayerExists(p.id));
            }
        }

        let mut powerups = PowerupField::new();
        for (pos, kind) in snapshot.powerups {
            if !grid.in_bounds(&pos) {
                return Err(EngineError::OutOfBounds(pos));
            }
            powerups.insert(pos, kind);
        }

        let mut engine = Self {
            config,
            grid,
            players,
            powerups,
            game_over: None,
            events: Vec::new(),
        };
        engine.resynchronize();
        engine.check_consistency()?;
        Ok(engine)
    }

    /// Re-derives every trail, history and area from the board alone.
    pub fn resynchronize(&mut self) {
        for player in self.players.values_mut() {
            player.trail.rebuild(&self.grid);
            player.area = self.grid.count_owner(TileOwner::Territory(player.id));
            if player.trail.last() == Some(player.position) {
                let behind = player.trail.before_last().unwrap_or(player.position);
                player.previous_positions = [behind, behind];
            } else {
                player.previous_positions = [player.position; 2];
            }
        }
        self.grid.take_changes();
        tracing::debug!("Resynchronized {} players from board", self.players.len());
    }

    /// Verifies that the board and the player records agree: every claimed
    /// tile belongs to a known player, each trail tracker matches its trail
    /// tiles exactly, and each area matches the territory count.
    pub fn check_consistency(&self) -> Result<(), EngineError> {
        for pos in self.grid.positions() {
            if let Some(owner) = self.grid.owner(&pos).player() {
                if !self.players.contains_key(&owner) {
                    return Err(EngineError::Desync(format!(
                        "tile {} belongs to unknown player {}",
                        pos, owner
                    )));
                }
            }
        }

        for player in self.players.values() {
            let on_board: BTreeSet<GridPos> = self
                .grid
                .positions_of(TileOwner::Trail(player.id))
                .into_iter()
                .collect();
            let tracked: BTreeSet<GridPos> = player.trail.positions().collect();
            if tracked.len() != player.trail.len() || on_board != tracked {
                return Err(EngineError::Desync(format!(
                    "trail of player {} has {} tracked tiles, {} on the board",
                    player.id,
                    player.trail.len(),
                    on_board.len()
                )));
            }
            let area = self.grid.count_owner(TileOwner::Territory(player.id));
            if area != player.area {
                return Err(EngineError::Desync(format!(
                    "player {} area is {}, board says {}",
                    player.id, player.area, area
                )));
            }
        }
        Ok(())
    }

    fn trail_limit(&self, player: &Player) -> u32 {
        match player.powerup {
            Some(PowerupKind::LongTrail) => {
                self.config.trail_max_len + self.config.trail_powerup_len
            }
            _ => self.config.trail_max_len,
        }
    }

    fn age_trail(&mut self, player_id: PlayerId) {
        let Some(player) = self.players.get(&player_id) else {
            return;
        };
        let limit = self.trail_limit(player);
        if let Some(player) = self.players.get_mut(&player_id) {
            let evicted = player.trail.age_tick(&mut self.grid, limit);
            if !evicted.is_empty() {
                tracing::trace!("Player {} trail dropped {} tiles", player_id, evicted.len());
            }
        }
    }

    /// Moving straight back onto the trail tile just behind the head.
    fn is_reversal(&self, player_id: PlayerId, requested: GridPos) -> bool {
        self.players.get(&player_id).is_some_and(|player| {
            player.trail.last() == Some(player.position)
                && player.trail.before_last() == Some(requested)
        })
    }

    /// Moves the player and collects any pickup on the destination.
    fn step(&mut self, player_id: PlayerId, to: GridPos) {
        let picked = self.powerups.take(&to);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.step_to(to);
            if let Some(kind) = picked {
                player.powerup = Some(kind);
                self.events.push(GameEvent::PowerupCollected {
                    player: player_id,
                    kind,
                });
            }
        }
    }

    fn extend_trail(&mut self, player_id: PlayerId, to: GridPos) {
        self.step(player_id, to);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.trail.push(&mut self.grid, to);
        }
    }

    fn cut_trail(&mut self, victim: PlayerId) {
        if let Some(player) = self.players.get_mut(&victim) {
            let erased = player.trail.clear(&mut self.grid);
            tracing::info!("Player {} lost a trail of {} tiles", victim, erased.len());
        }
    }

    fn bounce(&mut self, player_id: PlayerId, to: GridPos) {
        self.step(player_id, to);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.trail.clear(&mut self.grid);
        }
    }

    fn enter_own_territory(&mut self, player_id: PlayerId, to: GridPos) -> MoveOutcome {
        self.step(player_id, to);
        let merged = match self.players.get_mut(&player_id) {
            Some(player) => player.trail.drain_into_territory(&mut self.grid).len() as u32,
            None => 0,
        };
        let fill = self.fill(player_id);
        MoveOutcome::Claimed {
            tiles: merged + fill.claimed,
        }
    }

    /// Turns a non-adjacent self-intersection into a closed loop of
    /// territory. The tile the player stands on is taken out of the search
    /// so the path has to go the long way around.
    fn close_loop(
        &mut self,
        player_id: PlayerId,
        requested: GridPos,
    ) -> Result<MoveOutcome, EngineError> {
        let player = self
            .players
            .get(&player_id)
            .ok_or(EngineError::UnknownPlayer(player_id))?;
        let current = player.position;
        let start = player.previous_positions[0];
        let allowed: HashSet<GridPos> = player
            .trail
            .positions()
            .filter(|pos| *pos != current)
            .collect();

        let Some(mut path) = pathfinder::shortest_path(start, requested, &allowed) else {
            let err = EngineError::LoopNotConnected {
                player: player_id,
                from: start,
                to: requested,
            };
            match self.config.trust {
                TrustMode::Authoritative => panic!("{err}"),
                TrustMode::Networked => {
                    tracing::warn!("Dropping move: {}", err);
                    return Err(err);
                }
            }
        };
        path.push(current);

        let loop_tiles: HashSet<GridPos> = path.iter().copied().collect();
        self.step(player_id, requested);
        if let Some(player) = self.players.get_mut(&player_id) {
            player.trail.close_into(&mut self.grid, &loop_tiles);
        }
        for pos in &path {
            self.grid.set(pos, TileOwner::Territory(player_id));
        }

        let fill = self.fill(player_id);
        tracing::info!(
            "Player {} closed a loop of {} tiles around {} interior tiles",
            player_id,
            path.len(),
            fill.claimed
        );
        Ok(MoveOutcome::Claimed {
            tiles: path.len() as u32 + fill.claimed,
        })
    }

    /// Fills the interior of a player's territory. Any other player whose
    /// trail got enclosed loses that whole trail.
    fn fill(&mut self, player_id: PlayerId) -> FillOutcome {
        let outcome = interior::fill_interior(&mut self.grid, player_id);

        let mut victims = BTreeMap::<PlayerId, Vec<GridPos>>::new();
        for (pos, previous) in &outcome.captured {
            if let TileOwner::Trail(victim) = *previous {
                victims.entry(victim).or_default().push(*pos);
            }
        }
        for (victim, captured) in victims {
            if let Some(player) = self.players.get_mut(&victim) {
                for pos in &captured {
                    player.trail.forget(pos);
                }
                player.trail.clear(&mut self.grid);
                tracing::info!("Player {} trail enclosed by player {}", victim, player_id);
            }
        }

        if outcome.claimed > 0 {
            tracing::info!(
                "Player {} filled {} tiles ({} captured)",
                player_id,
                outcome.claimed,
                outcome.captured.len()
            );
        }
        outcome
    }

    /// Turns board changes into events, refreshes areas and checks for a
    /// winner, the mover first.
    fn publish(&mut self, mover: Option<PlayerId>) {
        let changes = self.grid.take_changes();
        let territory_changed = !changes.is_empty();
        self.events.extend(
            changes
                .into_iter()
                .map(|(pos, owner)| GameEvent::TileChanged { pos, owner }),
        );
        if !territory_changed {
            return;
        }

        for player in self.players.values_mut() {
            let area = self.grid.count_owner(TileOwner::Territory(player.id));
            if area != player.area {
                player.area = area;
                self.events.push(GameEvent::AreaChanged {
                    player: player.id,
                    area,
                });
            }
        }

        if self.game_over.is_some() {
            return;
        }
        let threshold = self.config.win_threshold;
        let winner = mover
            .and_then(|id| self.players.get(&id))
            .filter(|p| p.area > threshold)
            .or_else(|| self.players.values().find(|p| p.area > threshold))
            .map(|p| GameOver {
                winner: p.id,
                area: p.area,
            });
        if let Some(game_over) = winner {
            tracing::info!(
                "Game over: player {} wins with {} tiles",
                game_over.winner,
                game_over.area
            );
            self.game_over = Some(game_over);
            self.events.push(GameEvent::GameOver {
                winner: game_over.winner,
                area: game_over.area,
            });
        }
    }
}
