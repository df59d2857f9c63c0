use std::collections::BTreeMap;

use crate::game::traits::{GameError, PlayerId};
use crate::protocol::territory::{
    FullState, OwnerKind, PlayerState, PowerupState, StateUpdate, TileDelta, TileState,
};

use super::config::get_player_color;
use super::engine::{GameEvent, GridSnapshot, PlayerSnapshot, TerritoryEngine};
use super::grid::{Tile, TileOwner};
use super::powerup::PowerupKind;
use super::state::{GridPos, Player};

pub fn owner_to_proto(owner: TileOwner) -> (OwnerKind, u32) {
    match owner {
        TileOwner::Empty => (OwnerKind::Empty, 0),
        TileOwner::Territory(id) => (OwnerKind::Territory, id as u32),
        TileOwner::Trail(id) => (OwnerKind::Trail, id as u32),
    }
}

pub fn owner_from_proto(kind: i32, owner_id: u32, max_players: usize) -> Result<TileOwner, GameError> {
    let kind = OwnerKind::try_from(kind)
        .map_err(|_| GameError::EncodingError(format!("unknown tile kind {}", kind)))?;
    if kind == OwnerKind::Empty {
        return Ok(TileOwner::Empty);
    }
    let id = player_id_from_proto(owner_id, max_players)?;
    Ok(match kind {
        OwnerKind::Territory => TileOwner::Territory(id),
        _ => TileOwner::Trail(id),
    })
}

fn player_id_from_proto(value: u32, max_players: usize) -> Result<PlayerId, GameError> {
    if (value as usize) >= max_players {
        return Err(GameError::EncodingError(format!(
            "player id {} outside {} seats",
            value, max_players
        )));
    }
    Ok(value as PlayerId)
}

pub fn player_state(player: &Player) -> PlayerState {
    PlayerState {
        player_id: player.id as u32,
        x: player.position.x,
        y: player.position.y,
        area: player.area,
        color: get_player_color(player.id),
        powerup: player.powerup.map_or(0, PowerupKind::to_proto),
        trail_len: player.trail.len() as u32,
    }
}

fn powerup_states(engine: &TerritoryEngine) -> Vec<PowerupState> {
    engine
        .powerups()
        .into_iter()
        .map(|(pos, kind)| PowerupState {
            x: pos.x,
            y: pos.y,
            kind: kind.to_proto(),
        })
        .collect()
}

/// Builds the per-tick delta. Repeated changes to one tile collapse into
/// the final owner.
pub fn encode_state_update(tick: u32, engine: &TerritoryEngine, events: &[GameEvent]) -> StateUpdate {
    let mut changed = BTreeMap::new();
    for event in events {
        if let GameEvent::TileChanged { pos, owner } = event {
            changed.insert(*pos, *owner);
        }
    }

    StateUpdate {
        tick,
        players: engine.players().map(player_state).collect(),
        tiles: changed
            .into_iter()
            .map(|(pos, owner)| {
                let (kind, owner_id) = owner_to_proto(owner);
                TileDelta {
                    x: pos.x,
                    y: pos.y,
                    kind: kind as i32,
                    owner_id,
                }
            })
            .collect(),
        powerups: powerup_states(engine),
    }
}

pub fn encode_full_state(tick: u32, engine: &TerritoryEngine) -> FullState {
    let (num_cols, num_rows) = engine.grid().dimensions();
    FullState {
        tick,
        num_cols,
        num_rows,
        players: engine.players().map(player_state).collect(),
        tiles: engine
            .grid()
            .tiles()
            .iter()
            .map(|tile| {
                let (kind, owner_id) = owner_to_proto(tile.owner);
                TileState {
                    kind: kind as i32,
                    owner_id,
                    age: tile.age,
                }
            })
            .collect(),
        powerups: powerup_states(engine),
    }
}

/// Validates a full board received from a peer and turns it into a snapshot
/// the engine can be rebuilt from.
pub fn snapshot_from_full_state(
    state: &FullState,
    expected: (u32, u32),
    max_players: usize,
) -> Result<GridSnapshot, GameError> {
    if (state.num_cols, state.num_rows) != expected {
        return Err(GameError::EncodingError(format!(
            "board is {}x{}, expected {}x{}",
            state.num_cols, state.num_rows, expected.0, expected.1
        )));
    }
    let total = state.num_cols as usize * state.num_rows as usize;
    if state.tiles.len() != total {
        return Err(GameError::EncodingError(format!(
            "{} tiles for a board of {}",
            state.tiles.len(),
            total
        )));
    }

    let tiles = state
        .tiles
        .iter()
        .map(|tile| {
            Ok(Tile {
                owner: owner_from_proto(tile.kind, tile.owner_id, max_players)?,
                age: tile.age,
            })
        })
        .collect::<Result<Vec<_>, GameError>>()?;

    let players = state
        .players
        .iter()
        .map(|p| {
            Ok(PlayerSnapshot {
                id: player_id_from_proto(p.player_id, max_players)?,
                position: GridPos::new(p.x, p.y),
                powerup: PowerupKind::from_proto(p.powerup),
            })
        })
        .collect::<Result<Vec<_>, GameError>>()?;

    let powerups = state
        .powerups
        .iter()
        .map(|p| {
            PowerupKind::from_proto(p.kind)
                .map(|kind| (GridPos::new(p.x, p.y), kind))
                .ok_or_else(|| GameError::EncodingError(format!("unknown pickup kind {}", p.kind)))
        })
        .collect::<Result<Vec<_>, GameError>>()?;

    Ok(GridSnapshot {
        cols: state.num_cols,
        rows: state.num_rows,
        tiles,
        players,
        powerups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::territory::config::TerritoryConfig;

    fn engine_with_players() -> TerritoryEngine {
        let mut engine = TerritoryEngine::new(TerritoryConfig::with_grid_size(10, 8)).unwrap();
        engine.spawn(0, GridPos::new(2, 2), 3).unwrap();
        engine.spawn(1, GridPos::new(7, 5), 0).unwrap();
        engine.apply_move(1, GridPos::new(7, 6)).unwrap();
        engine
    }

    #[test]
    fn test_state_update_collapses_tile_changes() {
        let engine = engine_with_players();
        let pos = GridPos::new(4, 4);
        let events = vec![
            GameEvent::TileChanged { pos, owner: TileOwner::Trail(1) },
            GameEvent::TileChanged { pos, owner: TileOwner::Empty },
            GameEvent::AreaChanged { player: 0, area: 9 },
        ];

        let update = encode_state_update(3, &engine, &events);

        assert_eq!(update.tick, 3);
        assert_eq!(update.tiles.len(), 1);
        assert_eq!(update.tiles[0].kind, OwnerKind::Empty as i32);
        assert_eq!(update.players.len(), 2);
        assert_eq!(update.players[0].area, 9);
        assert_eq!(update.players[1].trail_len, 2);
    }

    #[test]
    fn test_full_state_rebuilds_engine() {
        let engine = engine_with_players();
        let state = encode_full_state(7, &engine);
        assert_eq!(state.tiles.len(), 80);

        let snapshot = snapshot_from_full_state(&state, (10, 8), 4).unwrap();
        let restored = TerritoryEngine::from_snapshot(engine.config().clone(), snapshot).unwrap();

        assert_eq!(restored.grid().tiles(), engine.grid().tiles());
        assert_eq!(restored.player(1).unwrap().trail.len(), 2);
        assert_eq!(restored.player(0).unwrap().area, 9);
    }

    #[test]
    fn test_full_state_validation() {
        let engine = engine_with_players();
        let state = encode_full_state(0, &engine);

        assert!(matches!(
            snapshot_from_full_state(&state, (12, 8), 4),
            Err(GameError::EncodingError(_))
        ));

        let mut short = state.clone();
        short.tiles.pop();
        assert!(snapshot_from_full_state(&short, (10, 8), 4).is_err());

        let mut bad_owner = state.clone();
        bad_owner.tiles[0] = TileState { kind: OwnerKind::Territory as i32, owner_id: 9, age: 0 };
        assert!(snapshot_from_full_state(&bad_owner, (10, 8), 4).is_err());

        let mut bad_kind = state;
        bad_kind.tiles[0].kind = 7;
        assert!(snapshot_from_full_state(&bad_kind, (10, 8), 4).is_err());
    }

    #[test]
    fn test_owner_mapping() {
        for owner in [TileOwner::Empty, TileOwner::Territory(2), TileOwner::Trail(3)] {
            let (kind, id) = owner_to_proto(owner);
            assert_eq!(owner_from_proto(kind as i32, id, 4).unwrap(), owner);
        }
    }
}
