//! Shortest path between two tiles through a restricted set of tiles.
//!
//! Used to turn a self-intersecting trail into a closed loop: the search is
//! only allowed to walk over the player's own trail, minus the tile that
//! would let it take the short way back.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::state::GridPos;

/// Dijkstra over the 4-connected grid graph restricted to `allowed ∪ {start}`,
/// every edge weighing 1.
///
/// Returns the path from `start` to `end`, both included, or `None` if `end`
/// cannot be reached. When several shortest paths exist any of them may be
/// returned.
pub fn shortest_path(
    start: GridPos,
    end: GridPos,
    allowed: &HashSet<GridPos>,
) -> Option<Vec<GridPos>> {
    if start == end {
        return Some(vec![start]);
    }
    if !allowed.contains(&end) {
        return None;
    }

    let mut dist: HashMap<GridPos, u32> = HashMap::with_capacity(allowed.len() + 1);
    let mut prev: HashMap<GridPos, GridPos> = HashMap::with_capacity(allowed.len());
    let mut queue = BinaryHeap::new();

    dist.insert(start, 0);
    queue.push(Reverse((0u32, start)));

    while let Some(Reverse((cost, pos))) = queue.pop() {
        if pos == end {
            break;
        }
        // Stale queue entry, a shorter route was already settled.
        if dist.get(&pos).is_some_and(|&best| cost > best) {
            continue;
        }

        for next in pos.neighbors() {
            if next == start || !allowed.contains(&next) {
                continue;
            }
            let alt = cost + 1;
            if dist.get(&next).is_none_or(|&known| alt < known) {
                dist.insert(next, alt);
                prev.insert(next, pos);
                queue.push(Reverse((alt, next)));
            }
        }
    }

    let mut path = vec![end];
    let mut cursor = end;
    while cursor != start {
        cursor = *prev.get(&cursor)?;
        path.push(cursor);
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[(i32, i32)]) -> HashSet<GridPos> {
        points.iter().map(|&(x, y)| GridPos::new(x, y)).collect()
    }

    fn assert_connected(path: &[GridPos]) {
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]), "{} -> {} is not a step", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_start_equals_end() {
        let p = GridPos::new(3, 3);
        assert_eq!(shortest_path(p, p, &HashSet::new()), Some(vec![p]));
    }

    #[test]
    fn test_straight_line() {
        let allowed = set(&[(1, 0), (2, 0), (3, 0)]);
        let path = shortest_path(GridPos::new(0, 0), GridPos::new(3, 0), &allowed).unwrap();
        assert_eq!(
            path,
            vec![
                GridPos::new(0, 0),
                GridPos::new(1, 0),
                GridPos::new(2, 0),
                GridPos::new(3, 0)
            ]
        );
    }

    #[test]
    fn test_start_need_not_be_allowed() {
        let allowed = set(&[(1, 0)]);
        let path = shortest_path(GridPos::new(0, 0), GridPos::new(1, 0), &allowed);
        assert_eq!(path, Some(vec![GridPos::new(0, 0), GridPos::new(1, 0)]));
    }

    #[test]
    fn test_not_found_when_disconnected() {
        let allowed = set(&[(1, 0), (3, 0)]);
        assert_eq!(shortest_path(GridPos::new(0, 0), GridPos::new(3, 0), &allowed), None);
    }

    #[test]
    fn test_not_found_when_end_not_allowed() {
        let allowed = set(&[(1, 0)]);
        assert_eq!(shortest_path(GridPos::new(0, 0), GridPos::new(2, 0), &allowed), None);
    }

    #[test]
    fn test_takes_long_way_around_ring() {
        // 3x3 ring with the top-middle tile removed: from (0,0) to (2,0)
        // the path has to go down, across and back up.
        let allowed = set(&[(2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let path = shortest_path(GridPos::new(0, 0), GridPos::new(2, 0), &allowed).unwrap();

        assert_eq!(path.len(), 7);
        assert_eq!(path.first(), Some(&GridPos::new(0, 0)));
        assert_eq!(path.last(), Some(&GridPos::new(2, 0)));
        assert!(!path.contains(&GridPos::new(1, 0)));
        assert_connected(&path);
    }

    #[test]
    fn test_picks_shortest_of_two_routes() {
        // Two routes from (0,0) to (4,0): a direct row, and a detour below.
        let allowed = set(&[
            (1, 0), (2, 0), (3, 0), (4, 0),
            (0, 1), (0, 2), (1, 2), (2, 2), (3, 2), (4, 2), (4, 1),
        ]);
        let path = shortest_path(GridPos::new(0, 0), GridPos::new(4, 0), &allowed).unwrap();
        assert_eq!(path.len(), 5);
        assert_connected(&path);
    }

    #[test]
    fn test_open_area_uses_manhattan_length() {
        let mut allowed = HashSet::new();
        for x in 0..6 {
            for y in 0..6 {
                allowed.insert(GridPos::new(x, y));
            }
        }
        let path = shortest_path(GridPos::new(0, 0), GridPos::new(5, 4), &allowed).unwrap();
        assert_eq!(path.len() as u32, GridPos::new(0, 0).distance(&GridPos::new(5, 4)) + 1);
        assert_connected(&path);
    }
}
