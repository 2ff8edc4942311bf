//! Diamond-shaped hex grid stored as a flat, row-major arena.
//!
//! Rows grow from `radius` tiles to `2 * radius - 1` tiles at the center row
//! and shrink again below it. Neighbor links are tile indices, so the cyclic
//! neighbor graph never needs shared ownership.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InvariantViolation;
use crate::resource::{ResourceKind, ResourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthWest,
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 3) % 6]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(usize);

impl TileId {
    pub fn raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid radius must be at least 1")]
    InvalidRadius,
    #[error("coordinate {0} lies outside the grid")]
    OutOfRange(Coord),
}

/// Stock of one resource kind on one tile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Deposit {
    pub initial: f64,
    pub remaining: f64,
    pub rate: f64,
    pub present: bool,
}

impl Deposit {
    /// Share of the initial stock still in the ground, 0.0 for empty deposits.
    pub fn fraction_remaining(&self) -> f64 {
        if self.initial > 0.0 {
            self.remaining / self.initial
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    coord: Coord,
    occupied: bool,
    explored: bool,
    visited: bool,
    depleted: bool,
    deposits: ResourceMap<Deposit>,
    neighbors: [Option<TileId>; 6],
    connections: [bool; 6],
}

impl Tile {
    fn new(coord: Coord) -> Self {
        Self {
            coord,
            occupied: false,
            explored: false,
            visited: false,
            depleted: false,
            deposits: ResourceMap::default(),
            neighbors: [None; 6],
            connections: [false; 6],
        }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn is_explored(&self) -> bool {
        self.explored
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    pub fn explore(&mut self) {
        self.explored = true;
    }

    pub fn visit(&mut self) {
        self.visited = true;
    }

    pub fn mark_depleted(&mut self) {
        self.depleted = true;
    }

    pub fn neighbor(&self, direction: Direction) -> Option<TileId> {
        self.neighbors[direction.index()]
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (Direction, TileId)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbor(dir).map(|id| (dir, id)))
    }

    pub fn is_connected(&self, direction: Direction) -> bool {
        self.connections[direction.index()]
    }

    pub fn connections(&self) -> [bool; 6] {
        self.connections
    }

    pub fn deposit(&self, kind: ResourceKind) -> &Deposit {
        &self.deposits[kind]
    }

    pub fn deposits(&self) -> &ResourceMap<Deposit> {
        &self.deposits
    }

    pub fn has_resource(&self, kind: ResourceKind) -> bool {
        self.deposits[kind].present
    }

    /// Places a fresh deposit, replacing whatever the tile held for `kind`.
    pub fn set_deposit(&mut self, kind: ResourceKind, amount: f64) {
        let rate = self.deposits[kind].rate;
        self.deposits[kind] = Deposit {
            initial: amount,
            remaining: amount,
            rate,
            present: amount > 0.0,
        };
    }

    pub fn clear_deposits(&mut self) {
        self.deposits = ResourceMap::default();
    }

    pub fn set_extraction_rate(&mut self, kind: ResourceKind, rate: f64) {
        self.deposits[kind].rate = rate;
    }

    /// Takes one tick's worth of `kind` out of the ground and returns the
    /// amount taken. Empty deposits drop their presence flag.
    pub fn extract(&mut self, kind: ResourceKind, multiplier: f64) -> f64 {
        let deposit = &mut self.deposits[kind];
        if !deposit.present {
            return 0.0;
        }
        let taken = deposit.remaining.min(deposit.rate * multiplier).max(0.0);
        deposit.remaining -= taken;
        if deposit.remaining <= 0.0 {
            deposit.remaining = 0.0;
            deposit.present = false;
        }
        taken
    }

    /// True once no discovered kind is left in the ground. Tiles holding no
    /// discovered kind at all count as exhausted.
    pub fn is_exhausted(&self, discovered: &ResourceMap<bool>) -> bool {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| discovered[*kind])
            .all(|kind| !self.deposits[kind].present)
    }
}

/// Tunables for scattering initial deposits over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StockProfile {
    #[serde(default = "default_stock_min")]
    pub min: f64,
    #[serde(default = "default_stock_max")]
    pub max: f64,
    #[serde(default = "default_presence")]
    pub presence: f64,
}

fn default_stock_min() -> f64 {
    500.0
}

fn default_stock_max() -> f64 {
    1000.0
}

fn default_presence() -> f64 {
    0.5
}

impl Default for StockProfile {
    fn default() -> Self {
        Self {
            min: default_stock_min(),
            max: default_stock_max(),
            presence: default_presence(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    radius: usize,
    tiles: Vec<Tile>,
    row_starts: Vec<usize>,
    settlement: TileId,
}

impl Grid {
    pub fn new(radius: usize) -> Result<Self, GridError> {
        if radius == 0 {
            return Err(GridError::InvalidRadius);
        }
        let diameter = radius * 2 - 1;
        let mut tiles = Vec::with_capacity(3 * radius * radius - 3 * radius + 1);
        let mut row_starts = Vec::with_capacity(diameter);
        for row in 0..diameter {
            row_starts.push(tiles.len());
            for col in 0..row_length(radius, row) {
                tiles.push(Tile::new(Coord::new(row, col)));
            }
        }

        let mut grid = Self {
            radius,
            tiles,
            row_starts,
            settlement: TileId(0),
        };
        grid.link_neighbors();

        let center = radius - 1;
        let settlement = grid
            .id_at(Coord::new(center, center))
            .ok_or(GridError::OutOfRange(Coord::new(center, center)))?;
        let tile = grid.tile_mut(settlement);
        tile.occupied = true;
        tile.explored = true;
        grid.settlement = settlement;
        Ok(grid)
    }

    fn link_neighbors(&mut self) {
        let center = self.radius - 1;
        for row in 0..self.diameter() {
            for col in 0..self.row_len(row) {
                let id = TileId(self.row_starts[row] + col);
                if let Some(east) = self.id_at(Coord::new(row, col + 1)) {
                    self.link(id, Direction::East, east);
                }
                if row + 1 == self.diameter() {
                    continue;
                }
                // Rows above the center grow by one tile, rows from the center
                // down shrink by one, which shifts the lower row by half a cell.
                let (south_west, south_east) = if row < center {
                    (Some(col), Some(col + 1))
                } else {
                    (col.checked_sub(1), Some(col))
                };
                if let Some(sw) = south_west.and_then(|c| self.id_at(Coord::new(row + 1, c))) {
                    self.link(id, Direction::SouthWest, sw);
                }
                if let Some(se) = south_east.and_then(|c| self.id_at(Coord::new(row + 1, c))) {
                    self.link(id, Direction::SouthEast, se);
                }
            }
        }
    }

    fn link(&mut self, from: TileId, direction: Direction, to: TileId) {
        self.tiles[from.0].neighbors[direction.index()] = Some(to);
        self.tiles[to.0].neighbors[direction.opposite().index()] = Some(from);
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn diameter(&self) -> usize {
        self.radius * 2 - 1
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn row_len(&self, row: usize) -> usize {
        row_length(self.radius, row)
    }

    pub fn settlement(&self) -> TileId {
        self.settlement
    }

    pub fn id_at(&self, coord: Coord) -> Option<TileId> {
        if coord.row >= self.diameter() || coord.col >= self.row_len(coord.row) {
            return None;
        }
        Some(TileId(self.row_starts[coord.row] + coord.col))
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.0]
    }

    pub fn tile_mut(&mut self, id: TileId) -> &mut Tile {
        &mut self.tiles[id.0]
    }

    pub fn tile_at(&self, coord: Coord) -> Option<&Tile> {
        self.id_at(coord).map(|id| self.tile(id))
    }

    /// Row-major traversal order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len()).map(TileId)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.tiles.iter().enumerate().map(|(i, t)| (TileId(i), t))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        (0..self.diameter()).map(move |row| {
            let start = self.row_starts[row];
            &self.tiles[start..start + self.row_len(row)]
        })
    }

    pub fn neighbor(&self, id: TileId, direction: Direction) -> Option<TileId> {
        self.tile(id).neighbor(direction)
    }

    pub fn is_connected(&self, id: TileId, direction: Direction) -> bool {
        self.tile(id).is_connected(direction)
    }

    /// Opens the passage from `id` towards `direction` on both tiles.
    /// Returns false when there is no neighbor that way.
    pub fn connect(&mut self, id: TileId, direction: Direction) -> bool {
        let Some(other) = self.neighbor(id, direction) else {
            return false;
        };
        self.tiles[id.0].connections[direction.index()] = true;
        self.tiles[other.0].connections[direction.opposite().index()] = true;
        true
    }

    /// Neighbors reachable through open passages that are still unexplored.
    pub fn unexplored_passages(&self, id: TileId) -> Vec<TileId> {
        let tile = self.tile(id);
        tile.neighbors()
            .filter(|(dir, _)| tile.is_connected(*dir))
            .map(|(_, n)| n)
            .filter(|n| !self.tile(*n).is_explored())
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.occupied).count()
    }

    /// Number of open passages, each counted once.
    pub fn passage_count(&self) -> usize {
        let ends: usize = self
            .tiles
            .iter()
            .map(|t| t.connections.iter().filter(|c| **c).count())
            .sum();
        ends / 2
    }

    /// Scatters deposits over every tile but the settlement. Each kind is
    /// present with probability `profile.presence`; amounts are uniform in
    /// `[min, max)`.
    pub fn scatter_deposits<R: Rng + ?Sized>(&mut self, rng: &mut R, profile: &StockProfile) {
        let presence = profile.presence.clamp(0.0, 1.0);
        for tile in self.tiles.iter_mut().filter(|t| !t.occupied) {
            for kind in ResourceKind::ALL {
                if rng.gen_bool(presence) {
                    let amount = if profile.max > profile.min {
                        rng.gen_range(profile.min..profile.max)
                    } else {
                        profile.min
                    };
                    tile.set_deposit(kind, amount);
                }
            }
        }
    }

    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        let occupied = self.occupied_count();
        if occupied != 1 {
            return Err(InvariantViolation::OccupiedCount(occupied));
        }
        for (id, tile) in self.tiles() {
            for direction in Direction::ALL {
                let connected = tile.is_connected(direction);
                let Some(other) = tile.neighbor(direction) else {
                    if connected {
                        return Err(InvariantViolation::DanglingConnection {
                            tile: tile.coord,
                            direction,
                        });
                    }
                    continue;
                };
                if other == id {
                    return Err(InvariantViolation::SelfLink {
                        tile: tile.coord,
                        direction,
                    });
                }
                let neighbor = self.tile(other);
                if neighbor.neighbor(direction.opposite()) != Some(id) {
                    return Err(InvariantViolation::AsymmetricAdjacency {
                        tile: tile.coord,
                        direction,
                        neighbor: neighbor.coord,
                    });
                }
                if neighbor.is_connected(direction.opposite()) != connected {
                    return Err(InvariantViolation::AsymmetricConnection {
                        tile: tile.coord,
                        direction,
                        neighbor: neighbor.coord,
                    });
                }
            }
            for (kind, deposit) in tile.deposits.iter() {
                if deposit.remaining < 0.0 {
                    return Err(InvariantViolation::NegativeStock {
                        tile: tile.coord,
                        kind,
                        remaining: deposit.remaining,
                    });
                }
            }
        }
        Ok(())
    }
}

fn row_length(radius: usize, row: usize) -> usize {
    let center = radius - 1;
    radius * 2 - 1 - row.abs_diff(center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn tile_count_matches_hex_formula() {
        for radius in 1..=9 {
            let grid = Grid::new(radius).unwrap();
            assert_eq!(grid.len(), 3 * radius * radius - 3 * radius + 1);
            assert_eq!(grid.diameter(), 2 * radius - 1);
            assert_eq!(grid.occupied_count(), 1);
        }
    }

    #[test]
    fn zero_radius_is_rejected() {
        assert_eq!(Grid::new(0).unwrap_err(), GridError::InvalidRadius);
    }

    #[test]
    fn row_lengths_grow_then_shrink() {
        let grid = Grid::new(4).unwrap();
        let lengths: Vec<_> = (0..grid.diameter()).map(|r| grid.row_len(r)).collect();
        assert_eq!(lengths, vec![4, 5, 6, 7, 6, 5, 4]);
    }

    #[test]
    fn adjacency_is_symmetric() {
        for radius in 1..=8 {
            let grid = Grid::new(radius).unwrap();
            for (id, tile) in grid.tiles() {
                for (dir, other) in tile.neighbors() {
                    assert_ne!(id, other);
                    assert_eq!(grid.neighbor(other, dir.opposite()), Some(id));
                }
            }
            grid.verify_invariants().unwrap();
        }
    }

    #[test]
    fn settlement_sits_in_the_middle_with_six_neighbors() {
        let grid = Grid::new(3).unwrap();
        let settlement = grid.tile(grid.settlement());
        assert_eq!(settlement.coord(), Coord::new(2, 2));
        assert!(settlement.is_occupied());
        assert_eq!(settlement.neighbors().count(), 6);
    }

    #[test]
    fn corner_tiles_have_three_neighbors() {
        let grid = Grid::new(3).unwrap();
        for coord in [
            Coord::new(0, 0),
            Coord::new(0, 2),
            Coord::new(2, 0),
            Coord::new(2, 4),
            Coord::new(4, 0),
            Coord::new(4, 2),
        ] {
            assert_eq!(grid.tile_at(coord).unwrap().neighbors().count(), 3, "{coord}");
        }
    }

    #[test]
    fn neighbors_across_the_center_row() {
        let grid = Grid::new(3).unwrap();
        let id = grid.id_at(Coord::new(1, 1)).unwrap();
        let coord_of = |dir| grid.tile(grid.neighbor(id, dir).unwrap()).coord();
        assert_eq!(coord_of(Direction::NorthWest), Coord::new(0, 0));
        assert_eq!(coord_of(Direction::NorthEast), Coord::new(0, 1));
        assert_eq!(coord_of(Direction::SouthWest), Coord::new(2, 1));
        assert_eq!(coord_of(Direction::SouthEast), Coord::new(2, 2));

        let below = grid.id_at(Coord::new(3, 1)).unwrap();
        let coord_of = |dir| grid.tile(grid.neighbor(below, dir).unwrap()).coord();
        assert_eq!(coord_of(Direction::NorthWest), Coord::new(2, 1));
        assert_eq!(coord_of(Direction::NorthEast), Coord::new(2, 2));
        assert_eq!(coord_of(Direction::SouthWest), Coord::new(4, 0));
        assert_eq!(coord_of(Direction::SouthEast), Coord::new(4, 1));
    }

    #[test]
    fn connect_is_symmetric_and_rejects_missing_neighbors() {
        let mut grid = Grid::new(2).unwrap();
        let corner = grid.id_at(Coord::new(0, 0)).unwrap();
        assert!(!grid.connect(corner, Direction::NorthWest));
        assert!(grid.connect(corner, Direction::East));
        let east = grid.neighbor(corner, Direction::East).unwrap();
        assert!(grid.is_connected(east, Direction::West));
        assert_eq!(grid.passage_count(), 1);
        grid.verify_invariants().unwrap();
    }

    #[test]
    fn one_sided_passage_is_reported() {
        let mut grid = Grid::new(2).unwrap();
        let corner = grid.id_at(Coord::new(0, 0)).unwrap();
        grid.tile_mut(corner).connections[Direction::East.index()] = true;
        assert!(matches!(
            grid.verify_invariants(),
            Err(InvariantViolation::AsymmetricConnection { .. })
        ));
    }

    #[test]
    fn extraction_never_overdraws() {
        let mut tile = Tile::new(Coord::new(0, 0));
        tile.set_deposit(ResourceKind::Wood, 2.5);
        tile.set_extraction_rate(ResourceKind::Wood, 1.0);
        assert_eq!(tile.extract(ResourceKind::Wood, 1.0), 1.0);
        assert_eq!(tile.extract(ResourceKind::Wood, 1.0), 1.0);
        assert_eq!(tile.extract(ResourceKind::Wood, 1.0), 0.5);
        assert!(!tile.has_resource(ResourceKind::Wood));
        assert_eq!(tile.extract(ResourceKind::Wood, 1.0), 0.0);
        assert_eq!(tile.deposit(ResourceKind::Wood).remaining, 0.0);
    }

    #[test]
    fn exhaustion_only_counts_discovered_kinds() {
        let mut tile = Tile::new(Coord::new(0, 0));
        tile.set_deposit(ResourceKind::Oil, 10.0);
        let mut discovered = ResourceMap::filled(false);
        discovered[ResourceKind::Wood] = true;
        assert!(tile.is_exhausted(&discovered));
        discovered[ResourceKind::Oil] = true;
        assert!(!tile.is_exhausted(&discovered));
    }

    #[test]
    fn scattering_skips_the_settlement() {
        let mut grid = Grid::new(4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let profile = StockProfile {
            min: 500.0,
            max: 1000.0,
            presence: 1.0,
        };
        grid.scatter_deposits(&mut rng, &profile);
        for (id, tile) in grid.tiles() {
            for (_, deposit) in tile.deposits().iter() {
                if id == grid.settlement() {
                    assert!(!deposit.present);
                } else {
                    assert!(deposit.present);
                    assert!((500.0..1000.0).contains(&deposit.initial));
                }
            }
        }
    }
}
