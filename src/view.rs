//! Read-only presentation model. Everything a renderer needs to draw the
//! map and the side panel, without the core knowing about drawing.

use std::fmt;

use serde::Serialize;

use crate::grid::{Coord, Direction, Grid, Tile};
use crate::resource::ResourceKind;
use crate::world::World;

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub kind: ResourceKind,
    /// Share of the initial stock still in the ground.
    pub fraction_remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileView {
    pub coord: Coord,
    pub occupied: bool,
    pub explored: bool,
    pub depleted: bool,
    /// Open passages, indexed like [`Direction::ALL`].
    pub connections: [bool; 6],
    /// Discovered resources still present; empty for unexplored tiles.
    pub resources: Vec<ResourceView>,
}

impl TileView {
    pub fn new(tile: &Tile, world: &World) -> Self {
        let resources = if tile.is_explored() {
            world
                .discovered_kinds()
                .filter(|kind| tile.has_resource(*kind))
                .map(|kind| ResourceView {
                    kind,
                    fraction_remaining: tile.deposit(kind).fraction_remaining(),
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            coord: tile.coord(),
            occupied: tile.is_occupied(),
            explored: tile.is_explored(),
            depleted: tile.is_depleted(),
            connections: tile.connections(),
            resources,
        }
    }

    pub fn is_connected(&self, direction: Direction) -> bool {
        self.connections[direction.index()]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceLine {
    pub kind: ResourceKind,
    pub label: &'static str,
    pub available: f64,
    pub mined: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub radius: usize,
    pub diameter: usize,
    pub explored: usize,
    pub depleted: usize,
    pub pollution: f64,
    /// Discovered kinds only.
    pub resources: Vec<ResourceLine>,
    pub available_research: Vec<String>,
    pub completed_research: Vec<String>,
    /// Row-major.
    pub rows: Vec<Vec<TileView>>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let ledger = world.ledger();
        let resources = world
            .discovered_kinds()
            .map(|kind| ResourceLine {
                kind,
                label: kind.label(),
                available: ledger.available(kind),
                mined: ledger.mined(kind),
            })
            .collect();
        let rows = world
            .grid()
            .rows()
            .map(|row| row.iter().map(|tile| TileView::new(tile, world)).collect())
            .collect();
        Self {
            tick: world.tick(),
            radius: world.grid().radius(),
            diameter: world.grid().diameter(),
            explored: world.explored_count(),
            depleted: world.depleted_count(),
            pollution: ledger.pollution(),
            resources,
            available_research: world
                .available_research()
                .iter()
                .map(|r| r.name().to_string())
                .collect(),
            completed_research: world
                .catalog()
                .iter()
                .filter(|r| r.is_completed())
                .map(|r| r.name().to_string())
                .collect(),
            rows,
        }
    }
}

/// Text rendering of the grid, one line per row, indented into a hexagon.
/// `+` settlement, `x` depleted, `o` explored, `#` carved, `*` untouched.
pub struct AsciiMap<'a>(pub &'a Grid);

impl fmt::Display for AsciiMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.0;
        let center = grid.radius() - 1;
        for (row, tiles) in grid.rows().enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", " ".repeat(row.abs_diff(center)))?;
            let symbols: Vec<&str> = tiles.iter().map(symbol).collect();
            write!(f, "{}", symbols.join(" "))?;
        }
        Ok(())
    }
}

fn symbol(tile: &Tile) -> &'static str {
    if tile.is_occupied() {
        "+"
    } else if tile.is_depleted() {
        "x"
    } else if tile.is_explored() {
        "o"
    } else if tile.is_visited() {
        "#"
    } else {
        "*"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_map_is_a_hexagon() {
        let mut world = World::new(Grid::new(2).unwrap(), 1.0);
        world.seed_frontier();
        let text = AsciiMap(world.grid()).to_string();
        assert_eq!(text, " o o\no + o\n o o");
    }

    #[test]
    fn snapshot_hides_unexplored_resources() {
        let mut grid = Grid::new(3).unwrap();
        let corner = grid.id_at(Coord::new(0, 0)).unwrap();
        grid.tile_mut(corner).set_deposit(ResourceKind::Wood, 10.0);
        let settlement = grid.settlement();
        let ring = grid.neighbor(settlement, Direction::West).unwrap();
        grid.tile_mut(ring).set_deposit(ResourceKind::Wood, 10.0);

        let mut world = World::new(grid, 1.0);
        world.discover_resource(ResourceKind::Wood);
        world.seed_frontier();
        let snapshot = WorldSnapshot::capture(&world);

        assert_eq!(snapshot.rows.len(), 5);
        assert!(snapshot.rows[0][0].resources.is_empty());
        let west = &snapshot.rows[2][1];
        assert!(west.explored);
        assert_eq!(west.resources.len(), 1);
        assert_eq!(west.resources[0].fraction_remaining, 1.0);
        assert_eq!(snapshot.resources.len(), 1);
        assert!(snapshot.rows[2][2].occupied);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"kind\":\"wood\""));
    }
}
