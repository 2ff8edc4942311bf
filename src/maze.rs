//! Passage carving over the dense hex adjacency.
//!
//! Iterative randomized depth-first search, one stack per seed. Stacks are
//! popped round-robin so several regions grow side by side; a region never
//! waits on another. Each region ends up a tree of open passages.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::grid::{Direction, Grid, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeReport {
    pub seeds: usize,
    pub visited: usize,
    pub passages: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MazeGenerator {
    seeds: Vec<TileId>,
    ring_around: Option<TileId>,
}

impl MazeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator seeded at the settlement whose six surrounding passages are
    /// opened before the search starts.
    pub fn around_settlement(grid: &Grid) -> Self {
        Self {
            seeds: vec![grid.settlement()],
            ring_around: Some(grid.settlement()),
        }
    }

    pub fn with_seed(mut self, seed: TileId) -> Self {
        self.seeds.push(seed);
        self
    }

    pub fn seeds(&self) -> &[TileId] {
        &self.seeds
    }

    pub fn carve<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> MazeReport {
        let mut stacks: Vec<Vec<TileId>> = Vec::with_capacity(self.seeds.len());
        let mut visited = 0;
        let mut passages = 0;

        for &seed in &self.seeds {
            if grid.tile(seed).is_visited() {
                warn!(tile = %grid.tile(seed).coord(), "maze seed already carved, skipping");
                continue;
            }
            grid.tile_mut(seed).visit();
            visited += 1;
            let mut stack = vec![seed];

            if self.ring_around == Some(seed) {
                let ring: Vec<(Direction, TileId)> = grid.tile(seed).neighbors().collect();
                for (direction, neighbor) in ring {
                    grid.connect(seed, direction);
                    passages += 1;
                    if !grid.tile(neighbor).is_visited() {
                        grid.tile_mut(neighbor).visit();
                        visited += 1;
                        stack.push(neighbor);
                    }
                }
            }
            stacks.push(stack);
        }

        loop {
            let mut progressed = false;
            for stack in stacks.iter_mut() {
                let Some(current) = stack.pop() else {
                    continue;
                };
                progressed = true;
                // A tile without unvisited neighbors is a dead end and stays popped.
                let Some(direction) = random_unvisited_direction(grid, current, rng) else {
                    continue;
                };
                let Some(next) = grid.neighbor(current, direction) else {
                    continue;
                };
                grid.connect(current, direction);
                passages += 1;
                grid.tile_mut(next).visit();
                visited += 1;
                stack.push(current);
                stack.push(next);
            }
            if !progressed {
                break;
            }
        }

        let report = MazeReport {
            seeds: stacks.len(),
            visited,
            passages,
        };
        debug!(
            seeds = report.seeds,
            visited = report.visited,
            passages = report.passages,
            "maze carved"
        );
        report
    }
}

fn random_unvisited_direction<R: Rng + ?Sized>(
    grid: &Grid,
    id: TileId,
    rng: &mut R,
) -> Option<Direction> {
    let candidates: Vec<Direction> = grid
        .tile(id)
        .neighbors()
        .filter(|(_, n)| !grid.tile(*n).is_visited())
        .map(|(dir, _)| dir)
        .collect();
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct DisjointSet {
        parent: Vec<usize>,
    }

    impl DisjointSet {
        fn new(len: usize) -> Self {
            Self {
                parent: (0..len).collect(),
            }
        }

        fn find(&mut self, x: usize) -> usize {
            let mut root = x;
            while self.parent[root] != root {
                root = self.parent[root];
            }
            self.parent[x] = root;
            root
        }

        /// Returns false when both ends were already joined, i.e. a cycle.
        fn union(&mut self, a: usize, b: usize) -> bool {
            let (ra, rb) = (self.find(a), self.find(b));
            if ra == rb {
                return false;
            }
            self.parent[ra] = rb;
            true
        }
    }

    fn assert_forest(grid: &Grid) {
        let mut sets = DisjointSet::new(grid.len());
        for (id, tile) in grid.tiles() {
            for (dir, other) in tile.neighbors() {
                if tile.is_connected(dir) && id < other {
                    assert!(
                        sets.union(id.raw(), other.raw()),
                        "passage {} -> {} closes a cycle",
                        tile.coord(),
                        grid.tile(other).coord()
                    );
                }
            }
        }
    }

    #[test]
    fn single_seed_carves_a_spanning_tree() {
        for seed in 0..8 {
            let mut grid = Grid::new(6).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let start = grid.id_at(Coord::new(0, 0)).unwrap();
            let report = MazeGenerator::new().with_seed(start).carve(&mut grid, &mut rng);

            assert_eq!(report.visited, grid.len());
            assert_eq!(report.passages, report.visited - 1);
            assert_eq!(grid.passage_count(), report.passages);
            assert!(grid.tiles().all(|(_, t)| t.is_visited()));
            assert_forest(&grid);
            grid.verify_invariants().unwrap();
        }
    }

    #[test]
    fn settlement_ring_is_always_open() {
        for seed in 0..16 {
            let mut grid = Grid::new(5).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let report = MazeGenerator::around_settlement(&grid).carve(&mut grid, &mut rng);

            let settlement = grid.tile(grid.settlement());
            assert!(Direction::ALL.iter().all(|d| settlement.is_connected(*d)));
            assert_eq!(report.passages, report.visited - 1);
            assert_forest(&grid);
        }
    }

    #[test]
    fn several_seeds_grow_a_forest() {
        let mut grid = Grid::new(7).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let far_corner = grid.id_at(Coord::new(12, 6)).unwrap();
        let other_corner = grid.id_at(Coord::new(0, 0)).unwrap();
        let report = MazeGenerator::around_settlement(&grid)
            .with_seed(far_corner)
            .with_seed(other_corner)
            .carve(&mut grid, &mut rng);

        assert_eq!(report.seeds, 3);
        assert_eq!(report.visited, grid.len());
        assert_eq!(report.passages, report.visited - report.seeds);
        assert_forest(&grid);
        grid.verify_invariants().unwrap();
    }

    #[test]
    fn duplicate_seed_is_skipped() {
        let mut grid = Grid::new(4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let settlement = grid.settlement();
        let ring_tile = grid.neighbor(settlement, Direction::East).unwrap();
        let report = MazeGenerator::around_settlement(&grid)
            .with_seed(ring_tile)
            .carve(&mut grid, &mut rng);
        assert_eq!(report.seeds, 1);
        assert_eq!(report.passages, report.visited - 1);
    }

    #[test]
    fn same_rng_seed_gives_same_passages() {
        let carve = |seed| {
            let mut grid = Grid::new(6).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            MazeGenerator::around_settlement(&grid).carve(&mut grid, &mut rng);
            grid.tiles().map(|(_, t)| t.connections()).collect::<Vec<_>>()
        };
        assert_eq!(carve(21), carve(21));
        assert_ne!(carve(21), carve(22));
    }
}
