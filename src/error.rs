use thiserror::Error;

use crate::grid::{Coord, Direction};
use crate::resource::ResourceKind;

/// Broken structural guarantees. Tick logic assumes none of these can
/// happen, so callers abort instead of continuing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("expected exactly one occupied tile, found {0}")]
    OccupiedCount(usize),

    #[error("tile {tile} links to itself towards {direction:?}")]
    SelfLink { tile: Coord, direction: Direction },

    #[error("tile {tile} links {direction:?} to {neighbor} but the link is not mirrored")]
    AsymmetricAdjacency {
        tile: Coord,
        direction: Direction,
        neighbor: Coord,
    },

    #[error("tile {tile} has a passage {direction:?} without a neighbor")]
    DanglingConnection { tile: Coord, direction: Direction },

    #[error("passage between {tile} and {neighbor} ({direction:?}) is one-sided")]
    AsymmetricConnection {
        tile: Coord,
        direction: Direction,
        neighbor: Coord,
    },

    #[error("tile {tile} holds negative {kind} stock ({remaining})")]
    NegativeStock {
        tile: Coord,
        kind: ResourceKind,
        remaining: f64,
    },

    #[error("ledger holds negative {kind} ({amount})")]
    NegativeLedger { kind: ResourceKind, amount: f64 },
}
