pub mod engine;
pub mod error;
pub mod grid;
pub mod ledger;
pub mod maze;
pub mod research;
pub mod resource;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod view;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use resource::ResourceKind;
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
