pub mod traits;

pub use traits::{Game, GameError, PlayerId, TickRate, TickResult};
