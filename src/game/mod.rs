//! Target-shooting mini game layered over the page.

pub mod field;
pub mod session;

pub use field::{EntityId, Explosion, FieldReport, SpawnClock, Target, TargetField, TargetState};
pub use session::{Banner, GameSession, ScoreChange};
