//! Domain types shared across the inference engine.

pub mod decision;
pub mod ids;
pub mod reveal;
pub mod slot;

pub use decision::{Decision, Side, Weighted, WeightedDecision};
pub use ids::{Level, MoveId, SpeciesId};
pub use reveal::{OpponentView, RevealedPokemon};
pub use slot::{ConfirmedSlot, MAX_MOVES, SlotGuess};
