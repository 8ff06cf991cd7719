//! Particle-based belief tracking over the opponent's hidden roster.
//!
//! This module is composed of:
//! - `evidence`: the append-only log of decision-boundary snapshots.
//! - `hypothesis`: one particle, its rank, and its likelihood updates.
//! - `resolver`: action-order consistency filtering for a single turn.
//! - `population`: the particle set, replacement, and sampling.

mod evidence;
mod hypothesis;
mod population;
pub mod resolver;

pub use evidence::{EvidenceEntry, EvidenceLog};
pub use hypothesis::HypothesisTeam;
pub use population::ParticlePopulation;
