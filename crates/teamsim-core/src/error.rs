//! Fatal failure modes of an inference pass.
//!
//! Contradictions between a hypothesis and new ground truth never surface
//! here: the population absorbs them by replacing the particle.

use crate::engine::ReconstructionError;
use crate::model::ids::SpeciesId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    /// Order resolution narrowed a turn's candidates to the empty set. This
    /// signals a modeling gap or an engine/log mismatch, never a normal
    /// condition, so the full context rides along.
    #[error(
        "no candidate decision is consistent with the observed turn\n\
         turn log: {turn_log}\ncandidates: {candidates}\nopponent menu: {menu_json}"
    )]
    ResolutionExhausted {
        turn_log: String,
        candidates: String,
        menu_json: String,
    },

    /// Request generation failed twice while completing a battle state.
    #[error("battle reconstruction failed after retry while {context}")]
    Reconstruction {
        context: String,
        #[source]
        source: ReconstructionError,
    },

    /// Every particle's rank reached zero; no valid hypothesis remains.
    #[error("every hypothesis has been falsified; the population cannot be sampled")]
    PopulationExhausted,

    /// Ground truth revealed more opponent Pokémon than the team can hold.
    #[error("confirmed opponent {species} exceeds the team size of {team_size}")]
    TeamOverflow {
        species: SpeciesId,
        team_size: usize,
    },

    /// The oracle offered no species for an unassigned slot.
    #[error("hypothesis construction found no species option for slot {slot}")]
    NoSpeciesOption { slot: usize },

    /// The oracle offered no level options.
    #[error("choice oracle returned no level options")]
    NoLevelOption,

    /// The population cannot be seeded before the opponent's lead is known.
    #[error("the opponent lead has not been revealed")]
    MissingLead,
}
