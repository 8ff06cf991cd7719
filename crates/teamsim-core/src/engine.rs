//! Boundary contracts to the external battle rules engine and decision-prior
//! oracle. The inference core calls through these traits and never implements
//! battle mechanics itself.

use crate::model::decision::{Decision, Weighted, WeightedDecision};
use crate::model::ids::{Level, MoveId, SpeciesId};
use crate::model::slot::SlotGuess;
use std::collections::BTreeSet;
use thiserror::Error;

/// One entry of an unfinished team as it existed when a choice was made:
/// the species plus the moves decided strictly before that choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSketch {
    pub species: SpeciesId,
    pub moves: Vec<MoveId>,
}

/// Failure raised by the engine while completing a battle state or generating
/// a request menu from it.
#[derive(Debug, Error)]
#[error("battle reconstruction failed: {0}")]
pub struct ReconstructionError(pub String);

/// The authoritative battle rules engine.
///
/// `complete_state` must behave as a pure function from (immutable snapshot,
/// immutable hypothesis roster) to a new authoritative state: install an
/// opponent-side Pokémon for every roster slot, rescale in-battle HP and stats
/// proportionally when a slot refines level or stats, and regenerate each
/// usable-move list from the slot's move list, carrying forward a virtual
/// replacement move already in effect (e.g. a copying move overwritten during
/// play) instead of regenerating it naively. Any engine-side mutation must be
/// scoped and rolled back before the call returns.
pub trait RulesEngine {
    type State: Clone;

    /// Every species the game data knows about, across all generations.
    fn all_species(&self) -> Vec<SpeciesId>;

    /// Whether a bare set with this species passes format validation.
    fn species_is_legal(&self, species: &SpeciesId) -> bool;

    /// The moves this exact species can learn, excluding pre-evolutions.
    fn learnset(&self, species: &SpeciesId) -> Option<&BTreeSet<MoveId>>;

    /// The species this one evolved from, if any.
    fn prevo(&self, species: &SpeciesId) -> Option<SpeciesId>;

    /// Validates a partial set; an empty problem list means legal.
    fn validate_set(&self, species: &SpeciesId, moves: &[MoveId]) -> Vec<String>;

    fn move_priority(&self, mv: &MoveId) -> i32;

    /// Action speed of our active Pokémon, or `None` when nothing is active.
    fn own_action_speed(&self, state: &Self::State) -> Option<u32>;

    /// Action speed of the opponent's active Pokémon.
    fn opponent_action_speed(&self, state: &Self::State) -> Option<u32>;

    /// Maps an in-battle name from a switch event to the opponent slot index.
    fn opponent_slot_by_name(&self, state: &Self::State, name: &str) -> Option<usize>;

    /// Completes a snapshot into an authoritative state carrying the
    /// hypothesis roster on the opponent side. See the trait docs for the
    /// reconstruction contract.
    fn complete_state(
        &self,
        state: &Self::State,
        roster: &[SlotGuess],
    ) -> Result<Self::State, ReconstructionError>;

    /// The opponent's legal-option menu at this decision point, or `None`
    /// when the opponent had nothing to decide (a wait request).
    ///
    /// Callers retry this exactly once on error before giving up.
    fn opponent_menu(
        &self,
        state: &Self::State,
    ) -> Result<Option<Vec<Decision>>, ReconstructionError>;
}

/// External prior-probability supplier over team-building and turn choices.
///
/// Probabilities within each returned list sum to 1; consumers never
/// renormalize. An empty list means the oracle has no opinion and the caller
/// treats every candidate as impossible.
pub trait ChoiceOracle<S> {
    fn species_options(
        &self,
        unfinished: &[TeamSketch],
        universe: &[SpeciesId],
    ) -> Vec<Weighted<SpeciesId>>;

    fn level_options(&self, unfinished: &[TeamSketch]) -> Vec<Weighted<Level>>;

    fn move_options(&self, unfinished: &[TeamSketch], legal: &[MoveId]) -> Vec<Weighted<MoveId>>;

    /// Priors over a turn's legal-option menu, conditioned on the battle state.
    fn decision_options(&self, state: &S, menu: &[Decision]) -> Vec<WeightedDecision>;
}
