//! Baseline prior supplier assigning uniform mass over each option set.

use crate::engine::{ChoiceOracle, TeamSketch};
use crate::model::decision::{Decision, Weighted, WeightedDecision};
use crate::model::ids::{Level, MoveId, SpeciesId};
use crate::prob::Prob;

/// Uniform priors over species, levels, moves, and turn decisions.
///
/// Species options exclude species already placed on the unfinished team, so
/// the returned distribution is conditioned the same way a learned oracle
/// would condition it.
#[derive(Debug, Clone)]
pub struct UniformOracle {
    levels: Vec<Level>,
}

impl UniformOracle {
    pub fn new(levels: impl IntoIterator<Item = u8>) -> Self {
        let levels: Vec<Level> = levels.into_iter().map(Level).collect();
        assert!(!levels.is_empty(), "uniform oracle needs at least one level");
        Self { levels }
    }
}

impl Default for UniformOracle {
    fn default() -> Self {
        Self::new([100])
    }
}

fn uniform<T>(values: Vec<T>) -> Vec<Weighted<T>> {
    let count = values.len() as u64;
    values
        .into_iter()
        .map(|value| Weighted::new(value, Prob::ratio(1, count)))
        .collect()
}

impl<S> ChoiceOracle<S> for UniformOracle {
    fn species_options(
        &self,
        unfinished: &[TeamSketch],
        universe: &[SpeciesId],
    ) -> Vec<Weighted<SpeciesId>> {
        let fresh: Vec<SpeciesId> = universe
            .iter()
            .filter(|species| !unfinished.iter().any(|sketch| &&sketch.species == species))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Vec::new();
        }
        uniform(fresh)
    }

    fn level_options(&self, _unfinished: &[TeamSketch]) -> Vec<Weighted<Level>> {
        uniform(self.levels.clone())
    }

    fn move_options(&self, _unfinished: &[TeamSketch], legal: &[MoveId]) -> Vec<Weighted<MoveId>> {
        if legal.is_empty() {
            return Vec::new();
        }
        uniform(legal.to_vec())
    }

    fn decision_options(&self, _state: &S, menu: &[Decision]) -> Vec<WeightedDecision> {
        if menu.is_empty() {
            return Vec::new();
        }
        uniform(menu.to_vec())
    }
}
