use crate::model::ids::{Level, MoveId, SpeciesId};
use serde::{Deserialize, Serialize};

/// Ground truth about one opponent Pokémon as exposed through play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedPokemon {
    pub species: SpeciesId,
    /// In-battle name, as it appears in log lines.
    pub name: String,
    pub level: Level,
    /// Moves observed so far, in reveal order.
    pub moves: Vec<MoveId>,
}

impl RevealedPokemon {
    pub fn new(species: SpeciesId, name: impl Into<String>, level: Level) -> Self {
        Self {
            species,
            name: name.into(),
            level,
            moves: Vec::new(),
        }
    }
}

/// The orchestrator-maintained mirror of everything the game has revealed
/// about the opponent side.
///
/// Pokémon are listed in first-reveal order and that order is stable for the
/// whole battle; the first entry is the opponent's lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentView {
    pokemon: Vec<RevealedPokemon>,
    max_team_size: usize,
}

impl OpponentView {
    pub fn new(max_team_size: usize) -> Self {
        Self {
            pokemon: Vec::new(),
            max_team_size,
        }
    }

    pub fn pokemon(&self) -> &[RevealedPokemon] {
        &self.pokemon
    }

    pub fn max_team_size(&self) -> usize {
        self.max_team_size
    }

    pub fn lead(&self) -> Option<&RevealedPokemon> {
        self.pokemon.first()
    }

    /// Records a newly revealed Pokémon. No-op when the species is already known.
    pub fn record_pokemon(&mut self, revealed: RevealedPokemon) {
        if self.find(&revealed.species).is_none() {
            self.pokemon.push(revealed);
        }
    }

    /// Records a revealed move for an already-known species.
    /// Returns false when the species has not been revealed.
    pub fn record_move(&mut self, species: &SpeciesId, mv: MoveId) -> bool {
        match self.pokemon.iter_mut().find(|p| &p.species == species) {
            Some(p) => {
                if !p.moves.contains(&mv) {
                    p.moves.push(mv);
                }
                true
            }
            None => false,
        }
    }

    pub fn find(&self, species: &SpeciesId) -> Option<&RevealedPokemon> {
        self.pokemon.iter().find(|p| &p.species == species)
    }
}
