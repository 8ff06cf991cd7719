use crate::model::ids::{Level, MoveId, SpeciesId};
use serde::{Deserialize, Serialize};

/// Maximum number of moves a Pokémon can carry.
pub const MAX_MOVES: usize = 4;

/// One roster slot of a hypothesis team.
///
/// Moves are append-only: once pushed they are never reordered or removed, so
/// a move's index is stable for the life of the hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGuess {
    pub species: SpeciesId,
    pub name: Option<String>,
    pub level: Level,
    moves: Vec<MoveId>,
}

impl SlotGuess {
    pub fn new(species: SpeciesId, level: Level) -> Self {
        Self {
            species,
            name: None,
            level,
            moves: Vec::new(),
        }
    }

    pub fn moves(&self) -> &[MoveId] {
        &self.moves
    }

    pub fn has_move(&self, mv: &MoveId) -> bool {
        self.moves.contains(mv)
    }

    pub fn move_index(&self, mv: &MoveId) -> Option<usize> {
        self.moves.iter().position(|m| m == mv)
    }

    /// Appends a move, rejecting duplicates and overflow past [`MAX_MOVES`].
    pub fn push_move(&mut self, mv: MoveId) -> bool {
        if self.moves.len() >= MAX_MOVES || self.moves.contains(&mv) {
            return false;
        }
        self.moves.push(mv);
        true
    }
}

/// Write-once record of which facts about a slot are evidence-backed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedSlot {
    species: Option<SpeciesId>,
    name: Option<String>,
    level: Option<Level>,
    moves: Vec<MoveId>,
}

impl ConfirmedSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species(&self) -> Option<&SpeciesId> {
        self.species.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn level(&self) -> Option<Level> {
        self.level
    }

    pub fn moves(&self) -> &[MoveId] {
        &self.moves
    }

    /// Records the species; returns false when one is already confirmed.
    pub fn confirm_species(&mut self, species: SpeciesId) -> bool {
        if self.species.is_some() {
            return false;
        }
        self.species = Some(species);
        true
    }

    pub fn confirm_name(&mut self, name: String) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    pub fn confirm_level(&mut self, level: Level) -> bool {
        if self.level.is_some() {
            return false;
        }
        self.level = Some(level);
        true
    }

    /// Records a confirmed move; returns false when it is already recorded.
    pub fn confirm_move(&mut self, mv: MoveId) -> bool {
        if self.moves.contains(&mv) {
            return false;
        }
        self.moves.push(mv);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> SlotGuess {
        SlotGuess::new(SpeciesId::new("snorlax"), Level(100))
    }

    #[test]
    fn moves_cap_at_four() {
        let mut s = slot();
        for name in ["bodyslam", "rest", "hyperbeam", "earthquake"] {
            assert!(s.push_move(MoveId::new(name)));
        }
        assert!(!s.push_move(MoveId::new("curse")));
        assert_eq!(s.moves().len(), MAX_MOVES);
    }

    #[test]
    fn duplicate_moves_rejected() {
        let mut s = slot();
        assert!(s.push_move(MoveId::new("rest")));
        assert!(!s.push_move(MoveId::new("rest")));
        assert_eq!(s.moves().len(), 1);
    }

    #[test]
    fn confirmed_fields_are_write_once() {
        let mut c = ConfirmedSlot::new();
        assert!(c.confirm_species(SpeciesId::new("snorlax")));
        assert!(!c.confirm_species(SpeciesId::new("gengar")));
        assert_eq!(c.species(), Some(&SpeciesId::new("snorlax")));

        assert!(c.confirm_level(Level(100)));
        assert!(!c.confirm_level(Level(50)));
        assert_eq!(c.level(), Some(Level(100)));

        assert!(c.confirm_move(MoveId::new("rest")));
        assert!(!c.confirm_move(MoveId::new("rest")));
        assert_eq!(c.moves().len(), 1);
    }
}
