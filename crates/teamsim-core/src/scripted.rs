//! A scripted stand-in for the battle rules engine: a tiny hand-built dex
//! with pre-evolutions, bans, move priorities, and fully prescripted battle
//! states. The bench harness and the test suite share it, which keeps every
//! inference path exercisable without a real battle engine behind it.

use crate::engine::{ReconstructionError, RulesEngine};
use crate::model::decision::Decision;
use crate::model::ids::{MoveId, SpeciesId};
use crate::model::slot::SlotGuess;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct SpeciesEntry {
    learnset: BTreeSet<MoveId>,
    prevo: Option<SpeciesId>,
    banned: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    dex: BTreeMap<SpeciesId, SpeciesEntry>,
    priorities: BTreeMap<MoveId, i32>,
    incompatible: Vec<(MoveId, MoveId)>,
    menu_failures: Cell<u32>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species<'a, I>(mut self, id: &str, moves: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entry = self.dex.entry(SpeciesId::new(id)).or_default();
        entry.learnset.extend(moves.into_iter().map(MoveId::new));
        self
    }

    pub fn evolves_from(mut self, id: &str, prevo: &str) -> Self {
        if let Some(entry) = self.dex.get_mut(&SpeciesId::new(id)) {
            entry.prevo = Some(SpeciesId::new(prevo));
        }
        self
    }

    pub fn ban_species(mut self, id: &str) -> Self {
        if let Some(entry) = self.dex.get_mut(&SpeciesId::new(id)) {
            entry.banned = true;
        }
        self
    }

    pub fn priority(mut self, mv: &str, priority: i32) -> Self {
        self.priorities.insert(MoveId::new(mv), priority);
        self
    }

    pub fn incompatible(mut self, a: &str, b: &str) -> Self {
        self.incompatible.push((MoveId::new(a), MoveId::new(b)));
        self
    }

    /// Arms the next `count` calls to `opponent_menu` to fail.
    pub fn inject_menu_failures(&self, count: u32) {
        self.menu_failures.set(count);
    }

    /// A small fixed dex with one evolution line, one banned species, and a
    /// pair of priority moves.
    pub fn sample_dex() -> Self {
        Self::new()
            .species("pichu", ["thundershock", "charm"])
            .species("pikachu", ["thunderbolt", "quickattack", "irontail", "surf"])
            .evolves_from("pikachu", "pichu")
            .species("snorlax", ["bodyslam", "rest", "hyperbeam", "earthquake"])
            .species("gengar", ["shadowball", "hypnosis", "suckerpunch", "thunderbolt"])
            .species("charizard", ["flamethrower", "earthquake", "roost", "dragonclaw"])
            .species("missingno", ["splash"])
            .ban_species("missingno")
            .priority("quickattack", 1)
            .priority("suckerpunch", 1)
            .incompatible("rest", "hyperbeam")
    }

    fn chain_learns(&self, species: &SpeciesId, mv: &MoveId) -> bool {
        let mut cursor = Some(species.clone());
        while let Some(species) = cursor {
            let Some(entry) = self.dex.get(&species) else {
                return false;
            };
            if entry.learnset.contains(mv) {
                return true;
            }
            cursor = entry.prevo.clone();
        }
        false
    }
}

/// One prescripted decision boundary: active speeds, the opponent names seen
/// so far, and the opponent's legal-option menu (absent for wait requests).
#[derive(Debug, Clone, Default)]
pub struct ScriptedState {
    own_speed: Option<u32>,
    opp_speed: Option<u32>,
    opp_names: Vec<(String, usize)>,
    menu: Option<Vec<Decision>>,
}

impl ScriptedState {
    pub fn new(own_speed: Option<u32>, opp_speed: Option<u32>) -> Self {
        Self {
            own_speed,
            opp_speed,
            opp_names: Vec::new(),
            menu: None,
        }
    }

    pub fn with_opponent(mut self, name: &str, slot: usize) -> Self {
        self.opp_names.push((name.to_string(), slot));
        self
    }

    pub fn with_menu(mut self, menu: Vec<Decision>) -> Self {
        self.menu = Some(menu);
        self
    }
}

impl RulesEngine for ScriptedEngine {
    type State = ScriptedState;

    fn all_species(&self) -> Vec<SpeciesId> {
        self.dex.keys().cloned().collect()
    }

    fn species_is_legal(&self, species: &SpeciesId) -> bool {
        self.validate_set(species, &[]).is_empty()
    }

    fn learnset(&self, species: &SpeciesId) -> Option<&BTreeSet<MoveId>> {
        self.dex.get(species).map(|entry| &entry.learnset)
    }

    fn prevo(&self, species: &SpeciesId) -> Option<SpeciesId> {
        self.dex.get(species).and_then(|entry| entry.prevo.clone())
    }

    fn validate_set(&self, species: &SpeciesId, moves: &[MoveId]) -> Vec<String> {
        let mut problems = Vec::new();
        match self.dex.get(species) {
            None => problems.push(format!("unknown species {species}")),
            Some(entry) => {
                if entry.banned {
                    problems.push(format!("{species} is banned"));
                }
                for mv in moves {
                    if !self.chain_learns(species, mv) {
                        problems.push(format!("{species} cannot learn {mv}"));
                    }
                }
            }
        }
        for (a, b) in &self.incompatible {
            if moves.contains(a) && moves.contains(b) {
                problems.push(format!("{a} is incompatible with {b}"));
            }
        }
        problems
    }

    fn move_priority(&self, mv: &MoveId) -> i32 {
        self.priorities.get(mv).copied().unwrap_or(0)
    }

    fn own_action_speed(&self, state: &Self::State) -> Option<u32> {
        state.own_speed
    }

    fn opponent_action_speed(&self, state: &Self::State) -> Option<u32> {
        state.opp_speed
    }

    fn opponent_slot_by_name(&self, state: &Self::State, name: &str) -> Option<usize> {
        state
            .opp_names
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, slot)| *slot)
    }

    fn complete_state(
        &self,
        state: &Self::State,
        roster: &[SlotGuess],
    ) -> Result<Self::State, ReconstructionError> {
        let mut completed = state.clone();
        for (slot, guess) in roster.iter().enumerate() {
            let Some(name) = &guess.name else {
                continue;
            };
            if !completed.opp_names.iter().any(|(known, _)| known == name) {
                completed.opp_names.push((name.clone(), slot));
            }
        }
        Ok(completed)
    }

    fn opponent_menu(
        &self,
        state: &Self::State,
    ) -> Result<Option<Vec<Decision>>, ReconstructionError> {
        let pending = self.menu_failures.get();
        if pending > 0 {
            self.menu_failures.set(pending - 1);
            return Err(ReconstructionError("scripted menu failure".into()));
        }
        Ok(state.menu.clone())
    }
}
