//! One particle: a full slot-by-slot guess of the opponent roster plus a
//! likelihood weight and a cursor into consumed evidence.

use crate::belief::evidence::{EvidenceEntry, EvidenceLog};
use crate::belief::resolver::{self, FALLBACK_SPEED, OrderFacts};
use crate::engine::{ChoiceOracle, RulesEngine, TeamSketch};
use crate::error::InferenceError;
use crate::model::decision::Side;
use crate::model::ids::{MoveId, SpeciesId};
use crate::model::reveal::OpponentView;
use crate::model::slot::{ConfirmedSlot, MAX_MOVES, SlotGuess};
use crate::prob::{self, Prob};
use rand::Rng;

/// Maps a position in the reveal-ordered opponent list onto a roster slot:
/// the lead is pinned at slot 0 and everything else keeps its order.
fn slot_for_reveal(lead_index: usize, reveal_index: usize) -> usize {
    if reveal_index == lead_index {
        0
    } else if reveal_index < lead_index {
        reveal_index + 1
    } else {
        reveal_index
    }
}

/// The inverse mapping: which reveal-list position feeds a slot.
fn reveal_for_slot(lead_index: usize, slot_index: usize) -> usize {
    if slot_index == 0 {
        lead_index
    } else if slot_index <= lead_index {
        slot_index - 1
    } else {
        slot_index
    }
}

#[derive(Debug, Clone)]
pub struct HypothesisTeam {
    slots: Vec<SlotGuess>,
    confirmed: Vec<ConfirmedSlot>,
    rank: Prob,
    turns_consumed: usize,
}

impl HypothesisTeam {
    /// Builds a full roster consistent with current ground truth, filling
    /// unknown slots by oracle draws restricted to legality-approved options,
    /// then folds the already-revealed facts into the rank so a fresh particle
    /// is comparable with survivors.
    pub fn build<E, O, R>(
        view: &OpponentView,
        lead: &SpeciesId,
        universe: &[SpeciesId],
        engine: &E,
        oracle: &O,
        rng: &mut R,
    ) -> Result<Self, InferenceError>
    where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
        R: Rng + ?Sized,
    {
        let lead_index = view
            .pokemon()
            .iter()
            .position(|p| &p.species == lead)
            .unwrap_or(0);
        let size = view.max_team_size();
        let mut slots: Vec<SlotGuess> = Vec::with_capacity(size);

        for slot_index in 0..size {
            let revealed = view.pokemon().get(reveal_for_slot(lead_index, slot_index));

            let slot = match revealed {
                Some(revealed) => {
                    let mut slot = SlotGuess::new(revealed.species.clone(), revealed.level);
                    slot.name = Some(revealed.name.clone());
                    slot
                }
                None => {
                    let unfinished = sketch_all(&slots);
                    let species_options = oracle.species_options(&unfinished, universe);
                    let pick = prob::weighted_index(
                        species_options.iter().map(|o| &o.probability),
                        rng,
                    )
                    .ok_or(InferenceError::NoSpeciesOption { slot: slot_index })?;
                    let species = species_options[pick].value.clone();

                    let level_options = oracle.level_options(&unfinished);
                    let pick =
                        prob::weighted_index(level_options.iter().map(|o| &o.probability), rng)
                            .ok_or(InferenceError::NoLevelOption)?;
                    SlotGuess::new(species, level_options[pick].value)
                }
            };
            slots.push(slot);

            for move_index in 0..MAX_MOVES {
                let legal = legal_move_options(engine, &slots, slot_index, move_index);
                if legal.is_empty() {
                    break;
                }

                // A real observed move short-circuits sampling.
                let mv = match revealed.and_then(|r| r.moves.get(move_index)) {
                    Some(mv) => mv.clone(),
                    None => {
                        let unfinished = sketch_all(&slots);
                        let options = oracle.move_options(&unfinished, &legal);
                        let Some(pick) =
                            prob::weighted_index(options.iter().map(|o| &o.probability), rng)
                        else {
                            break;
                        };
                        options[pick].value.clone()
                    }
                };
                if !slots[slot_index].push_move(mv) {
                    break;
                }
            }
        }

        let confirmed = vec![ConfirmedSlot::new(); size];
        let mut team = Self {
            slots,
            confirmed,
            rank: Prob::one(),
            turns_consumed: 0,
        };
        team.update_team_building_rank(view, universe, engine, oracle)?;
        Ok(team)
    }

    pub fn slots(&self) -> &[SlotGuess] {
        &self.slots
    }

    pub fn confirmed(&self) -> &[ConfirmedSlot] {
        &self.confirmed
    }

    pub fn rank(&self) -> &Prob {
        &self.rank
    }

    pub fn turns_consumed(&self) -> usize {
        self.turns_consumed
    }

    #[cfg(test)]
    pub(crate) fn set_rank(&mut self, rank: Prob) {
        self.rank = rank;
    }

    /// The legal move set for a slot at a given move position: the unioned
    /// movepool of the species' whole pre-evolution chain, minus moves already
    /// chosen, filtered through set validation.
    pub fn legal_move_options<E: RulesEngine>(
        &self,
        engine: &E,
        slot_index: usize,
        move_index: usize,
    ) -> Vec<MoveId> {
        legal_move_options(engine, &self.slots, slot_index, move_index)
    }

    /// A hypothesis is infeasible the moment ground truth holds any species,
    /// level, or move the matching slot does not.
    pub fn is_still_feasible(&self, view: &OpponentView) -> bool {
        let Some(lead_index) = self.lead_index(view) else {
            return view.pokemon().is_empty();
        };
        for (reveal_index, revealed) in view.pokemon().iter().enumerate() {
            let slot_index = slot_for_reveal(lead_index, reveal_index);
            let Some(slot) = self.slots.get(slot_index) else {
                return false;
            };
            if slot.species != revealed.species || slot.level != revealed.level {
                return false;
            }
            if revealed.moves.iter().any(|mv| !slot.has_move(mv)) {
                return false;
            }
        }
        true
    }

    /// Channel 1 of the likelihood update: whenever ground truth newly reveals
    /// a species/level/move this hypothesis already guessed, multiply the rank
    /// by the oracle probability of that exact choice conditioned on the
    /// unfinished team as it existed when the choice was made. Each fact is
    /// priced exactly once, when it transitions to confirmed.
    pub fn update_team_building_rank<E, O>(
        &mut self,
        view: &OpponentView,
        universe: &[SpeciesId],
        engine: &E,
        oracle: &O,
    ) -> Result<(), InferenceError>
    where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
    {
        let Some(lead_index) = self.lead_index(view) else {
            return Ok(());
        };

        for (reveal_index, revealed) in view.pokemon().iter().enumerate() {
            let slot_index = slot_for_reveal(lead_index, reveal_index);
            if slot_index >= self.slots.len() {
                return Err(InferenceError::TeamOverflow {
                    species: revealed.species.clone(),
                    team_size: self.slots.len(),
                });
            }

            if self.confirmed[slot_index].species().is_none() {
                self.price_species_and_level::<E, O>(slot_index, revealed, universe, oracle);
            }

            for mv in &revealed.moves {
                if self.confirmed[slot_index].moves().contains(mv) {
                    continue;
                }
                self.confirmed[slot_index].confirm_move(mv.clone());
                self.price_move(slot_index, mv, engine, oracle);
            }
        }
        Ok(())
    }

    fn price_species_and_level<E, O>(
        &mut self,
        slot_index: usize,
        revealed: &crate::model::reveal::RevealedPokemon,
        universe: &[SpeciesId],
        oracle: &O,
    ) where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
    {
        let unfinished = sketch_prefix(&self.slots, slot_index);

        let species_options = oracle.species_options(&unfinished, universe);
        match species_options
            .into_iter()
            .find(|o| o.value == revealed.species)
        {
            Some(option) => self.rank *= option.probability,
            None => self.rank = Prob::zero(),
        }

        let level_options = oracle.level_options(&unfinished);
        match level_options
            .into_iter()
            .find(|o| o.value == revealed.level)
        {
            Some(option) => self.rank *= option.probability,
            None => self.rank = Prob::zero(),
        }

        self.confirmed[slot_index].confirm_species(revealed.species.clone());
        self.confirmed[slot_index].confirm_level(revealed.level);
        self.confirmed[slot_index].confirm_name(revealed.name.clone());
        if self.slots[slot_index].name.is_none() {
            self.slots[slot_index].name = Some(revealed.name.clone());
        }
    }

    fn price_move<E, O>(&mut self, slot_index: usize, mv: &MoveId, engine: &E, oracle: &O)
    where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
    {
        // Feasibility ran first, so a missing move means zero mass, not a bug.
        let Some(move_index) = self.slots[slot_index].move_index(mv) else {
            self.rank = Prob::zero();
            return;
        };

        let mut unfinished = sketch_prefix(&self.slots, slot_index);
        unfinished.push(TeamSketch {
            species: self.slots[slot_index].species.clone(),
            moves: self.slots[slot_index].moves()[..move_index].to_vec(),
        });

        let legal = legal_move_options(engine, &self.slots, slot_index, move_index);
        let options = oracle.move_options(&unfinished, &legal);
        match options.into_iter().find(|o| &o.value == mv) {
            Some(option) => self.rank *= option.probability,
            None => self.rank = Prob::zero(),
        }
    }

    /// Channel 2 plus orchestration: folds every not-yet-consumed turn of the
    /// battle log into the rank, replaying each against the matching evidence
    /// entry, then advances the cursor.
    ///
    /// The orchestrator records one evidence entry per decision boundary. A
    /// turn whose entry is missing is logged at warn level and skipped, and
    /// its likelihood factor is dropped for good once the cursor moves past
    /// it; the rank stays a valid (if coarser) posterior weight.
    pub fn update_rank<E, O>(
        &mut self,
        view: &OpponentView,
        universe: &[SpeciesId],
        battle_log: &str,
        evidence: &EvidenceLog<E::State>,
        engine: &E,
        oracle: &O,
    ) -> Result<(), InferenceError>
    where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
    {
        self.update_team_building_rank(view, universe, engine, oracle)?;

        let turns: Vec<&str> = battle_log
            .split("\n\n")
            .filter(|chunk| {
                chunk.contains("|switch|") || chunk.contains("|move|") || chunk.contains("|cant|")
            })
            .collect();

        let start = self.turns_consumed.min(turns.len());
        for (offset, turn_log) in turns[start..].iter().enumerate() {
            let absolute = start + offset;
            // The first decision boundary predates any snapshot.
            if absolute == 0 {
                continue;
            }
            let Some(entry) = evidence.entry(absolute - 1) else {
                tracing::warn!(turn = absolute, "no evidence entry for turn, skipping");
                continue;
            };
            self.update_rank_for_turn(turn_log, entry, engine, oracle)?;
        }
        self.turns_consumed = turns.len();
        Ok(())
    }

    /// Replays one turn: completes the snapshot into an authoritative state,
    /// obtains the opponent's menu (one retry), narrows it through the order
    /// resolver, and multiplies the rank by consistent mass over total mass.
    fn update_rank_for_turn<E, O>(
        &mut self,
        turn_log: &str,
        entry: &EvidenceEntry<E::State>,
        engine: &E,
        oracle: &O,
    ) -> Result<(), InferenceError>
    where
        E: RulesEngine,
        O: ChoiceOracle<E::State>,
    {
        let completed = engine
            .complete_state(entry.state(), &self.slots)
            .map_err(|source| InferenceError::Reconstruction {
                context: "completing the battle state".into(),
                source,
            })?;

        let menu = match engine.opponent_menu(&completed) {
            Ok(menu) => menu,
            Err(first) => {
                tracing::warn!(error = %first, "request generation failed, retrying once");
                engine
                    .opponent_menu(&completed)
                    .map_err(|source| InferenceError::Reconstruction {
                        context: "generating the opponent request menu".into(),
                        source,
                    })?
            }
        };
        let Some(menu) = menu else {
            // Wait request: the opponent had nothing to decide this turn.
            return Ok(());
        };

        let options = oracle.decision_options(&completed, &menu);
        let mut total = Prob::zero();
        for option in &options {
            total += &option.probability;
        }
        let candidates_desc = options
            .iter()
            .map(|o| o.value.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let facts = OrderFacts {
            own_side: Side::P1,
            own_decision: entry.own_decision().cloned(),
            own_speed: engine.own_action_speed(&completed).unwrap_or(FALLBACK_SPEED),
            opp_speed: engine
                .opponent_action_speed(&completed)
                .unwrap_or(FALLBACK_SPEED),
        };

        let consistent = resolver::resolve(engine, &completed, turn_log, &facts, options);
        if consistent.is_empty() {
            return Err(InferenceError::ResolutionExhausted {
                turn_log: turn_log.to_string(),
                candidates: candidates_desc,
                menu_json: serde_json::to_string(&menu)
                    .unwrap_or_else(|_| "<unserializable>".into()),
            });
        }

        if total.is_zero() {
            self.rank = Prob::zero();
            return Ok(());
        }
        let mut mass = Prob::zero();
        for option in &consistent {
            mass += &option.probability;
        }
        self.rank = self.rank.clone() * (mass / total);
        Ok(())
    }

    fn lead_index(&self, view: &OpponentView) -> Option<usize> {
        let lead = &self.slots.first()?.species;
        view.pokemon()
            .iter()
            .position(|p| &p.species == lead)
            .or(if view.pokemon().is_empty() { None } else { Some(0) })
    }
}

fn sketch_all(slots: &[SlotGuess]) -> Vec<TeamSketch> {
    sketch_prefix(slots, slots.len())
}

/// The unfinished team as it existed before `upto` was decided: every earlier
/// slot with its full move list.
fn sketch_prefix(slots: &[SlotGuess], upto: usize) -> Vec<TeamSketch> {
    slots[..upto.min(slots.len())]
        .iter()
        .map(|slot| TeamSketch {
            species: slot.species.clone(),
            moves: slot.moves().to_vec(),
        })
        .collect()
}

fn legal_move_options<E: RulesEngine>(
    engine: &E,
    slots: &[SlotGuess],
    slot_index: usize,
    move_index: usize,
) -> Vec<MoveId> {
    let slot = &slots[slot_index];
    let chosen = &slot.moves()[..move_index.min(slot.moves().len())];

    // Union learnable moves across the whole pre-evolution chain.
    let mut pool: Vec<MoveId> = Vec::new();
    let mut cursor = Some(slot.species.clone());
    while let Some(species) = cursor {
        let Some(learnset) = engine.learnset(&species) else {
            break;
        };
        for mv in learnset {
            if !pool.contains(mv) {
                pool.push(mv.clone());
            }
        }
        cursor = engine.prevo(&species);
    }

    pool.retain(|mv| {
        if chosen.contains(mv) {
            return false;
        }
        let mut candidate = chosen.to_vec();
        candidate.push(mv.clone());
        engine.validate_set(&slot.species, &candidate).is_empty()
    });
    pool
}
