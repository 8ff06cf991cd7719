//! Owns the particle population, the shared evidence log, and the per-battle
//! facts (lead identity, legal species universe), and drives seeding,
//! re-weighting, replacement, and rank-proportional sampling.

use crate::belief::evidence::EvidenceLog;
use crate::belief::hypothesis::HypothesisTeam;
use crate::engine::{ChoiceOracle, RulesEngine};
use crate::error::InferenceError;
use crate::model::decision::Decision;
use crate::model::ids::SpeciesId;
use crate::model::reveal::OpponentView;
use crate::prob::{self, Prob};
use rand::Rng;

pub struct ParticlePopulation<E: RulesEngine, O> {
    particles: Vec<HypothesisTeam>,
    evidence: EvidenceLog<E::State>,
    lead: SpeciesId,
    species_universe: Vec<SpeciesId>,
    engine: E,
    oracle: O,
}

impl<E, O> ParticlePopulation<E, O>
where
    E: RulesEngine,
    O: ChoiceOracle<E::State>,
{
    /// Seeds `count` particles against the current ground truth. The lead and
    /// the legal species universe are computed once here and shared read-only
    /// by every particle for the rest of the battle.
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        engine: E,
        oracle: O,
        view: &OpponentView,
        rng: &mut R,
    ) -> Result<Self, InferenceError> {
        let lead = view
            .lead()
            .map(|p| p.species.clone())
            .ok_or(InferenceError::MissingLead)?;
        let species_universe: Vec<SpeciesId> = engine
            .all_species()
            .into_iter()
            .filter(|species| engine.species_is_legal(species))
            .collect();

        let checkpoint = (count / 10).max(1);
        let mut particles = Vec::with_capacity(count);
        for index in 0..count {
            if index % checkpoint == 0 {
                tracing::info!(done = index, total = count, "seeding hypothesis teams");
            }
            particles.push(HypothesisTeam::build(
                view,
                &lead,
                &species_universe,
                &engine,
                &oracle,
                rng,
            )?);
        }

        Ok(Self {
            particles,
            evidence: EvidenceLog::new(),
            lead,
            species_universe,
            engine,
            oracle,
        })
    }

    pub fn particles(&self) -> &[HypothesisTeam] {
        &self.particles
    }

    pub fn evidence(&self) -> &EvidenceLog<E::State> {
        &self.evidence
    }

    pub fn lead(&self) -> &SpeciesId {
        &self.lead
    }

    pub fn species_universe(&self) -> &[SpeciesId] {
        &self.species_universe
    }

    pub fn rank_total(&self) -> Prob {
        let mut total = Prob::zero();
        for particle in &self.particles {
            total += particle.rank();
        }
        total
    }

    /// Appends a state snapshot at a decision boundary. Only the orchestrator
    /// calls this, and only between population passes.
    pub fn record_state(&mut self, state: E::State) {
        self.evidence.record_state(state);
    }

    /// Attaches our own decision to the newest evidence entry.
    pub fn record_own_decision(&mut self, decision: Decision) -> bool {
        self.evidence.record_own_decision(decision)
    }

    /// Re-weights every particle against new ground truth and battle log,
    /// replacing falsified particles with fresh builds first.
    pub fn update_teams<R: Rng + ?Sized>(
        &mut self,
        view: &OpponentView,
        battle_log: &str,
        rng: &mut R,
    ) -> Result<(), InferenceError> {
        self.update_teams_with_progress(view, battle_log, rng, |_, _| {})
    }

    /// Like [`Self::update_teams`], invoking `checkpoint(done, total)` after
    /// each particle so an enclosing caller can yield between chunks (e.g. to
    /// keep a connection alive). Particles are processed strictly
    /// sequentially: each reconstruction must finish before the next begins.
    pub fn update_teams_with_progress<R, F>(
        &mut self,
        view: &OpponentView,
        battle_log: &str,
        rng: &mut R,
        mut checkpoint: F,
    ) -> Result<(), InferenceError>
    where
        R: Rng + ?Sized,
        F: FnMut(usize, usize),
    {
        let total = self.particles.len();
        let progress_step = (total / 10).max(1);

        for index in 0..total {
            if index % progress_step == 0 {
                tracing::info!(done = index, total, "updating hypothesis teams");
            }

            if !self.particles[index].is_still_feasible(view) {
                self.particles[index] = HypothesisTeam::build(
                    view,
                    &self.lead,
                    &self.species_universe,
                    &self.engine,
                    &self.oracle,
                    rng,
                )?;
            }
            self.particles[index].update_rank(
                view,
                &self.species_universe,
                battle_log,
                &self.evidence,
                &self.engine,
                &self.oracle,
            )?;

            checkpoint(index + 1, total);
        }
        Ok(())
    }

    /// Draws one particle with probability proportional to its rank.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&HypothesisTeam, InferenceError> {
        let index = prob::weighted_index(self.particles.iter().map(|p| p.rank()), rng)
            .ok_or(InferenceError::PopulationExhausted)?;
        Ok(&self.particles[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::Level;
    use crate::model::reveal::RevealedPokemon;
    use crate::oracle::UniformOracle;
    use crate::scripted::{ScriptedEngine, ScriptedState};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn lead_view() -> OpponentView {
        let mut view = OpponentView::new(3);
        view.record_pokemon(RevealedPokemon::new(
            SpeciesId::new("pikachu"),
            "Pikachu",
            Level(100),
        ));
        view
    }

    fn population(count: usize, seed: u64) -> ParticlePopulation<ScriptedEngine, UniformOracle> {
        let mut rng = SmallRng::seed_from_u64(seed);
        ParticlePopulation::new(
            count,
            ScriptedEngine::sample_dex(),
            UniformOracle::default(),
            &lead_view(),
            &mut rng,
        )
        .expect("seeding succeeds")
    }

    #[test]
    fn seeding_requires_a_lead() {
        let mut rng = SmallRng::seed_from_u64(1);
        let err = match ParticlePopulation::new(
            4,
            ScriptedEngine::sample_dex(),
            UniformOracle::default(),
            &OpponentView::new(3),
            &mut rng,
        ) {
            Ok(_) => panic!("seeding must fail before the lead is revealed"),
            Err(err) => err,
        };
        assert!(matches!(err, InferenceError::MissingLead));
    }

    #[test]
    fn universe_excludes_illegal_species() {
        let pop = population(2, 3);
        assert!(
            !pop.species_universe()
                .contains(&SpeciesId::new("missingno"))
        );
        assert!(pop.species_universe().contains(&SpeciesId::new("snorlax")));
    }

    #[test]
    fn sampling_follows_rank_proportions() {
        let mut pop = population(3, 5);
        pop.particles[0].set_rank(Prob::ratio(1, 1));
        pop.particles[1].set_rank(Prob::ratio(2, 1));
        pop.particles[2].set_rank(Prob::ratio(1, 1));

        let mut rng = SmallRng::seed_from_u64(99);
        let mut middle_hits = 0usize;
        let draws = 10_000usize;
        for _ in 0..draws {
            let picked = pop.sample(&mut rng).unwrap();
            if std::ptr::eq(picked, &pop.particles[1]) {
                middle_hits += 1;
            }
        }
        let share = middle_hits as f64 / draws as f64;
        assert!(
            (share - 0.5).abs() < 0.03,
            "particle with half the mass drawn {share} of the time"
        );
    }

    #[test]
    fn sampling_an_exhausted_population_fails() {
        let mut pop = population(3, 6);
        for particle in &mut pop.particles {
            particle.set_rank(Prob::zero());
        }
        let mut rng = SmallRng::seed_from_u64(1);
        let err = pop.sample(&mut rng).unwrap_err();
        assert!(matches!(err, InferenceError::PopulationExhausted));
    }

    #[test]
    fn zero_rank_particles_are_never_drawn() {
        let mut pop = population(2, 7);
        pop.particles[0].set_rank(Prob::zero());
        pop.particles[1].set_rank(Prob::ratio(1, 3));
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..64 {
            let picked = pop.sample(&mut rng).unwrap();
            assert!(std::ptr::eq(picked, &pop.particles[1]));
        }
    }

    #[test]
    fn infeasible_particles_are_replaced_on_update() {
        let mut pop = population(8, 8);
        let mut view = lead_view();
        view.record_pokemon(RevealedPokemon::new(
            SpeciesId::new("snorlax"),
            "Snorlax",
            Level(100),
        ));

        let mut rng = SmallRng::seed_from_u64(3);
        pop.update_teams(&view, "", &mut rng).unwrap();

        // Every surviving particle now carries snorlax at slot 1.
        for particle in pop.particles() {
            assert_eq!(particle.slots()[1].species, SpeciesId::new("snorlax"));
            assert!(particle.is_still_feasible(&view));
        }
    }

    #[test]
    fn progress_checkpoints_cover_every_particle() {
        let mut pop = population(5, 9);
        let view = lead_view();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut seen = Vec::new();
        pop.update_teams_with_progress(&view, "", &mut rng, |done, total| {
            seen.push((done, total));
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn turn_replay_consumes_the_log_incrementally() {
        let mut pop = population(4, 10);
        let view = lead_view();

        let menu = vec![
            crate::model::decision::Decision::Move(crate::model::ids::MoveId::new("thunderbolt")),
            crate::model::decision::Decision::Move(crate::model::ids::MoveId::new("quickattack")),
        ];
        let state = ScriptedState::new(Some(100), Some(120))
            .with_opponent("Pikachu", 0)
            .with_menu(menu);
        pop.record_state(state);
        pop.record_own_decision(crate::model::decision::Decision::Move(
            crate::model::ids::MoveId::new("surf"),
        ));

        let log = "|turn|1\n|move|p2a: Pikachu|Thunderbolt|p1a: Blastoise\n\
                   |move|p1a: Blastoise|Surf|p2a: Pikachu\n\n\
                   |turn|2\n|move|p2a: Pikachu|Thunderbolt|p1a: Blastoise\n\
                   |move|p1a: Blastoise|Surf|p2a: Pikachu";
        let mut rng = SmallRng::seed_from_u64(5);

        let before: Vec<Prob> = pop.particles().iter().map(|p| p.rank().clone()).collect();
        pop.update_teams(&view, log, &mut rng).unwrap();

        for (particle, old) in pop.particles().iter().zip(before) {
            assert_eq!(particle.turns_consumed(), 2);
            // Turn 1 has no evidence predecessor; turn 2 narrows a two-option
            // menu to one, so the rank halves exactly once.
            assert_eq!(particle.rank(), &old.halved());
        }

        // Replaying the same log again is a no-op.
        let before: Vec<Prob> = pop.particles().iter().map(|p| p.rank().clone()).collect();
        pop.update_teams(&view, log, &mut rng).unwrap();
        for (particle, old) in pop.particles().iter().zip(before) {
            assert_eq!(particle.rank(), &old);
        }
    }
}
