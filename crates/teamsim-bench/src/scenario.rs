//! A fixed scripted battle driven end to end through the inference engine:
//! three observed turns with a lead reveal, a switch reveal, and a move
//! reveal, finishing with a rank-proportional team sample.

use std::fmt;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use teamsim_core::belief::ParticlePopulation;
use teamsim_core::model::decision::Decision;
use teamsim_core::model::ids::{Level, MoveId, SpeciesId};
use teamsim_core::model::reveal::{OpponentView, RevealedPokemon};
use teamsim_core::oracle::UniformOracle;
use teamsim_core::scripted::{ScriptedEngine, ScriptedState};

const TURN_1: &str = "|turn|1\n\
    |move|p2a: Pikachu|Thunderbolt|p1a: Blastoise\n\
    |move|p1a: Blastoise|Surf|p2a: Pikachu";
const TURN_2: &str = "|turn|2\n\
    |move|p2a: Pikachu|Thunderbolt|p1a: Blastoise\n\
    |move|p1a: Blastoise|Surf|p2a: Pikachu";
const TURN_3: &str = "|turn|3\n\
    |switch|p2a: Snorlax|Snorlax, L100|524/524\n\
    |move|p1a: Blastoise|Surf|p2a: Snorlax";
const TURN_4: &str = "|turn|4\n\
    |move|p1a: Blastoise|Surf|p2a: Snorlax\n\
    |move|p2a: Snorlax|Body Slam|p1a: Blastoise";

pub struct Summary {
    pub particles: usize,
    pub turns: usize,
    pub rank_total: f64,
    pub sampled_team: Vec<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Inference complete: {} hypothesis teams over {} turns, total rank {:.3e}",
            self.particles, self.turns, self.rank_total
        )?;
        write!(f, "Sampled team: {}", self.sampled_team.join(" / "))
    }
}

fn pikachu_menu() -> Vec<Decision> {
    vec![
        Decision::Move(MoveId::new("thunderbolt")),
        Decision::Move(MoveId::new("quickattack")),
        Decision::Switch(1),
    ]
}

fn snorlax_menu() -> Vec<Decision> {
    vec![
        Decision::Move(MoveId::new("bodyslam")),
        Decision::Move(MoveId::new("rest")),
        Decision::Switch(0),
    ]
}

fn surf() -> Decision {
    Decision::Move(MoveId::new("surf"))
}

pub fn run(particles: usize, seed: u64) -> Result<Summary> {
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut view = OpponentView::new(3);
    view.record_pokemon(RevealedPokemon::new(
        SpeciesId::new("pikachu"),
        "Pikachu",
        Level(100),
    ));

    tracing::info!(particles, seed, "seeding hypothesis population");
    let mut pop = ParticlePopulation::new(
        particles,
        ScriptedEngine::sample_dex(),
        UniformOracle::default(),
        &view,
        &mut rng,
    )?;

    pop.record_state(
        ScriptedState::new(Some(100), Some(120))
            .with_opponent("Pikachu", 0)
            .with_menu(pikachu_menu()),
    );
    pop.record_own_decision(surf());

    let log = format!("{TURN_1}\n\n{TURN_2}");
    pop.update_teams(&view, &log, &mut rng)?;
    tracing::info!(rank_total = pop.rank_total().to_f64(), "turn 2 folded in");

    pop.record_state(
        ScriptedState::new(Some(100), Some(120))
            .with_opponent("Pikachu", 0)
            .with_menu(pikachu_menu()),
    );
    pop.record_own_decision(surf());
    view.record_pokemon(RevealedPokemon::new(
        SpeciesId::new("snorlax"),
        "Snorlax",
        Level(100),
    ));

    let log = format!("{log}\n\n{TURN_3}");
    pop.update_teams(&view, &log, &mut rng)?;
    tracing::info!(rank_total = pop.rank_total().to_f64(), "switch reveal folded in");

    pop.record_state(
        ScriptedState::new(Some(100), Some(30))
            .with_opponent("Pikachu", 0)
            .with_opponent("Snorlax", 1)
            .with_menu(snorlax_menu()),
    );
    pop.record_own_decision(surf());
    view.record_move(&SpeciesId::new("snorlax"), MoveId::new("bodyslam"));

    let log = format!("{log}\n\n{TURN_4}");
    pop.update_teams(&view, &log, &mut rng)?;
    tracing::info!(rank_total = pop.rank_total().to_f64(), "move reveal folded in");

    let turns = pop
        .particles()
        .first()
        .map(|p| p.turns_consumed())
        .unwrap_or(0);
    let sampled = pop.sample(&mut rng)?;
    let sampled_team = sampled
        .slots()
        .iter()
        .map(|slot| {
            let moves = slot
                .moves()
                .iter()
                .map(|mv| mv.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {} [{moves}]", slot.species, slot.level)
        })
        .collect();

    Ok(Summary {
        particles,
        turns,
        rank_total: pop.rank_total().to_f64(),
        sampled_team,
    })
}
