//! Narrows a turn's candidate opponent decisions to those consistent with the
//! observed action order, splitting probability mass on confirmed speed ties.

use crate::engine::RulesEngine;
use crate::model::decision::{Decision, Side, WeightedDecision};
use crate::model::ids::MoveId;

/// Priority bracket of a switch: always first among same-bracket actions.
pub const SWITCH_PRIORITY: i32 = 7;
/// Priority sentinel when we made no decision this turn (we always act last).
pub const NO_DECISION_PRIORITY: i32 = -1000;
/// Speed sentinel when a side has no active Pokémon.
pub const FALLBACK_SPEED: u32 = 10_000;

/// Combat facts the resolver needs about our side of the turn.
#[derive(Debug, Clone)]
pub struct OrderFacts {
    pub own_side: Side,
    pub own_decision: Option<Decision>,
    pub own_speed: u32,
    pub opp_speed: u32,
}

/// Character offset of the first line showing this side acted; lines counted
/// as acting are switch, move, can't-act, and status-cure events. Absence
/// means the side acted last, encoded as the log length.
fn acted_offset(turn_log: &str, side: Side) -> usize {
    for tag in ["|switch|", "|move|", "|cant|", "|-curestatus|"] {
        let needle = format!("{tag}{}a:", side.prefix());
        if let Some(index) = turn_log.find(&needle) {
            if index > 0 {
                return index;
            }
        }
    }
    turn_log.len()
}

/// Filters `options` down to the subset consistent with one turn's log.
///
/// Candidates whose priority/speed exactly tie our own action are kept with
/// their probability halved: the coin flip went to whichever side the log
/// shows acting first. An empty return is a hard contradiction the caller
/// must surface.
pub fn resolve<E: RulesEngine>(
    engine: &E,
    state: &E::State,
    turn_log: &str,
    facts: &OrderFacts,
    mut options: Vec<WeightedDecision>,
) -> Vec<WeightedDecision> {
    let opp_side = facts.own_side.opponent();
    let we_acted_first = acted_offset(turn_log, facts.own_side) < acted_offset(turn_log, opp_side);

    let own_priority = match &facts.own_decision {
        None => NO_DECISION_PRIORITY,
        Some(Decision::Switch(_)) => SWITCH_PRIORITY,
        Some(Decision::Move(mv)) => engine.move_priority(mv),
    };

    options.retain_mut(|option| {
        let opp_priority = match &option.value {
            Decision::Switch(_) => SWITCH_PRIORITY,
            Decision::Move(mv) => engine.move_priority(mv),
        };
        let tie = opp_priority == own_priority && facts.opp_speed == facts.own_speed;
        let ordered = if we_acted_first {
            opp_priority < own_priority
                || (opp_priority == own_priority && facts.opp_speed < facts.own_speed)
        } else {
            opp_priority > own_priority
                || (opp_priority == own_priority && facts.opp_speed > facts.own_speed)
        };
        if ordered {
            return true;
        }
        if tie {
            option.probability = option.probability.halved();
            return true;
        }
        false
    });

    // A switch event pins the decision to the exact named slot.
    let switch_prefix = format!("|switch|{}a:", opp_side.prefix());
    if let Some(index) = turn_log.find(&switch_prefix) {
        options.retain(|option| option.value.is_switch());
        let name = switch_target_name(&turn_log[index..]);
        let Some(slot) = engine.opponent_slot_by_name(state, name) else {
            return Vec::new();
        };
        options.retain(|option| option.value == Decision::Switch(slot));
        return options;
    }

    // The opponent stayed in, so switch candidates are out regardless.
    options.retain(|option| !option.value.is_switch());

    let move_prefix = format!("|move|{}a:", opp_side.prefix());
    if let Some(index) = turn_log.find(&move_prefix) {
        let chosen = MoveId::from_name(move_name(&turn_log[index..]));
        options.retain(|option| option.value == Decision::Move(chosen.clone()));
        return options;
    }

    // Can't-act turns stay unresolved beyond the order filter.
    options
}

/// `|switch|p2a: Snorlax|Snorlax, L100|...` -> `Snorlax`.
fn switch_target_name(event: &str) -> &str {
    let field = event.split('|').nth(2).unwrap_or("");
    field.get(5..).unwrap_or("")
}

/// `|move|p2a: Snorlax|Body Slam|...` -> `Body Slam`.
fn move_name(event: &str) -> &str {
    event.split('|').nth(3).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::decision::Weighted;
    use crate::prob::Prob;
    use crate::scripted::{ScriptedEngine, ScriptedState};

    fn engine() -> ScriptedEngine {
        ScriptedEngine::sample_dex()
    }

    fn state() -> ScriptedState {
        ScriptedState::new(Some(100), Some(100))
            .with_opponent("Pikachu", 0)
            .with_opponent("Snorlax", 1)
    }

    fn candidates() -> Vec<WeightedDecision> {
        vec![
            Weighted::new(Decision::Move(MoveId::new("quickattack")), Prob::ratio(1, 4)),
            Weighted::new(Decision::Move(MoveId::new("thunderbolt")), Prob::ratio(1, 4)),
            Weighted::new(Decision::Switch(1), Prob::ratio(1, 2)),
        ]
    }

    fn facts(own_speed: u32, opp_speed: u32) -> OrderFacts {
        OrderFacts {
            own_side: Side::P1,
            own_decision: Some(Decision::Move(MoveId::new("surf"))),
            own_speed,
            opp_speed,
        }
    }

    #[test]
    fn absent_side_acted_last() {
        let log = "|turn|8\n|move|p2a: Pikachu|Thunderbolt|p1a: Blastoise";
        assert!(acted_offset(log, Side::P2) < acted_offset(log, Side::P1));
        assert_eq!(acted_offset(log, Side::P1), log.len());
    }

    #[test]
    fn opponent_first_keeps_only_faster_or_higher_priority() {
        // Opponent acted first; our surf has priority 0 and speed 100.
        let log = "|turn|8\n|cant|p2a: Pikachu|par\n|move|p1a: Blastoise|Surf|p2a: Pikachu";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 50), candidates());

        // The opponent is slower, so only priority can explain acting first.
        // Switches drop afterwards because the opponent stayed in.
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Decision::Move(MoveId::new("quickattack")));
        assert_eq!(resolved[0].probability, Prob::ratio(1, 4));
    }

    #[test]
    fn confirmed_speed_tie_halves_probability() {
        let log = "|turn|8\n|cant|p2a: Pikachu|par\n|move|p1a: Blastoise|Surf|p2a: Pikachu";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 100), candidates());

        // quickattack outprioritizes us outright; thunderbolt ties and is halved.
        assert_eq!(resolved.len(), 2);
        let tied = resolved
            .iter()
            .find(|o| o.value == Decision::Move(MoveId::new("thunderbolt")))
            .unwrap();
        assert_eq!(tied.probability, Prob::ratio(1, 8));

        let mut total = Prob::zero();
        for option in &resolved {
            total += &option.probability;
        }
        let mut expected = Prob::ratio(1, 4);
        expected += &Prob::ratio(1, 8);
        assert_eq!(total, expected);
    }

    #[test]
    fn tie_split_total_is_half_of_prior_total() {
        let pool = vec![
            Weighted::new(Decision::Move(MoveId::new("thunderbolt")), Prob::ratio(1, 3)),
            Weighted::new(Decision::Move(MoveId::new("irontail")), Prob::ratio(2, 3)),
        ];
        let log = "|turn|8\n|cant|p2a: Pikachu|par\n|move|p1a: Blastoise|Surf|p2a: Pikachu";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 100), pool);

        assert_eq!(resolved.len(), 2);
        let mut total = Prob::zero();
        for option in &resolved {
            total += &option.probability;
        }
        assert_eq!(total, Prob::one().halved());
    }

    #[test]
    fn observed_move_narrows_to_that_move() {
        let log = "|turn|8\n|move|p2a: Pikachu|Thunderbolt|p1a: Blastoise\n\
                   |move|p1a: Blastoise|Surf|p2a: Pikachu";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 120), candidates());

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Decision::Move(MoveId::new("thunderbolt")));
    }

    #[test]
    fn observed_switch_narrows_to_named_slot() {
        let log = "|turn|8\n|switch|p2a: Snorlax|Snorlax, L100|524/524\n\
                   |move|p1a: Blastoise|Surf|p2a: Snorlax";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 120), candidates());

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Decision::Switch(1));
    }

    #[test]
    fn switch_to_unknown_name_exhausts_candidates() {
        let log = "|turn|8\n|switch|p2a: Gengar|Gengar, L100|260/260";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 120), candidates());
        assert!(resolved.is_empty());
    }

    #[test]
    fn high_priority_move_excludes_slower_moves_not_switches_by_order() {
        // Scenario: opponent acted first with a priority move while we chose a
        // priority-0 move. Switch candidates survive the order filter (their
        // bracket resolves before damaging moves) and only the move event
        // itself rules them out.
        let log = "|turn|8\n|move|p2a: Pikachu|Quick Attack|p1a: Blastoise\n\
                   |move|p1a: Blastoise|Surf|p2a: Pikachu";
        let resolved = resolve(&engine(), &state(), log, &facts(100, 50), candidates());

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Decision::Move(MoveId::new("quickattack")));

        // Same order facts on a can't-act log: the switch bracket survives.
        let log = "|turn|9\n|cant|p2a: Pikachu|slp";
        let kept = resolve(&engine(), &state(), log, &facts(100, 50), candidates());
        assert!(kept.iter().all(|o| !o.value.is_switch()));
        assert!(
            kept.iter()
                .any(|o| o.value == Decision::Move(MoveId::new("quickattack")))
        );
    }

    #[test]
    fn no_own_decision_means_we_acted_last() {
        let log = "|turn|8\n|move|p2a: Pikachu|Thunderbolt|p1a: Blastoise";
        let facts = OrderFacts {
            own_side: Side::P1,
            own_decision: None,
            own_speed: FALLBACK_SPEED,
            opp_speed: 100,
        };
        // Sentinel priority loses to everything, so the move candidate stays.
        let resolved = resolve(&engine(), &state(), log, &facts, candidates());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value, Decision::Move(MoveId::new("thunderbolt")));
    }
}
