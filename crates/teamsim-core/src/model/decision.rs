use crate::model::ids::MoveId;
use crate::prob::Prob;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One chosen action by a side on a turn.
///
/// A closed type so resolver logic can match exhaustively instead of probing
/// descriptor strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Decision {
    /// Use the identified move with the current active Pokémon.
    Move(MoveId),
    /// Switch to the team slot at this index.
    Switch(usize),
}

impl Decision {
    pub fn is_switch(&self) -> bool {
        matches!(self, Decision::Switch(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Move(id) => write!(f, "move {id}"),
            Decision::Switch(slot) => write!(f, "switch {slot}"),
        }
    }
}

/// A candidate value paired with its prior probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weighted<T> {
    pub value: T,
    pub probability: Prob,
}

impl<T> Weighted<T> {
    pub fn new(value: T, probability: Prob) -> Self {
        Self { value, probability }
    }
}

pub type WeightedDecision = Weighted<Decision>;

/// Player side in a two-player battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub const fn prefix(self) -> &'static str {
        match self {
            Side::P1 => "p1",
            Side::P2 => "p2",
        }
    }

    pub const fn opponent(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decision, Side};
    use crate::model::ids::MoveId;

    #[test]
    fn decisions_serialize_as_tagged_descriptors() {
        let mv = Decision::Move(MoveId::new("tackle"));
        let json = serde_json::to_string(&mv).unwrap();
        assert_eq!(json, r#"{"type":"move","id":"tackle"}"#);

        let sw = Decision::Switch(3);
        let json = serde_json::to_string(&sw).unwrap();
        assert_eq!(json, r#"{"type":"switch","id":3}"#);
    }

    #[test]
    fn sides_oppose() {
        assert_eq!(Side::P1.opponent(), Side::P2);
        assert_eq!(Side::P2.prefix(), "p2");
    }
}
