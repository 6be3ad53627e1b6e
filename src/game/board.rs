//! Immutable board snapshot and agent representation.
//!
//! This is the data model the rules simulator and the MCTS tree operate on.
//! A [`Board`] is a plain value: the simulator never mutates one in place, it
//! produces a new one (see [`crate::game::rules::next_state`]).

use std::collections::HashSet;

use crate::env::{Battlesnake, GameRequest, Vec2D};

/// A cell coordinate. Aliased to the wire `Vec2D` so board geometry and the
/// JSON transport share one type.
pub type Point = Vec2D;

/// One of the four cardinal moves. Aliased to the wire `Direction`; its
/// ordinal order (`Up`, `Down`, `Right`, `Left`) is what the permutation
/// tables in [`crate::game::rules`] are built around.
pub type Move = crate::env::Direction;

/// Why an agent is no longer in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EliminationCause {
    WallCollision,
    SelfCollision,
    BodyCollision,
    HeadCollision,
    OutOfHealth,
}

/// A single snake: its body (head first, tail last), health and elimination
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub body: Vec<Point>,
    pub health: u8,
    pub eliminated: Option<EliminationCause>,
}

impl Agent {
    pub fn new(id: impl Into<String>, body: Vec<Point>, health: u8) -> Self {
        debug_assert!(!body.is_empty(), "agent body must not be empty");
        Agent {
            id: id.into(),
            body,
            health,
            eliminated: None,
        }
    }

    pub fn from_wire(snake: &Battlesnake) -> Self {
        Agent::new(snake.id.clone(), snake.body.clone(), snake.health)
    }

    pub fn head(&self) -> Point {
        self.body[0]
    }

    pub fn tail(&self) -> Point {
        *self.body.last().unwrap()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn alive(&self) -> bool {
        self.eliminated.is_none()
    }

    /// Whether `p` occupies a body segment that will still be there next
    /// turn (i.e. everything except the tail, which vacates unless the
    /// snake just grew).
    pub fn occupies_excluding_tail(&self, p: Point) -> bool {
        self.body[..self.body.len() - 1].contains(&p)
    }
}

/// Which rule set a board is being played under.
///
/// The hazard set itself always lives on [`Board::hazards`]; `Royale` is
/// simply the case where that set is non-empty, so no hazard payload is
/// duplicated here (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    Solo,
    Standard,
    Royale,
}

impl RuleSet {
    pub fn for_board(agents: usize, hazards_non_empty: bool) -> RuleSet {
        if agents <= 1 {
            RuleSet::Solo
        } else if hazards_non_empty {
            RuleSet::Royale
        } else {
            RuleSet::Standard
        }
    }
}

/// An immutable snapshot of the game.
#[derive(Debug, Clone)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    pub food: HashSet<Point>,
    pub hazards: HashSet<Point>,
    /// Stable agent order; all per-agent vectors elsewhere are indexed by
    /// position in this list.
    pub agents: Vec<Agent>,
}

impl Board {
    pub fn new(width: usize, height: usize, agents: Vec<Agent>) -> Self {
        Board {
            width,
            height,
            food: HashSet::new(),
            hazards: HashSet::new(),
            agents,
        }
    }

    /// Builds the root board for a move decision from the incoming wire
    /// request, putting `you` at index 0 (the convention every per-agent
    /// reward vector and CLI tool assumes).
    pub fn from_request(request: &GameRequest) -> Board {
        let mut agents = Vec::with_capacity(request.board.snakes.len().max(1));
        agents.push(Agent::from_wire(&request.you));
        agents.extend(
            request
                .board
                .snakes
                .iter()
                .filter(|s| s.id != request.you.id)
                .map(Agent::from_wire),
        );

        Board {
            width: request.board.width,
            height: request.board.height,
            food: request.board.food.iter().copied().collect(),
            hazards: request.board.hazards.iter().copied().collect(),
            agents,
        }
    }

    pub fn ruleset(&self) -> RuleSet {
        RuleSet::for_board(self.agents.len(), !self.hazards.is_empty())
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.within(self.width, self.height)
    }

    pub fn living(&self) -> impl Iterator<Item = (usize, &Agent)> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.alive() && !a.is_empty())
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// `true` iff any living agent's body (excluding its own tail) occupies
    /// `p`. Used by collision checks and move enumeration.
    pub fn occupied(&self, p: Point) -> bool {
        self.agents
            .iter()
            .filter(|a| a.alive() && !a.is_empty())
            .any(|a| a.occupies_excluding_tail(p))
    }

    /// Whether the game is over per [4.1 Game Over] semantics: zero or one
    /// agent alive in multi-agent play; in Solo mode, only the sole agent's
    /// own elimination ends the game.
    pub fn is_over(&self) -> bool {
        match self.ruleset() {
            RuleSet::Solo => self.agents.first().map_or(true, |a| !a.alive()),
            _ => self.living_count() <= 1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn agent(id: &str, body: &[(i16, i16)], health: u8) -> Agent {
        Agent::new(
            id,
            body.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            health,
        )
    }

    #[test]
    fn ruleset_selection() {
        let solo = Board::new(11, 11, vec![agent("a", &[(0, 0)], 100)]);
        assert_eq!(solo.ruleset(), RuleSet::Solo);

        let mut standard =
            Board::new(11, 11, vec![agent("a", &[(0, 0)], 100), agent("b", &[(5, 5)], 100)]);
        assert_eq!(standard.ruleset(), RuleSet::Standard);

        standard.hazards.insert(Point::new(1, 1));
        assert_eq!(standard.ruleset(), RuleSet::Royale);
    }

    #[test]
    fn occupies_excluding_tail() {
        let snake = agent("a", &[(2, 2), (2, 1), (2, 0)], 100);
        assert!(snake.occupies_excluding_tail(Point::new(2, 2)));
        assert!(snake.occupies_excluding_tail(Point::new(2, 1)));
        assert!(!snake.occupies_excluding_tail(Point::new(2, 0)));
    }

    #[test]
    fn is_over_solo_vs_multi() {
        let mut solo = Board::new(11, 11, vec![agent("a", &[(0, 0)], 100)]);
        assert!(!solo.is_over());
        solo.agents[0].eliminated = Some(EliminationCause::WallCollision);
        assert!(solo.is_over());

        let mut duo =
            Board::new(11, 11, vec![agent("a", &[(0, 0)], 100), agent("b", &[(5, 5)], 100)]);
        assert!(!duo.is_over());
        duo.agents[0].eliminated = Some(EliminationCause::OutOfHealth);
        assert!(duo.is_over());
    }
}
