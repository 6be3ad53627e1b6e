//! Compact encoding of a joint move vector into a single integer, used as
//! the key identifying a tree node's children.

use crate::env::Direction;
use crate::game::board::Move;

const BITS_PER_AGENT: u32 = 3;
/// Six agents fit comfortably in a `u32` at 3 bits each (18 bits used).
pub const MAX_AGENTS: usize = 6;

fn code(mv: Move) -> u32 {
    match mv {
        Direction::Up => 1,
        Direction::Down => 2,
        Direction::Right => 3,
        Direction::Left => 4,
    }
}

fn decode(bits: u32) -> Option<Move> {
    match bits {
        1 => Some(Direction::Up),
        2 => Some(Direction::Down),
        3 => Some(Direction::Right),
        4 => Some(Direction::Left),
        _ => None,
    }
}

/// A joint move vector packed 3 bits per agent: `0` means "no move" (the
/// agent was already eliminated), `1..=4` identify a [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge(u32);

impl Edge {
    pub fn encode(moves: &[Option<Move>]) -> Edge {
        debug_assert!(moves.len() <= MAX_AGENTS, "edge encoding supports at most {MAX_AGENTS} agents");
        let mut bits = 0u32;
        for (i, mv) in moves.iter().enumerate() {
            let c = mv.map_or(0, code);
            bits |= c << (i as u32 * BITS_PER_AGENT);
        }
        Edge(bits)
    }

    /// `true` iff agent `agent` was assigned `mv` in this edge.
    pub fn is(&self, agent: usize, mv: Move) -> bool {
        self.get(agent) == Some(mv)
    }

    /// The move assigned to `agent`, or `None` if it had no move (dead) in
    /// this edge.
    pub fn get(&self, agent: usize) -> Option<Move> {
        let bits = (self.0 >> (agent as u32 * BITS_PER_AGENT)) & 0b111;
        decode(bits)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}
