//! Retrograde tablebase solver for 3×3 stacking Tic-Tac-Toe variants.
//!
//! The solver enumerates every position reachable under a rule variant with
//! a forward breadth-first search, then sweeps backward from the game-over
//! positions, propagating win/loss values onto predecessors until only true
//! draws remain unclassified. The solved table answers verdict and
//! best-move queries in one probe per move.

pub mod cache;
pub mod display;
pub mod solver;
pub mod stats;
pub mod table;
