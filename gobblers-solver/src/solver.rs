//! Retrograde analysis of a rule variant.
//!
//! Two passes over one table. The forward pass is a breadth-first search
//! from the empty board that records every reachable canonical position:
//! game-over positions get their final win/loss verdict immediately and go
//! onto the solved queue; everything else becomes a tentative draw
//! remembering how many moves it has. The backward pass drains the solved
//! queue: a solved position classifies or decrements each unclassified
//! predecessor, and newly classified predecessors rejoin the queue. A
//! tentative draw that survives the drain has kept at least one non-losing
//! move forever - it is a true draw.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use gobblers_core::{Board, Move, Rules};

use crate::stats::SolveStats;
use crate::table::{self, Table, Verdict, VACANT};

/// How often the solve loops poll the interrupt flag and offer a progress
/// line.
const TICK: u64 = 1 << 16;

/// A solved (or solving) tablebase for one rule variant.
pub struct Solver {
    rules: Rules,
    table: Table,
    pub stats: SolveStats,
}

impl Solver {
    /// Allocate an empty table for `rules`; [`Solver::solve`] fills it.
    pub fn new(rules: Rules, exp: u32) -> Solver {
        Solver {
            rules,
            table: Table::new(exp),
            stats: SolveStats::new(),
        }
    }

    /// Wrap a table restored from a cache file.
    pub fn with_table(rules: Rules, table: Table) -> Solver {
        Solver {
            rules,
            table,
            stats: SolveStats::new(),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Run both passes to completion. Returns false if the interrupt flag
    /// was cleared mid-solve, leaving the table partially classified.
    pub fn solve(&mut self, running: &AtomicBool) -> bool {
        match self.search(running) {
            Some(solved) => {
                self.stats.begin_solve_phase();
                self.propagate(solved, running)
            }
            None => false,
        }
    }

    /// Forward pass: discover the reachable state space, seed every
    /// position's table entry, and collect the game-over positions.
    fn search(&mut self, running: &AtomicBool) -> Option<VecDeque<u64>> {
        let mut solved = VecDeque::new();
        let mut queue = VecDeque::new();

        let start = Board::new().0;
        queue.push_back(start);
        *self.table.entry(start) = start;

        while let Some(current) = queue.pop_front() {
            self.stats.discovered += 1;
            if self.stats.discovered % TICK == 0 {
                if !running.load(Ordering::SeqCst) {
                    return None;
                }
                self.stats.maybe_log_search();
            }

            let board = Board(current);
            let value = board.terminal_value();
            if value != 0 {
                // Game over: win or loss in zero plies, solved on the spot.
                *self.table.entry(current) = current | table::pack(value, 0);
                solved.push_back(current);
                self.stats.terminal += 1;
                continue;
            }

            // Tentative draw, remembering the move count so the backward
            // pass can count losing moves down to zero.
            let moves = board.legal_moves(&self.rules);
            *self.table.entry(current) = current | table::pack(0, moves.len() as u64);

            for m in &moves {
                let next = board.successor(*m).0;
                // Re-probing seen successors here trades an extra lookup
                // for never holding duplicate queue entries.
                let slot = self.table.entry(next);
                if *slot == VACANT {
                    *slot = next;
                    queue.push_back(next);
                }
            }
        }

        Some(solved)
    }

    /// Backward pass: propagate win/loss values from solved positions onto
    /// their predecessors until the queue runs dry.
    fn propagate(&mut self, mut solved: VecDeque<u64>, running: &AtomicBool) -> bool {
        while let Some(current) = solved.pop_front() {
            self.stats.classified += 1;
            if self.stats.classified % TICK == 0 {
                if !running.load(Ordering::SeqCst) {
                    return false;
                }
                self.stats.maybe_log_solve();
            }

            let word = self.table.get(current);
            let value = table::unpack_value(word);
            let distance = table::unpack_moves(word);

            for prev in Board(current).predecessors(&self.rules) {
                let slot = self.table.entry(prev.0);
                if table::unpack_value(*slot) != 0 {
                    // Already classified - or a theoretical predecessor the
                    // forward search never reached, whose slot is vacant.
                    continue;
                }
                if value == 1 {
                    // Moving into an opponent win loses; one fewer winning
                    // option at the predecessor.
                    let remaining = table::unpack_moves(*slot) - 1;
                    if remaining != 0 {
                        *slot = prev.0 | table::pack(0, remaining);
                    } else {
                        // Every move loses. The queue is in distance order,
                        // so `current` is the slowest of the losing
                        // continuations.
                        *slot = prev.0 | table::pack(-1, distance + 1);
                        solved.push_back(prev.0);
                    }
                } else {
                    // Moving into an opponent loss wins.
                    *slot = prev.0 | table::pack(1, distance + 1);
                    solved.push_back(prev.0);
                }
            }
        }
        true
    }

    /// Verdict and distance (or, for draws, residual winning-move count)
    /// for the side to move, or None for a position outside the reachable
    /// space.
    pub fn verdict(&self, board: Board) -> Option<(Verdict, u64)> {
        table::verdict_of(self.table.get(board.canonical().0))
    }

    /// The stored entry word for a position's canonical form.
    pub fn word(&self, board: Board) -> u64 {
        self.table.get(board.canonical().0)
    }

    /// An optimal move for the side to move, or None when there is none.
    ///
    /// The verdict encoding ranks successor entry words best-first for the
    /// player moving into them, so picking the numerically largest word is
    /// picking the best move.
    pub fn best_move(&self, board: Board) -> Option<Move> {
        let mut best = None;
        let mut max_word = 0u64;
        for m in board.legal_moves(&self.rules) {
            let word = self.table.get(board.successor(m).0);
            if word > max_word {
                max_word = word;
                best = Some(m);
            }
        }
        best
    }
}
