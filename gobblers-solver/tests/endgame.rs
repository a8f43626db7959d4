//! End-to-end solves of small rule variants, checking known game values
//! and the optimality laws of the finished table.

use std::sync::atomic::AtomicBool;

use gobblers_core::{Board, Move, Pos, Rules, Size};
use gobblers_solver::solver::Solver;
use gobblers_solver::table::{self, Verdict, STATE_MASK, VACANT};

fn solve(sizes: u8, per_size: u8, relocation: bool, exp: u32) -> Solver {
    let rules = Rules::new(sizes, per_size, relocation).unwrap();
    let mut solver = Solver::new(rules, exp);
    let running = AtomicBool::new(true);
    assert!(solver.solve(&running), "solve was not interrupted");
    solver
}

fn place(size: Size, to: u8) -> Move {
    Move::Place { size, to: Pos(to) }
}

/// Play a placement sequence from the empty board, alternating seats.
fn play(squares: &[u8]) -> Board {
    let mut board = Board::new();
    for &to in squares {
        board = board.apply(place(Size::Small, to)).swap_sides();
    }
    board
}

#[test]
fn classic_tictactoe_is_a_draw() {
    // One size, three pieces each, no relocation: Tic-Tac-Toe where the
    // game stalls once all six pieces are down.
    let solver = solve(1, 3, false, 16);
    let (verdict, _) = solver.verdict(Board::new()).unwrap();
    assert_eq!(verdict, Verdict::Draw);
}

#[test]
fn tictactoe_center_opening_stays_drawn() {
    let solver = solve(1, 3, false, 16);
    let after_center = play(&[4]);
    assert_eq!(solver.verdict(after_center).unwrap().0, Verdict::Draw);
}

#[test]
fn tictactoe_double_corner_forces_the_center() {
    // First player holds opposite corners 0 and 8 and threatens the long
    // diagonal; every second-player reply except the center loses on the
    // spot, so the table must pick square 4.
    let solver = solve(1, 3, false, 16);
    let board = play(&[0, 1, 8]);
    assert_eq!(solver.verdict(board).unwrap().0, Verdict::Draw);

    let best = solver.best_move(board).unwrap();
    assert_eq!(best, place(Size::Small, 4));

    // And indeed any corner-adjacent reply hands the diagonal over.
    for reply in [2u8, 6] {
        let successor = board.apply(place(Size::Small, reply)).swap_sides();
        assert_eq!(solver.verdict(successor).unwrap().0, Verdict::Win);
    }
}

#[test]
fn best_move_always_matches_the_optimum() {
    let solver = solve(1, 3, false, 16);
    let rules = *solver.rules();
    let positions = [Board::new(), play(&[4]), play(&[0, 1]), play(&[0, 1, 8])];
    for board in positions {
        let best = solver.best_move(board).unwrap();
        let best_word = solver.word(board.apply(best).swap_sides());
        for m in board.legal_moves(&rules) {
            assert!(
                solver.word(board.apply(m).swap_sides()) <= best_word,
                "{:?} beats the chosen move from {:#x}",
                m,
                board.to_u64()
            );
        }
    }
}

#[test]
fn reachable_count_is_deterministic() {
    let first = solve(2, 2, false, 22);
    let second = solve(2, 2, false, 22);
    assert_eq!(first.stats.discovered, second.stats.discovered);
    assert_eq!(first.stats.terminal, second.stats.terminal);
    assert_eq!(first.stats.classified, second.stats.classified);
    assert_eq!(
        first.verdict(Board::new()).unwrap(),
        second.verdict(Board::new()).unwrap()
    );
}

#[test]
fn solved_table_satisfies_the_verdict_laws() {
    // Every classified position must be witnessed by its successors:
    // wins by a loss one ply shallower, losses by nothing but wins, draws
    // by a draw and no loss.
    let solver = solve(1, 3, false, 16);
    let rules = *solver.rules();
    for &word in solver.table().words() {
        if word == VACANT {
            continue;
        }
        let board = Board(word & STATE_MASK);
        let (verdict, distance) = table::verdict_of(word).unwrap();
        if verdict != Verdict::Draw && distance == 0 {
            assert_ne!(board.terminal_value(), 0);
            continue;
        }
        let replies: Vec<_> = board
            .legal_moves(&rules)
            .iter()
            .map(|&m| table::verdict_of(solver.word(board.apply(m).swap_sides())).unwrap())
            .collect();
        match verdict {
            Verdict::Win => {
                assert!(
                    replies.contains(&(Verdict::Loss, distance - 1)),
                    "win in {} unwitnessed at {:#x}",
                    distance,
                    board.to_u64()
                );
            }
            Verdict::Loss => {
                assert!(!replies.is_empty());
                assert!(replies.iter().all(|&(v, _)| v == Verdict::Win));
                let deepest = replies.iter().map(|&(_, d)| d).max().unwrap();
                assert_eq!(deepest, distance - 1);
            }
            Verdict::Draw => {
                assert!(replies
                    .iter()
                    .all(|&(v, _)| v != Verdict::Loss));
                if !replies.is_empty() {
                    assert!(replies.iter().any(|&(v, _)| v == Verdict::Draw));
                }
            }
        }
    }
}

// Takes minutes and a 4 GiB table. Run manually with:
//   cargo test --release full_gobblet -- --ignored
#[test]
#[ignore]
fn full_gobblet_first_player_wins() {
    let solver = solve(3, 2, true, table::TABLE_EXP);
    let (verdict, _) = solver.verdict(Board::new()).unwrap();
    assert_eq!(verdict, Verdict::Win);

    // The winning opening is the large piece in the center.
    let best = solver.best_move(Board::new()).unwrap();
    assert_eq!(best, place(Size::Large, 4));
}
