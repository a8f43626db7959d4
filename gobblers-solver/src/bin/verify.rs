//! Check a solved cache file for internal consistency.
//!
//! Reports the verdict distribution and the initial-position verdict, then
//! re-derives the laws a correct tablebase must satisfy over a sample of
//! entries: a win has a losing reply one ply shallower, a loss has only
//! winning replies of which the deepest is one ply shallower, and a draw
//! keeps a drawing reply and no losing one.
//!
//! Usage:
//!   verify --rules <S> <K> <M> [--table-exp <E>] [--file <path>] [--samples <N>]

use std::env;
use std::path::PathBuf;
use std::process;

use gobblers_core::{Board, Rules};
use gobblers_solver::cache;
use gobblers_solver::table::{self, Table, Verdict, STATE_MASK, TABLE_EXP, VACANT};

struct Options {
    rules: Rules,
    table_exp: u32,
    file: Option<PathBuf>,
    samples: usize,
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut rules = None;
    let mut table_exp = TABLE_EXP;
    let mut file = None;
    let mut samples = 100_000;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rules" => {
                if i + 3 >= args.len() {
                    eprintln!("--rules needs three values");
                    process::exit(1);
                }
                let sizes = args[i + 1].parse().unwrap_or(0);
                let per_size = args[i + 2].parse().unwrap_or(0);
                let relocation = args[i + 3].parse().unwrap_or(0u8) != 0;
                match Rules::new(sizes, per_size, relocation) {
                    Ok(r) => rules = Some(r),
                    Err(e) => {
                        eprintln!("Rule variant not supported: {}", e);
                        process::exit(1);
                    }
                }
                i += 3;
            }
            "--table-exp" => {
                i += 1;
                table_exp = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(TABLE_EXP);
            }
            "--file" => {
                i += 1;
                file = args.get(i).map(PathBuf::from);
            }
            "--samples" => {
                i += 1;
                samples = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(samples);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!(
                    "Usage: verify --rules <S> <K> <M> [--table-exp <E>] \
                     [--file <path>] [--samples <N>]"
                );
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(rules) = rules else {
        eprintln!("--rules is required");
        process::exit(1);
    };
    Options {
        rules,
        table_exp,
        file,
        samples,
    }
}

/// Check one classified entry against its successors. Returns an error
/// description on the first violated law.
fn check_entry(table: &Table, rules: &Rules, word: u64) -> Result<(), String> {
    let board = Board(word & STATE_MASK);
    let Some((verdict, distance)) = table::verdict_of(word) else {
        return Err("entry carries no verdict".to_string());
    };

    if verdict != Verdict::Draw && distance == 0 {
        // Terminal positions carry their value on the board itself.
        let expected = if verdict == Verdict::Win { 1 } else { -1 };
        if board.terminal_value() != expected {
            return Err(format!("{:?} in 0 plies but the board disagrees", verdict));
        }
        return Ok(());
    }

    let moves = board.legal_moves(rules);
    let replies: Vec<_> = moves
        .iter()
        .map(|&m| table::verdict_of(table.get(board.successor(m).0)))
        .collect();

    match verdict {
        Verdict::Win => {
            // Some reply leaves the opponent lost one ply shallower.
            if !replies
                .iter()
                .any(|r| *r == Some((Verdict::Loss, distance - 1)))
            {
                return Err(format!("win in {} without a loss in {}", distance, distance - 1));
            }
        }
        Verdict::Loss => {
            // Every reply hands the opponent a win, the deepest one ply
            // shallower.
            let mut deepest = None;
            for reply in &replies {
                match reply {
                    Some((Verdict::Win, d)) => deepest = deepest.max(Some(*d)),
                    other => {
                        return Err(format!("loss in {} with a non-winning reply {:?}", distance, other))
                    }
                }
            }
            if !moves.is_empty() && deepest != Some(distance - 1) {
                return Err(format!(
                    "loss in {} but deepest winning reply is {:?}",
                    distance, deepest
                ));
            }
        }
        Verdict::Draw => {
            if board.terminal_value() != 0 {
                return Err("draw on a finished board".to_string());
            }
            if replies.iter().any(|r| matches!(r, Some((Verdict::Loss, _)))) {
                return Err("draw with a winning move available".to_string());
            }
            if !moves.is_empty()
                && !replies.iter().any(|r| matches!(r, Some((Verdict::Draw, _))))
            {
                return Err("draw without a drawing reply".to_string());
            }
        }
    }
    Ok(())
}

fn main() {
    let opts = parse_args();
    let path = opts
        .file
        .unwrap_or_else(|| PathBuf::from(cache::filename(&opts.rules)));

    println!("Loading {:?}...", path);
    let table = match cache::load(&path, opts.table_exp) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Cannot load cache: {}", e);
            process::exit(1);
        }
    };

    // Verdict distribution.
    let mut wins = 0u64;
    let mut draws = 0u64;
    let mut losses = 0u64;
    let mut unclassified = 0u64;
    let mut occupied = 0u64;
    for &word in table.words() {
        if word == VACANT {
            continue;
        }
        occupied += 1;
        match table::unpack_value(word) {
            1 => wins += 1,
            0 => draws += 1,
            -1 => losses += 1,
            _ => unclassified += 1,
        }
    }

    println!(
        "Entries: {} ({:.1}% load)",
        occupied,
        100.0 * occupied as f64 / table.capacity() as f64
    );
    if occupied == 0 {
        eprintln!("Cache file holds no positions.");
        process::exit(1);
    }
    println!("  Wins:   {} ({:.1}%)", wins, 100.0 * wins as f64 / occupied as f64);
    println!("  Draws:  {} ({:.1}%)", draws, 100.0 * draws as f64 / occupied as f64);
    println!("  Losses: {} ({:.1}%)", losses, 100.0 * losses as f64 / occupied as f64);
    if unclassified != 0 {
        println!("  UNCLASSIFIED: {}", unclassified);
    }

    match table::verdict_of(table.get(Board::new().0)) {
        Some((Verdict::Win, d)) => println!("Initial position: first player wins in {}", d),
        Some((Verdict::Loss, d)) => println!("Initial position: second player wins in {}", d),
        Some((Verdict::Draw, _)) => println!("Initial position: draw"),
        None => println!("Initial position NOT FOUND in table!"),
    }

    // Law spot-checks over a stride sample of the occupied entries.
    let stride = ((occupied as usize) / opts.samples).max(1);
    let mut checked = 0usize;
    let mut violations = 0usize;
    for (index, &word) in table
        .words()
        .iter()
        .filter(|&&w| w != VACANT)
        .enumerate()
    {
        if index % stride != 0 || checked >= opts.samples {
            continue;
        }
        checked += 1;
        if let Err(why) = check_entry(&table, &opts.rules, word) {
            violations += 1;
            if violations <= 10 {
                eprintln!("violation at {:#016x}: {}", word & STATE_MASK, why);
            }
        }
    }

    println!("Checked {} entries, {} violations", checked, violations);
    if violations != 0 || unclassified != 0 {
        process::exit(1);
    }
    println!("OK");
}
