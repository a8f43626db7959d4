//! Gobblers Tablebase
//!
//! Solves a 3×3 stacking Tic-Tac-Toe variant by retrograde analysis, then
//! plays it interactively with perfect-play hints. Solved tables persist as
//! one cache file per rule variant and load instantly on the next run.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use gobblers_core::{Board, Move, Rules};
use gobblers_solver::solver::Solver;
use gobblers_solver::table::{Verdict, TABLE_EXP};
use gobblers_solver::{cache, display};

struct Options {
    rules: Option<Rules>,
    table_exp: u32,
    use_cache: bool,
    solve_only: bool,
}

fn print_usage() {
    eprintln!("Usage: gobblers-solver [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --rules <S> <K> <M>   Rule variant: piece sizes (1-3), pieces per");
    eprintln!("                        size, relocation allowed (0/1).");
    eprintln!("                        Prompted interactively when omitted.");
    eprintln!("  --table-exp <E>       Table capacity exponent (default {})", TABLE_EXP);
    eprintln!("  --no-cache            Neither read nor write the cache file");
    eprintln!("  --solve-only          Solve, report, and exit without playing");
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options {
        rules: None,
        table_exp: TABLE_EXP,
        use_cache: true,
        solve_only: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rules" => {
                if i + 3 >= args.len() {
                    eprintln!("--rules needs three values");
                    print_usage();
                    process::exit(1);
                }
                let parsed = (
                    args[i + 1].parse::<u8>(),
                    args[i + 2].parse::<u8>(),
                    args[i + 3].parse::<u8>(),
                );
                let (Ok(sizes), Ok(per_size), Ok(relocation)) = parsed else {
                    eprintln!("--rules values must be integers");
                    process::exit(1);
                };
                match Rules::new(sizes, per_size, relocation != 0) {
                    Ok(rules) => opts.rules = Some(rules),
                    Err(e) => {
                        eprintln!("Rule variant not supported: {}", e);
                        process::exit(1);
                    }
                }
                i += 3;
            }
            "--table-exp" => {
                i += 1;
                opts.table_exp = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--table-exp needs an integer");
                        process::exit(1);
                    });
            }
            "--no-cache" => {
                opts.use_cache = false;
            }
            "--solve-only" => {
                opts.solve_only = true;
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }
    opts
}

/// Ask for a rule variant until a supported one is entered.
fn prompt_rules() -> Rules {
    let stdin = io::stdin();
    loop {
        print!("Enter rules (num_sizes, num_per_size, allow_move): ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            process::exit(0);
        }
        let fields: Vec<u8> = line
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        if fields.len() != 3 {
            println!("Enter three integers, e.g. 3 2 1 for full Gobblet Gobblers.");
            continue;
        }
        match Rules::new(fields[0], fields[1], fields[2] != 0) {
            Ok(rules) => return rules,
            Err(e) => println!("Rule variant not supported: {}", e),
        }
    }
}

fn main() {
    let opts = parse_args();

    println!("Gobblers Tablebase");
    println!("==================");
    println!();

    let rules = opts.rules.unwrap_or_else(prompt_rules);
    println!(
        "Rules: {} sizes, {} per size, relocation {}",
        rules.sizes,
        rules.per_size,
        if rules.relocation { "on" } else { "off" }
    );

    // Ctrl-C stops a running solve gracefully; outside a solve it just
    // quits.
    let running = Arc::new(AtomicBool::new(true));
    let solving = Arc::new(AtomicBool::new(false));
    {
        let running = running.clone();
        let solving = solving.clone();
        ctrlc::set_handler(move || {
            if solving.load(Ordering::SeqCst) {
                println!("\nInterrupt received, stopping solve...");
                running.store(false, Ordering::SeqCst);
            } else {
                process::exit(130);
            }
        })
        .expect("Error setting Ctrl-C handler");
    }

    let cache_path = PathBuf::from(cache::filename(&rules));
    let mut solver = None;

    if opts.use_cache && cache_path.exists() {
        println!("Loading from {:?}...", cache_path);
        let start = Instant::now();
        match cache::load(&cache_path, opts.table_exp) {
            Ok(table) => {
                println!("Loaded in {:.2}s", start.elapsed().as_secs_f64());
                solver = Some(Solver::with_table(rules, table));
            }
            Err(e) => {
                println!("Warning: failed to load cache: {}", e);
                println!("Solving from scratch.");
            }
        }
    }

    let solver = match solver {
        Some(solver) => solver,
        None => {
            let mut solver = Solver::new(rules, opts.table_exp);
            solving.store(true, Ordering::SeqCst);
            let start = Instant::now();
            if !solver.solve(&running) {
                println!("Solve interrupted; no cache written.");
                return;
            }
            solving.store(false, Ordering::SeqCst);
            println!("Solved in {:.2}s", start.elapsed().as_secs_f64());
            solver.stats.print_summary();

            if opts.use_cache {
                println!("Saving to {:?}...", cache_path);
                let start = Instant::now();
                match cache::save(&cache_path, solver.table()) {
                    Ok(()) => println!("Saved in {:.2}s", start.elapsed().as_secs_f64()),
                    // The in-memory solve is usable either way.
                    Err(e) => println!("Warning: failed to save cache: {}", e),
                }
            }
            solver
        }
    };

    if let Some((verdict, moves)) = solver.verdict(Board::new()) {
        match verdict {
            Verdict::Win => println!("First player wins in {} moves with optimal play.", moves),
            Verdict::Loss => println!("Second player wins in {} moves with optimal play.", moves),
            Verdict::Draw => println!("Game is a draw with optimal play."),
        }
    }

    if !opts.solve_only {
        play(&solver);
    }
}

/// Interactive game against (or between) perfect players. Moves enter as
/// `(start, end)` pairs, `0 0` asks for the table's best move, `-1 -1`
/// takes the last move back.
fn play(solver: &Solver) {
    let rules = solver.rules();
    let stdin = io::stdin();
    let mut states = vec![Board::new()];
    let mut turn = 1;

    'game: loop {
        let s = *states.last().unwrap();
        // The board always renders from player 1's perspective.
        println!();
        print!(
            "{}",
            display::render(if turn == 1 { s } else { s.swap_sides() })
        );

        let Some((verdict, moves)) = solver.verdict(s) else {
            println!("Position is missing from the table.");
            return;
        };
        if moves == 0 {
            match verdict {
                Verdict::Draw => println!("Game ends in a draw."),
                Verdict::Win => println!("Player {} wins.", turn),
                Verdict::Loss => println!("Player {} wins.", 3 - turn),
            }
            return;
        }

        let m = loop {
            print!(
                "Player {}, enter move (-size end | start end), or (0 0) for best move, \
                 or (-1 -1) to undo: ",
                turn
            );
            io::stdout().flush().ok();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let fields: Vec<i32> = line
                .split_whitespace()
                .filter_map(|t| t.parse().ok())
                .collect();
            if fields.len() != 2 {
                println!("Enter two integers.");
                continue;
            }
            let (start, end) = (fields[0], fields[1]);

            if start == 0 && end == 0 {
                if let Some(best) = solver.best_move(s) {
                    let (a, b) = best.as_pair();
                    match verdict {
                        Verdict::Draw => println!("Draw with ({}, {}).", a, b),
                        Verdict::Win => println!("Win in {} moves with ({}, {}).", moves, a, b),
                        Verdict::Loss => println!("Lose in {} moves with ({}, {}).", moves, a, b),
                    }
                }
                continue;
            }
            if start == -1 && end == -1 {
                if states.len() > 1 {
                    states.pop();
                    turn = 3 - turn;
                } else {
                    println!("Nothing to undo.");
                }
                continue 'game;
            }

            let parsed = i8::try_from(start)
                .ok()
                .zip(i8::try_from(end).ok())
                .and_then(|(a, b)| Move::from_pair(a, b));
            match parsed {
                Some(m) if s.is_legal(rules, m) => break m,
                _ => println!("Illegal move."),
            }
        };

        states.push(s.apply(m).swap_sides());
        turn = 3 - turn;
    }
}
