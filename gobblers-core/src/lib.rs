//! Game logic for 3×3 stacking Tic-Tac-Toe variants ("Gobblet Gobblers")
//! with bit-based board representation.
//!
//! # Position Encoding (54-bit)
//!
//! ```text
//! Bits 0-53:  Board state (9 squares × 6 bits per square)
//! Bits 54-63: Zero for a bare position (the solver packs a verdict there)
//!
//! Each square (6 bits) - indexed by SIZE, not stack position:
//!   Bits 0-1: Small slot
//!   Bits 2-3: Medium slot
//!   Bits 4-5: Large slot
//!
//! Each 2-bit slot: 00 = empty, 01 = side to move, 10 = opponent.
//! 11 never occurs.
//!
//! Square indices (row-major order):
//!   (0,0)=0  (0,1)=1  (0,2)=2
//!   (1,0)=3  (1,1)=4  (1,2)=5
//!   (2,0)=6  (2,1)=7  (2,2)=8
//! ```
//!
//! Ownership is RELATIVE to the side to move, so there is no turn bit:
//! passing the turn is the bitwise [`Board::swap_sides`] and the empty board
//! encodes as 0 no matter whose turn it is. A square covered by a larger
//! piece still records the smaller pieces beneath it.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Owner of a piece slot, relative to the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Owner {
    Mover = 1,
    Opponent = 2,
}

impl Owner {
    /// Convert from slot bits (1 or 2) to Owner.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Owner> {
        match bits {
            1 => Some(Owner::Mover),
            2 => Some(Owner::Opponent),
            _ => None,
        }
    }
}

/// Piece size.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Size {
    Small = 0,
    Medium = 1,
    Large = 2,
}

impl Size {
    /// Convert from slot index (0, 1, 2) to Size.
    #[inline]
    pub fn from_index(idx: usize) -> Option<Size> {
        match idx {
            0 => Some(Size::Small),
            1 => Some(Size::Medium),
            2 => Some(Size::Large),
            _ => None,
        }
    }

    /// All sizes, smallest first.
    pub fn all() -> impl Iterator<Item = Size> {
        [Size::Small, Size::Medium, Size::Large].into_iter()
    }
}

/// Position on the 3x3 board (0-8).
///
/// Layout:
/// ```text
///   0 1 2
///   3 4 5
///   6 7 8
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from row and column (0-2 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < 3 && col < 3);
        Pos(row * 3 + col)
    }

    /// Get the row (0-2).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 3
    }

    /// Iterate over all 9 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..9).map(Pos)
    }
}

/// A move in the game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Move {
    /// Place a new piece from the reserve onto the board.
    Place { size: Size, to: Pos },
    /// Relocate a piece already on the board.
    Slide { from: Pos, to: Pos },
}

impl Move {
    /// Get the destination position of the move.
    #[inline]
    pub fn to(&self) -> Pos {
        match self {
            Move::Place { to, .. } => *to,
            Move::Slide { to, .. } => *to,
        }
    }

    /// Encode as a `(start, end)` pair: `start` in 0..9 is a board square,
    /// a negative `start` plays a new piece of size `-start` (1..=3).
    pub fn as_pair(&self) -> (i8, i8) {
        match *self {
            Move::Place { size, to } => (-(size as i8) - 1, to.0 as i8),
            Move::Slide { from, to } => (from.0 as i8, to.0 as i8),
        }
    }

    /// Decode a `(start, end)` pair; the inverse of [`Move::as_pair`].
    pub fn from_pair(start: i8, end: i8) -> Option<Move> {
        if !(0..9).contains(&end) {
            return None;
        }
        let to = Pos(end as u8);
        if (0..9).contains(&start) {
            Some(Move::Slide {
                from: Pos(start as u8),
                to,
            })
        } else if (-3..=-1).contains(&start) {
            Some(Move::Place {
                size: Size::from_index((-start - 1) as usize)?,
                to,
            })
        } else {
            None
        }
    }
}

/// Rule parameters for a game variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rules {
    /// Number of distinct piece sizes (1..=3).
    pub sizes: u8,
    /// Pieces of each size per player.
    pub per_size: u8,
    /// Whether pieces already on the board may be relocated.
    pub relocation: bool,
}

/// Rejection of a rule variant the solver cannot hold in its table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RulesError {
    Sizes(u8),
    PerSize { sizes: u8, per_size: u8 },
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RulesError::Sizes(sizes) => {
                write!(f, "unsupported number of piece sizes: {} (expected 1..=3)", sizes)
            }
            RulesError::PerSize { sizes, per_size } => write!(
                f,
                "unsupported piece count {} for {} sizes (expected 1..={})",
                per_size,
                sizes,
                Rules::max_per_size(sizes)
            ),
        }
    }
}

impl std::error::Error for RulesError {}

impl Rules {
    /// Validate and construct a rule variant.
    pub fn new(sizes: u8, per_size: u8, relocation: bool) -> Result<Rules, RulesError> {
        if !(1..=3).contains(&sizes) {
            return Err(RulesError::Sizes(sizes));
        }
        if per_size < 1 || per_size > Self::max_per_size(sizes) {
            return Err(RulesError::PerSize { sizes, per_size });
        }
        Ok(Rules {
            sizes,
            per_size,
            relocation,
        })
    }

    /// Largest supported piece count per size. Three-size variants with more
    /// than two pieces per size would overflow the position table.
    #[inline]
    pub fn max_per_size(sizes: u8) -> u8 {
        if sizes < 3 {
            9
        } else {
            2
        }
    }
}

/// Compact board state - fits in a single u64.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Board(pub u64);

impl Board {
    /// Bits per square (3 size slots × 2 bits each).
    const CELL_BITS: u32 = 6;
    /// Mask for a single square (0b111111).
    const CELL_MASK: u64 = 0b111111;
    /// Mask for a single 2-bit slot.
    const SLOT_MASK: u64 = 0b11;
    /// All 27 mover bits (the low bit of every slot).
    const MOVER_MASK: u64 = 0x15555555555555;
    /// All 27 opponent bits (the high bit of every slot).
    const OPPONENT_MASK: u64 = 0x2AAAAAAAAAAAAA;

    /// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
    const WIN_LINES: [[u8; 3]; 8] = [
        [0, 1, 2],
        [3, 4, 5],
        [6, 7, 8],
        [0, 3, 6],
        [1, 4, 7],
        [2, 5, 8],
        [0, 4, 8],
        [2, 4, 6],
    ];

    /// The empty board. Its canonical form is itself.
    #[inline]
    pub fn new() -> Board {
        Board(0)
    }

    /// Create a board from a raw u64 encoding.
    #[inline]
    pub fn from_u64(bits: u64) -> Board {
        Board(bits)
    }

    /// Get the raw u64 encoding.
    #[inline]
    pub fn to_u64(self) -> u64 {
        self.0
    }

    /// Get the 6 bits for the square at the given position.
    #[inline]
    pub fn cell(&self, pos: Pos) -> u64 {
        (self.0 >> (pos.0 as u32 * Self::CELL_BITS)) & Self::CELL_MASK
    }

    /// Check if a square holds no pieces at all.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.cell(pos) == 0
    }

    /// Get the owner of a specific size slot at a position.
    #[inline]
    pub fn piece_owner(&self, pos: Pos, size: Size) -> Option<Owner> {
        let bits = (self.cell(pos) >> (2 * size as u32)) & Self::SLOT_MASK;
        Owner::from_bits(bits as u8)
    }

    /// Get the top (visible) piece at a position, or None for an empty square.
    pub fn top_piece(&self, pos: Pos) -> Option<(Owner, Size)> {
        let cell = self.cell(pos);
        for idx in (0..3).rev() {
            let bits = (cell >> (2 * idx)) & Self::SLOT_MASK;
            if bits != 0 {
                return Some((Owner::from_bits(bits as u8)?, Size::from_index(idx)?));
            }
        }
        None
    }

    /// Top piece's owner bits at a square: 0 = empty, 1 = mover, 2 = opponent.
    #[inline]
    fn top_owner_bits(&self, square: u8) -> u64 {
        let cell = (self.0 >> (square as u32 * Self::CELL_BITS)) & Self::CELL_MASK;
        let large = (cell >> 4) & Self::SLOT_MASK;
        let medium = (cell >> 2) & Self::SLOT_MASK;
        let small = cell & Self::SLOT_MASK;
        if large != 0 {
            large
        } else if medium != 0 {
            medium
        } else {
            small
        }
    }

    /// The mover's piece counts per size, buried pieces included.
    pub fn mover_counts(&self) -> [u8; 3] {
        let mut counts = [0u8; 3];
        for square in 0..9 {
            let mut cell = self.cell(Pos(square));
            let mut idx = 0;
            while cell != 0 {
                if cell & Self::SLOT_MASK == Owner::Mover as u64 {
                    counts[idx] += 1;
                }
                idx += 1;
                cell >>= 2;
            }
        }
        counts
    }

    // ========== Move application ==========

    /// Apply a move as the side to move, returning the new position with the
    /// SAME side still encoded as mover. Legality is the move generator's
    /// job; `apply` is a pure bit transformation.
    ///
    /// A slide lifts the topmost piece off the source square (always the
    /// mover's, for a legal move) before setting its slot at the destination.
    pub fn apply(self, m: Move) -> Board {
        match m {
            Move::Place { size, to } => {
                Board(self.0 ^ (0x1 << (to.0 as u32 * Self::CELL_BITS + 2 * size as u32)))
            }
            Move::Slide { from, to } => {
                let (_, size) = self.top_piece(from).expect("no piece on the source square");
                let lifted = self.0 ^ (0x1 << (from.0 as u32 * Self::CELL_BITS + 2 * size as u32));
                Board(lifted ^ (0x1 << (to.0 as u32 * Self::CELL_BITS + 2 * size as u32)))
            }
        }
    }

    /// Swap mover and opponent in every slot. Applying a move and then
    /// swapping yields the position from the next player's seat; a second
    /// swap undoes the first.
    #[inline]
    pub fn swap_sides(self) -> Board {
        Board(((self.0 & Self::OPPONENT_MASK) >> 1) | ((self.0 & Self::MOVER_MASK) << 1))
    }

    /// Table key of the position reached by playing `m`: apply, hand the
    /// turn over, canonicalize.
    #[inline]
    pub fn successor(&self, m: Move) -> Board {
        self.apply(m).swap_sides().canonical()
    }

    // ========== Symmetry ==========
    //
    // The full dihedral group of the square is generated by the vertical
    // flip and the anti-transpose; alternating them seven times visits all
    // eight images. These operate on bare positions (verdict bits clear).

    /// Mirror the board vertically, swapping the top and bottom rows.
    #[inline]
    pub fn flipud(self) -> Board {
        Board(((self.0 << 36) & 0x3FFFF000000000) | (self.0 & 0xFFFFC0000) | (self.0 >> 36))
    }

    /// Mirror the board about the anti-diagonal: square (r,c) ↔ (2-c, 2-r).
    #[inline]
    pub fn antitranspose(self) -> Board {
        Board(
            ((self.0 << 48) & 0x3F000000000000)
                | ((self.0 << 24) & 0xFC0FC0000000)
                | (self.0 & 0x3F03F03F000)
                | ((self.0 >> 24) & 0xFC0FC0)
                | (self.0 >> 48),
        )
    }

    /// The canonical representative of this position's symmetry orbit: the
    /// lexicographic minimum over all 8 rotations and reflections.
    pub fn canonical(&self) -> Board {
        let mut s = *self;
        let mut min = s.0;
        for step in 0..7 {
            s = if step % 2 == 0 {
                s.flipud()
            } else {
                s.antitranspose()
            };
            if s.0 < min {
                min = s.0;
            }
        }
        Board(min)
    }

    // ========== Terminal detection ==========

    /// Value for the side to move if the game is over, otherwise 0.
    ///
    /// A line belongs to whoever owns the visible piece on all three of its
    /// squares. If the mover owns any line the mover has already won (+1),
    /// even when the opponent also owns one: the opponent's last move must
    /// have uncovered the mover's line, which loses on the spot. Otherwise
    /// an opponent-owned line is a loss (-1).
    pub fn terminal_value(&self) -> i8 {
        let mut value = 0;
        for line in &Self::WIN_LINES {
            let owner = self.top_owner_bits(line[0]);
            if owner == 0
                || owner != self.top_owner_bits(line[1])
                || owner != self.top_owner_bits(line[2])
            {
                continue;
            }
            if owner == Owner::Mover as u64 {
                return 1;
            }
            value = -1;
        }
        value
    }

    // ========== Move generation ==========

    /// All legal moves for the side to move, distinct up to symmetry:
    /// two moves reaching the same canonical successor count as one choice.
    /// Terminal positions are the caller's concern; the generator does not
    /// check them.
    pub fn legal_moves(&self, rules: &Rules) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut seen = HashSet::new();
        let mut played = [0u8; 3];

        // Relocations of the mover's visible pieces. The same pass tallies
        // the mover's piece counts, buried pieces included, for the
        // placement phase below.
        for from in 0..9u8 {
            let mut cell = self.cell(Pos(from));
            let mut owner = 0u64;
            let mut size = 0u32; // 1-based size of the top piece after the scan
            while cell != 0 {
                owner = cell & Self::SLOT_MASK;
                if owner == Owner::Mover as u64 {
                    played[size as usize] += 1;
                }
                size += 1;
                cell >>= 2;
            }
            if rules.relocation && owner == Owner::Mover as u64 {
                for to in 0..9u8 {
                    // Strictly-smaller destination check. The moving piece
                    // occupies its own source slot, so `to == from` never
                    // passes it.
                    if (0x1 << (2 * (size - 1))) > self.cell(Pos(to)) {
                        self.push_unique(
                            Move::Slide {
                                from: Pos(from),
                                to: Pos(to),
                            },
                            &mut moves,
                            &mut seen,
                        );
                    }
                }
            }
        }

        // New pieces from the reserve.
        for (idx, size) in Size::all().take(rules.sizes as usize).enumerate() {
            if played[idx] < rules.per_size {
                for to in 0..9u8 {
                    if (0x1 << (2 * idx)) > self.cell(Pos(to)) {
                        self.push_unique(Move::Place { size, to: Pos(to) }, &mut moves, &mut seen);
                    }
                }
            }
        }

        moves
    }

    /// Record `m` unless an earlier move already reaches the same canonical
    /// successor.
    fn push_unique(&self, m: Move, moves: &mut Vec<Move>, seen: &mut HashSet<u64>) {
        if seen.insert(self.successor(m).0) {
            moves.push(m);
        }
    }

    /// Check a single move against the rules, without symmetry reduction.
    /// This is the driver-facing validation; the solver itself only ever
    /// applies generated moves.
    pub fn is_legal(&self, rules: &Rules, m: Move) -> bool {
        match m {
            Move::Place { size, to } => {
                (size as u8) < rules.sizes
                    && self.mover_counts()[size as usize] < rules.per_size
                    && (0x1 << (2 * size as u32)) > self.cell(to)
            }
            Move::Slide { from, to } => {
                if !rules.relocation || from == to {
                    return false;
                }
                match self.top_piece(from) {
                    Some((Owner::Mover, size)) => (0x1 << (2 * size as u32)) > self.cell(to),
                    _ => false,
                }
            }
        }
    }

    // ========== Unmove generation ==========

    /// Canonical predecessors of this position: every position from which a
    /// single legal move reaches it. `self` is the position after the
    /// previous player moved, so that player is currently the opponent;
    /// swapping sides first puts them back in the mover's seat.
    ///
    /// Candidates where the game was already over are discarded - the
    /// previous player could not have had the move there.
    pub fn predecessors(&self, rules: &Rules) -> Vec<Board> {
        let swapped = self.swap_sides();
        let mut prevs = BTreeSet::new();

        for end in 0..9u8 {
            let end = Pos(end);
            let Some((owner, size)) = swapped.top_piece(end) else {
                continue;
            };
            if owner != Owner::Mover {
                continue;
            }

            if rules.relocation {
                // Undo a relocation: the piece came from any square whose
                // stack it could legally have left behind.
                for start in 0..9u8 {
                    let start = Pos(start);
                    if (0x1 << (2 * size as u32)) > swapped.cell(start) {
                        let prev = swapped.apply(Move::Slide {
                            from: end,
                            to: start,
                        });
                        if prev.terminal_value() == 0 {
                            prevs.insert(prev.canonical().0);
                        }
                    }
                }
            }

            // Undo a placement. Applying a Place toggles an already-set
            // mover bit, which removes the piece from the board.
            let prev = swapped.apply(Move::Place { size, to: end });
            if prev.terminal_value() == 0 {
                prevs.insert(prev.canonical().0);
            }
        }

        prevs.into_iter().map(Board).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
