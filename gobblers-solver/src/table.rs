//! Fixed-capacity position table with the verdict packed into the key word.
//!
//! # Entry Encoding (64-bit)
//!
//! ```text
//! Bits 0-53:  canonical position
//! Bits 54-63: verdict, from the stored position's side to move:
//!   01dddddddd  win in d plies
//!   10dddddddd  tentative or final draw; d = -(winning moves remaining + 1)
//!               in two's complement
//!   11dddddddd  loss in -(d+1) plies in two's complement
//!   00........  reached but not yet classified (the word is the bare key)
//! ```
//!
//! The ten verdict bits are ordered so that comparing whole entry words as
//! integers ranks successors best-first for the player about to move into
//! them: opponent losses (quickest first), then draws, then opponent wins
//! (slowest first). Best-move selection is a plain `u64` argmax.
//!
//! The table itself is open addressing in the MSI style: SplitMix64 over
//! the key, double hashing with an odd step so every probe sequence cycles
//! through all slots, no deletion, no growth. Capacity is a correctness
//! precondition - the caller sizes the table so the reachable state space
//! keeps the load factor below one half - so probe exhaustion aborts.

/// Capacity exponent for production solves: 2^29 slots (4 GiB), enough for
/// the full three-size game with room to spare.
pub const TABLE_EXP: u32 = 29;

/// Low 54 bits: the position part of an entry word.
pub const STATE_MASK: u64 = (1 << 54) - 1;

/// Sentinel for a never-written slot. No real position encodes to it: it
/// would put a mover piece and an opponent piece in the same size slot.
/// (All-zero cannot serve - 0 is the valid initial board.)
pub const VACANT: u64 = 0x3;

/// Game-theoretic value of a classified position, for its side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Win,
    Draw,
    Loss,
}

/// Pack a verdict into the upper 10 bits. `value` is +1 win, 0 draw,
/// -1 loss; `moves` is the ply distance for win/loss and the count of
/// still-open winning moves for a draw. Fits losslessly for `moves` <= 127.
#[inline]
pub fn pack(value: i8, moves: u64) -> u64 {
    let flip = if value == -1 { 0 } else { 1u64 << 62 };
    let field = if value == 1 {
        moves
    } else {
        (moves + 1).wrapping_neg()
    };
    flip ^ (field << 54)
}

/// Verdict class of an entry word: +1 win, 0 draw, -1 loss, +2 when the
/// word carries no verdict (vacant slot or unclassified position).
#[inline]
pub fn unpack_value(word: u64) -> i8 {
    2 - (word >> 62) as i8
}

/// Distance or winning-move count of an entry word; the inverse of the
/// `moves` argument of [`pack`].
#[inline]
pub fn unpack_moves(word: u64) -> u64 {
    let field = ((word << 2) as i64) >> 56;
    if field < 0 {
        (-field - 1) as u64
    } else {
        field as u64
    }
}

/// Decode an entry word into a queryable verdict, or None for a word that
/// carries no verdict.
pub fn verdict_of(word: u64) -> Option<(Verdict, u64)> {
    let verdict = match unpack_value(word) {
        1 => Verdict::Win,
        0 => Verdict::Draw,
        -1 => Verdict::Loss,
        _ => return None,
    };
    Some((verdict, unpack_moves(word)))
}

/// Fixed array of entry words, allocated once and never resized.
#[derive(Debug)]
pub struct Table {
    slots: Vec<u64>,
    mask: u64,
    exp: u32,
}

impl Table {
    /// Allocate 2^exp slots, all vacant.
    pub fn new(exp: u32) -> Table {
        assert!((1..=32).contains(&exp), "table exponent out of range");
        Table {
            slots: vec![VACANT; 1usize << exp],
            mask: (1u64 << exp) - 1,
            exp,
        }
    }

    /// SplitMix64 finalizer.
    #[inline]
    fn hash(mut h: u64) -> u64 {
        h ^= h >> 30;
        h = h.wrapping_mul(0xBF58476D1CE4E5B9);
        h ^= h >> 27;
        h = h.wrapping_mul(0x94D049BB133111EB);
        h ^ (h >> 31)
    }

    /// Index of the slot holding `key`, or of the vacant slot where it
    /// would go. The step is odd, hence coprime with the power-of-two
    /// capacity, so the probe sequence visits every slot before the
    /// exhaustion abort can trigger.
    #[inline]
    fn find(&self, key: u64) -> usize {
        let h = Self::hash(key);
        let step = (h >> (64 - self.exp)) | 1;
        let mut i = h;
        for _ in 0..=self.mask {
            i = i.wrapping_add(step) & self.mask;
            let word = self.slots[i as usize];
            if word == VACANT || word & STATE_MASK == key {
                return i as usize;
            }
        }
        panic!("position table overflow: capacity 2^{} exhausted", self.exp);
    }

    /// Stored entry word for `key`, or [`VACANT`] if the position has never
    /// been written.
    #[inline]
    pub fn get(&self, key: u64) -> u64 {
        self.slots[self.find(key)]
    }

    /// Mutable slot for `key`. Nothing is inserted; the caller decides what
    /// word to write, and must keep the low 54 bits equal to `key` when it
    /// does.
    #[inline]
    pub fn entry(&mut self, key: u64) -> &mut u64 {
        let i = self.find(key);
        &mut self.slots[i]
    }

    /// Capacity exponent this table was allocated with.
    #[inline]
    pub fn exp(&self) -> u32 {
        self.exp
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The raw entry words, vacant slots included.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.slots
    }

    /// Mutable raw entry words, for bulk loading a persisted table.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.slots
    }

    /// Occupied slot count.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|&&w| w != VACANT).count()
    }

    /// True when no entry has been written yet.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|&w| w == VACANT)
    }
}
