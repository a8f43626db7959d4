//! On-disk persistence of a solved table.
//!
//! The cache file is a raw little-endian dump of every entry word, vacant
//! slots included, so a table of exponent `e` persists as exactly
//! `2^e × 8` bytes. One file per rule variant, named
//! `gobblet_<sizes>_<per_size>_<relocation>.dat`. A file of the wrong
//! length is rejected up front; the caller treats any load error as
//! cache-absent and re-solves.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use gobblers_core::Rules;

use crate::table::Table;

/// Words moved per read/write call.
const CHUNK_WORDS: usize = 1 << 16;

/// Cache filename for a rule variant.
pub fn filename(rules: &Rules) -> String {
    format!(
        "gobblet_{}_{}_{}.dat",
        rules.sizes, rules.per_size, rules.relocation as u8
    )
}

/// Load a table of the given exponent from a cache file.
pub fn load(path: &Path, exp: u32) -> io::Result<Table> {
    let file = File::open(path)?;
    let expected = (1u64 << exp) * 8;
    let len = file.metadata()?.len();
    if len != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("cache file is {} bytes, expected {}", len, expected),
        ));
    }

    let mut reader = BufReader::new(file);
    let mut table = Table::new(exp);
    let mut chunk = vec![0u8; CHUNK_WORDS * 8];
    for words in table.words_mut().chunks_mut(CHUNK_WORDS) {
        let bytes = &mut chunk[..words.len() * 8];
        reader.read_exact(bytes)?;
        for (word, raw) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            *word = u64::from_le_bytes(raw.try_into().unwrap());
        }
    }
    Ok(table)
}

/// Write the full table to a cache file.
pub fn save(path: &Path, table: &Table) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut chunk = Vec::with_capacity(CHUNK_WORDS * 8);
    for words in table.words().chunks(CHUNK_WORDS) {
        chunk.clear();
        for word in words {
            chunk.extend_from_slice(&word.to_le_bytes());
        }
        writer.write_all(&chunk)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{pack, VACANT};

    #[test]
    fn filename_encodes_the_rules() {
        let rules = Rules::new(3, 2, true).unwrap();
        assert_eq!(filename(&rules), "gobblet_3_2_1.dat");
        let rules = Rules::new(1, 3, false).unwrap();
        assert_eq!(filename(&rules), "gobblet_1_3_0.dat");
    }

    #[test]
    fn save_load_roundtrip() {
        let path = std::env::temp_dir().join("gobblers_cache_roundtrip.dat");

        let mut table = Table::new(10);
        *table.entry(0) = pack(0, 9);
        *table.entry(0x1041) = 0x1041 | pack(1, 3);
        *table.entry(0x2082) = 0x2082 | pack(-1, 0);

        save(&path, &table).unwrap();
        let loaded = load(&path, 10).unwrap();
        assert_eq!(loaded.words(), table.words());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn wrong_length_is_rejected() {
        let path = std::env::temp_dir().join("gobblers_cache_short.dat");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let err = load(&path, 10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn vacant_slots_survive_the_trip() {
        let path = std::env::temp_dir().join("gobblers_cache_vacant.dat");

        let table = Table::new(8);
        save(&path, &table).unwrap();
        let loaded = load(&path, 8).unwrap();
        assert!(loaded.words().iter().all(|&w| w == VACANT));

        std::fs::remove_file(&path).ok();
    }
}
