use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{Error, Fingerprint};

/// One fingerprinted frame of one episode of one series.
///
/// Records are created only by the indexer (or by tooling that compiles
/// indexer output into a table) and are never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Perceptual hash of the frame, stored as a 16-digit hex string on
    /// disk.
    pub fingerprint: Fingerprint,

    /// Frame index within the episode, counted from 0 at the indexer's
    /// sampling rate.
    pub frame: u16,

    /// Episode number the frame belongs to.
    pub episode: u16,

    /// Which series/title the episode belongs to.
    pub source_id: u8,
}

/// The immutable reference table that queries are ranked against.
///
/// Built once (ahead of time, by indexing every episode) and loaded once
/// per process. The table is read-only during searches, so a shared
/// reference can serve concurrent queries. Iteration order matters: it
/// is the tie-break order for equal-distance matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintTable {
    records: Vec<FingerprintRecord>,
}

impl FingerprintTable {
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = FingerprintRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Load a table from its JSON storage form (an array of records).
    ///
    /// # Errors
    /// Returns [`Error::Table`] if the stream is not a well-formed
    /// record array.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(|e| Error::Table(e.to_string()))
    }

    /// Write the table in its JSON storage form.
    ///
    /// # Errors
    /// Returns [`Error::Table`] on serialization or IO failure.
    pub fn to_json_writer(&self, writer: impl Write) -> Result<(), Error> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| Error::Table(e.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn records(&self) -> &[FingerprintRecord] {
        &self.records
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_table() -> FingerprintTable {
        FingerprintTable::new([
            FingerprintRecord {
                fingerprint: Fingerprint::from_raw(0x0f0f_0f0f_0f0f_0f0f),
                frame: 42,
                episode: 3,
                source_id: 1,
            },
            FingerprintRecord {
                fingerprint: Fingerprint::from_raw(0xdead_beef_0000_ffff),
                frame: 7,
                episode: 12,
                source_id: 2,
            },
        ])
    }

    #[test]
    fn json_storage_round_trip_preserves_order() {
        let table = sample_table();

        let mut json = vec![];
        table.to_json_writer(&mut json).unwrap();
        let reloaded = FingerprintTable::from_json_reader(json.as_slice()).unwrap();

        assert_eq!(reloaded.records(), table.records());
    }

    #[test]
    fn fingerprints_are_stored_as_hex() {
        let mut json = vec![];
        sample_table().to_json_writer(&mut json).unwrap();
        let json = String::from_utf8(json).unwrap();

        assert!(json.contains("\"0f0f0f0f0f0f0f0f\""));
        assert!(json.contains("\"deadbeef0000ffff\""));
    }

    #[test]
    fn garbage_table_file_is_a_table_error() {
        let result = FingerprintTable::from_json_reader(&b"not a table"[..]);
        assert!(matches!(result, Err(Error::Table(_))));
    }
}
