use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::definitions::{DEFAULT_MAX_DISTANCE, DEFAULT_MAX_RESULTS};
use crate::{Error, Fingerprint, FingerprintTable, GrayGrid};

/// Options for ranking a query against the fingerprint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Candidates at this Hamming distance or more are rejected. The
    /// comparison is strict: a candidate at exactly `max_distance` does
    /// not match.
    pub max_distance: u32,

    /// At most this many matches are returned. Excess candidates beyond
    /// the cap are discarded, not an error.
    pub max_results: usize,
}

impl std::default::Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// One table frame matched by a search, with its raw bit distance to the
/// query. Lower distance means more similar; the score is not a
/// calibrated confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameMatch {
    pub distance: u32,
    pub frame: u16,
    pub episode: u16,
    pub source_id: u8,
}

impl FingerprintTable {
    /// Rank the whole table against `query` and return the closest
    /// frames.
    ///
    /// A linear scan computes the Hamming distance to every record,
    /// keeps those strictly under `max_distance`, sorts ascending by
    /// distance, and truncates to `max_results`. The sort is stable, so
    /// equal-distance matches keep their original table order: that is
    /// the documented tie-break.
    ///
    /// An empty result means the search ran and found nothing under the
    /// threshold; it is not an error.
    ///
    /// Scratch space is local to each call, so one table can serve
    /// concurrent searches.
    #[must_use]
    pub fn search(&self, query: Fingerprint, opts: &SearchOptions) -> Vec<FrameMatch> {
        let mut candidates: Vec<(u32, usize)> = vec![];

        for (index, record) in self.records().iter().enumerate() {
            let distance = query.hamming_distance(record.fingerprint);
            if distance < opts.max_distance {
                candidates.push((distance, index));
            }
        }

        //stable: ties keep table order
        candidates.sort_by_key(|&(distance, _index)| distance);
        candidates.truncate(opts.max_results);

        candidates
            .into_iter()
            .map(|(distance, index)| {
                let record = &self.records()[index];
                FrameMatch {
                    distance,
                    frame: record.frame,
                    episode: record.episode,
                    source_id: record.source_id,
                }
            })
            .collect()
    }
}

/// The whole online query path: fingerprint an RGBA image and rank it
/// against the table.
///
/// # Errors
/// Returns [`Error::Resize`] if the image cannot be reduced to the hash
/// grid. That failure is local to this query; the table remains usable.
pub fn locate(
    table: &FingerprintTable,
    img: &RgbaImage,
    opts: &SearchOptions,
) -> Result<Vec<FrameMatch>, Error> {
    let grid = GrayGrid::from_rgba(img)?;
    let query = Fingerprint::from_grid(&grid);
    Ok(table.search(query, opts))
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rand::prelude::*;

    use super::*;
    use crate::definitions::{GRID_PIXELS, GRID_WIDTH};
    use crate::FingerprintRecord;

    fn record(fingerprint: Fingerprint, frame: u16) -> FingerprintRecord {
        FingerprintRecord {
            fingerprint,
            frame,
            episode: 1,
            source_id: 1,
        }
    }

    //a grid whose rows fall for four pairs then rise for four,
    //encoding to 0x0f0f0f0f0f0f0f0f
    fn grid_for_0f_pattern() -> GrayGrid {
        let row = [4u8, 3, 2, 1, 0, 1, 2, 3, 4];
        let mut pixels = [0u8; GRID_PIXELS];
        for (i, px) in pixels.iter_mut().enumerate() {
            *px = row[i % GRID_WIDTH as usize];
        }
        GrayGrid::from_pixels(pixels)
    }

    #[test]
    fn exact_match_is_returned_first_at_distance_zero() {
        let wanted = Fingerprint::from_raw(0x0f0f_0f0f_0f0f_0f0f);
        let table = FingerprintTable::new([
            record(wanted.with_distance(6, &mut StdRng::seed_from_u64(10)), 1),
            FingerprintRecord {
                fingerprint: wanted,
                frame: 42,
                episode: 3,
                source_id: 1,
            },
            record(wanted.with_distance(3, &mut StdRng::seed_from_u64(11)), 2),
        ]);

        let query = Fingerprint::from_grid(&grid_for_0f_pattern());
        assert_eq!(query, wanted);

        let matches = table.search(query, &SearchOptions::default());
        assert_eq!(matches[0].distance, 0);
        assert_eq!(matches[0].frame, 42);
        assert_eq!(matches[0].episode, 3);
        assert_eq!(matches[0].source_id, 1);
    }

    #[test]
    fn no_candidate_under_threshold_yields_empty_list() {
        let mut rng = StdRng::seed_from_u64(20);
        let query = Fingerprint::random_fingerprint(&mut rng);

        let table = FingerprintTable::new(
            (0..100).map(|i| record(query.with_distance(10 + (i % 50), &mut rng), i as u16)),
        );

        let matches = table.search(query, &SearchOptions::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn searching_an_empty_table_finds_nothing() {
        let table = FingerprintTable::default();
        let matches = table.search(Fingerprint::from_raw(0), &SearchOptions::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn threshold_is_strict_and_no_close_record_is_dropped() {
        let mut rng = StdRng::seed_from_u64(30);
        let query = Fingerprint::random_fingerprint(&mut rng);

        //distances 0..=14, one record each
        let table =
            FingerprintTable::new((0..15).map(|d| record(query.with_distance(d, &mut rng), d as u16)));

        let opts = SearchOptions {
            max_distance: 10,
            max_results: 100,
        };
        let matches = table.search(query, &opts);

        //exactly the 10 records at distance 0..=9 survive
        assert_eq!(matches.len(), 10);
        for m in &matches {
            assert!(m.distance < opts.max_distance);
        }
        let found_frames = matches.iter().map(|m| m.frame).sorted().collect::<Vec<_>>();
        assert_eq!(found_frames, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn matches_are_sorted_by_distance_and_capped() {
        let mut rng = StdRng::seed_from_u64(40);
        let query = Fingerprint::random_fingerprint(&mut rng);

        let mut records = vec![];
        for d in (0..10).rev() {
            for _ in 0..5 {
                records.push(record(query.with_distance(d, &mut rng), d as u16));
            }
        }
        let table = FingerprintTable::new(records);

        let matches = table.search(query, &SearchOptions::default());

        assert_eq!(matches.len(), DEFAULT_MAX_RESULTS);
        for (a, b) in matches.iter().tuple_windows() {
            assert!(a.distance <= b.distance);
        }
        //the 20 best out of 50 qualifying records are distances 0..=3
        assert_eq!(matches.last().map(|m| m.distance), Some(3));
    }

    #[test]
    fn ties_keep_table_order() {
        let mut rng = StdRng::seed_from_u64(50);
        let query = Fingerprint::random_fingerprint(&mut rng);

        //frame number records insertion order; all candidates tie at
        //distance 4
        let records = (0..30)
            .map(|i| record(query.with_distance(4, &mut rng), i as u16))
            .collect::<Vec<_>>();
        let table = FingerprintTable::new(records);

        let opts = SearchOptions {
            max_distance: 10,
            max_results: 30,
        };

        let first = table.search(query, &opts);
        assert_eq!(
            first.iter().map(|m| m.frame).collect::<Vec<_>>(),
            (0..30).collect::<Vec<_>>()
        );

        //reproducible across runs
        let second = table.search(query, &opts);
        assert_eq!(first, second);
    }

    #[test]
    fn locate_runs_the_whole_online_path() {
        let wanted = Fingerprint::from_grid(&grid_for_0f_pattern());
        let table = FingerprintTable::new([FingerprintRecord {
            fingerprint: wanted,
            frame: 42,
            episode: 3,
            source_id: 1,
        }]);

        //blow the grid up to screenshot size; a uniform upscale of the
        //pattern keeps the row ordering intact
        let mut img = RgbaImage::new(90, 80);
        let row = [4u8, 3, 2, 1, 0, 1, 2, 3, 4];
        for (x, _y, px) in img.enumerate_pixels_mut() {
            let v = row[(x / 10) as usize] * 40;
            *px = image::Rgba([v, v, v, 255]);
        }

        let matches = locate(&table, &img, &SearchOptions::default()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].frame, 42);
        assert_eq!(matches[0].distance, 0);
    }
}
