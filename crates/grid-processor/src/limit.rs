//! Point-count limiting by seeded random sampling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::types::SubsetTable;

/// Default maximum number of points returned to the map.
pub const DEFAULT_MAX_POINTS: usize = 10_000;
/// Default sampling seed.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Downsample `table` to at most `cap` rows.
///
/// Tables within the cap are returned unchanged. Larger tables are sampled
/// uniformly without replacement; the result is deterministic for a given
/// table, cap and seed, but row order is not preserved.
pub fn limit(table: SubsetTable, cap: usize, seed: u64) -> SubsetTable {
    let len = table.len();
    if len <= cap {
        return table;
    }

    debug!(from = len, to = cap, "Reducing data points");

    let mut rng = StdRng::seed_from_u64(seed);
    let picked = rand::seq::index::sample(&mut rng, len, cap);
    let rows = table.rows();
    picked.iter().map(|i| rows[i]).collect()
}
