use std::collections::BTreeMap;

use segview_protocol::{ClusterId, Record};
use serde::Serialize;

/// Series colours, assigned by cluster rank.
pub const PALETTE: [&str; 6] = [
    "#f59e0b", // amber
    "#ef4444", // red
    "#3b82f6", // blue
    "#10b981", // emerald
    "#8b5cf6", // violet
    "#ec4899", // pink
];

pub const PALETTE_SIZE: usize = PALETTE.len();

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE_SIZE]
}

/// Records of one cluster, ready for a scatter layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSeries<'a> {
    pub cluster: ClusterId,
    /// Input order is preserved.
    pub records: Vec<&'a Record>,
    pub palette_index: usize,
}

impl ClusterSeries<'_> {
    pub fn color(&self) -> &'static str {
        palette_color(self.palette_index)
    }
}

/// Groups records by cluster id, ascending by numeric id.
///
/// The palette index is the rank of the id modulo [`PALETTE_SIZE`], so colours stay
/// put across re-renders as long as the id set does.
pub fn partition(records: &[Record]) -> Vec<ClusterSeries<'_>> {
    let mut groups: BTreeMap<ClusterId, Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.cluster).or_default().push(record);
    }

    let series: Vec<_> = groups
        .into_iter()
        .enumerate()
        .map(|(rank, (cluster, records))| ClusterSeries {
            cluster,
            records,
            palette_index: rank % PALETTE_SIZE,
        })
        .collect();
    log::debug!(
        "Partitioned {} records into {} clusters",
        records.len(),
        series.len()
    );
    series
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterCount {
    pub name: String,
    pub value: usize,
}

/// Record counts per `Cluster {id}` label.
///
/// Sorted by label text, so `Cluster 10` comes before `Cluster 2`. This differs
/// from [`partition`] on purpose; the distribution view has always been ordered
/// this way.
pub fn distribution(records: &[Record]) -> Vec<ClusterCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.cluster.label()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, value)| ClusterCount { name, value })
        .collect()
}
