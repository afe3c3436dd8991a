use segview_protocol::{ClusterId, Insight, InsightMap, Record};
use serde::Serialize;

use crate::partition::{distribution, palette_color, partition};
use crate::rules::{classify, Classification};
use crate::schema::{infer_axes, Axes};
use crate::stats::{extract_display_stats, DisplayStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_customers: usize,
    /// Number of insight entries, not of distinct ids in the records.
    pub segments_found: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub cluster: ClusterId,
    pub name: String,
    pub palette_index: usize,
    pub color: &'static str,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionBar {
    pub name: String,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightCard {
    pub cluster: String,
    pub label: String,
    pub description: String,
    pub stats: DisplayStats,
    pub classification: Classification,
    pub recommendation: &'static str,
}

impl InsightCard {
    pub fn build(key: &str, insight: &Insight) -> Self {
        let classification = classify(&insight.label);
        Self {
            cluster: key.to_string(),
            label: insight.label.clone(),
            description: display_description(key, &insight.description),
            stats: extract_display_stats(&insight.stats),
            recommendation: classification.recommendation_text(),
            classification,
        }
    }
}

/// Everything a renderer needs, derived from one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub overview: Overview,
    pub axes: Axes,
    pub scatter: Vec<ScatterSeries>,
    pub distribution: Vec<DistributionBar>,
    pub cards: Vec<InsightCard>,
}

pub fn build_view(records: &[Record], insights: &InsightMap) -> DashboardView {
    let axes = infer_axes(records);

    let scatter: Vec<ScatterSeries> = partition(records)
        .into_iter()
        .map(|series| ScatterSeries {
            cluster: series.cluster,
            name: series.cluster.label(),
            palette_index: series.palette_index,
            color: series.color(),
            points: series
                .records
                .iter()
                .map(|record| ScatterPoint {
                    x: record.number(&axes.income_field),
                    y: record.number(&axes.spend_field),
                })
                .collect(),
        })
        .collect();

    for series in &scatter {
        if insights.for_cluster(series.cluster).is_none() {
            log::warn!("No insight for cluster {}; card skipped", series.cluster);
        }
    }

    let distribution = distribution(records)
        .into_iter()
        .enumerate()
        .map(|(idx, count)| DistributionBar {
            name: count.name,
            value: count.value,
            color: palette_color(idx),
        })
        .collect();

    DashboardView {
        overview: Overview {
            total_customers: records.len(),
            segments_found: insights.len(),
        },
        axes,
        scatter,
        distribution,
        cards: build_cards(insights),
    }
}

/// One card per insight entry. Canonical integer keys come first in ascending
/// order, any other keys (`"-1"`, `"04"`, names) follow in payload order.
pub fn build_cards(insights: &InsightMap) -> Vec<InsightCard> {
    let mut entries: Vec<(Option<ClusterId>, usize, &str, &Insight)> = insights
        .iter()
        .enumerate()
        .map(|(pos, (key, insight))| (ClusterId::parse_key(key), pos, key, insight))
        .collect();
    entries.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    entries
        .into_iter()
        .map(|(_, _, key, insight)| InsightCard::build(key, insight))
        .collect()
}

/// Drops the redundant `Cluster {key} contains` lead-in (first occurrence only).
pub fn display_description(key: &str, description: &str) -> String {
    description.replacen(&format!("Cluster {key} contains"), "Contains", 1)
}
