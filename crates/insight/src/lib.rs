//! Turns segmentation service results into a presentation model: plotting axes,
//! per-cluster series, distribution counts and insight cards.

mod dashboard;
mod error;
pub mod partition;
pub mod rules;
pub mod schema;
pub mod stats;
mod view;

pub use dashboard::{Dashboard, RefreshOutcome, SegmentationSource, Snapshot};
pub use error::{FetchStep, InsightError, Result};
pub use partition::{distribution, partition, ClusterCount, ClusterSeries, PALETTE};
pub use rules::{classify, Classification, Recommendation, SegmentIcon, SegmentStyle};
pub use schema::{infer_axes, Axes, SchemaInferrer, SemanticTag, SubstringInferrer};
pub use stats::{extract_display_stats, DisplayStats};
pub use view::{
    build_cards, build_view, display_description, DashboardView, DistributionBar, InsightCard,
    Overview, ScatterPoint, ScatterSeries,
};
