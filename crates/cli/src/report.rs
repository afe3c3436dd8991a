use segview_insight::{DashboardView, InsightCard};

pub fn render_dashboard_report(source: &str, view: &DashboardView) -> String {
    let mut md = String::new();
    md.push_str("# Customer segmentation report\n\n");
    md.push_str(&format!("- Source: `{source}`\n"));
    md.push_str(&format!(
        "- Total customers: `{}`\n",
        view.overview.total_customers
    ));
    md.push_str(&format!(
        "- Segments found: `{}`\n\n",
        view.overview.segments_found
    ));

    md.push_str("## Income vs spending\n\n");
    md.push_str(&format!(
        "- Axes: x = `{}`, y = `{}`\n\n",
        escape_cell(&view.axes.income_field),
        escape_cell(&view.axes.spend_field)
    ));
    md.push_str("| series | colour | customers | plotted |\n");
    md.push_str("|---|---|---:|---:|\n");
    for series in &view.scatter {
        let plotted = series
            .points
            .iter()
            .filter(|p| p.x.is_some() && p.y.is_some())
            .count();
        md.push_str(&format!(
            "| {} | `{}` | `{}` | `{}` |\n",
            series.name,
            series.color,
            series.points.len(),
            plotted
        ));
    }
    md.push('\n');

    md.push_str("## Segment distribution\n\n");
    md.push_str("| segment | customers | colour |\n");
    md.push_str("|---|---:|---|\n");
    for bar in &view.distribution {
        md.push_str(&format!(
            "| {} | `{}` | `{}` |\n",
            bar.name, bar.value, bar.color
        ));
    }
    md.push('\n');

    if !view.cards.is_empty() {
        md.push_str("## Business insights\n\n");
        for card in &view.cards {
            render_card(&mut md, card);
        }
    }

    md
}

/// Shown while the service has no segmented customers.
pub fn render_empty_state(source: &str) -> String {
    let mut md = String::new();
    md.push_str("# Customer segmentation report\n\n");
    md.push_str(&format!("- Source: `{source}`\n\n"));
    md.push_str("## Ready to Analyze\n\n");
    md.push_str(
        "Upload your customer CSV file to generate detailed segments and actionable business insights instantly.\n",
    );
    md
}

fn render_card(md: &mut String, card: &InsightCard) {
    md.push_str(&format!(
        "### Cluster {}: {}\n\n",
        card.cluster,
        truncate_one_line(&card.label, 80)
    ));
    md.push_str(&format!(
        "- Style: `{}` / icon `{}`\n",
        card.classification.style.accent(),
        card.classification.icon.name()
    ));
    if !card.description.trim().is_empty() {
        md.push_str(&format!("- {}\n", truncate_one_line(&card.description, 240)));
    }
    md.push('\n');
    md.push_str("| income | spend | freq |\n");
    md.push_str("|---:|---:|---:|\n");
    md.push_str(&format!(
        "| `${}k` | `{}` | `{}/yr` |\n\n",
        card.stats.income, card.stats.spend, card.stats.freq
    ));
    md.push_str(&format!("> \"{}\"\n\n", card.recommendation));
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let mut s = text.replace(['\n', '\r', '\t'], " ");
    s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use segview_insight::build_view;
    use segview_protocol::{ClusterId, InsightMap, Record};
    use serde_json::json;

    #[test]
    fn report_renders_all_sections() {
        let records = vec![
            Record::new(ClusterId(10))
                .with("Income", 40)
                .with("Score", 30),
            Record::new(ClusterId(2)).with("Income", 90),
        ];
        let insights: InsightMap = serde_json::from_value(json!({
            "2": {
                "label": "High Value",
                "description": "Cluster 2 contains\nloyal buyers.",
                "stats": {"Annual Income (k$)": 90.2, "Total Spending": 77, "Purchase Frequency": 12}
            }
        }))
        .unwrap();
        let md = render_dashboard_report("http://svc", &build_view(&records, &insights));

        assert!(md.contains("# Customer segmentation report"));
        assert!(md.contains("- Total customers: `2`"));
        assert!(md.contains("- Segments found: `1`"));
        assert!(md.contains("x = `Income`, y = `Score`"));
        assert!(md.contains("| Cluster 2 | `#f59e0b` | `1` | `0` |"));
        assert!(md.contains("| Cluster 10 | `1` | `#f59e0b` |"));
        assert!(md.contains("### Cluster 2: High Value"));
        assert!(md.contains("- Contains loyal buyers."));
        assert!(md.contains("| `$90k` | `77` | `12/yr` |"));
        assert!(md.contains("> \"Offer VIP perks"));
    }

    #[test]
    fn insights_section_is_omitted_without_cards() {
        let records = vec![Record::new(ClusterId(0))];
        let md = render_dashboard_report("file", &build_view(&records, &InsightMap::new()));
        assert!(md.contains("## Segment distribution"));
        assert!(!md.contains("## Business insights"));
        assert!(md.contains("x = `x`, y = `y`"));
    }

    #[test]
    fn empty_state_points_at_upload() {
        let md = render_empty_state("http://svc");
        assert!(md.contains("- Source: `http://svc`"));
        assert!(md.contains("## Ready to Analyze"));
        assert!(md.contains("Upload your customer CSV file"));
        assert!(!md.contains("## Segment distribution"));
    }

    #[test]
    fn truncation_flattens_whitespace() {
        assert_eq!(truncate_one_line("a\n b\tc", 10), "a b c");
        assert_eq!(truncate_one_line("abcdef", 4), "abc…");
        assert_eq!(escape_cell("a|b"), "a\\|b");
    }
}
