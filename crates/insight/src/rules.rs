use serde::Serialize;

/// One `(predicate, result)` pair: matches when the label contains any needle.
///
/// Containment is case-sensitive.
#[derive(Debug, Clone, Copy)]
pub struct Rule<T> {
    pub needles: &'static [&'static str],
    pub outcome: T,
}

impl<T> Rule<T> {
    pub fn matches(&self, label: &str) -> bool {
        self.needles.iter().any(|needle| label.contains(needle))
    }
}

/// Ordered rules evaluated first-match-wins, with a fallback.
#[derive(Debug, Clone, Copy)]
pub struct RuleList<T: 'static> {
    pub rules: &'static [Rule<T>],
    pub fallback: T,
}

impl<T: Copy + 'static> RuleList<T> {
    pub fn evaluate(&self, label: &str) -> T {
        self.rules
            .iter()
            .find(|rule| rule.matches(label))
            .map_or(self.fallback, |rule| rule.outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStyle {
    Gold,
    Red,
    Blue,
    Slate,
}

impl SegmentStyle {
    /// Accent colour token for renderers.
    pub const fn accent(self) -> &'static str {
        match self {
            SegmentStyle::Gold => "amber",
            SegmentStyle::Red => "red",
            SegmentStyle::Blue => "blue",
            SegmentStyle::Slate => "slate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentIcon {
    Award,
    Alert,
    Target,
    Users,
}

impl SegmentIcon {
    pub const fn name(self) -> &'static str {
        match self {
            SegmentIcon::Award => "award",
            SegmentIcon::Alert => "alert-circle",
            SegmentIcon::Target => "target",
            SegmentIcon::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Retain,
    WinBack,
    Upsell,
    Monitor,
    Standard,
}

impl Recommendation {
    pub const fn text(self) -> &'static str {
        match self {
            Recommendation::Retain => {
                "Offer VIP perks, exclusive early access, and loyalty rewards to retain."
            }
            Recommendation::WinBack => {
                "Re-engage with discounts, win-back campaigns, and surveys to understand churn."
            }
            Recommendation::Upsell => {
                "Upsell premium products and offer bundle deals to increase wallet share."
            }
            Recommendation::Monitor => "Monitor for changes, automate low-cost engagement.",
            Recommendation::Standard => "Standard engagement strategies.",
        }
    }
}

pub const STYLE_RULES: RuleList<SegmentStyle> = RuleList {
    rules: &[
        Rule {
            needles: &["High Value"],
            outcome: SegmentStyle::Gold,
        },
        Rule {
            needles: &["Risk", "Low"],
            outcome: SegmentStyle::Red,
        },
        Rule {
            needles: &["Potential", "Saver"],
            outcome: SegmentStyle::Blue,
        },
    ],
    fallback: SegmentStyle::Slate,
};

// No "Low" or "Saver" branch here, unlike the style and recommendation lists.
pub const ICON_RULES: RuleList<SegmentIcon> = RuleList {
    rules: &[
        Rule {
            needles: &["High Value"],
            outcome: SegmentIcon::Award,
        },
        Rule {
            needles: &["Risk"],
            outcome: SegmentIcon::Alert,
        },
        Rule {
            needles: &["Potential"],
            outcome: SegmentIcon::Target,
        },
    ],
    fallback: SegmentIcon::Users,
};

pub const RECOMMENDATION_RULES: RuleList<Recommendation> = RuleList {
    rules: &[
        Rule {
            needles: &["High Value"],
            outcome: Recommendation::Retain,
        },
        Rule {
            needles: &["Risk"],
            outcome: Recommendation::WinBack,
        },
        Rule {
            needles: &["Potential", "Saver"],
            outcome: Recommendation::Upsell,
        },
        Rule {
            needles: &["Low"],
            outcome: Recommendation::Monitor,
        },
    ],
    fallback: Recommendation::Standard,
};

/// Style, icon and recommendation for a cluster label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub style: SegmentStyle,
    pub icon: SegmentIcon,
    pub recommendation: Recommendation,
}

impl Classification {
    pub const fn recommendation_text(&self) -> &'static str {
        self.recommendation.text()
    }
}

pub fn classify(label: &str) -> Classification {
    Classification {
        style: STYLE_RULES.evaluate(label),
        icon: ICON_RULES.evaluate(label),
        recommendation: RECOMMENDATION_RULES.evaluate(label),
    }
}
