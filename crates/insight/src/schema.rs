use segview_protocol::Record;
use serde::Serialize;

/// Meaning a column can carry for plotting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticTag {
    Income,
    Spending,
}

impl SemanticTag {
    /// Lowercase substrings that mark a field name as carrying this tag.
    pub const fn needles(self) -> &'static [&'static str] {
        match self {
            SemanticTag::Income => &["income"],
            SemanticTag::Spending => &["spending", "score"],
        }
    }

    /// Field name used when no column matches. It never exists in a record,
    /// so charts end up with degenerate axes instead of failing.
    pub const fn placeholder(self) -> &'static str {
        match self {
            SemanticTag::Income => "x",
            SemanticTag::Spending => "y",
        }
    }
}

/// The two plotting dimensions chosen for a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axes {
    pub income_field: String,
    pub spend_field: String,
}

impl Axes {
    pub fn is_placeholder(&self, tag: SemanticTag) -> bool {
        let field = match tag {
            SemanticTag::Income => &self.income_field,
            SemanticTag::Spending => &self.spend_field,
        };
        field == tag.placeholder()
    }
}

/// Finds fields carrying a semantic meaning in a record whose shape is not
/// known ahead of time.
pub trait SchemaInferrer {
    /// Field names of `record` matching `tag`, in record order.
    fn candidates<'r>(&self, record: &'r Record, tag: SemanticTag) -> Vec<&'r str>;

    /// First candidate in `sample`, or the tag placeholder.
    fn resolve(&self, sample: Option<&Record>, tag: SemanticTag) -> String {
        sample
            .and_then(|record| self.candidates(record, tag).into_iter().next())
            .unwrap_or(tag.placeholder())
            .to_string()
    }

    /// Picks both axes from the first record of the set.
    fn infer_axes(&self, records: &[Record]) -> Axes {
        let sample = records.first();
        let axes = Axes {
            income_field: self.resolve(sample, SemanticTag::Income),
            spend_field: self.resolve(sample, SemanticTag::Spending),
        };
        if sample.is_some() {
            for tag in [SemanticTag::Income, SemanticTag::Spending] {
                if axes.is_placeholder(tag) {
                    log::warn!(
                        "No {:?} column found; plotting against placeholder field {:?}",
                        tag,
                        tag.placeholder()
                    );
                }
            }
        }
        axes
    }
}

/// Case-insensitive substring match over field names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringInferrer;

impl SchemaInferrer for SubstringInferrer {
    fn candidates<'r>(&self, record: &'r Record, tag: SemanticTag) -> Vec<&'r str> {
        record
            .field_names()
            .filter(|name| {
                let lowered = name.to_lowercase();
                tag.needles().iter().any(|needle| lowered.contains(needle))
            })
            .collect()
    }
}

pub fn infer_axes(records: &[Record]) -> Axes {
    SubstringInferrer.infer_axes(records)
}
