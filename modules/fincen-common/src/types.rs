use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Gateway rows ---

/// One row returned by the graph gateway: column name to value, in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated key replaces the earlier value in place.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

}

/// Uniform tabular view of a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// --- Epochs ---

/// The three historical periods, each with its own trained country embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Epoch {
    First,
    Second,
    Third,
}

impl Epoch {
    pub fn all() -> [Epoch; 3] {
        [Epoch::First, Epoch::Second, Epoch::Third]
    }

    /// 1-based index, matching the `vector_epoch{n}` property names.
    pub fn index(self) -> u8 {
        match self {
            Epoch::First => 1,
            Epoch::Second => 2,
            Epoch::Third => 3,
        }
    }

    /// Result column the vector is returned under.
    pub fn column(self) -> &'static str {
        match self {
            Epoch::First => "vec1",
            Epoch::Second => "vec2",
            Epoch::Third => "vec3",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Epoch::First => "Russia era: ~2011",
            Epoch::Second => "Singapore era: 2012~2014",
            Epoch::Third => "Latvia era: 2015~",
        }
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch{}", self.index())
    }
}

// --- Typed query rows ---

/// A country with its three epoch embeddings, validated at the gateway boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryVectorRow {
    pub name: String,
    pub vec1: Vec<f64>,
    pub vec2: Vec<f64>,
    pub vec3: Vec<f64>,
    /// Edge count to the selected country. `None` for the selected country itself.
    pub transaction_count: Option<i64>,
}

impl CountryVectorRow {
    pub fn vector(&self, epoch: Epoch) -> &[f64] {
        match epoch {
            Epoch::First => &self.vec1,
            Epoch::Second => &self.vec2,
            Epoch::Third => &self.vec3,
        }
    }
}

/// One filing amount attributed to a destination country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingAmountRow {
    pub country: String,
    pub amount: f64,
    pub year: Option<i64>,
}

// --- Aggregates ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTotal {
    pub country: String,
    pub total_amount: f64,
    pub filing_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i64,
    pub transaction_count: u64,
}

// --- Projection output ---

pub const HIGHLIGHT_COLOR: &str = "red";
pub const BASELINE_COLOR: &str = "blue";
pub const HIGHLIGHT_SIZE: u32 = 20;
pub const BASELINE_SIZE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub highlighted: bool,
}

impl ScatterPoint {
    pub fn color(&self) -> &'static str {
        if self.highlighted {
            HIGHLIGHT_COLOR
        } else {
            BASELINE_COLOR
        }
    }

    pub fn size(&self) -> u32 {
        if self.highlighted {
            HIGHLIGHT_SIZE
        } else {
            BASELINE_SIZE
        }
    }
}

/// 2D layout of one epoch, fit on that epoch's vectors alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochProjection {
    pub epoch: Epoch,
    pub points: Vec<ScatterPoint>,
    /// Labels dropped because their vector had zero (or non-finite) norm.
    pub skipped: Vec<String>,
}

// --- Dashboard views ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Statistics,
    CountryVector,
    Query,
}

impl View {
    pub fn all() -> [View; 3] {
        [View::Statistics, View::CountryVector, View::Query]
    }

    pub fn slug(self) -> &'static str {
        match self {
            View::Statistics => "statistics",
            View::CountryVector => "country",
            View::Query => "query",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Statistics => "statistics",
            View::CountryVector => "country vector",
            View::Query => "query",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_preserves_insertion_order() {
        let record = Record::new().with("name", "Latvia").with("count", 3);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "count"]);
        assert_eq!(record.get("count"), Some(&json!(3)));
    }

    #[test]
    fn record_push_replaces_duplicate_key() {
        let mut record = Record::new().with("name", "A");
        record.push("name", json!("B"));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(record.get("name"), Some(&json!("B")));
    }

    #[test]
    fn epoch_columns_line_up_with_display() {
        for epoch in Epoch::all() {
            assert_eq!(epoch.column(), format!("vec{}", epoch.index()));
            assert_eq!(epoch.to_string(), format!("epoch{}", epoch.index()));
        }
    }

    #[test]
    fn highlighted_point_is_emphasized() {
        let mut p = ScatterPoint { x: 0.0, y: 0.0, label: "Latvia".into(), highlighted: true };
        assert_eq!((p.color(), p.size()), ("red", 20));
        p.highlighted = false;
        assert_eq!((p.color(), p.size()), ("blue", 5));
    }

    #[test]
    fn view_slugs_match_routes() {
        let slugs: Vec<&str> = View::all().iter().map(|v| v.slug()).collect();
        assert_eq!(slugs, vec!["statistics", "country", "query"]);
    }
}
