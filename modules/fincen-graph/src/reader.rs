use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use fincen_common::{
    CountryTotal, CountryVectorRow, Epoch, EpochProjection, FilingAmountRow, GraphError,
    ProjectionError, Record, Table, YearCount,
};

use crate::aggregate::{clamp_year, country_totals, year_options, yearly_counts};
use crate::gateway::{GraphGateway, Params};
use crate::projection::project_all;
use crate::tabulate::tabulate;

/// Cypher templates used by the fixed views.
pub mod queries {
    pub const ELIGIBLE_COUNTRIES: &str = "MATCH (c:Country)
         WHERE c.vector_epoch1 IS NOT NULL
           AND c.vector_epoch2 IS NOT NULL
           AND c.vector_epoch3 IS NOT NULL
         RETURN c.name AS name
         ORDER BY name";

    pub const COUNTRY_NEIGHBORS: &str =
        "MATCH (c:Country {name: $country_name})-[r:TRANSFERRED_COUNTRY_SEPARATE]-(c_around)
         WHERE c_around.name IN $country_list AND c_around.name <> $country_name
         RETURN c_around.name AS name,
                c_around.vector_epoch1 AS vec1,
                c_around.vector_epoch2 AS vec2,
                c_around.vector_epoch3 AS vec3,
                count(r) AS transaction_count
         ORDER BY transaction_count DESC, name
         LIMIT $limit";

    pub const COUNTRY_VECTORS: &str = "MATCH (c:Country {name: $country_name})
         RETURN c.name AS name,
                c.vector_epoch1 AS vec1,
                c.vector_epoch2 AS vec2,
                c.vector_epoch3 AS vec3";

    pub const TRANSACTIONS_BY_YEAR: &str =
        "MATCH (c:Country {name: $country_name})-[r:TRANSFERRED_COUNTRY_SEPARATE]-()
         RETURN r.begin.year AS year, count(r) AS transaction_count
         ORDER BY year";

    pub const FILING_YEARS: &str = "MATCH (f:Filing)
         WHERE f.begin IS NOT NULL
         RETURN DISTINCT f.begin.year AS year";

    pub const FILING_AMOUNTS: &str = "MATCH (f:Filing)-[:BENEFITS]->(e:Entity)--(c:Country)
         RETURN c.name AS country, f.amount AS amount, f.begin.year AS year";

    pub const FILING_AMOUNTS_IN_YEAR: &str =
        "MATCH (f:Filing)-[:BENEFITS]->(e:Entity)--(c:Country)
         WHERE f.begin.year = $year
         RETURN c.name AS country, f.amount AS amount, f.begin.year AS year";
}

/// Placeholder shown in the query console before the analyst types anything.
pub const DEFAULT_CONSOLE_QUERY: &str = "MATCH (c:Country) RETURN c.name AS name LIMIT 25";

/// Everything the country-vector view shows for one selected country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryVectorView {
    pub country: String,
    /// False when the country lacks one of the three epoch vectors.
    pub eligible: bool,
    /// Neighbours by transaction count, then the selected country last.
    pub rows: Vec<CountryVectorRow>,
    pub projections: Vec<EpochProjection>,
}

/// Country totals for the statistics view, with the year range it was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    /// Selectable years, most recent first.
    pub years: Vec<i64>,
    /// The year actually applied, after clamping into range. `None` = all years.
    pub year: Option<i64>,
    pub totals: Vec<CountryTotal>,
}

/// Failure of a country-vector view: either the store or the vector math.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Read-only access to the FinCEN graph for the dashboard views.
///
/// The gateway is injected; tests substitute a stub.
#[derive(Clone)]
pub struct DashboardReader {
    gateway: Arc<dyn GraphGateway>,
    neighbor_limit: i64,
}

impl DashboardReader {
    pub fn new(gateway: Arc<dyn GraphGateway>, neighbor_limit: i64) -> Self {
        Self {
            gateway,
            neighbor_limit,
        }
    }

    // --- Country vectors ---

    /// Names of countries that carry all three epoch vectors, sorted.
    pub async fn eligible_countries(&self) -> Result<Vec<String>, GraphError> {
        let records = self
            .gateway
            .run(queries::ELIGIBLE_COUNTRIES, Params::new())
            .await?;
        Ok(keep_valid(&records, "eligible_countries", |r| {
            require_str(r, "eligible_countries", "name")
        }))
    }

    /// Eligible neighbours of `country`, most transactions first.
    pub async fn country_neighbors(
        &self,
        country: &str,
        eligible: &[String],
    ) -> Result<Vec<CountryVectorRow>, GraphError> {
        let params = Params::new()
            .with("country_name", country)
            .with("country_list", eligible.to_vec())
            .with("limit", self.neighbor_limit);
        let records = self.gateway.run(queries::COUNTRY_NEIGHBORS, params).await?;
        Ok(validated_rows(&records, "country_neighbors"))
    }

    /// The selected country's own vectors.
    pub async fn country_vectors(
        &self,
        country: &str,
    ) -> Result<Option<CountryVectorRow>, GraphError> {
        let params = Params::new().with("country_name", country);
        let records = self.gateway.run(queries::COUNTRY_VECTORS, params).await?;
        Ok(validated_rows(&records, "country_vectors").into_iter().next())
    }

    /// Neighbour set plus the country itself, projected per epoch.
    ///
    /// A country without all three vectors yields an empty, non-eligible view.
    pub async fn country_vector_view(&self, country: &str) -> Result<CountryVectorView, ViewError> {
        let eligible = self.eligible_countries().await?;
        self.project_country(country, &eligible).await
    }

    /// Same as [`country_vector_view`](Self::country_vector_view), reusing an
    /// eligibility list the caller already fetched.
    pub async fn project_country(
        &self,
        country: &str,
        eligible: &[String],
    ) -> Result<CountryVectorView, ViewError> {
        if !eligible.iter().any(|c| c == country) {
            info!(country, "Country has no complete vector set");
            return Ok(CountryVectorView {
                country: country.to_string(),
                eligible: false,
                rows: Vec::new(),
                projections: Vec::new(),
            });
        }

        let mut rows = self.country_neighbors(country, eligible).await?;
        if let Some(own) = self.country_vectors(country).await? {
            rows.push(own);
        }

        let projections = project_all(&rows, country)?;
        info!(country, points = rows.len(), "Projected country vectors");

        Ok(CountryVectorView {
            country: country.to_string(),
            eligible: true,
            rows,
            projections,
        })
    }

    /// Transactions touching `country`, counted per year, oldest first.
    pub async fn transaction_counts_by_year(
        &self,
        country: &str,
    ) -> Result<Vec<YearCount>, GraphError> {
        let params = Params::new().with("country_name", country);
        let records = self.gateway.run(queries::TRANSACTIONS_BY_YEAR, params).await?;
        let pairs = keep_valid(&records, "transaction_counts_by_year", |r| {
            let year = optional_i64(r, "year")?;
            let count = optional_i64(r, "transaction_count")?.unwrap_or(0).max(0) as u64;
            Ok((year, count))
        });
        Ok(yearly_counts(pairs))
    }

    // --- Statistics ---

    /// Distinct filing years, most recent first.
    pub async fn filing_years(&self) -> Result<Vec<i64>, GraphError> {
        let records = self.gateway.run(queries::FILING_YEARS, Params::new()).await?;
        let years = keep_valid(&records, "filing_years", |r| optional_i64(r, "year"));
        Ok(year_options(years.into_iter().flatten()))
    }

    /// Filing amounts attributed to destination countries, optionally for one year.
    pub async fn filing_amounts(&self, year: Option<i64>) -> Result<Vec<FilingAmountRow>, GraphError> {
        let (cypher, params) = match year {
            Some(y) => (queries::FILING_AMOUNTS_IN_YEAR, Params::new().with("year", y)),
            None => (queries::FILING_AMOUNTS, Params::new()),
        };
        let records = self.gateway.run(cypher, params).await?;
        Ok(keep_valid(&records, "filing_amounts", filing_amount_row))
    }

    /// Country totals, optionally restricted to one year.
    ///
    /// `year` is clamped into the available range. With no filings at all the
    /// view is empty.
    pub async fn country_statistics(&self, year: Option<i64>) -> Result<StatisticsView, GraphError> {
        let years = self.filing_years().await?;
        let year = year.and_then(|y| clamp_year(Some(y), &years));
        let rows = self.filing_amounts(year).await?;
        let totals = country_totals(&rows, year);
        Ok(StatisticsView { years, year, totals })
    }

    // --- Query console ---

    /// Run an analyst-supplied query verbatim.
    ///
    /// No validation or restriction is applied: the console has the same
    /// access as the fixed views. Blank input runs nothing and returns `None`.
    pub async fn run_raw(&self, cypher: &str) -> Result<Option<Table>, GraphError> {
        if cypher.trim().is_empty() {
            return Ok(None);
        }
        info!(len = cypher.len(), "Running console query");
        let records = self.gateway.run(cypher, Params::new()).await?;
        Ok(Some(tabulate(&records)))
    }
}

// --- Row validation ---

/// Convert every record with `parse`, dropping the ones that fail.
///
/// A malformed row never fails a whole view; it is logged and left out.
fn keep_valid<T>(
    records: &[Record],
    query: &'static str,
    parse: impl Fn(&Record) -> Result<T, GraphError>,
) -> Vec<T> {
    records
        .iter()
        .filter_map(|r| match parse(r) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(error = %e, query, "Dropping malformed row");
                None
            }
        })
        .collect()
}

fn validated_rows(records: &[Record], query: &'static str) -> Vec<CountryVectorRow> {
    keep_valid(records, query, |r| country_vector_row(r, query))
}

fn country_vector_row(record: &Record, query: &'static str) -> Result<CountryVectorRow, GraphError> {
    Ok(CountryVectorRow {
        name: require_str(record, query, "name")?,
        vec1: require_vector(record, query, Epoch::First.column())?,
        vec2: require_vector(record, query, Epoch::Second.column())?,
        vec3: require_vector(record, query, Epoch::Third.column())?,
        transaction_count: optional_i64(record, "transaction_count")?,
    })
}

fn filing_amount_row(record: &Record) -> Result<FilingAmountRow, GraphError> {
    let amount = match record.get("amount") {
        Some(Value::Null) | None => {
            return Err(GraphError::MissingField {
                query: "filing_amounts",
                field: "amount".to_string(),
            })
        }
        Some(v) => v.as_f64().ok_or_else(|| GraphError::InvalidField {
            field: "amount".to_string(),
            expected: "number",
        })?,
    };
    Ok(FilingAmountRow {
        country: require_str(record, "filing_amounts", "country")?,
        amount,
        year: optional_i64(record, "year")?,
    })
}

fn require<'a>(record: &'a Record, query: &'static str, field: &str) -> Result<&'a Value, GraphError> {
    match record.get(field) {
        Some(Value::Null) | None => Err(GraphError::MissingField {
            query,
            field: field.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

fn require_str(record: &Record, query: &'static str, field: &str) -> Result<String, GraphError> {
    require(record, query, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GraphError::InvalidField {
            field: field.to_string(),
            expected: "string",
        })
}

fn require_vector(record: &Record, query: &'static str, field: &str) -> Result<Vec<f64>, GraphError> {
    let invalid = || GraphError::InvalidField {
        field: field.to_string(),
        expected: "numeric vector",
    };
    require(record, query, field)?
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|x| x.as_f64().ok_or_else(invalid))
        .collect()
}

fn optional_i64(record: &Record, field: &str) -> Result<Option<i64>, GraphError> {
    match record.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| GraphError::InvalidField {
            field: field.to_string(),
            expected: "integer",
        }),
    }
}
