use std::fmt;

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Row};
use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_json::Value;
use tracing::debug;

use fincen_common::{Credentials, GraphError, Record};

use crate::gateway::{GraphGateway, ParamValue, Params};

/// Pooled Neo4j connection serving as the production [`GraphGateway`].
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given credentials.
    ///
    /// `max_connections` bounds the session pool; the dashboard runs with one.
    pub async fn connect(
        uri: &str,
        credentials: &Credentials,
        max_connections: usize,
    ) -> Result<Self, GraphError> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(credentials.user.as_str())
            .password(credentials.pd.as_str())
            .fetch_size(500)
            .max_connections(max_connections.max(1))
            .build()
            .map_err(neo4j_error)?;
        let graph = Graph::connect(config).await.map_err(neo4j_error)?;
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphGateway for GraphClient {
    async fn run(&self, cypher: &str, params: Params) -> Result<Vec<Record>, GraphError> {
        let mut q = query(cypher);
        for (key, value) in params {
            q = match value {
                ParamValue::Str(v) => q.param(&key, v),
                ParamValue::Int(v) => q.param(&key, v),
                ParamValue::Float(v) => q.param(&key, v),
                ParamValue::StrList(v) => q.param(&key, v),
            };
        }

        // The stream holds a pooled connection; draining it fully and letting
        // it drop at the end of this scope hands the connection back.
        let columns = return_columns(cypher);
        let mut stream = self.graph.execute(q).await.map_err(neo4j_error)?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await.map_err(neo4j_error)? {
            records.push(row_to_record(&row, &columns)?);
        }

        debug!(rows = records.len(), "Query complete");
        Ok(records)
    }
}

/// Convert a driver row into a [`Record`].
///
/// `Row` keeps its fields in a hash map, so the driver's column order is gone
/// by the time a row arrives. Keys named in `columns` come first in that order;
/// anything else (`RETURN *`, unparsed projections) follows alphabetically.
fn row_to_record(row: &Row, columns: &[String]) -> Result<Record, GraphError> {
    let RowKeys(mut keys) = row
        .to_strict::<RowKeys>()
        .map_err(|e| GraphError::Neo4j(format!("unreadable result row: {e}")))?;
    keys.sort_by(|a, b| {
        let rank = |k: &String| columns.iter().position(|c| c == k).unwrap_or(usize::MAX);
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    });

    let mut record = Record::new();
    for key in keys {
        let value = row.get::<Value>(&key).unwrap_or_else(|e| {
            debug!(column = %key, error = %e, "Value not representable as JSON, using null");
            Value::Null
        });
        record.push(key, value);
    }
    Ok(record)
}

/// Field names of a row; values are skipped and read one by one afterwards.
struct RowKeys(Vec<String>);

impl<'de> Deserialize<'de> for RowKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = RowKeys;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a result row")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RowKeys, A::Error> {
                let mut keys = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(key) = map.next_key::<String>()? {
                    map.next_value::<IgnoredAny>()?;
                    keys.push(key);
                }
                Ok(RowKeys(keys))
            }
        }

        deserializer.deserialize_map(KeysVisitor)
    }
}

// --- RETURN clause ---

/// Column names of the final top-level `RETURN`, in projection order.
///
/// Neo4j names an aliased item by its alias and any other item by its
/// expression text. `RETURN *` or a query without `RETURN` gives no names.
fn return_columns(cypher: &str) -> Vec<String> {
    let top = top_level_mask(cypher);
    let upper = cypher.to_ascii_uppercase();
    let Some(start) = keyword_positions(&upper, &top, "RETURN").last().map(|i| i + "RETURN".len())
    else {
        return Vec::new();
    };

    let end = (start..cypher.len())
        .find(|&i| {
            top[i]
                && (upper.as_bytes()[i] == b';'
                    || ["ORDER", "SKIP", "LIMIT", "UNION"]
                        .iter()
                        .any(|kw| keyword_at(&upper, i, kw)))
        })
        .unwrap_or(cypher.len());

    let mut items = Vec::new();
    let mut item_start = start;
    for i in start..=end {
        if i == end || (top[i] && cypher.as_bytes()[i] == b',') {
            items.push((item_start, i));
            item_start = i + 1;
        }
    }

    let mut columns = Vec::with_capacity(items.len());
    for (n, (from, to)) in items.into_iter().enumerate() {
        let mut from = from;
        let leading = from + (cypher[from..to].len() - cypher[from..to].trim_start().len());
        if n == 0 && keyword_at(&upper, leading, "DISTINCT") {
            from = leading + "DISTINCT".len();
        }
        let alias = keyword_positions(&upper[..to], &top, "AS")
            .into_iter()
            .filter(|&i| i >= from)
            .last();
        let name = match alias {
            Some(i) => cypher[i + 2..to].trim().trim_matches('`'),
            None => cypher[from..to].trim(),
        };
        if name == "*" || name.is_empty() {
            return Vec::new();
        }
        columns.push(name.to_string());
    }
    columns
}

/// Per byte: true outside string literals, backtick names and brackets.
fn top_level_mask(cypher: &str) -> Vec<bool> {
    let bytes = cypher.as_bytes();
    let mut mask = vec![false; bytes.len()];
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' && q != b'`' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => mask[i] = depth == 0,
        }
    }
    mask
}

/// `kw` as a whole word at byte `i`. A word after `.` is a property, not a keyword.
fn keyword_at(upper: &str, i: usize, kw: &str) -> bool {
    let bytes = upper.as_bytes();
    let ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    upper.is_char_boundary(i)
        && upper[i..].starts_with(kw)
        && (i == 0 || !(ident(bytes[i - 1]) || bytes[i - 1] == b'.'))
        && bytes.get(i + kw.len()).map_or(true, |&b| !ident(b))
}

fn keyword_positions(upper: &str, top: &[bool], kw: &str) -> Vec<usize> {
    (0..upper.len())
        .filter(|&i| top[i] && keyword_at(upper, i, kw))
        .collect()
}

fn neo4j_error(e: neo4rs::Error) -> GraphError {
    GraphError::Neo4j(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{BoltList, BoltType};
    use serde_json::json;

    fn row(fields: &[&str], data: Vec<BoltType>) -> Row {
        let fields: Vec<BoltType> = fields.iter().map(|f| BoltType::from(*f)).collect();
        Row::new(BoltList::from(fields), BoltList::from(data))
    }

    #[test]
    fn record_follows_return_order_not_alphabetical() {
        let cypher = "MATCH (c:Country)--(n)
                      RETURN n.name AS name, n.vector_epoch1 AS vec1, count(*) AS transaction_count";
        let r = row(
            &["name", "vec1", "transaction_count"],
            vec![
                BoltType::from("Latvia"),
                BoltType::from(vec![0.5_f64, -1.25]),
                BoltType::from(12_i64),
            ],
        );
        let record = row_to_record(&r, &return_columns(cypher)).unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "vec1", "transaction_count"]);
        assert_eq!(record.get("vec1"), Some(&json!([0.5, -1.25])));
        assert_eq!(record.get("transaction_count"), Some(&json!(12)));
    }

    #[test]
    fn year_before_count_is_kept() {
        let r = row(
            &["year", "transaction_count"],
            vec![BoltType::from(2011_i64), BoltType::from(4_i64)],
        );
        let columns = return_columns(crate::reader::queries::TRANSACTIONS_BY_YEAR);
        let record = row_to_record(&r, &columns).unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["year", "transaction_count"]);
        assert_eq!(record.get("year"), Some(&json!(2011)));
    }

    #[test]
    fn unknown_columns_fall_back_to_name_order() {
        let r = row(
            &["zeta", "alpha"],
            vec![BoltType::from(1_i64), BoltType::from(2_i64)],
        );
        let record = row_to_record(&r, &[]).unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn return_columns_reads_aliases_and_expressions() {
        assert_eq!(
            return_columns("MATCH (c:Country) RETURN c.name AS name, count(c), c.code ORDER BY name LIMIT 5"),
            vec!["name", "count(c)", "c.code"]
        );
    }

    #[test]
    fn return_columns_ignores_nested_and_quoted_text() {
        let cypher = "MATCH (c) WHERE c.name <> 'x, RETURN y' \
                      WITH c, [x IN c.tags | x] AS tags \
                      RETURN DISTINCT c.name AS `country name`, {a: 1, b: 2} AS m, size(tags) AS n";
        assert_eq!(return_columns(cypher), vec!["country name", "m", "n"]);
    }

    #[test]
    fn return_columns_uses_last_return() {
        let cypher = "CALL { MATCH (n) RETURN n LIMIT 1 } RETURN n.name AS label";
        assert_eq!(return_columns(cypher), vec!["label"]);
    }

    #[test]
    fn return_star_or_no_return_gives_nothing() {
        assert!(return_columns("MATCH (n) RETURN *").is_empty());
        assert!(return_columns("CREATE (:Country {name: 'Latvia'})").is_empty());
    }

    #[test]
    fn property_named_like_a_keyword_is_not_a_clause() {
        assert_eq!(
            return_columns("MATCH (c:Country) RETURN c.limit AS cap, c.name AS name"),
            vec!["cap", "name"]
        );
        assert_eq!(
            return_columns("MATCH (c:Country) RETURN c.name AS `Zürich`, c.code AS code"),
            vec!["Zürich", "code"]
        );
    }

    #[test]
    fn lowercase_keywords_are_recognised() {
        assert_eq!(
            return_columns("match (c:Country) return c.name as name limit 3"),
            vec!["name"]
        );
    }
}
