use serde_json::Value;

use fincen_common::{Record, Table};

/// Convert gateway rows into a uniform table.
///
/// Columns come from the first row, in its key order; row order is result
/// order. A key absent from a later row becomes `null`, and keys that only
/// appear in later rows are ignored. Values pass through untouched.
pub fn tabulate(records: &[Record]) -> Table {
    let Some(first) = records.first() else {
        return Table::empty();
    };

    let columns: Vec<String> = first.keys().map(str::to_string).collect();
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Table { columns, rows }
}
