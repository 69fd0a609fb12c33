use dioxus::prelude::*;
use serde_json::Value;

use fincen_common::Table;

/// Display text for one raw result value.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Generic grid for a result table. An empty table renders a placeholder.
pub fn data_grid(table: &Table) -> Element {
    if table.is_empty() {
        return rsx! { p { class: "text-gray-400 text-sm", "No rows." } };
    }
    rsx! {
        div { class: "overflow-x-auto",
            table { class: "w-full text-xs",
                thead {
                    tr {
                        for column in table.columns.iter() {
                            th { class: "text-left pb-2 pr-3 text-gray-500", "{column}" }
                        }
                    }
                }
                tbody {
                    for row in table.rows.iter() {
                        tr { class: "border-t border-gray-100",
                            for value in row.iter() {
                                {
                                    let text = cell_text(value);
                                    rsx! { td { class: "py-1 pr-3 align-top max-w-md truncate", "{text}" } }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
