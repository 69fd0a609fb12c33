use dioxus::prelude::*;

use fincen_common::{Table, View};

use super::layout::{error_panel, Layout};
use super::table::data_grid;
use crate::templates::render_page;

#[derive(Clone, PartialEq)]
pub struct QueryConsoleData {
    pub query: String,
    /// `None` when nothing was run (blank query).
    pub result: Option<Table>,
    pub error: Option<String>,
}

#[allow(non_snake_case)]
#[component]
fn QueryConsolePage(data: QueryConsoleData) -> Element {
    rsx! {
        Layout { title: "Query".to_string(), active: View::Query.slug().to_string(),
            div { class: "max-w-6xl mx-auto p-6",
                h2 { class: "text-xl font-semibold mb-1", "Query" }
                p { class: "text-gray-500 text-xs mb-4",
                    "Cypher runs as written, with the dashboard's own database access."
                }
                form { method: "GET", action: "/query", class: "mb-6",
                    textarea {
                        name: "q", rows: "5",
                        class: "w-full px-3 py-2 border border-gray-300 rounded font-mono text-sm mb-2",
                        "{data.query}"
                    }
                    button {
                        r#type: "submit",
                        class: "px-3 py-1.5 bg-blue-600 text-white rounded text-sm hover:bg-blue-800",
                        "Run"
                    }
                }
                if let Some(err) = &data.error {
                    { error_panel(err) }
                }
                if let Some(table) = &data.result {
                    div { class: "bg-white border border-gray-200 rounded-lg p-4",
                        {
                            let count = table.row_count();
                            rsx! { p { class: "text-gray-400 text-xs mb-2", "{count} rows" } }
                        }
                        { data_grid(table) }
                    }
                }
            }
        }
    }
}

pub fn render_query_console(data: QueryConsoleData) -> String {
    render_page(QueryConsolePage, QueryConsolePageProps { data })
}
