use dioxus::prelude::*;

use fincen_common::View;
use fincen_graph::StatisticsView;

use super::charts::build_country_totals_chart;
use super::layout::Layout;
use crate::templates::render_page;

/// Rows shown in the totals chart; the table below lists every country.
const CHART_TOP_N: usize = 20;

#[allow(non_snake_case)]
#[component]
fn StatisticsPage(view: StatisticsView) -> Element {
    let chart_rows = &view.totals[..view.totals.len().min(CHART_TOP_N)];
    let chart_js = build_country_totals_chart("chart-country-totals", chart_rows, "#6366f1");
    let heading = match view.year {
        Some(y) => format!("Filing amounts by country, {y}"),
        None => "Filing amounts by country, all years".to_string(),
    };
    let min_year = view.years.iter().min().copied();
    let max_year = view.years.iter().max().copied();
    let top_n = CHART_TOP_N;

    rsx! {
        Layout { title: "Statistics".to_string(), active: View::Statistics.slug().to_string(),
            div { class: "max-w-6xl mx-auto p-6",
                h2 { class: "text-xl font-semibold mb-4", "{heading}" }

                if let (Some(min), Some(max)) = (min_year, max_year) {
                    {
                        let current = view.year.unwrap_or(max);
                        rsx! {
                            form { method: "GET", action: "/statistics", class: "flex items-center gap-3 mb-6 text-sm",
                                label { r#for: "year", class: "text-gray-500", "Year" }
                                input {
                                    r#type: "range", name: "year", id: "year",
                                    min: "{min}", max: "{max}", value: "{current}",
                                    class: "w-64"
                                }
                                span { class: "font-semibold w-12", "{current}" }
                                button {
                                    r#type: "submit",
                                    class: "px-3 py-1.5 bg-blue-600 text-white rounded hover:bg-blue-800",
                                    "Apply"
                                }
                                a { href: "/statistics", class: "text-blue-600 hover:text-blue-800", "All years" }
                            }
                        }
                    }
                } else {
                    p { class: "text-gray-400 text-sm mb-6", "No dated filings." }
                }

                div { class: "bg-white border border-gray-200 rounded-lg p-4 mb-6",
                    h3 { class: "font-semibold mb-3 text-sm", "Total amount (top {top_n})" }
                    canvas { id: "chart-country-totals", height: "240" }
                    script { dangerous_inner_html: "{chart_js}" }
                }

                div { class: "bg-white border border-gray-200 rounded-lg p-4",
                    h3 { class: "font-semibold mb-3 text-sm", "Totals" }
                    if view.totals.is_empty() {
                        p { class: "text-gray-400 text-sm", "No filings for this selection." }
                    } else {
                        table { class: "w-full text-xs",
                            thead {
                                tr {
                                    th { class: "text-left pb-2 text-gray-500", "Country" }
                                    th { class: "text-right pb-2 text-gray-500", "Total Amount" }
                                    th { class: "text-right pb-2 text-gray-500", "Filings" }
                                }
                            }
                            tbody {
                                for t in view.totals.iter() {
                                    {
                                        let amount = format!("{:.2}", t.total_amount);
                                        rsx! {
                                            tr {
                                                td { class: "py-1 pr-2", "{t.country}" }
                                                td { class: "text-right py-1", "{amount}" }
                                                td { class: "text-right py-1", "{t.filing_count}" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render_statistics(view: StatisticsView) -> String {
    render_page(StatisticsPage, StatisticsPageProps { view })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincen_common::CountryTotal;

    #[test]
    fn renders_totals_in_order() {
        let html = render_statistics(StatisticsView {
            years: vec![2014, 2011],
            year: None,
            totals: vec![
                CountryTotal { country: "Latvia".into(), total_amount: 300.0, filing_count: 2 },
                CountryTotal { country: "Russia".into(), total_amount: 50.0, filing_count: 1 },
            ],
        });
        let latvia = html.find("Latvia").unwrap();
        let russia = html.find("Russia").unwrap();
        assert!(latvia < russia);
        assert!(html.contains("300.00"));
        assert!(html.contains("all years"));
    }

    #[test]
    fn slider_is_bounded_by_available_years() {
        let html = render_statistics(StatisticsView {
            years: vec![2017, 2012, 2000],
            year: Some(2012),
            totals: vec![],
        });
        assert!(html.contains(r#"min="2000""#));
        assert!(html.contains(r#"max="2017""#));
        assert!(html.contains(r#"value="2012""#));
        assert!(html.contains("No filings for this selection."));
    }

    #[test]
    fn no_years_renders_without_slider() {
        let html = render_statistics(StatisticsView { years: vec![], year: None, totals: vec![] });
        assert!(html.contains("No dated filings."));
        assert!(!html.contains(r#"type="range""#));
    }
}
