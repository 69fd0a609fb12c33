use dioxus::prelude::*;

use fincen_common::{View, YearCount};
use fincen_graph::CountryVectorView;

use super::charts::{build_scatter_chart, build_year_line_chart};
use super::layout::Layout;
use crate::templates::render_page;

#[derive(Clone, PartialEq)]
pub struct CountryVectorData {
    /// Countries offered in the selector (those with all three vectors).
    pub countries: Vec<String>,
    pub selected: Option<String>,
    pub view: Option<CountryVectorView>,
    pub yearly: Vec<YearCount>,
}

#[allow(non_snake_case)]
#[component]
fn CountryVectorPage(data: CountryVectorData) -> Element {
    let selected = data.selected.clone().unwrap_or_default();
    let year_chart_js = build_year_line_chart("chart-years", &data.yearly);

    rsx! {
        Layout { title: "Country2Vec".to_string(), active: View::CountryVector.slug().to_string(),
            div { class: "max-w-6xl mx-auto p-6",
                h2 { class: "text-xl font-semibold mb-4", "Country2Vec by year" }

                if data.countries.is_empty() {
                    p { class: "text-gray-400 text-sm mb-6", "No country has vectors for all three epochs." }
                } else {
                    form { method: "GET", action: "/country", class: "flex items-center gap-3 mb-6 text-sm",
                        label { r#for: "name", class: "text-gray-500", "Country" }
                        select { name: "name", id: "name", class: "px-2 py-1.5 border border-gray-300 rounded",
                            for c in data.countries.iter() {
                                option { value: "{c}", selected: *c == selected, "{c}" }
                            }
                        }
                        button {
                            r#type: "submit",
                            class: "px-3 py-1.5 bg-blue-600 text-white rounded hover:bg-blue-800",
                            "Show"
                        }
                    }
                }

                if let Some(view) = &data.view {
                    if !view.eligible {
                        p { class: "text-gray-500 text-sm mb-6",
                            "{view.country} does not have vectors for all three epochs."
                        }
                    }
                    div { class: "grid grid-cols-1 lg:grid-cols-3 gap-4 mb-6",
                        for projection in view.projections.iter() {
                            {
                                let id = format!("chart-{}", projection.epoch);
                                let js = build_scatter_chart(&id, projection);
                                let caption = projection.epoch.caption();
                                let skipped = projection.skipped.join(", ");
                                rsx! {
                                    div { class: "bg-white border border-gray-200 rounded-lg p-4",
                                        h3 { class: "font-semibold mb-3 text-sm", "{caption}" }
                                        if projection.points.is_empty() {
                                            p { class: "text-gray-400 text-sm", "No vectors to plot." }
                                        }
                                        canvas { id: "{id}", height: "260" }
                                        script { dangerous_inner_html: "{js}" }
                                        if !projection.skipped.is_empty() {
                                            p { class: "text-amber-700 text-xs mt-2",
                                                "Zero-length vector, not plotted: {skipped}"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                div { class: "bg-white border border-gray-200 rounded-lg p-4",
                    h3 { class: "font-semibold mb-3 text-sm", "Transaction count by year" }
                    canvas { id: "chart-years", height: "200" }
                    script { dangerous_inner_html: "{year_chart_js}" }
                    if data.yearly.is_empty() {
                        p { class: "text-gray-400 text-sm", "No transactions." }
                    } else {
                        table { class: "w-full text-xs mt-4",
                            thead {
                                tr {
                                    th { class: "text-left pb-2 text-gray-500", "year" }
                                    th { class: "text-right pb-2 text-gray-500", "transaction_count" }
                                }
                            }
                            tbody {
                                for row in data.yearly.iter() {
                                    tr {
                                        td { class: "py-1", "{row.year}" }
                                        td { class: "text-right py-1", "{row.transaction_count}" }
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

pub fn render_country_vector(data: CountryVectorData) -> String {
    render_page(CountryVectorPage, CountryVectorPageProps { data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincen_common::{Epoch, EpochProjection, ScatterPoint};

    fn projection(epoch: Epoch, skipped: Vec<String>) -> EpochProjection {
        EpochProjection {
            epoch,
            points: vec![ScatterPoint { x: 0.0, y: 0.0, label: "Latvia".into(), highlighted: true }],
            skipped,
        }
    }

    fn data(view: Option<CountryVectorView>) -> CountryVectorData {
        CountryVectorData {
            countries: vec!["Cyprus".into(), "Latvia".into()],
            selected: Some("Latvia".into()),
            view,
            yearly: vec![
                YearCount { year: 2011, transaction_count: 3 },
                YearCount { year: 2015, transaction_count: 7 },
            ],
        }
    }

    #[test]
    fn renders_one_chart_per_epoch_with_captions() {
        let view = CountryVectorView {
            country: "Latvia".into(),
            eligible: true,
            rows: vec![],
            projections: Epoch::all().into_iter().map(|e| projection(e, vec![])).collect(),
        };
        let html = render_country_vector(data(Some(view)));
        for epoch in Epoch::all() {
            assert!(html.contains(epoch.caption()));
            assert!(html.contains(&format!("chart-{epoch}")));
        }
        assert!(!html.contains("not plotted"));
    }

    #[test]
    fn skipped_vectors_are_listed() {
        let view = CountryVectorView {
            country: "Latvia".into(),
            eligible: true,
            rows: vec![],
            projections: vec![projection(Epoch::Second, vec!["Panama".into()])],
        };
        let html = render_country_vector(data(Some(view)));
        assert!(html.contains("not plotted: Panama"));
    }

    #[test]
    fn yearly_table_lists_each_year() {
        let html = render_country_vector(data(None));
        assert!(html.contains("Transaction count by year"));
        assert!(html.contains("2011"));
        assert!(html.contains("2015"));
    }

    #[test]
    fn no_eligible_countries_renders_notice() {
        let html = render_country_vector(CountryVectorData {
            countries: vec![],
            selected: None,
            view: None,
            yearly: vec![],
        });
        assert!(html.contains("No country has vectors for all three epochs."));
        assert!(html.contains("No transactions."));
    }
}
