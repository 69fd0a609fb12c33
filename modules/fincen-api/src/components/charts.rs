//! Chart.js script builders. Each returns a `new Chart(...)` statement for a
//! `<canvas>` with the given id.

use serde::Serialize;

use fincen_common::{CountryTotal, EpochProjection, YearCount};

/// JSON for embedding inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .replace("</", "<\\/")
}

#[derive(Serialize)]
struct ScatterDatum<'a> {
    x: f64,
    y: f64,
    label: &'a str,
}

/// Scatter plot of one epoch's projected points, labelled, with the
/// selected country drawn larger and in a different colour.
pub fn build_scatter_chart(id: &str, projection: &EpochProjection) -> String {
    let data: Vec<ScatterDatum> = projection
        .points
        .iter()
        .map(|p| ScatterDatum {
            x: p.x,
            y: p.y,
            label: &p.label,
        })
        .collect();
    let colors: Vec<&str> = projection.points.iter().map(|p| p.color()).collect();
    let radii: Vec<f64> = projection
        .points
        .iter()
        .map(|p| p.size() as f64 / 2.0)
        .collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'scatter',data:{{datasets:[{{data:{data},pointBackgroundColor:{colors},pointBorderColor:{colors},pointRadius:{radii}}}]}},options:{{responsive:true,plugins:{{legend:{{display:false}},tooltip:{{callbacks:{{label:(c)=>c.raw.label}}}}}}}},plugins:[{{id:'pointLabels',afterDatasetsDraw(chart){{const ctx=chart.ctx;ctx.save();ctx.font='11px sans-serif';ctx.fillStyle='#374151';chart.getDatasetMeta(0).data.forEach((el,i)=>{{ctx.fillText(chart.data.datasets[0].data[i].label,el.x+6,el.y-6);}});ctx.restore();}}}}]}});"#,
        id = id,
        data = script_json(&data),
        colors = script_json(&colors),
        radii = script_json(&radii),
    )
}

/// Line chart of transaction counts per year.
pub fn build_year_line_chart(id: &str, counts: &[YearCount]) -> String {
    let labels: Vec<i64> = counts.iter().map(|c| c.year).collect();
    let values: Vec<u64> = counts.iter().map(|c| c.transaction_count).collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'line',data:{{labels:{labels},datasets:[{{label:'transaction_count',data:{values},borderColor:'#1565c0',backgroundColor:'rgba(21,101,192,0.1)',tension:0.3,fill:false}}]}},options:{{responsive:true,plugins:{{legend:{{display:false}}}},scales:{{y:{{beginAtZero:true,ticks:{{precision:0}}}}}}}}}});"#,
        id = id,
        labels = script_json(&labels),
        values = script_json(&values),
    )
}

/// Horizontal bar chart of summed filing amounts per country.
pub fn build_country_totals_chart(id: &str, totals: &[CountryTotal], color: &str) -> String {
    let labels: Vec<&str> = totals.iter().map(|t| t.country.as_str()).collect();
    let values: Vec<f64> = totals.iter().map(|t| t.total_amount).collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'bar',data:{{labels:{labels},datasets:[{{data:{values},backgroundColor:'{color}'}}]}},options:{{responsive:true,indexAxis:'y',plugins:{{legend:{{display:false}}}},scales:{{x:{{beginAtZero:true}}}}}}}});"#,
        id = id,
        labels = script_json(&labels),
        values = script_json(&values),
        color = color,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincen_common::{Epoch, ScatterPoint};

    fn projection() -> EpochProjection {
        EpochProjection {
            epoch: Epoch::First,
            points: vec![
                ScatterPoint { x: 0.5, y: -0.25, label: "Russia".into(), highlighted: false },
                ScatterPoint { x: -0.5, y: 0.25, label: "Latvia".into(), highlighted: true },
            ],
            skipped: vec![],
        }
    }

    #[test]
    fn scatter_carries_points_colors_and_sizes() {
        let js = build_scatter_chart("chart-epoch1", &projection());
        assert!(js.contains("getElementById('chart-epoch1')"));
        assert!(js.contains(r#"{"x":-0.5,"y":0.25,"label":"Latvia"}"#));
        assert!(js.contains(r#"pointBackgroundColor:["blue","red"]"#));
        assert!(js.contains("pointRadius:[2.5,10.0]"));
    }

    #[test]
    fn scatter_with_no_points_is_still_valid() {
        let empty = EpochProjection { epoch: Epoch::Third, points: vec![], skipped: vec![] };
        let js = build_scatter_chart("chart-epoch3", &empty);
        assert!(js.contains("data:[]"));
    }

    #[test]
    fn labels_cannot_close_the_script_tag() {
        let mut p = projection();
        p.points[0].label = "</script><b>".into();
        let js = build_scatter_chart("c", &p);
        assert!(!js.contains("</script>"));
    }

    #[test]
    fn line_chart_keeps_year_order() {
        let counts = vec![
            YearCount { year: 2011, transaction_count: 4 },
            YearCount { year: 2013, transaction_count: 9 },
        ];
        let js = build_year_line_chart("chart-years", &counts);
        assert!(js.contains("labels:[2011,2013]"));
        assert!(js.contains("data:[4,9]"));
    }

    #[test]
    fn totals_chart_lists_countries_in_given_order() {
        let totals = vec![
            CountryTotal { country: "A".into(), total_amount: 300.0, filing_count: 2 },
            CountryTotal { country: "B".into(), total_amount: 50.0, filing_count: 1 },
        ];
        let js = build_country_totals_chart("chart-totals", &totals, "#6366f1");
        assert!(js.contains(r#"labels:["A","B"]"#));
        assert!(js.contains("data:[300.0,50.0]"));
    }
}
