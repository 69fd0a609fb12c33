use std::collections::HashMap;

use fincen_common::{CountryTotal, FilingAmountRow, YearCount};

/// Sum and count filing amounts per destination country, largest total first.
///
/// With `year` set, only filings dated in that year contribute; filings with
/// no year never match a filter. Equal totals are ordered by country name.
pub fn country_totals(rows: &[FilingAmountRow], year: Option<i64>) -> Vec<CountryTotal> {
    let mut by_country: HashMap<&str, (f64, u64)> = HashMap::new();
    for row in rows {
        if year.is_some() && row.year != year {
            continue;
        }
        let entry = by_country.entry(row.country.as_str()).or_insert((0.0, 0));
        entry.0 += row.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CountryTotal> = by_country
        .into_iter()
        .map(|(country, (total_amount, filing_count))| CountryTotal {
            country: country.to_string(),
            total_amount,
            filing_count,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.country.cmp(&b.country))
    });
    totals
}

/// Distinct years, most recent first.
pub fn year_options(years: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut years: Vec<i64> = years.into_iter().collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Resolve the analyst's year choice against the available range.
///
/// Defaults to the most recent year and clamps into `[min, max]`. Returns
/// `None` when there are no years to choose from.
pub fn clamp_year(selected: Option<i64>, options: &[i64]) -> Option<i64> {
    let max = *options.iter().max()?;
    let min = *options.iter().min()?;
    Some(selected.unwrap_or(max).clamp(min, max))
}

/// Merge `(year, count)` pairs into one count per year, oldest first.
/// Pairs without a year are dropped.
pub fn yearly_counts(pairs: impl IntoIterator<Item = (Option<i64>, u64)>) -> Vec<YearCount> {
    let mut by_year: HashMap<i64, u64> = HashMap::new();
    for (year, count) in pairs {
        if let Some(year) = year {
            *by_year.entry(year).or_insert(0) += count;
        }
    }

    let mut counts: Vec<YearCount> = by_year
        .into_iter()
        .map(|(year, transaction_count)| YearCount {
            year,
            transaction_count,
        })
        .collect();
    counts.sort_by_key(|c| c.year);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filing(country: &str, amount: f64, year: i64) -> FilingAmountRow {
        FilingAmountRow {
            country: country.to_string(),
            amount,
            year: Some(year),
        }
    }

    fn synthetic() -> Vec<FilingAmountRow> {
        vec![
            filing("B", 50.0, 2011),
            filing("A", 100.0, 2011),
            filing("A", 200.0, 2011),
        ]
    }

    // --- country_totals ---

    #[test]
    fn totals_sum_and_count_per_country_sorted_desc() {
        let totals = country_totals(&synthetic(), None);
        assert_eq!(
            totals,
            vec![
                CountryTotal { country: "A".into(), total_amount: 300.0, filing_count: 2 },
                CountryTotal { country: "B".into(), total_amount: 50.0, filing_count: 1 },
            ]
        );
    }

    #[test]
    fn year_filter_with_no_matches_yields_nothing() {
        assert!(country_totals(&synthetic(), Some(2012)).is_empty());
    }

    #[test]
    fn year_filter_keeps_matching_filings_only() {
        let mut rows = synthetic();
        rows.push(filing("B", 500.0, 2012));
        rows.push(FilingAmountRow { country: "C".into(), amount: 10.0, year: None });
        let totals = country_totals(&rows, Some(2012));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].country, "B");
        assert_eq!(totals[0].filing_count, 1);
    }

    #[test]
    fn equal_totals_order_by_name() {
        let rows = vec![filing("Z", 10.0, 2011), filing("M", 10.0, 2011)];
        let names: Vec<String> = country_totals(&rows, None).into_iter().map(|t| t.country).collect();
        assert_eq!(names, vec!["M", "Z"]);
    }

    #[test]
    fn no_filings_no_totals() {
        assert!(country_totals(&[], None).is_empty());
    }

    // --- year_options / clamp_year ---

    #[test]
    fn year_options_distinct_descending() {
        assert_eq!(year_options([2011, 2015, 2013, 2011, 2015]), vec![2015, 2013, 2011]);
    }

    #[test]
    fn clamp_defaults_to_latest() {
        assert_eq!(clamp_year(None, &[2017, 2012, 2000]), Some(2017));
    }

    #[test]
    fn clamp_bounds_selection_to_range() {
        let options = [2017, 2012, 2000];
        assert_eq!(clamp_year(Some(1990), &options), Some(2000));
        assert_eq!(clamp_year(Some(2030), &options), Some(2017));
        assert_eq!(clamp_year(Some(2005), &options), Some(2005));
    }

    #[test]
    fn clamp_without_years_is_none() {
        assert_eq!(clamp_year(Some(2012), &[]), None);
    }

    // --- yearly_counts ---

    #[test]
    fn yearly_counts_sorted_ascending() {
        let counts = yearly_counts([(Some(2015), 1), (Some(2011), 1), (Some(2013), 1)]);
        let years: Vec<i64> = counts.iter().map(|c| c.year).collect();
        assert_eq!(years, vec![2011, 2013, 2015]);
    }

    #[test]
    fn yearly_counts_merge_duplicates_and_drop_missing_years() {
        let counts = yearly_counts([(Some(2012), 3), (None, 7), (Some(2012), 2)]);
        assert_eq!(counts, vec![YearCount { year: 2012, transaction_count: 5 }]);
    }
}
