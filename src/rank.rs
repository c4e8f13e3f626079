use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, warn};

use crate::record::{Column, Dataset, NumericColumn, Record, ratio_of};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RankError {
    InvalidColumn(String),
    NotNumeric(Column),
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColumn(name) => write!(f, "column `{name}` is not a record field"),
            Self::NotNumeric(column) => {
                write!(f, "column `{column}` is not numeric and cannot form a ratio")
            }
        }
    }
}

impl std::error::Error for RankError {}

/// What a ranked list was ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    Column(Column),
    Ratio {
        numerator: NumericColumn,
        denominator: NumericColumn,
    },
}

impl Criterion {
    pub fn title(self, limit: usize) -> String {
        match self {
            Self::Column(column) => format!("Top {limit} by {}", column.label()),
            Self::Ratio {
                numerator,
                denominator,
            } => format!(
                "Top {limit} by {} / {}",
                Column::from(numerator).label(),
                Column::from(denominator).label()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedEntry {
    /// Position of the record in the ranked input.
    pub source_index: usize,
    pub record: Record,
    /// Sort key, `None` for text columns.
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedList {
    pub criterion: Criterion,
    pub limit: usize,
    pub entries: Vec<RankedEntry>,
    /// Records left out because the ratio denominator was zero or the
    /// quotient was not finite.
    pub excluded: usize,
}

impl RankedList {
    pub fn title(&self) -> String {
        self.criterion.title(self.limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|entry| &entry.record)
    }
}

fn parse_column(name: &str) -> Result<Column, RankError> {
    name.parse::<Column>()
        .map_err(|_| RankError::InvalidColumn(name.to_owned()))
}

fn parse_numeric(name: &str) -> Result<NumericColumn, RankError> {
    let column = parse_column(name)?;
    column.numeric().ok_or(RankError::NotNumeric(column))
}

/// Top `n` records by `column`, descending. Ties keep input order.
pub fn top_by_column(records: &[Record], column: &str, n: usize) -> Result<RankedList, RankError> {
    let column = parse_column(column)?;

    let mut ranked = records.iter().enumerate().collect::<Vec<_>>();
    match column.numeric() {
        Some(numeric) => {
            ranked.sort_by(|a, b| b.1.number(numeric).total_cmp(&a.1.number(numeric)));
        }
        None => {
            ranked.sort_by(|a, b| b.1.text(column).cmp(&a.1.text(column)));
        }
    }
    ranked.truncate(n);

    let entries = ranked
        .into_iter()
        .map(|(source_index, record)| RankedEntry {
            source_index,
            record: record.clone(),
            score: column.numeric().map(|numeric| record.number(numeric)),
        })
        .collect::<Vec<_>>();

    debug!(column = %column, limit = n, ranked = entries.len(), "ranked by column");

    Ok(RankedList {
        criterion: Criterion::Column(column),
        limit: n,
        entries,
        excluded: 0,
    })
}

/// Top `n` records by `numerator / denominator`, descending. Ties keep input
/// order. Records with a zero denominator or a non-finite quotient are
/// skipped and counted.
pub fn top_by_ratio(
    records: &[Record],
    numerator_column: &str,
    denominator_column: &str,
    n: usize,
) -> Result<RankedList, RankError> {
    let numerator = parse_numeric(numerator_column)?;
    let denominator = parse_numeric(denominator_column)?;

    let mut excluded = 0usize;
    let mut ranked = Vec::with_capacity(records.len());
    for (source_index, record) in records.iter().enumerate() {
        match ratio_of(record, numerator, denominator) {
            Some(score) => ranked.push((source_index, record, score)),
            None => excluded += 1,
        }
    }

    ranked.sort_by(|a, b| descending(a.2, b.2));
    ranked.truncate(n);

    let entries = ranked
        .into_iter()
        .map(|(source_index, record, score)| RankedEntry {
            source_index,
            record: record.clone(),
            score: Some(score),
        })
        .collect::<Vec<_>>();

    if excluded > 0 {
        warn!(excluded, "records with a zero denominator or non-finite ratio left out of ratio ranking");
    }
    debug!(limit = n, ranked = entries.len(), "ranked by ratio");

    Ok(RankedList {
        criterion: Criterion::Ratio {
            numerator,
            denominator,
        },
        limit: n,
        entries,
        excluded,
    })
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Side-panel rankings for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendations {
    pub by_column: RankedList,
    pub by_ratio: RankedList,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankingSettings {
    pub limit: usize,
    pub column: String,
    pub ratio_numerator: String,
    pub ratio_denominator: String,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            limit: 5,
            column: Column::BaseSpread.name().to_owned(),
            ratio_numerator: Column::Duration.name().to_owned(),
            ratio_denominator: Column::BaseSpread.name().to_owned(),
        }
    }
}

impl Recommendations {
    pub fn build(dataset: &Dataset, settings: &RankingSettings) -> Result<Self, RankError> {
        let records = dataset.records();
        Ok(Self {
            by_column: top_by_column(records, &settings.column, settings.limit)?,
            by_ratio: top_by_ratio(
                records,
                &settings.ratio_numerator,
                &settings.ratio_denominator,
                settings.limit,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("Emisor1", "Nemo1", 10.0, 0.5, "Sector1"),
            Record::new("Emisor2", "Nemo2", 20.0, 0.8, "Sector2"),
            Record::new("Emisor3", "Nemo3", 15.0, 1.2, "Sector1"),
            Record::new("Emisor4", "Nemo4", 25.0, 0.9, "Sector2"),
        ]
    }

    fn codes(list: &RankedList) -> Vec<&str> {
        list.records().map(|record| record.code.as_str()).collect()
    }

    #[test]
    fn top_by_spread_picks_largest_spreads_in_order() {
        let list = top_by_column(&sample(), "S", 2).unwrap();
        assert_eq!(codes(&list), vec!["Nemo3", "Nemo4"]);
        assert_eq!(list.entries[0].score, Some(1.2));
        assert_eq!(list.criterion, Criterion::Column(Column::BaseSpread));
        assert_eq!(list.excluded, 0);
    }

    #[test]
    fn ratio_tie_resolves_to_earlier_record() {
        let list = top_by_ratio(&sample(), "D", "S", 2).unwrap();
        assert_eq!(codes(&list), vec!["Nemo4", "Nemo1"]);
        let top = list.entries[0].score.unwrap();
        assert!((top - 25.0 / 0.9).abs() < 1e-9);
        assert_eq!(list.entries[1].score, Some(20.0));
    }

    #[test]
    fn limit_larger_than_input_returns_everything_sorted() {
        let list = top_by_column(&sample(), "duration", 50).unwrap();
        assert_eq!(codes(&list), vec!["Nemo4", "Nemo2", "Nemo3", "Nemo1"]);
    }

    #[test]
    fn zero_limit_yields_empty_list() {
        assert!(top_by_column(&sample(), "duration", 0).unwrap().is_empty());
        assert!(top_by_ratio(&sample(), "duration", "base_spread", 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        assert_eq!(
            top_by_column(&sample(), "yield", 3),
            Err(RankError::InvalidColumn("yield".to_owned()))
        );
        assert_eq!(
            top_by_ratio(&sample(), "duration", "convexity", 3),
            Err(RankError::InvalidColumn("convexity".to_owned()))
        );
    }

    #[test]
    fn text_columns_cannot_form_a_ratio() {
        assert_eq!(
            top_by_ratio(&sample(), "issuer", "duration", 3),
            Err(RankError::NotNumeric(Column::Issuer))
        );
    }

    #[test]
    fn text_column_ranking_is_descending_and_unscored() {
        let list = top_by_column(&sample(), "code", 2).unwrap();
        assert_eq!(codes(&list), vec!["Nemo4", "Nemo3"]);
        assert!(list.entries.iter().all(|entry| entry.score.is_none()));
    }

    #[test]
    fn zero_denominators_are_excluded_and_counted() {
        let mut records = sample();
        records.push(Record::new("Emisor5", "Nemo5", 40.0, 0.0, "Sector3"));
        records.push(Record::new("Emisor6", "Nemo6", 1.0, -0.0, "Sector3"));

        let list = top_by_ratio(&records, "duration", "base_spread", 10).unwrap();
        assert_eq!(list.excluded, 2);
        assert_eq!(list.len(), 4);
        assert!(list.records().all(|record| record.base_spread != 0.0));
    }

    #[test]
    fn overflowing_ratios_are_excluded_and_counted() {
        let mut records = sample();
        records.push(Record::new("Emisor5", "Nemo5", 5.0, 1e-320, "Sector3"));

        let list = top_by_ratio(&records, "duration", "base_spread", 10).unwrap();
        assert_eq!(list.excluded, 1);
        assert_eq!(list.len(), 4);
        assert!(list.records().all(|record| record.code != "Nemo5"));
        assert!(list.entries.iter().all(|entry| entry.score.is_some_and(f64::is_finite)));
    }

    #[test]
    fn negative_spreads_rank_below_positive_ones() {
        let records = vec![
            Record::new("A", "A1", 5.0, -1.0, "X"),
            Record::new("B", "B1", 5.0, 1.0, "X"),
        ];
        let list = top_by_ratio(&records, "duration", "base_spread", 2).unwrap();
        assert_eq!(codes(&list), vec!["B1", "A1"]);
    }

    #[test]
    fn ranking_is_repeatable_and_leaves_input_untouched() {
        let records = sample();
        let before = records.clone();
        let first = top_by_ratio(&records, "D", "S", 3).unwrap();
        let second = top_by_ratio(&records, "D", "S", 3).unwrap();
        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn recommendations_use_default_columns() {
        let dataset = Dataset::from_validated(sample());
        let recommendations = Recommendations::build(&dataset, &RankingSettings::default()).unwrap();
        assert_eq!(recommendations.by_column.title(), "Top 5 by Base spread");
        assert_eq!(
            recommendations.by_ratio.title(),
            "Top 5 by Duration / Base spread"
        );
        assert_eq!(recommendations.by_column.len(), 4);
        assert_eq!(codes(&recommendations.by_ratio)[0], "Nemo4");
    }
}
