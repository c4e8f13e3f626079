use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// One instrument row of a dataset snapshot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Record {
    #[serde(alias = "Emisor", alias = "emisor")]
    pub issuer: String,
    #[serde(alias = "Nemo", alias = "nemo")]
    pub code: String,
    #[serde(alias = "Duracion", alias = "duracion")]
    pub duration: f64,
    #[serde(alias = "SPREAD_BASE", alias = "spread_base")]
    pub base_spread: f64,
    #[serde(alias = "Sector", alias = "sector")]
    pub category: String,
}

impl Record {
    pub fn new(
        issuer: impl Into<String>,
        code: impl Into<String>,
        duration: f64,
        base_spread: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            code: code.into(),
            duration,
            base_spread,
            category: category.into(),
        }
    }

    pub fn number(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Duration => self.duration,
            NumericColumn::BaseSpread => self.base_spread,
        }
    }

    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::Issuer => Some(&self.issuer),
            Column::Code => Some(&self.code),
            Column::Category => Some(&self.category),
            Column::Duration | Column::BaseSpread => None,
        }
    }

    /// `duration / base_spread`, or `None` when the spread is zero or so small
    /// that the quotient overflows.
    pub fn ratio(&self) -> Option<f64> {
        ratio_of(self, NumericColumn::Duration, NumericColumn::BaseSpread)
    }
}

pub(crate) fn ratio_of(
    record: &Record,
    numerator: NumericColumn,
    denominator: NumericColumn,
) -> Option<f64> {
    let denominator = record.number(denominator);
    if denominator == 0.0 {
        return None;
    }
    Some(record.number(numerator) / denominator).filter(|ratio| ratio.is_finite())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Issuer,
    Code,
    Duration,
    BaseSpread,
    Category,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    Duration,
    BaseSpread,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Issuer,
        Column::Code,
        Column::Duration,
        Column::BaseSpread,
        Column::Category,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Issuer => "issuer",
            Self::Code => "code",
            Self::Duration => "duration",
            Self::BaseSpread => "base_spread",
            Self::Category => "category",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Issuer => "Issuer",
            Self::Code => "Code",
            Self::Duration => "Duration",
            Self::BaseSpread => "Base spread",
            Self::Category => "Category",
        }
    }

    pub fn numeric(self) -> Option<NumericColumn> {
        match self {
            Self::Duration => Some(NumericColumn::Duration),
            Self::BaseSpread => Some(NumericColumn::BaseSpread),
            Self::Issuer | Self::Code | Self::Category => None,
        }
    }
}

impl From<NumericColumn> for Column {
    fn from(column: NumericColumn) -> Self {
        match column {
            NumericColumn::Duration => Column::Duration,
            NumericColumn::BaseSpread => Column::BaseSpread,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let column = match normalized.as_str() {
            "issuer" | "emisor" => Self::Issuer,
            "code" | "nemo" => Self::Code,
            "duration" | "duracion" | "duración" | "d" => Self::Duration,
            "base_spread" | "spread_base" | "spread" | "s" => Self::BaseSpread,
            "category" | "sector" => Self::Category,
            _ => return Err(UnknownColumn(value.to_owned())),
        };
        Ok(column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownColumn(pub String);

impl fmt::Display for UnknownColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown column `{}`", self.0)
    }
}

impl std::error::Error for UnknownColumn {}

/// Category selection driving the scene view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => record.category == *category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All categories",
            Self::Only(category) => category,
        }
    }
}

/// Read-only record store for one snapshot. Order is the load order.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub(crate) fn from_validated(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique categories, first appearance first.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for record in &self.records {
            if !categories.iter().any(|known| known == &record.category) {
                categories.push(record.category.clone());
            }
        }
        categories
    }

    /// Records passing `filter`, paired with their index in the store.
    pub fn view(&self, filter: &CategoryFilter) -> Vec<(usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.matches(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_validated(vec![
            Record::new("Issuer1", "CODE1", 10.0, 0.5, "Sector1"),
            Record::new("Issuer2", "CODE2", 20.0, 0.8, "Sector2"),
            Record::new("Issuer3", "CODE3", 15.0, 1.2, "Sector1"),
            Record::new("Issuer4", "CODE4", 25.0, 0.0, "Sector3"),
        ])
    }

    #[test]
    fn column_names_parse_with_aliases() {
        assert_eq!("S".parse::<Column>(), Ok(Column::BaseSpread));
        assert_eq!("D".parse::<Column>(), Ok(Column::Duration));
        assert_eq!("SPREAD_BASE".parse::<Column>(), Ok(Column::BaseSpread));
        assert_eq!("Base spread".parse::<Column>(), Ok(Column::BaseSpread));
        assert_eq!(" sector ".parse::<Column>(), Ok(Column::Category));
        assert_eq!(
            "yield".parse::<Column>(),
            Err(UnknownColumn("yield".to_owned()))
        );
    }

    #[test]
    fn every_column_round_trips_through_its_name() {
        for column in Column::ALL {
            assert_eq!(column.name().parse::<Column>(), Ok(column));
        }
    }

    #[test]
    fn ratio_is_undefined_for_zero_spread() {
        let records = dataset();
        assert_eq!(records.records()[0].ratio(), Some(20.0));
        assert_eq!(records.records()[3].ratio(), None);
        let negative_zero = Record::new("I", "C", 3.0, -0.0, "S");
        assert_eq!(negative_zero.ratio(), None);
    }

    #[test]
    fn ratio_is_undefined_when_the_quotient_overflows() {
        let subnormal = Record::new("I", "C", 5.0, 1e-320, "S");
        assert_eq!(subnormal.ratio(), None);
        let tiny_but_fine = Record::new("I", "C", 5.0, 1e-300, "S");
        assert!(tiny_but_fine.ratio().is_some_and(f64::is_finite));
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        assert_eq!(
            dataset().categories(),
            vec!["Sector1".to_owned(), "Sector2".to_owned(), "Sector3".to_owned()]
        );
    }

    #[test]
    fn view_filters_by_category_and_keeps_store_indices() {
        let records = dataset();
        let view = records.view(&CategoryFilter::Only("Sector1".to_owned()));
        let indices = view.iter().map(|(index, _)| *index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 2]);

        assert_eq!(records.view(&CategoryFilter::All).len(), 4);
        assert!(
            records
                .view(&CategoryFilter::Only("Missing".to_owned()))
                .is_empty()
        );
    }
}
