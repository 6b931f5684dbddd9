//! Filtering and sorting shared by every list view.
//!
//! Lists are loaded whole and narrowed in memory: free-text query, then date
//! range, then hide-past, then a stable sort.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Comparable value extracted from a record for sorting
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Date(NaiveDate),
    Amount(Decimal),
}

impl SortKey {
    /// Case-insensitive text key
    pub fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Inclusive date window; an absent bound is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Undated records pass only while both bounds are open
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(date) => self.contains(date),
            None => self.is_unbounded(),
        }
    }
}

/// Case-insensitive substring match of `query` against any present field.
/// A blank query matches everything.
pub fn matches_query(query: Option<&str>, fields: &[Option<&str>]) -> bool {
    let needle = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return true,
    };

    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Stable sort on an optional key. Missing keys come first in ascending
/// order and last in descending order; ties keep their current order.
pub fn sort_items<T, K, F>(items: &mut [T], key: F, order: SortOrder)
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    items.sort_by(|a, b| {
        let ordering = key(a).cmp(&key(b));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// A record that can appear in a filtered list view
pub trait Listable {
    type SortField: Copy;

    fn search_fields(&self) -> Vec<Option<&str>>;

    fn listing_date(&self) -> Option<NaiveDate>;

    fn sort_key(&self, field: Self::SortField) -> Option<SortKey>;
}

#[derive(Debug, Clone)]
pub struct ListCriteria<F> {
    pub query: Option<String>,
    pub range: DateRange,
    /// Drop records dated before this day
    pub hide_before: Option<NaiveDate>,
    pub sort: Option<(F, SortOrder)>,
}

impl<F> Default for ListCriteria<F> {
    fn default() -> Self {
        Self {
            query: None,
            range: DateRange::default(),
            hide_before: None,
            sort: None,
        }
    }
}

pub fn apply_criteria<T: Listable>(items: Vec<T>, criteria: &ListCriteria<T::SortField>) -> Vec<T> {
    let mut items: Vec<T> = items
        .into_iter()
        .filter(|item| matches_query(criteria.query.as_deref(), &item.search_fields()))
        .filter(|item| criteria.range.admits(item.listing_date()))
        .filter(|item| match criteria.hide_before {
            Some(today) => item.listing_date().map_or(false, |date| date >= today),
            None => true,
        })
        .collect();

    if let Some((field, order)) = criteria.sort {
        sort_items(&mut items, |item| item.sort_key(field), order);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        game: Option<&'static str>,
        date: Option<NaiveDate>,
    }

    #[derive(Clone, Copy)]
    enum Field {
        Name,
        Game,
        Date,
    }

    impl Listable for Item {
        type SortField = Field;

        fn search_fields(&self) -> Vec<Option<&str>> {
            vec![Some(self.name), self.game]
        }

        fn listing_date(&self) -> Option<NaiveDate> {
            self.date
        }

        fn sort_key(&self, field: Field) -> Option<SortKey> {
            match field {
                Field::Name => Some(SortKey::text(self.name)),
                Field::Game => self.game.map(SortKey::text),
                Field::Date => self.date.map(SortKey::Date),
            }
        }
    }

    fn item(name: &'static str, game: Option<&'static str>, day: Option<&str>) -> Item {
        Item {
            name,
            game,
            date: day.map(date),
        }
    }

    fn names(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn query_is_case_insensitive_over_any_field() {
        assert!(matches_query(Some("SPIDER"), &[Some("Cajas"), Some("Marvel's Spiderman")]));
        assert!(matches_query(Some("  "), &[None]));
        assert!(matches_query(None, &[]));
        assert!(!matches_query(Some("avatar"), &[Some("Bundle"), None]));
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let range = DateRange::new(Some(date("2025-09-26")), Some(date("2025-10-31")));
        assert!(range.contains(date("2025-09-26")));
        assert!(range.contains(date("2025-10-31")));
        assert!(!range.contains(date("2025-09-25")));
        assert!(!range.contains(date("2025-11-01")));
    }

    #[test]
    fn open_bounds_and_undated_records() {
        let open_end = DateRange::new(Some(date("2025-10-01")), None);
        assert!(open_end.contains(date("2099-01-01")));
        assert!(!open_end.admits(None));
        assert!(DateRange::default().admits(None));
    }

    #[test]
    fn sort_is_stable_and_puts_missing_first() {
        let mut items = vec![
            item("b", Some("Lorcana"), None),
            item("a", None, None),
            item("c", Some("lorcana"), None),
            item("d", Some("Avatar"), None),
        ];
        sort_items(&mut items, |i| i.sort_key(Field::Game), SortOrder::Asc);
        assert_eq!(names(&items), vec!["a", "d", "b", "c"]);

        sort_items(&mut items, |i| i.sort_key(Field::Game), SortOrder::Desc);
        assert_eq!(names(&items), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn criteria_run_query_then_range_then_hide_past_then_sort() {
        let items = vec![
            item("Cajas de sobres", Some("Avatar"), Some("2025-11-21")),
            item("Bundle", Some("Marvel's Spiderman"), Some("2025-09-26")),
            item("Caja de escena", Some("Marvel's Spiderman"), Some("2025-09-26")),
            item("Cajas de sobres", Some("Marvel's Spiderman"), Some("2025-09-26")),
            item("Sin fecha", Some("Marvel's Spiderman"), None),
        ];

        let criteria = ListCriteria {
            query: Some("spiderman".into()),
            range: DateRange::new(None, Some(date("2025-12-31"))),
            hide_before: Some(date("2025-09-01")),
            sort: Some((Field::Name, SortOrder::Asc)),
        };

        let result = apply_criteria(items.clone(), &criteria);
        assert_eq!(
            names(&result),
            vec!["Bundle", "Caja de escena", "Cajas de sobres"]
        );

        let everything = apply_criteria(
            items,
            &ListCriteria {
                sort: Some((Field::Date, SortOrder::Desc)),
                ..Default::default()
            },
        );
        assert_eq!(everything.len(), 5);
        assert_eq!(everything[0].name, "Cajas de sobres");
        assert_eq!(everything[4].name, "Sin fecha");
    }

    #[test]
    fn hide_past_keeps_today() {
        let items = vec![
            item("ayer", None, Some("2025-10-03")),
            item("hoy", None, Some("2025-10-04")),
        ];
        let criteria = ListCriteria::<Field> {
            hide_before: Some(date("2025-10-04")),
            ..Default::default()
        };
        assert_eq!(names(&apply_criteria(items, &criteria)), vec!["hoy"]);
    }

    #[test]
    fn sort_order_parses_loosely() {
        assert_eq!(SortOrder::from_str("DESC").unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::from_str("asc").unwrap(), SortOrder::Asc);
        assert!(SortOrder::from_str("up").is_err());
    }
}
