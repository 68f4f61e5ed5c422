use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{Contract, Field, FieldKind, FieldValue, FlatRecord, Task, trailing_number};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Header click cycle: unsorted, ascending, descending, unsorted.
    pub fn cycle(current: Option<SortDirection>) -> Option<SortDirection> {
        match current {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SortCriterion {
    pub field: Field,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortCriterion {
    pub fn asc(field: Field) -> Self {
        SortCriterion {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: Field) -> Self {
        SortCriterion {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Rows that can be ordered by field.
pub trait SortKey {
    fn sort_value(&self, field: Field) -> Option<FieldValue<'_>>;
}

impl SortKey for FlatRecord {
    fn sort_value(&self, field: Field) -> Option<FieldValue<'_>> {
        self.value(field)
    }
}

impl SortKey for Task {
    fn sort_value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::TaskId => self.value(field),
            _ => self
                .first_obligation()
                .and_then(|obligation| obligation.value(field)),
        }
    }
}

impl SortKey for Contract {
    fn sort_value(&self, field: Field) -> Option<FieldValue<'_>> {
        self.value(field)
    }
}

fn as_number(value: Option<FieldValue<'_>>) -> i64 {
    match value {
        Some(FieldValue::Int(n)) => n,
        Some(FieldValue::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    }
}

fn id_number(value: Option<FieldValue<'_>>) -> i64 {
    match value {
        Some(FieldValue::Text(s)) => trailing_number(s).unwrap_or(0),
        Some(FieldValue::Int(n)) => n,
        None => 0,
    }
}

/// Type-aware comparison of two values of the same field.
pub fn compare_values(field: Field, a: Option<FieldValue<'_>>, b: Option<FieldValue<'_>>) -> Ordering {
    match field.kind() {
        FieldKind::Id => id_number(a).cmp(&id_number(b)),
        FieldKind::Numeric => as_number(a).cmp(&as_number(b)),
        FieldKind::Enum | FieldKind::Text => match (a, b) {
            (Some(FieldValue::Int(x)), Some(FieldValue::Int(y))) => x.cmp(&y),
            (Some(FieldValue::Text(x)), Some(FieldValue::Text(y))) => x.cmp(y),
            (x, y) => {
                let x = x.map(|v| v.to_string()).unwrap_or_default();
                let y = y.map(|v| v.to_string()).unwrap_or_default();
                x.cmp(&y)
            }
        },
    }
}

/// Multi-key comparison: the first criterion that tells the rows apart wins.
pub fn compare_by<T: SortKey + ?Sized>(criteria: &[SortCriterion], a: &T, b: &T) -> Ordering {
    for criterion in criteria {
        let ordering = compare_values(
            criterion.field,
            a.sort_value(criterion.field),
            b.sort_value(criterion.field),
        );
        let ordering = criterion.direction.apply(ordering);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort of any sortable rows.
pub fn sort_rows<T: SortKey>(criteria: &[SortCriterion], rows: &mut [T]) {
    if criteria.is_empty() {
        return;
    }
    rows.sort_by(|a, b| compare_by(criteria, a, b));
}

/// Reorder the tasks inside every contract. Contract order is left alone and
/// contract-level criteria have nothing to compare here.
pub fn sort_nested(criteria: &[SortCriterion], contracts: &mut [Contract]) {
    let task_criteria: Vec<SortCriterion> = criteria
        .iter()
        .filter(|criterion| !criterion.field.is_contract_level())
        .copied()
        .collect();
    if task_criteria.is_empty() {
        debug!("no task-level sort criteria, grouped order unchanged");
        return;
    }
    for contract in contracts.iter_mut() {
        sort_rows(&task_criteria, &mut contract.tasks);
    }
}

/// Sort both representations. An empty criteria list leaves the current
/// order in place; unlike filtering it does not reset anything.
pub fn apply_sort(
    criteria: &[SortCriterion],
    nested: &[Contract],
    flat: &[FlatRecord],
) -> (Vec<Contract>, Vec<FlatRecord>) {
    let mut nested = nested.to_vec();
    let mut flat = flat.to_vec();
    if criteria.is_empty() {
        return (nested, flat);
    }

    sort_nested(criteria, &mut nested);
    sort_rows(criteria, &mut flat);
    debug!("sorted {} flat rows by {} criteria", flat.len(), criteria.len());
    (nested, flat)
}
