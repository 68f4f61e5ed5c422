use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::flatten::flatten;
use crate::model::{Contract, Field, FieldKind, FieldValue, FlatRecord, Task, trailing_number};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Gt,
    Lt,
    Gte,
    Lte,
    Range,
    Contains,
    Is,
    IsNot,
    IsEmpty,
    IsNotEmpty,
}

const NUMERIC_OPERATORS: [FilterOperator; 6] = [
    FilterOperator::Equals,
    FilterOperator::Gt,
    FilterOperator::Lt,
    FilterOperator::Gte,
    FilterOperator::Lte,
    FilterOperator::Range,
];

const ENUM_OPERATORS: [FilterOperator; 4] = [
    FilterOperator::Is,
    FilterOperator::IsNot,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

const TEXT_OPERATORS: [FilterOperator; 5] = [
    FilterOperator::Is,
    FilterOperator::IsNot,
    FilterOperator::Contains,
    FilterOperator::IsEmpty,
    FilterOperator::IsNotEmpty,
];

impl FilterOperator {
    /// Operators offered in the filter editor for a kind of field.
    pub fn offered_for(kind: FieldKind) -> &'static [FilterOperator] {
        match kind {
            FieldKind::Id | FieldKind::Numeric => &NUMERIC_OPERATORS,
            FieldKind::Enum => &ENUM_OPERATORS,
            FieldKind::Text => &TEXT_OPERATORS,
        }
    }

    /// Whether the engine can evaluate this operator for a kind of field.
    /// Broader than [`FilterOperator::offered_for`]: emptiness checks apply
    /// everywhere, `contains` works on ids and counts, `equals` is read as
    /// `is` on text.
    pub fn applies_to(&self, kind: FieldKind) -> bool {
        use FilterOperator::*;
        match (self, kind) {
            (IsEmpty | IsNotEmpty, _) => true,
            (Equals | Gt | Lt | Gte | Lte | Range | Contains, FieldKind::Id | FieldKind::Numeric) => {
                true
            }
            (Is | IsNot | Equals, FieldKind::Enum | FieldKind::Text) => true,
            (Contains, FieldKind::Text) => true,
            _ => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Gt => "greater than",
            FilterOperator::Lt => "less than",
            FilterOperator::Gte => "greater than or equal",
            FilterOperator::Lte => "less than or equal",
            FilterOperator::Range => "range",
            FilterOperator::Contains => "contains",
            FilterOperator::Is => "is",
            FilterOperator::IsNot => "is not",
            FilterOperator::IsEmpty => "is empty",
            FilterOperator::IsNotEmpty => "is not empty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

/// One user filter rule. The active set is combined with AND.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriterion {
    pub field: Field,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub upper_value: Option<String>,
}

impl FilterCriterion {
    pub fn new(field: Field, operator: FilterOperator, value: impl Into<String>) -> Self {
        FilterCriterion {
            field,
            operator,
            value: value.into(),
            upper_value: None,
        }
    }

    pub fn range(field: Field, lower: impl Into<String>, upper: impl Into<String>) -> Self {
        FilterCriterion {
            field,
            operator: FilterOperator::Range,
            value: lower.into(),
            upper_value: Some(upper.into()),
        }
    }

    /// Evaluate the rule against one cell value. Anything that cannot be
    /// evaluated (wrong operator for the field, unparseable bound) matches
    /// nothing.
    pub fn matches(&self, value: Option<FieldValue<'_>>) -> bool {
        let kind = self.field.kind();
        if !self.operator.applies_to(kind) {
            debug!("operator {:?} does not apply to {}", self.operator, self.field);
            return false;
        }

        let value = match value {
            Some(value) if !value.is_blank() => value,
            _ => return self.operator == FilterOperator::IsEmpty,
        };

        match self.operator {
            FilterOperator::IsEmpty => return false,
            FilterOperator::IsNotEmpty => return true,
            _ => {}
        }

        match kind {
            FieldKind::Id => self.matches_id(value),
            FieldKind::Numeric => self.matches_numeric(value),
            FieldKind::Enum | FieldKind::Text => self.matches_text(value),
        }
    }

    fn matches_id(&self, value: FieldValue<'_>) -> bool {
        let haystack = value.to_string().to_lowercase();
        if self.operator == FilterOperator::Contains {
            return haystack.contains(&self.value.trim().to_lowercase());
        }
        match trailing_number(&haystack) {
            Some(actual) => self.compare(actual, trailing_number),
            None => false,
        }
    }

    fn matches_numeric(&self, value: FieldValue<'_>) -> bool {
        if self.operator == FilterOperator::Contains {
            return value
                .to_string()
                .to_lowercase()
                .contains(&self.value.trim().to_lowercase());
        }
        let actual = match value {
            FieldValue::Int(n) => Some(n),
            FieldValue::Text(s) => parse_integer(s),
        };
        match actual {
            Some(actual) => self.compare(actual, parse_integer),
            None => false,
        }
    }

    fn matches_text(&self, value: FieldValue<'_>) -> bool {
        let actual = value.to_string().to_lowercase();
        let wanted = self.value.trim().to_lowercase();
        match self.operator {
            FilterOperator::Is | FilterOperator::Equals => actual == wanted,
            FilterOperator::IsNot => actual != wanted,
            FilterOperator::Contains => actual.contains(&wanted),
            _ => false,
        }
    }

    fn compare(&self, actual: i64, parse: fn(&str) -> Option<i64>) -> bool {
        let Some(bound) = parse(&self.value) else {
            return false;
        };
        match self.operator {
            FilterOperator::Equals => actual == bound,
            FilterOperator::Gt => actual > bound,
            FilterOperator::Lt => actual < bound,
            FilterOperator::Gte => actual >= bound,
            FilterOperator::Lte => actual <= bound,
            FilterOperator::Range => match self.upper_value.as_deref().and_then(parse) {
                Some(upper) => actual >= bound && actual <= upper,
                None => false,
            },
            _ => false,
        }
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

fn task_matches(task: &Task, criterion: &FilterCriterion) -> bool {
    match criterion.field {
        Field::TaskId => criterion.matches(task.value(Field::TaskId)),
        Field::TriggeredTasks | Field::OpenTasks => criterion.matches(
            task.first_obligation()
                .and_then(|obligation| obligation.value(criterion.field)),
        ),
        field => task
            .obligations
            .iter()
            .any(|obligation| criterion.matches(obligation.value(field))),
    }
}

/// Filter the pristine dataset and re-derive the flat rows from the result.
///
/// Every call starts from `original`; with no criteria the original dataset
/// comes back as is. The flat rows are never filtered on their own, which
/// keeps the grouped, flat and transposed views in agreement.
pub fn apply_filters(
    criteria: &[FilterCriterion],
    original: &[Contract],
) -> (Vec<Contract>, Vec<FlatRecord>) {
    let mut filtered = original.to_vec();

    for criterion in criteria {
        if criterion.field == Field::Remarks {
            warn!("remarks cannot be filtered in the dataset, skipping criterion");
            continue;
        }

        if criterion.field.is_contract_level() {
            filtered.retain(|contract| criterion.matches(contract.value(criterion.field)));
            continue;
        }

        for contract in filtered.iter_mut() {
            contract.tasks.retain(|task| task_matches(task, criterion));
        }
        filtered.retain(|contract| !contract.tasks.is_empty());
    }

    debug!(
        "{} criteria kept {} of {} contracts",
        criteria.len(),
        filtered.len(),
        original.len()
    );
    let flat = flatten(&filtered);
    (filtered, flat)
}
