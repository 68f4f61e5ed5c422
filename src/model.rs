use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GridError;

lazy_static! {
    static ref DIGIT_RUN_REGEX: Regex = Regex::new(r"[0-9]+").unwrap();
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Criticality {
    Low,
    Medium,
    High,
}

impl Criticality {
    pub const ALL: [Criticality; 3] = [Criticality::High, Criticality::Medium, Criticality::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Low => "Low",
            Criticality::Medium => "Medium",
            Criticality::High => "High",
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Compliance {
    Compliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
}

impl Compliance {
    pub const ALL: [Compliance; 2] = [Compliance::Compliant, Compliance::NonCompliant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compliance::Compliant => "Compliant",
            Compliance::NonCompliant => "Non-Compliant",
        }
    }
}

/// Leaf compliance record owned by a [`Task`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Obligation {
    #[serde(rename = "obligationTitle")]
    pub title: String,
    pub criticality: Criticality,
    #[serde(rename = "triggeredTasks")]
    pub triggered_tasks: u32,
    #[serde(rename = "openTasks")]
    pub open_tasks: u32,
    pub compliance: Compliance,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Task {
    #[serde(rename = "task")]
    pub task_id: String,
    #[serde(default)]
    pub obligations: Vec<Obligation>,
}

/// Top-level grouping entity. Only ever replaced wholesale: its task list is
/// swapped out by sorting and the whole contract is dropped by filtering.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Contract {
    #[serde(rename = "contractid")]
    pub contract_id: String,
    pub category: String,
    pub domain: String,
    pub subdomain: String,
    pub owner: String,
    #[serde(rename = "numberOfTasks")]
    pub task_count: u32,
    pub tasks: Vec<Task>,
}

/// One row per (contract, task, obligation) triple.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FlatRecord {
    #[serde(rename = "contractid")]
    pub contract_id: String,
    #[serde(rename = "taskid")]
    pub task_id: String,
    #[serde(rename = "obligationIndex")]
    pub obligation_index: usize,
    #[serde(rename = "obligationTitle")]
    pub obligation_title: String,
    pub category: String,
    pub domain: String,
    pub subdomain: String,
    pub criticality: Criticality,
    pub owner: String,
    #[serde(rename = "numberOfTasks")]
    pub task_count: u32,
    #[serde(rename = "triggeredTasks")]
    pub triggered_tasks: u32,
    #[serde(rename = "openTasks")]
    pub open_tasks: u32,
    pub compliance: Compliance,
    pub remarks: String,
}

/// Every column a criterion, a layout or an edit can refer to.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    #[serde(rename = "contractid")]
    ContractId,
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "domain")]
    Domain,
    #[serde(rename = "subdomain")]
    Subdomain,
    #[serde(rename = "owner")]
    Owner,
    #[serde(rename = "numberOfTasks")]
    TaskCount,
    #[serde(rename = "taskid", alias = "task")]
    TaskId,
    #[serde(rename = "obligationTitle")]
    ObligationTitle,
    #[serde(rename = "criticality")]
    Criticality,
    #[serde(rename = "triggeredTasks")]
    TriggeredTasks,
    #[serde(rename = "openTasks")]
    OpenTasks,
    #[serde(rename = "compliance")]
    Compliance,
    #[serde(rename = "remarks")]
    Remarks,
}

/// How values of a field are compared by the filter and sort engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Identifier compared by its trailing number (`CNT-2024-007` -> 7).
    Id,
    Numeric,
    Enum,
    Text,
}

/// Which record owns the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLevel {
    Contract,
    Task,
    Obligation,
    /// Per-row annotations that only exist in the flat projection.
    Annotation,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::ContractId,
        Field::Category,
        Field::Domain,
        Field::Subdomain,
        Field::Owner,
        Field::TaskCount,
        Field::TaskId,
        Field::ObligationTitle,
        Field::Criticality,
        Field::TriggeredTasks,
        Field::OpenTasks,
        Field::Compliance,
        Field::Remarks,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::ContractId => "contractid",
            Field::Category => "category",
            Field::Domain => "domain",
            Field::Subdomain => "subdomain",
            Field::Owner => "owner",
            Field::TaskCount => "numberOfTasks",
            Field::TaskId => "taskid",
            Field::ObligationTitle => "obligationTitle",
            Field::Criticality => "criticality",
            Field::TriggeredTasks => "triggeredTasks",
            Field::OpenTasks => "openTasks",
            Field::Compliance => "compliance",
            Field::Remarks => "remarks",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Field::ContractId => "Contract ID",
            Field::Category => "Category",
            Field::Domain => "Domain",
            Field::Subdomain => "Subdomain",
            Field::Owner => "Owner",
            Field::TaskCount => "Number of Tasks",
            Field::TaskId => "Task ID",
            Field::ObligationTitle => "Obligation Title",
            Field::Criticality => "Criticality",
            Field::TriggeredTasks => "Triggered Tasks",
            Field::OpenTasks => "Open Tasks",
            Field::Compliance => "Compliance",
            Field::Remarks => "Remarks",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::ContractId | Field::TaskId => FieldKind::Id,
            Field::TaskCount | Field::TriggeredTasks | Field::OpenTasks => FieldKind::Numeric,
            Field::Criticality | Field::Compliance => FieldKind::Enum,
            _ => FieldKind::Text,
        }
    }

    pub fn level(&self) -> FieldLevel {
        match self {
            Field::ContractId
            | Field::Category
            | Field::Domain
            | Field::Subdomain
            | Field::Owner
            | Field::TaskCount => FieldLevel::Contract,
            Field::TaskId => FieldLevel::Task,
            Field::ObligationTitle
            | Field::Criticality
            | Field::TriggeredTasks
            | Field::OpenTasks
            | Field::Compliance => FieldLevel::Obligation,
            Field::Remarks => FieldLevel::Annotation,
        }
    }

    pub fn is_contract_level(&self) -> bool {
        self.level() == FieldLevel::Contract
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "task" {
            return Ok(Field::TaskId);
        }
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| GridError::UnknownColumn(s.to_string()))
    }
}

/// A borrowed cell value as seen by the engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i64),
}

impl FieldValue<'_> {
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl Contract {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::ContractId => Some(FieldValue::Text(&self.contract_id)),
            Field::Category => Some(FieldValue::Text(&self.category)),
            Field::Domain => Some(FieldValue::Text(&self.domain)),
            Field::Subdomain => Some(FieldValue::Text(&self.subdomain)),
            Field::Owner => Some(FieldValue::Text(&self.owner)),
            Field::TaskCount => Some(FieldValue::Int(self.task_count as i64)),
            _ => None,
        }
    }
}

impl Task {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::TaskId => Some(FieldValue::Text(&self.task_id)),
            _ => None,
        }
    }

    /// Generated tasks carry exactly one obligation; the count columns of
    /// the grouped view read it from there.
    pub fn first_obligation(&self) -> Option<&Obligation> {
        self.obligations.first()
    }
}

impl Obligation {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::ObligationTitle => Some(FieldValue::Text(&self.title)),
            Field::Criticality => Some(FieldValue::Text(self.criticality.as_str())),
            Field::TriggeredTasks => Some(FieldValue::Int(self.triggered_tasks as i64)),
            Field::OpenTasks => Some(FieldValue::Int(self.open_tasks as i64)),
            Field::Compliance => Some(FieldValue::Text(self.compliance.as_str())),
            _ => None,
        }
    }
}

impl FlatRecord {
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        let value = match field {
            Field::ContractId => FieldValue::Text(&self.contract_id),
            Field::Category => FieldValue::Text(&self.category),
            Field::Domain => FieldValue::Text(&self.domain),
            Field::Subdomain => FieldValue::Text(&self.subdomain),
            Field::Owner => FieldValue::Text(&self.owner),
            Field::TaskCount => FieldValue::Int(self.task_count as i64),
            Field::TaskId => FieldValue::Text(&self.task_id),
            Field::ObligationTitle => FieldValue::Text(&self.obligation_title),
            Field::Criticality => FieldValue::Text(self.criticality.as_str()),
            Field::TriggeredTasks => FieldValue::Int(self.triggered_tasks as i64),
            Field::OpenTasks => FieldValue::Int(self.open_tasks as i64),
            Field::Compliance => FieldValue::Text(self.compliance.as_str()),
            Field::Remarks => FieldValue::Text(&self.remarks),
        };
        Some(value)
    }

    pub fn key(&self) -> RowKey {
        RowKey {
            contract_id: self.contract_id.clone(),
            task_id: self.task_id.clone(),
            obligation: self.obligation_index,
        }
    }
}

/// Closed union over the four record shapes.
#[derive(Clone, Copy, Debug)]
pub enum RecordRef<'a> {
    Contract(&'a Contract),
    Task(&'a Task),
    Obligation(&'a Obligation),
    Flat(&'a FlatRecord),
}

impl<'a> RecordRef<'a> {
    pub fn value(&self, field: Field) -> Option<FieldValue<'a>> {
        match *self {
            RecordRef::Contract(contract) => contract.value(field),
            RecordRef::Task(task) => task.value(field),
            RecordRef::Obligation(obligation) => obligation.value(field),
            RecordRef::Flat(record) => record.value(field),
        }
    }

    pub fn level(&self) -> FieldLevel {
        match self {
            RecordRef::Contract(_) => FieldLevel::Contract,
            RecordRef::Task(_) => FieldLevel::Task,
            RecordRef::Obligation(_) => FieldLevel::Obligation,
            RecordRef::Flat(_) => FieldLevel::Annotation,
        }
    }
}

/// Stable identity of a flat row; survives filtering and reordering.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub contract_id: String,
    pub task_id: String,
    pub obligation: usize,
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.contract_id, self.task_id, self.obligation)
    }
}

impl FromStr for RowKey {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(contract_id), Some(task_id), Some(obligation))
                if !contract_id.is_empty() && !task_id.is_empty() =>
            {
                let obligation = obligation
                    .parse::<usize>()
                    .map_err(|_| GridError::UnknownRowKey(s.to_string()))?;
                Ok(RowKey {
                    contract_id: contract_id.to_string(),
                    task_id: task_id.to_string(),
                    obligation,
                })
            }
            _ => Err(GridError::UnknownRowKey(s.to_string())),
        }
    }
}

/// Numeric value of the last run of digits in `s`, if any.
pub fn trailing_number(s: &str) -> Option<i64> {
    DIGIT_RUN_REGEX
        .find_iter(s)
        .last()
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
