use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::GridError;
use crate::interaction::move_item;
use crate::model::Field;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grouped,
    Flat,
    Transposed,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Grouped, ViewMode::Flat, ViewMode::Transposed];

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Grouped => "Grouped View",
            ViewMode::Flat => "Flat View",
            ViewMode::Transposed => "Transposed View",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ViewMode::Grouped => "grouped",
            ViewMode::Flat => "flat",
            ViewMode::Transposed => "transposed",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ViewMode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GridError::UnknownViewMode(s.to_string()))
    }
}

/// Default, minimum and maximum size of one column (or one transposed row).
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SizeBounds {
    pub default: u32,
    pub min: u32,
    pub max: u32,
}

impl SizeBounds {
    pub const fn new(default: u32, min: u32, max: u32) -> Self {
        SizeBounds { default, min, max }
    }

    pub fn clamp(&self, size: u32) -> u32 {
        size.clamp(self.min, self.max)
    }
}

pub const TRANSPOSED_ROW_HEIGHT: u32 = 48;

const GROUPED_COLUMNS: [(Field, SizeBounds); 6] = [
    (Field::ContractId, SizeBounds::new(140, 100, 220)),
    (Field::Category, SizeBounds::new(110, 80, 180)),
    (Field::Domain, SizeBounds::new(140, 100, 200)),
    (Field::Subdomain, SizeBounds::new(140, 100, 200)),
    (Field::Owner, SizeBounds::new(120, 80, 180)),
    (Field::TaskCount, SizeBounds::new(120, 100, 160)),
];

const FLAT_COLUMNS: [(Field, SizeBounds); 12] = [
    (Field::ContractId, SizeBounds::new(93, 83, 123)),
    (Field::TaskId, SizeBounds::new(73, 63, 103)),
    (Field::ObligationTitle, SizeBounds::new(123, 103, 163)),
    (Field::Category, SizeBounds::new(83, 73, 113)),
    (Field::Domain, SizeBounds::new(93, 83, 123)),
    (Field::Subdomain, SizeBounds::new(93, 83, 123)),
    (Field::Criticality, SizeBounds::new(83, 73, 113)),
    (Field::Owner, SizeBounds::new(93, 83, 123)),
    (Field::TriggeredTasks, SizeBounds::new(133, 113, 153)),
    (Field::OpenTasks, SizeBounds::new(93, 73, 113)),
    (Field::Compliance, SizeBounds::new(93, 73, 113)),
    (Field::Remarks, SizeBounds::new(100, 90, 130)),
];

/// Order, visibility and sizing of the columns of one view. In the
/// transposed view the same layout drives rows and their heights.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ColumnLayout {
    order: Vec<Field>,
    hidden: BTreeSet<Field>,
    sizes: BTreeMap<Field, u32>,
    bounds: BTreeMap<Field, SizeBounds>,
}

impl ColumnLayout {
    pub fn for_view(mode: ViewMode) -> Self {
        let specs: Vec<(Field, SizeBounds)> = match mode {
            ViewMode::Grouped => GROUPED_COLUMNS.to_vec(),
            ViewMode::Flat => FLAT_COLUMNS.to_vec(),
            ViewMode::Transposed => FLAT_COLUMNS
                .iter()
                .filter(|(field, _)| *field != Field::Remarks)
                .map(|(field, _)| {
                    (
                        *field,
                        SizeBounds::new(TRANSPOSED_ROW_HEIGHT, TRANSPOSED_ROW_HEIGHT, u32::MAX),
                    )
                })
                .collect(),
        };

        ColumnLayout {
            order: specs.iter().map(|(field, _)| *field).collect(),
            hidden: BTreeSet::new(),
            sizes: BTreeMap::new(),
            bounds: specs.into_iter().collect(),
        }
    }

    pub fn order(&self) -> &[Field] {
        &self.order
    }

    pub fn contains(&self, field: Field) -> bool {
        self.bounds.contains_key(&field)
    }

    pub fn visible(&self) -> Vec<Field> {
        self.order
            .iter()
            .copied()
            .filter(|field| !self.hidden.contains(field))
            .collect()
    }

    pub fn is_visible(&self, field: Field) -> bool {
        self.contains(field) && !self.hidden.contains(&field)
    }

    pub fn set_visible(&mut self, field: Field, visible: bool) -> bool {
        if !self.contains(field) {
            return false;
        }
        if visible {
            self.hidden.remove(&field);
        } else {
            self.hidden.insert(field);
        }
        true
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        self.order.iter().position(|f| *f == field)
    }

    /// Reorder by position in the full (hidden included) column order.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        if !move_item(&mut self.order, from, to) {
            return Err(GridError::InvalidPosition(from.max(to)));
        }
        Ok(())
    }

    /// Drop `active` onto `over`: `active` takes `over`'s position.
    pub fn move_column(&mut self, active: Field, over: Field) -> Result<(), GridError> {
        let from = self
            .position(active)
            .ok_or_else(|| GridError::UnknownColumn(active.to_string()))?;
        let to = self
            .position(over)
            .ok_or_else(|| GridError::UnknownColumn(over.to_string()))?;
        self.reorder(from, to)
    }

    pub fn bounds(&self, field: Field) -> Option<SizeBounds> {
        self.bounds.get(&field).copied()
    }

    pub fn size(&self, field: Field) -> Option<u32> {
        let bounds = self.bounds(field)?;
        Some(self.sizes.get(&field).copied().unwrap_or(bounds.default))
    }

    /// Set a size, clamped to the field's bounds. Returns the stored size.
    pub fn resize(&mut self, field: Field, size: u32) -> Option<u32> {
        let bounds = self.bounds(field)?;
        let size = bounds.clamp(size);
        self.sizes.insert(field, size);
        Some(size)
    }
}
