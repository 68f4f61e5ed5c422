use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::GridError;
use crate::filter::{self, FilterCriterion};
use crate::flatten::flatten;
use crate::generator;
use crate::interaction::{DragState, ResizeState};
use crate::layout::{ColumnLayout, ViewMode};
use crate::model::{Contract, Field, FlatRecord, Obligation, RowKey};
use crate::session::{EditOverlay, SessionStore};
use crate::sort::{self, SortCriterion, SortDirection, compare_by};

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnHeader {
    pub field: Field,
    pub header: &'static str,
    pub size: u32,
    pub sort: Option<SortDirection>,
    pub filter: Option<String>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct TaskRow {
    pub task_id: String,
    pub expanded: bool,
    pub obligations: Vec<Obligation>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct GroupedRow {
    pub contract_id: String,
    pub expanded: bool,
    pub cells: Vec<String>,
    pub tasks: Vec<TaskRow>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct GroupedView {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<GroupedRow>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct FlatRow {
    /// Position of the record in the flat dataset; edits address rows by it.
    pub index: usize,
    pub key: String,
    pub cells: Vec<String>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct FlatView {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<FlatRow>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct TransposedRow {
    pub field: Field,
    pub header: &'static str,
    pub height: u32,
    pub sort: Option<SortDirection>,
    pub filter: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct TransposedView {
    pub record_keys: Vec<String>,
    pub rows: Vec<TransposedRow>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ViewSnapshot {
    Grouped(GroupedView),
    Flat(FlatView),
    Transposed(TransposedView),
}

/// Single source of truth behind the three presentations.
///
/// Holds the pristine dataset, the current nested and flat datasets derived
/// from it, the edit overlay and the per-view layout state. Every mutation
/// leaves nested and flat consistent; only their orderings may differ after
/// a sort (tasks within a contract versus global).
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GridState {
    original: Vec<Contract>,
    nested: Vec<Contract>,
    flat: Vec<FlatRecord>,
    overlay: EditOverlay,
    mode: ViewMode,
    #[serde(deserialize_with = "complete_layouts")]
    layouts: BTreeMap<ViewMode, ColumnLayout>,
    header_sort: BTreeMap<ViewMode, SortCriterion>,
    column_filters: BTreeMap<ViewMode, BTreeMap<Field, String>>,
    expanded: BTreeSet<String>,
    active_filters: Vec<FilterCriterion>,
    active_sort: Vec<SortCriterion>,
    #[serde(skip)]
    drag: DragState<Field>,
    #[serde(skip)]
    resize: ResizeState<Field>,
}

/// Snapshots written without one of the views get its default layout back.
fn complete_layouts<'de, D>(deserializer: D) -> Result<BTreeMap<ViewMode, ColumnLayout>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut layouts = BTreeMap::<ViewMode, ColumnLayout>::deserialize(deserializer)?;
    for mode in ViewMode::ALL {
        layouts
            .entry(mode)
            .or_insert_with(|| ColumnLayout::for_view(mode));
    }
    Ok(layouts)
}

impl GridState {
    pub fn new(original: Vec<Contract>) -> Self {
        let nested = original.clone();
        let flat = flatten(&nested);
        let layouts = ViewMode::ALL
            .iter()
            .map(|mode| (*mode, ColumnLayout::for_view(*mode)))
            .collect();

        GridState {
            original,
            nested,
            flat,
            overlay: EditOverlay::new(),
            mode: ViewMode::default(),
            layouts,
            header_sort: BTreeMap::new(),
            column_filters: BTreeMap::new(),
            expanded: BTreeSet::new(),
            active_filters: Vec::new(),
            active_sort: Vec::new(),
            drag: DragState::Idle,
            resize: ResizeState::Idle,
        }
    }

    /// Build the grid for a session: cached (or freshly generated) data plus
    /// whatever edits and remarks the session already holds.
    pub fn from_session<S, R>(store: &mut S, rng: &mut R) -> Self
    where
        S: SessionStore + ?Sized,
        R: Rng + ?Sized,
    {
        let contracts = generator::load_or_generate(store, rng);
        let mut grid = GridState::new(contracts);
        match EditOverlay::load(&*store, &grid.flat) {
            Ok(overlay) => grid.overlay = overlay,
            Err(e) => warn!("ignoring stored edits: {}", e),
        }
        grid.hydrate_remarks();
        grid
    }

    pub fn original(&self) -> &[Contract] {
        &self.original
    }

    pub fn nested(&self) -> &[Contract] {
        &self.nested
    }

    pub fn flat(&self) -> &[FlatRecord] {
        &self.flat
    }

    pub fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn active_filters(&self) -> &[FilterCriterion] {
        &self.active_filters
    }

    pub fn active_sort(&self) -> &[SortCriterion] {
        &self.active_sort
    }

    pub fn layout(&self, mode: ViewMode) -> &ColumnLayout {
        // `new` and `complete_layouts` fill every mode.
        &self.layouts[&mode]
    }

    fn active_layout_mut(&mut self) -> &mut ColumnLayout {
        let mode = self.mode;
        self.layouts
            .entry(mode)
            .or_insert_with(|| ColumnLayout::for_view(mode))
    }

    fn ensure_in_view(&self, field: Field) -> Result<(), GridError> {
        if self.layout(self.mode).contains(field) {
            Ok(())
        } else {
            Err(GridError::ColumnNotInView(field, self.mode))
        }
    }

    fn hydrate_remarks(&mut self) {
        for record in self.flat.iter_mut() {
            if let Some(remarks) = self.overlay.remarks(&record.key()) {
                record.remarks = remarks.to_string();
            }
        }
    }

    /// Re-derive both datasets from the pristine data under `criteria`.
    /// An empty list restores the unfiltered dataset. Any earlier sort is
    /// dropped along with the old rows.
    pub fn apply_filters(&mut self, criteria: &[FilterCriterion]) {
        let (nested, flat) = filter::apply_filters(criteria, &self.original);
        self.nested = nested;
        self.flat = flat;
        self.hydrate_remarks();
        self.active_filters = criteria.to_vec();
        self.active_sort.clear();
        info!(
            "filters applied: {} contracts, {} rows",
            self.nested.len(),
            self.flat.len()
        );
    }

    /// Sort both datasets. An empty list keeps the current order.
    pub fn apply_sort(&mut self, criteria: &[SortCriterion]) {
        if criteria.is_empty() {
            debug!("empty sort request, keeping current order");
            return;
        }
        let (nested, flat) = sort::apply_sort(criteria, &self.nested, &self.flat);
        self.nested = nested;
        self.flat = flat;
        self.active_sort = criteria.to_vec();
        info!("sort applied with {} criteria", criteria.len());
    }

    pub fn row_key(&self, row: usize) -> Result<RowKey, GridError> {
        self.flat
            .get(row)
            .map(FlatRecord::key)
            .ok_or(GridError::UnknownRow(row))
    }

    /// Override one cell of the flat row at dataset position `row`.
    pub fn edit_cell(
        &mut self,
        row: usize,
        field: Field,
        value: impl Into<String>,
    ) -> Result<RowKey, GridError> {
        if field == Field::Remarks {
            return self.set_remarks(row, value);
        }
        let key = self.row_key(row)?;
        self.overlay.set_edit(key.clone(), field, value.into());
        debug!("edited {} of {}", field, key);
        Ok(key)
    }

    pub fn set_remarks(&mut self, row: usize, value: impl Into<String>) -> Result<RowKey, GridError> {
        let key = self.row_key(row)?;
        let value = value.into();
        self.overlay.set_remarks(key.clone(), value.clone());
        self.flat[row].remarks = value;
        Ok(key)
    }

    /// Displayed value of a cell, edits included.
    pub fn cell_value(&self, row: usize, field: Field) -> Result<String, GridError> {
        let record = self.flat.get(row).ok_or(GridError::UnknownRow(row))?;
        Ok(self.overlay.cell_value(record, field))
    }

    pub fn persist(&self, store: &mut dyn SessionStore) -> Result<(), GridError> {
        self.overlay.save(store)
    }

    /// Change the active presentation. Data is untouched.
    pub fn switch_view(&mut self, mode: ViewMode) {
        self.drag.cancel();
        self.resize.cancel();
        self.mode = mode;
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        self.active_layout_mut().reorder(from, to)
    }

    pub fn move_column(&mut self, active: Field, over: Field) -> Result<(), GridError> {
        self.ensure_in_view(active)?;
        self.ensure_in_view(over)?;
        self.active_layout_mut().move_column(active, over)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn begin_drag(&mut self, field: Field) -> Result<(), GridError> {
        self.ensure_in_view(field)?;
        self.drag.start(field);
        Ok(())
    }

    pub fn drag_over(&mut self, field: Field) -> Result<(), GridError> {
        self.ensure_in_view(field)?;
        self.drag.hover(field);
        Ok(())
    }

    /// Finish the drag. Returns whether the column order changed.
    pub fn end_drag(&mut self) -> Result<bool, GridError> {
        match self.drag.drop() {
            Some((active, over)) => {
                self.active_layout_mut().move_column(active, over)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_resizing()
    }

    pub fn begin_resize(&mut self, field: Field, pointer: i32) -> Result<(), GridError> {
        self.ensure_in_view(field)?;
        let size = self
            .layout(self.mode)
            .size(field)
            .ok_or(GridError::ColumnNotInView(field, self.mode))?;
        self.resize.start(field, size, pointer);
        Ok(())
    }

    /// Live size while the pointer moves; nothing is stored yet.
    pub fn resize_to(&mut self, pointer: i32) -> Option<u32> {
        let field = match &self.resize {
            ResizeState::Resizing { id, .. } => *id,
            ResizeState::Idle => return None,
        };
        let bounds = self.layout(self.mode).bounds(field)?;
        self.resize.drag_to(pointer, bounds.min, bounds.max)
    }

    pub fn end_resize(&mut self) -> Option<u32> {
        let (field, size) = self.resize.commit()?;
        self.active_layout_mut().resize(field, size)
    }

    pub fn cancel_resize(&mut self) {
        self.resize.cancel();
    }

    pub fn resize(&mut self, field: Field, size: u32) -> Result<u32, GridError> {
        self.ensure_in_view(field)?;
        self.active_layout_mut()
            .resize(field, size)
            .ok_or(GridError::ColumnNotInView(field, self.mode))
    }

    pub fn set_visibility(&mut self, field: Field, visible: bool) -> Result<(), GridError> {
        self.ensure_in_view(field)?;
        self.active_layout_mut().set_visible(field, visible);
        Ok(())
    }

    /// Header click on `field` in the active view.
    pub fn toggle_sort(&mut self, field: Field) -> Result<Option<SortDirection>, GridError> {
        self.ensure_in_view(field)?;
        let current = self
            .header_sort
            .get(&self.mode)
            .filter(|criterion| criterion.field == field)
            .map(|criterion| criterion.direction);
        let next = SortDirection::cycle(current);
        match next {
            Some(direction) => {
                self.header_sort
                    .insert(self.mode, SortCriterion { field, direction });
            }
            None => {
                self.header_sort.remove(&self.mode);
            }
        }
        Ok(next)
    }

    /// Column popup filter of the active view; an empty value clears it.
    pub fn set_column_filter(&mut self, field: Field, value: &str) -> Result<(), GridError> {
        self.ensure_in_view(field)?;
        let filters = self.column_filters.entry(self.mode).or_default();
        if value.is_empty() {
            filters.remove(&field);
        } else {
            filters.insert(field, value.to_string());
        }
        Ok(())
    }

    pub fn column_filter(&self, mode: ViewMode, field: Field) -> Option<&str> {
        self.column_filters
            .get(&mode)
            .and_then(|filters| filters.get(&field))
            .map(String::as_str)
    }

    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    fn header_sort_for(&self, mode: ViewMode, field: Field) -> Option<SortDirection> {
        self.header_sort
            .get(&mode)
            .filter(|criterion| criterion.field == field)
            .map(|criterion| criterion.direction)
    }

    pub fn headers(&self, mode: ViewMode) -> Vec<ColumnHeader> {
        let layout = self.layout(mode);
        layout
            .visible()
            .into_iter()
            .map(|field| ColumnHeader {
                field,
                header: field.header(),
                size: layout.size(field).unwrap_or_default(),
                sort: self.header_sort_for(mode, field),
                filter: self.column_filter(mode, field).map(str::to_string),
            })
            .collect()
    }

    pub fn grouped_view(&self) -> GroupedView {
        let mode = ViewMode::Grouped;
        let columns = self.headers(mode);
        let filters = self.column_filters.get(&mode);

        let mut contracts: Vec<&Contract> = self
            .nested
            .iter()
            .filter(|contract| {
                filters.is_none_or(|filters| {
                    filters
                        .iter()
                        .all(|(field, needle)| grouped_filter_matches(contract, *field, needle))
                })
            })
            .collect();
        if let Some(criterion) = self.header_sort.get(&mode) {
            let criteria = [*criterion];
            contracts.sort_by(|a, b| compare_by(&criteria, *a, *b));
        }

        let rows = contracts
            .into_iter()
            .map(|contract| GroupedRow {
                contract_id: contract.contract_id.clone(),
                expanded: self.is_expanded(&contract.contract_id),
                cells: columns
                    .iter()
                    .map(|column| {
                        contract
                            .value(column.field)
                            .map(|value| value.to_string())
                            .unwrap_or_default()
                    })
                    .collect(),
                tasks: contract
                    .tasks
                    .iter()
                    .map(|task| TaskRow {
                        task_id: task.task_id.clone(),
                        expanded: self.is_expanded(&task.task_id),
                        obligations: task.obligations.clone(),
                    })
                    .collect(),
            })
            .collect();

        GroupedView { columns, rows }
    }

    /// Flat rows as shown in `mode`: column filters applied, then the header
    /// sort on top of the dataset order.
    fn projected_rows(&self, mode: ViewMode) -> Vec<(usize, &FlatRecord)> {
        let filters = self.column_filters.get(&mode);
        let mut rows: Vec<(usize, &FlatRecord)> = self
            .flat
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                filters.is_none_or(|filters| {
                    filters
                        .iter()
                        .all(|(field, needle)| self.flat_filter_matches(record, *field, needle))
                })
            })
            .collect();
        if let Some(criterion) = self.header_sort.get(&mode) {
            let criteria = [*criterion];
            rows.sort_by(|a, b| compare_by(&criteria, a.1, b.1));
        }
        rows
    }

    fn flat_filter_matches(&self, record: &FlatRecord, field: Field, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let original = record
            .value(field)
            .map(|value| value.to_string().to_lowercase())
            .unwrap_or_default();
        let edited = self.overlay.cell_value(record, field).to_lowercase();
        original.contains(&needle) || edited.contains(&needle)
    }

    pub fn flat_view(&self) -> FlatView {
        let columns = self.headers(ViewMode::Flat);
        let rows = self
            .projected_rows(ViewMode::Flat)
            .into_iter()
            .map(|(index, record)| FlatRow {
                index,
                key: record.key().to_string(),
                cells: columns
                    .iter()
                    .map(|column| self.overlay.cell_value(record, column.field))
                    .collect(),
            })
            .collect();
        FlatView { columns, rows }
    }

    pub fn transposed_view(&self) -> TransposedView {
        let mode = ViewMode::Transposed;
        let records = self.projected_rows(mode);
        let rows = self
            .headers(mode)
            .into_iter()
            .map(|header| TransposedRow {
                field: header.field,
                header: header.header,
                height: header.size,
                sort: header.sort,
                filter: header.filter,
                cells: records
                    .iter()
                    .map(|(_, record)| self.overlay.cell_value(record, header.field))
                    .collect(),
            })
            .collect();

        TransposedView {
            record_keys: records
                .iter()
                .map(|(_, record)| record.key().to_string())
                .collect(),
            rows,
        }
    }

    pub fn view(&self) -> ViewSnapshot {
        match self.mode {
            ViewMode::Grouped => ViewSnapshot::Grouped(self.grouped_view()),
            ViewMode::Flat => ViewSnapshot::Flat(self.flat_view()),
            ViewMode::Transposed => ViewSnapshot::Transposed(self.transposed_view()),
        }
    }
}

/// Contract id popup filter: exact match, then digit containment
/// (`001` finds `CNT-2024-001`), then plain substring.
pub fn contract_id_matches(value: &str, needle: &str) -> bool {
    let value = value.to_lowercase();
    let needle = needle.to_lowercase();
    if value == needle {
        return true;
    }

    let needle_digits: String = needle.chars().filter(char::is_ascii_digit).collect();
    if !needle_digits.is_empty() {
        let value_digits: String = value.chars().filter(char::is_ascii_digit).collect();
        if value_digits.contains(&needle_digits) {
            return true;
        }
    }

    value.contains(&needle)
}

fn grouped_filter_matches(contract: &Contract, field: Field, needle: &str) -> bool {
    let value = contract
        .value(field)
        .map(|value| value.to_string())
        .unwrap_or_default();
    match field {
        Field::ContractId => contract_id_matches(&value, needle),
        Field::TaskCount => value == needle.trim(),
        _ => value.to_lowercase().contains(&needle.to_lowercase()),
    }
}
