/*!
# Obligation Grid

A data grid over mock contract compliance data, built in Rust: contracts own
tasks, tasks own obligations, and the same records can be browsed grouped,
flat or transposed.

## Overview

The dataset is generated once per session and cached in session storage so
that reloading never reshuffles rows. Filtering and sorting run once, in a
single engine, and feed all three views; the views only decide how the rows
are laid out. Inline edits and remarks live in an overlay keyed by a stable
row identity, so they stay attached to their record through any filter or
sort.

## Architecture

### Data Layer
- **model**: Contract, Task, Obligation and the flat record; `Field` names
  every column and knows its kind (id, numeric, enum, text)
- **generator**: Seeded mock data (`CNT-2024-001`, `T001`, ...)
- **flatten**: Nested contracts to one row per obligation

### Engines
- **filter**: Rule evaluation and routing by field level (contract fields keep
  or drop whole contracts, the rest keep or drop tasks)
- **sort**: Multi-key, type-aware, stable sorting of both representations

### View Layer
- **grid**: `GridState`, the single source of truth, plus the grouped, flat
  and transposed projections with per-view header sort and column filters
- **layout**: Column order, visibility and sizes per view
- **interaction**: Drag and resize gestures as state machines; editable
  criteria lists
- **session**: Session storage abstraction and the edit overlay

### Outer Surfaces
- **saving**: Whole-session snapshots with Gzip compression and bincode
- **downloader**: CSV and XLSX export of the flat view
- **config**: Server settings from defaults, environment and arguments
- **app**: axum routes (feature `web`)

## Semantics Worth Knowing

- Applying an empty filter list restores the full dataset; applying an empty
  sort list keeps the current order
- Filtering always starts over from the pristine data, so it drops a previous
  sort
- Switching views never touches the data

## REST API Endpoints

- `GET /api/view` - Current view as JSON
- `POST /api/view/mode` - Switch view
- `POST /api/filter`, `POST /api/sort` - Apply criteria lists
- `POST /api/columns/{reorder,resize,visibility,sort,filter}` - Column state
- `POST /api/rows/expand` - Expand or collapse a grouped row
- `POST /api/edit`, `POST /api/remarks` - Inline edits
- `GET /api/export/{csv,xlsx}` - Download the flat view
- `POST /api/save`, `POST /api/load` - Session snapshots
*/

pub mod config;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod generator;
pub mod grid;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod saving;
pub mod session;
pub mod sort;

#[cfg(feature = "web")]
pub mod app;

pub use config::AppConfig;
pub use error::GridError;
pub use filter::{FilterCriterion, FilterOperator};
pub use grid::{GridState, ViewSnapshot};
pub use layout::{ColumnLayout, ViewMode};
pub use model::{Compliance, Contract, Criticality, Field, FlatRecord, Obligation, RowKey, Task};
pub use session::{EditOverlay, MemoryStore, SessionStore};
pub use sort::{SortCriterion, SortDirection};
