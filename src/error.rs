use thiserror::Error;

use crate::layout::ViewMode;
use crate::model::Field;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("session data error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("row {0} is out of range")]
    UnknownRow(usize),

    #[error("invalid row key `{0}`")]
    UnknownRowKey(String),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("column `{0}` is not part of the {1} view")]
    ColumnNotInView(Field, ViewMode),

    #[error("position {0} is out of range")]
    InvalidPosition(usize),

    #[error("invalid view mode `{0}`")]
    UnknownViewMode(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("invalid snapshot name `{0}`")]
    InvalidSnapshotName(String),
}
