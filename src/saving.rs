use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use crate::error::GridError;
use crate::grid::GridState;

/// A saved session: datasets, overlay and layouts, stamped with the save time.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Snapshot {
    /// RFC 3339 timestamp.
    pub saved_at: String,
    pub grid: GridState,
}

impl Snapshot {
    pub fn new(grid: GridState) -> Self {
        Snapshot {
            saved_at: Utc::now().to_rfc3339(),
            grid,
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.saved_at)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }
}

fn write_snapshot<W: Write>(snapshot: &Snapshot, sink: W) -> Result<(), GridError> {
    let encoder = GzEncoder::new(sink, Compression::default());
    let mut writer = BufWriter::new(encoder);
    serialize_into(&mut writer, snapshot)?;
    let encoder = writer
        .into_inner()
        .map_err(|e| GridError::Io(e.into_error()))?;
    encoder.finish()?;
    Ok(())
}

pub fn save_snapshot(grid: &GridState, path: &Path) -> Result<Snapshot, GridError> {
    let snapshot = Snapshot::new(grid.clone());
    let file = File::create(path)?;
    write_snapshot(&snapshot, file)?;
    info!("saved snapshot to {}", path.display());
    Ok(snapshot)
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, GridError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(GzDecoder::new(file));
    let snapshot: Snapshot = deserialize_from(&mut reader)?;
    info!(
        "loaded snapshot from {} (saved {})",
        path.display(),
        snapshot.saved_at
    );
    Ok(snapshot)
}

/// In-memory variant for downloads.
pub fn to_bytes(grid: &GridState) -> Result<Vec<u8>, GridError> {
    let mut buffer = Vec::new();
    write_snapshot(&Snapshot::new(grid.clone()), &mut buffer)?;
    Ok(buffer)
}

pub fn from_bytes(bytes: &[u8]) -> Result<Snapshot, GridError> {
    let mut reader = BufReader::new(GzDecoder::new(Cursor::new(bytes)));
    Ok(deserialize_from(&mut reader)?)
}
