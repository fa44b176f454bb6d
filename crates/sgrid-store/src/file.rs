//! Grid file lifecycle and record I/O.
//!
//! [`GridFile`] is an owned handle to one grid file on disk. Creating a
//! file writes its header and null-fills every cell; opening one parses the
//! header and re-plans the record layout from the declared field ranges.
//! All record I/O is row oriented: a partial row moves as one buffered
//! transfer, which is the performance path for survey-sized grids.
//!
//! The handle tracks a dirty flag instead of rewriting the header on every
//! write. `close` (or `Drop`, best effort) rewrites it once, with a fresh
//! modification date and the observed Z bounds. [`GridFile::update_header`]
//! is the exception and flushes immediately.
//!
//! One handle owns one file. Nothing here locks the file against other
//! processes; concurrent writers to the same path are the caller's contract
//! to prevent.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageMap;
use crate::endian::ByteOrder;
use crate::error::{Result, SgridError};
use crate::field::{FieldSet, RecordLayout};
use crate::geometry::GridGeometry;
use crate::header::{self, GridHeader};
use crate::record::{self, CellRecord};

/// Everything needed to create a grid file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    pub geometry: GridGeometry,
    pub fields: FieldSet,
    /// Name and version of the producing tool, recorded in the header.
    #[serde(default)]
    pub creation_software: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub distribution_statement: String,
    #[serde(default)]
    pub comments: String,
}

/// Header fields a caller may change on an open file.
///
/// `None` leaves a field as it is. Applying an update rewrites the header
/// immediately rather than waiting for close.
#[derive(Debug, Clone, Default)]
pub struct HeaderUpdate {
    pub classification: Option<String>,
    pub distribution_statement: Option<String>,
    pub comments: Option<String>,
    /// Overrides the tracked observed Z bounds.
    pub observed_z: Option<(f64, f64)>,
}

/// Deletes a partly written file unless disarmed.
struct RemoveOnDrop<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> RemoveOnDrop<'a> {
    fn new(path: &'a Path) -> RemoveOnDrop<'a> {
        RemoveOnDrop { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partly created grid file"
            );
        }
    }
}

/// An open grid file.
#[derive(Debug)]
pub struct GridFile {
    file: std::fs::File,
    path: PathBuf,
    header: GridHeader,
    layout: RecordLayout,
    readonly: bool,
    needs_swap: bool,
    dirty: bool,
    closed: bool,
    observed_z: Option<(f64, f64)>,
    coverage: Option<CoverageMap>,
}

impl GridFile {
    /// Create a grid file, replacing anything already at `path`.
    ///
    /// The header is written and every cell is filled with the null record,
    /// so the grid reads back as uniformly "no data". If creation fails
    /// partway the file is removed rather than left half-initialized.
    pub fn create(path: impl AsRef<Path>, config: &GridConfig) -> Result<GridFile> {
        let path = path.as_ref();
        config
            .geometry
            .validate()
            .map_err(SgridError::invalid_config)?;
        config
            .fields
            .validate()
            .map_err(SgridError::invalid_config)?;
        if !config.fields.z.is_active() {
            return Err(SgridError::invalid_config(
                "a grid file needs an active z field",
            ));
        }
        let layout = RecordLayout::plan(&config.fields);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SgridError::CreateFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let mut guard = RemoveOnDrop::new(path);

        let header = GridHeader::for_new_file(
            config.geometry,
            config.fields,
            layout.record_size,
            config.creation_software.clone(),
            config.classification.clone(),
            config.distribution_statement.clone(),
            config.comments.clone(),
        );
        let block = header::encode(&header)?;
        file.write_all(&block)
            .map_err(|source| SgridError::HeaderWriteFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let stride = header.record_size as usize;
        let mut row = vec![0u8; stride * config.geometry.width as usize];
        let null = CellRecord::null_record(&config.fields);
        for col in 0..config.geometry.width as usize {
            record::encode_record(&config.fields, &layout, &null, &mut row, col * stride * 8)?;
        }
        for _ in 0..config.geometry.height {
            file.write_all(&row)
                .map_err(|source| SgridError::CreateFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        guard.disarm();
        tracing::debug!(
            path = %path.display(),
            width = config.geometry.width,
            height = config.geometry.height,
            record_size = layout.record_size,
            "Created grid file"
        );

        Ok(GridFile {
            file,
            path: path.to_path_buf(),
            header,
            layout,
            readonly: false,
            needs_swap: false,
            dirty: false,
            closed: false,
            observed_z: None,
            coverage: None,
        })
    }

    /// Open an existing grid file for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<GridFile> {
        Self::open_with(path.as_ref(), false)
    }

    /// Open an existing grid file for reading only. Writes and header
    /// updates through the handle are refused.
    pub fn open_readonly(path: impl AsRef<Path>) -> Result<GridFile> {
        Self::open_with(path.as_ref(), true)
    }

    fn open_with(path: &Path, readonly: bool) -> Result<GridFile> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(!readonly)
            .open(path)
            .map_err(|source| SgridError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut block = vec![0u8; header::HEADER_SIZE as usize];
        let mut filled = 0;
        while filled < block.len() {
            match file.read(&mut block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(SgridError::OpenFailed {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }
        let header = header::parse(path, &block[..filled])?;
        let layout = RecordLayout::plan(&header.fields);
        let needs_swap = header.byte_order != ByteOrder::native();

        tracing::debug!(
            path = %path.display(),
            width = header.geometry.width,
            height = header.geometry.height,
            record_size = header.record_size,
            readonly,
            "Opened grid file"
        );

        Ok(GridFile {
            file,
            path: path.to_path_buf(),
            observed_z: header.observed_z,
            header,
            layout,
            readonly,
            needs_swap,
            dirty: false,
            closed: false,
            coverage: None,
        })
    }

    /// Close the file, rewriting the header first if anything was written.
    ///
    /// Dropping the handle flushes too, but only here can a flush failure
    /// be reported.
    pub fn close(mut self) -> Result<()> {
        let result = if self.dirty && !self.readonly {
            self.flush_header()
        } else {
            Ok(())
        };
        self.closed = true;
        result
    }

    /// Path this handle was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed header, including any unknown keys being carried along.
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.header.geometry
    }

    pub fn fields(&self) -> &FieldSet {
        &self.header.fields
    }

    /// The record layout planned from the declared field ranges.
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Declared record stride in bytes. At least `layout().record_size`;
    /// larger when the file was written by a version with more fields.
    pub fn record_size(&self) -> u32 {
        self.header.record_size
    }

    /// Whether the file was written on a machine of the opposite byte
    /// order. The packed records themselves are byte-order invariant; this
    /// is informational for tools that embed native-endian payloads.
    pub fn needs_swap(&self) -> bool {
        self.needs_swap
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Whether the header will be rewritten at close.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Min/max of non-null Z values: the union of what the header recorded
    /// and what was written through this handle.
    pub fn observed_z(&self) -> Option<(f64, f64)> {
        self.observed_z
    }

    fn check_row(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.header.geometry.height {
            return Err(SgridError::InvalidCoordinate {
                row: row as i64,
                col: col as i64,
                width: self.header.geometry.width,
                height: self.header.geometry.height,
            });
        }
        Ok(())
    }

    fn row_offset(&self, row: u32, col: u32) -> u64 {
        let cell = row as u64 * self.header.geometry.width as u64 + col as u64;
        self.header.header_size as u64 + cell * self.header.record_size as u64
    }

    /// Files from a newer minor version may carry record bits this library
    /// does not know about; those writes must fold into the existing bytes.
    fn preserve_unknown_bits(&self) -> bool {
        self.header.newer_minor || self.header.record_size > self.layout.record_size
    }

    /// Read `len` records of one row, starting at `start_col`.
    pub fn read_row(&mut self, row: u32, start_col: u32, len: u32) -> Result<Vec<CellRecord>> {
        self.check_row(row, start_col)?;
        self.header.geometry.check_span(start_col, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let stride = self.header.record_size as usize;
        let mut buf = vec![0u8; stride * len as usize];
        let offset = self.row_offset(row, start_col);
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.read_exact(&mut buf))
            .map_err(|source| SgridError::RecordReadFailed {
                path: self.path.clone(),
                row,
                col: start_col,
                source,
            })?;

        let mut records = Vec::with_capacity(len as usize);
        for i in 0..len as usize {
            records.push(record::decode_record(
                &self.header.fields,
                &self.layout,
                &buf,
                i * stride * 8,
            ));
        }
        Ok(records)
    }

    /// Write consecutive records of one row, starting at `start_col`, as a
    /// single buffered transfer.
    ///
    /// A record that fails range checking aborts the whole call before any
    /// byte reaches the file.
    pub fn write_row(&mut self, row: u32, start_col: u32, records: &[CellRecord]) -> Result<()> {
        if self.readonly {
            return Err(SgridError::RecordWriteFailed {
                path: self.path.clone(),
                row,
                col: start_col,
                source: std::io::Error::new(
                    ErrorKind::PermissionDenied,
                    "file is open read-only",
                ),
            });
        }
        self.check_row(row, start_col)?;
        let len = u32::try_from(records.len()).unwrap_or(u32::MAX);
        self.header.geometry.check_span(start_col, len)?;
        if records.is_empty() {
            return Ok(());
        }

        let stride = self.header.record_size as usize;
        let offset = self.row_offset(row, start_col);
        let mut buf = vec![0u8; stride * records.len()];
        if self.preserve_unknown_bits() {
            self.file
                .seek(SeekFrom::Start(offset))
                .and_then(|_| self.file.read_exact(&mut buf))
                .map_err(|source| SgridError::RecordWriteFailed {
                    path: self.path.clone(),
                    row,
                    col: start_col,
                    source,
                })?;
        }
        for (i, rec) in records.iter().enumerate() {
            record::encode_record(&self.header.fields, &self.layout, rec, &mut buf, i * stride * 8)?;
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(&buf))
            .map_err(|source| SgridError::RecordWriteFailed {
                path: self.path.clone(),
                row,
                col: start_col,
                source,
            })?;

        self.dirty = true;
        for (i, rec) in records.iter().enumerate() {
            if !rec.is_null(&self.header.fields) {
                self.track_observed(rec.z as f64);
            }
            if let Some(map) = &mut self.coverage {
                map.set(row, start_col + i as u32, rec.status);
            }
        }
        Ok(())
    }

    /// Read one cell.
    pub fn read_record(&mut self, row: u32, col: u32) -> Result<CellRecord> {
        self.header.geometry.check_cell(row, col)?;
        let records = self.read_row(row, col, 1)?;
        Ok(records[0])
    }

    /// Write one cell.
    pub fn write_record(&mut self, row: u32, col: u32, record: &CellRecord) -> Result<()> {
        self.header.geometry.check_cell(row, col)?;
        self.write_row(row, col, std::slice::from_ref(record))
    }

    /// Read the cell nearest to a geographic position.
    pub fn read_record_at(&mut self, lat: f64, lon: f64) -> Result<CellRecord> {
        let (row, col) = self.header.geometry.locate(lat, lon)?;
        self.read_record(row, col)
    }

    /// Write the cell nearest to a geographic position.
    pub fn write_record_at(&mut self, lat: f64, lon: f64, record: &CellRecord) -> Result<()> {
        let (row, col) = self.header.geometry.locate(lat, lon)?;
        self.write_record(row, col, record)
    }

    /// Apply a header update and rewrite the header immediately.
    pub fn update_header(&mut self, update: HeaderUpdate) -> Result<()> {
        if self.readonly {
            return Err(SgridError::HeaderWriteFailed {
                path: self.path.clone(),
                source: std::io::Error::new(
                    ErrorKind::PermissionDenied,
                    "file is open read-only",
                ),
            });
        }
        if let Some(classification) = update.classification {
            self.header.classification = classification;
        }
        if let Some(statement) = update.distribution_statement {
            self.header.distribution_statement = statement;
        }
        if let Some(comments) = update.comments {
            self.header.comments = comments;
        }
        if let Some(bounds) = update.observed_z {
            self.observed_z = Some(bounds);
        }
        self.flush_header()
    }

    /// Build the coverage map with one full scan of the grid. Calling it
    /// again while the map is open is a no-op.
    pub fn open_coverage(&mut self) -> Result<()> {
        if self.coverage.is_some() {
            return Ok(());
        }
        let width = self.header.geometry.width;
        let height = self.header.geometry.height;
        let mut map = CoverageMap::with_dimensions(width, height);
        for row in 0..height {
            let records = self.read_row(row, 0, width)?;
            for (col, rec) in records.iter().enumerate() {
                map.set(row, col as u32, rec.status);
            }
        }
        self.coverage = Some(map);
        tracing::debug!(path = %self.path.display(), "Built coverage map");
        Ok(())
    }

    /// Free the coverage map.
    pub fn close_coverage(&mut self) {
        self.coverage = None;
    }

    /// The cached status nibble of a cell, without touching the file.
    ///
    /// The map must have been built with [`GridFile::open_coverage`];
    /// writes through this handle keep it current.
    pub fn coverage(&self, row: u32, col: u32) -> Result<u8> {
        self.header.geometry.check_cell(row, col)?;
        match &self.coverage {
            Some(map) => Ok(map.get(row, col)),
            None => Err(SgridError::NoCoverageMap {
                path: self.path.clone(),
            }),
        }
    }

    fn track_observed(&mut self, z: f64) {
        self.observed_z = Some(match self.observed_z {
            Some((lo, hi)) => (lo.min(z), hi.max(z)),
            None => (z, z),
        });
    }

    fn flush_header(&mut self) -> Result<()> {
        self.header.modification_date = Utc::now();
        self.header.observed_z = self.observed_z;
        let block = header::encode(&self.header)?;
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(&block))
            .map_err(|source| SgridError::HeaderWriteFailed {
                path: self.path.clone(),
                source,
            })?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for GridFile {
    fn drop(&mut self) {
        if self.closed || !self.dirty || self.readonly {
            return;
        }
        if let Err(e) = self.flush_header() {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to flush header while dropping handle"
            );
        }
    }
}
