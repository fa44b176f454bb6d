//! Bit-packed storage for gridded survey data.
//!
//! A survey grid file holds one record per cell of a geographic grid:
//! elevation/depth, uncertainties, status flags, and sounding counts. The
//! file is self-describing — a textual header declares the grid geometry
//! and the range, precision, and scale of every field — and the records are
//! bit-packed to exactly the widths those declarations require, so a grid
//! that needs 59 bits per cell spends 8 bytes, not 32.
//!
//! The format is designed to be read by versions of this library other than
//! the one that wrote it: header keys and record fields are append-only,
//! unknown header keys are preserved across rewrites, and the declared
//! record stride is honored even when it exceeds what the known fields
//! need.
//!
//! # Example
//!
//! ```ignore
//! use sgrid_store::{CellRecord, FieldSet, GridConfig, GridFile, GridGeometry, QuantSpec, status};
//!
//! let config = GridConfig {
//!     geometry: GridGeometry {
//!         west: 0.0,
//!         south: 0.0,
//!         lat_cell_size: 0.01,
//!         lon_cell_size: 0.01,
//!         width: 10,
//!         height: 5,
//!     },
//!     fields: FieldSet {
//!         z: QuantSpec::new(-500.0, 500.0, 100.0),
//!         status_bits: 4,
//!         ..FieldSet::default()
//!     },
//!     creation_software: "survey-tool 1.0".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut grid = GridFile::create("harbor.sgrid", &config)?;
//! grid.write_record(2, 3, &CellRecord {
//!     z: 12.34,
//!     status: status::REAL,
//!     ..CellRecord::default()
//! })?;
//! grid.close()?;
//!
//! let mut grid = GridFile::open_readonly("harbor.sgrid")?;
//! let rec = grid.read_record(2, 3)?;
//! assert!((rec.z - 12.34).abs() <= 0.005);
//! ```

pub mod bitpack;
mod coverage;
pub mod endian;
pub mod error;
pub mod field;
pub mod file;
pub mod geometry;
pub mod header;
pub mod quant;
pub mod record;

pub use endian::ByteOrder;
pub use error::{Result, SgridError};
pub use field::{FieldKind, FieldLayout, FieldSet, QuantSpec, RecordLayout};
pub use file::{GridConfig, GridFile, HeaderUpdate};
pub use geometry::GridGeometry;
pub use header::{GridHeader, FORMAT_MAJOR, FORMAT_MINOR, HEADER_SIZE};
pub use record::{status, CellRecord};
