//! Common test fixtures for survey-grid tests.
//!
//! This module provides pre-defined grid extents and field declarations
//! that represent common scenarios in survey data processing.

/// Common grid extents for testing.
///
/// An extent carries the anchor, cell sizes, and dimensions — the same
/// shape a grid file is created from. The east and north edges are always
/// derived, never part of a fixture.
pub mod extent {
    /// Extent of a test grid.
    #[derive(Debug, Clone, Copy)]
    pub struct Extent {
        pub west: f64,
        pub south: f64,
        pub lon_cell_size: f64,
        pub lat_cell_size: f64,
        pub width: u32,
        pub height: u32,
    }

    impl Extent {
        /// Total number of cells.
        pub fn size(&self) -> u64 {
            self.width as u64 * self.height as u64
        }

        /// Derived eastern edge.
        pub fn east(&self) -> f64 {
            self.west + self.width as f64 * self.lon_cell_size
        }

        /// Derived northern edge.
        pub fn north(&self) -> f64 {
            self.south + self.height as f64 * self.lat_cell_size
        }
    }

    /// The 10x5 harbor grid used throughout the test suite
    /// (west=0, south=0, 0.01 degree cells, so east=0.1 and north=0.05).
    pub const HARBOR_10X5: Extent = Extent {
        west: 0.0,
        south: 0.0,
        lon_cell_size: 0.01,
        lat_cell_size: 0.01,
        width: 10,
        height: 5,
    };

    /// A single-cell grid (degenerate but valid).
    pub const SINGLE_CELL: Extent = Extent {
        west: -45.0,
        south: 30.0,
        lon_cell_size: 0.001,
        lat_cell_size: 0.001,
        width: 1,
        height: 1,
    };

    /// A channel survey: long and narrow, anchored in the western
    /// hemisphere.
    pub const CHANNEL_200X8: Extent = Extent {
        west: -76.4,
        south: 36.9,
        lon_cell_size: 0.0001,
        lat_cell_size: 0.0001,
        width: 200,
        height: 8,
    };

    /// Large enough that per-record I/O would be noticeably slow; tests of
    /// the row-buffered path use this one.
    pub const SHEET_512X256: Extent = Extent {
        west: 10.0,
        south: 55.0,
        lon_cell_size: 0.0005,
        lat_cell_size: 0.0005,
        width: 512,
        height: 256,
    };
}

/// Common field range declarations for testing.
pub mod ranges {
    /// Range declaration: `(min, max, scale)`.
    pub type Range = (f64, f64, f64);

    /// Depth/elevation at centimetre precision over a +-500 m range.
    pub const Z_CENTIMETER: Range = (-500.0, 500.0, 100.0);

    /// Depth at decimetre precision for coarse reconnaissance grids.
    pub const Z_DECIMETER: Range = (-12000.0, 12000.0, 10.0);

    /// Uncertainty fields: 0 to 100 m at centimetre precision.
    pub const UNCERTAINTY_CENTIMETER: Range = (0.0, 100.0, 100.0);

    /// Datum/ellipsoid separations: +-200 m at millimetre precision.
    pub const SEPARATION_MILLIMETER: Range = (-200.0, 200.0, 1000.0);

    /// Bit width of the status field in every fixture file.
    pub const STATUS_BITS: u32 = 4;

    /// Sounding-count ceiling used by fixture files (10 bits).
    pub const MAX_POINT_COUNT: u32 = 1023;
}

/// Provenance strings for fixture headers.
pub mod provenance {
    pub const CREATION_SOFTWARE: &str = "sgrid test suite";
    pub const CLASSIFICATION: &str = "UNCLASSIFIED";
    pub const DISTRIBUTION: &str =
        "Approved for public release.\nDistribution unlimited.";
    pub const COMMENTS: &str = "synthetic fixture data";
}
