//! Grid geometry and cell addressing.
//!
//! A grid is a rectangle of nodes anchored at its south-west corner. Row 0
//! is the southernmost row, column 0 the westernmost column, and the east
//! and north edges are always derived from the anchor, the cell sizes and
//! the dimensions, never stored independently.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SgridError};

/// Placement and dimensions of a grid in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Western edge in degrees.
    pub west: f64,
    /// Southern edge in degrees.
    pub south: f64,
    /// Cell size along the latitude axis, in degrees.
    pub lat_cell_size: f64,
    /// Cell size along the longitude axis, in degrees.
    pub lon_cell_size: f64,
    /// Cells per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridGeometry {
    /// Eastern edge, derived from the western edge and the grid width.
    pub fn east(&self) -> f64 {
        self.west + self.width as f64 * self.lon_cell_size
    }

    /// Northern edge, derived from the southern edge and the grid height.
    pub fn north(&self) -> f64 {
        self.south + self.height as f64 * self.lat_cell_size
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check the geometry invariants, returning the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "grid dimensions {}x{} must be non-zero",
                self.width, self.height
            ));
        }
        if !self.west.is_finite() || !self.south.is_finite() {
            return Err("grid anchor is not finite".to_string());
        }
        if !(self.lat_cell_size > 0.0) || !(self.lon_cell_size > 0.0) {
            return Err(format!(
                "cell sizes {}x{} must be positive",
                self.lon_cell_size, self.lat_cell_size
            ));
        }
        if !self.lat_cell_size.is_finite() || !self.lon_cell_size.is_finite() {
            return Err("cell sizes are not finite".to_string());
        }
        Ok(())
    }

    /// Geographic position of a grid node.
    pub fn node_position(&self, row: u32, col: u32) -> (f64, f64) {
        (
            self.south + row as f64 * self.lat_cell_size,
            self.west + col as f64 * self.lon_cell_size,
        )
    }

    /// Grid cell nearest to a geographic position.
    ///
    /// Rounds to the nearest node, so positions up to half a cell outside
    /// the anchored edges still land on the border row or column. Anything
    /// farther out is an [`SgridError::InvalidCoordinate`].
    pub fn locate(&self, lat: f64, lon: f64) -> Result<(u32, u32)> {
        let row = ((lat - self.south) / self.lat_cell_size).round();
        let col = ((lon - self.west) / self.lon_cell_size).round();
        if !row.is_finite()
            || !col.is_finite()
            || row < 0.0
            || col < 0.0
            || row >= self.height as f64
            || col >= self.width as f64
        {
            return Err(SgridError::InvalidCoordinate {
                row: if row.is_finite() { row as i64 } else { i64::MIN },
                col: if col.is_finite() { col as i64 } else { i64::MIN },
                width: self.width,
                height: self.height,
            });
        }
        Ok((row as u32, col as u32))
    }

    /// Reject cell indices outside the grid.
    pub fn check_cell(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(SgridError::InvalidCoordinate {
                row: row as i64,
                col: col as i64,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Reject a column span that runs off the end of a row.
    pub fn check_span(&self, start_col: u32, len: u32) -> Result<()> {
        if start_col as u64 + len as u64 > self.width as u64 {
            return Err(SgridError::InvalidRowRange {
                start: start_col,
                len,
                width: self.width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harbor_grid() -> GridGeometry {
        GridGeometry {
            west: 0.0,
            south: 0.0,
            lat_cell_size: 0.01,
            lon_cell_size: 0.01,
            width: 10,
            height: 5,
        }
    }

    #[test]
    fn test_east_and_north_are_derived() {
        let geo = harbor_grid();
        assert!((geo.east() - 0.1).abs() < 1e-12);
        assert!((geo.north() - 0.05).abs() < 1e-12);
        assert_eq!(geo.cell_count(), 50);
    }

    #[test]
    fn test_node_position_walks_from_south_west() {
        let geo = harbor_grid();
        assert_eq!(geo.node_position(0, 0), (0.0, 0.0));
        let (lat, lon) = geo.node_position(2, 3);
        assert!((lat - 0.02).abs() < 1e-12);
        assert!((lon - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_locate_rounds_to_nearest_node() {
        let geo = harbor_grid();
        assert_eq!(geo.locate(0.02, 0.03).unwrap(), (2, 3));
        // Offsets under half a cell snap to the same node.
        assert_eq!(geo.locate(0.024, 0.026).unwrap(), (2, 3));
        assert_eq!(geo.locate(0.016, 0.034).unwrap(), (2, 3));
        // Just outside the south-west corner still rounds onto the grid.
        assert_eq!(geo.locate(-0.004, -0.004).unwrap(), (0, 0));
    }

    #[test]
    fn test_locate_rejects_positions_off_the_grid() {
        let geo = harbor_grid();
        let err = geo.locate(-0.2, 0.0).unwrap_err();
        match err {
            SgridError::InvalidCoordinate { row, col, .. } => {
                assert_eq!(row, -20);
                assert_eq!(col, 0);
            }
            other => panic!("expected InvalidCoordinate, got {other}"),
        }
        // The northern edge itself belongs to no row (rows stop at height-1).
        assert!(geo.locate(0.05, 0.0).is_err());
        assert!(geo.locate(0.0, 0.1).is_err());
    }

    #[test]
    fn test_check_cell_bounds() {
        let geo = harbor_grid();
        assert!(geo.check_cell(4, 9).is_ok());
        assert!(geo.check_cell(5, 0).is_err());
        assert!(geo.check_cell(0, 10).is_err());
    }

    #[test]
    fn test_check_span_bounds() {
        let geo = harbor_grid();
        assert!(geo.check_span(0, 10).is_ok());
        assert!(geo.check_span(9, 1).is_ok());
        assert!(geo.check_span(9, 2).is_err());
        match geo.check_span(4, 7).unwrap_err() {
            SgridError::InvalidRowRange { start, len, width } => {
                assert_eq!((start, len, width), (4, 7, 10));
            }
            other => panic!("expected InvalidRowRange, got {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_degenerate_grids() {
        let mut geo = harbor_grid();
        geo.width = 0;
        assert!(geo.validate().is_err());

        let mut geo = harbor_grid();
        geo.lat_cell_size = 0.0;
        assert!(geo.validate().is_err());

        let mut geo = harbor_grid();
        geo.lon_cell_size = f64::NAN;
        assert!(geo.validate().is_err());

        assert!(harbor_grid().validate().is_ok());
    }
}
