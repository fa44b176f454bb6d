//! Shared helpers for the sgrid-store integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use sgrid_store::header::HEADER_SIZE;
use sgrid_store::{FieldSet, GridConfig, GridGeometry, QuantSpec};
use test_utils::extent::Extent;
use test_utils::{provenance, ranges};

fn quant(range: ranges::Range) -> QuantSpec {
    let (min, max, scale) = range;
    QuantSpec::new(min, max, scale)
}

/// The field declarations most tests create files with: centimetre Z,
/// centimetre uncertainties, four status bits, 10-bit sounding counts,
/// separations inactive.
pub fn survey_fields() -> FieldSet {
    FieldSet {
        z: quant(ranges::Z_CENTIMETER),
        horizontal_uncertainty: quant(ranges::UNCERTAINTY_CENTIMETER),
        vertical_uncertainty: quant(ranges::UNCERTAINTY_CENTIMETER),
        status_bits: ranges::STATUS_BITS,
        total_uncertainty: QuantSpec::inactive(),
        max_point_count: ranges::MAX_POINT_COUNT,
        datum_separation: QuantSpec::inactive(),
        ellipsoid_separation: QuantSpec::inactive(),
    }
}

pub fn geometry_for(extent: Extent) -> GridGeometry {
    GridGeometry {
        west: extent.west,
        south: extent.south,
        lat_cell_size: extent.lat_cell_size,
        lon_cell_size: extent.lon_cell_size,
        width: extent.width,
        height: extent.height,
    }
}

/// A full creation config over one of the fixture extents.
pub fn config_for(extent: Extent) -> GridConfig {
    GridConfig {
        geometry: geometry_for(extent),
        fields: survey_fields(),
        creation_software: provenance::CREATION_SOFTWARE.to_string(),
        classification: provenance::CLASSIFICATION.to_string(),
        distribution_statement: provenance::DISTRIBUTION.to_string(),
        comments: provenance::COMMENTS.to_string(),
    }
}

/// Replace text inside a file's header block, keeping the block size fixed.
///
/// Panics if the pattern is absent, so a typo in a test fails loudly
/// instead of silently testing nothing.
pub fn patch_header(path: &Path, from: &str, to: &str) {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .unwrap();
    let mut block = vec![0u8; HEADER_SIZE as usize];
    file.read_exact(&mut block).unwrap();
    let text = String::from_utf8(block).unwrap();
    // Drop the space padding so an insertion has room to grow the text.
    let text = text.trim_end_matches(' ');
    let mut patched = text.replace(from, to);
    assert_ne!(patched, text, "pattern {from:?} not found in header");
    assert!(
        patched.len() <= HEADER_SIZE as usize,
        "patched header no longer fits its block"
    );
    while patched.len() < HEADER_SIZE as usize {
        patched.push(' ');
    }
    file.seek(SeekFrom::Start(0)).unwrap();
    file.write_all(patched.as_bytes()).unwrap();
}
