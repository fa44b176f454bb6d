//! Textual header codec.
//!
//! The header is a block of ASCII lines at the start of every grid file:
//! one `[KEY] = value` line per scalar, `{KEY =` ... `}` bracketed blocks
//! for free text, an `[END OF HEADER]` sentinel, then space padding out to
//! the reserved header size. Records start at that size, so the header can
//! be rewritten in place without moving data.
//!
//! Forward compatibility rests on three rules. Keys this library does not
//! recognize are kept verbatim and re-emitted on rewrite, so an older
//! writer never strips what a newer one added. The declared `[RECORD SIZE]`
//! is authoritative for record addressing, so appended fields widen the
//! stride without breaking older readers. And the version banner separates
//! "refuse" (newer major) from "read what you understand" (newer minor).

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::endian::ByteOrder;
use crate::error::{Result, SgridError};
use crate::field::{FieldKind, FieldSet, QuantSpec, RecordLayout};
use crate::geometry::GridGeometry;

/// Bytes reserved for the header block in files this library creates.
pub const HEADER_SIZE: u32 = 16384;

/// Format major version. A file with a newer major is refused.
pub const FORMAT_MAJOR: u32 = 1;

/// Format minor version. A file with a newer minor is readable and safely
/// writable; its extra header keys and record bits are preserved.
pub const FORMAT_MINOR: u32 = 2;

const BANNER_PREFIX: &str = "[VERSION] = SGRID library V";
const END_SENTINEL: &str = "[END OF HEADER]";

const KEY_ENDIAN: &str = "ENDIAN";
const KEY_CREATION_DATE: &str = "CREATION DATE";
const KEY_MODIFICATION_DATE: &str = "MODIFICATION DATE";
const KEY_CLASSIFICATION: &str = "CLASSIFICATION";
const KEY_CREATION_SOFTWARE: &str = "CREATION SOFTWARE";
const KEY_HEADER_SIZE: &str = "HEADER SIZE";
const KEY_RECORD_SIZE: &str = "RECORD SIZE";
const KEY_WIDTH: &str = "WIDTH";
const KEY_HEIGHT: &str = "HEIGHT";
const KEY_WEST: &str = "WEST LONGITUDE";
const KEY_SOUTH: &str = "SOUTH LATITUDE";
const KEY_EAST: &str = "EAST LONGITUDE";
const KEY_NORTH: &str = "NORTH LATITUDE";
const KEY_LON_CELL: &str = "LON CELL SIZE";
const KEY_LAT_CELL: &str = "LAT CELL SIZE";
const KEY_OBSERVED_MIN_Z: &str = "OBSERVED MIN Z";
const KEY_OBSERVED_MAX_Z: &str = "OBSERVED MAX Z";
const KEY_STATUS_BITS: &str = "STATUS BITS";
const KEY_MAX_POINTS: &str = "MAX NUMBER OF POINTS";
const BLOCK_DISTRIBUTION: &str = "DISTRIBUTION STATEMENT";
const BLOCK_COMMENTS: &str = "COMMENTS";

/// Parsed contents of a grid file header.
#[derive(Debug, Clone)]
pub struct GridHeader {
    /// Format version declared by the file's writer.
    pub version_major: u32,
    pub version_minor: u32,
    /// Byte order of the process that wrote the file.
    pub byte_order: ByteOrder,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
    pub creation_software: String,
    pub classification: String,
    pub distribution_statement: String,
    pub comments: String,
    /// Reserved header block size; records start at this offset.
    pub header_size: u32,
    /// Declared record stride in bytes. Authoritative for addressing even
    /// when it exceeds the planned layout.
    pub record_size: u32,
    pub geometry: GridGeometry,
    pub fields: FieldSet,
    /// Observed min/max of non-null Z values, when the writer recorded them.
    pub observed_z: Option<(f64, f64)>,
    /// Header lines this library does not understand, verbatim, re-emitted
    /// on rewrite.
    pub unknown_lines: Vec<String>,
    /// Set when the file declares a newer minor version than this library.
    pub newer_minor: bool,
}

impl GridHeader {
    /// Assemble the header of a brand-new file.
    pub fn for_new_file(
        geometry: GridGeometry,
        fields: FieldSet,
        record_size: u32,
        creation_software: String,
        classification: String,
        distribution_statement: String,
        comments: String,
    ) -> GridHeader {
        let now = Utc::now();
        GridHeader {
            version_major: FORMAT_MAJOR,
            version_minor: FORMAT_MINOR,
            byte_order: ByteOrder::native(),
            creation_date: now,
            modification_date: now,
            creation_software,
            classification,
            distribution_statement,
            comments,
            header_size: HEADER_SIZE,
            record_size,
            geometry,
            fields,
            observed_z: None,
            unknown_lines: Vec::new(),
            newer_minor: false,
        }
    }
}

fn push_scalar(text: &mut String, key: &str, value: impl std::fmt::Display) {
    text.push_str(&format!("[{key}] = {value}\n"));
}

fn push_block(text: &mut String, key: &str, content: &str) {
    if content.is_empty() {
        return;
    }
    text.push_str(&format!("{{{key} =\n"));
    for line in content.lines() {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("}\n");
}

fn push_quant(text: &mut String, kind: FieldKind, spec: &QuantSpec) {
    let stem = kind.key_stem();
    push_scalar(text, &format!("{stem} MIN"), spec.min);
    push_scalar(text, &format!("{stem} MAX"), spec.max);
    push_scalar(text, &format!("{stem} SCALE"), spec.scale);
    if let Some(null) = spec.null_value {
        push_scalar(text, &format!("{stem} NULL VALUE"), null);
    }
}

/// Render a header into its on-disk block: text, sentinel, space padding
/// out to the reserved size.
pub fn encode(header: &GridHeader) -> Result<Vec<u8>> {
    let mut text = String::with_capacity(2048);

    text.push_str(&format!(
        "{BANNER_PREFIX}{}.{:02} - {}\n",
        header.version_major,
        header.version_minor,
        header.modification_date.format("%m/%d/%Y"),
    ));
    push_scalar(&mut text, KEY_ENDIAN, header.byte_order.as_str());
    push_scalar(
        &mut text,
        KEY_CREATION_DATE,
        header
            .creation_date
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    push_scalar(
        &mut text,
        KEY_MODIFICATION_DATE,
        header
            .modification_date
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    if !header.classification.is_empty() {
        push_scalar(&mut text, KEY_CLASSIFICATION, &header.classification);
    }
    if !header.creation_software.is_empty() {
        push_scalar(&mut text, KEY_CREATION_SOFTWARE, &header.creation_software);
    }
    push_scalar(&mut text, KEY_HEADER_SIZE, header.header_size);
    push_scalar(&mut text, KEY_RECORD_SIZE, header.record_size);
    push_scalar(&mut text, KEY_WIDTH, header.geometry.width);
    push_scalar(&mut text, KEY_HEIGHT, header.geometry.height);
    push_scalar(&mut text, KEY_WEST, header.geometry.west);
    push_scalar(&mut text, KEY_SOUTH, header.geometry.south);
    push_scalar(&mut text, KEY_EAST, header.geometry.east());
    push_scalar(&mut text, KEY_NORTH, header.geometry.north());
    push_scalar(&mut text, KEY_LON_CELL, header.geometry.lon_cell_size);
    push_scalar(&mut text, KEY_LAT_CELL, header.geometry.lat_cell_size);
    if let Some((min_z, max_z)) = header.observed_z {
        push_scalar(&mut text, KEY_OBSERVED_MIN_Z, min_z);
        push_scalar(&mut text, KEY_OBSERVED_MAX_Z, max_z);
    }
    push_quant(&mut text, FieldKind::Z, &header.fields.z);
    push_quant(
        &mut text,
        FieldKind::HorizontalUncertainty,
        &header.fields.horizontal_uncertainty,
    );
    push_quant(
        &mut text,
        FieldKind::VerticalUncertainty,
        &header.fields.vertical_uncertainty,
    );
    push_quant(
        &mut text,
        FieldKind::TotalUncertainty,
        &header.fields.total_uncertainty,
    );
    push_quant(
        &mut text,
        FieldKind::DatumSeparation,
        &header.fields.datum_separation,
    );
    push_quant(
        &mut text,
        FieldKind::EllipsoidSeparation,
        &header.fields.ellipsoid_separation,
    );
    push_scalar(&mut text, KEY_STATUS_BITS, header.fields.status_bits);
    push_scalar(&mut text, KEY_MAX_POINTS, header.fields.max_point_count);
    push_block(&mut text, BLOCK_DISTRIBUTION, &header.distribution_statement);
    push_block(&mut text, BLOCK_COMMENTS, &header.comments);
    for line in &header.unknown_lines {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(END_SENTINEL);
    text.push('\n');

    let reserved = header.header_size as usize;
    if text.len() > reserved {
        return Err(SgridError::invalid_config(format!(
            "header text is {} bytes; the reserved block holds {}",
            text.len(),
            reserved
        )));
    }
    let mut block = text.into_bytes();
    block.resize(reserved, b' ');
    Ok(block)
}

/// Attach a parsed attribute to its continuous field.
fn quant_slot(fields: &mut FieldSet, kind: FieldKind) -> Option<&mut QuantSpec> {
    match kind {
        FieldKind::Z => Some(&mut fields.z),
        FieldKind::HorizontalUncertainty => Some(&mut fields.horizontal_uncertainty),
        FieldKind::VerticalUncertainty => Some(&mut fields.vertical_uncertainty),
        FieldKind::TotalUncertainty => Some(&mut fields.total_uncertainty),
        FieldKind::DatumSeparation => Some(&mut fields.datum_separation),
        FieldKind::EllipsoidSeparation => Some(&mut fields.ellipsoid_separation),
        FieldKind::Status | FieldKind::PointCount => None,
    }
}

/// Match a `<FIELD> MIN|MAX|SCALE|NULL VALUE` key against the continuous
/// field stems.
fn field_key(key: &str) -> Option<(FieldKind, &str)> {
    for kind in [
        FieldKind::Z,
        FieldKind::HorizontalUncertainty,
        FieldKind::VerticalUncertainty,
        FieldKind::TotalUncertainty,
        FieldKind::DatumSeparation,
        FieldKind::EllipsoidSeparation,
    ] {
        if let Some(rest) = key.strip_prefix(kind.key_stem()) {
            if let Some(attr) = rest.strip_prefix(' ') {
                if matches!(attr, "MIN" | "MAX" | "SCALE" | "NULL VALUE") {
                    return Some((kind, attr));
                }
            }
        }
    }
    None
}

struct Scalars {
    byte_order: Option<ByteOrder>,
    creation_date: Option<DateTime<Utc>>,
    modification_date: Option<DateTime<Utc>>,
    classification: String,
    creation_software: String,
    header_size: Option<u32>,
    record_size: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    west: Option<f64>,
    south: Option<f64>,
    lon_cell: Option<f64>,
    lat_cell: Option<f64>,
    observed_min_z: Option<f64>,
    observed_max_z: Option<f64>,
    fields: FieldSet,
}

impl Scalars {
    fn new() -> Scalars {
        Scalars {
            byte_order: None,
            creation_date: None,
            modification_date: None,
            classification: String::new(),
            creation_software: String::new(),
            header_size: None,
            record_size: None,
            width: None,
            height: None,
            west: None,
            south: None,
            lon_cell: None,
            lat_cell: None,
            observed_min_z: None,
            observed_max_z: None,
            fields: FieldSet::default(),
        }
    }

    /// Consume one `[KEY] = value` pair. Returns false when the key is not
    /// one this library understands.
    fn apply(&mut self, path: &Path, key: &str, value: &str) -> Result<bool> {
        let parse_u32 = |v: &str| {
            v.parse::<u32>().map_err(|_| {
                SgridError::header_malformed(path, format!("bad value {v:?} for [{key}]"))
            })
        };
        let parse_f64 = |v: &str| {
            v.parse::<f64>().map_err(|_| {
                SgridError::header_malformed(path, format!("bad value {v:?} for [{key}]"))
            })
        };
        let parse_date = |v: &str| {
            DateTime::parse_from_rfc3339(v)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| {
                    SgridError::header_malformed(path, format!("bad date {v:?} for [{key}]"))
                })
        };

        if let Some((kind, attr)) = field_key(key) {
            let v = parse_f64(value)?;
            if let Some(q) = quant_slot(&mut self.fields, kind) {
                match attr {
                    "MIN" => q.min = v,
                    "MAX" => q.max = v,
                    "SCALE" => q.scale = v,
                    _ => q.null_value = Some(v),
                }
            }
            return Ok(true);
        }

        match key {
            KEY_ENDIAN => {
                self.byte_order = Some(ByteOrder::from_tag(value).ok_or_else(|| {
                    SgridError::header_malformed(
                        path,
                        format!("unrecognized byte order tag {value:?}"),
                    )
                })?);
            }
            KEY_CREATION_DATE => self.creation_date = Some(parse_date(value)?),
            KEY_MODIFICATION_DATE => self.modification_date = Some(parse_date(value)?),
            KEY_CLASSIFICATION => self.classification = value.to_string(),
            KEY_CREATION_SOFTWARE => self.creation_software = value.to_string(),
            KEY_HEADER_SIZE => self.header_size = Some(parse_u32(value)?),
            KEY_RECORD_SIZE => self.record_size = Some(parse_u32(value)?),
            KEY_WIDTH => self.width = Some(parse_u32(value)?),
            KEY_HEIGHT => self.height = Some(parse_u32(value)?),
            KEY_WEST => self.west = Some(parse_f64(value)?),
            KEY_SOUTH => self.south = Some(parse_f64(value)?),
            // East and north are derived from the anchor and dimensions;
            // the stored copies are informational.
            KEY_EAST | KEY_NORTH => {
                parse_f64(value)?;
            }
            KEY_LON_CELL => self.lon_cell = Some(parse_f64(value)?),
            KEY_LAT_CELL => self.lat_cell = Some(parse_f64(value)?),
            KEY_OBSERVED_MIN_Z => self.observed_min_z = Some(parse_f64(value)?),
            KEY_OBSERVED_MAX_Z => self.observed_max_z = Some(parse_f64(value)?),
            KEY_STATUS_BITS => self.fields.status_bits = parse_u32(value)?,
            KEY_MAX_POINTS => self.fields.max_point_count = parse_u32(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn require<T>(path: &Path, key: &str, slot: Option<T>) -> Result<T> {
        slot.ok_or_else(|| SgridError::header_malformed(path, format!("missing [{key}]")))
    }
}

/// Parse a header block.
///
/// `bytes` must start at the beginning of the file and reach at least to
/// the `[END OF HEADER]` sentinel; passing more (padding, record data) is
/// fine. The version banner is checked first, so a non-grid file fails
/// with [`SgridError::NotThisFormat`] before any key is interpreted.
pub fn parse(path: &Path, bytes: &[u8]) -> Result<GridHeader> {
    let mut lines = Vec::new();
    let mut pos = 0usize;
    for chunk in bytes.split(|&b| b == b'\n') {
        lines.push((pos, chunk));
        pos += chunk.len() + 1;
    }

    let text_line = |i: usize| -> Result<&str> {
        let (_, raw) = lines[i];
        std::str::from_utf8(raw)
            .map(|s| s.trim_end_matches('\r'))
            .map_err(|_| SgridError::header_malformed(path, format!("line {i} is not text")))
    };

    if lines.is_empty() {
        return Err(SgridError::NotThisFormat {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }

    // Banner and version gate.
    let banner = std::str::from_utf8(lines[0].1).unwrap_or("");
    let version = banner.strip_prefix(BANNER_PREFIX).ok_or_else(|| {
        SgridError::NotThisFormat {
            path: path.to_path_buf(),
            reason: "missing SGRID version banner".to_string(),
        }
    })?;
    let version = version.split_whitespace().next().unwrap_or("");
    let (major, minor) = version
        .split_once('.')
        .and_then(|(maj, min)| Some((maj.parse::<u32>().ok()?, min.parse::<u32>().ok()?)))
        .ok_or_else(|| {
            SgridError::header_malformed(path, format!("unparseable version {version:?}"))
        })?;
    if major > FORMAT_MAJOR {
        return Err(SgridError::NewerMajorVersion {
            path: path.to_path_buf(),
            file_major: major,
            library_major: FORMAT_MAJOR,
        });
    }
    let newer_minor = major == FORMAT_MAJOR && minor > FORMAT_MINOR;
    if newer_minor {
        tracing::warn!(
            path = %path.display(),
            file_version = %format!("{major}.{minor:02}"),
            library_version = %format!("{FORMAT_MAJOR}.{FORMAT_MINOR:02}"),
            "File written by a newer minor version; unknown header keys and \
             record bits will be preserved"
        );
    }

    let mut scalars = Scalars::new();
    let mut distribution_statement = String::new();
    let mut comments = String::new();
    let mut unknown_lines = Vec::new();
    let mut sentinel_end = None;

    let mut i = 1;
    while i < lines.len() {
        let line = text_line(i)?;
        let trimmed = line.trim();

        if trimmed == END_SENTINEL {
            sentinel_end = Some(lines[i].0 + lines[i].1.len() + 1);
            break;
        }

        if let Some(open) = trimmed.strip_prefix('{') {
            // Bracketed multi-line block; the body runs until a lone `}`.
            let key = open.trim_end_matches('=').trim();
            let mut body = Vec::new();
            let mut j = i + 1;
            let mut closed = false;
            while j < lines.len() {
                let inner = text_line(j)?;
                if inner.trim() == "}" {
                    closed = true;
                    break;
                }
                if inner.trim() == END_SENTINEL {
                    break;
                }
                body.push(inner.to_string());
                j += 1;
            }
            if !closed {
                return Err(SgridError::header_malformed(
                    path,
                    format!("unterminated {{{key}}} block"),
                ));
            }
            match key {
                BLOCK_DISTRIBUTION => distribution_statement = body.join("\n"),
                BLOCK_COMMENTS => comments = body.join("\n"),
                _ => {
                    unknown_lines.push(line.to_string());
                    unknown_lines.extend(body);
                    unknown_lines.push("}".to_string());
                }
            }
            i = j + 1;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            if let Some((key, after)) = rest.split_once(']') {
                if let Some(value) = after.trim_start().strip_prefix('=') {
                    if scalars.apply(path, key, value.trim())? {
                        i += 1;
                        continue;
                    }
                }
            }
        }

        // Anything else, including future syntax, rides along untouched.
        if !trimmed.is_empty() {
            unknown_lines.push(line.to_string());
        }
        i += 1;
    }

    let sentinel_end = sentinel_end.ok_or_else(|| {
        SgridError::header_malformed(path, "missing [END OF HEADER] sentinel")
    })?;

    let header_size = Scalars::require(path, KEY_HEADER_SIZE, scalars.header_size)?;
    if sentinel_end > header_size as usize {
        return Err(SgridError::header_malformed(
            path,
            format!("header text runs past the declared {header_size}-byte block"),
        ));
    }

    let geometry = GridGeometry {
        west: Scalars::require(path, KEY_WEST, scalars.west)?,
        south: Scalars::require(path, KEY_SOUTH, scalars.south)?,
        lat_cell_size: Scalars::require(path, KEY_LAT_CELL, scalars.lat_cell)?,
        lon_cell_size: Scalars::require(path, KEY_LON_CELL, scalars.lon_cell)?,
        width: Scalars::require(path, KEY_WIDTH, scalars.width)?,
        height: Scalars::require(path, KEY_HEIGHT, scalars.height)?,
    };
    geometry
        .validate()
        .map_err(|reason| SgridError::header_malformed(path, reason))?;

    let fields = scalars.fields;
    fields
        .validate()
        .map_err(|reason| SgridError::header_malformed(path, reason))?;
    if !fields.z.is_active() {
        return Err(SgridError::header_malformed(
            path,
            "file declares no z field",
        ));
    }

    let record_size = Scalars::require(path, KEY_RECORD_SIZE, scalars.record_size)?;
    let computed = RecordLayout::plan(&fields).record_size;
    if record_size < computed {
        return Err(SgridError::header_malformed(
            path,
            format!(
                "declared record size {record_size} is smaller than the \
                 {computed} bytes the declared fields need"
            ),
        ));
    }

    let observed_z = match (scalars.observed_min_z, scalars.observed_max_z) {
        (Some(min_z), Some(max_z)) => Some((min_z, max_z)),
        _ => None,
    };

    Ok(GridHeader {
        version_major: major,
        version_minor: minor,
        byte_order: Scalars::require(path, KEY_ENDIAN, scalars.byte_order)?,
        creation_date: scalars.creation_date.unwrap_or(DateTime::UNIX_EPOCH),
        modification_date: scalars.modification_date.unwrap_or(DateTime::UNIX_EPOCH),
        creation_software: scalars.creation_software,
        classification: scalars.classification,
        distribution_statement,
        comments,
        header_size,
        record_size,
        geometry,
        fields,
        observed_z,
        unknown_lines,
        newer_minor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn survey_fields() -> FieldSet {
        FieldSet {
            z: QuantSpec::new(-500.0, 500.0, 100.0),
            horizontal_uncertainty: QuantSpec::new(0.0, 100.0, 100.0),
            vertical_uncertainty: QuantSpec::new(0.0, 100.0, 100.0),
            status_bits: 4,
            total_uncertainty: QuantSpec::inactive(),
            max_point_count: 1023,
            datum_separation: QuantSpec::inactive(),
            ellipsoid_separation: QuantSpec::inactive(),
        }
    }

    fn sample_header() -> GridHeader {
        let geometry = GridGeometry {
            west: 0.0,
            south: 0.0,
            lat_cell_size: 0.01,
            lon_cell_size: 0.01,
            width: 10,
            height: 5,
        };
        let fields = survey_fields();
        let record_size = RecordLayout::plan(&fields).record_size;
        let mut header = GridHeader::for_new_file(
            geometry,
            fields,
            record_size,
            "sgrid-store tests".to_string(),
            "UNCLASSIFIED".to_string(),
            "Approved for public release.\nDistribution unlimited.".to_string(),
            "harbor resurvey".to_string(),
        );
        header.observed_z = Some((-42.5, 13.25));
        header
    }

    fn test_path() -> PathBuf {
        PathBuf::from("/data/harbor.sgrid")
    }

    #[test]
    fn test_encode_parse_round_trip() {
        let header = sample_header();
        let block = encode(&header).unwrap();
        assert_eq!(block.len(), HEADER_SIZE as usize);

        let parsed = parse(&test_path(), &block).unwrap();
        assert_eq!(parsed.version_major, FORMAT_MAJOR);
        assert_eq!(parsed.version_minor, FORMAT_MINOR);
        assert_eq!(parsed.byte_order, ByteOrder::native());
        assert_eq!(parsed.geometry, header.geometry);
        assert_eq!(parsed.fields, header.fields);
        assert_eq!(parsed.record_size, header.record_size);
        assert_eq!(parsed.header_size, HEADER_SIZE);
        assert_eq!(parsed.classification, "UNCLASSIFIED");
        assert_eq!(parsed.creation_software, "sgrid-store tests");
        assert_eq!(
            parsed.distribution_statement,
            "Approved for public release.\nDistribution unlimited."
        );
        assert_eq!(parsed.comments, "harbor resurvey");
        assert_eq!(parsed.observed_z, Some((-42.5, 13.25)));
        assert!(!parsed.newer_minor);
        assert!(parsed.unknown_lines.is_empty());
        // Dates survive to the second.
        assert_eq!(
            parsed.creation_date.timestamp(),
            header.creation_date.timestamp()
        );
    }

    #[test]
    fn test_padding_is_spaces_after_sentinel() {
        let block = encode(&sample_header()).unwrap();
        let text = std::str::from_utf8(&block).unwrap();
        let sentinel_at = text.find(END_SENTINEL).unwrap();
        let after = &block[sentinel_at + END_SENTINEL.len() + 1..];
        assert!(after.iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_non_grid_file_is_not_this_format() {
        let err = parse(&test_path(), b"PNG\x0d\x0a\x1a\x0a garbage").unwrap_err();
        assert!(matches!(err, SgridError::NotThisFormat { .. }));

        let err = parse(&test_path(), b"").unwrap_err();
        assert!(matches!(err, SgridError::NotThisFormat { .. }));
    }

    #[test]
    fn test_newer_major_version_is_refused() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let bumped = text.replace(
            &format!("SGRID library V{FORMAT_MAJOR}."),
            &format!("SGRID library V{}.", FORMAT_MAJOR + 1),
        );
        match parse(&test_path(), bumped.as_bytes()).unwrap_err() {
            SgridError::NewerMajorVersion {
                file_major,
                library_major,
                ..
            } => {
                assert_eq!(file_major, FORMAT_MAJOR + 1);
                assert_eq!(library_major, FORMAT_MAJOR);
            }
            other => panic!("expected NewerMajorVersion, got {other}"),
        }
    }

    #[test]
    fn test_newer_minor_version_sets_flag_but_parses() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let bumped = text.replace(
            &format!("V{FORMAT_MAJOR}.{FORMAT_MINOR:02}"),
            &format!("V{FORMAT_MAJOR}.{:02}", FORMAT_MINOR + 1),
        );
        let parsed = parse(&test_path(), bumped.as_bytes()).unwrap();
        assert!(parsed.newer_minor);
        assert_eq!(parsed.version_minor, FORMAT_MINOR + 1);
    }

    #[test]
    fn test_unknown_keys_survive_a_rewrite() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let with_extras = text.replace(
            END_SENTINEL,
            "[SONAR MODEL] = EM2040\n{CALIBRATION =\nport lean 0.02\n}\n[END OF HEADER]",
        );

        let parsed = parse(&test_path(), with_extras.as_bytes()).unwrap();
        assert_eq!(
            parsed.unknown_lines,
            vec![
                "[SONAR MODEL] = EM2040".to_string(),
                "{CALIBRATION =".to_string(),
                "port lean 0.02".to_string(),
                "}".to_string(),
            ]
        );

        // A rewrite keeps them verbatim.
        let rewritten = encode(&parsed).unwrap();
        let rewritten = String::from_utf8(rewritten).unwrap();
        assert!(rewritten.contains("[SONAR MODEL] = EM2040"));
        assert!(rewritten.contains("port lean 0.02"));
        let reparsed = parse(&test_path(), rewritten.as_bytes()).unwrap();
        assert_eq!(reparsed.unknown_lines, parsed.unknown_lines);
    }

    #[test]
    fn test_declared_record_size_wins_when_larger() {
        let header = sample_header();
        let computed = RecordLayout::plan(&header.fields).record_size;
        let block = encode(&header).unwrap();
        let text = String::from_utf8(block).unwrap();
        let widened = text.replace(
            &format!("[RECORD SIZE] = {computed}"),
            &format!("[RECORD SIZE] = {}", computed + 4),
        );
        let parsed = parse(&test_path(), widened.as_bytes()).unwrap();
        assert_eq!(parsed.record_size, computed + 4);
    }

    #[test]
    fn test_declared_record_size_below_computed_is_malformed() {
        let header = sample_header();
        let computed = RecordLayout::plan(&header.fields).record_size;
        let block = encode(&header).unwrap();
        let text = String::from_utf8(block).unwrap();
        let narrowed = text.replace(
            &format!("[RECORD SIZE] = {computed}"),
            &format!("[RECORD SIZE] = {}", computed - 1),
        );
        let err = parse(&test_path(), narrowed.as_bytes()).unwrap_err();
        assert!(matches!(err, SgridError::HeaderMalformed { .. }), "{err}");
    }

    #[test]
    fn test_missing_required_key_is_malformed() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let without_width: String = text
            .lines()
            .filter(|l| !l.starts_with("[WIDTH]"))
            .map(|l| format!("{l}\n"))
            .collect();
        match parse(&test_path(), without_width.as_bytes()).unwrap_err() {
            SgridError::HeaderMalformed { reason, .. } => {
                assert!(reason.contains("WIDTH"), "{reason}");
            }
            other => panic!("expected HeaderMalformed, got {other}"),
        }
    }

    #[test]
    fn test_missing_sentinel_is_malformed() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let truncated = &text[..text.find(END_SENTINEL).unwrap()];
        let err = parse(&test_path(), truncated.as_bytes()).unwrap_err();
        match err {
            SgridError::HeaderMalformed { reason, .. } => {
                assert!(reason.contains("sentinel"), "{reason}");
            }
            other => panic!("expected HeaderMalformed, got {other}"),
        }
    }

    #[test]
    fn test_bad_endian_tag_is_malformed() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let native = ByteOrder::native().as_str();
        let mangled = text.replace(
            &format!("[ENDIAN] = {native}"),
            "[ENDIAN] = MIDDLE",
        );
        assert!(matches!(
            parse(&test_path(), mangled.as_bytes()).unwrap_err(),
            SgridError::HeaderMalformed { .. }
        ));
    }

    #[test]
    fn test_east_and_north_are_recomputed_not_trusted() {
        let block = encode(&sample_header()).unwrap();
        let text = String::from_utf8(block).unwrap();
        let skewed = text.replace("[EAST LONGITUDE] = 0.1", "[EAST LONGITUDE] = 99");
        let parsed = parse(&test_path(), skewed.as_bytes()).unwrap();
        assert!((parsed.geometry.east() - 0.1).abs() < 1e-12);
        // The skewed value was understood, so it is not carried as unknown.
        assert!(parsed.unknown_lines.is_empty());
    }

    #[test]
    fn test_oversized_content_is_rejected_at_encode() {
        let mut header = sample_header();
        header.comments = "x".repeat(HEADER_SIZE as usize);
        assert!(matches!(
            encode(&header).unwrap_err(),
            SgridError::InvalidConfig { .. }
        ));
    }

    #[test]
    fn test_inactive_fields_round_trip_as_inactive() {
        let header = sample_header();
        let block = encode(&header).unwrap();
        let parsed = parse(&test_path(), &block).unwrap();
        assert!(!parsed.fields.total_uncertainty.is_active());
        assert!(!parsed.fields.datum_separation.is_active());
        assert_eq!(parsed.fields.max_point_count, 1023);
    }
}
