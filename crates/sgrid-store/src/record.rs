//! The per-cell record and its packed codec.
//!
//! A [`CellRecord`] is the unpacked view of one grid cell. On disk the same
//! data is a bit-packed field sequence laid out by [`RecordLayout`]; this
//! module converts between the two.

use crate::bitpack::{pack_bits, unpack_bits};
use crate::error::{Result, SgridError};
use crate::field::{FieldKind, FieldSet, QuantSpec, RecordLayout};
use crate::quant;

/// Status flag bits for a grid cell.
///
/// These occupy the low bits of the status field; a file may declare more
/// status bits than are named here, and later format revisions may assign
/// the spares.
pub mod status {
    /// Cell value comes from real observed data.
    pub const REAL: u32 = 0x1;
    /// Cell value was interpolated from neighbors.
    pub const INTERPOLATED: u32 = 0x2;
    /// Cell value was hand-digitized.
    pub const DIGITIZED: u32 = 0x4;
    /// Cell value has been reviewed and accepted.
    pub const CHECKED: u32 = 0x8;
}

/// Unpacked contents of one grid cell.
///
/// Fields the file does not carry read back as 0 and are ignored on write.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellRecord {
    /// Primary value (elevation/depth).
    pub z: f32,
    pub horizontal_uncertainty: f32,
    pub vertical_uncertainty: f32,
    /// Status flag bits (see [`status`]).
    pub status: u32,
    pub total_uncertainty: f32,
    /// Number of soundings contributing to the cell.
    pub point_count: u32,
    pub datum_separation: f32,
    pub ellipsoid_separation: f32,
}

impl CellRecord {
    /// The record every cell holds after creation: Z at its no-data value,
    /// everything else at the bottom of its range.
    pub fn null_record(fields: &FieldSet) -> CellRecord {
        CellRecord {
            z: null_of(&fields.z),
            horizontal_uncertainty: floor_of(&fields.horizontal_uncertainty),
            vertical_uncertainty: floor_of(&fields.vertical_uncertainty),
            status: 0,
            total_uncertainty: floor_of(&fields.total_uncertainty),
            point_count: 0,
            datum_separation: floor_of(&fields.datum_separation),
            ellipsoid_separation: floor_of(&fields.ellipsoid_separation),
        }
    }

    /// Whether this record's Z is the file's no-data value.
    pub fn is_null(&self, fields: &FieldSet) -> bool {
        !fields.z.is_active() || self.z == fields.z.effective_null() as f32
    }
}

fn null_of(spec: &QuantSpec) -> f32 {
    if spec.is_active() {
        spec.effective_null() as f32
    } else {
        0.0
    }
}

fn floor_of(spec: &QuantSpec) -> f32 {
    if spec.is_active() {
        spec.min as f32
    } else {
        0.0
    }
}

/// Quantize one continuous field, mapping the no-data value to its code.
///
/// The null comparison happens in f32, where the caller's values live; the
/// widened value would miss the f64 sentinel.
fn encode_continuous(kind: FieldKind, spec: &QuantSpec, value: f32) -> Result<u32> {
    if spec.is_active() && value == spec.effective_null() as f32 {
        Ok(spec.null_code())
    } else {
        quant::encode(kind, spec, value as f64)
    }
}

/// Pack one record into a buffer, starting at `base_bit`.
///
/// Every field is range-checked before packing; a failure leaves the buffer
/// partially updated, so callers must discard it rather than flush it.
pub fn encode_record(
    fields: &FieldSet,
    layout: &RecordLayout,
    rec: &CellRecord,
    buf: &mut [u8],
    base_bit: usize,
) -> Result<()> {
    for fl in layout.fields() {
        if fl.width == 0 {
            continue;
        }
        let code = match fl.kind {
            FieldKind::Status => {
                let limit = 1u64 << fl.width;
                if (rec.status as u64) >= limit {
                    return Err(SgridError::ValueOutOfRange {
                        field: FieldKind::Status,
                        value: rec.status as f64,
                        min: 0.0,
                        max: (limit - 1) as f64,
                    });
                }
                rec.status
            }
            FieldKind::PointCount => {
                if rec.point_count > fields.max_point_count {
                    return Err(SgridError::ValueOutOfRange {
                        field: FieldKind::PointCount,
                        value: rec.point_count as f64,
                        min: 0.0,
                        max: fields.max_point_count as f64,
                    });
                }
                rec.point_count
            }
            FieldKind::Z => encode_continuous(fl.kind, &fields.z, rec.z)?,
            FieldKind::HorizontalUncertainty => {
                encode_continuous(fl.kind, &fields.horizontal_uncertainty, rec.horizontal_uncertainty)?
            }
            FieldKind::VerticalUncertainty => {
                encode_continuous(fl.kind, &fields.vertical_uncertainty, rec.vertical_uncertainty)?
            }
            FieldKind::TotalUncertainty => {
                encode_continuous(fl.kind, &fields.total_uncertainty, rec.total_uncertainty)?
            }
            FieldKind::DatumSeparation => {
                encode_continuous(fl.kind, &fields.datum_separation, rec.datum_separation)?
            }
            FieldKind::EllipsoidSeparation => {
                encode_continuous(fl.kind, &fields.ellipsoid_separation, rec.ellipsoid_separation)?
            }
        };
        pack_bits(buf, base_bit + fl.offset as usize, fl.width, code);
    }
    Ok(())
}

/// Unpack one record from a buffer, starting at `base_bit`.
pub fn decode_record(
    fields: &FieldSet,
    layout: &RecordLayout,
    buf: &[u8],
    base_bit: usize,
) -> CellRecord {
    let mut rec = CellRecord::default();
    for fl in layout.fields() {
        if fl.width == 0 {
            continue;
        }
        let code = unpack_bits(buf, base_bit + fl.offset as usize, fl.width);
        match fl.kind {
            FieldKind::Status => rec.status = code,
            FieldKind::PointCount => rec.point_count = code,
            FieldKind::Z => rec.z = quant::decode(&fields.z, code) as f32,
            FieldKind::HorizontalUncertainty => {
                rec.horizontal_uncertainty = quant::decode(&fields.horizontal_uncertainty, code) as f32
            }
            FieldKind::VerticalUncertainty => {
                rec.vertical_uncertainty = quant::decode(&fields.vertical_uncertainty, code) as f32
            }
            FieldKind::TotalUncertainty => {
                rec.total_uncertainty = quant::decode(&fields.total_uncertainty, code) as f32
            }
            FieldKind::DatumSeparation => {
                rec.datum_separation = quant::decode(&fields.datum_separation, code) as f32
            }
            FieldKind::EllipsoidSeparation => {
                rec.ellipsoid_separation = quant::decode(&fields.ellipsoid_separation, code) as f32
            }
        }
    }
    rec
}
