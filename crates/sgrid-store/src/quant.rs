//! Value quantization.
//!
//! Continuous fields are stored as unsigned codes relative to their declared
//! minimum: `code = round((value - min) * scale)`. Decoding divides back and
//! re-adds the minimum, so a round trip lands within half a quantization
//! step of the original value. One code above the declared maximum is
//! reserved for the no-data sentinel.

use crate::error::{Result, SgridError};
use crate::field::{FieldKind, QuantSpec};

/// Quantize a physical value for storage.
///
/// The no-data value encodes to the reserved sentinel code. Anything else
/// below `min` or above `max + 1/scale` is rejected without being written.
/// Inactive fields always encode to 0.
pub fn encode(kind: FieldKind, spec: &QuantSpec, value: f64) -> Result<u32> {
    if !spec.is_active() {
        return Ok(0);
    }
    if value == spec.effective_null() {
        return Ok(spec.null_code());
    }
    if value < spec.min || value > spec.max + spec.step() {
        return Err(SgridError::ValueOutOfRange {
            field: kind,
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(((value - spec.min) * spec.scale).round() as u32)
}

/// Recover a physical value from its stored code.
///
/// The sentinel code maps back to the field's no-data value exactly;
/// inactive fields decode to 0.
pub fn decode(spec: &QuantSpec, code: u32) -> f64 {
    if !spec.is_active() {
        return 0.0;
    }
    if code == spec.null_code() {
        return spec.effective_null();
    }
    code as f64 / spec.scale + spec.min
}
