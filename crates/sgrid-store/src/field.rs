//! Field declarations and record layout planning.
//!
//! A grid file stores one packed record per cell. Which fields that record
//! carries, and how many bits each occupies, is not fixed by the format:
//! it is derived from the ranges and scale factors declared in the header.
//! The same planning pass runs when a file is created (to decide the
//! layout) and when one is opened (to reproduce it), so the two must never
//! diverge.
//!
//! Fields live in a single canonical order and new fields are only ever
//! appended after the last existing one. An older reader that knows the
//! first M fields can therefore decode them from a newer file's records,
//! provided it steps between records using the header-declared record size
//! rather than its own computed one.

use serde::{Deserialize, Serialize};

/// The optional per-cell fields, in canonical record order.
///
/// The discriminant order here *is* the on-disk bit order. Appending a new
/// field at the end is a compatible change; inserting or reordering is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Primary value (elevation/depth).
    Z,
    /// Horizontal uncertainty of the primary value.
    HorizontalUncertainty,
    /// Vertical uncertainty of the primary value.
    VerticalUncertainty,
    /// Cell status flags (see [`crate::record::status`]).
    Status,
    /// Aggregate (total propagated) uncertainty.
    TotalUncertainty,
    /// Number of soundings contributing to the cell.
    PointCount,
    /// Vertical datum to mean-sea-level separation.
    DatumSeparation,
    /// Mean-sea-level to ellipsoid separation.
    EllipsoidSeparation,
}

impl FieldKind {
    /// Every field in canonical record order.
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Z,
        FieldKind::HorizontalUncertainty,
        FieldKind::VerticalUncertainty,
        FieldKind::Status,
        FieldKind::TotalUncertainty,
        FieldKind::PointCount,
        FieldKind::DatumSeparation,
        FieldKind::EllipsoidSeparation,
    ];

    /// Position of this field in the canonical order.
    pub fn index(&self) -> usize {
        FieldKind::ALL.iter().position(|k| k == self).unwrap()
    }

    /// Header key stem for this field (`[<stem> MIN]`, `[<stem> SCALE]`, ...).
    pub fn key_stem(&self) -> &'static str {
        match self {
            FieldKind::Z => "Z",
            FieldKind::HorizontalUncertainty => "HORIZONTAL UNCERTAINTY",
            FieldKind::VerticalUncertainty => "VERTICAL UNCERTAINTY",
            FieldKind::Status => "STATUS",
            FieldKind::TotalUncertainty => "TOTAL UNCERTAINTY",
            FieldKind::PointCount => "NUMBER OF POINTS",
            FieldKind::DatumSeparation => "DATUM SEPARATION",
            FieldKind::EllipsoidSeparation => "ELLIPSOID SEPARATION",
        }
    }

    /// Human-readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Z => "z",
            FieldKind::HorizontalUncertainty => "horizontal uncertainty",
            FieldKind::VerticalUncertainty => "vertical uncertainty",
            FieldKind::Status => "status",
            FieldKind::TotalUncertainty => "total uncertainty",
            FieldKind::PointCount => "number of points",
            FieldKind::DatumSeparation => "datum separation",
            FieldKind::EllipsoidSeparation => "ellipsoid separation",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared range and precision of one continuous field.
///
/// `scale` is codes per physical unit: a scale of 100 stores centimeter
/// precision for a value measured in meters. A non-positive scale marks the
/// field inactive — it occupies no bits and decodes as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantSpec {
    /// Smallest representable physical value.
    pub min: f64,
    /// Largest declared physical value.
    pub max: f64,
    /// Quantization scale (codes per unit); `<= 0` disables the field.
    pub scale: f64,
    /// Physical value callers use to mean "no data". Defaults to
    /// `max + 1/scale`, the one reserved code above the declared maximum.
    pub null_value: Option<f64>,
}

impl QuantSpec {
    /// Declare an active field with the default no-data convention.
    pub fn new(min: f64, max: f64, scale: f64) -> Self {
        Self {
            min,
            max,
            scale,
            null_value: None,
        }
    }

    /// Declare an inactive field (zero bits in the record).
    pub fn inactive() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            scale: 0.0,
            null_value: None,
        }
    }

    /// Whether this field occupies bits in the record.
    pub fn is_active(&self) -> bool {
        self.scale > 0.0
    }

    /// One quantization step in physical units.
    pub fn step(&self) -> f64 {
        1.0 / self.scale
    }

    /// The physical value that stands for "no data".
    pub fn effective_null(&self) -> f64 {
        match self.null_value {
            Some(v) => v,
            None => self.max + self.step(),
        }
    }

    /// Code reserved for the no-data sentinel, one above the code for `max`.
    ///
    /// Only meaningful for an active field that passed [`FieldSet::validate`].
    pub fn null_code(&self) -> u32 {
        ((self.max - self.min) * self.scale).round() as u32 + 1
    }

    /// Number of quantized states the declared range requires, counting the
    /// reserved no-data headroom.
    fn states(&self) -> u64 {
        let span = ((self.max - self.min) + 1.0) * self.scale;
        span.ceil() as u64
    }

    /// Bits needed for this field; 0 when inactive.
    pub fn bit_width(&self) -> u32 {
        if !self.is_active() {
            return 0;
        }
        bits_for_states(self.states())
    }
}

impl Default for QuantSpec {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Declarations for all eight fields of a grid file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    pub z: QuantSpec,
    pub horizontal_uncertainty: QuantSpec,
    pub vertical_uncertainty: QuantSpec,
    /// Fixed bit width of the status field; 0 disables it.
    pub status_bits: u32,
    pub total_uncertainty: QuantSpec,
    /// Largest representable sounding count; 0 disables the field.
    pub max_point_count: u32,
    pub datum_separation: QuantSpec,
    pub ellipsoid_separation: QuantSpec,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            z: QuantSpec::inactive(),
            horizontal_uncertainty: QuantSpec::inactive(),
            vertical_uncertainty: QuantSpec::inactive(),
            status_bits: 0,
            total_uncertainty: QuantSpec::inactive(),
            max_point_count: 0,
            datum_separation: QuantSpec::inactive(),
            ellipsoid_separation: QuantSpec::inactive(),
        }
    }
}

impl FieldSet {
    /// The quantization spec for a continuous field; `None` for the status
    /// and point-count fields, which are not scale-quantized.
    pub fn quant(&self, kind: FieldKind) -> Option<&QuantSpec> {
        match kind {
            FieldKind::Z => Some(&self.z),
            FieldKind::HorizontalUncertainty => Some(&self.horizontal_uncertainty),
            FieldKind::VerticalUncertainty => Some(&self.vertical_uncertainty),
            FieldKind::TotalUncertainty => Some(&self.total_uncertainty),
            FieldKind::DatumSeparation => Some(&self.datum_separation),
            FieldKind::EllipsoidSeparation => Some(&self.ellipsoid_separation),
            FieldKind::Status | FieldKind::PointCount => None,
        }
    }

    /// Bit width of a field under this declaration set.
    pub fn width_of(&self, kind: FieldKind) -> u32 {
        match kind {
            FieldKind::Status => self.status_bits,
            FieldKind::PointCount => {
                if self.max_point_count == 0 {
                    0
                } else {
                    bits_for_states(self.max_point_count as u64 + 1)
                }
            }
            _ => self.quant(kind).map(QuantSpec::bit_width).unwrap_or(0),
        }
    }

    /// Check every declared range against the format invariants.
    ///
    /// Returns the first violation as a message; callers wrap it into
    /// `InvalidConfig` (create path) or `HeaderMalformed` (open path).
    pub fn validate(&self) -> std::result::Result<(), String> {
        for kind in FieldKind::ALL {
            let mut active_quant = None;
            if let Some(q) = self.quant(kind) {
                if !q.is_active() {
                    continue;
                }
                if !q.min.is_finite() || !q.max.is_finite() || !q.scale.is_finite() {
                    return Err(format!("{kind} range is not finite"));
                }
                if q.max < q.min {
                    return Err(format!(
                        "{kind} declares max {} below min {}",
                        q.max, q.min
                    ));
                }
                active_quant = Some(q);
            }
            let width = self.width_of(kind);
            if width > 32 {
                return Err(format!(
                    "{kind} needs {width} bits; the record codec supports at most 32"
                ));
            }
            if let Some(q) = active_quant {
                // Creation null-fills every record, so the no-data code must
                // be representable in the planned width.
                let null_code = ((q.max - q.min) * q.scale).round() + 1.0;
                if null_code >= (1u64 << width) as f64 {
                    return Err(format!(
                        "{kind} range leaves no room for the no-data code"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Computed placement of one field within the packed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub kind: FieldKind,
    /// Bits occupied; 0 means the field is absent from the record.
    pub width: u32,
    /// Bit offset from the start of the record.
    pub offset: u32,
}

/// The packed record layout of one grid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    fields: [FieldLayout; 8],
    /// Total occupied bits.
    pub record_bits: u32,
    /// Record size in whole bytes.
    pub record_size: u32,
}

impl RecordLayout {
    /// Plan the record layout for a declaration set.
    ///
    /// Walks the fields in canonical order, assigning each active field its
    /// width at the running bit offset; inactive fields sit at the running
    /// offset with width 0 and are skipped by the codec. The record size is
    /// the total rounded up to whole bytes.
    pub fn plan(set: &FieldSet) -> RecordLayout {
        let mut offset = 0u32;
        let fields = FieldKind::ALL.map(|kind| {
            let width = set.width_of(kind);
            let layout = FieldLayout {
                kind,
                width,
                offset,
            };
            offset += width;
            layout
        });

        RecordLayout {
            fields,
            record_bits: offset,
            record_size: offset.div_ceil(8),
        }
    }

    /// Placement of one field.
    pub fn field(&self, kind: FieldKind) -> FieldLayout {
        self.fields[kind.index()]
    }

    /// All field placements in canonical order.
    pub fn fields(&self) -> &[FieldLayout; 8] {
        &self.fields
    }
}

/// Bits required to distinguish `states` values (`ceil(log2(states))`).
fn bits_for_states(states: u64) -> u32 {
    if states <= 1 {
        0
    } else {
        u64::BITS - (states - 1).leading_zeros()
    }
}
