//! Bit-level packing and unpacking of unsigned integers.
//!
//! Record fields are stored as an MSB-first bit stream with no byte
//! alignment: a field may start and end in the middle of a byte and may
//! span byte boundaries. These two functions are the only code that touches
//! individual bits; everything above them works in whole fields.
//!
//! Neither function checks the buffer length against the span it is asked
//! to touch — the caller sizes the buffer from the record layout before
//! invoking them. An undersized buffer is a caller bug and panics on slice
//! indexing rather than being reported as a recoverable error.

/// Write the low `width` bits of `value` into `buf` starting at `bit_offset`.
///
/// Bits outside `[bit_offset, bit_offset + width)` are left untouched.
/// `width` may be 0 (a no-op) up to 32.
pub fn pack_bits(buf: &mut [u8], bit_offset: usize, width: u32, value: u32) {
    debug_assert!(width <= 32, "field width {width} exceeds 32 bits");
    if width == 0 {
        return;
    }

    // Discard any bits of `value` above the field width.
    let value = if width < 32 {
        value & ((1u32 << width) - 1)
    } else {
        value
    };

    let mut remaining = width as usize;
    let mut pos = bit_offset;
    while remaining > 0 {
        let byte = pos >> 3;
        let bit_in_byte = pos & 7;
        let space = 8 - bit_in_byte;
        let take = space.min(remaining);

        // The next `take` bits of the field, MSB-first.
        let chunk = ((value >> (remaining - take)) as u16 & ((1u16 << take) - 1)) as u8;
        let shift = space - take;
        let mask = (((1u16 << take) - 1) as u8) << shift;

        buf[byte] = (buf[byte] & !mask) | (chunk << shift);

        pos += take;
        remaining -= take;
    }
}

/// Read `width` bits from `buf` starting at `bit_offset`.
///
/// The inverse of [`pack_bits`]. The result is always an unsigned value;
/// callers storing signed quantities apply their own sign interpretation,
/// this codec never sign-extends.
pub fn unpack_bits(buf: &[u8], bit_offset: usize, width: u32) -> u32 {
    debug_assert!(width <= 32, "field width {width} exceeds 32 bits");
    if width == 0 {
        return 0;
    }

    let mut result = 0u32;
    let mut remaining = width as usize;
    let mut pos = bit_offset;
    while remaining > 0 {
        let byte = pos >> 3;
        let bit_in_byte = pos & 7;
        let space = 8 - bit_in_byte;
        let take = space.min(remaining);

        let shift = space - take;
        let chunk = (buf[byte] >> shift) & ((1u16 << take) - 1) as u8;
        result = (result << take) | chunk as u32;

        pos += take;
        remaining -= take;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic value generator so the exhaustive sweep below does not
    /// need an RNG dependency.
    fn test_value(width: u32, seed: u32) -> u32 {
        let v = seed
            .wrapping_mul(0x9E37_79B9)
            .wrapping_add(width.wrapping_mul(0x85EB_CA6B));
        if width < 32 {
            v & ((1u32 << width) - 1)
        } else {
            v
        }
    }

    #[test]
    fn test_pack_within_single_byte() {
        let mut buf = [0u8; 2];
        pack_bits(&mut buf, 2, 3, 0b101);
        // Bits 2..5 of byte 0, MSB-first: 0b0010_1000.
        assert_eq!(buf[0], 0b0010_1000);
        assert_eq!(buf[1], 0);
        assert_eq!(unpack_bits(&buf, 2, 3), 0b101);
    }

    #[test]
    fn test_pack_spanning_byte_boundary() {
        let mut buf = [0u8; 3];
        pack_bits(&mut buf, 6, 10, 0b10_1101_0011);
        assert_eq!(unpack_bits(&buf, 6, 10), 0b10_1101_0011);
        // The first six bits and everything past bit 16 stay clear.
        assert_eq!(buf[0] & 0b1111_1100, 0);
        assert_eq!(buf[2], 0);
    }

    #[test]
    fn test_zero_width_is_a_no_op() {
        let mut buf = [0xFFu8; 2];
        pack_bits(&mut buf, 5, 0, 0xDEAD);
        assert_eq!(buf, [0xFF, 0xFF]);
        assert_eq!(unpack_bits(&buf, 5, 0), 0);
    }

    #[test]
    fn test_full_width_round_trip() {
        let mut buf = [0u8; 8];
        pack_bits(&mut buf, 3, 32, 0xDEAD_BEEF);
        assert_eq!(unpack_bits(&buf, 3, 32), 0xDEAD_BEEF);
    }

    #[test]
    fn test_value_wider_than_field_is_truncated() {
        let mut buf = [0u8; 2];
        pack_bits(&mut buf, 0, 4, 0xFF);
        assert_eq!(unpack_bits(&buf, 0, 4), 0x0F);
        // Nothing leaked past the field.
        assert_eq!(buf[0], 0xF0);
        assert_eq!(buf[1], 0);
    }

    #[test]
    fn test_round_trip_all_widths_and_offsets() {
        for width in 1..=32u32 {
            for offset in 0..8usize {
                let mut buf = [0u8; 6];
                let value = test_value(width, offset as u32);
                pack_bits(&mut buf, offset, width, value);
                assert_eq!(
                    unpack_bits(&buf, offset, width),
                    value,
                    "width {width} offset {offset}"
                );
            }
        }
    }

    #[test]
    fn test_neighbor_bits_preserved() {
        for width in 1..=32u32 {
            for offset in 0..8usize {
                // Start from an all-ones background, punch the field in,
                // and verify only the field's span changed.
                let mut buf = [0xFFu8; 6];
                let value = test_value(width, offset as u32 ^ 0x55);
                pack_bits(&mut buf, offset, width, value);

                assert_eq!(unpack_bits(&buf, offset, width), value);
                for bit in 0..48usize {
                    if bit >= offset && bit < offset + width as usize {
                        continue;
                    }
                    let b = (buf[bit / 8] >> (7 - bit % 8)) & 1;
                    assert_eq!(b, 1, "bit {bit} clobbered at width {width} offset {offset}");
                }
            }
        }
    }

    #[test]
    fn test_adjacent_fields_do_not_interfere() {
        // Pack three fields back-to-back the way a record does.
        let mut buf = [0u8; 8];
        pack_bits(&mut buf, 0, 17, 100_001);
        pack_bits(&mut buf, 17, 13, 4_321);
        pack_bits(&mut buf, 30, 4, 0b1001);

        assert_eq!(unpack_bits(&buf, 0, 17), 100_001);
        assert_eq!(unpack_bits(&buf, 17, 13), 4_321);
        assert_eq!(unpack_bits(&buf, 30, 4), 0b1001);
    }
}
