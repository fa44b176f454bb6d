//! Test data generators for creating synthetic survey-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a depth grid with predictable values.
///
/// Each cell value is calculated as: `-(col * 10 + row) * 0.25`
///
/// The values are exact multiples of 0.25, so they survive centimetre
/// quantization and can be compared with `==` after a round trip.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_depth_grid;
///
/// let grid = create_depth_grid(10, 5);
/// assert_eq!(grid.len(), 50);  // 10 * 5
/// assert_eq!(grid[0], 0.0);    // col=0, row=0
/// assert_eq!(grid[1], -2.5);   // col=1, row=0
/// assert_eq!(grid[10], -0.25); // col=0, row=1
/// ```
pub fn create_depth_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(-((col * 10 + row) as f32) * 0.25);
        }
    }
    data
}

/// Creates a grid with random-ish but deterministic uncertainty values.
///
/// Uses a simple hash-based approach for reproducibility. Values fall in
/// `[0.0, 5.0)` metres at centimetre resolution.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `seed` - Seed value for deterministic generation
///
/// # Returns
///
/// A `Vec<f32>` with uncertainty values in metres.
pub fn create_uncertainty_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push((hash % 500) as f32 / 100.0);
        }
    }
    data
}

/// Creates a grid of deterministic status flag combinations.
///
/// Every cell gets a nonzero combination of the four low flag bits, so
/// coverage summaries built from the result never report an empty cell.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `seed` - Seed value for deterministic generation
///
/// # Returns
///
/// A `Vec<u32>` with flag values in `1..=15`.
pub fn create_status_grid(width: usize, height: usize, seed: u32) -> Vec<u32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push(hash % 15 + 1);
        }
    }
    data
}

/// Creates a grid of deterministic sounding counts.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `seed` - Seed value for deterministic generation
/// * `max` - Largest count the grid may contain
///
/// # Returns
///
/// A `Vec<u32>` with count values in `0..=max`.
pub fn create_point_count_grid(width: usize, height: usize, seed: u32, max: u32) -> Vec<u32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push(hash % (max + 1));
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a grid filled with a constant value.
///
/// Useful for testing edge cases and simple scenarios.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `value` - The constant value to fill
///
/// # Returns
///
/// A `Vec<f32>` filled with the constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}
