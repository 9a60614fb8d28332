//! Ring file layout: a flat run of little-endian `f32` values read two at a
//! time as `(lon, lat)` vertex pairs. No header and no length prefix; the
//! vertex count is `file size / 8`. The closing vertex is implicit.

use crate::error::{Result, TzError};

/// Bytes per encoded vertex (two `f32`).
pub const VERTEX_BYTES: usize = 8;

/// Decode a ring file into vertices.
pub fn decode_ring(bytes: &[u8]) -> Result<Vec<[f64; 2]>> {
    if bytes.len() % VERTEX_BYTES != 0 {
        return Err(TzError::Ring(format!(
            "truncated ring data: {} bytes is not a multiple of {VERTEX_BYTES}",
            bytes.len()
        )));
    }

    let mut vertices = Vec::with_capacity(bytes.len() / VERTEX_BYTES);
    for (i, chunk) in bytes.chunks_exact(VERTEX_BYTES).enumerate() {
        let x = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let y = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        if !x.is_finite() || !y.is_finite() {
            return Err(TzError::Ring(format!(
                "non-finite coordinate at vertex {i}: ({x}, {y})"
            )));
        }
        vertices.push([x as f64, y as f64]);
    }

    Ok(vertices)
}

/// Encode vertices into the ring file layout. Coordinates are narrowed to `f32`.
pub fn encode_ring(vertices: &[[f64; 2]]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vertices.len() * VERTEX_BYTES);
    for v in vertices {
        bytes.extend_from_slice(&(v[0] as f32).to_le_bytes());
        bytes.extend_from_slice(&(v[1] as f32).to_le_bytes());
    }
    bytes
}
