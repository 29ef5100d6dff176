//! Vertex and index buffer contracts, plus CPU-side implementations.
//!
//! The simulation core does not talk to a GPU directly. It writes into a
//! [`VertexSink`]/[`IndexSink`] pair and tells them how many live elements
//! they hold; whatever owns the GPU resources uploads the byte views on
//! commit. [`QuadVertexBuffer`] and [`QuadIndexBuffer`] are the built-in
//! CPU implementations: each particle occupies one quad of 4 vertices
//! sharing its attributes, distinguished only by a pre-filled 2-float
//! corner offset.

use crate::format::VertexAttribute;
use log::debug;

/// Quad corner offsets, one per vertex, written once at allocation.
///
/// Order matches [`QUAD_INDICES`]: bottom-left, bottom-right, top-left,
/// top-right.
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]];

/// Two counter-clockwise triangles per quad, relative to its first vertex.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Destination for the packed per-particle float stream.
///
/// Mirrors what a GPU vertex buffer wrapper exposes: attribute
/// registration, a resize-to-capacity operation, raw float storage, and a
/// commit that publishes the live count and stride.
pub trait VertexSink {
    /// Register the attribute layout for the current vertex format.
    fn set_attributes(&mut self, attributes: &[VertexAttribute]);

    /// Reallocate storage for `quad_capacity` quads of `vertex_size`
    /// floats per vertex, pre-filling the corner offsets.
    fn resize(&mut self, quad_capacity: usize, vertex_size: usize);

    /// The raw float storage the packer writes into.
    fn data_mut(&mut self) -> &mut [f32];

    /// Publish the number of live quads and the stride they were packed
    /// with.
    fn commit(&mut self, live_count: usize, vertex_size: usize);
}

/// Destination for quad index data.
pub trait IndexSink {
    /// Regenerate index data for exactly `live_count` quads.
    fn commit(&mut self, live_count: usize);
}

/// CPU quad vertex buffer.
///
/// Holds `4 * capacity * vertex_size` floats. Corner offsets occupy the
/// first two floats of every vertex and survive packing untouched; the
/// packer only rewrites floats from offset 2 upward.
#[derive(Debug, Default)]
pub struct QuadVertexBuffer {
    attributes: Vec<VertexAttribute>,
    data: Vec<f32>,
    quad_capacity: usize,
    vertex_size: usize,
    live_count: usize,
}

impl QuadVertexBuffer {
    /// Create an empty buffer; the system resizes it on format changes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered attribute layout.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// The full float storage, including dead tail data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of live quads as of the last commit.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Float stride per vertex as of the last resize.
    pub fn vertex_size(&self) -> usize {
        self.vertex_size
    }

    /// Quad capacity as of the last resize.
    pub fn quad_capacity(&self) -> usize {
        self.quad_capacity
    }

    /// Byte view of the live portion of the stream, ready for upload.
    pub fn live_bytes(&self) -> &[u8] {
        let floats = self.live_count * 4 * self.vertex_size;
        bytemuck::cast_slice(&self.data[..floats])
    }
}

impl VertexSink for QuadVertexBuffer {
    fn set_attributes(&mut self, attributes: &[VertexAttribute]) {
        self.attributes.clear();
        self.attributes.extend_from_slice(attributes);
    }

    fn resize(&mut self, quad_capacity: usize, vertex_size: usize) {
        debug!(
            "vertex buffer resize: {} quads, stride {} floats",
            quad_capacity, vertex_size
        );
        self.quad_capacity = quad_capacity;
        self.vertex_size = vertex_size;
        self.live_count = 0;
        self.data.clear();
        self.data.resize(quad_capacity * 4 * vertex_size, 0.0);

        for quad in 0..quad_capacity {
            for (corner, offset) in QUAD_CORNERS.iter().enumerate() {
                let base = (quad * 4 + corner) * vertex_size;
                self.data[base] = offset[0];
                self.data[base + 1] = offset[1];
            }
        }
    }

    fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    fn commit(&mut self, live_count: usize, _vertex_size: usize) {
        self.live_count = live_count;
    }
}

/// CPU quad index buffer with u16 indices.
///
/// u16 addressing caps the pool at 16384 quads (65536 vertices), which is
/// also the default system count limit.
#[derive(Debug, Default)]
pub struct QuadIndexBuffer {
    indices: Vec<u16>,
    quad_count: usize,
}

impl QuadIndexBuffer {
    /// Create an empty index buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index data for the committed quad count.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of quads covered by the current index data.
    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    /// Byte view of the index data, ready for upload.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

impl IndexSink for QuadIndexBuffer {
    fn commit(&mut self, live_count: usize) {
        self.quad_count = live_count;
        self.indices.clear();
        self.indices.reserve(live_count * QUAD_INDICES.len());
        for quad in 0..live_count {
            let base = (quad * 4) as u16;
            self.indices
                .extend(QUAD_INDICES.iter().map(|&i| base + i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_prefills_corner_offsets() {
        let mut buffer = QuadVertexBuffer::new();
        buffer.resize(2, 5);
        assert_eq!(buffer.data().len(), 2 * 4 * 5);

        for quad in 0..2 {
            for corner in 0..4 {
                let base = (quad * 4 + corner) * 5;
                assert_eq!(buffer.data()[base], QUAD_CORNERS[corner][0]);
                assert_eq!(buffer.data()[base + 1], QUAD_CORNERS[corner][1]);
            }
        }
    }

    #[test]
    fn test_commit_tracks_live_count() {
        let mut buffer = QuadVertexBuffer::new();
        buffer.resize(4, 5);
        buffer.commit(3, 5);
        assert_eq!(buffer.live_count(), 3);
        assert_eq!(buffer.live_bytes().len(), 3 * 4 * 5 * 4);
    }

    #[test]
    fn test_index_buffer_generates_two_triangles_per_quad() {
        let mut buffer = QuadIndexBuffer::new();
        buffer.commit(2);
        assert_eq!(
            buffer.indices(),
            &[0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]
        );
        assert_eq!(buffer.quad_count(), 2);
    }

    #[test]
    fn test_index_buffer_shrinks_on_commit() {
        let mut buffer = QuadIndexBuffer::new();
        buffer.commit(10);
        buffer.commit(1);
        assert_eq!(buffer.indices().len(), 6);
    }
}
