use crate::core::buffer::{self, BufferSlice};
use crate::core::document::{
    Accessor, BufferView, Document, COMPONENT_FLOAT, COMPONENT_HALF_FLOAT,
    COMPONENT_UNSIGNED_BYTE, COMPONENT_UNSIGNED_INT, COMPONENT_UNSIGNED_SHORT,
};

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Accessor {0} has no buffer view")]
    MissingBufferView(usize),
    #[error("Accessor {0} does not exist")]
    NoSuchAccessor(usize),
    #[error("Buffer view {0} does not exist")]
    NoSuchBufferView(usize),
    #[error("Out of bounds: {0}")]
    OutOfBounds(#[from] buffer::Err),
    #[error("Buffer view reads buffer {0}, only buffer 0 is loaded")]
    UnsupportedBuffer(usize),
    #[error("Unsupported component type {component_type} for {usage}")]
    UnsupportedComponentType { component_type: u32, usage: &'static str },
}

/// A fixed-size little-endian record that can be read out of a buffer view.
pub trait ElementType {
    type Value;

    /// Size of one record in bytes; also the stride of tightly packed data.
    const SIZE: usize;

    /// `bytes` is exactly `SIZE` long.
    fn read(bytes: &[u8]) -> Self::Value;
}

/// 8-bit unsigned index.
pub struct U8Index;
/// 16-bit unsigned index.
pub struct U16Index;
/// 32-bit unsigned index.
pub struct U32Index;
/// Two half floats, the MSFS texture coordinate layout.
pub struct HalfVec2;
/// Two 32-bit floats.
pub struct FloatVec2;
/// Three 32-bit floats.
pub struct FloatVec3;

impl ElementType for U8Index {
    type Value = u32;
    const SIZE: usize = 1;
    fn read(bytes: &[u8]) -> u32 {
        bytes[0] as u32
    }
}

impl ElementType for U16Index {
    type Value = u32;
    const SIZE: usize = 2;
    fn read(bytes: &[u8]) -> u32 {
        u16::from_le_bytes([bytes[0], bytes[1]]) as u32
    }
}

impl ElementType for U32Index {
    type Value = u32;
    const SIZE: usize = 4;
    fn read(bytes: &[u8]) -> u32 {
        read_u32(bytes, 0)
    }
}

impl ElementType for HalfVec2 {
    type Value = [f32; 2];
    const SIZE: usize = 4;
    fn read(bytes: &[u8]) -> [f32; 2] {
        [read_f16(bytes, 0), read_f16(bytes, 2)]
    }
}

impl ElementType for FloatVec2 {
    type Value = [f32; 2];
    const SIZE: usize = 8;
    fn read(bytes: &[u8]) -> [f32; 2] {
        [read_f32(bytes, 0), read_f32(bytes, 4)]
    }
}

impl ElementType for FloatVec3 {
    type Value = [f32; 3];
    const SIZE: usize = 12;
    fn read(bytes: &[u8]) -> [f32; 3] {
        [read_f32(bytes, 0), read_f32(bytes, 4), read_f32(bytes, 8)]
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_bits(read_u32(bytes, at))
}

fn read_f16(bytes: &[u8], at: usize) -> f32 {
    half::f16::from_bits(u16::from_le_bytes([bytes[at], bytes[at + 1]])).to_f32()
}

/// Decodes `accessor.count` records of `E` out of `blob`.
///
/// Records start at `accessor.byte_offset` inside the buffer view window and are
/// `view.byte_stride` apart, or `E::SIZE` apart when the view is tightly packed.
/// Every record is bounds-checked against the window, never just against the blob.
pub fn decode<E: ElementType>(
    blob: &[u8],
    view: &BufferView,
    accessor: &Accessor,
) -> Result<Vec<E::Value>, Err> {
    let window = BufferSlice::new(blob, view.byte_offset, view.byte_length)?;
    let stride = view.byte_stride.unwrap_or(E::SIZE);

    let mut out = Vec::with_capacity(accessor.count.min(window.len() / E::SIZE.max(1) + 1));
    for i in 0..accessor.count {
        let offset = i
            .checked_mul(stride)
            .and_then(|o| o.checked_add(accessor.byte_offset))
            .ok_or(buffer::Err::OutOfBounds { offset: usize::MAX, len: E::SIZE, available: window.len() })?;
        out.push(E::read(window.get(offset, E::SIZE)?));
    }
    Ok(out)
}

/// Decodes an index accessor of any unsigned component width into `u32`s.
pub fn decode_indices(doc: &Document, blob: &[u8], index: usize) -> Result<Vec<u32>, Err> {
    let (accessor, view) = lookup(doc, index)?;
    match accessor.component_type {
        COMPONENT_UNSIGNED_SHORT => decode::<U16Index>(blob, view, accessor),
        COMPONENT_UNSIGNED_INT => decode::<U32Index>(blob, view, accessor),
        COMPONENT_UNSIGNED_BYTE => decode::<U8Index>(blob, view, accessor),
        component_type => Err(Err::UnsupportedComponentType { component_type, usage: "indices" }),
    }
}

/// Decodes a texture coordinate accessor stored as half or full floats.
pub fn decode_tex_coords(doc: &Document, blob: &[u8], index: usize) -> Result<Vec<[f32; 2]>, Err> {
    let (accessor, view) = lookup(doc, index)?;
    match accessor.component_type {
        COMPONENT_HALF_FLOAT => decode::<HalfVec2>(blob, view, accessor),
        COMPONENT_FLOAT => decode::<FloatVec2>(blob, view, accessor),
        component_type => Err(Err::UnsupportedComponentType { component_type, usage: "texture coordinates" }),
    }
}

pub fn decode_positions(doc: &Document, blob: &[u8], index: usize) -> Result<Vec<[f32; 3]>, Err> {
    let (accessor, view) = lookup(doc, index)?;
    match accessor.component_type {
        COMPONENT_FLOAT => decode::<FloatVec3>(blob, view, accessor),
        component_type => Err(Err::UnsupportedComponentType { component_type, usage: "positions" }),
    }
}

fn lookup(doc: &Document, index: usize) -> Result<(&Accessor, &BufferView), Err> {
    let accessor = doc.accessors.get(index).ok_or(Err::NoSuchAccessor(index))?;
    let view_index = accessor.buffer_view.ok_or(Err::MissingBufferView(index))?;
    let view = doc.buffer_views.get(view_index).ok_or(Err::NoSuchBufferView(view_index))?;
    if view.buffer != 0 {
        return Err(Err::UnsupportedBuffer(view.buffer));
    }
    Ok((accessor, view))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(byte_offset: usize, byte_length: usize, byte_stride: Option<usize>) -> BufferView {
        BufferView { buffer: 0, byte_offset, byte_length, byte_stride }
    }

    fn accessor(byte_offset: usize, count: usize, component_type: u32) -> Accessor {
        Accessor { buffer_view: Some(0), byte_offset, count, component_type }
    }

    #[test]
    fn packed_u16_indices() {
        let mut blob = vec![0xAAu8; 2];
        for i in [7u16, 8, 9, 300] {
            blob.extend_from_slice(&i.to_le_bytes());
        }
        let out = decode::<U16Index>(&blob, &view(2, 8, None), &accessor(0, 4, COMPONENT_UNSIGNED_SHORT)).unwrap();
        assert_eq!(out, vec![7, 8, 9, 300]);
    }

    #[test]
    fn interleaved_positions_and_half_uvs() {
        // stride 16: position (12 bytes) followed by a half-float uv (4 bytes)
        let mut blob = Vec::new();
        let verts = [([1.0f32, 2.0, 3.0], [0.5f32, 0.25]), ([4.0, 5.0, 6.0], [1.0, 0.0])];
        for (p, uv) in verts {
            for c in p {
                blob.extend_from_slice(&c.to_le_bytes());
            }
            for c in uv {
                blob.extend_from_slice(&half::f16::from_f32(c).to_le_bytes());
            }
        }
        let v = view(0, blob.len(), Some(16));

        let positions = decode::<FloatVec3>(&blob, &v, &accessor(0, 2, COMPONENT_FLOAT)).unwrap();
        assert_eq!(positions, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let uvs = decode::<HalfVec2>(&blob, &v, &accessor(12, 2, COMPONENT_HALF_FLOAT)).unwrap();
        assert_eq!(uvs, vec![[0.5, 0.25], [1.0, 0.0]]);
    }

    #[test]
    fn count_matches_accessor() {
        let blob = vec![0u8; 64];
        for count in [0usize, 1, 5, 16] {
            let out = decode::<FloatVec2>(&blob, &view(0, 64, Some(4)), &accessor(0, count, COMPONENT_FLOAT));
            // the last record must still fit: (count - 1) * 4 + 8 <= 64
            if count == 16 {
                assert!(out.is_err());
            } else {
                assert_eq!(out.unwrap().len(), count);
            }
        }
    }

    #[test]
    fn record_past_view_end_is_out_of_bounds() {
        // The blob has room, the view does not.
        let blob = vec![0u8; 32];
        let out = decode::<U16Index>(&blob, &view(0, 6, None), &accessor(0, 4, COMPONENT_UNSIGNED_SHORT));
        assert!(matches!(out, Err(Err::OutOfBounds(_))));
    }

    #[test]
    fn view_past_blob_end_is_out_of_bounds() {
        let blob = vec![0u8; 8];
        let out = decode::<U16Index>(&blob, &view(4, 8, None), &accessor(0, 1, COMPONENT_UNSIGNED_SHORT));
        assert!(matches!(out, Err(Err::OutOfBounds(_))));
    }

    #[test]
    fn huge_count_overflows_cleanly() {
        let blob = vec![0u8; 8];
        let out = decode::<U16Index>(&blob, &view(0, 8, Some(usize::MAX / 2)), &accessor(0, 4, COMPONENT_UNSIGNED_SHORT));
        assert!(matches!(out, Err(Err::OutOfBounds(_))));
    }

    #[test]
    fn index_width_follows_component_type() {
        let mut blob = Vec::new();
        for i in [1u32, 70000] {
            blob.extend_from_slice(&i.to_le_bytes());
        }
        let doc = Document {
            accessors: vec![accessor(0, 2, COMPONENT_UNSIGNED_INT), accessor(0, 1, COMPONENT_FLOAT)],
            buffer_views: vec![view(0, 8, None)],
            ..Default::default()
        };
        assert_eq!(decode_indices(&doc, &blob, 0).unwrap(), vec![1, 70000]);
        assert!(matches!(
            decode_indices(&doc, &blob, 1),
            Err(Err::UnsupportedComponentType { component_type: COMPONENT_FLOAT, .. })
        ));
        assert_eq!(decode_indices(&doc, &blob, 9), Err(Err::NoSuchAccessor(9)));
    }

    #[test]
    fn views_into_other_buffers_are_rejected() {
        let blob = 7u16.to_le_bytes().to_vec();
        let mut second = view(0, 2, None);
        second.buffer = 1;
        let doc = Document {
            accessors: vec![accessor(0, 1, COMPONENT_UNSIGNED_SHORT)],
            buffer_views: vec![second],
            ..Default::default()
        };
        assert_eq!(decode_indices(&doc, &blob, 0), Err(Err::UnsupportedBuffer(1)));
    }
}
