//! In-memory 3D volumes
//!
//! A [`VolumeBuffer`] is a transient, uncompressed 3D scalar array: raw sample
//! bytes plus explicit dimensions. Buffers are created during pipeline
//! execution and always wrapped by the codec into a wire message before they
//! are persisted.

pub mod codec;

pub use codec::{CodecError, decode, encode};

/// Fixed-width sample type of a volume.
///
/// Input channels carry signed 16-bit calibrated samples, output masks signed
/// 8-bit labels. The numeric codes are the wire `DataType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Signed 8-bit samples (output masks).
    Byte,
    /// Signed 16-bit samples (input channels).
    Short,
}

impl ElementKind {
    /// Sample width in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementKind::Byte => 1,
            ElementKind::Short => 2,
        }
    }

    /// Wire `DataType` code.
    pub fn wire_code(self) -> i32 {
        match self {
            ElementKind::Byte => 0,
            ElementKind::Short => 1,
        }
    }
}

/// An uncompressed 3D scalar array.
///
/// The linear buffer is interpreted as `data[z][y][x]`: row-major with depth
/// as the outermost axis, matching the dimensions declared alongside the
/// compressed payload in the surrounding message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBuffer {
    pub element: ElementKind,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    data: Vec<u8>,
}

impl VolumeBuffer {
    /// Wraps raw sample bytes, checking that the byte count matches the
    /// declared dimensions exactly.
    pub fn from_raw(
        element: ElementKind,
        width: u32,
        height: u32,
        depth: u32,
        data: Vec<u8>,
    ) -> Result<VolumeBuffer, CodecError> {
        let Some(expected) = expected_len(element, width, height, depth) else {
            return Err(CodecError::OversizedDimensions {
                width,
                height,
                depth,
            });
        };
        if data.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(VolumeBuffer {
            element,
            width,
            height,
            depth,
            data,
        })
    }

    /// Allocates a zero-filled volume.
    ///
    /// Panics if the dimensions overflow addressable memory; callers obtain
    /// them from an existing buffer, where the product is known to fit.
    pub fn zeroed(element: ElementKind, width: u32, height: u32, depth: u32) -> VolumeBuffer {
        let len = expected_len(element, width, height, depth)
            .expect("volume dimensions exceed addressable memory");
        VolumeBuffer {
            element,
            width,
            height,
            depth,
            data: vec![0u8; len],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Linear sample index of `(z, y, x)`.
    pub fn index(&self, z: u32, y: u32, x: u32) -> usize {
        ((z as usize * self.height as usize) + y as usize) * self.width as usize + x as usize
    }

    /// Whether the depth/height/width match another volume exactly.
    pub fn same_shape(&self, other: &VolumeBuffer) -> bool {
        self.width == other.width && self.height == other.height && self.depth == other.depth
    }
}

/// Byte count a volume with these dimensions must hold, or `None` when the
/// product does not fit in memory. Dimensions come off the wire unvalidated,
/// so the arithmetic never trusts them.
pub(crate) fn expected_len(
    element: ElementKind,
    width: u32,
    height: u32,
    depth: u32,
) -> Option<usize> {
    let bytes =
        width as u128 * height as u128 * depth as u128 * element.size() as u128;
    usize::try_from(bytes).ok()
}
