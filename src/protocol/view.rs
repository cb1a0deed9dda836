//! Buffer views
//!
//! Every decoded wire object is a window into a shared, immutable byte buffer.
//! Views never copy the bytes they describe; they keep a reference-counted
//! handle to the buffer plus an offset and a size.

use super::errors::DecodeError;
use byteorder::{ByteOrder, NativeEndian};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable, cheaply clonable byte buffer handed over by the native layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer(Arc<[u8]>);

impl Buffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles refer to the same allocation
    pub fn ptr_eq(a: &Buffer, b: &Buffer) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer(bytes.into())
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Buffer(bytes.into())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({} bytes)", self.0.len())
    }
}

/// Protocol role of a view type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Struct,
    Union,
    List,
    Event,
    Response,
    Error,
    Cookie,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::Struct => "struct",
            ViewKind::Union => "union",
            ViewKind::List => "list",
            ViewKind::Event => "event",
            ViewKind::Response => "response",
            ViewKind::Error => "error",
            ViewKind::Cookie => "cookie",
        };
        f.write_str(name)
    }
}

/// A zero-copy `(buffer, offset, size)` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    parent: Buffer,
    offset: usize,
    size: usize,
}

impl BufferView {
    /// Create a view over `parent` starting at `offset`.
    ///
    /// Without an explicit `size` the view covers everything from `offset` to
    /// the end of the buffer. An explicit size must fit inside the buffer.
    pub fn new(parent: &Buffer, offset: usize, size: Option<usize>) -> Result<Self, DecodeError> {
        let len = parent.len();
        if offset > len {
            return Err(DecodeError::OffsetOutOfBounds { offset, len });
        }

        let size = match size {
            Some(size) => {
                match offset.checked_add(size) {
                    Some(end) if end <= len => size,
                    _ => return Err(DecodeError::SizeOutOfBounds { offset, size, len }),
                }
            }
            None => len - offset,
        };

        Ok(BufferView {
            parent: parent.clone(),
            offset,
            size,
        })
    }

    /// The backing buffer
    pub fn parent(&self) -> &Buffer {
        &self.parent
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Usable size of this view in bytes
    pub fn bufsize(&self) -> usize {
        self.size
    }

    /// Absolute offset one past the last byte of the view
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// The bytes covered by this view
    pub fn bytes(&self) -> &[u8] {
        &self.parent[self.offset..self.end()]
    }

    /// Narrow this view to `size` bytes starting `at` bytes into it.
    pub fn slice(&self, at: usize, size: usize) -> Result<BufferView, DecodeError> {
        self.field(at, size)?;
        BufferView::new(&self.parent, self.offset + at, Some(size))
    }

    fn field(&self, at: usize, width: usize) -> Result<&[u8], DecodeError> {
        match at.checked_add(width) {
            Some(end) if end <= self.size => Ok(&self.bytes()[at..end]),
            _ => Err(DecodeError::FieldOutOfBounds {
                at,
                width,
                size: self.size,
            }),
        }
    }

    pub fn read_u8(&self, at: usize) -> Result<u8, DecodeError> {
        Ok(self.field(at, 1)?[0])
    }

    pub fn read_u16(&self, at: usize) -> Result<u16, DecodeError> {
        Ok(NativeEndian::read_u16(self.field(at, 2)?))
    }

    pub fn read_i16(&self, at: usize) -> Result<i16, DecodeError> {
        Ok(NativeEndian::read_i16(self.field(at, 2)?))
    }

    pub fn read_u32(&self, at: usize) -> Result<u32, DecodeError> {
        Ok(NativeEndian::read_u32(self.field(at, 4)?))
    }

    pub fn read_i32(&self, at: usize) -> Result<i32, DecodeError> {
        Ok(NativeEndian::read_i32(self.field(at, 4)?))
    }

    /// `width` raw bytes starting `at` bytes into the view
    pub fn read_bytes(&self, at: usize, width: usize) -> Result<&[u8], DecodeError> {
        self.field(at, width)
    }
}

/// Anything backed by a [`BufferView`]
pub trait View {
    fn view(&self) -> &BufferView;

    fn bufsize(&self) -> usize {
        self.view().bufsize()
    }
}

/// A view type that can be constructed at an offset of a buffer.
///
/// `decode` is responsible for working out the object's own size; object-mode
/// lists rely on it to find where the next element starts.
pub trait Protobj: View + Sized {
    const KIND: ViewKind;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError>;
}

/// Type-erased view constructor, used by the extension tables.
#[derive(Clone, Copy)]
pub struct ViewType {
    pub name: &'static str,
    pub kind: ViewKind,
    decode: fn(&Buffer, usize) -> Result<BufferView, DecodeError>,
}

impl ViewType {
    pub fn new(
        name: &'static str,
        kind: ViewKind,
        decode: fn(&Buffer, usize) -> Result<BufferView, DecodeError>,
    ) -> Self {
        ViewType { name, kind, decode }
    }

    /// Descriptor for a concrete [`Protobj`] type
    pub fn of<T: Protobj>(name: &'static str) -> Self {
        ViewType {
            name,
            kind: T::KIND,
            decode: decode_view::<T>,
        }
    }

    pub fn decode(&self, parent: &Buffer, offset: usize) -> Result<BufferView, DecodeError> {
        (self.decode)(parent, offset)
    }
}

impl fmt::Debug for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn decode_view<T: Protobj>(parent: &Buffer, offset: usize) -> Result<BufferView, DecodeError> {
    T::decode(parent, offset).map(|obj| obj.view().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(len: usize) -> Buffer {
        (0..len as u8).collect::<Vec<u8>>().into()
    }

    #[test]
    fn test_default_size_is_remaining() {
        let buf = buffer(32);
        for offset in [0, 1, 7, 31, 32] {
            let view = BufferView::new(&buf, offset, None).unwrap();
            assert_eq!(view.bufsize(), 32 - offset);
        }
    }

    #[test]
    fn test_offset_past_end() {
        let buf = buffer(8);
        assert_eq!(
            BufferView::new(&buf, 9, None),
            Err(DecodeError::OffsetOutOfBounds { offset: 9, len: 8 })
        );
    }

    #[test]
    fn test_explicit_size_bounds() {
        let buf = buffer(16);
        assert_eq!(BufferView::new(&buf, 4, Some(12)).unwrap().bufsize(), 12);
        assert!(matches!(
            BufferView::new(&buf, 4, Some(13)),
            Err(DecodeError::SizeOutOfBounds { offset: 4, size: 13, len: 16 })
        ));
        assert!(BufferView::new(&buf, 1, Some(usize::MAX)).is_err());
    }

    #[test]
    fn test_views_share_buffer() {
        let buf = buffer(16);
        let view = BufferView::new(&buf, 4, Some(8)).unwrap();
        assert_eq!(view.bytes().as_ptr(), buf[4..].as_ptr());
        assert_eq!(view.bytes(), &[4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_field_reads() {
        let mut bytes = vec![0u8; 8];
        NativeEndian::write_u16(&mut bytes[2..4], 0xbeef);
        NativeEndian::write_u32(&mut bytes[4..8], 0xdeadbeef);
        let buf = Buffer::from(bytes);
        let view = BufferView::new(&buf, 0, None).unwrap();

        assert_eq!(view.read_u16(2).unwrap(), 0xbeef);
        assert_eq!(view.read_u32(4).unwrap(), 0xdeadbeef);
        assert_eq!(
            view.read_u32(6),
            Err(DecodeError::FieldOutOfBounds { at: 6, width: 4, size: 8 })
        );
    }

    #[test]
    fn test_slice_stays_inside_view() {
        let buf = buffer(16);
        let view = BufferView::new(&buf, 2, Some(6)).unwrap();
        let inner = view.slice(2, 4).unwrap();
        assert_eq!(inner.offset(), 4);
        assert_eq!(inner.bytes(), &[4, 5, 6, 7]);
        assert!(view.slice(4, 4).is_err());
    }
}
