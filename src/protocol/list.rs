//! Variable-length lists
//!
//! A list is either a run of fixed-width scalars, unpacked in one pass at a
//! fixed stride, or a run of self-sizing objects, decoded one after another
//! with each element's size moving the cursor to the next.

use super::errors::DecodeError;
use super::view::{Buffer, BufferView, Protobj, View};
use byteorder::{ByteOrder, NativeEndian};
use std::fmt;
use std::ops::Index;

/// Primitive wire formats, named after their struct-style format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Card8,
    Int8,
    Card16,
    Int16,
    Card32,
    Int32,
    Card64,
    Int64,
    Float,
    Double,
}

impl Format {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'B' => Some(Format::Card8),
            'b' => Some(Format::Int8),
            'H' => Some(Format::Card16),
            'h' => Some(Format::Int16),
            'I' => Some(Format::Card32),
            'i' => Some(Format::Int32),
            'Q' => Some(Format::Card64),
            'q' => Some(Format::Int64),
            'f' => Some(Format::Float),
            'd' => Some(Format::Double),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Format::Card8 => 'B',
            Format::Int8 => 'b',
            Format::Card16 => 'H',
            Format::Int16 => 'h',
            Format::Card32 => 'I',
            Format::Int32 => 'i',
            Format::Card64 => 'Q',
            Format::Int64 => 'q',
            Format::Float => 'f',
            Format::Double => 'd',
        }
    }

    /// Width in bytes
    pub fn size(&self) -> usize {
        match self {
            Format::Card8 | Format::Int8 => 1,
            Format::Card16 | Format::Int16 => 2,
            Format::Card32 | Format::Int32 | Format::Float => 4,
            Format::Card64 | Format::Int64 | Format::Double => 8,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rust types that can be unpacked from a primitive wire format
pub trait Scalar: Copy {
    const FORMAT: Format;

    /// Unpack from exactly `FORMAT.size()` bytes in host order.
    fn unpack(bytes: &[u8]) -> Self;
}

macro_rules! scalar {
    ($ty:ty, $format:ident, |$b:ident| $read:expr) => {
        impl Scalar for $ty {
            const FORMAT: Format = Format::$format;

            fn unpack($b: &[u8]) -> Self {
                $read
            }
        }
    };
}

scalar!(u8, Card8, |b| b[0]);
scalar!(i8, Int8, |b| b[0] as i8);
scalar!(u16, Card16, |b| NativeEndian::read_u16(b));
scalar!(i16, Int16, |b| NativeEndian::read_i16(b));
scalar!(u32, Card32, |b| NativeEndian::read_u32(b));
scalar!(i32, Int32, |b| NativeEndian::read_i32(b));
scalar!(u64, Card64, |b| NativeEndian::read_u64(b));
scalar!(i64, Int64, |b| NativeEndian::read_i64(b));
scalar!(f32, Float, |b| NativeEndian::read_f32(b));
scalar!(f64, Double, |b| NativeEndian::read_f64(b));

/// How list elements are laid out on the wire
pub enum Element<T> {
    /// Fixed-width scalars, `stride` bytes apart
    Scalar {
        format: Format,
        stride: usize,
        unpack: fn(&[u8]) -> T,
    },
    /// Self-sizing objects packed back to back
    Object {
        decode: fn(&Buffer, usize) -> Result<T, DecodeError>,
        size: fn(&T) -> usize,
    },
}

impl<T: Scalar> Element<T> {
    pub fn scalar(stride: usize) -> Self {
        Element::Scalar {
            format: T::FORMAT,
            stride,
            unpack: T::unpack,
        }
    }
}

impl<T: Protobj> Element<T> {
    pub fn object() -> Self {
        Element::Object {
            decode: T::decode,
            size: <T as View>::bufsize,
        }
    }
}

impl<T> Clone for Element<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Element<T> {}

impl<T> fmt::Debug for Element<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Scalar { format, stride, .. } => f
                .debug_struct("Scalar")
                .field("format", format)
                .field("stride", stride)
                .finish(),
            Element::Object { .. } => f.write_str("Object"),
        }
    }
}

/// Decoded list of `T`
#[derive(Debug, Clone)]
pub struct List<T> {
    view: BufferView,
    items: Vec<T>,
}

impl<T> List<T> {
    /// Decode `length` bytes of `parent` starting at `offset`.
    pub fn new(
        parent: &Buffer,
        offset: usize,
        length: usize,
        element: Element<T>,
    ) -> Result<Self, DecodeError> {
        let view = BufferView::new(parent, offset, Some(length))?;

        let items = match element {
            Element::Scalar {
                format,
                stride,
                unpack,
            } => {
                if stride == 0 || length % stride != 0 {
                    return Err(DecodeError::MalformedLength { length, stride });
                }
                if format.size() > stride {
                    return Err(DecodeError::StrideTooNarrow { format, stride });
                }

                let width = format.size();
                view.bytes()
                    .chunks_exact(stride)
                    .map(|chunk| unpack(&chunk[..width]))
                    .collect()
            }
            Element::Object { decode, size } => {
                let end = view.end();
                let mut cursor = offset;
                let mut items = Vec::new();

                while cursor < end {
                    let item = decode(parent, cursor)?;
                    let item_size = size(&item);
                    if item_size == 0 {
                        return Err(DecodeError::EmptyElement { offset: cursor });
                    }
                    if item_size > end - cursor {
                        return Err(DecodeError::ElementOverrun {
                            offset: cursor,
                            size: item_size,
                            end,
                        });
                    }
                    cursor += item_size;
                    items.push(item);
                }

                items
            }
        };

        log::trace!(
            "Decoded {} list elements from {} bytes at offset {}",
            items.len(),
            length,
            offset
        );

        Ok(List { view, items })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> View for List<T> {
    fn view(&self) -> &BufferView {
        &self.view
    }
}

impl<T> Index<usize> for List<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
