//! Core protocol descriptors
//!
//! Views over the connection setup reply and the core event and error tables.
//! All fields are read in host byte order straight out of the setup buffer.

use super::{padded_len, Buffer, BufferView, DecodeError, Element, List, Protobj, Struct, View, ViewKind, ViewType};
use crate::error::RegistrationError;
use crate::extension::{ErrorTable, EventTable, Extension, ExtensionKey, Registry};
use std::sync::Arc;

/// Core events and replies are always 32 bytes on the wire
pub const PACKET_LEN: usize = 32;

const SETUP_HEADER_LEN: usize = 40;
const SCREEN_HEADER_LEN: usize = 40;
const DEPTH_HEADER_LEN: usize = 8;
const VISUAL_TYPE_LEN: usize = 24;
const FORMAT_LEN: usize = 8;

/// Core event codes and their names
pub const EVENTS: &[(u8, &str)] = &[
    (2, "KeyPress"),
    (3, "KeyRelease"),
    (4, "ButtonPress"),
    (5, "ButtonRelease"),
    (6, "MotionNotify"),
    (7, "EnterNotify"),
    (8, "LeaveNotify"),
    (9, "FocusIn"),
    (10, "FocusOut"),
    (11, "KeymapNotify"),
    (12, "Expose"),
    (13, "GraphicsExposure"),
    (14, "NoExposure"),
    (15, "VisibilityNotify"),
    (16, "CreateNotify"),
    (17, "DestroyNotify"),
    (18, "UnmapNotify"),
    (19, "MapNotify"),
    (20, "MapRequest"),
    (21, "ReparentNotify"),
    (22, "ConfigureNotify"),
    (23, "ConfigureRequest"),
    (24, "GravityNotify"),
    (25, "ResizeRequest"),
    (26, "CirculateNotify"),
    (27, "CirculateRequest"),
    (28, "PropertyNotify"),
    (29, "SelectionClear"),
    (30, "SelectionRequest"),
    (31, "SelectionNotify"),
    (32, "ColormapNotify"),
    (33, "ClientMessage"),
    (34, "MappingNotify"),
];

/// Core error codes and their names
pub const ERRORS: &[(u8, &str)] = &[
    (1, "Request"),
    (2, "Value"),
    (3, "Window"),
    (4, "Pixmap"),
    (5, "Atom"),
    (6, "Cursor"),
    (7, "Font"),
    (8, "Match"),
    (9, "Drawable"),
    (10, "Access"),
    (11, "Alloc"),
    (12, "Colormap"),
    (13, "GContext"),
    (14, "IDChoice"),
    (15, "Name"),
    (16, "Length"),
    (17, "Implementation"),
];

/// The core protocol extension
#[derive(Debug)]
pub struct Xproto {
    key: ExtensionKey,
}

impl Xproto {
    pub fn new() -> Self {
        Xproto {
            key: ExtensionKey::new("xproto"),
        }
    }
}

impl Default for Xproto {
    fn default() -> Self {
        Self::new()
    }
}

impl Extension for Xproto {
    fn key(&self) -> &ExtensionKey {
        &self.key
    }
}

fn event_packet(parent: &Buffer, offset: usize) -> Result<BufferView, DecodeError> {
    BufferView::new(parent, offset, Some(PACKET_LEN))
}

// Error views start at the code byte, one past the response type
fn error_packet(parent: &Buffer, offset: usize) -> Result<BufferView, DecodeError> {
    BufferView::new(parent, offset, Some(PACKET_LEN - 1))
}

/// Register the core protocol: its setup type and event/error tables.
pub fn register(registry: &Registry) -> Result<(), RegistrationError> {
    let events: EventTable = EVENTS
        .iter()
        .map(|&(code, name)| (code, ViewType::new(name, ViewKind::Event, event_packet)))
        .collect();
    let errors: ErrorTable = ERRORS
        .iter()
        .map(|&(code, name)| (code, ViewType::new(name, ViewKind::Error, error_packet)))
        .collect();

    registry.add_core(
        Arc::new(Xproto::new()),
        ViewType::of::<Setup>("Setup"),
        events,
        errors,
    )
}

/// Connection setup reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup(Struct);

impl From<Struct> for Setup {
    fn from(s: Struct) -> Self {
        Setup(s)
    }
}

impl View for Setup {
    fn view(&self) -> &BufferView {
        self.0.view()
    }
}

impl Protobj for Setup {
    const KIND: ViewKind = ViewKind::Struct;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        Struct::decode(parent, offset).map(Setup)
    }
}

impl Setup {
    pub fn status(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(0)
    }

    pub fn protocol_major_version(&self) -> Result<u16, DecodeError> {
        self.view().read_u16(2)
    }

    pub fn protocol_minor_version(&self) -> Result<u16, DecodeError> {
        self.view().read_u16(4)
    }

    /// Length of the reply after the first 8 bytes, in 4-byte units
    pub fn length(&self) -> Result<u16, DecodeError> {
        self.view().read_u16(6)
    }

    pub fn release_number(&self) -> Result<u32, DecodeError> {
        self.view().read_u32(8)
    }

    pub fn resource_id_base(&self) -> Result<u32, DecodeError> {
        self.view().read_u32(12)
    }

    pub fn resource_id_mask(&self) -> Result<u32, DecodeError> {
        self.view().read_u32(16)
    }

    pub fn motion_buffer_size(&self) -> Result<u32, DecodeError> {
        self.view().read_u32(20)
    }

    pub fn vendor_len(&self) -> Result<u16, DecodeError> {
        self.view().read_u16(24)
    }

    pub fn maximum_request_length(&self) -> Result<u16, DecodeError> {
        self.view().read_u16(26)
    }

    pub fn roots_len(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(28)
    }

    pub fn pixmap_formats_len(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(29)
    }

    pub fn image_byte_order(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(30)
    }

    pub fn bitmap_format_bit_order(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(31)
    }

    pub fn bitmap_format_scanline_unit(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(32)
    }

    pub fn bitmap_format_scanline_pad(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(33)
    }

    pub fn min_keycode(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(34)
    }

    pub fn max_keycode(&self) -> Result<u8, DecodeError> {
        self.view().read_u8(35)
    }

    pub fn vendor(&self) -> Result<&[u8], DecodeError> {
        let len = self.vendor_len()? as usize;
        self.view().read_bytes(SETUP_HEADER_LEN, len)
    }

    fn formats_offset(&self) -> Result<usize, DecodeError> {
        Ok(SETUP_HEADER_LEN + padded_len(self.vendor_len()? as usize))
    }

    pub fn pixmap_formats(&self) -> Result<List<Format>, DecodeError> {
        let at = self.formats_offset()?;
        let len = self.pixmap_formats_len()? as usize * FORMAT_LEN;
        let view = self.view();
        List::new(view.parent(), view.offset() + at, len, Element::object())
    }

    /// Screens, each sized by the depths and visuals it carries
    pub fn roots(&self) -> Result<List<Screen>, DecodeError> {
        let at = self.formats_offset()? + self.pixmap_formats_len()? as usize * FORMAT_LEN;
        let total = 8 + self.length()? as usize * 4;
        let view = self.view();
        let len = total.checked_sub(at).ok_or(DecodeError::FieldOutOfBounds {
            at,
            width: 0,
            size: total,
        })?;
        List::new(view.parent(), view.offset() + at, len, Element::object())
    }
}

/// Pixmap format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format(BufferView);

impl View for Format {
    fn view(&self) -> &BufferView {
        &self.0
    }
}

impl Protobj for Format {
    const KIND: ViewKind = ViewKind::Struct;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        BufferView::new(parent, offset, Some(FORMAT_LEN)).map(Format)
    }
}

impl Format {
    pub fn depth(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(0)
    }

    pub fn bits_per_pixel(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(1)
    }

    pub fn scanline_pad(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(2)
    }
}

/// Screen description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen(BufferView);

impl View for Screen {
    fn view(&self) -> &BufferView {
        &self.0
    }
}

impl Protobj for Screen {
    const KIND: ViewKind = ViewKind::Struct;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        let rest = BufferView::new(parent, offset, None)?;
        let depths = rest.read_u8(39)?;

        let mut size = SCREEN_HEADER_LEN;
        for _ in 0..depths {
            let visuals = rest.read_u16(size + 2)? as usize;
            size += DEPTH_HEADER_LEN + visuals * VISUAL_TYPE_LEN;
        }

        BufferView::new(parent, offset, Some(size)).map(Screen)
    }
}

impl Screen {
    pub fn root(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(0)
    }

    pub fn default_colormap(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(4)
    }

    pub fn white_pixel(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(8)
    }

    pub fn black_pixel(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(12)
    }

    pub fn current_input_masks(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(16)
    }

    pub fn width_in_pixels(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(20)
    }

    pub fn height_in_pixels(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(22)
    }

    pub fn width_in_millimeters(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(24)
    }

    pub fn height_in_millimeters(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(26)
    }

    pub fn min_installed_maps(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(28)
    }

    pub fn max_installed_maps(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(30)
    }

    pub fn root_visual(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(32)
    }

    pub fn backing_stores(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(36)
    }

    pub fn save_unders(&self) -> Result<bool, DecodeError> {
        Ok(self.0.read_u8(37)? != 0)
    }

    pub fn root_depth(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(38)
    }

    pub fn allowed_depths_len(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(39)
    }

    pub fn allowed_depths(&self) -> Result<List<Depth>, DecodeError> {
        List::new(
            self.0.parent(),
            self.0.offset() + SCREEN_HEADER_LEN,
            self.0.bufsize() - SCREEN_HEADER_LEN,
            Element::object(),
        )
    }
}

/// Depth with its visuals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth(BufferView);

impl View for Depth {
    fn view(&self) -> &BufferView {
        &self.0
    }
}

impl Protobj for Depth {
    const KIND: ViewKind = ViewKind::Struct;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        let visuals = BufferView::new(parent, offset, None)?.read_u16(2)? as usize;
        let size = DEPTH_HEADER_LEN + visuals * VISUAL_TYPE_LEN;
        BufferView::new(parent, offset, Some(size)).map(Depth)
    }
}

impl Depth {
    pub fn depth(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(0)
    }

    pub fn visuals_len(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(2)
    }

    pub fn visuals(&self) -> Result<List<VisualType>, DecodeError> {
        List::new(
            self.0.parent(),
            self.0.offset() + DEPTH_HEADER_LEN,
            self.0.bufsize() - DEPTH_HEADER_LEN,
            Element::object(),
        )
    }
}

/// Visual type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualType(BufferView);

impl View for VisualType {
    fn view(&self) -> &BufferView {
        &self.0
    }
}

impl Protobj for VisualType {
    const KIND: ViewKind = ViewKind::Struct;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        BufferView::new(parent, offset, Some(VISUAL_TYPE_LEN)).map(VisualType)
    }
}

impl VisualType {
    pub fn visual_id(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(0)
    }

    pub fn class(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(4)
    }

    pub fn bits_per_rgb_value(&self) -> Result<u8, DecodeError> {
        self.0.read_u8(5)
    }

    pub fn colormap_entries(&self) -> Result<u16, DecodeError> {
        self.0.read_u16(6)
    }

    pub fn red_mask(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(8)
    }

    pub fn green_mask(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(12)
    }

    pub fn blue_mask(&self) -> Result<u32, DecodeError> {
        self.0.read_u32(16)
    }
}
