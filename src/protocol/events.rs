//! X11 protocol events
//!
//! Events arrive from the server asynchronously. The first byte of every event
//! packet is its response type; the high bit marks events sent with SendEvent.

use super::errors::DecodeError;
use super::view::{Buffer, BufferView, Protobj, View, ViewKind};

/// Bit set in the response type of synthetic events
pub const SEND_EVENT_MASK: u8 = 0x80;

/// Event view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    view: BufferView,
    response_type: u8,
    name: Option<&'static str>,
}

impl Event {
    /// Wrap an already bounded view, tagging it with a registered name.
    pub fn from_view(view: BufferView, name: Option<&'static str>) -> Result<Self, DecodeError> {
        let response_type = view.read_u8(0)?;
        Ok(Event {
            view,
            response_type,
            name,
        })
    }

    /// Raw response type, including the SendEvent bit
    pub fn response_type(&self) -> u8 {
        self.response_type
    }

    /// Event code with the SendEvent bit stripped
    pub fn code(&self) -> u8 {
        self.response_type & !SEND_EVENT_MASK
    }

    /// True when the event was generated by another client
    pub fn is_synthetic(&self) -> bool {
        self.response_type & SEND_EVENT_MASK != 0
    }

    /// Name from the event table, if the code was registered
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl View for Event {
    fn view(&self) -> &BufferView {
        &self.view
    }
}

impl Protobj for Event {
    const KIND: ViewKind = ViewKind::Event;

    fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
        Event::from_view(BufferView::new(parent, offset, None)?, None)
    }
}
