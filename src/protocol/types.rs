//! Plain protocol views
//!
//! Structs, unions, replies and cookies carry no state beyond their buffer
//! view; the type only records which protocol role the bytes play.

use super::errors::DecodeError;
use super::view::{Buffer, BufferView, Protobj, View, ViewKind};

macro_rules! plain_view {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(BufferView);

        impl $name {
            pub fn new(parent: &Buffer, offset: usize, size: Option<usize>) -> Result<Self, DecodeError> {
                BufferView::new(parent, offset, size).map($name)
            }
        }

        impl From<BufferView> for $name {
            fn from(view: BufferView) -> Self {
                $name(view)
            }
        }

        impl View for $name {
            fn view(&self) -> &BufferView {
                &self.0
            }
        }

        impl Protobj for $name {
            const KIND: ViewKind = ViewKind::$kind;

            fn decode(parent: &Buffer, offset: usize) -> Result<Self, DecodeError> {
                $name::new(parent, offset, None)
            }
        }
    };
}

plain_view!(
    /// Fixed-layout protocol structure
    Struct,
    Struct
);

plain_view!(
    /// Protocol union; every member overlays the same bytes
    Union,
    Union
);

plain_view!(
    /// Reply to a request
    Response,
    Response
);

plain_view!(
    /// Result of a request that has no reply
    VoidCookie,
    Cookie
);
