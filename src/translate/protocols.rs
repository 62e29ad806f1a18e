//! WM_PROTOCOLS handling
//!
//! The client-message filter every display installs for `WM_PROTOCOLS`.
//! Filters cannot reach the display, so platform work the protocol needs
//! (answering a ping, taking focus) is recorded in the shared context and
//! carried out by the translator once the filter returns.

use std::cell::RefCell;

use tracing::debug;

use crate::atoms::Atoms;
use crate::events::native::{NativeEvent, NativeKind};
use crate::events::{Atom, Event, EventKind, NativeHandle, Time};
use crate::filter::{FilterData, FilterReturn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolRequest {
    /// `WM_TAKE_FOCUS`: focus the window with the message's timestamp
    TakeFocus { window: NativeHandle, time: Time },
    /// `_NET_WM_PING`: send the message back to the root window
    Ping { message_type: Atom, data: [u32; 5] },
}

#[derive(Debug)]
pub struct ProtocolContext {
    atoms: Atoms,
    requests: RefCell<Vec<ProtocolRequest>>,
}

impl ProtocolContext {
    pub fn new(atoms: Atoms) -> Self {
        Self {
            atoms,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn take_requests(&self) -> Vec<ProtocolRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    fn push(&self, request: ProtocolRequest) {
        self.requests.borrow_mut().push(request);
    }
}

/// Filter for `WM_PROTOCOLS` client messages.
///
/// `WM_DELETE_WINDOW` becomes a [`EventKind::Delete`] event; every other
/// protocol is handled here and removed.
pub fn wm_protocols_filter(
    native: &NativeEvent,
    event: &mut Event,
    data: Option<&FilterData>,
) -> FilterReturn {
    let Some(context) = data.and_then(|data| data.downcast_ref::<ProtocolContext>()) else {
        return FilterReturn::Continue;
    };
    let NativeKind::ClientMessage { data, .. } = &native.kind else {
        return FilterReturn::Continue;
    };
    let atoms = &context.atoms;
    let protocol = data[0];

    if protocol == atoms.wm_delete_window {
        debug!("WM_DELETE_WINDOW for window {:?}", native.window);
        event.kind = EventKind::Delete;
        return FilterReturn::Translate;
    }

    if protocol == atoms.wm_take_focus {
        if let Some(window) = native.window {
            context.push(ProtocolRequest::TakeFocus {
                window,
                time: data[1],
            });
        }
    } else if protocol == atoms.net_wm_ping {
        context.push(ProtocolRequest::Ping {
            message_type: atoms.wm_protocols,
            data: *data,
        });
    } else {
        debug!("Unhandled WM_PROTOCOLS message {}", protocol);
    }

    FilterReturn::Remove
}
