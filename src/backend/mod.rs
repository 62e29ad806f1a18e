//! Backends
//!
//! The narrow capability interface the translator is written against. A
//! backend adapts its platform's event shapes into [`NativeEvent`] and
//! performs the few platform calls the core needs (grabs, focus, atoms,
//! coordinate queries). Every call is non-blocking.

pub mod mock;
pub mod x11;

use std::os::unix::io::RawFd;

use crate::events::native::NativeEvent;
use crate::events::{Atom, CursorId, EventMask, ModifierType, NativeHandle, Time};
use crate::grab::GrabStatus;
use crate::window::Geometry;

pub use mock::MockBackend;
pub use x11::X11Backend;

/// Behaviours a platform does or does not provide natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCaps {
    /// The platform reports pointer motion but no enter/leave; the core
    /// synthesizes crossings from the window under the pointer.
    pub synthesize_crossings: bool,
    /// The platform has no automatic grab on button press; the core
    /// emulates it.
    pub implicit_grabs: bool,
    /// Held keys do not produce release/press pairs
    pub detectable_autorepeat: bool,
}

pub trait Backend {
    fn caps(&self) -> BackendCaps;

    /// Root window handle and geometry
    fn root(&self) -> (NativeHandle, Geometry);

    /// Whether a native event can be read without blocking
    fn pending(&mut self) -> bool;

    /// Next native event, if one is available without blocking
    fn next_event(&mut self) -> Option<NativeEvent>;

    /// Look at the next native event without consuming it
    fn peek_event(&mut self) -> Option<&NativeEvent>;

    /// Remove and return the first already-available event accepted by
    /// `predicate`. Events are offered in order; the scan never blocks.
    fn check_if_event(
        &mut self,
        predicate: &mut dyn FnMut(&NativeEvent) -> bool,
    ) -> Option<NativeEvent>;

    fn grab_pointer(
        &mut self,
        window: NativeHandle,
        owner_events: bool,
        event_mask: EventMask,
        confine_to: Option<NativeHandle>,
        cursor: Option<CursorId>,
        time: Time,
    ) -> GrabStatus;

    fn ungrab_pointer(&mut self, time: Time);

    fn grab_keyboard(&mut self, window: NativeHandle, owner_events: bool, time: Time) -> GrabStatus;

    fn ungrab_keyboard(&mut self, time: Time);

    /// Position of `window`'s origin in `root` coordinates
    fn translate_coordinates(&mut self, window: NativeHandle, root: NativeHandle) -> Option<(i32, i32)>;

    fn intern_atom(&mut self, name: &str) -> Atom;

    /// 32-bit items of a window property; `None` when it is not set
    fn get_property32(&mut self, window: NativeHandle, property: Atom) -> Option<Vec<u32>>;

    fn set_input_focus(&mut self, window: NativeHandle, time: Time);

    /// Answer a `_NET_WM_PING` by returning the message to the root window
    fn send_ping_reply(&mut self, root: NativeHandle, message_type: Atom, data: [u32; 5]);

    /// Current keyboard modifier and button state
    fn modifier_state(&mut self) -> ModifierType;

    /// Descriptor that becomes readable when native events arrive
    fn connection_fd(&self) -> Option<RawFd>;

    fn is_connected(&self) -> bool;

    fn flush(&mut self);
}
