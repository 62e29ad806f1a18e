//! Scripted backend
//!
//! Headless backend fed from a queue of prepared native events. Platform
//! calls are recorded instead of performed, so embedders and tests can
//! drive the whole pipeline without a display server.

use std::collections::{HashMap, VecDeque};
use std::os::unix::io::RawFd;

use tracing::trace;

use super::{Backend, BackendCaps};
use crate::events::native::NativeEvent;
use crate::events::{Atom, CursorId, EventMask, ModifierType, NativeHandle, Time};
use crate::grab::GrabStatus;
use crate::window::Geometry;

/// Platform call made through the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    GrabPointer {
        window: NativeHandle,
        owner_events: bool,
        event_mask: EventMask,
        confine_to: Option<NativeHandle>,
        cursor: Option<CursorId>,
        time: Time,
    },
    UngrabPointer { time: Time },
    GrabKeyboard { window: NativeHandle, owner_events: bool, time: Time },
    UngrabKeyboard { time: Time },
    SetInputFocus { window: NativeHandle, time: Time },
    PingReply { root: NativeHandle, message_type: Atom, data: [u32; 5] },
}

#[derive(Debug)]
pub struct MockBackend {
    caps: BackendCaps,
    root: NativeHandle,
    root_geometry: Geometry,
    events: VecDeque<NativeEvent>,
    atoms: HashMap<String, Atom>,
    origins: HashMap<NativeHandle, (i32, i32)>,
    properties: HashMap<(NativeHandle, Atom), Vec<u32>>,
    modifiers: ModifierType,
    grab_status: GrabStatus,
    requests: Vec<MockRequest>,
    connected: bool,
}

impl MockBackend {
    pub const ROOT: NativeHandle = 1;

    pub fn new() -> Self {
        Self {
            caps: BackendCaps::default(),
            root: Self::ROOT,
            root_geometry: Geometry::new(0, 0, 1920, 1080),
            events: VecDeque::new(),
            atoms: HashMap::new(),
            origins: HashMap::new(),
            properties: HashMap::new(),
            modifiers: ModifierType::empty(),
            grab_status: GrabStatus::Success,
            requests: Vec::new(),
            connected: true,
        }
    }

    pub fn with_caps(mut self, caps: BackendCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Queue a native event for the core to read
    pub fn push(&mut self, event: NativeEvent) {
        self.events.push_back(event);
    }

    pub fn push_all(&mut self, events: impl IntoIterator<Item = NativeEvent>) {
        self.events.extend(events);
    }

    /// Native events not yet read
    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    /// Status the next grab requests answer with
    pub fn set_grab_status(&mut self, status: GrabStatus) {
        self.grab_status = status;
    }

    pub fn set_modifier_state(&mut self, state: ModifierType) {
        self.modifiers = state;
    }

    /// Root-relative origin reported by `translate_coordinates`
    pub fn set_origin(&mut self, window: NativeHandle, x: i32, y: i32) {
        self.origins.insert(window, (x, y));
    }

    /// Value returned for `property` on `window` until deleted
    pub fn set_property(&mut self, window: NativeHandle, property: Atom, items: &[u32]) {
        self.properties.insert((window, property), items.to_vec());
    }

    pub fn delete_property(&mut self, window: NativeHandle, property: Atom) {
        self.properties.remove(&(window, property));
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn requests(&self) -> &[MockRequest] {
        &self.requests
    }

    pub fn take_requests(&mut self) -> Vec<MockRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn caps(&self) -> BackendCaps {
        self.caps
    }

    fn root(&self) -> (NativeHandle, Geometry) {
        (self.root, self.root_geometry)
    }

    fn pending(&mut self) -> bool {
        !self.events.is_empty()
    }

    fn next_event(&mut self) -> Option<NativeEvent> {
        self.events.pop_front()
    }

    fn peek_event(&mut self) -> Option<&NativeEvent> {
        self.events.front()
    }

    fn check_if_event(
        &mut self,
        predicate: &mut dyn FnMut(&NativeEvent) -> bool,
    ) -> Option<NativeEvent> {
        let index = self.events.iter().position(|event| predicate(event))?;
        self.events.remove(index)
    }

    fn grab_pointer(
        &mut self,
        window: NativeHandle,
        owner_events: bool,
        event_mask: EventMask,
        confine_to: Option<NativeHandle>,
        cursor: Option<CursorId>,
        time: Time,
    ) -> GrabStatus {
        self.requests.push(MockRequest::GrabPointer {
            window,
            owner_events,
            event_mask,
            confine_to,
            cursor,
            time,
        });
        self.grab_status
    }

    fn ungrab_pointer(&mut self, time: Time) {
        self.requests.push(MockRequest::UngrabPointer { time });
    }

    fn grab_keyboard(&mut self, window: NativeHandle, owner_events: bool, time: Time) -> GrabStatus {
        self.requests.push(MockRequest::GrabKeyboard {
            window,
            owner_events,
            time,
        });
        self.grab_status
    }

    fn ungrab_keyboard(&mut self, time: Time) {
        self.requests.push(MockRequest::UngrabKeyboard { time });
    }

    fn translate_coordinates(&mut self, window: NativeHandle, _root: NativeHandle) -> Option<(i32, i32)> {
        self.origins.get(&window).copied()
    }

    fn intern_atom(&mut self, name: &str) -> Atom {
        let next = 100 + self.atoms.len() as Atom;
        let atom = *self.atoms.entry(name.to_string()).or_insert(next);
        trace!("Mock atom {} = {}", name, atom);
        atom
    }

    fn get_property32(&mut self, window: NativeHandle, property: Atom) -> Option<Vec<u32>> {
        self.properties.get(&(window, property)).cloned()
    }

    fn set_input_focus(&mut self, window: NativeHandle, time: Time) {
        self.requests.push(MockRequest::SetInputFocus { window, time });
    }

    fn send_ping_reply(&mut self, root: NativeHandle, message_type: Atom, data: [u32; 5]) {
        self.requests.push(MockRequest::PingReply {
            root,
            message_type,
            data,
        });
    }

    fn modifier_state(&mut self) -> ModifierType {
        self.modifiers
    }

    fn connection_fd(&self) -> Option<RawFd> {
        None
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn flush(&mut self) {}
}
