//! X11 Backend
//!
//! Adapts an x11rb connection to [`Backend`]. Wire events are drained from
//! the socket into a local buffer and converted to [`NativeEvent`]s there,
//! so peeking and predicate scans never block.

use std::collections::VecDeque;
use std::os::unix::io::{AsRawFd, RawFd};

use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    self, AtomEnum, ButtonPressEvent, ConnectionExt as _, CreateWindowAux, EnterNotifyEvent,
    GrabMode, InputFocus, KeyButMask, MotionNotifyEvent, NotifyDetail, NotifyMode, PropMode,
    WindowClass,
};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{Backend, BackendCaps};
use crate::error::Result;
use crate::events::native::{NativeButton, NativeCrossing, NativeEvent, NativeKey, NativeKind, NativeMotion};
use crate::events::{
    Atom, CrossingMode, CursorId, EventMask, FocusDetail, ModifierType, NativeHandle, NotifyType,
    Rectangle, Time, VisibilityState,
};
use crate::grab::GrabStatus;
use crate::window::Geometry;

/// Core keyboard mapping, refreshed on MappingNotify
#[derive(Debug, Default)]
struct Keymap {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(conn: &RustConnection) -> Result<Self> {
        let setup = conn.setup();
        let (min_keycode, max_keycode) = (setup.min_keycode, setup.max_keycode);
        let reply = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;
        debug!(
            "Keymap loaded: keycodes {}..={}, {} keysyms per keycode",
            min_keycode, max_keycode, reply.keysyms_per_keycode
        );
        Ok(Self {
            min_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    /// Keysym for `keycode`, taking the shifted column when Shift or Lock
    /// is held and the key has one
    fn lookup(&self, keycode: u8, state: ModifierType) -> u32 {
        let per = usize::from(self.keysyms_per_keycode);
        if per == 0 || keycode < self.min_keycode {
            return 0;
        }
        let base = usize::from(keycode - self.min_keycode) * per;
        let Some(syms) = self.keysyms.get(base..base + per) else {
            return 0;
        };
        let shifted = state.intersects(ModifierType::SHIFT | ModifierType::LOCK) && per > 1 && syms[1] != 0;
        if shifted {
            syms[1]
        } else {
            syms[0]
        }
    }
}

/// Text a keysym types, empty for function keys
fn keysym_string(keysym: u32) -> String {
    let code = match keysym {
        0x20..=0x7e | 0xa0..=0xff => keysym,
        0x0100_0100..=0x0110_ffff => keysym & 0x00ff_ffff,
        _ => return String::new(),
    };
    char::from_u32(code).map(String::from).unwrap_or_default()
}

fn modifiers(state: KeyButMask) -> ModifierType {
    ModifierType::from_bits_truncate(u32::from(u16::from(state)))
}

fn crossing_mode(mode: NotifyMode) -> CrossingMode {
    match mode {
        NotifyMode::GRAB => CrossingMode::Grab,
        NotifyMode::UNGRAB => CrossingMode::Ungrab,
        _ => CrossingMode::Normal,
    }
}

fn notify_type(detail: NotifyDetail) -> NotifyType {
    match detail {
        NotifyDetail::ANCESTOR => NotifyType::Ancestor,
        NotifyDetail::VIRTUAL => NotifyType::Virtual,
        NotifyDetail::INFERIOR => NotifyType::Inferior,
        NotifyDetail::NONLINEAR => NotifyType::Nonlinear,
        NotifyDetail::NONLINEAR_VIRTUAL => NotifyType::NonlinearVirtual,
        _ => NotifyType::Unknown,
    }
}

fn focus_detail(detail: NotifyDetail) -> FocusDetail {
    match detail {
        NotifyDetail::ANCESTOR => FocusDetail::Ancestor,
        NotifyDetail::VIRTUAL => FocusDetail::Virtual,
        NotifyDetail::INFERIOR => FocusDetail::Inferior,
        NotifyDetail::NONLINEAR => FocusDetail::Nonlinear,
        NotifyDetail::NONLINEAR_VIRTUAL => FocusDetail::NonlinearVirtual,
        NotifyDetail::POINTER => FocusDetail::Pointer,
        NotifyDetail::POINTER_ROOT => FocusDetail::PointerRoot,
        _ => FocusDetail::None,
    }
}

fn grab_status(status: xproto::GrabStatus) -> GrabStatus {
    match status {
        xproto::GrabStatus::SUCCESS => GrabStatus::Success,
        xproto::GrabStatus::ALREADY_GRABBED => GrabStatus::AlreadyGrabbed,
        xproto::GrabStatus::INVALID_TIME => GrabStatus::InvalidTime,
        xproto::GrabStatus::NOT_VIEWABLE => GrabStatus::NotViewable,
        xproto::GrabStatus::FROZEN => GrabStatus::Frozen,
        _ => GrabStatus::Failed,
    }
}

/// Bits a pointer grab may select
const POINTER_GRAB_EVENTS: EventMask = EventMask::POINTER_MOTION
    .union(EventMask::POINTER_MOTION_HINT)
    .union(EventMask::BUTTON_MOTION)
    .union(EventMask::BUTTON1_MOTION)
    .union(EventMask::BUTTON2_MOTION)
    .union(EventMask::BUTTON3_MOTION)
    .union(EventMask::BUTTON_PRESS)
    .union(EventMask::BUTTON_RELEASE)
    .union(EventMask::ENTER_NOTIFY)
    .union(EventMask::LEAVE_NOTIFY)
    .union(EventMask::SCROLL);

/// Server event mask selecting what `mask` asks for
fn x_event_mask(mask: EventMask) -> xproto::EventMask {
    let table = [
        (EventMask::EXPOSURE, xproto::EventMask::EXPOSURE),
        (EventMask::POINTER_MOTION, xproto::EventMask::POINTER_MOTION),
        (EventMask::POINTER_MOTION_HINT, xproto::EventMask::POINTER_MOTION_HINT),
        (EventMask::BUTTON_MOTION, xproto::EventMask::BUTTON_MOTION),
        (EventMask::BUTTON1_MOTION, xproto::EventMask::BUTTON1_MOTION),
        (EventMask::BUTTON2_MOTION, xproto::EventMask::BUTTON2_MOTION),
        (EventMask::BUTTON3_MOTION, xproto::EventMask::BUTTON3_MOTION),
        (EventMask::BUTTON_PRESS, xproto::EventMask::BUTTON_PRESS),
        (EventMask::BUTTON_RELEASE, xproto::EventMask::BUTTON_RELEASE),
        (EventMask::KEY_PRESS, xproto::EventMask::KEY_PRESS),
        (EventMask::KEY_RELEASE, xproto::EventMask::KEY_RELEASE),
        (EventMask::ENTER_NOTIFY, xproto::EventMask::ENTER_WINDOW),
        (EventMask::LEAVE_NOTIFY, xproto::EventMask::LEAVE_WINDOW),
        (EventMask::FOCUS_CHANGE, xproto::EventMask::FOCUS_CHANGE),
        (EventMask::STRUCTURE, xproto::EventMask::STRUCTURE_NOTIFY),
        (EventMask::PROPERTY_CHANGE, xproto::EventMask::PROPERTY_CHANGE),
        (EventMask::VISIBILITY_NOTIFY, xproto::EventMask::VISIBILITY_CHANGE),
        (EventMask::SUBSTRUCTURE, xproto::EventMask::SUBSTRUCTURE_NOTIFY),
        // Wheel clicks are core button events
        (EventMask::SCROLL, xproto::EventMask::BUTTON_PRESS),
        (EventMask::SCROLL, xproto::EventMask::BUTTON_RELEASE),
    ];
    table
        .iter()
        .filter(|(ours, _)| mask.contains(*ours))
        .fold(xproto::EventMask::NO_EVENT, |acc, (_, theirs)| acc | *theirs)
}

fn to_i16(value: i32) -> i16 {
    i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX })
}

fn to_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX).max(1)
}

/// Core-format events carry their window in the second word
fn unknown_event_window(data: &[u8]) -> Option<NativeHandle> {
    data.get(4..8)
        .and_then(|word| word.try_into().ok())
        .map(u32::from_ne_bytes)
        .filter(|&window| window != x11rb::NONE)
}

fn native_button(e: &ButtonPressEvent) -> NativeButton {
    NativeButton {
        time: e.time,
        x: e.event_x.into(),
        y: e.event_y.into(),
        x_root: e.root_x.into(),
        y_root: e.root_y.into(),
        state: modifiers(e.state),
        button: e.detail.into(),
    }
}

fn native_motion(e: &MotionNotifyEvent) -> NativeMotion {
    NativeMotion {
        time: e.time,
        x: e.event_x.into(),
        y: e.event_y.into(),
        x_root: e.root_x.into(),
        y_root: e.root_y.into(),
        state: modifiers(e.state),
        is_hint: e.detail == xproto::Motion::HINT,
    }
}

fn native_crossing(e: &EnterNotifyEvent) -> NativeCrossing {
    NativeCrossing {
        time: e.time,
        x: e.event_x.into(),
        y: e.event_y.into(),
        x_root: e.root_x.into(),
        y_root: e.root_y.into(),
        state: modifiers(e.state),
        mode: crossing_mode(e.mode),
        detail: notify_type(e.detail),
        focus: e.same_screen_focus & 0x01 != 0,
        subwindow: (e.child != x11rb::NONE).then_some(e.child),
    }
}

pub struct X11Backend {
    conn: RustConnection,
    screen_num: usize,
    root: NativeHandle,
    root_geometry: Geometry,
    white_pixel: u32,
    keymap: Keymap,
    buffer: VecDeque<NativeEvent>,
    connected: bool,
}

impl X11Backend {
    /// Connect to `display_name`, or `$DISPLAY` with `None`
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display_name)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let root_geometry = Geometry::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        );
        let white_pixel = screen.white_pixel;
        let keymap = Keymap::load(&conn)?;

        info!(
            "Connected to X server: screen {}, root 0x{:x} ({}x{})",
            screen_num, root, root_geometry.width, root_geometry.height
        );

        Ok(Self {
            conn,
            screen_num,
            root,
            root_geometry,
            white_pixel,
            keymap,
            buffer: VecDeque::new(),
            connected: true,
        })
    }

    pub fn screen_num(&self) -> usize {
        self.screen_num
    }

    /// Create, label and map a top-level window that takes part in the
    /// WM_PROTOCOLS handshake
    pub fn create_window(
        &mut self,
        parent: Option<NativeHandle>,
        geometry: Geometry,
        events: EventMask,
        title: &str,
    ) -> Result<NativeHandle> {
        let window = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            parent.unwrap_or(self.root),
            to_i16(geometry.x),
            to_i16(geometry.y),
            to_u16(geometry.width),
            to_u16(geometry.height),
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(self.white_pixel)
                .event_mask(x_event_mask(events)),
        )?;

        let wm_protocols = self.intern(b"WM_PROTOCOLS")?;
        let protocols = [
            self.intern(b"WM_DELETE_WINDOW")?,
            self.intern(b"WM_TAKE_FOCUS")?,
            self.intern(b"_NET_WM_PING")?,
        ];
        self.conn
            .change_property32(PropMode::REPLACE, window, wm_protocols, AtomEnum::ATOM, &protocols)?;
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        self.conn.map_window(window)?;
        self.conn.flush()?;

        debug!("Created window 0x{:x} ({}x{})", window, geometry.width, geometry.height);
        Ok(window)
    }

    fn intern(&self, name: &[u8]) -> Result<Atom> {
        Ok(self.conn.intern_atom(false, name)?.reply()?.atom)
    }

    /// Read everything the socket has without blocking
    fn fill_buffer(&mut self) {
        if !self.connected {
            return;
        }
        loop {
            match self.conn.poll_for_event() {
                Ok(Some(event)) => {
                    if let Some(native) = self.convert(event) {
                        self.buffer.push_back(native);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("X connection failed: {}", err);
                    self.connected = false;
                    break;
                }
            }
        }
    }

    fn native_key(&self, keycode: u8, time: Time, state: KeyButMask) -> NativeKey {
        let state = modifiers(state);
        let keyval = self.keymap.lookup(keycode, state);
        NativeKey {
            time,
            state,
            keycode: keycode.into(),
            keyval,
            string: keysym_string(keyval),
            group: 0,
        }
    }

    fn convert(&mut self, event: XEvent) -> Option<NativeEvent> {
        let send_event = event.sent_event();
        let (window, kind) = match event {
            XEvent::KeyPress(e) => (Some(e.event), NativeKind::KeyPress(self.native_key(e.detail, e.time, e.state))),
            XEvent::KeyRelease(e) => (Some(e.event), NativeKind::KeyRelease(self.native_key(e.detail, e.time, e.state))),
            XEvent::ButtonPress(e) => (Some(e.event), NativeKind::ButtonPress(native_button(&e))),
            XEvent::ButtonRelease(e) => (Some(e.event), NativeKind::ButtonRelease(native_button(&e))),
            XEvent::MotionNotify(e) => (Some(e.event), NativeKind::Motion(native_motion(&e))),
            XEvent::EnterNotify(e) => (Some(e.event), NativeKind::Enter(native_crossing(&e))),
            XEvent::LeaveNotify(e) => (Some(e.event), NativeKind::Leave(native_crossing(&e))),
            XEvent::FocusIn(e) => (
                Some(e.event),
                NativeKind::FocusIn {
                    mode: crossing_mode(e.mode),
                    detail: focus_detail(e.detail),
                },
            ),
            XEvent::FocusOut(e) => (
                Some(e.event),
                NativeKind::FocusOut {
                    mode: crossing_mode(e.mode),
                    detail: focus_detail(e.detail),
                },
            ),
            XEvent::KeymapNotify(_) => (None, NativeKind::KeymapNotify),
            XEvent::Expose(e) => (
                Some(e.window),
                NativeKind::Expose {
                    area: Rectangle::new(e.x.into(), e.y.into(), e.width.into(), e.height.into()),
                    count: e.count.into(),
                },
            ),
            XEvent::GraphicsExposure(e) => (
                Some(e.drawable),
                NativeKind::GraphicsExpose {
                    area: Rectangle::new(e.x.into(), e.y.into(), e.width.into(), e.height.into()),
                    count: e.count.into(),
                },
            ),
            XEvent::NoExposure(e) => (Some(e.drawable), NativeKind::NoExpose),
            XEvent::VisibilityNotify(e) => {
                let state = match e.state {
                    xproto::Visibility::UNOBSCURED => VisibilityState::Unobscured,
                    xproto::Visibility::PARTIALLY_OBSCURED => VisibilityState::Partial,
                    _ => VisibilityState::FullyObscured,
                };
                (Some(e.window), NativeKind::Visibility(state))
            }
            XEvent::CreateNotify(e) => (Some(e.window), NativeKind::Create),
            // Structure events also arrive on the parent through
            // SubstructureNotify; only the window's own copy counts
            XEvent::DestroyNotify(e) if e.event == e.window => (Some(e.window), NativeKind::Destroy),
            XEvent::UnmapNotify(e) if e.event == e.window => (Some(e.window), NativeKind::Unmap),
            XEvent::MapNotify(e) if e.event == e.window => (Some(e.window), NativeKind::Map),
            XEvent::ReparentNotify(e) if e.event == e.window => (Some(e.window), NativeKind::Reparent),
            XEvent::GravityNotify(e) if e.event == e.window => (Some(e.window), NativeKind::Gravity),
            XEvent::ConfigureNotify(e) if e.event == e.window => (
                Some(e.window),
                NativeKind::Configure {
                    x: e.x.into(),
                    y: e.y.into(),
                    width: e.width.into(),
                    height: e.height.into(),
                },
            ),
            XEvent::PropertyNotify(e) => (
                Some(e.window),
                NativeKind::Property {
                    atom: e.atom,
                    time: e.time,
                    deleted: e.state == xproto::Property::DELETE,
                },
            ),
            XEvent::SelectionClear(e) => (
                Some(e.owner),
                NativeKind::SelectionClear {
                    selection: e.selection,
                    time: e.time,
                },
            ),
            XEvent::SelectionRequest(e) => (
                Some(e.owner),
                NativeKind::SelectionRequest {
                    requestor: e.requestor,
                    selection: e.selection,
                    target: e.target,
                    property: e.property,
                    time: e.time,
                },
            ),
            XEvent::SelectionNotify(e) => (
                Some(e.requestor),
                NativeKind::SelectionNotify {
                    selection: e.selection,
                    target: e.target,
                    property: e.property,
                    time: e.time,
                },
            ),
            XEvent::ClientMessage(e) => (
                Some(e.window),
                NativeKind::ClientMessage {
                    message_type: e.type_,
                    format: e.format,
                    data: e.data.as_data32(),
                },
            ),
            XEvent::MappingNotify(_) => {
                match Keymap::load(&self.conn) {
                    Ok(keymap) => self.keymap = keymap,
                    Err(err) => warn!("Failed to reload keymap: {}", err),
                }
                (None, NativeKind::MappingNotify)
            }
            XEvent::Error(err) => {
                warn!("X error: {:?}", err);
                return None;
            }
            XEvent::Unknown(data) => (
                unknown_event_window(&data),
                NativeKind::Other {
                    response_type: data.first().copied().unwrap_or(0),
                    data,
                },
            ),
            other => {
                trace!("Ignoring X event {:?}", other);
                return None;
            }
        };

        Some(NativeEvent {
            window,
            send_event,
            kind,
        })
    }

    fn try_grab_pointer(
        &self,
        window: NativeHandle,
        owner_events: bool,
        event_mask: EventMask,
        confine_to: Option<NativeHandle>,
        cursor: Option<CursorId>,
        time: Time,
    ) -> Result<xproto::GrabStatus> {
        let reply = self
            .conn
            .grab_pointer(
                owner_events,
                window,
                x_event_mask(event_mask & POINTER_GRAB_EVENTS),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                confine_to.unwrap_or(x11rb::NONE),
                cursor.unwrap_or(x11rb::NONE),
                time,
            )?
            .reply()?;
        Ok(reply.status)
    }

    fn try_grab_keyboard(&self, window: NativeHandle, owner_events: bool, time: Time) -> Result<xproto::GrabStatus> {
        let reply = self
            .conn
            .grab_keyboard(owner_events, window, time, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        Ok(reply.status)
    }

    fn try_translate_coordinates(&self, window: NativeHandle, root: NativeHandle) -> Result<(i32, i32)> {
        let reply = self.conn.translate_coordinates(window, root, 0, 0)?.reply()?;
        Ok((reply.dst_x.into(), reply.dst_y.into()))
    }

    fn try_send_ping_reply(&self, root: NativeHandle, message_type: Atom, data: [u32; 5]) -> Result<()> {
        let event = xproto::ClientMessageEvent::new(32, root, message_type, data);
        self.conn.send_event(
            false,
            root,
            xproto::EventMask::SUBSTRUCTURE_REDIRECT | xproto::EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }

    fn try_get_property32(&self, window: NativeHandle, property: Atom) -> Result<Option<Vec<u32>>> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;
        if reply.type_ == x11rb::NONE {
            return Ok(None);
        }
        Ok(reply.value32().map(|items| items.collect()))
    }

    fn try_modifier_state(&self) -> Result<ModifierType> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        Ok(modifiers(reply.mask))
    }
}

impl Backend for X11Backend {
    fn caps(&self) -> BackendCaps {
        // The server reports crossings and grabs buttons on press itself
        BackendCaps::default()
    }

    fn root(&self) -> (NativeHandle, Geometry) {
        (self.root, self.root_geometry)
    }

    fn pending(&mut self) -> bool {
        self.fill_buffer();
        !self.buffer.is_empty()
    }

    fn next_event(&mut self) -> Option<NativeEvent> {
        if self.buffer.is_empty() {
            self.fill_buffer();
        }
        self.buffer.pop_front()
    }

    fn peek_event(&mut self) -> Option<&NativeEvent> {
        if self.buffer.is_empty() {
            self.fill_buffer();
        }
        self.buffer.front()
    }

    fn check_if_event(
        &mut self,
        predicate: &mut dyn FnMut(&NativeEvent) -> bool,
    ) -> Option<NativeEvent> {
        self.fill_buffer();
        let index = self.buffer.iter().position(|event| predicate(event))?;
        self.buffer.remove(index)
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
        match self.try_grab_pointer(window, owner_events, event_mask, confine_to, cursor, time) {
            Ok(status) => grab_status(status),
            Err(err) => {
                warn!("GrabPointer on 0x{:x} failed: {}", window, err);
                GrabStatus::Failed
            }
        }
    }

    fn ungrab_pointer(&mut self, time: Time) {
        if let Err(err) = self.conn.ungrab_pointer(time) {
            warn!("UngrabPointer failed: {}", err);
        }
    }

    fn grab_keyboard(&mut self, window: NativeHandle, owner_events: bool, time: Time) -> GrabStatus {
        match self.try_grab_keyboard(window, owner_events, time) {
            Ok(status) => grab_status(status),
            Err(err) => {
                warn!("GrabKeyboard on 0x{:x} failed: {}", window, err);
                GrabStatus::Failed
            }
        }
    }

    fn ungrab_keyboard(&mut self, time: Time) {
        if let Err(err) = self.conn.ungrab_keyboard(time) {
            warn!("UngrabKeyboard failed: {}", err);
        }
    }

    fn translate_coordinates(&mut self, window: NativeHandle, root: NativeHandle) -> Option<(i32, i32)> {
        self.try_translate_coordinates(window, root)
            .inspect_err(|err| debug!("TranslateCoordinates for 0x{:x} failed: {}", window, err))
            .ok()
    }

    fn intern_atom(&mut self, name: &str) -> Atom {
        self.intern(name.as_bytes()).unwrap_or_else(|err| {
            warn!("Failed to intern atom {}: {}", name, err);
            x11rb::NONE
        })
    }

    fn get_property32(&mut self, window: NativeHandle, property: Atom) -> Option<Vec<u32>> {
        self.try_get_property32(window, property).unwrap_or_else(|err| {
            debug!("GetProperty {} on 0x{:x} failed: {}", property, window, err);
            None
        })
    }

    fn set_input_focus(&mut self, window: NativeHandle, time: Time) {
        if let Err(err) = self.conn.set_input_focus(InputFocus::PARENT, window, time) {
            warn!("SetInputFocus on 0x{:x} failed: {}", window, err);
        }
    }

    fn send_ping_reply(&mut self, root: NativeHandle, message_type: Atom, data: [u32; 5]) {
        if let Err(err) = self.try_send_ping_reply(root, message_type, data) {
            warn!("Failed to answer _NET_WM_PING: {}", err);
        }
    }

    fn modifier_state(&mut self) -> ModifierType {
        self.try_modifier_state().unwrap_or_else(|err| {
            debug!("QueryPointer failed: {}", err);
            ModifierType::empty()
        })
    }

    fn connection_fd(&self) -> Option<RawFd> {
        Some(self.conn.stream().as_raw_fd())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn flush(&mut self) {
        if let Err(err) = self.conn.flush() {
            warn!("X flush failed: {}", err);
            self.connected = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_lookup_columns() {
        // keycode 38: a / A, keycode 39: F1 with no shifted column
        let keymap = Keymap {
            min_keycode: 38,
            keysyms_per_keycode: 2,
            keysyms: vec![0x61, 0x41, 0xffbe, 0],
        };
        assert_eq!(keymap.lookup(38, ModifierType::empty()), 0x61);
        assert_eq!(keymap.lookup(38, ModifierType::SHIFT), 0x41);
        assert_eq!(keymap.lookup(39, ModifierType::SHIFT), 0xffbe);
        assert_eq!(keymap.lookup(40, ModifierType::empty()), 0);
        assert_eq!(keymap.lookup(8, ModifierType::empty()), 0);
    }

    #[test]
    fn test_keysym_strings() {
        assert_eq!(keysym_string(0x61), "a");
        assert_eq!(keysym_string(0xe9), "é");
        assert_eq!(keysym_string(0x0100_20ac), "€");
        assert_eq!(keysym_string(0xffbe), "");
    }

    #[test]
    fn test_event_mask_conversion() {
        let mask = x_event_mask(EventMask::ENTER_NOTIFY | EventMask::SCROLL | EventMask::STRUCTURE);
        assert_eq!(
            mask,
            xproto::EventMask::ENTER_WINDOW
                | xproto::EventMask::BUTTON_PRESS
                | xproto::EventMask::BUTTON_RELEASE
                | xproto::EventMask::STRUCTURE_NOTIFY
        );
        assert_eq!(x_event_mask(EventMask::PROXIMITY_IN), xproto::EventMask::NO_EVENT);
    }

    #[test]
    fn test_grab_mask_drops_non_pointer_bits() {
        let mask = EventMask::KEY_PRESS | EventMask::BUTTON_PRESS | EventMask::EXPOSURE;
        assert_eq!(mask & POINTER_GRAB_EVENTS, EventMask::BUTTON_PRESS);
    }

    #[test]
    fn test_modifier_bits_match_core_protocol() {
        let state = KeyButMask::SHIFT | KeyButMask::CONTROL | KeyButMask::BUTTON1;
        assert_eq!(
            modifiers(state),
            ModifierType::SHIFT | ModifierType::CONTROL | ModifierType::BUTTON1
        );
    }

    #[test]
    fn test_unknown_event_window_from_second_word() {
        let mut data = vec![0u8; 32];
        data[0] = 85;
        data[4..8].copy_from_slice(&0x0060_0003u32.to_ne_bytes());
        assert_eq!(unknown_event_window(&data), Some(0x0060_0003));

        data[4..8].copy_from_slice(&0u32.to_ne_bytes());
        assert_eq!(unknown_event_window(&data), None);
        assert_eq!(unknown_event_window(&[85, 0, 0, 0, 1]), None);
    }
}
