//! Native event shape
//!
//! Backend-independent description of a raw platform event. Each backend
//! adapts its wire events into [`NativeEvent`]; the translator only ever
//! sees this shape.

use super::types::{
    Atom, CrossingMode, DeviceId, FocusDetail, ModifierType, NativeHandle, NotifyType, Rectangle,
    Time, VisibilityState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    /// Native window the event was reported on
    pub window: Option<NativeHandle>,
    pub send_event: bool,
    pub kind: NativeKind,
}

impl NativeEvent {
    pub fn new(window: NativeHandle, kind: NativeKind) -> Self {
        Self {
            window: Some(window),
            send_event: false,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeKind {
    KeyPress(NativeKey),
    KeyRelease(NativeKey),
    ButtonPress(NativeButton),
    ButtonRelease(NativeButton),
    Motion(NativeMotion),
    Enter(NativeCrossing),
    Leave(NativeCrossing),
    FocusIn { mode: CrossingMode, detail: FocusDetail },
    FocusOut { mode: CrossingMode, detail: FocusDetail },
    KeymapNotify,
    Expose { area: Rectangle, count: u32 },
    GraphicsExpose { area: Rectangle, count: u32 },
    NoExpose,
    Visibility(VisibilityState),
    Create,
    Destroy,
    Unmap,
    Map,
    Reparent,
    Configure { x: i32, y: i32, width: i32, height: i32 },
    Gravity,
    Property { atom: Atom, time: Time, deleted: bool },
    SelectionClear { selection: Atom, time: Time },
    SelectionRequest {
        requestor: NativeHandle,
        selection: Atom,
        target: Atom,
        property: Atom,
        time: Time,
    },
    SelectionNotify { selection: Atom, target: Atom, property: Atom, time: Time },
    ClientMessage { message_type: Atom, format: u8, data: [u32; 5] },
    MappingNotify,
    /// Committed input-method text for the focus window
    ImeCommit { time: Time, text: String },
    /// Extension input device event
    Device { device: DeviceId, event: DeviceEvent },
    /// Anything the backend could not classify
    Other { response_type: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeKey {
    pub time: Time,
    pub state: ModifierType,
    pub keycode: u16,
    /// Keysym already resolved by the backend's keymap
    pub keyval: u32,
    pub string: String,
    pub group: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeButton {
    pub time: Time,
    pub x: i32,
    pub y: i32,
    pub x_root: i32,
    pub y_root: i32,
    pub state: ModifierType,
    pub button: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeMotion {
    pub time: Time,
    pub x: i32,
    pub y: i32,
    pub x_root: i32,
    pub y_root: i32,
    pub state: ModifierType,
    pub is_hint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NativeCrossing {
    pub time: Time,
    pub x: i32,
    pub y: i32,
    pub x_root: i32,
    pub y_root: i32,
    pub state: ModifierType,
    pub mode: CrossingMode,
    pub detail: NotifyType,
    pub focus: bool,
    pub subwindow: Option<NativeHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Motion(NativeMotion),
    ButtonPress(NativeButton),
    ButtonRelease(NativeButton),
    ProximityIn { time: Time },
    ProximityOut { time: Time },
}
