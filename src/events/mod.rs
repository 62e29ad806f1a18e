//! Events Module
//!
//! The normalized, backend-independent event record. An [`Event`] owns its
//! payload and holds counted references to the windows it names; cloning
//! bumps them and dropping releases them.

pub mod native;
pub mod queue;
pub mod types;

use std::rc::Rc;

pub use types::{
    Atom, CrossingMode, CursorId, DeviceId, EventMask, EventType, FocusDetail, ModifierType,
    NativeHandle, NotifyType, PropertyState, Rectangle, ScrollDirection, Time, VisibilityState,
    WindowState, CURRENT_TIME,
};

use crate::window::WindowRef;

/// Normalized event
#[derive(Debug, Clone)]
pub struct Event {
    /// Window the event is reported to
    pub window: Option<WindowRef>,
    /// Event was generated by another client rather than the server
    pub send_event: bool,
    pub kind: EventKind,
}

/// Per-type payload
#[derive(Debug, Clone)]
pub enum EventKind {
    Nothing,
    Delete,
    Destroy,
    Expose(ExposeEvent),
    NoExpose,
    MotionNotify(MotionEvent),
    ButtonPress(ButtonEvent),
    DoubleButtonPress(ButtonEvent),
    TripleButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
    EnterNotify(CrossingEvent),
    LeaveNotify(CrossingEvent),
    FocusChange(FocusEvent),
    Configure(ConfigureEvent),
    Map,
    Unmap,
    PropertyNotify(PropertyEvent),
    SelectionClear(SelectionEvent),
    SelectionRequest(SelectionEvent),
    SelectionNotify(SelectionEvent),
    ProximityIn(ProximityEvent),
    ProximityOut(ProximityEvent),
    /// Drag-and-drop events are built by a protocol layer above the
    /// translator and injected with [`crate::Display::put_event`]; no
    /// native event translates to them.
    DragEnter(DndEvent),
    DragLeave(DndEvent),
    DragMotion(DndEvent),
    DragStatus(DndEvent),
    DropStart(DndEvent),
    DropFinished(DndEvent),
    ClientEvent(ClientEvent),
    VisibilityNotify(VisibilityState),
    Scroll(ScrollEvent),
    WindowState(WindowStateEvent),
    GrabBroken(GrabBrokenEvent),
    /// Native event with no normalized form, raw bytes for the next layer
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposeEvent {
    pub area: Rectangle,
    pub region: Vec<Rectangle>,
    /// Number of expose events that follow for the same window
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub time: Time,
    pub x: f64,
    pub y: f64,
    pub x_root: f64,
    pub y_root: f64,
    pub state: ModifierType,
    pub is_hint: bool,
    pub device: DeviceId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonEvent {
    pub time: Time,
    pub x: f64,
    pub y: f64,
    pub x_root: f64,
    pub y_root: f64,
    pub state: ModifierType,
    pub button: u32,
    pub device: DeviceId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollEvent {
    pub time: Time,
    pub x: f64,
    pub y: f64,
    pub x_root: f64,
    pub y_root: f64,
    pub state: ModifierType,
    pub direction: ScrollDirection,
    pub device: DeviceId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub time: Time,
    pub state: ModifierType,
    pub keyval: u32,
    pub hardware_keycode: u16,
    pub group: u8,
    /// Text the key produces, empty for function keys
    pub string: String,
}

#[derive(Debug, Clone)]
pub struct CrossingEvent {
    pub subwindow: Option<WindowRef>,
    pub time: Time,
    pub x: f64,
    pub y: f64,
    pub x_root: f64,
    pub y_root: f64,
    pub mode: CrossingMode,
    pub detail: NotifyType,
    pub focus: bool,
    pub state: ModifierType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    pub focus_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureEvent {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEvent {
    pub atom: Atom,
    pub time: Time,
    pub state: PropertyState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    pub selection: Atom,
    pub target: Atom,
    pub property: Atom,
    pub requestor: NativeHandle,
    pub time: Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityEvent {
    pub time: Time,
    pub device: DeviceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientEvent {
    pub message_type: Atom,
    pub format: u8,
    pub data: [u32; 5],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStateEvent {
    pub changed_mask: WindowState,
    pub new_window_state: WindowState,
}

#[derive(Debug, Clone)]
pub struct GrabBrokenEvent {
    /// Keyboard grab rather than pointer grab
    pub keyboard: bool,
    /// The grab was an implicit button grab or ended implicitly
    pub implicit: bool,
    /// Window that now holds the grab, if any
    pub grab_window: Option<WindowRef>,
}

/// Shared state of a drag-and-drop operation, owned by the drag-and-drop
/// layer and kept alive by the events that reference it
#[derive(Debug)]
pub struct DragContext {
    pub source: Option<WindowRef>,
    pub dest: Option<WindowRef>,
    pub targets: Vec<Atom>,
    pub action: u32,
}

#[derive(Debug, Clone)]
pub struct DndEvent {
    pub context: Rc<DragContext>,
    pub time: Time,
    pub x_root: f64,
    pub y_root: f64,
}

impl Event {
    pub fn new(window: Option<WindowRef>, kind: EventKind) -> Self {
        Self { window, send_event: false, kind }
    }

    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Nothing => EventType::Nothing,
            EventKind::Delete => EventType::Delete,
            EventKind::Destroy => EventType::Destroy,
            EventKind::Expose(_) => EventType::Expose,
            EventKind::NoExpose => EventType::NoExpose,
            EventKind::MotionNotify(_) => EventType::MotionNotify,
            EventKind::ButtonPress(_) => EventType::ButtonPress,
            EventKind::DoubleButtonPress(_) => EventType::DoubleButtonPress,
            EventKind::TripleButtonPress(_) => EventType::TripleButtonPress,
            EventKind::ButtonRelease(_) => EventType::ButtonRelease,
            EventKind::KeyPress(_) => EventType::KeyPress,
            EventKind::KeyRelease(_) => EventType::KeyRelease,
            EventKind::EnterNotify(_) => EventType::EnterNotify,
            EventKind::LeaveNotify(_) => EventType::LeaveNotify,
            EventKind::FocusChange(_) => EventType::FocusChange,
            EventKind::Configure(_) => EventType::Configure,
            EventKind::Map => EventType::Map,
            EventKind::Unmap => EventType::Unmap,
            EventKind::PropertyNotify(_) => EventType::PropertyNotify,
            EventKind::SelectionClear(_) => EventType::SelectionClear,
            EventKind::SelectionRequest(_) => EventType::SelectionRequest,
            EventKind::SelectionNotify(_) => EventType::SelectionNotify,
            EventKind::ProximityIn(_) => EventType::ProximityIn,
            EventKind::ProximityOut(_) => EventType::ProximityOut,
            EventKind::DragEnter(_) => EventType::DragEnter,
            EventKind::DragLeave(_) => EventType::DragLeave,
            EventKind::DragMotion(_) => EventType::DragMotion,
            EventKind::DragStatus(_) => EventType::DragStatus,
            EventKind::DropStart(_) => EventType::DropStart,
            EventKind::DropFinished(_) => EventType::DropFinished,
            EventKind::ClientEvent(_) => EventType::ClientEvent,
            EventKind::VisibilityNotify(_) => EventType::VisibilityNotify,
            EventKind::Scroll(_) => EventType::Scroll,
            EventKind::WindowState(_) => EventType::WindowState,
            EventKind::GrabBroken(_) => EventType::GrabBroken,
            EventKind::Other(_) => EventType::Other,
        }
    }

    /// Timestamp, or [`CURRENT_TIME`] for events without one
    pub fn time(&self) -> Time {
        match &self.kind {
            EventKind::MotionNotify(e) => e.time,
            EventKind::ButtonPress(e)
            | EventKind::DoubleButtonPress(e)
            | EventKind::TripleButtonPress(e)
            | EventKind::ButtonRelease(e) => e.time,
            EventKind::Scroll(e) => e.time,
            EventKind::KeyPress(e) | EventKind::KeyRelease(e) => e.time,
            EventKind::EnterNotify(e) | EventKind::LeaveNotify(e) => e.time,
            EventKind::PropertyNotify(e) => e.time,
            EventKind::SelectionClear(e)
            | EventKind::SelectionRequest(e)
            | EventKind::SelectionNotify(e) => e.time,
            EventKind::ProximityIn(e) | EventKind::ProximityOut(e) => e.time,
            EventKind::DragEnter(e)
            | EventKind::DragLeave(e)
            | EventKind::DragMotion(e)
            | EventKind::DragStatus(e)
            | EventKind::DropStart(e)
            | EventKind::DropFinished(e) => e.time,
            _ => CURRENT_TIME,
        }
    }

    /// Modifier state, for the event types that carry one
    pub fn state(&self) -> Option<ModifierType> {
        match &self.kind {
            EventKind::MotionNotify(e) => Some(e.state),
            EventKind::ButtonPress(e)
            | EventKind::DoubleButtonPress(e)
            | EventKind::TripleButtonPress(e)
            | EventKind::ButtonRelease(e) => Some(e.state),
            EventKind::Scroll(e) => Some(e.state),
            EventKind::KeyPress(e) | EventKind::KeyRelease(e) => Some(e.state),
            EventKind::EnterNotify(e) | EventKind::LeaveNotify(e) => Some(e.state),
            _ => None,
        }
    }

    /// Window-relative pointer position
    pub fn coords(&self) -> Option<(f64, f64)> {
        match &self.kind {
            EventKind::MotionNotify(e) => Some((e.x, e.y)),
            EventKind::ButtonPress(e)
            | EventKind::DoubleButtonPress(e)
            | EventKind::TripleButtonPress(e)
            | EventKind::ButtonRelease(e) => Some((e.x, e.y)),
            EventKind::Scroll(e) => Some((e.x, e.y)),
            EventKind::EnterNotify(e) | EventKind::LeaveNotify(e) => Some((e.x, e.y)),
            _ => None,
        }
    }

    /// Root-relative pointer position
    pub fn root_coords(&self) -> Option<(f64, f64)> {
        match &self.kind {
            EventKind::MotionNotify(e) => Some((e.x_root, e.y_root)),
            EventKind::ButtonPress(e)
            | EventKind::DoubleButtonPress(e)
            | EventKind::TripleButtonPress(e)
            | EventKind::ButtonRelease(e) => Some((e.x_root, e.y_root)),
            EventKind::Scroll(e) => Some((e.x_root, e.y_root)),
            EventKind::EnterNotify(e) | EventKind::LeaveNotify(e) => Some((e.x_root, e.y_root)),
            EventKind::DragEnter(e)
            | EventKind::DragLeave(e)
            | EventKind::DragMotion(e)
            | EventKind::DragStatus(e)
            | EventKind::DropStart(e)
            | EventKind::DropFinished(e) => Some((e.x_root, e.y_root)),
            _ => None,
        }
    }

    /// Re-express the window-relative position, e.g. after routing
    pub fn set_coords(&mut self, x: f64, y: f64) {
        match &mut self.kind {
            EventKind::MotionNotify(e) => (e.x, e.y) = (x, y),
            EventKind::ButtonPress(e)
            | EventKind::DoubleButtonPress(e)
            | EventKind::TripleButtonPress(e)
            | EventKind::ButtonRelease(e) => (e.x, e.y) = (x, y),
            EventKind::Scroll(e) => (e.x, e.y) = (x, y),
            EventKind::EnterNotify(e) | EventKind::LeaveNotify(e) => (e.x, e.y) = (x, y),
            _ => {}
        }
    }
}

/// Release an event and every reference it holds
pub fn free_event(event: Event) {
    drop(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Geometry, Window, WindowType};

    fn press(time: Time) -> EventKind {
        EventKind::ButtonPress(ButtonEvent {
            time,
            x: 1.0,
            y: 2.0,
            x_root: 11.0,
            y_root: 12.0,
            state: ModifierType::SHIFT,
            button: 1,
            device: 0,
        })
    }

    #[test]
    fn test_accessors() {
        let event = Event::new(None, press(42));
        assert_eq!(event.event_type(), EventType::ButtonPress);
        assert_eq!(event.time(), 42);
        assert_eq!(event.state(), Some(ModifierType::SHIFT));
        assert_eq!(event.coords(), Some((1.0, 2.0)));
        assert_eq!(event.root_coords(), Some((11.0, 12.0)));

        let map = Event::new(None, EventKind::Map);
        assert_eq!(map.time(), CURRENT_TIME);
        assert_eq!(map.state(), None);
    }

    #[test]
    fn test_clone_and_free_balance_window_refs() {
        let window = Window::new(7, WindowType::Toplevel, None, Geometry::new(0, 0, 10, 10));
        let before = Rc::strong_count(&window);

        let event = Event::new(Some(window.clone()), press(1));
        let copy = event.clone();
        assert_eq!(Rc::strong_count(&window), before + 2);

        free_event(event);
        free_event(copy);
        assert_eq!(Rc::strong_count(&window), before);
    }
}
