//! Event vocabulary
//!
//! Scalar types, flag sets and small enums shared by normalized and native
//! events.

use bitflags::bitflags;

/// Server timestamp in milliseconds
pub type Time = u32;

/// "No timestamp" / current server time
pub const CURRENT_TIME: Time = 0;

/// Interned atom
pub type Atom = u32;

/// Native window handle (X11 window id, HWND value, ...)
pub type NativeHandle = u32;

/// Native cursor handle
pub type CursorId = u32;

/// Input device identifier
pub type DeviceId = u32;

bitflags! {
    /// Event interest mask of a window or a grab
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const EXPOSURE = 1 << 1;
        const POINTER_MOTION = 1 << 2;
        const POINTER_MOTION_HINT = 1 << 3;
        const BUTTON_MOTION = 1 << 4;
        const BUTTON1_MOTION = 1 << 5;
        const BUTTON2_MOTION = 1 << 6;
        const BUTTON3_MOTION = 1 << 7;
        const BUTTON_PRESS = 1 << 8;
        const BUTTON_RELEASE = 1 << 9;
        const KEY_PRESS = 1 << 10;
        const KEY_RELEASE = 1 << 11;
        const ENTER_NOTIFY = 1 << 12;
        const LEAVE_NOTIFY = 1 << 13;
        const FOCUS_CHANGE = 1 << 14;
        const STRUCTURE = 1 << 15;
        const PROPERTY_CHANGE = 1 << 16;
        const VISIBILITY_NOTIFY = 1 << 17;
        const PROXIMITY_IN = 1 << 18;
        const PROXIMITY_OUT = 1 << 19;
        const SUBSTRUCTURE = 1 << 20;
        const SCROLL = 1 << 21;
        const ALL_EVENTS = 0x3F_FFFE;
    }
}

bitflags! {
    /// Keyboard modifiers and pointer buttons held during an event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierType: u32 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;
        const BUTTON4 = 1 << 11;
        const BUTTON5 = 1 << 12;
        const RELEASE = 1 << 30;
        const BUTTONS = Self::BUTTON1.bits()
            | Self::BUTTON2.bits()
            | Self::BUTTON3.bits()
            | Self::BUTTON4.bits()
            | Self::BUTTON5.bits();
    }
}

impl Default for ModifierType {
    fn default() -> Self {
        Self::empty()
    }
}

impl ModifierType {
    /// Held-button flag for a core button number, if it has one
    pub fn for_button(button: u32) -> Self {
        match button {
            1 => Self::BUTTON1,
            2 => Self::BUTTON2,
            3 => Self::BUTTON3,
            4 => Self::BUTTON4,
            5 => Self::BUTTON5,
            _ => Self::empty(),
        }
    }
}

bitflags! {
    /// Toplevel window state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowState: u32 {
        const WITHDRAWN = 1 << 0;
        const ICONIFIED = 1 << 1;
        const MAXIMIZED = 1 << 2;
        const STICKY = 1 << 3;
    }
}

/// Discriminant of [`crate::events::EventKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Nothing,
    Delete,
    Destroy,
    Expose,
    MotionNotify,
    ButtonPress,
    DoubleButtonPress,
    TripleButtonPress,
    ButtonRelease,
    KeyPress,
    KeyRelease,
    EnterNotify,
    LeaveNotify,
    FocusChange,
    Configure,
    Map,
    Unmap,
    PropertyNotify,
    SelectionClear,
    SelectionRequest,
    SelectionNotify,
    ProximityIn,
    ProximityOut,
    DragEnter,
    DragLeave,
    DragMotion,
    DragStatus,
    DropStart,
    DropFinished,
    ClientEvent,
    VisibilityNotify,
    NoExpose,
    Scroll,
    WindowState,
    GrabBroken,
    Other,
}

impl EventType {
    /// Mask bit a window must select to receive this type.
    ///
    /// An empty mask means the type is always delivered.
    pub fn mask(self) -> EventMask {
        match self {
            Self::Expose => EventMask::EXPOSURE,
            Self::MotionNotify => EventMask::POINTER_MOTION,
            Self::ButtonPress | Self::DoubleButtonPress | Self::TripleButtonPress => {
                EventMask::BUTTON_PRESS
            }
            Self::ButtonRelease => EventMask::BUTTON_RELEASE,
            Self::KeyPress => EventMask::KEY_PRESS,
            Self::KeyRelease => EventMask::KEY_RELEASE,
            Self::EnterNotify => EventMask::ENTER_NOTIFY,
            Self::LeaveNotify => EventMask::LEAVE_NOTIFY,
            Self::FocusChange => EventMask::FOCUS_CHANGE,
            Self::Destroy | Self::Configure | Self::Map | Self::Unmap => EventMask::STRUCTURE,
            Self::PropertyNotify => EventMask::PROPERTY_CHANGE,
            Self::VisibilityNotify => EventMask::VISIBILITY_NOTIFY,
            Self::ProximityIn => EventMask::PROXIMITY_IN,
            Self::ProximityOut => EventMask::PROXIMITY_OUT,
            Self::Scroll => EventMask::SCROLL | EventMask::BUTTON_PRESS,
            _ => EventMask::empty(),
        }
    }
}

impl EventMask {
    /// Whether this mask selects an event of `event_type` carrying `state`.
    ///
    /// Motion is selected by plain pointer motion, or by button motion while
    /// a matching button is held.
    pub fn accepts(self, event_type: EventType, state: ModifierType) -> bool {
        match event_type {
            EventType::MotionNotify => {
                self.contains(Self::POINTER_MOTION)
                    || (state.intersects(ModifierType::BUTTONS) && self.contains(Self::BUTTON_MOTION))
                    || (state.contains(ModifierType::BUTTON1) && self.contains(Self::BUTTON1_MOTION))
                    || (state.contains(ModifierType::BUTTON2) && self.contains(Self::BUTTON2_MOTION))
                    || (state.contains(ModifierType::BUTTON3) && self.contains(Self::BUTTON3_MOTION))
            }
            other => {
                let wanted = other.mask();
                wanted.is_empty() || self.intersects(wanted)
            }
        }
    }
}

/// Rectangle in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.x.saturating_add(self.width).max(other.x.saturating_add(other.width));
        let bottom = self.y.saturating_add(self.height).max(other.y.saturating_add(other.height));
        Rectangle::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }
}

/// Why a crossing happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrossingMode {
    #[default]
    Normal,
    Grab,
    Ungrab,
}

/// Ancestry relation between the two windows of a crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotifyType {
    Ancestor,
    Virtual,
    Inferior,
    Nonlinear,
    NonlinearVirtual,
    #[default]
    Unknown,
}

/// Native focus-change detail; wider than [`NotifyType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusDetail {
    Ancestor,
    Virtual,
    Inferior,
    Nonlinear,
    NonlinearVirtual,
    Pointer,
    PointerRoot,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// Core buttons 4..7 are wheel clicks
    pub fn from_button(button: u32) -> Option<Self> {
        match button {
            4 => Some(Self::Up),
            5 => Some(Self::Down),
            6 => Some(Self::Left),
            7 => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityState {
    Unobscured,
    Partial,
    FullyObscured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyState {
    NewValue,
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_covers_both() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(20, 5, 10, 10);
        assert_eq!(a.union(&b), Rectangle::new(0, 0, 30, 15));
        assert_eq!(a.union(&b).area(), 450);
    }

    #[test]
    fn test_union_clamps_at_coordinate_limits() {
        let far = Rectangle::new(i32::MAX - 5, 0, 100, 10);
        let near = Rectangle::new(0, 0, 10, 10);
        assert_eq!(far.union(&near), Rectangle::new(0, 0, i32::MAX, 10));

        let low = Rectangle::new(i32::MIN, i32::MIN, 10, 10);
        let high = Rectangle::new(i32::MAX - 1, i32::MAX - 1, 10, 10);
        assert_eq!(low.union(&high), Rectangle::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX));
    }

    #[test]
    fn test_motion_mask_needs_held_button() {
        let mask = EventMask::BUTTON1_MOTION;
        assert!(!mask.accepts(EventType::MotionNotify, ModifierType::empty()));
        assert!(mask.accepts(EventType::MotionNotify, ModifierType::BUTTON1));
        assert!(!mask.accepts(EventType::MotionNotify, ModifierType::BUTTON2));
    }

    #[test]
    fn test_unmasked_types_always_accepted() {
        let mask = EventMask::empty();
        assert!(mask.accepts(EventType::ClientEvent, ModifierType::empty()));
        assert!(!mask.accepts(EventType::ButtonPress, ModifierType::empty()));
        assert!(EventMask::BUTTON_PRESS.accepts(EventType::Scroll, ModifierType::empty()));
    }
}
