//! Grab state
//!
//! Active pointer and keyboard grabs of a display session.

use std::rc::Rc;

use crate::events::{CursorId, EventMask, Time, CURRENT_TIME};
use crate::window::WindowRef;

/// Outcome of a grab request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    Success,
    AlreadyGrabbed,
    InvalidTime,
    NotViewable,
    Frozen,
    /// Platform call failed for another reason
    Failed,
}

#[derive(Debug, Clone)]
pub struct PointerGrab {
    pub window: WindowRef,
    pub owner_events: bool,
    pub event_mask: EventMask,
    pub confine_to: Option<WindowRef>,
    pub cursor: Option<CursorId>,
    pub time: Time,
    /// Automatic grab started by a button press
    pub implicit: bool,
}

#[derive(Debug, Clone)]
pub struct KeyboardGrab {
    pub window: WindowRef,
    pub owner_events: bool,
    pub time: Time,
}

#[derive(Debug, Default)]
pub struct GrabState {
    pointer: Option<PointerGrab>,
    keyboard: Option<KeyboardGrab>,
    last_pointer_time: Time,
    last_keyboard_time: Time,
}

impl GrabState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> Option<&PointerGrab> {
        self.pointer.as_ref()
    }

    pub fn keyboard(&self) -> Option<&KeyboardGrab> {
        self.keyboard.as_ref()
    }

    /// A request stamped before the last grab of the same device loses
    pub fn pointer_time_valid(&self, time: Time) -> bool {
        time == CURRENT_TIME || time >= self.last_pointer_time
    }

    pub fn keyboard_time_valid(&self, time: Time) -> bool {
        time == CURRENT_TIME || time >= self.last_keyboard_time
    }

    /// Install a pointer grab, returning the one it replaces
    pub fn set_pointer(&mut self, grab: PointerGrab) -> Option<PointerGrab> {
        if grab.time != CURRENT_TIME {
            self.last_pointer_time = grab.time;
        }
        self.pointer.replace(grab)
    }

    pub fn set_keyboard(&mut self, grab: KeyboardGrab) -> Option<KeyboardGrab> {
        if grab.time != CURRENT_TIME {
            self.last_keyboard_time = grab.time;
        }
        self.keyboard.replace(grab)
    }

    /// Drop the pointer grab if `time` is not older than it
    pub fn clear_pointer(&mut self, time: Time) -> Option<PointerGrab> {
        let expired = self
            .pointer
            .as_ref()
            .is_some_and(|grab| time == CURRENT_TIME || time >= grab.time);
        if expired {
            self.pointer.take()
        } else {
            None
        }
    }

    pub fn clear_keyboard(&mut self, time: Time) -> Option<KeyboardGrab> {
        let expired = self
            .keyboard
            .as_ref()
            .is_some_and(|grab| time == CURRENT_TIME || time >= grab.time);
        if expired {
            self.keyboard.take()
        } else {
            None
        }
    }

    /// Drop every grab held by `window`
    pub fn release_window(
        &mut self,
        window: &WindowRef,
    ) -> (Option<PointerGrab>, Option<KeyboardGrab>) {
        let pointer = if self
            .pointer
            .as_ref()
            .is_some_and(|grab| Rc::ptr_eq(&grab.window, window))
        {
            self.pointer.take()
        } else {
            None
        };
        let keyboard = if self
            .keyboard
            .as_ref()
            .is_some_and(|grab| Rc::ptr_eq(&grab.window, window))
        {
            self.keyboard.take()
        } else {
            None
        };
        (pointer, keyboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Geometry, Window, WindowType};

    fn pointer_grab(window: &WindowRef, time: Time) -> PointerGrab {
        PointerGrab {
            window: window.clone(),
            owner_events: false,
            event_mask: EventMask::BUTTON_PRESS,
            confine_to: None,
            cursor: None,
            time,
            implicit: false,
        }
    }

    #[test]
    fn test_stale_ungrab_is_ignored() {
        let window = Window::new(1, WindowType::Toplevel, None, Geometry::default());
        let mut grabs = GrabState::new();
        grabs.set_pointer(pointer_grab(&window, 500));

        assert!(grabs.clear_pointer(400).is_none());
        assert!(grabs.pointer().is_some());
        assert!(grabs.clear_pointer(CURRENT_TIME).is_some());
        assert!(!grabs.pointer_time_valid(499));
        assert!(grabs.pointer_time_valid(500));
    }

    #[test]
    fn test_release_window_only_touches_its_grabs() {
        let a = Window::new(1, WindowType::Toplevel, None, Geometry::default());
        let b = Window::new(2, WindowType::Toplevel, None, Geometry::default());
        let mut grabs = GrabState::new();
        grabs.set_pointer(pointer_grab(&a, 0));
        grabs.set_keyboard(KeyboardGrab {
            window: b.clone(),
            owner_events: false,
            time: 0,
        });

        let (pointer, keyboard) = grabs.release_window(&a);
        assert!(pointer.is_some());
        assert!(keyboard.is_none());
        assert!(grabs.keyboard().is_some());
    }
}
