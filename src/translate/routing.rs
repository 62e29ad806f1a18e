//! Grab-aware routing
//!
//! Picks the window an input event is reported to, honouring an active
//! grab and propagating up the ancestor chain past windows that did not
//! select the event.

use crate::events::{Event, EventMask, EventType, ModifierType};
use crate::window::{WindowRef, WindowType};

/// The parts of a grab routing cares about
#[derive(Debug, Clone, Copy)]
pub struct RouteGrab<'a> {
    pub window: &'a WindowRef,
    pub owner_events: bool,
    pub event_mask: EventMask,
}

/// Resolve the target for an event of `event_type` reported on `window`.
///
/// `None` means the event is dropped.
pub fn route_event(
    window: &WindowRef,
    grab: Option<RouteGrab<'_>>,
    event_type: EventType,
    state: ModifierType,
) -> Option<WindowRef> {
    if let Some(grab) = grab {
        if !grab.owner_events {
            return grab
                .event_mask
                .accepts(event_type, state)
                .then(|| grab.window.clone());
        }
    }

    let mut current = window.clone();
    loop {
        if current.window_type() == WindowType::Root || current.is_destroyed() {
            break;
        }
        if current.events().accepts(event_type, state) {
            return Some(current);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    grab.filter(|grab| grab.event_mask.accepts(event_type, state))
        .map(|grab| grab.window.clone())
}

/// Re-express a pointer event's window coordinates relative to `target`
pub fn retarget(event: &mut Event, target: &WindowRef) {
    if let Some((x_root, y_root)) = event.root_coords() {
        let (origin_x, origin_y) = target.root_origin();
        event.set_coords(x_root - f64::from(origin_x), y_root - f64::from(origin_y));
    }
    event.window = Some(target.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ButtonEvent, EventKind};
    use crate::window::{Geometry, Window};

    struct Tree {
        _root: WindowRef,
        top: WindowRef,
        child: WindowRef,
        other: WindowRef,
    }

    fn tree() -> Tree {
        let root = Window::new(1, WindowType::Root, None, Geometry::new(0, 0, 1000, 1000));
        let top = Window::new(2, WindowType::Toplevel, Some(&root), Geometry::new(100, 100, 300, 300));
        let child = Window::new(3, WindowType::Child, Some(&top), Geometry::new(10, 10, 50, 50));
        let other = Window::new(4, WindowType::Toplevel, Some(&root), Geometry::new(600, 600, 100, 100));
        Tree {
            _root: root,
            top,
            child,
            other,
        }
    }

    #[test]
    fn test_propagates_to_selecting_ancestor() {
        let t = tree();
        t.top.set_events(EventMask::BUTTON_PRESS);
        let target = route_event(&t.child, None, EventType::ButtonPress, ModifierType::empty());
        assert_eq!(target.map(|w| w.handle()), Some(2));
    }

    #[test]
    fn test_unselected_event_is_dropped_at_root() {
        let t = tree();
        let target = route_event(&t.child, None, EventType::ButtonPress, ModifierType::empty());
        assert!(target.is_none());
    }

    #[test]
    fn test_exclusive_grab_redirects() {
        let t = tree();
        t.child.set_events(EventMask::BUTTON_PRESS);
        let grab = RouteGrab {
            window: &t.other,
            owner_events: false,
            event_mask: EventMask::BUTTON_PRESS,
        };
        let target = route_event(&t.child, Some(grab), EventType::ButtonPress, ModifierType::empty());
        assert_eq!(target.map(|w| w.handle()), Some(4));

        // Grab mask rejects releases: dropped
        let target = route_event(&t.child, Some(grab), EventType::ButtonRelease, ModifierType::empty());
        assert!(target.is_none());
    }

    #[test]
    fn test_owner_events_prefers_selecting_window() {
        let t = tree();
        let grab = RouteGrab {
            window: &t.other,
            owner_events: true,
            event_mask: EventMask::BUTTON_PRESS,
        };

        t.child.set_events(EventMask::BUTTON_PRESS);
        let target = route_event(&t.child, Some(grab), EventType::ButtonPress, ModifierType::empty());
        assert_eq!(target.map(|w| w.handle()), Some(3));

        t.child.set_events(EventMask::empty());
        let target = route_event(&t.child, Some(grab), EventType::ButtonPress, ModifierType::empty());
        assert_eq!(target.map(|w| w.handle()), Some(4));
    }

    #[test]
    fn test_retarget_uses_root_position() {
        let t = tree();
        let mut event = Event::new(
            Some(t.child.clone()),
            EventKind::ButtonPress(ButtonEvent {
                time: 0,
                x: 5.0,
                y: 5.0,
                x_root: 115.0,
                y_root: 115.0,
                state: ModifierType::empty(),
                button: 1,
                device: 2,
            }),
        );
        retarget(&mut event, &t.other);
        assert_eq!(event.coords(), Some((-485.0, -485.0)));
        assert_eq!(event.window.as_ref().map(|w| w.handle()), Some(4));
    }
}
