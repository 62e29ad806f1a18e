//! Input-method commits
//!
//! A committed string becomes one key press per character, each followed
//! by its release when the target selects releases.

use crate::events::{Event, EventKind, KeyEvent, ModifierType, Time};
use crate::window::WindowRef;

/// Keysym for a Unicode character.
///
/// Latin-1 maps onto itself, a few control characters onto their function
/// keys, everything else into the 0x0100_0000 Unicode keysym range.
pub fn keyval_from_unicode(c: char) -> u32 {
    let code = u32::from(c);
    match code {
        0x08 => 0xff08,
        0x09 => 0xff09,
        0x0a | 0x0d => 0xff0d,
        0x1b => 0xff1b,
        0x7f => 0xffff,
        0x20..=0x7e | 0xa0..=0xff => code,
        _ => 0x0100_0000 | code,
    }
}

/// Expand a commit into key events for `target`.
///
/// `state` is sampled once by the caller and shared by the whole batch.
pub fn expand_commit(
    target: &WindowRef,
    text: &str,
    time: Time,
    state: ModifierType,
    with_release: bool,
) -> Vec<Event> {
    let mut events = Vec::with_capacity(text.chars().count() * if with_release { 2 } else { 1 });
    for c in text.chars() {
        let key = KeyEvent {
            time,
            state,
            keyval: keyval_from_unicode(c),
            hardware_keycode: 0,
            group: 0,
            string: c.to_string(),
        };
        events.push(Event::new(Some(target.clone()), EventKind::KeyPress(key.clone())));
        if with_release {
            events.push(Event::new(Some(target.clone()), EventKind::KeyRelease(key)));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use crate::window::{Geometry, Window, WindowType};

    #[test]
    fn test_keyvals() {
        assert_eq!(keyval_from_unicode('a'), 0x61);
        assert_eq!(keyval_from_unicode('é'), 0xe9);
        assert_eq!(keyval_from_unicode('\r'), 0xff0d);
        assert_eq!(keyval_from_unicode('€'), 0x0100_20ac);
    }

    #[test]
    fn test_batch_shares_state_and_pairs_releases() {
        let window = Window::new(3, WindowType::Toplevel, None, Geometry::default());
        let events = expand_commit(&window, "日本", 77, ModifierType::SHIFT, true);

        let types: Vec<EventType> = events.iter().map(Event::event_type).collect();
        assert_eq!(
            types,
            vec![EventType::KeyPress, EventType::KeyRelease, EventType::KeyPress, EventType::KeyRelease]
        );
        assert!(events.iter().all(|e| e.state() == Some(ModifierType::SHIFT) && e.time() == 77));
        match &events[2].kind {
            EventKind::KeyPress(key) => assert_eq!(key.string, "本"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_presses_only_without_release_interest() {
        let window = Window::new(3, WindowType::Toplevel, None, Geometry::default());
        let events = expand_commit(&window, "ab", 1, ModifierType::empty(), false);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_type() == EventType::KeyPress));
    }
}
