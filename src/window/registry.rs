//! Window Registry
//!
//! Maps native handles to window records.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use super::{WindowRef, WindowType};
use crate::events::NativeHandle;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<NativeHandle, WindowRef>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window under its handle.
    ///
    /// Returns false, and leaves the registry unchanged, if the handle is
    /// already taken by a different window.
    pub fn insert(&mut self, window: WindowRef) -> bool {
        let handle = window.handle();
        if let Some(existing) = self.windows.get(&handle) {
            if Rc::ptr_eq(existing, &window) {
                return true;
            }
            warn!(
                "Window handle {:#x} already registered to {:?}, refusing {:?}",
                handle, existing, window
            );
            return false;
        }
        debug!("Registered window {:#x} ({:?})", handle, window.window_type());
        self.windows.insert(handle, window);
        true
    }

    /// Counted reference to the window for `handle`
    pub fn lookup(&self, handle: NativeHandle) -> Option<WindowRef> {
        self.windows.get(&handle).cloned()
    }

    pub fn remove(&mut self, handle: NativeHandle) -> Option<WindowRef> {
        let removed = self.windows.remove(&handle);
        if removed.is_some() {
            debug!("Unregistered window {:#x}", handle);
        }
        removed
    }

    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.windows.contains_key(&handle)
    }

    pub fn root(&self) -> Option<WindowRef> {
        self.windows
            .values()
            .find(|window| window.window_type() == WindowType::Root)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowRef> + '_ {
        self.windows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Geometry, Window};

    #[test]
    fn test_insert_lookup_remove() {
        let mut registry = WindowRegistry::new();
        let window = Window::new(0x400001, WindowType::Toplevel, None, Geometry::default());

        assert!(registry.insert(window.clone()));
        let found = registry.lookup(0x400001).expect("registered window");
        assert!(Rc::ptr_eq(&found, &window));

        assert!(registry.remove(0x400001).is_some());
        assert!(registry.lookup(0x400001).is_none());
        assert!(registry.remove(0x400001).is_none());
    }

    #[test]
    fn test_conflicting_insert_is_refused() {
        let mut registry = WindowRegistry::new();
        let first = Window::new(5, WindowType::Toplevel, None, Geometry::default());
        let second = Window::new(5, WindowType::Toplevel, None, Geometry::default());

        assert!(registry.insert(first.clone()));
        assert!(registry.insert(first.clone()));
        assert!(!registry.insert(second));
        assert!(Rc::ptr_eq(&registry.lookup(5).unwrap(), &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_refcount_balances() {
        let mut registry = WindowRegistry::new();
        let window = Window::new(8, WindowType::Child, None, Geometry::default());
        registry.insert(window.clone());
        let before = Rc::strong_count(&window);

        let retained: Vec<WindowRef> = (0..4).filter_map(|_| registry.lookup(8)).collect();
        assert_eq!(Rc::strong_count(&window), before + 4);

        drop(retained);
        assert_eq!(Rc::strong_count(&window), before);
    }
}
