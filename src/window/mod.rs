//! Window records
//!
//! The abstract window the translator reports events against. Windows are
//! shared as [`WindowRef`] (`Rc<Window>`); the parent link is weak so the
//! registry alone decides how long a window stays reachable by handle.

pub mod registry;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::native::NativeEvent;
use crate::events::{Event, EventMask, NativeHandle, WindowState};
use crate::filter::{FilterData, FilterFunc, FilterList, FilterReturn};

pub use registry::WindowRegistry;

/// Counted reference to a window
pub type WindowRef = Rc<Window>;

/// Process-unique window identity, independent of native handle reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowType {
    Root,
    Toplevel,
    Child,
    Dialog,
    Temp,
    Foreign,
}

/// Window geometry, relative to the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

pub struct Window {
    id: WindowId,
    handle: NativeHandle,
    window_type: WindowType,
    parent: Option<Weak<Window>>,
    destroyed: Cell<bool>,
    mapped: Cell<bool>,
    event_mask: Cell<EventMask>,
    extension_events: Cell<EventMask>,
    geometry: Cell<Geometry>,
    state: Cell<WindowState>,
    has_focus: Cell<bool>,
    has_pointer_focus: Cell<bool>,
    filters: RefCell<FilterList>,
}

impl Window {
    pub fn new(
        handle: NativeHandle,
        window_type: WindowType,
        parent: Option<&WindowRef>,
        geometry: Geometry,
    ) -> WindowRef {
        Rc::new(Self {
            id: WindowId::next(),
            handle,
            window_type,
            parent: parent.map(Rc::downgrade),
            destroyed: Cell::new(false),
            mapped: Cell::new(false),
            event_mask: Cell::new(EventMask::empty()),
            extension_events: Cell::new(EventMask::empty()),
            geometry: Cell::new(geometry),
            state: Cell::new(WindowState::WITHDRAWN),
            has_focus: Cell::new(false),
            has_pointer_focus: Cell::new(false),
            filters: RefCell::new(FilterList::new()),
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn parent(&self) -> Option<WindowRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.set(true);
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    pub fn set_mapped(&self, mapped: bool) {
        self.mapped.set(mapped);
    }

    pub fn events(&self) -> EventMask {
        self.event_mask.get()
    }

    pub fn set_events(&self, mask: EventMask) {
        self.event_mask.set(mask);
    }

    pub fn extension_events(&self) -> EventMask {
        self.extension_events.get()
    }

    pub fn set_extension_events(&self, mask: EventMask) {
        self.extension_events.set(mask);
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry.get()
    }

    pub fn set_geometry(&self, geometry: Geometry) {
        self.geometry.set(geometry);
    }

    pub fn state(&self) -> WindowState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: WindowState) {
        self.state.set(state);
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus.get()
    }

    pub(crate) fn set_has_focus(&self, focus: bool) {
        self.has_focus.set(focus);
    }

    pub fn has_pointer_focus(&self) -> bool {
        self.has_pointer_focus.get()
    }

    pub(crate) fn set_has_pointer_focus(&self, focus: bool) {
        self.has_pointer_focus.set(focus);
    }

    /// Origin of this window in root coordinates
    pub fn root_origin(&self) -> (i32, i32) {
        if self.window_type == WindowType::Root {
            return (0, 0);
        }
        let geometry = self.geometry();
        let (mut x, mut y) = (geometry.x, geometry.y);
        let mut current = self.parent();
        while let Some(window) = current {
            if window.window_type == WindowType::Root {
                break;
            }
            let geometry = window.geometry();
            x += geometry.x;
            y += geometry.y;
            current = window.parent();
        }
        (x, y)
    }

    /// This window followed by its ancestors, root last
    pub fn ancestors(self: &Rc<Self>) -> Vec<WindowRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(window) = current {
            current = window.parent();
            chain.push(window);
        }
        chain
    }

    /// Whether `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Window) -> bool {
        let mut current = other.parent();
        while let Some(window) = current {
            if window.id == self.id {
                return true;
            }
            current = window.parent();
        }
        false
    }

    pub fn add_filter(&self, func: FilterFunc, data: Option<FilterData>) {
        self.filters.borrow_mut().add(func, data);
    }

    pub fn remove_filter(&self, func: FilterFunc, data: Option<&FilterData>) -> bool {
        self.filters.borrow_mut().remove(func, data)
    }

    pub fn filter_count(&self) -> usize {
        self.filters.borrow().len()
    }

    /// Run the window's filters; the list is snapshotted so a filter may
    /// register or remove filters on this window.
    pub(crate) fn apply_filters(&self, native: &NativeEvent, event: &mut Event) -> FilterReturn {
        let filters = self.filters.borrow().clone();
        filters.apply(native, event)
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("type", &self.window_type)
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_origin_sums_ancestors() {
        let root = Window::new(1, WindowType::Root, None, Geometry::new(0, 0, 1000, 800));
        let top = Window::new(2, WindowType::Toplevel, Some(&root), Geometry::new(100, 50, 400, 300));
        let child = Window::new(3, WindowType::Child, Some(&top), Geometry::new(10, 20, 50, 50));

        assert_eq!(root.root_origin(), (0, 0));
        assert_eq!(top.root_origin(), (100, 50));
        assert_eq!(child.root_origin(), (110, 70));
    }

    #[test]
    fn test_ancestry() {
        let root = Window::new(1, WindowType::Root, None, Geometry::default());
        let top = Window::new(2, WindowType::Toplevel, Some(&root), Geometry::default());
        let child = Window::new(3, WindowType::Child, Some(&top), Geometry::default());

        let chain: Vec<NativeHandle> = child.ancestors().iter().map(|w| w.handle()).collect();
        assert_eq!(chain, vec![3, 2, 1]);
        assert!(root.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&top));
        assert!(!top.is_ancestor_of(&top));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Window::new(9, WindowType::Toplevel, None, Geometry::default());
        let b = Window::new(9, WindowType::Toplevel, None, Geometry::default());
        assert_ne!(a.id(), b.id());
    }
}
