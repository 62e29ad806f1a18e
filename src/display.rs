//! Display session
//!
//! [`Display`] owns everything one connection needs: the backend, the
//! window registry, the normalized queue, filters, grab and click state,
//! and the registered event handler. Every translator and dispatch call
//! goes through it; there is no process-wide state.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::atoms::Atoms;
use crate::backend::Backend;
use crate::config::EventsConfig;
use crate::device::DeviceRegistry;
use crate::events::queue::{EventQueue, NodeId};
use crate::events::{
    free_event, Atom, CrossingMode, CursorId, Event, EventKind, EventMask, GrabBrokenEvent, Time,
    WindowState, WindowStateEvent,
};
use crate::filter::{ClientFilterList, FilterData, FilterFunc, FilterList};
use crate::grab::{GrabState, GrabStatus, KeyboardGrab, PointerGrab};
use crate::translate::click::ClickHistory;
use crate::translate::protocols::{wm_protocols_filter, ProtocolContext};
use crate::window::{Geometry, Window, WindowRef, WindowRegistry, WindowType};

/// Callback receiving every dispatched event
pub type EventHandler<B> = Box<dyn FnMut(&mut Display<B>, &Event)>;

pub struct Display<B: Backend> {
    pub(crate) backend: B,
    pub(crate) config: EventsConfig,
    pub(crate) atoms: Atoms,
    pub(crate) windows: WindowRegistry,
    pub(crate) root: WindowRef,
    pub(crate) queue: EventQueue,
    put_back: VecDeque<Event>,
    /// Placeholder node of the native event being translated
    pub(crate) translating: Option<NodeId>,
    pub(crate) default_filters: FilterList,
    pub(crate) client_filters: ClientFilterList,
    pub(crate) protocols: Rc<ProtocolContext>,
    pub(crate) grabs: GrabState,
    pub(crate) clicks: ClickHistory,
    pub(crate) devices: DeviceRegistry,
    pub(crate) window_under_pointer: Option<WindowRef>,
    /// Next synthesized crossing is caused by a released grab
    pub(crate) ungrab_crossing_pending: bool,
    /// Last known pointer position in root coordinates
    pub(crate) pointer_root: (f64, f64),
    pub(crate) keymap_serial: u32,
    handler: Option<EventHandler<B>>,
    handler_serial: u64,
    show_events: bool,
    quit: bool,
}

impl<B: Backend> Display<B> {
    /// Open a session over `backend`
    pub fn new(mut backend: B, config: EventsConfig) -> Self {
        let atoms = Atoms::new(&mut backend);
        let (root_handle, root_geometry) = backend.root();
        let root = Window::new(root_handle, WindowType::Root, None, root_geometry);
        root.set_mapped(true);
        root.set_state(WindowState::empty());

        let mut windows = WindowRegistry::new();
        windows.insert(root.clone());

        let protocols = Rc::new(ProtocolContext::new(atoms));
        let mut client_filters = ClientFilterList::new();
        let protocol_data: FilterData = protocols.clone();
        client_filters.add(atoms.wm_protocols, wm_protocols_filter, Some(protocol_data));

        info!(
            "Display opened: root {:#x} ({}x{}), caps {:?}",
            root_handle,
            root_geometry.width,
            root_geometry.height,
            backend.caps()
        );

        Self {
            clicks: ClickHistory::new(config.double_click_time, config.triple_click_time),
            backend,
            config,
            atoms,
            windows,
            root,
            queue: EventQueue::new(),
            put_back: VecDeque::new(),
            translating: None,
            default_filters: FilterList::new(),
            client_filters,
            protocols,
            grabs: GrabState::new(),
            devices: DeviceRegistry::new(),
            window_under_pointer: None,
            ungrab_crossing_pending: false,
            pointer_root: (0.0, 0.0),
            keymap_serial: 0,
            handler: None,
            handler_serial: 0,
            show_events: false,
            quit: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &EventsConfig {
        &self.config
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.devices
    }

    /// Bumped whenever the platform reports a keyboard mapping change
    pub fn keymap_serial(&self) -> u32 {
        self.keymap_serial
    }

    pub fn set_show_events(&mut self, show: bool) {
        self.show_events = show;
    }

    /// Ask the dispatch loop to stop after the current event
    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    // ----------------------------------------------------------------
    // Windows
    // ----------------------------------------------------------------

    pub fn root_window(&self) -> WindowRef {
        self.root.clone()
    }

    /// Create and register a window record for an existing native window.
    ///
    /// `parent` defaults to the root window.
    pub fn new_window(
        &mut self,
        handle: crate::events::NativeHandle,
        window_type: WindowType,
        parent: Option<&WindowRef>,
        geometry: Geometry,
        events: EventMask,
    ) -> Option<WindowRef> {
        let parent = parent.cloned().unwrap_or_else(|| self.root.clone());
        let window = Window::new(handle, window_type, Some(&parent), geometry);
        window.set_events(events);
        self.register_window(&window).then_some(window)
    }

    pub fn register_window(&mut self, window: &WindowRef) -> bool {
        self.windows.insert(window.clone())
    }

    pub fn lookup_window(&self, handle: crate::events::NativeHandle) -> Option<WindowRef> {
        self.windows.lookup(handle)
    }

    pub fn window_under_pointer(&self) -> Option<WindowRef> {
        self.window_under_pointer.clone()
    }

    /// Mark a window destroyed on the toolkit side. The registry entry
    /// stays until the platform confirms with a destroy notification.
    pub fn destroy_window(&mut self, window: &WindowRef) {
        if window.is_destroyed() {
            return;
        }
        window.mark_destroyed();
        self.forget_window(window);
        debug!("Window {:#x} destroyed", window.handle());
    }

    /// The platform destroyed the window: drop it from the registry once
    /// and release everything that still points at it.
    pub fn window_destroy_notify(&mut self, window: &WindowRef) {
        window.mark_destroyed();
        let registered = self
            .windows
            .lookup(window.handle())
            .is_some_and(|found| Rc::ptr_eq(&found, window));
        if registered {
            self.windows.remove(window.handle());
        }
        self.forget_window(window);
    }

    fn forget_window(&mut self, window: &WindowRef) {
        let (pointer, keyboard) = self.grabs.release_window(window);
        if pointer.is_some() {
            debug!("Pointer grab released with window {:#x}", window.handle());
        }
        if keyboard.is_some() {
            debug!("Keyboard grab released with window {:#x}", window.handle());
        }
        let under_pointer = self
            .window_under_pointer
            .as_ref()
            .is_some_and(|under| Rc::ptr_eq(under, window));
        if under_pointer {
            self.window_under_pointer = window.parent();
        }
    }

    pub(crate) fn set_window_state(&mut self, window: &WindowRef, unset: WindowState, set: WindowState) {
        let old = window.state();
        let new = (old - unset) | set;
        if old == new {
            return;
        }
        window.set_state(new);
        self.queue.append(Event::new(
            Some(window.clone()),
            EventKind::WindowState(WindowStateEvent {
                changed_mask: old ^ new,
                new_window_state: new,
            }),
        ));
    }

    // ----------------------------------------------------------------
    // Queue access
    // ----------------------------------------------------------------

    /// Register the dispatch callback. The previous handler is dropped,
    /// which is its destroy notification.
    pub fn set_event_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Display<B>, &Event) + 'static,
    {
        self.handler = Some(Box::new(handler));
        self.handler_serial += 1;
    }

    pub fn clear_event_handler(&mut self) {
        self.handler = None;
        self.handler_serial += 1;
    }

    /// Translate native events until something is deliverable or the
    /// backend runs dry.
    pub(crate) fn queue_native_events(&mut self) {
        while self.queue.find_first_deliverable().is_none() && self.backend.pending() {
            let Some(native) = self.backend.next_event() else {
                break;
            };
            let node = self.queue.append_pending(Event::new(None, EventKind::Nothing));
            self.translating = Some(node);
            let translated = self.translate_event(&native);
            self.translating = None;

            match translated {
                Some(event) => {
                    self.queue.replace(node, event);
                    self.queue.set_pending(node, false);
                }
                None => {
                    self.queue.remove_link(node);
                }
            }
        }
    }

    /// Queue a synthesized event ahead of the native event being
    /// translated, or at the tail outside translation
    pub(crate) fn queue_before_current(&mut self, event: Event) {
        match self.translating {
            Some(node) => {
                self.queue.insert_before(node, event);
            }
            None => {
                self.queue.append(event);
            }
        }
    }

    pub fn get_next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.put_back.pop_front() {
            return Some(event);
        }
        self.queue_native_events();
        self.queue.unqueue()
    }

    pub fn peek_next_event(&mut self) -> Option<Event> {
        if let Some(event) = self.put_back.front() {
            return Some(event.clone());
        }
        self.queue_native_events();
        self.queue.peek()
    }

    /// Re-inject an event so it is returned before anything else
    pub fn put_event_back(&mut self, event: Event) {
        self.put_back.push_front(event);
    }

    /// Append a copy of `event` to the queue
    pub fn put_event(&mut self, event: &Event) {
        self.queue.append(event.clone());
    }

    pub fn free_event(&self, event: Event) {
        free_event(event);
    }

    pub fn events_pending(&mut self) -> bool {
        !self.put_back.is_empty()
            || self.queue.find_first_deliverable().is_some()
            || self.backend.pending()
    }

    /// Read-only view of the normalized queue
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Drain native events, then deliver one event to the handler.
    ///
    /// Returns false when nothing was available.
    pub fn dispatch_one(&mut self) -> bool {
        let Some(event) = self.get_next_event() else {
            return false;
        };

        if self.show_events {
            info!(
                "{:?} on {:?}",
                event.event_type(),
                event.window.as_ref().map(|w| w.handle())
            );
        }

        match self.handler.take() {
            Some(mut handler) => {
                let serial = self.handler_serial;
                handler(self, &event);
                // Keep it unless the handler installed or cleared one itself
                if self.handler_serial == serial {
                    self.handler = Some(handler);
                }
            }
            None => trace!("No event handler, dropping {:?}", event.event_type()),
        }

        free_event(event);
        true
    }

    // ----------------------------------------------------------------
    // Filters
    // ----------------------------------------------------------------

    /// Add a filter to `window`, or to the default list with `None`
    pub fn add_filter(&mut self, window: Option<&WindowRef>, func: FilterFunc, data: Option<FilterData>) {
        match window {
            Some(window) => window.add_filter(func, data),
            None => self.default_filters.add(func, data),
        }
    }

    pub fn remove_filter(
        &mut self,
        window: Option<&WindowRef>,
        func: FilterFunc,
        data: Option<&FilterData>,
    ) -> bool {
        match window {
            Some(window) => window.remove_filter(func, data),
            None => self.default_filters.remove(func, data),
        }
    }

    pub fn add_client_message_filter(&mut self, message_type: Atom, func: FilterFunc, data: Option<FilterData>) {
        self.client_filters.add(message_type, func, data);
    }

    pub fn remove_client_message_filter(
        &mut self,
        message_type: Atom,
        func: FilterFunc,
        data: Option<&FilterData>,
    ) -> bool {
        self.client_filters.remove(message_type, func, data)
    }

    // ----------------------------------------------------------------
    // Grabs
    // ----------------------------------------------------------------

    pub fn grab_pointer(
        &mut self,
        window: &WindowRef,
        owner_events: bool,
        event_mask: EventMask,
        confine_to: Option<&WindowRef>,
        cursor: Option<CursorId>,
        time: Time,
    ) -> GrabStatus {
        if window.is_destroyed() {
            return GrabStatus::NotViewable;
        }
        if !self.grabs.pointer_time_valid(time) {
            debug!("Pointer grab at {} is older than the current grab", time);
            return GrabStatus::InvalidTime;
        }

        let status = self.backend.grab_pointer(
            window.handle(),
            owner_events,
            event_mask,
            confine_to.map(|w| w.handle()),
            cursor,
            time,
        );
        if status != GrabStatus::Success {
            warn!("Pointer grab on {:#x} failed: {:?}", window.handle(), status);
            return status;
        }

        if self.backend.caps().synthesize_crossings && !owner_events {
            let current = self
                .window_under_pointer
                .clone()
                .unwrap_or_else(|| self.root.clone());
            let root = self.pointer_root;
            let state = self.backend.modifier_state();
            self.synthesize_crossing(&current, window, CrossingMode::Grab, time, root, state);
            // The ungrab crossing leaves from the grab window
            self.window_under_pointer = Some(window.clone());
        }

        let previous = self.grabs.set_pointer(PointerGrab {
            window: window.clone(),
            owner_events,
            event_mask,
            confine_to: confine_to.cloned(),
            cursor,
            time,
            implicit: false,
        });
        if let Some(previous) = previous {
            if !Rc::ptr_eq(&previous.window, window) && !previous.window.is_destroyed() {
                self.queue_grab_broken(&previous.window, false, previous.implicit, Some(window.clone()));
            }
        }

        debug!("Pointer grabbed by {:#x} (owner_events {})", window.handle(), owner_events);
        GrabStatus::Success
    }

    pub fn ungrab_pointer(&mut self, time: Time) {
        self.backend.ungrab_pointer(time);
        if let Some(grab) = self.grabs.clear_pointer(time) {
            debug!("Pointer ungrabbed from {:#x}", grab.window.handle());
            if self.backend.caps().synthesize_crossings {
                self.ungrab_crossing_pending = true;
            }
        }
    }

    pub fn grab_keyboard(&mut self, window: &WindowRef, owner_events: bool, time: Time) -> GrabStatus {
        if window.is_destroyed() {
            return GrabStatus::NotViewable;
        }
        if !self.grabs.keyboard_time_valid(time) {
            debug!("Keyboard grab at {} is older than the current grab", time);
            return GrabStatus::InvalidTime;
        }

        let status = self.backend.grab_keyboard(window.handle(), owner_events, time);
        if status != GrabStatus::Success {
            warn!("Keyboard grab on {:#x} failed: {:?}", window.handle(), status);
            return status;
        }

        let previous = self.grabs.set_keyboard(KeyboardGrab {
            window: window.clone(),
            owner_events,
            time,
        });
        if let Some(previous) = previous {
            if !Rc::ptr_eq(&previous.window, window) && !previous.window.is_destroyed() {
                self.queue_grab_broken(&previous.window, true, false, Some(window.clone()));
            }
        }

        debug!("Keyboard grabbed by {:#x} (owner_events {})", window.handle(), owner_events);
        GrabStatus::Success
    }

    pub fn ungrab_keyboard(&mut self, time: Time) {
        self.backend.ungrab_keyboard(time);
        if let Some(grab) = self.grabs.clear_keyboard(time) {
            debug!("Keyboard ungrabbed from {:#x}", grab.window.handle());
        }
    }

    pub fn pointer_is_grabbed(&self) -> bool {
        self.grabs.pointer().is_some()
    }

    pub fn pointer_grab(&self) -> Option<&PointerGrab> {
        self.grabs.pointer()
    }

    pub fn keyboard_grab(&self) -> Option<&KeyboardGrab> {
        self.grabs.keyboard()
    }

    pub(crate) fn queue_grab_broken(
        &mut self,
        window: &WindowRef,
        keyboard: bool,
        implicit: bool,
        grab_window: Option<WindowRef>,
    ) {
        debug!(
            "GrabBroken: window {:#x}, keyboard {}, implicit {}",
            window.handle(),
            keyboard,
            implicit
        );
        self.queue.append(Event::new(
            Some(window.clone()),
            EventKind::GrabBroken(GrabBrokenEvent {
                keyboard,
                implicit,
                grab_window,
            }),
        ));
    }
}
