//! Translator
//!
//! Turns one native event into zero or one normalized event, possibly
//! queueing extra synthesized events around it: multi-clicks, compressed
//! exposure remainders, crossings, focus and window-state changes, grab
//! breaks, and the characters of an input-method commit.

pub mod click;
pub mod crossing;
pub mod expose;
pub mod ime;
pub mod protocols;
pub mod routing;

use std::rc::Rc;

use tracing::{debug, trace};

use crate::backend::Backend;
use crate::device::CORE_POINTER;
use crate::display::Display;
use crate::events::native::{
    DeviceEvent, NativeButton, NativeCrossing, NativeEvent, NativeKey, NativeKind, NativeMotion,
};
use crate::events::{
    ButtonEvent, ClientEvent, ConfigureEvent, CrossingEvent, CrossingMode, DeviceId, Event, EventKind, EventMask,
    EventType, ExposeEvent, FocusDetail, FocusEvent, KeyEvent, ModifierType, MotionEvent,
    NotifyType, PropertyEvent, PropertyState, ProximityEvent, Rectangle, ScrollDirection,
    ScrollEvent, SelectionEvent, Time, WindowState, CURRENT_TIME,
};
use crate::filter::FilterReturn;
use crate::grab::PointerGrab;
use crate::window::{Geometry, WindowRef, WindowType};

use click::ClickCount;
use crossing::{crossing_path, CrossingDirection};
use expose::{Compressed, ExposeCompressor};
use protocols::ProtocolRequest;
use routing::{retarget, route_event, RouteGrab};

/// `_NET_WM_DESKTOP` value of a window shown on every desktop
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

impl<B: Backend> Display<B> {
    /// Translate a native event.
    ///
    /// Returns the normalized event, or `None` when the native event was
    /// filtered out or has no normalized form. Synthesized companions are
    /// queued as a side effect.
    pub fn translate_event(&mut self, native: &NativeEvent) -> Option<Event> {
        let window = native.window.and_then(|handle| self.windows.lookup(handle));

        if let Some(window) = &window {
            if window.is_destroyed() && !matches!(native.kind, NativeKind::Destroy) {
                trace!("Dropping event for destroyed window {:#x}", window.handle());
                return None;
            }
        }

        let mut event = Event::new(window.clone(), EventKind::Nothing);
        event.send_event = native.send_event;

        let mut result = self.default_filters.apply(native, &mut event);
        if result == FilterReturn::Continue {
            if let Some(window) = &window {
                result = window.apply_filters(native, &mut event);
            }
        }
        match result {
            FilterReturn::Remove => return None,
            FilterReturn::Translate => return Some(event),
            FilterReturn::Continue => {}
        }

        if matches!(native.kind, NativeKind::MappingNotify) {
            self.keymap_serial = self.keymap_serial.wrapping_add(1);
            debug!("Keymap changed, serial {}", self.keymap_serial);
            return None;
        }

        let Some(window) = window else {
            trace!("No window for native event {:?}", native.window);
            return None;
        };

        match &native.kind {
            NativeKind::KeyPress(key) => self.translate_key(window, key, true, event),
            NativeKind::KeyRelease(key) => self.translate_key(window, key, false, event),
            NativeKind::ButtonPress(button) => self.translate_button_press(window, button, event),
            NativeKind::ButtonRelease(button) => self.translate_button_release(window, button, event),
            NativeKind::Motion(motion) => self.translate_motion(window, motion, event),
            NativeKind::Enter(crossing) => self.translate_crossing(window, crossing, true, event),
            NativeKind::Leave(crossing) => self.translate_crossing(window, crossing, false, event),
            NativeKind::FocusIn { mode, detail } => self.translate_focus(&window, *mode, *detail, true, event),
            NativeKind::FocusOut { mode, detail } => self.translate_focus(&window, *mode, *detail, false, event),
            NativeKind::Expose { area, count } => self.translate_expose(window, *area, *count, true, event),
            NativeKind::GraphicsExpose { area, count } => {
                self.translate_expose(window, *area, *count, false, event)
            }
            NativeKind::NoExpose => {
                event.kind = EventKind::NoExpose;
                Some(event)
            }
            NativeKind::Visibility(state) => {
                event.kind = EventKind::VisibilityNotify(*state);
                Some(event)
            }
            NativeKind::Configure { x, y, width, height } => {
                self.translate_configure(window, native.send_event, (*x, *y, *width, *height), event)
            }
            NativeKind::Map => self.translate_map(window, event),
            NativeKind::Unmap => self.translate_unmap(window, event),
            NativeKind::Destroy => {
                let was_destroyed = window.is_destroyed();
                self.window_destroy_notify(&window);
                if was_destroyed {
                    return None;
                }
                event.kind = EventKind::Destroy;
                Some(event)
            }
            NativeKind::Property { atom, time, deleted } => {
                event.kind = EventKind::PropertyNotify(PropertyEvent {
                    atom: *atom,
                    time: *time,
                    state: if *deleted {
                        PropertyState::Delete
                    } else {
                        PropertyState::NewValue
                    },
                });
                if *atom == self.atoms.net_wm_state || *atom == self.atoms.net_wm_desktop {
                    self.check_wm_state(&window);
                }
                Some(event)
            }
            NativeKind::SelectionClear { selection, time } => {
                event.kind = EventKind::SelectionClear(SelectionEvent {
                    selection: *selection,
                    target: 0,
                    property: 0,
                    requestor: window.handle(),
                    time: *time,
                });
                Some(event)
            }
            NativeKind::SelectionRequest {
                requestor,
                selection,
                target,
                property,
                time,
            } => {
                event.kind = EventKind::SelectionRequest(SelectionEvent {
                    selection: *selection,
                    target: *target,
                    property: *property,
                    requestor: *requestor,
                    time: *time,
                });
                Some(event)
            }
            NativeKind::SelectionNotify {
                selection,
                target,
                property,
                time,
            } => {
                event.kind = EventKind::SelectionNotify(SelectionEvent {
                    selection: *selection,
                    target: *target,
                    property: *property,
                    requestor: window.handle(),
                    time: *time,
                });
                Some(event)
            }
            NativeKind::ClientMessage {
                message_type,
                format,
                data,
            } => {
                let result = self.client_filters.apply(*message_type, native, &mut event);
                self.run_protocol_requests();
                match result {
                    Some(FilterReturn::Remove) => None,
                    Some(FilterReturn::Translate) => Some(event),
                    _ => {
                        event.kind = EventKind::ClientEvent(ClientEvent {
                            message_type: *message_type,
                            format: *format,
                            data: *data,
                        });
                        Some(event)
                    }
                }
            }
            NativeKind::ImeCommit { time, text } => self.translate_commit(&window, *time, text),
            NativeKind::Device { device, event: device_event } => {
                self.translate_device(window, *device, device_event, event)
            }
            NativeKind::Other { data, .. } => {
                event.kind = EventKind::Other(data.clone());
                Some(event)
            }
            NativeKind::KeymapNotify
            | NativeKind::Create
            | NativeKind::Reparent
            | NativeKind::Gravity
            | NativeKind::MappingNotify => None,
        }
    }

    fn run_protocol_requests(&mut self) {
        for request in self.protocols.take_requests() {
            match request {
                ProtocolRequest::TakeFocus { window, time } => {
                    debug!("WM_TAKE_FOCUS: focusing {:#x}", window);
                    self.backend.set_input_focus(window, time);
                }
                ProtocolRequest::Ping { message_type, data } => {
                    trace!("_NET_WM_PING: replying to {:#x}", data[2]);
                    let root = self.root.handle();
                    self.backend.send_ping_reply(root, message_type, data);
                }
            }
        }
    }

    // ----------------------------------------------------------------
    // Keyboard
    // ----------------------------------------------------------------

    fn keyboard_route(&self, window: &WindowRef, event_type: EventType, state: ModifierType) -> Option<WindowRef> {
        let grab = self.grabs.keyboard().map(|grab| RouteGrab {
            window: &grab.window,
            owner_events: grab.owner_events,
            event_mask: EventMask::KEY_PRESS | EventMask::KEY_RELEASE,
        });
        route_event(window, grab, event_type, state)
    }

    /// A release immediately followed by a press of the same key at the
    /// same time is keyboard autorepeat.
    fn is_autorepeat_release(&mut self, window: &WindowRef, key: &NativeKey) -> bool {
        let handle = window.handle();
        match self.backend.peek_event() {
            Some(next) if next.window == Some(handle) => matches!(
                &next.kind,
                NativeKind::KeyPress(press) if press.keycode == key.keycode && press.time == key.time
            ),
            _ => false,
        }
    }

    fn translate_key(&mut self, window: WindowRef, key: &NativeKey, press: bool, mut event: Event) -> Option<Event> {
        if !press && !self.backend.caps().detectable_autorepeat && self.is_autorepeat_release(&window, key) {
            trace!("Autorepeat release of keycode {} dropped", key.keycode);
            return None;
        }

        let event_type = if press {
            EventType::KeyPress
        } else {
            EventType::KeyRelease
        };
        let target = self.keyboard_route(&window, event_type, key.state)?;

        let key = KeyEvent {
            time: key.time,
            state: key.state,
            keyval: key.keyval,
            hardware_keycode: key.keycode,
            group: key.group,
            string: key.string.clone(),
        };
        event.window = Some(target);
        event.kind = if press {
            EventKind::KeyPress(key)
        } else {
            EventKind::KeyRelease(key)
        };
        Some(event)
    }

    fn translate_commit(&mut self, window: &WindowRef, time: Time, text: &str) -> Option<Event> {
        let state = self.backend.modifier_state();
        let target = self.keyboard_route(window, EventType::KeyPress, state)?;
        let with_release = target.events().contains(EventMask::KEY_RELEASE);

        let mut events = ime::expand_commit(&target, text, time, state, with_release).into_iter();
        let first = events.next()?;
        for event in events {
            self.queue.append(event);
        }
        debug!("Input method commit of {} chars to {:#x}", text.chars().count(), target.handle());
        Some(first)
    }

    // ----------------------------------------------------------------
    // Pointer
    // ----------------------------------------------------------------

    fn ignores_core(&self, window: &WindowRef) -> bool {
        self.config.input_ignore_core && !window.extension_events().is_empty()
    }

    fn pointer_route(&self, window: &WindowRef, event_type: EventType, state: ModifierType) -> Option<WindowRef> {
        let grab = self.grabs.pointer().map(|grab| RouteGrab {
            window: &grab.window,
            owner_events: grab.owner_events,
            event_mask: grab.event_mask,
        });
        route_event(window, grab, event_type, state)
    }

    /// Follow the pointer into `window`, synthesizing crossings on
    /// backends that do not report them.
    fn track_pointer(&mut self, window: &WindowRef, time: Time, root: (f64, f64), state: ModifierType) {
        self.pointer_root = root;
        if !self.backend.caps().synthesize_crossings {
            return;
        }

        let mode = if std::mem::take(&mut self.ungrab_crossing_pending) {
            CrossingMode::Ungrab
        } else {
            CrossingMode::Normal
        };
        let src = self
            .window_under_pointer
            .replace(window.clone())
            .unwrap_or_else(|| self.root.clone());
        if !Rc::ptr_eq(&src, window) {
            self.synthesize_crossing(&src, window, mode, time, root, state);
        }
    }

    /// Queue enter/leave events for a pointer move from `src` to `dest`.
    ///
    /// During an exclusive pointer grab only the grab window hears about it.
    pub(crate) fn synthesize_crossing(
        &mut self,
        src: &WindowRef,
        dest: &WindowRef,
        mode: CrossingMode,
        time: Time,
        root: (f64, f64),
        state: ModifierType,
    ) {
        let exclusive = self
            .grabs
            .pointer()
            .filter(|grab| !grab.owner_events)
            .map(|grab| grab.window.clone());

        for step in crossing_path(src, dest) {
            if step.window.window_type() == WindowType::Root || step.window.is_destroyed() {
                continue;
            }
            if exclusive
                .as_ref()
                .is_some_and(|grab_window| !Rc::ptr_eq(grab_window, &step.window))
            {
                continue;
            }
            let event_type = match step.direction {
                CrossingDirection::Enter => EventType::EnterNotify,
                CrossingDirection::Leave => EventType::LeaveNotify,
            };
            if !step.window.events().accepts(event_type, state) {
                continue;
            }

            let (origin_x, origin_y) = step.window.root_origin();
            let crossing = CrossingEvent {
                subwindow: step.subwindow,
                time,
                x: root.0 - f64::from(origin_x),
                y: root.1 - f64::from(origin_y),
                x_root: root.0,
                y_root: root.1,
                mode,
                detail: step.detail,
                focus: false,
                state,
            };
            trace!("{:?} {:?} on {:#x}", event_type, step.detail, step.window.handle());
            let kind = match step.direction {
                CrossingDirection::Enter => EventKind::EnterNotify(crossing),
                CrossingDirection::Leave => EventKind::LeaveNotify(crossing),
            };
            self.queue_before_current(Event::new(Some(step.window), kind));
        }
    }

    fn translate_button_press(&mut self, window: WindowRef, button: &NativeButton, mut event: Event) -> Option<Event> {
        if self.ignores_core(&window) {
            return None;
        }
        let root = (f64::from(button.x_root), f64::from(button.y_root));
        self.track_pointer(&window, button.time, root, button.state);

        let direction = ScrollDirection::from_button(button.button);
        let event_type = if direction.is_some() {
            EventType::Scroll
        } else {
            EventType::ButtonPress
        };
        let target = self.pointer_route(&window, event_type, button.state)?;

        if direction.is_none() && self.backend.caps().implicit_grabs && self.grabs.pointer().is_none() {
            debug!("Implicit pointer grab on {:#x}", target.handle());
            self.grabs.set_pointer(PointerGrab {
                window: target.clone(),
                owner_events: false,
                event_mask: target.events(),
                confine_to: None,
                cursor: None,
                time: button.time,
                implicit: true,
            });
        }

        let (x, y) = (f64::from(button.x), f64::from(button.y));
        event.kind = match direction {
            Some(direction) => EventKind::Scroll(ScrollEvent {
                time: button.time,
                x,
                y,
                x_root: root.0,
                y_root: root.1,
                state: button.state,
                direction,
                device: CORE_POINTER,
            }),
            None => EventKind::ButtonPress(ButtonEvent {
                time: button.time,
                x,
                y,
                x_root: root.0,
                y_root: root.1,
                state: button.state,
                button: button.button,
                device: CORE_POINTER,
            }),
        };
        deliver_to(&mut event, &window, &target);

        if direction.is_none() {
            let count = self.clicks.record(button.time, target.id(), button.button);
            if let Some(multi) = multi_click(&event, count) {
                trace!("{:?} on {:#x}", count, target.handle());
                self.queue.append(multi);
            }
        }
        Some(event)
    }

    fn translate_button_release(
        &mut self,
        window: WindowRef,
        button: &NativeButton,
        mut event: Event,
    ) -> Option<Event> {
        if self.ignores_core(&window) {
            return None;
        }
        let root = (f64::from(button.x_root), f64::from(button.y_root));
        self.track_pointer(&window, button.time, root, button.state);

        // Wheel clicks come as press/release pairs; the press already scrolled
        if ScrollDirection::from_button(button.button).is_some() {
            return None;
        }

        let target = self.pointer_route(&window, EventType::ButtonRelease, button.state);

        let still_held = button.state.intersection(ModifierType::BUTTONS) - ModifierType::for_button(button.button);
        if still_held.is_empty() && self.grabs.pointer().is_some_and(|grab| grab.implicit) {
            if let Some(grab) = self.grabs.clear_pointer(CURRENT_TIME) {
                debug!("Implicit pointer grab on {:#x} ended", grab.window.handle());
            }
            if self.backend.caps().synthesize_crossings {
                self.ungrab_crossing_pending = true;
            }
        }

        let target = target?;
        event.kind = EventKind::ButtonRelease(ButtonEvent {
            time: button.time,
            x: f64::from(button.x),
            y: f64::from(button.y),
            x_root: root.0,
            y_root: root.1,
            state: button.state,
            button: button.button,
            device: CORE_POINTER,
        });
        deliver_to(&mut event, &window, &target);
        Some(event)
    }

    fn translate_motion(&mut self, window: WindowRef, motion: &NativeMotion, mut event: Event) -> Option<Event> {
        if self.ignores_core(&window) {
            return None;
        }
        let root = (f64::from(motion.x_root), f64::from(motion.y_root));
        self.track_pointer(&window, motion.time, root, motion.state);

        let target = self.pointer_route(&window, EventType::MotionNotify, motion.state)?;
        event.kind = EventKind::MotionNotify(MotionEvent {
            time: motion.time,
            x: f64::from(motion.x),
            y: f64::from(motion.y),
            x_root: root.0,
            y_root: root.1,
            state: motion.state,
            is_hint: motion.is_hint,
            device: CORE_POINTER,
        });
        deliver_to(&mut event, &window, &target);
        Some(event)
    }

    fn translate_crossing(
        &mut self,
        window: WindowRef,
        crossing: &NativeCrossing,
        enter: bool,
        mut event: Event,
    ) -> Option<Event> {
        self.pointer_root = (f64::from(crossing.x_root), f64::from(crossing.y_root));
        if enter {
            self.window_under_pointer = Some(window.clone());
        } else if self
            .window_under_pointer
            .as_ref()
            .is_some_and(|under| Rc::ptr_eq(under, &window))
        {
            self.window_under_pointer = None;
        }

        // The pointer entering a toplevel that has the keyboard focus
        // without holding it directly gives the toplevel pointer focus
        if crossing.focus && window.window_type() != WindowType::Child && crossing.detail != NotifyType::Inferior {
            self.update_focus(&window, |window| window.set_has_pointer_focus(enter));
        }

        let crossing = CrossingEvent {
            subwindow: crossing.subwindow.and_then(|handle| self.windows.lookup(handle)),
            time: crossing.time,
            x: f64::from(crossing.x),
            y: f64::from(crossing.y),
            x_root: f64::from(crossing.x_root),
            y_root: f64::from(crossing.y_root),
            mode: crossing.mode,
            detail: crossing.detail,
            focus: crossing.focus,
            state: crossing.state,
        };
        event.kind = if enter {
            EventKind::EnterNotify(crossing)
        } else {
            EventKind::LeaveNotify(crossing)
        };
        Some(event)
    }

    // ----------------------------------------------------------------
    // Focus
    // ----------------------------------------------------------------

    /// Apply `change` and queue a focus event if the window's combined
    /// focus flipped
    fn update_focus(&mut self, window: &WindowRef, change: impl FnOnce(&WindowRef)) {
        let had_focus = window.has_focus() || window.has_pointer_focus();
        change(window);
        let has_focus = window.has_focus() || window.has_pointer_focus();
        if had_focus != has_focus {
            debug!("Focus {} on {:#x}", if has_focus { "in" } else { "out" }, window.handle());
            self.queue.append(focus_event(window, has_focus));
        }
    }

    fn translate_focus(
        &mut self,
        window: &WindowRef,
        mode: CrossingMode,
        detail: FocusDetail,
        focus_in: bool,
        mut event: Event,
    ) -> Option<Event> {
        if window.window_type() == WindowType::Child {
            return None;
        }

        let had_focus = window.has_focus() || window.has_pointer_focus();
        match detail {
            FocusDetail::Ancestor
            | FocusDetail::Virtual
            | FocusDetail::Nonlinear
            | FocusDetail::NonlinearVirtual => window.set_has_focus(focus_in),
            // Pointer focus does not change while a grab starts or ends
            FocusDetail::Pointer => {
                let grab_transition = if focus_in {
                    mode == CrossingMode::Grab
                } else {
                    mode == CrossingMode::Ungrab
                };
                if !grab_transition {
                    window.set_has_pointer_focus(focus_in);
                }
            }
            FocusDetail::Inferior | FocusDetail::PointerRoot | FocusDetail::None => {}
        }
        let has_focus = window.has_focus() || window.has_pointer_focus();

        if had_focus == has_focus {
            return None;
        }
        event.kind = EventKind::FocusChange(FocusEvent { focus_in: has_focus });
        Some(event)
    }

    // ----------------------------------------------------------------
    // Structure
    // ----------------------------------------------------------------

    fn translate_configure(
        &mut self,
        window: WindowRef,
        send_event: bool,
        (x, y, width, height): (i32, i32, i32, i32),
        mut event: Event,
    ) -> Option<Event> {
        let size = (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0));

        if window.window_type() == WindowType::Child {
            window.set_geometry(Geometry::new(x, y, size.0, size.1));
            return None;
        }

        // Reparenting window managers report toplevel positions relative
        // to their frame; ask the server for the real origin
        let (mut x, mut y) = (x, y);
        if x == 0 && y == 0 && !send_event && window.window_type() != WindowType::Root {
            if let Some((root_x, root_y)) = self.backend.translate_coordinates(window.handle(), self.root.handle()) {
                (x, y) = (root_x, root_y);
            }
        }

        window.set_geometry(Geometry::new(x, y, size.0, size.1));
        event.kind = EventKind::Configure(ConfigureEvent { x, y, width, height });
        Some(event)
    }

    fn translate_map(&mut self, window: WindowRef, mut event: Event) -> Option<Event> {
        window.set_mapped(true);
        if window.window_type() != WindowType::Child {
            self.set_window_state(&window, WindowState::WITHDRAWN | WindowState::ICONIFIED, WindowState::empty());
        }
        event.kind = EventKind::Map;
        Some(event)
    }

    fn translate_unmap(&mut self, window: WindowRef, mut event: Event) -> Option<Event> {
        window.set_mapped(false);
        event.kind = EventKind::Unmap;

        let (pointer, keyboard) = self.grabs.release_window(&window);
        if pointer.is_some() {
            self.queue_grab_broken(&window, false, true, None);
        }
        if keyboard.is_some() {
            self.queue_grab_broken(&window, true, true, None);
        }

        if window.window_type() != WindowType::Child && !window.state().contains(WindowState::WITHDRAWN) {
            self.set_window_state(&window, WindowState::empty(), WindowState::ICONIFIED);
        }
        Some(event)
    }

    /// Follow the window manager's `_NET_WM_STATE`. Sticky only counts
    /// when the window is also on every desktop.
    fn check_wm_state(&mut self, window: &WindowRef) {
        let atoms = self.atoms;
        let items = self
            .backend
            .get_property32(window.handle(), atoms.net_wm_state)
            .unwrap_or_default();
        let has = |atom| items.contains(&atom);

        let mut sticky = has(atoms.net_wm_state_sticky);
        if sticky {
            let desktop = self.backend.get_property32(window.handle(), atoms.net_wm_desktop);
            if let Some(&current) = desktop.as_ref().and_then(|items| items.first()) {
                sticky = current == ALL_DESKTOPS;
            }
        }
        let maximized = has(atoms.net_wm_state_maximized_vert) && has(atoms.net_wm_state_maximized_horz);
        trace!(
            "_NET_WM_STATE on {:#x}: sticky {}, maximized {}",
            window.handle(),
            sticky,
            maximized
        );

        for (flag, on) in [(WindowState::STICKY, sticky), (WindowState::MAXIMIZED, maximized)] {
            if on {
                self.set_window_state(window, WindowState::empty(), flag);
            } else {
                self.set_window_state(window, flag, WindowState::empty());
            }
        }
    }

    // ----------------------------------------------------------------
    // Exposure
    // ----------------------------------------------------------------

    fn translate_expose(
        &mut self,
        window: WindowRef,
        area: Rectangle,
        count: u32,
        compress: bool,
        mut event: Event,
    ) -> Option<Event> {
        let (mut area, mut count) = (area, count);

        if compress && self.config.compress_exposures {
            let mut compressor = ExposeCompressor::new(area);
            let handle = window.handle();
            let mut seen_nonmatching = false;

            loop {
                let next = self.backend.check_if_event(&mut |candidate| {
                    let is_expose = matches!(candidate.kind, NativeKind::Expose { .. });
                    // Gravity events are ignored, so exposures compress across them
                    if !is_expose && !matches!(candidate.kind, NativeKind::Gravity) {
                        seen_nonmatching = true;
                    }
                    !seen_nonmatching && is_expose && candidate.window == Some(handle)
                });
                let Some(next) = next else {
                    break;
                };
                let NativeKind::Expose { area: next_area, .. } = next.kind else {
                    continue;
                };

                let mut filtered = Event::new(Some(window.clone()), EventKind::Nothing);
                filtered.send_event = next.send_event;
                match window.apply_filters(&next, &mut filtered) {
                    FilterReturn::Continue => compressor.add(next_area),
                    FilterReturn::Translate => {
                        self.queue.append(filtered);
                    }
                    FilterReturn::Remove => {}
                }
            }

            if compressor.merged() > 0 {
                trace!("Compressed {} exposures on {:#x}", compressor.merged(), handle);
                match compressor.finish() {
                    Compressed::One(rect) => {
                        area = rect;
                        count = 0;
                    }
                    Compressed::Two(first, second) => {
                        area = first;
                        count = 1;
                        self.queue.append(Event::new(
                            Some(window.clone()),
                            EventKind::Expose(ExposeEvent {
                                area: second,
                                region: vec![second],
                                count: 0,
                            }),
                        ));
                    }
                }
            } else {
                // Every exposure this window had waiting was consumed above
                count = 0;
            }
        }

        event.kind = EventKind::Expose(ExposeEvent {
            area,
            region: vec![area],
            count,
        });
        Some(event)
    }

    // ----------------------------------------------------------------
    // Extension devices
    // ----------------------------------------------------------------

    fn translate_device(
        &mut self,
        window: WindowRef,
        device: DeviceId,
        device_event: &DeviceEvent,
        mut event: Event,
    ) -> Option<Event> {
        if !self.devices.is_reporting(device) {
            trace!("Device {} is disabled", device);
            return None;
        }
        let selected = window.extension_events();

        event.kind = match device_event {
            DeviceEvent::Motion(motion) => {
                if !selected.accepts(EventType::MotionNotify, motion.state) {
                    return None;
                }
                EventKind::MotionNotify(MotionEvent {
                    time: motion.time,
                    x: f64::from(motion.x),
                    y: f64::from(motion.y),
                    x_root: f64::from(motion.x_root),
                    y_root: f64::from(motion.y_root),
                    state: motion.state,
                    is_hint: motion.is_hint,
                    device,
                })
            }
            DeviceEvent::ButtonPress(button) | DeviceEvent::ButtonRelease(button) => {
                let press = matches!(device_event, DeviceEvent::ButtonPress(_));
                let event_type = if press {
                    EventType::ButtonPress
                } else {
                    EventType::ButtonRelease
                };
                if !selected.accepts(event_type, button.state) {
                    return None;
                }
                let button = ButtonEvent {
                    time: button.time,
                    x: f64::from(button.x),
                    y: f64::from(button.y),
                    x_root: f64::from(button.x_root),
                    y_root: f64::from(button.y_root),
                    state: button.state,
                    button: button.button,
                    device,
                };
                if press {
                    EventKind::ButtonPress(button)
                } else {
                    EventKind::ButtonRelease(button)
                }
            }
            DeviceEvent::ProximityIn { time } => {
                if !selected.accepts(EventType::ProximityIn, ModifierType::empty()) {
                    return None;
                }
                EventKind::ProximityIn(ProximityEvent { time: *time, device })
            }
            DeviceEvent::ProximityOut { time } => {
                if !selected.accepts(EventType::ProximityOut, ModifierType::empty()) {
                    return None;
                }
                EventKind::ProximityOut(ProximityEvent { time: *time, device })
            }
        };
        Some(event)
    }
}

/// Point `event` at `target`, re-expressing coordinates when routing moved it
fn deliver_to(event: &mut Event, window: &WindowRef, target: &WindowRef) {
    if Rc::ptr_eq(window, target) {
        event.window = Some(target.clone());
    } else {
        retarget(event, target);
    }
}

fn multi_click(press: &Event, count: ClickCount) -> Option<Event> {
    let EventKind::ButtonPress(button) = &press.kind else {
        return None;
    };
    let kind = match count {
        ClickCount::Single => return None,
        ClickCount::Double => EventKind::DoubleButtonPress(button.clone()),
        ClickCount::Triple => EventKind::TripleButtonPress(button.clone()),
    };
    Some(Event {
        window: press.window.clone(),
        send_event: press.send_event,
        kind,
    })
}

fn focus_event(window: &WindowRef, focus_in: bool) -> Event {
    Event::new(Some(window.clone()), EventKind::FocusChange(FocusEvent { focus_in }))
}
