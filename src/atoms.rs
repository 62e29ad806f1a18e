//! Protocol atoms
//!
//! Atoms the default client-message filters and window-state tracking
//! need, interned once per display session.

use crate::backend::Backend;
use crate::events::Atom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_take_focus: Atom,
    pub net_wm_ping: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_sticky: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_wm_desktop: Atom,
}

impl Atoms {
    pub fn new<B: Backend>(backend: &mut B) -> Self {
        let mut intern = |name: &str| backend.intern_atom(name);

        Self {
            wm_protocols: intern("WM_PROTOCOLS"),
            wm_delete_window: intern("WM_DELETE_WINDOW"),
            wm_take_focus: intern("WM_TAKE_FOCUS"),
            net_wm_ping: intern("_NET_WM_PING"),
            net_wm_state: intern("_NET_WM_STATE"),
            net_wm_state_sticky: intern("_NET_WM_STATE_STICKY"),
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT"),
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ"),
            net_wm_desktop: intern("_NET_WM_DESKTOP"),
        }
    }
}
