//! Multi-click detection
//!
//! Remembers the last two presses. Only timing, window identity and button
//! gate a multi-click; pointer travel between presses is not compared.

use crate::events::Time;
use crate::window::WindowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickCount {
    Single,
    Double,
    Triple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Click {
    time: Time,
    window: WindowId,
    button: u32,
}

impl Click {
    fn continues(&self, time: Time, window: WindowId, button: u32, limit: u32) -> bool {
        // Server time wraps about every 49 days
        time.wrapping_sub(self.time) < limit && self.window == window && self.button == button
    }
}

#[derive(Debug, Clone)]
pub struct ClickHistory {
    /// [most recent press, the one before]
    slots: [Option<Click>; 2],
    double_click_time: u32,
    triple_click_time: u32,
}

impl ClickHistory {
    pub fn new(double_click_time: u32, triple_click_time: u32) -> Self {
        Self {
            slots: [None, None],
            double_click_time,
            triple_click_time,
        }
    }

    /// Record a press and classify it
    pub fn record(&mut self, time: Time, window: WindowId, button: u32) -> ClickCount {
        let click = Click { time, window, button };

        if self.slots[1].is_some_and(|c| c.continues(time, window, button, self.triple_click_time)) {
            self.slots = [None, None];
            return ClickCount::Triple;
        }

        if self.slots[0].is_some_and(|c| c.continues(time, window, button, self.double_click_time)) {
            self.slots = [Some(click), self.slots[0]];
            return ClickCount::Double;
        }

        self.slots = [Some(click), None];
        ClickCount::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Geometry, Window, WindowType};

    fn ids() -> (WindowId, WindowId) {
        let a = Window::new(1, WindowType::Toplevel, None, Geometry::default());
        let b = Window::new(2, WindowType::Toplevel, None, Geometry::default());
        (a.id(), b.id())
    }

    #[test]
    fn test_single_double_triple() {
        let (w, _) = ids();
        let mut history = ClickHistory::new(250, 500);
        assert_eq!(history.record(1000, w, 1), ClickCount::Single);
        assert_eq!(history.record(1100, w, 1), ClickCount::Double);
        assert_eq!(history.record(1150, w, 1), ClickCount::Triple);
        // History was reset by the triple
        assert_eq!(history.record(1200, w, 1), ClickCount::Single);
    }

    #[test]
    fn test_slow_second_press_is_single() {
        let (w, _) = ids();
        let mut history = ClickHistory::new(250, 500);
        history.record(1000, w, 1);
        assert_eq!(history.record(1250, w, 1), ClickCount::Single);
        assert_eq!(history.record(1300, w, 1), ClickCount::Double);
    }

    #[test]
    fn test_other_button_or_window_never_multiclicks() {
        let (a, b) = ids();
        let mut history = ClickHistory::new(250, 500);
        history.record(1000, a, 1);
        assert_eq!(history.record(1010, a, 3), ClickCount::Single);
        assert_eq!(history.record(1020, b, 3), ClickCount::Single);
        assert_eq!(history.record(1030, a, 3), ClickCount::Single);
    }

    #[test]
    fn test_triple_window_measured_from_first_press() {
        let (w, _) = ids();
        let mut history = ClickHistory::new(250, 500);
        history.record(1000, w, 1);
        history.record(1200, w, 1);
        // 290ms after the second press but inside 500ms of the first
        assert_eq!(history.record(1490, w, 1), ClickCount::Triple);

        history.record(2000, w, 1);
        history.record(2200, w, 1);
        assert_eq!(history.record(2510, w, 1), ClickCount::Single);
    }

    #[test]
    fn test_clicks_across_time_wraparound() {
        let (w, _) = ids();
        let mut history = ClickHistory::new(250, 500);
        history.record(u32::MAX - 100, w, 1);
        assert_eq!(history.record(50, w, 1), ClickCount::Double);
        assert_eq!(history.record(300, w, 1), ClickCount::Triple);

        history.record(u32::MAX - 10, w, 1);
        assert_eq!(history.record(400, w, 1), ClickCount::Single);
    }
}
