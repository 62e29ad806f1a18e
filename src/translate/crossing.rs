//! Crossing paths
//!
//! Enter/leave sequence for a pointer moving between two windows, derived
//! from their lowest common ancestor.

use std::rc::Rc;

use crate::events::NotifyType;
use crate::window::WindowRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDirection {
    Enter,
    Leave,
}

#[derive(Debug, Clone)]
pub struct CrossingStep {
    pub direction: CrossingDirection,
    pub window: WindowRef,
    pub detail: NotifyType,
    /// Child of `window` on the path toward the other end, if any
    pub subwindow: Option<WindowRef>,
}

impl CrossingStep {
    fn leave(window: &WindowRef, detail: NotifyType, subwindow: Option<&WindowRef>) -> Self {
        Self {
            direction: CrossingDirection::Leave,
            window: window.clone(),
            detail,
            subwindow: subwindow.cloned(),
        }
    }

    fn enter(window: &WindowRef, detail: NotifyType, subwindow: Option<&WindowRef>) -> Self {
        Self {
            direction: CrossingDirection::Enter,
            window: window.clone(),
            detail,
            subwindow: subwindow.cloned(),
        }
    }
}

/// Leaves from `src` upward, then enters downward to `dest`.
///
/// Windows strictly between an endpoint and the common ancestor get
/// virtual events; the ancestor itself gets none.
pub fn crossing_path(src: &WindowRef, dest: &WindowRef) -> Vec<CrossingStep> {
    if Rc::ptr_eq(src, dest) {
        return Vec::new();
    }

    let up = src.ancestors();
    let down = dest.ancestors();
    let common_up = up
        .iter()
        .position(|window| down.iter().any(|other| Rc::ptr_eq(window, other)));
    let common_down = common_up.and_then(|i| down.iter().position(|other| Rc::ptr_eq(&up[i], other)));

    // Index of the common ancestor in each chain; disjoint trees walk to the top
    let up_end = common_up.unwrap_or(up.len());
    let down_end = common_down.unwrap_or(down.len());
    let src_is_ancestor = up_end == 0;
    let dest_is_ancestor = down_end == 0;

    let mut steps = Vec::with_capacity(up_end + down_end + 2);

    if src_is_ancestor {
        steps.push(CrossingStep::leave(src, NotifyType::Inferior, down.get(down_end.wrapping_sub(1))));
    } else if dest_is_ancestor {
        steps.push(CrossingStep::leave(src, NotifyType::Ancestor, None));
    } else {
        steps.push(CrossingStep::leave(src, NotifyType::Nonlinear, None));
    }

    let up_detail = if dest_is_ancestor {
        NotifyType::Virtual
    } else {
        NotifyType::NonlinearVirtual
    };
    for i in 1..up_end {
        steps.push(CrossingStep::leave(&up[i], up_detail, Some(&up[i - 1])));
    }

    let down_detail = if src_is_ancestor {
        NotifyType::Virtual
    } else {
        NotifyType::NonlinearVirtual
    };
    for i in (1..down_end).rev() {
        steps.push(CrossingStep::enter(&down[i], down_detail, Some(&down[i - 1])));
    }

    if src_is_ancestor {
        steps.push(CrossingStep::enter(dest, NotifyType::Ancestor, None));
    } else if dest_is_ancestor {
        steps.push(CrossingStep::enter(dest, NotifyType::Inferior, up.get(up_end.wrapping_sub(1))));
    } else {
        steps.push(CrossingStep::enter(dest, NotifyType::Nonlinear, None));
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NativeHandle;
    use crate::window::{Geometry, Window, WindowType};
    use CrossingDirection::{Enter, Leave};

    fn tree() -> Vec<WindowRef> {
        // 1 root; 2 toplevel, 3 child of 2, 4 child of 3; 5 toplevel, 6 child of 5
        let root = Window::new(1, WindowType::Root, None, Geometry::default());
        let a = Window::new(2, WindowType::Toplevel, Some(&root), Geometry::default());
        let b = Window::new(3, WindowType::Child, Some(&a), Geometry::default());
        let c = Window::new(4, WindowType::Child, Some(&b), Geometry::default());
        let p = Window::new(5, WindowType::Toplevel, Some(&root), Geometry::default());
        let q = Window::new(6, WindowType::Child, Some(&p), Geometry::default());
        vec![root, a, b, c, p, q]
    }

    fn summary(steps: &[CrossingStep]) -> Vec<(CrossingDirection, NativeHandle, NotifyType)> {
        steps
            .iter()
            .map(|s| (s.direction, s.window.handle(), s.detail))
            .collect()
    }

    #[test]
    fn test_into_child_and_back() {
        let windows = tree();
        let (a, b) = (&windows[1], &windows[2]);

        let into = crossing_path(a, b);
        assert_eq!(
            summary(&into),
            vec![(Leave, 2, NotifyType::Inferior), (Enter, 3, NotifyType::Ancestor)]
        );
        assert_eq!(into[0].subwindow.as_ref().map(|w| w.handle()), Some(3));

        let back = crossing_path(b, a);
        assert_eq!(
            summary(&back),
            vec![(Leave, 3, NotifyType::Ancestor), (Enter, 2, NotifyType::Inferior)]
        );
        assert_eq!(back[1].subwindow.as_ref().map(|w| w.handle()), Some(3));
    }

    #[test]
    fn test_intermediate_windows_get_virtual_events() {
        let windows = tree();
        let (a, c) = (&windows[1], &windows[3]);

        assert_eq!(
            summary(&crossing_path(a, c)),
            vec![
                (Leave, 2, NotifyType::Inferior),
                (Enter, 3, NotifyType::Virtual),
                (Enter, 4, NotifyType::Ancestor),
            ]
        );
        assert_eq!(
            summary(&crossing_path(c, a)),
            vec![
                (Leave, 4, NotifyType::Ancestor),
                (Leave, 3, NotifyType::Virtual),
                (Enter, 2, NotifyType::Inferior),
            ]
        );
    }

    #[test]
    fn test_lateral_move_is_nonlinear() {
        let windows = tree();
        let (c, q) = (&windows[3], &windows[5]);

        assert_eq!(
            summary(&crossing_path(c, q)),
            vec![
                (Leave, 4, NotifyType::Nonlinear),
                (Leave, 3, NotifyType::NonlinearVirtual),
                (Leave, 2, NotifyType::NonlinearVirtual),
                (Enter, 5, NotifyType::NonlinearVirtual),
                (Enter, 6, NotifyType::Nonlinear),
            ]
        );
    }

    #[test]
    fn test_same_window_is_empty() {
        let windows = tree();
        assert!(crossing_path(&windows[2], &windows[2]).is_empty());
    }
}
