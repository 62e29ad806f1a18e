//! gdk-events
//!
//! Event translation and dispatch core of a GDK-style drawing kit: native
//! events come in through a [`Backend`], get normalized into [`Event`]s,
//! pass through filters, click/crossing/expose synthesis and grab routing,
//! and are delivered one at a time to a registered handler.

pub mod atoms;
pub mod backend;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod events;
pub mod filter;
pub mod grab;
pub mod translate;
pub mod window;

pub use backend::{Backend, BackendCaps};
pub use config::Config;
pub use display::Display;
pub use error::{Error, Result};
pub use events::{Event, EventKind, EventType};
pub use window::{Window, WindowRef};
