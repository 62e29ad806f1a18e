//! gdk-events
//!
//! Opens a top-level window on the X display and prints every event the
//! translation core delivers for it. Closing the window exits.

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gdk_events::backend::X11Backend;
use gdk_events::config::Config;
use gdk_events::dispatch::{EventSource, MainLoop, NoLock};
use gdk_events::events::EventMask;
use gdk_events::window::{Geometry, WindowType};
use gdk_events::{Display, EventKind};

fn main() -> Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.debug.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(e) = config_error {
        warn!("Failed to load configuration, using defaults: {:#}", e);
    }

    info!("Starting gdk-events");

    let display_name = std::env::args().nth(1);
    let mut backend = X11Backend::connect(display_name.as_deref())
        .context("Failed to connect to X server")?;

    let events = EventMask::EXPOSURE
        | EventMask::POINTER_MOTION
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::SCROLL
        | EventMask::KEY_PRESS
        | EventMask::KEY_RELEASE
        | EventMask::ENTER_NOTIFY
        | EventMask::LEAVE_NOTIFY
        | EventMask::FOCUS_CHANGE
        | EventMask::STRUCTURE
        | EventMask::PROPERTY_CHANGE
        | EventMask::VISIBILITY_NOTIFY;
    let geometry = Geometry::new(0, 0, 400, 300);
    let handle = backend
        .create_window(None, geometry, events, "gdk-events")
        .context("Failed to create window")?;

    let mut display = Display::new(backend, config.events);
    display.set_show_events(config.debug.show_events);
    display
        .new_window(handle, WindowType::Toplevel, None, geometry, events)
        .context("Window handle already registered")?;

    display.set_event_handler(|display, event| {
        info!("{:?} on {:?}", event.event_type(), event.window.as_ref().map(|w| w.handle()));
        if matches!(event.kind, EventKind::Delete) {
            info!("Window closed, exiting");
            display.quit();
        }
    });

    let mut main_loop = MainLoop::new(EventSource::new(display, NoLock))?;
    main_loop.run()
}
