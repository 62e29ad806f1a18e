//! Dispatch Loop
//!
//! Plugs a [`Display`] into a poll-style main loop. [`EventSource`] is the
//! prepare/check/dispatch triple a host loop drives; [`MainLoop`] is the
//! stand-alone loop that waits on the display connection with mio.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::display::Display;
use crate::error::Error;

/// Upper bound on a single wait; mio readiness is edge-triggered
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

const CONNECTION: mio::Token = mio::Token(0);

/// Lock held around every dispatch, so other threads that share toolkit
/// state can serialize with event delivery
pub trait ThreadsLock {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// Single-threaded embedders: no locking
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLock;

impl ThreadsLock for NoLock {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

/// Recursive lock; an event handler may take it again while it is held
/// by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ReentrantLock {
    inner: Arc<ReentrantMutex<()>>,
}

impl ReentrantLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the lock from outside the dispatcher
    pub fn enter(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }
}

impl ThreadsLock for ReentrantLock {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.lock();
        f()
    }
}

/// Display wrapped as a main-loop source
pub struct EventSource<B: Backend, L: ThreadsLock = NoLock> {
    display: Display<B>,
    lock: L,
}

impl<B: Backend, L: ThreadsLock> EventSource<B, L> {
    pub fn new(display: Display<B>, lock: L) -> Self {
        Self { display, lock }
    }

    pub fn display(&self) -> &Display<B> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display<B> {
        &mut self.display
    }

    pub fn into_display(self) -> Display<B> {
        self.display
    }

    /// Ready without waiting? The second value is the wait timeout the
    /// source asks for; `None` means wait for the connection.
    pub fn prepare(&mut self) -> (bool, Option<Duration>) {
        let display = &mut self.display;
        let ready = self.lock.with_lock(|| display.events_pending());
        (ready, None)
    }

    /// Called after the wait
    pub fn check(&mut self) -> bool {
        let display = &mut self.display;
        self.lock.with_lock(|| display.events_pending())
    }

    /// Deliver one event. Returns false once the display asked to quit.
    pub fn dispatch(&mut self) -> bool {
        let display = &mut self.display;
        self.lock.with_lock(|| {
            display.dispatch_one();
            !display.quit_requested()
        })
    }
}

/// Stand-alone loop over one event source
pub struct MainLoop<B: Backend, L: ThreadsLock = NoLock> {
    source: EventSource<B, L>,
    poll: Option<mio::Poll>,
    events: mio::Events,
}

impl<B: Backend, L: ThreadsLock> MainLoop<B, L> {
    /// Register the display connection with mio. Backends without a
    /// descriptor run until their queued events are exhausted.
    pub fn new(source: EventSource<B, L>) -> Result<Self> {
        let poll = match source.display().backend().connection_fd() {
            Some(fd) => {
                let poll = mio::Poll::new().context("Failed to create mio Poll")?;
                poll.registry()
                    .register(&mut mio::unix::SourceFd(&fd), CONNECTION, mio::Interest::READABLE)
                    .context("Failed to register display connection with mio")?;
                debug!("Polling display connection fd {}", fd);
                Some(poll)
            }
            None => None,
        };

        Ok(Self {
            source,
            poll,
            events: mio::Events::with_capacity(1),
        })
    }

    pub fn source(&self) -> &EventSource<B, L> {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut EventSource<B, L> {
        &mut self.source
    }

    pub fn into_source(self) -> EventSource<B, L> {
        self.source
    }

    /// Dispatch until the display quits or the connection goes away
    pub fn run(&mut self) -> Result<()> {
        loop {
            let (ready, timeout) = self.source.prepare();

            if !ready {
                let display = self.source.display_mut();
                display.backend_mut().flush();
                if !display.backend().is_connected() {
                    warn!("Display connection lost");
                    return Err(Error::ConnectionLost.into());
                }

                let Some(poll) = self.poll.as_mut() else {
                    debug!("No pending events and nothing to wait on, leaving main loop");
                    return Ok(());
                };
                let timeout = timeout.map_or(POLL_TIMEOUT, |t| t.min(POLL_TIMEOUT));
                if let Err(err) = poll.poll(&mut self.events, Some(timeout)) {
                    if err.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    return Err(err).context("Display connection poll failed");
                }

                if !self.source.check() {
                    continue;
                }
            }

            if !self.source.dispatch() {
                info!("Main loop quit requested");
                return Ok(());
            }
        }
    }
}
