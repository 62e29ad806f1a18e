//! Event Filter Module
//!
//! Ordered filter chains consulted before default translation. A filter
//! sees the native event and the event being built, and decides whether
//! translation continues, stops with the built event, or drops everything.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::events::native::NativeEvent;
use crate::events::{Atom, Event};

/// Filter verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReturn {
    /// Try the next filter, then default translation
    Continue,
    /// Stop and deliver the event as the filter left it
    Translate,
    /// Stop and discard the native event
    Remove,
}

/// Opaque user data handed back to a filter
pub type FilterData = Rc<dyn Any>;

pub type FilterFunc = fn(&NativeEvent, &mut Event, Option<&FilterData>) -> FilterReturn;

#[derive(Clone)]
struct FilterEntry {
    func: FilterFunc,
    data: Option<FilterData>,
}

impl FilterEntry {
    fn matches(&self, func: FilterFunc, data: Option<&FilterData>) -> bool {
        std::ptr::fn_addr_eq(self.func, func)
            && match (&self.data, data) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// Filters in registration order
#[derive(Clone, Default)]
pub struct FilterList {
    entries: Vec<FilterEntry>,
}

impl FilterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a filter; an identical (func, data) pair is not added twice
    pub fn add(&mut self, func: FilterFunc, data: Option<FilterData>) {
        if self.entries.iter().any(|entry| entry.matches(func, data.as_ref())) {
            return;
        }
        self.entries.push(FilterEntry { func, data });
    }

    /// Remove the first exact match
    pub fn remove(&mut self, func: FilterFunc, data: Option<&FilterData>) -> bool {
        match self.entries.iter().position(|entry| entry.matches(func, data)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Run filters until one returns something other than `Continue`
    pub fn apply(&self, native: &NativeEvent, event: &mut Event) -> FilterReturn {
        for entry in &self.entries {
            let result = (entry.func)(native, event, entry.data.as_ref());
            if result != FilterReturn::Continue {
                return result;
            }
        }
        FilterReturn::Continue
    }
}

impl fmt::Debug for FilterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterList")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[derive(Clone)]
struct ClientFilter {
    message_type: Atom,
    entry: FilterEntry,
}

/// Client-message filters keyed by message type
#[derive(Clone, Default)]
pub struct ClientFilterList {
    filters: Vec<ClientFilter>,
}

impl ClientFilterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn add(&mut self, message_type: Atom, func: FilterFunc, data: Option<FilterData>) {
        let duplicate = self.filters.iter().any(|filter| {
            filter.message_type == message_type && filter.entry.matches(func, data.as_ref())
        });
        if duplicate {
            return;
        }
        debug!("Client message filter registered for atom {}", message_type);
        self.filters.push(ClientFilter {
            message_type,
            entry: FilterEntry { func, data },
        });
    }

    pub fn remove(&mut self, message_type: Atom, func: FilterFunc, data: Option<&FilterData>) -> bool {
        let position = self.filters.iter().position(|filter| {
            filter.message_type == message_type && filter.entry.matches(func, data)
        });
        match position {
            Some(index) => {
                self.filters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Run the first filter registered for `message_type`.
    ///
    /// `None` means nothing is registered for the atom.
    pub fn apply(
        &self,
        message_type: Atom,
        native: &NativeEvent,
        event: &mut Event,
    ) -> Option<FilterReturn> {
        let filter = self
            .filters
            .iter()
            .find(|filter| filter.message_type == message_type)?;
        Some((filter.entry.func)(native, event, filter.entry.data.as_ref()))
    }
}

impl fmt::Debug for ClientFilterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFilterList")
            .field("len", &self.filters.len())
            .finish()
    }
}
