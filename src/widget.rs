//! A named widget whose implementation is hidden behind an opaque handle.
//!
//! `Widget` stores nothing but an [`ErasedHandle`]. The implementation type,
//! every method of `Widget`, and the release operation for the hidden value
//! all live in the private `imp` module, so the layout of the implementation
//! never leaks into this module or its callers, and the release is always
//! emitted where the implementation is fully defined.

use std::fmt;
use std::sync::Arc;

use crate::erased::ErasedHandle;

mod imp;

/// Observer called with the widget's name when its implementation is torn
/// down.
pub type TeardownHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for creating a [`Widget`].
#[derive(Clone, Default)]
pub struct WidgetOptions {
    /// Initial name.
    pub name: String,
    /// Called once per implementation instance when it is dropped.
    pub on_teardown: Option<TeardownHook>,
}

impl WidgetOptions {
    /// Options with the given name and no teardown observer.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_teardown: None,
        }
    }

    /// Set the teardown observer.
    pub fn on_teardown(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_teardown = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for WidgetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetOptions")
            .field("name", &self.name)
            .field("on_teardown", &self.on_teardown.is_some())
            .finish()
    }
}

/// A widget with a stable public surface and a hidden implementation.
///
/// Cloning a widget deep-copies its implementation: the clone owns a
/// distinct instance with equal state.
///
/// # Example
///
/// ```
/// use unique::Widget;
///
/// let mut widget = Widget::new("gauge");
/// widget.set_name("dial");
/// assert_eq!(widget.name(), "dial");
/// assert_eq!(widget.revision(), 1);
/// ```
pub struct Widget {
    pimpl: ErasedHandle,
}
