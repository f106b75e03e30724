use std::fmt;

use super::{TeardownHook, Widget, WidgetOptions};
use crate::erased::ErasedHandle;
use crate::error::Result;

#[derive(Clone)]
struct WidgetImpl {
    name: String,
    revision: u64,
    on_teardown: Option<TeardownHook>,
}

impl WidgetImpl {
    fn new(options: WidgetOptions) -> Self {
        Self {
            name: options.name,
            revision: 0,
            on_teardown: options.on_teardown,
        }
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
        self.revision += 1;
    }

    fn describe(&self) -> String {
        format!("{} (rev {})", self.name, self.revision)
    }
}

impl Drop for WidgetImpl {
    fn drop(&mut self) {
        tracing::debug!(name = %self.name, revision = self.revision, "widget torn down");
        if let Some(hook) = &self.on_teardown {
            hook(&self.name);
        }
    }
}

impl Widget {
    /// Create a widget named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_impl(WidgetImpl::new(WidgetOptions::named(name)))
    }

    /// Create a widget from `options`, reporting allocation failure.
    pub fn with_options(options: WidgetOptions) -> Result<Self> {
        Ok(Self {
            pimpl: ErasedHandle::try_erase_cloneable(WidgetImpl::new(options))?,
        })
    }

    fn from_impl(imp: WidgetImpl) -> Self {
        Self {
            pimpl: ErasedHandle::erase_cloneable(imp),
        }
    }

    // `pimpl` is only ever built from a `WidgetImpl` in this module and is
    // never released or handed out, so the downcasts below cannot fail.
    fn imp(&self) -> &WidgetImpl {
        self.pimpl
            .downcast_ref()
            .expect("widget always owns its implementation")
    }

    fn imp_mut(&mut self) -> &mut WidgetImpl {
        self.pimpl
            .downcast_mut()
            .expect("widget always owns its implementation")
    }

    /// Current name.
    pub fn name(&self) -> &str {
        &self.imp().name
    }

    /// Rename the widget. Each rename bumps the revision.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.imp_mut().set_name(name.into());
    }

    /// Number of renames. A clone starts with the original's count.
    pub fn revision(&self) -> u64 {
        self.imp().revision
    }

    /// Human-readable summary.
    pub fn describe(&self) -> String {
        self.imp().describe()
    }
}

impl Clone for Widget {
    fn clone(&self) -> Self {
        // Always erased as cloneable, so the copy cannot fail.
        Self {
            pimpl: self
                .pimpl
                .try_clone()
                .expect("widget implementation is erased as cloneable"),
        }
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.imp(), other.imp());
        a.name == b.name && a.revision == b.revision
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let imp = self.imp();
        f.debug_struct("Widget")
            .field("name", &imp.name)
            .field("revision", &imp.revision)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_bumps_revision() {
        let mut widget = Widget::new("knob");
        widget.set_name("slider");
        widget.set_name("fader");
        assert_eq!(widget.revision(), 2);
        assert_eq!(widget.describe(), "fader (rev 2)");
    }

    #[test]
    fn test_handle_hides_impl_type() {
        let widget = Widget::new("knob");
        let raw = widget.pimpl.get().unwrap();
        assert!(raw.is::<WidgetImpl>());
        assert!(raw.is_cloneable());
        assert!(widget.pimpl.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_clone_copies_into_distinct_allocation() {
        let mut widget = Widget::new("knob");
        widget.set_name("dial");
        let copy = widget.clone();

        assert_ne!(widget.pimpl.get(), copy.pimpl.get());
        assert_ne!(
            widget.imp() as *const WidgetImpl,
            copy.imp() as *const WidgetImpl
        );
        assert_eq!(copy.imp().name, "dial");
        assert_eq!(copy.imp().revision, 1);
    }
}
