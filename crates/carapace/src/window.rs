//! Window registry.
//!
//! The platform layer registers each native window it creates and receives a
//! [`WindowHandle`] to stamp onto the events it posts. The shell's run loop
//! keeps the registered state current from `Size` and `Window` events.
//!
//! Operating on a handle that was never registered, or has been
//! unregistered, is never an error: queries return `None` and mutations are
//! logged no-ops. Stale handles are a normal occurrence when a platform
//! tears a window down while events for it are still in flight.

use parking_lot::RwLock;
use slotmap::SlotMap;
use std::sync::Arc;

use carapace_core::event::{NativeWindowPtr, WindowHandle};

/// Registered state of one window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowState {
    /// Client width in pixels.
    pub width: u32,
    /// Client height in pixels.
    pub height: u32,
    /// The native platform handle, null until the platform reports one.
    pub native: NativeWindowPtr,
}

/// Owns the handle space for application windows.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: SlotMap<WindowHandle, WindowState>,
}

impl WindowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window with its initial client size.
    pub fn register(&mut self, width: u32, height: u32) -> WindowHandle {
        let handle = self.windows.insert(WindowState {
            width,
            height,
            native: NativeWindowPtr::default(),
        });
        tracing::debug!(target: "carapace::window", ?handle, width, height, "window registered");
        handle
    }

    /// Unregister a window. Returns `false` if the handle was not valid.
    pub fn unregister(&mut self, handle: WindowHandle) -> bool {
        let removed = self.windows.remove(handle).is_some();
        if removed {
            tracing::debug!(target: "carapace::window", ?handle, "window unregistered");
        } else {
            tracing::debug!(target: "carapace::window", ?handle, "unregister of invalid handle ignored");
        }
        removed
    }

    /// Whether the handle refers to a registered window.
    pub fn is_valid(&self, handle: WindowHandle) -> bool {
        self.windows.contains_key(handle)
    }

    /// The registered state of a window, if the handle is valid.
    pub fn get(&self, handle: WindowHandle) -> Option<WindowState> {
        self.windows.get(handle).copied()
    }

    /// Update a window's client size. No-op on an invalid handle.
    pub fn set_size(&mut self, handle: WindowHandle, width: u32, height: u32) {
        match self.windows.get_mut(handle) {
            Some(state) => {
                state.width = width;
                state.height = height;
            }
            None => {
                tracing::debug!(target: "carapace::window", ?handle, "resize of invalid handle ignored");
            }
        }
    }

    /// Update a window's native handle. No-op on an invalid handle.
    pub fn set_native(&mut self, handle: WindowHandle, native: NativeWindowPtr) {
        match self.windows.get_mut(handle) {
            Some(state) => state.native = native,
            None => {
                tracing::debug!(target: "carapace::window", ?handle, "native update of invalid handle ignored");
            }
        }
    }

    /// Number of registered windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no windows are registered.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// A thread-safe, clonable handle to a shared [`WindowRegistry`].
///
/// The platform layer registers windows from its own thread while the run
/// loop reads and updates sizes from the logic thread.
#[derive(Debug, Clone, Default)]
pub struct SharedWindowRegistry {
    inner: Arc<RwLock<WindowRegistry>>,
}

impl SharedWindowRegistry {
    /// Create an empty shared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window with its initial client size.
    pub fn register(&self, width: u32, height: u32) -> WindowHandle {
        self.inner.write().register(width, height)
    }

    /// Unregister a window. Returns `false` if the handle was not valid.
    pub fn unregister(&self, handle: WindowHandle) -> bool {
        self.inner.write().unregister(handle)
    }

    /// Whether the handle refers to a registered window.
    pub fn is_valid(&self, handle: WindowHandle) -> bool {
        self.inner.read().is_valid(handle)
    }

    /// The registered state of a window, if the handle is valid.
    pub fn get(&self, handle: WindowHandle) -> Option<WindowState> {
        self.inner.read().get(handle)
    }

    /// Update a window's client size. No-op on an invalid handle.
    pub fn set_size(&self, handle: WindowHandle, width: u32, height: u32) {
        self.inner.write().set_size(handle, width, height);
    }

    /// Update a window's native handle. No-op on an invalid handle.
    pub fn set_native(&self, handle: WindowHandle, native: NativeWindowPtr) {
        self.inner.write().set_native(handle, native);
    }

    /// Number of registered windows.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no windows are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

static_assertions::assert_impl_all!(SharedWindowRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_query() {
        let mut registry = WindowRegistry::new();
        let handle = registry.register(1280, 720);

        assert!(registry.is_valid(handle));
        let state = registry.get(handle).unwrap();
        assert_eq!((state.width, state.height), (1280, 720));
        assert!(state.native.is_null());
    }

    #[test]
    fn test_unregister_invalidates_handle() {
        let mut registry = WindowRegistry::new();
        let handle = registry.register(640, 480);

        assert!(registry.unregister(handle));
        assert!(!registry.is_valid(handle));
        assert!(registry.get(handle).is_none());
        // A second unregister is a reported no-op.
        assert!(!registry.unregister(handle));
    }

    #[test]
    fn test_mutations_on_invalid_handle_are_noops() {
        let mut registry = WindowRegistry::new();
        let handle = registry.register(640, 480);
        registry.unregister(handle);

        registry.set_size(handle, 100, 100);
        registry.set_native(handle, NativeWindowPtr::from_addr(0xdead));
        assert!(registry.get(handle).is_none());
    }

    #[test]
    fn test_handles_are_not_reused_blindly() {
        let mut registry = WindowRegistry::new();
        let first = registry.register(10, 10);
        registry.unregister(first);
        let second = registry.register(20, 20);

        // The stale handle stays invalid even though the slot was recycled.
        assert_ne!(first, second);
        assert!(!registry.is_valid(first));
        assert!(registry.is_valid(second));
    }

    #[test]
    fn test_shared_registry_cross_thread() {
        let registry = SharedWindowRegistry::new();
        let registry_for_thread = registry.clone();

        let handle = std::thread::spawn(move || registry_for_thread.register(800, 600))
            .join()
            .unwrap();

        assert!(registry.is_valid(handle));
        registry.set_size(handle, 1024, 768);
        let state = registry.get(handle).unwrap();
        assert_eq!((state.width, state.height), (1024, 768));
    }
}
