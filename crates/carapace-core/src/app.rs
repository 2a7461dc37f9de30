//! The application lifecycle trait.

use crate::error::Result;

/// The lifecycle collaborator driven by the app worker thread.
///
/// An implementation is constructed *on* the worker thread (see
/// [`AppWorker::spawn`](crate::command::AppWorker::spawn)) and every callback
/// is invoked from that same thread, in the order the shell posted the
/// corresponding commands. The type therefore never crosses a thread boundary
/// after construction and does not need to be `Send`.
///
/// # Example
///
/// ```
/// use carapace_core::app::App;
///
/// struct Game {
///     time: f32,
/// }
///
/// impl App for Game {
///     fn init(&mut self) -> carapace_core::Result<()> {
///         Ok(())
///     }
///
///     fn update(&mut self, delta: f32) {
///         self.time += delta;
///     }
///
///     fn draw(&mut self, _alpha: f32) {}
/// }
/// ```
pub trait App: 'static {
    /// One-time initialization, invoked before any other callback.
    ///
    /// Returning an error marks the worker as failed: subsequent `update`,
    /// `draw` and `draw_gui` commands are skipped, and the error is surfaced
    /// through [`AppWorker::init_status`](crate::command::AppWorker::init_status).
    fn init(&mut self) -> Result<()>;

    /// The platform is suspending the application.
    fn suspend(&mut self) {}

    /// The platform resumed the application.
    fn resume(&mut self) {}

    /// Advance simulation by one fixed timestep, in seconds.
    fn update(&mut self, delta: f32);

    /// Render a frame. `alpha` is the interpolation fraction of the pending
    /// simulation step, in `0.0..1.0`.
    fn draw(&mut self, alpha: f32);

    /// Render immediate-mode GUI on top of the frame.
    fn draw_gui(&mut self) {}

    /// Final teardown. Invoked exactly once, after the last frame, if and
    /// only if `init` succeeded.
    fn shutdown(&mut self) {}
}
