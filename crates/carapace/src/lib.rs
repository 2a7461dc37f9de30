//! Carapace: a cross-platform application shell.
//!
//! Carapace unifies windowing events, input state, input bindings, and an
//! application run loop over the concurrency core in [`carapace-core`]:
//!
//! - **Shell**: the run-loop driver that drains the event queue, maintains
//!   input and window state, scans bindings, and dispatches lifecycle
//!   commands to the app worker thread
//! - **Input State**: keyboard/mouse/gamepad snapshots with deadzone
//!   filtering, updated once per consumed event
//! - **Bindings**: named tables mapping key/button/axis conditions to
//!   callbacks or console commands, edge- or level-triggered
//! - **Window Registry**: the handle space for application windows, shared
//!   between the platform layer and the run loop
//! - **Frame Clock**: a fixed-timestep accumulator producing update steps
//!   and a render interpolation fraction
//!
//! The platform layer (the piece that owns the native message pump) sits
//! outside this crate. It registers windows, posts events through an
//! [`EventSender`](carapace_core::queue::EventSender), and runs on whatever
//! thread its OS demands; the shell consumes those events on the logic
//! thread and keeps application code a single sequential thread of
//! execution.
//!
//! # Example
//!
//! ```no_run
//! use carapace::commands::NullCommandRegistry;
//! use carapace::runner::{Shell, ShellConfig};
//! use carapace::window::SharedWindowRegistry;
//! use carapace_core::app::App;
//!
//! struct Game {
//!     time: f32,
//! }
//!
//! impl App for Game {
//!     fn init(&mut self) -> carapace_core::Result<()> {
//!         Ok(())
//!     }
//!     fn update(&mut self, delta: f32) {
//!         self.time += delta;
//!     }
//!     fn draw(&mut self, _alpha: f32) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let windows = SharedWindowRegistry::new();
//!     let _window = windows.register(1280, 720);
//!
//!     let (shell, _events) = Shell::new(ShellConfig::default(), windows, || Game { time: 0.0 })?;
//!     // The platform layer posts into `_events` from its native pump.
//!     Ok(shell.run(&mut NullCommandRegistry)?)
//! }
//! ```
//!
//! [`carapace-core`]: carapace_core

pub mod bindings;
pub mod commands;
pub mod error;
pub mod input;
pub mod runner;
pub mod timestep;
pub mod window;

pub use bindings::{Binding, BindingAction, BindingSet, BindingTableId, BindingTrigger, TriggerMode};
pub use commands::{CommandError, CommandRegistry, NullCommandRegistry};
pub use error::{ShellError, ShellResult};
pub use input::{GamepadState, InputState, KeyState, KeyboardState, MouseState};
pub use runner::{Shell, ShellConfig};
pub use timestep::{FrameClock, FrameStep};
pub use window::{SharedWindowRegistry, WindowRegistry, WindowState};

// Re-export the core types application code touches directly.
pub use carapace_core::app::App;
pub use carapace_core::event::{
    Event, GamepadAxis, GamepadButton, GamepadHandle, Key, KeyModifiers, MouseButton,
    NativeWindowPtr, SuspendPhase, WindowHandle,
};
pub use carapace_core::jobs::{JobHandle, JobScheduler, JobSchedulerConfig, JobStatus};
pub use carapace_core::queue::EventSender;
