//! The shell run-loop driver.
//!
//! [`Shell`] is the logic-thread side of the application: it drains the
//! event queue, folds events into input and window state, scans bindings,
//! steps the frame clock, and dispatches lifecycle commands to the app
//! worker. The platform layer holds the matching [`EventSender`] and posts
//! into it from whatever thread the OS demands.
//!
//! ```text
//! platform pump ──EventSender──▶ Shell::pump_once ──CommandSender──▶ AppWorker
//!                                   │
//!                                   ├─ InputState / WindowRegistry updates
//!                                   └─ BindingSet scan
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use carapace::commands::NullCommandRegistry;
//! use carapace::runner::{Shell, ShellConfig};
//! use carapace::window::SharedWindowRegistry;
//! use carapace_core::app::App;
//!
//! struct Game;
//!
//! impl App for Game {
//!     fn init(&mut self) -> carapace_core::Result<()> {
//!         Ok(())
//!     }
//!     fn update(&mut self, _delta: f32) {}
//!     fn draw(&mut self, _alpha: f32) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let windows = SharedWindowRegistry::new();
//!     let window = windows.register(1280, 720);
//!
//!     let (shell, events) = Shell::new(ShellConfig::default(), windows, || Game)?;
//!
//!     // Hand `events` (and `window`) to the platform layer, then:
//!     let mut registry = NullCommandRegistry;
//!     Ok(shell.run(&mut registry)?)
//! }
//! ```

use std::thread;
use std::time::{Duration, Instant};

use carapace_core::app::App;
use carapace_core::command::{AppWorker, CommandSender, InitStatus, WorkerConfig};
use carapace_core::event::{Event, SuspendPhase};
use carapace_core::queue::{self, EventReceiver, EventSender};

use crate::bindings::BindingSet;
use crate::commands::CommandRegistry;
use crate::error::{ShellError, ShellResult};
use crate::input::{self, InputState};
use crate::timestep::{FrameClock, FrameStep};
use crate::window::SharedWindowRegistry;

/// Configuration for constructing a [`Shell`].
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Capacity of the event queue.
    pub event_capacity: usize,
    /// Fixed simulation step size.
    pub fixed_delta: Duration,
    /// Catch-up limit: most simulation steps paid out in one frame.
    pub max_updates_per_frame: u32,
    /// Configuration of the app worker thread.
    pub worker: WorkerConfig,
    /// Sleep inserted between run-loop iterations to cap the idle spin rate.
    pub idle_sleep: Duration,
    /// Deadzone for gamepad stick axes, in raw axis units.
    pub stick_deadzone: i32,
    /// Deadzone for gamepad trigger axes, in raw axis units.
    pub trigger_deadzone: i32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            event_capacity: queue::DEFAULT_EVENT_CAPACITY,
            // 60 simulation steps per second.
            fixed_delta: Duration::from_micros(16_667),
            max_updates_per_frame: 4,
            worker: WorkerConfig::default(),
            idle_sleep: Duration::from_millis(1),
            stick_deadzone: input::DEFAULT_STICK_DEADZONE,
            trigger_deadzone: input::DEFAULT_TRIGGER_DEADZONE,
        }
    }
}

/// The run-loop driver owning the logic-thread side of the application.
pub struct Shell {
    events: EventReceiver,
    commands: CommandSender,
    worker: AppWorker,
    input: InputState,
    bindings: BindingSet,
    windows: SharedWindowRegistry,
    clock: FrameClock,
    idle_sleep: Duration,
    exit_requested: bool,
}

impl Shell {
    /// Construct a shell and its app worker.
    ///
    /// Returns the shell and the [`EventSender`] for the platform layer.
    /// `factory` runs on the worker thread to build the app instance.
    pub fn new<A, F>(
        config: ShellConfig,
        windows: SharedWindowRegistry,
        factory: F,
    ) -> ShellResult<(Shell, EventSender)>
    where
        A: App,
        F: FnOnce() -> A + Send + 'static,
    {
        let (event_sender, events) = queue::bounded(config.event_capacity);
        let (worker, commands) = AppWorker::spawn(config.worker.clone(), factory)?;

        Ok((
            Shell {
                events,
                commands,
                worker,
                input: InputState::with_deadzones(config.stick_deadzone, config.trigger_deadzone),
                bindings: BindingSet::new(),
                windows,
                clock: FrameClock::new(config.fixed_delta, config.max_updates_per_frame),
                idle_sleep: config.idle_sleep,
                exit_requested: false,
            },
            event_sender,
        ))
    }

    /// The current input snapshot.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// The installed binding tables.
    pub fn bindings_mut(&mut self) -> &mut BindingSet {
        &mut self.bindings
    }

    /// The shared window registry.
    pub fn windows(&self) -> &SharedWindowRegistry {
        &self.windows
    }

    /// The app worker handle, for frame synchronization and init status.
    pub fn worker(&self) -> &AppWorker {
        &self.worker
    }

    /// Whether an exit has been observed or requested.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Request the run loop to end after the current iteration.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Initialize the app and block until the worker has confirmed it.
    ///
    /// Called by [`run`](Self::run); platform layers that drive
    /// [`pump_once`](Self::pump_once) themselves call it first.
    pub fn init(&mut self) -> ShellResult<()> {
        self.commands.init()?;
        let frame = self.commands.frame()?;
        self.worker.wait_frame(frame);

        if self.worker.init_status() == InitStatus::Failed {
            let message = self
                .worker
                .init_error()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ShellError::AppInit(message));
        }
        Ok(())
    }

    /// Run one iteration of the loop: drain events, scan bindings, step the
    /// clock, dispatch lifecycle commands. Returns `false` once an exit has
    /// been observed.
    pub fn pump_once(&mut self, registry: &mut dyn CommandRegistry) -> ShellResult<bool> {
        self.input.begin_frame();
        self.drain_events()?;
        self.bindings.scan(&self.input, registry);

        let step = self.clock.tick(Instant::now());
        self.dispatch_frame(step)?;

        Ok(!self.exit_requested)
    }

    /// Run the loop until exit, then shut the app down.
    #[tracing::instrument(skip_all, target = "carapace::runner", level = "debug")]
    pub fn run(mut self, registry: &mut dyn CommandRegistry) -> ShellResult<()> {
        tracing::info!(target: "carapace::runner", "run loop starting");

        match self.init() {
            Ok(()) => {}
            Err(err) => {
                // Worker is still healthy; stop it before reporting.
                let _ = self.commands.shutdown();
                let _ = self.worker.join();
                return Err(err);
            }
        }

        while self.pump_once(registry)? {
            thread::sleep(self.idle_sleep);
        }

        tracing::info!(target: "carapace::runner", "run loop exiting");
        self.commands.shutdown()?;
        self.worker.join()?;
        Ok(())
    }

    /// Drain the event queue completely, folding every event into input and
    /// window state and translating lifecycle-relevant ones into commands.
    fn drain_events(&mut self) -> ShellResult<()> {
        while let Some(event) = self.events.poll() {
            match &event {
                Event::Exit => {
                    tracing::info!(target: "carapace::runner", "exit event observed");
                    self.exit_requested = true;
                }
                Event::Size {
                    window,
                    width,
                    height,
                } => {
                    self.windows.set_size(*window, *width, *height);
                }
                Event::Window { window, native } => {
                    self.windows.set_native(*window, *native);
                }
                Event::Suspend { phase, .. } => match phase {
                    SuspendPhase::WillSuspend => {
                        self.commands.suspend()?;
                        self.clock.reset();
                    }
                    SuspendPhase::DidResume => {
                        self.commands.resume()?;
                        self.clock.reset();
                    }
                    SuspendPhase::DidSuspend | SuspendPhase::WillResume => {}
                },
                _ => {}
            }
            self.input.apply(&event);
        }
        Ok(())
    }

    /// Dispatch one frame's lifecycle commands.
    fn dispatch_frame(&mut self, step: FrameStep) -> ShellResult<()> {
        for _ in 0..step.updates {
            self.commands.update(step.delta)?;
        }
        self.commands.draw(step.alpha)?;
        self.commands.draw_gui()?;
        self.commands.frame()?;
        Ok(())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("exit_requested", &self.exit_requested)
            .field("binding_tables", &self.bindings.table_count())
            .field("windows", &self.windows.len())
            .finish()
    }
}
