//! Core systems for Carapace.
//!
//! This crate provides the concurrency core of the Carapace application
//! shell:
//!
//! - **Event Queue**: a bounded single-producer/single-consumer queue that
//!   carries input and window events from a platform's native event pump to
//!   the application's logic thread
//! - **Lifecycle Channel**: a typed command channel driving an [`App`]
//!   instance on a dedicated worker thread (init, suspend, resume, update,
//!   draw, GUI, shutdown), with a per-frame synchronization point
//! - **Job Scheduler**: a worker-pool-backed parallel-for that fans a
//!   contiguous item range out across threads with wait/status semantics
//!
//! The split exists because several platforms pin their native event pump to
//! a particular thread. The queue and the lifecycle channel decouple that
//! thread from application logic, so app code stays a single sequential
//! thread of execution on every back-end; the job scheduler is for parallel
//! fan-out *within* a frame (tiling a computation, batch transforms).
//!
//! # Event Queue Example
//!
//! ```
//! use carapace_core::queue;
//! use carapace_core::event::{Event, KeyModifiers, WindowHandle};
//!
//! let (sender, mut receiver) = queue::bounded(256);
//!
//! // Platform thread:
//! sender
//!     .post_mouse_move_event(WindowHandle::default(), 120, 80, 0, KeyModifiers::NONE)
//!     .unwrap();
//!
//! // Logic thread:
//! while let Some(event) = receiver.poll() {
//!     match event {
//!         Event::Mouse { x, y, .. } => println!("cursor at {x},{y}"),
//!         _ => {}
//!     }
//! }
//! ```
//!
//! # Job Scheduler Example
//!
//! ```
//! use carapace_core::jobs::{JobScheduler, JobSchedulerConfig};
//!
//! let scheduler = JobScheduler::new(JobSchedulerConfig::default()).unwrap();
//! let job = scheduler.create(1024, |range| {
//!     for _item in range {
//!         // process one item of the batch
//!     }
//! });
//! scheduler.run(&job);
//! job.wait();
//! ```

pub mod app;
pub mod command;
pub mod error;
pub mod event;
pub mod jobs;
pub mod queue;

pub use app::App;
pub use command::{AppWorker, Command, CommandSender, InitStatus, WorkerConfig};
pub use error::{ChannelError, CoreError, JobError, Result};
pub use event::{
    Event, GamepadAxis, GamepadButton, GamepadHandle, Key, KeyModifiers, MouseButton,
    NativeWindowPtr, SuspendPhase, WindowHandle,
};
pub use jobs::{JobHandle, JobScheduler, JobSchedulerConfig, JobStatus};
pub use queue::{DEFAULT_EVENT_CAPACITY, EventReceiver, EventSender};
