//! Typed lifecycle command channel between the shell and the app worker.
//!
//! Several platforms force the native event pump onto a specific thread (the
//! Windows message loop, Android's activity thread, the X11 client thread).
//! To keep application code single-threaded anyway, the [`App`] instance
//! lives on a dedicated worker thread and the orchestrating thread talks to
//! it exclusively through [`Command`] values sent over a bounded channel.
//!
//! The command stream replaces a positional opcode+arguments byte protocol:
//! each command carries its arguments in its variant, so a mismatched
//! read/write sequence is unrepresentable rather than a runtime assertion.
//! FIFO delivery over a single producer preserves the ordering contract, and
//! each time the worker wakes it drains every command buffered so far before
//! sleeping again.
//!
//! [`Command::Frame`] is the once-per-frame synchronization point: the worker
//! counts completed frames, and the producer can block until the worker has
//! caught up to a given frame rather than to real time.
//!
//! # Example
//!
//! ```
//! use carapace_core::app::App;
//! use carapace_core::command::{AppWorker, WorkerConfig};
//!
//! struct Counter(u32);
//!
//! impl App for Counter {
//!     fn init(&mut self) -> carapace_core::Result<()> {
//!         Ok(())
//!     }
//!     fn update(&mut self, _delta: f32) {
//!         self.0 += 1;
//!     }
//!     fn draw(&mut self, _alpha: f32) {}
//! }
//!
//! let (worker, mut commands) = AppWorker::spawn(WorkerConfig::default(), || Counter(0)).unwrap();
//! commands.init().unwrap();
//! commands.update(1.0 / 60.0).unwrap();
//! commands.draw(0.0).unwrap();
//! let frame = commands.frame().unwrap();
//! worker.wait_frame(frame);
//! commands.shutdown().unwrap();
//! worker.join().unwrap();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::app::App;
use crate::error::{ChannelError, CoreError, Result};

/// Default capacity of the command channel.
///
/// A frame posts a handful of commands, so this covers hundreds of frames of
/// consumer lag before the producer blocks.
const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// A lifecycle command executed by the app worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Initialize the application.
    Init,
    /// The platform is suspending the application.
    Suspend,
    /// The platform resumed the application.
    Resume,
    /// Advance simulation by one fixed timestep.
    Update {
        /// Step duration in seconds.
        delta: f32,
    },
    /// Render a frame.
    Draw {
        /// Interpolation fraction of the pending simulation step.
        alpha: f32,
    },
    /// Render immediate-mode GUI.
    DrawGui,
    /// End-of-frame marker; bumps the worker's completed-frame counter.
    Frame,
    /// Tear the application down and stop the worker.
    Shutdown,
}

/// Configuration for spawning an [`AppWorker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the command channel.
    pub command_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "carapace-app".to_string(),
            stack_size: None,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Outcome of the application's `init` callback, as seen by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InitStatus {
    /// `init` has not run yet.
    Pending = 0,
    /// `init` returned `Ok`.
    Succeeded = 1,
    /// `init` returned an error; lifecycle callbacks are being skipped.
    Failed = 2,
}

/// State shared between the worker thread and the [`AppWorker`] handle.
struct WorkerShared {
    init_status: AtomicU8,
    init_error: Mutex<Option<String>>,
    completed_frames: AtomicU64,
    frame_mutex: Mutex<()>,
    frame_condvar: Condvar,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            init_status: AtomicU8::new(InitStatus::Pending as u8),
            init_error: Mutex::new(None),
            completed_frames: AtomicU64::new(0),
            frame_mutex: Mutex::new(()),
            frame_condvar: Condvar::new(),
        }
    }

    fn init_status(&self) -> InitStatus {
        match self.init_status.load(Ordering::Acquire) {
            0 => InitStatus::Pending,
            1 => InitStatus::Succeeded,
            _ => InitStatus::Failed,
        }
    }

    fn record_init(&self, result: &Result<()>) {
        match result {
            Ok(()) => {
                self.init_status
                    .store(InitStatus::Succeeded as u8, Ordering::Release);
            }
            Err(err) => {
                *self.init_error.lock() = Some(err.to_string());
                self.init_status
                    .store(InitStatus::Failed as u8, Ordering::Release);
            }
        }
        // Frame waiters may be gating on init's outcome.
        let _guard = self.frame_mutex.lock();
        self.frame_condvar.notify_all();
    }

    fn complete_frame(&self) -> u64 {
        let _guard = self.frame_mutex.lock();
        let frame = self.completed_frames.fetch_add(1, Ordering::AcqRel) + 1;
        self.frame_condvar.notify_all();
        frame
    }

    fn wait_frame(&self, frame: u64) {
        let mut guard = self.frame_mutex.lock();
        while self.completed_frames.load(Ordering::Acquire) < frame {
            self.frame_condvar.wait(&mut guard);
        }
    }

    fn wait_frame_timeout(&self, frame: u64, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut guard = self.frame_mutex.lock();
        while self.completed_frames.load(Ordering::Acquire) < frame {
            let now = std::time::Instant::now();
            if now >= deadline {
                return false;
            }
            self.frame_condvar.wait_for(&mut guard, deadline - now);
        }
        true
    }
}

/// The producer half of the lifecycle command channel.
///
/// Deliberately not `Clone`: exactly one orchestrating thread writes the
/// command stream, which is what makes FIFO delivery a total order.
#[derive(Debug)]
pub struct CommandSender {
    tx: Sender<Command>,
    posted_frames: u64,
}

impl CommandSender {
    /// Send a command, blocking while the channel is full.
    ///
    /// Returns an error only if the worker has stopped.
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| ChannelError::Disconnected.into())
    }

    /// Post [`Command::Init`].
    pub fn init(&self) -> Result<()> {
        self.send(Command::Init)
    }

    /// Post [`Command::Suspend`].
    pub fn suspend(&self) -> Result<()> {
        self.send(Command::Suspend)
    }

    /// Post [`Command::Resume`].
    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    /// Post one fixed simulation step.
    pub fn update(&self, delta: f32) -> Result<()> {
        self.send(Command::Update { delta })
    }

    /// Post a frame render.
    pub fn draw(&self, alpha: f32) -> Result<()> {
        self.send(Command::Draw { alpha })
    }

    /// Post a GUI render.
    pub fn draw_gui(&self) -> Result<()> {
        self.send(Command::DrawGui)
    }

    /// Post the end-of-frame marker and return the frame number it marks.
    ///
    /// Pass the returned number to [`AppWorker::wait_frame`] to block until
    /// the worker has executed everything up to and including this frame.
    pub fn frame(&mut self) -> Result<u64> {
        self.send(Command::Frame)?;
        self.posted_frames += 1;
        Ok(self.posted_frames)
    }

    /// Post [`Command::Shutdown`].
    ///
    /// The worker tears the application down and exits after executing this;
    /// any further send fails with a disconnect error.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Number of frame markers posted so far.
    pub fn posted_frames(&self) -> u64 {
        self.posted_frames
    }
}

/// A dedicated thread that owns an [`App`] and executes lifecycle commands.
///
/// The app instance is constructed by a factory closure *on* the worker
/// thread, so ownership never moves across threads: one thread owns the app,
/// from construction through shutdown.
pub struct AppWorker {
    handle: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<WorkerShared>,
}

impl AppWorker {
    /// Spawn an app worker, returning the worker handle and the command
    /// sender for it.
    ///
    /// `factory` runs once on the new thread to build the app instance.
    pub fn spawn<A, F>(config: WorkerConfig, factory: F) -> Result<(AppWorker, CommandSender)>
    where
        A: App,
        F: FnOnce() -> A + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(config.command_capacity.max(1));
        let shared = Arc::new(WorkerShared::new());
        let thread_shared = shared.clone();

        let mut builder = thread::Builder::new().name(config.name);
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                let mut app = factory();
                worker_loop(&mut app, &rx, &thread_shared);
            })
            .map_err(|e| CoreError::WorkerSpawn(e.to_string()))?;

        Ok((
            AppWorker {
                handle: Mutex::new(Some(handle)),
                shared,
            },
            CommandSender {
                tx,
                posted_frames: 0,
            },
        ))
    }

    /// Outcome of the app's `init` callback so far.
    pub fn init_status(&self) -> InitStatus {
        self.shared.init_status()
    }

    /// The message of a failed `init`, if any.
    pub fn init_error(&self) -> Option<String> {
        self.shared.init_error.lock().clone()
    }

    /// Number of frame markers the worker has fully executed.
    pub fn completed_frames(&self) -> u64 {
        self.shared.completed_frames.load(Ordering::Acquire)
    }

    /// Block until the worker has executed frame `frame`.
    ///
    /// Returns immediately if it already has.
    pub fn wait_frame(&self, frame: u64) {
        self.shared.wait_frame(frame);
    }

    /// Block until the worker has executed frame `frame`, or the timeout
    /// elapses. Returns `true` if the frame completed in time.
    pub fn wait_frame_timeout(&self, frame: u64, timeout: Duration) -> bool {
        self.shared.wait_frame_timeout(frame, timeout)
    }

    /// Wait for the worker thread to exit.
    ///
    /// The worker exits after executing [`Command::Shutdown`] or when the
    /// command sender is dropped. Returns an error if the worker thread
    /// panicked, or `Ok(false)` if it was already joined.
    pub fn join(&self) -> Result<bool> {
        let handle = self.handle.lock().take();
        match handle {
            Some(h) => h.join().map(|()| true).map_err(|_| CoreError::WorkerPanicked),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for AppWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppWorker")
            .field("init_status", &self.init_status())
            .field("completed_frames", &self.completed_frames())
            .finish()
    }
}

static_assertions::assert_impl_all!(AppWorker: Send, Sync);
static_assertions::assert_impl_all!(CommandSender: Send);

/// The worker loop: wake, drain every buffered command, sleep.
fn worker_loop<A: App>(app: &mut A, rx: &Receiver<Command>, shared: &Arc<WorkerShared>) {
    tracing::debug!(target: "carapace_core::command", "app worker started");
    let mut shutdown_sent = false;

    'outer: while let Ok(first) = rx.recv() {
        let mut next = Some(first);
        while let Some(command) = next {
            if execute(app, command, shared) {
                shutdown_sent = true;
                break 'outer;
            }
            next = rx.try_recv().ok();
        }
    }

    // Sender dropped without an explicit Shutdown: tear down anyway so a
    // successfully initialized app always sees shutdown exactly once.
    if !shutdown_sent && shared.init_status() == InitStatus::Succeeded {
        tracing::warn!(target: "carapace_core::command", "command sender dropped without shutdown");
        app.shutdown();
    }
    tracing::debug!(target: "carapace_core::command", "app worker stopped");
}

/// Execute one command. Returns `true` on `Shutdown`.
fn execute<A: App>(app: &mut A, command: Command, shared: &Arc<WorkerShared>) -> bool {
    let live = shared.init_status() == InitStatus::Succeeded;
    match command {
        Command::Init => {
            let result = app.init();
            if let Err(err) = &result {
                tracing::error!(target: "carapace_core::command", %err, "app init failed");
            }
            shared.record_init(&result);
        }
        Command::Suspend if live => app.suspend(),
        Command::Resume if live => app.resume(),
        Command::Update { delta } if live => app.update(delta),
        Command::Draw { alpha } if live => app.draw(alpha),
        Command::DrawGui if live => app.draw_gui(),
        Command::Frame => {
            let frame = shared.complete_frame();
            tracing::trace!(target: "carapace_core::command", frame, "frame complete");
        }
        Command::Shutdown => {
            if live {
                app.shutdown();
            }
            return true;
        }
        // Lifecycle calls before a successful init are skipped.
        _ => {
            tracing::trace!(target: "carapace_core::command", ?command, "skipped (app not live)");
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Record {
        inits: AtomicUsize,
        updates: Mutex<Vec<f32>>,
        draws: Mutex<Vec<f32>>,
        gui_draws: AtomicUsize,
        suspends: AtomicUsize,
        resumes: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    struct RecordingApp {
        record: Arc<Record>,
        fail_init: bool,
    }

    impl App for RecordingApp {
        fn init(&mut self) -> Result<()> {
            self.record.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                Err(CoreError::AppInit("no display".to_string()))
            } else {
                Ok(())
            }
        }

        fn suspend(&mut self) {
            self.record.suspends.fetch_add(1, Ordering::SeqCst);
        }

        fn resume(&mut self) {
            self.record.resumes.fetch_add(1, Ordering::SeqCst);
        }

        fn update(&mut self, delta: f32) {
            self.record.updates.lock().push(delta);
        }

        fn draw(&mut self, alpha: f32) {
            self.record.draws.lock().push(alpha);
        }

        fn draw_gui(&mut self) {
            self.record.gui_draws.fetch_add(1, Ordering::SeqCst);
        }

        fn shutdown(&mut self) {
            self.record.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn spawn_recording(fail_init: bool) -> (Arc<Record>, AppWorker, CommandSender) {
        let record = Arc::new(Record::default());
        let record_for_app = record.clone();
        let (worker, commands) = AppWorker::spawn(WorkerConfig::default(), move || RecordingApp {
            record: record_for_app,
            fail_init,
        })
        .unwrap();
        (record, worker, commands)
    }

    #[test]
    fn test_command_round_trip() {
        let (record, worker, mut commands) = spawn_recording(false);

        commands.init().unwrap();
        commands.update(0.016).unwrap();
        commands.draw(0.25).unwrap();
        commands.draw_gui().unwrap();
        let frame = commands.frame().unwrap();
        worker.wait_frame(frame);

        assert_eq!(record.inits.load(Ordering::SeqCst), 1);
        assert_eq!(*record.updates.lock(), vec![0.016]);
        assert_eq!(*record.draws.lock(), vec![0.25]);
        assert_eq!(record.gui_draws.load(Ordering::SeqCst), 1);

        commands.shutdown().unwrap();
        assert!(worker.join().unwrap());
        assert_eq!(record.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commands_execute_in_fifo_order() {
        let (record, worker, mut commands) = spawn_recording(false);

        commands.init().unwrap();
        for i in 0..10 {
            commands.update(i as f32).unwrap();
        }
        let frame = commands.frame().unwrap();
        worker.wait_frame(frame);

        let updates = record.updates.lock().clone();
        assert_eq!(updates, (0..10).map(|i| i as f32).collect::<Vec<_>>());

        commands.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_failed_init_skips_lifecycle_calls() {
        let (record, worker, mut commands) = spawn_recording(true);

        commands.init().unwrap();
        commands.update(0.016).unwrap();
        commands.draw(0.0).unwrap();
        commands.suspend().unwrap();
        let frame = commands.frame().unwrap();
        worker.wait_frame(frame);

        assert_eq!(worker.init_status(), InitStatus::Failed);
        assert!(worker.init_error().unwrap().contains("no display"));
        assert!(record.updates.lock().is_empty());
        assert!(record.draws.lock().is_empty());
        assert_eq!(record.suspends.load(Ordering::SeqCst), 0);

        commands.shutdown().unwrap();
        worker.join().unwrap();
        // Shutdown is not delivered to an app that never initialized.
        assert_eq!(record.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_suspend_resume_round_trip() {
        let (record, worker, mut commands) = spawn_recording(false);

        commands.init().unwrap();
        commands.suspend().unwrap();
        commands.resume().unwrap();
        let frame = commands.frame().unwrap();
        worker.wait_frame(frame);

        assert_eq!(record.suspends.load(Ordering::SeqCst), 1);
        assert_eq!(record.resumes.load(Ordering::SeqCst), 1);

        commands.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_dropping_sender_shuts_down_initialized_app() {
        let (record, worker, commands) = spawn_recording(false);

        commands.init().unwrap();
        drop(commands);
        worker.join().unwrap();

        assert_eq!(record.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_frame_counter_is_monotonic() {
        let (_record, worker, mut commands) = spawn_recording(false);

        commands.init().unwrap();
        for expected in 1..=5u64 {
            assert_eq!(commands.frame().unwrap(), expected);
        }
        worker.wait_frame(5);
        assert_eq!(worker.completed_frames(), 5);

        commands.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_frame_timeout_expires_without_worker_progress() {
        let (_record, worker, commands) = spawn_recording(false);

        // No Frame command was posted, so frame 1 can never complete.
        assert!(!worker.wait_frame_timeout(1, Duration::from_millis(50)));

        commands.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_send_after_shutdown_errors() {
        let (_record, worker, commands) = spawn_recording(false);

        commands.init().unwrap();
        commands.shutdown().unwrap();
        worker.join().unwrap();

        // Worker gone; the channel reports the disconnect.
        let result = commands.update(0.016);
        assert!(matches!(
            result,
            Err(CoreError::Channel(ChannelError::Disconnected))
        ));
    }

    #[test]
    fn test_worker_drains_buffered_commands_per_wake() {
        // An app slow enough that commands pile up while it executes.
        struct SlowApp {
            updates: Arc<AtomicU32>,
        }
        impl App for SlowApp {
            fn init(&mut self) -> Result<()> {
                Ok(())
            }
            fn update(&mut self, _delta: f32) {
                thread::sleep(Duration::from_millis(5));
                self.updates.fetch_add(1, Ordering::SeqCst);
            }
            fn draw(&mut self, _alpha: f32) {}
        }

        let updates = Arc::new(AtomicU32::new(0));
        let updates_for_app = updates.clone();
        let (worker, mut commands) =
            AppWorker::spawn(WorkerConfig::with_name("slow-app"), move || SlowApp {
                updates: updates_for_app,
            })
            .unwrap();

        commands.init().unwrap();
        for _ in 0..8 {
            commands.update(0.016).unwrap();
        }
        let frame = commands.frame().unwrap();
        worker.wait_frame(frame);
        assert_eq!(updates.load(Ordering::SeqCst), 8);

        commands.shutdown().unwrap();
        worker.join().unwrap();
    }
}
