//! End-to-end pipeline test: a platform-thread producer posting events, the
//! shell run loop consuming them, and the app worker executing lifecycle
//! callbacks, with a job fanned out from inside an update.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use carapace::commands::{CommandError, CommandRegistry};
use carapace::runner::{Shell, ShellConfig};
use carapace::window::SharedWindowRegistry;
use carapace::{Binding, BindingAction, TriggerMode};
use carapace_core::app::App;
use carapace_core::event::{Key, KeyModifiers};
use carapace_core::jobs::{JobScheduler, JobSchedulerConfig};

#[derive(Default)]
struct Lifecycle {
    inits: AtomicUsize,
    updates: AtomicUsize,
    draws: AtomicUsize,
    gui_draws: AtomicUsize,
    shutdowns: AtomicUsize,
}

struct PipelineApp {
    lifecycle: Arc<Lifecycle>,
    jobs: Arc<JobScheduler>,
    tiles_filled: Arc<AtomicU32>,
    tiled: bool,
}

impl App for PipelineApp {
    fn init(&mut self) -> carapace_core::Result<()> {
        self.lifecycle.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&mut self, _delta: f32) {
        self.lifecycle.updates.fetch_add(1, Ordering::SeqCst);

        // Fan a tiled computation out across the worker pool, once.
        if !self.tiled {
            self.tiled = true;
            let tiles = self.tiles_filled.clone();
            let job = self.jobs.create(64, move |range| {
                tiles.fetch_add(range.len() as u32, Ordering::SeqCst);
            });
            self.jobs.run(&job);
            job.wait();
        }
    }

    fn draw(&mut self, _alpha: f32) {
        self.lifecycle.draws.fetch_add(1, Ordering::SeqCst);
    }

    fn draw_gui(&mut self) {
        self.lifecycle.gui_draws.fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&mut self) {
        self.lifecycle.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingRegistry {
    executed: Arc<Mutex<Vec<String>>>,
}

impl CommandRegistry for RecordingRegistry {
    fn execute(&mut self, command_line: &str) -> Result<(), CommandError> {
        self.executed.lock().push(command_line.to_string());
        Ok(())
    }
}

#[test]
fn full_pipeline_runs_and_shuts_down() {
    let lifecycle = Arc::new(Lifecycle::default());
    let tiles_filled = Arc::new(AtomicU32::new(0));
    let jobs = Arc::new(JobScheduler::new(JobSchedulerConfig::with_threads(2)).unwrap());

    let windows = SharedWindowRegistry::new();
    let window = windows.register(640, 480);

    let lifecycle_for_app = lifecycle.clone();
    let jobs_for_app = jobs.clone();
    let tiles_for_app = tiles_filled.clone();
    let (mut shell, events) = Shell::new(
        ShellConfig {
            fixed_delta: Duration::from_millis(5),
            ..ShellConfig::default()
        },
        windows.clone(),
        move || PipelineApp {
            lifecycle: lifecycle_for_app,
            jobs: jobs_for_app,
            tiles_filled: tiles_for_app,
            tiled: false,
        },
    )
    .unwrap();

    let executed = Arc::new(Mutex::new(Vec::new()));
    let mut registry = RecordingRegistry {
        executed: executed.clone(),
    };

    shell.bindings_mut().add_table(
        "debug",
        vec![Binding::keyboard(
            Key::F1,
            KeyModifiers::NONE,
            TriggerMode::Once,
            BindingAction::command("toggle_overlay"),
        )],
    );

    // The "platform thread": posts input for a while, then requests exit.
    let producer = thread::spawn(move || {
        events.post_size_event(window, 1024, 768).unwrap();
        events
            .post_key_event(window, Key::F1, KeyModifiers::NONE, true)
            .unwrap();
        for i in 0..20 {
            events
                .post_mouse_move_event(window, i, i * 2, 0, KeyModifiers::NONE)
                .unwrap();
            thread::sleep(Duration::from_millis(5));
        }
        events.post_exit_event().unwrap();
    });

    shell.run(&mut registry).unwrap();
    producer.join().unwrap();

    // Lifecycle ran, with exactly one init and one shutdown at the ends.
    assert_eq!(lifecycle.inits.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.shutdowns.load(Ordering::SeqCst), 1);
    assert!(lifecycle.updates.load(Ordering::SeqCst) >= 1);
    assert!(lifecycle.draws.load(Ordering::SeqCst) >= 1);
    assert!(lifecycle.gui_draws.load(Ordering::SeqCst) >= 1);

    // The in-update job covered its whole range.
    assert_eq!(tiles_filled.load(Ordering::SeqCst), 64);

    // The size event reached the registry.
    let state = windows.get(window).unwrap();
    assert_eq!((state.width, state.height), (1024, 768));

    // The F1 binding executed its console command exactly once.
    assert_eq!(*executed.lock(), vec!["toggle_overlay".to_string()]);
}
