//! Input bindings: trigger conditions mapped to callbacks or console
//! commands.
//!
//! Bindings are grouped into named tables that are added and removed as a
//! unit, so a game state (menu, gameplay, editor) can install its whole
//! control scheme in one call and tear it down in one call. The run loop
//! scans every installed table once per frame, after the frame's events have
//! been folded into the input state.
//!
//! A binding fires either edge-triggered ([`TriggerMode::Once`]: on the down
//! transition, suppressed while held, re-armed on release) or
//! level-triggered ([`TriggerMode::Continuous`]: every frame the condition
//! holds). Axis triggers are motion-triggered: they hold whenever the
//! filtered axis sample differs from the previous frame's.
//!
//! # Example
//!
//! ```
//! use carapace::bindings::{Binding, BindingAction, BindingSet, TriggerMode};
//! use carapace::input::InputState;
//! use carapace_core::event::{Key, KeyModifiers};
//!
//! let mut bindings = BindingSet::new();
//! bindings.add_table(
//!     "gameplay",
//!     vec![
//!         Binding::keyboard(
//!             Key::Space,
//!             KeyModifiers::NONE,
//!             TriggerMode::Once,
//!             BindingAction::callback(|_input: &InputState| println!("jump")),
//!         ),
//!         Binding::keyboard(
//!             Key::F1,
//!             KeyModifiers::NONE,
//!             TriggerMode::Once,
//!             BindingAction::command("toggle_overlay"),
//!         ),
//!     ],
//! );
//! ```

use slotmap::{SlotMap, new_key_type};

use carapace_core::event::{GamepadAxis, GamepadButton, Key, KeyModifiers, MouseButton};

use crate::commands::CommandRegistry;
use crate::input::InputState;

new_key_type! {
    /// Identifies an installed binding table.
    pub struct BindingTableId;
}

/// The condition under which a binding fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTrigger {
    /// A key with an exact modifier combination.
    Keyboard {
        /// The key to match.
        key: Key,
        /// Modifiers that must match exactly.
        modifiers: KeyModifiers,
    },
    /// A mouse button with an exact modifier combination.
    Mouse {
        /// The button to match.
        button: MouseButton,
        /// Modifiers that must match exactly.
        modifiers: KeyModifiers,
    },
    /// A button on any connected gamepad.
    GamepadButton {
        /// The button to match.
        button: GamepadButton,
    },
    /// Motion on an axis of any connected gamepad.
    GamepadAxis {
        /// The axis to watch.
        axis: GamepadAxis,
    },
    /// A touch tap. Touch back-ends post taps as primary-button mouse
    /// events, so this matches a primary-button press with any modifiers.
    Touch,
}

/// Edge- versus level-triggered firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Fire once on the down transition; re-arm on release.
    Once,
    /// Fire every frame the condition holds.
    Continuous,
}

/// What a fired binding does.
pub enum BindingAction {
    /// Invoke a callback with the current input state.
    Callback(Box<dyn FnMut(&InputState) + Send>),
    /// Execute a console command line through the command registry.
    Command(String),
}

impl BindingAction {
    /// A callback action.
    pub fn callback<F>(f: F) -> Self
    where
        F: FnMut(&InputState) + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }

    /// A console command action.
    pub fn command(line: impl Into<String>) -> Self {
        Self::Command(line.into())
    }
}

impl std::fmt::Debug for BindingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Command(line) => f.debug_tuple("Command").field(line).finish(),
        }
    }
}

/// One trigger condition bound to one action.
#[derive(Debug)]
pub struct Binding {
    trigger: BindingTrigger,
    mode: TriggerMode,
    action: BindingAction,
    /// Edge-trigger latch: set when a `Once` binding fires, cleared when the
    /// condition releases.
    fired: bool,
}

impl Binding {
    /// Create a binding from its parts.
    pub fn new(trigger: BindingTrigger, mode: TriggerMode, action: BindingAction) -> Self {
        Self {
            trigger,
            mode,
            action,
            fired: false,
        }
    }

    /// Bind a key with an exact modifier combination.
    pub fn keyboard(
        key: Key,
        modifiers: KeyModifiers,
        mode: TriggerMode,
        action: BindingAction,
    ) -> Self {
        Self::new(BindingTrigger::Keyboard { key, modifiers }, mode, action)
    }

    /// Bind a mouse button with an exact modifier combination.
    pub fn mouse(
        button: MouseButton,
        modifiers: KeyModifiers,
        mode: TriggerMode,
        action: BindingAction,
    ) -> Self {
        Self::new(BindingTrigger::Mouse { button, modifiers }, mode, action)
    }

    /// Bind a gamepad button on any connected pad.
    pub fn gamepad_button(button: GamepadButton, mode: TriggerMode, action: BindingAction) -> Self {
        Self::new(BindingTrigger::GamepadButton { button }, mode, action)
    }

    /// Bind motion on a gamepad axis.
    pub fn gamepad_axis(axis: GamepadAxis, mode: TriggerMode, action: BindingAction) -> Self {
        Self::new(BindingTrigger::GamepadAxis { axis }, mode, action)
    }

    /// Bind a touch tap.
    pub fn touch(mode: TriggerMode, action: BindingAction) -> Self {
        Self::new(BindingTrigger::Touch, mode, action)
    }

    /// The trigger condition.
    pub fn trigger(&self) -> BindingTrigger {
        self.trigger
    }

    /// The firing mode.
    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Whether the trigger condition holds against the given input state.
    fn held(&self, input: &InputState) -> bool {
        match self.trigger {
            BindingTrigger::Keyboard { key, modifiers } => {
                input.keyboard().is_down(key) && input.keyboard().key(key).modifiers == modifiers
            }
            BindingTrigger::Mouse { button, modifiers } => {
                input.mouse().is_down(button) && input.mouse().modifiers == modifiers
            }
            BindingTrigger::GamepadButton { button } => input
                .gamepads()
                .any(|pad| pad.connected && pad.is_down(button)),
            BindingTrigger::GamepadAxis { axis } => input.axis_moved(axis),
            BindingTrigger::Touch => input.mouse().is_down(MouseButton::Left),
        }
    }

    /// Evaluate the binding for one frame. Returns whether it fired.
    fn evaluate(&mut self, input: &InputState, registry: &mut dyn CommandRegistry) -> bool {
        let held = self.held(input);
        let fire = match self.mode {
            TriggerMode::Once => {
                if held && !self.fired {
                    self.fired = true;
                    true
                } else {
                    if !held {
                        self.fired = false;
                    }
                    false
                }
            }
            TriggerMode::Continuous => held,
        };

        if fire {
            match &mut self.action {
                BindingAction::Callback(callback) => callback(input),
                BindingAction::Command(line) => {
                    if let Err(err) = registry.execute(line) {
                        tracing::warn!(target: "carapace::bindings", command = %line, %err, "bound command failed");
                    }
                }
            }
        }
        fire
    }
}

/// A named group of bindings installed and removed as a unit.
#[derive(Debug)]
struct BindingTable {
    name: String,
    bindings: Vec<Binding>,
}

/// All installed binding tables.
#[derive(Debug, Default)]
pub struct BindingSet {
    tables: SlotMap<BindingTableId, BindingTable>,
}

impl BindingSet {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a table of bindings under a name.
    pub fn add_table(&mut self, name: impl Into<String>, bindings: Vec<Binding>) -> BindingTableId {
        let name = name.into();
        tracing::debug!(target: "carapace::bindings", %name, count = bindings.len(), "binding table installed");
        self.tables.insert(BindingTable { name, bindings })
    }

    /// Remove a table by id. Returns `false` if the id was not installed.
    pub fn remove_table(&mut self, id: BindingTableId) -> bool {
        match self.tables.remove(id) {
            Some(table) => {
                tracing::debug!(target: "carapace::bindings", name = %table.name, "binding table removed");
                true
            }
            None => false,
        }
    }

    /// Remove the first table with the given name. Returns `false` if no
    /// table has that name.
    pub fn remove_table_named(&mut self, name: &str) -> bool {
        let id = self
            .tables
            .iter()
            .find(|(_, table)| table.name == name)
            .map(|(id, _)| id);
        match id {
            Some(id) => self.remove_table(id),
            None => false,
        }
    }

    /// Number of installed tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Scan every installed binding against the current input state,
    /// executing the ones that fire. Returns the number that fired.
    pub fn scan(&mut self, input: &InputState, registry: &mut dyn CommandRegistry) -> usize {
        let mut fired = 0;
        for table in self.tables.values_mut() {
            for binding in &mut table.bindings {
                if binding.evaluate(input, registry) {
                    fired += 1;
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use carapace_core::event::{Event, GamepadHandle, WindowHandle};

    use crate::commands::CommandError;

    use super::*;

    /// Registry that records executed command lines.
    #[derive(Default)]
    struct RecordingRegistry {
        executed: Vec<String>,
    }

    impl CommandRegistry for RecordingRegistry {
        fn execute(&mut self, command_line: &str) -> Result<(), CommandError> {
            self.executed.push(command_line.to_string());
            Ok(())
        }
    }

    fn key_event(key: Key, down: bool) -> Event {
        Event::Key {
            window: WindowHandle::default(),
            key,
            modifiers: KeyModifiers::NONE,
            down,
        }
    }

    fn counting_binding(mode: TriggerMode, counter: &Arc<AtomicUsize>) -> Binding {
        let counter = counter.clone();
        Binding::keyboard(
            Key::Space,
            KeyModifiers::NONE,
            mode,
            BindingAction::callback(move |_input| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    /// One frame: fold events, scan bindings.
    fn frame(
        input: &mut InputState,
        bindings: &mut BindingSet,
        registry: &mut RecordingRegistry,
        events: &[Event],
    ) {
        input.begin_frame();
        for event in events {
            input.apply(event);
        }
        bindings.scan(input, registry);
    }

    #[test]
    fn test_once_binding_fires_on_transition_only() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        let fired = Arc::new(AtomicUsize::new(0));
        bindings.add_table("test", vec![counting_binding(TriggerMode::Once, &fired)]);

        // Key goes down on frame 1 and stays held for 5 frames.
        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, true)]);
        for _ in 0..4 {
            frame(&mut input, &mut bindings, &mut registry, &[]);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Release and press again: fires exactly once more.
        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, false)]);
        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, true)]);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_continuous_binding_fires_every_held_frame() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        let fired = Arc::new(AtomicUsize::new(0));
        bindings.add_table("test", vec![counting_binding(TriggerMode::Continuous, &fired)]);

        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, true)]);
        for _ in 0..4 {
            frame(&mut input, &mut bindings, &mut registry, &[]);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 5);

        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, false)]);
        assert_eq!(fired.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_modifier_mismatch_does_not_fire() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        bindings.add_table(
            "test",
            vec![Binding::keyboard(
                Key::KeyS,
                KeyModifiers::CTRL,
                TriggerMode::Once,
                BindingAction::command("save"),
            )],
        );

        // Plain S: no fire.
        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::KeyS, true)]);
        assert!(registry.executed.is_empty());

        // Ctrl+S: fires.
        frame(&mut input, &mut bindings, &mut registry, &[
            key_event(Key::KeyS, false),
            Event::Key {
                window: WindowHandle::default(),
                key: Key::KeyS,
                modifiers: KeyModifiers::CTRL,
                down: true,
            },
        ]);
        assert_eq!(registry.executed, vec!["save".to_string()]);
    }

    #[test]
    fn test_command_binding_reaches_registry() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        bindings.add_table(
            "console",
            vec![Binding::keyboard(
                Key::F1,
                KeyModifiers::NONE,
                TriggerMode::Once,
                BindingAction::command("toggle_overlay 1"),
            )],
        );

        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::F1, true)]);
        assert_eq!(registry.executed, vec!["toggle_overlay 1".to_string()]);
    }

    #[test]
    fn test_axis_binding_is_motion_triggered() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_for_binding = fired.clone();
        bindings.add_table(
            "test",
            vec![Binding::gamepad_axis(
                GamepadAxis::LeftX,
                TriggerMode::Continuous,
                BindingAction::callback(move |_input| {
                    fired_for_binding.fetch_add(1, Ordering::SeqCst);
                }),
            )],
        );

        let connect = Event::Gamepad {
            window: WindowHandle::default(),
            gamepad: GamepadHandle::new(0),
            connected: true,
        };
        let push = Event::Axis {
            window: WindowHandle::default(),
            gamepad: GamepadHandle::new(0),
            axis: GamepadAxis::LeftX,
            value: 20000,
        };

        // Motion frame: fires.
        frame(&mut input, &mut bindings, &mut registry, &[connect, push]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Stick held steady: sample equals previous frame, no fire even
        // though the axis is deflected.
        frame(&mut input, &mut bindings, &mut registry, &[]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_table_stops_firing() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let id = bindings.add_table("test", vec![counting_binding(TriggerMode::Continuous, &fired)]);

        frame(&mut input, &mut bindings, &mut registry, &[key_event(Key::Space, true)]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert!(bindings.remove_table(id));
        assert_eq!(bindings.table_count(), 0);
        frame(&mut input, &mut bindings, &mut registry, &[]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_table_by_name() {
        let mut bindings = BindingSet::new();
        bindings.add_table("menu", Vec::new());
        bindings.add_table("gameplay", Vec::new());

        assert!(bindings.remove_table_named("menu"));
        assert!(!bindings.remove_table_named("menu"));
        assert_eq!(bindings.table_count(), 1);
    }

    #[test]
    fn test_touch_binding_matches_primary_button() {
        let mut input = InputState::new();
        let mut bindings = BindingSet::new();
        let mut registry = RecordingRegistry::default();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_for_binding = fired.clone();
        bindings.add_table(
            "test",
            vec![Binding::touch(
                TriggerMode::Once,
                BindingAction::callback(move |_input| {
                    fired_for_binding.fetch_add(1, Ordering::SeqCst);
                }),
            )],
        );

        let tap = Event::Mouse {
            window: WindowHandle::default(),
            x: 10,
            y: 10,
            wheel: 0,
            button: Some(MouseButton::Left),
            down: true,
            double_click: false,
            modifiers: KeyModifiers::NONE,
        };
        frame(&mut input, &mut bindings, &mut registry, &[tap]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
