//! Input state snapshots.
//!
//! The run loop folds every consumed [`Event`] into these structures, once
//! per event, on the logic thread. Everything else reads them: binding
//! dispatch scans them each frame, and application code can query them at
//! any point during a callback. Single writer, any number of readers.
//!
//! Axis values from gamepads are deadzone-filtered on write: raw values
//! inside the deadzone read as zero, so a stick at rest does not jitter
//! axis-motion bindings. Trigger axes use a separate, much smaller deadzone.

use carapace_core::event::{
    Event, GamepadAxis, GamepadButton, GamepadHandle, Key, KeyModifiers, MouseButton, SuspendPhase,
};

/// Maximum number of simultaneously tracked gamepads.
pub const MAX_GAMEPADS: usize = 4;

/// Default deadzone for stick axes, in raw axis units (`-32768..=32767`).
pub const DEFAULT_STICK_DEADZONE: i32 = 7849;

/// Default deadzone for trigger axes, in raw axis units (`0..=255`).
pub const DEFAULT_TRIGGER_DEADZONE: i32 = 30;

/// State of one key: whether it is held and the modifiers it was last
/// pressed or released with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Whether the key is currently held.
    pub down: bool,
    /// Modifier state at the key's last transition.
    pub modifiers: KeyModifiers,
}

/// Keyboard snapshot.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    keys: [KeyState; Key::COUNT],
    modifiers: KeyModifiers,
    chars: Vec<char>,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            keys: [KeyState::default(); Key::COUNT],
            modifiers: KeyModifiers::NONE,
            chars: Vec::new(),
        }
    }
}

impl KeyboardState {
    /// Whether the key is currently held.
    pub fn is_down(&self, key: Key) -> bool {
        self.keys[key.index()].down
    }

    /// Full state of one key.
    pub fn key(&self, key: Key) -> KeyState {
        self.keys[key.index()]
    }

    /// Modifier state as of the last key event.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// Characters produced by text input this frame.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    fn apply_key(&mut self, key: Key, modifiers: KeyModifiers, down: bool) {
        self.keys[key.index()] = KeyState { down, modifiers };
        self.modifiers = modifiers;
    }

    fn begin_frame(&mut self) {
        self.chars.clear();
    }

    fn reset(&mut self) {
        self.keys = [KeyState::default(); Key::COUNT];
        self.modifiers = KeyModifiers::NONE;
        self.chars.clear();
    }
}

/// Mouse snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseState {
    /// Cursor x in window coordinates.
    pub x: i32,
    /// Cursor y in window coordinates.
    pub y: i32,
    /// Cursor x normalized against the window width, in `0.0..=1.0`.
    pub norm_x: f32,
    /// Cursor y normalized against the window height, in `0.0..=1.0`.
    pub norm_y: f32,
    /// Wheel delta accumulated this frame.
    pub wheel: i32,
    buttons: [bool; MouseButton::COUNT],
    double_clicks: [bool; MouseButton::COUNT],
    /// Modifier state as of the last mouse event.
    pub modifiers: KeyModifiers,
}

impl MouseState {
    /// Whether the button is currently held.
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }

    /// Whether the button double-clicked this frame.
    pub fn double_clicked(&self, button: MouseButton) -> bool {
        self.double_clicks[button.index()]
    }

    fn apply(
        &mut self,
        x: i32,
        y: i32,
        wheel: i32,
        button: Option<MouseButton>,
        down: bool,
        double_click: bool,
        modifiers: KeyModifiers,
        window_size: (u32, u32),
    ) {
        self.x = x;
        self.y = y;
        self.norm_x = normalize(x, window_size.0);
        self.norm_y = normalize(y, window_size.1);
        self.wheel += wheel;
        self.modifiers = modifiers;
        if let Some(button) = button {
            self.buttons[button.index()] = down;
            if down && double_click {
                self.double_clicks[button.index()] = true;
            }
        }
    }

    fn begin_frame(&mut self) {
        self.wheel = 0;
        self.double_clicks = [false; MouseButton::COUNT];
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn normalize(value: i32, extent: u32) -> f32 {
    if extent == 0 {
        return 0.0;
    }
    (value as f32 / extent as f32).clamp(0.0, 1.0)
}

/// Snapshot of one gamepad.
#[derive(Debug, Clone, Copy, Default)]
pub struct GamepadState {
    /// Whether the gamepad is connected.
    pub connected: bool,
    buttons: [bool; GamepadButton::COUNT],
    axes_raw: [i32; GamepadAxis::COUNT],
    axes: [i32; GamepadAxis::COUNT],
}

impl GamepadState {
    /// Whether the button is currently held.
    pub fn is_down(&self, button: GamepadButton) -> bool {
        self.buttons[button.index()]
    }

    /// Deadzone-filtered axis value.
    pub fn axis(&self, axis: GamepadAxis) -> i32 {
        self.axes[axis.index()]
    }

    /// Raw axis value, before deadzone filtering.
    pub fn axis_raw(&self, axis: GamepadAxis) -> i32 {
        self.axes_raw[axis.index()]
    }
}

/// Aggregate input snapshot: keyboard, mouse, gamepads.
#[derive(Debug, Clone)]
pub struct InputState {
    keyboard: KeyboardState,
    mouse: MouseState,
    gamepads: [GamepadState; MAX_GAMEPADS],
    prev_axes: [[i32; GamepadAxis::COUNT]; MAX_GAMEPADS],
    window_size: (u32, u32),
    stick_deadzone: i32,
    trigger_deadzone: i32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// Create an input state with default deadzones.
    pub fn new() -> Self {
        Self {
            keyboard: KeyboardState::default(),
            mouse: MouseState::default(),
            gamepads: [GamepadState::default(); MAX_GAMEPADS],
            prev_axes: [[0; GamepadAxis::COUNT]; MAX_GAMEPADS],
            window_size: (0, 0),
            stick_deadzone: DEFAULT_STICK_DEADZONE,
            trigger_deadzone: DEFAULT_TRIGGER_DEADZONE,
        }
    }

    /// Create an input state with custom deadzones, in raw axis units.
    pub fn with_deadzones(stick: i32, trigger: i32) -> Self {
        Self {
            stick_deadzone: stick,
            trigger_deadzone: trigger,
            ..Self::new()
        }
    }

    /// Keyboard snapshot.
    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Mouse snapshot.
    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Snapshot of one gamepad; `None` for out-of-range handles.
    pub fn gamepad(&self, gamepad: GamepadHandle) -> Option<&GamepadState> {
        self.gamepads.get(gamepad.index() as usize)
    }

    /// Iterate over all tracked gamepad slots.
    pub fn gamepads(&self) -> impl Iterator<Item = &GamepadState> {
        self.gamepads.iter()
    }

    /// Whether the axis' filtered value changed since the previous frame,
    /// on any connected gamepad.
    pub fn axis_moved(&self, axis: GamepadAxis) -> bool {
        self.gamepads
            .iter()
            .zip(self.prev_axes.iter())
            .filter(|(pad, _)| pad.connected)
            .any(|(pad, prev)| pad.axes[axis.index()] != prev[axis.index()])
    }

    /// Start a new frame: snapshot axis samples and clear per-frame
    /// accumulators (wheel delta, double-clicks, text characters).
    pub fn begin_frame(&mut self) {
        for (prev, pad) in self.prev_axes.iter_mut().zip(self.gamepads.iter()) {
            *prev = pad.axes;
        }
        self.keyboard.begin_frame();
        self.mouse.begin_frame();
    }

    /// Clear all transient state. Called on window and focus transitions so
    /// keys and buttons do not stay stuck down when events stop arriving.
    pub fn reset(&mut self) {
        tracing::trace!(target: "carapace::input", "input state reset");
        self.keyboard.reset();
        self.mouse.reset();
        for pad in &mut self.gamepads {
            let connected = pad.connected;
            *pad = GamepadState {
                connected,
                ..GamepadState::default()
            };
        }
        self.prev_axes = [[0; GamepadAxis::COUNT]; MAX_GAMEPADS];
    }

    /// Fold one event into the snapshot.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::Key {
                key,
                modifiers,
                down,
                ..
            } => self.keyboard.apply_key(*key, *modifiers, *down),

            Event::Char { ch, .. } => self.keyboard.chars.push(*ch),

            Event::Mouse {
                x,
                y,
                wheel,
                button,
                down,
                double_click,
                modifiers,
                ..
            } => self.mouse.apply(
                *x,
                *y,
                *wheel,
                *button,
                *down,
                *double_click,
                *modifiers,
                self.window_size,
            ),

            Event::Axis {
                gamepad,
                axis,
                value,
                ..
            } => {
                let deadzone = if axis.is_trigger() {
                    self.trigger_deadzone
                } else {
                    self.stick_deadzone
                };
                if let Some(pad) = self.gamepads.get_mut(gamepad.index() as usize) {
                    pad.axes_raw[axis.index()] = *value;
                    pad.axes[axis.index()] = if value.abs() < deadzone { 0 } else { *value };
                } else {
                    tracing::trace!(target: "carapace::input", index = gamepad.index(), "axis for untracked gamepad ignored");
                }
            }

            Event::Gamepad {
                gamepad, connected, ..
            } => {
                if let Some(pad) = self.gamepads.get_mut(gamepad.index() as usize) {
                    // Disconnect wipes buttons and axes so nothing stays held.
                    *pad = GamepadState {
                        connected: *connected,
                        ..GamepadState::default()
                    };
                }
            }

            Event::GamepadButton {
                gamepad,
                button,
                pressed,
                ..
            } => {
                if let Some(pad) = self.gamepads.get_mut(gamepad.index() as usize) {
                    pad.buttons[button.index()] = *pressed;
                }
            }

            Event::Size { width, height, .. } => {
                self.window_size = (*width, *height);
            }

            Event::Window { .. } => self.reset(),

            Event::Suspend { phase, .. } => {
                if matches!(phase, SuspendPhase::WillSuspend) {
                    self.reset();
                }
            }

            Event::Exit => {}
        }
    }
}
