//! Event records posted by platform back-ends.
//!
//! Every input or window notification that crosses from a platform's native
//! message pump into the application's logic thread is represented as an
//! [`Event`]. Events are produced by the platform layer through an
//! [`EventSender`](crate::queue::EventSender) and consumed on the logic
//! thread through an [`EventReceiver`](crate::queue::EventReceiver).
//!
//! Event ownership follows Rust move semantics: the queue owns an event from
//! post until poll, the consumer owns it afterwards, and dropping it is the
//! release. There is no way to release an event twice.

use std::fmt;

use slotmap::new_key_type;

new_key_type! {
    /// A handle identifying an application window.
    ///
    /// Handles are allocated by the window registry on the shell side. The
    /// default key is the invalid sentinel; validity of a non-default handle
    /// is decided by the registry that issued it.
    pub struct WindowHandle;
}

/// A handle identifying a connected gamepad, assigned by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GamepadHandle(u16);

impl GamepadHandle {
    /// Create a handle for the gamepad at the given platform index.
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// The platform index of this gamepad.
    pub const fn index(self) -> u16 {
        self.0
    }
}

/// A native window pointer smuggled across the thread boundary as an address.
///
/// The pointee is never dereferenced by this crate; the value exists so the
/// consumer side can hand it back to renderer or platform collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeWindowPtr(usize);

impl NativeWindowPtr {
    /// Wrap a raw native handle address.
    pub const fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    /// The raw address of the native handle.
    pub const fn addr(self) -> usize {
        self.0
    }

    /// Whether this pointer is null.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Logical key codes, layout-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    Escape,
    Return,
    Tab,
    Space,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Print,
    Plus,
    Minus,
    LeftBracket,
    RightBracket,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    Backslash,
    Tilde,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    NumPad0,
    NumPad1,
    NumPad2,
    NumPad3,
    NumPad4,
    NumPad5,
    NumPad6,
    NumPad7,
    NumPad8,
    NumPad9,
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
}

impl Key {
    /// Number of distinct key codes, for fixed-size state tables.
    pub const COUNT: usize = Key::KeyZ as usize + 1;

    /// Index of this key into a `[T; Key::COUNT]` table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left = 0,
    /// Secondary button (usually right).
    Right = 1,
    /// Middle button (scroll wheel click).
    Middle = 2,
    /// Additional button 1 (e.g., browser back).
    Button4 = 3,
    /// Additional button 2 (e.g., browser forward).
    Button5 = 4,
}

impl MouseButton {
    /// Number of tracked mouse buttons.
    pub const COUNT: usize = 5;

    /// Index of this button into a `[T; MouseButton::COUNT]` table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Gamepad analog axes.
///
/// Stick axes report signed values in `-32768..=32767`; trigger axes report
/// `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GamepadAxis {
    /// Left stick, horizontal.
    LeftX = 0,
    /// Left stick, vertical.
    LeftY = 1,
    /// Left trigger.
    LeftZ = 2,
    /// Right stick, horizontal.
    RightX = 3,
    /// Right stick, vertical.
    RightY = 4,
    /// Right trigger.
    RightZ = 5,
}

impl GamepadAxis {
    /// Number of tracked axes.
    pub const COUNT: usize = 6;

    /// Index of this axis into a `[T; GamepadAxis::COUNT]` table.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this axis is a trigger (unsigned range, no stick deadzone).
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::LeftZ | Self::RightZ)
    }
}

/// Gamepad buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GamepadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    ThumbLeft = 4,
    ThumbRight = 5,
    ShoulderLeft = 6,
    ShoulderRight = 7,
    Up = 8,
    Down = 9,
    Left = 10,
    Right = 11,
    Back = 12,
    Start = 13,
    Guide = 14,
}

impl GamepadButton {
    /// Number of tracked gamepad buttons.
    pub const COUNT: usize = 15;

    /// Index of this button into a `[T; GamepadButton::COUNT]` table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Phases of a platform suspend/resume transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendPhase {
    /// The platform is about to suspend the application.
    WillSuspend,
    /// The application has been suspended.
    DidSuspend,
    /// The platform is about to resume the application.
    WillResume,
    /// The application has been resumed.
    DidResume,
}

/// An event record posted by a platform event source.
///
/// All variants except [`Event::Exit`] carry the window the event is
/// associated with.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A key went down or up.
    Key {
        /// Associated window.
        window: WindowHandle,
        /// The logical key.
        key: Key,
        /// Modifier state at the time of the event.
        modifiers: KeyModifiers,
        /// `true` on press, `false` on release.
        down: bool,
    },

    /// A unicode character was produced by text input.
    Char {
        /// Associated window.
        window: WindowHandle,
        /// The character.
        ch: char,
    },

    /// Mouse motion, wheel, or button transition.
    ///
    /// Motion-only events carry `button: None`.
    Mouse {
        /// Associated window.
        window: WindowHandle,
        /// Cursor x in window coordinates.
        x: i32,
        /// Cursor y in window coordinates.
        y: i32,
        /// Wheel delta for this event.
        wheel: i32,
        /// The button that changed, if any.
        button: Option<MouseButton>,
        /// `true` on press, `false` on release. Meaningless without a button.
        down: bool,
        /// Whether the press was the second click of a double-click.
        double_click: bool,
        /// Modifier state at the time of the event.
        modifiers: KeyModifiers,
    },

    /// A gamepad analog axis moved.
    Axis {
        /// Associated window.
        window: WindowHandle,
        /// The gamepad the axis belongs to.
        gamepad: GamepadHandle,
        /// The axis that moved.
        axis: GamepadAxis,
        /// Raw axis value, before deadzone filtering.
        value: i32,
    },

    /// A gamepad connected or disconnected.
    Gamepad {
        /// Associated window.
        window: WindowHandle,
        /// The gamepad.
        gamepad: GamepadHandle,
        /// `true` on connect, `false` on disconnect.
        connected: bool,
    },

    /// A gamepad button transition.
    GamepadButton {
        /// Associated window.
        window: WindowHandle,
        /// The gamepad.
        gamepad: GamepadHandle,
        /// The button that changed.
        button: GamepadButton,
        /// `true` on press, `false` on release.
        pressed: bool,
    },

    /// The window client area was resized.
    Size {
        /// Associated window.
        window: WindowHandle,
        /// New client width in pixels.
        width: u32,
        /// New client height in pixels.
        height: u32,
    },

    /// The native window handle changed (created, recreated, destroyed).
    Window {
        /// Associated window.
        window: WindowHandle,
        /// The new native handle; null when the native window went away.
        native: NativeWindowPtr,
    },

    /// The application is transitioning through a suspend/resume phase.
    Suspend {
        /// Associated window.
        window: WindowHandle,
        /// The transition phase.
        phase: SuspendPhase,
    },

    /// The platform requested application exit.
    Exit,
}

impl Event {
    /// The window this event is associated with, if any.
    ///
    /// [`Event::Exit`] is process-wide and returns `None`.
    pub fn window(&self) -> Option<WindowHandle> {
        match self {
            Self::Key { window, .. }
            | Self::Char { window, .. }
            | Self::Mouse { window, .. }
            | Self::Axis { window, .. }
            | Self::Gamepad { window, .. }
            | Self::GamepadButton { window, .. }
            | Self::Size { window, .. }
            | Self::Window { window, .. }
            | Self::Suspend { window, .. } => Some(*window),
            Self::Exit => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key { key, down, .. } => {
                write!(f, "key {key:?} {}", if *down { "down" } else { "up" })
            }
            Self::Char { ch, .. } => write!(f, "char {ch:?}"),
            Self::Mouse {
                x, y, button, down, ..
            } => match button {
                Some(b) => write!(f, "mouse {b:?} {} at {x},{y}", if *down { "down" } else { "up" }),
                None => write!(f, "mouse move {x},{y}"),
            },
            Self::Axis { axis, value, .. } => write!(f, "axis {axis:?} = {value}"),
            Self::Gamepad {
                gamepad, connected, ..
            } => write!(
                f,
                "gamepad {} {}",
                gamepad.index(),
                if *connected { "connected" } else { "disconnected" }
            ),
            Self::GamepadButton {
                button, pressed, ..
            } => write!(
                f,
                "gamepad button {button:?} {}",
                if *pressed { "down" } else { "up" }
            ),
            Self::Size { width, height, .. } => write!(f, "size {width}x{height}"),
            Self::Window { native, .. } => write!(f, "window native {:#x}", native.addr()),
            Self::Suspend { phase, .. } => write!(f, "suspend {phase:?}"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_indices_are_dense() {
        assert_eq!(Key::Escape.index(), 0);
        assert_eq!(Key::KeyZ.index(), Key::COUNT - 1);
    }

    #[test]
    fn test_event_window_association() {
        let ev = Event::Size {
            window: WindowHandle::default(),
            width: 640,
            height: 480,
        };
        assert_eq!(ev.window(), Some(WindowHandle::default()));
        assert_eq!(Event::Exit.window(), None);
    }

    #[test]
    fn test_trigger_axes() {
        assert!(GamepadAxis::LeftZ.is_trigger());
        assert!(GamepadAxis::RightZ.is_trigger());
        assert!(!GamepadAxis::LeftX.is_trigger());
    }

    #[test]
    fn test_modifiers_consts() {
        assert!(KeyModifiers::NONE.none());
        assert!(KeyModifiers::CTRL.any());
        assert!(KeyModifiers::CTRL_SHIFT.control);
        assert!(KeyModifiers::CTRL_SHIFT.shift);
    }
}
