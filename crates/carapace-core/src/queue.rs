//! Bounded FIFO event queue between a platform thread and the logic thread.
//!
//! The queue is split into a producer half ([`EventSender`]) handed to the
//! platform's native event pump and a consumer half ([`EventReceiver`]) owned
//! by the application's logic thread. Neither half is clonable: the queue is
//! single-producer/single-consumer by construction, and platform back-ends
//! that multiplex several native input sources must serialize their own
//! posts, which every supported back-end already does by pumping from one
//! designated thread.
//!
//! Backpressure is applied to the producer: when the queue is full, a post
//! blocks until the consumer frees a slot. No event is ever dropped, and a
//! full queue means the consumer is starved, which is a latency problem
//! rather than a correctness one. The queue is sized (default
//! [`DEFAULT_EVENT_CAPACITY`]) so that blocking does not occur in practice.
//!
//! # Example
//!
//! ```
//! use carapace_core::queue;
//! use carapace_core::event::{Event, Key, KeyModifiers, WindowHandle};
//!
//! let (sender, mut receiver) = queue::bounded(queue::DEFAULT_EVENT_CAPACITY);
//!
//! // Platform side.
//! sender
//!     .post_key_event(WindowHandle::default(), Key::Space, KeyModifiers::NONE, true)
//!     .unwrap();
//!
//! // Logic side.
//! match receiver.poll() {
//!     Some(Event::Key { key, down, .. }) => {
//!         assert_eq!(key, Key::Space);
//!         assert!(down);
//!     }
//!     other => panic!("unexpected event: {other:?}"),
//! }
//! assert!(receiver.poll().is_none());
//! ```

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::ChannelError;
use crate::event::{
    Event, GamepadAxis, GamepadButton, GamepadHandle, Key, KeyModifiers, MouseButton,
    NativeWindowPtr, SuspendPhase, WindowHandle,
};

/// Default capacity of an event queue.
///
/// Large relative to per-frame event volume so that producer-side blocking
/// only happens when the consumer is severely starved.
pub const DEFAULT_EVENT_CAPACITY: usize = 2048;

/// Create a bounded event queue, returning its producer and consumer halves.
///
/// `capacity` must be non-zero; a zero capacity would turn every post into a
/// rendezvous with the consumer and is rejected with a panic since it is a
/// construction-time programming error.
pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
    assert!(capacity > 0, "event queue capacity must be non-zero");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (
        EventSender { tx },
        EventReceiver {
            rx,
            peeked: None,
        },
    )
}

/// The producer half of an event queue.
///
/// Deliberately not `Clone`: exactly one platform thread posts to a queue.
#[derive(Debug)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Post an event, blocking while the queue is full.
    ///
    /// Returns an error only if the consumer half has been dropped.
    pub fn post(&self, event: Event) -> Result<(), ChannelError> {
        tracing::trace!(target: "carapace_core::queue", %event, "post");
        self.tx.send(event).map_err(|_| ChannelError::Disconnected)
    }

    /// Post a key press or release.
    pub fn post_key_event(
        &self,
        window: WindowHandle,
        key: Key,
        modifiers: KeyModifiers,
        down: bool,
    ) -> Result<(), ChannelError> {
        self.post(Event::Key {
            window,
            key,
            modifiers,
            down,
        })
    }

    /// Post a text-input character.
    pub fn post_char_event(&self, window: WindowHandle, ch: char) -> Result<(), ChannelError> {
        self.post(Event::Char { window, ch })
    }

    /// Post mouse motion without a button transition.
    pub fn post_mouse_move_event(
        &self,
        window: WindowHandle,
        x: i32,
        y: i32,
        wheel: i32,
        modifiers: KeyModifiers,
    ) -> Result<(), ChannelError> {
        self.post(Event::Mouse {
            window,
            x,
            y,
            wheel,
            button: None,
            down: false,
            double_click: false,
            modifiers,
        })
    }

    /// Post a mouse button press or release at the given position.
    #[allow(clippy::too_many_arguments)]
    pub fn post_mouse_button_event(
        &self,
        window: WindowHandle,
        x: i32,
        y: i32,
        wheel: i32,
        button: MouseButton,
        modifiers: KeyModifiers,
        down: bool,
        double_click: bool,
    ) -> Result<(), ChannelError> {
        self.post(Event::Mouse {
            window,
            x,
            y,
            wheel,
            button: Some(button),
            down,
            double_click,
            modifiers,
        })
    }

    /// Post a gamepad axis movement.
    pub fn post_axis_event(
        &self,
        window: WindowHandle,
        gamepad: GamepadHandle,
        axis: GamepadAxis,
        value: i32,
    ) -> Result<(), ChannelError> {
        self.post(Event::Axis {
            window,
            gamepad,
            axis,
            value,
        })
    }

    /// Post a gamepad connect or disconnect.
    pub fn post_gamepad_event(
        &self,
        window: WindowHandle,
        gamepad: GamepadHandle,
        connected: bool,
    ) -> Result<(), ChannelError> {
        self.post(Event::Gamepad {
            window,
            gamepad,
            connected,
        })
    }

    /// Post a gamepad button press or release.
    pub fn post_gamepad_button_event(
        &self,
        window: WindowHandle,
        gamepad: GamepadHandle,
        button: GamepadButton,
        pressed: bool,
    ) -> Result<(), ChannelError> {
        self.post(Event::GamepadButton {
            window,
            gamepad,
            button,
            pressed,
        })
    }

    /// Post a window resize.
    pub fn post_size_event(
        &self,
        window: WindowHandle,
        width: u32,
        height: u32,
    ) -> Result<(), ChannelError> {
        self.post(Event::Size {
            window,
            width,
            height,
        })
    }

    /// Post a native window handle change.
    pub fn post_window_event(
        &self,
        window: WindowHandle,
        native: NativeWindowPtr,
    ) -> Result<(), ChannelError> {
        self.post(Event::Window { window, native })
    }

    /// Post a suspend/resume phase transition.
    pub fn post_suspend_event(
        &self,
        window: WindowHandle,
        phase: SuspendPhase,
    ) -> Result<(), ChannelError> {
        self.post(Event::Suspend { window, phase })
    }

    /// Post an application exit request.
    pub fn post_exit_event(&self) -> Result<(), ChannelError> {
        self.post(Event::Exit)
    }
}

/// The consumer half of an event queue.
///
/// Owned by the logic thread. Polling is non-blocking; a polled event is
/// moved out to the caller, and dropping it is its release. The receiver
/// holds a one-slot peek buffer so that window-filtered polling can inspect
/// the head of the stream without reordering it.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<Event>,
    /// Head-of-stream event held back by a filtered poll.
    peeked: Option<Event>,
}

impl EventReceiver {
    /// Pop the next event, or `None` when the queue is empty.
    pub fn poll(&mut self) -> Option<Event> {
        if let Some(event) = self.peeked.take() {
            return Some(event);
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Pop the next event only if it belongs to `window`.
    ///
    /// If the head of the stream is associated with a different window it
    /// stays at the head and `None` is returned; a later poll for the right
    /// window will still see it. Events with no window association
    /// ([`Event::Exit`]) match any filter.
    pub fn poll_for_window(&mut self, window: WindowHandle) -> Option<Event> {
        if self.peeked.is_none() {
            self.peeked = match self.rx.try_recv() {
                Ok(event) => Some(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
            };
        }

        let matches = self
            .peeked
            .as_ref()
            .is_some_and(|event| event.window().is_none_or(|w| w == window));

        if matches { self.peeked.take() } else { None }
    }

    /// Number of events currently queued, including a held-back head.
    pub fn len(&self) -> usize {
        self.rx.len() + usize::from(self.peeked.is_some())
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        // Drain so queued events are released even if the producer half is
        // still alive at teardown.
        let mut drained = usize::from(self.peeked.take().is_some());
        while self.rx.try_recv().is_ok() {
            drained += 1;
        }
        if drained > 0 {
            tracing::trace!(target: "carapace_core::queue", drained, "drained on teardown");
        }
    }
}

static_assertions::assert_impl_all!(EventSender: Send);
static_assertions::assert_impl_all!(EventReceiver: Send);
static_assertions::assert_impl_all!(Event: Send);
