use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

/// What the frame loop cares about from the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// The window was closed or the app was asked to terminate.
    Quit,
    /// A key went down. Held keys show up again only through key repeat.
    KeyDown(VirtualKeyCode),
    /// The drawable area changed size, in physical pixels.
    Resized(u32, u32),
}

impl FrameEvent {
    pub fn from_window_event(event: &WindowEvent<'_>) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(Self::Quit),
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } => Some(Self::KeyDown(*key)),
            WindowEvent::Resized(size) => Some(Self::Resized(size.width, size.height)),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                Some(Self::Resized(new_inner_size.width, new_inner_size.height))
            }
            _ => None,
        }
    }
}

/// Set from a signal handler on SIGINT/SIGTERM (Ctrl-C or close on
/// Windows). Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct TerminateFlag(Arc<AtomicBool>);

impl TerminateFlag {
    /// Routes termination signals to a new flag. Only one handler can exist
    /// per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let flag = Self::default();
        let handler = flag.clone();
        ctrlc::set_handler(move || handler.raise())?;
        Ok(flag)
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Quit` for every poll after the signal arrived.
    pub fn event(&self) -> Option<FrameEvent> {
        self.is_raised().then_some(FrameEvent::Quit)
    }
}

/// Directions requested during the current frame. Rebuilt from scratch
/// every frame, nothing carries over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputSnapshot {
    /// Marks the direction bound to `key`. Returns false for keys that
    /// don't steer anything.
    pub fn press(&mut self, key: VirtualKeyCode) -> bool {
        let flag = match key {
            VirtualKeyCode::W => &mut self.up,
            VirtualKeyCode::S => &mut self.down,
            VirtualKeyCode::A => &mut self.left,
            VirtualKeyCode::D => &mut self.right,
            _ => return false,
        };
        *flag = true;
        true
    }

    pub fn next_frame(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    /// Screen-space displacement, y grows downward. Opposite keys cancel.
    pub fn delta(&self, step: i32) -> (i32, i32) {
        let mut dx = 0;
        let mut dy = 0;
        if self.up {
            dy -= step;
        }
        if self.down {
            dy += step;
        }
        if self.left {
            dx -= step;
        }
        if self.right {
            dx += step;
        }
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;
    use winit::event::{DeviceId, ModifiersState};

    #[allow(deprecated)]
    fn key_event(state: ElementState, key: Option<VirtualKeyCode>) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            device_id: unsafe { DeviceId::dummy() },
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: key,
                modifiers: ModifiersState::empty(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn wasd_maps_to_directions() {
        let mut input = InputSnapshot::default();
        assert!(input.press(VirtualKeyCode::W));
        assert!(input.press(VirtualKeyCode::A));
        assert_eq!(
            input,
            InputSnapshot {
                up: true,
                down: false,
                left: true,
                right: false
            }
        );
        assert!(input.press(VirtualKeyCode::S));
        assert!(input.press(VirtualKeyCode::D));
        assert!(input.down && input.right);
    }

    #[test]
    fn raised_terminate_flag_means_quit() {
        let flag = TerminateFlag::default();
        assert_eq!(flag.event(), None);

        // The signal handler owns a clone.
        let handler = flag.clone();
        handler.raise();
        assert!(flag.is_raised());
        assert_eq!(flag.event(), Some(FrameEvent::Quit));
        assert_eq!(flag.event(), Some(FrameEvent::Quit));
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut input = InputSnapshot::default();
        assert!(!input.press(VirtualKeyCode::Up));
        assert!(!input.press(VirtualKeyCode::Space));
        assert!(input.is_idle());
    }

    #[test]
    fn delta_composes_per_axis() {
        let mut input = InputSnapshot::default();
        assert_eq!(input.delta(5), (0, 0));
        input.up = true;
        assert_eq!(input.delta(5), (0, -5));
        input.left = true;
        assert_eq!(input.delta(5), (-5, -5));
        input.down = true;
        assert_eq!(input.delta(5), (-5, 0));
    }

    #[test]
    fn next_frame_forgets_everything() {
        let mut input = InputSnapshot::default();
        input.press(VirtualKeyCode::D);
        input.next_frame();
        assert!(input.is_idle());
    }

    #[test]
    fn translates_window_events() {
        assert_eq!(
            FrameEvent::from_window_event(&WindowEvent::CloseRequested),
            Some(FrameEvent::Quit)
        );
        assert_eq!(
            FrameEvent::from_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600))),
            Some(FrameEvent::Resized(800, 600))
        );
        assert_eq!(
            FrameEvent::from_window_event(&key_event(
                ElementState::Pressed,
                Some(VirtualKeyCode::W)
            )),
            Some(FrameEvent::KeyDown(VirtualKeyCode::W))
        );
    }

    #[test]
    fn releases_and_unknown_keys_produce_nothing() {
        assert_eq!(
            FrameEvent::from_window_event(&key_event(
                ElementState::Released,
                Some(VirtualKeyCode::W)
            )),
            None
        );
        assert_eq!(
            FrameEvent::from_window_event(&key_event(ElementState::Pressed, None)),
            None
        );
        assert_eq!(
            FrameEvent::from_window_event(&WindowEvent::Focused(true)),
            None
        );
    }
}
