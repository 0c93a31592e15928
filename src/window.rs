//! Window management using winit

use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window as WinitWindow, WindowBuilder},
};

/// Wrapper around winit window with accumulated per-frame input state
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
    resized: bool,
    close_requested: bool,
    dragging: bool,
    cursor: (f64, f64),
    drag_delta: (f32, f32),
    scroll_delta: f32,
    keys_pressed: Vec<KeyCode>,
}

impl Window {
    /// Create a new window with the given title and dimensions
    pub fn new(event_loop: &EventLoop<()>, title: &str, width: u32, height: u32) -> Self {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .build(event_loop)
                .expect("Failed to create window"),
        );

        Self {
            window,
            width,
            height,
            resized: false,
            close_requested: false,
            dragging: false,
            cursor: (0.0, 0.0),
            drag_delta: (0.0, 0.0),
            scroll_delta: 0.0,
            keys_pressed: Vec::new(),
        }
    }

    /// Get arc reference to window
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if window was resized since last frame
    pub fn was_resized(&self) -> bool {
        self.resized
    }

    /// Clear the resize flag
    pub fn clear_resize_flag(&mut self) {
        self.resized = false;
    }

    /// Check if close was requested
    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    /// Ask the run loop to exit after this frame
    pub fn close(&mut self) {
        self.close_requested = true;
    }

    /// Cursor movement accumulated while the left button was held
    pub fn take_drag_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.drag_delta)
    }

    /// Scroll wheel movement accumulated since the last frame
    pub fn take_scroll_delta(&mut self) -> f32 {
        std::mem::take(&mut self.scroll_delta)
    }

    /// Keys newly pressed since the last frame
    pub fn take_keys_pressed(&mut self) -> Vec<KeyCode> {
        std::mem::take(&mut self.keys_pressed)
    }

    /// Handle window events
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.width = size.width;
                self.height = size.height;
                self.resized = true;
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.keys_pressed.push(code);
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    self.drag_delta.0 += (position.x - self.cursor.0) as f32;
                    self.drag_delta.1 += (position.y - self.cursor.1) as f32;
                }
                self.cursor = (position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                };
            }
            _ => {}
        }
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Run the application with a per-frame callback
pub fn run<F>(title: &str, width: u32, height: u32, mut callback: F)
where
    F: FnMut(&mut Window) + 'static,
{
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut window = Window::new(&event_loop, title, width, height);

    event_loop
        .run(move |event, elwt: &EventLoopWindowTarget<()>| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => {
                    window.handle_event(&event);

                    if window.should_close() {
                        elwt.exit();
                    }
                }
                Event::AboutToWait => {
                    callback(&mut window);
                    if window.should_close() {
                        elwt.exit();
                    }
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .expect("Event loop failed");
}
