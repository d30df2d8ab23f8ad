pub mod config;

use std::sync::Arc;
use color_eyre::Result;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};
use crate::app::config::AppConfig;
use crate::renderer::error::FrameError;
use crate::renderer::Renderer;

pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,

    // State
    close_requested: bool,
    exit_error: Option<color_eyre::Report>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,

            close_requested: false,
            exit_error: None,
        }
    }

    /// Runs the event loop until the session ends. Returns the first fatal error.
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        // Tears the swapchain and device down before the window goes away
        self.renderer = None;
        self.window = None;

        match self.exit_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let renderer = Renderer::new(window.clone(), &self.config.render)?;
        log::info!(
            "Renderer ready: {} frame slots, {}x{}, {:?}, {:?}",
            renderer.image_count(),
            renderer.extent().width,
            renderer.extent().height,
            renderer.surface_format().format,
            renderer.present_mode(),
        );
        if let Ok(allocator) = renderer.memory_allocator().lock() {
            log::debug!("{:?}", allocator);
        }

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: color_eyre::Report) {
        self.record_fatal(err);
        event_loop.exit();
    }

    /// Keeps the first fatal error and stops any further drawing.
    fn record_fatal(&mut self, err: color_eyre::Report) {
        if self.exit_error.is_none() {
            self.exit_error = Some(err);
        }
        self.close_requested = true;
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        match renderer.draw() {
            Ok(info) => {
                log::trace!("Frame {} in slot {} on image {}", info.frame, info.slot, info.image_index);
                if self.config.max_frames.is_some_and(|max| renderer.frame_count() >= max) {
                    log::info!("Presented {} frames, ending session", renderer.frame_count());
                    self.close_requested = true;
                }
            }
            Err(FrameError::SessionEnd(reason)) => {
                log::info!("Session ended after {} frames: {}", renderer.frame_count(), reason);
                self.close_requested = true;
            }
            Err(err) => {
                self.fail(event_loop, err.into());
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() || self.exit_error.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent
    ) {
        if self.window.as_ref().is_none_or(|window| window.id() != window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(new_size) => {
                // The swapchain is never recreated. An out of date surface ends the session.
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            WindowEvent::KeyboardInput {
                event:
                KeyEvent {
                    logical_key: Key::Named(NamedKey::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => {
                self.close_requested = true;
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
            return;
        }

        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Drop before the event loop tears down the display connection
        self.renderer = None;
    }
}
