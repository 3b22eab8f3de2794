// Preview module - Desktop window standing in for the display
//
// Runs the surfaces against a `SoftwareCompositor` and shows the composed
// display list in a winit window through pixels. Every frame the test
// patterns are redrawn, published and swapped exactly like an emulator
// front end would do it.
//
// Keys: F9 saves a screenshot, Escape quits.

pub mod pattern;

use crate::bank::SurfaceBank;
use crate::compositor::SoftwareCompositor;
use crate::config::FbConfig;
use crate::screenshot::save_screenshot;
use pixels::{Pixels, SurfaceTexture};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Preview window for a bank of surfaces
pub struct PreviewWindow {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    config: FbConfig,
    compositor: Rc<RefCell<SoftwareCompositor>>,
    bank: SurfaceBank,
    frame_count: u64,
    last_frame_time: Instant,
}

impl PreviewWindow {
    /// Create the compositor and allocate the configured surfaces
    ///
    /// The window itself is created when the event loop starts.
    pub fn new(config: FbConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let compositor = Rc::new(RefCell::new(SoftwareCompositor::new(
            config.display.width,
            config.display.height,
        )));
        let mut bank = SurfaceBank::from_config(compositor.clone(), &config)?;

        if let Some(overlay) = bank.get_mut(1).filter(|s| s.transparency()) {
            pattern::install_overlay_palette(overlay)?;
        }

        Ok(Self {
            window: None,
            pixels: None,
            config,
            compositor,
            bank,
            frame_count: 0,
            last_frame_time: Instant::now(),
        })
    }

    /// The surfaces being previewed
    pub fn bank(&self) -> &SurfaceBank {
        &self.bank
    }

    /// Draw, publish and swap one frame of every surface
    pub fn step(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let frame = self.frame_count;
        if let Some(main) = self.bank.get_mut(0) {
            pattern::draw_color_bars(main, frame);
        }
        if let Some(overlay) = self.bank.get_mut(1) {
            if overlay.transparency() {
                pattern::draw_overlay(overlay, frame);
            } else {
                pattern::draw_color_bars(overlay, frame / 2);
            }
        }

        let sync = self.config.preview.sync_swap;
        match self.bank.len() {
            0 => {}
            1 => self.bank.frames_ready(0, None, sync)?,
            _ => self.bank.frames_ready(0, Some(1), sync)?,
        }
        for index in 2..self.bank.len() {
            self.bank.frames_ready(index, None, sync)?;
        }

        self.frame_count += 1;
        Ok(())
    }

    /// Compose the display list into the window's pixel buffer
    fn render(&mut self) -> Result<(), pixels::Error> {
        if let Some(pixels) = &mut self.pixels {
            self.compositor.borrow().compose(pixels.frame_mut());
            pixels.render()?;
        }
        Ok(())
    }

    /// Check if enough time has passed for the next frame
    fn should_render_frame(&mut self) -> bool {
        if self.last_frame_time.elapsed() >= self.config.preview.frame_duration() {
            self.last_frame_time = Instant::now();
            true
        } else {
            false
        }
    }

    fn screenshot(&self) {
        let compositor = self.compositor.borrow();
        if let Err(e) = save_screenshot(&compositor, &self.config.preview.screenshot_directory) {
            log::error!("Failed to save screenshot: {}", e);
        }
    }

    fn create_window(
        &mut self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = (self.config.display.width, self.config.display.height);
        let window_attributes = Window::default_attributes()
            .with_title(format!("fblayer preview - {}x{}", width, height))
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let window_size = window.inner_size();

        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, window.clone());
        let pixels = Pixels::new(width, height, surface_texture)?;

        self.window = Some(window);
        self.pixels = Some(pixels);
        Ok(())
    }
}

impl ApplicationHandler for PreviewWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            log::error!("Failed to create preview window: {}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::F9 => self.screenshot(),
                KeyCode::Escape => event_loop.exit(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                if self.should_render_frame() {
                    if let Err(e) = self.step() {
                        log::error!("Presentation error: {}", e);
                        event_loop.exit();
                    } else if let Err(e) = self.render() {
                        log::error!("Render error: {}", e);
                        event_loop.exit();
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Create and run the preview window
///
/// # Arguments
/// * `config` - Display, preview and surface configuration
pub fn run_preview(config: FbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;

    if config.preview.vsync {
        event_loop.set_control_flow(ControlFlow::Wait);
    } else {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    log::info!(
        "Starting preview: {}x{} display, {} surface(s), {} FPS, vsync {}, sync swap {}",
        config.display.width,
        config.display.height,
        config.surfaces.len(),
        config.preview.target_fps,
        config.preview.vsync,
        config.preview.sync_swap
    );

    let mut preview = PreviewWindow::new(config)?;
    event_loop.run_app(&mut preview)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::BufferIndex;

    #[test]
    fn test_step_swaps_surfaces_in_lock_step() {
        let mut preview = PreviewWindow::new(FbConfig::default()).unwrap();
        preview.step().unwrap();
        assert!(preview
            .bank()
            .iter()
            .all(|s| s.active_buffer() == BufferIndex::B));

        preview.step().unwrap();
        assert!(preview
            .bank()
            .iter()
            .all(|s| s.active_buffer() == BufferIndex::A));
    }

    #[test]
    fn test_step_reaches_the_composed_frame() {
        let mut preview = PreviewWindow::new(FbConfig::default()).unwrap();
        preview.step().unwrap();

        let frame = preview.compositor.borrow().compose_to_vec();
        // The left pillarbox column stays black
        assert_eq!(&frame[..4], &[0, 0, 0, 0xFF]);
        assert!(frame.chunks_exact(4).any(|p| p[..3] != [0, 0, 0]));
    }

    #[test]
    fn test_unsynced_step_keeps_active_buffer() {
        let mut config = FbConfig::default();
        config.preview.sync_swap = false;
        let mut preview = PreviewWindow::new(config).unwrap();
        preview.step().unwrap();
        assert!(preview
            .bank()
            .iter()
            .all(|s| s.active_buffer() == BufferIndex::A));
    }
}
