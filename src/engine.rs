use crate::config::DemoConfig;
use crate::error::Result;
use crate::frame::{EventSource, FrameLoop, RenderSurface, Rgba, SpriteRect};
use crate::input::{FrameEvent, TerminateFlag};
use crate::sprite::{GPUCamera, GPUSprite, SpriteDraw, SpriteRender};
use crate::WGPU;
use std::path::Path;
use std::rc::Rc;
use winit::{
    dpi::LogicalSize,
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

/// Configured sizes are in logical pixels so the window keeps its look on
/// scaled displays.
fn window_size(config: &DemoConfig) -> LogicalSize<u32> {
    LogicalSize::new(config.width, config.height)
}

/// A texture uploaded to the GPU together with its bind group.
pub struct SpriteTexture {
    texture: wgpu::Texture,
    bind_group: Rc<wgpu::BindGroup>,
}

impl From<Rgba> for wgpu::Color {
    fn from(Rgba { r, g, b, a }: Rgba) -> Self {
        Self { r, g, b, a }
    }
}

impl SpriteTexture {
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// The window and everything needed to draw sprites into it. Draws are
/// queued between `clear` and `present` and submitted as one render pass.
pub struct GpuSurface {
    sprites: SpriteRender,
    gpu: WGPU,
    pending: Vec<SpriteDraw>,
    clear_color: wgpu::Color,
    // Last, so the surface inside `gpu` is gone before the window.
    window: Window,
}

impl GpuSurface {
    pub fn new(gpu: WGPU, window: Window, config: &DemoConfig) -> Self {
        // Sprites are positioned in configured units no matter how many
        // physical pixels the window ended up with.
        let sprites = SpriteRender::new(&gpu, GPUCamera::screen(config.width, config.height));
        Self {
            sprites,
            gpu,
            pending: Vec::new(),
            clear_color: config.clear_color().into(),
            window,
        }
    }
}

impl RenderSurface for GpuSurface {
    type Texture = SpriteTexture;

    fn load_texture(&mut self, path: &Path) -> Result<SpriteTexture> {
        let texture = self.gpu.load_texture(path, Some("sprite texture"))?;
        let bind_group = Rc::new(self.sprites.texture_bind_group(&self.gpu, &texture));
        let texture = SpriteTexture {
            texture,
            bind_group,
        };
        let (width, height) = texture.size();
        log::info!(
            "texture is {width}x{height}, window scale factor {}",
            self.window.scale_factor()
        );
        Ok(texture)
    }

    fn clear(&mut self, color: Rgba) {
        self.clear_color = color.into();
        self.pending.clear();
    }

    fn draw(&mut self, texture: &SpriteTexture, rect: SpriteRect) {
        self.pending.push(SpriteDraw {
            texture: Rc::clone(&texture.bind_group),
            sprite: GPUSprite::from(rect),
        });
    }

    fn present(&mut self) {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring and skipping frame");
                self.gpu.reconfigure();
                self.pending.clear();
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                self.pending.clear();
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.sprites.upload(&self.gpu, &self.pending);
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.sprites.render(&mut rpass, &self.pending);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        self.pending.clear();
    }

    fn resize(&mut self, width: u32, height: u32) {
        log::debug!("surface resized to {width}x{height}");
        self.gpu.resize(width, height);
    }
}

/// Drains the winit queue without blocking: each poll runs the event loop
/// until everything pending has been delivered. A raised terminate flag
/// adds a `Quit` on top.
pub struct WindowEvents {
    event_loop: EventLoop<()>,
    terminate: TerminateFlag,
}

impl WindowEvents {
    pub fn new(event_loop: EventLoop<()>, terminate: TerminateFlag) -> Self {
        Self {
            event_loop,
            terminate,
        }
    }
}

impl EventSource for WindowEvents {
    fn poll(&mut self) -> Vec<FrameEvent> {
        let mut drained = Vec::new();
        self.event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::WindowEvent { event, .. } => {
                    drained.extend(FrameEvent::from_window_event(&event));
                }
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => {}
            }
        });
        drained.extend(self.terminate.event());
        drained
    }
}

pub struct Engine {
    // The window lives in `frames` and must go before its event loop.
    frames: FrameLoop<GpuSurface>,
    events: WindowEvents,
}

impl Engine {
    /// Opens the window, brings up the GPU and loads the texture. Nothing is
    /// drawn until [`Engine::run`].
    pub fn new(config: &DemoConfig) -> Result<Self> {
        let terminate = TerminateFlag::install().unwrap_or_else(|err| {
            log::warn!("Ctrl-C will not quit cleanly: {err}");
            TerminateFlag::default()
        });
        let events = WindowEvents::new(EventLoop::new(), terminate);
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(window_size(config))
            .with_resizable(false)
            .build(&events.event_loop)?;
        log::info!(
            "opened {}x{} window {:?}",
            config.width,
            config.height,
            config.title
        );

        let gpu = pollster::block_on(WGPU::new(&window))?;
        let surface = GpuSurface::new(gpu, window, config);
        let frames = FrameLoop::start(surface, config)?;
        Ok(Self { frames, events })
    }

    /// Runs until the window is closed or the process is told to terminate,
    /// and returns the number of frames drawn.
    pub fn run(&mut self) -> u64 {
        self.frames.run(&mut self.events)
    }

    pub fn start(config: &DemoConfig) -> Result<u64> {
        let mut engine = Self::new(config)?;
        Ok(engine.run())
    }
}
