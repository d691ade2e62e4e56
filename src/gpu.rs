use crate::error::{DemoError, Result};
use std::path::Path;
use winit::window::Window;

/// The graphics API context: device, queue and the swapchain surface of one
/// window. The window must outlive this.
pub struct WGPU {
    pub surface: wgpu::Surface,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl WGPU {
    pub async fn new(window: &Window) -> Result<Self> {
        let size = window.inner_size();

        // An Instance is the context in which other WGPU values and
        // operations take place. Default picks a backend for us.
        let instance = wgpu::Instance::default();

        // SAFETY: the surface is stored next to the window by its owner and
        // dropped before it.
        let surface = unsafe { instance.create_surface(window) }?;

        // A physical device that can present to our surface.
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(DemoError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info());

        // Sprites live in a storage buffer, downlevel defaults still allow that.
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        let swapchain_capabilities = surface.get_capabilities(&adapter);
        // Textures are uploaded as sRGB, so prefer an sRGB swapchain too.
        let swapchain_format = swapchain_capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| swapchain_capabilities.formats.first().copied())
            .ok_or(DemoError::NoSurfaceFormat)?;
        let alpha_mode = swapchain_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the surface with a new size. Minimized windows report
    /// zero, which the surface can't take, so those are skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Decode an image file and upload it as an sRGB texture.
    pub fn load_texture(&self, path: &Path, label: Option<&str>) -> Result<wgpu::Texture> {
        let img = image::open(path)
            .map_err(|source| DemoError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        check_texture_size(path, width, height, self.device.limits().max_texture_dimension_2d)?;

        // How big is the texture in GPU memory?
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // 8 bits per component, four components per pixel, unsigned, normalized in 0..255, SRGB
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            texture.as_image_copy(),
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        log::debug!("uploaded {width}x{height} texture from {path:?}");
        Ok(texture)
    }
}

fn check_texture_size(path: &Path, width: u32, height: u32, limit: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DemoError::EmptyTexture {
            path: path.to_path_buf(),
            width,
            height,
        });
    }
    if width > limit || height > limit {
        return Err(DemoError::TextureTooLarge {
            path: path.to_path_buf(),
            width,
            height,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_size_limits() {
        let path = Path::new("tex.bmp");
        assert!(check_texture_size(path, 64, 64, 2048).is_ok());
        assert!(check_texture_size(path, 2048, 1, 2048).is_ok());
        assert!(matches!(
            check_texture_size(path, 0, 64, 2048),
            Err(DemoError::EmptyTexture { .. })
        ));
        assert!(matches!(
            check_texture_size(path, 64, 4096, 2048),
            Err(DemoError::TextureTooLarge { limit: 2048, .. })
        ));
    }
}
