//! Entry point for Meshview.
//! Logging + command line, then the platform loop.

use anyhow::Result;
use clap::Parser;
use platform::WindowOptions;
use viewer::{ViewerConfig, config::DEFAULT_BASE_URL};

#[derive(Parser, Debug)]
#[command(name = "meshview")]
#[command(about = "View a textured OBJ model served from a base URL or directory")]
struct Cli {
    /// Base URL (or directory) holding the model files and textures
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Geometry file name, relative to the base
    #[arg(long, default_value = "Mesh.obj")]
    obj: String,

    /// Material library file name, relative to the base
    #[arg(long, default_value = "Mesh.mtl")]
    mtl: String,

    /// Expected download size in MiB, scales the progress bar
    #[arg(long, default_value_t = 278)]
    total_size_mb: u64,

    /// Initial camera azimuth in degrees
    #[arg(long, default_value_t = 40.0, allow_negative_numbers = true)]
    azimuth: f32,

    /// Initial camera elevation in degrees
    #[arg(long, default_value_t = 28.0, allow_negative_numbers = true)]
    elevation: f32,

    /// Initial camera distance as a multiple of the fitting distance
    #[arg(long, default_value_t = 1.5)]
    distance_multiplier: f32,

    /// auto|vulkan|dx12|metal|gl
    #[arg(long, default_value = "auto")]
    gpu_backend: String,

    /// Window size as WxH
    #[arg(long, default_value = "1280x720", value_parser = parse_size)]
    size: (u32, u32),
}

impl Cli {
    fn viewer_config(&self) -> ViewerConfig {
        let mut config = ViewerConfig {
            base_url: self.base_url.clone(),
            obj_file: self.obj.clone(),
            mtl_file: self.mtl.clone(),
            estimated_total_bytes: self.total_size_mb * 1024 * 1024,
            ..ViewerConfig::default()
        };
        config.initial_view.azimuth_deg = self.azimuth;
        config.initial_view.elevation_deg = self.elevation;
        config.initial_view.distance_multiplier = self.distance_multiplier;
        config
    }
}

fn parse_backend(val: &str) -> wgpu::Backends {
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{other}', falling back to auto.");
            wgpu::Backends::all()
        }
    }
}

fn parse_size(v: &str) -> Result<(u32, u32), String> {
    let (sw, sh) = v
        .split_once('x')
        .or_else(|| v.split_once('X'))
        .ok_or_else(|| format!("expected WxH, got '{v}'"))?;
    let w = sw.parse::<u32>().map_err(|e| format!("bad width '{sw}': {e}"))?;
    let h = sh.parse::<u32>().map_err(|e| format!("bad height '{sh}': {e}"))?;
    Ok((w.max(1), h.max(1)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let backends = parse_backend(&cli.gpu_backend);
    let (width, height) = cli.size;
    log::info!(
        "Starting Meshview. Backend: {:?}, window_size={}x{}",
        backends,
        width,
        height
    );

    platform::run(
        cli.viewer_config(),
        WindowOptions {
            backends,
            width,
            height,
        },
    )?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_config() {
        let cli = Cli::try_parse_from(["meshview"]).unwrap();
        assert_eq!(cli.viewer_config(), ViewerConfig::default());
        assert_eq!(cli.size, (1280, 720));
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "meshview",
            "--base-url",
            "file:///tmp/model/",
            "--total-size-mb",
            "10",
            "--azimuth",
            "-30",
            "--size",
            "800X600",
        ])
        .unwrap();
        let config = cli.viewer_config();
        assert_eq!(config.base_url, "file:///tmp/model/");
        assert_eq!(config.estimated_total_bytes, 10 * 1024 * 1024);
        assert_eq!(config.initial_view.azimuth_deg, -30.0);
        assert_eq!(cli.size, (800, 600));
    }

    #[test]
    fn backend_names() {
        assert_eq!(parse_backend("Vulkan"), wgpu::Backends::VULKAN);
        assert_eq!(parse_backend("gles"), wgpu::Backends::GL);
        assert_eq!(parse_backend("nope"), wgpu::Backends::all());
    }

    #[test]
    fn size_requires_two_numbers() {
        assert!(parse_size("1280").is_err());
        assert!(parse_size("axb").is_err());
        assert_eq!(parse_size("0x5"), Ok((1, 5)));
    }
}
