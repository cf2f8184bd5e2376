//! Sequential model load: material library, then its textures, then the
//! geometry, with byte-level progress for the geometry transfer.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{
    mtl::{self, MtlLibrary},
    obj::{self, ObjScene},
    source::AssetSource,
    texture::TextureData,
};

/// The load was abandoned through its [`CancelToken`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("load cancelled")]
pub struct Cancelled;

/// Shared cancellation flag, checked between transfer chunks and steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Cancelled.into())
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStage {
    LoadingMaterials,
    DownloadingGeometry,
    Processing,
}

impl LoadStage {
    pub fn label(self) -> &'static str {
        match self {
            LoadStage::LoadingMaterials => "Loading materials...",
            LoadStage::DownloadingGeometry => "Downloading geometry...",
            LoadStage::Processing => "Processing model...",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
    pub stage: LoadStage,
}

impl LoadProgress {
    /// Completed fraction in `[0, 1]`; `0` when the total is unknown.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.loaded as f64 / self.total as f64).clamp(0.0, 1.0) as f32
        }
    }

    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }
}

#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub mtl_file: String,
    pub obj_file: String,
    /// Expected size of the whole load in bytes, used to scale progress
    /// before the geometry transfer reports its real length.
    pub estimated_total: u64,
    /// Share of `estimated_total` reported once materials are ready.
    pub placeholder_fraction: f64,
}

/// Everything the viewer needs to build a model.
#[derive(Clone, Debug)]
pub struct LoadedAssets {
    pub materials: MtlLibrary,
    /// Decoded textures; `TextureData::name` is the path used in the library.
    pub textures: Vec<TextureData>,
    pub geometry: ObjScene,
}

impl LoadedAssets {
    pub fn texture_index(&self, path: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.name == path)
    }
}

/// Run the whole pipeline on the current thread.
pub fn load_assets(
    source: &dyn AssetSource,
    opts: &LoadOptions,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(LoadProgress),
) -> Result<LoadedAssets> {
    let estimate = opts.estimated_total;
    on_progress(LoadProgress {
        loaded: 0,
        total: estimate,
        stage: LoadStage::LoadingMaterials,
    });

    log::info!("Loading materials from {}{}", source.describe(), opts.mtl_file);
    let mtl_bytes = source
        .fetch(&opts.mtl_file, cancel, &mut |_, _| {})
        .with_context(|| format!("Failed to fetch material library '{}'", opts.mtl_file))?;
    let materials = mtl::load_mtl_from_bytes(&mtl_bytes)
        .with_context(|| format!("Failed to parse material library '{}'", opts.mtl_file))?;
    log::info!("Parsed {} materials", materials.materials.len());

    let textures = preload_textures(source, &materials, cancel)?;
    cancel.check()?;

    on_progress(LoadProgress {
        loaded: (estimate as f64 * opts.placeholder_fraction) as u64,
        total: estimate,
        stage: LoadStage::DownloadingGeometry,
    });

    log::info!("Downloading geometry {}", opts.obj_file);
    let obj_bytes = source
        .fetch(&opts.obj_file, cancel, &mut |loaded, total| {
            // Without a reported length the transfer stays indeterminate.
            if let Some(total) = total.filter(|&t| t > 0) {
                on_progress(LoadProgress {
                    loaded,
                    total,
                    stage: LoadStage::DownloadingGeometry,
                });
            }
        })
        .with_context(|| format!("Failed to fetch geometry '{}'", opts.obj_file))?;

    on_progress(LoadProgress {
        loaded: estimate,
        total: estimate,
        stage: LoadStage::Processing,
    });

    let geometry = obj::load_obj_from_bytes(&obj_bytes)
        .with_context(|| format!("Failed to parse geometry '{}'", opts.obj_file))?;
    log::info!(
        "Parsed {} objects, {} vertices, {} triangles ({} bytes)",
        geometry.objects.len(),
        geometry.vertex_count(),
        geometry.triangle_count(),
        obj_bytes.len()
    );
    if !geometry.names_library(&opts.mtl_file) {
        log::warn!(
            "Geometry references {:?}, materials come from '{}'",
            geometry.material_libs,
            opts.mtl_file
        );
    }

    Ok(LoadedAssets {
        materials,
        textures,
        geometry,
    })
}

/// Fetch and decode every texture of the library. A broken texture only
/// costs its map: it is logged and skipped.
fn preload_textures(
    source: &dyn AssetSource,
    materials: &MtlLibrary,
    cancel: &CancelToken,
) -> Result<Vec<TextureData>> {
    let mut textures = Vec::new();
    for path in materials.texture_paths() {
        cancel.check()?;
        let decoded = source
            .fetch(path, cancel, &mut |_, _| {})
            .and_then(|bytes| TextureData::decode(path, &bytes));
        match decoded {
            Ok(tex) => textures.push(tex),
            Err(err) if err.is::<Cancelled>() => return Err(err),
            Err(err) => log::warn!("Texture '{}' unavailable: {:#}", path, err),
        }
    }
    Ok(textures)
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Finished(Result<LoadedAssets>),
}

/// A load running on its own thread. Dropping the handle cancels it.
pub struct LoadTask {
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl LoadTask {
    /// Start loading; `sink` receives progress events and exactly one
    /// `Finished` event (unless the load is cancelled first).
    pub fn spawn<F>(source: Box<dyn AssetSource>, opts: LoadOptions, mut sink: F) -> Result<Self>
    where
        F: FnMut(LoadEvent) + Send + 'static,
    {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = load_assets(source.as_ref(), &opts, &token, &mut |p| {
                    sink(LoadEvent::Progress(p))
                });
                match result {
                    Err(err) if err.is::<Cancelled>() => log::info!("Load cancelled"),
                    other => sink(LoadEvent::Finished(other)),
                }
            })
            .context("Failed to spawn loader thread")?;
        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        // A stalled transfer can block for ever; cancel and detach instead of joining.
        self.cancel.cancel();
        self.handle.take();
    }
}
