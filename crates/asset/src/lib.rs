//! Asset loading/parsers: OBJ geometry, MTL material libraries, textures,
//! and the sequential remote load pipeline with progress reporting.

pub mod load;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod source;
pub mod texture;

pub use load::{
    CancelToken, Cancelled, LoadEvent, LoadOptions, LoadProgress, LoadStage, LoadTask, LoadedAssets,
};
pub use source::{AssetSource, DirSource, HttpSource, source_for};
