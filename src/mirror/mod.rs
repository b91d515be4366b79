//! Course Content Mirror
//!
//! One-way replication of Canvas course content onto the local filesystem. Runs are
//! idempotent: unchanged files and already-mirrored assets are not transferred again.

pub mod assets;
pub mod change;
pub mod content;
pub mod store;

pub use assets::{asset_hash, AssetKind, AssetRewriter, Rewrite};
pub use change::{ChangeDetector, Decision};
pub use content::{
    ContentMirror, FileTarget, ItemOutcome, MirrorSummary, SkipReason, WriteKind,
    COURSE_FILES_DIR,
};
