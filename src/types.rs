//! Core identifier types shared by the mirroring and reconciliation layers.

/// CourseId: Canvas course (container) identifier
pub type CourseId = u64;

/// ProjectId: Todoist project identifier (opaque string in the Sync API)
pub type ProjectId = String;

/// TaskId: Todoist item identifier
pub type TaskId = String;

/// AssetHash: hex-encoded blake3 digest of an embedded asset URL
pub type AssetHash = String;
