//! Course content mirroring.
//!
//! Two independent passes materialize a course locally:
//!
//! - the folder pass lists course folders and downloads the files of each folder into
//!   `<root>/<normalized full_name>`;
//! - the module pass walks module items; files land flat in `<root>/course-files` unless
//!   they are not already there, in which case they go to the module's subfolder, and
//!   page-like items are written as HTML documents in the module's subfolder.
//!
//! Listings are processed in the order the remote returns them. Every item yields an
//! [`ItemOutcome`]; one bad item never stops the pass.

use crate::error::ApiError;
use crate::mirror::assets::AssetRewriter;
use crate::mirror::change::{lock_sidecar_path, write_lock_sidecar, ChangeDetector, Decision};
use crate::mirror::store;
use crate::naming::{folder_path, normalize, normalize_dir_name};
use crate::remote::{FileDescriptor, HtmlDocument, ItemKind, LmsApi, Module, ModuleItem, RemoteNode};
use crate::types::CourseId;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Directory, under a course root, holding module files.
pub const COURSE_FILES_DIR: &str = "course-files";

/// How an item was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Created,
    Updated,
}

/// Why an item was not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unchanged,
    Locked,
    NoDetailUrl,
    NotDownloadable(ItemKind),
}

/// Result of processing one remote item.
#[derive(Debug)]
pub enum ItemOutcome {
    Written(WriteKind),
    Skipped(SkipReason),
    Failed(ApiError),
}

/// Per-course counters for one mirroring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub files_downloaded: usize,
    pub files_updated: usize,
    pub files_skipped: usize,
    pub files_locked: usize,
    pub items_failed: usize,
    pub assets_fetched: usize,
}

impl MirrorSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Written(WriteKind::Created) => self.files_downloaded += 1,
            ItemOutcome::Written(WriteKind::Updated) => self.files_updated += 1,
            ItemOutcome::Skipped(SkipReason::Locked) => self.files_locked += 1,
            ItemOutcome::Skipped(_) => self.files_skipped += 1,
            ItemOutcome::Failed(_) => self.items_failed += 1,
        }
    }

    /// Files written to disk in this pass.
    pub fn materialized(&self) -> usize {
        self.files_downloaded + self.files_updated
    }

    pub fn merge(&mut self, other: &MirrorSummary) {
        self.files_downloaded += other.files_downloaded;
        self.files_updated += other.files_updated;
        self.files_skipped += other.files_skipped;
        self.files_locked += other.files_locked;
        self.items_failed += other.items_failed;
        self.assets_fetched += other.assets_fetched;
    }
}

/// Where a file should be materialized: the direct folder, or a fallback folder used
/// only when no copy exists in the direct folder.
#[derive(Debug, Clone)]
pub struct FileTarget {
    pub direct: PathBuf,
    pub fallback: Option<PathBuf>,
}

impl FileTarget {
    pub fn direct(dir: PathBuf) -> Self {
        Self {
            direct: dir,
            fallback: None,
        }
    }

    /// Resolve the final path for `file_name`. At most one fallback step.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        let direct = self.direct.join(file_name);
        match &self.fallback {
            Some(dir) if !direct.is_file() => dir.join(file_name),
            _ => direct,
        }
    }
}

/// Drives the folder and module passes for one course at a time.
pub struct ContentMirror<'a> {
    lms: &'a dyn LmsApi,
    assets: AssetRewriter<'a>,
}

impl<'a> ContentMirror<'a> {
    pub fn new(lms: &'a dyn LmsApi) -> Self {
        Self {
            lms,
            assets: AssetRewriter::new(lms),
        }
    }

    /// Mirror every folder's files of `course_id` under `root`.
    ///
    /// Fails only when the folder listing itself fails; a folder whose file listing
    /// fails is logged and skipped.
    pub fn mirror_course_files(
        &self,
        course_id: CourseId,
        root: &Path,
    ) -> Result<MirrorSummary, ApiError> {
        let folders = self.lms.list_folders(course_id)?;
        let mut summary = MirrorSummary::default();

        for folder in folders {
            let dir = root.join(folder_path(&folder.full_name));
            info!(
                folder = %folder.full_name,
                files = folder.files_count,
                folders = folder.folders_count,
                "folder"
            );

            let files = match self.lms.list_folder_files(&folder) {
                Ok(files) => files,
                Err(e) => {
                    error!(folder = %folder.full_name, error = %e, "failed to list folder files");
                    continue;
                }
            };

            for file in files {
                let outcome = match file {
                    Ok(file) => {
                        let outcome =
                            self.materialize_file(&file, &FileTarget::direct(dir.clone()));
                        if let ItemOutcome::Failed(e) = &outcome {
                            error!(
                                folder = %folder.full_name,
                                file = %file.display_name,
                                payload = %file.raw,
                                error = %e,
                                "failed to mirror file"
                            );
                        }
                        outcome
                    }
                    Err(e) => {
                        error!(folder = %folder.full_name, error = %e, "invalid file record");
                        ItemOutcome::Failed(e)
                    }
                };
                summary.record(&outcome);
            }
        }

        Ok(summary)
    }

    /// Mirror module items of `course_id` under `root/course-files`.
    ///
    /// Fails only when the module listing itself fails.
    pub fn mirror_module_items(
        &self,
        course_id: CourseId,
        root: &Path,
    ) -> Result<MirrorSummary, ApiError> {
        let modules = self.lms.list_modules(course_id)?;
        let files_root = root.join(COURSE_FILES_DIR);
        let mut summary = MirrorSummary::default();

        for module in modules {
            info!(module = %module.name, "module");
            let items = match self.lms.list_module_items(&module) {
                Ok(items) => items,
                Err(e) => {
                    error!(module = %module.name, error = %e, "failed to list module items");
                    continue;
                }
            };

            for item in items {
                let outcome = match item {
                    Ok(item) => {
                        let outcome = self.mirror_item(&module, &item, &files_root, &mut summary);
                        if let ItemOutcome::Failed(e) = &outcome {
                            error!(
                                module = %module.name,
                                item = %item.title,
                                kind = %item.kind,
                                payload = %item.raw,
                                error = %e,
                                "failed to mirror module item"
                            );
                        }
                        outcome
                    }
                    Err(e) => {
                        error!(module = %module.name, error = %e, "invalid module item");
                        ItemOutcome::Failed(e)
                    }
                };
                summary.record(&outcome);
            }
        }

        Ok(summary)
    }

    fn mirror_item(
        &self,
        module: &Module,
        item: &ModuleItem,
        files_root: &Path,
        summary: &mut MirrorSummary,
    ) -> ItemOutcome {
        let kind = match ItemKind::parse(&item.kind) {
            Ok(kind) => kind,
            Err(e) => return ItemOutcome::Failed(e),
        };
        if matches!(
            kind,
            ItemKind::SubHeader | ItemKind::ExternalUrl | ItemKind::ExternalTool
        ) {
            debug!(item = %item.title, kind = kind.as_str(), "not downloadable");
            return ItemOutcome::Skipped(SkipReason::NotDownloadable(kind));
        }
        let Some(url) = item.url.as_deref() else {
            warn!(item = %item.title, kind = kind.as_str(), "no detail url; skipping");
            return ItemOutcome::Skipped(SkipReason::NoDetailUrl);
        };

        let node = match self
            .lms
            .fetch_detail(url)
            .and_then(|detail| RemoteNode::from_detail(kind, &detail))
        {
            Ok(node) => node,
            Err(e) => return ItemOutcome::Failed(e),
        };

        let module_dir = files_root.join(normalize_dir_name(&module.name));
        match &node {
            RemoteNode::File(file) => self.materialize_file(
                file,
                &FileTarget {
                    direct: files_root.to_path_buf(),
                    fallback: Some(module_dir),
                },
            ),
            _ => match node.html() {
                Some(doc) => self.materialize_html(doc, &module_dir, summary),
                None => ItemOutcome::Failed(ApiError::UnknownItemType(item.kind.clone())),
            },
        }
    }

    /// Download a file unless an equally sized copy exists; record a sidecar for locked files.
    pub fn materialize_file(&self, file: &FileDescriptor, target: &FileTarget) -> ItemOutcome {
        let file_name = normalize(&file.display_name, true);
        let path = target.resolve(&file_name);

        match ChangeDetector::for_file(file, &path) {
            Decision::Skip => {
                debug!(file = %file_name, size = ?file.size, "unchanged");
                ItemOutcome::Skipped(SkipReason::Unchanged)
            }
            Decision::Locked => {
                warn!(
                    file = %file_name,
                    reason = file.lock_explanation.as_deref().unwrap_or_default(),
                    "file is locked; recording sidecar"
                );
                match write_lock_sidecar(file, &path) {
                    Ok(_) => ItemOutcome::Skipped(SkipReason::Locked),
                    Err(e) => {
                        error!(path = %lock_sidecar_path(&path).display(), error = %e, "failed to write lock sidecar");
                        ItemOutcome::Failed(e)
                    }
                }
            }
            decision @ (Decision::Create | Decision::Update) => {
                info!(file = %file_name, size = ?file.size, ?decision, "downloading");
                match store::download_to(self.lms, &file.url, &path) {
                    Ok(_) => ItemOutcome::Written(write_kind(decision)),
                    Err(e) => ItemOutcome::Failed(e),
                }
            }
        }
    }

    /// Rewrite assets in a page-like document and write it as `<title>.html` in `dir`.
    pub fn materialize_html(
        &self,
        doc: &HtmlDocument,
        dir: &Path,
        summary: &mut MirrorSummary,
    ) -> ItemOutcome {
        let file_name = normalize(&format!("{}.html", doc.title), true);
        let path = dir.join(&file_name);

        let rewrite = self.assets.rewrite(&doc.body, dir);
        summary.assets_fetched += rewrite.fetched;

        match ChangeDetector::for_content(&rewrite.html, &path) {
            Decision::Skip => {
                debug!(file = %file_name, bytes = rewrite.html.len(), "unchanged");
                ItemOutcome::Skipped(SkipReason::Unchanged)
            }
            decision => {
                info!(file = %file_name, bytes = rewrite.html.len(), ?decision, "writing page");
                match store::write_text(&path, &rewrite.html) {
                    Ok(()) => ItemOutcome::Written(write_kind(decision)),
                    Err(e) => ItemOutcome::Failed(e),
                }
            }
        }
    }
}

fn write_kind(decision: Decision) -> WriteKind {
    match decision {
        Decision::Update => WriteKind::Updated,
        _ => WriteKind::Created,
    }
}
