//! One operation's stage-then-trigger workflow.
//!
//! A [`ConversionSession`] owns the staged files for one [`OperationKind`],
//! the trigger state and the configuration. Files are staged one at a time;
//! once enough are staged the trigger is enabled and [`ConversionSession::run`]
//! converts them, emitting each artifact as soon as the pipeline produces it.
//!
//! ```text
//!  stage ──▶ stage ──▶ … ──▶ run ──┬─▶ success: artifacts emitted, staging cleared
//!                                  └─▶ failure: failure notice, staging kept
//! ```
//!
//! The trigger goes busy for the duration of a run and is restored by a drop
//! guard, so it never stays busy after a failed or cancelled run. `run` takes
//! `&mut self`; a second run on the same session cannot start while one is
//! in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::capability::Capabilities;
use crate::config::{ConversionConfig, SplitMode};
use crate::convert::{report_failure, stats_for};
use crate::emit::OutputEmitter;
use crate::error::ConvertError;
use crate::output::ConversionOutput;
use crate::pipeline;
use crate::progress::{self, ProgressCallback};
use crate::stager::{Accepted, FileStager, OperationKind, RejectedReason, StagedFile};
use crate::stream::spawn_pipeline;

/// Label shown instead of the idle label while a merge has too few files.
pub const MERGE_NEEDS_MORE: &str = "Select at least 2 PDFs";

/// Read-only view of a session's trigger, shareable with a UI thread.
#[derive(Debug, Clone)]
pub struct TriggerWatch {
    kind: OperationKind,
    busy: Arc<AtomicBool>,
}

impl TriggerWatch {
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// The busy label while running, `None` otherwise.
    pub fn busy_label(&self) -> Option<&'static str> {
        self.is_busy().then(|| self.kind.busy_label())
    }
}

/// Marks the trigger busy until dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Staged files, trigger state and configuration for one operation.
pub struct ConversionSession {
    stager: FileStager,
    config: ConversionConfig,
    caps: Capabilities,
    busy: Arc<AtomicBool>,
}

impl ConversionSession {
    pub fn new(kind: OperationKind, config: ConversionConfig, caps: Capabilities) -> Self {
        Self {
            stager: FileStager::new(kind),
            config,
            caps,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.stager.kind()
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Replace the split mode, e.g. when the range text field changes.
    pub fn set_split_mode(&mut self, mode: SplitMode) {
        self.config.split_mode = mode;
    }

    fn progress(&self) -> ProgressCallback {
        progress::or_noop(self.config.progress_callback.as_ref())
    }

    /// Offer a file to the stager. Rejections leave the staged list as it was
    /// and carry the user-facing message.
    pub fn stage(&mut self, file: StagedFile) -> Result<Accepted, RejectedReason> {
        let name = file.name.clone();
        match self.stager.accept(file) {
            Ok(accepted) => {
                self.progress().on_file_staged(&name, accepted.index);
                Ok(accepted)
            }
            Err(reason) => {
                self.progress().on_file_rejected(&name, &reason.to_string());
                Err(reason)
            }
        }
    }

    pub fn staged(&self) -> &[StagedFile] {
        self.stager.files()
    }

    pub fn staged_count(&self) -> usize {
        self.stager.staged_count()
    }

    /// Drop every staged file.
    pub fn clear(&mut self) {
        self.stager.reset();
    }

    pub fn watch(&self) -> TriggerWatch {
        TriggerWatch {
            kind: self.kind(),
            busy: self.busy.clone(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_busy() && self.stager.is_ready()
    }

    pub fn trigger_label(&self) -> &'static str {
        let kind = self.kind();
        if self.is_busy() {
            kind.busy_label()
        } else if kind == OperationKind::MergeDoc && !self.stager.is_ready() {
            MERGE_NEEDS_MORE
        } else {
            kind.trigger_label()
        }
    }

    /// Convert the staged files, emitting artifacts into `emitter` in order.
    ///
    /// On success the staged list is cleared. On failure it is kept so the
    /// user can retry, and the progress callback receives the kind's failure
    /// notice. Artifacts emitted before a failure stay emitted.
    pub async fn run(
        &mut self,
        emitter: &mut dyn OutputEmitter,
    ) -> Result<ConversionOutput, ConvertError> {
        let kind = self.kind();
        if let Some(err) = self.stager.readiness_error() {
            warn!("{} triggered while not ready: {}", kind, err);
            return Err(err);
        }
        let files = self.stager.files().to_vec();
        if let Err(err) = pipeline::preflight(kind, &files, &self.config) {
            report_failure(kind, &self.config, &err);
            return Err(err);
        }

        let _busy = BusyGuard::engage(&self.busy);
        let start = Instant::now();
        let input_files = files.len();
        let mut task = spawn_pipeline(kind, files, &self.config, &self.caps);

        let mut artifacts = Vec::new();
        let mut emit_error = None;
        while let Some(artifact) = task.artifacts.recv().await {
            if let Err(e) = emitter.emit(&artifact) {
                emit_error = Some(e);
                break;
            }
            artifacts.push(artifact);
        }
        let outcome = task.finish().await;

        let units = match (outcome, emit_error) {
            (Ok((units, _)), None) => units,
            (_, Some(e)) | (Err(e), None) => {
                report_failure(kind, &self.config, &e);
                return Err(e);
            }
        };

        let stats = stats_for(input_files, units, &artifacts, start);
        info!(
            "{} complete: {} artifact(s) emitted in {}ms",
            kind, stats.artifacts, stats.duration_ms
        );
        self.progress().on_conversion_complete(kind, artifacts.len());
        self.stager.reset();

        Ok(ConversionOutput {
            kind,
            artifacts,
            stats,
        })
    }
}

impl std::fmt::Debug for ConversionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionSession")
            .field("kind", &self.kind())
            .field("staged", &self.stager.staged_count())
            .field("busy", &self.is_busy())
            .finish()
    }
}
