//! Streaming conversion API: yield artifacts as they are produced.
//!
//! Splitting a long PDF or rasterising it page by page produces many
//! artifacts. [`convert_stream`] hands each one over the moment the pipeline
//! emits it, so callers can write files or update a UI without buffering the
//! whole run. Items arrive in strict emission order.

use std::pin::Pin;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

use crate::capability::Capabilities;
use crate::config::ConversionConfig;
use crate::convert::report_failure;
use crate::error::ConvertError;
use crate::output::Artifact;
use crate::pipeline;
use crate::progress;
use crate::stager::{OperationKind, StagedFile};

/// A boxed stream of artifacts.
pub type ArtifactStream = Pin<Box<dyn Stream<Item = Result<Artifact, ConvertError>> + Send>>;

/// Artifacts buffered ahead of a slow consumer.
const CHANNEL_CAPACITY: usize = 4;

/// A pipeline running on a blocking thread.
pub(crate) struct PipelineTask {
    pub artifacts: mpsc::Receiver<Artifact>,
    /// Resolves to `(units, artifacts_sent)` once the pipeline returns.
    pub done: JoinHandle<Result<(usize, usize), ConvertError>>,
}

impl PipelineTask {
    /// Wait for the pipeline to return.
    pub async fn finish(self) -> Result<(usize, usize), ConvertError> {
        drop(self.artifacts);
        join(self.done).await
    }
}

async fn join(done: JoinHandle<Result<(usize, usize), ConvertError>>) -> Result<(usize, usize), ConvertError> {
    done.await
        .map_err(|e| ConvertError::Internal(format!("conversion task panicked: {e}")))?
}

/// Start `kind` on a blocking thread. The caller has already run
/// [`pipeline::preflight`] and owns reporting the outcome.
pub(crate) fn spawn_pipeline(
    kind: OperationKind,
    files: Vec<StagedFile>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> PipelineTask {
    let (tx, rx) = mpsc::channel::<Artifact>(CHANNEL_CAPACITY);
    let cfg = config.clone();
    let caps = caps.clone();

    let done = tokio::task::spawn_blocking(move || {
        let mut sent = 0;
        let units = pipeline::run_blocking(kind, &files, &cfg, &caps, &mut |artifact| {
            tx.blocking_send(artifact)
                .map_err(|_| ConvertError::Internal("artifact receiver dropped".into()))?;
            sent += 1;
            Ok(())
        })?;
        debug!("{} finished: {} unit(s), {} artifact(s)", kind, units, sent);
        Ok((units, sent))
    });

    PipelineTask {
        artifacts: rx,
        done,
    }
}

/// Run `kind` over `files`, streaming artifacts as they are ready.
///
/// Must be called from within a tokio runtime.
///
/// # Returns
/// - `Ok(ArtifactStream)`: artifacts in order; a pipeline failure is the
///   last item, after every artifact emitted before it
/// - `Err(ConvertError)`: validation failed and nothing was started; the
///   failure notice has already gone to the progress callback
///
/// # Example
/// ```rust,no_run
/// use docshift::{convert_stream, stage_all, Capabilities, ConversionConfig, OperationKind};
/// use docshift::pipeline::input::load_input;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pdf = load_input("report.pdf", 120).await?;
/// let files = stage_all(OperationKind::SplitDoc, vec![pdf])?;
/// let mut stream = convert_stream(
///     OperationKind::SplitDoc,
///     files,
///     &ConversionConfig::default(),
///     &Capabilities::native(),
/// )?;
/// while let Some(item) = stream.next().await {
///     let artifact = item?;
///     println!("{} ({} bytes)", artifact.filename, artifact.len());
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    kind: OperationKind,
    files: Vec<StagedFile>,
    config: &ConversionConfig,
    caps: &Capabilities,
) -> Result<ArtifactStream, ConvertError> {
    if let Err(err) = pipeline::preflight(kind, &files, config) {
        report_failure(kind, config, &err);
        return Err(err);
    }
    info!("Starting streaming {} over {} file(s)", kind, files.len());

    let PipelineTask { artifacts, done } = spawn_pipeline(kind, files, config, caps);
    let cfg = config.clone();

    let outcome = stream::once(async move {
        match join(done).await {
            Ok((_, sent)) => {
                progress::or_noop(cfg.progress_callback.as_ref()).on_conversion_complete(kind, sent);
                None
            }
            Err(e) => {
                report_failure(kind, &cfg, &e);
                Some(Err(e))
            }
        }
    })
    .filter_map(|item| async move { item });

    Ok(Box::pin(ReceiverStream::new(artifacts).map(Ok).chain(outcome)))
}
