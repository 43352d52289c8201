//! The generation worker unit.
//!
//! One [`GenerationWorker::run`] call handles one job from start to finish:
//!
//! 1. `validating`: decode and validate [`GenerationParams`].
//! 2. `preparing_images`: load every input through the [`ImageSource`].
//! 3. `generating`: call [`RetryingClient::generate`] exactly once.
//!
//! Each stage is announced with a `status` message; the unit then sends
//! exactly one `result` or `error`.

use std::path::PathBuf;
use std::sync::Arc;

use genflow_client::{GenerateRequest, InlineImage, RetryingClient};
use genflow_core::outcome::{GenerationMetadata, GenerationOutput};
use genflow_core::params::GenerationParams;
use genflow_core::runner::{JobRunner, WorkerInput, WorkerOutbox};
use serde_json::json;

use crate::error::WorkerError;
use crate::image_source::{FileImageSource, ImageSource};

pub const STAGE_VALIDATING: &str = "validating";
pub const STAGE_PREPARING_IMAGES: &str = "preparing_images";
pub const STAGE_GENERATING: &str = "generating";

/// [`JobRunner`] for image-generation jobs.
#[derive(Clone)]
pub struct GenerationWorker {
    client: Arc<RetryingClient>,
    images: Arc<dyn ImageSource>,
}

impl GenerationWorker {
    /// Worker reading input images from the local filesystem.
    pub fn new(client: Arc<RetryingClient>) -> Self {
        Self::with_image_source(client, Arc::new(FileImageSource::new()))
    }

    pub fn with_image_source(client: Arc<RetryingClient>, images: Arc<dyn ImageSource>) -> Self {
        Self { client, images }
    }

    async fn execute(
        &self,
        input: &WorkerInput,
        outbox: &WorkerOutbox,
    ) -> Result<GenerationOutput, WorkerError> {
        outbox.status(json!({ "stage": STAGE_VALIDATING })).await;
        let params = GenerationParams::from_value(&input.params)?;
        params.validate()?;

        outbox
            .status(json!({
                "stage": STAGE_PREPARING_IMAGES,
                "count": params.images.len(),
            }))
            .await;
        let images = self.prepare_images(params.images.clone()).await?;

        outbox.status(json!({ "stage": STAGE_GENERATING })).await;
        let request =
            GenerateRequest::new(params.prompt.clone(), images).with_model(params.model.clone());
        let generated = self.client.generate(&request, &params.api_key).await?;

        Ok(GenerationOutput {
            images: generated.images,
            metadata: GenerationMetadata {
                model: generated.model,
                timestamp: chrono::Utc::now(),
                prompt: params.prompt,
            },
        })
    }

    /// Load all inputs on the blocking pool, preserving order.
    async fn prepare_images(&self, paths: Vec<PathBuf>) -> Result<Vec<InlineImage>, WorkerError> {
        let source = Arc::clone(&self.images);
        tokio::task::spawn_blocking(move || {
            paths
                .iter()
                .map(|path| source.load(path))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| WorkerError::Internal(format!("image preparation task failed: {e}")))?
        .map_err(WorkerError::from)
    }
}

#[async_trait::async_trait]
impl JobRunner for GenerationWorker {
    async fn run(&self, input: WorkerInput, outbox: WorkerOutbox) {
        let job_id = input.job_id;
        match self.execute(&input, &outbox).await {
            Ok(output) => {
                let image_count = output.images.len();
                match serde_json::to_value(&output) {
                    Ok(data) => {
                        tracing::info!(%job_id, image_count, "Generation job produced images");
                        outbox.result(data).await;
                    }
                    Err(e) => {
                        tracing::error!(%job_id, error = %e, "Failed to encode generation result");
                        outbox
                            .error(WorkerError::Internal(e.to_string()).to_string())
                            .await;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%job_id, kind = e.kind(), error = %e, "Generation job failed");
                outbox.error(e.to_string()).await;
            }
        }
    }
}
