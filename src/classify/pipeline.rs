use crate::{
    classify::{ClassifyOptions, ClassifyResult, ConfidenceBand, ModelInfo, Prediction},
    image::ImageLoader,
    models::{ModelKind, ModelManager},
    utils::error::WayangError,
    Result,
};
use ndarray::Array3;
use std::time::Instant;

/// 分类处理流水线
pub struct ClassifyPipeline;

impl ClassifyPipeline {
    /// 处理base64图像
    pub async fn process_base64(base64_data: &str, options: ClassifyOptions) -> Result<ClassifyResult> {
        let start_time = Instant::now();
        let manager = ModelManager::instance()?;
        let max_bytes = manager.config().server_config.max_request_size;

        let image = ImageLoader::from_base64(base64_data, max_bytes)?;
        let image_array = ImageLoader::preprocess(image)?;

        Self::process_image_array(image_array, options, start_time).await
    }

    /// 处理字节流图像
    pub async fn process_bytes(bytes: axum::body::Bytes, options: ClassifyOptions) -> Result<ClassifyResult> {
        let start_time = Instant::now();
        let manager = ModelManager::instance()?;
        let max_bytes = manager.config().server_config.max_request_size;

        let image = ImageLoader::from_bytes(&bytes, max_bytes)?;
        let image_array = ImageLoader::preprocess(image)?;

        Self::process_image_array(image_array, options, start_time).await
    }

    /// 核心处理流程：对每个选中的模型跑一次推理
    async fn process_image_array(
        image: Array3<f32>,
        options: ClassifyOptions,
        start_time: Instant,
    ) -> Result<ClassifyResult> {
        let kinds = Self::dedup_models(&options.models);

        if kinds.is_empty() {
            return Err(WayangError::InvalidInput(
                "No model selected, pick at least one classifier".to_string(),
            ));
        }

        let manager = ModelManager::instance()?;
        let mut predictions = Vec::with_capacity(kinds.len());

        for kind in kinds {
            let classifier = manager.classifier(kind)?;

            let model_start = Instant::now();
            let (label, confidence) = classifier.predict(&image)?;

            tracing::info!(
                "{} predicted '{}' ({:.3}) in {:.3}s",
                kind.display_name(),
                label,
                confidence,
                model_start.elapsed().as_secs_f32()
            );

            predictions.push(Prediction {
                model: kind.id().to_string(),
                model_name: kind.display_name().to_string(),
                label,
                confidence,
                verdict: ConfidenceBand::from_score(confidence),
            });
        }

        let stats = manager.get_stats();
        let total_time = start_time.elapsed();

        tracing::info!(
            "Classification completed: models={}, total_time={:.3}s",
            predictions.len(),
            total_time.as_secs_f32()
        );

        Ok(ClassifyResult {
            processing_time: total_time.as_secs_f32(),
            predictions,
            model_info: Some(ModelInfo {
                models_loaded: stats.loaded_models,
                num_classes: stats.num_classes,
            }),
        })
    }

    /// 去重但保持请求中的顺序
    fn dedup_models(models: &[ModelKind]) -> Vec<ModelKind> {
        let mut kinds: Vec<ModelKind> = Vec::with_capacity(models.len());
        for &kind in models {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}
