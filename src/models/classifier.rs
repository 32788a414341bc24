use crate::image::ImagePreprocessor;
use crate::models::Labels;
use crate::utils::error::WayangError;
use crate::{Config, Result};
use ndarray::{Array3, Array4};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 可用的分类模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "efficientnetv2s", alias = "efficientnet")]
    EfficientNetV2S,
    #[serde(rename = "mobilenetv3large", alias = "mobilenet")]
    MobileNetV3Large,
    #[serde(rename = "deit_small", alias = "deit")]
    DeitSmall,
}

impl ModelKind {
    pub fn all() -> [ModelKind; 3] {
        [
            ModelKind::EfficientNetV2S,
            ModelKind::MobileNetV3Large,
            ModelKind::DeitSmall,
        ]
    }

    /// API中使用的稳定标识
    pub fn id(&self) -> &'static str {
        match self {
            ModelKind::EfficientNetV2S => "efficientnetv2s",
            ModelKind::MobileNetV3Large => "mobilenetv3large",
            ModelKind::DeitSmall => "deit_small",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::EfficientNetV2S => "EfficientNetV2S",
            ModelKind::MobileNetV3Large => "MobileNetV3Large",
            ModelKind::DeitSmall => "DeiT-Small",
        }
    }

    /// 该模型导出的是logits还是softmax概率
    ///
    /// Keras检查点带softmax输出头，DeiT导出的是原始logits，
    /// 由服务端负责softmax。
    pub fn emits_logits(&self) -> bool {
        matches!(self, ModelKind::DeitSmall)
    }

    /// 按模型家族分派预处理
    fn preprocess(&self, image: &Array3<f32>) -> Result<Array4<f32>> {
        match self {
            ModelKind::EfficientNetV2S | ModelKind::MobileNetV3Large => {
                ImagePreprocessor::for_keras(image)
            }
            ModelKind::DeitSmall => ImagePreprocessor::for_deit(image),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = WayangError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "efficientnetv2s" | "efficientnet" => Ok(ModelKind::EfficientNetV2S),
            "mobilenetv3large" | "mobilenet" => Ok(ModelKind::MobileNetV3Large),
            "deit_small" | "deit" => Ok(ModelKind::DeitSmall),
            other => Err(WayangError::InvalidInput(format!(
                "Unknown model '{}'. Available models: efficientnetv2s, mobilenetv3large, deit_small",
                other
            ))),
        }
    }
}

/// 单个角色分类模型的推理封装
pub struct CharacterClassifier {
    session: Arc<Mutex<Session>>,
    kind: ModelKind,
    input_name: String,
    output_name: String,
    labels: Arc<Labels>,
}

impl CharacterClassifier {
    pub fn new(config: &Config, kind: ModelKind, labels: Arc<Labels>) -> Result<Self> {
        let model_path = config.model_path(kind);

        if !model_path.exists() {
            return Err(WayangError::ModelLoad(format!(
                "{} model not found: {}",
                kind.display_name(),
                model_path.display()
            )));
        }

        tracing::info!(
            "Loading {} model from: {}",
            kind.display_name(),
            model_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::from)?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        // 动态发现输入输出名称
        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| {
                WayangError::ModelLoad(format!("{} model has no inputs", kind.display_name()))
            })?;

        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| {
                WayangError::ModelLoad(format!("{} model has no outputs", kind.display_name()))
            })?;

        tracing::info!(
            "{} model I/O: input '{}', output '{}'",
            kind.display_name(),
            input_name,
            output_name
        );

        for (i, output) in session.outputs().iter().enumerate() {
            tracing::debug!("{} output[{}]: '{}'", kind.id(), i, output.name());
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            kind,
            input_name,
            output_name,
            labels,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// 对单张图像运行分类，返回 (标签, 置信度)
    pub fn predict(&self, image: &Array3<f32>) -> Result<(String, f32)> {
        let input_tensor = self.kind.preprocess(image)?;

        let input_tensor = Tensor::from_array(input_tensor)?;
        let predictions = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(WayangError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        // 期望 [1, num_classes] 或 [num_classes]
        let mut scores: Vec<f32> = match predictions.ndim() {
            2 => {
                let shape = predictions.shape();
                if shape[0] != 1 {
                    return Err(WayangError::Inference(format!(
                        "Expected batch size 1, got {}",
                        shape[0]
                    )));
                }
                predictions.iter().copied().collect()
            }
            1 => predictions.iter().copied().collect(),
            ndim => {
                return Err(WayangError::Inference(format!(
                    "Expected 1D or 2D score tensor, got {}D",
                    ndim
                )));
            }
        };

        if self.kind.emits_logits() {
            softmax(&mut scores);
        }

        if scores.len() != self.labels.len() {
            tracing::warn!(
                "{} output width ({}) != label count ({})",
                self.kind.display_name(),
                scores.len(),
                self.labels.len()
            );
        }

        let (best_idx, confidence) = argmax(&scores).ok_or_else(|| {
            WayangError::Inference(format!(
                "{} produced an empty score vector",
                self.kind.display_name()
            ))
        })?;

        let label = self.labels.get(best_idx).ok_or_else(|| {
            WayangError::Inference(format!(
                "Predicted class index {} out of label bounds ({})",
                best_idx,
                self.labels.len()
            ))
        })?;

        tracing::debug!(
            "{}: label='{}', confidence={:.4}",
            self.kind.id(),
            label,
            confidence
        );

        Ok((label.to_string(), confidence))
    }
}

/// 数值稳定的就地softmax
pub(crate) fn softmax(scores: &mut [f32]) {
    if scores.is_empty() {
        return;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;

    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }

    for score in scores.iter_mut() {
        *score /= sum;
    }
}

/// 返回最大分量的 (索引, 值)
pub(crate) fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
}
