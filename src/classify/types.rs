use crate::models::ModelKind;
use serde::{Deserialize, Serialize};

/// 分类请求选项
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyOptions {
    /// 参与预测的模型，按给定顺序执行
    #[serde(default = "default_models")]
    pub models: Vec<ModelKind>,
}

fn default_models() -> Vec<ModelKind> {
    vec![ModelKind::EfficientNetV2S]
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            models: default_models(),
        }
    }
}

/// 置信度档位，对应界面上的提示语
///
/// > 0.9 非常确定, > 0.7 比较确定, 其余视为不确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    VeryConfident,
    FairlyConfident,
    Uncertain,
}

impl ConfidenceBand {
    pub fn from_score(confidence: f32) -> Self {
        if confidence > 0.9 {
            ConfidenceBand::VeryConfident
        } else if confidence > 0.7 {
            ConfidenceBand::FairlyConfident
        } else {
            ConfidenceBand::Uncertain
        }
    }
}

/// 单个模型的预测结果
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// 模型标识
    pub model: String,
    /// 模型显示名称
    pub model_name: String,
    /// 预测的角色名
    pub label: String,
    /// 置信度分数 (0.0 - 1.0)
    pub confidence: f32,
    /// 置信度档位
    pub verdict: ConfidenceBand,
}

/// 完整的分类处理结果
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResult {
    /// 处理耗时（秒）
    pub processing_time: f32,
    /// 每个选中模型一条预测
    pub predictions: Vec<Prediction>,
    /// 模型信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

/// 模型信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// 已加载的模型标识
    pub models_loaded: Vec<String>,
    /// 类别数量
    pub num_classes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_is_efficientnet_only() {
        let options = ClassifyOptions::default();
        assert_eq!(options.models, vec![ModelKind::EfficientNetV2S]);
    }

    #[test]
    fn confidence_bands_match_ui_thresholds() {
        assert_eq!(ConfidenceBand::from_score(0.95), ConfidenceBand::VeryConfident);
        assert_eq!(ConfidenceBand::from_score(0.8), ConfidenceBand::FairlyConfident);
        assert_eq!(ConfidenceBand::from_score(0.5), ConfidenceBand::Uncertain);

        // 阈值本身不算入更高档位
        assert_eq!(ConfidenceBand::from_score(0.9), ConfidenceBand::FairlyConfident);
        assert_eq!(ConfidenceBand::from_score(0.7), ConfidenceBand::Uncertain);
    }

    #[test]
    fn verdict_serializes_in_snake_case() {
        let json = serde_json::to_string(&ConfidenceBand::VeryConfident).unwrap();
        assert_eq!(json, "\"very_confident\"");
    }

    #[test]
    fn options_deserialize_with_default_models() {
        let options: ClassifyOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.models, vec![ModelKind::EfficientNetV2S]);

        let options: ClassifyOptions =
            serde_json::from_str(r#"{"models":["deit_small","mobilenet"]}"#).unwrap();
        assert_eq!(
            options.models,
            vec![ModelKind::DeitSmall, ModelKind::MobileNetV3Large]
        );
    }
}
