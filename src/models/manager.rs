use crate::models::{CharacterClassifier, Labels, ModelKind};
use crate::utils::error::WayangError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 全局模型管理器单例
pub struct ModelManager {
    efficientnet: Arc<CharacterClassifier>,
    mobilenet: Arc<CharacterClassifier>,
    deit: Option<Arc<CharacterClassifier>>,
    labels: Arc<Labels>,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器，进程启动时调用一次
    pub fn init(config: Config) -> Result<()> {
        tracing::info!("Initializing model manager...");

        let labels = Arc::new(Labels::load(&config.labels_path())?);

        let efficientnet = Arc::new(CharacterClassifier::new(
            &config,
            ModelKind::EfficientNetV2S,
            Arc::clone(&labels),
        )?);
        let mobilenet = Arc::new(CharacterClassifier::new(
            &config,
            ModelKind::MobileNetV3Large,
            Arc::clone(&labels),
        )?);

        // DeiT检查点是可选的
        let deit = if config.model_path(ModelKind::DeitSmall).exists() {
            match CharacterClassifier::new(&config, ModelKind::DeitSmall, Arc::clone(&labels)) {
                Ok(model) => {
                    tracing::info!("DeiT-Small model loaded successfully");
                    Some(Arc::new(model))
                }
                Err(e) => {
                    tracing::warn!("Failed to load DeiT-Small model: {}", e);
                    None
                }
            }
        } else {
            tracing::info!("DeiT-Small model not found, serving without it");
            None
        };

        let manager = ModelManager {
            efficientnet,
            mobilenet,
            deit,
            labels,
            config,
        };

        MODEL_MANAGER
            .set(Arc::new(manager))
            .map_err(|_| WayangError::Internal("Model manager already initialized".to_string()))?;

        tracing::info!("Model manager initialized successfully");
        Ok(())
    }

    /// 获取全局模型管理器实例
    pub fn instance() -> Result<Arc<ModelManager>> {
        MODEL_MANAGER
            .get()
            .cloned()
            .ok_or_else(|| WayangError::Internal("Model manager not initialized".to_string()))
    }

    /// 按模型种类获取分类器
    pub fn classifier(&self, kind: ModelKind) -> Result<Arc<CharacterClassifier>> {
        match kind {
            ModelKind::EfficientNetV2S => Ok(Arc::clone(&self.efficientnet)),
            ModelKind::MobileNetV3Large => Ok(Arc::clone(&self.mobilenet)),
            ModelKind::DeitSmall => self
                .deit
                .as_ref()
                .map(Arc::clone)
                .ok_or_else(|| WayangError::ModelNotAvailable(kind.id().to_string())),
        }
    }

    /// 当前已加载的模型列表
    pub fn available(&self) -> Vec<ModelKind> {
        let mut kinds = vec![ModelKind::EfficientNetV2S, ModelKind::MobileNetV3Large];
        if self.deit.is_some() {
            kinds.push(ModelKind::DeitSmall);
        }
        kinds
    }

    pub fn labels(&self) -> Arc<Labels> {
        Arc::clone(&self.labels)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查：标签表非空，所有已加载模型的文件仍在磁盘上
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        if self.labels.is_empty() {
            return Err(WayangError::Internal("Label table is empty".to_string()));
        }

        for kind in self.available() {
            let path = self.config.model_path(kind);
            if !path.exists() {
                return Err(WayangError::ModelLoad(format!(
                    "{} model file missing: {}",
                    kind.display_name(),
                    path.display()
                )));
            }
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            loaded_models: self
                .available()
                .iter()
                .map(|kind| kind.id().to_string())
                .collect(),
            num_classes: self.labels.len(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub loaded_models: Vec<String>,
    pub num_classes: usize,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

/// 便捷函数：按种类获取分类器
pub fn get_classifier(kind: ModelKind) -> Result<Arc<CharacterClassifier>> {
    ModelManager::instance()?.classifier(kind)
}

/// 便捷函数：获取标签表
pub fn get_labels() -> Result<Arc<Labels>> {
    Ok(ModelManager::instance()?.labels())
}

/// 便捷函数：检查模型健康状态
pub fn health_check() -> Result<()> {
    ModelManager::instance()?.health_check()
}

/// 便捷函数：获取模型统计信息
pub fn get_model_stats() -> Result<ModelStats> {
    Ok(ModelManager::instance()?.get_stats())
}
