use crate::models::ModelKind;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,

    /// 启用图优化
    pub enable_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 最大并发连接数
    pub max_connections: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
            enable_optimization: true,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
            max_connections: if dev_mode { 10 } else { 1000 },
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
        })
    }

    /// 获取指定模型的文件路径
    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        match kind {
            ModelKind::EfficientNetV2S => self.models_dir.join("wayang_efficientnetv2s.onnx"),
            ModelKind::MobileNetV3Large => self.models_dir.join("wayang_mobilenetv3large.onnx"),
            ModelKind::DeitSmall => self.models_dir.join("wayang_deit_small.onnx"),
        }
    }

    /// 获取类别标签文件路径
    pub fn labels_path(&self) -> PathBuf {
        self.models_dir.join("wayang_labels.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::new("127.0.0.1:8501".to_string(), "models".to_string(), None, false).unwrap()
    }

    #[test]
    fn model_paths_are_distinct_per_kind() {
        let config = test_config();
        let paths: Vec<_> = ModelKind::all()
            .iter()
            .map(|&kind| config.model_path(kind))
            .collect();

        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.extension().unwrap() == "onnx"));
        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[1], paths[2]);
    }

    #[test]
    fn labels_path_lives_in_models_dir() {
        let config = test_config();
        assert!(config.labels_path().starts_with("models"));
        assert!(config.labels_path().ends_with("wayang_labels.txt"));
    }

    #[test]
    fn intra_threads_is_at_least_one() {
        let config = test_config();
        assert!(config.onnx_config.intra_threads >= 1);
    }
}
