use crate::utils::error::WayangError;
use crate::Result;
use std::fs;
use std::path::Path;

/// 类别标签表，每行一个角色名
#[derive(Debug, Clone)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    /// 从标签文件加载
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WayangError::ModelLoad(format!(
                "Label file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| WayangError::ModelLoad(format!("Failed to read label file: {}", e)))?;

        let labels = Self::parse(&content)?;
        tracing::info!("Loaded {} class labels from {}", labels.len(), path.display());

        Ok(labels)
    }

    /// 解析标签文本，跳过空行
    pub fn parse(content: &str) -> Result<Self> {
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(WayangError::ModelLoad(
                "Label file contains no class names".to_string(),
            ));
        }

        Ok(Self { names })
    }

    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAYANG_LABELS: &str = "Abimanyu\nAntasena\nArjuna\nBagong\nBima\nCepot\nGareng\n\
                                 Gatot Kaca\nHanoman\nKresna\nNakula\nPetruk\nSemar\nYudhistira\n";

    #[test]
    fn parses_all_fourteen_characters() {
        let labels = Labels::parse(WAYANG_LABELS).unwrap();
        assert_eq!(labels.len(), 14);
        assert_eq!(labels.get(0), Some("Abimanyu"));
        assert_eq!(labels.get(7), Some("Gatot Kaca"));
        assert_eq!(labels.get(13), Some("Yudhistira"));
        assert_eq!(labels.get(14), None);
    }

    #[test]
    fn blank_lines_and_whitespace_are_skipped() {
        let labels = Labels::parse("Semar\n\n  Cepot  \n\n").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(1), Some("Cepot"));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(Labels::parse("").is_err());
        assert!(Labels::parse("\n\n  \n").is_err());
    }
}
