//! 探测配置.
//!
//! 可从 JSON 文件加载, 各字段缺省时取默认值; 命令行参数优先于文件.

use anyhow::{Context, Result};
use mpscan_format::{MpegLayer, MpegVersion, ScanConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// 目标 MPEG 版本 ("1" / "2" / "2.5")
    #[serde(default = "default_mpeg_version")]
    pub mpeg_version: String,
    /// 目标层 ("1" / "2" / "3")
    #[serde(default = "default_layer")]
    pub layer: String,
    /// 窗口大小 (字节)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// 日志目录
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_mpeg_version() -> String {
    "1".to_string()
}

fn default_layer() -> String {
    "3".to_string()
}

fn default_buffer_size() -> usize {
    ScanConfig::default().buffer_size
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mpeg_version: default_mpeg_version(),
            layer: default_layer(),
            buffer_size: default_buffer_size(),
            log_dir: default_log_dir(),
        }
    }
}

impl ProbeConfig {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败, path={}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("解析配置文件失败, path={}", path.display()))
    }

    /// 转换为扫描配置
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let version: MpegVersion = self.mpeg_version.parse()?;
        let layer: MpegLayer = self.layer.parse()?;
        let config = ScanConfig::new(version, layer).with_buffer_size(self.buffer_size);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_默认值() {
        let config = ProbeConfig::default();
        assert_eq!(config.scan_config().unwrap(), ScanConfig::default());
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_部分字段缺省() {
        let config: ProbeConfig = serde_json::from_str(r#"{"layer": "2"}"#).unwrap();
        assert_eq!(config.mpeg_version, "1");
        let scan = config.scan_config().unwrap();
        assert_eq!(scan.layer, MpegLayer::Layer2);
        assert_eq!(scan.buffer_size, 4096);
    }

    #[test]
    fn test_从文件加载() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mpeg_version": "2.5", "buffer_size": 512, "log_dir": "/tmp/mpscan"}}"#
        )
        .unwrap();

        let config = ProbeConfig::load(file.path()).unwrap();
        let scan = config.scan_config().unwrap();
        assert_eq!(scan.version, MpegVersion::Mpeg25);
        assert_eq!(scan.layer, MpegLayer::Layer3);
        assert_eq!(scan.buffer_size, 512);
        assert_eq!(config.log_dir, "/tmp/mpscan");
    }

    #[test]
    fn test_无效配置() {
        let config = ProbeConfig {
            layer: "4".to_string(),
            ..ProbeConfig::default()
        };
        assert!(config.scan_config().is_err());

        let config = ProbeConfig {
            buffer_size: 2,
            ..ProbeConfig::default()
        };
        assert!(config.scan_config().is_err());
    }
}
