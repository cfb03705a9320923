//! 扫描配置.

use mpscan_core::{MpError, MpResult};

use crate::header::{MpegLayer, MpegVersion};
use crate::io::DEFAULT_WINDOW_SIZE;
use crate::tag::ID3V2_HEADER_SIZE;

/// 扫描配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// 目标 MPEG 版本, 其他版本的帧视为误匹配
    pub version: MpegVersion,
    /// 目标层, 其他层的帧视为误匹配
    pub layer: MpegLayer,
    /// 窗口缓冲区大小 (字节)
    pub buffer_size: usize,
}

impl Default for ScanConfig {
    /// MPEG-1 Layer III, 4 KB 窗口
    fn default() -> Self {
        Self {
            version: MpegVersion::Mpeg1,
            layer: MpegLayer::Layer3,
            buffer_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ScanConfig {
    /// 以指定目标版本和层创建, 其余取默认值
    pub fn new(version: MpegVersion, layer: MpegLayer) -> Self {
        Self {
            version,
            layer,
            ..Self::default()
        }
    }

    /// 设置窗口大小
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// 校验配置
    ///
    /// 窗口至少要容纳一个完整的 ID3v2 标签头.
    pub fn validate(&self) -> MpResult<()> {
        if self.buffer_size < ID3V2_HEADER_SIZE {
            return Err(MpError::InvalidArgument(format!(
                "窗口大小 {} 小于最小值 {ID3V2_HEADER_SIZE}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}
