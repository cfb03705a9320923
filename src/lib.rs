//! # mpscan
//!
//! 不解码音频的 MPEG 音频流扫描工具.
//!
//! 在任意大小、只能前向移动的字节流上同步到 MPEG 帧头,
//! 跳过 ID3v1/ID3v2/APE 标签, 汇总以下信息:
//! - **格式**: 出现过的 MPEG 版本与层
//! - **码率**: 标称比特率、平均比特率、VBR 检测
//! - **其他**: 采样率、帧数、估算时长、ID3v2 标签头
//!
//! # 快速开始
//!
//! ```rust,no_run
//! let info = mpscan::inspect_file("song.mp3")?;
//! println!("{} 帧, {} kbps, {:.1} 秒", info.frame_count, info.bitrate, info.duration().as_secs_f64());
//! # Ok::<(), mpscan::core::MpError>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `mpscan-core` | 错误类型 |
//! | `mpscan-format` | 字节窗口、帧头解析、标签识别、扫描器、汇总 |

/// 错误类型
pub use mpscan_core as core;

/// 扫描框架
pub use mpscan_format as format;

pub use mpscan_format::{Mp3Info, ScanConfig, Scanner, inspect, inspect_file, inspect_reader};

/// 获取 mpscan 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
