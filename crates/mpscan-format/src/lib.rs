//! # mpscan-format
//!
//! 不解码音频的 MPEG 音频流扫描库.
//!
//! 在只能前向移动的字节流上同步到 MPEG 帧头, 跳过 ID3/APE 标签,
//! 汇总版本、层、比特率、采样率、VBR 与帧数等信息.
//!
//! ```rust,no_run
//! use mpscan_format::inspect_file;
//!
//! let info = inspect_file("song.mp3")?;
//! println!("{} 帧, {} kbps, VBR: {}", info.frame_count, info.bitrate, info.is_vbr);
//! # Ok::<(), mpscan_core::MpError>(())
//! ```

pub mod config;
pub mod header;
pub mod inspect;
pub mod io;
pub mod scanner;
pub mod stats;
pub mod tag;

// 重导出常用类型
pub use config::ScanConfig;
pub use header::{AudioFrame, ChannelMode, MpegLayer, MpegVersion};
pub use inspect::{inspect, inspect_file, inspect_reader};
pub use io::{ByteWindow, IoBackend};
pub use scanner::{ScanState, ScannedFrame, Scanner};
pub use stats::Mp3Info;
pub use tag::{Id3v2Flags, Id3v2Tag};
