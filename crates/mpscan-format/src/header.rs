//! MPEG 音频帧头解析.
//!
//! 帧头结构 (32 位):
//! ```text
//! AAAA AAAA  AAAB BCCD  EEEE FFGH  IIJJ KLMM
//! A = 同步位 (11 bit, 全1)   B = MPEG 版本    C = 层
//! D = CRC 保护              E = 比特率索引    F = 采样率索引
//! G = 填充位                H = 私有位        I = 声道模式
//! J = 模式扩展              K = 版权         L = 原始/复制
//! M = 强调
//! ```
//!
//! 任何保留值或无效字段都返回 `None`, 由调用方重新同步, 不视为错误.

use std::fmt;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use mpscan_core::MpError;

/// 帧头字节数
pub const HEADER_SIZE: usize = 4;

/// MPEG 音频版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
    /// MPEG-1
    Mpeg1,
    /// MPEG-2
    Mpeg2,
    /// MPEG-2.5
    Mpeg25,
}

/// MPEG 音频层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegLayer {
    /// Layer I
    Layer1,
    /// Layer II
    Layer2,
    /// Layer III
    Layer3,
}

/// 声道模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

/// 解码后的音频帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFrame {
    /// MPEG 版本
    pub version: MpegVersion,
    /// 层
    pub layer: MpegLayer,
    /// 比特率 (kbps)
    pub bitrate: u32,
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 是否有填充槽
    pub padding: bool,
    /// 帧头后是否跟随 CRC (不做校验)
    pub has_crc: bool,
    /// 声道模式
    pub channel_mode: ChannelMode,
    /// 帧总字节数 (含头部)
    pub frame_size: u32,
    /// 每帧采样数
    pub samples_per_frame: u32,
}

// 比特率表 (kbps), 索引 0 = free, 15 = bad
const BITRATE_V1_L1: [u32; 16] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0,
];
const BITRATE_V1_L2: [u32; 16] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0,
];
const BITRATE_V1_L3: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const BITRATE_V2_L1: [u32; 16] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0,
];
/// MPEG-2/2.5 Layer II 与 Layer III 共用
const BITRATE_V2_L23: [u32; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

// 采样率表 (Hz), 索引 3 保留
const SAMPLERATE_V1: [u32; 3] = [44100, 48000, 32000];
const SAMPLERATE_V2: [u32; 3] = [22050, 24000, 16000];
const SAMPLERATE_V25: [u32; 3] = [11025, 12000, 8000];

/// 前两个字节是否构成 11 位同步码
pub fn is_sync(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0
}

/// 解析 4 字节帧头
pub fn parse_frame_header(bytes: &[u8; HEADER_SIZE]) -> Option<AudioFrame> {
    if !is_sync(bytes) {
        return None;
    }
    let header = BigEndian::read_u32(bytes);

    // MPEG 版本 (bit 20-19)
    let version = match (header >> 19) & 0x03 {
        0 => MpegVersion::Mpeg25,
        2 => MpegVersion::Mpeg2,
        3 => MpegVersion::Mpeg1,
        _ => return None, // 1 = reserved
    };

    // 层 (bit 18-17)
    let layer = match (header >> 17) & 0x03 {
        1 => MpegLayer::Layer3,
        2 => MpegLayer::Layer2,
        3 => MpegLayer::Layer1,
        _ => return None, // 0 = reserved
    };

    let has_crc = ((header >> 16) & 1) == 0;

    // 比特率索引 (bit 15-12), free-format 不支持
    let br_idx = ((header >> 12) & 0x0F) as usize;
    let bitrate = match (version, layer) {
        (MpegVersion::Mpeg1, MpegLayer::Layer1) => BITRATE_V1_L1[br_idx],
        (MpegVersion::Mpeg1, MpegLayer::Layer2) => BITRATE_V1_L2[br_idx],
        (MpegVersion::Mpeg1, MpegLayer::Layer3) => BITRATE_V1_L3[br_idx],
        (_, MpegLayer::Layer1) => BITRATE_V2_L1[br_idx],
        (_, _) => BITRATE_V2_L23[br_idx],
    };
    if bitrate == 0 {
        return None;
    }

    // 采样率索引 (bit 11-10)
    let sr_idx = ((header >> 10) & 0x03) as usize;
    if sr_idx == 3 {
        return None;
    }
    let sample_rate = match version {
        MpegVersion::Mpeg1 => SAMPLERATE_V1[sr_idx],
        MpegVersion::Mpeg2 => SAMPLERATE_V2[sr_idx],
        MpegVersion::Mpeg25 => SAMPLERATE_V25[sr_idx],
    };

    let padding = (header >> 9) & 1 == 1;

    let channel_mode = match (header >> 6) & 0x03 {
        0 => ChannelMode::Stereo,
        1 => ChannelMode::JointStereo,
        2 => ChannelMode::DualChannel,
        _ => ChannelMode::Mono,
    };

    let samples_per_frame = match (version, layer) {
        (_, MpegLayer::Layer1) => 384,
        (_, MpegLayer::Layer2) => 1152,
        (MpegVersion::Mpeg1, MpegLayer::Layer3) => 1152,
        (_, MpegLayer::Layer3) => 576,
    };

    let frame_size = frame_length(version, layer, bitrate, sample_rate, padding);
    if frame_size < HEADER_SIZE as u32 {
        return None;
    }

    Some(AudioFrame {
        version,
        layer,
        bitrate,
        sample_rate,
        padding,
        has_crc,
        channel_mode,
        frame_size,
        samples_per_frame,
    })
}

/// 计算帧总字节数
///
/// Layer I 以 4 字节槽为单位, Layer II/III 以 1 字节为单位.
fn frame_length(
    version: MpegVersion,
    layer: MpegLayer,
    bitrate_kbps: u32,
    sample_rate: u32,
    padding: bool,
) -> u32 {
    let bps = bitrate_kbps * 1000;
    let pad = u32::from(padding);
    match layer {
        MpegLayer::Layer1 => (12 * bps / sample_rate + pad) * 4,
        MpegLayer::Layer2 => 144 * bps / sample_rate + pad,
        MpegLayer::Layer3 => {
            let factor = if version == MpegVersion::Mpeg1 { 144 } else { 72 };
            factor * bps / sample_rate + pad
        }
    }
}

impl fmt::Display for MpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MpegVersion::Mpeg1 => "MPEG-1",
            MpegVersion::Mpeg2 => "MPEG-2",
            MpegVersion::Mpeg25 => "MPEG-2.5",
        };
        f.write_str(name)
    }
}

impl fmt::Display for MpegLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MpegLayer::Layer1 => "Layer I",
            MpegLayer::Layer2 => "Layer II",
            MpegLayer::Layer3 => "Layer III",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelMode::Stereo => "Stereo",
            ChannelMode::JointStereo => "Joint Stereo",
            ChannelMode::DualChannel => "Dual Channel",
            ChannelMode::Mono => "Mono",
        };
        f.write_str(name)
    }
}

impl FromStr for MpegVersion {
    type Err = MpError;

    /// 接受 "1" / "2" / "2.5", 可带 "mpeg" 前缀
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .trim_start_matches("mpeg")
            .trim_start_matches(['-', ' ']);
        match digits {
            "1" => Ok(MpegVersion::Mpeg1),
            "2" => Ok(MpegVersion::Mpeg2),
            "2.5" | "25" => Ok(MpegVersion::Mpeg25),
            _ => Err(MpError::InvalidArgument(format!("未知的 MPEG 版本: {s}"))),
        }
    }
}

impl FromStr for MpegLayer {
    type Err = MpError;

    /// 接受 "1" / "2" / "3" 或罗马数字, 可带 "layer" 前缀
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower.trim_start_matches("layer").trim_start();
        match digits {
            "1" | "i" => Ok(MpegLayer::Layer1),
            "2" | "ii" => Ok(MpegLayer::Layer2),
            "3" | "iii" => Ok(MpegLayer::Layer3),
            _ => Err(MpError::InvalidArgument(format!("未知的 MPEG 层: {s}"))),
        }
    }
}
