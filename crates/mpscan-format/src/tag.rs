//! 元数据标签识别.
//!
//! 只识别标签起始位置并计算需要跳过的字节数, 不解析标签内容.
//!
//! ```text
//! ID3v1: "TAG" + 125 字节           (固定 128 字节)
//! ID3v2: "ID3" + 版本(2) + 标志(1) + 大小(4, syncsafe) + 标签体 [+ 10 字节尾部]
//! APE:   "APETAGEX" ...
//! ```

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder};

use crate::header::{self, HEADER_SIZE};

/// ID3v1 标识
pub const ID3V1_SIGNATURE: &[u8; 3] = b"TAG";
/// ID3v1 标签总大小
pub const ID3V1_SIZE: u64 = 128;
/// ID3v2 标识
pub const ID3V2_SIGNATURE: &[u8; 3] = b"ID3";
/// ID3v2 标签头大小 (尾部大小与之相同)
pub const ID3V2_HEADER_SIZE: usize = 10;
/// APE 标签前导码
pub const APE_SIGNATURE: &[u8; 8] = b"APETAGEX";

bitflags! {
    /// ID3v2 标签头标志位
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Id3v2Flags: u8 {
        /// 非同步化
        const UNSYNCHRONISATION = 0x80;
        /// 带扩展头
        const EXTENDED_HEADER   = 0x40;
        /// 实验性标签
        const EXPERIMENTAL      = 0x20;
        /// 带 10 字节尾部 (仅 ID3v2.4)
        const FOOTER            = 0x10;
    }
}

/// ID3v2 标签描述
///
/// 只保留跳过标签所需的头部字段, 标签体不解析.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Tag {
    /// 主版本号 (如 3 表示 ID3v2.3)
    pub major_version: u8,
    /// 修订号
    pub revision: u8,
    /// 标志位
    pub flags: Id3v2Flags,
    /// 标签体大小 (不含 10 字节头部)
    pub size: u32,
}

impl Id3v2Tag {
    /// 解析 10 字节标签头, 标识不匹配或长度不足时返回 `None`
    pub fn parse(header: &[u8]) -> Option<Self> {
        if header.len() < ID3V2_HEADER_SIZE || &header[0..3] != ID3V2_SIGNATURE {
            return None;
        }
        Some(Self {
            major_version: header[3],
            revision: header[4],
            flags: Id3v2Flags::from_bits_truncate(header[5]),
            size: decode_synchsafe(&[header[6], header[7], header[8], header[9]]),
        })
    }

    /// 是否带尾部
    pub fn has_footer(&self) -> bool {
        self.flags.contains(Id3v2Flags::FOOTER)
    }

    /// 从标识起始处算起需要跳过的总字节数
    pub fn total_size(&self) -> u64 {
        let footer = if self.has_footer() {
            ID3V2_HEADER_SIZE as u64
        } else {
            0
        };
        ID3V2_HEADER_SIZE as u64 + u64::from(self.size) + footer
    }
}

/// 解码 4 字节 syncsafe 整数 (每字节只用低 7 位, 大端)
pub fn decode_synchsafe(bytes: &[u8; 4]) -> u32 {
    let raw = BigEndian::read_u32(bytes);
    (raw & 0x7F)
        | ((raw >> 1) & (0x7F << 7))
        | ((raw >> 2) & (0x7F << 14))
        | ((raw >> 3) & (0x7F << 21))
}

/// 游标处的候选单元
///
/// 每个位置只判定一次, 优先级按变体声明顺序.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// 帧同步码, 需进一步解析帧头
    Frame,
    /// ID3v1 标签
    Id3v1,
    /// ID3v2 标签, 需读取完整 10 字节头部
    Id3v2,
    /// APE 标签 (整窗匹配, 尽力而为)
    Ape,
    /// 无法识别, 前进 1 字节重新同步
    Unrecognized,
}

/// 判定游标处的候选单元
///
/// - `prefix`: 游标处的 4 字节
/// - `window`: 当前整个已填充窗口, 仅用于 APE 匹配
///
/// APE 检测比较整个窗口与前导码, 只有标签恰好对齐一次填充边界时才会命中.
pub fn classify(prefix: &[u8; HEADER_SIZE], window: &[u8]) -> Candidate {
    if header::is_sync(prefix) {
        Candidate::Frame
    } else if &prefix[0..3] == ID3V1_SIGNATURE {
        Candidate::Id3v1
    } else if &prefix[0..3] == ID3V2_SIGNATURE {
        Candidate::Id3v2
    } else if window == APE_SIGNATURE {
        Candidate::Ape
    } else {
        Candidate::Unrecognized
    }
}
