//! 统一错误类型定义.
//!
//! 扫描过程中只有底层 I/O 失败会作为真正的错误向上传播.
//! 损坏或未同步的字节由扫描器就地重新同步, 不会产生错误.

use thiserror::Error;

/// mpscan 统一错误类型
#[derive(Debug, Error)]
pub enum MpError {
    /// 底层读取或前向跳过失败, 扫描器此后不可再用
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据源已耗尽, 剩余字节不足以做出下一次判断
    #[error("已到达流末尾")]
    Eof,

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

impl MpError {
    /// 是否为流末尾
    pub fn is_eof(&self) -> bool {
        matches!(self, MpError::Eof)
    }
}

/// mpscan 统一 Result 类型
pub type MpResult<T> = Result<T, MpError>;
