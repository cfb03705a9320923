//! I/O 抽象层.
//!
//! 以固定容量的滑动窗口呈现任意长度的字节流.
//! 数据源只需支持顺序读取和前向跳过, 不要求随机访问.

use std::io::{self, Read, Seek, SeekFrom};

use mpscan_core::{MpError, MpResult};

/// I/O 后端 trait
///
/// 实现此 trait 以支持不同的数据来源 (文件、内存、管道等).
pub trait IoBackend: Send {
    /// 读取数据到缓冲区, 返回 0 表示已到达流末尾
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 从当前位置向前跳过最多 `count` 字节 (永不后退), 返回实际跳过的字节数
    ///
    /// 跳过超出流末尾不是错误, 在末尾停下并返回较小的值.
    fn skip_forward(&mut self, count: u64) -> io::Result<u64>;
}

/// 默认窗口大小 (4 KB)
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// 字节窗口
///
/// 在固定容量的缓冲区上维护读取游标, 并记录游标在整个流中的绝对位置.
///
/// ```text
/// buffer: [ 已消耗 | 未读 (buf_pos..buf_len) | 空闲 ]
///                  ^ 游标
/// position() = stream_pos - (buf_len - buf_pos)
/// ```
pub struct ByteWindow {
    /// 底层数据源
    inner: Box<dyn IoBackend>,
    /// 窗口缓冲区
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 游标 (缓冲区当前读取位置)
    buf_pos: usize,
    /// 已从数据源取走 (读取或跳过) 的字节总数
    stream_pos: u64,
}

impl ByteWindow {
    /// 使用默认窗口大小创建
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self::with_capacity(backend, DEFAULT_WINDOW_SIZE)
    }

    /// 使用指定窗口大小创建
    pub fn with_capacity(backend: Box<dyn IoBackend>, capacity: usize) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; capacity],
            buf_len: 0,
            buf_pos: 0,
            stream_pos: 0,
        }
    }

    /// 保证游标处至少有 `count` 个未读字节
    ///
    /// 不足时先把未读数据移到缓冲区开头, 再从数据源读取直到满足要求.
    /// 数据源耗尽时返回 [`MpError::Eof`], 已缓冲的数据保持不变.
    pub fn ensure(&mut self, count: usize) -> MpResult<()> {
        if self.remaining() >= count {
            return Ok(());
        }
        if count > self.buffer.len() {
            return Err(MpError::InvalidArgument(format!(
                "请求 {count} 字节超出窗口容量 {}",
                self.buffer.len()
            )));
        }

        self.buffer.copy_within(self.buf_pos..self.buf_len, 0);
        self.buf_len -= self.buf_pos;
        self.buf_pos = 0;

        while self.buf_len < count {
            let n = match self.inner.read(&mut self.buffer[self.buf_len..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                return Err(MpError::Eof);
            }
            self.buf_len += n;
            self.stream_pos += n as u64;
        }
        Ok(())
    }

    /// 跳过指定字节数
    ///
    /// 落在已缓冲区域内时只移动游标, 否则丢弃缓冲区并对数据源发起一次前向跳过,
    /// 下一次 [`ensure`](Self::ensure) 从新位置重新填充.
    /// 越过流末尾时位置停在末尾.
    pub fn skip(&mut self, count: u64) -> MpResult<()> {
        let buffered = self.remaining() as u64;
        if count <= buffered {
            self.buf_pos += count as usize;
            return Ok(());
        }

        let beyond = count - buffered;
        self.buf_pos = 0;
        self.buf_len = 0;
        self.stream_pos += self.inner.skip_forward(beyond)?;
        Ok(())
    }

    /// 游标处的未读数据
    pub fn unread(&self) -> &[u8] {
        &self.buffer[self.buf_pos..self.buf_len]
    }

    /// 在未读数据内前移游标
    ///
    /// 调用方须先通过 [`ensure`](Self::ensure) 保证数据已缓冲.
    pub fn consume(&mut self, count: usize) {
        debug_assert!(count <= self.remaining(), "consume 超出已缓冲数据");
        self.buf_pos = (self.buf_pos + count).min(self.buf_len);
    }

    /// 当前整个已填充窗口 (含已消耗部分)
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[..self.buf_len]
    }

    /// 游标在整个流中的绝对位置
    pub fn position(&self) -> u64 {
        self.stream_pos - self.remaining() as u64
    }

    /// 未读字节数
    pub fn remaining(&self) -> usize {
        self.buf_len - self.buf_pos
    }
}

/// 文件 I/O 后端
pub struct FileBackend {
    file: std::fs::File,
}

impl FileBackend {
    /// 包装已打开的文件
    pub fn new(file: std::fs::File) -> Self {
        Self { file }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn skip_forward(&mut self, count: u64) -> io::Result<u64> {
        // 文件允许定位到末尾之后, 这里截断到当前长度
        let start = self.file.stream_position()?;
        let end = self.file.metadata()?.len().max(start);
        let target = start.saturating_add(count).min(end);
        self.file.seek(SeekFrom::Start(target))?;
        Ok(target - start)
    }
}

/// 顺序读取后端
///
/// 适配任意只能顺序读取的数据源 (标准输入、管道、解压流等),
/// 前向跳过通过读取并丢弃实现.
pub struct ReaderBackend<R> {
    reader: R,
}

impl<R: Read + Send> ReaderBackend<R> {
    /// 包装读取器
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read + Send> IoBackend for ReaderBackend<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn skip_forward(&mut self, count: u64) -> io::Result<u64> {
        io::copy(&mut (&mut self.reader).take(count), &mut io::sink())
    }
}

/// 内存缓冲区 I/O 后端
///
/// 用于测试和内存中处理. 可限制单次读取的最大字节数, 模拟分片到达的数据.
pub struct MemoryBackend {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
    /// 单次读取的最大字节数
    chunk_size: usize,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: usize::MAX,
        }
    }

    /// 从已有数据创建, 每次读取最多返回 `chunk_size` 字节
    pub fn with_chunk_size(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available).min(self.chunk_size);
        if to_read == 0 {
            return Ok(0);
        }
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn skip_forward(&mut self, count: u64) -> io::Result<u64> {
        let available = self.data.len().saturating_sub(self.pos);
        let skipped = usize::try_from(count).unwrap_or(usize::MAX).min(available);
        self.pos += skipped;
        Ok(skipped as u64)
    }
}
