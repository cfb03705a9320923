//! MPEG 音频帧同步扫描器.
//!
//! 在只能前向移动的字节流上逐字节同步到帧头, 跳过 ID3v1/ID3v2/APE 标签,
//! 每次调用产出一个通过校验的帧及其绝对偏移.
//!
//! 每个位置的处理:
//! ```text
//! 待跳过字节 > 0 ?  -> window.skip()
//! ensure(4)         -> Eof 时进入 Done
//! classify(4 字节)
//!   Frame         -> 解析成功且版本/层匹配: 产出帧, 待跳过 = 帧长
//!                    否则前进 1 字节
//!   Id3v1         -> 待跳过 = 128
//!   Id3v2         -> ensure(10), 待跳过 = 10 + 标签体 [+ 尾部]
//!   Ape           -> 前进 4 字节
//!   Unrecognized  -> 前进 1 字节
//! ```
//! 每次重新同步至少前进 1 字节, 纯噪声流也能在有限步内扫描到末尾.

use std::iter::FusedIterator;
use std::path::Path;

use log::{debug, trace};
use mpscan_core::{MpError, MpResult};

use crate::config::ScanConfig;
use crate::header::{self, AudioFrame, HEADER_SIZE, MpegLayer, MpegVersion};
use crate::io::{ByteWindow, FileBackend, IoBackend};
use crate::stats::Mp3Info;
use crate::tag::{self, Candidate, ID3V1_SIZE, ID3V2_HEADER_SIZE, Id3v2Tag};

/// 扫描得到的帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedFrame {
    /// 帧头信息
    pub frame: AudioFrame,
    /// 同步字节在流中的绝对偏移
    pub offset: u64,
}

/// 扫描器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// 正在寻找下一个有效单元
    Scanning,
    /// 已到达流末尾 (终态)
    Done,
}

/// 帧同步扫描器
///
/// 单线程使用. 底层 I/O 出错后不应继续使用该实例.
pub struct Scanner {
    /// 字节窗口
    window: ByteWindow,
    /// 目标 MPEG 版本
    version: MpegVersion,
    /// 目标层
    layer: MpegLayer,
    /// 下一步前需要跳过的字节数 (延迟到下次调用时执行)
    pending_skip: u64,
    /// 已产出的帧数
    frame_count: u64,
    /// 汇总信息
    info: Mp3Info,
    /// 状态
    state: ScanState,
}

impl Scanner {
    /// 在指定后端上创建扫描器
    pub fn new(backend: Box<dyn IoBackend>, config: &ScanConfig) -> MpResult<Self> {
        config.validate()?;
        debug!(
            "扫描器: 目标 {} {}, 窗口 {} 字节",
            config.version, config.layer, config.buffer_size
        );
        Ok(Self {
            window: ByteWindow::with_capacity(backend, config.buffer_size),
            version: config.version,
            layer: config.layer,
            pending_skip: 0,
            frame_count: 0,
            info: Mp3Info::default(),
            state: ScanState::Scanning,
        })
    }

    /// 创建寻找 MPEG-1 Layer III 帧的扫描器
    pub fn mp3(backend: Box<dyn IoBackend>) -> MpResult<Self> {
        Self::new(backend, &ScanConfig::default())
    }

    /// 打开文件并创建扫描器
    pub fn open(path: impl AsRef<Path>, config: &ScanConfig) -> MpResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::new(Box::new(FileBackend::new(file)), config)
    }

    /// 产出下一个有效帧
    ///
    /// 返回 `Ok(None)` 表示已到达流末尾, 之后的调用都返回 `Ok(None)`.
    pub fn next_frame(&mut self) -> MpResult<Option<ScannedFrame>> {
        if self.state == ScanState::Done {
            return Ok(None);
        }

        loop {
            if self.pending_skip > 0 {
                let skip = std::mem::take(&mut self.pending_skip);
                self.window.skip(skip)?;
            }

            match self.window.ensure(HEADER_SIZE) {
                Ok(()) => {}
                Err(MpError::Eof) => {
                    self.end_of_stream();
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }

            let mut prefix = [0u8; HEADER_SIZE];
            prefix.copy_from_slice(&self.window.unread()[..HEADER_SIZE]);

            match tag::classify(&prefix, self.window.buffered()) {
                Candidate::Frame => {
                    if let Some(scanned) = self.accept_frame(&prefix) {
                        return Ok(Some(scanned));
                    }
                }
                Candidate::Id3v1 => {
                    debug!("跳过 ID3v1 标签, 位置={}", self.window.position());
                    self.pending_skip = ID3V1_SIZE;
                }
                Candidate::Id3v2 => self.skip_id3v2()?,
                Candidate::Ape => {
                    debug!("命中 APE 标签前导码, 位置={}", self.window.position());
                    self.window.consume(HEADER_SIZE);
                }
                Candidate::Unrecognized => self.window.consume(1),
            }
        }
    }

    /// 解析帧头并按目标版本/层过滤, 失败时前进 1 字节
    fn accept_frame(&mut self, prefix: &[u8; HEADER_SIZE]) -> Option<ScannedFrame> {
        let frame = match header::parse_frame_header(prefix) {
            Some(f) if f.version == self.version && f.layer == self.layer => f,
            _ => {
                self.window.consume(1);
                return None;
            }
        };

        let offset = self.window.position();
        self.pending_skip = u64::from(frame.frame_size);
        self.frame_count += 1;
        self.info.record_frame(&frame);

        trace!(
            "帧 #{} 偏移={} {}kbps {}Hz {}字节",
            self.frame_count, offset, frame.bitrate, frame.sample_rate, frame.frame_size
        );
        Some(ScannedFrame { frame, offset })
    }

    /// 读取完整的 ID3v2 标签头并登记跳过
    fn skip_id3v2(&mut self) -> MpResult<()> {
        match self.window.ensure(ID3V2_HEADER_SIZE) {
            Ok(()) => {}
            // 剩余数据放不下标签头, 按普通字节处理
            Err(MpError::Eof) => {
                self.window.consume(1);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        match Id3v2Tag::parse(self.window.unread()) {
            Some(tag) => {
                debug!(
                    "跳过 ID3v2.{} 标签, 位置={}, 大小={} 字节",
                    tag.major_version,
                    self.window.position(),
                    tag.total_size()
                );
                self.pending_skip = tag.total_size();
                self.info.record_id3v2(tag);
            }
            None => self.window.consume(1),
        }
        Ok(())
    }

    fn end_of_stream(&mut self) {
        self.state = ScanState::Done;
        debug!(
            "扫描结束: 位置={}, 帧数={}",
            self.window.position(),
            self.frame_count
        );
    }

    /// 当前状态
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// 已产出的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 游标在流中的绝对位置 (不含尚未执行的跳过)
    pub fn position(&self) -> u64 {
        self.window.position()
    }

    /// 扫描中途的汇总信息 (帧数在 [`finish`](Self::finish) 时写入)
    pub fn info(&self) -> &Mp3Info {
        &self.info
    }

    /// 结束扫描, 返回最终汇总
    pub fn finish(mut self) -> Mp3Info {
        self.info.frame_count = self.frame_count;
        self.info
    }
}

impl Iterator for Scanner {
    type Item = MpResult<ScannedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ScanState::Done {
            return None;
        }
        match self.next_frame() {
            Ok(Some(scanned)) => Some(Ok(scanned)),
            Ok(None) => None,
            Err(e) => {
                // 出错后不再产出
                self.state = ScanState::Done;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Scanner {}
