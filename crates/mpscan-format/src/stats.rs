//! 扫描汇总信息.

use std::time::Duration;

use crate::header::{AudioFrame, MpegLayer, MpegVersion};
use crate::tag::Id3v2Tag;

/// MP3 扫描汇总
///
/// 扫描开始时为空, 每个有效帧折叠一次, 扫描结束时写入帧数.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mp3Info {
    /// 标称比特率 (kbps), 取第一个有效帧的值
    pub bitrate: u32,
    /// 采样率 (Hz), 取最后一个有效帧的值
    pub sample_rate: u32,
    /// 是否出现过不同的比特率
    pub is_vbr: bool,
    /// 出现过 MPEG-1 帧
    pub found_mpeg1: bool,
    /// 出现过 MPEG-2 帧
    pub found_mpeg2: bool,
    /// 出现过 MPEG-2.5 帧
    pub found_mpeg25: bool,
    /// 出现过 Layer I 帧
    pub found_layer1: bool,
    /// 出现过 Layer II 帧
    pub found_layer2: bool,
    /// 出现过 Layer III 帧
    pub found_layer3: bool,
    /// 最近一次识别到的 ID3v2 标签
    pub id3v2: Option<Id3v2Tag>,
    /// 有效帧总数
    pub frame_count: u64,
    /// 所有已折叠帧的比特率之和 (kbps)
    bitrate_sum: u64,
    /// 已折叠帧数
    folded: u64,
    /// 累积播放时长
    duration: Duration,
}

impl Mp3Info {
    /// 折叠一个有效帧
    pub fn record_frame(&mut self, frame: &AudioFrame) {
        if self.bitrate != frame.bitrate {
            if self.bitrate > 0 {
                self.is_vbr = true;
            } else {
                self.bitrate = frame.bitrate;
            }
        }
        self.bitrate_sum += u64::from(frame.bitrate);
        self.folded += 1;

        // 与比特率不同, 采样率变化不做标记, 直接覆盖
        self.sample_rate = frame.sample_rate;

        match frame.version {
            MpegVersion::Mpeg1 => self.found_mpeg1 = true,
            MpegVersion::Mpeg2 => self.found_mpeg2 = true,
            MpegVersion::Mpeg25 => self.found_mpeg25 = true,
        }
        match frame.layer {
            MpegLayer::Layer1 => self.found_layer1 = true,
            MpegLayer::Layer2 => self.found_layer2 = true,
            MpegLayer::Layer3 => self.found_layer3 = true,
        }

        self.duration += Duration::from_secs_f64(
            f64::from(frame.samples_per_frame) / f64::from(frame.sample_rate),
        );
    }

    /// 记录 ID3v2 标签
    pub fn record_id3v2(&mut self, tag: Id3v2Tag) {
        self.id3v2 = Some(tag);
    }

    /// 平均比特率 (kbps), 无帧时为 0
    pub fn average_bitrate(&self) -> u32 {
        if self.folded == 0 {
            return 0;
        }
        (self.bitrate_sum / self.folded) as u32
    }

    /// 按帧采样数累加得到的估算时长
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 是否找到了任何音频帧
    pub fn has_audio(&self) -> bool {
        self.frame_count > 0
    }
}
