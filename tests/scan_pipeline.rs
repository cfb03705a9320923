//! 扫描流程集成测试.
//!
//! 通过拼接合成的 MPEG 帧、ID3/APE 标签与垃圾字节,
//! 验证扫描器的同步、跳过、过滤、汇总以及跨分片读取的完整流程.

use std::io::Write;

use mpscan::core::MpError;
use mpscan::format::header::parse_frame_header;
use mpscan::format::io::{IoBackend, MemoryBackend};
use mpscan::format::{MpegLayer, MpegVersion, ScanConfig, Scanner};
use mpscan::{Mp3Info, inspect, inspect_file, inspect_reader};

// ========================
// 辅助函数: 构造码流
// ========================

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 按原始字段构造一个完整帧 (头部 + 零填充)
fn build_frame(version_bits: u8, layer_bits: u8, bitrate_idx: u8, sr_idx: u8) -> Vec<u8> {
    let header = [
        0xFF,
        0xE0 | (version_bits << 3) | (layer_bits << 1) | 0x01,
        (bitrate_idx << 4) | (sr_idx << 2),
        0x44,
    ];
    let fh = parse_frame_header(&header).expect("测试帧头应有效");
    let mut frame = vec![0u8; fh.frame_size as usize];
    frame[..4].copy_from_slice(&header);
    frame
}

/// MPEG-1 Layer III 帧
fn mp3_frame(bitrate_idx: u8, sr_idx: u8) -> Vec<u8> {
    build_frame(3, 1, bitrate_idx, sr_idx)
}

/// ID3v2.3 标签 (头部 + 指定大小的标签体)
fn id3v2_tag(body_size: u32) -> Vec<u8> {
    let mut tag = b"ID3\x03\x00\x00".to_vec();
    tag.extend_from_slice(&[
        ((body_size >> 21) & 0x7F) as u8,
        ((body_size >> 14) & 0x7F) as u8,
        ((body_size >> 7) & 0x7F) as u8,
        (body_size & 0x7F) as u8,
    ]);
    tag.extend(std::iter::repeat_n(0xAAu8, body_size as usize));
    tag
}

/// ID3v1 标签, 内容中嵌入一个有效帧头用于验证确实被跳过
fn id3v1_tag() -> Vec<u8> {
    let mut tag = vec![b' '; 128];
    tag[..3].copy_from_slice(b"TAG");
    tag[40..44].copy_from_slice(&mp3_frame(9, 0)[..4]);
    tag
}

/// 伪随机垃圾字节, 不含 0xFF 以及 ID3 标识首字母
fn garbage(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            match (state >> 16) as u8 {
                0xFF | b'T' | b'I' => 0x00,
                b => b,
            }
        })
        .collect()
}

/// 扫描整个流, 返回 (帧偏移列表, 汇总)
fn scan_all(backend: Box<dyn IoBackend>, config: &ScanConfig) -> (Vec<u64>, Mp3Info) {
    let mut scanner = Scanner::new(backend, config).expect("创建扫描器失败");
    let mut offsets = Vec::new();
    while let Some(scanned) = scanner.next_frame().expect("扫描失败") {
        offsets.push(scanned.offset);
    }
    (offsets, scanner.finish())
}

fn scan_bytes(data: Vec<u8>) -> (Vec<u64>, Mp3Info) {
    scan_all(
        Box::new(MemoryBackend::from_data(data)),
        &ScanConfig::default(),
    )
}

// ========================
// 测试用例
// ========================

#[test]
fn test_连续帧_逐个产出() {
    init_logger();
    for count in [1usize, 2, 7, 50] {
        let frame = mp3_frame(10, 1);
        let mut data = Vec::new();
        let mut expected = Vec::new();
        for _ in 0..count {
            expected.push(data.len() as u64);
            data.extend_from_slice(&frame);
        }

        let (offsets, info) = scan_bytes(data);
        assert_eq!(offsets, expected, "帧数 {count}");
        assert_eq!(info.frame_count, count as u64);
        assert_eq!(info.bitrate, 160);
        assert_eq!(info.sample_rate, 48000);
    }
}

#[test]
fn test_帧间垃圾_不产生误报() {
    init_logger();
    let frame = mp3_frame(9, 0);
    for len in [1usize, 3, 4, 17, 255, 4096, 9000] {
        let mut data = frame.clone();
        data.extend_from_slice(&garbage(len, len as u32));
        let second = data.len() as u64;
        data.extend_from_slice(&frame);

        let (offsets, info) = scan_bytes(data);
        assert_eq!(offsets, vec![0, second], "垃圾长度 {len}");
        assert_eq!(info.frame_count, 2);
    }
}

#[test]
fn test_垃圾以同步字节结尾() {
    let frame = mp3_frame(9, 0);
    let mut data = garbage(33, 7);
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
    let first = data.len() as u64;
    data.extend_from_slice(&frame);

    let (offsets, _) = scan_bytes(data);
    assert_eq!(offsets, vec![first]);
}

#[test]
fn test_vbr_检测() {
    let mut data = Vec::new();
    for i in 0..10 {
        let idx = if i % 3 == 0 { 11 } else { 9 };
        data.extend_from_slice(&mp3_frame(idx, 0));
    }

    let (offsets, info) = scan_bytes(data);
    assert_eq!(offsets.len(), 10);
    assert!(info.is_vbr);
    // 标称比特率取第一个帧
    assert_eq!(info.bitrate, 192);
    // (4 * 192 + 6 * 128) / 10
    assert_eq!(info.average_bitrate(), 153);
}

#[test]
fn test_固定比特率_非_vbr() {
    let frame = mp3_frame(9, 0);
    let data: Vec<u8> = std::iter::repeat_n(frame, 20).flatten().collect();
    let (_, info) = scan_bytes(data);
    assert!(!info.is_vbr);
    assert_eq!(info.average_bitrate(), info.bitrate);
}

#[test]
fn test_版本层过滤_不计数() {
    // MPEG-1 Layer III 与 MPEG-2 Layer III 交替
    let v1 = mp3_frame(9, 0);
    let v2 = build_frame(2, 1, 9, 0);
    let mut data = Vec::new();
    let mut expected = Vec::new();
    for _ in 0..4 {
        expected.push(data.len() as u64);
        data.extend_from_slice(&v1);
        data.extend_from_slice(&v2);
    }

    let (offsets, info) = scan_bytes(data.clone());
    assert_eq!(offsets, expected);
    assert!(info.found_mpeg1);
    assert!(!info.found_mpeg2);

    let config = ScanConfig::new(MpegVersion::Mpeg2, MpegLayer::Layer3);
    let (offsets, info) = scan_all(Box::new(MemoryBackend::from_data(data)), &config);
    assert_eq!(offsets.len(), 4);
    assert_eq!(info.sample_rate, 22050);
    assert!(info.found_mpeg2);
    assert!(!info.found_mpeg1);
}

#[test]
fn test_id3v2_跳过_10_加_标签体() {
    let frame = mp3_frame(9, 0);
    for size in [0u32, 1, 127, 128, 300, 5000] {
        let mut data = id3v2_tag(size);
        data.extend_from_slice(&frame);

        let config = ScanConfig::default().with_buffer_size(64);
        let (offsets, info) = scan_all(Box::new(MemoryBackend::from_data(data)), &config);
        assert_eq!(offsets, vec![10 + u64::from(size)], "标签体 {size}");
        assert_eq!(info.id3v2.map(|t| t.size), Some(size));
    }
}

#[test]
fn test_id3v2_标签体内帧头被跳过() {
    let frame = mp3_frame(9, 0);
    let mut data = id3v2_tag(600);
    data[200..204].copy_from_slice(&frame[..4]);
    data[300..700].copy_from_slice(&frame[..400]);
    data.extend_from_slice(&frame);

    let (offsets, info) = scan_bytes(data);
    assert_eq!(offsets, vec![610]);
    assert_eq!(info.frame_count, 1);
}

#[test]
fn test_id3v1_跳过_128_字节() {
    let frame = mp3_frame(9, 0);
    let mut data = frame.clone();
    data.extend_from_slice(&id3v1_tag());
    data.extend_from_slice(&frame);
    data.extend_from_slice(&id3v1_tag());

    let (offsets, info) = scan_bytes(data);
    assert_eq!(offsets, vec![0, 417 + 128]);
    assert_eq!(info.frame_count, 2);
}

#[test]
fn test_跨分片读取_结果一致() {
    init_logger();
    let mut data = id3v2_tag(50);
    data.extend_from_slice(&garbage(9, 1));
    for idx in [9u8, 10, 9, 12] {
        data.extend_from_slice(&mp3_frame(idx, 0));
    }
    data.extend_from_slice(&id3v1_tag());

    let (reference, reference_info) = scan_bytes(data.clone());
    assert_eq!(reference.len(), 4);

    for chunk in 1..=7 {
        for window in [10usize, 13, 64, 4096] {
            let backend = MemoryBackend::with_chunk_size(data.clone(), chunk);
            let config = ScanConfig::default().with_buffer_size(window);
            let (offsets, info) = scan_all(Box::new(backend), &config);
            assert_eq!(offsets, reference, "分片 {chunk}, 窗口 {window}");
            assert_eq!(info, reference_info);
        }
    }
}

#[test]
fn test_典型场景_id3v2_加两帧() {
    init_logger();
    let mut data = id3v2_tag(0);
    data.extend_from_slice(&mp3_frame(9, 0));
    data.extend_from_slice(&mp3_frame(9, 0));

    let info = inspect(
        Box::new(MemoryBackend::from_data(data)),
        &ScanConfig::default(),
    )
    .unwrap();
    assert_eq!(info.frame_count, 2);
    assert_eq!(info.bitrate, 128);
    assert_eq!(info.sample_rate, 44100);
    assert!(!info.is_vbr);
    assert!(info.found_mpeg1);
    assert!(info.found_layer3);
    assert!(info.id3v2.is_some());
}

#[test]
fn test_采样率变化_只覆盖不标记() {
    // 采样率与比特率的处理不对称: 采样率只取最后一个值
    let mut data = mp3_frame(9, 0);
    data.extend_from_slice(&mp3_frame(9, 1));

    let (_, info) = scan_bytes(data);
    assert_eq!(info.sample_rate, 48000);
    assert!(!info.is_vbr);
}

#[test]
fn test_时长估算() {
    // 1000 帧 * 1152 / 48000 = 24 秒
    let frame = mp3_frame(9, 1);
    let data: Vec<u8> = std::iter::repeat_n(frame, 1000).flatten().collect();
    let (_, info) = scan_bytes(data);
    assert!((info.duration().as_secs_f64() - 24.0).abs() < 1e-3);
}

#[test]
fn test_检查文件() {
    init_logger();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&id3v2_tag(2000)).unwrap();
    for _ in 0..30 {
        file.write_all(&mp3_frame(9, 0)).unwrap();
    }
    file.write_all(&id3v1_tag()).unwrap();
    file.flush().unwrap();

    let info = inspect_file(file.path()).unwrap();
    assert_eq!(info.frame_count, 30);
    assert_eq!(info.id3v2.map(|t| t.total_size()), Some(2010));
}

#[test]
fn test_顺序读取源() {
    let mut data = id3v2_tag(9000);
    for _ in 0..3 {
        data.extend_from_slice(&mp3_frame(9, 0));
    }
    let config = ScanConfig::default().with_buffer_size(256);
    let info = inspect_reader(std::io::Cursor::new(data), &config).unwrap();
    assert_eq!(info.frame_count, 3);
}

#[test]
fn test_空流与纯噪声() {
    let (offsets, info) = scan_bytes(Vec::new());
    assert!(offsets.is_empty());
    assert_eq!(info, Mp3Info::default());

    let (offsets, info) = scan_bytes(garbage(20_000, 99));
    assert!(offsets.is_empty());
    assert_eq!(info.frame_count, 0);
}

#[test]
fn test_读取失败_向上传播() {
    struct FailingReader {
        served: usize,
    }

    impl std::io::Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served >= 1000 {
                return Err(std::io::Error::other("读取超时"));
            }
            let n = buf.len().min(100);
            buf[..n].fill(0);
            self.served += n;
            Ok(n)
        }
    }

    let result = inspect_reader(FailingReader { served: 0 }, &ScanConfig::default());
    assert!(matches!(result, Err(MpError::Io(_))));
}
