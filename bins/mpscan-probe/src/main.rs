//! mpscan-probe - MPEG 音频流信息探测工具
//!
//! 不解码音频, 扫描帧头并输出版本、层、比特率、采样率、VBR 与帧数等汇总.

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

use mpscan_format::io::{FileBackend, IoBackend, ReaderBackend};
use mpscan_format::{Mp3Info, ScanConfig, ScannedFrame, Scanner};

use config::ProbeConfig;

/// MPEG 音频流信息探测工具
#[derive(Parser, Debug)]
#[command(name = "mpscan-probe", version, about = "不解码的 MPEG 音频流探测工具")]
struct Cli {
    /// 输入文件路径, "-" 表示标准输入
    input: Option<String>,

    /// 目标 MPEG 版本 (1, 2, 2.5)
    #[arg(long = "mpeg-version")]
    mpeg_version: Option<String>,

    /// 目标层 (1, 2, 3)
    #[arg(long)]
    layer: Option<String>,

    /// 窗口大小 (字节)
    #[arg(long = "buffer-size")]
    buffer_size: Option<usize>,

    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 显示每个帧的偏移与参数
    #[arg(long = "show-frames")]
    show_frames: bool,

    /// 静默模式 (只输出探测结果)
    #[arg(short, long)]
    quiet: bool,

    /// 提高日志详细程度 (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================
// JSON 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput {
    input: String,
    summary: SummaryInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<FrameInfo>>,
}

/// 汇总信息
#[derive(Serialize)]
struct SummaryInfo {
    frame_count: u64,
    bitrate: u32,
    average_bitrate: u32,
    sample_rate: u32,
    is_vbr: bool,
    duration: f64,
    versions: Vec<&'static str>,
    layers: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id3v2: Option<Id3v2Info>,
}

/// ID3v2 标签信息
#[derive(Serialize)]
struct Id3v2Info {
    version: String,
    flags: u8,
    size: u64,
}

/// 单帧信息
#[derive(Serialize)]
struct FrameInfo {
    offset: u64,
    bitrate: u32,
    sample_rate: u32,
    size: u32,
    channel_mode: String,
    crc: bool,
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    let cli = Cli::parse();

    let Some(input) = cli.input.clone() else {
        print_banner();
        return;
    };

    if let Err(e) = run(&cli, &input) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli, input: &str) -> Result<()> {
    let probe_config = resolve_config(cli)?;
    let scan_config = probe_config.scan_config()?;

    logging::init(&probe_config.log_dir, "mpscan-probe", cli.verbose)?;

    if !cli.quiet {
        eprintln!(
            "mpscan-probe 版本 {} -- MPEG 音频流探测工具",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!(
            "输入: {input} (目标 {} {})",
            scan_config.version, scan_config.layer
        );
    }

    let backend = open_backend(input)?;
    let (info, frames) = scan(backend, &scan_config, cli.show_frames)
        .with_context(|| format!("扫描失败: {input}"))?;
    log::info!("{input}: {} 帧, {} kbps", info.frame_count, info.bitrate);

    let output = ProbeOutput {
        input: input.to_string(),
        summary: build_summary(&info),
        frames,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("JSON 序列化失败")?;
        println!("{json}");
    } else {
        print_summary_text(&output.summary);
        if let Some(ref frames) = output.frames {
            print_frames_text(frames);
        }
    }
    Ok(())
}

/// 合并配置文件与命令行参数, 命令行优先
fn resolve_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = match cli.config {
        Some(ref path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    if let Some(ref version) = cli.mpeg_version {
        config.mpeg_version = version.clone();
    }
    if let Some(ref layer) = cli.layer {
        config.layer = layer.clone();
    }
    if let Some(size) = cli.buffer_size {
        config.buffer_size = size;
    }
    Ok(config)
}

fn open_backend(input: &str) -> Result<Box<dyn IoBackend>> {
    if input == "-" {
        return Ok(Box::new(ReaderBackend::new(std::io::stdin())));
    }
    let file =
        std::fs::File::open(input).with_context(|| format!("无法打开文件 '{input}'"))?;
    Ok(Box::new(FileBackend::new(file)))
}

/// 扫描整个流, 按需收集每帧信息
fn scan(
    backend: Box<dyn IoBackend>,
    config: &ScanConfig,
    collect_frames: bool,
) -> Result<(Mp3Info, Option<Vec<FrameInfo>>)> {
    let mut scanner = Scanner::new(backend, config)?;
    let mut frames = collect_frames.then(Vec::new);

    while let Some(scanned) = scanner.next_frame()? {
        if let Some(ref mut frames) = frames {
            frames.push(build_frame_info(&scanned));
        }
    }
    Ok((scanner.finish(), frames))
}

fn build_frame_info(scanned: &ScannedFrame) -> FrameInfo {
    FrameInfo {
        offset: scanned.offset,
        bitrate: scanned.frame.bitrate,
        sample_rate: scanned.frame.sample_rate,
        size: scanned.frame.frame_size,
        channel_mode: scanned.frame.channel_mode.to_string(),
        crc: scanned.frame.has_crc,
    }
}

fn build_summary(info: &Mp3Info) -> SummaryInfo {
    let versions = [
        (info.found_mpeg1, "MPEG-1"),
        (info.found_mpeg2, "MPEG-2"),
        (info.found_mpeg25, "MPEG-2.5"),
    ];
    let layers = [
        (info.found_layer1, "Layer I"),
        (info.found_layer2, "Layer II"),
        (info.found_layer3, "Layer III"),
    ];

    SummaryInfo {
        frame_count: info.frame_count,
        bitrate: info.bitrate,
        average_bitrate: info.average_bitrate(),
        sample_rate: info.sample_rate,
        is_vbr: info.is_vbr,
        duration: info.duration().as_secs_f64(),
        versions: versions.iter().filter(|v| v.0).map(|v| v.1).collect(),
        layers: layers.iter().filter(|l| l.0).map(|l| l.1).collect(),
        id3v2: info.id3v2.map(|tag| Id3v2Info {
            version: format!("2.{}.{}", tag.major_version, tag.revision),
            flags: tag.flags.bits(),
            size: tag.total_size(),
        }),
    }
}

/// 文本输出: 汇总
fn print_summary_text(summary: &SummaryInfo) {
    println!("[SUMMARY]");
    println!("  帧数         : {}", summary.frame_count);
    if summary.frame_count > 0 {
        println!("  版本         : {}", summary.versions.join(", "));
        println!("  层           : {}", summary.layers.join(", "));
        println!("  码率         : {} kbps", summary.bitrate);
        if summary.is_vbr {
            println!("  平均码率     : {} kbps (VBR)", summary.average_bitrate);
        }
        println!("  采样率       : {} Hz", summary.sample_rate);
        println!("  时长         : {:.3} 秒", summary.duration);
    }
    if let Some(ref tag) = summary.id3v2 {
        println!("  ID3v2        : v{} ({} 字节)", tag.version, tag.size);
    }
    println!("[/SUMMARY]");
}

/// 文本输出: 帧列表
fn print_frames_text(frames: &[FrameInfo]) {
    println!();
    println!("[FRAMES]");
    for (i, frame) in frames.iter().enumerate() {
        println!(
            "  #{i:<6} 偏移={:<10} {:>3} kbps {:>5} Hz {:>4} 字节 {:<12}{}",
            frame.offset,
            frame.bitrate,
            frame.sample_rate,
            frame.size,
            frame.channel_mode,
            if frame.crc { " CRC" } else { "" }
        );
    }
    println!("[/FRAMES]");
}

fn print_banner() {
    println!(
        "mpscan-probe 版本 {} -- MPEG 音频流探测工具",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("用法: mpscan-probe [选项] <输入文件|->");
    println!();
    println!("示例:");
    println!("  mpscan-probe song.mp3");
    println!("  mpscan-probe --json --show-frames song.mp3");
    println!("  cat song.mp3 | mpscan-probe --layer 3 -");
}
