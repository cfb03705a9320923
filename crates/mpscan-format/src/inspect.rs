//! 整流检查.
//!
//! 反复从扫描器拉取帧直到流末尾, 然后返回汇总.
//! 只有 I/O 错误会向上传播, 找不到任何帧仍返回帧数为 0 的汇总.

use std::io::Read;
use std::path::Path;

use log::info;
use mpscan_core::MpResult;

use crate::config::ScanConfig;
use crate::io::{IoBackend, ReaderBackend};
use crate::scanner::Scanner;
use crate::stats::Mp3Info;

/// 检查任意后端
pub fn inspect(backend: Box<dyn IoBackend>, config: &ScanConfig) -> MpResult<Mp3Info> {
    drain(Scanner::new(backend, config)?)
}

/// 按默认配置 (MPEG-1 Layer III) 检查文件
pub fn inspect_file(path: impl AsRef<Path>) -> MpResult<Mp3Info> {
    let path = path.as_ref();
    let info = drain(Scanner::open(path, &ScanConfig::default())?)?;
    info!("检查完成: {}, {} 帧", path.display(), info.frame_count);
    Ok(info)
}

/// 检查只能顺序读取的数据源
pub fn inspect_reader<R>(reader: R, config: &ScanConfig) -> MpResult<Mp3Info>
where
    R: Read + Send + 'static,
{
    inspect(Box::new(ReaderBackend::new(reader)), config)
}

fn drain(mut scanner: Scanner) -> MpResult<Mp3Info> {
    while scanner.next_frame()?.is_some() {}
    Ok(scanner.finish())
}
