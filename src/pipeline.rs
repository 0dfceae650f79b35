//! # 流水线
//!
//! 编码：打开载体 → 读取头部 → 容量检查 → 写出头部 → 嵌入容器 → 复制剩余字节。
//! 解码：打开载体 → 跳过头部 → 还原容器 → 写出秘密文件。
//!
//! 任何阶段失败都会立即终止并返回第一个错误，不做重试。

use crate::capacity::compute_capacity;
use crate::carrier::{self, CarrierReader, CarrierWriter};
use crate::container::{self, Container, Extension, Signature};
use crate::error::{Result, StegoError};
use log::{debug, info, warn};
use std::fmt;
use std::io::{Read, Write};

/// 流水线的各个阶段，仅用于日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenCarrier,
    CopyHeader,
    SkipHeader,
    CheckCapacity,
    EncodeContainer,
    DecodeContainer,
    CopyRemainder,
    WriteOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::OpenCarrier => "open carrier",
            Stage::CopyHeader => "copy header",
            Stage::SkipHeader => "skip header",
            Stage::CheckCapacity => "check capacity",
            Stage::EncodeContainer => "encode container",
            Stage::DecodeContainer => "decode container",
            Stage::CopyRemainder => "copy remainder",
            Stage::WriteOutput => "write output",
        };
        f.write_str(name)
    }
}

/// 成功编码后的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// 嵌入的秘密文件字节数。
    pub secret_len: u64,
    /// 头部声明的像素字节数。
    pub capacity: u64,
    /// 写入输出的总字节数。
    pub written: u64,
}

fn stage<T>(stage: Stage, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| warn!("stage '{stage}' failed: {e}"))
}

/// 把 `secret` 隐藏进 `carrier`，结果写入 `output`。
///
/// 秘密文件会先被完整读入内存，容量检查在嵌入任何容器字段之前完成。
///
/// # Errors
///
/// 返回遇到的第一个 [`StegoError`]。失败时 `output` 中已经写入的内容不可信，
/// 调用方应当丢弃。
pub fn encode<C: Read, S: Read, W: Write>(
    carrier: C,
    mut secret: S,
    extension: &Extension,
    signature: &Signature,
    output: W,
) -> Result<EncodeSummary> {
    debug!("stage '{}'", Stage::OpenCarrier);
    let mut src = CarrierReader::new(carrier);
    let mut dest = CarrierWriter::new(output);

    let mut payload = Vec::new();
    stage(
        Stage::OpenCarrier,
        secret.read_to_end(&mut payload).map_err(StegoError::from),
    )?;

    debug!("stage '{}'", Stage::CopyHeader);
    let header = stage(Stage::CopyHeader, carrier::read_header(&mut src))?;
    debug!(
        "carrier is {}x{}, read {} bytes",
        header.width(),
        header.height(),
        src.position()
    );

    // 容量检查通过之前不向输出写入任何字节
    debug!("stage '{}'", Stage::CheckCapacity);
    let capacity = header.pixel_byte_count();
    stage(
        Stage::CheckCapacity,
        compute_capacity(capacity, payload.len() as u64),
    )?;

    stage(Stage::CopyHeader, carrier::write_header(&mut dest, &header))?;

    debug!("stage '{}'", Stage::EncodeContainer);
    stage(
        Stage::EncodeContainer,
        container::encode_container(&mut src, &mut dest, signature, extension, &payload),
    )?;
    debug!(
        "container embedded, read {} / wrote {} bytes",
        src.position(),
        dest.position()
    );

    debug!("stage '{}'", Stage::CopyRemainder);
    let copied = stage(
        Stage::CopyRemainder,
        carrier::copy_remaining(&mut src, &mut dest),
    )?;
    let written = dest.position();
    stage(Stage::CopyRemainder, dest.finish())?;
    debug!("copied {copied} remaining carrier bytes");

    info!(
        "hid {} bytes (extension '{}') in a carrier of {} pixel bytes",
        payload.len(),
        extension,
        capacity
    );

    Ok(EncodeSummary {
        secret_len: payload.len() as u64,
        capacity,
        written,
    })
}

/// 从 `carrier` 中还原容器。
///
/// 秘密文件内容完整缓存在内存中，只有签名校验和全部字段都成功后才返回。
///
/// # Errors
///
/// 返回遇到的第一个 [`StegoError`]，签名不符时为 [`StegoError::InvalidSignature`]。
pub fn recover<C: Read>(carrier: C, signature: &Signature) -> Result<Container> {
    debug!("stage '{}'", Stage::OpenCarrier);
    let mut src = CarrierReader::new(carrier);

    debug!("stage '{}'", Stage::SkipHeader);
    let header = stage(Stage::SkipHeader, carrier::skip_header(&mut src))?;

    debug!("stage '{}'", Stage::DecodeContainer);
    let container = stage(
        Stage::DecodeContainer,
        container::decode_container(&mut src, signature, header.pixel_byte_count()),
    )?;

    info!(
        "recovered {} bytes (extension '{}'), read {} carrier bytes",
        container.payload.len(),
        container.extension,
        src.position()
    );
    Ok(container)
}

/// 还原容器并把秘密文件写入 `output`。
///
/// 在整个容器解码成功之前不会向 `output` 写入任何字节。
pub fn decode<C: Read, W: Write>(
    carrier: C,
    signature: &Signature,
    mut output: W,
) -> Result<Extension> {
    let container = recover(carrier, signature)?;

    debug!("stage '{}'", Stage::WriteOutput);
    stage(
        Stage::WriteOutput,
        output
            .write_all(&container.payload)
            .and_then(|()| output.flush())
            .map_err(StegoError::from),
    )?;
    Ok(container.extension)
}
