//! # 载体适配模块
//!
//! 载体被看作两部分：固定 54 字节的头部和其后的像素字节序列。
//! [`CarrierReader`] 与 [`CarrierWriter`] 记录各自的字节偏移，
//! 其余模块只通过 [`CarrierReader::read_window`] 和 [`CarrierWriter::write_window`] 访问载体。

use crate::constants::BMP_HEADER_SIZE;
use crate::error::{Result, StegoError};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};

/// 载体 BMP 的 54 字节头部。
///
/// 除宽、高以外的字节对编解码都是不透明的，会被原样复制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmpHeader {
    raw: [u8; BMP_HEADER_SIZE],
}

impl BmpHeader {
    /// 校验并包装原始头部。
    ///
    /// # Errors
    ///
    /// 如果不是以 `BM` 开头、像素偏移不是 54、不是 24 位或者使用了压缩，
    /// 返回 [`StegoError::UnsupportedCarrier`]。
    pub fn parse(raw: [u8; BMP_HEADER_SIZE]) -> Result<Self> {
        if &raw[0..2] != b"BM" {
            return Err(StegoError::UnsupportedCarrier(
                "missing 'BM' file signature".into(),
            ));
        }

        let header = Self { raw };

        let data_offset = header.u32_at(10);
        if data_offset as usize != BMP_HEADER_SIZE {
            return Err(StegoError::UnsupportedCarrier(format!(
                "pixel data starts at offset {data_offset}, expected {BMP_HEADER_SIZE}"
            )));
        }

        let bits_per_pixel = u16::from_le_bytes([raw[28], raw[29]]);
        if bits_per_pixel != 24 {
            return Err(StegoError::UnsupportedCarrier(format!(
                "{bits_per_pixel} bits per pixel, only 24-bit bitmaps are supported"
            )));
        }

        let compression = header.u32_at(30);
        if compression != 0 {
            return Err(StegoError::UnsupportedCarrier(format!(
                "compression method {compression}, only uncompressed bitmaps are supported"
            )));
        }

        Ok(header)
    }

    fn u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.raw[offset],
            self.raw[offset + 1],
            self.raw[offset + 2],
            self.raw[offset + 3],
        ])
    }

    /// 偏移 18 处的宽度 (小端序)。
    pub fn width(&self) -> u32 {
        (self.u32_at(18) as i32).unsigned_abs()
    }

    /// 偏移 22 处的高度 (小端序)，自顶向下存储的位图高度为负，这里取绝对值。
    pub fn height(&self) -> u32 {
        (self.u32_at(22) as i32).unsigned_abs()
    }

    /// 像素区域的字节数 `W * H * 3`，即可用的隐写 bit 数。
    pub fn pixel_byte_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) * 3
    }

    pub fn as_bytes(&self) -> &[u8; BMP_HEADER_SIZE] {
        &self.raw
    }
}

/// 带偏移计数的载体读取端。
#[derive(Debug)]
pub struct CarrierReader<R: Read> {
    inner: BufReader<R>,
    position: u64,
}

impl<R: Read> CarrierReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            position: 0,
        }
    }

    /// 已经从载体读取的字节数。
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 读取恰好 `N` 个字节。
    ///
    /// # Errors
    ///
    /// 剩余字节不足 `N` 时返回 [`StegoError::TruncatedCarrier`]。
    pub fn read_window<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut window = [0u8; N];
        self.inner.read_exact(&mut window).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                StegoError::TruncatedCarrier {
                    offset: self.position,
                    needed: N as u64,
                }
            } else {
                StegoError::Io(e)
            }
        })?;
        self.position += N as u64;
        Ok(window)
    }
}

/// 带偏移计数的载体写入端。
#[derive(Debug)]
pub struct CarrierWriter<W: Write> {
    inner: BufWriter<W>,
    position: u64,
}

impl<W: Write> CarrierWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            position: 0,
        }
    }

    /// 已经写入的字节数。
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 写入整个窗口。
    ///
    /// # Errors
    ///
    /// 写入端拒绝继续写入 (`WriteZero`) 时返回 [`StegoError::TruncatedCarrier`]，
    /// 其余错误返回 [`StegoError::Io`]。
    pub fn write_window(&mut self, window: &[u8]) -> Result<()> {
        self.inner
            .write_all(window)
            .map_err(|e| write_error(e, self.position, window.len() as u64))?;
        self.position += window.len() as u64;
        Ok(())
    }

    /// 刷新缓冲区并取回底层写入端。
    pub fn finish(self) -> Result<W> {
        let position = self.position;
        self.inner
            .into_inner()
            .map_err(|e| write_error(e.into_error(), position, 0))
    }
}

fn write_error(e: io::Error, offset: u64, needed: u64) -> StegoError {
    if e.kind() == ErrorKind::WriteZero {
        StegoError::TruncatedCarrier { offset, needed }
    } else {
        StegoError::Io(e)
    }
}

/// 读取并校验 54 字节头部，读取端停在偏移 54 处。
pub fn read_header<R: Read>(src: &mut CarrierReader<R>) -> Result<BmpHeader> {
    BmpHeader::parse(src.read_window::<BMP_HEADER_SIZE>()?)
}

/// 原样复制头部，完成后两端都停在偏移 54 处。
///
/// # Errors
///
/// 载体不足 54 字节时返回 [`StegoError::TruncatedCarrier`]。
pub fn copy_header<R: Read, W: Write>(
    src: &mut CarrierReader<R>,
    dest: &mut CarrierWriter<W>,
) -> Result<BmpHeader> {
    let header = read_header(src)?;
    write_header(dest, &header)?;
    Ok(header)
}

/// 把已校验的头部原样写入输出端。
pub fn write_header<W: Write>(dest: &mut CarrierWriter<W>, header: &BmpHeader) -> Result<()> {
    dest.write_window(header.as_bytes())
}

/// 解码时跳过头部，返回其中的尺寸信息以便校验长度字段。
pub fn skip_header<R: Read>(src: &mut CarrierReader<R>) -> Result<BmpHeader> {
    read_header(src)
}

/// 把读取端剩余的全部字节原样复制到写入端，返回复制的字节数。
pub fn copy_remaining<R: Read, W: Write>(
    src: &mut CarrierReader<R>,
    dest: &mut CarrierWriter<W>,
) -> Result<u64> {
    let copied = io::copy(&mut src.inner, &mut dest.inner)
        .map_err(|e| write_error(e, dest.position, 0))?;
    src.position += copied;
    dest.position += copied;
    Ok(copied)
}
