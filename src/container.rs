//! # 容器编解码
//!
//! 容器按固定顺序写入像素区域，每个字段占用 `8 * 字段字节数` 个载体字节：
//!
//! | 字段 | 载体字节 |
//! |------|----------|
//! | 签名长度 (`u32`) | 32 |
//! | 签名 | 8 * L |
//! | 扩展名长度 (`u32`) | 32 |
//! | 扩展名 (固定 4 字节，0 填充) | 32 |
//! | 秘密文件长度 (`u32`) | 32 |
//! | 秘密文件内容 | 8 * S |
//!
//! 长度字段总在变长字段之前，所以任意二进制内容都无需转义。

use crate::carrier::{CarrierReader, CarrierWriter};
use crate::constants::{
    BMP_HEADER_SIZE, BYTES_PER_CHAR, DEFAULT_SIGNATURE, EXTENSION_BYTES, LENGTH_HIDING_BYTES,
    MAX_SIGNATURE_LEN,
};
use crate::error::{Result, StegoError};
use crate::steganography::{decode_byte, decode_u32, encode_byte, encode_u32};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// 编码端与解码端共享的签名，兼作隐式口令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// # Errors
    ///
    /// 长度不在 `1..=64` 内时返回 [`StegoError::InvalidSignatureConstant`]。
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > MAX_SIGNATURE_LEN {
            return Err(StegoError::InvalidSignatureConstant(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self(DEFAULT_SIGNATURE.as_bytes().to_vec())
    }
}

impl FromStr for Signature {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.as_bytes())
    }
}

/// 秘密文件的扩展名 (不含 `.`)，存放在固定 4 字节的槽位里。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extension {
    bytes: [u8; EXTENSION_BYTES],
    len: usize,
}

impl Extension {
    /// # Errors
    ///
    /// 超过 4 个字节或含有 ASCII 字母数字以外的字符时返回 [`StegoError::InvalidExtension`]。
    pub fn new(ext: &str) -> Result<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        if ext.len() > EXTENSION_BYTES || !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(StegoError::InvalidExtension(ext.to_string()));
        }

        let mut bytes = [0u8; EXTENSION_BYTES];
        bytes[..ext.len()].copy_from_slice(ext.as_bytes());
        Ok(Self {
            bytes,
            len: ext.len(),
        })
    }

    /// 由解码出的长度字段和 4 字节槽位还原扩展名。
    ///
    /// 长度字段大于 4 时按 4 处理，末尾的 0 字节会被去掉。
    /// 含有字母数字以外字节的槽位视为没有扩展名，以免被拼进输出路径。
    fn from_slot(stored_len: u32, bytes: [u8; EXTENSION_BYTES]) -> Self {
        let mut len = (stored_len as usize).min(EXTENSION_BYTES);
        while len > 0 && bytes[len - 1] == 0 {
            len -= 1;
        }
        if !bytes[..len].iter().all(u8::is_ascii_alphanumeric) {
            len = 0;
        }
        Self { bytes, len }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从载体中还原出的容器内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub extension: Extension,
    pub payload: Vec<u8>,
}

fn ensure_in_sync<R: Read, W: Write>(
    src: &CarrierReader<R>,
    dest: &CarrierWriter<W>,
) -> Result<()> {
    if src.position() != dest.position() {
        return Err(StegoError::CursorDesync {
            read: src.position(),
            written: dest.position(),
        });
    }
    Ok(())
}

fn hide_u32<R: Read, W: Write>(
    value: u32,
    src: &mut CarrierReader<R>,
    dest: &mut CarrierWriter<W>,
) -> Result<()> {
    let mut window = src.read_window::<LENGTH_HIDING_BYTES>()?;
    encode_u32(value, &mut window);
    dest.write_window(&window)
}

fn hide_bytes<R: Read, W: Write>(
    bytes: &[u8],
    src: &mut CarrierReader<R>,
    dest: &mut CarrierWriter<W>,
) -> Result<()> {
    bytes.iter().try_for_each(|&byte| {
        let mut window = src.read_window::<BYTES_PER_CHAR>()?;
        encode_byte(byte, &mut window);
        dest.write_window(&window)
    })
}

fn recover_u32<R: Read>(src: &mut CarrierReader<R>) -> Result<u32> {
    Ok(decode_u32(&src.read_window::<LENGTH_HIDING_BYTES>()?))
}

fn recover_byte<R: Read>(src: &mut CarrierReader<R>) -> Result<u8> {
    Ok(decode_byte(&src.read_window::<BYTES_PER_CHAR>()?))
}

/// 把签名、扩展名和秘密文件内容依次嵌入载体。
///
/// 两端游标在调用前必须已经停在同一位置 (通常是头部之后的偏移 54)，
/// 每写完一个字段都会再次核对。调用方负责事先完成容量检查。
///
/// # Errors
///
/// * 载体提前结束时返回 [`StegoError::TruncatedCarrier`]。
/// * 两端游标不一致时返回 [`StegoError::CursorDesync`]。
pub fn encode_container<R: Read, W: Write>(
    src: &mut CarrierReader<R>,
    dest: &mut CarrierWriter<W>,
    signature: &Signature,
    extension: &Extension,
    payload: &[u8],
) -> Result<()> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| {
        StegoError::InsufficientCapacity {
            required: crate::capacity::required_bits(payload.len() as u64),
            available: 0,
        }
    })?;

    ensure_in_sync(src, dest)?;

    hide_u32(signature.as_bytes().len() as u32, src, dest)?;
    hide_bytes(signature.as_bytes(), src, dest)?;
    ensure_in_sync(src, dest)?;

    hide_u32(extension.len as u32, src, dest)?;
    hide_bytes(&extension.bytes, src, dest)?;
    ensure_in_sync(src, dest)?;

    hide_u32(payload_len, src, dest)?;
    hide_bytes(payload, src, dest)?;
    ensure_in_sync(src, dest)
}

/// 从载体中逐字段还原容器。
///
/// `pixel_byte_count` 是头部声明的像素字节数，用来在分配缓冲区之前
/// 检查解码出的长度是否可信。
///
/// # Errors
///
/// * 签名长度或内容不符时返回 [`StegoError::InvalidSignature`]。
/// * 秘密文件长度为 0 时返回 [`StegoError::EmptySecret`]。
/// * 长度字段超出载体剩余容量或载体提前结束时返回 [`StegoError::TruncatedCarrier`]。
pub fn decode_container<R: Read>(
    src: &mut CarrierReader<R>,
    signature: &Signature,
    pixel_byte_count: u64,
) -> Result<Container> {
    let expected = signature.as_bytes();
    let signature_len = recover_u32(src)?;
    if signature_len as usize != expected.len() {
        return Err(StegoError::InvalidSignature);
    }

    let mut found = Vec::with_capacity(expected.len());
    for _ in 0..expected.len() {
        found.push(recover_byte(src)?);
    }
    if found != expected {
        return Err(StegoError::InvalidSignature);
    }

    let extension_len = recover_u32(src)?;
    let mut slot = [0u8; EXTENSION_BYTES];
    for byte in slot.iter_mut() {
        *byte = recover_byte(src)?;
    }
    let extension = Extension::from_slot(extension_len, slot);

    let payload_len = u64::from(recover_u32(src)?);
    if payload_len == 0 {
        return Err(StegoError::EmptySecret);
    }

    let pixel_end = BMP_HEADER_SIZE as u64 + pixel_byte_count;
    let remaining = pixel_end.saturating_sub(src.position());
    let needed = payload_len * BYTES_PER_CHAR as u64;
    if needed > remaining {
        return Err(StegoError::TruncatedCarrier {
            offset: src.position(),
            needed,
        });
    }

    let mut payload = Vec::with_capacity(payload_len as usize);
    for _ in 0..payload_len {
        payload.push(recover_byte(src)?);
    }

    Ok(Container { extension, payload })
}
