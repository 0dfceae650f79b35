//! # 错误类型模块
//!
//! 隐写核心在任何阶段遇到的第一个错误都会以 [`StegoError`] 的形式向上传递，
//! 流水线不会重试，也不会部分恢复。

use thiserror::Error;

/// 隐写核心的错误分类。
#[derive(Error, Debug)]
pub enum StegoError {
    /// 载体在某个字段需要的位置之前就结束了，或者写入端拒绝继续写入。
    #[error("Carrier is truncated: {needed} more bytes were required at offset {offset}")]
    TruncatedCarrier { offset: u64, needed: u64 },

    /// 载体的像素区域不足以容纳容器。
    #[error("Not enough space in the image to hide the secret. Required: {required} bits, Available: {available} bits")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 秘密文件为空。
    #[error("The secret file is empty")]
    EmptySecret,

    /// 解码出的签名与约定的签名不一致。
    #[error("Invalid signature: the image does not contain a hidden file, or a different signature was used")]
    InvalidSignature,

    /// 载体不是 54 字节头部的未压缩 24 位 BMP。
    #[error("Unsupported carrier: {0}")]
    UnsupportedCarrier(String),

    /// 扩展名超过 4 个字节或包含 ASCII 字母数字以外的字符。
    #[error("Invalid secret file extension: '{0}' (at most 4 ASCII letters or digits are supported)")]
    InvalidExtension(String),

    /// 签名常量的长度超出允许范围。
    #[error("Invalid signature length {0}: expected 1 to 64 bytes")]
    InvalidSignatureConstant(usize),

    /// 读写两端的游标不同步。
    #[error("Carrier cursors out of sync: read {read} bytes but wrote {written} bytes")]
    CursorDesync { read: u64, written: u64 },

    /// 底层流的其他 I/O 错误。
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StegoError>;
