//! # LSB 位编解码
//!
//! 每个载体字节只替换最低有效位，高位 (MSB) 先写入。
//! 这里的函数都不做 I/O，只作用于调用方提供的窗口。

use crate::constants::{BYTES_PER_CHAR, LENGTH_HIDING_BYTES};

/// 把 `value` 的 8 个 bit 按 MSB 优先写入 `target` 各字节的最低位。
pub fn encode_byte(value: u8, target: &mut [u8; BYTES_PER_CHAR]) {
    for (i, byte) in target.iter_mut().enumerate() {
        let bit = (value >> (7 - i)) & 1;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// 把 `value` 的 32 个 bit 按 MSB 优先写入 `target` 各字节的最低位。
pub fn encode_u32(value: u32, target: &mut [u8; LENGTH_HIDING_BYTES]) {
    for (i, byte) in target.iter_mut().enumerate() {
        let bit = ((value >> (31 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

/// [`encode_byte`] 的逆操作：`source[0]` 对应 bit 7，`source[7]` 对应 bit 0。
pub fn decode_byte(source: &[u8; BYTES_PER_CHAR]) -> u8 {
    source
        .iter()
        .fold(0u8, |acc, &byte| (acc << 1) | (byte & 1))
}

/// [`encode_u32`] 的逆操作。
pub fn decode_u32(source: &[u8; LENGTH_HIDING_BYTES]) -> u32 {
    source
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | u32::from(byte & 1))
}
