//! # 容量规划
//!
//! 在写入任何容器字段之前确认载体能装下整个容器。

use crate::constants::{EXTENSION_BYTES, LENGTH_HIDING_BYTES};
use crate::error::{Result, StegoError};

/// 隐藏 `secret_byte_count` 字节所需的 bit 数：`(32 + 32 + 32 + 4 + S) * 8`。
pub fn required_bits(secret_byte_count: u64) -> u64 {
    (LENGTH_HIDING_BYTES as u64 * 3 + EXTENSION_BYTES as u64 + secret_byte_count) * 8
}

/// 检查像素区域是否足以容纳秘密文件。
///
/// 容量必须严格大于所需 bit 数，相等也视为不足。
///
/// # Errors
///
/// * 秘密文件为空时返回 [`StegoError::EmptySecret`]。
/// * 容量不足时返回 [`StegoError::InsufficientCapacity`]。
pub fn compute_capacity(carrier_pixel_byte_count: u64, secret_byte_count: u64) -> Result<()> {
    if secret_byte_count == 0 {
        return Err(StegoError::EmptySecret);
    }

    let required = required_bits(secret_byte_count);
    if carrier_pixel_byte_count <= required || secret_byte_count > u64::from(u32::MAX) {
        return Err(StegoError::InsufficientCapacity {
            required,
            available: carrier_pixel_byte_count,
        });
    }

    Ok(())
}

/// 给定像素字节数时能隐藏的最大秘密文件字节数。
pub fn max_secret_len(carrier_pixel_byte_count: u64) -> u64 {
    let overhead = required_bits(0);
    if carrier_pixel_byte_count <= overhead {
        return 0;
    }
    // 严格不等式：需要 overhead + 8S < pixel_bytes。
    ((carrier_pixel_byte_count - overhead - 1) / 8).min(u64::from(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_bits_formula() {
        assert_eq!(required_bits(0), 800);
        assert_eq!(required_bits(11), 888);
    }

    #[test]
    fn boundary_is_strict() {
        let required = required_bits(11);
        assert!(matches!(
            compute_capacity(required, 11),
            Err(StegoError::InsufficientCapacity { required: 888, available: 888 })
        ));
        assert!(compute_capacity(required + 1, 11).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected_first() {
        assert!(matches!(
            compute_capacity(2_000_000, 0),
            Err(StegoError::EmptySecret)
        ));
        assert!(matches!(compute_capacity(0, 0), Err(StegoError::EmptySecret)));
    }

    #[test]
    fn max_secret_len_agrees_with_compute_capacity() {
        for pixels in [0, 800, 801, 808, 809, 2_000_000] {
            let max = max_secret_len(pixels);
            if max > 0 {
                assert!(compute_capacity(pixels, max).is_ok());
            }
            assert!(compute_capacity(pixels, max + 1).is_err());
        }
    }
}
