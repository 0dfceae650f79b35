/// BMP 文件的标准头部大小 (字节)。
/// 隐写操作将原样复制这个头部，从像素数据开始嵌入。
pub const BMP_HEADER_SIZE: usize = 54;

/// 用于隐写一个 `u32` 长度字段的载体字节数。
/// 每个载体字节只存储 1 bit，因此需要 32 个字节。
pub const LENGTH_HIDING_BYTES: usize = 32;

/// 用于隐写单个字节的载体字节数 (8 bits，每个载体字节 1 bit)。
pub const BYTES_PER_CHAR: usize = 8;

/// 扩展名在容器中固定占用的字节数，不足部分以 0 填充。
pub const EXTENSION_BYTES: usize = 4;

/// 编码端与解码端约定的默认签名。
pub const DEFAULT_SIGNATURE: &str = "#*#*";

/// 签名的最大长度。
/// 超过这个长度时容量公式将不再覆盖容器的真实占用。
pub const MAX_SIGNATURE_LEN: usize = 64;

// 容量公式 (32 * 3 + 4 + S) * 8 必须覆盖真实占用 32 + 8L + 32 + 32 + 32 + 8S。
const _: () = assert!(
    LENGTH_HIDING_BYTES * 3 + EXTENSION_BYTES * BYTES_PER_CHAR + MAX_SIGNATURE_LEN * BYTES_PER_CHAR
        <= (LENGTH_HIDING_BYTES * 3 + EXTENSION_BYTES) * 8
);
