//! # bmp_stego 库
//!
//! 本库把任意文件以 LSB 替换的方式隐藏在未压缩的 24 位 BMP 图像中，
//! 并能从隐写后的图像中还原出该文件。
//!
//! 模块按依赖顺序排列：位编解码 → 载体适配 → 容量规划 → 容器编解码 → 流水线。

pub mod capacity;
pub mod carrier;
pub mod cli;
pub mod constants;
pub mod container;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod steganography;

pub use container::{Container, Extension, Signature};
pub use error::{Result, StegoError};
