//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。

use crate::constants::DEFAULT_SIGNATURE;
use crate::container::Signature;
use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于把任意文件隐藏到 24 位 BMP 图像中，或从中恢复。
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏) 和 recover (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把秘密文件隐藏到 BMP 图像中。
    Hide(HideArgs),

    /// 从经过隐写的 BMP 图像中恢复秘密文件。
    Recover(RecoverArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用作载体的 24 位未压缩 BMP 图像。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件，扩展名最多 4 个字符。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 结果图像的保存路径，默认为载体旁的 `doctored_<名称>.bmp`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 编码端与解码端约定的签名。
    #[arg(long, default_value = DEFAULT_SIGNATURE)]
    pub signature: Signature,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏文件的 BMP 图像。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复出的文件的保存路径，默认为载体旁的 `recovered_<名称>`，并附加隐藏的扩展名。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 编码时使用的签名。
    #[arg(long, default_value = DEFAULT_SIGNATURE)]
    pub signature: Signature,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
