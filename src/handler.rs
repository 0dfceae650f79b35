//! # 命令处理逻辑模块
//!
//! 包含处理 `hide` 和 `recover` 子命令的高级业务逻辑。
//! 本模块负责打开文件、确定输出路径、调用隐写流水线以及向用户报告结果。

use crate::capacity::max_secret_len;
use crate::cli::{HideArgs, RecoverArgs};
use crate::container::Extension;
use crate::error::StegoError;
use crate::pipeline;
use anyhow::{Context, Result};
use colored::Colorize;
use image::{ImageFormat, ImageReader};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 在载体所在目录下生成 `<prefix>_<载体名>` 形式的默认输出路径。
fn default_output_path(image: &Path, prefix: &str, extension: Option<&str>) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = match extension.filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{prefix}_{stem}.{ext}"),
        None => format!("{prefix}_{stem}"),
    };
    image.parent().unwrap_or_else(|| Path::new("")).join(name)
}

/// 除非指定了 `--force`，否则拒绝覆盖已存在的文件。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 通过文件内容 (而不是扩展名) 确认载体是 BMP 图像。
fn ensure_bitmap(path: &Path) -> Result<()> {
    let format = File::open(path)
        .and_then(|file| ImageReader::new(BufReader::new(file)).with_guessed_format())
        .with_context(|| {
            format!(
                "Unable to read image file: {}",
                path.to_string_lossy().red().bold()
            )
        })?
        .format();

    anyhow::ensure!(
        format == Some(ImageFormat::Bmp),
        "Not a BMP image: {}. \nOnly uncompressed 24-bit bitmaps can carry a hidden file.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责校验载体、确定输出路径、调用编码流水线。输出先写入目标目录下的临时文件，
/// 编码成功后才替换目标路径，失败时目标与载体都保持原样。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 载体不是 BMP 图像，或者无法读取载体、秘密文件。
/// * 秘密文件的扩展名超过 4 个字符。
/// * 输出文件已存在且未指定 `--force`。
/// * 秘密文件为空，或者图像没有足够的空间。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    ensure_bitmap(&args.image)?;

    let ext = args
        .secret
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = Extension::new(&ext).with_context(|| {
        format!(
            "Unable to hide file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;

    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output_path(&args.image, "doctored", Some("bmp")));
    ensure_writable(&dest, args.force)?;

    let carrier = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    let secret = File::open(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;
    // 先写入同目录下的临时文件，成功后再替换目标，载体与目标相同时也不会被截断
    let dest_dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut output = NamedTempFile::new_in(dest_dir).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    let summary = match pipeline::encode(
        carrier,
        secret,
        &extension,
        &args.signature,
        &mut output,
    ) {
        Ok(summary) => summary,
        Err(err) => {
            let hint = match &err {
                StegoError::InsufficientCapacity { available, .. } => format!(
                    "\nThis image can hold at most {} bytes.",
                    max_secret_len(*available).to_string().green().bold()
                ),
                _ => String::new(),
            };
            return Err(err).with_context(|| {
                format!(
                    "Failed to hide {} in {}.{hint}",
                    args.secret.to_string_lossy().red().bold(),
                    args.image.to_string_lossy().red().bold()
                )
            });
        }
    };

    output.persist(&dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "{} bytes have been successfully hidden and saved: {}",
        summary.secret_len.to_string().green(),
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像、调用解码流水线，并在签名校验通过、
/// 全部字段解码成功之后才写出恢复的文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件，或者它不是 BMP 图像。
/// * 图像中没有隐藏文件，或者签名不一致。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法写入到目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    ensure_bitmap(&args.image)?;

    let carrier = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let container = pipeline::recover(carrier, &args.signature).with_context(|| {
        format!(
            "Failed to recover a hidden file from '{}'. \nThe image may not contain a hidden file or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let extension = container.extension.as_str();
    let output = match args.output {
        Some(mut path) => {
            if path.extension().is_none() && !extension.is_empty() {
                path.set_extension(extension);
            }
            path
        }
        None => default_output_path(&args.image, "recovered", Some(extension)),
    };
    ensure_writable(&output, args.force)?;

    fs::write(&output, &container.payload).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The hidden file has been successfully recovered and saved: {}",
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_sit_next_to_the_carrier() {
        let image = Path::new("pictures/my.cover.bmp");
        assert_eq!(
            default_output_path(image, "doctored", Some("bmp")),
            PathBuf::from("pictures/doctored_my.cover.bmp")
        );
        assert_eq!(
            default_output_path(image, "recovered", Some("txt")),
            PathBuf::from("pictures/recovered_my.cover.txt")
        );
        assert_eq!(
            default_output_path(image, "recovered", Some("")),
            PathBuf::from("pictures/recovered_my.cover")
        );
    }
}
