use bmp_stego::{
    Signature, StegoError,
    cli::{HideArgs, RecoverArgs},
    constants::{BMP_HEADER_SIZE, BYTES_PER_CHAR, LENGTH_HIDING_BYTES},
    handler::{handle_hide, handle_recover},
    steganography::encode_byte,
};
use image::{ImageBuffer, Rgb};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的 24 位 BMP 测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut img_buf = ImageBuffer::new(width, height);
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    img_buf
        .pixels_mut()
        .zip(raw_pixels.chunks_exact(3))
        .for_each(|(pixel, chunk)| {
            *pixel = Rgb([chunk[0], chunk[1], chunk[2]]);
        });

    img_buf.save(path).expect("Failed to create test image.");
}

fn hide_args(image: &Path, secret: &Path, dest: Option<PathBuf>) -> HideArgs {
    HideArgs {
        image: image.to_path_buf(),
        secret: secret.to_path_buf(),
        dest,
        signature: Signature::default(),
        force: false,
    }
}

fn recover_args(image: &Path, output: Option<PathBuf>) -> RecoverArgs {
    RecoverArgs {
        image: image.to_path_buf(),
        output,
        signature: Signature::default(),
        force: false,
    }
}

fn stego_error(err: &anyhow::Error) -> Option<&StegoError> {
    err.downcast_ref::<StegoError>()
}

/// 验证从隐藏到恢复的完整流程，秘密文件包含任意二进制内容
#[test]
fn test_handle_hide_and_recover_integration() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let hidden_image_path = dir.path().join("hidden.bmp");
    let secret_path = dir.path().join("payload.bin");
    let recovered_path = dir.path().join("recovered.bin");

    create_test_image(&original_image_path, 100, 100);
    let mut secret = vec![0u8; 700];
    rand::rng().fill_bytes(&mut secret);
    fs::write(&secret_path, &secret)?;

    handle_hide(hide_args(
        &original_image_path,
        &secret_path,
        Some(hidden_image_path.clone()),
    ))?;
    assert!(hidden_image_path.exists(), "Hidden image should be created.");

    handle_recover(recover_args(&hidden_image_path, Some(recovered_path.clone())))?;
    assert_eq!(fs::read(&recovered_path)?, secret);

    Ok(())
}

/// 验证头部原样复制，容器之后的像素字节保持不变，容器内只改动最低位
#[test]
fn test_carrier_bytes_are_preserved() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let hidden_image_path = dir.path().join("hidden.bmp");
    let secret_path = dir.path().join("secret.txt");

    create_test_image(&original_image_path, 64, 64);
    fs::write(&secret_path, "hello world")?;

    handle_hide(hide_args(
        &original_image_path,
        &secret_path,
        Some(hidden_image_path.clone()),
    ))?;

    let original = fs::read(&original_image_path)?;
    let hidden = fs::read(&hidden_image_path)?;
    assert_eq!(original.len(), hidden.len());
    assert_eq!(hidden[..BMP_HEADER_SIZE], original[..BMP_HEADER_SIZE]);

    // 签名 4 字节、扩展名槽位 4 字节、秘密文件 11 字节
    let end = BMP_HEADER_SIZE + 32 + 4 * 8 + 32 + 4 * 8 + 32 + 11 * 8;
    assert_eq!(hidden[end..], original[end..]);
    for (before, after) in original.iter().zip(hidden.iter()) {
        assert_eq!(before & 0xFE, after & 0xFE);
    }

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_recover_with_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_text_path, original_text)?;

    handle_hide(hide_args(&original_image_path, &source_text_path, None))?;

    let expected_hidden_path = dir.path().join("doctored_original.bmp");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    handle_recover(recover_args(&expected_hidden_path, None))?;

    // 默认输出路径会附加隐藏的扩展名
    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered file should be created at: {:?}",
        expected_recovered_path
    );
    assert_eq!(fs::read_to_string(&expected_recovered_path)?, original_text);

    // 显式给出的输出路径没有扩展名时同样附加
    handle_recover(recover_args(
        &expected_hidden_path,
        Some(dir.path().join("plain")),
    ))?;
    assert_eq!(
        fs::read_to_string(dir.path().join("plain.txt"))?,
        original_text
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_hide(hide_args(&image_path, &text_path, Some(dest_path.clone())));
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    let mut args = hide_args(&image_path, &text_path, Some(dest_path.clone()));
    args.force = true;
    handle_hide(args)?;

    let content = fs::read(&dest_path)?;
    assert_ne!(content, b"this is a dummy file to be overwritten");

    Ok(())
}

/// 验证空间不足时的错误处理，且不留下不完整的输出图像
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 10, 10);
    fs::write(&text_path, "a".repeat(5000))?;

    let result = handle_hide(hide_args(&image_path, &text_path, Some(dest_path.clone())));

    let err = result.expect_err("hiding should fail");
    assert!(matches!(
        stego_error(&err),
        Some(StegoError::InsufficientCapacity { .. })
    ));
    assert!(format!("{err:#}").contains("Not enough space"));
    assert!(!dest_path.exists(), "No output may be left behind.");

    Ok(())
}

/// 验证输出路径与载体相同时，成功会原地替换载体，失败则载体保持不变
#[test]
fn test_hide_in_place_keeps_carrier_on_failure() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let empty_path = dir.path().join("empty.txt");
    let text_path = dir.path().join("text.txt");
    let output_path = dir.path().join("out.txt");

    create_test_image(&image_path, 50, 50);
    fs::write(&empty_path, "")?;
    fs::write(&text_path, "in place")?;
    let original = fs::read(&image_path)?;

    let mut args = hide_args(&image_path, &empty_path, Some(image_path.clone()));
    args.force = true;
    let err = handle_hide(args).expect_err("empty secret should fail");
    assert!(matches!(stego_error(&err), Some(StegoError::EmptySecret)));
    assert_eq!(fs::read(&image_path)?, original, "Carrier must be untouched.");

    let mut args = hide_args(&image_path, &text_path, Some(image_path.clone()));
    args.force = true;
    handle_hide(args)?;
    assert_eq!(fs::read(&image_path)?.len(), original.len());

    handle_recover(recover_args(&image_path, Some(output_path.clone())))?;
    assert_eq!(fs::read_to_string(&output_path)?, "in place");

    // 目录里只剩下预期的文件，没有残留的临时文件
    assert_eq!(fs::read_dir(dir.path())?.count(), 4);

    Ok(())
}

/// 验证空的秘密文件会被拒绝
#[test]
fn test_handle_hide_empty_secret() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("empty.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "")?;

    let err = handle_hide(hide_args(&image_path, &text_path, Some(dest_path.clone())))
        .expect_err("empty secret should fail");
    assert!(matches!(stego_error(&err), Some(StegoError::EmptySecret)));
    assert!(!dest_path.exists());

    Ok(())
}

/// 验证扩展名超过 4 个字符时拒绝隐藏
#[test]
fn test_handle_hide_long_extension() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("notes.markdown");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "# notes")?;

    let err = handle_hide(hide_args(&image_path, &text_path, None))
        .expect_err("long extension should fail");
    assert!(matches!(
        stego_error(&err),
        Some(StegoError::InvalidExtension(_))
    ));
    assert!(!dir.path().join("doctored_image.bmp").exists());

    Ok(())
}

/// 验证签名不一致或图像中没有隐藏文件时不会产生输出
#[test]
fn test_handle_recover_rejects_foreign_images() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let hidden_path = dir.path().join("hidden.bmp");
    let text_path = dir.path().join("text.txt");
    let output_path = dir.path().join("out.txt");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "top secret")?;

    let err = handle_recover(recover_args(&image_path, Some(output_path.clone())))
        .expect_err("plain image has no hidden file");
    assert!(matches!(stego_error(&err), Some(StegoError::InvalidSignature)));
    assert!(!output_path.exists());

    let mut args = hide_args(&image_path, &text_path, Some(hidden_path.clone()));
    args.signature = "s3cr3t".parse()?;
    handle_hide(args)?;

    let err = handle_recover(recover_args(&hidden_path, Some(output_path.clone())))
        .expect_err("signature mismatch");
    assert!(matches!(stego_error(&err), Some(StegoError::InvalidSignature)));
    assert!(!output_path.exists());

    let mut args = recover_args(&hidden_path, Some(output_path.clone()));
    args.signature = "s3cr3t".parse()?;
    handle_recover(args)?;
    assert_eq!(fs::read_to_string(&output_path)?, "top secret");

    Ok(())
}

/// 验证非 BMP 载体会被拒绝
#[test]
fn test_non_bitmap_carrier_is_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");

    fs::write(&image_path, "definitely not a bitmap")?;
    fs::write(&text_path, "some text")?;

    let err = handle_hide(hide_args(&image_path, &text_path, None))
        .expect_err("non-bitmap carrier should fail");
    assert!(err.to_string().contains("Not a BMP image"));

    Ok(())
}

/// 验证被篡改成路径片段的扩展名不会影响输出路径
#[test]
fn test_recover_ignores_path_like_extension() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let hidden_path = dir.path().join("hidden.bmp");
    let text_path = dir.path().join("secret.abc");
    let output_path = dir.path().join("out");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "tampered")?;
    handle_hide(hide_args(&image_path, &text_path, Some(hidden_path.clone())))?;

    // 签名长度、签名 4 字节、扩展名长度之后就是扩展名槽位
    let slot = BMP_HEADER_SIZE + 2 * LENGTH_HIDING_BYTES + 4 * BYTES_PER_CHAR;
    let mut hidden = fs::read(&hidden_path)?;
    for (i, byte) in b"a/b\0".iter().enumerate() {
        let start = slot + i * BYTES_PER_CHAR;
        let window: &mut [u8; BYTES_PER_CHAR] =
            (&mut hidden[start..start + BYTES_PER_CHAR]).try_into()?;
        encode_byte(*byte, window);
    }
    fs::write(&hidden_path, &hidden)?;

    handle_recover(recover_args(&hidden_path, Some(output_path.clone())))?;
    assert_eq!(fs::read_to_string(&output_path)?, "tampered");
    assert!(!dir.path().join("out.a").exists());

    Ok(())
}
