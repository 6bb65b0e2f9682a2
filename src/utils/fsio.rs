//! # 文件读写工具
//!
//! 把 `std::fs` 的 I/O 错误统一包装为 `GulpkitError`，附带路径信息。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 使用 `error.rs`

use crate::error::{GulpkitError, Result};

use std::fs;
use std::path::Path;

/// 读取整个文本文件
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(GulpkitError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    // GULP 输出偶尔含有非 UTF-8 字节
    let bytes = fs::read(path).map_err(|e| GulpkitError::read(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 写入文本文件（覆盖）
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| GulpkitError::write(path, e))
}

/// 逐行写入，每行以换行结尾
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    write_text(path, &content)
}

/// 确保目录存在
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| GulpkitError::write(path, e))
}

/// 删除文件或目录（不存在时忽略）
pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path).map_err(|e| GulpkitError::write(path, e))
    } else if path.exists() {
        fs::remove_file(path).map_err(|e| GulpkitError::write(path, e))
    } else {
        Ok(())
    }
}

/// 复制文件
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| GulpkitError::write(to, e))
}

/// 取路径最后一段作为名称
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
