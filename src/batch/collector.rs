//! # 任务目录与文件收集器
//!
//! ## 功能
//! - 按 `<前缀><数字>` 收集任务目录（如 `A12`, `VO_3`），按编号排序
//! - 按 glob 模式收集文件，支持递归
//!
//! ## 依赖关系
//! - 被几乎所有批处理命令调用
//! - 使用 `walkdir` 遍历目录，`glob::Pattern` 匹配文件名

use crate::error::{GulpkitError, Result};

use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一个任务目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDir {
    /// 目录名（如 `A12`）
    pub name: String,
    /// 编号（如 12）
    pub id: u64,
    pub path: PathBuf,
}

impl TaskDir {
    /// 任务目录内的文件
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// 任务目录收集器
pub struct TaskDirs {
    root: PathBuf,
    prefix: String,
}

impl TaskDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: "A".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// 解析目录名中的编号；不符合 `<前缀><数字>` 时返回 None
    pub fn parse_id(&self, name: &str) -> Option<u64> {
        let rest = name.strip_prefix(&self.prefix)?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }

    /// 收集任务目录（按编号升序）
    pub fn collect(&self) -> Result<Vec<TaskDir>> {
        if !self.root.is_dir() {
            return Err(GulpkitError::DirectoryNotFound {
                path: self.root.display().to_string(),
            });
        }

        let entries = fs::read_dir(&self.root).map_err(|e| GulpkitError::read(&self.root, e))?;
        let mut tasks: Vec<TaskDir> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                self.parse_id(&name).map(|id| TaskDir {
                    name,
                    id,
                    path: e.path(),
                })
            })
            .collect();

        tasks.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
        Ok(tasks)
    }

    /// 收集任务目录；为空时报错
    pub fn collect_non_empty(&self) -> Result<Vec<TaskDir>> {
        let tasks = self.collect()?;
        if tasks.is_empty() {
            return Err(GulpkitError::NoTasksFound {
                root: self.root.display().to_string(),
                prefix: self.prefix.clone(),
            });
        }
        Ok(tasks)
    }
}

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器（默认匹配所有文件）
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s)
                    .map_err(|e| GulpkitError::InvalidArgument(format!("pattern '{}': {}", s, e)))
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }
        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }

    /// 检查文件名是否匹配任一模式
    fn matches(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_dirs_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A10", "A2", "A1", "Ab", "B3", "A"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("A5"), "file, not dir").unwrap();

        let tasks = TaskDirs::new(dir.path()).collect().unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A2", "A10"]);
        assert_eq!(tasks[2].id, 10);
    }

    #[test]
    fn test_task_dirs_custom_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["VO_3", "VO_12", "A1"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let tasks = TaskDirs::new(dir.path()).with_prefix("VO_").collect().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 3);
    }

    #[test]
    fn test_missing_root_and_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TaskDirs::new(dir.path().join("nope")).collect().is_err());
        assert!(matches!(
            TaskDirs::new(dir.path()).collect_non_empty(),
            Err(GulpkitError::NoTasksFound { .. })
        ));
    }

    #[test]
    fn test_file_collector_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["X1.gin", "X2.gin", "A1.gin", "run.gout", "sub/deep.gout"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let gins = FileCollector::new(dir.path())
            .with_pattern("X*.gin")
            .unwrap()
            .collect();
        assert_eq!(gins.len(), 2);

        let gouts = FileCollector::new(dir.path())
            .with_pattern("*.gout")
            .unwrap()
            .recursive(true)
            .collect();
        assert_eq!(gouts.len(), 2);

        assert_eq!(FileCollector::new(dir.path()).collect().len(), 4);
    }
}
