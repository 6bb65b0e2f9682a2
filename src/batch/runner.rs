//! # 批量执行器
//!
//! 并行执行批量处理任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代（结果顺序与输入一致）
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/` 下的批处理命令调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{GulpkitError, Result};
use crate::utils::progress;

use rayon::prelude::*;

/// 单个任务处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    /// 处理成功
    Success(String),
    /// 跳过（如缺少输入文件）
    Skipped(String),
    /// 处理失败
    Failed(String, String), // (任务名, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 成功数量
    pub success: usize,
    /// 跳过数量
    pub skipped: usize,
    /// 失败数量
    pub failed: usize,
    /// 跳过原因
    pub skips: Vec<String>,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(_) => self.success += 1,
            ProcessResult::Skipped(msg) => {
                self.skipped += 1;
                self.skips.push(msg);
            }
            ProcessResult::Failed(task, err) => {
                self.failed += 1;
                self.failures.push((task, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器（0 = 所有 CPU 核）
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 实际使用的线程数
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    fn pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| GulpkitError::Other(format!("Failed to build thread pool: {}", e)))
    }

    /// 并行映射，返回与输入同序的结果
    pub fn map<I, T, F>(&self, items: &[I], message: &str, f: F) -> Result<Vec<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        let label = format!("{} ({} jobs)", message, self.jobs());
        let pb = progress::create_progress_bar(items.len() as u64, &label);
        let pool = self.pool()?;

        let results = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let out = f(item);
                    pb.inc(1);
                    out
                })
                .collect()
        });

        pb.finish_and_clear();
        Ok(results)
    }

    /// 并行处理并汇总成功/跳过/失败
    pub fn run<I, F>(&self, items: &[I], message: &str, processor: F) -> Result<BatchResult>
    where
        I: Sync,
        F: Fn(&I) -> ProcessResult + Sync + Send,
    {
        let results = self.map(items, message, processor)?;

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_preserves_order() {
        let runner = BatchRunner::new(4);
        let items: Vec<u64> = (0..100).collect();
        let out = runner.map(&items, "square", |x| x * x).unwrap();
        assert_eq!(out[10], 100);
        assert_eq!(out.len(), 100);
    }

    #[test]
    fn test_run_counts_outcomes() {
        let runner = BatchRunner::new(2);
        let items = vec![1, 2, 3, 4, 5];
        let result = runner
            .run(&items, "classify", |&n| match n % 3 {
                0 => ProcessResult::Failed(format!("A{}", n), "boom".into()),
                1 => ProcessResult::Success(format!("A{}", n)),
                _ => ProcessResult::Skipped(format!("A{}", n)),
            })
            .unwrap();
        assert_eq!(result.success, 2);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.total(), 5);
        assert_eq!(result.failures[0].0, "A3");
    }

    #[test]
    fn test_zero_jobs_uses_all_cores() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }
}
