//! # analyze freq-lookup 实现
//!
//! 打印频率归档中某个任务的全部频率以及归档中的任务数。
//!
//! ## 依赖关系
//! - 使用 `commands/collect/freq.rs` 的归档读取

use crate::cli::analyze::FreqLookupArgs;
use crate::commands::collect::freq::{read_archive, FreqArchive};
use crate::error::{GulpkitError, Result};
use crate::parsers::table::normalize_taskid;
use crate::utils::output;

/// 执行 analyze freq-lookup
pub fn execute(args: FreqLookupArgs) -> Result<()> {
    let archive = read_archive(&args.archive)?;
    let freqs = lookup(&archive, &args.taskid)?;
    for f in freqs {
        println!("{}", f);
    }
    output::print_info(&format!(
        "{} frequencies; archive holds {} tasks",
        freqs.len(),
        archive.len()
    ));
    Ok(())
}

/// 按规范化后的任务编号查找
pub fn lookup<'a>(archive: &'a FreqArchive, taskid: &str) -> Result<&'a [f64]> {
    let key = normalize_taskid(taskid);
    archive
        .get(&key)
        .map(Vec::as_slice)
        .ok_or_else(|| GulpkitError::InvalidArgument(format!("task {} is not in the archive", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_id() {
        let mut archive = FreqArchive::new();
        archive.insert("12".into(), vec![0.0, 101.5]);
        assert_eq!(lookup(&archive, "A12").unwrap(), &[0.0, 101.5]);
        assert_eq!(lookup(&archive, "12.0").unwrap().len(), 2);
        assert!(lookup(&archive, "13").is_err());
    }
}
