//! # collect freq 实现
//!
//! 把汇总表中每个任务的 `freq.txt` 合并成一张长表 `taskid,frequency`，
//! 供 `analyze ensemble --vib` 与 `analyze freq-lookup` 读取。
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的 FreqArgs
//! - 使用 `parsers/table.rs`

use crate::cli::collect::FreqArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::table::{normalize_taskid, CsvTable};
use crate::utils::{fsio, output, progress};

use std::collections::BTreeMap;
use std::path::Path;

/// 频率归档：taskid → 频率列表
pub type FreqArchive = BTreeMap<String, Vec<f64>>;

/// 执行 collect freq
pub fn execute(args: FreqArgs) -> Result<()> {
    output::print_header("Archiving Frequencies");

    let summary = CsvTable::read(&args.summary)?;
    let taskids: Vec<String> = summary
        .column("taskid")?
        .iter()
        .map(|t| normalize_taskid(t))
        .collect();
    output::print_info(&format!("{} tasks listed in '{}'", taskids.len(), args.summary.display()));

    let pb = progress::create_progress_bar(taskids.len() as u64, "Reading");
    let mut archive = FreqArchive::new();
    let mut missing = Vec::new();
    for id in &taskids {
        let path = args.root.join(format!("{}{}", args.prefix, id)).join(&args.freq_file);
        match read_frequencies(&path) {
            Ok(freqs) => {
                archive.insert(id.clone(), freqs);
            }
            Err(e) => missing.push((id.clone(), e.to_string())),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if !missing.is_empty() {
        output::print_warning(&format!("{} tasks without frequencies", missing.len()));
        output::print_failures(&missing, 10);
    }

    write_archive(&args.output, &archive)?;
    let rows = archive.values().map(Vec::len).sum();
    output::print_written("frequency archive", &args.output, rows);
    Ok(())
}

/// 读取一行一个数值的频率文件；空行忽略
pub fn read_frequencies(path: &Path) -> Result<Vec<f64>> {
    let text = fsio::read_text(path)?;
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse::<f64>()
                .map_err(|_| GulpkitError::parse("frequency list", path, format!("'{}' is not a number", l)))
        })
        .collect()
}

/// 写出 `taskid,frequency` 长表
pub fn write_archive(path: &Path, archive: &FreqArchive) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["taskid", "frequency"])?;
    for (id, freqs) in archive {
        for f in freqs {
            wtr.write_record([id.as_str(), &f.to_string()])?;
        }
    }
    wtr.flush().map_err(|e| GulpkitError::write(path, e))?;
    Ok(())
}

/// 读取频率归档，保持每个任务内的频率顺序
pub fn read_archive(path: &Path) -> Result<FreqArchive> {
    let table = CsvTable::read(path)?;
    let ids = table.column("taskid")?;
    let freqs = table.f64_column("frequency")?;

    let mut archive = FreqArchive::new();
    for (id, f) in ids.iter().zip(freqs) {
        archive.entry(normalize_taskid(id)).or_default().push(f);
    }
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("summary.csv"), "Energy,taskid\n-1.0,3\n-2.0,A5\n-3.0,9\n").unwrap();
        for (id, text) in [("3", "1.5\n-0.2\n\n"), ("5", "7\n")] {
            let task = root.join(format!("A{}", id));
            std::fs::create_dir(&task).unwrap();
            std::fs::write(task.join("freq.txt"), text).unwrap();
        }

        let out = root.join("freq.csv");
        execute(FreqArgs {
            summary: root.join("summary.csv"),
            root: root.to_path_buf(),
            freq_file: "freq.txt".into(),
            prefix: "A".into(),
            output: out.clone(),
        })
        .unwrap();

        let archive = read_archive(&out).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive["3"], vec![1.5, -0.2]);
        assert_eq!(archive["5"], vec![7.0]);
        assert!(!archive.contains_key("9"));
    }

    #[test]
    fn test_bad_frequency_line() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("freq.txt");
        std::fs::write(&p, "1.0\nnan?\n").unwrap();
        assert!(read_frequencies(&p).is_err());
    }
}
