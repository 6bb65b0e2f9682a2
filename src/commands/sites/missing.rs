//! # sites missing 实现
//!
//! 对目录中每个 `A*.gin`，列出主结构中有而该输入中没有的固定位点坐标。
//!
//! ## 依赖关系
//! - 使用 `parsers/gin.rs` 的固定位点提取

use crate::batch::FileCollector;
use crate::cli::sites::MissingArgs;
use crate::error::{GulpkitError, Result};
use crate::parsers::gin;
use crate::utils::{fsio, output, progress};

use std::collections::HashSet;
use std::path::PathBuf;

/// 执行 sites missing
pub fn execute(args: MissingArgs) -> Result<()> {
    output::print_header("Finding Missing Fixed Sites");

    let master = fsio::read_text(&args.master)?;
    let master_coords = gin::fixed_site_coords(&master);
    output::print_info(&format!("{} fixed sites in master", master_coords.len()));

    let decks = numbered_decks(&args.dir)?;
    let pb = progress::create_progress_bar(decks.len() as u64, "Comparing");
    let mut lines = Vec::new();
    for (stem, path) in &decks {
        let text = fsio::read_text(path)?;
        for coords in missing_sites(&master_coords, &text) {
            lines.push(format!("{} {}", stem, coords.join(" ")));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    fsio::write_lines(&args.output, &lines)?;
    output::print_written("missing sites", &args.output, lines.len());
    Ok(())
}

/// `A<n>.gin` 文件（按 n 排序），返回 (文件名主干, 路径)
pub fn numbered_decks(dir: &std::path::Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(GulpkitError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }
    let mut decks: Vec<(u64, String, PathBuf)> = FileCollector::new(dir)
        .with_pattern("A*.gin")?
        .collect()
        .into_iter()
        .filter_map(|p| {
            let stem = p.file_stem()?.to_string_lossy().into_owned();
            let id = stem.strip_prefix('A')?.parse().ok()?;
            Some((id, stem, p))
        })
        .collect();
    decks.sort_by_key(|(id, _, _)| *id);
    Ok(decks.into_iter().map(|(_, stem, p)| (stem, p)).collect())
}

/// 主结构中存在、输入中缺失的固定位点（按主结构顺序，去重）
pub fn missing_sites(master: &[[String; 3]], deck: &str) -> Vec<[String; 3]> {
    let present: HashSet<[String; 3]> = gin::fixed_site_coords(deck).into_iter().collect();
    let mut seen = HashSet::new();
    master
        .iter()
        .filter(|c| !present.contains(*c) && seen.insert((*c).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "\
O core 1.0 1.0 1.0 0 1 0 1 1 1
O core 2.0 2.0 2.0 0 1 0 1 1 1
O core 3.0 3.0 3.0 0 1 0 1 1 1
";

    #[test]
    fn test_missing_sites() {
        let master = gin::fixed_site_coords(MASTER);
        let deck = "O core 1.0 1.0 1.0 0 1 0 1 1 1\nO core 3.0 3.0 3.0 0 1 0 1 1 1\n";
        let missing = missing_sites(&master, deck);
        assert_eq!(missing, vec![["2.0".to_string(), "2.0".to_string(), "2.0".to_string()]]);
    }

    #[test]
    fn test_execute_writes_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("Master.gin");
        std::fs::write(&master, MASTER).unwrap();
        let decks = dir.path().join("run");
        std::fs::create_dir(&decks).unwrap();
        std::fs::write(decks.join("A10.gin"), "O core 1.0 1.0 1.0 0 1 0 1 1 1\n").unwrap();
        std::fs::write(decks.join("A2.gin"), MASTER.lines().take(2).collect::<Vec<_>>().join("\n")).unwrap();

        let out = dir.path().join("VO_position.txt");
        execute(MissingArgs {
            dir: decks,
            master,
            output: out.clone(),
        })
        .unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert_eq!(
            text,
            "A2 3.0 3.0 3.0\nA10 2.0 2.0 2.0\nA10 3.0 3.0 3.0\n"
        );
    }
}
