//! # sites locate 实现
//!
//! 与主结构比较找出每个任务中缺失的氧（空位），写出 `VO.txt` 与各物种位点表。
//! CN 与类型从主结构中按坐标查找；查不到的位点不写出。
//!
//! ## 依赖关系
//! - 使用 `parsers/gin.rs` 的带标签位点与坐标映射
//! - 使用 `parsers/site_table.rs` 写表

use super::report;
use crate::batch::{BatchRunner, ProcessResult, TaskDirs};
use crate::cli::sites::LocateArgs;
use crate::error::Result;
use crate::models::{SiteKind, SiteRecord};
use crate::parsers::gin::{self, CoordKey, LabelledSite};
use crate::parsers::site_table;
use crate::utils::{fsio, output};

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// 坐标 → (CN, 类型)
type SiteMap = HashMap<CoordKey, (String, String)>;

/// 执行 sites locate
pub fn execute(args: LocateArgs) -> Result<()> {
    output::print_header("Locating Oxygen Vacancies");

    let master = fsio::read_text(&args.master)?;
    let map = gin::site_map(&master);
    let master_anions = gin::labelled_sites(&master, std::slice::from_ref(&args.anion));
    output::print_info(&format!(
        "Master: {} labelled sites, {} {} sites",
        map.len(),
        master_anions.len(),
        args.anion
    ));

    let tasks = TaskDirs::new(&args.input_base)
        .with_prefix(&args.batch.prefix)
        .collect_non_empty()?;
    let runner = BatchRunner::new(args.batch.jobs);

    let result = runner.run(&tasks, "Locating", |task| {
        let deck_path = task.file(&args.gin);
        if !deck_path.is_file() {
            return ProcessResult::Skipped(format!("File not found: {}", deck_path.display()));
        }
        let out_dir = args.output_base.join(&task.name);
        match locate_task(&deck_path, &out_dir, &master_anions, &map, &args) {
            Ok(n) => ProcessResult::Success(format!("{}: {} vacancies", task.name, n)),
            Err(e) => ProcessResult::Failed(task.name.clone(), e.to_string()),
        }
    })?;

    report(&result, "Located vacancies in");
    Ok(())
}

fn locate_task(
    deck_path: &Path,
    out_dir: &Path,
    master_anions: &[LabelledSite],
    map: &SiteMap,
    args: &LocateArgs,
) -> Result<usize> {
    let deck = fsio::read_text(deck_path)?;
    let sites = gin::labelled_sites(&deck, &args.species);

    fsio::ensure_dir(out_dir)?;
    let vacancies = vacancy_records(master_anions, &sites, &args.anion, map, &args.center);
    site_table::write_site_table(&out_dir.join("VO.txt"), &vacancies)?;

    for sp in &args.species {
        let records: Vec<SiteRecord> = sites
            .iter()
            .filter(|s| &s.element == sp)
            .filter_map(|s| to_record(&s.element, &s.position, map, &args.center))
            .collect();
        site_table::write_site_table(&out_dir.join(format!("{}.txt", sp)), &records)?;
    }
    Ok(vacancies.len())
}

/// 主结构中存在而输入中缺失的阴离子位点
pub fn vacancy_records(
    master_anions: &[LabelledSite],
    sites: &[LabelledSite],
    anion: &str,
    map: &SiteMap,
    center: &[f64; 3],
) -> Vec<SiteRecord> {
    let present: HashSet<CoordKey> = sites
        .iter()
        .filter(|s| s.element == anion)
        .map(|s| gin::coord_key(&s.position))
        .collect();

    let mut seen = HashSet::new();
    master_anions
        .iter()
        .filter(|s| {
            let key = gin::coord_key(&s.position);
            !present.contains(&key) && seen.insert(key)
        })
        .filter_map(|s| to_record(anion, &s.position, map, center))
        .collect()
}

fn to_record(element: &str, position: &[f64; 3], map: &SiteMap, center: &[f64; 3]) -> Option<SiteRecord> {
    let (cn, kind) = map.get(&gin::coord_key(position))?;
    let mut record = SiteRecord::new(element, *position, cn.as_str()).with_kind(SiteKind::parse(kind));
    record.update_distance(center);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BatchOpts;

    const MASTER: &str = "\
cartesian
Ce core 0.0 0.0 0.0 0 1 0 1 1 1 8 bulk
O  core 1.0 0.0 0.0 0 1 0 1 1 1 4 bulk
O  core 0.0 2.0 0.0 0 1 0 1 1 1 3 surface
La core 3.0 0.0 0.0 0 1 0 1 1 1 7 surface
";

    const DECK: &str = "\
cartesian
Ce core 0.0 0.0 0.0 0 1 0 1 1 1 8 bulk
O  core 1.0 0.0 0.0 0 1 0 1 1 1 4 bulk
La core 3.0 0.0 0.0 0 1 0 1 1 1 7 surface
";

    #[test]
    fn test_vacancy_records() {
        let map = gin::site_map(MASTER);
        let anions = gin::labelled_sites(MASTER, &["O".to_string()]);
        let sites = gin::labelled_sites(DECK, &["O".to_string(), "Ce".to_string()]);
        let vo = vacancy_records(&anions, &sites, "O", &map, &[0.0; 3]);
        assert_eq!(vo.len(), 1);
        assert_eq!(vo[0].position, [0.0, 2.0, 0.0]);
        assert_eq!(vo[0].distance, 2.0);
        assert_eq!(vo[0].cn, "3");
        assert!(vo[0].is_surface());
    }

    #[test]
    fn test_execute_writes_tables() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("Master.gin");
        std::fs::write(&master, MASTER).unwrap();
        let input = dir.path().join("_data_rigid");
        std::fs::create_dir_all(input.join("A1")).unwrap();
        std::fs::write(input.join("A1/gulp_klmc.gin"), DECK).unwrap();
        let out = dir.path().join("sites");

        execute(LocateArgs {
            master,
            input_base: input,
            output_base: out.clone(),
            batch: BatchOpts {
                jobs: 1,
                prefix: "A".into(),
            },
            center: [0.0; 3],
            species: vec!["O".into(), "La".into(), "Ce".into()],
            anion: "O".into(),
            gin: "gulp_klmc.gin".into(),
        })
        .unwrap();

        let vo = site_table::read_site_table(&out.join("A1/VO.txt")).unwrap();
        assert_eq!(vo.len(), 1);
        let la = site_table::read_site_table(&out.join("A1/La.txt")).unwrap();
        assert_eq!(la[0].distance, 3.0);
        assert_eq!(la[0].cn, "7");
        assert_eq!(site_table::read_site_table(&out.join("A1/O.txt")).unwrap().len(), 1);
    }
}
