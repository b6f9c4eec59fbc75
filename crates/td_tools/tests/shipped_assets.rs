//! The levels and configs shipped in `assets/` must always validate.

use std::path::PathBuf;

use td_core::simulation::Simulation;
use td_tools::validate::{read_level, validate_data_directory, DocumentKind};

fn assets() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets")
}

#[test]
fn test_shipped_assets_validate() {
    let reports = validate_data_directory(&assets()).unwrap();
    let levels = reports
        .iter()
        .filter(|r| r.kind == DocumentKind::Level)
        .count();
    let configs = reports.len() - levels;
    assert!(levels >= 2, "expected the shipped levels, got {reports:?}");
    assert!(configs >= 3, "expected the shipped configs, got {reports:?}");
    assert!(reports.iter().all(|r| r.problems.is_empty()));
}

#[test]
fn test_shipped_levels_start_a_match() {
    for name in ["lane.json", "corridor.ron"] {
        let level = read_level(&assets().join("levels").join(name)).unwrap();
        let grid = level.to_grid().unwrap();
        let sim = Simulation::new(grid, Default::default()).unwrap();
        assert!(!sim.routes().is_empty(), "{name} has no route");
    }
}
