//! ASCII renderer for match snapshots.
//!
//! One character per tile, with units drawn over the terrain. Handy for
//! eyeballing a headless run in the terminal.

use td_core::components::EnemyKind;
use td_core::grid::{GridPos, TileKind};
use td_core::snapshot::Snapshot;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Hide tiles (and the units on them) outside vision.
    pub show_fog: bool,
    /// Draw units over the terrain.
    pub show_units: bool,
    /// Append a symbol legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_fog: true,
            show_units: true,
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Character for a terrain tile.
pub fn tile_char(kind: TileKind) -> char {
    match kind {
        TileKind::Empty => '.',
        TileKind::Path => ':',
        TileKind::Wall => '#',
        TileKind::Base => 'B',
        TileKind::Spawn => 'S',
        TileKind::Turret => 'T',
        TileKind::Sniper => 'N',
        TileKind::Rubble => 'r',
        TileKind::ResourceStone => 's',
        TileKind::ResourceMetal => 'm',
        TileKind::Quarry => 'Q',
        TileKind::Forge => 'F',
        TileKind::AbandonedQuarry => 'q',
        TileKind::AbandonedForge => 'f',
        TileKind::DroneFactory => 'D',
        TileKind::AbandonedDroneFactory => 'd',
        TileKind::MaintenanceHub => 'H',
        TileKind::Wreckage => 'w',
        TileKind::ExtractionPoint => 'X',
    }
}

fn tile_color(kind: TileKind) -> &'static str {
    match kind {
        TileKind::Turret | TileKind::Sniper => colors::GREEN,
        TileKind::ResourceStone | TileKind::ResourceMetal | TileKind::ExtractionPoint => {
            colors::YELLOW
        }
        TileKind::Wall | TileKind::Rubble | TileKind::Wreckage => colors::GRAY,
        _ => "",
    }
}

fn enemy_char(kind: EnemyKind) -> char {
    match kind {
        EnemyKind::Standard => 'e',
        EnemyKind::Scout => 'c',
        EnemyKind::Tank => 'E',
    }
}

const HERO: char = '@';
const DRONE: char = '*';
const JOB: char = '+';
const FOG: char = '?';

const LEGEND: &str =
    "@=hero e/c/E=enemy *=drone +=build site T/N=turret B=base S=spawn X=extraction ?=fog";

/// Render a snapshot as ASCII art.
pub fn render_ascii(snapshot: &Snapshot, config: &AsciiConfig) -> String {
    let grid = &snapshot.grid;
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let mut cells: Vec<Vec<(char, &'static str)>> = grid
        .rows()
        .into_iter()
        .map(|row| row.into_iter().map(|k| (tile_char(k), tile_color(k))).collect())
        .collect();

    let mut place = |pos: Option<GridPos>, ch: char, color: &'static str| {
        if let Some(pos) = pos {
            if let Some(cell) = cells
                .get_mut(pos.y as usize)
                .and_then(|row| row.get_mut(pos.x as usize))
            {
                *cell = (ch, color);
            }
        }
    };

    if config.show_units {
        for job in &snapshot.jobs {
            place(Some(job.pos), JOB, colors::CYAN);
        }
        for drone in &snapshot.drones {
            place(drone.position.to_grid(), DRONE, "");
        }
        for enemy in &snapshot.enemies {
            place(enemy.position.to_grid(), enemy_char(enemy.kind), colors::RED);
        }
        if let Some(hero) = &snapshot.hero {
            place(hero.position.to_grid(), HERO, colors::CYAN);
        }
    }

    if config.show_fog {
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if !snapshot.fog.is_visible(GridPos::new(x as u32, y as u32)) {
                    *cell = (FOG, colors::GRAY);
                }
            }
        }
    }

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    let mut output = format!(
        "{bold}Tick {} | {:?} | Wave {} | Lives {} | Stone {} Metal {} | Extraction {}%{reset}\n",
        snapshot.tick,
        snapshot.phase,
        snapshot.wave.number,
        snapshot.lives,
        snapshot.resources.stone,
        snapshot.resources.metal,
        snapshot.extraction.progress_pct,
    );

    let border = "-".repeat(width);
    output.push_str(&format!("+{border}+\n"));
    for row in cells.iter().take(height) {
        output.push('|');
        for &(ch, color) in row {
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(ch);
                output.push_str(colors::RESET);
            } else {
                output.push(ch);
            }
        }
        output.push_str("|\n");
    }
    output.push_str(&format!("+{border}+\n"));

    if config.show_legend {
        output.push_str(LEGEND);
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::visibility::FogGrid;
    use td_test_utils::fixtures::lane_simulation;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            show_fog: false,
            show_units: false,
            show_legend: false,
            use_color: false,
        }
    }

    #[test]
    fn test_tile_chars_are_distinct() {
        let kinds = [
            TileKind::Empty,
            TileKind::Path,
            TileKind::Wall,
            TileKind::Base,
            TileKind::Spawn,
            TileKind::Turret,
            TileKind::Sniper,
            TileKind::Rubble,
            TileKind::ResourceStone,
            TileKind::ResourceMetal,
            TileKind::Quarry,
            TileKind::Forge,
            TileKind::AbandonedQuarry,
            TileKind::AbandonedForge,
            TileKind::DroneFactory,
            TileKind::AbandonedDroneFactory,
            TileKind::MaintenanceHub,
            TileKind::Wreckage,
            TileKind::ExtractionPoint,
        ];
        let mut chars: Vec<char> = kinds.iter().map(|&k| tile_char(k)).collect();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), kinds.len());
        assert!(!chars.contains(&FOG));
        assert!(!chars.contains(&HERO));
    }

    #[test]
    fn test_render_terrain() {
        let snapshot = lane_simulation(1).snapshot();
        let output = render_ascii(&snapshot, &plain());
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("Tick 0"));
        assert_eq!(lines[1], "+------------+");
        assert_eq!(lines[2], "|S::::::::::B|");
        assert_eq!(lines[4], "|......sr....|");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_units_and_fog_overlay() {
        let mut snapshot = lane_simulation(1).snapshot();
        let config = AsciiConfig {
            use_color: false,
            ..AsciiConfig::default()
        };
        let output = render_ascii(&snapshot, &config);
        assert_eq!(output.contains(HERO), snapshot.hero.is_some());
        assert!(output.contains("?=fog"));

        snapshot.fog = FogGrid::new(snapshot.grid.width(), snapshot.grid.height());
        let output = render_ascii(&snapshot, &config);
        assert!(!output.contains(HERO));
        assert_eq!(output.lines().nth(2), Some("|????????????|"));
    }

    #[test]
    fn test_color_wraps_cells() {
        let snapshot = lane_simulation(1).snapshot();
        let config = AsciiConfig {
            use_color: true,
            ..plain()
        };
        let output = render_ascii(&snapshot, &config);
        assert!(output.contains(&format!("{}s{}", colors::YELLOW, colors::RESET)));
    }
}
