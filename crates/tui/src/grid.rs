//! Poster grid model and geometry.
//!
//! The grid is a fixed three-column layout addressed by a single tile
//! index; rows scroll, columns do not. Geometry lives here so cursor and
//! scrolling behavior stays testable away from the terminal.

use gamedeck_core::GameRecord;
use tracing::warn;

/// Columns in the poster grid.
pub const GRID_COLUMNS: usize = 3;

/// Poster readiness for a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterStatus {
    /// Download still in flight; the tile shows a placeholder.
    Loading,
    /// Cover art arrived.
    Loaded,
    /// Download failed; the tile stays with a struck placeholder.
    Failed,
}

/// A single grid cell rendering one game's cover art.
#[derive(Debug, Clone)]
pub struct Tile {
    /// The record this tile belongs to.
    pub record: GameRecord,
    /// Poster download state.
    pub poster: PosterStatus,
}

/// Build one tile per record that carries cover art. Records with an
/// empty image URL are logged and skipped, never rendered.
pub fn build_tiles(records: &[GameRecord]) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for record in records {
        if record.has_poster() {
            tiles.push(Tile {
                record: record.clone(),
                poster: PosterStatus::Loading,
            });
        } else {
            warn!(game = %record.name, "No image available for game; tile skipped");
        }
    }
    tiles
}

/// Row a tile index falls in.
pub fn row_of(index: usize) -> usize {
    index / GRID_COLUMNS
}

/// Rows needed to hold `len` tiles.
pub fn row_count(len: usize) -> usize {
    (len + GRID_COLUMNS - 1) / GRID_COLUMNS
}

/// Move the cursor by whole rows and/or columns, clamped to the tile
/// range. An empty grid pins the cursor at zero.
pub fn step(cursor: usize, len: usize, delta_rows: isize, delta_cols: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let delta = delta_rows * GRID_COLUMNS as isize + delta_cols;
    let mut idx = cursor as isize + delta;
    if idx < 0 {
        idx = 0;
    } else if idx >= len as isize {
        idx = len as isize - 1;
    }
    idx as usize
}

/// Scroll offset (in rows) that keeps `cursor_row` on screen, moving the
/// window as little as possible.
pub fn scroll_offset(cursor_row: usize, offset: usize, visible_rows: usize, total_rows: usize) -> usize {
    if total_rows == 0 || visible_rows == 0 {
        return 0;
    }
    let mut offset = offset;
    if cursor_row < offset {
        offset = cursor_row;
    } else if cursor_row >= offset + visible_rows {
        offset = cursor_row + 1 - visible_rows;
    }
    offset.min(total_rows.saturating_sub(visible_rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, image_url: &str) -> GameRecord {
        GameRecord {
            name: name.to_string(),
            description: "desc".to_string(),
            release_date: "2020-01-01".to_string(),
            image_url: image_url.to_string(),
        }
    }

    #[test]
    fn records_without_artwork_get_no_tile() {
        let records = vec![
            record("with art", "https://img.example/a.jpg"),
            record("no art", ""),
            record("more art", "https://img.example/b.jpg"),
        ];
        let tiles = build_tiles(&records);
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|tile| tile.record.name != "no art"));
        assert!(tiles.iter().all(|tile| tile.poster == PosterStatus::Loading));
    }

    #[test]
    fn step_moves_within_rows_and_columns() {
        // 7 tiles: rows [0 1 2] [3 4 5] [6]
        assert_eq!(step(0, 7, 0, 1), 1);
        assert_eq!(step(1, 7, 1, 0), 4);
        assert_eq!(step(4, 7, -1, 0), 1);
        assert_eq!(step(6, 7, 0, -1), 5);
    }

    #[test]
    fn step_clamps_at_the_edges() {
        assert_eq!(step(0, 7, -1, 0), 0);
        assert_eq!(step(0, 7, 0, -1), 0);
        assert_eq!(step(5, 7, 1, 0), 6, "down into a partial last row clamps to the last tile");
        assert_eq!(step(6, 7, 1, 0), 6);
        assert_eq!(step(3, 0, 1, 1), 0, "empty grid pins to zero");
    }

    #[test]
    fn scrolling_follows_the_cursor_row() {
        assert_eq!(scroll_offset(0, 0, 2, 5), 0);
        assert_eq!(scroll_offset(2, 0, 2, 5), 1, "cursor below the window scrolls down");
        assert_eq!(scroll_offset(0, 3, 2, 5), 0, "cursor above the window scrolls up");
        assert_eq!(scroll_offset(4, 4, 2, 5), 3, "offset never leaves a blank window");
        assert_eq!(scroll_offset(1, 0, 0, 5), 0, "zero-height window stays put");
    }

    #[test]
    fn row_helpers_agree() {
        assert_eq!(row_of(0), 0);
        assert_eq!(row_of(2), 0);
        assert_eq!(row_of(3), 1);
        assert_eq!(row_count(0), 0);
        assert_eq!(row_count(3), 1);
        assert_eq!(row_count(7), 3);
    }
}
