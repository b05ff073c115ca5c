//! CSV loading and the memoized dataset cache.
//!
//! Tables are read once with polars, converted to typed records, and kept
//! behind an `Arc` until one of the input files changes on disk.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::config::DataConfig;
use crate::error::{DashboardError, Result};
use crate::types::{
    Dataset, DeliveryRecord, MatchOutcome, MatchRecord, PlayerStat, Table, TossDecision,
};

/// Locations of the three input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub matches: PathBuf,
    pub deliveries: PathBuf,
    pub player_stats: PathBuf,
}

impl DataPaths {
    fn all(&self) -> [&Path; 3] {
        [&self.matches, &self.deliveries, &self.player_stats]
    }
}

impl From<&DataConfig> for DataPaths {
    fn from(config: &DataConfig) -> Self {
        Self {
            matches: config.matches_path(),
            deliveries: config.deliveries_path(),
            player_stats: config.player_stats_path(),
        }
    }
}

/// A raw CSV read, before conversion to records.
struct RawTable {
    df: DataFrame,
    path: String,
}

impl RawTable {
    fn read(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        if !path.is_file() {
            return Err(DashboardError::data_unavailable(path_str, "file not found"));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| DashboardError::data_unavailable(path_str.clone(), e))?;

        debug!("Read {} rows x {} columns from {}", df.height(), df.width(), path_str);
        Ok(Self { df, path: path_str })
    }

    fn height(&self) -> usize {
        self.df.height()
    }

    fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Column values as text; all nulls when the column is absent.
    fn text(&self, name: &str) -> Result<Vec<Option<String>>> {
        let Ok(column) = self.df.column(name) else {
            return Ok(vec![None; self.height()]);
        };
        let cast = column
            .cast(&DataType::String)
            .map_err(|e| DashboardError::data_unavailable(self.path.clone(), e))?;
        let values = cast
            .str()
            .map_err(|e| DashboardError::data_unavailable(self.path.clone(), e))?;

        Ok(values
            .into_iter()
            .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
            .collect())
    }

    /// Column values as floats; unparseable cells become null.
    fn float(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let Ok(column) = self.df.column(name) else {
            return Ok(vec![None; self.height()]);
        };
        let cast = column
            .cast(&DataType::Float64)
            .map_err(|e| DashboardError::data_unavailable(self.path.clone(), e))?;
        let values = cast
            .f64()
            .map_err(|e| DashboardError::data_unavailable(self.path.clone(), e))?;

        Ok(values.into_iter().collect())
    }

    fn int(&self, name: &str) -> Result<Vec<Option<i64>>> {
        Ok(self
            .float(name)?
            .into_iter()
            .map(|v| v.filter(|f| f.is_finite()).map(|f| f as i64))
            .collect())
    }

    /// Leading rows as text; only the head of each column is cast.
    fn preview(&self, rows: usize) -> Result<Vec<Vec<String>>> {
        let head = RawTable {
            df: self.df.head(Some(rows)),
            path: self.path.clone(),
        };
        let mut preview = vec![Vec::with_capacity(head.df.width()); head.height()];
        for name in head.column_names() {
            let values = head.text(&name)?;
            for (row, value) in preview.iter_mut().zip(values) {
                row.push(value.unwrap_or_default());
            }
        }
        Ok(preview)
    }
}

/// Load match records.
pub fn load_matches<P: AsRef<Path>>(path: P, preview_rows: usize) -> Result<Table<MatchRecord>> {
    let raw = RawTable::read(path.as_ref())?;

    let ids = raw.int("id")?;
    let cities = raw.text("city")?;
    let dates = raw.text("date")?;
    let team1 = raw.text("team1")?;
    let team2 = raw.text("team2")?;
    let toss_winners = raw.text("toss_winner")?;
    let toss_decisions = raw.text("toss_decision")?;
    let results = raw.text("result")?;
    let winners = raw.text("winner")?;
    let win_by_runs = raw.int("win_by_runs")?;
    let win_by_wickets = raw.int("win_by_wickets")?;
    let venues = raw.text("venue")?;

    let mut rows = Vec::with_capacity(raw.height());
    for i in 0..raw.height() {
        rows.push(MatchRecord {
            id: ids[i],
            city: cities[i].clone(),
            date: dates[i].clone(),
            team1: team1[i].clone(),
            team2: team2[i].clone(),
            toss_winner: toss_winners[i].clone(),
            toss_decision: toss_decisions[i].as_deref().map(TossDecision::parse),
            result: results[i].as_deref().map(MatchOutcome::parse),
            winner: winners[i].clone(),
            win_by_runs: win_by_runs[i],
            win_by_wickets: win_by_wickets[i],
            venue: venues[i].clone(),
        });
    }

    let conflicting = rows.iter().filter(|r| r.has_conflicting_margins()).count();
    if conflicting > 0 {
        warn!(
            "{} match rows have both win_by_runs and win_by_wickets positive",
            conflicting
        );
    }

    let mut table = Table::new("matches", raw.column_names(), rows);
    table.preview = raw.preview(preview_rows)?;
    info!("Loaded {} matches from {}", table.len(), raw.path);
    Ok(table)
}

/// Load delivery records.
pub fn load_deliveries<P: AsRef<Path>>(
    path: P,
    preview_rows: usize,
) -> Result<Table<DeliveryRecord>> {
    let raw = RawTable::read(path.as_ref())?;

    let match_ids = raw.int("match_id")?;
    let innings = raw.int("inning")?;
    let batting_teams = raw.text("batting_team")?;
    let dismissed = raw.text("player_dismissed")?;

    let rows = (0..raw.height())
        .map(|i| DeliveryRecord {
            match_id: match_ids[i],
            inning: innings[i],
            batting_team: batting_teams[i].clone(),
            player_dismissed: dismissed[i].clone(),
        })
        .collect();

    let mut table = Table::new("deliveries", raw.column_names(), rows);
    table.preview = raw.preview(preview_rows)?;
    info!("Loaded {} deliveries from {}", table.len(), raw.path);
    Ok(table)
}

/// Load the precomputed player statistics.
pub fn load_player_stats<P: AsRef<Path>>(
    path: P,
    preview_rows: usize,
) -> Result<Table<PlayerStat>> {
    let raw = RawTable::read(path.as_ref())?;

    let batsmen = raw.text("batsman")?;
    let total_runs = raw.float("total_runs")?;
    let outs = raw.float("out")?;
    let balls = raw.float("numberofballs")?;
    let averages = raw.float("average")?;
    let strikerates = raw.float("strikerate")?;

    let rows = (0..raw.height())
        .map(|i| PlayerStat {
            batsman: batsmen[i].clone(),
            total_runs: total_runs[i],
            out: outs[i],
            balls: balls[i],
            average: averages[i],
            strikerate: strikerates[i],
        })
        .collect();

    let mut table = Table::new("player statistics", raw.column_names(), rows);
    table.preview = raw.preview(preview_rows)?;
    info!("Loaded {} player rows from {}", table.len(), raw.path);
    Ok(table)
}

/// Load all three tables; any missing or unreadable file aborts the load.
///
/// `preview_rows` leading rows of each table are also kept as text.
pub fn load_dataset(paths: &DataPaths, preview_rows: usize) -> Result<Dataset> {
    Ok(Dataset {
        matches: load_matches(&paths.matches, preview_rows)?,
        deliveries: load_deliveries(&paths.deliveries, preview_rows)?,
        player_stats: load_player_stats(&paths.player_stats, preview_rows)?,
    })
}

/// Identity of one input file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|e| DashboardError::data_unavailable(path.display().to_string(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

struct CachedDataset {
    stamps: Vec<FileStamp>,
    dataset: Arc<Dataset>,
}

/// Process-scoped memoized loader keyed by file path, size, and modification time.
pub struct DatasetCache {
    paths: DataPaths,
    preview_rows: usize,
    state: Mutex<Option<CachedDataset>>,
}

impl DatasetCache {
    pub fn new(paths: DataPaths, preview_rows: usize) -> Self {
        Self {
            paths,
            preview_rows,
            state: Mutex::new(None),
        }
    }

    fn stamps(&self) -> Result<Vec<FileStamp>> {
        self.paths.all().into_iter().map(FileStamp::of).collect()
    }

    /// Return the loaded dataset, reading from disk only when the inputs changed.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        let stamps = self.stamps()?;

        // A poisoned lock only means a previous load panicked; the slot is still usable.
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = state.as_ref() {
            if cached.stamps == stamps {
                debug!("Dataset cache hit");
                return Ok(Arc::clone(&cached.dataset));
            }
            info!("Input files changed, reloading dataset");
        }

        let dataset = Arc::new(load_dataset(&self.paths, self.preview_rows)?);
        *state = Some(CachedDataset {
            stamps,
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    pub(crate) const MATCHES_CSV: &str = "\
id,season,city,date,team1,team2,toss_winner,toss_decision,result,dl_applied,winner,win_by_runs,win_by_wickets,player_of_match,venue
1,2008,Bangalore,18-04-2008,A,B,A,bat,normal,0,A,10,0,X,Stadium One
2,2008,Chandigarh,19-04-2008,B,C,C,field,normal,0,B,0,5,Y,Stadium Two
3,2009,Delhi,20-04-2009,A,C,A,bat,no result,0,A,0,0,Z,Stadium One
";

    pub(crate) const DELIVERIES_CSV: &str = "\
match_id,inning,batting_team,bowling_team,over,ball,batsman,non_striker,bowler,batsman_runs,extra_runs,total_runs,player_dismissed,dismissal_kind
1,1,A,B,1,1,P1,P2,Q1,0,1,1,,
1,1,A,B,1,2,P1,P2,Q1,4,0,4,,
1,1,A,B,1,3,P1,P2,Q1,0,0,0,P1,bowled
2,1,B,C,1,1,P3,P4,Q2,6,0,6,,
";

    pub(crate) const PLAYERS_CSV: &str = "\
batsman,total_runs,out,numberofballs,average,strikerate
P1,4,1,3,4.0,133.3
P3,6,0,1,,600.0
";

    pub(crate) fn write_dataset(dir: &Path, players: &str) -> DataPaths {
        let paths = DataPaths {
            matches: dir.join("matches.csv"),
            deliveries: dir.join("deliveries.csv"),
            player_stats: dir.join("most_runs_average_strikerate.csv"),
        };
        fs::write(&paths.matches, MATCHES_CSV).unwrap();
        fs::write(&paths.deliveries, DELIVERIES_CSV).unwrap();
        fs::write(&paths.player_stats, players).unwrap();
        paths
    }

    #[test]
    fn test_load_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);

        let dataset = load_dataset(&paths, 5).unwrap();

        assert_eq!(dataset.matches.len(), 3);
        assert_eq!(dataset.matches.shape(), (3, 15));
        assert_eq!(dataset.deliveries.len(), 4);
        assert_eq!(dataset.player_stats.len(), 2);

        let first = &dataset.matches.rows[0];
        assert_eq!(first.winner.as_deref(), Some("A"));
        assert_eq!(first.toss_decision, Some(TossDecision::Bat));
        assert_eq!(first.date.as_deref(), Some("18-04-2008"));
        assert_eq!(first.win_by_runs, Some(10));
        assert_eq!(dataset.matches.rows[2].result, Some(MatchOutcome::NoResult));

        let p3 = &dataset.player_stats.rows[1];
        assert_eq!(p3.average, None);
        assert!((p3.strikerate.unwrap() - 600.0).abs() < 0.01);

        assert_eq!(dataset.deliveries.rows[2].player_dismissed.as_deref(), Some("P1"));
        assert_eq!(dataset.deliveries.rows[0].player_dismissed, None);
    }

    #[test]
    fn test_preview_keeps_leading_rows_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);

        let matches = load_matches(&paths.matches, 2).unwrap();
        assert_eq!(matches.preview.len(), 2);
        assert_eq!(matches.preview[0][0], "1");
        assert_eq!(matches.preview[0][3], "18-04-2008");
        assert_eq!(matches.preview[0].len(), matches.columns.len());

        let matches = load_matches(&paths.matches, 10).unwrap();
        assert_eq!(matches.preview.len(), 3);
        assert_eq!(matches.preview[2][10], "A");
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);
        fs::remove_file(&paths.deliveries).unwrap();

        let err = load_dataset(&paths, 5).unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
        assert!(err.to_string().contains("deliveries.csv"));

        let cache = DatasetCache::new(paths, 5);
        assert!(matches!(
            cache.get(),
            Err(DashboardError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_player_table_without_strikerate() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), "batsman,total_runs\nP1,4\n");

        let players = load_player_stats(&paths.player_stats, 5).unwrap();
        assert!(players.has_column("total_runs"));
        assert!(!players.has_column("strikerate"));
        assert_eq!(players.rows[0].strikerate, None);
    }

    #[test]
    fn test_cache_returns_same_dataset_until_files_change() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);
        let cache = DatasetCache::new(paths.clone(), 5);

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Different length guarantees a new stamp even on coarse mtime filesystems
        let extra_row = format!("{}P9,1,0,1,1.0,100.0\n", PLAYERS_CSV);
        fs::write(&paths.player_stats, extra_row).unwrap();

        let third = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.player_stats.len(), 3);
        assert_eq!(first.player_stats.len(), 2);
    }

    #[test]
    fn test_cache_reloads_same_length_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);
        let cache = DatasetCache::new(paths.clone(), 5);

        let first = cache.get().unwrap();
        assert_eq!(first.player_stats.rows[0].batsman.as_deref(), Some("P1"));

        // Same byte length, so only the modification time tells the files apart
        let renamed = PLAYERS_CSV.replace("P1,", "P8,");
        assert_eq!(renamed.len(), PLAYERS_CSV.len());
        fs::write(&paths.player_stats, renamed).unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        fs::File::options()
            .write(true)
            .open(&paths.player_stats)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.player_stats.rows[0].batsman.as_deref(), Some("P8"));
    }
}
