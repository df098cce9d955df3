//! End-to-end runs over a scratch player base with a scripted candidate source

use player_base::config::PipelineConfig;
use player_base::ledger::{LedgerRows, PriorLedger};
use player_base::pipeline;
use player_base::players::load_players;
use player_base::revert::{revert_overwrites, StringTable};
use player_base::sources::{CandidateSource, Candidates};
use player_base::{Column, PlayerRecord, SourceError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLAYERS: &str = "\
player_id,full_name,birth_date,birthplace,plays,height_inches,height_cm,represented_country,best_rank,first_appearance,last_appearance,notes
1,Anna A,,,,,1.68m,,5,2010-01-04,2025-08-04,keep
2,Bella B,,Moscow,,,,,7,2019-03-04,2025-08-04,
3,Cara C,1990-01-01,\"Paris, France\",Right-Handed,\"5' 7\"\"\",1.70m,FRA,9,2012-01-02,2025-08-04,
";

const WEEK_1: &str = "\
full_name,player_id,ranking,points,movement,date
Anna A,1,5,4000,0,2025-08-04
Bella B,2,7,3000,1,2025-08-04
Cara C,3,9,2500,-1,2025-08-04
";

const WEEK_2: &str = "\
full_name,player_id,ranking,points,movement,date
Anna A,1,4,4100,1,2025-08-11
Bella B,2,8,2900,-1,2025-08-11
Cara C,3,9,2500,0,2025-08-11
Dana D,4,50,800,0,2025-08-11
";

struct ScriptedSource {
    values: HashMap<u64, Candidates>,
    fetched: Vec<u64>,
}

impl ScriptedSource {
    fn biography() -> Self {
        let mut values = HashMap::new();
        values.insert(
            1,
            Candidates::new()
                .with(Column::Birthplace, "Kyiv, Ukraine")
                .with(Column::Plays, "Left-Handed")
                .with(Column::HeightCm, "1.70m"),
        );
        values.insert(
            2,
            Candidates::new()
                .with(Column::Birthplace, "Moscow, Russia")
                .with(Column::HeightCm, "1.75m"),
        );
        Self { values, fetched: Vec::new() }
    }
}

impl CandidateSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn columns(&self) -> &[Column] {
        &Column::BIOGRAPHICAL
    }

    fn fetch(&mut self, player: &PlayerRecord) -> Result<Candidates, SourceError> {
        self.fetched.push(player.player_id);
        self.values
            .get(&player.player_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(player.full_name.clone()))
    }
}

struct CountryScript;

impl CandidateSource for CountryScript {
    fn name(&self) -> &str {
        "country"
    }

    fn columns(&self) -> &[Column] {
        &[Column::RepresentedCountry]
    }

    fn fetch(&mut self, player: &PlayerRecord) -> Result<Candidates, SourceError> {
        match player.player_id {
            4 => Ok(Candidates::new().with(Column::RepresentedCountry, "ESP")),
            _ => Ok(Candidates::new()),
        }
    }
}

fn setup() -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let rankings = dir.path().join("rankings");
    fs::create_dir_all(&rankings).unwrap();
    fs::write(rankings.join("data_2025_08_04.csv"), WEEK_1).unwrap();
    fs::write(rankings.join("data_2025_08_11.csv"), WEEK_2).unwrap();
    fs::write(rankings.join("failed_urls.csv"), "failed_urls\n").unwrap();

    let players = dir.path().join("players.csv");
    fs::write(&players, PLAYERS).unwrap();

    let mut config = PipelineConfig::with_paths(&players, &rankings, dir.path().join("changes.csv"));
    config.wiki.overwrite = true;
    (dir, config)
}

fn mark_rejected(ledger: &Path, player_id: &str, column: &str) {
    let mut table = StringTable::read(ledger).unwrap();
    let pid = table.column_index("player_id").unwrap();
    let col = table.column_index("column").unwrap();
    let reject = table.column_index("reject").unwrap();
    let row = (0..table.rows.len())
        .find(|&r| table.get(r, pid) == Some(player_id) && table.get(r, col) == Some(column))
        .expect("ledger row to mark");
    table.set(row, reject, "1");
    table.write(ledger).unwrap();
}

fn player(config: &PipelineConfig, id: u64) -> PlayerRecord {
    let table = load_players(&config.output_path).unwrap();
    let row = table.position(id).unwrap();
    table.records[row].clone()
}

#[test]
fn test_refresh_adds_new_players_and_moves_last_appearance() {
    let (_dir, config) = setup();

    let report = pipeline::refresh(&config).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.last_seen_updated, 3);
    assert_eq!(report.total, 4);

    let table = load_players(&config.output_path).unwrap();
    assert_eq!(table.ids().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(table.columns.last().map(String::as_str), Some("notes"));

    let dana = &table.records[3];
    assert_eq!(dana.full_name, "Dana D");
    assert_eq!(dana.best_rank, Some(50));
    assert_eq!(dana.first_appearance.unwrap().to_string(), "2025-08-11");
    assert!(dana.birthplace.is_empty());

    let anna = &table.records[0];
    assert_eq!(anna.last_appearance.unwrap().to_string(), "2025-08-11");
    assert_eq!(anna.extra.get("notes").map(String::as_str), Some("keep"));

    // A second refresh finds nothing new
    let again = pipeline::refresh(&config).unwrap();
    assert_eq!(again.added, 0);
    assert_eq!(again.last_seen_updated, 0);
}

#[test]
fn test_enrich_fills_blanks_and_respects_protection() {
    let (_dir, config) = setup();
    pipeline::refresh(&config).unwrap();

    let mut source = ScriptedSource::biography();
    let report = pipeline::enrich(&config, &mut source).unwrap();

    // Cara is complete and never fetched; Dana has no page
    assert_eq!(source.fetched, vec![1, 2, 4]);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.changes, 4);

    let anna = player(&config, 1);
    assert_eq!(anna.birthplace, "Kyiv, Ukraine");
    assert_eq!(anna.plays, "Left-Handed");
    // First ranked before the threshold, so the filled height stays
    assert_eq!(anna.height_cm, "1.68m");

    let bella = player(&config, 2);
    assert_eq!(bella.birthplace, "Moscow, Russia");
    assert_eq!(bella.height_cm, "1.75m");

    let ledger = LedgerRows::read(&config.ledger_path).unwrap();
    assert_eq!(ledger.len(), 4);
    let moscow = (0..ledger.len())
        .find(|&i| ledger.get(i, "player_id") == "2" && ledger.get(i, "column") == "birthplace")
        .unwrap();
    assert_eq!(ledger.get(moscow, "old_value"), "Moscow");
    assert_eq!(ledger.get(moscow, "new_value"), "Moscow, Russia");
    assert_eq!(ledger.get(moscow, "row_index"), "1");
    assert_eq!(ledger.get(moscow, "reject"), "");
}

#[test]
fn test_second_run_is_idempotent() {
    let (_dir, config) = setup();
    pipeline::refresh(&config).unwrap();
    pipeline::enrich(&config, &mut ScriptedSource::biography()).unwrap();
    let first = fs::read_to_string(&config.output_path).unwrap();

    let report = pipeline::enrich(&config, &mut ScriptedSource::biography()).unwrap();
    assert_eq!(report.changes, 0);
    assert_eq!(fs::read_to_string(&config.output_path).unwrap(), first);

    // Ledger still written, header only
    let ledger = fs::read_to_string(&config.ledger_path).unwrap();
    assert_eq!(ledger.trim(), "player_id,player_name,column,row_index,old_value,new_value,reject");
}

#[test]
fn test_rejects_survive_revert_and_rerun() {
    let (_dir, config) = setup();
    pipeline::refresh(&config).unwrap();
    pipeline::enrich(&config, &mut ScriptedSource::biography()).unwrap();

    mark_rejected(&config.ledger_path, "2", "birthplace");
    let reverted = revert_overwrites(&config.ledger_path, &config.output_path, None).unwrap();
    assert_eq!(reverted.reverted, 1);
    assert_eq!(player(&config, 2).birthplace, "Moscow");

    // The source still proposes the rejected value
    let report = pipeline::enrich(&config, &mut ScriptedSource::biography()).unwrap();
    assert_eq!(report.stats.skipped_rejected, 1);
    assert_eq!(report.changes, 0);
    assert_eq!(player(&config, 2).birthplace, "Moscow");

    let prior = PriorLedger::load(&config.ledger_path).unwrap();
    assert!(prior.is_rejected(2, "birthplace"));
    assert_eq!(prior.rejected_rows.len(), 1);
    assert_eq!(prior.rejected_rows[0].old_value, "Moscow");

    // And once more, still held
    pipeline::enrich(&config, &mut ScriptedSource::biography()).unwrap();
    assert_eq!(player(&config, 2).birthplace, "Moscow");
    assert!(PriorLedger::load(&config.ledger_path).unwrap().is_rejected(2, "birthplace"));
}

#[test]
fn test_enrich_never_blanks_known_values() {
    let (_dir, config) = setup();
    pipeline::refresh(&config).unwrap();

    let mut source = ScriptedSource::biography();
    source.values.insert(3, Candidates::new().with(Column::Birthplace, ""));
    // Make Cara incomplete so she is fetched
    let mut table = load_players(&config.output_path).unwrap();
    table.records[2].plays.clear();
    player_base::players::save_players(&table, &config.output_path).unwrap();

    pipeline::enrich(&config, &mut source).unwrap();
    let cara = player(&config, 3);
    assert_eq!(cara.birthplace, "Paris, France");
    assert_eq!(cara.height_inches, "5' 7\"");
    assert_eq!(cara.height_cm, "1.70m");
}

#[test]
fn test_run_with_sources_shares_one_ledger() {
    let (_dir, config) = setup();

    let mut wiki = ScriptedSource::biography();
    let mut country = CountryScript;
    let (refreshed, bio, countries) = pipeline::run_with_sources(&config, &mut wiki, &mut country).unwrap();

    assert_eq!(refreshed.added, 1);
    assert_eq!(bio.changes, 4);
    assert_eq!(countries.changes, 1);
    assert_eq!(player(&config, 4).represented_country, "ESP");

    let ledger = LedgerRows::read(&config.ledger_path).unwrap();
    assert_eq!(ledger.len(), 5);
    assert!((0..ledger.len()).any(|i| ledger.get(i, "column") == "represented_country"));
}

#[test]
fn test_revert_writes_old_value_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("enriched.csv");
    let ledger = dir.path().join("changes.csv");

    let mut text = String::from("player_id,full_name,birthplace\n");
    for i in 0..7 {
        text.push_str(&format!("{},P{},Somewhere {}\n", 100 + i, i, i));
    }
    fs::write(&table, text).unwrap();
    fs::write(
        &ledger,
        "player_id,player_name,column,row_index,old_value,new_value,reject\n\
         105,P5,birthplace,5,\"Paris, France\",Somewhere 5,1\n\
         999,X,birthplace,2,Lyon,y,1\n",
    )
    .unwrap();

    revert_overwrites(&ledger, &table, None).unwrap();
    let fixed = StringTable::read(&table).unwrap();
    let col = fixed.column_index("birthplace").unwrap();
    assert_eq!(fixed.get(5, col), Some("Paris, France"));
    assert_eq!(fixed.get(4, col), Some("Somewhere 4"));
    // The logged row is written even when another player sits there now
    assert_eq!(fixed.get(2, col), Some("Lyon"));
}

#[test]
fn test_missing_rankings_is_an_error() {
    let (dir, mut config) = setup();
    config.rankings_dir = dir.path().join("empty");
    fs::create_dir_all(&config.rankings_dir).unwrap();

    let err = pipeline::refresh(&config).unwrap_err();
    assert!(matches!(err, player_base::PlayerBaseError::NoRankings { .. }));
    // Nothing written on failure
    assert_eq!(fs::read_to_string(&config.output_path).unwrap(), PLAYERS);
}
