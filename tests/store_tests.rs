use coachload::error::DataWarning;
use coachload::models::{CyclePhase, Week, Zone};
use coachload::store::{CsvStore, ASSIGNMENTS_FILE, ATHLETES_FILE, FEEDBACK_FILE, SESSIONS_FILE};
use coachload::weekly::WeeklyAggregator;
use coachload::ZoneWeights;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ATHLETES: &str = "\
Nom,Sexe,Amenorrhee,Date de naissance,Age,Taille (cm),Poids (kg),IMC,Sports,Objectif,Record 5km,Record 10km,Record Semi,Record Marathon,Allure 5km,Allure 10km,Allure Semi,Allure Marathon
Léa,Femme,False,1995-06-15,28,168,57.5,20.4,Natation,Marathon,20.5,43,,,4.1,4.3,,
Marc,Homme,,,,,,,,,,,,,,,,
Léa,Femme,True,,,,,,,,,,,,,,,
Inès,Femme,True,2001-02-03,23,172.0,60,20.3,,Semi,,,95,,,,4.5,
Zoé,Femme,peut-être,,,,,,,,,,,,,,,
";

const SESSIONS: &str = r#"Nom,Blocs,Charge totale,Volume total
Fractionné,"[{""Type"": ""Échauffement"", ""Durée"": 15, ""Répétitions"": 1, ""Zone"": ""🔵Zone 2"", ""Description"": """"}, {""Type"": ""Intervalles"", ""Durée"": 3, ""Répétitions"": 6, ""Zone"": ""🔴Zone 5"", ""Description"": ""côte""}]",120,33
Footing,"[{""Type"": ""Allure continue"", ""Durée"": 40.0, ""Répétitions"": 1, ""Zone"": ""🟢Zone 2""}, {""Type"": ""Autre"", ""Durée"": 5, ""Zone"": ""sans zone""}]",90,45
Cassée,"[{""Type"": ",10,10
"#;

const ASSIGNMENTS: &str = "\
Athlete,Seance,Semaine
Léa,Fractionné,2024-03-04
Léa,Fractionné,S11 - 11/03
Léa,Séance supprimée,2024-03-11 00:00:00
Léa,Footing,S12 - 12/03
Marc,Footing,S11 - 11/03/2024
";

const FEEDBACK: &str = "\
Athlete,Seance,Semaine,Date seance,Effectuee,RPE,Glucides (g/h),Commentaire,Phase menstruelle,Symptomes
Léa,Fractionné,2024-03-04,2024-03-06,Oui,7,40,Bonnes sensations,Règles,Crampes
Léa,Fractionné,2024-03-11,2024-03-13,Non,3,,,,
Marc,Footing,2024-03-11,2024-03-12,Oui,11,,,,
";

fn write_fixtures(dir: &Path) {
    fs::write(dir.join(ATHLETES_FILE), ATHLETES).unwrap();
    fs::write(dir.join(SESSIONS_FILE), SESSIONS).unwrap();
    fs::write(dir.join(ASSIGNMENTS_FILE), ASSIGNMENTS).unwrap();
    fs::write(dir.join(FEEDBACK_FILE), FEEDBACK).unwrap();
}

fn skipped_lines(warnings: &[DataWarning], wanted: &str) -> Vec<u64> {
    warnings
        .iter()
        .filter_map(|w| match w {
            DataWarning::SkippedRow { table, line, .. } if *table == wanted => Some(*line),
            _ => None,
        })
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[test]
fn test_load_dashboard_tables() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());

    let (tables, warnings) = CsvStore::new(dir.path(), 2024).load().unwrap();

    assert_eq!(tables.athletes.len(), 3);
    assert_eq!(skipped_lines(&warnings, "athletes"), vec![4, 6]);
    let lea = tables.athletes.get("Léa").unwrap();
    assert!(lea.tracks_cycle());
    assert_eq!(lea.date_of_birth, NaiveDate::from_ymd_opt(1995, 6, 15));
    assert_eq!(lea.height_cm, Some(168));
    assert_eq!(lea.bmi(), Some(dec!(20.4)));
    assert_eq!(lea.sports.as_deref(), Some("Natation"));
    assert_eq!(lea.objective.as_deref(), Some("Marathon"));
    assert_eq!(lea.record_10k_min, Some(dec!(43)));
    assert_eq!(lea.record_half_min, None);

    let ines = tables.athletes.get("Inès").unwrap();
    assert!(ines.amenorrhea);
    assert!(!ines.tracks_cycle());
    assert_eq!(ines.height_cm, Some(172));
    assert_eq!(ines.record_half_min, Some(dec!(95)));
    assert!(!tables.athletes.get("Marc").unwrap().amenorrhea);

    assert_eq!(tables.sessions.len(), 2);
    assert_eq!(skipped_lines(&warnings, "sessions"), vec![4]);
    let fractionne = tables.sessions.get("Fractionné").unwrap();
    assert_eq!(fractionne.total_load(), dec!(120));
    assert_eq!(fractionne.total_volume(), dec!(33));
    assert_eq!(fractionne.blocks()[0].description, None);
    assert_eq!(fractionne.blocks()[1].zone, Zone::new(5).unwrap());

    // The zoneless block is dropped, so the stored totals are stale
    let footing = tables.sessions.get("Footing").unwrap();
    assert_eq!(footing.blocks().len(), 1);
    assert_eq!(footing.total_load(), dec!(80));
    assert!(warnings.iter().any(|w| matches!(
        w,
        DataWarning::MalformedBlock { session_name, index: 1, .. } if session_name == "Footing"
    )));
    assert!(warnings.iter().any(|w| matches!(
        w,
        DataWarning::StaleTotals { session_name } if session_name == "Footing"
    )));

    assert_eq!(tables.assignments.len(), 4);
    assert_eq!(skipped_lines(&warnings, "assignments"), vec![5]);

    assert_eq!(tables.feedback.len(), 2);
    assert_eq!(skipped_lines(&warnings, "feedback"), vec![4]);
    let w10 = Week::from_ymd(2024, 3, 4).unwrap();
    let first = tables.feedback.get("Léa", "Fractionné", w10).unwrap();
    assert!(first.completed);
    assert_eq!(first.perceived_effort.value(), 7);
    assert_eq!(first.carbs_g_per_h, Some(40));
    assert_eq!(first.cycle_phase, Some(CyclePhase::Menstruation));
    assert_eq!(first.symptoms.as_deref(), Some("Crampes"));
    assert_eq!(first.logged_at.date(), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    assert!(!tables.feedback.get("Léa", "Fractionné", w10.next()).unwrap().completed);
}

#[test]
fn test_loaded_orphans_are_reported() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());
    let (tables, _) = CsvStore::new(dir.path(), 2024).load().unwrap();

    let week = Week::from_ymd(2024, 3, 11).unwrap();
    let report = WeeklyAggregator::new(&tables).aggregate_week("Léa", week);
    assert_eq!(report.aggregate.session_count, 1);
    assert_eq!(report.aggregate.total_load, dec!(120));
    assert_eq!(
        report.warnings,
        vec![DataWarning::OrphanedAssignment {
            athlete_id: "Léa".to_string(),
            session_name: "Séance supprimée".to_string(),
            week,
        }]
    );
    assert_eq!(tables.orphans().len(), 1);
}

#[test]
fn test_save_and_reload_keeps_aggregates() {
    let source = tempdir().unwrap();
    write_fixtures(source.path());
    let (tables, _) = CsvStore::new(source.path(), 2024).load().unwrap();

    let target = tempdir().unwrap();
    let store = CsvStore::new(target.path().join("data"), 2024);
    store.save(&tables).unwrap();
    let (reloaded, warnings) = store.load().unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);

    let week = Week::from_ymd(2024, 3, 11).unwrap();
    for athlete in ["Léa", "Marc"] {
        let before = WeeklyAggregator::new(&tables).aggregate_week(athlete, week);
        let after = WeeklyAggregator::new(&reloaded).aggregate_week(athlete, week);
        assert_eq!(before.aggregate, after.aggregate);
    }
    assert_eq!(reloaded.feedback.len(), tables.feedback.len());

    let written = fs::read_to_string(target.path().join("data").join(ASSIGNMENTS_FILE)).unwrap();
    assert!(written.starts_with("athlete,session,week"));
    assert!(written.contains("Léa,Fractionné,2024-03-04"));
}

#[test]
fn test_configured_weights_apply_on_load() {
    let dir = tempdir().unwrap();
    write_fixtures(dir.path());
    let weights = ZoneWeights::try_from(vec![
        dec!(1), dec!(1), dec!(2), dec!(3), dec!(4), dec!(6), dec!(8),
    ])
    .unwrap();

    let (tables, warnings) = CsvStore::new(dir.path(), 2024)
        .with_weights(weights)
        .load()
        .unwrap();

    // 15 min in zone 2 and 18 min in zone 5
    assert_eq!(tables.sessions.get("Fractionné").unwrap().total_load(), dec!(87));
    assert!(warnings.iter().any(|w| matches!(
        w,
        DataWarning::StaleTotals { session_name } if session_name == "Fractionné"
    )));
}
