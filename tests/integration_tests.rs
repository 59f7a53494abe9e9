use coachload::{tables, trend, weekly, zones};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

/// Integration tests that exercise the complete coaching workflow

#[cfg(test)]
mod integration_tests {
    use super::*;
    use coachload::internal_load::internal_load_series;
    use coachload::models::{Athlete, Block, BlockType, CyclePhase, Feedback, Rpe, Session, Sex, Week, Zone};
    use coachload::DataWarning;

    fn block(block_type: BlockType, minutes: rust_decimal::Decimal, reps: u32, zone: i64) -> Block {
        Block::new(block_type, minutes, reps, Zone::new(zone).unwrap()).unwrap()
    }

    fn week(month: u32, day: u32) -> Week {
        Week::from_ymd(2024, month, day).unwrap()
    }

    fn create_test_tables() -> tables::Tables {
        let mut tables = tables::Tables::new();

        let mut lea = Athlete::new("Léa", Sex::Female);
        lea.date_of_birth = NaiveDate::from_ymd_opt(1995, 6, 15);
        lea.height_cm = Some(168);
        lea.weight_kg = Some(dec!(57.5));
        lea.record_10k_min = Some(dec!(42.5));
        tables.athletes.add(lea).unwrap();
        tables.athletes.add(Athlete::new("Marc", Sex::Male)).unwrap();

        tables
            .sessions
            .create(Session::new(
                "VMA courte",
                vec![
                    block(BlockType::WarmUp, dec!(20), 1, 1),
                    block(BlockType::Intervals, dec!(1), 10, 6).with_description("30/30 on track"),
                    block(BlockType::CoolDown, dec!(10), 1, 1),
                ],
            ))
            .unwrap();
        tables
            .sessions
            .create(Session::new("Footing", vec![block(BlockType::Steady, dec!(45), 1, 2)]))
            .unwrap();
        tables
            .sessions
            .create(Session::new(
                "Seuil",
                vec![
                    block(BlockType::WarmUp, dec!(15), 1, 2),
                    block(BlockType::Intervals, dec!(8), 3, 4),
                    block(BlockType::Recovery, dec!(2), 3, 1),
                ],
            ))
            .unwrap();

        tables
    }

    /// Session totals, weekly aggregation and the week-over-week trend
    #[test]
    fn test_weekly_comparison_workflow() {
        let mut tables = create_test_tables();

        let vma = tables.sessions.get("VMA courte").unwrap();
        assert_eq!(vma.total_volume(), dec!(40));
        assert_eq!(vma.total_load(), dec!(90));

        tables.assign("Léa", "Footing", week(3, 4)).unwrap();
        tables.assign("Léa", "Seuil", week(3, 4)).unwrap();
        tables.assign("Léa", "Footing", week(3, 11)).unwrap();
        tables.assign("Léa", "Seuil", week(3, 11)).unwrap();
        tables.assign("Léa", "VMA courte", week(3, 11)).unwrap();
        tables.assign("Marc", "VMA courte", week(3, 11)).unwrap();

        let aggregator = weekly::WeeklyAggregator::new(&tables);
        let comparison = aggregator.compare_with_previous("Léa", week(3, 11));

        // Footing 45/90, Seuil 45/132
        assert_eq!(comparison.previous.total_load, dec!(222));
        assert_eq!(comparison.previous.total_volume, dec!(90));
        assert_eq!(comparison.current.session_count, 3);
        assert_eq!(comparison.current.total_load, dec!(312));
        assert_eq!(comparison.current.mean_load, dec!(104));
        assert_eq!(comparison.current.total_volume, dec!(130));

        assert_eq!(
            comparison.trend.total_load.change,
            trend::PercentChange::Defined(dec!(40.54))
        );
        assert_eq!(comparison.trend.total_load.direction, Some(trend::Direction::Up));
        assert!(comparison.trend.total_load.notable);
        assert_eq!(
            comparison.trend.mean_load.change,
            trend::PercentChange::Defined(dec!(-6.31))
        );
        assert!(!comparison.trend.mean_load.notable);
        assert!(comparison.warnings.is_empty());
    }

    /// Deleting a session turns its assignments into reported orphans
    #[test]
    fn test_deleted_session_is_flagged_everywhere() {
        let mut tables = create_test_tables();
        tables.assign("Léa", "Seuil", week(3, 11)).unwrap();
        tables.assign("Léa", "Footing", week(3, 11)).unwrap();
        tables.sessions.delete("Seuil").unwrap();

        let report = weekly::WeeklyAggregator::new(&tables).aggregate_week("Léa", week(3, 11));
        assert_eq!(report.aggregate.session_count, 1);
        assert_eq!(report.aggregate.total_volume, dec!(45));
        assert_eq!(report.warnings.len(), 1);

        let breakdown = zones::ZoneTimeAnalyzer::new().breakdown(&tables, "Léa", week(3, 11));
        assert_eq!(breakdown.warnings, report.warnings);

        let orphans = tables.orphans();
        assert_eq!(
            orphans,
            vec![DataWarning::OrphanedAssignment {
                athlete_id: "Léa".to_string(),
                session_name: "Seuil".to_string(),
                week: week(3, 11),
            }]
        );
    }

    /// Zone time over six weeks matches the raw block volumes
    #[test]
    fn test_zone_breakdown_matches_blocks() {
        let mut tables = create_test_tables();
        let reference = week(3, 25);
        for back in 0..8 {
            tables.assign("Léa", "Seuil", reference.offset(-back)).unwrap();
        }
        tables.assign("Léa", "VMA courte", reference.offset(-1)).unwrap();

        let breakdown = zones::ZoneTimeAnalyzer::new().breakdown(&tables, "Léa", reference);
        assert_eq!(breakdown.weeks.len(), 6);
        assert_eq!(breakdown.weeks[0].week, reference.offset(-5));

        // Six Seuil (45 min) plus one VMA (40 min)
        assert_eq!(breakdown.total(), dec!(310));
        let totals = breakdown.zone_totals();
        assert_eq!(totals[Zone::new(4).unwrap().index()], dec!(144));
        assert_eq!(totals[Zone::new(6).unwrap().index()], dec!(10));
        assert_eq!(totals[Zone::new(1).unwrap().index()], dec!(66));
    }

    /// Feedback drives the internal load series and the recent views
    #[test]
    fn test_feedback_and_internal_load() {
        let mut tables = create_test_tables();
        let w = week(3, 11);
        tables.assign("Léa", "Seuil", w).unwrap();
        tables.assign("Marc", "Footing", w).unwrap();

        let logged = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap().and_hms_opt(19, 0, 0).unwrap();
        let first = Feedback::new("Léa", "Seuil", w, true, Rpe::new(6).unwrap(), logged)
            .with_cycle(CyclePhase::Ovulation, Some("none".to_string()));
        let (previous, warnings) = tables.save_feedback(first);
        assert!(previous.is_none());
        assert!(warnings.is_empty());

        let revised = Feedback::new("Léa", "Seuil", w, true, Rpe::new(8).unwrap(), logged)
            .with_comment("harder than planned");
        let (previous, _) = tables.save_feedback(revised);
        assert_eq!(previous.map(|f| f.perceived_effort.value()), Some(6));
        assert_eq!(tables.feedback.len(), 1);

        let marc = Feedback::new("Marc", "Footing", w, true, Rpe::new(3).unwrap(), logged)
            .with_cycle(CyclePhase::Menstruation, None);
        let (_, warnings) = tables.save_feedback(marc);
        assert_eq!(
            warnings,
            vec![DataWarning::CycleTrackingIgnored {
                athlete_id: "Marc".to_string()
            }]
        );
        assert_eq!(tables.feedback.get("Marc", "Footing", w).unwrap().cycle_phase, None);

        let (series, warnings) = internal_load_series(&tables, "Léa", w.monday());
        assert!(warnings.is_empty());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].external_load_total, dec!(132));
        assert_eq!(series[0].internal_load_total, dec!(360));

        let reference = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        assert_eq!(tables.feedback.recent("Léa", reference, 28).len(), 1);
        assert!(tables.feedback.recent("Léa", reference, 5).is_empty());
        assert_eq!(tables.assignments.recent(reference, 4).len(), 2);
    }

    /// Session search across names, descriptions and ranges
    #[test]
    fn test_session_search() {
        let tables = create_test_tables();

        let filter = tables::SessionFilter {
            text: Some("TRACK".to_string()),
            ..Default::default()
        };
        let found = tables.sessions.search(&filter, tables::SessionSort::Name, true);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "VMA courte");

        let filter = tables::SessionFilter {
            min_load: Some(dec!(90)),
            ..Default::default()
        };
        let by_load: Vec<&str> = tables
            .sessions
            .search(&filter, tables::SessionSort::Load, false)
            .into_iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(by_load, vec!["Seuil", "VMA courte", "Footing"]);
    }

    #[test]
    fn test_athlete_profile_metrics() {
        let tables = create_test_tables();
        let lea = tables.athletes.get("Léa").unwrap();
        assert!(lea.tracks_cycle());
        assert_eq!(lea.bmi(), Some(dec!(20.4)));
        assert_eq!(lea.pace(coachload::RaceDistance::TenK), Some(dec!(4.25)));
        assert_eq!(lea.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), Some(28));
        assert_eq!(lea.age_on(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap()), Some(29));
    }
}
