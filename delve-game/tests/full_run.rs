use delve_game::{
    ActiveEncounter, ConclusionSummary, DelveEngine, DelveSession, EncounterAction, EngineConfig,
    MemoryStore, OutcomeStatus, Progress, RecommendedAction, RunStatus, ScoundrelMove, StepRecord,
    TradeOptionId, validate_map,
};

fn play_current_encounter(session: &mut DelveSession) -> OutcomeStatus {
    session.start_encounter().unwrap();
    loop {
        let action = match session.active_encounter().unwrap() {
            ActiveEncounter::PuzzleChamber(puzzle) => {
                let state = puzzle.state();
                let idx = state.tiles.iter().position(Option::is_none).unwrap();
                EncounterAction::RevealTile {
                    row: idx / state.cols,
                    col: idx % state.cols,
                }
            }
            ActiveEncounter::TradeOpportunity(trade) => {
                let used = trade.state().offers.iter().filter(|o| o.used).count();
                let option = if used == 0 {
                    TradeOptionId::C
                } else {
                    TradeOptionId::B
                };
                EncounterAction::SelectTrade { option }
            }
            ActiveEncounter::DiscoverySite(choice)
            | ActiveEncounter::Hazard(choice)
            | ActiveEncounter::RiskEvent(choice)
            | ActiveEncounter::RestSite(choice) => {
                if choice.state().selected.is_none() {
                    EncounterAction::SelectPath {
                        path: choice.paths()[0].id.clone(),
                    }
                } else {
                    EncounterAction::Resolve
                }
            }
            ActiveEncounter::SafePassage(_) => EncounterAction::Pass,
            ActiveEncounter::Scoundrel(_) => EncounterAction::Scoundrel {
                step: ScoundrelMove::Play {
                    index: 0,
                    use_weapon: false,
                },
            },
        };
        if let Progress::Finished(status) = session.act(action).unwrap() {
            session.finish_encounter().unwrap();
            return status;
        }
    }
}

fn delve(session: &mut DelveSession, target_depth: u32) {
    while !session.is_concluded() {
        let feedback = session.feedback();
        let deep_enough = session.state().current_depth >= target_depth;
        if deep_enough || feedback.recommendation.action == RecommendedAction::Return {
            session.return_to_surface().unwrap();
            return;
        }
        let Some(next) = session.available_moves().first().map(|n| n.id.clone()) else {
            session.return_to_surface().unwrap();
            return;
        };
        let report = session.move_to_node(&next).unwrap();
        if report.busted {
            return;
        }
        play_current_encounter(session);
    }
}

#[test]
fn streak_week_plays_through_and_records_progress() {
    let store = MemoryStore::new();
    let mut engine = DelveEngine::new(store, EngineConfig::default()).unwrap();
    let history: Vec<StepRecord> = (1..=7)
        .map(|day| StepRecord::new(format!("2024-03-{day:02}"), 9_000 + day * 500))
        .collect();
    let created = engine.import_step_history(&history).unwrap();
    assert_eq!(created.len(), 7);
    assert_eq!(created.iter().filter(|r| r.has_streak_bonus).count(), 6);

    let mut deepest = 0;
    while let Some(run_id) = engine.queue().next_queued_run().map(|r| r.id.clone()) {
        let mut session = engine.start_run(&run_id).unwrap();
        validate_map(session.map()).unwrap();
        delve(&mut session, 4);
        let conclusion = session.conclusion().cloned().unwrap();
        assert!(conclusion.status.is_terminal());
        if conclusion.status == RunStatus::Busted {
            assert!(conclusion.banked_items.is_empty());
        }
        deepest = deepest.max(conclusion.deepest_depth);
        let summary = engine.conclude_run(&conclusion).unwrap();
        assert_eq!(summary.progression.all_time_deepest_depth, deepest);
    }

    let stats = engine.statistics();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.completed + stats.busted, 7);
    assert_eq!(stats.attempted, 7);
}

#[test]
fn replaying_a_run_is_deterministic() {
    let play = || {
        let mut engine = DelveEngine::new(MemoryStore::new(), EngineConfig::default()).unwrap();
        engine
            .import_step_history(&[StepRecord::new("2024-04-01", 15_000)])
            .unwrap();
        let mut session = engine.start_run("run-2024-04-01").unwrap();
        delve(&mut session, 5);
        (
            session.conclusion().cloned().unwrap(),
            session.history().to_vec(),
        )
    };
    assert_eq!(play(), play());
}

#[test]
fn failures_always_cost_energy_on_a_thin_budget() {
    let mut engine = DelveEngine::new(MemoryStore::new(), EngineConfig::default()).unwrap();
    engine
        .import_step_history(&[StepRecord::new("2024-04-02", 2_500)])
        .unwrap();
    let mut session = engine.start_run("run-2024-04-02").unwrap();
    delve(&mut session, 20);
    let conclusion = session.conclusion().unwrap();
    assert!(conclusion.status.is_terminal());
    for report in session.history() {
        if report.status == OutcomeStatus::Failure {
            assert!(report.energy_lost > 0);
        }
    }
}

/// Walk down until the session first stands on `depth`. Returns false when
/// every way forward is locked out.
fn descend_to(session: &mut DelveSession, depth: u32) -> bool {
    for _ in 0..200 {
        let Some(next) = session.available_moves().first().map(|n| n.id.clone()) else {
            return false;
        };
        let report = session.move_to_node(&next).unwrap();
        assert!(!report.busted);
        if session.state().current_depth == depth {
            return true;
        }
        play_current_encounter(session);
    }
    false
}

/// Bust the first generated run that reaches depth 5, over a progression
/// record that already holds `previous_deepest`.
fn bust_at_depth_five(previous_deepest: u32) -> (MemoryStore, ConclusionSummary) {
    for day in 1..=28 {
        let store = MemoryStore::new();
        store.seed(
            "delve.progression",
            &format!(r#"{{"all_time_deepest_depth": {previous_deepest}}}"#),
        );
        let mut engine = DelveEngine::new(store.clone(), EngineConfig::default()).unwrap();
        let date = format!("2024-06-{day:02}");
        engine
            .import_step_history(&[StepRecord::new(date.as_str(), 40_000)])
            .unwrap();
        let owned_before = engine.collections().owned().clone();
        let mut session = engine.start_run(&format!("run-{date}")).unwrap();
        if !descend_to(&mut session, 5) {
            continue;
        }
        assert_eq!(session.state().deepest_depth, 5);

        let conclusion = session.bust().unwrap();
        assert_eq!(conclusion.status, RunStatus::Busted);
        assert_eq!(conclusion.deepest_depth, 5);
        assert!(conclusion.banked_items.is_empty());

        let summary = engine.conclude_run(&conclusion).unwrap();
        assert_eq!(engine.collections().owned(), &owned_before);
        return (store, summary);
    }
    panic!("no generated run reached depth 5");
}

#[test]
fn busting_at_depth_five_counts_the_bust_and_ratchets_depth() {
    let (store, summary) = bust_at_depth_five(3);
    assert_eq!(summary.run.status, RunStatus::Busted);
    assert_eq!(summary.progression.total_runs_busted, 1);
    assert_eq!(summary.progression.total_runs_completed, 0);
    assert_eq!(summary.progression.total_runs_attempted, 1);
    assert_eq!(summary.progression.all_time_deepest_depth, 5);
    assert!(summary.completed_sets.is_empty());

    let mut reopened = DelveEngine::new(store, EngineConfig::default()).unwrap();
    assert!(reopened.collections().owned().is_empty());
    assert_eq!(reopened.statistics().busted, 1);
}

#[test]
fn busting_at_depth_five_keeps_a_deeper_record() {
    let (_, summary) = bust_at_depth_five(9);
    assert_eq!(summary.progression.total_runs_busted, 1);
    assert_eq!(summary.progression.all_time_deepest_depth, 9);
}
