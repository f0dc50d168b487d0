// roll_session.rs
use crate::category_walker::CategoryWalker;
use crate::error::{Result, RollerError};
use crate::menu::{Menu, PromptProvider};
use crate::roll_engine::RollEngine;
use crate::roll_log::{LogEntry, LogSink};
use crate::table_view::ColumnId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    ChoosingCategory,
    ChoosingAdvanceOrRoll { next_choices: Vec<String> },
    Rolling,
    AcceptRejectReroll { rolled: String },
    Restarted,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryDecision {
    Choose(String),
    StartOver,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceDecision {
    Advance,
    /// Pick a value of the next category straight away.
    Descend(String),
    Roll,
    StartOver,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollDecision {
    Accept,
    Reroll,
    StartOver,
    Quit,
}

/// Where the session stands between two decisions.
#[derive(Debug, Clone)]
pub struct SessionState<'t> {
    pub phase: Phase,
    pub walker: CategoryWalker<'t>,
}

impl<'t> SessionState<'t> {
    pub fn new(walker: CategoryWalker<'t>) -> Self {
        Self {
            phase: Phase::ChoosingCategory,
            walker,
        }
    }

    fn with_phase(self, phase: Phase) -> Self {
        Self { phase, ..self }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Quit
    }
}

/// A transition result, plus a problem worth showing the user if the
/// transition had to work around one.
#[derive(Debug)]
pub struct Outcome<'t> {
    pub state: SessionState<'t>,
    pub problem: Option<RollerError>,
}

impl<'t> From<SessionState<'t>> for Outcome<'t> {
    fn from(state: SessionState<'t>) -> Self {
        Self {
            state,
            problem: None,
        }
    }
}

fn recovered<'t>(state: SessionState<'t>, problem: RollerError) -> Result<Outcome<'t>> {
    if !problem.is_recoverable() {
        return Err(problem);
    }
    tracing::warn!(%problem, "recovered from table problem");
    Ok(Outcome {
        state,
        problem: Some(problem),
    })
}

pub struct RollSession<S: LogSink> {
    description: ColumnId,
    engine: RollEngine,
    sink: S,
}

impl<S: LogSink> RollSession<S> {
    pub fn new(description: ColumnId, engine: RollEngine, sink: S) -> Self {
        Self {
            description,
            engine,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn category_menu(&self, state: &SessionState<'_>) -> Result<(Menu<CategoryDecision>, Option<RollerError>)> {
        let title = state
            .walker
            .current_column()
            .map(|column| column.name().to_string())
            .unwrap_or_default();

        let (choices, problem) = match state.walker.visible_choices_for_current_level() {
            Ok(choices) => (choices, None),
            Err(problem) if problem.is_recoverable() => {
                tracing::warn!(%problem, level = state.walker.current_level(), "no choices at level");
                (Vec::new(), Some(problem))
            }
            Err(problem) => return Err(problem),
        };

        let menu = Menu::new(title)
            .numbered(&choices, |value| CategoryDecision::Choose(value.to_string()))
            .gap()
            .entry("s", "start over", CategoryDecision::StartOver)
            .entry("q", "quit", CategoryDecision::Quit);
        Ok((menu, problem))
    }

    pub fn advance_menu(&self, state: &SessionState<'_>) -> Menu<AdvanceDecision> {
        let next_choices: &[String] = match &state.phase {
            Phase::ChoosingAdvanceOrRoll { next_choices } => next_choices,
            _ => &[],
        };
        let title = state
            .walker
            .current_column()
            .map(|column| column.name().to_string())
            .unwrap_or_default();
        let selected = state.walker.filters().values().last().unwrap_or("selection");

        let menu = Menu::new(title)
            .numbered(next_choices, |value| AdvanceDecision::Descend(value.to_string()))
            .gap();
        let menu = if next_choices.is_empty() {
            menu
        } else {
            menu.entry("n", "next category", AdvanceDecision::Advance)
        };
        menu.entry("r", format!("roll for {}", selected), AdvanceDecision::Roll)
            .entry("s", "start over", AdvanceDecision::StartOver)
            .entry("q", "quit", AdvanceDecision::Quit)
    }

    pub fn roll_menu(&self) -> Menu<RollDecision> {
        Menu::new("roll")
            .entry("a", "accept roll", RollDecision::Accept)
            .entry("r", "reroll", RollDecision::Reroll)
            .entry("s", "start over", RollDecision::StartOver)
            .entry("q", "quit", RollDecision::Quit)
    }

    pub fn on_category<'t>(&self, state: SessionState<'t>, decision: CategoryDecision) -> Result<Outcome<'t>> {
        match decision {
            CategoryDecision::Choose(value) => {
                let walker = state.walker.apply_choice(value)?;
                let chosen = SessionState {
                    phase: Phase::Rolling,
                    walker,
                };
                match chosen.walker.has_next_level() {
                    Ok(true) => {
                        let next_choices = chosen.walker.visible_choices_for_current_level()?;
                        Ok(chosen.with_phase(Phase::ChoosingAdvanceOrRoll { next_choices }).into())
                    }
                    Ok(false) => Ok(chosen.into()),
                    // The level below exists but is empty: stay here, rolling still allowed.
                    Err(problem) => recovered(
                        chosen.with_phase(Phase::ChoosingAdvanceOrRoll {
                            next_choices: Vec::new(),
                        }),
                        problem,
                    ),
                }
            }
            CategoryDecision::StartOver => Ok(state.with_phase(Phase::Restarted).into()),
            CategoryDecision::Quit => Ok(state.with_phase(Phase::Quit).into()),
        }
    }

    pub fn on_advance<'t>(&self, state: SessionState<'t>, decision: AdvanceDecision) -> Result<Outcome<'t>> {
        match decision {
            AdvanceDecision::Advance => Ok(state.with_phase(Phase::ChoosingCategory).into()),
            AdvanceDecision::Descend(value) => self.on_category(
                state.with_phase(Phase::ChoosingCategory),
                CategoryDecision::Choose(value),
            ),
            AdvanceDecision::Roll => Ok(state.with_phase(Phase::Rolling).into()),
            AdvanceDecision::StartOver => Ok(state.with_phase(Phase::Restarted).into()),
            AdvanceDecision::Quit => Ok(state.with_phase(Phase::Quit).into()),
        }
    }

    /// Draws once for the current selections. Nothing is logged when the
    /// draw fails. A malformed description undoes the last choice so the
    /// user can pick again at that level; an empty pool starts over.
    pub fn roll<'t>(&mut self, state: SessionState<'t>) -> Result<Outcome<'t>> {
        let drawn = self.engine.roll(
            state.walker.table(),
            &self.description,
            state.walker.filters(),
        );
        match drawn {
            Ok(rolled) => {
                tracing::debug!(%rolled, "rolled");
                Ok(state.with_phase(Phase::AcceptRejectReroll { rolled }).into())
            }
            Err(problem @ RollerError::MalformedSource(_)) => {
                let retry = SessionState {
                    phase: Phase::ChoosingCategory,
                    walker: state.walker.back(),
                };
                recovered(retry, problem)
            }
            Err(problem) => recovered(state.with_phase(Phase::Restarted), problem),
        }
    }

    pub fn on_roll<'t>(&mut self, state: SessionState<'t>, decision: RollDecision) -> Result<Outcome<'t>> {
        match decision {
            RollDecision::Accept => {
                if let Phase::AcceptRejectReroll { rolled } = &state.phase {
                    let entry = LogEntry {
                        path: state.walker.filters().values().map(str::to_string).collect(),
                        rolled: rolled.clone(),
                    };
                    self.sink.append(&entry)?;
                    tracing::info!(path = ?entry.path, rolled = %entry.rolled, "accepted roll");
                }
                Ok(state.with_phase(Phase::Restarted).into())
            }
            RollDecision::Reroll => Ok(state.with_phase(Phase::Rolling).into()),
            RollDecision::StartOver => Ok(state.with_phase(Phase::Restarted).into()),
            RollDecision::Quit => Ok(state.with_phase(Phase::Quit).into()),
        }
    }

    pub fn restart<'t>(&self, state: SessionState<'t>) -> SessionState<'t> {
        SessionState {
            phase: Phase::ChoosingCategory,
            walker: state.walker.reset(),
        }
    }

    /// Runs one transition, asking `prompt` when the phase needs a decision.
    pub fn step<'t, P: PromptProvider>(&mut self, state: SessionState<'t>, prompt: &mut P) -> Result<SessionState<'t>> {
        let outcome = match state.phase {
            Phase::ChoosingCategory => {
                let (menu, problem) = self.category_menu(&state)?;
                if let Some(problem) = problem {
                    prompt.report(&problem);
                }
                let decision = prompt.select(&menu)?.decision.clone();
                self.on_category(state, decision)?
            }
            Phase::ChoosingAdvanceOrRoll { .. } => {
                let menu = self.advance_menu(&state);
                let decision = prompt.select(&menu)?.decision.clone();
                self.on_advance(state, decision)?
            }
            Phase::Rolling => {
                let outcome = self.roll(state)?;
                if let Phase::AcceptRejectReroll { rolled } = &outcome.state.phase {
                    prompt.show_roll(rolled);
                }
                outcome
            }
            Phase::AcceptRejectReroll { .. } => {
                let menu = self.roll_menu();
                let decision = prompt.select(&menu)?.decision.clone();
                self.on_roll(state, decision)?
            }
            Phase::Restarted => {
                prompt.show_restart();
                self.restart(state).into()
            }
            Phase::Quit => state.into(),
        };

        if let Some(problem) = &outcome.problem {
            prompt.report(problem);
        }
        Ok(outcome.state)
    }

    /// Drives the session until the user quits or input closes, then closes
    /// the log sink.
    pub fn run<P: PromptProvider>(&mut self, walker: CategoryWalker<'_>, prompt: &mut P) -> Result<()> {
        let mut state = SessionState::new(walker);
        tracing::info!(levels = state.walker.categories().len(), "session started");

        while !state.is_finished() {
            state = match self.step(state, prompt) {
                Ok(next) => next,
                Err(RollerError::InputClosed) => {
                    tracing::info!("input closed, quitting");
                    break;
                }
                Err(fatal) => {
                    if let Err(close_error) = self.sink.close() {
                        tracing::error!(%close_error, "failed to flush roll log");
                    }
                    return Err(fatal);
                }
            };
        }

        self.sink.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_view::Table;
    use regex::Regex;

    #[derive(Default)]
    struct MemorySink {
        entries: Vec<LogEntry>,
    }

    impl LogSink for MemorySink {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.entries.push(entry.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn sheet() -> Table {
        let rows: &[[&str; 3]] = &[
            ["Beast", "Forest", "A lumbering treant"],
            ["Beast", "Cave", "A cave bear"],
            ["Spirit", "NONE", "A wandering ghost"],
            ["Empty", "Hollow", ""],
        ];
        Table::from_rows(
            vec!["category 1".into(), "category 2".into(), "description".into()],
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn setup(table: &Table) -> (RollSession<MemorySink>, SessionState<'_>) {
        let pattern = Regex::new(r"(?i)^category \d+$").unwrap();
        let walker = CategoryWalker::from_table(table, &pattern, "NONE").unwrap();
        let session = RollSession::new(
            table.column("description").unwrap(),
            RollEngine::with_seed(42),
            MemorySink::default(),
        );
        (session, SessionState::new(walker))
    }

    #[test]
    fn choice_with_real_sublevel_offers_advance() {
        let table = sheet();
        let (session, state) = setup(&table);

        let outcome = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap();

        assert_eq!(
            outcome.state.phase,
            Phase::ChoosingAdvanceOrRoll {
                next_choices: vec!["Cave".into(), "Forest".into()]
            }
        );
        assert!(outcome.problem.is_none());
    }

    #[test]
    fn sentinel_sublevel_goes_straight_to_rolling() {
        let table = sheet();
        let (session, state) = setup(&table);

        let outcome = session
            .on_category(state, CategoryDecision::Choose("Spirit".into()))
            .unwrap();

        assert_eq!(outcome.state.phase, Phase::Rolling);
    }

    #[test]
    fn advance_then_choose_reaches_the_leaf() {
        let table = sheet();
        let (mut session, state) = setup(&table);

        let state = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap()
            .state;
        let state = session.on_advance(state, AdvanceDecision::Advance).unwrap().state;
        assert_eq!(state.phase, Phase::ChoosingCategory);
        assert_eq!(state.walker.current_level(), 1);

        let state = session
            .on_category(state, CategoryDecision::Choose("Forest".into()))
            .unwrap()
            .state;
        assert_eq!(state.phase, Phase::Rolling);

        let state = session.roll(state).unwrap().state;
        assert_eq!(
            state.phase,
            Phase::AcceptRejectReroll {
                rolled: "A lumbering treant".into()
            }
        );
    }

    #[test]
    fn descend_matches_advance_and_choose() {
        let table = sheet();
        let (session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap()
            .state;

        let state = session
            .on_advance(state, AdvanceDecision::Descend("Cave".into()))
            .unwrap()
            .state;

        assert_eq!(state.phase, Phase::Rolling);
        assert_eq!(
            state.walker.filters().values().collect::<Vec<_>>(),
            vec!["Beast", "Cave"]
        );
    }

    #[test]
    fn accept_logs_path_and_restarts() {
        let table = sheet();
        let (mut session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Spirit".into()))
            .unwrap()
            .state;
        let state = session.roll(state).unwrap().state;

        let state = session.on_roll(state, RollDecision::Accept).unwrap().state;

        assert_eq!(state.phase, Phase::Restarted);
        assert_eq!(
            session.sink().entries,
            vec![LogEntry {
                path: vec!["Spirit".into()],
                rolled: "A wandering ghost".into()
            }]
        );
    }

    #[test]
    fn reroll_start_over_and_quit_never_log() {
        let table = sheet();
        let (mut session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Spirit".into()))
            .unwrap()
            .state;
        let rolled = session.roll(state).unwrap().state;

        let reroll = session.on_roll(rolled.clone(), RollDecision::Reroll).unwrap().state;
        assert_eq!(reroll.phase, Phase::Rolling);
        let over = session.on_roll(rolled.clone(), RollDecision::StartOver).unwrap().state;
        assert_eq!(over.phase, Phase::Restarted);
        let quit = session.on_roll(rolled, RollDecision::Quit).unwrap().state;
        assert!(quit.is_finished());

        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn restart_clears_everything() {
        let table = sheet();
        let (session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap()
            .state;
        let state = session.on_advance(state, AdvanceDecision::StartOver).unwrap().state;
        assert_eq!(state.phase, Phase::Restarted);

        let state = session.restart(state);

        assert_eq!(state.phase, Phase::ChoosingCategory);
        assert_eq!(state.walker.current_level(), 0);
        assert!(state.walker.filters().is_empty());
    }

    #[test]
    fn empty_pool_roll_is_reported_and_restarts() {
        let table = sheet();
        let (mut session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap()
            .state;
        let state = session
            .on_advance(state, AdvanceDecision::Descend("Nowhere".into()))
            .unwrap();
        // "Nowhere" has no rows, so there is no level below and nothing to draw.
        assert_eq!(state.state.phase, Phase::Rolling);

        let outcome = session.roll(state.state).unwrap();

        assert_eq!(outcome.state.phase, Phase::Restarted);
        assert!(matches!(outcome.problem, Some(RollerError::EmptyPool { .. })));
        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn malformed_range_returns_to_the_level_it_was_picked_at() {
        let table = Table::from_rows(
            vec!["category 1".into(), "category 2".into(), "description".into()],
            vec![
                vec!["Dice".into(), "Bad".into(), "6-1".into()],
                vec!["Dice".into(), "Good".into(), "1-6".into()],
            ],
        )
        .unwrap();
        let (mut session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Dice".into()))
            .unwrap()
            .state;
        let state = session
            .on_advance(state, AdvanceDecision::Descend("Bad".into()))
            .unwrap()
            .state;
        assert_eq!(state.phase, Phase::Rolling);

        let outcome = session.roll(state).unwrap();

        assert!(matches!(outcome.problem, Some(RollerError::MalformedSource(_))));
        assert_eq!(outcome.state.phase, Phase::ChoosingCategory);
        assert_eq!(outcome.state.walker.current_level(), 1);
        assert_eq!(
            outcome.state.walker.filters().values().collect::<Vec<_>>(),
            vec!["Dice"]
        );
        let (menu, problem) = session.category_menu(&outcome.state).unwrap();
        assert!(problem.is_none());
        let labels: Vec<&str> = menu.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Bad", "Good", "start over", "quit"]);
        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn empty_level_below_a_choice_still_allows_rolling() {
        let table = Table::from_rows(
            vec!["category 1".into(), "category 2".into(), "description".into()],
            vec![
                vec!["Beast".into(), "Forest".into(), "A lumbering treant".into()],
                vec!["Beast".into(), "Cave".into(), "A cave bear".into()],
            ],
        )
        .unwrap();
        let (session, state) = setup(&table);

        let outcome = session
            .on_category(state, CategoryDecision::Choose("Nowhere".into()))
            .unwrap();

        assert!(matches!(outcome.problem, Some(RollerError::MalformedSource(_))));
        assert_eq!(
            outcome.state.phase,
            Phase::ChoosingAdvanceOrRoll {
                next_choices: Vec::new()
            }
        );
        assert_eq!(outcome.state.walker.current_level(), 1);
        let keys: Vec<String> = session
            .advance_menu(&outcome.state)
            .entries()
            .iter()
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(keys, vec!["r", "s", "q"]);
    }

    #[test]
    fn empty_category_level_keeps_the_user_in_place() {
        let table = Table::from_rows(
            vec!["category 1".into(), "category 2".into(), "description".into()],
            vec![
                vec!["Beast".into(), "Forest".into(), "A lumbering treant".into()],
                vec!["Beast".into(), "Cave".into(), "A cave bear".into()],
            ],
        )
        .unwrap();
        let (session, state) = setup(&table);
        let lost = SessionState {
            phase: Phase::ChoosingCategory,
            walker: state.walker.apply_choice("Undead").unwrap(),
        };

        let (menu, problem) = session.category_menu(&lost).unwrap();

        assert!(matches!(problem, Some(RollerError::MalformedSource(_))));
        let keys: Vec<&str> = menu.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["s", "q"]);
    }

    #[test]
    fn menus_use_the_usual_keys() {
        let table = sheet();
        let (session, state) = setup(&table);
        let state = session
            .on_category(state, CategoryDecision::Choose("Beast".into()))
            .unwrap()
            .state;

        let advance = session.advance_menu(&state);
        let labels: Vec<(&str, &str)> = advance
            .entries()
            .iter()
            .map(|e| (e.key.as_str(), e.label.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("1", "Cave"),
                ("2", "Forest"),
                ("n", "next category"),
                ("r", "roll for Beast"),
                ("s", "start over"),
                ("q", "quit")
            ]
        );

        let roll = session.roll_menu();
        let keys: Vec<&str> = roll.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "r", "s", "q"]);
    }
}
