use chrono::Local;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tableroll::category_walker::CategoryWalker;
use tableroll::config::{TableConfig, DEFAULT_CONFIG_FILE};
use tableroll::logging::init_logging;
use tableroll::roll_engine::RollEngine;
use tableroll::roll_log::DailyLogFile;
use tableroll::roll_session::RollSession;
use tableroll::table_loader::load_table;
use tableroll::user_interaction::{divider, print_insight, ConsolePrompt};
use tableroll::{Result, RollerError};

const ROLL_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    if env::args().any(|arg| arg == "--version") {
        print_insight(ROLL_VERSION);
        process::exit(0);
    }

    init_logging();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if let Err(err) = run(&config_path) {
        tracing::error!(%err, "session aborted");
        print_insight(&format!("Can't roll on this table: {}", err));
        process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<()> {
    let config = TableConfig::load_or_create(config_path)?;
    let table = load_table(&config.workbook_path, &config.sheet_name)?;

    let description = table
        .column(&config.description_column)
        .map_err(|_| RollerError::MissingDescription(config.description_column.clone()))?;
    let walker = CategoryWalker::from_table(
        &table,
        &config.category_regex()?,
        config.skip_sentinel.clone(),
    )?;

    let sink = DailyLogFile::open(&config.log_dir, Local::now(), config.path_separator.clone())?;
    let mut prompt = ConsolePrompt::new()?;
    let mut session = RollSession::new(description, RollEngine::from_wall_clock(), sink);

    println!("{}", divider());
    session.run(walker, &mut prompt)?;
    println!();
    Ok(())
}
