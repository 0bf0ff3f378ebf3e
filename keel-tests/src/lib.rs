mod library;
mod limits;
mod nullability;
mod operations;
mod recording;
mod results;
mod transaction;

pub use recording::*;

use crate::{
    library::library, limits::limits, nullability::nullability, operations::operations,
    results::results, transaction::transaction,
};
use keel::Database;
use log::LevelFilter;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every scenario against `database`, the backend must accept the SQLite style DDL used by
/// the scenarios to create their tables.
pub fn execute_tests(database: Arc<Database>) {
    library(&database);
    operations(&database);
    nullability(&database);
    limits(&database);
    results(&database);
    transaction(&database);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
