pub(crate) mod args;
pub(crate) mod commands;
pub(crate) mod error;

pub(crate) use args::Cli;
pub(crate) use commands::Commands;
pub(crate) use error::AppError;
