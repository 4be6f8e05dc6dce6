use clap::Parser;
use database::Database;

pub mod auth;
pub mod calendar;
pub mod money;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:expenses.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    #[arg(long, env = "APP_PASSWORD")]
    pub app_password: Option<String>,
}

/// First human-readable message out of a failed `validator` run.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
