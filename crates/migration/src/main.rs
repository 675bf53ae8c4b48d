use config::Config;
use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Try to get DB URL from the environment first
    if env::var("DATABASE_URL").is_err() {
        // Fallback: the server's own config (config.yaml + STORE__URL)
        let settings = Config::builder()
            .add_source(config::File::with_name("config.yaml").required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()
            .unwrap();
        if let Ok(url) = settings.get_string("store.url") {
            env::set_var("DATABASE_URL", url);
        }
    }
    cli::run_cli(migration::Migrator).await;
}
