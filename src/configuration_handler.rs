use crate::configuration::Configuration;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Car doctor booking server")]
pub struct ConfigurationHandler {
    /// Port the server listens on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Full MongoDB connection string, takes precedence over the credentials below
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "DB_USER")]
    db_user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    db_pass: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "cluster0.2mmen1j.mongodb.net")]
    db_host: String,

    #[arg(long, env = "DATABASE_NAME", default_value = "CarDoctor")]
    database_name: String,

    /// Secret used to sign and verify bearer tokens
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: Option<String>,

    /// JSON array of services loaded into the in-memory store
    #[arg(long, env = "SERVICES_SEED")]
    services_seed: Option<PathBuf>,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> u16 {
        self.port
    }

    fn database_url(&self) -> Option<String> {
        if let Some(database_url) = &self.database_url {
            return Some(database_url.clone());
        }
        match (&self.db_user, &self.db_pass) {
            (Some(user), Some(pass)) => Some(format!(
                "mongodb+srv://{user}:{pass}@{}/?retryWrites=true&w=majority",
                self.db_host
            )),
            _ => None,
        }
    }

    fn database_name(&self) -> String {
        self.database_name.clone()
    }

    fn access_token_secret(&self) -> Option<String> {
        self.access_token_secret.clone()
    }

    fn services_seed(&self) -> Option<PathBuf> {
        self.services_seed.clone()
    }
}
