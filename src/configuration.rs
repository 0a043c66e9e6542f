use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    /// `None` runs the service on the in-memory store.
    fn database_url(&self) -> Option<String>;
    fn database_name(&self) -> String;
    fn access_token_secret(&self) -> Option<String>;
    fn services_seed(&self) -> Option<PathBuf>;
}
