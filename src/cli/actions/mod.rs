pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        access_token_secret: SecretString,
        refresh_token_secret: SecretString,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_seconds: i64,
        frontend_url: String,
        asset_store_url: Option<String>,
    },
}
