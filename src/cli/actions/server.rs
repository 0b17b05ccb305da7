use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            frontend_url,
            asset_store_url,
        } => {
            let auth_config = AuthConfig::new(
                access_token_secret,
                refresh_token_secret,
                frontend_url,
            )
            .with_access_token_ttl_seconds(access_token_ttl_seconds)
            .with_refresh_token_ttl_seconds(refresh_token_ttl_seconds);

            api::new(port, dsn, auth_config, asset_store_url).await?;
        }
    }

    Ok(())
}
