//! Server configuration.
//!
//! Every setting is a CLI flag with an env-var fallback, so deployments can
//! configure purely through the environment and local runs can override on
//! the command line.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "homeboard-server", version, about)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 4096)]
    pub port: u16,

    /// Base URL of the Supabase project (PostgREST endpoint lives under it)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Service-role key for the store (bypasses row-level security; this
    /// process enforces household scoping itself)
    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    pub supabase_service_key: String,

    /// Google OAuth client id
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: String,

    /// Google OAuth client secret
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: String,

    /// OAuth redirect URI registered with Google
    #[arg(long, env = "GOOGLE_REDIRECT_URI")]
    pub google_redirect_uri: String,

    /// Secret the credential vault derives its key from
    #[arg(long, env = "TOKEN_ENCRYPTION_SECRET", hide_env_values = true)]
    pub token_encryption_secret: String,

    /// Bearer secret required on the cron endpoints
    #[arg(long, env = "CRON_SECRET", hide_env_values = true)]
    pub cron_secret: String,

    /// Public base URL of this deployment; webhook callback addresses and
    /// post-OAuth redirects are built from it
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: String,
}

impl Config {
    /// Address Google pushes change notifications to.
    pub fn webhook_callback_url(&self) -> String {
        format!("{}/api/webhooks/google", self.public_base_url)
    }
}
