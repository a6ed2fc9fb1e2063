use crate::{
    libs::{config::Config, messages::Message},
    msg_bail_anyhow, msg_print, msg_success,
    server::auth::sign_token,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Owner the token identifies
    subject: String,
    #[arg(short, long)]
    email: Option<String>,
    /// Lifetime in hours
    #[arg(long, default_value_t = 24)]
    ttl_hours: i64,
    /// Signing secret; defaults to the configured server.jwtSecret
    #[arg(long)]
    secret: Option<String>,
}

pub fn cmd(args: TokenArgs) -> Result<()> {
    let Some(secret) = args.secret.or_else(|| Config::load().ok().and_then(|c| c.server_or_default().jwt_secret)) else {
        msg_bail_anyhow!(Message::JwtSecretMissing);
    };

    let token = sign_token(&secret, &args.subject, args.email.as_deref(), chrono::Duration::hours(args.ttl_hours))?;
    msg_success!(Message::TokenIssued(args.subject, args.ttl_hours));
    msg_print!(token);
    Ok(())
}
