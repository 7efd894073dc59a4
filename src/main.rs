//! Stash client - command-line access to the Stash account API
//!
//! Usage:
//!   stash-client login <email> <password>
//!   stash-client signup <email> <password> [name]
//!   stash-client me | refresh | logout
//!   stash-client password <current> <new>
//!   stash-client avatar <url>
//!   stash-client upload <image-file>
//!
//! The session is kept in `~/.stash/session.yaml`. `STASH_API_URL` selects the
//! server, or `STASH_CONFIG` points at a YAML config file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use stash_client::{ApiClient, ClientConfig, SessionStore, SignupRequest};

const USAGE: &str = "usage: stash-client <login|signup|me|refresh|password|avatar|upload|logout> [args]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", "stash-client.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = load_config()?;
    let store = Arc::new(SessionStore::new());
    let client = ApiClient::new(&config)?;

    if let Some(pair) = store.load()? {
        client.set_tokens(Some(pair.access_token), Some(pair.refresh_token));
    }

    let on_refresh_store = store.clone();
    client.on_token_refresh(move |pair| {
        if let Err(e) = on_refresh_store.save(pair) {
            tracing::error!(error = %e, "Failed to persist refreshed session");
        }
    });
    let on_auth_store = store.clone();
    client.on_auth_error(move || {
        tracing::warn!("Session expired, signing out");
        if let Err(e) = on_auth_store.clear() {
            tracing::error!(error = %e, "Failed to clear stored session");
        }
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&client, &store, &args).await;
    client.shutdown();
    result
}

fn load_config() -> Result<ClientConfig> {
    match std::env::var("STASH_CONFIG") {
        Ok(path) => ClientConfig::load(Path::new(&path))?.with_env_overrides(),
        Err(_) => ClientConfig::from_env(),
    }
}

async fn run(client: &ApiClient, store: &SessionStore, args: &[String]) -> Result<()> {
    let arg = |i: usize| arg_at(args, i);

    match arg(0)? {
        "login" => {
            let response = client.login(arg(1)?, arg(2)?).await?;
            store.save(&response.tokens)?;
            print_json(&response.user)
        }
        "signup" => {
            let signup = SignupRequest {
                email: arg(1)?.to_string(),
                password: arg(2)?.to_string(),
                name: args.get(3).cloned(),
            };
            let response = client.signup(&signup).await?;
            store.save(&response.tokens)?;
            print_json(&response.user)
        }
        "me" => print_json(&client.get_current_user().await?),
        "refresh" => {
            client.refresh_access_token().await?;
            println!("session refreshed");
            Ok(())
        }
        "password" => print_json(&client.update_password(arg(1)?, arg(2)?).await?),
        "avatar" => print_json(&client.update_avatar_url(arg(1)?).await?),
        "upload" => {
            let path = Path::new(arg(1)?);
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path.file_name().and_then(|n| n.to_str());
            let uploaded = client
                .upload_image(&bytes, image_content_type(path), file_name)
                .await?;
            print_json(&uploaded)
        }
        "logout" => {
            client.logout().await?;
            store.clear()?;
            println!("signed out");
            Ok(())
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn arg_at(args: &[String], i: usize) -> Result<&str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| USAGE.to_string())
}

fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
