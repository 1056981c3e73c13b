//! # Wardline Main Entry Point
//!
//! Profile-driven command line front end for the session-aware client.

use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wardline::cmd_args::{Command, CommandLineArgs};
use wardline::config::{self, Profile};
use wardline::{ApiClient, AuthApi, FileStorage, MemorySessionStore, RequestDescriptor, Session};

/// Environment variable holding a tracing filter directive
const LOG_ENV_VAR: &str = "WARDLINE_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommandLineArgs::parse();
    init_tracing(args.verbose());

    match run(&args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("{e:#}");
            Err(e)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &CommandLineArgs) -> Result<()> {
    let profile_path = config::get_profile_path();
    let profile = Profile::load(&profile_path, args.profile())?;
    let client = build_client(&profile, args.route())?;
    let auth = AuthApi::new(client.clone());

    match args.command() {
        Command::Request { method, path, body } => {
            let method = Method::from_bytes(method.as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let mut request = RequestDescriptor::new(method, path.as_str());
            if let Some(body) = body {
                let body: Value =
                    serde_json::from_str(body).context("request body is not valid JSON")?;
                request = request.with_json(body);
            }

            match client.execute(request).await {
                Ok(response) => {
                    if args.verbose() {
                        eprintln!(
                            "{} {}{}",
                            response.status().as_u16(),
                            response.status().canonical_reason().unwrap_or(""),
                            if response.is_synthetic() { " (demo data)" } else { "" }
                        );
                    }
                    print_json(&response.json_value().unwrap_or_else(|_| Value::String(response.text())))?;
                }
                Err(e) if e.is_silent() => {
                    eprintln!("Subscription data unavailable for this session");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Login { username, password } => {
            let session = auth.login(username, password).await?;
            println!("Signed in as {username} ({})", describe(&session));
        }
        Command::DemoLogin => {
            auth.demo_login()?;
            println!("Demo session started");
        }
        Command::Logout => {
            auth.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match auth.cached_user() {
            Some(user) => print_json(&user)?,
            None => print_json(&auth.current_user().await?)?,
        },
    }

    Ok(())
}

fn build_client(profile: &Profile, route: &str) -> Result<ApiClient> {
    let storage = FileStorage::open(&profile.session_file)
        .with_context(|| format!("cannot open session file {}", profile.session_file.display()))?;
    let session = Session::restore(&storage);
    tracing::debug!(
        "Restored session for profile '{}' (authenticated: {})",
        profile.name,
        session.is_authenticated()
    );

    let client = ApiClient::builder(profile.client_config()?)
        .session_store(Arc::new(MemorySessionStore::with_session(session)))
        .storage(Arc::new(storage))
        .current_route(route)
        .build()?;
    Ok(client)
}

fn describe(session: &Session) -> &'static str {
    if session.access.bearer().is_some() {
        "token session"
    } else {
        "cookie session"
    }
}

fn print_json(value: &Value) -> Result<()> {
    let text = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
