//! `platanera` command: sign in, inspect the session, and call the API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use platanera_client::config::ClientSettings;
use platanera_client::domain::{ApiRequest, ClientError, HttpMethod, SessionService, View};
use platanera_client::outbound::http::ReqwestApiTransport;
use platanera_client::outbound::session_store::FileSessionStore;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `platanera` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "platanera",
    about = "Sign in to the Finca Platanera API and send authenticated requests",
    version
)]
struct CliArgs {
    /// API base URL. Overrides `PLATANERA_API_BASE_URL`.
    #[arg(long = "api-url", value_name = "url", global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session.
    Login {
        /// Account name.
        username: String,
        /// Password. Anything passed here is visible to other local users in
        /// the process list; omit it to be prompted on standard input, where
        /// the input is echoed.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show whether a session is stored and whether the API answers.
    Status,
    /// Query the API health endpoint.
    Health,
    /// Send a request with the stored session and print the JSON response.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: HttpMethod,
        /// Path relative to the API base URL, for example `workers/`.
        path: String,
        /// JSON request body.
        #[arg(long, value_name = "json")]
        body: Option<String>,
        /// Extra request header, repeatable. `Authorization` is ignored.
        #[arg(long = "header", value_name = "name:value", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main(CliArgs::parse()))
}

async fn async_main(args: CliArgs) -> io::Result<()> {
    let service = build_service(args.api_url)?;

    match args.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            service
                .login(&username, &password)
                .await
                .map_err(client_failure)?;
            println!("signed in as {}", username.trim());
        }
        Command::Logout => {
            service.logout();
            println!("signed out");
        }
        Command::Status => {
            if service.resolve_view(View::Root) == View::Login {
                println!("session: signed out");
                println!("run `platanera login <username>` to sign in");
                return Ok(());
            }
            println!("session: signed in");
            match service.api_client().health_check().await {
                Ok(health) => println!("api: {}", health.message),
                Err(error) if error.is_session_expired() => return Err(client_failure(error)),
                Err(error) => println!("api: unreachable ({error})"),
            }
        }
        Command::Health => {
            let health = service
                .api_client()
                .health_check()
                .await
                .map_err(client_failure)?;
            println!("status={}", health.status.as_deref().unwrap_or("unknown"));
            println!("message={}", health.message);
        }
        Command::Request {
            method,
            path,
            body,
            headers,
        } => {
            let body = body
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .map_err(|error| io::Error::other(format!("--body is not valid JSON: {error}")))?;
            let mut request = ApiRequest::new(method, &path, body);
            for (name, value) in &headers {
                request = request.with_header(name, value);
            }
            let response = service
                .api_client()
                .request(request)
                .await
                .map_err(client_failure)?;
            let rendered = serde_json::to_string_pretty(&response)
                .map_err(|error| io::Error::other(format!("render response: {error}")))?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn build_service(api_url_override: Option<String>) -> io::Result<SessionService> {
    let mut settings = ClientSettings::load_from_env().map_err(io::Error::other)?;
    if api_url_override.is_some() {
        settings.api_base_url = api_url_override;
    }

    let base_url = settings.api_base_url().map_err(io::Error::other)?;
    let transport = ReqwestApiTransport::new(base_url, settings.request_timeout())
        .map_err(|error| io::Error::other(format!("build http client: {error}")))?;
    let store = FileSessionStore::new(settings.session_file());
    Ok(SessionService::new(Arc::new(transport), Arc::new(store)))
}

fn prompt_password() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "password (input is echoed): ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn client_failure(error: ClientError) -> io::Error {
    if error.is_session_expired() {
        return io::Error::other(
            "session expired; run `platanera login <username>` to sign in again",
        );
    }
    match error.detail() {
        Some(detail) => io::Error::other(format!("{error}: {detail}")),
        None => io::Error::other(error.to_string()),
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
