//! # LinkSpace Terminal Client
//!
//! Loads the configuration, wires the configured backend into a `FeedView`
//! and runs a line-oriented loop on stdin. Logs go to stderr.

mod command;
mod upload;
mod wiring;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use ls_config::Settings;
use ls_services::{FeedEvent, FeedView, SubmitSettings, ViewOutcome, ViewState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};
use crate::wiring::Wiring;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let wiring = wiring::build(&settings).await?;
    let mut view = FeedView::mount(
        &wiring.backend,
        SubmitSettings {
            bucket: settings.media.bucket.clone(),
            max_image_bytes: settings.media.max_image_bytes,
        },
    );

    info!(backend = ?settings.backend.kind, "LinkSpace starting");
    println!("Welcome to LinkSpace. Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(e) = run(&wiring, &view, &settings, command).await {
                            notify(&e);
                        }
                    }
                    Err(usage) => println!("{usage}"),
                }
            }
            event = view.next_event() => {
                let Some(event) = event else {
                    debug!("session provider closed");
                    break;
                };
                match view.handle(event).await {
                    Ok(outcome) => show(&view, outcome),
                    Err(e) => notify(&e),
                }
            }
        }
    }

    view.teardown();
    Ok(())
}

async fn run(
    wiring: &Wiring,
    view: &FeedView,
    settings: &Settings,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::SignUp {
            email,
            password,
            full_name,
        } => {
            if wiring.sign_up(&email, &password, &full_name).await?.is_none() {
                println!("Check your email to confirm the account, then `login`.");
            }
        }
        Command::Login { email, password } => {
            wiring.sign_in(&email, &password).await?;
        }
        Command::Post(text) => {
            view.submit_post(&text, None).await?;
        }
        Command::Photo { path, text } => {
            let image = upload::read_image(&path, settings.media.max_image_bytes).await?;
            view.submit_post(&text, Some(image)).await?;
        }
        Command::Feed => {
            if view.state() == ViewState::Ready {
                view.events().publish(FeedEvent::Dirty);
            } else {
                println!("Sign in to see the feed.");
            }
        }
        Command::Logout => view.sign_out().await?,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn show(view: &FeedView, outcome: ViewOutcome) {
    match outcome {
        ViewOutcome::Loading if view.state() == ViewState::Loading => println!("Loading..."),
        ViewOutcome::Rendered => {
            let Some(profile) = view.profile() else {
                return;
            };
            match ls_ui::render_feed(profile, view.feed(), Utc::now()) {
                Ok(screen) => println!("{screen}"),
                Err(e) => notify(&e),
            }
        }
        ViewOutcome::Pending => println!("Setting up your profile..."),
        ViewOutcome::NavigateToLogin => println!("Signed out. Use `login` or `signup`."),
        ViewOutcome::Loading | ViewOutcome::Unchanged => {}
    }
}

fn notify(error: &dyn std::fmt::Display) {
    println!("! {error}");
}
