pub mod card;
pub mod card_edit;
pub mod card_view;
pub mod cli;
pub mod config;
pub mod derived;
pub mod dom;
pub mod markup;
pub mod state;

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use crate::card::Card;
use crate::cli::Mode;
use crate::markup::RenderContext;
use crate::state::EditState;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        mode = ?cli.mode,
        "starting taskcard CLI"
    );

    let cfg = config::Config::load(cli.config.as_deref())?;
    let cards = load_cards(&cli.cards)?;
    let now = cli.now.unwrap_or_else(Utc::now);
    debug!(cards = cards.len(), %now, "rendering cards");

    let ctx = RenderContext {
        now,
        display: &cfg.display,
    };

    let mut out = io::stdout().lock();
    for markup in render_cards(&cards, cli.mode, &ctx) {
        writeln!(out, "{markup}\n")?;
    }

    info!("done");
    Ok(())
}

#[tracing::instrument]
pub fn load_cards(path: &Path) -> anyhow::Result<Vec<Card>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid card file {}", path.display()))
}

/// Markup for each card, in input order.
pub fn render_cards(cards: &[Card], mode: Mode, ctx: &RenderContext<'_>) -> Vec<String> {
    cards
        .iter()
        .map(|card| match mode {
            Mode::View => markup::build_read_only_card_markup(card, ctx),
            Mode::Edit => markup::build_edit_form_markup(card, &EditState::from_card(card), ctx),
        })
        .map(|markup| markup.into_string())
        .collect()
}
