//! Binary entrypoint: drives the gallery engine from stdin.
//!
//! Each input line is a command that becomes one or more UI events; every
//! published view is summarised on stdout as it arrives.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use masonry_gallery::config::Configuration;
use masonry_gallery::events::UiEvent;
use masonry_gallery::layout::ScrollMetrics;
use masonry_gallery::lightbox::Key;
use masonry_gallery::pipeline::{self, Pipeline};
use masonry_gallery::query::CatalogSource;
use masonry_gallery::view::GalleryView;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "masonry-gallery",
    version,
    about = "searchable, infinitely scrolling image gallery engine"
)]
struct Args {
    /// Path to YAML config (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the catalog JSON file from the config
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,
    /// Deterministic seed for the first-page shuffle
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Initial viewport width in pixels
    #[arg(long, value_name = "PX")]
    width: Option<f32>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("masonry_gallery={level}").parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        catalog,
        seed,
        width,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let mut cfg = match &config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(path) = catalog {
        cfg.catalog_path = path;
    }
    if seed.is_some() {
        cfg.shuffle_seed = seed;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    info!(
        catalog = %cfg.catalog_path.display(),
        page_limit = cfg.page_limit,
        debounce = %humantime::format_duration(cfg.search_debounce),
        "configuration loaded"
    );

    let source = CatalogSource::from_json_file(&cfg.catalog_path)
        .with_context(|| format!("failed to read catalog {}", cfg.catalog_path.display()))?
        .with_latency(cfg.simulated_latency);
    info!(rows = source.len(), "catalog loaded");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let pipeline = pipeline::spawn(cfg, Arc::new(source), cancel.clone());
    pipeline.send(UiEvent::Resized(width)).await?;

    // Summarise every published view
    let printer = {
        let mut views = pipeline.views.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = views.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let view = views.borrow_and_update().clone();
                        println!("{}", summary(&view));
                    }
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            info!("stdin closed; initiating shutdown");
            break;
        };
        match dispatch(&pipeline, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => eprintln!("error: {err:#}"),
        }
    }

    cancel.cancel();
    if let Err(e) = printer.await {
        tracing::error!("join error: {e}");
    }
    pipeline.shutdown().await;
    Ok(())
}

fn summary(view: &GalleryView) -> String {
    let lightbox = view
        .lightbox
        .as_ref()
        .map(|lb| format!(" lightbox={}/{}", lb.index + 1, lb.total))
        .unwrap_or_default();
    format!(
        "[{:?}] term={:?} images={} columns={} more={}{}{}",
        view.status,
        view.search_term,
        view.image_count,
        view.column_count,
        view.has_more,
        lightbox,
        view.empty_message
            .as_deref()
            .map(|m| format!(" ({m})"))
            .unwrap_or_default(),
    )
}

/// Runs one command line. Returns `Ok(false)` when the session should end.
async fn dispatch(pipeline: &Pipeline, line: &str) -> Result<bool> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let events = match command {
        "" => return Ok(true),
        "quit" | "exit" => return Ok(false),
        "show" => {
            print!("{}", pipeline.current());
            return Ok(true);
        }
        "type" => vec![UiEvent::SearchInput(rest.to_string())],
        "clear" => vec![UiEvent::SearchInput(String::new())],
        "scroll" => {
            let nums = parse_floats(rest)?;
            let [scroll_top, viewport_height, document_height] = nums[..] else {
                bail!("usage: scroll <top> <viewport> <document>");
            };
            vec![UiEvent::Scrolled(ScrollMetrics {
                scroll_top,
                viewport_height,
                document_height,
            })]
        }
        "bottom" => vec![UiEvent::Scrolled(ScrollMetrics {
            scroll_top: 1000.0,
            viewport_height: 800.0,
            document_height: 1800.0,
        })],
        "resize" => match rest {
            "none" => vec![UiEvent::Resized(None)],
            px => vec![UiEvent::Resized(Some(
                px.parse().context("usage: resize <px>|none")?,
            ))],
        },
        "open" => {
            let index: usize = rest.parse().context("usage: open <index>")?;
            let view = pipeline.current();
            let tile = view
                .tile(index)
                .with_context(|| format!("no image at index {index}"))?;
            vec![UiEvent::Select(tile.image.id.clone())]
        }
        "next" => vec![UiEvent::Next],
        "prev" => vec![UiEvent::Previous],
        "key" => vec![UiEvent::Key(parse_key(rest)?)],
        "swipe" => {
            let nums = parse_floats(rest)?;
            let [from, to] = nums[..] else {
                bail!("usage: swipe <from> <to>");
            };
            vec![
                UiEvent::TouchStart(from),
                UiEvent::TouchMove(to),
                UiEvent::TouchEnd,
            ]
        }
        "rotate" => vec![UiEvent::Rotate],
        "close" => vec![UiEvent::Close],
        "tag" => vec![UiEvent::TagClicked(rest.to_string())],
        other => bail!("unknown command {other:?}"),
    };
    for event in events {
        pipeline.send(event).await?;
    }
    Ok(true)
}

fn parse_floats(s: &str) -> Result<Vec<f32>> {
    s.split_whitespace()
        .map(|n| n.parse::<f32>().with_context(|| format!("not a number: {n}")))
        .collect()
}

fn parse_key(s: &str) -> Result<Key> {
    Ok(match s {
        "left" => Key::ArrowLeft,
        "right" => Key::ArrowRight,
        "escape" | "esc" => Key::Escape,
        other => bail!("unknown key {other:?} (left|right|escape)"),
    })
}
