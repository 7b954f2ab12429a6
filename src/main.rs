//! ForestLink bench binary: Main Entry Point
//!
//! Hexagonal architecture with cooperative poll loops.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ReaderTransport   WriterTransport   LogDiagnosticSink         │
//! │  (stdin producer)  (stdout consumer) (DiagnosticSink)          │
//! │  SimRadio pair     SystemClock       LogIndicator              │
//! │  (Radio)           (Clock, DelayNs)  (IndicatorPort)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  SenderRelay · LinkAdapter ×2 · ReceiverRelay          │    │
//! │  │  EventStore (replay-then-live) · StatusIndicator       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage:
//!
//! ```text
//! forestlink [relay] [config.json]   stdin → sender → sim radio → receiver → stdout
//! forestlink hub [config.json]       stdin (DATA: lines) → event store → JSON summary
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{error, info, warn};

use forestlink::adapters::log_indicator::LogIndicator;
use forestlink::adapters::log_sink::LogDiagnosticSink;
use forestlink::adapters::stdio::{ReaderTransport, WriterTransport};
use forestlink::adapters::time::{StdDelay, SystemClock, WallClock};
use forestlink::app::ports::Clock;
use forestlink::config::RelayConfig;
use forestlink::hub::HubIngest;
use forestlink::indicator::StatusIndicator;
use forestlink::link::sim::SimRadio;
use forestlink::link::{LinkAdapter, LinkRole};
use forestlink::relay::{ReceiverRelay, SenderRelay};
use forestlink::store::EventStore;

// ── Command line ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Relay,
    Hub,
}

fn parse_args(args: &[String]) -> Result<(Mode, Option<&str>)> {
    let mut mode = Mode::Relay;
    let mut config = None;
    for arg in args {
        match arg.as_str() {
            "relay" => mode = Mode::Relay,
            "hub" => mode = Mode::Hub,
            path if config.is_none() && !path.starts_with('-') => config = Some(path),
            other => bail!("unexpected argument '{other}'"),
        }
    }
    Ok((mode, config))
}

fn load_config(path: Option<&str>) -> Result<RelayConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {path}"))?;
            let config = RelayConfig::from_json(&text)
                .with_context(|| format!("parsing config {path}"))?;
            info!("Config loaded from {path}");
            config
        }
        None => {
            info!("No config file given, using defaults");
            RelayConfig::default()
        }
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  ForestLink v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Arguments + config ─────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, config_path) = parse_args(&args)?;
    let config = load_config(config_path)?;

    match mode {
        Mode::Relay => run_relay(&config),
        Mode::Hub => run_hub(&config),
    }
}

// ── Relay bench ───────────────────────────────────────────────

fn run_relay(config: &RelayConfig) -> Result<()> {
    // ── 3. Construct adapters ─────────────────────────────────
    let clock = SystemClock::new();
    let mut sink = LogDiagnosticSink::new();
    let mut producer = ReaderTransport::stdin().context("starting stdin reader")?;
    let mut consumer = WriterTransport::stdout();
    let mut led = LogIndicator::new();
    let mut indicator = StatusIndicator::new();

    let (tx_radio, rx_radio) = SimRadio::pair(config.sim.rssi, config.sim.snr);
    let mut sender_link = LinkAdapter::new(tx_radio, LinkRole::Sender);
    let mut receiver_link = LinkAdapter::new(rx_radio, LinkRole::Receiver);

    // ── 4. Radio bring-up (the only blocking step) ────────────
    for link in [&mut sender_link, &mut receiver_link] {
        let role = link.role();
        if let Err(e) = link.initialize(&config.link, &mut StdDelay, &mut sink) {
            // Keep running: the fault indicator reports it, records are dropped and counted.
            error!("{role} link: {e}");
        }
    }
    let worst = if sender_link.is_ready() { receiver_link.state() } else { sender_link.state() };
    indicator.set_link_state(worst);

    // ── 5. Event store + observer ─────────────────────────────
    let store = Arc::new(EventStore::new(config.history_capacity));
    let subscription = store.subscribe();
    let observer = std::thread::Builder::new()
        .name("event-observer".into())
        .spawn(move || {
            for record in subscription {
                info!(
                    "EVENT | {} conf={:.2} at ({:.4}, {:.4}) ts={}",
                    record.event_type(),
                    record.confidence(),
                    record.latitude(),
                    record.longitude(),
                    record.timestamp()
                );
            }
        })
        .context("starting observer thread")?;

    let mut sender = SenderRelay::new(config.max_line_len);
    let mut receiver = ReceiverRelay::new(config.housekeeping_interval_secs, WallClock.now_ms());

    info!("Relay ready. Reading producer lines from stdin.");

    // ── 6. Poll loop ──────────────────────────────────────────
    let idle = Duration::from_millis(u64::from(config.poll_interval_ms));
    let mut last_tick = clock.now_ms();
    loop {
        let finished = producer.is_finished();
        if finished {
            sender.finish(&mut sender_link, &mut sink);
        }

        let consumed = sender
            .poll(&mut producer, &mut sender_link, &mut sink)
            .context("reading producer")?;
        let handled =
            receiver.poll(&mut receiver_link, &mut consumer, &store, &WallClock, &mut sink);
        if handled {
            indicator.activity();
        }

        let now = clock.now_ms();
        let delta = u32::try_from(now - last_tick).unwrap_or(u32::MAX);
        last_tick = now;
        indicator.drive(delta, &mut led);

        if finished {
            break;
        }
        if consumed == 0 && !handled {
            std::thread::sleep(idle);
        }
    }

    // ── 7. Summary ────────────────────────────────────────────
    let sent = sender.stats();
    let recv = receiver.stats();
    info!(
        "Sender: lines={} sent={} dropped={} truncated={} tx_failures={}",
        sent.lines, sent.sent, sent.dropped, sent.truncated, sent.transmit_failures
    );
    info!(
        "Receiver: rx={} fwd={} dropped={} fwd_failures={}",
        recv.received, recv.forwarded, recv.dropped, recv.forward_failures
    );
    if sink.dropped() > 0 {
        warn!("{} record(s) dropped in total", sink.dropped());
    }
    if producer.overflowed_bytes() > 0 {
        warn!(
            "{} producer byte(s) discarded while the relay lagged",
            producer.overflowed_bytes()
        );
    }
    let aggregates = serde_json::to_string(&store.aggregates()).context("serializing aggregates")?;
    info!("Aggregates: {aggregates}");

    // Last strong reference: dropping it ends the subscription.
    drop(store);
    if observer.join().is_err() {
        warn!("observer thread panicked");
    }
    Ok(())
}

// ── Hub ───────────────────────────────────────────────────────

fn run_hub(config: &RelayConfig) -> Result<()> {
    let mut sink = LogDiagnosticSink::new();
    let mut input = ReaderTransport::stdin().context("starting stdin reader")?;
    let store = EventStore::new(config.history_capacity);
    let mut hub = HubIngest::new();
    let idle = Duration::from_millis(u64::from(config.poll_interval_ms));

    info!("Hub ready. Ingesting DATA: lines from stdin.");

    loop {
        let consumed = hub
            .poll(&mut input, &store, &WallClock, &mut sink)
            .context("reading receiver stream")?;
        if consumed == 0 {
            if input.is_finished() {
                break;
            }
            std::thread::sleep(idle);
        }
    }
    hub.finish(&store, &WallClock, &mut sink);

    let stats = hub.stats();
    info!(
        "Hub: lines={} ingested={} ignored={} dropped={} truncated={}",
        stats.lines, stats.ingested, stats.ignored, stats.dropped, stats.truncated
    );

    let summary = serde_json::json!({
        "aggregates": store.aggregates(),
        "window": store.window_stats(),
        "recent": store.recent_events(config.history_capacity),
    });
    println!("{}", serde_json::to_string_pretty(&summary).context("serializing summary")?);
    Ok(())
}
