use anyhow::Context;
use clap::Parser;
use embassy_executor::{Executor, Spawner};
use env_logger::Builder;
use futures::executor::block_on;
use log::{LevelFilter, debug, info, warn};
use std::path::PathBuf;
use std::thread;

use radiolog::analyzer::profile::ProfileRegistry;
use radiolog::config::LoggerConfig;
use radiolog::logbook::types::{
    LogCommandReceiver, LogCommandSender, LogUpdateReceiver, LogUpdateSender, MediumEventReceiver, MediumEventSender,
};
use radiolog::logbook::{
    LogCommand, LogCommandChannel, LogUpdate, LogUpdateChannel, MediumEventChannel, TransmissionEvent, logbook_task,
};
use radiolog::{logbook, transcript};

/// Replay a captured radio transmission transcript through the packet log
/// engine and emit the decoded export.
#[derive(Parser)]
#[command(name = "radiolog", version, about)]
struct Args {
    /// Transcript JSON file with the captured transmissions
    transcript: PathBuf,

    /// Configuration file
    #[arg(long, default_value = "radiolog.toml")]
    config: PathBuf,

    /// Analyzer profile, overriding the configured one
    #[arg(long)]
    analyzer: Option<String>,

    /// Write the export to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn embassy_init(
    spawner: Spawner,
    registry: ProfileRegistry,
    event_rx: MediumEventReceiver,
    command_rx: LogCommandReceiver,
    update_tx: LogUpdateSender,
) {
    let _ = spawner.spawn(logbook_task(registry, event_rx, command_rx, update_tx));
}

fn apply_settings(command_tx: LogCommandSender, config: &LoggerConfig, profile: &str) {
    block_on(command_tx.send(LogCommand::SetShowDuplicates(config.show_duplicates)));
    block_on(command_tx.send(LogCommand::SetHideNoDestination(config.hide_no_destination)));
    block_on(command_tx.send(LogCommand::SelectAnalyzer(profile.to_string())));
    for entry in &config.aliases {
        block_on(command_tx.send(LogCommand::SetAlias {
            payload: entry.payload.clone(),
            alias: entry.alias.clone(),
        }));
    }
}

fn feed_events(event_tx: MediumEventSender, events: Vec<TransmissionEvent>) {
    for event in events {
        block_on(event_tx.send(event));
    }
}

/// Drain updates until the export arrives.
fn wait_for_export(update_rx: LogUpdateReceiver) -> String {
    loop {
        match block_on(update_rx.receive()) {
            LogUpdate::ExportReady(text) => return text,
            LogUpdate::CountsChanged(visible, total) => {
                debug!("Showing {}/{} packets", visible, total);
            }
            LogUpdate::Alert(message) => warn!("{}", message),
            other => debug!("Ignoring update: {:?}", other),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("radiolog"), LevelFilter::Debug)
        .init();

    let args = Args::parse();

    let config = LoggerConfig::load(&args.config).with_context(|| format!("Loading {}", args.config.display()))?;
    let events = transcript::load_transcript(&args.transcript)?;
    info!("Loaded {} transmissions from {}", events.len(), args.transcript.display());

    let registry = ProfileRegistry::with_builtin_profiles(config.pcap_file.clone());

    // INTENTIONAL LEAK: Box::leak provides 'static lifetime for Embassy channels.
    let event_channel: &'static MediumEventChannel = Box::leak(Box::new(MediumEventChannel::new()));
    let command_channel: &'static LogCommandChannel = Box::leak(Box::new(LogCommandChannel::new()));
    let update_channel: &'static LogUpdateChannel = Box::leak(Box::new(LogUpdateChannel::new()));

    let event_rx = event_channel.receiver();
    let command_rx = command_channel.receiver();
    let update_tx = update_channel.sender();

    // Spawn the Embassy executor on a dedicated background thread; the
    // log owner task lives there while this thread remains the host.
    let _embassy_handle = thread::Builder::new()
        .name("embassy-executor".to_string())
        .spawn(move || {
            // Leak the executor to satisfy the 'static lifetime required by run()
            let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
            executor.run(|spawner| embassy_init(spawner, registry, event_rx, command_rx, update_tx));
        })
        .expect("failed to spawn embassy thread");

    let profile = args.analyzer.as_deref().unwrap_or(&config.analyzer);
    apply_settings(command_channel.sender(), &config, profile);
    feed_events(event_channel.sender(), events);

    // The command channel is FIFO, so the export request lands after all
    // settings; the owner task polls the event channel with priority, so
    // every queued transmission is appended before the export runs.
    block_on(command_channel.sender().send(LogCommand::Export));
    let export = wait_for_export(update_channel.receiver());

    match &args.output {
        Some(path) => {
            logbook::export::save_to_file(path, &export)?;
            info!("Export written to {}", path.display());
        }
        None => print!("{}", export),
    }
    Ok(())
}
