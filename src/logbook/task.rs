//! Owner task for the packet log.
//!
//! All log mutation happens here: the task exclusively owns the
//! `PacketLog` and the alias table, multiplexing the medium event channel
//! and the host command channel. The bounded event channel is drained
//! FIFO by this single consumer, so append order equals arrival order
//! even when the medium runs on a different thread.

use embassy_futures::select::{Either, select};

use crate::analyzer::profile::ProfileRegistry;

use super::alias::AliasTable;
use super::export;
use super::search;
use super::store::PacketLog;
use super::types::{LogCommand, LogCommandReceiver, LogUpdate, LogUpdateSender, MediumEventReceiver};

#[embassy_executor::task]
pub async fn logbook_task(
    registry: ProfileRegistry,
    event_rx: MediumEventReceiver,
    command_rx: LogCommandReceiver,
    update_tx: LogUpdateSender,
) {
    log::info!("Log task started, profiles: {:?}", registry.names());

    let mut log = PacketLog::new();
    let mut aliases = AliasTable::new();
    // Current selection as a position within the visible sequence,
    // anchoring searches the way a table selection would.
    let mut selected: Option<usize> = None;

    loop {
        match select(event_rx.receive(), command_rx.receive()).await {
            Either::First(event) => {
                log.append(event);
                log.refilter();
                let _ = update_tx.try_send(LogUpdate::CountsChanged(log.visible().len(), log.len()));
            }
            Either::Second(command) => match command {
                LogCommand::SelectAnalyzer(name) => match registry.resolve(&name) {
                    Some(pipeline) => {
                        log::debug!("Analyzer profile selected: {}", name);
                        log.select_profile(pipeline);
                        let _ = update_tx.try_send(LogUpdate::CountsChanged(log.visible().len(), log.len()));
                    }
                    None => {
                        log::warn!("Unknown analyzer profile: {}", name);
                        let _ = update_tx
                            .try_send(LogUpdate::Alert(format!("Unknown analyzer profile: {}", name)));
                    }
                },
                LogCommand::SetShowDuplicates(show) => {
                    log.set_show_duplicates(show);
                    let _ = update_tx.try_send(LogUpdate::CountsChanged(log.visible().len(), log.len()));
                }
                LogCommand::SetHideNoDestination(hide) => {
                    log.set_hide_no_destination(hide);
                    let _ = update_tx.try_send(LogUpdate::CountsChanged(log.visible().len(), log.len()));
                }
                LogCommand::SetAlias { payload, alias } => {
                    aliases.set_alias(&payload, &alias);
                }
                LogCommand::Search { query, reverse } => {
                    let result = run_search(&mut log, &aliases, selected, &query, reverse);
                    if let Some(position) = result {
                        selected = Some(position);
                    }
                    let hit = result.map(|position| log.visible()[position]);
                    update_tx.send(LogUpdate::SearchResult(hit)).await;
                }
                LogCommand::SelectTime(time) => {
                    let position = search::find_by_time(log.records(), log.visible(), time);
                    if position.is_some() {
                        selected = position;
                    }
                    let hit = position.map(|p| log.visible()[p]);
                    update_tx.send(LogUpdate::TimeSelection(hit)).await;
                }
                LogCommand::Export => {
                    let text = export::export_string(&mut log);
                    update_tx.send(LogUpdate::ExportReady(text)).await;
                }
                LogCommand::Clear => {
                    log.clear();
                    selected = None;
                    let _ = update_tx.try_send(LogUpdate::CountsChanged(0, 0));
                }
            },
        }
    }
}

/// Decode the visible records, resolve aliases, and run the circular
/// search from the current selection.
fn run_search(
    log: &mut PacketLog,
    aliases: &AliasTable,
    selected: Option<usize>,
    query: &str,
    reverse: bool,
) -> Option<usize> {
    let visible: Vec<usize> = log.visible().to_vec();
    for &index in &visible {
        // Result ignored: indices come from the visible set.
        let _ = log.decode(index);
    }
    let entries: Vec<&str> = visible
        .iter()
        .map(|&index| {
            log.records()[index]
                .decoded()
                .map(|d| aliases.resolve(&d.brief))
                .unwrap_or("")
        })
        .collect();
    search::find_next(&entries, selected, query, reverse)
}
