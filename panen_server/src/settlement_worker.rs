use std::time::Duration;

use groupbuy_engine::{events::EventProducers, settlement_objects::SettlementReport, SettlementApi, SqliteDatabase};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Starts the settlement worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first sweep runs immediately, so campaigns that expired while the server was down are settled at startup.
pub fn start_settlement_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let api = SettlementApi::new(db, producers);
        info!("🕰️ Settlement worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running settlement job");
            match api.run_settlement().await {
                Ok(report) => log_report(&report),
                Err(e) => {
                    error!("🕰️ Error running settlement job: {e}");
                },
            }
        }
    })
}

fn log_report(report: &SettlementReport) {
    if report.is_empty() {
        trace!("🕰️ Nothing to settle");
        return;
    }
    info!(
        "🕰️ {} campaigns settled. {} orders created, {} participants marked for refund",
        report.settled.len(),
        report.total_orders(),
        report.total_refunds()
    );
    if !report.failed.is_empty() {
        let failed = report.failed.iter().map(|(id, e)| format!("#{id}: {e}")).collect::<Vec<String>>().join(", ");
        warn!("🕰️ {} campaigns could not be settled and will be retried: {failed}", report.failed.len());
    }
}
