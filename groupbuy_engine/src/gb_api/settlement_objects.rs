use serde::{Deserialize, Serialize};

use crate::db_types::CampaignStatus;

/// The work done for a single campaign during a settlement sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSettlement {
    pub campaign_id: i64,
    pub status: CampaignStatus,
    pub orders_created: usize,
    pub refunded: usize,
}

/// The outcome of a settlement sweep. Campaigns that could not be settled are listed with the reason, and are
/// picked up again by the next sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub settled: Vec<CampaignSettlement>,
    pub failed: Vec<(i64, String)>,
}

impl SettlementReport {
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty() && self.failed.is_empty()
    }

    pub fn total_orders(&self) -> usize {
        self.settled.iter().map(|s| s.orders_created).sum()
    }

    pub fn total_refunds(&self) -> usize {
        self.settled.iter().map(|s| s.refunded).sum()
    }

    pub fn settlement_for(&self, campaign_id: i64) -> Option<&CampaignSettlement> {
        self.settled.iter().find(|s| s.campaign_id == campaign_id)
    }
}
