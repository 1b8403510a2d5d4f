use std::collections::HashMap;

use chrono::{Duration, Utc};
use cucumber::World;
use groupbuy_engine::{
    campaign_objects::{Actor, JoinCampaignRequest, JoinedCampaign, NewCampaignRequest},
    db_types::{Campaign, Product, Store, UserId},
    events::EventProducers,
    settlement_objects::SettlementReport,
    test_utils::{
        mock_gateway::MockGateway,
        prepare_env::{create_database, random_db_path, run_migrations, seed_store},
    },
    CampaignApi,
    EnrolmentApi,
    GroupBuyError,
    PaymentApi,
    SettlementApi,
    SqliteDatabase,
};
use log::*;
use panen_common::Rupiah;

pub const OWNER: &str = "store-owner";

#[derive(Default, Debug, World)]
pub struct GroupBuyWorld {
    pub system: Option<GroupBuySystem>,
    pub campaign: Option<Campaign>,
    pub joined: HashMap<String, JoinedCampaign>,
    pub last_error: Option<GroupBuyError>,
    pub last_report: Option<SettlementReport>,
}

#[derive(Debug)]
pub struct GroupBuySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub store: Store,
    pub product: Product,
    pub campaigns: CampaignApi<SqliteDatabase>,
    pub enrolment: EnrolmentApi<SqliteDatabase, MockGateway>,
    pub payments: PaymentApi<SqliteDatabase>,
    pub settlement: SettlementApi<SqliteDatabase>,
}

impl GroupBuyWorld {
    pub fn system(&self) -> &GroupBuySystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn campaign_id(&self) -> i64 {
        self.campaign.as_ref().map(|c| c.id).expect("No campaign has been created")
    }

    pub fn joined(&self, user: &str) -> &JoinedCampaign {
        self.joined.get(user).unwrap_or_else(|| panic!("{user} has not joined the campaign"))
    }

    pub async fn create_campaign(&mut self, price: i64, target: i64) {
        let sys = self.system();
        let req = NewCampaignRequest {
            product_id: sys.product.id,
            store_id: sys.store.id,
            group_price: Rupiah::from(price),
            target_quantity: target,
            end_date: Utc::now() + Duration::days(7),
        };
        let campaign = sys.campaigns.create_campaign(&UserId::from(OWNER), req).await.expect("Error creating campaign");
        self.campaign = Some(campaign);
    }

    pub async fn join(&mut self, user: &str, quantity: i64) {
        let campaign_id = self.campaign_id();
        let actor = Actor::new(user, Some(format!("{user}@example.com")));
        let result = self.system().enrolment.join_campaign(&actor, campaign_id, JoinCampaignRequest::new(quantity)).await;
        match result {
            Ok(joined) => {
                self.joined.insert(user.to_string(), joined);
                self.last_error = None;
            },
            Err(e) => {
                debug!("🚀️ {user} could not join: {e}");
                self.last_error = Some(e);
            },
        }
    }
}

impl GroupBuySystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        debug!("Created database: {db_path}");
        let (store, product) = seed_store(&db, OWNER).await;
        let producers = EventProducers::default();
        let gateway = MockGateway::new();
        Self {
            db_path,
            store,
            product,
            campaigns: CampaignApi::new(db.clone(), producers.clone()),
            enrolment: EnrolmentApi::new(db.clone(), gateway),
            payments: PaymentApi::new(db.clone(), producers.clone()),
            settlement: SettlementApi::new(db.clone(), producers),
            db,
        }
    }
}
