use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use groupbuy_engine::{
    events::EventProducers,
    CampaignApi,
    EnrolmentApi,
    GroupBuyDatabase,
    PaymentApi,
    PaymentProvider,
    SqliteDatabase,
};
use log::*;
use panen_common::Secret;
use tripay_tools::CALLBACK_SIGNATURE_HEADER;

use crate::{
    auth::SupabaseAuth,
    config::ServerConfig,
    errors::ServerError,
    integrations::{
        notifications::{create_notification_event_handlers, PushNotifier},
        tripay::TripayGateway,
    },
    middleware::{HmacMiddlewareFactory, IdentityMiddlewareFactory},
    routes::{
        health,
        CampaignDetailsRoute,
        CancelCampaignRoute,
        CreateCampaignRoute,
        DeleteCampaignRoute,
        JoinCampaignRoute,
        ListCampaignsRoute,
        PaymentWebhookRoute,
        RetryPaymentRoute,
        UpdateCampaignRoute,
    },
    settlement_worker::start_settlement_worker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .await
    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    preflight_check(&config, &db).await?;
    let producers = start_event_handlers(&config).await?;
    let _worker = start_settlement_worker(db.clone(), producers.clone(), config.settlement_interval);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Brings the schema up to date if allowed, then confirms once that the database can run the engine. The server
/// refuses to start otherwise.
async fn preflight_check(config: &ServerConfig, db: &SqliteDatabase) -> Result<(), ServerError> {
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    }
    if config.skip_preflight {
        warn!("🚀️ Skipping the database capability check");
        return Ok(());
    }
    let version = db.check_capabilities().await.map_err(|e| {
        error!("🚀️ The database failed the capability check. {e}");
        ServerError::InitializeError(e.to_string())
    })?;
    info!("🚀️ Database checks passed (SQLite {version})");
    Ok(())
}

async fn start_event_handlers(config: &ServerConfig) -> Result<EventProducers, ServerError> {
    match PushNotifier::new(config.notifications.clone())? {
        Some(notifier) => {
            info!("🚀️ Push notifications enabled via {notifier:?}");
            let handlers = create_notification_event_handlers(notifier);
            let producers = handlers.producers();
            handlers.start_handlers().await;
            Ok(producers)
        },
        None => Ok(EventProducers::default()),
    }
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = TripayGateway::new(config.tripay.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the Tripay client. {e}")))?;
    let identity = Arc::new(SupabaseAuth::new(config.auth.clone())?);
    let callback_key = config.tripay.private_key.clone();
    let srv = HttpServer::new(move || {
        let campaign_api = CampaignApi::new(db.clone(), producers.clone());
        let enrolment_api = EnrolmentApi::new(db.clone(), gateway.clone());
        let payment_api = PaymentApi::new(db.clone(), producers.clone());
        let callback_key = callback_key.clone();
        App::new()
            .wrap(IdentityMiddlewareFactory::new(Arc::clone(&identity)))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("panen::access_log"))
            .app_data(web::Data::new(campaign_api))
            .app_data(web::Data::new(enrolment_api))
            .app_data(web::Data::new(payment_api))
            .configure(|cfg| configure_routes::<SqliteDatabase, TripayGateway>(cfg, callback_key))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The callback route is wrapped in the HMAC middleware, keyed with the Tripay private key.
pub fn configure_routes<B, G>(cfg: &mut web::ServiceConfig, callback_key: Secret<String>)
where
    B: GroupBuyDatabase + 'static,
    G: PaymentProvider + 'static,
{
    cfg.service(health)
        .service(ListCampaignsRoute::<B>::new())
        .service(CreateCampaignRoute::<B>::new())
        .service(CampaignDetailsRoute::<B>::new())
        .service(UpdateCampaignRoute::<B>::new())
        .service(DeleteCampaignRoute::<B>::new())
        .service(CancelCampaignRoute::<B>::new())
        .service(JoinCampaignRoute::<B, G>::new())
        .service(RetryPaymentRoute::<B, G>::new())
        .service(
            web::scope("/payments")
                .wrap(HmacMiddlewareFactory::new(CALLBACK_SIGNATURE_HEADER, callback_key))
                .service(PaymentWebhookRoute::<B>::new()),
        );
}
