//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every engine call is async, so keep it that way: no blocking I/O in
//! handlers.
//!
//! Handlers that act on behalf of a user take an [`AuthenticatedUser`] argument. The identity middleware fills it in
//! from the bearer token, and requests without one are answered with 401 before the handler runs.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use groupbuy_engine::{
    campaign_objects::{JoinCampaignRequest, NewCampaignRequest},
    db_types::CampaignUpdate,
    payment_objects::{GatewayPaymentStatus, WebhookOutcome},
    CampaignApi,
    EnrolmentApi,
    GroupBuyDatabase,
    PaymentApi,
    PaymentProvider,
};
use log::*;
use tripay_tools::{CallbackPayload, CallbackStatus, CALLBACK_EVENT_HEADER};

use crate::{
    auth::AuthenticatedUser,
    data_objects::{JsonResponse, RetryPaymentParams},
    errors::ServerError,
};

/// The only callback event that carries payment status changes.
const PAYMENT_STATUS_EVENT: &str = "payment_status";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Campaigns  ----------------------------------------------------
route!(list_campaigns => Get "/group-buy" impl GroupBuyDatabase);
/// Lists every open campaign, newest first. No authentication is required.
pub async fn list_campaigns<B: GroupBuyDatabase>(api: web::Data<CampaignApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET campaigns");
    let campaigns = api.active_campaigns().await?;
    Ok(HttpResponse::Ok().json(campaigns))
}

route!(campaign_details => Get "/group-buy/{id}" impl GroupBuyDatabase);
pub async fn campaign_details<B: GroupBuyDatabase>(
    path: web::Path<i64>,
    api: web::Data<CampaignApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    trace!("💻️ GET campaign #{campaign_id}");
    let details = api.campaign_details(campaign_id).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(create_campaign => Post "/group-buy" impl GroupBuyDatabase);
/// Creates a campaign for one of the caller's products. Only the store owner may do this.
pub async fn create_campaign<B: GroupBuyDatabase>(
    user: AuthenticatedUser,
    body: web::Json<NewCampaignRequest>,
    api: web::Data<CampaignApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST campaign for store #{} by {}", body.store_id, user.user_id);
    let campaign = api.create_campaign(&user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(campaign))
}

route!(update_campaign => Put "/group-buy/{id}" impl GroupBuyDatabase);
pub async fn update_campaign<B: GroupBuyDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<CampaignUpdate>,
    api: web::Data<CampaignApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    debug!("💻️ PUT campaign #{campaign_id} by {}", user.user_id);
    let campaign = api.update_campaign(&user.user_id, campaign_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(campaign))
}

route!(delete_campaign => Delete "/group-buy/{id}" impl GroupBuyDatabase);
/// Deletes a campaign that nobody has joined yet. Campaigns with participants must be cancelled instead.
pub async fn delete_campaign<B: GroupBuyDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CampaignApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    debug!("💻️ DELETE campaign #{campaign_id} by {}", user.user_id);
    api.delete_campaign(&user.user_id, campaign_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Campaign #{campaign_id} deleted"))))
}

route!(cancel_campaign => Post "/group-buy/{id}/cancel" impl GroupBuyDatabase);
/// Closes the campaign early. Every paid participant is marked for refund.
pub async fn cancel_campaign<B: GroupBuyDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CampaignApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    debug!("💻️ POST cancel campaign #{campaign_id} by {}", user.user_id);
    let campaign = api.cancel_campaign(&user.user_id, campaign_id).await?;
    Ok(HttpResponse::Ok().json(campaign))
}

//----------------------------------------------   Enrolment  ----------------------------------------------------
route!(join_campaign => Post "/group-buy/{id}/join" impl GroupBuyDatabase, PaymentProvider);
/// Joins the caller to a campaign and returns the gateway transaction they should pay.
pub async fn join_campaign<B, G>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<JoinCampaignRequest>,
    api: web::Data<EnrolmentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: GroupBuyDatabase,
    G: PaymentProvider,
{
    let campaign_id = path.into_inner();
    debug!("💻️ POST join campaign #{campaign_id} by {} for {} units", user.user_id, body.quantity);
    let joined = api.join_campaign(&user.actor(), campaign_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(joined))
}

route!(retry_payment => Post "/group-buy/{id}/payment" impl GroupBuyDatabase, PaymentProvider);
/// Creates a new gateway transaction for the caller's pending or failed seat in the campaign.
pub async fn retry_payment<B, G>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: Option<web::Json<RetryPaymentParams>>,
    api: web::Data<EnrolmentApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: GroupBuyDatabase,
    G: PaymentProvider,
{
    let campaign_id = path.into_inner();
    let params = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST payment retry for campaign #{campaign_id} by {}", user.user_id);
    let joined = api.retry_payment(&user.actor(), campaign_id, params.payment_method).await?;
    Ok(HttpResponse::Ok().json(joined))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_webhook => Post "/webhook" impl GroupBuyDatabase);
/// Tripay payment-status callback.
///
/// The signature has already been checked by the HMAC middleware by the time this handler runs. Every callback
/// that could be applied, including duplicates and callbacks for payments that are not ours, is acknowledged with
/// 200. Storage failures produce a 5xx so that Tripay delivers the callback again.
pub async fn payment_webhook<B: GroupBuyDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = req.headers().get(CALLBACK_EVENT_HEADER).and_then(|v| v.to_str().ok());
    if let Some(event) = event.filter(|e| *e != PAYMENT_STATUS_EVENT) {
        info!("🪝️ Ignoring {event} callback");
        return Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Ignored {event} callback"))));
    }
    let payload = serde_json::from_slice::<CallbackPayload>(&body).map_err(|e| {
        warn!("🪝️ Could not parse callback body. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let Some(merchant_ref) = payload.merchant_ref.as_deref().filter(|r| !r.trim().is_empty()) else {
        warn!("🪝️ Callback for {:?} has no merchant_ref", payload.reference);
        return Ok(HttpResponse::BadRequest().json(JsonResponse::failure("Invalid payload")));
    };
    let status = gateway_status(payload.status);
    debug!("🪝️ {status} callback for {merchant_ref} (gateway reference {:?})", payload.reference);
    let outcome = api.handle_payment_update(merchant_ref, status).await?;
    match &outcome {
        WebhookOutcome::Counted(p) => info!("🪝️ Payment for participant #{} counted", p.id),
        WebhookOutcome::Rejected(p) => warn!("🪝️ Payment for participant #{} arrived too late. Marked for refund.", p.id),
        other => debug!("🪝️ {other}"),
    }
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome)))
}

fn gateway_status(status: CallbackStatus) -> GatewayPaymentStatus {
    match status {
        CallbackStatus::Paid => GatewayPaymentStatus::Paid,
        CallbackStatus::Failed => GatewayPaymentStatus::Failed,
        CallbackStatus::Expired => GatewayPaymentStatus::Expired,
        CallbackStatus::Refund => GatewayPaymentStatus::Refund,
        CallbackStatus::Unknown => GatewayPaymentStatus::Unknown,
    }
}
