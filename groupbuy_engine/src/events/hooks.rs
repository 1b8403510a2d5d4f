use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    ParticipantPaidEvent,
    ParticipantRefundedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub participant_paid_producer: Vec<EventProducer<ParticipantPaidEvent>>,
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub participant_refunded_producer: Vec<EventProducer<ParticipantRefundedEvent>>,
}

impl EventProducers {
    pub async fn participant_paid(&self, event: ParticipantPaidEvent) {
        for producer in &self.participant_paid_producer {
            trace!("📬️ Publishing participant paid event for #{}", event.participant.id);
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            trace!("📬️ Publishing order created event for order #{}", event.order.order.id);
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn participant_refunded(&self, event: ParticipantRefundedEvent) {
        for producer in &self.participant_refunded_producer {
            trace!("📬️ Publishing refund event for #{}", event.participant.id);
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_participant_paid: Option<EventHandler<ParticipantPaidEvent>>,
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_participant_refunded: Option<EventHandler<ParticipantRefundedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_participant_paid = hooks.on_participant_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_participant_refunded = hooks.on_participant_refunded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_participant_paid, on_order_created, on_participant_refunded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_participant_paid {
            result.participant_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_participant_refunded {
            result.participant_refunded_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per configured hook. Each task ends once all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_participant_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_participant_refunded {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_participant_paid: Option<Handler<ParticipantPaidEvent>>,
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_participant_refunded: Option<Handler<ParticipantRefundedEvent>>,
}

impl EventHooks {
    pub fn on_participant_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ParticipantPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_participant_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_participant_refunded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ParticipantRefundedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_participant_refunded = Some(Arc::new(f));
        self
    }
}
