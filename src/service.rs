// The push service: owns every piece of pipeline state for one host integration
// Intake, tap handlers and lifecycle callbacks all go through a single instance.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;

use crate::backends::{DeliveryOutcome, DeliveryQueue, NotificationRenderer};
use crate::components::content::parse_count;
use crate::components::{
    AppState, BadgeSink, BuiltNotification, CanonicalMessage, HostBridge, HostLauncher,
    LifecycleRouter, MessageId, NotificationRecords, NotificationSurface, PayloadNormalizer,
    PendingAction, PushConfig, PushResult, RawPayload, ResourceResolver, RouteDecision, keys,
};

/// What the service did with one arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub decision: RouteDecision,
    /// Set when the message was handed to the delivery queue
    pub delivery: Option<DeliveryOutcome>,
    /// A notification was posted to the surface
    pub rendered: bool,
    pub launched: bool,
}

impl RouteOutcome {
    pub fn delivered(&self) -> bool {
        self.delivery.is_some()
    }
}

/// Push integration for one host.
///
/// Holds configuration, lifecycle state, the per-id line records, the delivery buffer and
/// the renderer with its image cache. Nothing is process-global: drop the service (after
/// `shutdown`) and all of it goes away.
pub struct PushService {
    router: LifecycleRouter,
    normalizer: RwLock<Arc<PayloadNormalizer>>,
    renderer: NotificationRenderer,
    queue: DeliveryQueue,
    records: Arc<NotificationRecords>,
    resources: Arc<dyn ResourceResolver>,
    surface: Arc<dyn NotificationSurface>,
    badge: Arc<dyn BadgeSink>,
    launcher: Arc<dyn HostLauncher>,
}

impl PushService {
    pub fn new(
        config: PushConfig,
        bridge: Arc<dyn HostBridge>,
        surface: Arc<dyn NotificationSurface>,
        resources: Arc<dyn ResourceResolver>,
        badge: Arc<dyn BadgeSink>,
        launcher: Arc<dyn HostLauncher>,
    ) -> PushResult<Arc<Self>> {
        let config = Arc::new(config);
        let records = Arc::new(NotificationRecords::new());
        let renderer =
            NotificationRenderer::new(config.clone(), resources.clone(), records.clone())?;
        let normalizer = PayloadNormalizer::new(config.key_overrides(), resources.clone());

        let router = if bridge.is_attached() {
            LifecycleRouter::attached()
        } else {
            LifecycleRouter::new()
        };

        tracing::info!(state = ?router.state(), "Push service started");

        Ok(Arc::new(Self {
            router,
            normalizer: RwLock::new(Arc::new(normalizer)),
            renderer,
            queue: DeliveryQueue::new(bridge),
            records,
            resources,
            surface,
            badge,
            launcher,
        }))
    }

    pub fn config(&self) -> Arc<PushConfig> {
        self.renderer.config()
    }

    /// Replace the configuration wholesale. Messages already in flight finish with the
    /// configuration they started with.
    pub fn update_config(&self, config: PushConfig) {
        let config = Arc::new(config);
        *self.normalizer.write() = Arc::new(PayloadNormalizer::new(
            config.key_overrides(),
            self.resources.clone(),
        ));
        self.renderer.update_config(config);
        tracing::info!("Push configuration updated");
    }

    pub fn state(&self) -> AppState {
        self.router.state()
    }

    pub fn records(&self) -> &NotificationRecords {
        &self.records
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn renderer(&self) -> &NotificationRenderer {
        &self.renderer
    }

    pub fn normalize(&self, raw: &RawPayload) -> CanonicalMessage {
        let normalizer = self.normalizer.read().clone();
        normalizer.normalize(raw)
    }

    pub async fn render(&self, message: &CanonicalMessage) -> BuiltNotification {
        self.renderer.render(message).await
    }

    /// Process one arrival end to end: normalize, route, then render, launch and deliver
    /// as the routing decision says
    pub async fn handle(&self, raw: RawPayload) -> RouteOutcome {
        let message_id = MessageId::generate();
        let span = tracing::info_span!(
            "push_arrival",
            %message_id,
            not_id = tracing::field::Empty
        );
        self.handle_inner(raw).instrument(span).await
    }

    async fn handle_inner(&self, raw: RawPayload) -> RouteOutcome {
        let config = self.config();
        let mut message = self.normalize(&raw);
        let id = message.not_id();
        tracing::Span::current().record("not_id", id.as_i32());

        if config.clear_badge {
            self.badge.set_badge(0);
        }

        let decision = self.router.route_current(&mut message, config.force_show);
        tracing::info!(
            deliver = decision.deliver,
            render = decision.render,
            launch = decision.launch,
            "Routed message"
        );

        let mut outcome = RouteOutcome {
            decision,
            delivery: None,
            rendered: false,
            launched: false,
        };

        if decision.render {
            outcome.rendered = self.post_notification(&mut message).await;
        }

        if decision.launch {
            tracing::info!("Host not running, starting it in the background");
            self.launcher.launch_in_background(&message);
            outcome.launched = true;
        }

        if decision.deliver {
            outcome.delivery = Some(self.queue.deliver(message));
        }

        outcome
    }

    /// Badge bookkeeping, then render if there is anything to show
    async fn post_notification(&self, message: &mut CanonicalMessage) -> bool {
        if let Some(count) = message.non_empty(keys::COUNT) {
            match parse_count(&count) {
                Ok(count) => {
                    self.badge.set_badge(count);
                    if count == 0 {
                        self.surface.cancel_all();
                    }
                },
                Err(e) => tracing::warn!(error = %e, "Leaving badge unchanged"),
            }
        }

        if !NotificationRenderer::has_visible_content(message) {
            tracing::debug!("No message or title, nothing to render");
            return false;
        }

        if message.non_empty(keys::TITLE).is_none() {
            message.insert_str(keys::TITLE, self.resources.app_name());
        }

        let built = self.renderer.render(message).await;
        self.surface.render(built.id, &built);
        true
    }

    /// Start the intake worker. Each submitted payload is handled on its own task so a
    /// slow image download for one message never holds up another.
    pub fn spawn_intake(self: &Arc<Self>) -> IntakeHandle {
        let (sender, mut receiver) = mpsc::unbounded_channel::<RawPayload>();
        let service = Arc::clone(self);

        let worker = tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            loop {
                tokio::select! {
                    next = receiver.recv() => match next {
                        Some(raw) => {
                            let service = Arc::clone(&service);
                            in_flight.spawn(async move {
                                service.handle(raw).await;
                            });
                        },
                        None => break,
                    },
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            tracing::warn!(error = %e, "Intake task failed");
                        }
                    },
                }
            }
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "Intake task failed");
                }
            }
            tracing::debug!("Intake worker stopped");
        });

        IntakeHandle { sender, worker }
    }

    pub fn on_bridge_attached(&self) -> usize {
        self.router.on_bridge_attached();
        self.queue.on_bridge_attached()
    }

    pub fn on_bridge_detached(&self) {
        self.router.on_bridge_detached();
        self.queue.on_bridge_detached();
        if self.config().clear_notifications {
            self.surface.cancel_all();
            self.records.clear_all();
        }
    }

    pub fn on_pause(&self) -> AppState {
        self.router.on_pause()
    }

    pub fn on_resume(&self) -> AppState {
        self.router.on_resume()
    }

    /// Notification body or foreground action tapped
    pub fn on_notification_tapped(
        &self,
        action: &PendingAction,
        payload: &CanonicalMessage,
        inline_reply: Option<String>,
    ) -> DeliveryOutcome {
        let coldstart = !self.router.state().is_running();
        self.surface.cancel(action.not_id);
        self.complete_action(action, payload, coldstart, inline_reply)
    }

    /// Action button handled without bringing the host UI up
    pub fn on_action_in_background(
        &self,
        action: &PendingAction,
        payload: &CanonicalMessage,
        inline_reply: Option<String>,
    ) -> DeliveryOutcome {
        self.surface.cancel(action.not_id);
        self.complete_action(action, payload, false, inline_reply)
    }

    /// Notification swiped away
    pub fn on_notification_dismissed(
        &self,
        action: &PendingAction,
        payload: &CanonicalMessage,
    ) -> DeliveryOutcome {
        let coldstart = !self.router.state().is_running();
        self.complete_action(action, payload, coldstart, None)
    }

    fn complete_action(
        &self,
        action: &PendingAction,
        payload: &CanonicalMessage,
        coldstart: bool,
        inline_reply: Option<String>,
    ) -> DeliveryOutcome {
        self.records.clear(action.not_id);

        let mut message = payload.clone();
        // The host asked for this one, it must not be discarded
        message.remove(keys::NO_CACHE);
        message.set_flag(keys::FOREGROUND, false);
        message.set_flag(keys::COLDSTART, coldstart);
        message.set_flag(keys::DISMISSED, action.dismissed);
        if let Some(callback) = &action.callback {
            message.insert_str(keys::ACTION_CALLBACK, callback.clone());
        }
        if let Some(reply) = inline_reply {
            message.insert_str(keys::INLINE_REPLY, reply);
        }

        tracing::info!(
            not_id = %action.not_id,
            callback = ?action.callback,
            dismissed = action.dismissed,
            "Notification action"
        );
        self.queue.deliver(message)
    }

    /// Detach from the host and remove downloaded images
    pub fn shutdown(&self) {
        self.on_bridge_detached();
        self.renderer.images().cleanup_all();
        tracing::info!(buffered = self.queue.len(), "Push service shut down");
    }
}

/// Sender side of the intake worker
pub struct IntakeHandle {
    sender: mpsc::UnboundedSender<RawPayload>,
    worker: JoinHandle<()>,
}

impl IntakeHandle {
    /// Queue a payload for processing. Returns false once the worker has stopped.
    pub fn submit(&self, raw: RawPayload) -> bool {
        self.sender.send(raw).is_ok()
    }

    /// Stop accepting payloads and wait for every in-flight one to finish
    pub async fn close(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "Intake worker ended abnormally");
        }
    }
}
