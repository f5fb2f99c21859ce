use crate::core::{
    area::{check_area, AreaDirectory},
    price::{parse_price_range, preset_price_range},
    ranker::{RecommendQuery, RestaurantRanker},
    render::ReplyRenderer,
};
use crate::errors::ProtocolError;
use crate::models::{
    EventKind, InboundEvent, Message, Postback, RestaurantType, SearchBy, SearchType, Step, UserSession,
};
use crate::services::{Clock, LineError, Messenger, SessionStore};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure while handling a single event
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Reply delivery failed: {0}")]
    Delivery(#[from] LineError),
}

/// What a turn decided: messages to send and the session to persist
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    pub reply: Vec<Message>,
    pub push: Vec<Message>,
    pub session: Option<UserSession>,
}

impl Outcome {
    fn reply(message: Message) -> Self {
        Self {
            reply: vec![message],
            ..Default::default()
        }
    }

    fn reply_and_store(message: Message, session: UserSession) -> Self {
        Self {
            reply: vec![message],
            push: Vec::new(),
            session: Some(session),
        }
    }

    fn ignore() -> Self {
        Self::default()
    }
}

/// Per-batch counters, logged once per webhook call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub handled: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct ConversationOptions {
    pub menu_keywords: Vec<String>,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            menu_keywords: vec!["選單".to_string(), "搜尋餐廳".to_string()],
        }
    }
}

/// Guided restaurant search driven by inbound chat events
pub struct Conversation {
    sessions: Arc<dyn SessionStore>,
    messenger: Arc<dyn Messenger>,
    ranker: Arc<RestaurantRanker>,
    areas: Arc<AreaDirectory>,
    renderer: ReplyRenderer,
    options: ConversationOptions,
    clock: Arc<dyn Clock>,
}

impl Conversation {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        messenger: Arc<dyn Messenger>,
        ranker: Arc<RestaurantRanker>,
        areas: Arc<AreaDirectory>,
        renderer: ReplyRenderer,
        options: ConversationOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            messenger,
            ranker,
            areas,
            renderer,
            options,
            clock,
        }
    }

    /// Process a webhook batch sequentially; one event's failure never stops the rest
    pub async fn handle_batch(&self, events: &[Value]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for raw in events {
            let event = match InboundEvent::try_from(raw) {
                Ok(event) => event,
                Err(e) => {
                    tracing::info!("Skipping event: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.handle_event(&event).await {
                Ok(()) => summary.handled += 1,
                Err(e) => {
                    tracing::error!(user_id = %event.user_id, "Failed to handle {} event: {}", event.kind.name(), e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Load the session, decide, persist, then deliver
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<(), EventError> {
        tracing::info!(user_id = %event.user_id, kind = event.kind.name(), "Handling event");

        let session = match self.sessions.get(&event.user_id).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Session store unavailable, starting fresh: {}", e);
                None
            }
        };

        let outcome = self.respond(event, session).await;

        if let Some(session) = outcome.session {
            if let Err(e) = self.sessions.put(&event.user_id, session).await {
                tracing::warn!("Failed to store session for {}: {}", event.user_id, e);
            }
        }

        if !outcome.reply.is_empty() {
            self.messenger.reply(&event.reply_token, &outcome.reply).await?;
        }

        if !outcome.push.is_empty() {
            if let Err(e) = self.messenger.push(&event.user_id, &outcome.push).await {
                tracing::warn!("Failed to push follow-up to {}: {}", event.user_id, e);
            }
        }

        Ok(())
    }

    /// Decide the reply and next session for one event
    pub async fn respond(&self, event: &InboundEvent, session: Option<UserSession>) -> Outcome {
        match &event.kind {
            EventKind::Text { text } => self.on_text(text, session),
            EventKind::Location { latitude, longitude } => {
                self.on_location(*latitude, *longitude, session.as_ref()).await
            }
            EventKind::Postback { data } => match Postback::parse(data) {
                Ok(postback) => self.on_postback(postback, session),
                Err(e) => {
                    tracing::info!("Ignoring postback {:?}: {}", data, e);
                    Outcome::ignore()
                }
            },
        }
    }

    fn is_menu_keyword(&self, text: &str) -> bool {
        self.options.menu_keywords.iter().any(|k| k == text)
    }

    fn fresh_or(&self, session: Option<UserSession>) -> UserSession {
        session.unwrap_or_else(|| UserSession::new(self.clock.now()))
    }

    fn on_text(&self, text: &str, session: Option<UserSession>) -> Outcome {
        let text = text.trim();

        if self.is_menu_keyword(text) {
            return Outcome::reply(self.renderer.main_menu());
        }

        let step = session.as_ref().map(|s| s.step).unwrap_or_default();

        if step == Step::WaitingPriceInput {
            return match parse_price_range(text) {
                Ok(range) => {
                    let mut session = self.fresh_or(session);
                    session.price_range = Some(range);
                    session.search_type = SearchType::Price;
                    session.step = Step::PriceSet;
                    Outcome::reply_and_store(self.renderer.confirmation(&session), session)
                }
                Err(e) => {
                    tracing::info!("Re-prompting for price: {}", e);
                    Outcome::reply(self.renderer.invalid_price())
                }
            };
        }

        if step == Step::WaitingCustomTypeInput && !text.is_empty() {
            let mut session = self.fresh_or(session);
            session.restaurant_type = Some(RestaurantType::custom(text));
            session.search_type = SearchType::Type;
            session.step = Step::TypeSet;
            return Outcome::reply_and_store(self.renderer.confirmation(&session), session);
        }

        if let Some(check) = check_area(&self.areas, text) {
            tracing::info!(found = check.found, "Area input {} {}", check.area.city, check.area.district);
            let reply = self.renderer.area_result(&check);
            let mut session = self.fresh_or(session);
            session.location_input_area = Some(check.area);
            session.search_type = SearchType::Area;
            session.step = Step::AreaInput;
            return Outcome::reply_and_store(reply, session);
        }

        Outcome::reply(self.renderer.help())
    }

    async fn on_location(&self, latitude: f64, longitude: f64, session: Option<&UserSession>) -> Outcome {
        let query = RecommendQuery {
            latitude,
            longitude,
            price_range: session.and_then(|s| s.price_range),
            restaurant_type: session.and_then(|s| s.restaurant_type.clone()),
            radius_m: None,
        };

        let results = self.ranker.recommend(&query).await;
        Outcome::reply(self.renderer.restaurants(&results, query.price_range.as_ref()))
    }

    fn on_postback(&self, postback: Postback, session: Option<UserSession>) -> Outcome {
        match postback {
            Postback::Search(SearchBy::Area) => {
                let mut session = self.fresh_or(session);
                session.search_type = SearchType::Area;
                // Leaving a pending free-text prompt; the next text is an area
                session.step = Step::None;
                Outcome {
                    reply: vec![self.renderer.area_prompt()],
                    push: vec![self.renderer.location_request()],
                    session: Some(session),
                }
            }
            Postback::Search(SearchBy::Type) => {
                let mut session = self.fresh_or(session);
                session.search_type = SearchType::Type;
                session.step = Step::WaitingTypeSelection;
                Outcome::reply_and_store(self.renderer.type_menu(), session)
            }
            Postback::Search(SearchBy::Price) => {
                let mut session = self.fresh_or(session);
                session.search_type = SearchType::Price;
                session.step = Step::WaitingPriceSelection;
                Outcome::reply_and_store(self.renderer.price_menu(), session)
            }
            Postback::Search(SearchBy::Popular) => match session {
                Some(mut session) if session.step != Step::None => {
                    session.step = Step::None;
                    Outcome::reply_and_store(self.renderer.popular(), session)
                }
                _ => Outcome::reply(self.renderer.popular()),
            },
            Postback::SetType { category, keyword } => {
                let mut session = self.fresh_or(session);
                if session.step != Step::WaitingTypeSelection {
                    tracing::debug!(step = ?session.step, "Type chosen outside the type menu");
                }
                session.restaurant_type = Some(RestaurantType { category, keyword });
                session.search_type = SearchType::Type;
                session.step = Step::TypeSet;
                Outcome::reply_and_store(self.renderer.confirmation(&session), session)
            }
            Postback::CustomType => {
                let mut session = self.fresh_or(session);
                session.step = Step::WaitingCustomTypeInput;
                Outcome::reply_and_store(self.renderer.custom_type_prompt(), session)
            }
            Postback::SetPrice { min, max } => match preset_price_range(min, max) {
                Ok(range) => {
                    let mut session = self.fresh_or(session);
                    session.price_range = Some(range);
                    session.search_type = SearchType::Price;
                    session.step = Step::PriceSet;
                    Outcome::reply_and_store(self.renderer.confirmation(&session), session)
                }
                Err(e) => {
                    tracing::info!("Ignoring preset price: {}", e);
                    Outcome::ignore()
                }
            },
            Postback::CustomPrice => {
                let mut session = self.fresh_or(session);
                session.step = Step::WaitingPriceInput;
                Outcome::reply_and_store(self.renderer.price_prompt(), session)
            }
        }
    }
}
