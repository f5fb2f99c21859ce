// Integration tests for food-line-bot: full conversation flows against in-process fakes

use async_trait::async_trait;
use chrono::{Duration, Utc};
use food_line_bot::core::{
    AreaDirectory, Conversation, ConversationOptions, ReplyRenderer, RestaurantRanker,
};
use food_line_bot::models::{
    EventKind, InboundEvent, Message, PlaceCandidate, PriceKind, RankingSettings, SearchType, Step,
};
use food_line_bot::models::UserSession;
use food_line_bot::services::{
    LineError, ManualClock, MemorySessionStore, Messenger, NearbyRequest, NearbySearch, PlacesError,
    SessionError, SessionStore, SystemClock,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeMessenger {
    replies: Mutex<Vec<Vec<Message>>>,
    pushes: Mutex<Vec<Vec<Message>>>,
}

impl FakeMessenger {
    fn last_reply(&self) -> Vec<Message> {
        self.replies.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn reply_count(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn reply(&self, _reply_token: &str, messages: &[Message]) -> Result<(), LineError> {
        self.replies.lock().unwrap().push(messages.to_vec());
        Ok(())
    }

    async fn push(&self, _user_id: &str, messages: &[Message]) -> Result<(), LineError> {
        self.pushes.lock().unwrap().push(messages.to_vec());
        Ok(())
    }
}

struct FakeSearch {
    places: Vec<PlaceCandidate>,
    fail: bool,
    requests: Mutex<Vec<NearbyRequest>>,
}

#[async_trait]
impl NearbySearch for FakeSearch {
    async fn nearby_restaurants(&self, request: &NearbyRequest) -> Result<Vec<PlaceCandidate>, PlacesError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(PlacesError::ApiError("OVER_QUERY_LIMIT: quota".to_string()));
        }
        Ok(self.places.clone())
    }
}

struct TestBot {
    conversation: Conversation,
    messenger: Arc<FakeMessenger>,
    search: Arc<FakeSearch>,
    store: Arc<MemorySessionStore>,
    clock: Arc<ManualClock>,
}

fn create_place(name: &str, rating: f64, count: u32) -> PlaceCandidate {
    PlaceCandidate {
        name: name.to_string(),
        address: Some("台北市中山區南京東路".to_string()),
        rating: Some(rating),
        rating_count: Some(count),
        price_level: Some(2),
        photo_reference: Some(format!("photo-{}", count)),
        latitude: 25.052,
        longitude: 121.532,
    }
}

fn create_bot(places: Vec<PlaceCandidate>, fail: bool) -> TestBot {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemorySessionStore::with_clock(1_000, 1800, clock.clone()));
    let messenger = Arc::new(FakeMessenger::default());
    let search = Arc::new(FakeSearch { places, fail, requests: Mutex::new(Vec::new()) });
    let ranker = Arc::new(RestaurantRanker::new(search.clone(), RankingSettings::default()));
    let areas = Arc::new(AreaDirectory::new([("台北市", vec!["中山區", "大安區"])]));

    let conversation = Conversation::new(
        store.clone(),
        messenger.clone(),
        ranker,
        areas,
        ReplyRenderer::default(),
        ConversationOptions::default(),
        clock.clone(),
    );

    TestBot { conversation, messenger, search, store, clock }
}

fn event(kind: EventKind) -> InboundEvent {
    InboundEvent {
        user_id: "U-integration".to_string(),
        reply_token: "reply-token".to_string(),
        kind,
    }
}

fn text(t: &str) -> InboundEvent {
    event(EventKind::Text { text: t.to_string() })
}

fn postback(data: &str) -> InboundEvent {
    event(EventKind::Postback { data: data.to_string() })
}

fn location() -> InboundEvent {
    event(EventKind::Location { latitude: 25.0478, longitude: 121.5319 })
}

fn carousel_size(message: &Message) -> Option<usize> {
    let json = serde_json::to_value(message).unwrap();
    if json["type"] != "flex" || json["contents"]["type"] != "carousel" {
        return None;
    }
    json["contents"]["contents"].as_array().map(|a| a.len())
}

#[tokio::test]
async fn test_integration_price_flow_end_to_end() {
    let bot = create_bot(
        vec![
            create_place("阿宗麵線", 4.3, 1200),
            create_place("小巷咖啡", 4.8, 40),
            create_place("新開幕餐館", 5.0, 2),
        ],
        false,
    );

    bot.conversation.handle_event(&postback("action=search&by=price")).await.unwrap();
    bot.conversation.handle_event(&postback("action=custom_price")).await.unwrap();
    let session = bot.store.get("U-integration").await.unwrap().unwrap();
    assert_eq!(session.step, Step::WaitingPriceInput);

    bot.conversation.handle_event(&text("200～600")).await.unwrap();
    let session = bot.store.get("U-integration").await.unwrap().unwrap();
    assert_eq!(session.step, Step::WaitingPriceInput, "full-width tilde is not a range separator");

    bot.conversation.handle_event(&text("200－600")).await.unwrap();
    let session = bot.store.get("U-integration").await.unwrap().unwrap();
    assert_eq!(session.step, Step::PriceSet);
    assert_eq!(session.search_type, SearchType::Price);
    let range = session.price_range.unwrap();
    assert_eq!((range.min, range.max, range.kind), (200, 600, PriceKind::Range));

    bot.conversation.handle_event(&location()).await.unwrap();
    let reply = bot.messenger.last_reply();
    assert_eq!(reply.len(), 1);
    assert_eq!(carousel_size(&reply[0]), Some(2));

    let rendered = serde_json::to_string(&reply[0]).unwrap();
    assert!(rendered.contains("阿宗麵線"));
    assert!(!rendered.contains("新開幕餐館"));
    assert!(rendered.contains("符合預算"));
}

#[tokio::test]
async fn test_integration_type_flow_sends_keyword() {
    let bot = create_bot(vec![create_place("燒肉一番日式料理", 4.5, 300)], false);

    bot.conversation.handle_event(&postback("action=search&by=type")).await.unwrap();
    assert_eq!(bot.messenger.last_reply()[0].actions().len(), 6);

    bot.conversation.handle_event(&postback("action=custom_type")).await.unwrap();
    bot.conversation.handle_event(&text("日式料理")).await.unwrap();

    let session = bot.store.get("U-integration").await.unwrap().unwrap();
    assert_eq!(session.step, Step::TypeSet);

    bot.conversation.handle_event(&location()).await.unwrap();
    let requests = bot.search.requests.lock().unwrap();
    assert_eq!(requests.last().unwrap().keyword.as_deref(), Some("日式料理"));
    assert_eq!(requests.last().unwrap().radius_m, 1000);
    drop(requests);

    assert_eq!(carousel_size(&bot.messenger.last_reply()[0]), Some(1));
}

#[tokio::test]
async fn test_integration_area_flow() {
    let bot = create_bot(vec![], false);

    bot.conversation.handle_event(&postback("action=search&by=area")).await.unwrap();
    assert_eq!(bot.messenger.pushes.lock().unwrap().len(), 1);

    bot.conversation.handle_event(&text("台北市 大安區")).await.unwrap();
    let reply = bot.messenger.last_reply();
    assert_eq!(reply[0].as_text().unwrap().lines().next(), Some("輸入成功: 台北市 大安區 存在於資料中"));

    let session = bot.store.get("U-integration").await.unwrap().unwrap();
    assert_eq!(session.step, Step::AreaInput);
    assert_eq!(session.location_input_area.unwrap().district, "大安區");
}

#[tokio::test]
async fn test_integration_session_expires_after_ttl() {
    let bot = create_bot(vec![], false);

    bot.conversation.handle_event(&postback("action=custom_price")).await.unwrap();
    assert!(bot.store.get("U-integration").await.unwrap().is_some());

    bot.clock.advance(Duration::minutes(31));
    assert!(bot.store.get("U-integration").await.unwrap().is_none());

    // The pending price prompt is forgotten, so a number is just unrecognized text
    bot.conversation.handle_event(&text("300")).await.unwrap();
    assert!(bot.messenger.last_reply()[0].as_text().unwrap().contains("「選單」"));
    assert!(bot.store.get("U-integration").await.unwrap().is_none());
}

#[tokio::test]
async fn test_integration_menu_is_idempotent() {
    let bot = create_bot(vec![], false);

    bot.conversation.handle_event(&text("選單")).await.unwrap();
    let first = bot.messenger.last_reply();
    bot.conversation.handle_event(&text("選單")).await.unwrap();
    let second = bot.messenger.last_reply();

    assert_eq!(first, second);
    assert!(bot.store.get("U-integration").await.unwrap().is_none());
}

#[tokio::test]
async fn test_integration_search_failure_renders_not_found() {
    let bot = create_bot(vec![create_place("不會出現", 4.0, 100)], true);

    bot.conversation.handle_event(&location()).await.unwrap();
    let reply = bot.messenger.last_reply();
    assert!(reply[0].as_text().unwrap().contains("沒有找到"));
}

#[tokio::test]
async fn test_integration_batch_continues_after_bad_events() {
    let bot = create_bot(vec![], false);
    let events = vec![
        json!({"type": "message", "replyToken": "r1", "source": {"userId": "U1"}, "message": {"type": "text", "text": "選單"}}),
        json!({"type": "postback", "source": {"userId": "U1"}, "postback": {"data": "action=search&by=type"}}),
        json!({"type": "unfollow", "source": {"userId": "U1"}}),
        json!({"type": "postback", "replyToken": "r2", "source": {"userId": "U1"}, "postback": {"data": "by=area"}}),
        json!({"type": "message", "replyToken": "r3", "source": {"userId": "U1"}, "message": {"type": "text", "text": "哈囉"}}),
    ];

    let summary = bot.conversation.handle_batch(&events).await;
    assert_eq!(summary.handled, 3);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.failed, 0);
    // Malformed postback produced no reply; menu and help did
    assert_eq!(bot.messenger.reply_count(), 2);
}

/// Rejects replies for one reply token, delivers everything else
struct FlakyMessenger {
    failing_token: &'static str,
    delivered: Mutex<Vec<String>>,
}

#[async_trait]
impl Messenger for FlakyMessenger {
    async fn reply(&self, reply_token: &str, _messages: &[Message]) -> Result<(), LineError> {
        if reply_token == self.failing_token {
            return Err(LineError::ApiError {
                status: 400,
                body: r#"{"message":"Invalid reply token"}"#.to_string(),
            });
        }
        self.delivered.lock().unwrap().push(reply_token.to_string());
        Ok(())
    }

    async fn push(&self, _user_id: &str, _messages: &[Message]) -> Result<(), LineError> {
        Ok(())
    }
}

/// Session backend that is always down
struct UnavailableStore {
    puts: Mutex<usize>,
}

#[async_trait]
impl SessionStore for UnavailableStore {
    async fn get(&self, _user_id: &str) -> Result<Option<UserSession>, SessionError> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    async fn put(&self, _user_id: &str, _session: UserSession) -> Result<(), SessionError> {
        *self.puts.lock().unwrap() += 1;
        Err(SessionError::Unavailable("connection refused".to_string()))
    }
}

fn create_conversation(store: Arc<dyn SessionStore>, messenger: Arc<dyn Messenger>) -> Conversation {
    let search = Arc::new(FakeSearch { places: vec![], fail: false, requests: Mutex::new(Vec::new()) });
    Conversation::new(
        store,
        messenger,
        Arc::new(RestaurantRanker::new(search, RankingSettings::default())),
        Arc::new(AreaDirectory::new([("台北市", vec!["中山區"])])),
        ReplyRenderer::default(),
        ConversationOptions::default(),
        Arc::new(SystemClock),
    )
}

#[tokio::test]
async fn test_integration_delivery_failure_does_not_abort_batch() {
    let messenger = Arc::new(FlakyMessenger { failing_token: "r1", delivered: Mutex::new(Vec::new()) });
    let conversation = create_conversation(Arc::new(MemorySessionStore::new(100, 1800)), messenger.clone());

    let events = vec![
        json!({"type": "message", "replyToken": "r1", "source": {"userId": "U1"}, "message": {"type": "text", "text": "選單"}}),
        json!({"type": "message", "replyToken": "r2", "source": {"userId": "U2"}, "message": {"type": "text", "text": "選單"}}),
    ];

    let summary = conversation.handle_batch(&events).await;
    assert_eq!(summary.handled, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(*messenger.delivered.lock().unwrap(), vec!["r2".to_string()]);
}

#[tokio::test]
async fn test_integration_unavailable_store_is_treated_as_absent() {
    let store = Arc::new(UnavailableStore { puts: Mutex::new(0) });
    let messenger = Arc::new(FakeMessenger::default());
    let conversation = create_conversation(store.clone(), messenger.clone());

    // A pending price prompt cannot be remembered, so a number falls through to help
    conversation.handle_event(&postback("action=custom_price")).await.unwrap();
    assert!(messenger.last_reply()[0].as_text().unwrap().contains("預算"));

    conversation.handle_event(&text("300")).await.unwrap();
    assert!(messenger.last_reply()[0].as_text().unwrap().contains("「選單」"));

    // Fresh-state handling still answers area input
    conversation.handle_event(&text("台北市 中山區")).await.unwrap();
    assert!(messenger.last_reply()[0].as_text().unwrap().starts_with("輸入成功"));

    assert_eq!(*store.puts.lock().unwrap(), 2);
    assert_eq!(messenger.reply_count(), 3);
}
