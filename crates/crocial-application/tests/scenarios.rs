//! End-to-end screen scenarios over mock collaborators.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use crocial_application::{DashboardScreen, MessagesScreen, SocialScreen, StudioScreen};
use crocial_core::error::{CrocialError, Result};
use crocial_core::gateway::{
    AuthGateway, ContentGateway, ImageGenerationParams, InferenceGateway, MediaRef,
    MessagingGateway, PaymentGateway, StablecoinGateway, VideoGenerationParams, WalletGateway,
};
use crocial_core::generation::GenerationView;
use crocial_core::message::{Conversation, Direction, Message};
use crocial_core::payment::{PaymentReceipt, PaymentRequest, PaymentStatus};
use crocial_core::post::{ContentPost, PostDraft, PostId};
use crocial_core::session::Session;
use crocial_core::wallet::{CurrencyCode, NativeBalance, WalletAddress};
use tokio::sync::Notify;

fn addr(s: &str) -> WalletAddress {
    WalletAddress::parse(s).unwrap()
}

fn session_with_wallet(wallet: &str) -> Session {
    Session {
        user_id: "user_1".to_string(),
        display_name: "Ada".to_string(),
        wallet: Some(addr(wallet)),
    }
}

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

struct MockAuth {
    session: Mutex<Option<Session>>,
    sign_out_calls: AtomicUsize,
    fail_sign_out: bool,
}

impl MockAuth {
    fn signed_in(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            sign_out_calls: AtomicUsize::new(0),
            fail_sign_out: false,
        }
    }
}

#[async_trait]
impl AuthGateway for MockAuth {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn sign_out(&self, _redirect_target: &str) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(CrocialError::network("auth provider unreachable"));
        }
        Ok(())
    }
}

struct MockWallet {
    wei: u128,
}

#[async_trait]
impl WalletGateway for MockWallet {
    async fn native_balance(&self, _address: &WalletAddress) -> Result<NativeBalance> {
        Ok(NativeBalance::from_wei(self.wei))
    }
}

struct MockStablecoins;

#[async_trait]
impl StablecoinGateway for MockStablecoins {
    async fn balances(&self, _address: &WalletAddress) -> Result<BTreeMap<CurrencyCode, String>> {
        let mut balances = BTreeMap::new();
        balances.insert(CurrencyCode::USD, "120.5".to_string());
        balances.insert(CurrencyCode::EUR, "0".to_string());
        Ok(balances)
    }
}

struct MockPayments {
    /// Idempotency keys in arrival order
    keys: Mutex<Vec<String>>,
    /// Scripted outcomes, consumed front to back; afterwards confirmed
    outcomes: Mutex<Vec<Result<PaymentReceipt>>>,
}

impl MockPayments {
    fn new(outcomes: Vec<Result<PaymentReceipt>>) -> Self {
        Self {
            keys: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes),
        }
    }

    fn confirmed() -> PaymentReceipt {
        PaymentReceipt {
            status: PaymentStatus::Confirmed,
            payment_id: Some("pay_1".to_string()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPayments {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        self.keys
            .lock()
            .unwrap()
            .push(request.idempotency_key.to_string());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            Ok(Self::confirmed())
        } else {
            outcomes.remove(0)
        }
    }
}

/// Payment mock that blocks in the gateway until released, so tests can
/// submit a second payment while the first is mid-flight.
struct GatedPayments {
    amounts: Mutex<Vec<String>>,
    gate: Notify,
}

impl GatedPayments {
    fn new() -> Self {
        Self {
            amounts: Mutex::new(Vec::new()),
            gate: Notify::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for GatedPayments {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        self.amounts.lock().unwrap().push(request.amount.clone());
        self.gate.notified().await;
        Ok(MockPayments::confirmed())
    }
}

struct MockMessaging {
    conversations: Mutex<Vec<Conversation>>,
    send_calls: AtomicUsize,
}

impl MockMessaging {
    fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            send_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MessagingGateway for MockMessaging {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn send_message(&self, peer: &str, body: &str) -> Result<Message> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Message {
            peer: peer.to_string(),
            body: body.to_string(),
            sent_at: Utc.timestamp_opt(1000, 0).unwrap(),
            direction: Direction::Sent,
        })
    }
}

struct MockContent {
    posts: Mutex<Vec<ContentPost>>,
    fail_list: Mutex<bool>,
}

#[async_trait]
impl ContentGateway for MockContent {
    async fn list_posts(&self) -> Result<Vec<ContentPost>> {
        if *self.fail_list.lock().unwrap() {
            return Err(CrocialError::network("content service unreachable"));
        }
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn create_post(&self, author: &str, draft: &PostDraft) -> Result<ContentPost> {
        Ok(ContentPost {
            id: PostId("p-new".to_string()),
            author: author.to_string(),
            body: draft.body.clone(),
            image_url: None,
            upvotes: 0,
            created_at: Utc.timestamp_opt(999, 0).unwrap(),
        })
    }

    async fn increment_upvote(&self, _id: &PostId) -> Result<u64> {
        Ok(1)
    }
}

/// Inference mock whose video stage blocks until released, so tests can
/// interleave a restart with an in-flight conversion.
struct GatedInference {
    image_outputs: Mutex<Vec<Vec<MediaRef>>>,
    image_calls: AtomicUsize,
    video_gate: Notify,
    gate_video: bool,
}

impl GatedInference {
    fn new(image_outputs: Vec<Vec<MediaRef>>, gate_video: bool) -> Self {
        Self {
            image_outputs: Mutex::new(image_outputs),
            image_calls: AtomicUsize::new(0),
            video_gate: Notify::new(),
            gate_video,
        }
    }
}

#[async_trait]
impl InferenceGateway for GatedInference {
    async fn generate_image(
        &self,
        _prompt: &str,
        _params: &ImageGenerationParams,
    ) -> Result<Vec<MediaRef>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let mut outputs = self.image_outputs.lock().unwrap();
        if outputs.is_empty() {
            Ok(vec![MediaRef("https://img/default.png".to_string())])
        } else {
            Ok(outputs.remove(0))
        }
    }

    async fn generate_video(
        &self,
        image: &MediaRef,
        _params: &VideoGenerationParams,
    ) -> Result<MediaRef> {
        if self.gate_video {
            self.video_gate.notified().await;
        }
        Ok(MediaRef(format!("{}.mp4", image.0)))
    }
}

fn dashboard(
    auth: Arc<MockAuth>,
    payments: Arc<MockPayments>,
    messaging: Arc<MockMessaging>,
) -> DashboardScreen {
    DashboardScreen::new(
        auth,
        Arc::new(MockWallet {
            wei: 1_500_000_000_000_000_000,
        }),
        Arc::new(MockStablecoins),
        payments,
        messaging,
    )
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_successful_generation_reaches_image_ready() {
    let inference = Arc::new(GatedInference::new(
        vec![vec![MediaRef("https://img/sunset.png".to_string())]],
        false,
    ));
    let studio = StudioScreen::new(inference);

    studio.generate("sunset over mountains").await.unwrap();

    assert_eq!(
        studio.view().await,
        GenerationView::ImageReady {
            image_url: "https://img/sunset.png".to_string(),
            video_url: None,
            video_error: None,
            video_generating: false,
        }
    );
}

#[tokio::test]
async fn scenario_b_restart_discards_in_flight_video() {
    let inference = Arc::new(GatedInference::new(
        vec![
            vec![MediaRef("first.png".to_string())],
            vec![MediaRef("second.png".to_string())],
        ],
        true,
    ));
    let studio = Arc::new(StudioScreen::new(inference.clone()));

    studio.generate("first prompt").await.unwrap();
    let animate = {
        let studio = studio.clone();
        tokio::spawn(async move { studio.animate().await })
    };
    // Let the conversion reach its suspension point before restarting.
    tokio::task::yield_now().await;

    studio.generate("second prompt").await.unwrap();

    // Release the stale conversion; its result must be discarded.
    inference.video_gate.notify_one();
    animate.await.unwrap().unwrap();

    assert_eq!(
        studio.view().await,
        GenerationView::ImageReady {
            image_url: "second.png".to_string(),
            video_url: None,
            video_error: None,
            video_generating: false,
        }
    );
}

#[tokio::test]
async fn empty_prompt_never_reaches_the_collaborator() {
    let inference = Arc::new(GatedInference::new(Vec::new(), false));
    let studio = StudioScreen::new(inference.clone());

    let err = studio.generate("   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(inference.image_calls.load(Ordering::SeqCst), 0);
    assert_eq!(studio.view().await, GenerationView::Idle);
}

#[tokio::test]
async fn zero_image_outputs_fail_the_job() {
    let inference = Arc::new(GatedInference::new(vec![Vec::new()], false));
    let studio = StudioScreen::new(inference);

    studio.generate("a prompt").await.unwrap();
    match studio.view().await {
        GenerationView::Failed { reason } => assert!(reason.contains("no output produced")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_failed_reload_keeps_displayed_posts() {
    let content = Arc::new(MockContent {
        posts: Mutex::new(vec![
            ContentPost {
                id: PostId("a".to_string()),
                author: "ada".to_string(),
                body: "one".to_string(),
                image_url: None,
                upvotes: 0,
                created_at: Utc.timestamp_opt(10, 0).unwrap(),
            },
            ContentPost {
                id: PostId("b".to_string()),
                author: "ada".to_string(),
                body: "two".to_string(),
                image_url: None,
                upvotes: 0,
                created_at: Utc.timestamp_opt(20, 0).unwrap(),
            },
            ContentPost {
                id: PostId("c".to_string()),
                author: "ada".to_string(),
                body: "three".to_string(),
                image_url: None,
                upvotes: 0,
                created_at: Utc.timestamp_opt(30, 0).unwrap(),
            },
        ]),
        fail_list: Mutex::new(false),
    });
    let screen = SocialScreen::new(content.clone());

    screen.load().await;
    assert_eq!(screen.posts().await.len(), 3);

    *content.fail_list.lock().unwrap() = true;
    screen.load().await;

    assert_eq!(screen.posts().await.len(), 3, "posts remain displayed");
    let state = screen.feed_state().await;
    assert!(state.error.as_ref().unwrap().is_network());
    assert!(!state.loading);
}

#[tokio::test]
async fn publish_flows_through_optimistic_insert() {
    let content = Arc::new(MockContent {
        posts: Mutex::new(Vec::new()),
        fail_list: Mutex::new(false),
    });
    let screen = SocialScreen::new(content);
    let session = session_with_wallet("0xabc");

    let draft = PostDraft::text("hello world").unwrap();
    let post = screen.publish(&session, draft).await.unwrap();
    assert_eq!(post.id.as_str(), "p-new");
    assert_eq!(post.author, "Ada");

    let entries = screen.posts().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].pending.is_none());
}

#[tokio::test]
async fn payment_retry_reuses_the_idempotency_key() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(vec![
        Err(CrocialError::network("timeout")),
        Ok(MockPayments::confirmed()),
    ]));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth, payments.clone(), messaging);
    screen.initialize().await.unwrap();

    screen
        .submit_payment("25.50", CurrencyCode::USD, "0xd00d")
        .await
        .unwrap();
    assert!(screen.payment().await.error.unwrap().is_network());

    screen.retry_payment().await.unwrap();
    let snapshot = screen.payment().await;
    assert_eq!(snapshot.result.unwrap().status, PaymentStatus::Confirmed);

    let keys = payments.keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1], "retry reused the key");

    // Confirmed payment is terminal; nothing left to retry.
    assert!(screen.retry_payment().await.unwrap_err().is_validation());
}

#[tokio::test]
async fn new_submission_after_confirmation_mints_a_new_key() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth, payments.clone(), messaging);
    screen.initialize().await.unwrap();

    screen
        .submit_payment("10", CurrencyCode::USD, "0xd00d")
        .await
        .unwrap();
    screen
        .submit_payment("10", CurrencyCode::USD, "0xd00d")
        .await
        .unwrap();

    let keys = payments.keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert_ne!(keys[0], keys[1], "each logical submission has its own key");
}

#[tokio::test]
async fn payment_validation_failures_are_never_dispatched() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth, payments.clone(), messaging);
    screen.initialize().await.unwrap();

    let err = screen
        .submit_payment("not-a-number", CurrencyCode::USD, "0xd00d")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = screen
        .submit_payment("10", CurrencyCode::USD, "no-prefix")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(payments.keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_payment_while_one_is_in_flight_is_rejected() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(GatedPayments::new());
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = Arc::new(DashboardScreen::new(
        auth,
        Arc::new(MockWallet {
            wei: 1_500_000_000_000_000_000,
        }),
        Arc::new(MockStablecoins),
        payments.clone(),
        messaging,
    ));
    screen.initialize().await.unwrap();

    let first = {
        let screen = screen.clone();
        tokio::spawn(async move {
            screen
                .submit_payment("10", CurrencyCode::USD, "0xd00d")
                .await
        })
    };
    // Let the first submission reach the gateway before competing with it.
    tokio::task::yield_now().await;

    let err = screen
        .submit_payment("999", CurrencyCode::USD, "0xd00d")
        .await
        .unwrap_err();
    assert!(err.is_validation(), "re-entry is surfaced, not swallowed");

    payments.gate.notify_one();
    first.await.unwrap().unwrap();

    let dispatched = payments.amounts.lock().unwrap().clone();
    assert_eq!(dispatched, vec!["10"], "the competing amount never dispatched");
    let snapshot = screen.payment().await;
    assert_eq!(snapshot.result.unwrap().status, PaymentStatus::Confirmed);
}

#[tokio::test]
async fn wallet_refresh_assembles_parallel_balances() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth, payments, messaging);
    screen.initialize().await.unwrap();

    screen.refresh_wallet().await.unwrap();

    let snapshot = screen.balance().await.result.unwrap();
    assert_eq!(snapshot.address.as_str(), "0xabc");
    assert_eq!(snapshot.native_balance.format_eth(), "1.5");
    assert_eq!(snapshot.stablecoins[&CurrencyCode::USD], "120.5");
    assert_eq!(snapshot.stablecoins[&CurrencyCode::EUR], "0");
}

#[tokio::test]
async fn wallet_change_invalidates_the_balance_snapshot() {
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth.clone(), payments, messaging);
    screen.initialize().await.unwrap();
    screen.refresh_wallet().await.unwrap();
    assert!(screen.balance().await.result.is_some());

    *auth.session.lock().unwrap() = Some(session_with_wallet("0xdef"));
    screen.initialize().await.unwrap();

    assert!(
        screen.balance().await.result.is_none(),
        "stale snapshot dropped on wallet change"
    );
}

#[tokio::test]
async fn signed_out_dashboard_reports_auth_error() {
    let auth = Arc::new(MockAuth {
        session: Mutex::new(None),
        sign_out_calls: AtomicUsize::new(0),
        fail_sign_out: false,
    });
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth, payments, messaging);

    assert!(screen.initialize().await.unwrap_err().is_auth());
    assert!(screen.session().await.is_none());
}

#[tokio::test]
async fn sign_out_clears_state_even_when_remote_fails() {
    let auth = Arc::new(MockAuth {
        session: Mutex::new(Some(session_with_wallet("0xabc"))),
        sign_out_calls: AtomicUsize::new(0),
        fail_sign_out: true,
    });
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = dashboard(auth.clone(), payments, messaging);
    screen.initialize().await.unwrap();
    screen.refresh_wallet().await.unwrap();

    screen.sign_out("/").await;

    assert_eq!(auth.sign_out_calls.load(Ordering::SeqCst), 1);
    assert!(screen.session().await.is_none());
    assert!(screen.balance().await.result.is_none());
}

#[tokio::test]
async fn message_preview_shows_newest_across_conversations() {
    let conversations = vec![
        Conversation {
            peer: "0xaaa".to_string(),
            messages: (0..4)
                .map(|i| Message {
                    peer: "0xaaa".to_string(),
                    body: format!("a{i}"),
                    sent_at: Utc.timestamp_opt(100 + i, 0).unwrap(),
                    direction: Direction::Received,
                })
                .collect(),
        },
        Conversation {
            peer: "0xbbb".to_string(),
            messages: (0..4)
                .map(|i| Message {
                    peer: "0xbbb".to_string(),
                    body: format!("b{i}"),
                    sent_at: Utc.timestamp_opt(200 + i, 0).unwrap(),
                    direction: Direction::Received,
                })
                .collect(),
        },
    ];
    let auth = Arc::new(MockAuth::signed_in(session_with_wallet("0xabc")));
    let payments = Arc::new(MockPayments::new(Vec::new()));
    let messaging = Arc::new(MockMessaging::new(conversations));
    let screen = dashboard(auth, payments, messaging);

    screen.load_message_preview().await;

    let preview = screen.message_preview().await.result.unwrap();
    assert_eq!(preview.len(), 5);
    assert_eq!(preview[0].body, "b3", "newest first");
    assert!(preview.iter().all(|m| m.body.starts_with('b') || m.body == "a3"));
}

#[tokio::test]
async fn sending_a_message_appends_to_its_conversation() {
    let messaging = Arc::new(MockMessaging::new(vec![Conversation {
        peer: "0xpeer".to_string(),
        messages: vec![Message {
            peer: "0xpeer".to_string(),
            body: "hi".to_string(),
            sent_at: Utc.timestamp_opt(10, 0).unwrap(),
            direction: Direction::Received,
        }],
    }]));
    let screen = MessagesScreen::new(messaging.clone());
    screen.load().await;

    let sent = screen.send("0xpeer", "hello back").await.unwrap();
    assert_eq!(sent.direction, Direction::Sent);

    let conversations = screen.conversations().await.result.unwrap();
    assert_eq!(conversations.len(), 1);
    let bodies: Vec<_> = conversations[0]
        .messages
        .iter()
        .map(|m| m.body.as_str())
        .collect();
    assert_eq!(bodies, vec!["hi", "hello back"], "ascending order kept");
}

#[tokio::test]
async fn empty_message_body_is_never_dispatched() {
    let messaging = Arc::new(MockMessaging::new(Vec::new()));
    let screen = MessagesScreen::new(messaging.clone());

    let err = screen.send("0xpeer", "  ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(messaging.send_calls.load(Ordering::SeqCst), 0);
}
