use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chatlens_core::chat::{
    Alert, ChatArchive, ChatHistory, GenerativeService, ImagePicker, KeyValueStore, MAX_HISTORIES,
    Message, Notifier, PickedImage,
};
use chatlens_core::error::{ChatError, Result};
use chatlens_core::session::{BrowserTab, ChatSession, SendOutcome};
use chatlens_infrastructure::{FileImagePicker, JsonFileStore};
use tempfile::TempDir;

/// Replies with scripted texts in order.
struct ScriptedService(Mutex<VecDeque<String>>);

impl ScriptedService {
    fn new(replies: &[&str]) -> Self {
        Self(Mutex::new(replies.iter().map(|r| r.to_string()).collect()))
    }

    fn next(&self) -> Result<String> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::service("no scripted reply"))
    }
}

#[async_trait::async_trait]
impl GenerativeService for ScriptedService {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.next()
    }

    async fn complete_with_image(&self, _prompt: &str, _image: &str, _mime: &str) -> Result<String> {
        self.next()
    }
}

struct NoPicker;

#[async_trait::async_trait]
impl ImagePicker for NoPicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        Ok(None)
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<Alert>>);

impl Notifier for RecordingNotifier {
    fn alert(&self, alert: Alert) {
        self.0.lock().unwrap().push(alert);
    }
}

async fn open_session(
    store_dir: &std::path::Path,
    replies: &[&str],
    picker: Arc<dyn ImagePicker>,
) -> ChatSession {
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(store_dir));
    let archive = Arc::new(ChatArchive::open(store).await);
    ChatSession::new(
        archive,
        Arc::new(ScriptedService::new(replies)),
        picker,
        Arc::new(RecordingNotifier::default()),
    )
}

#[tokio::test]
async fn test_hello_conversation_is_persisted_and_reloaded() {
    let temp_dir = TempDir::new().unwrap();
    let store_dir = temp_dir.path().join("store");

    let session = open_session(&store_dir, &["Hi there"], Arc::new(NoPicker)).await;
    let outcome = session.send_text("Hello").await;
    assert!(matches!(outcome, SendOutcome::Replied(_)));

    let raw = std::fs::read_to_string(store_dir.join("chat_history.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored[0]["title"], "Hello...");
    assert_eq!(stored[0]["lastMessage"], "Hi there");
    assert_eq!(stored[0]["messages"][0]["isUser"], true);
    assert_eq!(stored[0]["messages"][1]["isUser"], false);

    // A fresh process sees the same archive.
    let reopened = open_session(&store_dir, &[], Arc::new(NoPicker)).await;
    let browser = reopened.browser().await;
    assert_eq!(browser.len(BrowserTab::Histories), 1);

    let history_id = browser.select(BrowserTab::Histories, 0).unwrap().to_string();
    reopened.restore_history(&history_id).await.unwrap();
    let messages = reopened.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "Hello");
    assert_eq!(messages[1].text, "Hi there");
}

#[tokio::test]
async fn test_favorites_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let store_dir = temp_dir.path().join("store");

    let session = open_session(&store_dir, &["Hi there"], Arc::new(NoPicker)).await;
    session.send_text("Hello").await;
    let reply_id = session.messages().await[1].id.clone();
    assert!(session.toggle_favorite(&reply_id).await);

    let reopened = open_session(&store_dir, &[], Arc::new(NoPicker)).await;
    let favorites = reopened.archive().favorites().await;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, reply_id);
    assert!(favorites[0].is_favorite);
}

#[tokio::test]
async fn test_history_is_capped_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(temp_dir.path()));
    let archive = ChatArchive::open(store.clone()).await;

    for i in 0..=MAX_HISTORIES {
        let messages = vec![
            Message::user(format!("u{i}"), format!("question {i}"), None, i as i64),
            Message::bot(format!("b{i}"), format!("answer {i}"), i as i64),
        ];
        let history = ChatHistory::snapshot(format!("h{i}"), &messages, i as i64).unwrap();
        archive.save_history(history).await.unwrap();
    }

    let reloaded = ChatArchive::open(store).await.histories().await;
    assert_eq!(reloaded.len(), MAX_HISTORIES);
    assert_eq!(reloaded[0].id, format!("h{MAX_HISTORIES}"));
    assert!(reloaded.iter().all(|history| history.id != "h0"));
}

#[tokio::test]
async fn test_new_chat_after_restore_leaves_archive_alone() {
    let temp_dir = TempDir::new().unwrap();
    let store_dir = temp_dir.path().join("store");

    let session = open_session(&store_dir, &["first reply", "second reply"], Arc::new(NoPicker)).await;
    session.send_text("first").await;
    session.start_new_chat().await;
    session.send_text("second").await;

    let histories = session.archive().histories().await;
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[0].last_message, "second reply");

    let older = histories[1].clone();
    session.restore_history(&older.id).await.unwrap();
    session.start_new_chat().await;

    assert!(session.messages().await.is_empty());
    let reopened = open_session(&store_dir, &[], Arc::new(NoPicker)).await;
    assert_eq!(reopened.archive().find_history(&older.id).await, Some(older));
}

#[tokio::test]
async fn test_image_file_is_analyzed_and_attached() {
    let temp_dir = TempDir::new().unwrap();
    let image_path = temp_dir.path().join("cat.png");
    std::fs::write(&image_path, b"not really a png").unwrap();

    let picker = Arc::new(FileImagePicker::new());
    let session = open_session(
        &temp_dir.path().join("store"),
        &["A cat sits on a mat.\nfeline animal indoor 90% confident", "It is a cat."],
        picker.clone(),
    )
    .await;

    picker.queue(&image_path).await;
    session.attach_image().await;

    let analysis = session.analysis_view().await.unwrap();
    assert_eq!(analysis.description, "A cat sits on a mat.");
    assert_eq!(analysis.confidence, 90);
    assert!(analysis.tags.contains(&"feline".to_string()));

    session.send_text("what is it?").await;
    let messages = session.messages().await;
    assert_eq!(messages.len(), 3);
    assert!(messages[1].is_user);
    assert!(
        messages[1]
            .image
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
}
