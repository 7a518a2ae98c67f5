use super::browser::ArchiveBrowser;
use super::state::{AttachOutcome, Draft, InFlight, SendOutcome, SessionStatus};
use crate::chat::{
    Alert, ChatArchive, ChatHistory, GenerativeService, ImageAnalysis, ImagePicker, Message,
    MessageIdGenerator, Notifier, PickedImage, analyze, image_data_uri,
};
use crate::config::DEFAULT_ANALYSIS_PROMPT;
use crate::error::{ChatError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Identity of the conversation currently in the live list.
///
/// `epoch` changes whenever the live list is replaced wholesale, so replies
/// that resolve afterwards can tell they belong to a discarded conversation.
#[derive(Debug, Default)]
struct Conversation {
    /// History id, assigned when the conversation is first snapshotted.
    history_id: Option<String>,
    epoch: u64,
}

impl Conversation {
    fn replace(&mut self, history_id: Option<String>) {
        self.history_id = history_id;
        self.epoch += 1;
    }
}

#[derive(Debug, Default)]
struct SessionData {
    messages: Vec<Message>,
    draft: Draft,
    conversation: Conversation,
    analysis_view: Option<ImageAnalysis>,
}

/// The conversation session state machine.
///
/// `ChatSession` is responsible for:
/// - Owning the live message list of the active conversation
/// - Sending text and images to the generative service
/// - Snapshotting the conversation into the archive after each reply
/// - Keeping the favorites collection in sync with the live list
/// - Starting new conversations and restoring archived ones
///
/// Every operation takes `&self`; the live state sits behind a lock that is
/// never held across a service or store call, so readers observe the
/// optimistic user message while its reply is pending.
pub struct ChatSession {
    archive: Arc<ChatArchive>,
    service: Arc<dyn GenerativeService>,
    picker: Arc<dyn ImagePicker>,
    notifier: Arc<dyn Notifier>,
    analysis_prompt: String,
    ids: MessageIdGenerator,
    in_flight: InFlight,
    state: RwLock<SessionData>,
}

impl ChatSession {
    /// Creates an empty session over the given collaborators.
    pub fn new(
        archive: Arc<ChatArchive>,
        service: Arc<dyn GenerativeService>,
        picker: Arc<dyn ImagePicker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            archive,
            service,
            picker,
            notifier,
            analysis_prompt: DEFAULT_ANALYSIS_PROMPT.to_string(),
            ids: MessageIdGenerator::new(),
            in_flight: InFlight::default(),
            state: RwLock::new(SessionData::default()),
        }
    }

    /// Overrides the prompt sent with every picked image.
    pub fn with_analysis_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.analysis_prompt = prompt.into();
        self
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// Returns a copy of the live message list, in insertion order.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.clone()
    }

    pub async fn draft(&self) -> Draft {
        self.state.read().await.draft.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.in_flight.status()
    }

    /// Returns the analysis currently shown in the viewer.
    pub async fn analysis_view(&self) -> Option<ImageAnalysis> {
        self.state.read().await.analysis_view.clone()
    }

    /// Returns the history id the live conversation is saved under, if any.
    pub async fn history_id(&self) -> Option<String> {
        self.state.read().await.conversation.history_id.clone()
    }

    pub fn archive(&self) -> &Arc<ChatArchive> {
        &self.archive
    }

    /// Projects the archived collections for browsing.
    pub async fn browser(&self) -> ArchiveBrowser {
        ArchiveBrowser::new(self.archive.histories().await, self.archive.favorites().await)
    }

    // ============================================================================
    // Draft editing
    // ============================================================================

    /// Replaces the pending input text.
    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.write().await.draft.text = text.into();
    }

    /// Drops the attached image preview.
    pub async fn clear_attachment(&self) {
        self.state.write().await.draft.image = None;
    }

    // ============================================================================
    // Sending
    // ============================================================================

    /// Sends the current draft.
    pub async fn send(&self) -> SendOutcome {
        self.send_draft(None).await
    }

    /// Replaces the draft text with `input` and sends it.
    pub async fn send_text(&self, input: impl Into<String>) -> SendOutcome {
        self.send_draft(Some(input.into())).await
    }

    async fn send_draft(&self, input: Option<String>) -> SendOutcome {
        let Some(_sending) = self.in_flight.try_begin() else {
            tracing::debug!("Send rejected, a request is already in flight");
            return SendOutcome::Busy;
        };

        // Optimistic append: the user turn is committed before the call.
        let (prompt, epoch) = {
            let mut state = self.state.write().await;
            if let Some(input) = input {
                state.draft.text = input;
            }
            if !state.draft.is_sendable() {
                return SendOutcome::Ignored;
            }

            let draft = std::mem::take(&mut state.draft);
            let (id, timestamp) = self.next_message_id();
            state
                .messages
                .push(Message::user(id, draft.text.clone(), draft.image, timestamp));
            (draft.text, state.conversation.epoch)
        };
        tracing::debug!(epoch, "Sending text prompt");

        let text = match self.service.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Text completion failed");
                self.notifier.alert(Alert::SendFailed);
                return SendOutcome::Failed(e);
            }
        };

        let (reply, snapshot) = {
            let mut state = self.state.write().await;
            if state.conversation.epoch != epoch {
                tracing::warn!("Dropping reply for a conversation that was replaced");
                return SendOutcome::Discarded;
            }

            let (id, timestamp) = self.next_message_id();
            let reply = Message::bot(id, text, timestamp);
            state.messages.push(reply.clone());

            let history_id = state
                .conversation
                .history_id
                .get_or_insert_with(|| timestamp.to_string())
                .clone();
            let snapshot = ChatHistory::snapshot(history_id, &state.messages, timestamp);
            (reply, snapshot)
        };

        if let Some(snapshot) = snapshot {
            if let Err(e) = self.archive.save_history(snapshot).await {
                // The live list keeps the reply; the store lags behind.
                tracing::warn!(error = %e, "Chat history was not persisted");
            }
        }

        SendOutcome::Replied(reply)
    }

    /// Picks an image and appends its analysis as a reply.
    ///
    /// The picked image stays attached to the draft on success, so it rides
    /// along with the next user message.
    pub async fn attach_image(&self) -> AttachOutcome {
        if self.status() == SessionStatus::Sending {
            return AttachOutcome::Busy;
        }

        let picked = match self.picker.pick_image().await {
            Ok(Some(picked)) if !picked.base64.is_empty() => picked,
            Ok(_) => return AttachOutcome::Cancelled,
            Err(e) => {
                tracing::warn!(error = %e, "Image picker failed");
                return AttachOutcome::PickFailed(e);
            }
        };

        let Some(_sending) = self.in_flight.try_begin() else {
            return AttachOutcome::Busy;
        };

        let PickedImage { base64, mime_type } = picked;
        let image = image_data_uri(&mime_type, &base64);
        let epoch = {
            let mut state = self.state.write().await;
            state.draft.image = Some(image.clone());
            state.conversation.epoch
        };
        tracing::debug!(epoch, mime_type = %mime_type, "Analyzing image");

        let result = self
            .service
            .complete_with_image(&self.analysis_prompt, &base64, &mime_type)
            .await;

        let mut state = self.state.write().await;
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                // Failures are reported even if the conversation moved on.
                tracing::error!(error = %e, "Image analysis failed");
                if state.draft.image.as_deref() == Some(image.as_str()) {
                    state.draft.image = None;
                }
                drop(state);
                self.notifier.alert(Alert::ImageAnalysisFailed);
                return AttachOutcome::Failed(e);
            }
        };

        if state.conversation.epoch != epoch {
            tracing::warn!("Dropping image analysis for a conversation that was replaced");
            return AttachOutcome::Discarded;
        }

        let analysis = analyze(&text);
        let (id, timestamp) = self.next_message_id();
        let reply = Message::bot(id, text, timestamp).with_analysis(image, analysis.clone());
        state.messages.push(reply.clone());
        state.analysis_view = Some(analysis);
        AttachOutcome::Analyzed(reply)
    }

    // ============================================================================
    // Favorites and analysis viewer
    // ============================================================================

    /// Flips the favorite flag of a reply and rewrites the favorites collection.
    ///
    /// The collection is re-derived from the whole live list. Unknown ids and
    /// user messages are left alone.
    ///
    /// # Returns
    ///
    /// `true` if a message was toggled.
    pub async fn toggle_favorite(&self, message_id: &str) -> bool {
        let favorites: Vec<Message> = {
            let mut state = self.state.write().await;
            let Some(message) = state
                .messages
                .iter_mut()
                .find(|message| message.id == message_id && !message.is_user)
            else {
                return false;
            };
            message.is_favorite = !message.is_favorite;

            state
                .messages
                .iter()
                .filter(|message| message.is_favorite)
                .cloned()
                .collect()
        };

        if let Err(e) = self.archive.save_favorites(favorites).await {
            tracing::warn!(error = %e, message_id, "Favorites were not persisted");
        }
        true
    }

    /// Opens the viewer on the analysis carried by `message_id`.
    pub async fn show_analysis(&self, message_id: &str) -> bool {
        let mut state = self.state.write().await;
        let analysis = state
            .messages
            .iter()
            .find(|message| message.id == message_id)
            .and_then(|message| message.image_analysis.clone());

        match analysis {
            Some(analysis) => {
                state.analysis_view = Some(analysis);
                true
            }
            None => false,
        }
    }

    pub async fn close_analysis_view(&self) {
        self.state.write().await.analysis_view = None;
    }

    // ============================================================================
    // Conversation lifecycle
    // ============================================================================

    /// Discards the live conversation, draft and attachment.
    ///
    /// Persisted histories and favorites are untouched.
    pub async fn start_new_chat(&self) {
        let mut state = self.state.write().await;
        state.messages.clear();
        state.draft = Draft::default();
        state.analysis_view = None;
        state.conversation.replace(None);
        tracing::debug!(epoch = state.conversation.epoch, "Started new chat");
    }

    /// Replaces the live list with a copy of an archived conversation.
    ///
    /// Later replies in the restored conversation supersede its archive entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no archived history has this id.
    pub async fn restore_history(&self, history_id: &str) -> Result<()> {
        let history = self
            .archive
            .find_history(history_id)
            .await
            .ok_or_else(|| ChatError::not_found("chat history", history_id))?;

        let mut state = self.state.write().await;
        state.messages = history.messages;
        state.analysis_view = None;
        state.conversation.replace(Some(history.id));
        tracing::debug!(history_id, "Restored chat history");
        Ok(())
    }

    fn next_message_id(&self) -> (String, i64) {
        let now = chrono::Utc::now().timestamp_millis();
        let id = self.ids.next_id(now);
        // Keep the timestamp consistent with a bumped id.
        let timestamp = id.parse().unwrap_or(now);
        (id, timestamp)
    }
}
