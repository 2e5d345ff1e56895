//! File-backed conversation store
//!
//! One JSON document per conversation under a root directory. Appends
//! rewrite the document through a temp file + rename so readers never see
//! a torn write; a store-level mutex serializes the read-modify-write.

use async_trait::async_trait;
use council_application::ports::conversation_store::{ConversationStore, StoreError};
use council_domain::{ChatMessage, Conversation, CouncilTurn};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// JSON-document-per-conversation store.
pub struct FileConversationStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConversationStore {
    /// Create the store, making the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        // Ids are minted as UUIDs; anything path-like is not ours.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn read(&self, id: &str) -> Result<Conversation, StoreError> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))
    }

    fn write(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let path = self.path_for(&conversation.id)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(conversation)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::write(&tmp, bytes).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn load(&self, id: &str) -> Result<Conversation, StoreError> {
        self.read(id)
    }

    async fn create(&self) -> Result<Conversation, StoreError> {
        let conversation = Conversation::new(Uuid::new_v4().to_string());
        let _guard = self.write_lock.lock().await;
        self.write(&conversation)?;
        Ok(conversation)
    }

    async fn append_turn(
        &self,
        id: &str,
        user: ChatMessage,
        turn: CouncilTurn,
        assistant: ChatMessage,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut conversation = self.read(id)?;
        conversation.record_turn(user, turn, assistant);
        self.write(&conversation)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<Conversation>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::Io(e.to_string()))?;

        let mut all = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path)
                .map_err(|e| StoreError::Io(e.to_string()))
                .and_then(|bytes| {
                    serde_json::from_slice::<Conversation>(&bytes)
                        .map_err(|e| StoreError::Corrupt(e.to_string()))
                }) {
                Ok(conversation) => all.push(conversation),
                // Skip unreadable documents instead of failing the listing.
                Err(error) => warn!(path = %path.display(), %error, "skipping conversation"),
            }
        }

        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
