use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::models::message::ConversationMessage;
use crate::models::role::Role;

pub const DEFAULT_MAX_MESSAGES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Upper bound on retained messages per conversation, at least 1
    pub max_messages: usize,
    /// Keep stored system messages while non-system messages remain to evict
    pub retain_system: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            retain_system: false,
        }
    }
}

impl MemoryConfig {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            ..Self::default()
        }
    }

    pub fn with_retain_system(mut self, retain_system: bool) -> Self {
        self.retain_system = retain_system;
        self
    }
}

#[derive(Debug, Default)]
struct Window {
    messages: VecDeque<ConversationMessage>,
    next_sequence: u64,
}

impl Window {
    fn push(&mut self, message: ConversationMessage, config: &MemoryConfig) -> ConversationMessage {
        let message = message.with_sequence(self.next_sequence);
        self.next_sequence += 1;
        self.messages.push_back(message.clone());

        while self.messages.len() > config.max_messages {
            self.evict_oldest(config.retain_system);
        }
        message
    }

    fn evict_oldest(&mut self, retain_system: bool) {
        let victim = if retain_system {
            self.messages
                .iter()
                .position(|m| m.role() != Role::System)
                .unwrap_or(0)
        } else {
            0
        };
        self.messages.remove(victim);
    }
}

/// Sliding-window message history, one window per conversation id.
///
/// Each conversation has its own lock, so appends to different ids never
/// contend; the outer map is only locked to find or create a window.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    config: MemoryConfig,
    conversations: RwLock<HashMap<String, Arc<Mutex<Window>>>>,
}

impl ConversationMemory {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Append a message, evicting the oldest ones past the window size.
    /// Returns the stored message with its sequence index.
    pub fn append(&self, conversation_id: &str, message: ConversationMessage) -> ConversationMessage {
        let window = self.window(conversation_id);
        let mut window = lock(&window);
        window.push(message, &self.config)
    }

    /// Append `message` only when the conversation holds nothing yet.
    /// Returns whether it was stored.
    pub fn append_if_empty(&self, conversation_id: &str, message: ConversationMessage) -> bool {
        let window = self.window(conversation_id);
        let mut window = lock(&window);
        if !window.messages.is_empty() {
            return false;
        }
        window.push(message, &self.config);
        true
    }

    /// Copy of the retained messages, oldest first
    pub fn snapshot(&self, conversation_id: &str) -> Vec<ConversationMessage> {
        match self.existing(conversation_id) {
            Some(window) => lock(&window).messages.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Drop every retained message of the conversation
    pub fn clear(&self, conversation_id: &str) {
        if let Some(window) = self.existing(conversation_id) {
            lock(&window).messages.clear();
        }
    }

    pub fn len(&self, conversation_id: &str) -> usize {
        self.existing(conversation_id)
            .map(|window| lock(&window).messages.len())
            .unwrap_or(0)
    }

    pub fn conversation_ids(&self) -> Vec<String> {
        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        conversations.keys().cloned().collect()
    }

    fn existing(&self, conversation_id: &str) -> Option<Arc<Mutex<Window>>> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(conversation_id)
            .cloned()
    }

    fn window(&self, conversation_id: &str) -> Arc<Mutex<Window>> {
        if let Some(window) = self.existing(conversation_id) {
            return window;
        }
        let mut conversations = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        conversations
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}

// A window holds no invariant that a panicking writer could break mid-way
fn lock(window: &Mutex<Window>) -> MutexGuard<'_, Window> {
    window.lock().unwrap_or_else(PoisonError::into_inner)
}
