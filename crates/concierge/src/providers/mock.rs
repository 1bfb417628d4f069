use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// Message lists received by each completion, in call order
pub type Transcripts = Arc<Mutex<Vec<Vec<Message>>>>;

/// Orchestrator stand-in that replays a fixed script of assistant messages
pub struct MockProvider {
    script: Mutex<VecDeque<Message>>,
    transcripts: Transcripts,
    system_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new(script: Vec<Message>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            transcripts: Transcripts::default(),
            system_prompts: Arc::default(),
        }
    }

    pub fn transcripts(&self) -> Transcripts {
        Arc::clone(&self.transcripts)
    }

    /// System prompt received by each completion, in call order
    pub fn system_prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.system_prompts)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        _tools: &[Tool],
    ) -> Result<(Message, Usage)> {
        self.system_prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(system.to_string());
        self.transcripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| anyhow!("mock script exhausted"))?;
        Ok((next, Usage::new(Some(1), Some(1), None)))
    }
}
