use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::invoker::ToolInvoker;
use crate::memory::ConversationMemory;
use crate::models::message::{ConversationMessage, Message};
use crate::models::role::Role;
use crate::models::tool::Tool;
use crate::prompt_template::render_system_prompt;
use crate::providers::base::{Provider, Usage};

pub const DEFAULT_INSTRUCTIONS: &str = "You are a friendly concierge for a directory of users and regions. \
You can also tell the current time, set alarms and look up the weather.";

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Reply used when the model keeps requesting tools past the round limit
pub const TOOL_ROUNDS_EXHAUSTED: &str =
    "<div>Sorry, I could not finish answering that question. Please try asking it differently.</div>";

/// One conversational front end: a fixed system prompt, the tool catalog and
/// shared per-conversation memory.
///
/// Memory only ever holds user questions and final answers; tool traffic of a
/// turn lives in the turn's own message list.
pub struct ChatSession {
    provider: Box<dyn Provider>,
    invoker: Arc<ToolInvoker>,
    memory: Arc<ConversationMemory>,
    system_prompt: String,
    tools: Vec<Tool>,
    max_tool_rounds: usize,
}

impl ChatSession {
    pub fn new(
        provider: Box<dyn Provider>,
        invoker: Arc<ToolInvoker>,
        memory: Arc<ConversationMemory>,
        instructions: &str,
    ) -> AgentResult<Self> {
        let tools = invoker.registry().catalog();
        let system_prompt = render_system_prompt(instructions, &tools)
            .map_err(|e| AgentError::Prompt(e.to_string()))?;

        Ok(Self {
            provider,
            invoker,
            memory,
            system_prompt,
            tools,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        })
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Answer one user utterance within a conversation.
    ///
    /// A new conversation starts with the system prompt as its first stored
    /// message, so it takes a slot in the memory window and is evicted with the
    /// oldest messages unless the memory retains system messages.
    ///
    /// Tool requests of one round run concurrently; their outputs are fed back
    /// in request order until the model answers without requesting tools.
    pub async fn respond(&self, user_text: &str, conversation_id: &str) -> AgentResult<String> {
        self.memory.append_if_empty(
            conversation_id,
            ConversationMessage::system(self.system_prompt.as_str()),
        );
        self.memory
            .append(conversation_id, ConversationMessage::user(user_text));

        let snapshot = self.memory.snapshot(conversation_id);
        let (instructions, history): (Vec<_>, Vec<_>) =
            snapshot.iter().partition(|m| m.role() == Role::System);
        let system = instructions
            .iter()
            .map(|m| m.content())
            .collect::<Vec<_>>()
            .join("\n");
        let mut messages: Vec<Message> = history.into_iter().map(Message::from).collect();

        let mut rounds = 0;
        let mut turn_usage = Usage::default();
        loop {
            let (response, usage) = self
                .provider
                .complete(&system, &messages, &self.tools)
                .await
                .map_err(|e| AgentError::Provider(e.to_string()))?;
            turn_usage += usage;

            let requests = response.tool_requests();
            if requests.is_empty() {
                let answer = response.text();
                self.memory
                    .append(conversation_id, ConversationMessage::assistant(answer.as_str()));
                info!(
                    conversation_id,
                    rounds,
                    total_tokens = turn_usage.total_tokens,
                    "chat turn completed"
                );
                return Ok(answer);
            }

            if rounds == self.max_tool_rounds {
                warn!(conversation_id, rounds, "tool round limit reached");
                self.memory
                    .append(conversation_id, ConversationMessage::assistant(TOOL_ROUNDS_EXHAUSTED));
                return Ok(TOOL_ROUNDS_EXHAUSTED.to_string());
            }
            rounds += 1;

            let calls = requests.iter().filter_map(|request| match &request.tool_call {
                Ok(call) => Some(async move { (request.id.clone(), self.invoker.invoke(call).await) }),
                Err(err) => {
                    warn!(conversation_id, id = %request.id, error = %err, "malformed tool request");
                    None
                }
            });
            let outputs = join_all(calls).await;

            let mut tool_responses = Message::user();
            for (id, output) in outputs {
                tool_responses = tool_responses.with_tool_response(id, output);
            }

            messages.push(response);
            if !tool_responses.content.is_empty() {
                messages.push(tool_responses);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::errors::ToolError;
    use crate::memory::MemoryConfig;
    use crate::models::message::MessageContent;
    use crate::models::tool::{ParamType, ToolArgs, ToolCall, ToolDefinition, ToolParameter};
    use crate::providers::mock::{MockProvider, Transcripts};
    use crate::registry::ToolRegistry;

    fn invoker() -> Arc<ToolInvoker> {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDefinition::new("getRegionById", "Region details", |args: ToolArgs| async move {
                    let id = args.int("regionId")?;
                    Ok::<_, ToolError>(format!("Region details:\n- ID: {}\n- Name: Seoul", id))
                })
                .with_param(ToolParameter::required("regionId", ParamType::Integer, "Region ID")),
            )
            .unwrap();
        registry
            .register(ToolDefinition::new("getSystemStatus", "Status", |_args: ToolArgs| async move {
                Ok::<_, ToolError>("System status:\n- Server state: OK".to_string())
            }))
            .unwrap();
        Arc::new(ToolInvoker::new(Arc::new(registry)))
    }

    fn session(responses: Vec<Message>) -> (ChatSession, Transcripts) {
        let provider = MockProvider::new(responses);
        let seen = provider.transcripts();
        let memory = Arc::new(ConversationMemory::default());
        let session =
            ChatSession::new(Box::new(provider), invoker(), memory, DEFAULT_INSTRUCTIONS).unwrap();
        (session, seen)
    }

    fn tool_request(id: &str, name: &str, arguments: serde_json::Value) -> Message {
        Message::assistant().with_tool_request(id, Ok(ToolCall::new(name, arguments)))
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let (session, _) = session(vec![]);
        assert!(session.system_prompt().starts_with(DEFAULT_INSTRUCTIONS));
        assert!(session.system_prompt().contains("- getRegionById: Region details"));
        assert!(session.system_prompt().contains("- getSystemStatus: Status"));
    }

    #[tokio::test]
    async fn test_plain_answer_is_remembered() {
        let (session, _) = session(vec![Message::assistant().with_text("<div>Hi!</div>")]);

        let answer = session.respond("Hello", "c1").await.unwrap();
        assert_eq!(answer, "<div>Hi!</div>");

        let remembered = session.memory().snapshot("c1");
        assert_eq!(remembered.len(), 3);
        assert_eq!(remembered[0].role(), Role::System);
        assert_eq!(remembered[0].content(), session.system_prompt());
        assert_eq!(remembered[1].role(), Role::User);
        assert_eq!(remembered[1].content(), "Hello");
        assert_eq!(remembered[2].role(), Role::Assistant);
        assert_eq!(remembered[2].content(), "<div>Hi!</div>");
    }

    #[tokio::test]
    async fn test_tool_results_are_fed_back_in_request_order() {
        let (session, seen) = session(vec![
            Message::assistant()
                .with_tool_request("a", Ok(ToolCall::new("getSystemStatus", json!({}))))
                .with_tool_request("b", Ok(ToolCall::new("getRegionById", json!({"regionId": "1"}))))
                .with_tool_request("c", Ok(ToolCall::new("launchRocket", json!({})))),
            Message::assistant().with_text("<div>All good</div>"),
        ]);

        let answer = session.respond("How is everything?", "c1").await.unwrap();
        assert_eq!(answer, "<div>All good</div>");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let feedback = seen[1].last().unwrap();
        assert_eq!(feedback.role, Role::User);
        assert_eq!(
            feedback.content,
            vec![
                MessageContent::tool_response("a", "System status:\n- Server state: OK"),
                MessageContent::tool_response("b", "Region details:\n- ID: 1\n- Name: Seoul"),
                MessageContent::tool_response("c", "Tool not found: launchRocket"),
            ]
        );

        // tool traffic stays out of memory
        assert_eq!(session.memory().len("c1"), 3);
    }

    #[tokio::test]
    async fn test_round_limit_yields_apology() {
        let (session, seen) = session(vec![
            tool_request("1", "getSystemStatus", json!({})),
            tool_request("2", "getSystemStatus", json!({})),
            tool_request("3", "getSystemStatus", json!({})),
        ]);
        let session = session.with_max_tool_rounds(2);

        let answer = session.respond("Loop forever", "c1").await.unwrap();
        assert_eq!(answer, TOOL_ROUNDS_EXHAUSTED);
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(session.memory().snapshot("c1")[2].content(), TOOL_ROUNDS_EXHAUSTED);
    }

    #[tokio::test]
    async fn test_malformed_requests_are_not_dispatched() {
        let (session, seen) = session(vec![
            Message::assistant().with_tool_request(
                "bad",
                Err(ToolError::invalid_argument("Could not interpret tool use parameters")),
            ),
            Message::assistant().with_text("<div>Retried</div>"),
        ]);

        let answer = session.respond("Hi", "c1").await.unwrap();
        assert_eq!(answer, "<div>Retried</div>");

        let seen = seen.lock().unwrap();
        assert!(seen[1].last().unwrap().tool_requests()[0].tool_call.is_err());
    }

    #[tokio::test]
    async fn test_instruction_counts_toward_the_window() {
        let answers = (0..3)
            .map(|i| Message::assistant().with_text(format!("a{}", i)))
            .collect();
        let provider = MockProvider::new(answers);
        let system_prompts = provider.system_prompts();
        let memory = Arc::new(ConversationMemory::new(MemoryConfig::new(4)));
        let session =
            ChatSession::new(Box::new(provider), invoker(), memory, DEFAULT_INSTRUCTIONS).unwrap();

        for i in 0..3 {
            session.respond(&format!("q{}", i), "c1").await.unwrap();
        }

        let system_prompts = system_prompts.lock().unwrap();
        // [system, q0] and [system, q0, a0, q1] fit, the third turn evicts it
        assert_eq!(system_prompts[0], session.system_prompt());
        assert_eq!(system_prompts[1], session.system_prompt());
        assert_eq!(system_prompts[2], "");
        assert!(session
            .memory()
            .snapshot("c1")
            .iter()
            .all(|m| m.role() != Role::System));
    }

    #[tokio::test]
    async fn test_retained_instruction_survives_the_window() {
        let answers = (0..3)
            .map(|i| Message::assistant().with_text(format!("a{}", i)))
            .collect();
        let provider = MockProvider::new(answers);
        let system_prompts = provider.system_prompts();
        let transcripts = provider.transcripts();
        let memory = Arc::new(ConversationMemory::new(
            MemoryConfig::new(4).with_retain_system(true),
        ));
        let session =
            ChatSession::new(Box::new(provider), invoker(), memory, DEFAULT_INSTRUCTIONS).unwrap();

        for i in 0..3 {
            session.respond(&format!("q{}", i), "c1").await.unwrap();
        }

        let system_prompts = system_prompts.lock().unwrap();
        assert!(system_prompts.iter().all(|p| p == session.system_prompt()));

        let transcripts = transcripts.lock().unwrap();
        let last_turn: Vec<String> = transcripts[2].iter().map(Message::text).collect();
        assert_eq!(last_turn, vec!["q1", "a1", "q2"]);
        assert_eq!(session.memory().snapshot("c1")[0].role(), Role::System);
    }

    #[tokio::test]
    async fn test_cleared_conversation_starts_with_instruction_again() {
        let provider = MockProvider::new(vec![
            Message::assistant().with_text("a0"),
            Message::assistant().with_text("a1"),
        ]);
        let system_prompts = provider.system_prompts();
        let memory = Arc::new(ConversationMemory::new(MemoryConfig::new(2)));
        let session =
            ChatSession::new(Box::new(provider), invoker(), memory, DEFAULT_INSTRUCTIONS).unwrap();

        session.respond("q0", "c1").await.unwrap();
        session.memory().clear("c1");
        session.respond("q1", "c1").await.unwrap();

        let system_prompts = system_prompts.lock().unwrap();
        assert_eq!(system_prompts[1], session.system_prompt());
    }

    #[tokio::test]
    async fn test_history_is_bounded_by_memory_window() {
        let answers = (0..8)
            .map(|i| Message::assistant().with_text(format!("a{}", i)))
            .collect();
        let provider = MockProvider::new(answers);
        let seen = provider.transcripts();
        let memory = Arc::new(ConversationMemory::new(MemoryConfig::new(4)));
        let session =
            ChatSession::new(Box::new(provider), invoker(), memory, DEFAULT_INSTRUCTIONS).unwrap();

        for i in 0..8 {
            session.respond(&format!("q{}", i), "c1").await.unwrap();
        }

        let seen = seen.lock().unwrap();
        let last_turn: Vec<String> = seen[7].iter().map(Message::text).collect();
        assert_eq!(last_turn, vec!["a5", "q6", "a6", "q7"]);
    }
}
