//! Interactive chat through a workflow.

use std::io::Write;

use anyhow::Result;
use chat_client::{Callbacks, ChatRequest, Message, SessionOutcome, StreamingChatClient};
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use server_core::domains::workflows::WorkflowGraph;
use uuid::Uuid;

use crate::api::ServerApi;
use crate::context::AppContext;
use crate::source::LoadedWorkflow;

/// Message history of one chat, plus the request settings taken from the
/// workflow graph.
pub struct Conversation {
    graph: WorkflowGraph,
    document_ids: Vec<String>,
    history: Vec<Message>,
}

impl Conversation {
    pub fn new(graph: WorkflowGraph, document_ids: &[Uuid]) -> Self {
        Self {
            graph,
            document_ids: document_ids.iter().map(Uuid::to_string).collect(),
            history: Vec::new(),
        }
    }

    /// Add a user turn and build the request carrying the whole history.
    pub fn ask(&mut self, question: &str) -> ChatRequest {
        self.history.push(Message::user(question));
        self.graph
            .chat_request(self.history.clone(), self.document_ids.clone())
    }

    /// Record the end of a turn. A failed turn is dropped so the question can
    /// be asked again.
    pub fn finish(&mut self, outcome: &SessionOutcome, reply: String) {
        match outcome {
            SessionOutcome::Completed => self.history.push(Message::assistant(reply)),
            SessionOutcome::Failed(_) => {
                self.history.pop();
            }
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

pub async fn run(
    ctx: &AppContext,
    api: &ServerApi,
    key: Option<String>,
    workflow: LoadedWorkflow,
    document_ids: Vec<Uuid>,
) -> Result<()> {
    let problems = workflow.graph.validate();
    if !problems.is_empty() {
        for problem in &problems {
            ctx.print_error(problem);
        }
        anyhow::bail!("workflow '{}' is not ready to chat", workflow.name);
    }

    let mut client = StreamingChatClient::new(api.chat_url());
    if let Some(key) = key {
        client = client.with_api_key(key);
    }

    ctx.print_header(&format!("Chatting with '{}'", workflow.name));
    if !document_ids.is_empty() {
        ctx.print_info(&format!("{} document(s) attached", document_ids.len()));
    }
    ctx.print_info("Empty line to quit.");

    let mut conversation = Conversation::new(workflow.graph, &document_ids);
    let theme = ColorfulTheme::default();

    loop {
        let question: String = Input::with_theme(&theme)
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;
        let question = question.trim();
        if question.is_empty() {
            break;
        }

        let request = conversation.ask(question);
        let mut reply = String::new();
        print!("{} ", style("AI:").cyan().bold());
        let _ = std::io::stdout().flush();

        let outcome = client
            .stream_chat(
                &request,
                &mut Callbacks::new(
                    |text| {
                        reply.push_str(text);
                        print!("{}", text);
                        let _ = std::io::stdout().flush();
                    },
                    || println!(),
                    |message| {
                        println!();
                        ctx.print_error(message);
                    },
                ),
            )
            .await;

        conversation.finish(&outcome, reply);
    }

    ctx.print_success(&format!(
        "Chat ended after {} message(s)",
        conversation.history().len()
    ));
    Ok(())
}
