//! Stream one answer from the workflow chat endpoint.
//!
//! ```sh
//! WORKFLOW_CHAT_URL=http://localhost:8080/functions/v1/workflow-chat \
//!     cargo run -p chat-client --example basic
//! ```

use std::io::Write;

use chat_client::{Callbacks, ChatRequest, Message, SessionOutcome, StreamingChatClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = StreamingChatClient::from_env()?;

    let request = ChatRequest::new(vec![Message::user("What is Rust in one sentence?")])
        .system_prompt("You are a helpful assistant.");

    let outcome = client
        .stream_chat(
            &request,
            &mut Callbacks::new(
                |text| {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                },
                || println!(),
                |message| eprintln!("chat failed: {message}"),
            ),
        )
        .await;

    if let SessionOutcome::Failed(message) = outcome {
        return Err(message.into());
    }
    Ok(())
}
