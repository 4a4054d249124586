//! Callback surface for streamed chat sessions.

/// Receives the events of one chat session.
///
/// A session calls `on_delta` zero or more times, then exactly one of
/// `on_done` or `on_error`. Nothing is called after that.
pub trait ChatHandler {
    /// A non-empty fragment of the assistant response, in arrival order.
    fn on_delta(&mut self, text: &str);

    /// The stream ended normally.
    fn on_done(&mut self);

    /// The session failed; `message` is suitable for display.
    fn on_error(&mut self, message: &str);
}

/// Closure-backed [`ChatHandler`].
///
/// ```rust,ignore
/// let mut reply = String::new();
/// let mut handler = Callbacks::new(
///     |text| reply.push_str(text),
///     || println!(),
///     |message| eprintln!("{message}"),
/// );
/// client.stream_chat(&request, &mut handler).await;
/// ```
pub struct Callbacks<D, F, E> {
    on_delta: D,
    on_done: F,
    on_error: E,
}

impl<D, F, E> Callbacks<D, F, E>
where
    D: FnMut(&str),
    F: FnMut(),
    E: FnMut(&str),
{
    pub fn new(on_delta: D, on_done: F, on_error: E) -> Self {
        Self {
            on_delta,
            on_done,
            on_error,
        }
    }
}

impl<D, F, E> ChatHandler for Callbacks<D, F, E>
where
    D: FnMut(&str),
    F: FnMut(),
    E: FnMut(&str),
{
    fn on_delta(&mut self, text: &str) {
        (self.on_delta)(text)
    }

    fn on_done(&mut self) {
        (self.on_done)()
    }

    fn on_error(&mut self, message: &str) {
        (self.on_error)(message)
    }
}

/// Terminal state of a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed(String),
}

/// Handler that keeps the accumulated response and the terminal event.
///
/// Used by [`crate::StreamingChatClient::complete`]; also handy for callers
/// that only want the final text.
#[derive(Debug, Default)]
pub struct Accumulator {
    pub text: String,
    pub deltas: usize,
    pub outcome: Option<SessionOutcome>,
}

impl ChatHandler for Accumulator {
    fn on_delta(&mut self, text: &str) {
        self.text.push_str(text);
        self.deltas += 1;
    }

    fn on_done(&mut self) {
        self.outcome = Some(SessionOutcome::Completed);
    }

    fn on_error(&mut self, message: &str) {
        self.outcome = Some(SessionOutcome::Failed(message.to_string()));
    }
}
