use chrono::{DateTime, Utc};

use crate::gateway::GatewayError;
use crate::notice::Notice;
use crate::ticket::{RequestSlot, Ticket};

pub const GREETING: &str =
    "Hi there! I'm your robot friend! What would you like to talk about today?";

pub const CHAT_STARTERS: [&str; 9] = [
    "Tell me about dinosaurs!",
    "I like drawing!",
    "What's in space?",
    "What's a unicorn?",
    "How do butterflies grow?",
    "Tell me about the ocean!",
    "What's your favorite animal?",
    "Tell me a fun fact!",
    "Tell me a joke!",
];

/// How many starters are offered as buttons.
pub const VISIBLE_STARTERS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    text: String,
    from_user: bool,
    timestamp: DateTime<Utc>,
}

impl Message {
    fn new(text: String, from_user: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            text,
            from_user,
            timestamp,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn from_user(&self) -> bool {
        self.from_user
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Text handed to the gateway, with the ticket its reply must present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub ticket: Ticket,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A bot message was appended.
    Appended,
    Failed(Notice),
    /// The reply belonged to an earlier generation of the panel.
    Stale,
}

pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    reply: RequestSlot,
}

impl Conversation {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages: vec![Message::new(GREETING.to_string(), false, now)],
            input: String::new(),
            reply: RequestSlot::default(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Fills the input with a starter prompt without sending it.
    pub fn use_starter(&mut self, index: usize) -> bool {
        match CHAT_STARTERS.get(index) {
            Some(starter) => {
                self.input = (*starter).to_string();
                true
            }
            None => false,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.reply.is_pending()
    }

    /// Appends the current input as a user message and enters the waiting
    /// state. Blank input, or a reply still outstanding, sends nothing.
    pub fn send(&mut self, now: DateTime<Utc>) -> Option<ChatRequest> {
        if self.input.trim().is_empty() {
            return None;
        }
        let ticket = self.reply.begin()?;
        let text = std::mem::take(&mut self.input);
        log::debug!("sending chat message ({} chars)", text.len());
        self.messages.push(Message::new(text.clone(), true, now));
        Some(ChatRequest { ticket, text })
    }

    pub fn finish(
        &mut self,
        ticket: Ticket,
        result: Result<String, GatewayError>,
        now: DateTime<Utc>,
    ) -> ReplyOutcome {
        if !self.reply.finish(ticket) {
            log::debug!("dropping stale chat reply");
            return ReplyOutcome::Stale;
        }
        match result {
            Ok(text) => {
                self.messages.push(Message::new(text, false, now));
                ReplyOutcome::Appended
            }
            Err(error) => {
                log::error!("chat request failed: {error}");
                ReplyOutcome::Failed(Notice::chat_failed())
            }
        }
    }

    /// Back to a fresh greeting; any reply still in flight is forgotten.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.reply.invalidate();
        self.messages = vec![Message::new(GREETING.to_string(), false, now)];
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FailureCause;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn failure() -> GatewayError {
        GatewayError::RequestFailed(FailureCause::Transport("offline".to_string()))
    }

    #[test]
    fn opens_with_a_greeting() {
        let conversation = Conversation::new(at(0));
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].text(), GREETING);
        assert!(!conversation.messages()[0].from_user());
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn blank_input_sends_nothing() {
        let mut conversation = Conversation::new(at(0));
        assert_eq!(conversation.send(at(1)), None);
        conversation.set_input("   ");
        assert_eq!(conversation.send(at(1)), None);
        conversation.set_input("\n\t");
        assert_eq!(conversation.send(at(1)), None);
        assert_eq!(conversation.messages().len(), 1);
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn dinosaur_starter_round_trip() {
        let mut conversation = Conversation::new(at(0));
        assert!(conversation.use_starter(0));
        assert_eq!(conversation.input(), "Tell me about dinosaurs!");
        assert_eq!(conversation.messages().len(), 1);

        let request = conversation.send(at(5)).unwrap();
        assert_eq!(request.text, "Tell me about dinosaurs!");
        assert_eq!(conversation.input(), "");
        assert!(conversation.is_waiting());
        let sent = &conversation.messages()[1];
        assert_eq!(sent.text(), "Tell me about dinosaurs!");
        assert!(sent.from_user());
        assert_eq!(sent.timestamp(), at(5));

        let outcome = conversation.finish(
            request.ticket,
            Ok("Some dinosaurs had feathers!".to_string()),
            at(7),
        );
        assert_eq!(outcome, ReplyOutcome::Appended);
        assert!(!conversation.is_waiting());
        assert_eq!(conversation.messages().len(), 3);
        let reply = &conversation.messages()[2];
        assert!(!reply.from_user());
        assert_eq!(reply.timestamp(), at(7));
    }

    #[test]
    fn failure_appends_nothing_and_returns_to_ready() {
        let mut conversation = Conversation::new(at(0));
        assert!(conversation.use_starter(0));
        let request = conversation.send(at(1)).unwrap();
        let outcome = conversation.finish(request.ticket, Err(failure()), at(2));
        assert_eq!(outcome, ReplyOutcome::Failed(Notice::chat_failed()));
        assert!(!conversation.is_waiting());
        assert_eq!(conversation.messages().len(), 2);
        assert!(conversation.messages()[1].from_user());
    }

    #[test]
    fn waiting_blocks_a_second_send() {
        let mut conversation = Conversation::new(at(0));
        conversation.set_input("hello");
        let request = conversation.send(at(1)).unwrap();
        conversation.set_input("again");
        assert_eq!(conversation.send(at(2)), None);
        assert_eq!(conversation.input(), "again");
        conversation.finish(request.ticket, Ok("hi!".to_string()), at(3));
        assert!(conversation.send(at(4)).is_some());
    }

    #[test]
    fn reset_discards_a_late_reply() {
        let mut conversation = Conversation::new(at(0));
        conversation.set_input("hello");
        let request = conversation.send(at(1)).unwrap();
        conversation.reset(at(2));
        assert!(!conversation.is_waiting());
        assert_eq!(
            conversation.finish(request.ticket, Ok("late".to_string()), at(3)),
            ReplyOutcome::Stale
        );
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].text(), GREETING);
    }

    #[test]
    fn unknown_starter_is_ignored() {
        let mut conversation = Conversation::new(at(0));
        conversation.set_input("mine");
        assert!(!conversation.use_starter(CHAT_STARTERS.len()));
        assert_eq!(conversation.input(), "mine");
    }
}
