//! Incremental terminal rendering of chat snapshots.
//!
//! Snapshots carry the whole transcript; the renderer remembers how much of
//! each message it already printed and emits only the new text.

use novachat_ai::{ChatSnapshot, Message, Sender};
use novachat_common::MessageId;

#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    generation: Option<u64>,
    /// Printed byte length per message, in transcript order.
    printed: Vec<(MessageId, usize)>,
    line_open: bool,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for `snapshot`, given everything rendered before it.
    ///
    /// User messages are not echoed; the terminal already shows what was typed.
    pub fn render(&mut self, snapshot: &ChatSnapshot, bot_name: &str) -> String {
        let mut out = String::new();

        if self.generation != Some(snapshot.generation) {
            if self.generation.is_some() {
                self.close_line(&mut out);
                out.push_str("\n--- nova conversa ---\n");
            }
            self.generation = Some(snapshot.generation);
            self.printed.clear();
        }

        for message in &snapshot.transcript {
            match self.printed.iter_mut().find(|(id, _)| id == &message.id) {
                Some((_, printed)) => {
                    if let Some(delta) = message.text.get(*printed..) {
                        out.push_str(delta);
                    }
                    *printed = message.text.len();
                }
                None => {
                    self.start_message(&mut out, message, bot_name);
                    self.printed.push((message.id.clone(), message.text.len()));
                }
            }
        }

        if !snapshot.is_loading {
            self.close_line(&mut out);
        }
        out
    }

    fn start_message(&mut self, out: &mut String, message: &Message, bot_name: &str) {
        self.close_line(out);
        match message.sender {
            Sender::User => {}
            Sender::Bot if message.is_error => {
                out.push_str(&format!("[!] {}", message.text));
                self.line_open = true;
            }
            Sender::Bot => {
                out.push_str(&format!("{bot_name}: {}", message.text));
                self.line_open = true;
            }
        }
    }

    fn close_line(&mut self, out: &mut String) {
        if self.line_open {
            out.push('\n');
            self.line_open = false;
        }
    }
}
