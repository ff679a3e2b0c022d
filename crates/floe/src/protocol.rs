//! Output messages and the channel they are written to.
//!
//! Each message is one JSON object per line:
//!
//! ```text
//! {"type":"SCHEMA","stream":"t","schema":{...},"key_properties":["id"]}
//! {"type":"RECORD","stream":"t","record":{"id":1,"name":"a"}}
//! {"type":"STATE","value":{"bookmarks":{"t":{"modified_since":"2020-02-01T00:00:00+00:00"}}}}
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::error::{EmitError, SerializeSnafu, WriteSnafu};
use crate::schema::InferredSchema;
use crate::source::Row;
use crate::sync::SyncState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Schema {
        stream: String,
        schema: InferredSchema,
        key_properties: Vec<String>,
    },
    Record {
        stream: String,
        record: Row,
    },
    State {
        value: SyncState,
    },
}

impl Message {
    pub fn stream(&self) -> Option<&str> {
        match self {
            Message::Schema { stream, .. } | Message::Record { stream, .. } => {
                Some(stream.as_str())
            }
            Message::State { .. } => None,
        }
    }
}

/// Ordered, append-only sink for messages.
pub trait Emitter {
    fn emit(&mut self, message: Message) -> Result<(), EmitError>;
}

/// Writes each message as a JSON line and flushes it immediately.
pub struct JsonLinesEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, message: Message) -> Result<(), EmitError> {
        let mut line = serde_json::to_vec(&message).context(SerializeSnafu)?;
        line.push(b'\n');
        self.writer.write_all(&line).context(WriteSnafu)?;
        self.writer.flush().context(WriteSnafu)
    }
}

/// Collects messages in memory.
impl Emitter for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<(), EmitError> {
        self.push(message);
        Ok(())
    }
}
