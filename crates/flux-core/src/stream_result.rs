//! Adapter unifying the three shapes a [`crate::tool::Tool`] (see the
//! `flux-tool` crate) can produce a response in: a single already-built
//! value, a future that resolves to one, or a stream of fragments. Every
//! node and engine call site consumes a `StreamResult` the same way,
//! regardless of which shape the underlying tool chose — mirrors
//! `AsyncResult` from the workflow runtime this design is adapted from.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

use crate::message::{Message, Messages};

type BoxMessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// A tool's response, in whichever shape it was produced.
pub enum StreamResult {
    /// Already fully materialized.
    Value(Messages),
    /// A sequence of fragments (normally all `is_streaming`, with the
    /// aggregation layer collapsing them back at the output boundary).
    Stream(BoxMessageStream),
}

impl StreamResult {
    pub fn value(messages: Messages) -> Self {
        StreamResult::Value(messages)
    }

    pub fn single(message: Message) -> Self {
        StreamResult::Value(vec![message])
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Message> + Send + 'static,
    {
        StreamResult::Stream(Box::pin(stream))
    }

    /// Drain to a single materialized batch, in arrival order. Used by
    /// the non-streaming `invoke` path, which doesn't care how the tool
    /// produced its output.
    pub async fn collect(self) -> Messages {
        match self {
            StreamResult::Value(v) => v,
            StreamResult::Stream(s) => s.collect().await,
        }
    }

    /// View as a stream regardless of shape — a `Value` becomes a
    /// one-shot stream of its messages. Used by `invoke_stream`, which
    /// wants to forward fragments as they land even if the tool itself
    /// produced everything at once.
    pub fn into_stream(self) -> BoxMessageStream {
        match self {
            StreamResult::Value(v) => Box::pin(stream::iter(v)),
            StreamResult::Stream(s) => s,
        }
    }
}

impl From<Messages> for StreamResult {
    fn from(value: Messages) -> Self {
        StreamResult::Value(value)
    }
}

impl From<Message> for StreamResult {
    fn from(value: Message) -> Self {
        StreamResult::single(value)
    }
}
