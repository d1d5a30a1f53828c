mod queue;
mod topic;

pub use queue::{TopicEventQueue, DEFAULT_MAX_LOG_WARNING};
pub use topic::{Condition, Topic, TopicType, AGENT_INPUT_TOPIC, AGENT_OUTPUT_TOPIC};
