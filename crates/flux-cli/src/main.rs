mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use flux_core::{InvokeContext, Message, Role, WorkflowEngine};
use flux_demos::{echo_assistant, fan_out_fan_in_assistant};
use futures::StreamExt;
use tracing::info;

use crate::cli::{CliArgs, Command, DemoName};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let flow_config = config::load();
    flow_config.log_summary();

    let args = CliArgs::parse();
    match args.command {
        Command::Demo { name, input, stream } => run_demo(name, &input, stream).await,
    }
}

async fn run_demo(name: DemoName, input: &str, stream: bool) -> Result<()> {
    let engine = build_demo_engine(name)?;
    let ctx = InvokeContext::new("cli-conversation", "cli-user");
    let request = vec![Message::new(Role::User, input)];

    if stream {
        run_streaming(&engine, ctx, request).await
    } else {
        let output = engine.invoke(ctx, request).await?;
        for message in output {
            println!("{}: {}", role_label(message.role), message.content.unwrap_or_default());
        }
        Ok(())
    }
}

async fn run_streaming(
    engine: &WorkflowEngine,
    ctx: InvokeContext,
    request: Vec<Message>,
) -> Result<()> {
    let mut stream = Box::pin(engine.invoke_stream(ctx, request));
    while let Some(event) = stream.next().await {
        let event = event?;
        for message in event.data() {
            print!("{}", message.content.as_deref().unwrap_or_default());
        }
    }
    println!();
    Ok(())
}

fn build_demo_engine(name: DemoName) -> Result<WorkflowEngine> {
    info!(demo = ?name, "building demo workflow");
    let engine = match name {
        DemoName::Echo => echo_assistant::build()?,
        DemoName::StreamingEcho => echo_assistant::build_streaming()?,
        DemoName::FanOutFanIn => fan_out_fan_in_assistant::build()?,
    };
    Ok(engine)
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::System => "system",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}
