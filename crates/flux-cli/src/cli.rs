use clap::{Parser, Subcommand};

/// Runs example workflow assistants built on the event-driven workflow
/// core.
#[derive(Parser, Debug)]
#[command(name = "flux-cli", about = "Run flux example assistants")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one of the bundled demo assistants to completion on a single
    /// input message and print the aggregated output.
    Demo {
        /// Which demo to run: echo, streaming-echo, or fan-out-fan-in.
        name: DemoName,

        /// The input message content to send.
        #[arg(long, default_value = "hello")]
        input: String,

        /// Stream output fragments as they land instead of waiting for
        /// the aggregated result. Only meaningful for `streaming-echo`.
        #[arg(long)]
        stream: bool,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum DemoName {
    Echo,
    StreamingEcho,
    FanOutFanIn,
}
