use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use elitechlog_core::{SessionHandle, SessionListener};
use elitechlog_transport::Parameters;

use super::{run_session, AppContext, Listening, EXIT_OK};
use crate::interaction::{device_document, InfoFormat};

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Continue listening for another device on disconnect
    #[arg(short, long)]
    keep_listening: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: InfoFormat,
}

struct InfoListener {
    listening: Listening,
    format: InfoFormat,
}

impl SessionListener for InfoListener {
    fn on_connected(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.connected(parameters);
        println!("{}", device_document(parameters, self.format)?);
        self.listening.finish(session);
        Ok(())
    }

    fn on_disconnected(&mut self, _session: &SessionHandle) -> Result<()> {
        self.listening.disconnected();
        Ok(())
    }
}

/// Print the status of the connected device.
pub fn run(ctx: &AppContext, args: InfoArgs) -> Result<i32> {
    let listener = InfoListener {
        listening: Listening {
            logger: Arc::clone(&ctx.logger),
            keep_listening: args.keep_listening,
        },
        format: args.format,
    };
    run_session(ctx, Box::new(listener))?;
    Ok(EXIT_OK)
}
