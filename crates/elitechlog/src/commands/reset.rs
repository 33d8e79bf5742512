use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use elitechlog_core::{check_resettable, SessionHandle, SessionListener};
use elitechlog_logging::LogEvent;
use elitechlog_transport::Parameters;

use super::{now, run_session, AppContext, Listening, EXIT_OK};
use crate::interaction::{confirm, describe_device};

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Continue listening for another device on disconnect
    #[arg(short, long)]
    keep_listening: bool,

    /// Suppress confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

struct ResetListener {
    listening: Listening,
    yes: bool,
}

impl SessionListener for ResetListener {
    fn on_connected(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.connected(parameters);
        println!("{}", describe_device(parameters, now()));
        check_resettable(parameters)?;

        let action = "reset this device";
        if !confirm(self.yes, action, parameters.status.record_count)? {
            self.listening.declined(session, action);
            return Ok(());
        }
        session.quick_reset()?;
        Ok(())
    }

    fn on_updated(&mut self, session: &SessionHandle, parameters: &Parameters) -> Result<()> {
        self.listening.logger.log(&LogEvent::DeviceUpdated {
            device: parameters.identity_label().to_string(),
        });
        self.listening.finish(session);
        Ok(())
    }

    fn on_disconnected(&mut self, _session: &SessionHandle) -> Result<()> {
        self.listening.disconnected();
        Ok(())
    }
}

/// Delete all readings on the connected device.
pub fn run(ctx: &AppContext, args: ResetArgs) -> Result<i32> {
    let listener = ResetListener {
        listening: Listening {
            logger: Arc::clone(&ctx.logger),
            keep_listening: args.keep_listening,
        },
        yes: args.yes,
    };
    run_session(ctx, Box::new(listener))?;
    Ok(EXIT_OK)
}
