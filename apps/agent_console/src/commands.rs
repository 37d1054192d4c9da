use std::str::FromStr;

use anyhow::{anyhow, bail};
use client_core::Screen;
use shared::domain::TicketId;

pub const HELP: &str = "\
commands:
  accept            answer the ringing call
  decline           reject the ringing call
  finalize          hang up the active call
  ticket <id>       link a ticket to the active call
  goto <screen>     navigate: calls | tickets | dashboard | surveys
  ring              ring now instead of waiting
  status            show the current call
  help              show this help
  quit              leave the console";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Accept,
    Decline,
    Finalize,
    Ticket(TicketId),
    Goto(Screen),
    Ring,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("too many arguments for '{verb}'");
        }

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("accept" | "a", None) => Command::Accept,
            ("decline" | "d", None) => Command::Decline,
            ("finalize" | "hangup" | "f", None) => Command::Finalize,
            ("ticket", Some(id)) => Command::Ticket(TicketId(
                id.parse()
                    .map_err(|_| anyhow!("ticket id must be a number, got '{id}'"))?,
            )),
            ("goto", Some(screen)) => Command::Goto(screen.parse()?),
            ("ring", None) => Command::Ring,
            ("status" | "s", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit" | "q", None) => Command::Quit,
            (verb, _) => bail!("unknown command '{verb}'; type 'help'"),
        };
        Ok(command)
    }
}
