use std::str::FromStr;

use thiserror::Error;

use lib_sync::gateway::{UserId, VehicleId};

pub const HELP: &str = "\
Commands:
  vehicles         reload and list vehicles
  users            list users of the selected vehicle
  vehicle <id>     select a vehicle
  user <id>        select a user of the selected vehicle
  mileage <value>  set the mileage input
  target <value>   update the efficiency target of the selected pair
  average          refresh the average mileage of the selected pair
  publish          send the mileage input (5 requests, 1 s apart)
  show             print the current state
  help             print this help
  quit             leave the console";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Vehicles,
    Users,
    Vehicle(VehicleId),
    User(UserId),
    Mileage(f64),
    Target(f64),
    Average,
    Publish,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command {0:?}, type 'help' for a list")]
    Unknown(String),
    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{command}' takes no argument")]
    UnexpectedArgument { command: &'static str },
    #[error("{value:?} is not a number")]
    InvalidNumber { value: String },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "vehicles" => bare(rest, "vehicles", Command::Vehicles),
            "users" => bare(rest, "users", Command::Users),
            "average" => bare(rest, "average", Command::Average),
            "publish" => bare(rest, "publish", Command::Publish),
            "show" => bare(rest, "show", Command::Show),
            "help" | "?" => bare(rest, "help", Command::Help),
            "quit" | "exit" => bare(rest, "quit", Command::Quit),
            "vehicle" => required(rest, "vehicle", "a vehicle id").map(|id| Command::Vehicle(id.into())),
            "user" => required(rest, "user", "a user id").map(|id| Command::User(id.into())),
            "mileage" => number(rest, "mileage").map(Command::Mileage),
            "target" => number(rest, "target").map(Command::Target),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn bare(rest: &str, command: &'static str, parsed: Command) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(ParseError::UnexpectedArgument { command })
    }
}

fn required<'a>(rest: &'a str, command: &'static str, expected: &'static str) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn number(rest: &str, command: &'static str) -> Result<f64, ParseError> {
    let raw = required(rest, command, "a number")?;
    raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        value: raw.to_string(),
    })
}
