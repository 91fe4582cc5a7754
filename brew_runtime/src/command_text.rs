use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::{CommandPayload, ResourceToken, SleepDirective};

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid float '{value}' for {context}: {source}")]
    InvalidFloat {
        value: String,
        context: &'static str,
        source: ParseFloatError,
    },
    #[error("invalid sleep directive '{0}'")]
    InvalidSleepDirective(String),
    #[error("invalid refill resource '{0}'")]
    InvalidResource(String),
    #[error("negative tick delta {0}")]
    NegativeDelta(f32),
}

pub fn parse_command_line(input: &str) -> Result<CommandPayload, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let mut parts = trimmed.split_whitespace();
    let verb = parts
        .next()
        .map(|v| v.to_ascii_lowercase())
        .ok_or(CommandParseError::Empty)?;

    match verb.as_str() {
        "tick" => {
            let steps_str = parts.next().unwrap_or("1");
            let steps = parse_u32(steps_str, "tick steps")?;
            let delta = match parts.next() {
                Some(delta_str) => {
                    let delta = parse_f32(delta_str, "tick delta")?;
                    if delta < 0.0 {
                        return Err(CommandParseError::NegativeDelta(delta));
                    }
                    Some(delta)
                }
                None => None,
            };
            Ok(CommandPayload::Tick { steps, delta })
        }
        "drunk" => {
            let actor_bits = next_actor(&mut parts, "drunk actor")?;
            let level_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("level"))?;
            let level = parse_f32(level_str, "drunk level")?;
            Ok(CommandPayload::SetLevel { actor_bits, level })
        }
        "drink" => {
            let actor_bits = next_actor(&mut parts, "drink actor")?;
            let item_id = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("item"))?
                .to_string();
            Ok(CommandPayload::Drink {
                actor_bits,
                item_id,
            })
        }
        "sleep" => {
            let actor_bits = next_actor(&mut parts, "sleep actor")?;
            let directive = match parts.next().unwrap_or("slumber").to_ascii_lowercase().as_str() {
                "awake" | "wake" => SleepDirective::Awake,
                "slumber" | "deep" => SleepDirective::Slumber,
                other => return Err(CommandParseError::InvalidSleepDirective(other.to_string())),
            };
            Ok(CommandPayload::Sleep {
                actor_bits,
                directive,
            })
        }
        "ready" => Ok(CommandPayload::Ready {
            actor_bits: next_actor(&mut parts, "ready actor")?,
        }),
        "kill" => Ok(CommandPayload::Kill {
            actor_bits: next_actor(&mut parts, "kill actor")?,
        }),
        "status" => Ok(CommandPayload::Status {
            actor_bits: next_actor(&mut parts, "status actor")?,
        }),
        "refill" => {
            let actor_bits = next_actor(&mut parts, "refill actor")?;
            let slot_str = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("slot"))?;
            let slot = parse_u32(slot_str, "refill slot")?;
            let mut position = [0i32; 3];
            for (axis, context) in position.iter_mut().zip(["refill x", "refill y", "refill z"]) {
                let value = parts
                    .next()
                    .ok_or(CommandParseError::MissingArgument("position"))?;
                *axis = parse_i32(value, context)?;
            }
            let resource = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("block") => ResourceToken::Block,
                Some("fluid") => ResourceToken::Fluid,
                Some(other) => return Err(CommandParseError::InvalidResource(other.to_string())),
            };
            Ok(CommandPayload::Refill {
                actor_bits,
                slot,
                position,
                resource,
            })
        }
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn next_actor<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    context: &'static str,
) -> Result<u64, CommandParseError> {
    let actor_str = parts
        .next()
        .ok_or(CommandParseError::MissingArgument("actor"))?;
    parse_u64(actor_str, context)
}

fn parse_u32(value: &str, context: &'static str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32, CommandParseError> {
    value
        .parse::<i32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_u64(value: &str, context: &'static str) -> Result<u64, CommandParseError> {
    value
        .parse::<u64>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_f32(value: &str, context: &'static str) -> Result<f32, CommandParseError> {
    value
        .parse::<f32>()
        .map_err(|source| CommandParseError::InvalidFloat {
            value: value.to_string(),
            context,
            source,
        })
}
