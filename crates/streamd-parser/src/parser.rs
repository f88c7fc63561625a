use std::sync::Arc;

use tracing::{debug, warn};

use streamd_tree::Session;
use streamd_types::{ControlError, ControlResult};

/// Parse and execute one command against the session tree.
///
/// Returns the rendered output for verbs that produce one (`read`, some
/// `create` forms); `None` otherwise. Empty input is `BadCommand`, unknown
/// verbs and shorthands are `BadCommand`, missing required operands are
/// `BadValue`.
pub fn parse_cmd(session: &Arc<Session>, line: &str) -> ControlResult<Option<String>> {
    let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if line.is_empty() {
        return Err(ControlError::BadCommand("empty command".into()));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (verb, args) = tokens.split_first().expect("tokens are non-empty");

    match *verb {
        "create" | "read" | "update" | "delete" => execute(session, verb, args),
        shorthand => {
            let expanded = expand_shorthand(shorthand, args)?;
            debug!(command = shorthand, expanded = %expanded, "shorthand expanded");
            parse_cmd(session, &expanded)
        }
    }
}

fn execute(session: &Arc<Session>, verb: &str, args: &[&str]) -> ControlResult<Option<String>> {
    let path = args
        .first()
        .ok_or_else(|| ControlError::BadValue(format!("{verb} requires a path")))?;
    let node = session.resolve(path)?;

    let result = match verb {
        "read" => node.read().map(Some),
        "create" => {
            let name = args
                .get(1)
                .ok_or_else(|| ControlError::BadValue("create requires a name".into()))?;
            let description = args[2..].join(" ");
            node.create(name, &description)
        }
        "update" => {
            if args.len() < 2 {
                return Err(ControlError::BadValue("update requires a value".into()));
            }
            let value = args[1..].join(" ");
            node.update(&value)
        }
        "delete" => {
            let name = args
                .get(1)
                .ok_or_else(|| ControlError::BadValue("delete requires a name".into()))?;
            node.delete(name).map(|()| None)
        }
        _ => unreachable!("caller filtered the verb"),
    };

    if let Err(err) = &result {
        warn!(verb, path = %path, code = ?err.code(), "command failed");
    }
    result
}

/// Expand a `<domain>_<action>` shorthand into its URI form.
fn expand_shorthand(name: &str, args: &[&str]) -> ControlResult<String> {
    let arg = |index: usize| -> ControlResult<&str> {
        args.get(index).copied().ok_or_else(|| {
            ControlError::BadValue(format!("{name} requires at least {} arguments", index + 1))
        })
    };
    let rest = |index: usize| args[index.min(args.len())..].join(" ");

    let expanded = match name {
        "pipeline_create" => format!("create /pipelines {} {}", arg(0)?, rest(1)),
        "pipeline_delete" => format!("delete /pipelines {}", arg(0)?),
        "pipeline_play" => format!("update /pipelines/{}/state playing", arg(0)?),
        "pipeline_pause" => format!("update /pipelines/{}/state paused", arg(0)?),
        "pipeline_stop" => format!("update /pipelines/{}/state null", arg(0)?),
        "list_pipelines" => "read /pipelines".to_string(),
        "list_elements" => format!("read /pipelines/{}/elements", arg(0)?),
        "list_properties" => format!(
            "read /pipelines/{}/elements/{}/properties",
            arg(0)?,
            arg(1)?
        ),
        "list_signals" => format!("read /pipelines/{}/elements/{}/signals", arg(0)?, arg(1)?),
        "list_actions" => format!("read /pipelines/{}/elements/{}/actions", arg(0)?, arg(1)?),
        "element_get" => format!(
            "read /pipelines/{}/elements/{}/properties/{}",
            arg(0)?,
            arg(1)?,
            arg(2)?
        ),
        "element_set" => format!(
            "update /pipelines/{}/elements/{}/properties/{} {}",
            arg(0)?,
            arg(1)?,
            arg(2)?,
            rest(3)
        ),
        "bus_read" => format!("read /pipelines/{}/bus/message", arg(0)?),
        "bus_timeout" => format!("update /pipelines/{}/bus/timeout {}", arg(0)?, arg(1)?),
        "bus_filter" => format!("update /pipelines/{}/bus/types {}", arg(0)?, arg(1)?),
        "event_eos" => format!("create /pipelines/{}/event eos", arg(0)?),
        "event_seek" => format!("create /pipelines/{}/event seek {}", arg(0)?, rest(1)),
        "event_flush_start" => format!("create /pipelines/{}/event flush_start", arg(0)?),
        "event_flush_stop" => format!("create /pipelines/{}/event flush_stop", arg(0)?),
        "signal_connect" => format!(
            "read /pipelines/{}/elements/{}/signals/{}",
            arg(0)?,
            arg(1)?,
            arg(2)?
        ),
        "signal_timeout" => format!(
            "update /pipelines/{}/elements/{}/signals/{}/timeout {}",
            arg(0)?,
            arg(1)?,
            arg(2)?,
            arg(3)?
        ),
        "action_emit" => format!(
            "create /pipelines/{}/elements/{}/actions {} {}",
            arg(0)?,
            arg(1)?,
            arg(2)?,
            rest(3)
        ),
        "debug_enable" => format!("update /debug/enable {}", arg(0)?),
        "debug_color" => format!("update /debug/color {}", arg(0)?),
        "debug_threshold" => format!("update /debug/threshold {}", arg(0)?),
        "debug_reset" => format!("update /debug/reset {}", arg(0)?),
        other => {
            return Err(ControlError::BadCommand(format!(
                "unknown command: {other:?}"
            )))
        }
    };
    Ok(expanded)
}
