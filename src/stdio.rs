//! Line-delimited JSON front end.
//!
//! One request object per input line, one reply object per output line:
//!
//! ```text
//! > {"command": "read", "attribute": "range"}
//! < {"attribute":"range","label":"1 nanowatt or nanojoule","status":"ok","value":6}
//! > {"command": "write", "attribute": "waveCorrValue", "value": 532}
//! < {"attribute":"waveCorrValue","status":"ok"}
//! ```
//!
//! Errors come back as `{"status":"error","error":{"type":..,"message":..}}`
//! and never end the session.

use crate::controller::{Attribute, AttributeValue, DeviceController};
use crate::error::MeterError;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::debug;

const COMMANDS: [&str; 6] = ["read", "write", "list", "status", "help", "exit"];

/// What a request asks the loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Print this and keep going.
    Continue(Value),
    /// Print this and stop.
    Exit(Value),
}

/// Serve requests from `input` until EOF or an `exit` command.
pub fn run<R: BufRead, W: Write>(
    controller: &mut DeviceController,
    input: R,
    mut output: W,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (reply, done) = match handle_line(controller, &line) {
            Reply::Continue(v) => (v, false),
            Reply::Exit(v) => (v, true),
        };
        writeln!(output, "{reply}")?;
        output.flush()?;

        if done {
            break;
        }
    }
    Ok(())
}

/// Parse and execute one request line.
pub fn handle_line(controller: &mut DeviceController, line: &str) -> Reply {
    match serde_json::from_str::<Value>(line) {
        Ok(request) => process_request(controller, &request),
        Err(e) => Reply::Continue(error_reply("DeserializationError", e.to_string())),
    }
}

/// Execute one decoded request.
pub fn process_request(controller: &mut DeviceController, request: &Value) -> Reply {
    let command = request["command"].as_str().unwrap_or("").to_lowercase();
    debug!(%command, "stdio request");

    let result = match command.as_str() {
        "read" => attribute_name(request).and_then(|name| read(controller, name)),
        "write" => attribute_name(request).and_then(|name| write(controller, name, request)),
        "list" => Ok(list()),
        "status" => Ok(status(controller)),
        "help" => Ok(json!({
            "status": "ok",
            "commands": COMMANDS,
            "attributes": Attribute::ALL.map(Attribute::name),
        })),
        "exit" => return Reply::Exit(json!({ "status": "ok", "message": "bye" })),
        other => {
            return Reply::Continue(error_reply(
                "InvalidPayload",
                format!("Unknown command: '{other}'"),
            ))
        }
    };

    Reply::Continue(result.unwrap_or_else(|e| error_reply(e.kind(), e.to_string())))
}

fn attribute_name(request: &Value) -> Result<&str, MeterError> {
    request["attribute"]
        .as_str()
        .ok_or_else(|| MeterError::Value("missing 'attribute' field".to_string()))
}

fn read(controller: &mut DeviceController, name: &str) -> Result<Value, MeterError> {
    let attr: Attribute = name.parse()?;
    let value = controller.read(attr)?;

    let mut reply = json!({
        "status": "ok",
        "attribute": attr.name(),
        "value": value,
    });
    if let AttributeValue::Range(level) = value {
        reply["label"] = json!(level.label());
    }
    Ok(reply)
}

fn write(controller: &mut DeviceController, name: &str, request: &Value) -> Result<Value, MeterError> {
    let attr: Attribute = name.parse()?;
    let value: AttributeValue = serde_json::from_value(request["value"].clone())
        .map_err(|e| MeterError::Value(format!("bad 'value' field: {e}")))?;
    controller.write(attr, value)?;
    Ok(json!({ "status": "ok", "attribute": attr.name() }))
}

fn list() -> Value {
    let attributes: Vec<_> = Attribute::ALL.iter().map(|attr| attr.info()).collect();
    json!({ "status": "ok", "attributes": attributes })
}

fn status(controller: &DeviceController) -> Value {
    json!({
        "status": "ok",
        "state": controller.state(),
        "firmware": controller.firmware(),
        "cache": controller.cache(),
    })
}

fn error_reply(kind: &str, message: String) -> Value {
    json!({
        "status": "error",
        "error": { "type": kind, "message": message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::transport::MockTransport;
    use std::io::Cursor;

    fn ready_controller() -> (DeviceController, MockTransport) {
        let link = MockTransport::new("MOCK0");
        link.push_response(b"Maestro\r\n");
        let mut controller = DeviceController::new(ConnectionConfig::default());
        controller.init_with(Box::new(link.clone())).unwrap();
        link.clear_sent();
        (controller, link)
    }

    fn reply_value(reply: Reply) -> Value {
        match reply {
            Reply::Continue(v) | Reply::Exit(v) => v,
        }
    }

    #[test]
    fn test_read_range_includes_label() {
        let (mut controller, link) = ready_controller();
        link.push_response(b"27\r\n");

        let reply = reply_value(handle_line(
            &mut controller,
            r#"{"command": "read", "attribute": "range"}"#,
        ));

        assert_eq!(reply["status"], "ok");
        assert_eq!(reply["value"], 27);
        assert_eq!(reply["label"], "30 watts or joules");
    }

    #[test]
    fn test_write_sends_command() {
        let (mut controller, link) = ready_controller();

        let reply = reply_value(handle_line(
            &mut controller,
            r#"{"command": "write", "attribute": "wave_corr_value", "value": 532}"#,
        ));

        assert_eq!(reply["status"], "ok");
        assert_eq!(reply["attribute"], "waveCorrValue");
        assert_eq!(link.sent_commands(), vec!["*PWC00532"]);
    }

    #[test]
    fn test_errors_are_typed() {
        let (mut controller, _link) = ready_controller();

        let reply = reply_value(handle_line(
            &mut controller,
            r#"{"command": "read", "attribute": "meterValue"}"#,
        ));
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["error"]["type"], "TimeoutError");

        let reply = reply_value(handle_line(
            &mut controller,
            r#"{"command": "write", "attribute": "range", "value": 42}"#,
        ));
        assert_eq!(reply["error"]["type"], "ValueError");

        let reply = reply_value(handle_line(&mut controller, "not json"));
        assert_eq!(reply["error"]["type"], "DeserializationError");

        let reply = reply_value(handle_line(&mut controller, r#"{"command": "dance"}"#));
        assert_eq!(reply["error"]["type"], "InvalidPayload");
    }

    #[test]
    fn test_run_stops_at_exit() {
        let (mut controller, _link) = ready_controller();
        let input = Cursor::new(
            "{\"command\": \"help\"}\n\n{\"command\": \"exit\"}\n{\"command\": \"status\"}\n",
        );
        let mut output = Vec::new();

        run(&mut controller, input, &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["commands"][0], "read");
        assert_eq!(lines[1]["message"], "bye");
    }

    #[test]
    fn test_status_reports_cache() {
        let (mut controller, _link) = ready_controller();
        let reply = reply_value(handle_line(&mut controller, r#"{"command": "status"}"#));
        assert_eq!(reply["state"], "Ready");
        assert_eq!(reply["firmware"], "Maestro");
        assert_eq!(reply["cache"]["range"], 6);
        assert_eq!(reply["cache"]["wave_corr_enabled"], false);
    }
}
