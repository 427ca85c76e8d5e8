// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn control_requests_decode_by_tag() {
    let ping: Request = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
    assert_eq!(ping, Request::Ping);

    let hello: Request =
        serde_json::from_str(r#"{"type": "hello", "version": "0.1.0"}"#).unwrap();
    assert_eq!(
        hello,
        Request::Hello {
            version: "0.1.0".into()
        }
    );
}

#[test]
fn engine_commands_fall_through_to_command() {
    let request: Request =
        serde_json::from_str(r#"{"type": "runTask", "label": "build"}"#).unwrap();
    assert_eq!(
        request,
        Request::Command(Command::RunTask {
            label: "build".into()
        })
    );
}

#[test]
fn unknown_types_decode_to_unknown_command() {
    let request: Request = serde_json::from_str(r#"{"type": "fancyNewThing"}"#).unwrap();
    assert_eq!(request, Request::Command(Command::Unknown));
}

#[test]
fn responses_serialize_with_type_tags() {
    assert_eq!(
        serde_json::to_string(&Response::Pong).unwrap(),
        r#"{"type":"pong"}"#
    );
    let value = serde_json::to_value(Response::ShuttingDown).unwrap();
    assert_eq!(value["type"], "shuttingDown");
}
