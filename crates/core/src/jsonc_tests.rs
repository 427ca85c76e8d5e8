// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parses(input: &str) -> serde_json::Value {
    serde_json::from_str(&strip(input)).unwrap()
}

#[test]
fn plain_json_passes_through() {
    let value = parses(r#"{"a": 1, "b": [2, 3]}"#);
    assert_eq!(value["a"], 1);
}

#[test]
fn line_comments_are_stripped() {
    let value = parses("{\n  // the answer\n  \"a\": 42\n}");
    assert_eq!(value["a"], 42);
}

#[test]
fn block_comments_are_stripped() {
    let value = parses("{ /* multi\nline */ \"a\": 1 }");
    assert_eq!(value["a"], 1);
}

#[test]
fn trailing_commas_in_objects_and_arrays() {
    let value = parses("{\"list\": [1, 2, 3,], \"x\": 1,}");
    assert_eq!(value["list"].as_array().unwrap().len(), 3);
}

#[test]
fn comment_between_comma_and_closer() {
    let value = parses("{\"a\": 1, // last\n}");
    assert_eq!(value["a"], 1);
}

#[test]
fn slashes_inside_strings_survive() {
    let value = parses(r#"{"url": "https://example.com", "re": "a/*b*/c"}"#);
    assert_eq!(value["url"], "https://example.com");
    assert_eq!(value["re"], "a/*b*/c");
}

#[test]
fn escaped_quotes_inside_strings() {
    let value = parses(r#"{"s": "say \"hi\" // not a comment"}"#);
    assert_eq!(value["s"], "say \"hi\" // not a comment");
}

#[test]
fn commas_inside_strings_are_not_trailing() {
    let value = parses(r#"{"s": "a,]"}"#);
    assert_eq!(value["s"], "a,]");
}
