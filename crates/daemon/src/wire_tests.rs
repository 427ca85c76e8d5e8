// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::Request;

#[tokio::test]
async fn roundtrip_through_a_duplex_pipe() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let data = encode(&Request::Ping).unwrap();
    write_message(&mut client, &data).await.unwrap();

    let frame = read_message(&mut server).await.unwrap();
    let request: Request = decode(&frame).unwrap();
    assert_eq!(request, Request::Ping);
}

#[tokio::test]
async fn closed_pipe_reports_connection_closed() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);
    match read_message(&mut server).await {
        Err(WireError::ConnectionClosed) => {}
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(64);
    let bogus = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    tokio::io::AsyncWriteExt::write_all(&mut client, &bogus)
        .await
        .unwrap();
    match read_message(&mut server).await {
        Err(WireError::MessageTooLarge { .. }) => {}
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn write_frame_encodes_and_prefixes() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    write_frame(
        &mut client,
        &Request::Hello {
            version: "1".into(),
        },
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();
    let frame = read_message(&mut server).await.unwrap();
    let request: Request = decode(&frame).unwrap();
    assert!(matches!(request, Request::Hello { .. }));
}
