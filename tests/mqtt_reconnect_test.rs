//! MQTT transport against a minimal in-test broker.

use bytes::BytesMut;
use rumqttc::QoS;
use rumqttc::mqttbytes::Error as FrameError;
use rumqttc::mqttbytes::v4::{
    self, ConnAck, ConnectReturnCode, Packet, PingResp, SubAck, SubscribeReasonCode,
};
use std::time::Duration;
use tictactoe_mqtt::{MqttSettings, MqttTransport, TOPIC_BOARD, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const MAX_PACKET: usize = 64 * 1024;

/// Reads the next whole packet, or `None` once the client hangs up.
async fn next_packet(stream: &mut TcpStream, buf: &mut BytesMut) -> Option<Packet> {
    loop {
        match v4::read(buf, MAX_PACKET) {
            Ok(packet) => return Some(packet),
            Err(FrameError::InsufficientBytes(_)) => {}
            Err(_) => return None,
        }
        let mut chunk = [0u8; 1024];
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

async fn reply(
    stream: &mut TcpStream,
    write: impl FnOnce(&mut BytesMut) -> Result<usize, FrameError>,
) {
    let mut out = BytesMut::new();
    write(&mut out).unwrap();
    stream.write_all(&out).await.unwrap();
}

/// Answers one packet like a broker would. Returns whether it was a SUBSCRIBE.
async fn answer(stream: &mut TcpStream, packet: Packet) -> bool {
    match packet {
        Packet::Connect(_) => {
            reply(stream, |out| {
                ConnAck::new(ConnectReturnCode::Success, false).write(out)
            })
            .await;
            false
        }
        Packet::Subscribe(subscribe) => {
            let codes = subscribe
                .filters
                .iter()
                .map(|_| SubscribeReasonCode::Success(QoS::AtLeastOnce))
                .collect();
            reply(stream, |out| SubAck::new(subscribe.pkid, codes).write(out)).await;
            true
        }
        Packet::PingReq => {
            reply(stream, |out| PingResp.write(out)).await;
            false
        }
        _ => false,
    }
}

/// Accepts a session, drops it after the first SUBSCRIBE, accepts the
/// reconnect without a stored session and counts SUBSCRIBEs on it.
async fn flaky_broker(listener: TcpListener) -> (usize, usize) {
    let (mut stream, _) = listener.accept().await.unwrap();
    let mut buf = BytesMut::new();
    let mut first = 0;
    while let Some(packet) = next_packet(&mut stream, &mut buf).await {
        if answer(&mut stream, packet).await {
            first += 1;
            break;
        }
    }
    drop(stream);

    let (mut stream, _) = listener.accept().await.unwrap();
    let mut buf = BytesMut::new();
    let mut second = 0;
    let window = tokio::time::sleep(Duration::from_secs(3));
    tokio::pin!(window);
    while second == 0 {
        tokio::select! {
            _ = &mut window => break,
            packet = next_packet(&mut stream, &mut buf) => match packet {
                Some(packet) => {
                    if answer(&mut stream, packet).await {
                        second += 1;
                    }
                }
                None => break,
            },
        }
    }
    (first, second)
}

#[tokio::test]
async fn test_board_subscription_survives_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let broker = tokio::spawn(flaky_broker(listener));

    let settings = MqttSettings::new(
        "127.0.0.1".to_string(),
        port,
        "reconnect-test".to_string(),
        Duration::from_secs(5),
        Duration::from_secs(2),
        Duration::from_millis(500),
    );
    let mut transport = MqttTransport::connect(settings).await.unwrap();
    transport.subscribe(TOPIC_BOARD).await.unwrap();

    let (first, after_reconnect) = tokio::time::timeout(Duration::from_secs(10), broker)
        .await
        .expect("broker did not see a reconnect")
        .unwrap();
    assert_eq!(first, 1);
    assert_eq!(after_reconnect, 1, "board subscription lost after reconnect");

    let _ = transport.disconnect().await;
}
