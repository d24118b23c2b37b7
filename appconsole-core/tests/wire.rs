//! Wire-level properties exercised over real sockets: handshake symmetry,
//! frame delivery, and the payload cap tearing a connection down.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use appconsole_core::transport::{frame, handshake};
use appconsole_core::ConsoleError;

async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
    let client = TcpStream::connect(addr).await.unwrap();
    (client, accept.await.unwrap())
}

#[tokio::test]
async fn handshake_completes_over_tcp() {
    let (mut client, mut service) = tcp_pair().await;
    let (c, s) = tokio::join!(
        handshake::connect_as_client(&mut client),
        handshake::accept_as_service(&mut service),
    );
    c.unwrap();
    s.unwrap();
}

#[tokio::test]
async fn client_rejects_an_impostor_service() {
    let (mut client, mut impostor) = tcp_pair().await;
    impostor.write_all(b"APPSERVICEV9999").await.unwrap();

    let err = handshake::connect_as_client(&mut client).await.unwrap_err();
    assert!(matches!(err, ConsoleError::HandshakeFailed(_)));
}

#[tokio::test]
async fn service_rejects_an_impostor_client() {
    let (mut impostor, mut service) = tcp_pair().await;
    let accept = tokio::spawn(async move {
        handshake::accept_as_service(&mut service).await
    });

    let mut greeting = [0u8; 15];
    impostor.read_exact(&mut greeting).await.unwrap();
    assert_eq!(&greeting, handshake::SERVICE_HANDSHAKE);
    impostor.write_all(b"APPCLIENTV9999").await.unwrap();

    let err = accept.await.unwrap().unwrap_err();
    assert!(matches!(err, ConsoleError::HandshakeFailed(_)));
}

#[tokio::test]
async fn single_byte_metadata_and_empty_payload_cross_the_wire() {
    let (mut client, mut service) = tcp_pair().await;

    frame::write_frame(&mut client, &[1], &[]).await.unwrap();
    let (metadata, payload) = frame::read_frame(&mut service).await.unwrap();
    assert_eq!(metadata, vec![1]);
    assert!(payload.is_empty());
}

#[tokio::test]
async fn announcing_the_payload_cap_corrupts_the_session() {
    let (mut client, mut service) = tcp_pair().await;

    // hand-rolled frame header announcing exactly the cap
    client.write_all(&0i16.to_le_bytes()).await.unwrap();
    client
        .write_all(&frame::MAX_PAYLOAD_LENGTH.to_le_bytes())
        .await
        .unwrap();

    let err = frame::read_frame(&mut service).await.unwrap_err();
    assert!(matches!(err, ConsoleError::CorruptMessage));
}

#[tokio::test]
async fn frames_round_trip_across_sizes() {
    let (mut client, mut service) = tcp_pair().await;

    for size in [0usize, 1, 255, 4 * 1024, 256 * 1024] {
        let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let writer = async {
            frame::write_frame(&mut client, b"meta", &payload).await.unwrap();
        };
        let reader = async { frame::read_frame(&mut service).await.unwrap() };
        let ((), (metadata, received)) = tokio::join!(writer, reader);
        assert_eq!(metadata, b"meta");
        assert_eq!(received, payload);
    }
}
