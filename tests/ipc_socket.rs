//! Exercises the wire protocol over a real Unix socket, as opposed to the
//! in-memory cursor round-trip already covered by `ipc::protocol`'s unit
//! tests.

use clangd_query::ipc::protocol::{read_frame, write_frame, Request, Response};
use tempfile::tempdir;
use tokio::net::{UnixListener, UnixStream};

#[tokio::test]
async fn request_and_response_round_trip_over_a_socket() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("clangd-daemon-test.sock");

    let listener = UnixListener::bind(&socket_path).unwrap();

    let server = tokio::spawn({
        let socket_path = socket_path.clone();
        async move {
            let _ = &socket_path;
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = tokio::io::BufReader::new(read_half);
            let request: Request = read_frame(&mut reader).await.unwrap().unwrap();
            assert_eq!(request.command, "search");
            assert_eq!(request.arguments, vec!["GameObject".to_string()]);

            let response = Response::ok("- `class game_engine::GameObject`".to_string());
            write_frame(&mut write_half, &response).await.unwrap();
        }
    });

    let client = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = client.into_split();
    let mut reader = tokio::io::BufReader::new(read_half);

    let request = Request {
        command: "search".to_string(),
        arguments: vec!["GameObject".to_string()],
        limit: Some(20),
        timeout: None,
        verbose: false,
    };
    write_frame(&mut write_half, &request).await.unwrap();

    let response: Response = read_frame(&mut reader).await.unwrap().unwrap();
    assert_eq!(response.exit_code, 0);
    assert!(response.stdout.contains("GameObject"));

    server.await.unwrap();
}

#[tokio::test]
async fn connecting_to_a_missing_socket_fails() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("nobody-home.sock");
    assert!(UnixStream::connect(&socket_path).await.is_err());
}
