/// Byte-range streaming, cover art and proxied images
mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{TestApp, TestResponse};
use prelude_core::{ArtistId, Scope, TrackId};
use prelude_storage::{albums, artists, tracks};

const SIZE: usize = 1000;

fn audio_bytes() -> Vec<u8> {
    (0..SIZE).map(|i| (i % 251) as u8).collect()
}

async fn setup() -> (TestApp, String) {
    let app = TestApp::new().await;
    let (_, auth) = app.login("listener", &[Scope::LibraryRead]).await;
    let artist = app.create_artist("ar1", "Boards of Canada", None).await;
    app.create_track("t1", "Roygbiv", &artist.id, None, Some(&audio_bytes()))
        .await;
    (app, auth)
}

async fn get_range(app: &TestApp, auth: &str, uri: &str, range: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::RANGE, range)
        .body(Body::empty())
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn test_full_audio_without_range() {
    let (app, auth) = setup().await;

    let response = app.call(Method::GET, "/tracks/t1/audio", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), audio_bytes().as_slice());
    assert_eq!(response.header(header::CONTENT_TYPE), "audio/mpeg");
    assert_eq!(response.header(header::CONTENT_LENGTH), "1000");
    assert_eq!(response.header(header::ACCEPT_RANGES), "bytes");
}

#[tokio::test]
async fn test_leading_range_is_partial_content() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "bytes=0-99").await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 0-99/1000");
    assert_eq!(response.header(header::CONTENT_LENGTH), "100");
    assert_eq!(response.body.as_ref(), &audio_bytes()[..100]);
}

#[tokio::test]
async fn test_suffix_range_serves_tail() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "bytes=-500").await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 500-999/1000");
    assert_eq!(response.body.as_ref(), &audio_bytes()[500..]);
}

#[tokio::test]
async fn test_adjacent_ranges_merge_into_one() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "bytes=100-199,0-99").await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 0-199/1000");
}

#[tokio::test]
async fn test_disjoint_ranges_fall_back_to_full_body() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "bytes=900-999,0-99").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.len(), SIZE);
    assert!(response.headers.get(header::CONTENT_RANGE).is_none());
}

#[tokio::test]
async fn test_range_past_end_is_unsatisfiable() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "bytes=5000-").await;

    assert_eq!(response.status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.error_message(), "Bad range start `5000`");
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes */1000");
}

#[tokio::test]
async fn test_unknown_range_unit_is_bad_request() {
    let (app, auth) = setup().await;

    let response = get_range(&app, &auth, "/tracks/t1/audio", "items=0-5").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.error_message(),
        "The Range unit `items` is not supported. Only `bytes` is supported."
    );
}

#[tokio::test]
async fn test_head_sends_headers_only() {
    let (app, auth) = setup().await;

    let response = app.call(Method::HEAD, "/tracks/t1/audio", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_LENGTH), "1000");
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_audio_requires_library_scope() {
    let (app, _) = setup().await;
    let (_, auth) = app.login("outsider", &[Scope::PlaylistsRead]).await;

    let response = app.call(Method::GET, "/tracks/t1/audio", Some(&auth)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.call(Method::POST, "/tracks/t1/audio", Some(&auth)).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_file_removes_track() {
    let app = TestApp::new().await;
    let (_, auth) = app.login("listener", &[Scope::LibraryRead]).await;
    let artist = app.create_artist("ar1", "Solo", None).await;
    let album = app.create_album("al1", "Only Album", &artist.id).await;
    app.create_track("gone", "Vanished", &artist.id, Some(&album.id), None)
        .await;

    let response = app.call(Method::GET, "/tracks/gone/audio", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.error_message(),
        "The requested track could not be found."
    );
    let pool = app.pool();
    assert!(tracks::get(pool, &TrackId::new("gone")).await.unwrap().is_none());
    assert!(albums::get(pool, &album.id).await.unwrap().is_none());
    assert!(artists::get(pool, &ArtistId::new("ar1")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_track_without_cover_is_not_found() {
    let (app, auth) = setup().await;

    let response = app.call(Method::GET, "/tracks/t1/image", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.error_message(),
        "Track \"t1\" (Roygbiv) does not have an associated cover image."
    );
    // The file is still readable, so the track stays
    assert!(tracks::get(app.pool(), &TrackId::new("t1")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_album_without_cover_is_not_found() {
    let app = TestApp::new().await;
    let (_, auth) = app.login("listener", &[Scope::LibraryRead]).await;
    let artist = app.create_artist("ar1", "Solo", None).await;
    let album = app.create_album("al1", "Plain", &artist.id).await;
    app.create_track("t1", "One", &artist.id, Some(&album.id), Some(b"not audio"))
        .await;

    let response = app.call(Method::GET, "/albums/al1/image", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.error_message(),
        "Album \"al1\" (Plain) does not have an associated cover image."
    );
}

#[tokio::test]
async fn test_artist_without_image_is_not_found() {
    let (app, auth) = setup().await;

    let response = app.call(Method::GET, "/artists/ar1/image", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.error_message(),
        "Artist \"ar1\" (Boards of Canada) does not have an associated image."
    );
}

#[tokio::test]
async fn test_unreachable_artist_image_is_service_unavailable() {
    let app = TestApp::new().await;
    let (_, auth) = app.login("listener", &[Scope::LibraryRead]).await;
    app.create_artist("ar2", "Offline", Some("http://127.0.0.1:9/cover.jpg"))
        .await;

    let response = app.call(Method::GET, "/artists/ar2/image", Some(&auth)).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response
        .error_message()
        .starts_with("Failed to proxy URL \"http://127.0.0.1:9/cover.jpg\""));
}
