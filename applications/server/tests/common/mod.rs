//! Common test utilities and fixtures
//!
//! Each [`TestApp`] owns a real SQLite file and a music directory inside a
//! temp dir, and drives the full router with `oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use prelude_core::{
    Album, AlbumId, Artist, ArtistId, AudioMeta, Scope, Token, Track, TrackId, User,
};
use prelude_server::config::ServerConfig;
use prelude_server::services::AuthService;
use prelude_server::{router, AppState};
use prelude_storage::{albums, artists, tokens, tracks, users, Database, SqlitePool};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Test user credentials
pub mod fixtures {
    pub const TEST_PASSWORD: &str = "correct-horse";
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub temp_dir: TempDir,
}

/// Status, headers and raw body of a response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn error_message(&self) -> String {
        self.json()["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let mut config = ServerConfig::default();
        config.storage.database_url = db_url.clone();
        config.api.max_body_size = 64 * 1024;

        let db = Arc::new(Database::connect(&db_url).await.expect("Failed to open database"));
        let auth_service = Arc::new(AuthService::new(db.clone()).with_cost(4));
        let state = AppState::new(db, auth_service, config);

        Self {
            router: router(state.clone()),
            state,
            temp_dir,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        self.state.pool()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Request with an optional `Authorization` header and no body
    pub async fn call(&self, method: Method, uri: &str, auth: Option<&str>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Request with a JSON body
    pub async fn call_json(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: &Value,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Create a user whose password is [`fixtures::TEST_PASSWORD`]
    pub async fn create_user(&self, username: &str, scopes: &[Scope]) -> User {
        let hash = self
            .state
            .auth_service
            .hash_password(fixtures::TEST_PASSWORD)
            .await
            .unwrap();
        let user = User::new(username, hash, scopes.iter().copied());
        users::save(self.pool(), &user).await.unwrap();
        user
    }

    /// Issue a token and return its `Authorization` header value
    pub async fn bearer(&self, user: &User, scopes: &[Scope]) -> String {
        let token = Token::issue(user.id.clone(), None, scopes.iter().copied().collect(), "test");
        tokens::save(self.pool(), &token).await.unwrap();
        format!("Bearer {}", token.secret.as_str())
    }

    /// A user holding `scopes`, and a bearer header granting the same scopes
    pub async fn login(&self, username: &str, scopes: &[Scope]) -> (User, String) {
        let user = self.create_user(username, scopes).await;
        let auth = self.bearer(&user, scopes).await;
        (user, auth)
    }

    pub async fn create_artist(&self, id: &str, name: &str, image: Option<&str>) -> Artist {
        let artist = Artist {
            id: ArtistId::new(id),
            name: name.to_string(),
            external_image: image.map(str::to_string),
        };
        artists::save(self.pool(), &artist).await.unwrap();
        artist
    }

    pub async fn create_album(&self, id: &str, title: &str, artist: &ArtistId) -> Album {
        let album = Album {
            id: AlbumId::new(id),
            title: title.to_string(),
            artist: artist.clone(),
        };
        albums::save(self.pool(), &album).await.unwrap();
        album
    }

    /// Create a track; `contents` of `None` leaves its file missing
    pub async fn create_track(
        &self,
        id: &str,
        title: &str,
        artist: &ArtistId,
        album: Option<&AlbumId>,
        contents: Option<&[u8]>,
    ) -> Track {
        let file: PathBuf = self.temp_dir.path().join(format!("{}.mp3", id));
        if let Some(contents) = contents {
            std::fs::write(&file, contents).unwrap();
        }

        let track = Track {
            id: TrackId::new(id),
            title: title.to_string(),
            artist: artist.clone(),
            album: album.cloned(),
            file,
            year: Some(2001),
            genres: vec!["Electronic".to_string()],
            track: None,
            disk: None,
            duration: 215.5,
            meta: AudioMeta {
                channels: 2,
                sample_rate: 44100,
                bitrate: 320_000,
                lossless: false,
            },
        };
        tracks::save(self.pool(), &track).await.unwrap();
        track
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}
