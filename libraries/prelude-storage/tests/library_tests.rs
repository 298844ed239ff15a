//! Integration tests for tracks, albums, artists and playlists


use prelude_core::{ArtistId, Playlist, Position, TrackId, UserId, Visibility};
use prelude_storage::tracks::{Sort, SortField};
use prelude_storage::{albums, artists, playlists, tracks, Pagination};
use test_helpers::*;

#[tokio::test]
async fn test_track_round_trip() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let artist = create_test_artist(pool, "ar1", "Artist").await;
    let album = create_test_album(pool, "al1", "Album", &artist.id).await;

    let mut track = test_track("t1", "First", &artist.id, Some(&album.id));
    track.year = Some(1999);
    track.genres = vec!["Jazz".to_string(), "Soul".to_string()];
    track.track = Some(Position { no: 1, of: Some(10) });
    tracks::save(pool, &track).await.unwrap();

    let stored = tracks::get(pool, &track.id).await.unwrap().unwrap();
    assert_eq!(stored, track);

    let by_file = tracks::get_by_file(pool, &track.file).await.unwrap().unwrap();
    assert_eq!(by_file.id, track.id);
    assert!(tracks::exists(pool, &track.id).await.unwrap());
    assert!(!tracks::exists(pool, &TrackId::new("missing")).await.unwrap());
}

#[tokio::test]
async fn test_track_listing_sorted_and_paged() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let artist = create_test_artist(pool, "ar1", "Artist").await;
    for (id, title) in [("t1", "Charlie"), ("t2", "Alpha"), ("t3", "Bravo")] {
        create_test_track(pool, id, title, &artist.id, None).await;
    }

    let sort = Sort {
        field: SortField::Title,
        descending: true,
    };
    let page = tracks::list(pool, Pagination::new(2, 0), Some(sort)).await.unwrap();
    assert_eq!(page.total, 3);
    let titles: Vec<_> = page.resources.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Charlie", "Bravo"]);

    let rest = tracks::list(pool, Pagination::new(2, 2), Some(sort)).await.unwrap();
    assert_eq!(rest.resources.len(), 1);
    assert_eq!(rest.resources[0].title, "Alpha");
}

#[tokio::test]
async fn test_tracks_by_album_and_artist() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let artist = create_test_artist(pool, "ar1", "Artist").await;
    let other = create_test_artist(pool, "ar2", "Other").await;
    let album = create_test_album(pool, "al1", "Album", &artist.id).await;
    create_test_track(pool, "t1", "One", &artist.id, Some(&album.id)).await;
    create_test_track(pool, "t2", "Two", &artist.id, Some(&album.id)).await;
    create_test_track(pool, "t3", "Three", &other.id, None).await;

    let on_album = tracks::by_album(pool, &album.id, Pagination::first(10)).await.unwrap();
    assert_eq!(on_album.total, 2);

    let by_artist = tracks::by_artist(pool, &other.id, Pagination::first(10)).await.unwrap();
    assert_eq!(by_artist.total, 1);
    assert_eq!(by_artist.resources[0].id, TrackId::new("t3"));

    let artist_albums = albums::by_artist(pool, &artist.id, Pagination::first(10)).await.unwrap();
    assert_eq!(artist_albums.total, 1);
}

#[tokio::test]
async fn test_removing_last_track_prunes_album_and_artist() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let artist = create_test_artist(pool, "ar1", "Artist").await;
    let album = create_test_album(pool, "al1", "Album", &artist.id).await;
    let first = create_test_track(pool, "t1", "One", &artist.id, Some(&album.id)).await;
    let second = create_test_track(pool, "t2", "Two", &artist.id, Some(&album.id)).await;

    tracks::remove(pool, &first).await.unwrap();
    assert!(albums::get(pool, &album.id).await.unwrap().is_some());
    assert!(artists::get(pool, &artist.id).await.unwrap().is_some());

    tracks::remove(pool, &second).await.unwrap();
    assert!(albums::get(pool, &album.id).await.unwrap().is_none());
    assert!(artists::get(pool, &artist.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_many_artists_skips_unknown() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    create_test_artist(pool, "ar1", "One").await;
    create_test_artist(pool, "ar2", "Two").await;

    let ids = [ArtistId::new("ar2"), ArtistId::new("nope"), ArtistId::new("ar1")];
    let found = artists::get_many(pool, &ids).await.unwrap();
    let names: Vec<_> = found.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Two", "One"]);
}

#[tokio::test]
async fn test_playlist_visibility_queries() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let me = UserId::new("me");
    let them = UserId::new("them");
    let tracks = vec![TrackId::new("t1")];

    for (owner, visibility) in [
        (&me, Visibility::Public),
        (&me, Visibility::Private),
        (&them, Visibility::Public),
        (&them, Visibility::Unlisted),
        (&them, Visibility::Private),
    ] {
        let playlist = Playlist::new("List", owner.clone(), visibility, tracks.clone());
        playlists::save(pool, &playlist).await.unwrap();
    }

    let mine = playlists::list_by_user(pool, &me, Pagination::first(10)).await.unwrap();
    assert_eq!(mine.total, 2);

    let public = playlists::list_public_except(pool, &me, Pagination::first(10)).await.unwrap();
    assert_eq!(public.total, 1);
    assert_eq!(public.resources[0].user, them);

    playlists::delete_by_user(pool, &them).await.unwrap();
    let all = playlists::list(pool, Pagination::first(10)).await.unwrap();
    assert_eq!(all.total, 2);

    playlists::delete_all(pool).await.unwrap();
    let all = playlists::list(pool, Pagination::first(10)).await.unwrap();
    assert_eq!(all.total, 0);
}

#[tokio::test]
async fn test_playlist_round_trip_preserves_track_order() {
    let test_db = TestDb::new().await;
    let pool = test_db.pool();

    let playlist = Playlist::new(
        "Ordered",
        UserId::new("u"),
        Visibility::Unlisted,
        vec![TrackId::new("b"), TrackId::new("a"), TrackId::new("c")],
    );
    playlists::save(pool, &playlist).await.unwrap();

    let stored = playlists::get(pool, &playlist.id).await.unwrap().unwrap();
    assert_eq!(stored, playlist);

    playlists::delete(pool, &playlist.id).await.unwrap();
    assert!(playlists::get(pool, &playlist.id).await.unwrap().is_none());
}
