use super::*;

const ALBUM_URL: &str = "https://music.apple.com/us/album/abbey-road/1441164426";
const ARTIST_URL: &str = "https://music.apple.com/us/artist/the-beatles/136975";

fn inputs(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

fn artist_item(id: &str, name: &str, release_date: &str) -> ArtistItem {
    ArtistItem {
        id: id.to_string(),
        name: name.to_string(),
        release_date: release_date.to_string(),
        url: format!("https://music.apple.com/us/album/{id}"),
    }
}

fn beatles_catalog() -> FakeCatalog {
    let mut catalog = three_song_catalog();
    catalog.artists.insert(
        "136975".to_string(),
        ArtistRef {
            id: "136975".to_string(),
            name: "The Beatles".to_string(),
            artwork_url: None,
        },
    );
    catalog.artist_albums.insert(
        "136975".to_string(),
        vec![
            artist_item("1441164426", "Abbey Road", "1969-09-26"),
            artist_item("1441133180", "Let It Be", "1970-05-08"),
        ],
    );
    catalog
}

#[tokio::test]
async fn test_clean_batch_runs_one_pass() {
    let harness = Harness::new(three_song_catalog());
    let report = harness.downloader().run(&inputs(&[ALBUM_URL])).await;

    assert_eq!(report.passes, 1);
    assert_eq!(report.counters, counters(3, 3, 0, 0, 0));
    assert_eq!(report.completed, 3);
    assert_eq!(harness.continuation.times_asked(), 0);
}

#[tokio::test]
async fn test_errors_trigger_retry_without_refetching() {
    let mut harness = Harness::new(three_song_catalog());
    harness.fetcher = Arc::new(RecordingFetcher::failing("1441164431", 1));
    harness.continuation = Arc::new(ScriptedContinuation::answering(&[true]));

    let report = harness.downloader().run(&inputs(&[ALBUM_URL])).await;

    assert_eq!(report.passes, 2);
    assert_eq!(report.counters, counters(3, 3, 0, 0, 0));
    assert_eq!(report.completed, 3);
    assert_eq!(
        harness.fetched_ids(),
        vec!["1441164430", "1441164431", "1441164432", "1441164431"]
    );

    let asked = harness.continuation.asked.lock().unwrap().clone();
    assert_eq!(asked, vec![counters(3, 2, 1, 0, 0)]);
}

#[tokio::test]
async fn test_declined_retry_stops_after_first_pass() {
    let mut harness = Harness::new(three_song_catalog());
    harness.fetcher = Arc::new(RecordingFetcher::failing("1441164431", 5));
    harness.continuation = Arc::new(ScriptedContinuation::answering(&[false]));

    let report = harness.downloader().run(&inputs(&[ALBUM_URL])).await;

    assert_eq!(report.passes, 1);
    assert_eq!(report.counters, counters(3, 2, 1, 0, 0));
    assert_eq!(report.completed, 2);
    assert_eq!(harness.continuation.times_asked(), 1);
}

#[tokio::test]
async fn test_warnings_alone_do_not_retry() {
    let mut catalog = three_song_catalog();
    catalog.songs.remove("1441164432");
    let harness = Harness::new(catalog);
    harness.continuation.answers.lock().unwrap().push_back(true);

    let report = harness.downloader().run(&inputs(&[ALBUM_URL])).await;

    assert_eq!(report.passes, 1);
    assert_eq!(report.counters, counters(3, 2, 0, 0, 1));
    assert_eq!(report.counters.warnings(), 1);
    assert_eq!(harness.continuation.times_asked(), 0);
}

#[tokio::test]
async fn test_inspect_never_retries() {
    let mut harness = Harness::new(three_song_catalog());
    harness.options.inspect = true;

    let report = harness.downloader().run(&inputs(&[ALBUM_URL])).await;

    assert_eq!(report.passes, 1);
    assert_eq!(report.counters, Counters::default());
    assert!(harness.fetched_ids().is_empty());
}

#[tokio::test]
async fn test_unrecognized_inputs_are_skipped() {
    let harness = Harness::new(three_song_catalog());
    let report = harness
        .downloader()
        .run(&inputs(&[
            "not a url",
            "https://example.com/us/album/x/1",
            ALBUM_URL,
        ]))
        .await;

    assert_eq!(report.counters, counters(3, 3, 0, 0, 0));
}

#[tokio::test]
async fn test_song_url_acquires_only_that_track() {
    let harness = Harness::new(three_song_catalog());
    let report = harness
        .downloader()
        .run(&inputs(&["https://music.apple.com/us/song/something/1441164431"]))
        .await;

    assert_eq!(report.counters, counters(1, 1, 0, 0, 0));
    assert_eq!(harness.fetched_ids(), vec!["1441164431"]);
    assert!(harness.album_dir().join("02. Something.m4a").exists());
}

#[tokio::test]
async fn test_single_track_flag_honours_album_hint() {
    let mut harness = Harness::new(three_song_catalog());
    harness.options.single_track = true;

    harness
        .downloader()
        .run(&inputs(&[&format!("{ALBUM_URL}?i=1441164432")]))
        .await;

    assert_eq!(harness.fetched_ids(), vec!["1441164432"]);
}

#[tokio::test]
async fn test_artist_albums_are_chosen_interactively() {
    let mut harness = Harness::new(beatles_catalog());
    harness.prompt = Arc::new(ScriptedPrompt::answering(&["1"]));

    let report = harness.downloader().run(&inputs(&[ARTIST_URL])).await;

    assert_eq!(report.counters, counters(3, 3, 0, 0, 0));
    let shown = harness.prompt.shown.lock().unwrap().clone();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "The Beatles - albums");
    assert_eq!(
        shown[0].1,
        vec![
            "  1. Abbey Road (1969-09-26)".to_string(),
            "  2. Let It Be (1970-05-08)".to_string()
        ]
    );
}

#[tokio::test]
async fn test_all_artist_albums_skips_prompt() {
    let mut harness = Harness::new(beatles_catalog());
    harness.options.all_artist_albums = true;

    let report = harness.downloader().run(&inputs(&[ARTIST_URL])).await;

    // "Let It Be" is not in the catalog and fails before any track is counted
    assert_eq!(report.counters, counters(3, 3, 0, 0, 0));
    assert!(harness.prompt.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_artist_expansion_is_planned_once() {
    let mut harness = Harness::new(beatles_catalog());
    harness.prompt = Arc::new(ScriptedPrompt::answering(&["1"]));
    harness.fetcher = Arc::new(RecordingFetcher::failing("1441164430", 1));
    harness.continuation = Arc::new(ScriptedContinuation::answering(&[true]));

    let report = harness.downloader().run(&inputs(&[ARTIST_URL])).await;

    assert_eq!(report.passes, 2);
    assert_eq!(report.counters.error, 0);
    assert_eq!(harness.prompt.shown.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_artist_videos_are_planned_with_artist_context() {
    let mut catalog = beatles_catalog();
    catalog.artist_videos.insert(
        "136975".to_string(),
        vec![artist_item("1544429394", "Hey Jude", "1968-08-26")],
    );
    let mut harness = Harness::new(catalog);
    harness.options.all_artist_albums = true;

    let downloader = harness.downloader();
    let work = downloader.plan(&inputs(&[ARTIST_URL])).await;

    assert_eq!(work.len(), 3);
    let artist = Some(ArtistContext {
        id: "136975".to_string(),
        name: "The Beatles".to_string(),
    });
    assert_eq!(
        work[2],
        crate::downloader::batch::WorkItem::MusicVideo {
            storefront: "us".to_string(),
            id: "1544429394".to_string(),
            artist: artist.clone(),
        }
    );
    let crate::downloader::batch::WorkItem::Entity(first) = &work[0] else {
        panic!("expected an entity, got {:?}", work[0]);
    };
    assert_eq!(first.artist, artist);
}
