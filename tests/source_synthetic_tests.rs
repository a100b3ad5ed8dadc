use depthclip::source::{DepthSource, SourceRead, SourceState, SyntheticDepthSource};
use depthclip::core::encode_sample;
use serde_json::json;
use tokio::time::{timeout, Duration};

#[tokio::test]
async fn test_synthetic_periodic_frames() {
    let mut source = SyntheticDepthSource::new();

    source
        .configure(json!({"width": 10, "height": 10, "interval_ms": 5}))
        .await
        .unwrap();
    source.open().await.unwrap();
    source.start().await.unwrap();

    let first = timeout(Duration::from_millis(100), source.read_frame())
        .await
        .unwrap()
        .unwrap();
    let second = timeout(Duration::from_millis(100), source.read_frame())
        .await
        .unwrap()
        .unwrap();

    match (first, second) {
        (SourceRead::Frame(a), SourceRead::Frame(b)) => {
            assert_eq!(a.pixel_count(), 100);
            assert!(b.sequence_id > a.sequence_id);
            assert!(b.timestamp >= a.timestamp);
        }
        other => panic!("expected two frames, got {:?}", other),
    }

    source.stop().await.unwrap();
    source.close().await.unwrap();
    assert_eq!(source.state(), SourceState::Closed);
}

#[tokio::test]
async fn test_synthetic_lifecycle_guards() {
    let mut source = SyntheticDepthSource::new();
    assert!(source.read_frame().await.is_err());

    source.open().await.unwrap();
    assert!(source.configure(json!({"width": 4})).await.is_err());
    assert!(source.open().await.is_err());

    source.start().await.unwrap();
    assert_eq!(source.state(), SourceState::Running);
}

#[tokio::test]
async fn test_synthetic_rejects_out_of_range_depth() {
    let mut source = SyntheticDepthSource::new();
    let result = source.configure(json!({"background_depth": 70000})).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_synthetic_frame_limit_and_drops() {
    let mut source = SyntheticDepthSource::new();
    source
        .configure(json!({"width": 2, "height": 2, "drop_every": 2, "frame_limit": 2}))
        .await
        .unwrap();
    source.open().await.unwrap();
    source.start().await.unwrap();

    let mut reads = Vec::new();
    for _ in 0..5 {
        reads.push(match source.read_frame().await.unwrap() {
            SourceRead::Frame(_) => "frame",
            SourceRead::Missing => "missing",
            SourceRead::Finished => "finished",
        });
    }
    assert_eq!(reads, vec!["frame", "missing", "frame", "finished", "finished"]);
}

#[test]
fn test_synthetic_object_moves_in_front_of_wall() {
    let mut source = SyntheticDepthSource::new();
    tokio_test::block_on(source.configure(json!({
        "width": 8,
        "height": 4,
        "object_size": 2,
        "object_after": 3
    })))
    .unwrap();

    let wall = encode_sample(1200, 0);
    let object = encode_sample(700, 1);

    assert!(source.render(2).iter().all(|&s| s == wall));

    let first = source.render(3);
    let next = source.render(4);
    assert_eq!(first.iter().filter(|&&s| s == object).count(), 4);
    // rows 1 and 2 carry the object, starting at the left edge then one step right
    assert_eq!(first[8], object);
    assert_eq!(next[8], wall);
    assert_eq!(next[9], object);
}
