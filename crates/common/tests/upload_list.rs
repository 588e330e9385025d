//! Integration tests for uploading into buckets and listing them

mod common;

use std::collections::HashSet;

#[tokio::test]
async fn test_upload_then_list() {
    let env = common::setup_store().await;

    env.uploader
        .upload(Some("B"), "report.csv", b"a,b,c\n1,2,3\n")
        .await
        .unwrap();

    let buckets = env.enumerator.list(None).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "B");
    assert_eq!(buckets[0].files.len(), 1);
    assert_eq!(buckets[0].files[0].name, "report.csv");
    assert_eq!(buckets[0].files[0].size, 12);
}

#[tokio::test]
async fn test_reupload_replaces_content() {
    let env = common::setup_store().await;

    env.uploader
        .upload(Some("docs"), "readme.md", b"a much longer first version")
        .await
        .unwrap();
    env.uploader
        .upload(Some("docs"), "readme.md", b"v2")
        .await
        .unwrap();

    let buckets = env.enumerator.list(None).unwrap();
    let docs = common::find(&buckets, "docs").unwrap();
    assert_eq!(docs.files.len(), 1);
    assert_eq!(docs.files[0].size, 2);

    let download = env.downloader.open("docs/readme.md").await.unwrap();
    assert_eq!(common::read_all(download).await, b"v2");
}

#[tokio::test]
async fn test_many_files_across_buckets() {
    let env = common::setup_store().await;

    let uploads = [
        ("photos", "a.png"),
        ("photos", "b.png"),
        ("photos/2024", "c.png"),
        ("logs", "today.txt"),
        ("logs", "yesterday.txt"),
        ("music", "song.mp3"),
    ];
    for (bucket, name) in uploads {
        env.uploader
            .upload(Some(bucket), name, name.as_bytes())
            .await
            .unwrap();
    }

    let buckets = env.enumerator.list(None).unwrap();
    assert_eq!(buckets.len(), 4);

    let total: usize = buckets.iter().map(|b| b.files.len()).sum();
    assert_eq!(total, uploads.len());

    let mut seen = HashSet::new();
    for bucket in &buckets {
        for file in &bucket.files {
            assert!(seen.insert(format!("{}/{}", bucket.name, file.name)));
        }
    }
    for (bucket, name) in uploads {
        assert!(seen.contains(&format!("{}/{}", bucket, name)));
    }
}

#[tokio::test]
async fn test_filename_with_nested_bucket() {
    let env = common::setup_store().await;

    let receipt = env
        .uploader
        .upload(Some("photos"), "2024/summer/beach.jpg", b"\xFF\xD8\xFF\xE0")
        .await
        .unwrap();
    assert_eq!(receipt.bucket, "photos/2024/summer");

    let buckets = env.enumerator.list(Some("summer")).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].files[0].name, "beach.jpg");
}

#[tokio::test]
async fn test_list_reflects_modification_time() {
    let env = common::setup_store().await;
    let before = time::OffsetDateTime::now_utc() - time::Duration::minutes(1);

    env.uploader.upload(Some("t"), "f", b"x").await.unwrap();

    let buckets = env.enumerator.list_blocking(None).await.unwrap();
    assert!(buckets[0].files[0].modified_at >= before);
}
