use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melody_learning::{Pipeline, Settings, StudyDocument};

fn completion_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [
            { "message": { "content": content } }
        ]
    }))
}

async fn mock_completion_server(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion_reply(content))
        .mount(&server)
        .await;
    server
}

fn settings_with_completion(uri: &str) -> Settings {
    Settings {
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: uri.to_string(),
        poll_interval: Duration::from_millis(10),
        generation_timeout: Duration::from_secs(2),
        ..Settings::default()
    }
}

#[tokio::test]
async fn without_a_provider_key_the_run_stops_after_the_text_artifacts() {
    let completion = mock_completion_server("extracted study text").await;
    let settings = settings_with_completion(&completion.uri());

    let pipeline = Pipeline::new(settings).unwrap();
    let document = StudyDocument::Image {
        bytes: b"fake image bytes".to_vec(),
        mime: "image/png".to_string(),
    };

    let artifacts = pipeline.run(&document).await.unwrap();

    assert_eq!(artifacts.study_text, "extracted study text");
    assert!(!artifacts.mnemonic_plan.is_empty());
    assert!(artifacts.task.is_none());
    assert!(artifacts.audio_urls.is_empty());
    assert!(artifacts.saved_files.is_empty());
    // The plan has no lyrics section, so the payload fell back to the text.
    assert_eq!(artifacts.payload.lyrics, "extracted study text");
}

#[tokio::test]
async fn a_full_run_generates_and_downloads_audio() {
    let completion = mock_completion_server("photosynthesis notes").await;

    let suno = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "taskId": "task-full" }
        })))
        .mount(&suno)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate/record-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "status": "SUCCESS",
                "response": {
                    "sunoData": [
                        { "id": "t1", "audioUrl": format!("{}/song.mp3", suno.uri()) }
                    ]
                }
            }
        })))
        .mount(&suno)
        .await;
    Mock::given(method("GET"))
        .and(path("/song.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio payload".as_slice()))
        .mount(&suno)
        .await;

    let output_dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        suno_api_key: Some("suno-key".to_string()),
        suno_base_url: suno.uri(),
        output_dir: output_dir.path().to_path_buf(),
        ..settings_with_completion(&completion.uri())
    };

    let pipeline = Pipeline::new(settings).unwrap();
    let document = StudyDocument::Image {
        bytes: b"fake image bytes".to_vec(),
        mime: "image/png".to_string(),
    };

    let artifacts = pipeline.run(&document).await.unwrap();

    let task = artifacts.task.expect("task should be present");
    assert_eq!(task.task_id, "task-full");
    assert_eq!(artifacts.audio_urls.len(), 1);
    assert_eq!(artifacts.saved_files.len(), 1);
    assert_eq!(
        std::fs::read(&artifacts.saved_files[0]).unwrap(),
        b"audio payload".to_vec()
    );
}

#[tokio::test]
async fn a_failing_extraction_aborts_before_any_provider_interaction() {
    let completion = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion_reply(""))
        .mount(&completion)
        .await;

    let suno = MockServer::start().await; // no mounts: any hit would 404

    let settings = Settings {
        suno_api_key: Some("suno-key".to_string()),
        suno_base_url: suno.uri(),
        ..settings_with_completion(&completion.uri())
    };

    let pipeline = Pipeline::new(settings).unwrap();
    let document = StudyDocument::Image {
        bytes: b"unreadable".to_vec(),
        mime: "image/png".to_string(),
    };

    let err = pipeline.run(&document).await.unwrap_err();
    assert!(matches!(err, melody_learning::MelodyError::Extraction { .. }));
    assert_eq!(suno.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn pdf_documents_are_classified_by_magic_bytes() {
    let document = StudyDocument::from_bytes(b"%PDF-1.7 rest".to_vec(), None);
    assert!(matches!(document, StudyDocument::Pdf(_)));

    let document = StudyDocument::from_bytes(b"plain bytes".to_vec(), Some("scan.PDF"));
    assert!(matches!(document, StudyDocument::Pdf(_)));

    let document = StudyDocument::from_bytes(b"plain bytes".to_vec(), Some("photo.jpg"));
    match document {
        StudyDocument::Image { mime, .. } => assert_eq!(mime, "image/jpeg"),
        other => panic!("expected image, got {other:?}"),
    }
}
