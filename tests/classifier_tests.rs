use selfstate_etl::classify::{ClassifierSettings, DetectorSettings};
use selfstate_etl::domain::settings::ModelKind;
use selfstate_etl::{EtlEngine, EvidencePipeline, LocalStorage, RunConfig, TimelineReader};
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_corpus(dir: &TempDir) {
    let corpus = json!({
        "adaptive-state": [
            "I reached out to a friend and felt better",
            "Going for a run helped me feel calm",
            "I am learning to be kind to myself",
            "Therapy is helping me cope",
            "I felt hopeful after talking to my mom"
        ],
        "maladaptive-state": [
            "I can't stop crying and I feel worthless",
            "I want to give up on everything",
            "Nobody cares if I disappear",
            "I feel worthless and alone",
            "I want to disappear forever"
        ],
        "neither-state": [
            "My exam is on Tuesday",
            "The train was delayed again"
        ]
    });
    std::fs::write(dir.path().join("train.json"), corpus.to_string()).unwrap();
}

fn write_predict(dir: &TempDir) {
    let timelines = json!([
        {
            "timeline_id": "tl_1",
            "posts": [
                {"post_id": "a", "post": "Therapy is helping me cope. I feel worthless and alone!"},
                {"post_id": "b", "post": "My exam is on Tuesday."}
            ]
        },
        {"timeline_id": "tl_2", "posts": []}
    ]);
    std::fs::write(dir.path().join("predict.json"), timelines.to_string()).unwrap();
}

fn settings(dir: &TempDir) -> ClassifierSettings {
    ClassifierSettings {
        training_path: dir.path().join("train.json").to_string_lossy().into_owned(),
        input_path: dir.path().join("predict.json").to_string_lossy().into_owned(),
        output_path: dir.path().join("out").to_string_lossy().into_owned(),
        noise_std: 0.0,
        maladaptive: DetectorSettings {
            model: ModelKind::Logistic,
            vote_rounds: 1,
        },
        ..ClassifierSettings::default()
    }
}

fn engine(dir: &TempDir, settings: ClassifierSettings) -> EtlEngine<EvidencePipeline<LocalStorage>> {
    let output = LocalStorage::new(settings.output_path.clone());
    let pipeline = EvidencePipeline::new(
        LocalStorage::new(dir.path().to_string_lossy().into_owned()),
        "train.json",
        TimelineReader::for_path(&settings.input_path),
        output,
        settings,
    );
    EtlEngine::new(pipeline)
}

#[tokio::test]
async fn test_classifier_run_writes_submission() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    write_predict(&dir);

    let output_path = engine(&dir, settings(&dir)).run().await.unwrap();

    assert!(output_path.ends_with("test_submission.json"));
    let text = std::fs::read_to_string(&output_path).unwrap();
    let submission: Value = serde_json::from_str(&text).unwrap();

    let a = &submission["tl_1"]["post_level"]["a"];
    assert_eq!(a["adaptive_evidence"], json!(["Therapy is helping me cope."]));
    assert_eq!(a["maladaptive_evidence"], json!(["I feel worthless and alone!"]));
    assert_eq!(a["summary"], "");
    assert_eq!(a["well-being score"], 1);
    assert_eq!(submission["tl_1"]["timeline_level"]["summary"], "");
    assert_eq!(submission["tl_2"]["post_level"], json!({}));
}

#[tokio::test]
async fn test_classifier_settings_from_toml() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    write_predict(&dir);

    let config = RunConfig::from_toml_str(&format!(
        r#"
[classifier]
output_path = "{}"
output_file = "custom.json"
noise_std = 0.0
wellbeing_score = 4

[classifier.maladaptive]
model = "logistic"
vote_rounds = 3
"#,
        dir.path().join("out").to_string_lossy().replace('\\', "/")
    ))
    .unwrap();
    let mut settings = config.classifier_settings();
    settings.input_path = dir.path().join("predict.json").to_string_lossy().into_owned();
    assert_eq!(settings.maladaptive.vote_rounds, 3);
    assert_eq!(settings.adaptive.model, ModelKind::Logistic);

    let output_path = engine(&dir, settings).run().await.unwrap();

    assert!(output_path.ends_with("custom.json"));
    let submission: Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(submission["tl_1"]["post_level"]["b"]["well-being score"], 4);
}
