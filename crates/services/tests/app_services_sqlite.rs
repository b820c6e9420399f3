use std::sync::Arc;

use ktet_core::model::UserId;
use serde_json::json;
use services::ai::ChatClient;
use services::{
    AppServices, BankSource, Clock, Identity, QuizSettings, SeededShuffle, StaticIdentity,
};
use storage::repository::Storage;

fn bank_file(name: &str) -> std::path::PathBuf {
    let questions: Vec<_> = (0..6)
        .map(|i| {
            json!({
                "id": i,
                "question": format!("Mathematics question {i}"),
                "options": ["1", "2", "3", "4"],
                "correctIndex": 3,
            })
        })
        .collect();
    let bank = json!({ "categories": [ { "name": "Mathematics", "questions": questions } ] });
    let path = std::env::temp_dir().join(format!("ktet-{name}-{}.json", std::process::id()));
    std::fs::write(&path, bank.to_string()).unwrap();
    path
}

#[tokio::test]
async fn sqlite_backed_services_record_progress() {
    let path = bank_file("app-sqlite");
    let user = UserId::new("sqlite-learner");
    let app = AppServices::new_sqlite(
        "sqlite:file:memdb_app_services?mode=memory&cache=shared",
        path.to_str().unwrap(),
        Clock::default(),
        QuizSettings::default(),
        Arc::new(StaticIdentity::signed_in(user.clone())),
    )
    .await
    .unwrap()
    .with_shuffle(Arc::new(SeededShuffle::new(42)));

    let quiz = app.quiz();
    let mut session = quiz.start_standard("Mathematics").await.unwrap();
    assert_eq!(session.total_questions(), 6);

    let mut handle = None;
    for answer in [3, 3, 3, 0, 0, 3] {
        session.select_option(answer).unwrap();
        let (_, finished) = quiz.advance(&mut session).unwrap();
        handle = handle.or(finished);
    }
    assert!(handle.unwrap().wait().await.is_clean());

    let progress = app.progress();
    let stats = progress.dashboard(&user).await.unwrap();
    assert_eq!(stats.total_quizzes, 1);
    assert_eq!(stats.average_score, 67);
    assert_eq!(stats.study_time(), "30m");

    let seen = progress.resettable_categories(&user).await.unwrap();
    assert_eq!(seen[0].seen_count, 6);
    assert_eq!(progress.reset_category(&user, "Mathematics").await.unwrap(), 6);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn in_memory_services_start_anonymous_quizzes() {
    let path = bank_file("app-memory");
    let app = AppServices::from_storage(
        &Storage::in_memory(),
        BankSource::File(path.clone()),
        Clock::default(),
        QuizSettings::default(),
        Arc::new(StaticIdentity::anonymous()),
        ChatClient::new(None),
    );

    assert!(app.identity().current_user_id().is_none());
    assert!(!app.explanations().enabled());
    let session = app.quiz().start_standard("Mathematics").await.unwrap();
    assert_eq!(session.total_questions(), 6);

    std::fs::remove_file(&path).ok();
}
