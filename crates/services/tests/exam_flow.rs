use std::sync::Arc;

use ktet_core::model::{EXAM_CATEGORY_LABEL, QuestionBank, UserId};
use ktet_core::time::fixed_now;
use serde_json::json;
use services::{
    BankSource, Clock, FinishReason, QuizService, QuizSettings, ResultReporter, SessionPhase,
    StaticIdentity, settings::DEFAULT_EXAM_SUBJECTS,
};
use storage::repository::{InMemoryRepository, QuizHistoryRepository, SeenQuestionsRepository};

fn exam_bank(per_subject: usize) -> QuestionBank {
    let categories: Vec<_> = DEFAULT_EXAM_SUBJECTS
        .iter()
        .enumerate()
        .map(|(s, name)| {
            let questions: Vec<_> = (0..per_subject)
                .map(|i| {
                    json!({
                        "id": s * 1000 + i,
                        "question": format!("{name} {i}"),
                        "options": ["a", "b", "c", "d"],
                        "correctIndex": 0,
                    })
                })
                .collect();
            json!({ "name": name, "questions": questions })
        })
        .collect();
    QuestionBank::from_json(&json!({ "categories": categories }).to_string()).unwrap()
}

fn exam_service(repo: &InMemoryRepository, settings: QuizSettings) -> QuizService {
    QuizService::new(
        BankSource::File("unused.json".into()),
        settings,
        Arc::new(StaticIdentity::signed_in(UserId::new("candidate"))),
        Arc::new(repo.clone()),
        ResultReporter::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        ),
    )
}

fn short_exam_settings() -> QuizSettings {
    let subjects = DEFAULT_EXAM_SUBJECTS.iter().map(|s| (*s).to_owned()).collect();
    QuizSettings::new(15, subjects, 30, 120, 60).unwrap()
}

#[tokio::test]
async fn overall_timer_ends_the_exam_and_saves_the_result() {
    let repo = InMemoryRepository::new();
    let quiz = exam_service(&repo, short_exam_settings());

    let mut session = quiz.start_exam_with_bank(&exam_bank(40)).unwrap();
    assert_eq!(session.total_questions(), 150);
    assert_eq!(session.phase(), SessionPhase::NotStarted);

    session.start().unwrap();
    session.select_option(0).unwrap();
    let (_, handle) = quiz.advance(&mut session).unwrap();
    assert!(handle.is_none());

    // the second question times out once, then the overall clock runs out
    let (tick, handle) = quiz.tick(&mut session, 500);
    assert!(tick.finished);
    assert_eq!(tick.skipped, 1);
    assert_eq!(session.finish_reason(), Some(FinishReason::TimeExpired));
    assert_eq!(session.timer().unwrap().overall_remaining(), 0);

    let report = handle.expect("exam result is reported").wait().await;
    assert!(report.saved_result_id.is_some());
    assert!(!report.seen_updated);

    let user = UserId::new("candidate");
    let rows = repo.list_results(&user, 5).await.unwrap();
    assert_eq!(rows[0].result.category(), EXAM_CATEGORY_LABEL);
    assert_eq!(rows[0].result.score(), 1);
    assert_eq!(rows[0].result.total(), 150);
    assert!(!rows[0].result.passed());
    assert!(repo.load_seen(&user).await.unwrap().categories_with_progress().is_empty());

    let (tick, handle) = quiz.tick(&mut session, 10);
    assert!(!tick.finished);
    assert!(handle.is_none());
}

#[tokio::test]
async fn short_subject_blocks_the_exam() {
    let repo = InMemoryRepository::new();
    let quiz = exam_service(&repo, QuizSettings::default());

    let err = quiz.start_exam_with_bank(&exam_bank(20)).unwrap_err();
    assert!(matches!(
        err,
        services::SessionError::Assembly(services::AssemblyError::InsufficientQuestions {
            found: 100,
            required: 150,
        })
    ));
}

#[tokio::test]
async fn exam_ignores_ticks_until_started() {
    let repo = InMemoryRepository::new();
    let quiz = exam_service(&repo, short_exam_settings());

    let mut session = quiz.start_exam_with_bank(&exam_bank(30)).unwrap();
    let (tick, handle) = quiz.tick(&mut session, 1_000);
    assert!(!tick.finished);
    assert!(handle.is_none());
    assert_eq!(session.timer().unwrap().overall_remaining(), 120);
}
