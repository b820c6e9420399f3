use std::error::Error;
use std::future::Future;
use std::time::Duration;

use ktet_core::format::{format_clock, format_exam_clock};
use ktet_core::scoring::PASS_MARK;
use services::ai::{ExplanationRequest, ExplanationService};
use services::{
    FinishReason, PersistenceHandle, QuizService, QuizSession, SelectOutcome, SessionError,
    SessionPhase,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Drive `session` from stdin until it finishes, then show the result.
///
/// A one-second ticker feeds the exam timers; standard sessions ignore it.
/// Closing stdin abandons the session.
pub async fn run_session(
    quiz: &QuizService,
    explanations: &ExplanationService,
    session: QuizSession,
) -> Result<(), Box<dyn Error>> {
    let input = BufReader::new(tokio::io::stdin()).lines();
    let service = explanations.clone();
    let explain = move |request: ExplanationRequest| {
        let service = service.clone();
        async move { service.explain_or_fallback(&request).await }
    };

    let (session, pending) = drive(quiz, session, input, explanations.enabled(), explain).await?;
    render_result(&session);

    if let Some(handle) = pending {
        let report = handle.wait().await;
        if report.saved_result_id.is_some() {
            println!("Result saved to your history.");
        }
        for err in &report.errors {
            tracing::warn!("{err}");
        }
    }
    Ok(())
}

/// What the loop has to do after one line of input.
enum Reaction {
    Nothing,
    Persist(PersistenceHandle),
    Explain(ExplanationRequest),
}

/// The session loop proper. Explanations run as their own task so the exam
/// countdown keeps ticking while the model answers.
async fn drive<R, F, Fut>(
    quiz: &QuizService,
    mut session: QuizSession,
    mut input: Lines<R>,
    can_explain: bool,
    explain: F,
) -> Result<(QuizSession, Option<PersistenceHandle>), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    F: Fn(ExplanationRequest) -> Fut,
    Fut: Future<Output = String> + Send + 'static,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let mut pending: Option<PersistenceHandle> = None;
    let mut explaining: Option<JoinHandle<String>> = None;
    let mut shown: Option<usize> = None;

    if session.phase() == SessionPhase::NotStarted {
        render_exam_intro(quiz, &session);
    }

    while !session.is_finished() {
        if session.phase() == SessionPhase::AwaitingAnswer
            && shown != Some(session.current_index())
        {
            render_question(&session);
            shown = Some(session.current_index());
        }

        tokio::select! {
            _ = ticker.tick() => {
                let (tick, handle) = quiz.tick(&mut session, 1);
                if tick.skipped > 0 && !session.is_finished() {
                    println!("\nTime's up for that question. Moving on.");
                }
                pending = pending.or(handle);
            }
            joined = join_explanation(&mut explaining) => {
                explaining = None;
                match joined {
                    Ok(html) => println!("\n{}\n", html_to_text(&html)),
                    Err(err) => tracing::warn!("explanation task failed: {err}"),
                }
                if session.phase() == SessionPhase::ShowingFeedback {
                    println!("Press Enter to continue.");
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    session.finish()?;
                    break;
                };
                match handle_input(quiz, &mut session, line.trim(), can_explain)? {
                    Reaction::Nothing => {}
                    Reaction::Persist(handle) => pending = pending.or(Some(handle)),
                    Reaction::Explain(_) if explaining.is_some() => {
                        println!("Still waiting for the Guru...");
                    }
                    Reaction::Explain(request) => {
                        println!("Asking the Guru...");
                        explaining = Some(tokio::spawn(explain(request)));
                    }
                }
            }
        }
    }

    if let Some(task) = explaining {
        task.abort();
    }
    Ok((session, pending))
}

/// Resolve with the running explanation, or never when none is running.
async fn join_explanation(task: &mut Option<JoinHandle<String>>) -> Result<String, JoinError> {
    match task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn handle_input(
    quiz: &QuizService,
    session: &mut QuizSession,
    input: &str,
    can_explain: bool,
) -> Result<Reaction, SessionError> {
    if input.eq_ignore_ascii_case("q") {
        session.finish()?;
        return Ok(Reaction::Nothing);
    }

    match session.phase() {
        SessionPhase::NotStarted => {
            session.start()?;
            Ok(Reaction::Nothing)
        }
        SessionPhase::AwaitingAnswer => {
            let Some(index) = parse_choice(input) else {
                println!("Enter 1-4 (or a-d), or q to quit.");
                return Ok(Reaction::Nothing);
            };
            if let SelectOutcome::Recorded { correct } = session.select_option(index)? {
                render_feedback(session, correct, can_explain);
            }
            Ok(Reaction::Nothing)
        }
        SessionPhase::ShowingFeedback if input == "?" => {
            let request = session
                .current_question()
                .zip(session.selected_option())
                .and_then(|(question, selected)| ExplanationRequest::for_answer(question, selected));
            match request {
                Some(request) if can_explain => Ok(Reaction::Explain(request)),
                _ => {
                    println!("Press Enter to continue.");
                    Ok(Reaction::Nothing)
                }
            }
        }
        SessionPhase::ShowingFeedback => {
            let (_, handle) = quiz.advance(session)?;
            Ok(handle.map_or(Reaction::Nothing, Reaction::Persist))
        }
        SessionPhase::Finished => Ok(Reaction::Nothing),
    }
}

fn parse_choice(input: &str) -> Option<usize> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "a" => Some(0),
        "2" | "b" => Some(1),
        "3" | "c" => Some(2),
        "4" | "d" => Some(3),
        _ => None,
    }
}

fn render_exam_intro(quiz: &QuizService, session: &QuizSession) {
    let settings = quiz.settings();
    println!("== Exam Day Experience ==");
    println!(
        "{} questions from {} subjects. Time allowed: {}.",
        session.total_questions(),
        settings.exam_subjects().len(),
        format_exam_clock(settings.exam_duration_secs())
    );
    println!(
        "Each question has {} seconds. Press Enter to begin, q to leave.",
        settings.question_duration_secs()
    );
}

fn render_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();

    println!();
    match session.timer() {
        Some(timer) => println!(
            "Question {}/{}   [exam {} | question {}]",
            progress.position,
            progress.total,
            format_clock(timer.overall_remaining()),
            format_clock(timer.question_remaining())
        ),
        None => println!(
            "Question {}/{}   score {}",
            progress.position, progress.total, progress.score
        ),
    }
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn render_feedback(session: &QuizSession, correct: bool, can_explain: bool) {
    let Some(question) = session.current_question() else {
        return;
    };
    if correct {
        println!("Correct!");
    } else {
        println!("Not quite. The answer is: {}", question.correct_option());
    }
    if !question.explanation().is_empty() {
        println!("{}", question.explanation());
    }
    if !correct && can_explain {
        println!("Type ? to ask the Guru why, or press Enter to continue.");
    } else {
        println!("Press Enter to continue.");
    }
}

fn render_result(session: &QuizSession) {
    let Some(outcome) = session.outcome() else {
        println!("\nSession abandoned. Nothing was saved.");
        return;
    };

    println!();
    if outcome.reason == FinishReason::TimeExpired {
        println!("Time is up!");
    }
    println!("== {} ==", outcome.category);
    println!(
        "Score: {}/{} ({}%)",
        outcome.score, outcome.total, outcome.grade.percentage
    );
    if outcome.grade.passed {
        println!("Passed. Well done!");
    } else {
        println!("Below the {PASS_MARK}% pass mark. Keep practicing.");
    }
}

/// Flatten the sanitized explanation HTML for the terminal.
fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag.trim_start_matches('/').to_ascii_lowercase();
                if ["p", "div", "li", "br"]
                    .iter()
                    .any(|block| name.split_whitespace().next() == Some(*block))
                    && !out.ends_with('\n')
                {
                    out.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }

    let text = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
