//! `adapt quiz`: a timed quiz over stdin. The countdown keeps running while
//! the prompt waits; running out of time ends the quiz mid-question.

use adapt_core::model::{QuizId, UserId};
use adapt_core::quiz::{FinishReason, SessionPhase};
use anyhow::{Context, Result};
use services::{AppServices, QuestionView, QuizController, QuizControllerError, SessionSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choose(usize),
    Quit,
    Invalid,
}

fn parse_input(raw: &str, options: usize) -> Input {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("q") || raw.eq_ignore_ascii_case("quit") {
        return Input::Quit;
    }
    match raw.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Input::Choose(n - 1),
        _ => Input::Invalid,
    }
}

pub async fn execute(services: &AppServices, user: UserId, quiz: QuizId) -> Result<()> {
    let controller = services
        .quiz_sessions()
        .start(user, quiz)
        .await
        .with_context(|| format!("starting quiz {quiz}"))?;

    let first = controller.snapshot();
    if first.phase == SessionPhase::Active {
        println!(
            "{} questions, {} seconds. Answer with the option number, `q` to quit.",
            first.progress.total, first.progress.remaining_secs
        );
    }

    drive(&controller).await?;
    let settled = controller.wait_settled().await;
    print_outcome(&settled);
    Ok(())
}

async fn drive(controller: &QuizController) -> Result<()> {
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Option<usize> = None;

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.phase.is_terminal() {
            return Ok(());
        }
        let Some(question) = snapshot.question else {
            return Ok(());
        };
        if shown != Some(question.number) {
            print_question(&question, snapshot.progress.total, snapshot.progress.remaining_secs);
            shown = Some(question.number);
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading answer")? else {
                    return quit(controller);
                };
                match parse_input(&line, question.options.len()) {
                    Input::Choose(index) => answer(controller, index)?,
                    Input::Quit => return quit(controller),
                    Input::Invalid => {
                        println!("Enter a number from 1 to {}.", question.options.len());
                    }
                }
            }
        }
    }
}

/// Time may run out between prompt and answer; the session then rejects the
/// input and the loop sees the finished state.
fn answer(controller: &QuizController, index: usize) -> Result<()> {
    let outcome = controller
        .select_option(index)
        .and_then(|_| controller.advance());
    match outcome {
        Ok(_) => Ok(()),
        Err(QuizControllerError::Session(err)) => {
            tracing::debug!(error = %err, "answer rejected");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Cancels unless time already ran out.
fn quit(controller: &QuizController) -> Result<()> {
    match controller.cancel() {
        Ok(_) | Err(QuizControllerError::Session(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn print_question(question: &QuestionView, total: usize, remaining_secs: u32) {
    println!(
        "\n[{}/{}] {} ({}s left)",
        question.number, total, question.text, remaining_secs
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_outcome(snapshot: &SessionSnapshot) {
    match snapshot.phase {
        SessionPhase::Cancelled => println!("Quiz cancelled. Nothing was recorded."),
        SessionPhase::Unavailable => println!("This quiz has no questions yet."),
        _ => {
            let Some(result) = &snapshot.result else {
                return;
            };
            if result.finish_reason == FinishReason::TimeExpired {
                println!("\nTime is up.");
            }
            println!(
                "\nScore: {:.1}% ({}/{} correct, {} points) in {}s",
                result.score_percentage.value(),
                result.correct_count(),
                result.question_count,
                result.points,
                result.time_spent_secs
            );
            let feedback = snapshot
                .submission
                .feedback()
                .unwrap_or_else(|| result.feedback.message());
            println!("{feedback}");
        }
    }
}
