use std::fmt::Write as _;

use quiz_core::model::Lesson;
use services::{ChoiceState, ChoiceView, Notice, QuizView, Severity};

/// Text for one quiz screen, without the input prompt.
pub fn screen(view: &QuizView) -> String {
    let mut out = String::new();
    match view {
        QuizView::Intro {
            name,
            description,
            points,
        } => {
            let _ = writeln!(out, "== {name} ==");
            if !description.is_empty() {
                let _ = writeln!(out, "{description}");
            }
            let _ = writeln!(out, "Complete this lesson to earn {points} points.");
        }
        QuizView::Question {
            number,
            total,
            statement,
            choices,
            ..
        } => {
            let _ = writeln!(out, "Question {number}/{total}");
            let _ = writeln!(out, "{statement}");
            for (index, choice) in choices.iter().enumerate() {
                let _ = writeln!(out, "  {}) {}{}", index + 1, choice.text, marker(choice));
            }
        }
        QuizView::Passed { points } => {
            let _ = writeln!(out, "You've passed!");
            let _ = writeln!(out, "Congratulations! You have earned {points} points!");
        }
        QuizView::Failed { correct, total } => {
            let _ = writeln!(out, "You've failed!");
            let _ = writeln!(out, "You answered {correct} of {total} correctly.");
            let _ = writeln!(out, "Keep going! It is never too late to give up!");
        }
        QuizView::Unclassified { correct, total } => {
            let _ = writeln!(out, "Quiz finished.");
            let _ = writeln!(out, "You answered {correct} of {total} correctly.");
        }
    }
    out
}

fn marker(choice: &ChoiceView) -> &'static str {
    match (choice.state, choice.selected) {
        (ChoiceState::Neutral, _) => "",
        (ChoiceState::Correct, true) => "  [correct, your answer]",
        (ChoiceState::Correct, false) => "  [correct]",
        (ChoiceState::Incorrect, true) => "  [wrong, your answer]",
        (ChoiceState::Incorrect, false) => "",
    }
}

/// Prompt shown under a screen, or `None` while input is disabled.
pub fn prompt(view: &QuizView) -> Option<String> {
    match view {
        QuizView::Intro { .. } => Some("[s]tart, [q]uit > ".into()),
        QuizView::Question {
            revealing: true, ..
        } => None,
        QuizView::Question { choices, .. } => Some(format!("choice 1-{}, [q]uit > ", choices.len())),
        view if view.offers_retry() => Some("[r]etry, [q]uit > ".into()),
        _ => Some("[q]uit > ".into()),
    }
}

pub fn notice(notice: &Notice) -> String {
    match notice.severity {
        Severity::Info => format!("* {}", notice.message),
        Severity::Error => format!("! {}", notice.message),
    }
}

pub fn lesson_line(lesson: &Lesson) -> String {
    format!(
        "{:>4}  {}  ({} questions, {} points)",
        lesson.id(),
        lesson.name(),
        lesson.len(),
        lesson.points()
    )
}
