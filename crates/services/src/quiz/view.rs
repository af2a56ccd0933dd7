use quiz_core::model::Lesson;
use quiz_core::{QuizOutcome, QuizPhase, QuizSession};

/// How a choice should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceState {
    /// No answer is being revealed.
    Neutral,
    /// The right answer, shown during reveal.
    Correct,
    /// Any other choice, shown during reveal.
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub text: String,
    pub state: ChoiceState,
    /// The choice the user submitted for the question being revealed.
    pub selected: bool,
}

/// What the quiz screen should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizView {
    Intro {
        name: String,
        description: String,
        points: u32,
    },
    Question {
        /// 1-based position of the question.
        number: usize,
        total: usize,
        statement: String,
        choices: Vec<ChoiceView>,
        /// Choices are disabled while revealing.
        revealing: bool,
    },
    Passed {
        points: u32,
    },
    Failed {
        correct: usize,
        total: usize,
    },
    /// Fallback for an ended attempt that is neither passed nor failed.
    Unclassified {
        correct: usize,
        total: usize,
    },
}

impl QuizView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let lesson = session.lesson();
        match session.phase() {
            QuizPhase::Start => intro(lesson),
            QuizPhase::Questions => {
                let Some(question) = session.current_question() else {
                    return intro(lesson);
                };
                let revealing = session.revealing();
                let choices = question
                    .choices()
                    .iter()
                    .enumerate()
                    .map(|(index, text)| ChoiceView {
                        text: text.clone(),
                        state: match (revealing, question.is_correct(index)) {
                            (false, _) => ChoiceState::Neutral,
                            (true, true) => ChoiceState::Correct,
                            (true, false) => ChoiceState::Incorrect,
                        },
                        selected: revealing && session.selected() == Some(index),
                    })
                    .collect();

                Self::Question {
                    number: session.question_index() + 1,
                    total: session.total_questions(),
                    statement: question.statement().to_owned(),
                    choices,
                    revealing,
                }
            }
            QuizPhase::End => {
                let correct = session.correct_count();
                let total = session.total_questions();
                match QuizOutcome::classify(correct, total) {
                    QuizOutcome::Pass => Self::Passed {
                        points: lesson.points(),
                    },
                    QuizOutcome::Fail => Self::Failed { correct, total },
                    QuizOutcome::Unclassified => Self::Unclassified { correct, total },
                }
            }
        }
    }

    /// Whether the screen offers "try again".
    #[must_use]
    pub fn offers_retry(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Unclassified { .. })
    }
}

fn intro(lesson: &Lesson) -> QuizView {
    QuizView::Intro {
        name: lesson.name().to_owned(),
        description: lesson.description().to_owned(),
        points: lesson.points(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{LessonId, Question};
    use std::sync::Arc;

    fn session(n: usize) -> QuizSession {
        let questions = (0..n)
            .map(|i| {
                Question::new(
                    format!("Q{}", i + 1),
                    vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    1,
                )
                .unwrap()
            })
            .collect();
        let lesson = Lesson::new(LessonId::new(1), "Taxes", "Intro", 15, questions).unwrap();
        QuizSession::new(Arc::new(lesson))
    }

    fn finish(session: &mut QuizSession, choices: &[usize]) {
        session.begin().unwrap();
        for &choice in choices {
            let feedback = session.answer(choice).unwrap();
            session.advance(feedback.attempt).unwrap();
        }
    }

    #[test]
    fn start_shows_intro() {
        let view = QuizView::from_session(&session(2));
        assert_eq!(
            view,
            QuizView::Intro {
                name: "Taxes".into(),
                description: "Intro".into(),
                points: 15,
            }
        );
        assert!(!view.offers_retry());
    }

    #[test]
    fn question_choices_are_neutral_before_answer() {
        let mut s = session(2);
        s.begin().unwrap();
        let QuizView::Question {
            number,
            total,
            choices,
            revealing,
            ..
        } = QuizView::from_session(&s)
        else {
            panic!("expected question view");
        };
        assert_eq!((number, total, revealing), (1, 2, false));
        assert!(choices.iter().all(|c| c.state == ChoiceState::Neutral && !c.selected));
    }

    #[test]
    fn reveal_distinguishes_selected_wrong_choice_and_true_answer() {
        let mut s = session(2);
        s.begin().unwrap();
        s.answer(2).unwrap();

        let QuizView::Question { choices, revealing, .. } = QuizView::from_session(&s) else {
            panic!("expected question view");
        };
        assert!(revealing);
        let states: Vec<(ChoiceState, bool)> = choices.iter().map(|c| (c.state, c.selected)).collect();
        assert_eq!(
            states,
            vec![
                (ChoiceState::Incorrect, false),
                (ChoiceState::Correct, false),
                (ChoiceState::Incorrect, true),
            ]
        );
    }

    #[test]
    fn end_screens_follow_outcome() {
        let mut s = session(3);
        finish(&mut s, &[1, 1, 1]);
        assert_eq!(QuizView::from_session(&s), QuizView::Passed { points: 15 });

        let mut s = session(3);
        finish(&mut s, &[0, 0, 1]);
        let view = QuizView::from_session(&s);
        assert_eq!(view, QuizView::Failed { correct: 1, total: 3 });
        assert!(view.offers_retry());

        let mut s = session(3);
        finish(&mut s, &[1, 1, 0]);
        let view = QuizView::from_session(&s);
        assert_eq!(view, QuizView::Unclassified { correct: 2, total: 3 });
        assert!(view.offers_retry());
    }
}
