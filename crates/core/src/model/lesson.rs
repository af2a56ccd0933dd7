use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson name cannot be empty")]
    EmptyName,

    #[error("lesson must contain at least one question")]
    NoQuestions,

    #[error("question statement cannot be empty")]
    EmptyStatement,

    #[error("question must offer at least two choices, got {len}")]
    TooFewChoices { len: usize },

    #[error("choice {index} cannot be empty")]
    EmptyChoice { index: usize },

    #[error("answer index {answer_index} is out of range for {len} choices")]
    AnswerIndexOutOfRange { answer_index: usize, len: usize },

    #[error("question {index}: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: Box<LessonError>,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    statement: String,
    choices: Vec<String>,
    answer_index: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyStatement` if the statement is blank.
    /// Returns `LessonError::TooFewChoices` if fewer than two choices are given.
    /// Returns `LessonError::EmptyChoice` if any choice is blank.
    /// Returns `LessonError::AnswerIndexOutOfRange` if `answer_index` does not address a choice.
    pub fn new(
        statement: impl Into<String>,
        choices: Vec<String>,
        answer_index: usize,
    ) -> Result<Self, LessonError> {
        let statement = statement.into();
        if statement.trim().is_empty() {
            return Err(LessonError::EmptyStatement);
        }
        if choices.len() < 2 {
            return Err(LessonError::TooFewChoices { len: choices.len() });
        }
        if let Some(index) = choices.iter().position(|c| c.trim().is_empty()) {
            return Err(LessonError::EmptyChoice { index });
        }
        if answer_index >= choices.len() {
            return Err(LessonError::AnswerIndexOutOfRange {
                answer_index,
                len: choices.len(),
            });
        }

        Ok(Self {
            statement,
            choices,
            answer_index,
        })
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    /// Returns true if `choice` is the correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// An immutable quiz: metadata, reward points and an ordered list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    name: String,
    description: String,
    points: u32,
    questions: Vec<Question>,
}

impl Lesson {
    /// Creates a validated lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyName` if the name is blank.
    /// Returns `LessonError::NoQuestions` if `questions` is empty.
    pub fn new(
        id: LessonId,
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        questions: Vec<Question>,
    ) -> Result<Self, LessonError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(LessonError::EmptyName);
        }
        if questions.is_empty() {
            return Err(LessonError::NoQuestions);
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            description: description.into(),
            points,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Points granted for a rewarded completion.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Number of questions; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it appears in lesson JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub statement: String,
    pub choices: Vec<String>,
    pub answer_index: usize,
}

/// Unvalidated lesson as it appears in lesson JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: LessonId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: u32,
    pub questions: Vec<QuestionDraft>,
}

impl LessonDraft {
    /// Validate the draft into a `Lesson`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidQuestion` wrapping the first failing question,
    /// or any lesson-level `LessonError`.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, q)| {
                Question::new(q.statement, q.choices, q.answer_index).map_err(|err| {
                    LessonError::InvalidQuestion {
                        index,
                        source: Box::new(err),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Lesson::new(self.id, self.name, self.description, self.points, questions)
    }
}

impl From<&Lesson> for LessonDraft {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id(),
            name: lesson.name().to_owned(),
            description: lesson.description().to_owned(),
            points: lesson.points(),
            questions: lesson
                .questions()
                .iter()
                .map(|q| QuestionDraft {
                    statement: q.statement().to_owned(),
                    choices: q.choices().to_vec(),
                    answer_index: q.answer_index(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = Question::new("2 + 2?", choices(&["3", "4"]), 2).unwrap_err();
        assert_eq!(
            err,
            LessonError::AnswerIndexOutOfRange {
                answer_index: 2,
                len: 2
            }
        );
    }

    #[test]
    fn question_requires_two_choices() {
        let err = Question::new("Only one?", choices(&["yes"]), 0).unwrap_err();
        assert_eq!(err, LessonError::TooFewChoices { len: 1 });
    }

    #[test]
    fn question_rejects_blank_choice() {
        let err = Question::new("Pick", choices(&["a", "  "]), 0).unwrap_err();
        assert_eq!(err, LessonError::EmptyChoice { index: 1 });
    }

    #[test]
    fn lesson_requires_questions_and_name() {
        let err = Lesson::new(LessonId::new(1), "Budgeting", "", 10, Vec::new()).unwrap_err();
        assert_eq!(err, LessonError::NoQuestions);

        let q = Question::new("Q", choices(&["a", "b"]), 0).unwrap();
        let err = Lesson::new(LessonId::new(1), "   ", "", 10, vec![q]).unwrap_err();
        assert_eq!(err, LessonError::EmptyName);
    }

    #[test]
    fn draft_parses_camel_case_fields_and_validates() {
        let draft = LessonDraft {
            id: LessonId::new(3),
            name: "Saving 101".into(),
            description: "Basics".into(),
            points: 50,
            questions: vec![QuestionDraft {
                statement: "What is an emergency fund?".into(),
                choices: choices(&["Savings for surprises", "A loan"]),
                answer_index: 0,
            }],
        };

        let lesson = draft.clone().validate().unwrap();
        assert_eq!(lesson.len(), 1);
        assert_eq!(lesson.points(), 50);
        assert!(lesson.question(0).unwrap().is_correct(0));
        assert_eq!(LessonDraft::from(&lesson), draft);
    }

    #[test]
    fn draft_reports_failing_question_index() {
        let draft = LessonDraft {
            id: LessonId::new(3),
            name: "Broken".into(),
            description: String::new(),
            points: 0,
            questions: vec![
                QuestionDraft {
                    statement: "ok".into(),
                    choices: choices(&["a", "b"]),
                    answer_index: 1,
                },
                QuestionDraft {
                    statement: "bad".into(),
                    choices: choices(&["a", "b"]),
                    answer_index: 5,
                },
            ],
        };

        let err = draft.validate().unwrap_err();
        assert!(matches!(err, LessonError::InvalidQuestion { index: 1, .. }));
    }
}
