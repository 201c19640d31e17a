//! Answer-reveal state for a generated quiz.
//!
//! Each question moves once from `Unanswered` to `Answered` on the first
//! option click and stays there; the view is derived from that state.

use thiserror::Error;

use crate::model::Question;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("No quiz has been generated")]
    NoQuiz,

    #[error("Question {0} does not exist")]
    NoSuchQuestion(usize),

    #[error("Question {question} has no option {option}")]
    NoSuchOption { question: usize, option: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Answered { chosen: usize },
}

/// Styling applied to one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Answered { correct: bool },
    /// The question was already answered; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCard {
    question: Question,
    correct: Option<usize>,
    state: AnswerState,
}

impl QuestionCard {
    pub fn new(question: Question) -> Self {
        let correct = question.correct_index();
        Self {
            question,
            correct,
            state: AnswerState::Unanswered,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn state(&self) -> AnswerState {
        self.state
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.state, AnswerState::Answered { .. })
    }

    /// Options stop accepting clicks once the question is answered.
    pub fn is_locked(&self) -> bool {
        self.is_answered()
    }

    pub fn mark(&self, option: usize) -> Option<Mark> {
        match self.state {
            AnswerState::Unanswered => None,
            AnswerState::Answered { .. } if Some(option) == self.correct => Some(Mark::Correct),
            AnswerState::Answered { chosen } if chosen == option => Some(Mark::Incorrect),
            AnswerState::Answered { .. } => None,
        }
    }

    fn choose(&mut self, option: usize) -> Transition {
        if self.is_answered() {
            return Transition::Ignored;
        }
        self.state = AnswerState::Answered { chosen: option };
        Transition::Answered {
            correct: Some(option) == self.correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizBoard {
    cards: Vec<QuestionCard>,
}

impl QuizBoard {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            cards: questions.into_iter().map(QuestionCard::new).collect(),
        }
    }

    pub fn cards(&self) -> &[QuestionCard] {
        &self.cards
    }

    pub fn answer(&mut self, question: usize, option: usize) -> Result<Transition, QuizError> {
        let card = self
            .cards
            .get_mut(question)
            .ok_or(QuizError::NoSuchQuestion(question))?;
        if option >= card.question.options.len() {
            return Err(QuizError::NoSuchOption { question, option });
        }
        Ok(card.choose(option))
    }

    pub fn answered(&self) -> usize {
        self.cards.iter().filter(|c| c.is_answered()).count()
    }

    pub fn score(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| match c.state {
                AnswerState::Answered { chosen } => Some(chosen) == c.correct,
                AnswerState::Unanswered => false,
            })
            .count()
    }
}
