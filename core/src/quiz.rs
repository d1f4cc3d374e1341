//! Per-region trivia: question data, answer sheets and scoring.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::api::TestSubmission;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionQuiz {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details_link: Option<String>,
    #[serde(default)]
    pub tests: Vec<Question>,
}

impl RegionQuiz {
    pub fn has_questions(&self) -> bool {
        !self.tests.is_empty()
    }

    pub fn score(&self, answers: &AnswerSheet) -> QuizScore {
        let correct = self
            .tests
            .iter()
            .enumerate()
            .filter(|(idx, q)| answers.selected(*idx) == Some(q.correct_answer))
            .count();
        QuizScore::new(correct as u32, self.tests.len() as u32)
    }
}

/// Question data for every region, keyed by region id.
#[derive(Debug, Clone, Default)]
pub struct QuizBook {
    regions: HashMap<String, RegionQuiz>,
}

impl QuizBook {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let regions = serde_json::from_str(body)?;
        Ok(Self { regions })
    }

    pub fn get(&self, region_id: &str) -> Option<&RegionQuiz> {
        self.regions.get(region_id)
    }
}

/// Option picked per question, by question index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet(BTreeMap<usize, usize>);

impl AnswerSheet {
    pub fn select(&mut self, question: usize, option: usize) {
        self.0.insert(question, option);
    }

    pub fn selected(&self, question: usize) -> Option<usize> {
        self.0.get(&question).copied()
    }

    /// Every question of `quiz` has an answer.
    pub fn is_complete(&self, quiz: &RegionQuiz) -> bool {
        quiz.has_questions() && (0..quiz.tests.len()).all(|q| self.0.contains_key(&q))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
}

impl QuizScore {
    pub fn new(correct: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(correct) * 100.0 / f64::from(total)).round() as u32
        };
        Self {
            correct,
            total,
            percentage,
        }
    }

    pub fn grade(&self) -> Grade {
        match self.percentage {
            90.. => Grade::Excellent,
            70..=89 => Grade::Good,
            50..=69 => Grade::Fair,
            _ => Grade::Poor,
        }
    }

    pub fn submission(&self, region_id: &str, region_name: &str) -> TestSubmission {
        TestSubmission {
            region_id: region_id.to_string(),
            region_name: region_name.to_string(),
            score: self.correct,
            total_questions: self.total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! You know this region very well!",
            Self::Good => "Good! But there is room to grow.",
            Self::Fair => "Not bad, but worth studying a little more.",
            Self::Poor => "Time to get to know this region better.",
        }
    }
}
