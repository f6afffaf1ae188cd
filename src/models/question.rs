use serde::{Deserialize, Serialize};

/// 选项字母（A..E）
pub const OPTION_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

fn default_difficulty() -> String {
    "medio".to_string()
}

/// 一道题目
///
/// 字段名沿用服务端的 JSON 键，同时接受英文别名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "pergunta", alias = "text")]
    pub text: String,
    #[serde(rename = "opcoes", alias = "options")]
    pub options: Vec<String>,
    #[serde(rename = "resposta_correta", alias = "correctAnswer")]
    pub correct_answer: String,
    #[serde(rename = "categoria", alias = "category", default)]
    pub category: String,
    #[serde(
        rename = "dificuldade",
        alias = "difficulty",
        default = "default_difficulty"
    )]
    pub difficulty: String,
    #[serde(
        rename = "explicacao",
        alias = "explanation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
    #[serde(
        rename = "referencia",
        alias = "reference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference: Option<String>,
    #[serde(
        rename = "disciplina",
        alias = "subject",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subject: Option<String>,
    #[serde(
        rename = "topico",
        alias = "topic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub topic: Option<String>,
}

impl Question {
    /// 第 `index` 个选项的字母
    pub fn option_letter(index: usize) -> Option<char> {
        OPTION_LETTERS.get(index).copied()
    }

    /// 字母对应的选项下标（不区分大小写）
    pub fn letter_index(&self, letter: &str) -> Option<usize> {
        let mut chars = letter.trim().chars();
        let c = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() {
            return None;
        }
        OPTION_LETTERS
            .iter()
            .position(|&l| l == c)
            .filter(|&i| i < self.options.len())
    }

    /// 解析正确答案对应的选项下标
    ///
    /// 服务端既可能给出选项原文，也可能给出字母；原文优先。
    pub fn resolve_answer(&self, answer: &str) -> Option<usize> {
        let answer = answer.trim();
        self.options
            .iter()
            .position(|o| o.trim() == answer)
            .or_else(|| self.letter_index(answer))
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.resolve_answer(&self.correct_answer)
    }

    /// 非空的解析说明
    pub fn explanation(&self) -> Option<&str> {
        self.explanation
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// 一轮（题目展示到反馈）的题目数据
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTurn {
    pub question: Question,
    /// 题号，从 1 开始
    pub index: usize,
    pub total: usize,
    /// 当前累计得分
    pub points: i64,
}

/// 获取下一题的结果
#[derive(Debug, Clone, PartialEq)]
pub enum NextQuestion {
    Turn(QuestionTurn),
    EndOfQuiz,
    TimeExpired,
}

/// 提交给服务端的答案
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSubmission {
    /// 所选选项字母
    #[serde(rename = "resposta")]
    pub selection: String,
    #[serde(rename = "resposta_correta")]
    pub correct_answer: String,
    #[serde(rename = "opcoes")]
    pub options: Vec<String>,
    /// 所属题号，用于丢弃过期的响应
    #[serde(skip)]
    pub turn: usize,
    /// 所选选项下标
    #[serde(skip)]
    pub option_index: usize,
}

impl AnswerSubmission {
    pub fn for_turn(turn: &QuestionTurn, option_index: usize) -> Option<Self> {
        let letter = Question::option_letter(option_index)?;
        if option_index >= turn.question.options.len() {
            return None;
        }
        Some(Self {
            selection: letter.to_string(),
            correct_answer: turn.question.correct_answer.clone(),
            options: turn.question.options.clone(),
            turn: turn.index,
            option_index,
        })
    }
}

/// 服务端对答案的判定
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub correct: bool,
    pub correct_answer: String,
    /// 服务端返回的累计得分
    pub points: i64,
    pub explanation: Option<String>,
    /// 是否为最后一题
    pub is_last: bool,
}

/// 提交答案的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Answered(AnswerResult),
    TimeExpired,
}

/// 剩余时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingTime {
    pub minutes: u64,
    pub seconds: u64,
    pub total_seconds: u64,
}

impl RemainingTime {
    pub fn from_total(total_seconds: u64) -> Self {
        Self {
            minutes: total_seconds / 60,
            seconds: total_seconds % 60,
            total_seconds,
        }
    }

    /// `MM:SS`
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// 轮询剩余时间的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStatus {
    Remaining(RemainingTime),
    TimeExpired,
}
