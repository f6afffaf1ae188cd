//! 管理端数据结构

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::question::Question;

/// 题库：主题库按学期组织，补考题库按学科 / 主题组织
///
/// 两者的备份接口同名，主题库的路由带 `-principal` 后缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bank {
    #[default]
    Recovery,
    Main,
}

impl Bank {
    /// 按题库换算备份类接口的路由
    pub fn route(self, base: &str) -> String {
        match self {
            Bank::Recovery => base.to_string(),
            Bank::Main => format!("{}-principal", base),
        }
    }
}

/// 管理端统一响应信封 `{sucesso, mensagem, erro}`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "sucesso", alias = "success", default)]
    pub success: bool,
    #[serde(rename = "mensagem", alias = "message", default)]
    pub message: Option<String>,
    #[serde(rename = "erro", alias = "error", default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// 不关心附加字段时使用
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Empty {}

/// 题目定位：学科 / 主题 / 下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    #[serde(rename = "disciplina")]
    pub subject: String,
    #[serde(rename = "topico")]
    pub topic: String,
    #[serde(rename = "indice")]
    pub index: usize,
}

/// 新增或编辑题目时提交的草稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(rename = "disciplina")]
    pub subject: String,
    #[serde(rename = "topico")]
    pub topic: String,
    #[serde(rename = "pergunta")]
    pub text: String,
    #[serde(rename = "opcoes")]
    pub options: Vec<String>,
    #[serde(rename = "resposta_correta")]
    pub correct_answer: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "dificuldade", default)]
    pub difficulty: String,
    #[serde(rename = "explicacao", default)]
    pub explanation: String,
    #[serde(rename = "referencia", default)]
    pub reference: String,
}

impl QuestionDraft {
    /// 去除首尾空白并丢弃空选项
    pub fn normalized(mut self) -> Self {
        self.subject = self.subject.trim().to_string();
        self.topic = self.topic.trim().to_string();
        self.text = self.text.trim().to_string();
        self.options = self
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self.correct_answer = self.correct_answer.trim().to_string();
        self.category = self.category.trim().to_string();
        self.explanation = self.explanation.trim().to_string();
        self.reference = self.reference.trim().to_string();
        if self.difficulty.trim().is_empty() {
            self.difficulty = "medio".to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.is_empty() {
            return Err(ValidationError::MissingField("disciplina"));
        }
        if self.topic.is_empty() {
            return Err(ValidationError::MissingField("topico"));
        }
        if self.text.is_empty() {
            return Err(ValidationError::MissingField("pergunta"));
        }
        if self.correct_answer.is_empty() {
            return Err(ValidationError::MissingField("resposta_correta"));
        }
        validate_options(&self.options, &self.correct_answer)
    }

    /// 从已有题目构造编辑草稿
    pub fn from_question(question: &Question, subject: &str, topic: &str) -> Self {
        Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
            text: question.text.clone(),
            options: question.options.clone(),
            correct_answer: question.correct_answer.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            explanation: question.explanation.clone().unwrap_or_default(),
            reference: question.reference.clone().unwrap_or_default(),
        }
    }
}

/// 4~5 个选项，且正确答案必须是其中之一
pub fn validate_options(options: &[String], correct_answer: &str) -> Result<(), ValidationError> {
    if !(4..=5).contains(&options.len()) {
        return Err(ValidationError::OptionCount(options.len()));
    }
    if !options.iter().any(|o| o == correct_answer) {
        return Err(ValidationError::CorrectAnswerNotInOptions);
    }
    Ok(())
}

/// `listar-disciplinas` 的数据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectList {
    #[serde(rename = "disciplinas", default)]
    pub subjects: Vec<String>,
}

/// 单个主题的题目
#[derive(Debug, Clone, Deserialize)]
pub struct TopicQuestions {
    #[serde(rename = "total_perguntas", default)]
    pub total: usize,
    #[serde(rename = "perguntas", default)]
    pub questions: Vec<Question>,
}

/// 学科下的所有主题
pub type TopicMap = BTreeMap<String, TopicQuestions>;

/// `obter-pergunta` 的数据
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedQuestion {
    #[serde(rename = "pergunta")]
    pub question: Question,
    #[serde(rename = "indice")]
    pub index: usize,
}

/// 备份信息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    #[serde(rename = "disciplina", default)]
    pub subject: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "total_perguntas", default)]
    pub total_questions: usize,
    #[serde(rename = "data_criacao", default)]
    pub created_at: String,
    /// 仅主题库备份带学期
    #[serde(rename = "periodo", default)]
    pub period: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupList {
    #[serde(default)]
    pub backups: Vec<BackupInfo>,
}

/// 恢复单个备份的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreReport {
    #[serde(rename = "disciplina_existente_substituida", default)]
    pub replaced_existing: bool,
    #[serde(rename = "total_perguntas_restauradas", default)]
    pub questions_restored: usize,
    #[serde(rename = "total_topicos_restaurados", default)]
    pub topics_restored: usize,
}

/// 恢复全部备份的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestoreAllReport {
    #[serde(rename = "disciplinas_restauradas", default)]
    pub restored: Vec<String>,
    #[serde(rename = "disciplinas_substituidas", default)]
    pub replaced: Vec<String>,
    #[serde(rename = "total_perguntas_restauradas", default)]
    pub questions_restored: usize,
    /// 恢复前服务端为当前数据做的备份（仅主题库）
    #[serde(rename = "backup_estado_atual", default)]
    pub state_backup: Option<String>,
}

/// 清空备份的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearReport {
    #[serde(rename = "total_backups_removidos", default)]
    pub removed: usize,
    #[serde(rename = "arquivos_removidos", default)]
    pub files: Vec<String>,
    #[serde(rename = "backup_estado_atual", default)]
    pub state_backup: Option<String>,
}

/// 删除学科的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemovalReport {
    #[serde(rename = "backup_criado", default)]
    pub backup: Option<String>,
    #[serde(rename = "total_perguntas_removidas", default)]
    pub questions_removed: usize,
}

/// 上传题库文件的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReport {
    #[serde(rename = "total_perguntas", default)]
    pub imported: usize,
}

// ========== 主题库 ==========

/// 主题库中的题目：普通题目字段加学期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainQuestion {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "periodo", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
}

/// 主题库的题目草稿，按学期与学科定位
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainQuestionDraft {
    #[serde(rename = "disciplina")]
    pub subject: String,
    #[serde(rename = "periodo")]
    pub period: u32,
    #[serde(rename = "pergunta")]
    pub text: String,
    #[serde(rename = "opcoes")]
    pub options: Vec<String>,
    #[serde(rename = "resposta_correta")]
    pub correct_answer: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "dificuldade", default)]
    pub difficulty: String,
    #[serde(rename = "explicacao", default)]
    pub explanation: String,
}

impl MainQuestionDraft {
    pub fn normalized(mut self) -> Self {
        self.subject = self.subject.trim().to_string();
        self.text = self.text.trim().to_string();
        self.options = self
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self.correct_answer = self.correct_answer.trim().to_string();
        self.category = self.category.trim().to_string();
        self.explanation = self.explanation.trim().to_string();
        if self.difficulty.trim().is_empty() {
            self.difficulty = "medio".to_string();
        }
        self
    }

    /// 学期从 1 开始，0 视为未填
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.is_empty() {
            return Err(ValidationError::MissingField("disciplina"));
        }
        if self.period == 0 {
            return Err(ValidationError::MissingField("periodo"));
        }
        if self.text.is_empty() {
            return Err(ValidationError::MissingField("pergunta"));
        }
        if self.correct_answer.is_empty() {
            return Err(ValidationError::MissingField("resposta_correta"));
        }
        validate_options(&self.options, &self.correct_answer)
    }

    pub fn from_question(main: &MainQuestion) -> Self {
        let question = &main.question;
        Self {
            subject: question.subject.clone().unwrap_or_default(),
            period: main.period.unwrap_or_default(),
            text: question.text.clone(),
            options: question.options.clone(),
            correct_answer: question.correct_answer.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            explanation: question.explanation.clone().unwrap_or_default(),
        }
    }
}

/// `obter-pergunta-principal` 的数据
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedMainQuestion {
    #[serde(rename = "pergunta")]
    pub question: MainQuestion,
    #[serde(rename = "indice")]
    pub index: usize,
}

/// 主题库列表的筛选与分页
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainQuestionQuery {
    #[serde(rename = "pagina")]
    pub page: usize,
    #[serde(rename = "por_pagina")]
    pub per_page: usize,
    #[serde(rename = "disciplina", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "periodo", skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
}

impl Default for MainQuestionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            subject: None,
            period: None,
        }
    }
}

/// 主题库的一页题目（无信封）
#[derive(Debug, Clone, Deserialize)]
pub struct MainQuestionPage {
    #[serde(rename = "perguntas", default)]
    pub questions: Vec<MainQuestion>,
    #[serde(default)]
    pub total: usize,
    #[serde(rename = "pagina", default)]
    pub page: usize,
    #[serde(rename = "por_pagina", default)]
    pub per_page: usize,
    #[serde(rename = "total_paginas", default)]
    pub total_pages: usize,
}

impl MainQuestionPage {
    /// 页内第 `offset` 题在整个（筛选后）题库中的下标
    pub fn absolute_index(&self, offset: usize) -> usize {
        self.page.saturating_sub(1) * self.per_page + offset
    }
}

/// 新增主题库题目的结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MainAddReport {
    #[serde(rename = "total_perguntas", default)]
    pub total: usize,
}

/// `estatisticas`：两套题库的概况（无信封）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankStatistics {
    #[serde(rename = "total_perguntas_comum", default)]
    pub main_total: usize,
    #[serde(rename = "perguntas_por_disciplina", default)]
    pub by_subject: BTreeMap<String, usize>,
    #[serde(rename = "perguntas_por_dificuldade", default)]
    pub by_difficulty: BTreeMap<String, usize>,
    #[serde(rename = "perguntas_sem_explicacao", default)]
    pub without_explanation: usize,
    #[serde(rename = "pergunta_mais_longa", default)]
    pub longest: Option<String>,
    #[serde(rename = "pergunta_mais_curta", default)]
    pub shortest: Option<String>,
    #[serde(rename = "total_perguntas_recuperacao", default)]
    pub recovery_total: usize,
    #[serde(rename = "perguntas_por_topico", default)]
    pub by_topic: BTreeMap<String, usize>,
}
