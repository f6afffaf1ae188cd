use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::admin::validate_options;
use crate::models::question::Question;

/// 学科 → 主题 → 题目列表
pub type QuestionSet = BTreeMap<String, BTreeMap<String, Vec<Question>>>;

/// 被跳过的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub subject: String,
    pub topic: String,
    /// 在主题中的位置（从 1 开始）
    pub position: usize,
    pub reason: String,
}

/// 加载结果
#[derive(Debug, Clone, Default)]
pub struct LoadedQuestionSet {
    pub questions: QuestionSet,
    pub rejected: Vec<RejectedEntry>,
}

impl LoadedQuestionSet {
    pub fn total(&self) -> usize {
        self.questions
            .values()
            .flat_map(|topics| topics.values())
            .map(Vec::len)
            .sum()
    }

    /// 上传用的 JSON 字节
    pub fn to_json_bytes(&self) -> AppResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.questions)?)
    }
}

/// 从 JSON 或 TOML 文件加载题库
pub async fn load_question_set(path: &Path) -> AppResult<LoadedQuestionSet> {
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(AppError::File(FileError::NotFound { path: path_str }));
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    let raw: Value = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            serde_json::from_str(&content).map_err(|e| parse_failed(&path_str, e))?
        }
        Some("toml") => {
            let table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_failed(&path_str, e))?;
            serde_json::to_value(table)?
        }
        _ => return Err(AppError::File(FileError::UnsupportedFormat { path: path_str })),
    };

    let loaded = parse_question_set(raw, &path_str)?;
    info!(
        "✓ 已加载题库文件 {}: {} 道有效题目, {} 道被跳过",
        path_str,
        loaded.total(),
        loaded.rejected.len()
    );
    Ok(loaded)
}

fn parse_failed(
    path: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> AppError {
    AppError::File(FileError::ParseFailed {
        path: path.to_string(),
        source: Box::new(source),
    })
}

/// 校验 `{学科: {主题: [题目..]}}` 结构，非法条目计入 `rejected`
pub fn parse_question_set(raw: Value, path: &str) -> AppResult<LoadedQuestionSet> {
    let Value::Object(subjects) = raw else {
        return Err(AppError::File(FileError::ParseFailed {
            path: path.to_string(),
            source: "顶层必须是对象".into(),
        }));
    };

    let mut loaded = LoadedQuestionSet::default();
    for (subject, topics) in subjects {
        let Value::Object(topics) = topics else {
            warn!("学科 {} 的内容不是对象，已跳过", subject);
            continue;
        };
        for (topic, entries) in topics {
            let Value::Array(entries) = entries else {
                warn!("主题 {}/{} 的内容不是数组，已跳过", subject, topic);
                continue;
            };
            for (i, entry) in entries.into_iter().enumerate() {
                let reject = |reason: String| RejectedEntry {
                    subject: subject.clone(),
                    topic: topic.clone(),
                    position: i + 1,
                    reason,
                };
                let mut question: Question = match serde_json::from_value(entry) {
                    Ok(q) => q,
                    Err(e) => {
                        loaded.rejected.push(reject(e.to_string()));
                        continue;
                    }
                };
                if let Err(e) = validate_options(&question.options, &question.correct_answer) {
                    loaded.rejected.push(reject(e.to_string()));
                    continue;
                }
                question.subject = Some(subject.clone());
                question.topic = Some(topic.clone());
                loaded
                    .questions
                    .entry(subject.clone())
                    .or_default()
                    .entry(topic.clone())
                    .or_default()
                    .push(question);
            }
        }
    }

    for r in &loaded.rejected {
        warn!(
            "题目 {}/{} #{} 被跳过: {}",
            r.subject, r.topic, r.position, r.reason
        );
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn valid(text: &str) -> Value {
        json!({
            "pergunta": text,
            "opcoes": ["a", "b", "c", "d"],
            "resposta_correta": "c"
        })
    }

    #[test]
    fn counts_valid_and_rejects_invalid_entries() {
        let raw = json!({
            "Matemática": {
                "Frações": [
                    valid("1/2 + 1/2?"),
                    {"pergunta": "sem opções", "opcoes": ["a"], "resposta_correta": "a"},
                    {"pergunta": "sem resposta"}
                ],
                "Geometria": "não é lista"
            },
            "Física": {"Óptica": [valid("luz?")]}
        });
        let loaded = parse_question_set(raw, "set.json").unwrap();
        assert_eq!(loaded.total(), 2);
        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(loaded.rejected[0].position, 2);
        let q = &loaded.questions["Física"]["Óptica"][0];
        assert_eq!(q.subject.as_deref(), Some("Física"));
    }

    #[test]
    fn top_level_array_is_rejected() {
        let err = parse_question_set(json!([1, 2]), "set.json").unwrap_err();
        assert!(matches!(err, AppError::File(FileError::ParseFailed { .. })));
    }

    #[tokio::test]
    async fn loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"[["Química"."Ácidos"]]
pergunta = "pH da água?"
opcoes = ["5", "6", "7", "8"]
resposta_correta = "7"
"#
        )
        .unwrap();

        let loaded = load_question_set(file.path()).await.unwrap();
        assert_eq!(loaded.total(), 1);
        assert!(loaded.to_json_bytes().unwrap().len() > 10);
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let err = load_question_set(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::UnsupportedFormat { .. })));
    }
}
