//! 题库管理端客户端
//!
//! 封装所有 `/admin/*` 接口，登录后依赖 cookie 会话

use std::path::Path;

use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::clients::http::{build_http_client, read_json, send_failed};
use crate::config::Config;
use crate::error::{AppError, AppResult, NetworkError};
use crate::models::admin::{
    BackupInfo, BackupList, Bank, BankStatistics, ClearReport, Empty, Envelope,
    FetchedMainQuestion, FetchedQuestion, MainAddReport, MainQuestionDraft, MainQuestionPage,
    MainQuestionQuery, QuestionDraft, QuestionRef, RemovalReport, RestoreAllReport,
    RestoreReport, SubjectList, TopicMap, UploadReport,
};
use crate::models::loaders::load_question_set;

/// 操作结果：服务端消息 + 附加数据
#[derive(Debug, Clone)]
pub struct AdminReply<T> {
    pub message: String,
    pub data: T,
}

/// 题库管理端客户端
pub struct AdminClient {
    http: reqwest::Client,
    config: Config,
}

impl AdminClient {
    /// 创建新的管理端客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            config: config.clone(),
        })
    }

    /// 登录管理端
    ///
    /// 成功时服务端会跳转到控制台页面，失败时停留在登录页。
    pub async fn login(&self, email: &str, password: &str) -> AppResult<()> {
        let route = "/admin/login";
        let response = self
            .http
            .post(self.config.url(route))
            .form(&[("email", email.trim()), ("password", password)])
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;

        if response.url().path().ends_with("/admin/dashboard") {
            info!("✓ 管理端登录成功: {}", email);
            Ok(())
        } else {
            warn!("⚠️ 管理端登录失败: {}", email);
            Err(AppError::server(route, "登录失败，请检查邮箱和密码"))
        }
    }

    /// 使用配置中的账号登录（未配置时跳过）
    pub async fn login_from_config(&self) -> AppResult<bool> {
        match (&self.config.admin_email, &self.config.admin_password) {
            (Some(email), Some(password)) => {
                self.login(email, password).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ========== 学科 / 主题 ==========

    pub async fn list_subjects(&self) -> AppResult<Vec<String>> {
        let list: SubjectList = self.get("/admin/listar-disciplinas").await?;
        Ok(list.subjects)
    }

    pub async fn list_topics(&self, subject: &str) -> AppResult<TopicMap> {
        self.get(&format!("/admin/listar-topicos/{}", encode_segment(subject)))
            .await
    }

    /// 删除整个学科（服务端会先创建备份）
    pub async fn remove_subject(&self, subject: &str) -> AppResult<AdminReply<RemovalReport>> {
        self.post_envelope("/admin/remover-disciplina", &json!({ "disciplina": subject }))
            .await
    }

    // ========== 题目 ==========

    pub async fn get_question(&self, question_ref: &QuestionRef) -> AppResult<FetchedQuestion> {
        let route = format!(
            "/admin/obter-pergunta/{}/{}/{}",
            encode_segment(&question_ref.subject),
            encode_segment(&question_ref.topic),
            question_ref.index
        );
        self.get(&route).await
    }

    pub async fn add_question(&self, draft: QuestionDraft) -> AppResult<AdminReply<Empty>> {
        let draft = draft.normalized();
        draft.validate()?;
        self.post_envelope("/admin/adicionar-pergunta", &draft).await
    }

    pub async fn edit_question(
        &self,
        question_ref: &QuestionRef,
        draft: QuestionDraft,
    ) -> AppResult<AdminReply<Empty>> {
        let draft = draft.normalized();
        draft.validate()?;

        #[derive(Serialize)]
        struct EditBody<'a> {
            #[serde(flatten)]
            draft: &'a QuestionDraft,
            #[serde(rename = "indice")]
            index: usize,
        }

        let located = QuestionDraft {
            subject: question_ref.subject.clone(),
            topic: question_ref.topic.clone(),
            ..draft
        };
        let body = EditBody {
            draft: &located,
            index: question_ref.index,
        };
        self.post_envelope("/admin/editar-pergunta", &body).await
    }

    pub async fn delete_question(
        &self,
        question_ref: &QuestionRef,
    ) -> AppResult<AdminReply<Empty>> {
        self.post_envelope("/admin/excluir-pergunta", question_ref)
            .await
    }

    /// 上传题库文件（JSON 或 TOML），本地先校验
    pub async fn upload_question_set(&self, path: &Path) -> AppResult<AdminReply<UploadReport>> {
        let loaded = load_question_set(path).await?;
        if loaded.total() == 0 {
            return Err(AppError::server(
                "/admin/upload-perguntas",
                "文件中没有有效题目",
            ));
        }

        let file_name = path
            .file_stem()
            .map(|s| format!("{}.json", s.to_string_lossy()))
            .unwrap_or_else(|| "perguntas.json".to_string());
        let part = multipart::Part::bytes(loaded.to_json_bytes()?)
            .file_name(file_name)
            .mime_str("application/json")
            .map_err(|e| AppError::request_failed("/admin/upload-perguntas", e))?;
        let form = multipart::Form::new().part("file", part);

        let route = "/admin/upload-perguntas";
        let response = self
            .http
            .post(self.config.url(route))
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        let envelope: Envelope<UploadReport> = read_json(response, route).await?;
        into_reply(envelope, route)
    }

    // ========== 主题库 ==========

    /// 分页列出主题库题目，可按学科、学期筛选
    pub async fn list_main_questions(
        &self,
        query: &MainQuestionQuery,
    ) -> AppResult<MainQuestionPage> {
        let route = "/admin/listar-perguntas-principais";
        debug!("GET {} {:?}", route, query);
        let response = self
            .http
            .get(self.config.url(route))
            .query(query)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        read_json(response, route).await
    }

    pub async fn get_main_question(&self, index: usize) -> AppResult<FetchedMainQuestion> {
        self.get(&format!("/admin/obter-pergunta-principal/{}", index))
            .await
    }

    pub async fn add_main_question(
        &self,
        draft: MainQuestionDraft,
    ) -> AppResult<AdminReply<MainAddReport>> {
        let draft = draft.normalized();
        draft.validate()?;
        let reply: AdminReply<MainAddReport> = self
            .post_envelope("/admin/adicionar-pergunta-principal", &draft)
            .await?;
        info!("✓ 主题库新增题目，共 {} 题", reply.data.total);
        Ok(reply)
    }

    pub async fn edit_main_question(
        &self,
        index: usize,
        draft: MainQuestionDraft,
    ) -> AppResult<AdminReply<Empty>> {
        let draft = draft.normalized();
        draft.validate()?;

        #[derive(Serialize)]
        struct EditBody<'a> {
            #[serde(flatten)]
            draft: &'a MainQuestionDraft,
            #[serde(rename = "indice")]
            index: usize,
        }

        let body = EditBody {
            draft: &draft,
            index,
        };
        self.post_envelope("/admin/editar-pergunta-principal", &body)
            .await
    }

    pub async fn delete_main_question(&self, index: usize) -> AppResult<AdminReply<Empty>> {
        self.post_envelope("/admin/excluir-pergunta-principal", &json!({ "indice": index }))
            .await
    }

    /// 删除主题库中的学科；给出学期时只删该学期
    pub async fn remove_main_subject(
        &self,
        subject: &str,
        period: Option<u32>,
    ) -> AppResult<AdminReply<RemovalReport>> {
        let body = match period {
            Some(period) => json!({ "disciplina": subject, "periodo": period }),
            None => json!({ "disciplina": subject }),
        };
        self.post_envelope("/admin/remover-disciplina-principal", &body)
            .await
    }

    pub async fn statistics(&self) -> AppResult<BankStatistics> {
        self.get("/admin/estatisticas").await
    }

    /// 下载主题库到本地文件，返回题目数
    ///
    /// 先确认响应是题目数组再落盘，会话过期时返回的登录页不会覆盖目标文件
    pub async fn export_main_bank(&self, dest: &Path) -> AppResult<usize> {
        let route = "/admin/exportar_banco";
        debug!("GET {}", route);
        let response = self
            .http
            .get(self.config.url(route))
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(NetworkError::BadStatus {
                endpoint: route.to_string(),
                status: status.as_u16(),
            }));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::request_failed(route, e))?;
        let questions: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|e| AppError::decode_failed(route, e))?;

        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| AppError::file_write_failed(dest.display().to_string(), e))?;
        info!("💾 主题库已导出到 {} ({} 题)", dest.display(), questions.len());
        Ok(questions.len())
    }

    // ========== 备份 ==========

    pub async fn list_backups(&self, bank: Bank) -> AppResult<Vec<BackupInfo>> {
        let list: BackupList = self.get(&bank.route("/admin/listar-backups")).await?;
        Ok(list.backups)
    }

    pub async fn restore_backup(
        &self,
        bank: Bank,
        filename: &str,
    ) -> AppResult<AdminReply<RestoreReport>> {
        let route = bank.route("/admin/restaurar-backup");
        self.post_envelope(&route, &json!({ "filename": filename }))
            .await
    }

    pub async fn delete_backup(&self, bank: Bank, filename: &str) -> AppResult<AdminReply<Empty>> {
        let route = bank.route("/admin/excluir-backup");
        self.post_envelope(&route, &json!({ "filename": filename }))
            .await
    }

    pub async fn restore_all_backups(&self, bank: Bank) -> AppResult<AdminReply<RestoreAllReport>> {
        let route = bank.route("/admin/restaurar-todos-backups");
        self.post_envelope(&route, &json!({})).await
    }

    pub async fn clear_all_backups(&self, bank: Bank) -> AppResult<AdminReply<ClearReport>> {
        let route = bank.route("/admin/limpar-todos-backups");
        self.post_envelope(&route, &json!({})).await
    }

    // ========== 辅助函数 ==========

    async fn get<T: DeserializeOwned>(&self, route: &str) -> AppResult<T> {
        debug!("GET {}", route);
        let response = self
            .http
            .get(self.config.url(route))
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        read_json(response, route).await
    }

    async fn post_envelope<B, T>(&self, route: &str, body: &B) -> AppResult<AdminReply<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", route);
        let response = self
            .http
            .post(self.config.url(route))
            .json(body)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        let envelope: Envelope<T> = read_json(response, route).await?;
        into_reply(envelope, route)
    }
}

fn into_reply<T>(envelope: Envelope<T>, route: &str) -> AppResult<AdminReply<T>> {
    if let Some(error) = envelope.error {
        return Err(AppError::server(route, error));
    }
    if !envelope.success {
        return Err(AppError::server(route, "未知错误"));
    }
    Ok(AdminReply {
        message: envelope.message.unwrap_or_default(),
        data: envelope.data,
    })
}

/// 路径段编码（与浏览器的 encodeURIComponent 一致）
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
