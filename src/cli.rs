use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::admin::{
    Bank, MainQuestionDraft, MainQuestionQuery, QuestionDraft, QuestionRef,
};

#[derive(Parser, Debug)]
#[command(
    name = "quiz-client",
    version,
    about = "Cliente de quiz e administração do banco de perguntas"
)]
pub struct Cli {
    #[arg(long, short, global = true, help = "TOML config file (env vars override it)")]
    pub config: Option<PathBuf>,
    #[arg(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 答题（默认）
    Play {
        #[arg(long, help = "Quiz session id appended to every request")]
        session_id: Option<String>,
    },
    /// 题库管理
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    Subjects,
    Topics {
        subject: String,
    },
    Show {
        #[command(flatten)]
        location: Location,
    },
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        topic: String,
        #[command(flatten)]
        fields: DraftFields,
    },
    Edit {
        #[command(flatten)]
        location: Location,
        #[command(flatten)]
        fields: DraftFields,
    },
    Delete {
        #[command(flatten)]
        location: Location,
    },
    Upload {
        path: PathBuf,
    },
    RemoveSubject {
        subject: String,
    },
    Backups {
        #[command(flatten)]
        bank: BankArg,
    },
    Restore {
        filename: String,
        #[command(flatten)]
        bank: BankArg,
    },
    DeleteBackup {
        filename: String,
        #[command(flatten)]
        bank: BankArg,
    },
    RestoreAll {
        #[command(flatten)]
        bank: BankArg,
    },
    ClearBackups {
        #[command(flatten)]
        bank: BankArg,
    },
    /// 主题库（按学期）题目管理
    Main {
        #[command(subcommand)]
        command: MainCommand,
    },
    /// 两套题库的统计
    Stats,
    /// 下载主题库 JSON
    Export {
        #[arg(default_value = "perguntas.json")]
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum MainCommand {
    List {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        period: Option<u32>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },
    Show {
        index: usize,
    },
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        period: u32,
        #[command(flatten)]
        fields: DraftFields,
    },
    Edit {
        index: usize,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        period: Option<u32>,
        #[command(flatten)]
        fields: DraftFields,
    },
    Delete {
        index: usize,
    },
    RemoveSubject {
        subject: String,
        #[arg(long, help = "Only remove questions of this period")]
        period: Option<u32>,
    },
}

impl MainCommand {
    /// `list` 的筛选条件
    pub fn query(
        subject: Option<String>,
        period: Option<u32>,
        page: usize,
        per_page: usize,
    ) -> MainQuestionQuery {
        MainQuestionQuery {
            page: page.max(1),
            per_page: per_page.max(1),
            subject,
            period,
        }
    }
}

/// 备份命令作用的题库
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct BankArg {
    #[arg(long, help = "Operate on the main (per-period) bank backups")]
    pub main: bool,
}

impl BankArg {
    pub fn bank(self) -> Bank {
        if self.main {
            Bank::Main
        } else {
            Bank::Recovery
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct Location {
    pub subject: String,
    pub topic: String,
    pub index: usize,
}

impl From<Location> for QuestionRef {
    fn from(location: Location) -> Self {
        QuestionRef {
            subject: location.subject,
            topic: location.topic,
            index: location.index,
        }
    }
}

/// 题目字段；编辑时只覆盖给出的字段
#[derive(Args, Debug, Clone, Default)]
pub struct DraftFields {
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long = "option", help = "Repeat 4-5 times")]
    pub options: Vec<String>,
    #[arg(long)]
    pub correct: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub difficulty: Option<String>,
    #[arg(long)]
    pub explanation: Option<String>,
    #[arg(long)]
    pub reference: Option<String>,
}

impl DraftFields {
    pub fn apply_to(self, draft: &mut QuestionDraft) {
        let set = |target: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *target = v;
            }
        };
        set(&mut draft.text, self.text);
        set(&mut draft.correct_answer, self.correct);
        set(&mut draft.category, self.category);
        set(&mut draft.difficulty, self.difficulty);
        set(&mut draft.explanation, self.explanation);
        set(&mut draft.reference, self.reference);
        if !self.options.is_empty() {
            draft.options = self.options;
        }
    }

    /// 主题库没有参考资料字段，`--reference` 被忽略
    pub fn apply_to_main(self, draft: &mut MainQuestionDraft) {
        let set = |target: &mut String, value: Option<String>| {
            if let Some(v) = value {
                *target = v;
            }
        };
        set(&mut draft.text, self.text);
        set(&mut draft.correct_answer, self.correct);
        set(&mut draft.category, self.category);
        set(&mut draft.difficulty, self.difficulty);
        set(&mut draft.explanation, self.explanation);
        if !self.options.is_empty() {
            draft.options = self.options;
        }
    }
}
