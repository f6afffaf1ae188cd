//! 管理端命令
//!
//! 每条命令：登录（配置了账号时）→ 调用接口 → 打印结果。

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{AdminCommand, MainCommand};
use crate::clients::AdminClient;
use crate::config::Config;
use crate::models::admin::{
    BackupInfo, BankStatistics, MainQuestionDraft, MainQuestionPage, QuestionDraft, QuestionRef,
    TopicMap,
};
use crate::workflow::admin_form::AdminForm;

/// 执行一条管理端命令
pub async fn run_admin(config: &Config, command: AdminCommand) -> Result<()> {
    let client = AdminClient::new(config).context("创建管理端客户端失败")?;

    if !client.login_from_config().await.context("管理端登录失败")? {
        warn!("⚠️ 未配置 ADMIN_EMAIL / ADMIN_PASSWORD，以匿名身份访问");
    }

    match command {
        AdminCommand::Subjects => {
            let subjects = client.list_subjects().await?;
            info!("📚 共 {} 个学科", subjects.len());
            for subject in subjects {
                println!("{}", subject);
            }
        }
        AdminCommand::Topics { subject } => {
            let topics = client.list_topics(&subject).await?;
            print_topics(&subject, &topics);
        }
        AdminCommand::Show { location } => {
            let question_ref: QuestionRef = location.into();
            let fetched = client.get_question(&question_ref).await?;
            println!("{}", serde_json::to_string_pretty(&fetched.question)?);
        }
        AdminCommand::Add {
            subject,
            topic,
            fields,
        } => {
            let mut form = AdminForm::new();
            *form.draft_mut() = QuestionDraft {
                subject,
                topic,
                ..Default::default()
            };
            fields.apply_to(form.draft_mut());
            let reply = form.submit(&client).await?;
            println!("✅ {}", reply.message);
        }
        AdminCommand::Edit { location, fields } => {
            let question_ref: QuestionRef = location.into();
            let fetched = client.get_question(&question_ref).await?;

            let mut form = AdminForm::new();
            form.begin_edit(question_ref, &fetched.question);
            fields.apply_to(form.draft_mut());
            let reply = form.submit(&client).await?;
            println!("✅ {}", reply.message);
        }
        AdminCommand::Delete { location } => {
            let question_ref: QuestionRef = location.into();
            let reply = client.delete_question(&question_ref).await?;
            println!("🗑 {}", reply.message);
        }
        AdminCommand::Upload { path } => {
            let reply = client
                .upload_question_set(&path)
                .await
                .with_context(|| format!("上传失败: {}", path.display()))?;
            println!("✅ {} ({} perguntas)", reply.message, reply.data.imported);
        }
        AdminCommand::RemoveSubject { subject } => {
            let reply = client.remove_subject(&subject).await?;
            print_removal(&reply.message, reply.data.backup.as_deref());
        }
        AdminCommand::Backups { bank } => {
            let backups = client.list_backups(bank.bank()).await?;
            print_backups(&backups);
        }
        AdminCommand::Restore { filename, bank } => {
            let reply = client.restore_backup(bank.bank(), &filename).await?;
            let report = reply.data;
            println!("✅ {}", reply.message);
            // 主题库备份没有主题
            let topics = match report.topics_restored {
                0 => String::new(),
                n => format!(" em {} tópicos", n),
            };
            println!(
                "   {} perguntas{}{}",
                report.questions_restored,
                topics,
                if report.replaced_existing {
                    " (disciplina existente substituída)"
                } else {
                    ""
                }
            );
        }
        AdminCommand::DeleteBackup { filename, bank } => {
            let reply = client.delete_backup(bank.bank(), &filename).await?;
            println!("🗑 {}", reply.message);
        }
        AdminCommand::RestoreAll { bank } => {
            let reply = client.restore_all_backups(bank.bank()).await?;
            println!("✅ {}", reply.message);
            if let Some(state) = &reply.data.state_backup {
                println!("   estado anterior salvo em {}", state);
            }
            for subject in &reply.data.restored {
                let replaced = reply.data.replaced.contains(subject);
                println!("   {}{}", subject, if replaced { " (substituída)" } else { "" });
            }
        }
        AdminCommand::ClearBackups { bank } => {
            let reply = client.clear_all_backups(bank.bank()).await?;
            println!(
                "🗑 {} ({} backups removidos)",
                reply.message, reply.data.removed
            );
            if let Some(state) = &reply.data.state_backup {
                println!("   estado anterior salvo em {}", state);
            }
        }
        AdminCommand::Main { command } => run_main(&client, command).await?,
        AdminCommand::Stats => {
            let stats = client.statistics().await?;
            print_statistics(&stats);
        }
        AdminCommand::Export { path } => {
            let total = client
                .export_main_bank(&path)
                .await
                .with_context(|| format!("导出失败: {}", path.display()))?;
            println!("💾 {} perguntas salvas em {}", total, path.display());
        }
    }

    Ok(())
}

/// 主题库命令
async fn run_main(client: &AdminClient, command: MainCommand) -> Result<()> {
    match command {
        MainCommand::List {
            subject,
            period,
            page,
            per_page,
        } => {
            let query = MainCommand::query(subject, period, page, per_page);
            let page = client.list_main_questions(&query).await?;
            print_main_page(&page);
        }
        MainCommand::Show { index } => {
            let fetched = client.get_main_question(index).await?;
            println!("{}", serde_json::to_string_pretty(&fetched.question)?);
        }
        MainCommand::Add {
            subject,
            period,
            fields,
        } => {
            let mut draft = MainQuestionDraft {
                subject,
                period,
                ..Default::default()
            };
            fields.apply_to_main(&mut draft);
            let reply = client.add_main_question(draft).await?;
            println!("✅ {} ({} perguntas)", reply.message, reply.data.total);
        }
        MainCommand::Edit {
            index,
            subject,
            period,
            fields,
        } => {
            let fetched = client.get_main_question(index).await?;
            let mut draft = MainQuestionDraft::from_question(&fetched.question);
            if let Some(subject) = subject {
                draft.subject = subject;
            }
            if let Some(period) = period {
                draft.period = period;
            }
            fields.apply_to_main(&mut draft);
            let reply = client.edit_main_question(fetched.index, draft).await?;
            println!("✅ {}", reply.message);
        }
        MainCommand::Delete { index } => {
            let reply = client.delete_main_question(index).await?;
            println!("🗑 {}", reply.message);
        }
        MainCommand::RemoveSubject { subject, period } => {
            let reply = client.remove_main_subject(&subject, period).await?;
            print_removal(&reply.message, reply.data.backup.as_deref());
        }
    }
    Ok(())
}

fn print_removal(message: &str, backup: Option<&str>) {
    println!("🗑 {}", message);
    if let Some(backup) = backup {
        println!("   backup: {}", backup);
    }
}

fn print_main_page(page: &MainQuestionPage) {
    println!(
        "📚 {} perguntas - página {}/{}",
        page.total,
        page.page,
        page.total_pages.max(1)
    );
    for (offset, main) in page.questions.iter().enumerate() {
        let subject = main.question.subject.as_deref().unwrap_or("-");
        let period = main
            .period
            .map(|p| format!("{}º", p))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {} {} | {}",
            page.absolute_index(offset),
            period,
            subject,
            main.question.text
        );
    }
}

fn print_statistics(stats: &BankStatistics) {
    println!("📊 Quiz principal: {} perguntas", stats.main_total);
    for (subject, total) in &stats.by_subject {
        println!("  • {}: {}", subject, total);
    }
    for (difficulty, total) in &stats.by_difficulty {
        println!("  ◦ {}: {}", difficulty, total);
    }
    println!("  sem explicação: {}", stats.without_explanation);
    if let Some(longest) = &stats.longest {
        println!("  mais longa: {}", longest);
    }
    if let Some(shortest) = &stats.shortest {
        println!("  mais curta: {}", shortest);
    }
    println!("📊 Recuperação: {} perguntas", stats.recovery_total);
    for (topic, total) in &stats.by_topic {
        println!("  • {}: {}", topic, total);
    }
}

fn print_topics(subject: &str, topics: &TopicMap) {
    let total: usize = topics.values().map(|t| t.total).sum();
    println!("📚 {} - {} tópicos, {} perguntas", subject, topics.len(), total);
    for (topic, entry) in topics {
        println!("  • {} ({})", topic, entry.total);
        for (index, question) in entry.questions.iter().enumerate() {
            println!("      [{}] {}", index, question.text);
        }
    }
}

fn print_backups(backups: &[BackupInfo]) {
    if backups.is_empty() {
        println!("Nenhum backup encontrado");
        return;
    }
    for backup in backups {
        let period = backup
            .period
            .map(|p| format!("  {}º período", p))
            .unwrap_or_default();
        println!(
            "{}  {}{}  {} perguntas  {}",
            backup.filename, backup.subject, period, backup.total_questions, backup.created_at
        );
    }
}
