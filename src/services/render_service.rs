//! 展示层
//!
//! 把终态和提交回执渲染成 HTML 片段或终端文本。
//! 所有不可信字符串（答案、片段、错误消息、响应体）在插入前恰好转义一次。

use crate::error::{ApiError, AppError};
use crate::models::{DocumentId, Outcome, QuestionHandle, Reference};

/// 输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// 终端纯文本
    #[default]
    Text,
    /// HTML 片段
    Html,
}

/// HTML 转义
///
/// 替换 `& < > " ' / ` =` 为对应实体，其余字符原样保留。
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            _ => out.push(c),
        }
    }
    out
}

/// 终端转义：去掉除换行和制表符以外的控制字符，防止注入终端控制序列
pub fn sanitize_terminal(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                '\u{FFFD}'
            } else {
                c
            }
        })
        .collect()
}

/// 渲染轮询终态
pub fn render_outcome(outcome: &Outcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Html => outcome_html(outcome),
        OutputFormat::Text => outcome_text(outcome),
    }
}

/// 渲染上传成功回执
pub fn render_upload_receipt(file_id: &DocumentId, format: OutputFormat) -> String {
    match format {
        OutputFormat::Html => format!(
            r#"<span class="pill ok">OK</span> file_id: <code>{}</code>"#,
            escape_html(file_id.as_str())
        ),
        OutputFormat::Text => format!("OK file_id: {}", sanitize_terminal(file_id.as_str())),
    }
}

/// 渲染提问成功回执
pub fn render_question_receipt(handle: &QuestionHandle, format: OutputFormat) -> String {
    match format {
        OutputFormat::Html => format!(
            r#"<span class="pill ok">OK</span> question_id: <code>{}</code>"#,
            escape_html(handle.as_str())
        ),
        OutputFormat::Text => format!("OK question_id: {}", sanitize_terminal(handle.as_str())),
    }
}

/// 渲染提交阶段（上传或提问）的失败
pub fn render_submission_error(err: &AppError, format: OutputFormat) -> String {
    let (status, detail) = match err {
        AppError::Api(ApiError::BadResponse { status, body, .. }) => (Some(*status), body.clone()),
        other => (None, other.to_string()),
    };
    error_block(status, &detail, format)
}

fn outcome_html(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Done { answer, references } => format!(
            r#"<div><span class="pill ok">DONE</span></div>
<div style="margin-top:8px;"><strong>答案:</strong><pre>{}</pre></div>
<div style="margin-top:8px;"><strong>引用片段:</strong><pre>{}</pre></div>"#,
            escape_html(answer),
            join_references(references, escape_html)
        ),
        Outcome::Error { message } => format!(
            r#"<div><span class="pill err">ERROR</span></div>
<pre>{}</pre>"#,
            escape_html(message)
        ),
        Outcome::TimedOut { .. } => r#"<span class="pill warn">等待超时</span>"#.to_string(),
        Outcome::TransportError(e) => error_block(e.status, &e.message, OutputFormat::Html),
    }
}

fn outcome_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Done { answer, references } => {
            let mut out = format!("[DONE]\n答案:\n{}", sanitize_terminal(answer));
            if !references.is_empty() {
                out.push_str("\n\n引用片段:\n");
                out.push_str(&join_references(references, sanitize_terminal));
            }
            out
        }
        Outcome::Error { message } => format!("[ERROR]\n{}", sanitize_terminal(message)),
        Outcome::TimedOut { attempts } => {
            format!("[等待超时] 已查询 {} 次仍未完成，可稍后重新检查", attempts)
        }
        Outcome::TransportError(e) => error_block(e.status, &e.message, OutputFormat::Text),
    }
}

fn error_block(status: Option<u16>, detail: &str, format: OutputFormat) -> String {
    let title = match status {
        Some(code) => format!("错误 {}", code),
        None => "错误".to_string(),
    };
    match format {
        OutputFormat::Html => format!(
            r#"<span class="pill err">{}</span><pre>{}</pre>"#,
            title,
            escape_html(detail)
        ),
        OutputFormat::Text => format!("[{}]\n{}", title, sanitize_terminal(detail)),
    }
}

fn join_references(references: &[Reference], escape: fn(&str) -> String) -> String {
    references
        .iter()
        .map(|r| format!("#{}. {}", r.rank, escape(&r.snippet)))
        .collect::<Vec<_>>()
        .join("\n\n")
}
