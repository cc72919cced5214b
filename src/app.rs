use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AskMode, DocumentId, Outcome, QuestionHandle};
use crate::services::render_service::{
    render_outcome, render_question_receipt, render_submission_error, render_upload_receipt,
    OutputFormat,
};
use crate::utils::logging;
use crate::workflow::QuestionFlow;

/// 文档问答命令行客户端
#[derive(Debug, Parser)]
#[command(name = "docqa", version, about = "上传文档、提问并等待异步计算的答案")]
pub struct Cli {
    /// TOML 配置文件路径（默认读取 DOCQA_CONFIG）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API 根地址
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 每个会话最多查询几次
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// 两次查询之间的间隔（毫秒）
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// 结果记录文件
    #[arg(long, global = true)]
    pub output_log: Option<String>,

    /// 输出格式
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 上传文档，输出 file_id
    Upload {
        /// 要上传的 .docx 文件
        file: PathBuf,
    },
    /// 针对已上传的文档提问并等待答案
    Ask {
        file_id: String,
        question: String,
        /// 回答模式
        #[arg(long, value_enum)]
        mode: Option<AskMode>,
        /// 只提交问题，不等待答案
        #[arg(long)]
        no_wait: bool,
    },
    /// 重新检查一个或多个问题的答案
    Check {
        #[arg(required = true)]
        question_ids: Vec<String>,
    },
    /// 上传文档、提问并等待答案
    Run {
        file: PathBuf,
        question: String,
        #[arg(long, value_enum)]
        mode: Option<AskMode>,
    },
}

impl Cli {
    /// 分层加载配置后用命令行参数覆盖
    pub fn resolve_config(&self) -> Result<Config, AppError> {
        let config = Config::load(self.config.as_deref())?;
        self.apply_overrides(config)
    }

    /// 命令行参数优先级最高；所有层合并后只校验一次
    pub fn apply_overrides(&self, mut config: Config) -> Result<Config, AppError> {
        if let Some(url) = &self.base_url {
            config.api_base_url = url.clone();
        }
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(ms) = self.interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(path) = &self.output_log {
            config.output_log_file = Some(path.clone());
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// 应用主结构
pub struct App {
    flow: QuestionFlow,
    format: OutputFormat,
    command: Command,
}

impl App {
    /// 初始化应用
    pub fn initialize(cli: Cli) -> Result<Self> {
        let config = cli.resolve_config().context("加载配置失败")?;

        logging::init(config.verbose_logging);
        logging::log_startup(&config);

        let flow = QuestionFlow::new(&config).context("初始化 API 客户端失败")?;
        flow.init_transcript().context("初始化结果记录文件失败")?;

        Ok(Self {
            flow,
            format: cli.format,
            command: cli.command,
        })
    }

    /// 运行子命令，返回进程退出码
    pub async fn run(self) -> Result<ExitCode> {
        let format = self.format;

        let code = match &self.command {
            Command::Upload { file } => match self.flow.upload(file).await {
                Ok(file_id) => {
                    println!("{}", render_upload_receipt(&file_id, format));
                    ExitCode::SUCCESS
                }
                Err(e) => self.submission_failed(&e),
            },
            Command::Ask {
                file_id,
                question,
                mode,
                no_wait,
            } => {
                let file_id = DocumentId::new(file_id.clone());
                match self.flow.ask(&file_id, question, *mode).await {
                    Ok(ctx) => {
                        println!("{}", render_question_receipt(&ctx.question_id, format));
                        if *no_wait {
                            ExitCode::SUCCESS
                        } else {
                            let outcome = self.flow.wait(&ctx).await;
                            self.print_outcome(&outcome);
                            exit_code_for(&outcome)
                        }
                    }
                    Err(e) => self.submission_failed(&e),
                }
            }
            Command::Check { question_ids } => {
                let handles: Vec<QuestionHandle> = question_ids
                    .iter()
                    .map(|id| QuestionHandle::new(id.trim()))
                    .collect();
                match self.flow.check(&handles).await {
                    Ok(outcomes) => {
                        for (handle, outcome) in handles.iter().zip(&outcomes) {
                            if handles.len() > 1 {
                                println!("== {} ==", handle);
                            }
                            self.print_outcome(outcome);
                        }
                        if outcomes.iter().all(Outcome::is_done) {
                            ExitCode::SUCCESS
                        } else {
                            ExitCode::FAILURE
                        }
                    }
                    Err(e) => self.submission_failed(&e),
                }
            }
            Command::Run {
                file,
                question,
                mode,
            } => match self.flow.run(file, question, *mode).await {
                Ok((ctx, outcome)) => {
                    println!("{}", render_question_receipt(&ctx.question_id, format));
                    self.print_outcome(&outcome);
                    exit_code_for(&outcome)
                }
                Err(e) => self.submission_failed(&e),
            },
        };

        Ok(code)
    }

    fn print_outcome(&self, outcome: &Outcome) {
        println!("{}", render_outcome(outcome, self.format));
    }

    fn submission_failed(&self, err: &AppError) -> ExitCode {
        error!("❌ {}", err);
        println!("{}", render_submission_error(err, self.format));
        ExitCode::FAILURE
    }
}

/// 只有 `Done` 视为成功
pub fn exit_code_for(outcome: &Outcome) -> ExitCode {
    if outcome.is_done() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
