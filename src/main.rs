use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use doc_question_client::{App, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 解析命令行
    let cli = Cli::parse();

    // 加载配置、初始化日志并运行
    App::initialize(cli)?.run().await
}
