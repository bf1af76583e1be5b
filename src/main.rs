//! Waypoint - 命令行行程规划助手
//!
//! 入口：加载 .env 与配置、初始化日志、构建引擎，然后逐行读取标准输入。
//! 本地命令：`/slots` 查看已收集的槽位，`/reset` 重新开始，`/quit` 退出。

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use waypoint::config::load_config;
use waypoint::dialogue::policy;
use waypoint::{observability, EngineFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });

    // API Key 缺失时直接退出
    let factory = EngineFactory::from_config(&cfg).context("Failed to configure planner")?;
    let mut engine = factory.create();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Tell me about the trip you're planning (\"search: ...\" to look something up, /quit to exit).\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = line.trim();
        let output = match input {
            "" => String::new(),
            "/quit" | "/exit" => break,
            "/reset" => {
                engine.reset();
                "Starting over. Where would you like to go?".to_string()
            }
            "/slots" => engine
                .slots()
                .iter()
                .map(|(slot, value)| format!("{:<12} {}", slot.as_str(), value.unwrap_or("-")))
                .chain(std::iter::once(format!(
                    "missing: {:?}",
                    policy::missing(engine.slots())
                )))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => engine.handle_turn(input).await,
        };

        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}
