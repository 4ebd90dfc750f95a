// ==========================================
// 订舱履约核心 - 命令行入口
// ==========================================
// 协议: stdin 每行一个 JSON 请求 {method, path, body, actor}
//       stdout 每行一个 JSON 响应 {status, body}
// ==========================================

use std::io::{self, BufRead, Write};

use anyhow::Context;
use freight_fulfillment::app::{get_default_db_path, handle_request, AppState, HttpRequest, HttpResponse};
use freight_fulfillment::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", freight_fulfillment::APP_NAME, freight_fulfillment::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");

    let state = AppState::new(db_path).map_err(anyhow::Error::msg).context("无法初始化AppState")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("读取 stdin 失败")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<HttpRequest>(&line) {
            Ok(request) => handle_request(&state, request),
            Err(e) => {
                tracing::warn!(error = %e, "无法解析请求行");
                HttpResponse {
                    status: 400,
                    body: serde_json::json!({
                        "error": {
                            "code": "MALFORMED_REQUEST",
                            "message": format!("请求格式错误: {}", e),
                            "details": null,
                        }
                    }),
                }
            }
        };

        serde_json::to_writer(&mut out, &response).context("写出响应失败")?;
        out.write_all(b"\n")?;
        out.flush()?;
    }

    tracing::info!("stdin 已关闭，退出");
    Ok(())
}
