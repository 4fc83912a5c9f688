//! Interactive chat shell: pick an agent, talk to it on stdin.
//!
//! Needs `GEMINI_API_KEY` and `GOOGLE_ACCESS_TOKEN` in the environment.
//! Run with: `cargo run --example chat`

use std::io::{self, BufRead, Write};

use workspace_agent::{Agent, AgentKind, Conversation};

fn select_agent() -> io::Result<AgentKind> {
    let stdin = io::stdin();
    loop {
        print!("Bạn muốn sử dụng Agent nào? (1: Tasks, 2: Calendar, 3: Gmail): ");
        io::stdout().flush()?;
        let mut choice = String::new();
        stdin.lock().read_line(&mut choice)?;
        match choice.trim() {
            "1" => return Ok(AgentKind::Tasks),
            "2" => return Ok(AgentKind::Calendar),
            "3" => return Ok(AgentKind::Gmail),
            _ => println!("Lựa chọn không hợp lệ. Vui lòng nhập 1, 2 hoặc 3."),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let kind = select_agent()?;
    println!("\nĐang khởi tạo {} Agent...", kind);
    let agent = Agent::builder().kind(kind).build()?;
    let mut conversation = Conversation::with_system(agent.system_prompt());

    println!("Agent đã sẵn sàng. (gõ 'exit' để thoát)");
    let stdin = io::stdin();
    loop {
        print!(">> Bạn: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            println!("Tạm biệt!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.ask(&mut conversation, input).await {
            Ok(turn) => println!(">> Agent: {}", turn.text),
            Err(e) => eprintln!("Đã có lỗi nghiêm trọng xảy ra: {e}"),
        }
    }
    Ok(())
}
