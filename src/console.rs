//! Interactive console surface.

use crate::agent_loop::Conversation;
use crate::hooks::AgentHooks;
use crate::llm::LlmProvider;
use log::error;
use owo_colors::OwoColorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant that specializes in Danish parishes (sogne).
You have access to the official Danish parish registry through the Dataforsyningen API.

You can help users:
- Search for parishes by name
- Get detailed information about specific parishes (coordinates, boundaries)
- List and discover parishes in Denmark

When users ask about parishes, use your available functions to look up accurate,
current information. Always be helpful and provide context about the parishes when relevant.

Danish parishes (sogne) are ecclesiastical divisions used in Denmark, originally
for church administration but now also used for various administrative purposes.";

pub const BANNER: &str = "\
╔══════════════════════════════════════════════════════════════╗
║           Danish Parish (Sogn) Information Agent             ║
║                 Powered by the sogn registry                 ║
╠══════════════════════════════════════════════════════════════╣
║  Ask me anything about Danish parishes!                      ║
║  Examples:                                                   ║
║    - 'What parishes are in Copenhagen?'                      ║
║    - 'Tell me about Trinitatis parish'                       ║
║    - 'What is the parish code for Roskilde Domsogn?'         ║
║    - 'List some parishes'                                    ║
║                                                              ║
║  Type 'exit' or 'quit' to end the conversation.              ║
╚══════════════════════════════════════════════════════════════╝";

pub const FAREWELL: &str = "Goodbye! Farvel!";

/// `exit` or `quit`, ignoring case and surrounding whitespace.
#[must_use]
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Run the read-eval-print loop until an exit word or end of input.
///
/// A failed turn is printed and the loop carries on with the next line.
///
/// # Errors
/// Returns an error only when reading input or writing output fails.
pub async fn run<Ctx, P, H, R, W>(
    conversation: &mut Conversation<Ctx, P, H>,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    Ctx: Send + Sync + 'static,
    P: LlmProvider,
    H: AgentHooks,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{BANNER}")?;
    writeln!(out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{}", "You: ".green())?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        if line.trim().is_empty() {
            continue;
        }
        if is_exit_command(&line) {
            break;
        }

        match conversation.send(&line).await {
            Ok(reply) => {
                writeln!(out, "{}{reply}", "Assistant: ".cyan())?;
            }
            Err(e) => {
                error!("Turn failed: {e}");
                writeln!(out, "{}", format!("Error: {e}").red())?;
            }
        }
        writeln!(out)?;
    }

    writeln!(out, "{FAREWELL}")?;
    out.flush()
}
