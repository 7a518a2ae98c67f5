use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use chatlens_core::session::{AttachOutcome, BrowserTab, ChatSession, SendOutcome};
use chatlens_infrastructure::FileImagePicker;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::command::{COMMANDS, Command, HELP, is_idle_line};
use crate::render::{format_analysis, format_browser, format_message};

/// Rustyline helper that completes and highlights slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

enum Flow {
    Continue,
    Quit,
}

/// Interactive front end over one [`ChatSession`].
pub struct Repl {
    session: Arc<ChatSession>,
    picker: Arc<FileImagePicker>,
}

impl Repl {
    pub fn new(session: Arc<ChatSession>, picker: Arc<FileImagePicker>) -> Self {
        Self { session, picker }
    }

    pub async fn run(&self) -> Result<()> {
        let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(CliHelper::new()));

        println!("{}", "=== chatlens ===".bright_magenta().bold());
        println!("{}", "Type a message, /help for commands, /quit to exit.".bright_black());
        println!();

        loop {
            let has_attachment = self.session.draft().await.image.is_some();
            let prompt = if has_attachment { "[img] >> " } else { ">> " };

            match rl.readline(prompt) {
                Ok(line) => {
                    if is_idle_line(&line, has_attachment) {
                        continue;
                    }
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }

                    if let Flow::Quit = self.handle(Command::parse(&line)).await {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "CTRL-D detected. Exiting...".bright_green());
                    break;
                }
                Err(err) => {
                    tracing::error!(error = %err, "Readline failed");
                    eprintln!("{}", format!("Error: {err}").red());
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle(&self, command: Command) -> Flow {
        match command {
            Command::Send(text) => self.send(text).await,
            Command::Image(path) => {
                self.picker.queue(path).await;
                self.attach().await;
            }
            Command::Detach => {
                self.session.clear_attachment().await;
                println!("{}", "Attachment removed.".bright_black());
            }
            Command::Favorite(position) => match self.message_id(position).await {
                Some(id) if self.session.toggle_favorite(&id).await => self.print_messages().await,
                Some(_) => println!("{}", "Only replies can be favorited.".yellow()),
                None => print_out_of_range(position),
            },
            Command::Analysis(position) => match self.message_id(position).await {
                Some(id) if self.session.show_analysis(&id).await => self.print_analysis().await,
                Some(_) => println!("{}", "That message has no image analysis.".yellow()),
                None => print_out_of_range(position),
            },
            Command::Close => self.session.close_analysis_view().await,
            Command::History => self.print_browser(BrowserTab::Histories).await,
            Command::Favorites => self.print_browser(BrowserTab::Favorites).await,
            Command::Restore(position) => self.restore(position).await,
            Command::New => {
                self.session.start_new_chat().await;
                println!("{}", "Started a new chat.".bright_black());
            }
            Command::Messages => self.print_messages().await,
            Command::Help => println!("{}", HELP.bright_black()),
            Command::Quit => return Flow::Quit,
            Command::Invalid(hint) => println!("{}", hint.yellow()),
        }
        Flow::Continue
    }

    async fn send(&self, text: String) {
        println!("{}", "...".bright_black());
        match self.session.send_text(text).await {
            SendOutcome::Replied(reply) => {
                let position = self.session.messages().await.len();
                println!("{}\n", format_message(position, &reply));
            }
            SendOutcome::Busy => println!("{}", "Still waiting for the previous reply.".yellow()),
            // Failures were already reported through the notifier.
            SendOutcome::Ignored | SendOutcome::Failed(_) | SendOutcome::Discarded => {}
        }
    }

    async fn attach(&self) {
        println!("{}", "Analyzing image...".bright_black());
        match self.session.attach_image().await {
            AttachOutcome::Analyzed(reply) => {
                let position = self.session.messages().await.len();
                println!("{}\n", format_message(position, &reply));
                self.print_analysis().await;
                println!(
                    "{}",
                    "The image will be attached to your next message.".bright_black()
                );
            }
            AttachOutcome::Cancelled => println!("{}", "No image picked.".yellow()),
            AttachOutcome::PickFailed(e) => eprintln!("{}", format!("Cannot use image: {e}").red()),
            AttachOutcome::Busy => println!("{}", "Still waiting for the previous reply.".yellow()),
            AttachOutcome::Failed(_) | AttachOutcome::Discarded => {}
        }
    }

    async fn restore(&self, position: usize) {
        let browser = self.session.browser().await;
        let Some(history_id) = browser.select(BrowserTab::Histories, position - 1) else {
            print_out_of_range(position);
            return;
        };

        match self.session.restore_history(history_id).await {
            Ok(()) => self.print_messages().await,
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }

    async fn message_id(&self, position: usize) -> Option<String> {
        self.session
            .messages()
            .await
            .get(position - 1)
            .map(|message| message.id.clone())
    }

    async fn print_messages(&self) {
        let messages = self.session.messages().await;
        if messages.is_empty() {
            println!("{}", "No messages yet.".bright_black());
        }
        for (index, message) in messages.iter().enumerate() {
            println!("{}\n", format_message(index + 1, message));
        }
    }

    async fn print_analysis(&self) {
        if let Some(analysis) = self.session.analysis_view().await {
            println!("{}\n", format_analysis(&analysis));
        }
    }

    async fn print_browser(&self, tab: BrowserTab) {
        println!("{}", format_browser(&self.session.browser().await, tab));
    }
}

fn print_out_of_range(position: usize) {
    println!("{}", format!("Nothing at position {position}.").yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_completes_command_suffix() {
        let helper = CliHelper::new();
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        assert_eq!(helper.hint("/hist", 5, &ctx), Some("ory".to_string()));
        assert_eq!(helper.hint("/history", 8, &ctx), None);
        assert_eq!(helper.hint("hello", 5, &ctx), None);
    }

    #[test]
    fn test_complete_lists_matching_commands() {
        let helper = CliHelper::new();
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, candidates) = helper.complete("/fa", 3, &ctx).unwrap();
        assert_eq!(start, 0);
        let names: Vec<_> = candidates.iter().map(|c| c.replacement.as_str()).collect();
        assert_eq!(names, ["/fav", "/favorites"]);
    }
}
