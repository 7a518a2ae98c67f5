//! Terminal rendering of messages, analyses and the archive browser.

use chatlens_core::chat::{Alert, ImageAnalysis, Message, Notifier};
use chatlens_core::session::{ArchiveBrowser, BrowserRow, BrowserTab};
use chrono::{DateTime, Local};
use colored::Colorize;

/// Prints alerts to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, alert: Alert) {
        eprintln!("{} {}", format!("{}:", alert.title()).red().bold(), alert.message().red());
    }
}

pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Renders one message with its 1-based position.
pub fn format_message(position: usize, message: &Message) -> String {
    let header = format!("[{position}] {}", format_timestamp(message.timestamp));
    let mut out = if message.is_user {
        format!("{} {}\n{}", header.dimmed(), "you".bright_cyan().bold(), message.text)
    } else {
        let star = if message.is_favorite { " ★" } else { "" };
        format!(
            "{} {}{}\n{}",
            header.dimmed(),
            "ai".bright_green().bold(),
            star.yellow(),
            message.text
        )
    };

    if message.image.is_some() {
        let note = match message.image_analysis {
            Some(_) => format!("  (image, /analysis {position})"),
            None => "  (image)".to_string(),
        };
        out.push('\n');
        out.push_str(&note.dimmed().to_string());
    }
    out
}

pub fn format_analysis(analysis: &ImageAnalysis) -> String {
    format!(
        "{}\n  {}\n  tags: {}\n  confidence: {}%",
        "Image analysis".bright_magenta().bold(),
        analysis.description,
        analysis.tags.join(", "),
        analysis.confidence
    )
}

pub fn format_browser(browser: &ArchiveBrowser, tab: BrowserTab) -> String {
    let (title, empty) = match tab {
        BrowserTab::Histories => ("Saved chats", "No saved chats yet."),
        BrowserTab::Favorites => ("Favorites", "No favorites yet."),
    };

    let mut lines = vec![title.bright_yellow().bold().to_string()];
    if browser.is_empty(tab) {
        lines.push(format!("  {}", empty.dimmed()));
    }

    for (index, row) in browser.rows(tab).iter().enumerate() {
        let line = match row {
            BrowserRow::History {
                title,
                last_message,
                timestamp,
                ..
            } => format!(
                "  [{}] {} {}\n      {}",
                index + 1,
                title,
                format_timestamp(*timestamp).dimmed(),
                first_line(last_message).dimmed()
            ),
            BrowserRow::Favorite {
                text, timestamp, ..
            } => format!(
                "  ★ {} {}",
                first_line(text),
                format_timestamp(*timestamp).dimmed()
            ),
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlens_core::chat::ChatHistory;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_user_and_bot_messages() {
        plain();
        let user = Message::user("1".into(), "Hello", None, 0);
        let mut bot = Message::bot("2".into(), "Hi there", 0);
        bot.is_favorite = true;

        assert!(format_message(1, &user).contains("you\nHello"));
        assert!(format_message(2, &bot).contains("ai ★\nHi there"));
    }

    #[test]
    fn test_format_message_with_analysis_points_to_viewer() {
        plain();
        let analysis = ImageAnalysis {
            description: "A cat".into(),
            tags: vec!["feline".into()],
            confidence: 90,
        };
        let bot = Message::bot("3".into(), "A cat", 0).with_analysis("data:".into(), analysis);
        assert!(format_message(4, &bot).contains("/analysis 4"));
    }

    #[test]
    fn test_format_analysis() {
        plain();
        let analysis = ImageAnalysis {
            description: "A cat sits.".into(),
            tags: vec!["feline".into(), "animal".into()],
            confidence: 92,
        };
        let text = format_analysis(&analysis);
        assert!(text.contains("tags: feline, animal"));
        assert!(text.contains("confidence: 92%"));
    }

    #[test]
    fn test_format_browser() {
        plain();
        let messages = vec![
            Message::user("1".into(), "Hello", None, 0),
            Message::bot("2".into(), "Hi there\nmore", 0),
        ];
        let history = ChatHistory::snapshot("h", &messages, 0).unwrap();
        let browser = ArchiveBrowser::new(vec![history], Vec::new());

        let histories = format_browser(&browser, BrowserTab::Histories);
        assert!(histories.contains("[1] Hello..."));
        assert!(histories.contains("Hi there"));
        assert!(!histories.contains("more"));

        let favorites = format_browser(&browser, BrowserTab::Favorites);
        assert!(favorites.contains("No favorites yet."));
    }
}
