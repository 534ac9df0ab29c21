use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::accumulator::Snapshot;
use crate::core::render::SlotId;
use crate::ui::html::HtmlView;
use crate::ui::view::{ChatView, Element, NoticeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Reasoning,
    Content,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Channel::Reasoning => "[reasoning] ",
            Channel::Content => "AI: ",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SlotProgress {
    slot: Option<SlotId>,
    reasoning: usize,
    content: usize,
}

/// Terminal view: prints streamed text as it arrives and keeps an
/// [`HtmlView`] in sync, optionally written to a page file after every
/// update so a browser can watch the conversation.
pub struct ConsoleView<W: Write> {
    out: W,
    page: HtmlView,
    page_path: Option<PathBuf>,
    progress: SlotProgress,
    /// Channel whose streamed line is still open, if any.
    open_line: Option<Channel>,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W, page: HtmlView) -> Self {
        Self {
            out,
            page,
            page_path: None,
            progress: SlotProgress::default(),
            open_line: None,
        }
    }

    pub fn with_page_file(mut self, path: PathBuf) -> Self {
        self.page_path = Some(path);
        self
    }

    pub fn page(&self) -> &HtmlView {
        &self.page
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Ends any streamed line and prints the input prompt.
    pub fn prompt(&mut self) {
        self.end_line();
        self.write("> ");
        self.flush();
    }

    /// Prints a plain line outside the chat flow (command output).
    pub fn println(&mut self, text: &str) {
        self.end_line();
        self.write(text);
        self.write("\n");
        self.flush();
    }

    /// Writes the page file now, if one is configured.
    pub fn write_page(&self) {
        let Some(path) = &self.page_path else {
            return;
        };
        if let Err(err) = persist_page(path, &self.page.to_document()) {
            warn!(path = %path.display(), "failed to write chat page: {err}");
        }
    }

    fn end_line(&mut self) {
        if self.open_line.take().is_some() {
            self.write("\n");
        }
    }

    /// Prints `new` on the line for `channel`, starting a labelled line when
    /// another channel (or nothing) was open.
    fn stream(&mut self, channel: Channel, new: &str) {
        if self.open_line != Some(channel) {
            self.end_line();
            self.write(channel.label());
        }
        self.write(new);
        self.open_line = Some(channel);
    }

    fn write(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            warn!("console write failed: {err}");
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.out.flush() {
            warn!("console flush failed: {err}");
        }
    }
}

fn persist_page(path: &Path, document: &str) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty());
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };
    temp_file.write_all(document.as_bytes())?;
    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

impl<W: Write> ChatView for ConsoleView<W> {
    fn append_user_message(&mut self, text: &str) {
        // The terminal already shows what the user typed.
        self.end_line();
        self.page.append_user_message(text);
    }

    fn create_slot(&mut self, slot: SlotId) {
        self.end_line();
        self.progress = SlotProgress {
            slot: Some(slot),
            ..SlotProgress::default()
        };
        self.page.create_slot(slot);
    }

    fn slot_mut(&mut self, slot: SlotId) -> Option<&mut Element> {
        self.page.slot_mut(slot)
    }

    fn update_slot_text(&mut self, slot: SlotId, snapshot: Snapshot<'_>) {
        if self.progress.slot != Some(slot) {
            return;
        }

        if let Some(new) = snapshot.reasoning.get(self.progress.reasoning..) {
            if !new.is_empty() {
                self.stream(Channel::Reasoning, new);
                self.progress.reasoning = snapshot.reasoning.len();
            }
        }

        if let Some(new) = snapshot.content.get(self.progress.content..) {
            if !new.is_empty() {
                self.stream(Channel::Content, new);
                self.progress.content = snapshot.content.len();
            }
        }
        self.flush();
    }

    fn show_notice(&mut self, kind: NoticeKind, text: &str) {
        self.end_line();
        let prefix = match kind {
            NoticeKind::Info => "--",
            NoticeKind::Error => "!!",
        };
        self.write(&format!("{prefix} {text}\n"));
        self.flush();
        self.page.show_notice(kind, text);
        self.write_page();
    }

    fn show_transcript(&mut self, name: &str, text: &str) {
        self.end_line();
        self.write(&format!("== {name} ==\n{text}\n"));
        self.flush();
        self.page.show_transcript(name, text);
        self.write_page();
    }

    fn scroll_to_bottom(&mut self) {
        self.page.scroll_to_bottom();
        self.write_page();
    }

    fn clear(&mut self) {
        self.end_line();
        self.progress = SlotProgress::default();
        self.page.clear();
        self.write_page();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output(view: &ConsoleView<Vec<u8>>) -> String {
        String::from_utf8(view.writer().clone()).expect("utf8")
    }

    #[test]
    fn prints_only_new_text_per_update() {
        let mut view = ConsoleView::new(Vec::new(), HtmlView::new("t"));
        let slot = SlotId::new(1);
        view.create_slot(slot);
        view.update_slot_text(slot, Snapshot { content: "", reasoning: "hm" });
        view.update_slot_text(slot, Snapshot { content: "He", reasoning: "hm" });
        view.update_slot_text(slot, Snapshot { content: "Hello", reasoning: "hm" });
        view.prompt();
        assert_eq!(output(&view), "[reasoning] hm\nAI: Hello\n> ");
    }

    #[test]
    fn interleaved_channels_are_relabelled() {
        let mut view = ConsoleView::new(Vec::new(), HtmlView::new("t"));
        let slot = SlotId::new(1);
        view.create_slot(slot);
        view.update_slot_text(slot, Snapshot { content: "Hi", reasoning: "" });
        view.update_slot_text(slot, Snapshot { content: "Hi", reasoning: "think" });
        view.update_slot_text(slot, Snapshot { content: "Hi there", reasoning: "think" });
        view.update_slot_text(slot, Snapshot { content: "Hi there!", reasoning: "think" });
        view.prompt();
        assert_eq!(output(&view), "AI: Hi\n[reasoning] think\nAI:  there!\n> ");
    }

    #[test]
    fn ignores_updates_for_other_slots() {
        let mut view = ConsoleView::new(Vec::new(), HtmlView::new("t"));
        view.create_slot(SlotId::new(2));
        view.update_slot_text(SlotId::new(1), Snapshot { content: "stale", reasoning: "" });
        assert_eq!(output(&view), "");
    }

    #[test]
    fn notices_end_the_streamed_line() {
        let mut view = ConsoleView::new(Vec::new(), HtmlView::new("t"));
        let slot = SlotId::new(1);
        view.create_slot(slot);
        view.update_slot_text(slot, Snapshot { content: "part", reasoning: "" });
        view.show_notice(NoticeKind::Error, "connection reset");
        assert_eq!(output(&view), "AI: part\n!! connection reset\n");
        assert_eq!(view.page().elements().len(), 2);
    }

    #[test]
    fn page_file_is_written_on_scroll() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("chat.html");
        let mut view =
            ConsoleView::new(Vec::new(), HtmlView::new("t")).with_page_file(path.clone());
        view.append_user_message("hello page");
        view.scroll_to_bottom();

        let written = std::fs::read_to_string(&path).expect("page");
        assert!(written.contains("You: hello page"));
    }
}
