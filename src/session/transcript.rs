/// Text collected while capturing a command or conversing
///
/// Finalized fragments are kept in order. The recognizer revises an interim
/// fragment until it finalizes it, so only the latest interim is kept.
#[derive(Debug, Default, Clone)]
pub(crate) struct Transcript {
    fragments: Vec<String>,
    interim: Option<String>,
}

impl Transcript {
    pub fn push(&mut self, text: &str, is_final: bool) {
        let text = text.trim();
        if is_final {
            self.interim = None;
            if !text.is_empty() {
                self.fragments.push(text.to_string());
            }
        } else if text.is_empty() {
            self.interim = None;
        } else {
            self.interim = Some(text.to_string());
        }
    }

    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .chain(self.interim.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.interim.is_none()
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
        self.interim = None;
    }
}
