/// Commands typed by the user on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Submit(String),
    ShowPresence,
    ReloadHistory,
    ClearMessages,
    QuitRequested,
}

impl AppEvent {
    pub fn from_input_line(line: &str) -> Option<Self> {
        match line.trim() {
            "" => None,
            "/quit" | "/exit" => Some(Self::QuitRequested),
            "/who" => Some(Self::ShowPresence),
            "/history" => Some(Self::ReloadHistory),
            "/clear" => Some(Self::ClearMessages),
            _ => Some(Self::Submit(line.to_owned())),
        }
    }
}
