use serde::{Deserialize, Serialize};

/// Widget configuration: endpoint, pacing, and all user-visible text.
///
/// The defaults are the Hebrew-first support-desk persona; hosts embedding
/// the widget can deserialize their own copy to rebrand it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Relay endpoint the widget posts conversations to.
    pub api_url: String,
    /// Artificial pause between the optimistic user message and the
    /// outbound request, so the transition does not feel abrupt.
    pub send_delay_ms: u32,
    /// Delay before the first welcome line is revealed.
    pub welcome_first_delay_ms: u32,
    /// Delay between subsequent welcome lines.
    pub welcome_step_delay_ms: u32,
    /// Introductory lines revealed one by one on an empty conversation.
    pub welcome_lines: Vec<String>,
    /// Shortcut prompts shown while the conversation is empty.
    pub quick_actions: Vec<QuickAction>,
    pub texts: UiTexts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickAction {
    pub label: String,
    pub icon: String,
}

/// Localized interface strings. Hebrew by default; all of them are
/// non-technical — failure detail belongs in logs, never in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiTexts {
    pub title: String,
    pub status_online: String,
    pub status_typing: String,
    pub thinking: String,
    pub input_hint: String,
    pub new_chat: String,
    /// Appended to the transcript when a request fails.
    pub error_reply: String,
    /// Used when the stream completed without producing any text.
    pub empty_reply: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_url: "/api/chat".to_string(),
            send_delay_ms: 400,
            welcome_first_delay_ms: 500,
            welcome_step_delay_ms: 800,
            welcome_lines: vec![
                "שלום! 👋".to_string(),
                "אני העוזר הקהילתי של מוקד.".to_string(),
                "אני יכול לעזור לך עם שאלות על הפלטפורמה, אינטגרציות, סליקה, עיצוב ועוד."
                    .to_string(),
                "מה תרצה לדעת?".to_string(),
            ],
            quick_actions: vec![
                QuickAction {
                    label: "איך מחברים API?".to_string(),
                    icon: "🔌".to_string(),
                },
                QuickAction {
                    label: "סליקה עם Stripe".to_string(),
                    icon: "💳".to_string(),
                },
                QuickAction {
                    label: "בעיות אותנטיקציה".to_string(),
                    icon: "🔐".to_string(),
                },
                QuickAction {
                    label: "עיצוב RTL".to_string(),
                    icon: "◀".to_string(),
                },
            ],
            texts: UiTexts::default(),
        }
    }
}

impl Default for UiTexts {
    fn default() -> Self {
        Self {
            title: "עוזר קהילתי".to_string(),
            status_online: "מחובר".to_string(),
            status_typing: "מקליד...".to_string(),
            thinking: "חושב...".to_string(),
            input_hint: "כתבו שאלה...".to_string(),
            new_chat: "שיחה חדשה".to_string(),
            error_reply: "מצטער, קרתה שגיאה. אנא נסה שוב.".to_string(),
            empty_reply: "לא קיבלתי תשובה. נסה שוב.".to_string(),
        }
    }
}

impl WidgetConfig {
    /// The welcome text as it appears once collapsed into a single message.
    pub fn welcome_as_message(&self) -> String {
        self.welcome_lines.join("\n\n")
    }
}
