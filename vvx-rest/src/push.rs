use quick_xml::escape::escape;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Priority attribute of a push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPriority {
    Normal,
    Important,
    Critical,
}

impl PushPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushPriority::Normal => "Normal",
            PushPriority::Important => "Important",
            PushPriority::Critical => "Critical",
        }
    }
}

impl Default for PushPriority {
    fn default() -> Self {
        PushPriority::Normal
    }
}

impl Display for PushPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PushPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PushPriority::Normal,
            PushPriority::Important,
            PushPriority::Critical,
        ]
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| {
            format!(
                "Unsupported push priority \"{}\". Supported values: Normal, Important, Critical",
                s
            )
        })
    }
}

/// Content of a `<PolycomIPPhone>` push document.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub priority: PushPriority,
    /// Inserted into `<Data>` verbatim.
    pub content: String,
}

impl PushMessage {
    /// Plain text, escaped so the phone renders it literally.
    pub fn text(priority: PushPriority, text: &str) -> Self {
        PushMessage {
            priority,
            content: escape(text).into_owned(),
        }
    }

    /// Caller supplied markup, sent as is.
    pub fn markup(priority: PushPriority, markup: impl Into<String>) -> Self {
        PushMessage {
            priority,
            content: markup.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "<PolycomIPPhone><Data priority=\"{}\">{}</Data></PolycomIPPhone>",
            self.priority, self.content
        )
    }
}
