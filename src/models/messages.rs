use serde::Serialize;

/// Outbound message in the messaging platform's JSON shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Template {
        #[serde(rename = "altText")]
        alt_text: String,
        template: Template,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: FlexContainer,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: None,
        }
    }

    pub fn text_with_actions(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: Some(QuickReply::from_actions(actions)),
        }
    }

    /// Text body of a text message, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Every tappable action carried by this message
    pub fn actions(&self) -> Vec<&Action> {
        match self {
            Message::Text { quick_reply, .. } => quick_reply
                .iter()
                .flat_map(|q| q.items.iter().map(|i| &i.action))
                .collect(),
            Message::Template { template: Template::Buttons { actions, .. }, .. } => actions.iter().collect(),
            Message::Flex { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText", skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    Location {
        label: String,
    },
    Uri {
        label: String,
        uri: String,
    },
}

impl Action {
    pub fn postback(label: impl Into<String>, data: impl Into<String>) -> Self {
        let label = label.into();
        Action::Postback {
            display_text: Some(label.clone()),
            label,
            data: data.into(),
        }
    }

    pub fn location(label: impl Into<String>) -> Self {
        Action::Location { label: label.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

impl QuickReply {
    pub fn from_actions(actions: Vec<Action>) -> Self {
        Self {
            items: actions
                .into_iter()
                .map(|action| QuickReplyItem {
                    kind: "action",
                    action,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Template {
    Buttons {
        title: String,
        text: String,
        actions: Vec<Action>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexContainer {
    Bubble(Bubble),
    Carousel { contents: Vec<FlexContainer> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub hero: FlexComponent,
    pub body: FlexComponent,
    pub footer: FlexComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlexComponent {
    Box {
        layout: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        spacing: Option<String>,
        contents: Vec<FlexComponent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        flex: Option<u8>,
    },
    Text {
        text: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        wrap: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        weight: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Image {
        url: String,
        size: String,
        #[serde(rename = "aspectRatio")]
        aspect_ratio: String,
        #[serde(rename = "aspectMode")]
        aspect_mode: String,
    },
    Button {
        style: String,
        height: String,
        action: Action,
    },
}

/// Body of a reply API call
#[derive(Debug, Serialize)]
pub struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    pub reply_token: &'a str,
    pub messages: &'a [Message],
}

/// Body of a push API call
#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub to: &'a str,
    pub messages: &'a [Message],
}
