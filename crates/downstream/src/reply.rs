use chat_dispatch_core::ForwardError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DownstreamReply {
    reply: ReplyContent,
}

/// Downstream services answer either with plain text or with a list of
/// content blocks, depending on the model behind them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyContent {
    Text(String),
    Blocks(Vec<ReplyBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyBlock {
    Bare(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        text: Option<String>,
    },
}

impl ReplyContent {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Blocks(blocks) => blocks
                .into_iter()
                .filter_map(|block| match block {
                    ReplyBlock::Bare(text) => Some(text),
                    ReplyBlock::Typed { kind, text } if kind == "text" => text,
                    ReplyBlock::Typed { .. } => None,
                })
                .collect(),
        }
    }
}

/// Extracts the reply text from a downstream `/chat` response body.
pub fn parse_reply(body: &[u8]) -> Result<String, ForwardError> {
    serde_json::from_slice::<DownstreamReply>(body)
        .map(|payload| payload.reply.into_text())
        .map_err(|err| ForwardError::Malformed(err.to_string()))
}
