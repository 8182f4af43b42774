use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DOMAIN: &str = "rugby";

/// The two instruction templates observed in deployments. Permissive lets the
/// model fall back on general domain knowledge; strict confines it to the
/// retrieved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    Permissive,
    Strict,
}

impl FromStr for PromptVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown prompt variant {other:?}, expected \"permissive\" or \"strict\""
            )),
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => formatter.write_str("permissive"),
            Self::Strict => formatter.write_str("strict"),
        }
    }
}

/// Pure prompt renderer: fixed template, context and question embedded
/// verbatim.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    variant: PromptVariant,
    domain: String,
}

impl PromptBuilder {
    pub fn new(variant: PromptVariant, domain: impl Into<String>) -> Self {
        Self {
            variant,
            domain: domain.into(),
        }
    }

    pub fn variant(&self) -> PromptVariant {
        self.variant
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        match self.variant {
            PromptVariant::Permissive => format!(
                "You are an expert on {domain}. Answer the question using primarily the \
                 context provided.\n\
                 \n\
                 If the context contains relevant information, use it first.\n\
                 If the context is incomplete, complete it with your general knowledge of \
                 {domain}.\n\
                 If the question is not about {domain}, say so politely and offer to answer \
                 questions about {domain} instead.\n\
                 \n\
                 Document context:\n\
                 {context}\n\
                 \n\
                 Question: {question}\n\
                 \n\
                 Clear and concise answer:",
                domain = self.domain,
            ),
            PromptVariant::Strict => format!(
                "Answer the question using only the context below.\n\
                 If the context does not contain the information needed, say \"I don't know\".\n\
                 \n\
                 Context:\n\
                 {context}\n\
                 \n\
                 Question: {question}\n\
                 \n\
                 Answer:",
            ),
        }
    }
}
