use std::fmt;
use url::Url;

/// Chat site the page script is running on. Only used to label diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    ChatGpt,
    Claude,
    Gemini,
    Perplexity,
    Grok,
    DeepSeek,
    Copilot,
    Unknown,
}

impl Platform {
    /// Guess the platform from a hostname. First matching rule wins.
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.to_ascii_lowercase();
        let has = |needle: &str| host.contains(needle);

        if has("chatgpt") || has("openai") {
            Platform::ChatGpt
        } else if has("claude") {
            Platform::Claude
        } else if has("gemini") || has("bard") {
            Platform::Gemini
        } else if has("perplexity") {
            Platform::Perplexity
        } else if has("grok") || has("x.com") {
            Platform::Grok
        } else if has("deepseek") {
            Platform::DeepSeek
        } else if has("copilot") || has("microsoft") {
            Platform::Copilot
        } else {
            Platform::Unknown
        }
    }

    /// Same as [`Platform::from_hostname`], starting from a full URL.
    /// Anything without a host is `Unknown`.
    pub fn from_url(url: &str) -> Self {
        hostname_of(url)
            .map(|host| Self::from_hostname(&host))
            .unwrap_or(Platform::Unknown)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::ChatGpt => "ChatGPT",
            Platform::Claude => "Claude",
            Platform::Gemini => "Gemini",
            Platform::Perplexity => "Perplexity",
            Platform::Grok => "Grok",
            Platform::DeepSeek => "DeepSeek",
            Platform::Copilot => "Copilot",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host part of a URL as the browser parses it, or `None` when the URL has
/// no host.
pub fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_owned))
}
