use regex::Regex;

/// User agent fragments of link unfurlers, chat apps and scripted clients.
pub const BOT_UA_PATTERN: &str = "(?i)bot|facebook|embed|got|firefox/92|firefox/38|curl|wget|go-http|yahoo|generator|whatsapp|preview|link|proxy|vkshare|images|analyzer|index|crawl|spider|python|cfnetwork|node";

/// Decides whether a request most likely comes from an automated unfurler.
#[derive(Debug, Clone)]
pub struct BotDetector {
    pattern: Regex,
}

impl BotDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_pattern(BOT_UA_PATTERN)
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// A request without a user agent is treated as a human.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        user_agent.is_some_and(|ua| self.pattern.is_match(ua))
    }
}
