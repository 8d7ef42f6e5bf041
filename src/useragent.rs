//! User-agent classification
//!
//! Decides whether a request comes from a link-preview crawler and derives
//! the coarse platform label stored with every analytics event. Matching is
//! case-insensitive substring containment.

use std::fmt;

/// Crawler substrings (lowercase). Order matters for platform labelling.
const CRAWLERS: &[(&str, Option<Platform>)] = &[
    ("facebookexternalhit", Some(Platform::Facebook)),
    ("twitterbot", Some(Platform::Twitter)),
    ("linkedinbot", Some(Platform::LinkedIn)),
    ("whatsapp", Some(Platform::WhatsApp)),
    ("discordbot", Some(Platform::Discord)),
    ("slackbot", Some(Platform::Slack)),
    ("telegrambot", Some(Platform::Telegram)),
    ("applebot", None),
    ("pinterest", None),
    ("skypeuripreview", None),
    ("redditbot", None),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Twitter,
    LinkedIn,
    WhatsApp,
    Discord,
    Slack,
    Telegram,
    Chrome,
    Firefox,
    Safari,
    Other,
    Unknown,
}

impl Platform {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter",
            Platform::LinkedIn => "LinkedIn",
            Platform::WhatsApp => "WhatsApp",
            Platform::Discord => "Discord",
            Platform::Slack => "Slack",
            Platform::Telegram => "Telegram",
            Platform::Chrome => "Chrome",
            Platform::Firefox => "Firefox",
            Platform::Safari => "Safari",
            Platform::Other => "Other",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if the user agent belongs to a known link-preview crawler.
pub fn is_crawler(user_agent: &str) -> bool {
    if user_agent.is_empty() {
        return false;
    }

    let ua = user_agent.to_lowercase();
    CRAWLERS.iter().any(|(needle, _)| ua.contains(needle))
}

/// Coarse platform label for analytics.
///
/// Labelled crawlers win over browsers. Chrome user agents also carry
/// "safari", so Safari only matches when "chrome" is absent.
pub fn classify_platform(user_agent: &str) -> Platform {
    if user_agent.is_empty() {
        return Platform::Unknown;
    }

    let ua = user_agent.to_lowercase();

    if let Some(platform) = CRAWLERS
        .iter()
        .filter(|(needle, _)| ua.contains(needle))
        .find_map(|(_, platform)| *platform)
    {
        return platform;
    }

    if ua.contains("chrome") {
        Platform::Chrome
    } else if ua.contains("firefox") {
        Platform::Firefox
    } else if ua.contains("safari") {
        Platform::Safari
    } else {
        Platform::Other
    }
}
