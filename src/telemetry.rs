/// Fire-and-forget event sink plus the social share links shown on the end
/// screen.  Games must behave identically with `NoopTelemetry`.

use std::fmt;
use std::str::FromStr;

use tracing::info;

pub trait Telemetry {
    fn emit(&mut self, name: &str, payload: &[(&str, String)]);
}

impl<T: Telemetry + ?Sized> Telemetry for &mut T {
    fn emit(&mut self, name: &str, payload: &[(&str, String)]) {
        (**self).emit(name, payload)
    }
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn emit(&mut self, name: &str, payload: &[(&str, String)]) {
        (**self).emit(name, payload)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn emit(&mut self, _name: &str, _payload: &[(&str, String)]) {}
}

/// Writes each event to the log under the `telemetry` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&mut self, name: &str, payload: &[(&str, String)]) {
        let fields = payload
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "telemetry", event = name, %fields);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub name: String,
    pub payload: Vec<(String, String)>,
}

impl TelemetryEvent {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingTelemetry {
    pub events: Vec<TelemetryEvent>,
}

impl RecordingTelemetry {
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn last(&self, name: &str) -> Option<&TelemetryEvent> {
        self.events.iter().rev().find(|e| e.name == name)
    }
}

impl Telemetry for RecordingTelemetry {
    fn emit(&mut self, name: &str, payload: &[(&str, String)]) {
        self.events.push(TelemetryEvent {
            name: name.to_string(),
            payload: payload
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
    }
}

// ── Sharing ──────────────────────────────────────────────────────────────────

const SITE_URL: &str = "https://codecrusaders.co.uk";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharePlatform {
    Twitter,
    LinkedIn,
    Facebook,
}

impl SharePlatform {
    pub fn name(self) -> &'static str {
        match self {
            SharePlatform::Twitter => "twitter",
            SharePlatform::LinkedIn => "linkedin",
            SharePlatform::Facebook => "facebook",
        }
    }

    /// End-screen hotkeys `1`, `2`, `3`.
    pub fn from_hotkey(key: char) -> Option<Self> {
        match key {
            '1' => Some(SharePlatform::Twitter),
            '2' => Some(SharePlatform::LinkedIn),
            '3' => Some(SharePlatform::Facebook),
            _ => None,
        }
    }
}

impl fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SharePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(SharePlatform::Twitter),
            "linkedin" => Ok(SharePlatform::LinkedIn),
            "facebook" => Ok(SharePlatform::Facebook),
            other => Err(format!("unknown share platform `{other}`")),
        }
    }
}

pub fn share_message(game: &str, score: u32) -> String {
    format!(
        "I just got {score} on {game}. A retro fun game pre-teens can build. \
         Get the tutorial at codecrusaders.co.uk #kidcoders #codingforkids #codingisfun"
    )
}

/// Prefilled share link with the score embedded in the message.
pub fn share_url(platform: SharePlatform, game: &str, score: u32) -> String {
    let message = encode_uri_component(&share_message(game, score));
    let site = encode_uri_component(SITE_URL);
    match platform {
        SharePlatform::Twitter => format!("https://twitter.com/intent/tweet?text={message}"),
        SharePlatform::LinkedIn => format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={site}&summary={message}"
        ),
        SharePlatform::Facebook => {
            format!("https://www.facebook.com/sharer/sharer.php?u={site}&quote={message}")
        }
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
