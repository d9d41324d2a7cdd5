//! Placeholder substitution for narration templates.
//!
//! Supported placeholders: `{{USER}}`, `{{CHANNEL}}`, `{{DISPLAY_NAME}}`
//! and `{{NICKNAME}}`. Values are sanitized first. A value that was
//! non-empty but sanitized down to nothing is replaced by a generic word so
//! the sentence still makes sense; a value that was empty to begin with
//! (e.g. the local user's own name when it should not be spoken) stays empty.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::sanitize::sanitize;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(USER|CHANNEL|DISPLAY_NAME|NICKNAME)\}\}").expect("static regex"));

const SOMEONE: &str = "Someone";
const SOME_CHANNEL: &str = "channel";

/// Values substituted into a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Speaker<'a> {
    pub user: &'a str,
    pub channel: &'a str,
    pub display_name: &'a str,
    pub nickname: &'a str,
}

fn cleaned_or(raw: &str, fallback: &str, latin_only: bool) -> String {
    let cleaned = sanitize(raw, latin_only);
    if cleaned.is_empty() && !raw.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Fill every placeholder in `template` in one left-to-right pass; inserted
/// values are never scanned for placeholders. The result is trimmed so a
/// blank leading name does not leave a dangling space.
pub fn format(template: &str, speaker: Speaker<'_>, latin_only: bool) -> String {
    let user = cleaned_or(speaker.user, SOMEONE, latin_only);
    let channel = cleaned_or(speaker.channel, SOME_CHANNEL, latin_only);
    let display_name = cleaned_or(speaker.display_name, SOMEONE, latin_only);
    let nickname = cleaned_or(speaker.nickname, SOMEONE, latin_only);

    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "USER" => user.as_str(),
            "CHANNEL" => channel.as_str(),
            "DISPLAY_NAME" => display_name.as_str(),
            _ => nickname.as_str(),
        })
        .trim()
        .to_string()
}
