//! Header text to semantic column resolution.

/// Normalize a header into its slug: lower-case, trimmed, every run of characters outside
/// `a-z` collapsed to one hyphen, with no hyphen at either end.
pub fn normalize(header: &str) -> String {
    let lowered = header.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_separator = false;

    for ch in lowered.trim().chars() {
        if ch.is_ascii_lowercase() {
            if in_separator && !slug.is_empty() {
                slug.push('-');
            }
            in_separator = false;
            slug.push(ch);
        } else {
            in_separator = true;
        }
    }

    slug
}

/// Logical column a header maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    DiscordId,
    DiscordLink,
    Poster,
    Title,
    Details,
    Tags,
    SaveFiles,
    LogFiles,
    Media,
    Image,
    CreateDate,
    LastPostDate,
    /// Blank or unrecognized header; always rendered empty.
    Unmapped,
}

impl HeaderField {
    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "discord-id" => HeaderField::DiscordId,
            "discord-link" => HeaderField::DiscordLink,
            "reporter" | "poster" => HeaderField::Poster,
            "title" => HeaderField::Title,
            "details" | "message" => HeaderField::Details,
            "tags" => HeaderField::Tags,
            "save-files" => HeaderField::SaveFiles,
            "log-files" => HeaderField::LogFiles,
            "media" => HeaderField::Media,
            "image" => HeaderField::Image,
            "create-date" => HeaderField::CreateDate,
            "last-post-date" => HeaderField::LastPostDate,
            _ => HeaderField::Unmapped,
        }
    }

    pub fn from_header(header: &str) -> Self {
        Self::from_slug(&normalize(header))
    }
}
