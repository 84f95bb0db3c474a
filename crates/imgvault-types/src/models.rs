use std::fmt;

use uuid::Uuid;

/// The authenticated caller, attached to a request by the auth middleware.
///
/// Handlers read the owner of a request from `id` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageContentType {
    Jpeg,
    Png,
    Gif,
}

impl ImageContentType {
    pub const ALL: [ImageContentType; 3] = [Self::Jpeg, Self::Png, Self::Gif];

    /// Match a MIME type against the allow-list. Parameters such as
    /// `; charset=...` are ignored, comparison is case-insensitive.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_mime().eq_ignore_ascii_case(essence))
    }

    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}

impl fmt::Display for ImageContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}
