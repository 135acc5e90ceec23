//! Media types for data URI embedding

/// Extension to media type table for resources referenced from CSS
const MEDIA_TYPES: &[(&str, &str)] = &[
    (".woff", "application/font-woff"),
    (".woff2", "application/font-woff"),
    (".ttf", "application/x-font-ttf"),
    (".otf", "application/x-font-otf"),
    (".eot", "application/vnd.ms-fontobject"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".svg", "image/svg+xml"),
    (".webp", "image/webp"),
    (".avif", "image/avif"),
    (".bmp", "image/bmp"),
    (".ico", "image/x-icon"),
    (".cur", "image/x-icon"),
];

/// Media type used for inlined icons
pub const ICON_MEDIA_TYPE: &str = "image/x-icon";

/// Look up the media type for an extension such as `.woff`
pub fn media_type_for(extension: &str) -> Option<&'static str> {
    let ext = extension.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, media_type)| *media_type)
}
