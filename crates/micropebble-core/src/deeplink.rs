//! Deep-link parsing.
//!
//! Maps incoming URIs (shared `content://` package files, the custom
//! `micropebble://` scheme) onto typed in-app navigation targets.

use percent_encoding::percent_decode_str;
use url::Url;

/// In-app destination a deep link resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    /// Sideload an app/watchface package (`.pbw`) from a shared content URI.
    SideloadApp { uri: String },
    /// Sideload a firmware archive (`.pbz`) from a shared content URI.
    SideloadFirmware { uri: String },
    /// Open the watch apps (locker) screen.
    WatchApps,
}

/// Parse a deep-link URI into a navigation target.
///
/// Returns `None` for URIs this app does not handle; callers should ignore
/// those rather than treat them as errors.
pub fn parse(uri: &str) -> Option<NavTarget> {
    let url = Url::parse(uri).ok()?;

    match url.scheme() {
        "micropebble" => match url.host_str() {
            Some("watchapps") => Some(NavTarget::WatchApps),
            _ => None,
        },
        "content" => {
            // Content providers percent-encode the display name; the package
            // kind is decided by the decoded extension.
            let decoded = percent_decode_str(url.path()).decode_utf8_lossy();
            let lower = decoded.to_ascii_lowercase();
            if lower.ends_with(".pbw") {
                Some(NavTarget::SideloadApp {
                    uri: uri.to_string(),
                })
            } else if lower.ends_with(".pbz") {
                Some(NavTarget::SideloadFirmware {
                    uri: uri.to_string(),
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchapps_scheme() {
        assert_eq!(parse("micropebble://watchapps"), Some(NavTarget::WatchApps));
        assert_eq!(parse("micropebble://settings"), None);
    }

    #[test]
    fn test_content_pbw_maps_to_app_sideload() {
        let uri = "content://downloads/all_downloads/1234/snake.pbw";
        assert_eq!(
            parse(uri),
            Some(NavTarget::SideloadApp {
                uri: uri.to_string()
            })
        );
    }

    #[test]
    fn test_content_pbz_maps_to_firmware_sideload() {
        let uri = "content://downloads/all_downloads/99/fw-4.3.pbz";
        assert_eq!(
            parse(uri),
            Some(NavTarget::SideloadFirmware {
                uri: uri.to_string()
            })
        );
    }

    #[test]
    fn test_percent_encoded_extension() {
        let uri = "content://provider/doc/my%20watchface.PBW";
        assert!(matches!(parse(uri), Some(NavTarget::SideloadApp { .. })));
    }

    #[test]
    fn test_unhandled_uris_are_ignored() {
        assert_eq!(parse("content://provider/doc/readme.txt"), None);
        assert_eq!(parse("https://example.com/app.pbw"), None);
        assert_eq!(parse("not a uri"), None);
    }
}
