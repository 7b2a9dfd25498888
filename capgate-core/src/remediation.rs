//! Browser-specific instructions for restoring denied permissions.

use std::fmt;

/// Which device capability an instruction list is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
    Biometric,
}

/// Browser family, as far as the permission settings UI is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserFamily {
    /// Any browser on iOS/iPadOS; they all defer to the Settings app.
    Ios,
    Samsung,
    Edge,
    Firefox,
    Chrome,
    Safari,
    Other,
}

impl BrowserFamily {
    /// Classify a user agent string.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent;
        if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
            Self::Ios
        } else if ua.contains("SamsungBrowser") {
            Self::Samsung
        } else if ua.contains("Edg/") || ua.contains("EdgA/") {
            Self::Edge
        } else if ua.contains("Firefox/") {
            Self::Firefox
        } else if ua.contains("Chrome/") || ua.contains("Chromium/") {
            Self::Chrome
        } else if ua.contains("Safari/") {
            Self::Safari
        } else {
            Self::Other
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::Samsung => "Samsung Internet",
            Self::Edge => "Microsoft Edge",
            Self::Firefox => "Firefox",
            Self::Chrome => "Chrome",
            Self::Safari => "Safari",
            Self::Other => "your browser",
        }
    }
}

impl fmt::Display for BrowserFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered steps the user can follow to re-enable a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub browser: BrowserFamily,
    pub capability: Capability,
    pub steps: &'static [&'static str],
}

impl Remediation {
    pub fn for_browser(browser: BrowserFamily, capability: Capability) -> Self {
        Self {
            browser,
            capability,
            steps: steps(browser, capability),
        }
    }
}

fn steps(browser: BrowserFamily, capability: Capability) -> &'static [&'static str] {
    match (browser, capability) {
        (BrowserFamily::Ios, Capability::Camera) => &[
            "Open the Settings app.",
            "Scroll down and tap your browser (for example Safari).",
            "Tap Camera and choose Allow.",
            "Return here and reload the page.",
        ],
        (BrowserFamily::Ios, Capability::Biometric) => &[
            "Open Settings > Face ID & Passcode (or Touch ID & Passcode).",
            "Make sure Face ID or Touch ID is set up.",
            "Check that Settings > Passwords > Password Options allows passkeys.",
            "Return here and try again.",
        ],
        (BrowserFamily::Samsung, Capability::Camera) => &[
            "Tap the lock icon next to the address.",
            "Tap Permissions and allow Camera.",
            "If it is still blocked, open Android Settings > Apps > Samsung Internet > Permissions.",
            "Reload the page.",
        ],
        (BrowserFamily::Chrome | BrowserFamily::Edge, Capability::Camera) => &[
            "Click the camera or lock icon in the address bar.",
            "Set Camera to Allow for this site.",
            "Reload the page.",
        ],
        (BrowserFamily::Firefox, Capability::Camera) => &[
            "Click the permissions icon at the left of the address bar.",
            "Remove the Blocked Temporarily or Blocked entry for Camera.",
            "Reload the page and choose Allow when prompted.",
        ],
        (BrowserFamily::Safari, Capability::Camera) => &[
            "Open Safari > Settings for This Website.",
            "Set Camera to Allow.",
            "Reload the page.",
        ],
        (
            BrowserFamily::Samsung
            | BrowserFamily::Chrome
            | BrowserFamily::Edge
            | BrowserFamily::Firefox
            | BrowserFamily::Safari,
            Capability::Biometric,
        ) => &[
            "Make sure a screen lock and fingerprint, face or Windows Hello sign-in is set up on this device.",
            "Use the browser's regular (not private) window.",
            "When the prompt appears, confirm with your fingerprint, face or PIN instead of cancelling.",
        ],
        (BrowserFamily::Other, Capability::Camera) => &[
            "Open your browser's site settings for this page.",
            "Allow camera access.",
            "Reload the page.",
        ],
        (BrowserFamily::Other, Capability::Biometric) => &[
            "Use an up-to-date browser that supports passkeys.",
            "Set up a screen lock with fingerprint or face unlock on this device.",
            "Try again and confirm the prompt.",
        ],
    }
}
