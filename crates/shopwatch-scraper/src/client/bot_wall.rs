//! Detection of anti-automation interstitials served with a 200 status.

/// Challenge-platform markers that only appear on interstitials.
const CHALLENGE_MARKERS: [&str; 4] = [
    "attention required! | cloudflare",
    "/cdn-cgi/challenge-platform/",
    "cf-chl-",
    "cf_chl_opt",
];

/// Phrases that also occur on real storefronts (a reCAPTCHA-protected
/// newsletter form, an "access denied" help link). Unlike the challenge
/// markers they only mark a body as a bot wall when it is at most
/// [`INTERSTITIAL_MAX_BYTES`] long; a larger page containing them is
/// treated as real content.
const INTERSTITIAL_PHRASES: [&str; 3] = ["just a moment", "captcha", "access denied"];

/// Interstitials are small; full listing pages are not.
const INTERSTITIAL_MAX_BYTES: usize = 32 * 1024;

/// Returns `true` if `body` looks like a bot-wall page rather than content.
#[must_use]
pub fn looks_like_bot_wall(body: &str) -> bool {
    let lowered = body.to_lowercase();
    if CHALLENGE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return true;
    }
    body.len() <= INTERSTITIAL_MAX_BYTES
        && INTERSTITIAL_PHRASES.iter().any(|m| lowered.contains(m))
}
