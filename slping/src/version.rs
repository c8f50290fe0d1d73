//! Release name to protocol number lookup.
//! [Protocol version numbers](https://wiki.vg/Protocol_version_numbers)

/// The newest protocol this table knows about, sent when the caller does not ask
/// for a specific version.
pub const LATEST: u32 = 772;

/// Release names and their protocol numbers, newest first.
static VERSIONS: &[(&str, u32)] = &[
    ("1.21.8", 772),
    ("1.21.7", 772),
    ("1.21.6", 771),
    ("1.21.5", 770),
    ("1.21.4", 769),
    ("1.21.3", 768),
    ("1.21.2", 768),
    ("1.21.1", 767),
    ("1.21", 767),
    ("1.20.6", 766),
    ("1.20.5", 766),
    ("1.20.4", 765),
    ("1.20.3", 765),
    ("1.20.2", 764),
    ("1.20.1", 763),
    ("1.20", 763),
    ("1.19.4", 762),
    ("1.19.3", 761),
    ("1.19.2", 760),
    ("1.19.1", 760),
    ("1.19", 759),
    ("1.18.2", 758),
    ("1.18.1", 757),
    ("1.18", 757),
    ("1.17.1", 756),
    ("1.17", 755),
    ("1.16.5", 754),
    ("1.16.4", 754),
    ("1.16.3", 753),
    ("1.16.2", 751),
    ("1.16.1", 736),
    ("1.16", 735),
    ("1.15.2", 578),
    ("1.15.1", 575),
    ("1.15", 573),
    ("1.14.4", 498),
    ("1.14.3", 490),
    ("1.14.2", 485),
    ("1.14.1", 480),
    ("1.14", 477),
    ("1.13.2", 404),
    ("1.13.1", 401),
    ("1.13", 393),
    ("1.12.2", 340),
    ("1.12.1", 338),
    ("1.12", 335),
    ("1.11.2", 316),
    ("1.11.1", 316),
    ("1.11", 315),
    ("1.10.2", 210),
    ("1.10.1", 210),
    ("1.10", 210),
    ("1.9.4", 110),
    ("1.9.3", 110),
    ("1.9.2", 109),
    ("1.9.1", 108),
    ("1.9", 107),
    ("1.8.9", 47),
    ("1.8.8", 47),
    ("1.8", 47),
    ("1.7.10", 5),
    ("1.7.6", 5),
    ("1.7.5", 4),
    ("1.7.2", 4),
];

/// Resolves a version token to a protocol number.
///
/// Accepts a bare protocol number (`"47"`), `"latest"`, or a release name
/// (`"1.20.4"`).
#[must_use]
pub fn protocol_number(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("latest") {
        return Some(LATEST);
    }
    if let Ok(number) = token.parse() {
        return Some(number);
    }
    VERSIONS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|&(_, number)| number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers() {
        assert_eq!(protocol_number("1.8.9"), Some(47));
        assert_eq!(protocol_number("1.20.4"), Some(765));
        assert_eq!(protocol_number("47"), Some(47));
        assert_eq!(protocol_number(" 1.12.2 "), Some(340));
        assert_eq!(protocol_number("latest"), Some(LATEST));
        assert_eq!(protocol_number("LATEST"), Some(LATEST));
        assert_eq!(protocol_number("beta"), None);
        assert_eq!(protocol_number("1.99"), None);
    }

    #[test]
    fn latest_is_first_entry() {
        assert_eq!(VERSIONS[0].1, LATEST);
        assert!(VERSIONS.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    }
}
