//! Mailbox syntax checking for guardian emails.
//!
//! Address syntax is parsed by `email_address` (RFC 5322 local part, RFC 1034 domain labels,
//! internationalized addresses). On top of that a mailbox here must use a plain host name with a
//! real top-level domain: no domain literals, no display names, no special-use names. There is
//! no DNS or deliverability lookup.

use email_address::{EmailAddress, Error, Options};

const MAX_ADDRESS_LEN: usize = 254;

/// Domains reserved for special use that can never receive mail.
const SPECIAL_USE_DOMAINS: &[&str] = &["arpa", "invalid", "local", "localhost", "onion", "test"];

const PARSE_OPTIONS: Options = Options {
    minimum_sub_domains: 2,
    allow_domain_literal: false,
    allow_display_text: false,
};

/// Check `address` (already trimmed) and return a human-readable reason on failure.
pub fn check_mailbox(address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("The email address is empty.".to_string());
    }

    let parsed = EmailAddress::parse_with_options(address, PARSE_OPTIONS)
        .map_err(|e| describe(address, e))?;

    check_host_name(parsed.domain())?;

    let len = address.chars().count();
    if len > MAX_ADDRESS_LEN {
        return Err(format!(
            "The email address is too long ({} characters too many).",
            len - MAX_ADDRESS_LEN
        ));
    }
    Ok(())
}

/// Returns `true` if `address` passes [`check_mailbox`].
pub fn is_valid_mailbox(address: &str) -> bool {
    check_mailbox(address).is_ok()
}

fn describe(address: &str, error: Error) -> String {
    let reason = match error {
        Error::MissingSeparator => "The email address is not valid. It must have exactly one @-sign.",
        Error::InvalidCharacter if has_unquoted_extra_at(address) => {
            "The email address is not valid. It must have exactly one @-sign."
        }
        Error::InvalidCharacter | Error::UnbalancedQuotes | Error::InvalidComment => {
            "The email address contains invalid characters or misplaced periods."
        }
        Error::LocalPartEmpty => "There must be something before the @-sign.",
        Error::DomainEmpty => "There must be something after the @-sign.",
        Error::LocalPartTooLong => "The email address is too long before the @-sign.",
        Error::DomainTooLong => "The email address is too long after the @-sign.",
        Error::SubDomainEmpty | Error::DomainInvalidSeparator => {
            "The part after the @-sign cannot start or end with a period or have two periods in a row."
        }
        Error::SubDomainTooLong => "After the @-sign, periods cannot be separated by so many characters.",
        Error::DomainTooFew => "The part after the @-sign is not valid. It should have a period.",
        Error::UnsupportedDomainLiteral | Error::InvalidIPAddress => {
            "A bracketed IP address after the @-sign is not allowed here."
        }
        Error::UnsupportedDisplayName | Error::MissingDisplayName | Error::MissingEndBracket => {
            "The email address cannot include a display name or angle brackets."
        }
    };
    reason.to_string()
}

fn has_unquoted_extra_at(address: &str) -> bool {
    !address.starts_with('"') && address.matches('@').count() > 1
}

/// Labels must be letters, digits and inner hyphens, and the last label must be a real TLD.
fn check_host_name(domain: &str) -> Result<(), String> {
    if let Some(c) = domain
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '-' || *c == '.'))
    {
        return Err(format!("The part after the @-sign contains invalid characters: '{c}'."));
    }

    let domain = domain.to_lowercase();
    let Some((_, tld)) = domain.rsplit_once('.') else {
        return Err("The part after the @-sign is not valid. It should have a period.".to_string());
    };
    if tld.chars().all(|c| c.is_ascii_digit()) {
        return Err(
            "The part after the @-sign is not valid. It is not within a valid top-level domain."
                .to_string(),
        );
    }
    if SPECIAL_USE_DOMAINS.contains(&tld) {
        return Err(
            "The part after the @-sign is a special-use or reserved name that cannot be used with email."
                .to_string(),
        );
    }
    Ok(())
}
