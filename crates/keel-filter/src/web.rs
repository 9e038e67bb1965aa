//! # Email, Domain and URL Syntax
//!
//! Syntax checks only: nothing is resolved or fetched. Each filter passes
//! the string through unchanged or rejects it with a single message,
//! whatever part of the value was wrong.

use std::net::Ipv4Addr;

use keel_core::message::{INVALID_DOMAIN, INVALID_EMAIL, INVALID_URL};
use keel_core::{FilterError, Message};
use serde_json::Value;
use url::Host;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_URL_LENGTH: usize = 2083;
const URL_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Characters allowed in an unquoted email local part besides letters and
/// digits.
const ATOM_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

macro_rules! syntax_filter {
    ($(#[$doc:meta])* $name:ident, $default:expr, $check:path) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            error_message: Message,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    error_message: Message::new($default),
                }
            }
        }

        impl $name {
            /// Reject with the default message.
            pub fn new() -> Self {
                Self::default()
            }

            /// Reject with `message` instead.
            pub fn error_message(mut self, message: impl Into<Message>) -> Self {
                self.error_message = message.into();
                self
            }
        }

        impl crate::Filter for $name {
            fn run(&self, value: Value) -> Result<Value, FilterError> {
                match value.as_str() {
                    Some(text) if $check(text) => Ok(value),
                    _ => Err(FilterError::invalid(self.error_message.clone())),
                }
            }
        }
    };
}

syntax_filter!(
    /// Accepts email addresses of the form `local-part@domain`.
    Email,
    INVALID_EMAIL,
    is_email
);

syntax_filter!(
    /// Accepts fully qualified domain names such as `example.com`.
    Domain,
    INVALID_DOMAIN,
    is_domain
);

syntax_filter!(
    /// Accepts `http`, `https` and `ftp` URLs whose host is a domain name
    /// or a public IPv4 address.
    Url,
    INVALID_URL,
    is_url
);

fn is_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_domain(text: &str) -> bool {
    if text.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    let labels: Vec<&str> = text.split('.').collect();
    let Some((tld, _)) = labels.split_last() else {
        return false;
    };
    labels.len() >= 2
        && labels.iter().all(|label| is_label(label))
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_atom(atom: &str) -> bool {
    !atom.is_empty()
        && atom
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ATOM_SPECIALS.contains(c))
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    local.len() <= MAX_LOCAL_PART_LENGTH && local.split('.').all(is_atom) && is_domain(domain)
}

fn is_public_ipv4(addr: Ipv4Addr) -> bool {
    let [first, .., last] = addr.octets();
    (1..=223).contains(&first)
        && (1..=254).contains(&last)
        && !addr.is_private()
        && !addr.is_loopback()
        && !addr.is_link_local()
}

fn is_port(port: &str) -> bool {
    (2..=5).contains(&port.len()) && port.chars().all(|c| c.is_ascii_digit())
}

/// The port as written. The parsed URL drops default ports and leading
/// zeros, so the digit count is read from the original text.
fn port_text(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("://")?;
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let authority = &rest[..end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    host_port.split_once(':').map(|(_, port)| port)
}

fn is_url(text: &str) -> bool {
    if text.len() > MAX_URL_LENGTH
        || !text.contains("://")
        || text.chars().any(char::is_whitespace)
    {
        return false;
    }
    let Ok(url) = url::Url::parse(text) else {
        return false;
    };
    if !URL_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    let host_ok = match url.host() {
        Some(Host::Domain(domain)) => !domain.contains("--") && is_domain(domain),
        Some(Host::Ipv4(addr)) => is_public_ipv4(addr),
        Some(Host::Ipv6(_)) | None => false,
    };
    host_ok && port_text(text).map_or(true, is_port)
}
