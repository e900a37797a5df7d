//! Relay-safe sender address encoding.
//!
//! Transactional mail services only accept a verified identity as the
//! authenticated sender. [`AddressCodec`] folds the original sender's
//! mailbox into the local-part of such an identity so that a human reading
//! the `From` header can still tell who really wrote the message.

use std::fmt::{self, Display};

/// Ordered `(pattern, replacement)` rules applied to the address token.
///
/// Rules run left-to-right, each one replacing every non-overlapping
/// occurrence of its pattern before the next rule is applied.
pub const ADDRESS_RULES: [(&str, &str); 3] = [("@", "_at_"), (".", "_dot_"), ("+", "_plus_")];

/// Encoder for relay-safe sender addresses.
#[derive(Debug, Clone, Copy)]
pub struct AddressCodec {
    rules: &'static [(&'static str, &'static str)],
}

impl Default for AddressCodec {
    fn default() -> Self {
        Self {
            rules: &ADDRESS_RULES,
        }
    }
}

impl AddressCodec {
    /// Creates a codec using the standard [`ADDRESS_RULES`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites a single address token using the codec rules.
    ///
    /// ```rust
    /// let codec = mailrelay_utils::AddressCodec::new();
    /// assert_eq!(codec.rewrite("john.doe+news@example.com"), "john_dot_doe_plus_news_at_example_dot_com");
    /// ```
    pub fn rewrite(&self, address: &str) -> String {
        self.rules
            .iter()
            .fold(address.to_string(), |acc, (pattern, replacement)| {
                acc.replace(pattern, replacement)
            })
    }

    /// Encodes a raw `From` value into a relay-safe mailbox.
    ///
    /// The last whitespace-delimited token is the address, every token
    /// before it forms the display name. The address is rewritten and
    /// `_` + `suffix` is appended; the display name, when present, is kept
    /// in front of the angle-bracketed result.
    ///
    /// ```rust
    /// let codec = mailrelay_utils::AddressCodec::new();
    /// assert_eq!(codec.encode("Name user@ex.com", "s"), "Name <user_at_ex_dot_com_s>");
    /// assert_eq!(codec.encode("user@ex.com", "s"), "user_at_ex_dot_com_s");
    /// ```
    pub fn encode(&self, original_from: &str, suffix: &str) -> String {
        self.sender(original_from, suffix).to_string()
    }

    /// Same as [`AddressCodec::encode`], keeping the display name and the
    /// rewritten address apart.
    pub fn sender(&self, original_from: &str, suffix: &str) -> EncodedSender {
        let mut tokens: Vec<&str> = original_from.split_whitespace().collect();
        let address = tokens.pop().unwrap_or_default();
        EncodedSender {
            name: (!tokens.is_empty()).then(|| tokens.join(" ")),
            address: format!("{}_{suffix}", self.rewrite(address)),
        }
    }
}

/// A relay-safe sender, split into its display name and address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSender {
    /// Display name tokens of the original `From` value, verbatim.
    pub name: Option<String>,
    pub address: String,
}

impl Display for EncodedSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    fn encode_sender(original_from: &str, suffix: &str) -> String {
        AddressCodec::new().encode(original_from, suffix)
    }

    #[test]
    fn test_encode_with_display_name() {
        assert_eq!(
            encode_sender("Name user@ex.com", "s"),
            "Name <user_at_ex_dot_com_s>"
        );
    }

    #[test]
    fn test_encode_bare_address() {
        assert_eq!(encode_sender("user@ex.com", "s"), "user_at_ex_dot_com_s");
    }

    #[test]
    fn test_encode_multi_word_display_name() {
        assert_eq!(
            encode_sender("Alice  van   Dyke alice@x.org", "b@y.com"),
            "Alice van Dyke <alice_at_x_dot_org_b@y.com>"
        );
    }

    #[test]
    fn test_encode_plus_address() {
        assert_eq!(
            encode_sender("a+tag@mail.example.com", "r"),
            "a_plus_tag_at_mail_dot_example_dot_com_r"
        );
    }

    #[test]
    fn test_suffix_is_appended_verbatim() {
        assert_eq!(
            encode_sender("Alice a@x.com", "b@y.com"),
            "Alice <a_at_x_dot_com_b@y.com>"
        );
    }

    #[test]
    fn test_multiple_addresses_use_last_token() {
        assert_eq!(
            encode_sender("Alice a@x.com;Bob b@y.com", "s"),
            "Alice a@x.com;Bob <b_at_y_dot_com_s>"
        );
    }

    #[test]
    fn test_sender_keeps_parts_apart() {
        let sender = AddressCodec::new().sender("\"Ann\" a@x.com;\"Bob\" b@y.com", "t@y.com");
        assert_eq!(sender.name.as_deref(), Some("\"Ann\" a@x.com;\"Bob\""));
        assert_eq!(sender.address, "b_at_y_dot_com_t@y.com");

        let bare = AddressCodec::new().sender("a@x.com", "s");
        assert_eq!(bare.name, None);
        assert_eq!(bare.to_string(), "a_at_x_dot_com_s");
    }

    #[test]
    fn test_rules_apply_in_order() {
        let codec = AddressCodec::new();
        // "." is rewritten after "@", so the "_at_" marker stays intact
        assert_eq!(codec.rewrite("@.+"), "_at__dot__plus_");
        assert_eq!(codec.rewrite("no-specials"), "no-specials");
    }

    fn local_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z0-9+-]{1,8}(\\.[a-z0-9+-]{1,8}){0,2}")
            .expect("local regex should be valid")
    }

    fn domain_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z0-9-]{1,10}\\.[a-z]{2,5}")
            .expect("domain regex should be valid")
    }

    proptest! {
        #[test]
        fn test_encode_is_injective(
            pairs in prop::collection::vec((local_strategy(), domain_strategy()), 1..32)
        ) {
            let codec = AddressCodec::new();
            let mut seen: HashMap<String, (String, String)> = HashMap::new();
            for (local, domain) in pairs {
                let encoded = codec.encode(&format!("{local}@{domain}"), "suffix");
                if let Some(previous) = seen.get(&encoded) {
                    prop_assert_eq!(previous, &(local.clone(), domain.clone()));
                }
                seen.insert(encoded, (local, domain));
            }
        }

        #[test]
        fn test_encoded_address_has_no_specials(
            local in local_strategy(),
            domain in domain_strategy()
        ) {
            let encoded = encode_sender(&format!("{local}@{domain}"), "s");
            prop_assert!(!encoded.contains('@'));
            prop_assert!(!encoded.contains('.'));
            prop_assert!(!encoded.contains('+'));
            prop_assert!(!encoded.contains('<'));
        }
    }
}
