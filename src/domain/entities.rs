//! Domain entities: feature records and their decoded ordering

use std::fmt;

/// A named banking capability from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Unique, positive identifier
    pub id: u32,
    /// Display name
    pub name: String,
    /// Decoded `feature_order`
    pub order: FeatureOrder,
}

impl FeatureRecord {
    pub fn new(id: u32, name: impl Into<String>, order: FeatureOrder) -> Self {
        Self {
            id,
            name: name.into(),
            order,
        }
    }

    /// The raw `feature_order` string as it appeared in the catalog.
    pub fn raw_order(&self) -> Option<&str> {
        match &self.order {
            FeatureOrder::Unordered => None,
            FeatureOrder::Chains(encoding) => Some(encoding.raw()),
        }
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// Ordering information attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureOrder {
    /// No ordering information: a root-level feature
    Unordered,
    /// Decoded alternative chains
    Chains(OrderEncoding),
}

/// One hyphen-separated token of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderToken {
    /// Canonical decimal id
    Id(u32),
    /// Anything else, kept verbatim; never matches a feature id
    Invalid(String),
}

impl OrderToken {
    /// Decode a token; only the canonical form of an id is accepted.
    ///
    /// `"7"` is an id, while `"07"`, `"+7"`, `" 7"` and `""` are not.
    pub fn decode(token: &str) -> Self {
        let canonical = !token.is_empty()
            && token.bytes().all(|b| b.is_ascii_digit())
            && (token == "0" || !token.starts_with('0'));
        match canonical.then(|| token.parse::<u32>().ok()).flatten() {
            Some(id) => OrderToken::Id(id),
            None => OrderToken::Invalid(token.to_string()),
        }
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            OrderToken::Id(id) => Some(*id),
            OrderToken::Invalid(_) => None,
        }
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderToken::Id(id) => write!(f, "{id}"),
            OrderToken::Invalid(text) => write!(f, "{text:?}"),
        }
    }
}

/// Typed form of a `feature_order` string.
///
/// The string is a comma-separated list of alternative chains, each chain a
/// hyphen-separated sequence of feature ids. Only the first chain carries the
/// parent link; the others are kept for callers that want them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEncoding {
    raw: String,
    chains: Vec<Vec<OrderToken>>,
}

/// Why an order string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingParseError {
    pub reason: String,
}

impl fmt::Display for EncodingParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl OrderEncoding {
    /// Decode an order string, rejecting any token that is not a canonical id.
    ///
    /// # Examples
    /// ```
    /// use featuretree::domain::OrderEncoding;
    ///
    /// let enc = OrderEncoding::parse("31-1-2-5,31-1-2-3-4-5").unwrap();
    /// assert_eq!(enc.parent_id(), Some(2));
    /// assert_eq!(enc.alternatives().len(), 1);
    /// assert!(OrderEncoding::parse("01-2").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, EncodingParseError> {
        if raw.is_empty() {
            return Err(EncodingParseError {
                reason: "empty encoding".to_string(),
            });
        }

        let encoding = Self::parse_lenient(raw);
        for (alt_idx, chain) in encoding.chains.iter().enumerate() {
            if let Some(OrderToken::Invalid(token)) =
                chain.iter().find(|t| matches!(t, OrderToken::Invalid(_)))
            {
                return Err(EncodingParseError {
                    reason: if token.is_empty() {
                        format!("empty token in alternative {}", alt_idx + 1)
                    } else {
                        format!("non-integer token {:?} in alternative {}", token, alt_idx + 1)
                    },
                });
            }
        }
        Ok(encoding)
    }

    /// Decode an order string token by token; never fails.
    ///
    /// Tokens that are not canonical ids are kept as [`OrderToken::Invalid`].
    pub fn parse_lenient(raw: &str) -> Self {
        let chains = raw
            .split(',')
            .map(|alternative| alternative.split('-').map(OrderToken::decode).collect())
            .collect();
        Self {
            raw: raw.to_string(),
            chains,
        }
    }

    /// The string this encoding was decoded from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All chains, first one included.
    pub fn chains(&self) -> &[Vec<OrderToken>] {
        &self.chains
    }

    /// The chain used for parent resolution.
    pub fn primary_chain(&self) -> &[OrderToken] {
        // split() always yields at least one chain
        self.chains.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Chains after the first; unused for linking.
    pub fn alternatives(&self) -> &[Vec<OrderToken>] {
        self.chains.get(1..).unwrap_or(&[])
    }

    /// Position of the parent token within the primary chain.
    fn parent_position(&self) -> Option<usize> {
        self.primary_chain().len().checked_sub(2)
    }

    /// Second-to-last token of the primary chain, decoded or not.
    pub fn parent_token(&self) -> Option<&OrderToken> {
        self.parent_position().and_then(|pos| self.primary_chain().get(pos))
    }

    /// Declared parent id.
    ///
    /// `None` when the primary chain holds a single token or the parent
    /// token is not a canonical id.
    pub fn parent_id(&self) -> Option<u32> {
        self.parent_token().and_then(OrderToken::id)
    }

    /// Last token of the primary chain (informational).
    pub fn trailing_id(&self) -> Option<u32> {
        self.primary_chain().last().and_then(OrderToken::id)
    }

    pub fn is_well_formed(&self) -> bool {
        self.chains.iter().flatten().all(|t| t.id().is_some())
    }

    /// Undecodable tokens that play no part in parent resolution.
    pub fn ignored_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        let parent = self.parent_position();
        self.chains
            .iter()
            .enumerate()
            .flat_map(|(alt, chain)| chain.iter().enumerate().map(move |(pos, t)| (alt, pos, t)))
            .filter_map(move |(alt, pos, token)| match token {
                OrderToken::Invalid(text) if !(alt == 0 && Some(pos) == parent) => Some(text.as_str()),
                _ => None,
            })
    }
}

impl fmt::Display for OrderEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ids(chain: &[OrderToken]) -> Option<Vec<u32>> {
        chain.iter().map(OrderToken::id).collect()
    }

    #[rstest]
    #[case("31-1-2", Some(1))]
    #[case("31-1", Some(31))]
    #[case("31", None)]
    #[case("8", None)]
    #[case("12,14,16,17,19-13", None)]
    #[case("7,8-9,10-11", None)]
    #[case("31-1-2-5,31-1-2-3-4-5", Some(2))]
    #[case("34-32-36", Some(32))]
    fn test_parent_id(#[case] raw: &str, #[case] expected: Option<u32>) {
        let enc = OrderEncoding::parse(raw).unwrap();
        assert_eq!(enc.parent_id(), expected);
    }

    #[test]
    fn test_parse_keeps_alternative_chains() {
        let enc = OrderEncoding::parse("7,8-9,10-11").unwrap();
        let chains: Vec<_> = enc.chains().iter().map(|c| ids(c)).collect();
        assert_eq!(chains, vec![Some(vec![7]), Some(vec![8, 9]), Some(vec![10, 11])]);
        assert_eq!(enc.alternatives().len(), 2);
        assert_eq!(enc.raw(), "7,8-9,10-11");
        assert_eq!(enc.trailing_id(), Some(7));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("1--2")]
    #[case("a-2")]
    #[case("1-2,")]
    #[case("-3")]
    #[case("01-2")]
    #[case("+1-2")]
    #[case(" 1-2")]
    #[case("1 -2")]
    fn test_parse_rejects_malformed(#[case] raw: &str) {
        assert!(OrderEncoding::parse(raw).is_err());
    }

    #[rstest]
    #[case("7", OrderToken::Id(7))]
    #[case("0", OrderToken::Id(0))]
    #[case("07", OrderToken::Invalid("07".to_string()))]
    #[case("+7", OrderToken::Invalid("+7".to_string()))]
    #[case(" 7", OrderToken::Invalid(" 7".to_string()))]
    #[case("", OrderToken::Invalid(String::new()))]
    #[case("99999999999", OrderToken::Invalid("99999999999".to_string()))]
    fn test_decode_token_accepts_canonical_ids_only(#[case] raw: &str, #[case] expected: OrderToken) {
        assert_eq!(OrderToken::decode(raw), expected);
    }

    #[test]
    fn test_lenient_parse_resolves_parent_despite_bad_tokens_elsewhere() {
        let enc = OrderEncoding::parse_lenient("x-1-2,abc");
        assert!(!enc.is_well_formed());
        assert_eq!(enc.parent_id(), Some(1));
        assert_eq!(enc.trailing_id(), Some(2));
        assert_eq!(enc.ignored_tokens().collect::<Vec<_>>(), vec!["x", "abc"]);
    }

    #[test]
    fn test_lenient_parse_keeps_bad_parent_token() {
        let enc = OrderEncoding::parse_lenient("01-2");
        assert_eq!(enc.parent_token(), Some(&OrderToken::Invalid("01".to_string())));
        assert_eq!(enc.parent_id(), None);
        assert_eq!(enc.ignored_tokens().count(), 0);
    }

    #[test]
    fn test_raw_order_of_record() {
        let rec = FeatureRecord::new(2, "Limit", FeatureOrder::Chains(OrderEncoding::parse("31-1-2").unwrap()));
        assert_eq!(rec.raw_order(), Some("31-1-2"));
        assert_eq!(rec.to_string(), "Limit [2]");

        let rec = FeatureRecord::new(30, "Login", FeatureOrder::Unordered);
        assert_eq!(rec.raw_order(), None);
    }
}
